use std::path::PathBuf;

use thiserror::Error;

/// Problems encountered while loading or resolving definitions.
///
/// None of these are fatal: the store logs them and the affected item simply
/// does not resolve.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read {path:?} from {source_name}: {source}")]
    Io {
        source_name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?} not found in {source_name}")]
    NotFound { source_name: String, path: PathBuf },

    #[error("failed to parse {path:?} from {source_name}: {source}")]
    Parse {
        source_name: String,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("override for {item_id} points at unknown definition {use_definition}")]
    DanglingOverride {
        item_id: String,
        use_definition: String,
    },

    #[error("override chain for {item_id} loops back through {repeated}")]
    Cycle { item_id: String, repeated: String },
}

/// Failure raised by an ability handler or effect.
///
/// The dispatcher catches these at its boundary; the player only ever sees
/// [`HandlerError::tag`].
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("effect failed: {0}")]
    Effect(String),

    #[error("command rejected: {0}")]
    Command(String),

    #[error("host call failed: {0}")]
    Host(String),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Short class-of-error label shown to players.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Effect(_) => "EffectError",
            Self::Command(_) => "CommandError",
            Self::Host(_) => "HostError",
            Self::Panicked(_) => "Panic",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load engine config: {0}")]
    Load(#[from] confy::ConfyError),
}
