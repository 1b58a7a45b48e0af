use hashbrown::HashMap;

use super::{PlayerId, PlayerState};

/// Storage for every player's bar state.
///
/// Entries are created on first access and live for the session.
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    players: HashMap<PlayerId, PlayerState>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player: PlayerId) -> Option<&PlayerState> {
        self.players.get(&player)
    }

    /// State for `player`, created empty if missing.
    pub fn get_or_create(&mut self, player: PlayerId) -> &mut PlayerState {
        self.players.entry(player).or_insert_with(|| {
            tracing::debug!(%player, "Created bar state");
            PlayerState::new()
        })
    }

    /// Drop a player's state when their session ends.
    pub fn remove(&mut self, player: PlayerId) -> Option<PlayerState> {
        self.players.remove(&player)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut PlayerState)> {
        self.players.iter_mut().map(|(id, state)| (*id, state))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_created_lazily() {
        let mut registry = PlayerRegistry::new();
        assert!(registry.get(PlayerId(1)).is_none());
        registry.get_or_create(PlayerId(1)).enabled = true;
        assert!(registry.get(PlayerId(1)).unwrap().enabled);
        assert_eq!(registry.len(), 1);
    }
}
