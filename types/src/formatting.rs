//! Display formatting for slot counters.
//!
//! Debug dumps and chat replies format charges, cooldowns and multipliers
//! through this module so every surface prints them the same way.

/// Format a charge counter.
///
/// Unlimited slots (`max <= 0`) print as `inf`.
///
/// # Examples
/// ```
/// use hotbar_types::formatting::format_uses;
/// assert_eq!(format_uses(2, 3), "2/3");
/// assert_eq!(format_uses(0, 0), "inf");
/// assert_eq!(format_uses(5, -1), "inf");
/// ```
pub fn format_uses(remaining: i32, max: i32) -> String {
    if max <= 0 {
        "inf".to_string()
    } else {
        format!("{}/{}", remaining, max)
    }
}

/// Format remaining cooldown seconds.
///
/// - Zero or negative prints `ready`
/// - Under ten seconds keeps one decimal
/// - Longer values are rounded up to whole seconds
///
/// # Examples
/// ```
/// use hotbar_types::formatting::format_cooldown;
/// assert_eq!(format_cooldown(0.0), "ready");
/// assert_eq!(format_cooldown(3.24), "3.2s");
/// assert_eq!(format_cooldown(12.1), "13s");
/// ```
pub fn format_cooldown(remaining_secs: f32) -> String {
    if remaining_secs <= 0.0 {
        "ready".to_string()
    } else if remaining_secs < 10.0 {
        format!("{:.1}s", remaining_secs)
    } else {
        format!("{}s", remaining_secs.ceil() as i64)
    }
}

/// Format a 0..=1 ratio as a whole percentage.
///
/// # Examples
/// ```
/// use hotbar_types::formatting::format_ratio;
/// assert_eq!(format_ratio(0.5), "50%");
/// assert_eq!(format_ratio(1.7), "100%");
/// assert_eq!(format_ratio(-0.2), "0%");
/// ```
pub fn format_ratio(ratio: f32) -> String {
    format!("{:.0}%", ratio.clamp(0.0, 1.0) * 100.0)
}

/// Format a power multiplier.
///
/// # Examples
/// ```
/// use hotbar_types::formatting::format_multiplier;
/// assert_eq!(format_multiplier(1.0), "x1.00");
/// assert_eq!(format_multiplier(2.5), "x2.50");
/// ```
pub fn format_multiplier(multiplier: f32) -> String {
    format!("x{:.2}", multiplier)
}
