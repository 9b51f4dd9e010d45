//! Battle formula constants - all tunable values in one place

// Damage formula
pub const DAMAGE_SCALE: f64 = 0.5;
pub const MIN_DAMAGE: u32 = 1;

// Random variance window, [min, max)
pub const VARIANCE_MIN: f64 = 0.85;
pub const VARIANCE_MAX: f64 = 1.0;

// Critical hits
pub const CRITICAL_CHANCE: f64 = 1.0 / 16.0;
pub const CRITICAL_MULTIPLIER: f64 = 1.5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variance_window_ordered() {
        assert!(VARIANCE_MIN < VARIANCE_MAX);
        assert!(VARIANCE_MIN > 0.0);
    }

    #[test]
    fn test_critical_is_a_boost() {
        assert!(CRITICAL_MULTIPLIER > 1.0);
        assert!(CRITICAL_CHANCE > 0.0 && CRITICAL_CHANCE < 1.0);
    }
}
