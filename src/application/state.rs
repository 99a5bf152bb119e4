//! Which preset, if any, the mover is currently sitting at.

use std::fmt;

/// Offsets at or beyond this distance never count as "at" a preset.
pub const STATE_THRESHOLD: f64 = 0.5;

/// Result of nearest-state selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetState {
    /// Closest preset within the threshold.
    At(String),
    /// No preset within the threshold.
    Unknown,
}

impl fmt::Display for PresetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(name) => f.write_str(name),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Pick the preset with the smallest absolute offset below `threshold`.
///
/// Offsets are visited in registration order; ties keep the earlier one.
pub fn nearest_state<'a, I>(offsets: I, threshold: f64) -> PresetState
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut closest = threshold;
    let mut state = PresetState::Unknown;

    for (name, offset) in offsets {
        let distance = offset.abs();
        if distance < closest {
            closest = distance;
            state = PresetState::At(name.to_string());
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(position: f64) -> Vec<(&'static str, f64)> {
        vec![("a", 10.0 - position), ("b", 10.3 - position)]
    }

    #[test]
    fn test_picks_closest_within_threshold() {
        let state = nearest_state(offsets(10.2), STATE_THRESHOLD);
        assert_eq!(state, PresetState::At("b".into()));
    }

    #[test]
    fn test_unknown_when_far() {
        let state = nearest_state(offsets(20.0), STATE_THRESHOLD);
        assert_eq!(state, PresetState::Unknown);
        assert_eq!(state.to_string(), "unknown");
    }

    #[test]
    fn test_negative_offsets_use_magnitude() {
        let state = nearest_state(vec![("low", -0.3), ("high", 0.4)], STATE_THRESHOLD);
        assert_eq!(state, PresetState::At("low".into()));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let state = nearest_state(vec![("edge", 0.5)], STATE_THRESHOLD);
        assert_eq!(state, PresetState::Unknown);
    }

    #[test]
    fn test_tie_keeps_first_registered() {
        let state = nearest_state(vec![("first", 0.25), ("second", -0.25)], STATE_THRESHOLD);
        assert_eq!(state, PresetState::At("first".into()));
    }
}
