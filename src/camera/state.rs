//! Element states and the transitions the source reacts to.

use std::fmt;

/// Element state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ElementState {
    /// Created, nothing allocated.
    #[default]
    Null,
    /// Components opened.
    Ready,
    /// Negotiated, not producing.
    Paused,
    /// Producing frames.
    Playing,
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Ready => write!(f, "Ready"),
            Self::Paused => write!(f, "Paused"),
            Self::Playing => write!(f, "Playing"),
        }
    }
}

/// A transition between two adjacent element states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateChange {
    /// Null to Ready.
    NullToReady,
    /// Ready to Paused.
    ReadyToPaused,
    /// Paused to Playing. Capture starts before the transition.
    PausedToPlaying,
    /// Playing to Paused. Capture stops after the transition.
    PlayingToPaused,
    /// Paused to Ready.
    PausedToReady,
    /// Ready to Null.
    ReadyToNull,
}

impl StateChange {
    /// The transition from `current` to `next`, if they are adjacent.
    pub fn new(current: ElementState, next: ElementState) -> Option<Self> {
        use ElementState::*;
        match (current, next) {
            (Null, Ready) => Some(Self::NullToReady),
            (Ready, Paused) => Some(Self::ReadyToPaused),
            (Paused, Playing) => Some(Self::PausedToPlaying),
            (Playing, Paused) => Some(Self::PlayingToPaused),
            (Paused, Ready) => Some(Self::PausedToReady),
            (Ready, Null) => Some(Self::ReadyToNull),
            _ => None,
        }
    }

    /// State before the transition.
    pub fn current(self) -> ElementState {
        match self {
            Self::NullToReady => ElementState::Null,
            Self::ReadyToPaused | Self::ReadyToNull => ElementState::Ready,
            Self::PausedToPlaying | Self::PausedToReady => ElementState::Paused,
            Self::PlayingToPaused => ElementState::Playing,
        }
    }

    /// State after the transition.
    pub fn next(self) -> ElementState {
        match self {
            Self::ReadyToNull => ElementState::Null,
            Self::NullToReady | Self::PausedToReady => ElementState::Ready,
            Self::ReadyToPaused | Self::PlayingToPaused => ElementState::Paused,
            Self::PausedToPlaying => ElementState::Playing,
        }
    }
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.current(), self.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_transitions_round_trip() {
        use ElementState::*;
        for (a, b) in [(Null, Ready), (Ready, Paused), (Paused, Playing)] {
            let up = StateChange::new(a, b).unwrap();
            let down = StateChange::new(b, a).unwrap();
            assert_eq!((up.current(), up.next()), (a, b));
            assert_eq!((down.current(), down.next()), (b, a));
        }
    }

    #[test]
    fn test_skipping_states_is_not_a_transition() {
        assert_eq!(StateChange::new(ElementState::Null, ElementState::Playing), None);
        assert_eq!(StateChange::new(ElementState::Paused, ElementState::Paused), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(StateChange::PausedToPlaying.to_string(), "Paused -> Playing");
    }
}
