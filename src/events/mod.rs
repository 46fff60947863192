//! Intents emitted by the gesture classifier
//!
//! An intent lives for a single event-processing step: the classifier
//! produces it and the dispatcher turns it into an input method switch.

/// What the user asked for with a recognised gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Escape was pressed: go back to the primary input method
    SwitchToPrimary,

    /// Shift was tapped: flip between primary and secondary
    ToggleInputMethod,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::SwitchToPrimary => write!(f, "SWITCH_TO_PRIMARY"),
            Intent::ToggleInputMethod => write!(f, "TOGGLE_INPUT_METHOD"),
        }
    }
}
