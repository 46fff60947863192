//! Gesture recognition on top of the raw key event stream
//!
//! Two gestures are recognised:
//! - Escape key down: switch to the primary input method
//! - Lone Shift pressed and released within the tap window: toggle
//!
//! A Shift release after a single quick press fires on its own; there is
//! no second-tap counter despite the "double tap" name.

mod classifier;

pub use classifier::GestureClassifier;
