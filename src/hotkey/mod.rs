//! Hotkey module for global keyboard event listening
//!
//! Uses macOS CGEventTap to observe key-down, key-up and modifier
//! flag changes and hands them to the gesture classifier in order.

pub mod keys;
mod listener;

pub use listener::{HotkeyEvent, HotkeyListener, KeyEvent, KeyEventKind};
