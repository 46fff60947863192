//! Key code and modifier flag definitions
//!
//! Provides the macOS virtual key codes the classifier cares about and
//! the CGEventFlags bit masks, kept as plain integers so the gesture
//! logic does not depend on the Core Graphics types.

/// macOS virtual key codes (kVK_*)
pub mod codes {
    /// Escape key
    pub const ESC: u16 = 0x35;
    /// Left Shift key
    pub const LEFT_SHIFT: u16 = 0x38;
    /// Right Shift key
    pub const RIGHT_SHIFT: u16 = 0x3C;

    /// Modifier keys occupy one contiguous block, Right Command through Fn
    pub const FIRST_MODIFIER: u16 = 0x36;
    pub const LAST_MODIFIER: u16 = 0x3F;
}

/// Modifier flag masks, bit-compatible with CGEventFlags
pub mod flags {
    /// Shift key modifier flag (kCGEventFlagMaskShift)
    pub const SHIFT: u64 = 0x0002_0000;
    /// Control key modifier flag
    pub const CONTROL: u64 = 0x0004_0000;
    /// Option/Alt key modifier flag
    pub const OPTION: u64 = 0x0008_0000;
    /// Command key modifier flag
    pub const COMMAND: u64 = 0x0010_0000;
    /// Fn key modifier flag (kCGEventFlagMaskSecondaryFn)
    pub const SECONDARY_FN: u64 = 0x0080_0000;

    /// Modifiers that turn a Shift tap into a chord
    pub const CHORD: u64 = COMMAND | CONTROL | OPTION | SECONDARY_FN;
}

/// Whether the key code belongs to a pure modifier key
pub fn is_modifier_key(key_code: u16) -> bool {
    (codes::FIRST_MODIFIER..=codes::LAST_MODIFIER).contains(&key_code)
}

/// Whether the key code is either Shift key
pub fn is_shift_key(key_code: u16) -> bool {
    key_code == codes::LEFT_SHIFT || key_code == codes::RIGHT_SHIFT
}

/// Snapshot of which modifier keys a flags bitmask reports as held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    /// Shift key is held
    pub shift: bool,
    /// Command, Control, Option or Fn is held
    pub chord: bool,
}

impl ModifierState {
    /// Decode a raw CGEventFlags bitmask
    pub fn from_flags(bits: u64) -> Self {
        Self {
            shift: bits & flags::SHIFT != 0,
            chord: bits & flags::CHORD != 0,
        }
    }

    /// Check if any modifier other than Shift is held
    pub fn has_chord_modifier(&self) -> bool {
        self.chord
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTROL_KEY: u16 = 0x3B;

    #[test]
    fn test_empty_flags() {
        let state = ModifierState::from_flags(0);
        assert_eq!(state, ModifierState::default());
        assert!(!state.has_chord_modifier());
    }

    #[test]
    fn test_shift_only() {
        // Device-dependent low bits are set alongside the mask on real events
        let state = ModifierState::from_flags(flags::SHIFT | 0x102);
        assert!(state.shift);
        assert!(!state.has_chord_modifier());
    }

    #[test]
    fn test_shift_with_command() {
        let state = ModifierState::from_flags(flags::SHIFT | flags::COMMAND);
        assert!(state.shift);
        assert!(state.has_chord_modifier());
    }

    #[test]
    fn test_fn_counts_as_chord() {
        let state = ModifierState::from_flags(flags::SECONDARY_FN);
        assert!(!state.shift);
        assert!(state.has_chord_modifier());
    }

    #[test]
    fn test_each_chord_flag_counts() {
        for bit in [flags::COMMAND, flags::CONTROL, flags::OPTION, flags::SECONDARY_FN] {
            assert!(ModifierState::from_flags(flags::SHIFT | bit).has_chord_modifier());
        }
    }

    #[test]
    fn test_modifier_key_codes() {
        assert!(is_modifier_key(codes::LEFT_SHIFT));
        assert!(is_modifier_key(0x3F)); // kVK_Function
        assert!(is_modifier_key(0x36)); // kVK_RightCommand
        assert!(!is_modifier_key(0x40)); // kVK_F17
        assert!(!is_modifier_key(codes::ESC));
        assert!(!is_modifier_key(0x00)); // kVK_ANSI_A
    }

    #[test]
    fn test_shift_key_codes() {
        assert!(is_shift_key(codes::LEFT_SHIFT));
        assert!(is_shift_key(codes::RIGHT_SHIFT));
        assert!(!is_shift_key(CONTROL_KEY));
    }
}
