//! Physical key bitmask.

use bitflags::bitflags;

bitflags! {
    /// Set of physical keys, as sampled and debounced by the keypad.
    ///
    /// # Example
    /// ```
    /// use panelcore::Keys;
    /// let nav = Keys::NORTH | Keys::SOUTH | Keys::OK;
    /// assert!(nav.contains(Keys::OK));
    /// ```
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
    pub struct Keys: u16 {
        /// Up
        const NORTH = 0b0000_0001;
        /// Right
        const EAST = 0b0000_0010;
        /// Down
        const SOUTH = 0b0000_0100;
        /// Left
        const WEST = 0b0000_1000;
        /// Confirm
        const OK = 0b0001_0000;
        /// Back
        const CANCEL = 0b0010_0000;
    }
}

impl Keys {
    /// The four directional keys.
    pub const DPAD: Self = Self::NORTH.union(Self::EAST).union(Self::SOUTH).union(Self::WEST);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dpad() {
        assert_eq!(Keys::DPAD.bits(), 0b1111);
        assert!(!Keys::DPAD.contains(Keys::OK));
    }

    #[test]
    fn test_unknown_bits_truncated() {
        assert_eq!(Keys::from_bits_truncate(0xff00), Keys::empty());
    }
}
