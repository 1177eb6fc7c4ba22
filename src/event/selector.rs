//! Event selectors: category plus key mask packed into one word.

use super::keys::Keys;

const CATEGORY_SHIFT: u32 = 16;
const KEY_MASK: u32 = 0xffff;

/// What kind of event a filter listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventCategory {
    /// Once per rendered frame, delivered to every subscribed panel.
    RenderScene = 1,
    /// All keys of the mask are held down.
    KeysDown = 2,
    /// All keys of the mask are released.
    KeysUp = 3,
    /// Any key of the mask changed state.
    KeysChanged = 4,
    /// Full press-and-release of the mask. Not dispatched.
    KeysPress = 5,
    /// Opaque message addressed to the active panel.
    Message = 6,
    /// The panel became the focused (active, settled) panel.
    PanelFocus = 7,
    /// The panel lost focus to a newly pushed panel.
    PanelBlur = 8,
}

impl EventCategory {
    /// Whether this category carries a key mask.
    pub const fn is_key(self) -> bool {
        matches!(
            self,
            Self::KeysDown | Self::KeysUp | Self::KeysChanged | Self::KeysPress
        )
    }

    const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => Self::RenderScene,
            2 => Self::KeysDown,
            3 => Self::KeysUp,
            4 => Self::KeysChanged,
            5 => Self::KeysPress,
            6 => Self::Message,
            7 => Self::PanelFocus,
            8 => Self::PanelBlur,
            _ => return None,
        })
    }
}

/// A category and, for key categories, the keys of interest.
///
/// Layout: bits 16..24 hold the category, bits 0..16 the key mask.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventSelector(u32);

impl EventSelector {
    const fn pack(category: EventCategory, keys: Keys) -> Self {
        Self(((category as u32) << CATEGORY_SHIFT) | keys.bits() as u32)
    }

    /// Render tick.
    pub const fn render_scene() -> Self {
        Self::pack(EventCategory::RenderScene, Keys::empty())
    }

    /// All of `keys` held down.
    pub const fn keys_down(keys: Keys) -> Self {
        Self::pack(EventCategory::KeysDown, keys)
    }

    /// All of `keys` released.
    pub const fn keys_up(keys: Keys) -> Self {
        Self::pack(EventCategory::KeysUp, keys)
    }

    /// Any of `keys` changed.
    pub const fn keys_changed(keys: Keys) -> Self {
        Self::pack(EventCategory::KeysChanged, keys)
    }

    /// Press-and-release of `keys` (recognized, never dispatched).
    pub const fn keys_press(keys: Keys) -> Self {
        Self::pack(EventCategory::KeysPress, keys)
    }

    /// Message to the active panel.
    pub const fn message() -> Self {
        Self::pack(EventCategory::Message, Keys::empty())
    }

    /// Panel gained focus.
    pub const fn panel_focus() -> Self {
        Self::pack(EventCategory::PanelFocus, Keys::empty())
    }

    /// Panel lost focus.
    pub const fn panel_blur() -> Self {
        Self::pack(EventCategory::PanelBlur, Keys::empty())
    }

    /// Decode a packed selector. Returns `None` for an unknown category or
    /// key bits on a non-key category.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        let Some(category) = EventCategory::from_u8((bits >> CATEGORY_SHIFT) as u8) else {
            return None;
        };
        if bits >> (CATEGORY_SHIFT + 8) != 0 {
            return None;
        }
        if !category.is_key() && bits & KEY_MASK != 0 {
            return None;
        }
        Some(Self(bits))
    }

    /// The packed representation.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// The category.
    #[allow(clippy::missing_panics_doc)]
    pub const fn category(self) -> EventCategory {
        match EventCategory::from_u8((self.0 >> CATEGORY_SHIFT) as u8) {
            Some(category) => category,
            // Every constructor packs a valid category.
            None => unreachable!(),
        }
    }

    /// The keys of interest (empty for non-key categories).
    #[inline]
    pub const fn keys(self) -> Keys {
        Keys::from_bits_truncate((self.0 & KEY_MASK) as u16)
    }

    /// Decide whether a key transition satisfies this selector.
    ///
    /// `changed` is the set of keys whose state differs from the previous
    /// sample. Only keys in this selector's mask are considered.
    pub fn matches_keys(self, down: Keys, changed: Keys) -> bool {
        let mask = self.keys();
        if (mask & changed).is_empty() {
            return false;
        }
        match self.category() {
            EventCategory::KeysDown => down.contains(mask),
            EventCategory::KeysUp => (down & mask).is_empty(),
            EventCategory::KeysChanged => true,
            // Press detection needs per-filter edge history; not implemented.
            _ => false,
        }
    }
}

impl From<EventCategory> for EventSelector {
    fn from(category: EventCategory) -> Self {
        Self::pack(category, Keys::empty())
    }
}

impl std::fmt::Debug for EventSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.category().is_key() {
            write!(f, "{:?}({:?})", self.category(), self.keys())
        } else {
            write!(f, "{:?}", self.category())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing() {
        let sel = EventSelector::keys_changed(Keys::NORTH | Keys::OK);
        assert_eq!(sel.category(), EventCategory::KeysChanged);
        assert_eq!(sel.keys(), Keys::NORTH | Keys::OK);
        assert_eq!(EventSelector::from_bits(sel.bits()), Some(sel));
    }

    #[test]
    fn test_from_bits_rejects_garbage() {
        assert_eq!(EventSelector::from_bits(0), None);
        assert_eq!(EventSelector::from_bits(42 << 16), None);
        // Key bits on a render selector
        assert_eq!(EventSelector::from_bits((1 << 16) | 1), None);
    }

    #[test]
    fn test_changed_mask_gates_keys_down() {
        let previous = Keys::from_bits_truncate(0b0010);
        let current = Keys::from_bits_truncate(0b0011);
        let changed = current ^ previous;
        assert_eq!(changed.bits(), 0b0001);

        let on_bit0 = EventSelector::keys_down(Keys::from_bits_truncate(0b0001));
        let on_bit1 = EventSelector::keys_down(Keys::from_bits_truncate(0b0010));
        assert!(on_bit0.matches_keys(current, changed));
        assert!(!on_bit1.matches_keys(current, changed));
    }

    #[test]
    fn test_keys_down_requires_all() {
        let sel = EventSelector::keys_down(Keys::NORTH | Keys::SOUTH);
        assert!(!sel.matches_keys(Keys::NORTH, Keys::NORTH));
        assert!(sel.matches_keys(Keys::NORTH | Keys::SOUTH, Keys::SOUTH));
    }

    #[test]
    fn test_keys_up() {
        let sel = EventSelector::keys_up(Keys::OK);
        assert!(sel.matches_keys(Keys::empty(), Keys::OK));
        assert!(!sel.matches_keys(Keys::OK, Keys::OK));
    }

    #[test]
    fn test_keys_press_never_matches() {
        let sel = EventSelector::keys_press(Keys::OK);
        assert!(!sel.matches_keys(Keys::OK, Keys::OK));
        assert!(!sel.matches_keys(Keys::empty(), Keys::OK));
    }
}
