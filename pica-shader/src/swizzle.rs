//! Operand descriptors (swizzle patterns).

/// One of the four vector lanes.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    X = 0,
    Y = 1,
    Z = 2,
    W = 3,
}

impl Component {
    pub const ALL: [Component; 4] = [Self::X, Self::Y, Self::Z, Self::W];

    pub fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Self::X,
            1 => Self::Y,
            2 => Self::Z,
            _ => Self::W,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
            Self::W => 'w',
        }
    }
}

/// Which source operand a selector belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SourceSlot {
    Src1,
    Src2,
}

impl SourceSlot {
    #[inline]
    fn negate_bit(&self) -> u32 {
        match self {
            Self::Src1 => 4,
            Self::Src2 => 13,
        }
    }

    #[inline]
    fn selector_base(&self) -> u32 {
        match self {
            Self::Src1 => 5,
            Self::Src2 => 14,
        }
    }
}

/// An entry of the operand descriptor table.
///
/// # Format
///
/// `| dest_mask: 4 | negate_src1: 1 | src1_selector: 8 | negate_src2: 1 | src2_selector: 8 |`
///
/// The destination mask stores `x` in its most significant bit. Each selector holds four 2-bit
/// component indices with lane `x` in the most significant pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct SwizzlePattern(u32);

impl SwizzlePattern {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Builds a descriptor from its logical parts. `dest_mask` uses the hardware layout (`0b1000`
    /// is `x`).
    pub fn new(
        dest_mask: u8,
        src1: [Component; 4],
        negate_src1: bool,
        src2: [Component; 4],
        negate_src2: bool,
    ) -> Self {
        let mut raw = (dest_mask & 0xf) as u32;
        for (slot, selectors, negate) in [
            (SourceSlot::Src1, src1, negate_src1),
            (SourceSlot::Src2, src2, negate_src2),
        ] {
            raw |= (negate as u32) << slot.negate_bit();
            for (lane, component) in selectors.iter().enumerate() {
                raw |= (*component as u32) << (slot.selector_base() + 2 * (3 - lane as u32));
            }
        }
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn dest_mask(&self) -> u8 {
        (self.0 & 0xf) as u8
    }

    pub fn dest_component_enabled(&self, component: Component) -> bool {
        self.dest_mask() & (1 << (3 - component as u8)) != 0
    }

    pub fn negate(&self, slot: SourceSlot) -> bool {
        (self.0 >> slot.negate_bit()) & 1 != 0
    }

    pub fn selector(&self, slot: SourceSlot, lane: Component) -> Component {
        let shift = slot.selector_base() + 2 * (3 - lane as u32);
        Component::from_bits(self.0 >> shift)
    }

    /// Written components in `xyzw` order; an empty mask yields an empty string.
    pub fn dest_mask_string(&self) -> String {
        Component::ALL
            .iter()
            .filter(|c| self.dest_component_enabled(**c))
            .map(Component::as_char)
            .collect()
    }

    pub fn selector_string(&self, slot: SourceSlot) -> String {
        Component::ALL
            .iter()
            .map(|lane| self.selector(slot, *lane).as_char())
            .collect()
    }
}

impl From<u32> for SwizzlePattern {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::Component::{W, X, Y, Z};
    use super::*;

    #[test]
    fn identity_swizzle_is_xyzw() {
        let pattern = SwizzlePattern::new(0b1111, [X, Y, Z, W], false, [X, Y, Z, W], false);
        assert_eq!(pattern.dest_mask_string(), "xyzw");
        assert_eq!(pattern.selector_string(SourceSlot::Src1), "xyzw");
        assert_eq!(pattern.selector_string(SourceSlot::Src2), "xyzw");
    }

    #[test]
    fn selectors_decode_from_raw_bits() {
        // src1 = wzyx, src2 = xxxx, dest = xw
        let raw = 0b1001 | (0b11_10_01_00 << 5);
        let pattern = SwizzlePattern::from_raw(raw);
        assert_eq!(pattern.dest_mask_string(), "xw");
        assert_eq!(pattern.selector_string(SourceSlot::Src1), "wzyx");
        assert_eq!(pattern.selector_string(SourceSlot::Src2), "xxxx");
        assert!(!pattern.negate(SourceSlot::Src1));
    }

    #[test]
    fn empty_mask_renders_empty() {
        let pattern = SwizzlePattern::new(0, [X, X, X, X], false, [X, X, X, X], false);
        assert_eq!(pattern.dest_mask_string(), "");
    }

    #[test]
    fn negation_is_per_source() {
        let pattern = SwizzlePattern::new(0b1000, [X, Y, Z, W], false, [W, W, W, W], true);
        assert!(!pattern.negate(SourceSlot::Src1));
        assert!(pattern.negate(SourceSlot::Src2));
        assert_eq!((pattern.raw() >> 13) & 1, 1);
        assert_eq!(pattern.selector_string(SourceSlot::Src2), "wwww");
    }
}
