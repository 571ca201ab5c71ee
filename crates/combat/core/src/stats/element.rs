use bitflags::bitflags;
use strum::{EnumCount, EnumIter, IntoStaticStr};

/// Damage element. Every unit deals damage of exactly one element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumCount, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Element {
    Physical,
    Fire,
    Ice,
    Lightning,
    Wind,
    Quantum,
    Imaginary,
}

impl Element {
    /// Coefficient applied to weakness-break burst damage.
    pub const fn break_coefficient(self) -> f64 {
        match self {
            Element::Physical | Element::Fire => 2.0,
            Element::Wind => 1.5,
            Element::Ice | Element::Lightning => 1.0,
            Element::Quantum | Element::Imaginary => 0.5,
        }
    }

    pub const fn bit(self) -> ElementSet {
        match self {
            Element::Physical => ElementSet::PHYSICAL,
            Element::Fire => ElementSet::FIRE,
            Element::Ice => ElementSet::ICE,
            Element::Lightning => ElementSet::LIGHTNING,
            Element::Wind => ElementSet::WIND,
            Element::Quantum => ElementSet::QUANTUM,
            Element::Imaginary => ElementSet::IMAGINARY,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

bitflags! {
    /// Set of elements, used for weaknesses.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ElementSet: u8 {
        const PHYSICAL = 1 << 0;
        const FIRE = 1 << 1;
        const ICE = 1 << 2;
        const LIGHTNING = 1 << 3;
        const WIND = 1 << 4;
        const QUANTUM = 1 << 5;
        const IMAGINARY = 1 << 6;
    }
}

impl ElementSet {
    pub fn has(self, element: Element) -> bool {
        self.contains(element.bit())
    }

    pub fn with(self, element: Element) -> Self {
        self | element.bit()
    }
}

impl FromIterator<Element> for ElementSet {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ElementSet::empty(), |set, element| set.with(element))
    }
}
