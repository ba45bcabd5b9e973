use std::fmt::{self, Display, Formatter};
use std::ops::{Add, Mul};

/// An element of the {0, 1, ω} resource semiring: how many times a variable
/// may be, or has been, consumed.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Multiplicity {
    Zero,
    One,
    Many,
}

impl Multiplicity {
    /// Least upper bound. Agreeing usages stay as they are; disagreeing
    /// usages are only bounded by ω.
    pub fn lub(self, other: Multiplicity) -> Multiplicity {
        if self == other {
            self
        } else {
            Multiplicity::Many
        }
    }

    /// Whether a measured usage fits in a declared allowance. The relation
    /// is exact at 0 and 1: an unused linear variable does not fit a `1`
    /// allowance.
    pub fn fits_in(self, available: Multiplicity) -> bool {
        self == available || available == Multiplicity::Many
    }

    /// The typing mode a consumption at this multiplicity runs in.
    pub fn relevance(self) -> Relevance {
        match self {
            Multiplicity::Zero => Relevance::Erased,
            Multiplicity::One | Multiplicity::Many => Relevance::Present,
        }
    }

    pub fn is_zero(self) -> bool {
        self == Multiplicity::Zero
    }
}

impl Add for Multiplicity {
    type Output = Multiplicity;

    fn add(self, other: Multiplicity) -> Multiplicity {
        match (self, other) {
            (Multiplicity::Zero, q) | (q, Multiplicity::Zero) => q,
            _ => Multiplicity::Many,
        }
    }
}

impl Mul for Multiplicity {
    type Output = Multiplicity;

    fn mul(self, other: Multiplicity) -> Multiplicity {
        match (self, other) {
            (Multiplicity::Zero, _) | (_, Multiplicity::Zero) => Multiplicity::Zero,
            (Multiplicity::One, q) | (q, Multiplicity::One) => q,
            (Multiplicity::Many, Multiplicity::Many) => Multiplicity::Many,
        }
    }
}

impl Display for Multiplicity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Multiplicity::Zero => f.write_str("0"),
            Multiplicity::One => f.write_str("1"),
            Multiplicity::Many => f.write_str("ω"),
        }
    }
}

/// The typing mode: erased terms exist at the type level only and consume
/// nothing at runtime.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Relevance {
    Erased,
    Present,
}

impl Relevance {
    /// The multiplicity a single variable occurrence is charged at.
    pub fn multiplicity(self) -> Multiplicity {
        match self {
            Relevance::Erased => Multiplicity::Zero,
            Relevance::Present => Multiplicity::One,
        }
    }
}

impl Display for Relevance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Relevance::Erased => f.write_str("erased"),
            Relevance::Present => f.write_str("present"),
        }
    }
}
