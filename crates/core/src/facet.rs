//! Facet flags selecting which cell data a read fetches.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A set of cell data facets, combinable with `|`.
///
/// `FORMAT` or `NOTE` membership forces a read onto the heavyweight
/// grid-data surface; the other facets are served by the values surface.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellData(u8);

impl CellData {
    /// Cell values (numbers, strings, booleans).
    pub const VALUE: Self = Self(1);
    /// Formulas as raw text (`=SUM(A:A)`).
    pub const FORMULA: Self = Self(1 << 1);
    /// Formatting (colors, fonts, borders, number formats).
    pub const FORMAT: Self = Self(1 << 2);
    /// Cell notes/comments.
    pub const NOTE: Self = Self(1 << 3);

    /// Whether every facet in `other` is present in this set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any facet in `other` is present in this set.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for CellData {
    fn default() -> Self {
        Self::VALUE
    }
}

impl BitOr for CellData {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CellData {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for CellData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::VALUE, "VALUE"),
            (Self::FORMULA, "FORMULA"),
            (Self::FORMAT, "FORMAT"),
            (Self::NOTE, "NOTE"),
        ]
        .iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| *name)
        .collect();
        write!(f, "CellData({})", names.join("|"))
    }
}
