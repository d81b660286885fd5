use std::hash::Hash;

use strum::VariantArray;

use crate::location::Location;

/// Functionality that must be implemented on a case-by-case basis for any cell shape.
///
/// [`SquareStep`] is the built-in implementation.
pub trait Step: Sized + Copy + VariantArray + PartialEq + Eq + Hash + Ord + PartialOrd {
    /// Attempt the step from `location` in the direction specified by `self` and return the resultant [`Location`].
    ///
    /// Steps off the top or left edge wrap around to very large coordinates, which callers treat as out of bounds.
    fn attempt_from(&self, location: Location) -> Location;
    /// The static array of all "forward" directions.
    ///
    /// Forward directions should be those which, upon stepping from one location to another, cause the destination location to be ordered after the origin in row-major order.
    /// For [`SquareStep`], [`Down`](SquareStep::Down) and [`Right`](SquareStep::Right) are forward directions.
    const FORWARD_VARIANTS: &'static [Self];
}

/// The square cell type and rectangular grid shape found in nearly every region and loop puzzle.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum SquareStep {
    Up,
    Down,
    Left,
    Right,
}

impl Step for SquareStep {
    fn attempt_from(&self, location: Location) -> Location {
        match self {
            Self::Up => location.offset_by((0, -1)),
            Self::Down => location.offset_by((0, 1)),
            Self::Left => location.offset_by((-1, 0)),
            Self::Right => location.offset_by((1, 0)),
        }
    }

    const FORWARD_VARIANTS: &'static [Self] = &[Self::Right, Self::Down];
}
