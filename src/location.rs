use std::num::NonZero;

pub type Coord = usize;
/// A nonzero board extent, in cells.
pub type Dimension = NonZero<Coord>;

#[derive(Clone, Eq, Hash, Copy, PartialEq, Ord, PartialOrd, Debug)]
/// A location `(x, y)` on a grid. The top left corner is `Location(0, 0)`.
///
/// The derived ordering compares `x` first; grids use their own row-major order for nodes, see [`Grid::nodes`](crate::grid::Grid::nodes).
pub struct Location(pub Coord, pub Coord);

impl Location {
    pub(crate) fn as_index(&self) -> (Coord, Coord) {
        (self.1, self.0)
    }

    pub(crate) fn offset_by(self, rhs: (isize, isize)) -> Self {
        Self(self.0.wrapping_add_signed(rhs.0), self.1.wrapping_add_signed(rhs.1))
    }

    /// Taxicab distance between two locations.
    pub fn manhattan(&self, other: &Location) -> Coord {
        self.0.abs_diff(other.0) + self.1.abs_diff(other.1)
    }
}
