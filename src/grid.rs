use itertools::Itertools;
use ndarray::Array2;
use unordered_pair::UnorderedPair;
use varisat::Var;

use crate::connectivity::EncodeError;
use crate::location::{Dimension, Location};
use crate::model::Model;
use crate::order::NodeOrder;
use crate::shape::{SquareStep, Step};

/// A rectangular grid of square cells, the node source for most puzzles.
///
/// Cells are ordered row-major (top row first, left to right), which matches the iteration order of the [`Array2`]s this type hands out.
#[derive(Copy, Clone, Debug)]
pub struct Grid {
    // width, height
    dims: (Dimension, Dimension),
}

impl Grid {
    /// Construct a grid with the specified dimensions, specified in `(x, y)` order.
    pub fn with_dims(dims: (Dimension, Dimension)) -> Self {
        Self { dims }
    }

    pub fn width(&self) -> usize {
        self.dims.0.get()
    }

    pub fn height(&self) -> usize {
        self.dims.1.get()
    }

    pub fn contains(&self, location: Location) -> bool {
        location.0 < self.width() && location.1 < self.height()
    }

    /// Every cell, in row-major order.
    pub fn nodes(&self) -> Vec<Location> {
        (0..self.height())
            .cartesian_product(0..self.width())
            .map(|(y, x)| Location(x, y))
            .collect_vec()
    }

    /// The row-major [`NodeOrder`] of every cell.
    pub fn order(&self) -> Result<NodeOrder<Location>, EncodeError> {
        NodeOrder::new(self.nodes())
    }

    /// Every edge between two orthogonally adjacent cells, ordered by their upper-left cell, right before down.
    pub fn edges(&self) -> Vec<UnorderedPair<Location>> {
        self.nodes()
            .into_iter()
            .flat_map(|location| SquareStep::FORWARD_VARIANTS.iter()
                .map(move |step| (location, step.attempt_from(location))))
            .filter(|(_, other)| self.contains(*other))
            .map(UnorderedPair::from)
            .collect_vec()
    }

    /// One fresh membership variable per cell, indexed `[y, x]`.
    pub fn membership(&self, model: &mut Model) -> Array2<Var> {
        Array2::from_shape_simple_fn((self.height(), self.width()), || model.new_var())
    }

    /// Dump a character per cell, one row per line.
    pub fn print(board: &Array2<char>) -> String {
        let mut out = String::with_capacity(board.nrows() * (board.ncols() + 1));

        for row in board.rows() {
            for col in row {
                out.push(*col);
            }
            out.push('\n');
        }

        out
    }
}
