use std::collections::HashSet;
use std::num::NonZero;

use itertools::Itertools;
use log::debug;
use unordered_pair::UnorderedPair;

use crate::adjacency::GridAdjacency;
use crate::connectivity::{ConnectivityEncoder, EncodeError, Encoding};
use crate::grid::Grid;
use crate::location::{Dimension, Location};
use crate::logic::exactly_one;
use crate::model::Model;
use crate::order::NodeOrder;
use crate::partition::Partition;
use crate::symmetry::order_roots;

/// Reasons a [`PartitionBuilder`] may become invalid while building.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PartitionInvalidReason {
    /// A location was given outside the bounds specified by `dims` on the builder.
    FeatureOutOfBounds,
    /// A pair of cells to separate or join includes a dropped location.
    DroppedLocation,
    /// At least one region is required.
    NoRegions,
    /// More regions were requested than there are cells to root them.
    TooManyRegions,
    /// The fixed region size does not divide the cells evenly among the regions.
    SizeMismatch,
    /// Building a region's connectivity constraints failed.
    Encoding(EncodeError),
}

/// Carves a rectangular grid into a fixed number of connected regions at once, as in Palisade-style puzzles.
///
/// Every remaining cell belongs to exactly one region, every region is non-empty and connected, and regions may be forced to a common size.
/// By default the regions are ordered by the position of their roots so each partition is found once rather than once per relabeling.
///
/// Builders mutate themselves while building but can be [`Clone`]d to save their state at some point.
/// Once invalid, every further call does nothing and [`build`](Self::build) reports why.
#[derive(Clone)]
pub struct PartitionBuilder {
    grid: Grid,
    regions: usize,
    region_size: Option<usize>,
    encoding: Encoding,
    symmetry_breaking: bool,
    invalid_reasons: Vec<PartitionInvalidReason>,
    // holes
    location_blacklist: HashSet<Location>,
    // walls
    separated: HashSet<UnorderedPair<Location>>,
    joined: HashSet<UnorderedPair<Location>>,
}

impl Default for PartitionBuilder {
    fn default() -> Self {
        Self::with_dims((NonZero::new(5).unwrap(), NonZero::new(5).unwrap()))
    }
}

impl PartitionBuilder {
    /// Construct a new [`Self`] with the specified dimensions, specified in `(x, y)` order, and two regions.
    pub fn with_dims(dims: (Dimension, Dimension)) -> Self {
        Self {
            grid: Grid::with_dims(dims),
            regions: 2,
            region_size: None,
            encoding: Encoding::default(),
            symmetry_breaking: true,
            invalid_reasons: Default::default(),
            location_blacklist: Default::default(),
            separated: Default::default(),
            joined: Default::default(),
        }
    }

    pub fn regions(&mut self, regions: usize) -> &mut Self {
        self.regions = regions;
        self
    }

    /// Require every region to contain exactly `size` cells.
    pub fn region_size(&mut self, size: usize) -> &mut Self {
        self.region_size = Some(size);
        self
    }

    pub fn encoding(&mut self, encoding: Encoding) -> &mut Self {
        self.encoding = encoding;
        self
    }

    /// Toggle root ordering between regions. Turning it off finds every partition once per relabeling of its regions.
    pub fn symmetry_breaking(&mut self, enabled: bool) -> &mut Self {
        self.symmetry_breaking = enabled;
        self
    }

    /// Drop a location from the grid; it belongs to no region and connects nothing.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](PartitionInvalidReason::FeatureOutOfBounds) invalid state if `location` is out of bounds.
    pub fn drop_location(&mut self, location: Location) -> &mut Self {
        if self.check_in_bounds([location]) {
            self.location_blacklist.insert(location);
        }
        self
    }

    /// Place the two `locations` in different regions, e.g. because a wall runs between them.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](PartitionInvalidReason::FeatureOutOfBounds) invalid state if either location is out of bounds.
    pub fn separate(&mut self, locations: UnorderedPair<Location>) -> &mut Self {
        if self.check_in_bounds([locations.0, locations.1]) {
            self.separated.insert(locations);
        }
        self
    }

    /// Place the two `locations` in the same region.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](PartitionInvalidReason::FeatureOutOfBounds) invalid state if either location is out of bounds.
    pub fn join(&mut self, locations: UnorderedPair<Location>) -> &mut Self {
        if self.check_in_bounds([locations.0, locations.1]) {
            self.joined.insert(locations);
        }
        self
    }

    fn check_in_bounds<const N: usize>(&mut self, locations: [Location; N]) -> bool {
        if !self.invalid_reasons.is_empty() {
            return false;
        }

        if locations.iter().any(|location| !self.grid.contains(*location)) {
            self.invalid_reasons.push(PartitionInvalidReason::FeatureOutOfBounds);
            return false;
        }

        true
    }

    /// Check the validity of this builder so far.
    ///
    /// Returns `None` if the builder is valid, `Some(&Vec<PartitionInvalidReason>)` otherwise.
    /// Reasons depending on the whole configuration, such as [`SizeMismatch`](PartitionInvalidReason::SizeMismatch), only surface in [`build`](Self::build).
    pub fn is_valid(&self) -> Option<&Vec<PartitionInvalidReason>> {
        if self.invalid_reasons.is_empty() {
            None
        } else {
            Some(&self.invalid_reasons)
        }
    }

    /// Encode the state of this builder into a [`Partition`] ready to solve.
    /// If the builder is invalid for any reason, a [`Vec`] of [`PartitionInvalidReason`] will indicate why.
    pub fn build(&self) -> Result<Partition, Vec<PartitionInvalidReason>> {
        let mut invalid_reasons = self.invalid_reasons.clone();
        if !invalid_reasons.is_empty() {
            return Err(invalid_reasons);
        }

        let cells = self.grid.nodes()
            .into_iter()
            .filter(|location| !self.location_blacklist.contains(location))
            .collect_vec();

        if self.regions == 0 {
            invalid_reasons.push(PartitionInvalidReason::NoRegions);
        } else if self.regions > cells.len() {
            invalid_reasons.push(PartitionInvalidReason::TooManyRegions);
        }
        if self.region_size.is_some_and(|size| size * self.regions != cells.len()) {
            invalid_reasons.push(PartitionInvalidReason::SizeMismatch);
        }
        if self.separated.iter().chain(&self.joined)
            .any(|UnorderedPair(a, b)| self.location_blacklist.contains(a) || self.location_blacklist.contains(b)) {
            invalid_reasons.push(PartitionInvalidReason::DroppedLocation);
        }
        if !invalid_reasons.is_empty() {
            return Err(invalid_reasons);
        }

        let order = NodeOrder::new(cells)
            .map_err(|err| vec![PartitionInvalidReason::Encoding(err)])?;
        let mut model = Model::new();

        // membership[region][cell]
        let membership = (0..self.regions)
            .map(|_| model.new_vars(order.len()))
            .collect_vec();

        for cell in 0..order.len() {
            model.add_clauses(exactly_one(&membership.iter().map(|region| region[cell].positive()).collect_vec()));
        }

        let mut roots = Vec::with_capacity(self.regions);
        for region in &membership {
            roots.push(self.encoding.encode(&mut model, &order, region, &GridAdjacency)
                .map_err(|err| vec![PartitionInvalidReason::Encoding(err)])?);

            if let Some(size) = self.region_size {
                model.add_exactly(&region.iter().map(|var| var.positive()).collect_vec(), size);
            }
        }

        for region in &membership {
            for UnorderedPair(a, b) in &self.separated {
                if let (Some(a), Some(b)) = (order.index_of(a), order.index_of(b)) {
                    model.add_clause(&[region[a].negative(), region[b].negative()]);
                }
            }
            for UnorderedPair(a, b) in &self.joined {
                if let (Some(a), Some(b)) = (order.index_of(a), order.index_of(b)) {
                    model.add_clause(&[region[a].negative(), region[b].positive()]);
                    model.add_clause(&[region[a].positive(), region[b].negative()]);
                }
            }
        }

        if self.symmetry_breaking {
            order_roots(&mut model, &roots.iter().collect_vec())
                .map_err(|err| vec![PartitionInvalidReason::Encoding(err)])?;
        }

        debug!(
            "partition of {} cells into {} regions ({}): {} variables, {} clauses",
            order.len(),
            self.regions,
            self.encoding,
            model.var_count(),
            model.clause_count(),
        );

        Ok(Partition::new(self.grid, model, order, membership, roots))
    }
}
