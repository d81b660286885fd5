#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::num::NonZero;
    use std::str::FromStr;

    use itertools::Itertools;
    use petgraph::graphmap::UnGraphMap;
    use petgraph::visit::Bfs;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use strum::VariantArray;
    use unordered_pair::UnorderedPair;
    use varisat::Var;

    use crate::adjacency::{GridAdjacency, SharedEndpoint};
    use crate::builder::{PartitionBuilder, PartitionInvalidReason};
    use crate::connectivity::{ConnectivityEncoder, EncodeError, Encoding};
    use crate::grid::Grid;
    use crate::location::Location;
    use crate::model::Model;
    use crate::order::{select_root, NodeOrder};
    use crate::parent::ParentPointer;
    use crate::percolation::Percolation;
    use crate::solver::{ModelSolver, SolveStatus};
    use crate::symmetry::order_roots;

    fn graph(n: usize, edges: &[(usize, usize)]) -> UnGraphMap<usize, ()> {
        let mut graph = UnGraphMap::new();
        for node in 0..n {
            graph.add_node(node);
        }
        for &(a, b) in edges {
            graph.add_edge(a, b, ());
        }
        graph
    }

    fn random_graph(rng: &mut StdRng, n: usize) -> UnGraphMap<usize, ()> {
        let edges = (0..n).tuple_combinations()
            .filter(|_| rng.gen_bool(0.35))
            .collect_vec();
        graph(n, &edges)
    }

    /// Breadth-first search over the subgraph induced by `subset`, independent of any encoding.
    fn is_connected(graph: &UnGraphMap<usize, ()>, subset: &[usize]) -> bool {
        let Some(&start) = subset.first() else {
            return false;
        };

        let mut induced = UnGraphMap::<usize, ()>::new();
        subset.iter().for_each(|node| { induced.add_node(*node); });
        for (a, b) in subset.iter().tuple_combinations() {
            if graph.contains_edge(*a, *b) {
                induced.add_edge(*a, *b, ());
            }
        }

        let mut bfs = Bfs::new(&induced, start);
        let mut seen = 0;
        while bfs.next(&induced).is_some() {
            seen += 1;
        }
        seen == subset.len()
    }

    fn subset_of(mask: usize, n: usize) -> Vec<usize> {
        (0..n).filter(|i| mask & (1 << i) != 0).collect_vec()
    }

    /// Encode connectivity over `graph` and return the model with its membership variables.
    fn encoded(encoding: Encoding, graph: &UnGraphMap<usize, ()>) -> (Model, Vec<Var>) {
        let order = NodeOrder::new(0..graph.node_count()).unwrap();
        let mut model = Model::new();
        let membership = model.new_vars(order.len());
        encoding.encode(&mut model, &order, &membership, graph).unwrap();
        (model, membership)
    }

    /// Every accepted membership set, as bitmasks.
    fn accepted_sets(model: &Model, membership: &[Var]) -> HashSet<usize> {
        let solutions = ModelSolver::from(model)
            .project(membership.iter().copied())
            .solve_all(|_| {})
            .unwrap();
        solutions.assignments.iter()
            .map(|assignment| membership.iter()
                .enumerate()
                .filter(|(_, var)| assignment.value(**var))
                .map(|(i, _)| 1usize << i)
                .sum::<usize>())
            .collect()
    }

    fn accepts(model: &Model, membership: &[Var], mask: usize) -> bool {
        ModelSolver::from(model)
            .project(membership.iter().copied())
            .assume(membership.iter().enumerate().map(|(i, var)| var.lit(mask & (1 << i) != 0)))
            .solve_one()
            .unwrap()
            .is_some()
    }

    #[test]
    fn root_is_first_active() {
        let mut model = Model::new();
        let membership = model.new_vars(5);
        let roots = select_root(&mut model, &membership).unwrap();

        let solutions = ModelSolver::from(&model)
            .project(membership.iter().copied())
            .solve_all(|_| {})
            .unwrap();
        // every non-empty subset of 5 nodes
        assert_eq!(solutions.assignments.len(), 31);
        assert_eq!(solutions.status, SolveStatus::Exhausted);

        for assignment in &solutions.assignments {
            let first_active = membership.iter().position(|x| assignment.value(*x));
            assert_eq!(roots.root_index(assignment), first_active);
            assert_eq!(roots.roots().iter().filter(|root| assignment.value(**root)).count(), 1);
        }
    }

    #[test]
    fn empty_active_set_is_infeasible() {
        for &encoding in Encoding::VARIANTS {
            let (model, membership) = encoded(encoding, &graph(4, &[(0, 1), (1, 2), (2, 3)]));
            assert!(!accepts(&model, &membership, 0));
        }
    }

    #[test]
    fn encoders_accept_exactly_connected_sets() {
        let graphs = [
            graph(4, &[(0, 1), (1, 2), (2, 3)]),
            // a path whose order zigzags: 0 - 3 - 1 - 4 - 2
            graph(5, &[(0, 3), (3, 1), (1, 4), (4, 2)]),
            graph(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (2, 5)]),
            // a cycle
            graph(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]),
            graph(7, &[(0, 6), (6, 1), (1, 5), (5, 2), (2, 4), (4, 3), (0, 3)]),
        ];

        for graph in &graphs {
            let n = graph.node_count();
            let expected: HashSet<usize> = (1..1 << n)
                .filter(|mask| is_connected(graph, &subset_of(*mask, n)))
                .collect();

            for &encoding in Encoding::VARIANTS {
                let (model, membership) = encoded(encoding, graph);
                assert_eq!(accepted_sets(&model, &membership), expected, "{} on {} nodes", encoding, n);
            }
        }
    }

    #[test]
    fn random_graphs_agree_with_search() {
        let mut rng = StdRng::seed_from_u64(0x15_7405);

        for round in 0..24 {
            let n = 2 + round % 11;
            let graph = random_graph(&mut rng, n);
            let parent = encoded(Encoding::ParentPointer, &graph);
            let percolation = encoded(Encoding::Percolation, &graph);

            for _ in 0..16 {
                let mask = rng.gen_range(1..1usize << n);
                let connected = is_connected(&graph, &subset_of(mask, n));
                assert_eq!(accepts(&parent.0, &parent.1, mask), connected, "parent-pointer, mask {mask:b}");
                assert_eq!(accepts(&percolation.0, &percolation.1, mask), connected, "percolation, mask {mask:b}");
            }
        }
    }

    #[test]
    fn random_graphs_solutions_are_connected() {
        let mut rng = StdRng::seed_from_u64(12);

        for n in [6, 9, 12] {
            let graph = random_graph(&mut rng, n);
            let (model, membership) = encoded(Encoding::ParentPointer, &graph);
            let solutions = ModelSolver::from(&model)
                .project(membership.iter().copied())
                .limit(40)
                .solve_all(|_| {})
                .unwrap();

            assert!(!solutions.assignments.is_empty());
            for assignment in &solutions.assignments {
                let active = (0..n).filter(|i| assignment.value(membership[*i])).collect_vec();
                assert!(is_connected(&graph, &active), "{active:?}");
            }
        }
    }

    #[test]
    fn center_forced_on_3x3() {
        let grid = Grid::with_dims((NonZero::new(3).unwrap(), NonZero::new(3).unwrap()));
        let order = grid.order().unwrap();
        let adjacency = graph(9, &order.nodes().iter()
            .enumerate()
            .tuple_combinations()
            .filter(|((_, a), (_, b))| a.manhattan(b) == 1)
            .map(|((i, _), (j, _))| (i, j))
            .collect_vec());
        let center = order.index_of(&Location(1, 1)).unwrap();

        let expected: HashSet<usize> = (1..1 << 9)
            .filter(|mask| mask & (1 << center) != 0)
            .filter(|mask| is_connected(&adjacency, &subset_of(*mask, 9)))
            .collect();

        for &encoding in Encoding::VARIANTS {
            let mut model = Model::new();
            let membership = grid.membership(&mut model);
            let membership = membership.iter().copied().collect_vec();
            model.fix(membership[center].positive());
            encoding.encode(&mut model, &order, &membership, &GridAdjacency).unwrap();

            assert_eq!(accepted_sets(&model, &membership), expected, "{}", encoding);
        }
    }

    #[test]
    fn corners_alone_are_rejected() {
        let grid = Grid::with_dims((NonZero::new(3).unwrap(), NonZero::new(3).unwrap()));
        let order = grid.order().unwrap();
        let mut model = Model::new();
        let membership = grid.membership(&mut model);
        let flat = membership.iter().copied().collect_vec();
        ParentPointer.encode(&mut model, &order, &flat, &GridAdjacency).unwrap();

        let corners = [Location(0, 0), Location(2, 2)];
        let solution = ModelSolver::from(&model)
            .assume(order.nodes().iter().map(|location| membership[location.as_index()].lit(corners.contains(location))))
            .solve_one()
            .unwrap();
        assert!(solution.is_none());

        // the same corners joined along the top row and right column
        let hook = [Location(0, 0), Location(1, 0), Location(2, 0), Location(2, 1), Location(2, 2)];
        let solution = ModelSolver::from(&model)
            .assume(order.nodes().iter().map(|location| membership[location.as_index()].lit(hook.contains(location))))
            .solve_one()
            .unwrap();
        assert!(solution.is_some());
    }

    #[test]
    fn isolated_node_must_be_the_root() {
        let graph = graph(3, &[(1, 2)]);
        for &encoding in Encoding::VARIANTS {
            let (model, membership) = encoded(encoding, &graph);
            assert!(accepts(&model, &membership, 0b001));
            assert!(accepts(&model, &membership, 0b110));
            assert!(!accepts(&model, &membership, 0b011));
            assert!(!accepts(&model, &membership, 0b111));
        }
    }

    #[test]
    fn parents_form_a_tree() {
        let graph = graph(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (1, 4)]);
        let order = NodeOrder::new(0..6).unwrap();
        let mut model = Model::new();
        let membership = model.new_vars(6);
        let tree = ParentPointer.encode_tree(&mut model, &order, &membership, &graph).unwrap();

        let solutions = ModelSolver::from(&model)
            .project(membership.iter().copied())
            .solve_all(|_| {})
            .unwrap();
        for assignment in &solutions.assignments {
            let root = tree.roots().root_index(assignment).unwrap();
            assert_eq!(tree.parent_of(root, assignment), None);
            assert_eq!(tree.rank_of(root, assignment), 0);

            for child in (0..6).filter(|i| *i != root && assignment.value(membership[*i])) {
                let parent = tree.parent_of(child, assignment).unwrap();
                assert!(graph.contains_edge(child, parent));
                assert!(assignment.value(membership[parent]));
                assert!(tree.rank_of(parent, assignment) < tree.rank_of(child, assignment));
                assert!(tree.parent_var(child, parent).is_some_and(|var| assignment.value(var)));
            }
        }
    }

    #[test]
    fn percolation_layers_are_distances() {
        // path 0 - 1 - 2 - 3 - 4
        let graph = graph(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        let order = NodeOrder::new(0..5).unwrap();
        let mut model = Model::new();
        let membership = model.new_vars(5);
        let reach = Percolation::default().encode_layers(&mut model, &order, &membership, &graph).unwrap();
        assert_eq!(reach.depth(), 4);

        let assignment = ModelSolver::from(&model)
            .assume(membership[1..].iter().map(|var| var.positive()).chain([membership[0].negative()]))
            .solve_one()
            .unwrap()
            .unwrap();
        assert_eq!(reach.roots().root_index(&assignment), Some(1));
        assert_eq!((0..5).map(|node| reach.first_reached(node, &assignment)).collect_vec(),
                   vec![None, Some(0), Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn truncated_percolation_rejects_long_paths() {
        let graph = graph(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        let order = NodeOrder::new(0..5).unwrap();
        let mut model = Model::new();
        let membership = model.new_vars(5);
        Percolation::with_layers(2).encode(&mut model, &order, &membership, &graph).unwrap();

        assert!(accepts(&model, &membership, 0b00111));
        assert!(!accepts(&model, &membership, 0b01111));
    }

    #[test]
    fn many_percolation_checks_share_a_model() {
        let graph = graph(4, &[(0, 1), (1, 2), (2, 3)]);
        let order = NodeOrder::new(0..4).unwrap();
        let mut model = Model::new();
        let labels = (0..3).map(|_| model.new_vars(4)).collect_vec();
        for membership in &labels {
            Percolation::default().encode(&mut model, &order, membership, &graph).unwrap();
        }

        let fixed = [0b0011, 0b1100, 0b0110];
        let solution = ModelSolver::from(&model)
            .assume(labels.iter().zip(fixed).flat_map(|(membership, mask)| membership.iter()
                .enumerate()
                .map(move |(i, var)| var.lit(mask & (1 << i) != 0))))
            .solve_one()
            .unwrap();
        assert!(solution.is_some());

        let broken = [0b0011, 0b1001, 0b0110];
        let solution = ModelSolver::from(&model)
            .assume(labels.iter().zip(broken).flat_map(|(membership, mask)| membership.iter()
                .enumerate()
                .map(move |(i, var)| var.lit(mask & (1 << i) != 0))))
            .solve_one()
            .unwrap();
        assert!(solution.is_none());
    }

    #[test]
    fn single_loop_over_edges() {
        // the four sides of one square cell; the marked sides must connect through shared corners
        let grid = Grid::with_dims((NonZero::new(2).unwrap(), NonZero::new(2).unwrap()));
        let edges = grid.edges();
        assert_eq!(edges.len(), 4);
        let order = NodeOrder::new(edges.iter().copied()).unwrap();

        let mut model = Model::new();
        let membership = model.new_vars(order.len());
        ParentPointer.encode(&mut model, &order, &membership, &SharedEndpoint).unwrap();

        let top = order.index_of(&UnorderedPair(Location(0, 0), Location(1, 0))).unwrap();
        let bottom = order.index_of(&UnorderedPair(Location(0, 1), Location(1, 1))).unwrap();
        let left = order.index_of(&UnorderedPair(Location(0, 0), Location(0, 1))).unwrap();

        assert!(!accepts(&model, &membership, 1 << top | 1 << bottom));
        assert!(accepts(&model, &membership, 1 << top | 1 << bottom | 1 << left));
        assert!(accepts(&model, &membership, 0b1111));
    }

    #[test]
    fn symmetry_breaking_keeps_partitions() {
        for (regions, size, relabelings) in [(2, 3, 2), (3, 2, 6)] {
            let mut builder = PartitionBuilder::with_dims((NonZero::new(3).unwrap(), NonZero::new(2).unwrap()));
            builder.regions(regions).region_size(size);

            let (ordered, status) = builder.clone().symmetry_breaking(true).build().unwrap().solve_all(None).unwrap();
            let (all, _) = builder.clone().symmetry_breaking(false).build().unwrap().solve_all(None).unwrap();
            assert_eq!(status, SolveStatus::Exhausted);

            let ordered_canonical: HashSet<_> = ordered.iter().map(|p| p.canonical()).collect();
            let all_canonical: HashSet<_> = all.iter().map(|p| p.canonical()).collect();
            assert_eq!(ordered_canonical, all_canonical);
            // one representative per partition with ordering, one per relabeling without
            assert_eq!(ordered.len(), ordered_canonical.len());
            assert_eq!(all.len(), ordered.len() * relabelings);
        }
    }

    #[test]
    fn symmetry_ordered_roots_increase() {
        let mut builder = PartitionBuilder::with_dims((NonZero::new(3).unwrap(), NonZero::new(3).unwrap()));
        builder.regions(3).region_size(3).encoding(Encoding::Percolation);
        let partition = builder.build().unwrap();

        let solutions = ModelSolver::from(partition.model()).limit(10).solve_all(|_| {}).unwrap();
        assert!(!solutions.assignments.is_empty());
        for assignment in &solutions.assignments {
            let roots = partition.roots().iter()
                .map(|handles| handles.root_index(assignment).unwrap())
                .collect_vec();
            assert!(roots.windows(2).all(|pair| pair[0] < pair[1]), "{roots:?}");
        }
    }

    #[test]
    fn encodings_agree_on_partitions() {
        let count = |encoding| {
            let mut builder = PartitionBuilder::with_dims((NonZero::new(4).unwrap(), NonZero::new(2).unwrap()));
            builder.regions(2).region_size(4).encoding(encoding);
            builder.build().unwrap().solve_all(None).unwrap().0.len()
        };
        assert_eq!(count(Encoding::ParentPointer), count(Encoding::Percolation));
    }

    #[test]
    fn partition_with_walls_and_holes() {
        let partition = PartitionBuilder::with_dims((NonZero::new(5).unwrap(), NonZero::new(1).unwrap()))
            .regions(2)
            .region_size(2)
            .drop_location(Location(2, 0))
            .build()
            .unwrap();
        let (solutions, _) = partition.solve_all(None).unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(format!("{}", solutions[0]), "aa.bb\n");

        let partition = PartitionBuilder::with_dims((NonZero::new(4).unwrap(), NonZero::new(2).unwrap()))
            .regions(2)
            .region_size(4)
            .separate(UnorderedPair(Location(0, 0), Location(0, 1)))
            .join(UnorderedPair(Location(0, 1), Location(3, 1)))
            .build()
            .unwrap();
        let (solutions, _) = partition.solve_all(None).unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(format!("{}", solutions[0]), "aaaa\nbbbb\n");
        assert_eq!(solutions[0].region_of(Location(3, 1)), Some(1));
    }

    #[test]
    fn partition_invalid_reasons() {
        let dims = (NonZero::new(3).unwrap(), NonZero::new(3).unwrap());

        let mut builder = PartitionBuilder::with_dims(dims);
        builder.drop_location(Location(3, 0)).drop_location(Location(0, 0));
        assert_eq!(builder.is_valid(), Some(&vec![PartitionInvalidReason::FeatureOutOfBounds]));
        assert_eq!(builder.build().err(), Some(vec![PartitionInvalidReason::FeatureOutOfBounds]));

        assert_eq!(PartitionBuilder::with_dims(dims).regions(2).region_size(4).build().err(),
                   Some(vec![PartitionInvalidReason::SizeMismatch]));
        assert_eq!(PartitionBuilder::with_dims(dims).regions(10).build().err(),
                   Some(vec![PartitionInvalidReason::TooManyRegions]));
        assert_eq!(PartitionBuilder::with_dims(dims).regions(0).build().err(),
                   Some(vec![PartitionInvalidReason::NoRegions]));
        assert_eq!(PartitionBuilder::with_dims(dims)
                       .drop_location(Location(1, 1))
                       .join(UnorderedPair(Location(1, 1), Location(0, 0)))
                       .build()
                       .err(),
                   Some(vec![PartitionInvalidReason::DroppedLocation]));
    }

    #[test]
    fn infeasible_partition_reports_status() {
        // a 3x1 strip cannot hold two separated cells and a third joined to both
        let partition = PartitionBuilder::with_dims((NonZero::new(3).unwrap(), NonZero::new(1).unwrap()))
            .regions(2)
            .separate(UnorderedPair(Location(0, 0), Location(2, 0)))
            .join(UnorderedPair(Location(0, 0), Location(1, 0)))
            .join(UnorderedPair(Location(1, 0), Location(2, 0)))
            .build()
            .unwrap();
        let (solutions, status) = partition.solve_all(None).unwrap();
        assert!(solutions.is_empty());
        assert_eq!(status, SolveStatus::Infeasible);
        assert!(partition.solve().unwrap().is_none());
    }

    #[test]
    fn solution_limit() {
        let (model, membership) = encoded(Encoding::ParentPointer, &graph(4, &[(0, 1), (1, 2), (2, 3)]));
        let mut seen = 0;
        let solutions = ModelSolver::from(&model)
            .project(membership)
            .limit(3)
            .solve_all(|_| seen += 1)
            .unwrap();
        assert_eq!(solutions.assignments.len(), 3);
        assert_eq!(seen, 3);
        assert_eq!(solutions.status, SolveStatus::LimitReached);
    }

    #[test]
    fn exactly_k_counts() {
        let mut model = Model::new();
        let vars = model.new_vars(5);
        model.add_exactly(&vars.iter().map(|var| var.positive()).collect_vec(), 2);

        let solutions = ModelSolver::from(&model).project(vars.iter().copied()).solve_all(|_| {}).unwrap();
        assert_eq!(solutions.assignments.len(), 10);
        for assignment in &solutions.assignments {
            assert_eq!(vars.iter().filter(|var| assignment.value(**var)).count(), 2);
        }

        let mut model = Model::new();
        let vars = model.new_vars(2);
        model.add_exactly(&vars.iter().map(|var| var.positive()).collect_vec(), 3);
        assert!(ModelSolver::from(&model).solve_one().unwrap().is_none());
    }

    #[test]
    fn precondition_errors() {
        let graph = graph(3, &[(0, 1), (1, 2)]);
        let mut model = Model::new();
        let membership = model.new_vars(2);

        assert_eq!(NodeOrder::<usize>::new([]).err(), Some(EncodeError::EmptyOrder));
        assert_eq!(NodeOrder::new([0, 1, 0]).err(), Some(EncodeError::DuplicateNode { position: 2 }));

        let full = NodeOrder::new(0..3).unwrap();
        let clauses = model.clause_count();
        assert_eq!(ParentPointer.encode(&mut model, &full, &membership, &graph).err(),
                   Some(EncodeError::MembershipMismatch { nodes: 3, membership: 2 }));

        let partial = NodeOrder::new(0..2).unwrap();
        assert_eq!(Percolation::default().encode(&mut model, &partial, &membership, &graph).err(),
                   Some(EncodeError::NodeMissingFromOrder));
        assert_eq!(model.clause_count(), clauses);

        let short = select_root(&mut model, &membership).unwrap();
        let more = model.new_vars(3);
        let long = select_root(&mut model, &more).unwrap();
        assert_eq!(order_roots(&mut model, &[&short, &long]).err(),
                   Some(EncodeError::RegionLengthMismatch { expected: 2, found: 3 }));
    }

    #[test]
    #[should_panic(expected = "not symmetric")]
    #[cfg(debug_assertions)]
    fn asymmetric_adjacency_panics() {
        let order = NodeOrder::new(0..3usize).unwrap();
        let mut model = Model::new();
        let membership = model.new_vars(3);
        let _ = ParentPointer.encode(&mut model, &order, &membership, &|a: &usize, b: &usize| *b == a + 1);
    }

    #[test]
    fn encoding_names() {
        assert_eq!(Encoding::from_str("percolation").unwrap(), Encoding::Percolation);
        assert_eq!(Encoding::from_str("parent-pointer").unwrap(), Encoding::ParentPointer);
        assert!(Encoding::from_str("flood").is_err());
        assert_eq!(Encoding::default().to_string(), "parent-pointer");
    }
}
