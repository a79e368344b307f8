use itertools::{iproduct, Itertools};
use rand::seq::SliceRandom;
use rand::Rng;

use super::cost_function::CostFunction;
use super::input_graph::InputGraph;


/// Generates a grid of `num_x_nodes` by `num_y_nodes` intersections joined by two-way streets
/// with random BPR costs, and spreads `total_demand` evenly over `num_od_pairs` random
/// origin-destination pairs.
pub fn generate_grid_network<RR>(num_x_nodes: usize, num_y_nodes: usize, num_od_pairs: usize,
                                 total_demand: f64, rng: &mut RR) -> InputGraph
    where RR: Rng {
    let num_nodes = num_x_nodes * num_y_nodes;
    let mut input = InputGraph::new();
    input.set_nodes(num_nodes);

    let node_id = |x_idx: usize, y_idx: usize| y_idx * num_x_nodes + x_idx;
    for (y_idx, x_idx) in iproduct!(0..num_y_nodes, 0..num_x_nodes) {
        let this_id = node_id(x_idx, y_idx);
        let mut others = vec![];
        if x_idx + 1 < num_x_nodes {
            others.push(node_id(x_idx + 1, y_idx));
        }
        if y_idx + 1 < num_y_nodes {
            others.push(node_id(x_idx, y_idx + 1));
        }
        for other_id in others {
            // each direction gets its own capacity, so the network is asymmetric
            for &(from, to) in &[(this_id, other_id), (other_id, this_id)] {
                let zero_flow_time = rng.gen_range(1.0..10.0);
                let capacity = rng.gen_range(5.0..50.0);
                input.add_edge(from, to, CostFunction::bpr(zero_flow_time, capacity, 0.15, 4.,
                                                           0.));
            }
        }
    }

    let mut pairs: Vec<(usize, usize)> = (0..num_nodes).permutations(2)
        .map(|pair| (pair[0], pair[1]))
        .collect();
    pairs.shuffle(rng);
    let chosen = &pairs[..num_od_pairs.min(pairs.len())];
    if !chosen.is_empty() {
        let demand_per_pair = total_demand / chosen.len() as f64;
        for &(from, to) in chosen {
            input.add_demand(from, to, demand_per_pair);
        }
    }
    log::debug!("Generated a {}x{} grid with {} links and {} O-D pairs", num_x_nodes,
                num_y_nodes, input.num_links(), chosen.len());
    input
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_isaac::Isaac64Rng;

    #[test]
    fn test_grid_shape() {
        let mut rng = Isaac64Rng::seed_from_u64(3);
        let input = generate_grid_network(3, 2, 4, 100., &mut rng);
        assert_eq!(input.num_nodes(), 6);
        // 4 horizontal and 3 vertical streets, both ways
        assert_eq!(input.num_links(), 2 * (2 * 2 + 3));
        assert!((input.total_demand() - 100.).abs() < 1e-9);
        let num_pairs: usize = input.demand().values().map(|dests| dests.len()).sum();
        assert_eq!(num_pairs, 4);
        for (from, to, cost_fn) in input.links() {
            assert!(from != to);
            assert!(cost_fn.eval(0.) >= 1.);
        }
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_seeded_generation_repeats() {
        let first = generate_grid_network(4, 4, 10, 50., &mut Isaac64Rng::seed_from_u64(9));
        let second = generate_grid_network(4, 4, 10, 50., &mut Isaac64Rng::seed_from_u64(9));
        assert_eq!(first.demand(), second.demand());
        let first_costs: Vec<f64> = first.links().map(|(_, _, cf)| cf.eval(10.)).collect();
        let second_costs: Vec<f64> = second.links().map(|(_, _, cf)| cf.eval(10.)).collect();
        assert_eq!(first_costs, second_costs);
    }

    #[test]
    fn test_more_pairs_than_exist() {
        let mut rng = Isaac64Rng::seed_from_u64(1);
        let input = generate_grid_network(2, 1, 10, 6., &mut rng);
        // only 0 -> 1 and 1 -> 0 exist
        let num_pairs: usize = input.demand().values().map(|dests| dests.len()).sum();
        assert_eq!(num_pairs, 2);
        assert!((input.total_demand() - 6.).abs() < 1e-9);
    }
}
