use rand::SeedableRng;
use rand_isaac::Isaac64Rng;

use super::cost_function::CostFunction;
use super::input_graph::InputGraph;
use super::synthetic::generate_grid_network;


/// Three parallel two-link routes from 0 to 4 through nodes 1, 2 and 3, with first links
/// costing 1 + x, 2 + x and 3 + x and second links a constant 1.  At equilibrium 20 units
/// split 23/3, 20/3 and 17/3.
pub fn three_route_network() -> InputGraph {
    let mut input = InputGraph::new();
    for mid in 1..4 {
        input.add_edge(0, mid, CostFunction::polynomial(vec![mid as f64, 1.]));
        input.add_edge(mid, 4, CostFunction::constant(1.));
    }
    input.add_demand(0, 4, 20.);
    input
}

/// Braess's network, with 6 units from 0 to 3.
pub fn braess_network() -> InputGraph {
    let mut input = InputGraph::new();
    input.add_edge(0, 1, CostFunction::polynomial(vec![0., 10.]));
    input.add_edge(1, 3, CostFunction::polynomial(vec![50., 1.]));
    input.add_edge(0, 2, CostFunction::polynomial(vec![50., 1.]));
    input.add_edge(2, 3, CostFunction::polynomial(vec![0., 10.]));
    input.add_edge(1, 2, CostFunction::polynomial(vec![10., 1.]));
    input.add_demand(0, 3, 6.);
    input
}

/// Two identical routes from 0 to 3, so `demand` splits evenly.
pub fn two_route_network(demand: f64) -> InputGraph {
    let mut input = InputGraph::new();
    for &mid in &[1, 2] {
        input.add_edge(0, mid, CostFunction::polynomial(vec![1., 1.]));
        input.add_edge(mid, 3, CostFunction::constant(1.));
    }
    input.add_demand(0, 3, demand);
    input
}

pub fn grid_network(num_x_nodes: usize, num_y_nodes: usize, num_od_pairs: usize, seed: u64)
                    -> InputGraph {
    let mut rng = Isaac64Rng::seed_from_u64(seed);
    generate_grid_network(num_x_nodes, num_y_nodes, num_od_pairs, 200., &mut rng)
}
