use std::time::Instant;

use ndarray::prelude::*;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use rayon::prelude::*;

use super::algorithm_b::UnreachablePolicy;
use super::cost_function::CostFunction;
use super::error::{TapError, TapResult};
use super::input_graph::InputGraph;
use super::origin::Origin;
use super::results::LinkFlow;
use super::root_finding::{RootSolver, RootSolverKind};
use super::shortest_path::shortest_path_tree;
use super::TrafficAssignmentSolver;


#[derive(Clone, Debug, PartialEq)]
pub struct FrankWolfeParams {
    /// Used for the line search along each descent direction.
    pub root_solver: RootSolverKind,
    pub unreachable: UnreachablePolicy,
}

impl Default for FrankWolfeParams {
    fn default() -> FrankWolfeParams {
        FrankWolfeParams {
            root_solver: RootSolverKind::default(),
            unreachable: UnreachablePolicy::Warn,
        }
    }
}


/// The link-based Frank-Wolfe method: repeatedly load all demand onto shortest paths and
/// move the current flows part of the way towards that loading.  Slow to converge, but
/// simple enough to serve as a reference for the bush-based solver.
pub struct FrankWolfeSolver {
    graph: DiGraph<(), CostFunction>,
    origins: Vec<Origin>,
    flows: Array1<f64>,
    costs: Array1<f64>,
    params: FrankWolfeParams,
    iterations_run: usize,
}

impl FrankWolfeSolver {
    pub fn new(input: &InputGraph, params: FrankWolfeParams) -> TapResult<FrankWolfeSolver> {
        input.validate()?;
        let mut graph = DiGraph::with_capacity(input.num_nodes(), input.num_links());
        let nodes: Vec<NodeIndex> = (0..input.num_nodes()).map(|_| graph.add_node(())).collect();
        for (from, to, cost_fn) in input.links() {
            if from != to {
                graph.add_edge(nodes[from], nodes[to], cost_fn.clone());
            }
        }

        let mut origins = Origin::from_demand(input);
        let zero_costs: Array1<f64> = graph.edge_weights().map(|cf| cf.eval(0.)).collect();
        for origin in origins.iter_mut() {
            let (dists, _) = shortest_path_tree(&graph, nodes[origin.node()],
                                                |ei| zero_costs[ei.index()]);
            let unreachable: Vec<usize> = origin.destinations().iter()
                .map(|&(dest, _)| dest)
                .filter(|&dest| dists[dest].is_infinite())
                .collect();
            if unreachable.is_empty() {
                continue;
            }
            match params.unreachable {
                UnreachablePolicy::Reject => return Err(TapError::UnreachableDestination {
                    origin: origin.node(),
                    destinations: unreachable,
                }),
                UnreachablePolicy::Warn => {
                    log::warn!("Dropping demand from {} to unreachable destinations {:?}",
                               origin.node(), unreachable);
                    origin.remove_destinations(&unreachable);
                }
            }
        }

        let mut solver = FrankWolfeSolver {
            graph,
            origins,
            flows: Array1::zeros(0),
            costs: zero_costs,
            params,
            iterations_run: 0,
        };
        solver.flows = solver.all_or_nothing();
        solver.update_costs();
        Ok(solver)
    }

    pub fn iterations_run(&self) -> usize {
        self.iterations_run
    }

    pub fn flows(&self) -> &Array1<f64> {
        &self.flows
    }

    fn update_costs(&mut self) {
        for (ii, cost_fn) in self.graph.edge_weights().enumerate() {
            self.costs[ii] = cost_fn.eval(self.flows[ii]);
        }
    }

    /// Link flows from sending every origin's demand along its shortest paths at the
    /// current costs.  Origins are routed in parallel and their flows added up in order.
    fn all_or_nothing(&self) -> Array1<f64> {
        let graph = &self.graph;
        let costs = &self.costs;
        let per_origin: Vec<Array1<f64>> = self.origins.par_iter()
            .map(|origin| {
                let (_, pred_edges) = shortest_path_tree(graph, NodeIndex::new(origin.node()),
                                                         |ei| costs[ei.index()]);
                let mut flows = Array1::zeros(graph.edge_count());
                for &(dest, demand) in origin.destinations() {
                    let mut edge = pred_edges[dest];
                    while let Some(ei) = edge {
                        flows[ei.index()] += demand;
                        edge = match graph.edge_endpoints(ei) {
                            Some((tail, _)) => pred_edges[tail.index()],
                            None => None,
                        };
                    }
                }
                flows
            })
            .collect();
        per_origin.iter().fold(Array1::zeros(graph.edge_count()), |acc, flows| acc + flows)
    }

    /// Finds the step along `direction` where the total cost stops decreasing, as the root
    /// of sum(direction * cost(flows + step * direction)) on [0, 1].
    fn line_search(&self, direction: &Array1<f64>) -> f64 {
        let weights: Vec<(&CostFunction, f64, f64)> = self.graph.edge_weights()
            .zip(self.flows.iter().zip(direction.iter()))
            .filter(|&(_, (_, dd))| *dd != 0.)
            .map(|(cf, (&flow, &dd))| (cf, flow, dd))
            .collect();
        let derivative = |step: f64| -> f64 {
            weights.iter().map(|&(cf, flow, dd)| dd * cf.eval(flow + step * dd)).sum()
        };
        let step = self.params.root_solver.solve(derivative, 0., 1.);
        if step.is_nan() { 0. } else { step.max(0.).min(1.) }
    }

    fn edge_index(&self, from: usize, to: usize) -> Option<EdgeIndex> {
        if from >= self.graph.node_count() || to >= self.graph.node_count() {
            return None;
        }
        self.graph.find_edge(NodeIndex::new(from), NodeIndex::new(to))
    }

    pub fn edge_flow(&self, from: usize, to: usize) -> Option<f64> {
        self.edge_index(from, to).map(|ei| self.flows[ei.index()])
    }

    fn lower_bound(&self) -> f64 {
        self.all_or_nothing().dot(&self.costs)
    }

    fn total_demand(&self) -> f64 {
        self.origins.iter().map(|origin| origin.total_demand()).sum()
    }
}

impl TrafficAssignmentSolver for FrankWolfeSolver {
    /// Runs until the step length falls to `accuracy` or below, or for `iteration_limit`
    /// iterations.
    fn solve(&mut self, iteration_limit: usize, accuracy: f64) {
        let start_time = Instant::now();
        for iteration in 0..iteration_limit {
            let direction = self.all_or_nothing() - &self.flows;
            let step = self.line_search(&direction);
            self.flows.scaled_add(step, &direction);
            self.flows.mapv_inplace(|flow| flow.max(0.));
            self.update_costs();
            self.iterations_run += 1;
            log::debug!("Frank-Wolfe iteration {}: step {}", iteration, step);
            if step <= accuracy {
                break;
            }
        }
        log::info!("Frank-Wolfe ran {} iterations in {}s", self.iterations_run,
                   start_time.elapsed().as_secs_f64());
    }

    fn relative_gap(&self) -> f64 {
        let upper = self.total_cost();
        if upper <= 0. {
            return 0.;
        }
        1. - self.lower_bound() / upper
    }

    fn average_excess_cost(&self) -> f64 {
        let demand = self.total_demand();
        if demand <= 0. {
            return 0.;
        }
        (self.total_cost() - self.lower_bound()) / demand
    }

    fn link_flows(&self) -> Vec<LinkFlow> {
        self.graph.edge_indices()
            .filter_map(|ei| {
                let (tail, head) = self.graph.edge_endpoints(ei)?;
                Some(LinkFlow {
                    from: tail.index(),
                    to: head.index(),
                    flow: self.flows[ei.index()],
                    cost: self.costs[ei.index()],
                })
            })
            .collect()
    }

    fn total_cost(&self) -> f64 {
        self.flows.iter()
            .zip(self.costs.iter())
            .filter(|&(flow, _)| *flow != 0.)
            .map(|(flow, cost)| flow * cost)
            .sum()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm_b::{AlgorithmBParams, AlgorithmBSolver};
    use crate::test_utils::{three_route_network, two_route_network};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_two_routes_exact() {
        let mut solver = FrankWolfeSolver::new(&two_route_network(10.),
                                               FrankWolfeParams::default()).unwrap();
        assert!(solver.relative_gap() > 0.);
        solver.solve(10, 1e-9);
        assert_abs_diff_eq!(solver.edge_flow(0, 1).unwrap(), 5., epsilon = 1e-9);
        assert_abs_diff_eq!(solver.edge_flow(0, 2).unwrap(), 5., epsilon = 1e-9);
        assert!(solver.relative_gap().abs() < 1e-9);
        assert_eq!(solver.iterations_run(), 2);
        assert_eq!(solver.edge_flow(3, 0), None);
    }

    #[test]
    fn test_agrees_with_algorithm_b() {
        let input = three_route_network();
        let mut fw = FrankWolfeSolver::new(&input, FrankWolfeParams::default()).unwrap();
        fw.solve(200, 1e-12);
        let mut ab = AlgorithmBSolver::new(&input, AlgorithmBParams::default()).unwrap();
        ab.solve(20, 1e-10);

        assert!(fw.relative_gap() < 0.02);
        let (fw_cost, ab_cost) = (fw.total_cost(), ab.total_cost());
        assert!((fw_cost - ab_cost).abs() / ab_cost < 0.02);
        let fw_links = fw.link_flows();
        let ab_links = ab.link_flows();
        assert_eq!(fw_links.len(), ab_links.len());
        for (fw_link, ab_link) in fw_links.iter().zip(ab_links.iter()) {
            assert_eq!((fw_link.from, fw_link.to), (ab_link.from, ab_link.to));
            assert!((fw_link.flow - ab_link.flow).abs() < 0.5);
        }
    }

    #[test]
    fn test_unreachable_rejected() {
        let mut input = three_route_network();
        input.add_demand(4, 1, 1.);
        let params = FrankWolfeParams {
            unreachable: UnreachablePolicy::Reject,
            ..FrankWolfeParams::default()
        };
        assert!(matches!(FrankWolfeSolver::new(&input, params),
                         Err(TapError::UnreachableDestination { origin: 4, .. })));
        let solver = FrankWolfeSolver::new(&input, FrankWolfeParams::default()).unwrap();
        assert_eq!(solver.total_demand(), 20.);
    }
}
