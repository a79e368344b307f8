use std::time::Instant;

use rayon::prelude::*;

use super::bush::Bush;
use super::error::{TapError, TapResult};
use super::graph::Graph;
use super::input_graph::InputGraph;
use super::labels::Workspace;
use super::origin::Origin;
use super::results::{graph_link_flows, LinkFlow};
use super::root_finding::RootSolverKind;
use super::{NodeId, TrafficAssignmentSolver};


/// What to do with demand towards destinations the origin cannot reach.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UnreachablePolicy {
    /// Fail construction with `TapError::UnreachableDestination`.
    Reject,
    /// Log a warning and drop the unreachable demand.
    Warn,
}

/// How a new bush orders nodes at equal distance from its origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TieBreak {
    /// Arc (u, v) is taken when u is nearer the origin, or equally near with a smaller id.
    /// A node reached only through a zero-cost arc from a higher-numbered node at the same
    /// distance is left without a path.
    DistanceThenId,
    /// Arc (u, v) is taken when Dijkstra settles u before v.
    SettleOrder,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AlgorithmBParams {
    /// Bush arcs carrying no more than this are treated as unused.
    pub used_flow_epsilon: f64,
    /// Bushes that stopped changing are re-checked every this many iterations.
    pub lazy_recheck_period: usize,
    pub root_solver: RootSolverKind,
    pub equilibration_pass_limit: usize,
    pub unreachable: UnreachablePolicy,
    pub tie_break: TieBreak,
}

impl Default for AlgorithmBParams {
    fn default() -> AlgorithmBParams {
        AlgorithmBParams {
            used_flow_epsilon: 1e-10,
            lazy_recheck_period: 4,
            root_solver: RootSolverKind::default(),
            equilibration_pass_limit: 1000,
            unreachable: UnreachablePolicy::Warn,
            tie_break: TieBreak::DistanceThenId,
        }
    }
}


/// Origin-based equilibrium assignment: one bush per origin, each equilibrated in turn
/// against link costs shared through a single graph.
pub struct AlgorithmBSolver {
    graph: Graph,
    origins: Vec<Origin>,
    bushes: Vec<Bush>,
    // indices into `bushes`
    active: Vec<usize>,
    lazy: Vec<usize>,
    // counted across calls to `solve`, so lazy re-checks keep their schedule
    iterations_run: usize,
    workspace: Workspace,
    params: AlgorithmBParams,
}

impl AlgorithmBSolver {
    pub fn new(input: &InputGraph, params: AlgorithmBParams) -> TapResult<AlgorithmBSolver> {
        input.validate()?;
        let start_time = Instant::now();
        let mut graph = Graph::new(input);
        let mut workspace = Workspace::new(graph.num_vertices());
        let mut origins = Origin::from_demand(input);
        let mut bushes = Vec::with_capacity(origins.len());
        for origin in origins.iter_mut() {
            let bush = match Bush::new(origin, &mut graph, &mut workspace, &params) {
                Ok(bush) => bush,
                Err(TapError::UnreachableDestination { origin: node, destinations })
                    if params.unreachable == UnreachablePolicy::Warn => {
                    log::warn!("Dropping demand from {} to unreachable destinations {:?}",
                               node, destinations);
                    origin.remove_destinations(&destinations);
                    Bush::new(origin, &mut graph, &mut workspace, &params)?
                }
                Err(err) => return Err(err),
            };
            bushes.push(bush);
        }
        log::info!("Built {} bushes in {}s", bushes.len(), start_time.elapsed().as_secs_f64());

        let active = (0..bushes.len()).collect();
        Ok(AlgorithmBSolver {
            graph,
            origins,
            bushes,
            active,
            lazy: vec![],
            iterations_run: 0,
            workspace,
            params,
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn origins(&self) -> &[Origin] {
        &self.origins
    }

    pub fn bushes(&self) -> &[Bush] {
        &self.bushes
    }

    /// Iterations run over every call to `solve`.
    pub fn iterations_run(&self) -> usize {
        self.iterations_run
    }

    pub fn num_active(&self) -> usize {
        self.active.len()
    }

    pub fn edge_flow(&self, from: NodeId, to: NodeId) -> Option<f64> {
        self.graph.find_edge(from, to).map(|arc| self.graph.edge_ref(arc).flow())
    }

    /// The total demand that is actually being assigned.
    pub fn total_demand(&self) -> f64 {
        self.origins.iter().map(|origin| origin.total_demand()).sum()
    }

    /// Demand-weighted shortest path cost over the whole network, at current costs.
    pub fn lower_bound(&self) -> f64 {
        let graph = &self.graph;
        let per_origin: Vec<f64> = self.origins.par_iter()
            .map(|origin| {
                let distances = graph.shortest_distances(origin.node());
                origin.destinations().iter()
                    .map(|&(dest, demand)| demand * distances[dest])
                    .sum::<f64>()
            })
            .collect();
        // summed in origin order so the result does not depend on thread scheduling
        per_origin.iter().sum()
    }

    /// The number of bush arcs carrying flow, summed over bushes.
    pub fn used_arc_count(&self) -> usize {
        self.bushes.iter().map(|bush| bush.give_count(self.params.used_flow_epsilon)).sum()
    }

    /// The largest difference between max and min path costs within any bush.
    pub fn max_difference(&mut self) -> f64 {
        let mut worst = 0.;
        for (bush, origin) in self.bushes.iter().zip(self.origins.iter()) {
            let diff = bush.max_difference(origin, &self.graph, &mut self.workspace,
                                           self.params.used_flow_epsilon);
            if diff > worst {
                worst = diff;
            }
        }
        worst
    }
}

impl TrafficAssignmentSolver for AlgorithmBSolver {
    /// Fixes every active bush once per iteration.  Bushes whose flows did not change are
    /// set aside, and every `lazy_recheck_period` iterations they are fixed again and
    /// brought back if that changed them.  Stops early once a re-check finds every bush
    /// settled.
    fn solve(&mut self, iteration_limit: usize, accuracy: f64) {
        let start_time = Instant::now();
        let period = self.params.lazy_recheck_period.max(1);
        for _ in 0..iteration_limit {
            self.iterations_run += 1;
            let mut still_active = Vec::with_capacity(self.active.len());
            for &bi in self.active.iter() {
                if self.bushes[bi].fix(&self.origins[bi], &mut self.graph, &mut self.workspace,
                                       &self.params, accuracy) {
                    still_active.push(bi);
                } else {
                    self.lazy.push(bi);
                }
            }
            self.active = still_active;

            if self.iterations_run % period == 0 {
                let mut still_lazy = Vec::with_capacity(self.lazy.len());
                for &bi in self.lazy.iter() {
                    if self.bushes[bi].fix(&self.origins[bi], &mut self.graph,
                                           &mut self.workspace, &self.params, accuracy) {
                        self.active.push(bi);
                    } else {
                        still_lazy.push(bi);
                    }
                }
                self.lazy = still_lazy;
                log::debug!("Iteration {}: {} active and {} lazy bushes", self.iterations_run,
                            self.active.len(), self.lazy.len());
                if self.active.is_empty() {
                    log::info!("All bushes settled after {} iterations", self.iterations_run);
                    break;
                }
            }
        }
        log::info!("Solved to accuracy {} in {}s", accuracy, start_time.elapsed().as_secs_f64());
    }

    fn relative_gap(&self) -> f64 {
        let upper = self.graph.current_cost();
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
        (self.graph.current_cost() - self.lower_bound()) / demand
    }

    fn link_flows(&self) -> Vec<LinkFlow> {
        graph_link_flows(&self.graph)
    }

    fn total_cost(&self) -> f64 {
        self.graph.current_cost()
    }
}
