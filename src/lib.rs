// imports of other modules from this crate
mod error;
pub use error::{TapError, TapResult};

mod cost_function;
pub use cost_function::{CostFunction, HornerPolynomial, SummedFunction};

mod root_finding;
pub use root_finding::{BisectionSolver, RegulaFalsiSolver, RootSolver, RootSolverKind,
                       SecantSolver};

mod input_graph;
pub use input_graph::InputGraph;

mod shortest_path;

mod graph;
pub use graph::{Edge, Graph};

mod labels;
mod ordering;
mod equilibration;

mod origin;
pub use origin::Origin;

mod bush;
pub use bush::Bush;

mod algorithm_b;
pub use algorithm_b::{AlgorithmBParams, AlgorithmBSolver, TieBreak, UnreachablePolicy};

mod frank_wolfe;
pub use frank_wolfe::{FrankWolfeParams, FrankWolfeSolver};

mod results;
pub use results::{write_link_flows, LinkFlow};

pub mod tntp;
pub use tntp::TntpNetwork;

mod config;
pub use config::{Algorithm, AssignmentConfig};

pub mod synthetic;

#[cfg(test)]
mod test_utils;


/// Nodes are numbered densely from 0.
pub type NodeId = usize;
/// Index of an arc in a `Graph`'s edge list.
pub type ArcId = usize;


/// Common interface of the equilibrium solvers.
pub trait TrafficAssignmentSolver {
    /// Improves the assignment until it is within `accuracy` by the solver's own convergence
    /// measure, or `iteration_limit` iterations have run.
    fn solve(&mut self, iteration_limit: usize, accuracy: f64);

    /// `1 - lower / upper`, where upper is the total cost at current flows and lower is the
    /// cost of sending all demand along current shortest paths.
    fn relative_gap(&self) -> f64;

    /// The difference between the same two bounds, per unit of demand.
    fn average_excess_cost(&self) -> f64;

    fn link_flows(&self) -> Vec<LinkFlow>;

    fn total_cost(&self) -> f64;
}
