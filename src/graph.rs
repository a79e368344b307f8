use std::collections::{BinaryHeap, HashMap};

use super::cost_function::CostFunction;
use super::input_graph::InputGraph;
use super::shortest_path::MinScored;
use super::{ArcId, NodeId};


/// A directed arc of the shared network.  Flow and realized cost are the totals over all
/// origins.
#[derive(Clone, Debug)]
pub struct Edge {
    from: NodeId,
    to: NodeId,
    cost_fn: CostFunction,
    flow: f64,
    cost: f64,
    inverse: ArcId,
    imaginary: bool,
}

impl Edge {
    fn new(from: NodeId, to: NodeId, cost_fn: CostFunction, imaginary: bool) -> Edge {
        let cost = cost_fn.eval(0.);
        Edge { from, to, cost_fn, flow: 0., cost, inverse: 0, imaginary }
    }

    pub fn from(&self) -> NodeId {
        self.from
    }

    pub fn to(&self) -> NodeId {
        self.to
    }

    pub fn cost_fn(&self) -> &CostFunction {
        &self.cost_fn
    }

    pub fn flow(&self) -> f64 {
        self.flow
    }

    /// The cost at the current flow.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// The arc between the same nodes in the other direction.
    pub fn inverse(&self) -> ArcId {
        self.inverse
    }

    pub fn is_imaginary(&self) -> bool {
        self.imaginary
    }
}


/// Arc storage shared by every bush.  Real arcs come first, in (from, to) order, followed
/// by an imaginary reverse arc for every real arc that lacks a real one.  Outgoing arcs are
/// indexed in compressed rows.
#[derive(Clone, Debug)]
pub struct Graph {
    num_nodes: usize,
    edges: Vec<Edge>,
    num_real: usize,
    first_out: Vec<usize>,
    out_edges: Vec<ArcId>,
}

impl Graph {
    pub fn new(input: &InputGraph) -> Graph {
        let num_nodes = input.num_nodes();
        let mut edges = vec![];
        for (from, to, cost_fn) in input.links() {
            if from == to {
                log::warn!("Dropping self loop at node {}", from);
                continue;
            }
            edges.push(Edge::new(from, to, cost_fn.clone(), false));
        }
        let num_real = edges.len();

        let index: HashMap<(NodeId, NodeId), ArcId> = edges.iter()
            .enumerate()
            .map(|(ii, edge)| ((edge.from, edge.to), ii))
            .collect();
        for ii in 0..num_real {
            let (from, to) = (edges[ii].from, edges[ii].to);
            match index.get(&(to, from)) {
                Some(&reverse) => edges[ii].inverse = reverse,
                None => {
                    let imaginary_id = edges.len();
                    let mut imaginary = Edge::new(to, from, CostFunction::infinite(), true);
                    imaginary.inverse = ii;
                    edges[ii].inverse = imaginary_id;
                    edges.push(imaginary);
                }
            }
        }
        log::debug!("Graph has {} nodes, {} real and {} imaginary arcs", num_nodes, num_real,
                    edges.len() - num_real);

        let mut first_out = vec![0; num_nodes + 1];
        for edge in edges.iter() {
            first_out[edge.from + 1] += 1;
        }
        for ii in 0..num_nodes {
            first_out[ii + 1] += first_out[ii];
        }
        let mut fill = first_out.clone();
        let mut out_edges = vec![0; edges.len()];
        for (ii, edge) in edges.iter().enumerate() {
            out_edges[fill[edge.from]] = ii;
            fill[edge.from] += 1;
        }

        Graph { num_nodes, edges, num_real, first_out, out_edges }
    }

    pub fn num_vertices(&self) -> usize {
        self.num_nodes
    }

    /// The number of arcs, imaginary ones included.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_real_edges(&self) -> usize {
        self.num_real
    }

    pub fn edge_ref(&self, arc: ArcId) -> &Edge {
        &self.edges[arc]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn real_edges(&self) -> &[Edge] {
        &self.edges[..self.num_real]
    }

    pub fn out_edges(&self, node: NodeId) -> &[ArcId] {
        &self.out_edges[self.first_out[node]..self.first_out[node + 1]]
    }

    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<ArcId> {
        if from >= self.num_nodes {
            return None;
        }
        self.out_edges(from).iter().cloned().find(|&arc| self.edges[arc].to == to)
    }

    /// The arc from `from` to `to`.  Panics if there is none.
    pub fn edge(&self, from: NodeId, to: NodeId) -> ArcId {
        match self.find_edge(from, to) {
            Some(arc) => arc,
            None => panic!("Edge does not exist: {} -> {}", from, to),
        }
    }

    /// Changes the flow on an arc, never letting it drop below zero, and updates its cost.
    pub fn add_flow(&mut self, arc: ArcId, delta: f64) {
        let edge = &mut self.edges[arc];
        edge.flow = (edge.flow + delta).max(0.);
        edge.cost = edge.cost_fn.eval(edge.flow);
    }

    /// Total travel cost: flow times cost summed over arcs that carry flow.
    pub fn current_cost(&self) -> f64 {
        self.edges.iter()
            .filter(|edge| edge.flow != 0.)
            .map(|edge| edge.flow * edge.cost)
            .sum()
    }

    /// Shortest distances from `origin` at current costs.  Nodes are appended to `order` as
    /// they are settled, so `order` is a topological order of the shortest-path DAG; nodes
    /// at equal distance are settled in the order their distances were last improved.
    /// Unreachable nodes get infinite distance and are left out of `order`.
    pub fn dijkstra(&self, origin: NodeId, distances: &mut Vec<f64>, order: &mut Vec<NodeId>) {
        distances.clear();
        distances.resize(self.num_nodes, f64::INFINITY);
        order.clear();
        let mut settled = vec![false; self.num_nodes];
        let mut sequence: u64 = 0;
        let mut heap = BinaryHeap::new();

        distances[origin] = 0.;
        heap.push(MinScored((0., sequence), origin));
        while let Some(MinScored((dist, _), node)) = heap.pop() {
            // stale entries left over from a later improvement
            if settled[node] || dist > distances[node] {
                continue;
            }
            settled[node] = true;
            order.push(node);
            for &arc in self.out_edges(node) {
                let edge = &self.edges[arc];
                if edge.imaginary || settled[edge.to] {
                    continue;
                }
                let next_dist = dist + edge.cost;
                if next_dist < distances[edge.to] {
                    distances[edge.to] = next_dist;
                    sequence += 1;
                    heap.push(MinScored((next_dist, sequence), edge.to));
                }
            }
        }
    }

    /// Shortest distances from `origin`, allocating fresh buffers.  Used by read-only
    /// phases that run in parallel.
    pub fn shortest_distances(&self, origin: NodeId) -> Vec<f64> {
        let mut distances = Vec::with_capacity(self.num_nodes);
        let mut order = Vec::with_capacity(self.num_nodes);
        self.dijkstra(origin, &mut distances, &mut order);
        distances
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{braess_network, three_route_network};

    #[test]
    fn test_imaginary_arcs() {
        let mut ig = InputGraph::new();
        ig.add_edge(0, 1, CostFunction::constant(1.));
        ig.add_edge(1, 0, CostFunction::constant(2.));
        ig.add_edge(1, 2, CostFunction::constant(3.));
        ig.add_edge(2, 2, CostFunction::constant(3.));
        let graph = Graph::new(&ig);

        assert_eq!(graph.num_vertices(), 3);
        // three real arcs plus one imaginary 2 -> 1
        assert_eq!(graph.num_real_edges(), 3);
        assert_eq!(graph.num_edges(), 4);
        for (ii, edge) in graph.edges().iter().enumerate() {
            let inverse = graph.edge_ref(edge.inverse());
            assert_eq!(inverse.inverse(), ii);
            assert_eq!((inverse.from(), inverse.to()), (edge.to(), edge.from()));
        }
        let imaginary = graph.edge_ref(graph.edge(2, 1));
        assert!(imaginary.is_imaginary());
        assert!(imaginary.cost().is_infinite());
        assert!(!graph.edge_ref(graph.edge(1, 0)).is_imaginary());
        assert_eq!(graph.find_edge(2, 0), None);
        assert_eq!(graph.find_edge(7, 0), None);
    }

    #[test]
    #[should_panic(expected = "Edge does not exist")]
    fn test_missing_edge_panics() {
        let graph = Graph::new(&three_route_network());
        graph.edge(0, 4);
    }

    #[test]
    fn test_add_flow_clamps_and_costs() {
        let mut graph = Graph::new(&three_route_network());
        let arc = graph.edge(0, 1);
        graph.add_flow(arc, 3.);
        assert_eq!(graph.edge_ref(arc).flow(), 3.);
        assert_eq!(graph.edge_ref(arc).cost(), 4.);
        graph.add_flow(arc, -5.);
        assert_eq!(graph.edge_ref(arc).flow(), 0.);
        assert_eq!(graph.edge_ref(arc).cost(), 1.);
        assert_eq!(graph.current_cost(), 0.);

        graph.add_flow(arc, 2.);
        graph.add_flow(graph.edge(1, 4), 2.);
        assert_eq!(graph.current_cost(), 2. * 3. + 2. * 1.);
    }

    #[test]
    fn test_dijkstra() {
        let graph = Graph::new(&three_route_network());
        let mut distances = vec![];
        let mut order = vec![];
        graph.dijkstra(0, &mut distances, &mut order);
        assert_eq!(distances, vec![0., 1., 2., 3., 2.]);
        assert_eq!(order[0], 0);
        assert_eq!(order.len(), 5);
        for pair in order.windows(2) {
            assert!(distances[pair[0]] <= distances[pair[1]]);
        }

        // nothing leads back to the origin
        graph.dijkstra(4, &mut distances, &mut order);
        assert_eq!(order, vec![4]);
        assert!(distances[0].is_infinite());
    }

    #[test]
    fn test_dijkstra_is_deterministic() {
        let graph = Graph::new(&braess_network());
        let mut distances = vec![];
        let mut first_order = vec![];
        graph.dijkstra(0, &mut distances, &mut first_order);
        for _ in 0..5 {
            let mut order = vec![];
            graph.dijkstra(0, &mut distances, &mut order);
            assert_eq!(order, first_order);
        }
        assert_eq!(graph.shortest_distances(0), distances);
    }
}
