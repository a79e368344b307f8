use super::graph::Graph;
use super::{ArcId, NodeId};


/// An arc of a bush, with the flow this bush's origin sends along it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BushEdge {
    pub arc: ArcId,
    pub flow: f64,
}

impl BushEdge {
    pub fn new(arc: ArcId) -> BushEdge {
        BushEdge { arc, flow: 0. }
    }

    pub fn used(&self, epsilon: f64) -> bool {
        self.flow > epsilon
    }
}


/// Per-node distance labels of the min and max trees of whichever bush is being worked on.
/// Predecessors are indices into that bush's edge array.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeLabel {
    pub min_dist: f64,
    pub max_dist: f64,
    pub min_pred: Option<usize>,
    pub max_pred: Option<usize>,
    pub has_real_flow: bool,
}

impl Default for NodeLabel {
    fn default() -> NodeLabel {
        NodeLabel {
            min_dist: f64::INFINITY,
            max_dist: f64::INFINITY,
            min_pred: None,
            max_pred: None,
            has_real_flow: false,
        }
    }
}

impl NodeLabel {
    pub fn reset(&mut self) {
        *self = NodeLabel::default();
    }

    pub fn set_distance(&mut self, distance: f64) {
        self.min_dist = distance;
        self.max_dist = distance;
    }

    pub fn difference(&self) -> f64 {
        self.max_dist - self.min_dist
    }

    /// Sets this node's labels from its in-arcs, whose tails must already be labelled.
    ///
    /// The min distance is the least over all in-arcs.  If any in-arc carries flow, the max
    /// distance is the greatest over the arcs that do; otherwise it is the least max-distance
    /// path over all in-arcs.
    pub fn update_in_distances(node: NodeId, labels: &mut [NodeLabel], in_edges: &[BushEdge],
                               first_index: usize, graph: &Graph, used_epsilon: f64) {
        let mut label = NodeLabel::default();
        for (offset, bush_edge) in in_edges.iter().enumerate() {
            let edge = graph.edge_ref(bush_edge.arc);
            let tail = &labels[edge.from()];
            let via_min = tail.min_dist + edge.cost();
            let via_max = tail.max_dist + edge.cost();

            if via_min < label.min_dist {
                label.min_dist = via_min;
                label.min_pred = Some(first_index + offset);
            }
            if bush_edge.used(used_epsilon) {
                if !label.has_real_flow || via_max > label.max_dist {
                    label.max_dist = via_max;
                    label.max_pred = Some(first_index + offset);
                }
                label.has_real_flow = true;
            } else if !label.has_real_flow && via_max < label.max_dist {
                label.max_dist = via_max;
                label.max_pred = Some(first_index + offset);
            }
        }
        labels[node] = label;
    }
}


/// Scratch space shared by every bush of a solver.  Only one bush uses it at a time, and
/// none of it survives from one bush's turn to the next.
#[derive(Clone, Debug, Default)]
pub struct Workspace {
    pub labels: Vec<NodeLabel>,
    /// Position of each node in the current bush's topological order.
    pub positions: Vec<usize>,
    pub distances: Vec<f64>,
    pub settle_order: Vec<NodeId>,
    /// Position ranges touched by arc reversals.
    pub reversed_ranges: Vec<(usize, usize)>,
    pub edge_buffer: Vec<BushEdge>,
    pub min_segment: Vec<usize>,
    pub max_segment: Vec<usize>,
}

impl Workspace {
    pub fn new(num_nodes: usize) -> Workspace {
        Workspace {
            labels: vec![NodeLabel::default(); num_nodes],
            positions: vec![usize::MAX; num_nodes],
            distances: Vec::with_capacity(num_nodes),
            settle_order: Vec::with_capacity(num_nodes),
            ..Workspace::default()
        }
    }

    /// Loads the position map for a bush's order.  Nodes outside the order keep a stale
    /// position, which is never read.
    pub fn load_positions(&mut self, order: &[NodeId]) {
        for (pos, &node) in order.iter().enumerate() {
            self.positions[node] = pos;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost_function::CostFunction;
    use crate::input_graph::InputGraph;

    // node 3 has in-arcs from 0, 1 and 2 of lengths 1, 2 and 4
    fn fan_in_graph() -> Graph {
        let mut ig = InputGraph::new();
        ig.add_edge(0, 3, CostFunction::constant(1.));
        ig.add_edge(1, 3, CostFunction::constant(2.));
        ig.add_edge(2, 3, CostFunction::constant(4.));
        Graph::new(&ig)
    }

    fn labelled(min_dist: f64, max_dist: f64) -> NodeLabel {
        NodeLabel { min_dist, max_dist, ..NodeLabel::default() }
    }

    #[test]
    fn test_labels_without_flow() {
        let graph = fan_in_graph();
        let mut labels = vec![labelled(5., 9.), labelled(2., 3.), labelled(0., 1.),
                              NodeLabel::default()];
        let in_edges: Vec<BushEdge> = (0..3).map(|tail| BushEdge::new(graph.edge(tail, 3)))
            .collect();
        NodeLabel::update_in_distances(3, &mut labels, &in_edges, 10, &graph, 1e-10);
        let label = labels[3];
        assert_eq!(label.min_dist, 4.);
        assert_eq!(label.min_pred, Some(11));
        // least of 10, 5 and 5: the first arc reaching it wins
        assert_eq!(label.max_dist, 5.);
        assert_eq!(label.max_pred, Some(11));
        assert!(!label.has_real_flow);
    }

    #[test]
    fn test_labels_with_flow() {
        let graph = fan_in_graph();
        let mut labels = vec![labelled(5., 9.), labelled(2., 3.), labelled(0., 1.),
                              NodeLabel::default()];
        let mut in_edges: Vec<BushEdge> = (0..3).map(|tail| BushEdge::new(graph.edge(tail, 3)))
            .collect();
        in_edges[1].flow = 1.;
        in_edges[2].flow = 1e-12;
        NodeLabel::update_in_distances(3, &mut labels, &in_edges, 0, &graph, 1e-10);
        assert_eq!(labels[3].max_dist, 5.);
        assert_eq!(labels[3].max_pred, Some(1));
        assert!(labels[3].has_real_flow);

        in_edges[2].flow = 1.;
        in_edges[0].flow = 1.;
        NodeLabel::update_in_distances(3, &mut labels, &in_edges, 0, &graph, 1e-10);
        assert_eq!(labels[3].max_dist, 10.);
        assert_eq!(labels[3].max_pred, Some(0));
        assert_eq!(labels[3].difference(), 6.);
    }
}
