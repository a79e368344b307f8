// Shifting flow from the longest used path to a node onto its shortest path, one divergence
// segment at a time.
use super::cost_function::SummedFunction;
use super::graph::Graph;
use super::labels::{BushEdge, NodeLabel};
use super::root_finding::RootSolver;
use super::NodeId;

// Segments that can give up no more than this are left alone.
static MIN_SHIFTABLE_FLOW: f64 = 1e-12;


/// Everything node equilibration reads from the current bush and its labels.
pub struct BushView<'a> {
    pub origin: NodeId,
    pub labels: &'a [NodeLabel],
    pub positions: &'a [usize],
}

impl<'a> BushView<'a> {
    fn min_pred(&self, node: NodeId) -> Option<usize> {
        self.labels[node].min_pred
    }

    fn max_pred(&self, node: NodeId) -> Option<usize> {
        self.labels[node].max_pred
    }
}


/// Equalizes the min and max path costs to `node` as far as the flow on the max path allows.
/// The min and max trees are walked back from `node`; wherever they diverge, flow is moved
/// off the max segment and onto the min segment until the two segments cost the same.
///
/// `min_segment` and `max_segment` are scratch buffers.  Returns whether any flow moved.
pub fn equilibrate_node<S>(node: NodeId, view: &BushView, edges: &mut [BushEdge],
                           graph: &mut Graph, solver: &S, min_segment: &mut Vec<usize>,
                           max_segment: &mut Vec<usize>) -> bool
    where S: RootSolver
{
    let mut shifted = false;
    let mut junction = node;
    loop {
        junction = match more_separate_paths(junction, view, edges, graph) {
            Some(junction) => junction,
            None => return shifted,
        };

        min_segment.clear();
        max_segment.clear();
        let mut max_change = f64::INFINITY;
        let mut min_node = junction;
        let mut max_node = junction;
        let mut first_step = true;
        // Step whichever chain sits later in the bush order.  Comparing order positions
        // rather than max distances finds the meeting node even when distances tie.
        while first_step || min_node != max_node {
            let step_min = first_step || view.positions[min_node] > view.positions[max_node];
            let step_max = first_step || !step_min;
            first_step = false;
            if step_min {
                let pred = match view.min_pred(min_node) {
                    Some(pred) => pred,
                    None => return shifted,
                };
                min_segment.push(pred);
                min_node = graph.edge_ref(edges[pred].arc).from();
            }
            if step_max {
                let pred = match view.max_pred(max_node) {
                    Some(pred) => pred,
                    None => return shifted,
                };
                max_change = max_change.min(edges[pred].flow);
                max_segment.push(pred);
                max_node = graph.edge_ref(edges[pred].arc).from();
            }
        }
        junction = min_node;

        if max_change > MIN_SHIFTABLE_FLOW {
            shifted |= shift_flow(edges, graph, solver, min_segment, max_segment, max_change);
        }
    }
}

/// Walks back from `node` along the stretch where the min and max trees share arcs, and
/// returns the node where they part, or None if they agree all the way to the origin.
fn more_separate_paths(mut node: NodeId, view: &BushView, edges: &[BushEdge], graph: &Graph)
                       -> Option<NodeId> {
    loop {
        if node == view.origin {
            return None;
        }
        match (view.min_pred(node), view.max_pred(node)) {
            (Some(min_pred), Some(max_pred)) if min_pred == max_pred => {
                node = graph.edge_ref(edges[min_pred].arc).from();
            }
            (Some(_), Some(_)) => return Some(node),
            _ => return None,
        }
    }
}

fn shift_flow<S>(edges: &mut [BushEdge], graph: &mut Graph, solver: &S, min_segment: &[usize],
                 max_segment: &[usize], max_change: f64) -> bool
    where S: RootSolver
{
    let delta = {
        let mut cost_diff = SummedFunction::new();
        for &ii in min_segment {
            let edge = graph.edge_ref(edges[ii].arc);
            cost_diff += (edge.cost_fn(), edge.flow());
        }
        for &ii in max_segment {
            let edge = graph.edge_ref(edges[ii].arc);
            cost_diff -= (edge.cost_fn(), edge.flow());
        }
        solver.solve(|xx| cost_diff.eval(xx), 0., max_change)
    };
    let delta = if delta.is_nan() { 0. } else { delta.max(0.).min(max_change) };
    if delta == 0. {
        return false;
    }

    for &ii in min_segment {
        edges[ii].flow += delta;
        graph.add_flow(edges[ii].arc, delta);
    }
    for &ii in max_segment {
        edges[ii].flow = (edges[ii].flow - delta).max(0.);
        graph.add_flow(edges[ii].arc, -delta);
    }
    true
}
