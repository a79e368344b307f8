use std::cmp::Ordering;

use super::algorithm_b::{AlgorithmBParams, TieBreak};
use super::equilibration::{equilibrate_node, BushView};
use super::error::{TapError, TapResult};
use super::graph::Graph;
use super::labels::{BushEdge, NodeLabel, Workspace};
use super::ordering::repair_order;
use super::origin::Origin;
use super::NodeId;


/// The acyclic set of arcs one origin may send flow along, with the flow it sends on each.
///
/// Bush arcs are stored grouped by head node: the in-arcs of node `v` are
/// `edges[in_offsets[v]..in_offsets[v + 1]]`.  For every pair of nodes the origin reaches,
/// the bush holds exactly one of the two arcs between them (real or imaginary), and
/// reversing an arc swaps it for its inverse.  `order` lists the reached nodes so that every
/// bush arc points forwards.
#[derive(Clone, Debug)]
pub struct Bush {
    origin: NodeId,
    in_offsets: Vec<usize>,
    edges: Vec<BushEdge>,
    order: Vec<NodeId>,
}

impl Bush {
    /// Builds the bush from the shortest-path tree at current costs and loads the origin's
    /// demand onto it all-or-nothing.
    pub fn new(origin: &Origin, graph: &mut Graph, ws: &mut Workspace, params: &AlgorithmBParams)
               -> TapResult<Bush> {
        graph.dijkstra(origin.node(), &mut ws.distances, &mut ws.settle_order);
        let unreachable: Vec<NodeId> = origin.destinations().iter()
            .map(|&(dest, _)| dest)
            .filter(|&dest| ws.distances[dest].is_infinite())
            .collect();
        if !unreachable.is_empty() {
            return Err(TapError::UnreachableDestination {
                origin: origin.node(),
                destinations: unreachable,
            });
        }

        let mut order = ws.settle_order.clone();
        if params.tie_break == TieBreak::DistanceThenId {
            // settle order can put equally distant nodes against id order
            let distances = &ws.distances;
            order.sort_by(|&aa, &bb| distances[aa].partial_cmp(&distances[bb])
                .unwrap_or(Ordering::Equal)
                .then(aa.cmp(&bb)));
        }
        ws.load_positions(&order);
        // With `order` sorted as above, pointing forwards in it is the (distance, id) rule.
        let distances = &ws.distances;
        let positions = &ws.positions;
        let selected: Vec<BushEdge> = graph.edges().iter()
            .enumerate()
            .filter(|(_, edge)| distances[edge.from()].is_finite()
                                && distances[edge.to()].is_finite()
                                && positions[edge.from()] < positions[edge.to()])
            .map(|(arc, _)| BushEdge::new(arc))
            .collect();

        let mut bush = Bush {
            origin: origin.node(),
            in_offsets: vec![0; graph.num_vertices() + 1],
            edges: selected,
            order,
        };
        bush.group_by_head(graph, ws);
        log::debug!("Bush for origin {} has {} arcs over {} nodes", bush.origin,
                    bush.edges.len(), bush.order.len());

        bush.build_trees(graph, ws, params.used_flow_epsilon);
        bush.send_initial_flows(origin, graph, ws)?;
        Ok(bush)
    }

    pub fn origin(&self) -> NodeId {
        self.origin
    }

    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    fn in_range(&self, node: NodeId) -> (usize, usize) {
        (self.in_offsets[node], self.in_offsets[node + 1])
    }

    /// Regroups `edges` by head node with a counting sort, keeping the relative order of
    /// each node's in-arcs.
    fn group_by_head(&mut self, graph: &Graph, ws: &mut Workspace) {
        ws.edge_buffer.clear();
        ws.edge_buffer.extend_from_slice(&self.edges);
        for offset in self.in_offsets.iter_mut() {
            *offset = 0;
        }
        for bush_edge in ws.edge_buffer.iter() {
            self.in_offsets[graph.edge_ref(bush_edge.arc).to() + 1] += 1;
        }
        for ii in 1..self.in_offsets.len() {
            self.in_offsets[ii] += self.in_offsets[ii - 1];
        }
        // use the offsets as insertion cursors, then shift them back into place
        for bush_edge in ws.edge_buffer.iter() {
            let head = graph.edge_ref(bush_edge.arc).to();
            self.edges[self.in_offsets[head]] = *bush_edge;
            self.in_offsets[head] += 1;
        }
        for ii in (1..self.in_offsets.len()).rev() {
            self.in_offsets[ii] = self.in_offsets[ii - 1];
        }
        self.in_offsets[0] = 0;
    }

    /// Recomputes the min and max distance labels of every node in the bush, in order.
    pub fn build_trees(&self, graph: &Graph, ws: &mut Workspace, used_epsilon: f64) {
        for &node in self.order.iter() {
            ws.labels[node].reset();
        }
        ws.labels[self.origin].set_distance(0.);
        for &node in self.order.iter() {
            if node == self.origin {
                continue;
            }
            let (start, end) = self.in_range(node);
            NodeLabel::update_in_distances(node, &mut ws.labels, &self.edges[start..end], start,
                                           graph, used_epsilon);
        }
    }

    fn send_initial_flows(&mut self, origin: &Origin, graph: &mut Graph, ws: &Workspace)
                          -> TapResult<()> {
        for &(dest, demand) in origin.destinations() {
            let mut node = dest;
            while node != self.origin {
                let pred = match ws.labels[node].min_pred {
                    Some(pred) => pred,
                    None => return Err(TapError::UnreachableDestination {
                        origin: self.origin,
                        destinations: vec![dest],
                    }),
                };
                let arc = self.edges[pred].arc;
                self.edges[pred].flow += demand;
                graph.add_flow(arc, demand);
                node = graph.edge_ref(arc).from();
            }
        }
        Ok(())
    }

    /// Brings the bush towards equilibrium: shifts flow until no destination's max path
    /// costs more than `accuracy` above its min path, then reverses arcs that point against
    /// the max distances, repeating until no arc needs reversing.  Returns whether any flow
    /// moved.
    pub fn fix(&mut self, origin: &Origin, graph: &mut Graph, ws: &mut Workspace,
               params: &AlgorithmBParams, accuracy: f64) -> bool {
        ws.load_positions(&self.order);
        let mut flow_changed = false;
        for _ in 0..params.equilibration_pass_limit {
            flow_changed |= self.equilibrate_flows(origin, graph, ws, params, accuracy);
            if !self.update_edges(graph, ws, params.used_flow_epsilon) {
                debug_assert!(self.is_topologically_sorted(graph));
                return flow_changed;
            }
        }
        log::warn!("Bush for origin {} still reversing arcs after {} passes", self.origin,
                   params.equilibration_pass_limit);
        flow_changed
    }

    /// Repeatedly equilibrates every destination whose min and max paths differ by more
    /// than `accuracy`, rebuilding the trees after each pass, until a pass moves no flow.
    /// The labels are left current.
    pub fn equilibrate_flows(&mut self, origin: &Origin, graph: &mut Graph, ws: &mut Workspace,
                             params: &AlgorithmBParams, accuracy: f64) -> bool {
        self.build_trees(graph, ws, params.used_flow_epsilon);
        let mut flow_changed = false;
        for _ in 0..params.equilibration_pass_limit {
            let mut shifted = false;
            {
                let view = BushView {
                    origin: self.origin,
                    labels: &ws.labels,
                    positions: &ws.positions,
                };
                for &(dest, _) in origin.destinations() {
                    if view.labels[dest].difference() > accuracy {
                        shifted |= equilibrate_node(dest, &view, &mut self.edges, graph,
                                                    &params.root_solver, &mut ws.min_segment,
                                                    &mut ws.max_segment);
                    }
                }
            }
            if !shifted {
                return flow_changed;
            }
            flow_changed = true;
            self.build_trees(graph, ws, params.used_flow_epsilon);
        }
        log::debug!("Bush for origin {} hit the equilibration pass limit", self.origin);
        flow_changed
    }

    /// Reverses every arc whose tail has a greater max distance than its head, then regroups
    /// the arcs and repairs the order.  Needs current labels.  Returns whether any arc was
    /// reversed.
    pub fn update_edges(&mut self, graph: &mut Graph, ws: &mut Workspace, used_epsilon: f64)
                        -> bool {
        let mut reversed = false;
        for pos in 0..self.order.len() {
            let node = self.order[pos];
            let (start, end) = self.in_range(node);
            for ii in start..end {
                let arc = self.edges[ii].arc;
                let (tail, inverse) = {
                    let edge = graph.edge_ref(arc);
                    (edge.from(), edge.inverse())
                };
                if ws.labels[tail].max_dist > ws.labels[node].max_dist {
                    let residual = self.edges[ii].flow;
                    // a used arc cannot end nearer the origin than it starts
                    debug_assert!(residual <= used_epsilon,
                                  "arc {} -> {} carries flow {} against the max distances",
                                  tail, node, residual);
                    if residual > used_epsilon {
                        log::warn!("Not reversing arc {} -> {}, which carries {} flow", tail,
                                   node, residual);
                        continue;
                    }
                    if residual > 0. {
                        graph.add_flow(arc, -residual);
                    }
                    self.edges[ii] = BushEdge::new(inverse);
                    ws.reversed_ranges.push((ws.positions[tail], ws.positions[node]));
                    reversed = true;
                }
            }
        }

        if reversed {
            self.group_by_head(graph, ws);
            let labels = &ws.labels;
            repair_order(&mut self.order, &mut ws.positions, &mut ws.reversed_ranges,
                         |node| labels[node].max_dist);
        }
        reversed
    }

    /// Whether every bush arc goes from an earlier to a later node in `order`.
    pub fn is_topologically_sorted(&self, graph: &Graph) -> bool {
        let mut positions = vec![usize::MAX; graph.num_vertices()];
        for (pos, &node) in self.order.iter().enumerate() {
            positions[node] = pos;
        }
        self.edges.iter().all(|bush_edge| {
            let edge = graph.edge_ref(bush_edge.arc);
            let (from_pos, to_pos) = (positions[edge.from()], positions[edge.to()]);
            from_pos != usize::MAX && to_pos != usize::MAX && from_pos < to_pos
        })
    }

    /// The bush's arcs as (from, to, flow).
    pub fn edges(&self, graph: &Graph) -> Vec<(NodeId, NodeId, f64)> {
        self.edges.iter()
            .map(|bush_edge| {
                let edge = graph.edge_ref(bush_edge.arc);
                (edge.from(), edge.to(), bush_edge.flow)
            })
            .collect()
    }

    /// The number of bush arcs carrying flow.
    pub fn give_count(&self, used_epsilon: f64) -> usize {
        self.edges.iter().filter(|bush_edge| bush_edge.used(used_epsilon)).count()
    }

    /// The largest gap between max and min path cost over the origin's destinations.
    pub fn max_difference(&self, origin: &Origin, graph: &Graph, ws: &mut Workspace,
                          used_epsilon: f64) -> f64 {
        self.build_trees(graph, ws, used_epsilon);
        origin.destinations().iter()
            .map(|&(dest, _)| ws.labels[dest].difference())
            .fold(0., f64::max)
    }

    /// The cost of sending all of the origin's demand along min paths within the bush.
    pub fn all_or_nothing_cost(&self, origin: &Origin, graph: &Graph, ws: &mut Workspace,
                               used_epsilon: f64) -> f64 {
        self.build_trees(graph, ws, used_epsilon);
        origin.destinations().iter()
            .map(|&(dest, demand)| demand * ws.labels[dest].min_dist)
            .sum()
    }

    /// The number of reached nodes whose max distance is shared with another node.
    pub fn max_distance_ties(&self, graph: &Graph, ws: &mut Workspace, used_epsilon: f64)
                             -> usize {
        self.build_trees(graph, ws, used_epsilon);
        let mut max_dists: Vec<f64> = self.order.iter().map(|&node| ws.labels[node].max_dist)
            .collect();
        max_dists.sort_by(|aa, bb| aa.partial_cmp(bb).unwrap_or(std::cmp::Ordering::Equal));
        (0..max_dists.len())
            .filter(|&ii| (ii > 0 && max_dists[ii - 1] == max_dists[ii])
                    || (ii + 1 < max_dists.len() && max_dists[ii + 1] == max_dists[ii]))
            .count()
    }

    /// The largest violation of flow conservation at any node: the origin must send out its
    /// total demand, each destination must absorb its own, and other nodes must balance.
    pub fn conservation_error(&self, origin: &Origin, graph: &Graph) -> f64 {
        let mut balance = vec![0.; graph.num_vertices()];
        for bush_edge in self.edges.iter() {
            let edge = graph.edge_ref(bush_edge.arc);
            balance[edge.from()] -= bush_edge.flow;
            balance[edge.to()] += bush_edge.flow;
        }
        balance[self.origin] += origin.total_demand();
        for &(dest, demand) in origin.destinations() {
            balance[dest] -= demand;
        }
        balance.iter().fold(0., |worst: f64, bb| worst.max(bb.abs()))
    }
}
