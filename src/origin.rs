use super::input_graph::InputGraph;
use super::NodeId;


/// A node that sends flow, and how much it sends to each destination.
#[derive(Clone, Debug, PartialEq)]
pub struct Origin {
    node: NodeId,
    destinations: Vec<(NodeId, f64)>,
}

impl Origin {
    pub fn new(node: NodeId) -> Origin {
        Origin { node, destinations: vec![] }
    }

    /// One origin per node with demand, in node order.
    pub fn from_demand(input: &InputGraph) -> Vec<Origin> {
        input.demand().iter()
            .map(|(&node, dests)| {
                let mut origin = Origin::new(node);
                for (&dest, &demand) in dests.iter() {
                    origin.add_destination(dest, demand);
                }
                origin
            })
            .collect()
    }

    pub fn add_destination(&mut self, destination: NodeId, demand: f64) {
        self.destinations.push((destination, demand));
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn destinations(&self) -> &[(NodeId, f64)] {
        &self.destinations
    }

    pub fn total_demand(&self) -> f64 {
        self.destinations.iter().map(|(_, demand)| demand).sum()
    }

    pub fn remove_destinations(&mut self, removed: &[NodeId]) {
        self.destinations.retain(|(dest, _)| !removed.contains(dest));
    }
}
