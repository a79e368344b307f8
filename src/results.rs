use std::path::Path;

use super::error::TapResult;
use super::graph::Graph;
use super::NodeId;


/// The flow on one network link and its cost at that flow.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkFlow {
    pub from: NodeId,
    pub to: NodeId,
    pub flow: f64,
    pub cost: f64,
}

/// Reads back the flow and cost of every real arc, in (from, to) order.
pub fn graph_link_flows(graph: &Graph) -> Vec<LinkFlow> {
    graph.real_edges().iter()
        .map(|edge| LinkFlow {
            from: edge.from(),
            to: edge.to(),
            flow: edge.flow(),
            cost: edge.cost(),
        })
        .collect()
}

/// Writes a CSV table of link flows with a header row.  `node_offset` is added to node ids,
/// so 1-based input files can be matched up.
pub fn write_link_flows(path: &Path, flows: &[LinkFlow], node_offset: usize) -> TapResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&["from", "to", "flow", "cost"])?;
    for link in flows {
        writer.write_record(&[
            (link.from + node_offset).to_string(),
            (link.to + node_offset).to_string(),
            link.flow.to_string(),
            link.cost.to_string(),
        ])?;
    }
    writer.flush()?;
    log::info!("Wrote {} link flows to {}", flows.len(), path.display());
    Ok(())
}
