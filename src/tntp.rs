// Reader for networks and trip tables in the TNTP format of Bar-Gera's transportation network
// test problems.
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use super::cost_function::CostFunction;
use super::error::{TapError, TapResult};
use super::input_graph::InputGraph;
use super::results::LinkFlow;
use super::NodeId;


/// A network read from TNTP files.  Node ids in `graph` are 0-based.  Zones (the nodes
/// numbered below the first through node) are split in two: flow leaves a zone from its
/// original node, and arrives at a sink copy numbered `num_nodes` higher, so no path can pass
/// through a zone.
#[derive(Clone, Debug)]
pub struct TntpNetwork {
    pub graph: InputGraph,
    pub num_nodes: usize,
    pub num_zones: usize,
}

impl TntpNetwork {
    /// Maps an id of `graph` back to the 0-based node id of the input files.
    pub fn original_node(&self, node: NodeId) -> NodeId {
        if node >= self.num_nodes {
            node - self.num_nodes
        } else {
            node
        }
    }

    /// Rewrites sink copies in a flow table back to their zones.
    pub fn restore_ids(&self, flows: &mut [LinkFlow]) {
        for link in flows.iter_mut() {
            link.from = self.original_node(link.from);
            link.to = self.original_node(link.to);
        }
    }

    // Converts a 1-based id from a file.  Flow arriving at a zone goes to its sink copy.
    fn node_index(&self, id: usize, arriving: bool, line: usize) -> TapResult<NodeId> {
        if id == 0 || id > self.num_nodes {
            return Err(TapError::parse(line, format!("node {} is not in the network", id)));
        }
        if arriving && id <= self.num_zones {
            Ok(id - 1 + self.num_nodes)
        } else {
            Ok(id - 1)
        }
    }
}


/// Reads a network and its trip table, with `length_cost` and `toll_cost` the weights of
/// link length and toll in the generalized link cost.
pub fn import(network_path: &Path, trips_path: &Path, length_cost: f64, toll_cost: f64)
              -> TapResult<TntpNetwork> {
    let mut network = parse_network(&fs::read_to_string(network_path)?, length_cost,
                                    toll_cost)?;
    parse_trips(&fs::read_to_string(trips_path)?, &mut network)?;
    log::info!("Read {} nodes, {} zones, {} links and {} total demand from {}",
               network.num_nodes, network.num_zones, network.graph.num_links(),
               network.graph.total_demand(), network_path.display());
    Ok(network)
}

pub fn parse_network(text: &str, length_cost: f64, toll_cost: f64) -> TapResult<TntpNetwork> {
    let (metadata, body) = split_metadata(text)?;
    let num_nodes: usize = required(&metadata, "NUMBER OF NODES")?;
    let first_thru: usize = optional(&metadata, "FIRST THRU NODE")?.unwrap_or(1);
    let num_links: Option<usize> = optional(&metadata, "NUMBER OF LINKS")?;

    let mut network = TntpNetwork {
        graph: InputGraph::new(),
        num_nodes,
        num_zones: first_thru.saturating_sub(1),
    };
    network.graph.set_nodes(num_nodes + network.num_zones);

    let mut links_read = 0;
    for (line_num, line) in body {
        let fields: Vec<&str> = line.trim_end_matches(';').split_whitespace().collect();
        if fields.len() < 7 {
            return Err(TapError::parse(line_num, format!("expected at least 7 fields, found {}",
                                                         fields.len())));
        }
        let from = network.node_index(parse_field(fields[0], line_num)?, false, line_num)?;
        let to = network.node_index(parse_field(fields[1], line_num)?, true, line_num)?;
        let capacity: f64 = parse_field(fields[2], line_num)?;
        let length: f64 = parse_field(fields[3], line_num)?;
        let free_flow_time: f64 = parse_field(fields[4], line_num)?;
        let alpha: f64 = parse_field(fields[5], line_num)?;
        let beta: f64 = parse_field(fields[6], line_num)?;
        // fields 7 and 9 are speed and link type, neither of which affects cost
        let toll: f64 = match fields.get(8) {
            Some(field) => parse_field(field, line_num)?,
            None => 0.,
        };
        let cost_fn = CostFunction::bpr(free_flow_time, capacity, alpha, beta,
                                        length * length_cost + toll * toll_cost);
        network.graph.add_edge(from, to, cost_fn);
        links_read += 1;
    }
    if let Some(num_links) = num_links {
        if num_links != links_read {
            log::warn!("Network declares {} links but lists {}", num_links, links_read);
        }
    }
    Ok(network)
}

/// Adds the demand in a trip table to `network`.
pub fn parse_trips(text: &str, network: &mut TntpNetwork) -> TapResult<()> {
    let (metadata, body) = split_metadata(text)?;
    if let Some(num_zones) = optional::<usize>(&metadata, "NUMBER OF ZONES")? {
        if num_zones != network.num_zones && network.num_zones > 0 {
            log::warn!("Trip table has {} zones, network has {}", num_zones, network.num_zones);
        }
    }

    let mut origin: Option<NodeId> = None;
    for (line_num, line) in body {
        if line.starts_with("Origin") {
            let id = parse_field(line["Origin".len()..].trim(), line_num)?;
            origin = Some(network.node_index(id, false, line_num)?);
            continue;
        }
        let from = match origin {
            Some(from) => from,
            None => return Err(TapError::parse(line_num, "demand given before any Origin")),
        };
        for entry in line.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
            let mut parts = entry.split(':');
            let (dest, amount) = match (parts.next(), parts.next(), parts.next()) {
                (Some(dest), Some(amount), None) => (dest.trim(), amount.trim()),
                _ => return Err(TapError::parse(line_num,
                                                format!("bad demand entry '{}'", entry))),
            };
            let to = network.node_index(parse_field(dest, line_num)?, true, line_num)?;
            let amount: f64 = parse_field(amount, line_num)?;
            network.graph.add_demand(from, to, amount);
        }
    }
    Ok(())
}

/// Splits a TNTP file into its `<KEY> value` metadata and the numbered, non-empty,
/// comment-free lines after `<END OF METADATA>`.
fn split_metadata(text: &str) -> TapResult<(HashMap<String, String>, Vec<(usize, &str)>)> {
    let mut metadata = HashMap::new();
    let mut lines = text.lines()
        .enumerate()
        .map(|(ii, line)| (ii + 1, strip_comment(line).trim()))
        .filter(|(_, line)| !line.is_empty());

    let mut found_end = false;
    for (line_num, line) in lines.by_ref() {
        if !line.starts_with('<') {
            return Err(TapError::parse(line_num, "expected metadata before the data"));
        }
        let close = match line.find('>') {
            Some(close) => close,
            None => return Err(TapError::parse(line_num, "unterminated metadata key")),
        };
        let key = line[1..close].trim().to_uppercase();
        if key == "END OF METADATA" {
            found_end = true;
            break;
        }
        metadata.insert(key, line[close + 1..].trim().to_string());
    }
    if !found_end {
        return Err(TapError::parse(0, "no <END OF METADATA> marker"));
    }
    Ok((metadata, lines.collect()))
}

fn strip_comment(line: &str) -> &str {
    match line.find('~') {
        Some(start) => &line[..start],
        None => line,
    }
}

fn parse_field<T: FromStr>(field: &str, line: usize) -> TapResult<T> {
    field.trim().parse::<T>()
        .map_err(|_| TapError::parse(line, format!("could not parse '{}'", field)))
}

fn optional<T: FromStr>(metadata: &HashMap<String, String>, key: &str) -> TapResult<Option<T>> {
    match metadata.get(key) {
        Some(value) => value.parse::<T>()
            .map(Some)
            .map_err(|_| TapError::parse(0, format!("bad value '{}' for <{}>", value, key))),
        None => Ok(None),
    }
}

fn required<T: FromStr>(metadata: &HashMap<String, String>, key: &str) -> TapResult<T> {
    match optional(metadata, key)? {
        Some(value) => Ok(value),
        None => Err(TapError::parse(0, format!("missing <{}>", key))),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // zones 1 and 2 are connected through nodes 3 and 4, and also directly
    static NETWORK: &str = "<NUMBER OF ZONES> 2
<NUMBER OF NODES> 4
<FIRST THRU NODE> 3
<NUMBER OF LINKS> 5
<END OF METADATA>

~ \tInit node\tTerm node\tCapacity\tLength\tFree Flow Time\tB\tPower\tSpeed limit\tToll\tType\t;
\t1\t3\t100\t2\t6\t0.15\t4\t0\t0.5\t1\t;
\t3\t4\t200\t1\t3\t0.15\t4\t0\t0\t1\t;
\t4\t2\t100\t2\t6\t0.15\t4\t0\t0\t1\t;
\t1\t2\t50\t10\t20\t1\t2.5\t0\t0\t1\t;
\t2\t1\t50\t10\t20\t1\t2\t0\t0\t1\t;
";

    static TRIPS: &str = "<NUMBER OF ZONES> 2
<TOTAL OD FLOW> 150.0
<END OF METADATA>

~ a comment line
Origin  1
    1 :    0.0;     2 :  100.0;
Origin  2
    1 :   50.0;
";

    #[test]
    fn test_parse_network() {
        let network = parse_network(NETWORK, 0.5, 2.).unwrap();
        assert_eq!(network.num_nodes, 4);
        assert_eq!(network.num_zones, 2);
        // sink copies of both zones
        assert_eq!(network.graph.num_nodes(), 6);
        assert_eq!(network.graph.num_links(), 5);

        let links: Vec<(NodeId, NodeId)> = network.graph.links()
            .map(|(ff, tt, _)| (ff, tt))
            .collect();
        // 1->3, 1->2, 2->1, 3->4, 4->2 with arrivals at zones sent to the sink copies
        assert_eq!(links, vec![(0, 2), (0, 5), (1, 4), (2, 3), (3, 5)]);

        let (_, _, first) = network.graph.links().next().unwrap();
        // free flow time plus half the length plus twice the toll
        assert_eq!(first.eval(0.), 6. + 1. + 1.);
        let expected = 8. + 6. * 0.15 * (50_f64 / 100.).powi(4);
        assert!((first.eval(50.) - expected).abs() < 1e-9);

        let (_, _, direct) = network.graph.links().nth(1).unwrap();
        match direct {
            CostFunction::Bpr(_) => (),
            _ => panic!("a power of 2.5 has no polynomial form"),
        }
    }

    #[test]
    fn test_parse_trips() {
        let mut network = parse_network(NETWORK, 0., 0.).unwrap();
        parse_trips(TRIPS, &mut network).unwrap();
        let demand = network.graph.demand();
        assert_eq!(demand.len(), 2);
        assert_eq!(demand[&0].len(), 1);
        assert_eq!(demand[&0][&5], 100.);
        assert_eq!(demand[&1][&4], 50.);
        assert_eq!(network.graph.total_demand(), 150.);
        assert!(network.graph.validate().is_ok());
    }

    #[test]
    fn test_restore_ids() {
        let network = parse_network(NETWORK, 0., 0.).unwrap();
        let mut flows = vec![LinkFlow { from: 3, to: 5, flow: 1., cost: 2. }];
        network.restore_ids(&mut flows);
        assert_eq!((flows[0].from, flows[0].to), (3, 1));
    }

    #[test]
    fn test_errors() {
        let no_end = "<NUMBER OF NODES> 4\n1 2 3 4 5 6 7 ;\n";
        assert!(matches!(parse_network(no_end, 0., 0.), Err(TapError::Parse { .. })));

        let bad_node = "<NUMBER OF NODES> 2\n<END OF METADATA>\n1 3 1 1 1 1 1 ;\n";
        match parse_network(bad_node, 0., 0.) {
            Err(TapError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected a parse error, got {:?}", other),
        }

        let short_row = "<NUMBER OF NODES> 2\n<END OF METADATA>\n1 2 1 ;\n";
        assert!(parse_network(short_row, 0., 0.).is_err());

        let mut network = parse_network(NETWORK, 0., 0.).unwrap();
        let orphan = "<END OF METADATA>\n 2 : 5.0;\n";
        assert!(parse_trips(orphan, &mut network).is_err());
    }

    #[test]
    fn test_import_files() {
        let mut net_file = NamedTempFile::new().unwrap();
        net_file.write_all(NETWORK.as_bytes()).unwrap();
        let mut trips_file = NamedTempFile::new().unwrap();
        trips_file.write_all(TRIPS.as_bytes()).unwrap();

        let network = import(net_file.path(), trips_file.path(), 0., 0.).unwrap();
        assert_eq!(network.graph.total_demand(), 150.);

        let missing = import(Path::new("/nonexistent/net.tntp"), trips_file.path(), 0., 0.);
        assert!(matches!(missing, Err(TapError::Io(_))));
    }
}
