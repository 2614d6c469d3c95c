//! Rendering a [`digsinet_core::Topology`] to the container-runtime's YAML
//! schema.
//!
//! Grounded on `builders/clab_builder.py`'s `TopologyDumper.__to_dict`.

use digsinet_core::{Topology, TopologyBuilder, TopologyError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize)]
struct ClabFile {
    name: String,
    topology: ClabBody,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClabBody {
    nodes: BTreeMap<String, ClabNode>,
    links: Vec<ClabLink>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClabNode {
    kind: String,
    image: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClabLink {
    endpoints: [String; 2],
}

/// Errors raised while parsing a container-runtime topology file back into
/// a [`Topology`] (the inverse of [`dump`]).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file was not valid YAML, or not shaped like a clab topology.
    #[error("failed to parse clab topology: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// A link endpoint was not in the documented `node:interface` shape.
    #[error("malformed link endpoint '{0}', expected 'node:interface'")]
    MalformedEndpoint(String),
    /// The parsed nodes/links failed the usual topology invariants.
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Parse a container-runtime topology document (the same shape [`dump`]
/// produces) into a [`Topology`]. Used to load the real network's topology
/// file at supervisor boot.
///
/// # Errors
///
/// See [`LoadError`].
pub fn load(yaml: &str) -> Result<Topology, LoadError> {
    let file: ClabFile = serde_yaml::from_str(yaml)?;
    let mut builder = TopologyBuilder::new();

    for (name, node) in file.topology.nodes {
        builder.add_node_with_image(&name, &node.kind, &node.image)?;
    }

    for link in file.topology.links {
        let [from, to] = link.endpoints;
        let (from_node, from_iface) = split_endpoint(&from)?;
        let (to_node, to_iface) = split_endpoint(&to)?;
        builder.add_link(&from_node, &to_node, &from_iface, &to_iface)?;
    }

    Ok(builder.build())
}

fn split_endpoint(endpoint: &str) -> Result<(String, String), LoadError> {
    endpoint
        .split_once(':')
        .map(|(node, iface)| (node.to_string(), iface.to_string()))
        .ok_or_else(|| LoadError::MalformedEndpoint(endpoint.to_string()))
}

/// Render `topology` (named `name`, since [`Topology`] itself carries no
/// name field — the name is supplied by the sibling/topology config) to
/// the container-lab YAML document shape:
/// `{name, topology: {nodes: {name: {kind, image}}, links: [{endpoints}]}}`.
///
/// # Errors
///
/// Returns an error if `serde_yaml` fails to serialise the structure
/// (practically unreachable given the input shape, but propagated rather
/// than unwrapped).
pub fn dump(name: &str, topology: &Topology) -> Result<String, serde_yaml::Error> {
    let nodes = topology
        .nodes
        .iter()
        .map(|node| {
            (
                node.name.clone(),
                ClabNode {
                    kind: node.kind.clone(),
                    image: node.image.clone(),
                },
            )
        })
        .collect();

    let links = topology
        .links
        .iter()
        .map(|link| ClabLink {
            endpoints: [link.from.to_clab_string(), link.to.to_clab_string()],
        })
        .collect();

    let file = ClabFile {
        name: name.to_string(),
        topology: ClabBody { nodes, links },
    };

    serde_yaml::to_string(&file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use digsinet_core::TopologyBuilder;

    #[test]
    fn dumps_nodes_and_links_in_clab_shape() {
        let mut builder = TopologyBuilder::new();
        builder.add_node("r1", "ceos").unwrap();
        builder.add_node("r2", "ceos").unwrap();
        builder.add_link("r1", "r2", "eth1", "eth1").unwrap();
        let topology = builder.build();

        let yaml = dump("net", &topology).unwrap();
        assert!(yaml.contains("name: net"));
        assert!(yaml.contains("kind: ceos"));
        assert!(yaml.contains("image: ceos:latest"));
        assert!(yaml.contains("r1:eth1"));
        assert!(yaml.contains("r2:eth1"));
    }
}
