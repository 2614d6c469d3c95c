//! The topology model (C1).
//!
//! A [`Topology`] is an immutable description of a network: an ordered,
//! name-unique set of [`Node`]s and an ordered sequence of [`Link`]s between
//! them. Topologies are produced by a [`TopologyBuilder`], never mutated in
//! place, mirroring the teacher's reducer-output style of "build a value,
//! then hand out an immutable copy".
//!
//! Sibling topologies are derived from the real topology by applying a
//! declarative [`TopologyAdjustment`]: node removals (with cascading link
//! pruning), node additions, then link removals and additions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors raised while building or adjusting a [`Topology`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// `add_link` referenced a node name that is not in the topology.
    #[error("unknown endpoint: node '{0}' is not part of the topology")]
    UnknownEndpoint(String),

    /// A node name was added more than once.
    #[error("duplicate node name: '{0}'")]
    DuplicateNode(String),

    /// A `node-remove` regex failed to compile.
    #[error("invalid node-remove pattern '{0}': {1}")]
    InvalidPattern(String, String),
}

use thiserror::Error;

/// One endpoint of a [`Link`]: a node name and the interface on that node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Endpoint {
    /// Name of the node this endpoint is attached to.
    pub node: String,
    /// Name of the interface on the node, e.g. `"eth0"`.
    pub interface: String,
}

impl Endpoint {
    /// Build a new endpoint.
    #[must_use]
    pub fn new(node: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            interface: interface.into(),
        }
    }

    /// Render as the container-runtime `node:interface` shape.
    #[must_use]
    pub fn to_clab_string(&self) -> String {
        format!("{}:{}", self.node, self.interface)
    }
}

/// A network device in a [`Topology`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique name within the topology.
    pub name: String,
    /// Vendor/OS tag, e.g. `"ceos"` or `"linux"`.
    pub kind: String,
    /// Container image reference used to materialise the node.
    pub image: String,
}

impl Node {
    /// Build a node, defaulting its image to `"{kind}:latest"` the way the
    /// source's `TopologyDumper` does when no explicit image is given.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        let image = format!("{kind}:latest");
        Self {
            name: name.into(),
            kind,
            image,
        }
    }

    /// Build a node with an explicit image reference.
    #[must_use]
    pub fn with_image(name: impl Into<String>, kind: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            image: image.into(),
        }
    }
}

/// A point-to-point link between two node interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Source endpoint.
    pub from: Endpoint,
    /// Destination endpoint.
    pub to: Endpoint,
}

impl Link {
    /// Build a link from endpoint parts.
    #[must_use]
    pub fn new(
        node_from: impl Into<String>,
        node_to: impl Into<String>,
        iface_from: impl Into<String>,
        iface_to: impl Into<String>,
    ) -> Self {
        Self {
            from: Endpoint::new(node_from, iface_from),
            to: Endpoint::new(node_to, iface_to),
        }
    }

    /// `true` if either endpoint names `node`.
    #[must_use]
    pub fn references(&self, node: &str) -> bool {
        self.from.node == node || self.to.node == node
    }
}

/// An immutable network topology: nodes plus the links between them.
///
/// Invariants upheld by [`TopologyBuilder`]: node names are unique, and
/// every link endpoint names an existing node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// Ordered, name-unique nodes.
    pub nodes: Vec<Node>,
    /// Ordered links.
    pub links: Vec<Link>,
}

impl Topology {
    /// Start building a topology from scratch.
    #[must_use]
    pub fn builder() -> TopologyBuilder {
        TopologyBuilder::new()
    }

    /// Look up a node by name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// `true` if a node with this name exists.
    #[must_use]
    pub fn has_node(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    /// Apply a declarative [`TopologyAdjustment`] and return the resulting
    /// topology. Ordering per spec §3: removals before additions, with
    /// link-pruning to deleted nodes folded into node-remove.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] if the adjustment references an unknown
    /// endpoint, adds a duplicate node name, or contains an invalid
    /// `node-remove` regex.
    pub fn adjust(&self, adjustment: &TopologyAdjustment) -> Result<Self, TopologyError> {
        let mut builder = TopologyBuilder::new();

        let remove_re = match &adjustment.node_remove {
            Some(pattern) => Some(
                regex::Regex::new(pattern)
                    .map_err(|e| TopologyError::InvalidPattern(pattern.clone(), e.to_string()))?,
            ),
            None => None,
        };

        let removed_names: std::collections::HashSet<&str> = self
            .nodes
            .iter()
            .map(|n| n.name.as_str())
            .filter(|name| remove_re.as_ref().is_some_and(|re| re.is_match(name)))
            .collect();

        for node in &self.nodes {
            if !removed_names.contains(node.name.as_str()) {
                builder.add_existing_node(node.clone())?;
            }
        }

        if let Some(additions) = &adjustment.node_add {
            for (name, spec) in additions {
                builder.add_existing_node(Node::with_image(name, &spec.kind, &spec.image))?;
            }
        }

        let removed_links: std::collections::HashSet<(&str, &str)> = adjustment
            .link_remove
            .iter()
            .flatten()
            .map(|pair| (pair.from.as_str(), pair.to.as_str()))
            .collect();

        for link in &self.links {
            if link.references_any(&removed_names) {
                continue;
            }
            let key = (link.from.node.as_str(), link.to.node.as_str());
            let key_rev = (link.to.node.as_str(), link.from.node.as_str());
            if removed_links.contains(&key) || removed_links.contains(&key_rev) {
                continue;
            }
            builder.add_existing_link(link.clone())?;
        }

        if let Some(additions) = &adjustment.link_add {
            for pair in additions {
                builder.add_link(&pair.from, &pair.to, &pair.interface_from, &pair.interface_to)?;
            }
        }

        Ok(builder.build())
    }
}

impl Link {
    fn references_any(&self, names: &std::collections::HashSet<&str>) -> bool {
        names.contains(self.from.node.as_str()) || names.contains(self.to.node.as_str())
    }
}

/// Builds a [`Topology`] incrementally, enforcing node-name uniqueness and
/// endpoint validity as each node and link is added.
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl TopologyBuilder {
    /// Start an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with the default `"{kind}:latest"` image.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::DuplicateNode`] if the name is already used.
    pub fn add_node(&mut self, name: impl Into<String>, kind: impl Into<String>) -> Result<&mut Self, TopologyError> {
        self.add_existing_node(Node::new(name, kind))
    }

    /// Add a node with an explicit image reference, overriding the
    /// `"{kind}:latest"` default.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::DuplicateNode`] if the name is already used.
    pub fn add_node_with_image(
        &mut self,
        name: impl Into<String>,
        kind: impl Into<String>,
        image: impl Into<String>,
    ) -> Result<&mut Self, TopologyError> {
        self.add_existing_node(Node::with_image(name, kind, image))
    }

    fn add_existing_node(&mut self, node: Node) -> Result<&mut Self, TopologyError> {
        if self.nodes.iter().any(|n| n.name == node.name) {
            return Err(TopologyError::DuplicateNode(node.name));
        }
        self.nodes.push(node);
        Ok(self)
    }

    /// Add a link between two existing nodes.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownEndpoint`] if either node name is not
    /// already present in the builder.
    pub fn add_link(
        &mut self,
        node_from: &str,
        node_to: &str,
        iface_from: &str,
        iface_to: &str,
    ) -> Result<&mut Self, TopologyError> {
        if !self.nodes.iter().any(|n| n.name == node_from) {
            return Err(TopologyError::UnknownEndpoint(node_from.to_string()));
        }
        if !self.nodes.iter().any(|n| n.name == node_to) {
            return Err(TopologyError::UnknownEndpoint(node_to.to_string()));
        }
        self.links.push(Link::new(node_from, node_to, iface_from, iface_to));
        Ok(self)
    }

    fn add_existing_link(&mut self, link: Link) -> Result<&mut Self, TopologyError> {
        self.add_link(&link.from.node, &link.to.node, &link.from.interface, &link.to.interface)
    }

    /// Drop every node and link, returning the builder to its initial state.
    pub fn clear(&mut self) -> &mut Self {
        self.nodes.clear();
        self.links.clear();
        self
    }

    /// Consume the builder and produce the finished [`Topology`].
    #[must_use]
    pub fn build(self) -> Topology {
        Topology {
            nodes: self.nodes,
            links: self.links,
        }
    }
}

/// A single node addition in a [`TopologyAdjustment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAdd {
    /// Vendor/OS tag for the new node.
    pub kind: String,
    /// Container image reference.
    pub image: String,
}

/// One endpoint pair named in a `link-add`/`link-remove` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEndpointPair {
    /// Source node name.
    pub from: String,
    /// Destination node name.
    pub to: String,
    /// Source interface name (ignored for `link-remove`).
    #[serde(default)]
    pub interface_from: String,
    /// Destination interface name (ignored for `link-remove`).
    #[serde(default)]
    pub interface_to: String,
}

/// A declarative, optional-field diff applied to a real topology to derive
/// one sibling's topology.
///
/// `link-add` and `link-remove` are modelled as distinct keys, since their
/// payload shapes differ and collapsing them would need a runtime tag
/// anyway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TopologyAdjustment {
    /// Regex matched against node names; matching nodes (and links that
    /// reference them) are removed before anything else happens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_remove: Option<String>,
    /// New nodes to add, keyed by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_add: Option<BTreeMap<String, NodeAdd>>,
    /// Links to remove, matched by endpoint node-name pair (either order).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_remove: Option<Vec<LinkEndpointPair>>,
    /// Links to add.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_add: Option<Vec<LinkEndpointPair>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_link_requires_known_endpoints() {
        let mut builder = Topology::builder();
        builder.add_node("a", "linux").unwrap();
        assert_eq!(
            builder.add_link("a", "b", "eth0", "eth0").unwrap_err(),
            TopologyError::UnknownEndpoint("b".to_string())
        );
    }

    #[test]
    fn add_link_success_keeps_both_nodes_present() {
        let mut builder = Topology::builder();
        builder.add_node("a", "linux").unwrap();
        builder.add_node("b", "linux").unwrap();
        builder.add_link("a", "b", "eth0", "eth0").unwrap();
        let topo = builder.build();
        assert!(topo.has_node("a"));
        assert!(topo.has_node("b"));
    }

    #[test]
    fn duplicate_node_name_rejected() {
        let mut builder = Topology::builder();
        builder.add_node("a", "linux").unwrap();
        assert_eq!(
            builder.add_node("a", "linux").unwrap_err(),
            TopologyError::DuplicateNode("a".to_string())
        );
    }

    fn sample_topology() -> Topology {
        let mut builder = Topology::builder();
        builder.add_node("a", "linux").unwrap();
        builder.add_node("b", "linux").unwrap();
        builder.add_node("c", "linux").unwrap();
        builder.add_link("a", "b", "e1", "e1").unwrap();
        builder.add_link("b", "c", "e2", "e1").unwrap();
        builder.build()
    }

    #[test]
    fn remove_node_cascades_to_links() {
        let topo = sample_topology();
        let adjustment = TopologyAdjustment {
            node_remove: Some("c".to_string()),
            ..Default::default()
        };
        let adjusted = topo.adjust(&adjustment).unwrap();
        assert!(!adjusted.has_node("c"));
        assert!(adjusted.links.iter().all(|l| !l.references("c")));
        assert_eq!(adjusted.links.len(), 1);
    }

    #[test]
    fn scenario_from_spec_8_1() {
        // Real topo {a, b, c; (a:e1,b:e1), (b:e2,c:e1)}, adjustment {node-remove: "c"}
        // Expected sibling topo: {a, b; (a:e1,b:e1)}.
        let topo = sample_topology();
        let adjustment = TopologyAdjustment {
            node_remove: Some("c".to_string()),
            ..Default::default()
        };
        let adjusted = topo.adjust(&adjustment).unwrap();
        assert_eq!(adjusted.nodes.len(), 2);
        assert_eq!(adjusted.links.len(), 1);
        assert_eq!(adjusted.links[0].from.node, "a");
        assert_eq!(adjusted.links[0].to.node, "b");
    }

    #[test]
    fn node_add_then_link_add() {
        let topo = sample_topology();
        let mut additions = BTreeMap::new();
        additions.insert(
            "d".to_string(),
            NodeAdd {
                kind: "ceos".to_string(),
                image: "ceos:latest".to_string(),
            },
        );
        let adjustment = TopologyAdjustment {
            node_add: Some(additions),
            link_add: Some(vec![LinkEndpointPair {
                from: "a".to_string(),
                to: "d".to_string(),
                interface_from: "e2".to_string(),
                interface_to: "e1".to_string(),
            }]),
            ..Default::default()
        };
        let adjusted = topo.adjust(&adjustment).unwrap();
        assert!(adjusted.has_node("d"));
        assert_eq!(adjusted.links.len(), 3);
    }
}
