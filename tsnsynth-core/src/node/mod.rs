mod id;

pub use self::id::NodeId;
use crate::link::LinkId;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Character joining two node names into a link name (`a-b`); node names
/// may not contain it.
pub const NAME_DELIMITER: char = '-';

/// The role of a [`Node`] in the topology.
///
/// Every kind but [`NodeKind::Switch`] is an end device: streams start
/// and end on end devices only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Switch,
    Host,
    Controller,
    Sensor,
}

impl NodeKind {
    pub const ALL: [Self; 4] = [Self::Switch, Self::Host, Self::Controller, Self::Sensor];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::Host => "host",
            Self::Controller => "controller",
            Self::Sensor => "sensor",
        }
    }

    /// `true` for hosts, controllers and sensors
    #[inline]
    pub fn is_end_device(self) -> bool {
        !matches!(self, Self::Switch)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = NodeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| NodeError::InvalidKind(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("Node name may not be empty")]
    EmptyName,
    #[error("Node name may not contain '-': `{0}'")]
    InvalidName(String),
    #[error("Node type must be one of switch, host, controller, sensor, not `{0}'")]
    InvalidKind(String),
}

/// A switch or an end device of a [`Topology`].
///
/// A `Node` is created detached, then handed over to
/// [`Topology::add_node`] which returns its [`NodeId`]. Once registered,
/// the node's adjacency list holds the handles of its outgoing links in
/// the order their ports were assigned: the link at position `p` leaves
/// through port `p`.
///
/// [`Topology`]: crate::topology::Topology
/// [`Topology::add_node`]: crate::topology::Topology::add_node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    kind: NodeKind,
    links: Vec<LinkId>,
    next_port: u32,
    join_point: bool,
}

fn check_name(name: &str) -> Result<(), NodeError> {
    if name.is_empty() {
        Err(NodeError::EmptyName)
    } else if name.contains(NAME_DELIMITER) {
        Err(NodeError::InvalidName(name.to_owned()))
    } else {
        Ok(())
    }
}

impl Node {
    /// Create a detached node.
    ///
    /// # Errors
    ///
    /// The name may not be empty nor contain [`NAME_DELIMITER`].
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Result<Self, NodeError> {
        let name = name.into();
        check_name(&name)?;
        Ok(Self {
            name,
            kind,
            links: Vec::new(),
            next_port: 0,
            join_point: false,
        })
    }

    pub fn switch(name: impl Into<String>) -> Result<Self, NodeError> {
        Self::new(name, NodeKind::Switch)
    }

    pub fn host(name: impl Into<String>) -> Result<Self, NodeError> {
        Self::new(name, NodeKind::Host)
    }

    pub fn controller(name: impl Into<String>) -> Result<Self, NodeError> {
        Self::new(name, NodeKind::Controller)
    }

    pub fn sensor(name: impl Into<String>) -> Result<Self, NodeError> {
        Self::new(name, NodeKind::Sensor)
    }

    /// flag (or unflag) the node as a join point for the composer
    #[must_use]
    pub fn with_join_point(mut self, join_point: bool) -> Self {
        self.join_point = join_point;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[inline]
    pub fn is_end_device(&self) -> bool {
        self.kind.is_end_device()
    }

    /// outgoing links, in port order
    #[inline]
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    #[inline]
    pub fn join_point(&self) -> bool {
        self.join_point
    }

    /// The last port handed out, `None` if the node has no link yet.
    pub fn last_used_port(&self) -> Option<u32> {
        self.next_port.checked_sub(1)
    }

    pub(crate) fn allocate_port(&mut self) -> u32 {
        let port = self.next_port;
        self.next_port += 1;
        port
    }

    pub(crate) fn push_link(&mut self, link: LinkId) {
        self.links.push(link);
    }

    pub(crate) fn set_join_point(&mut self, join_point: bool) {
        self.join_point = join_point;
    }

    pub(crate) fn add_prefix(&mut self, prefix: &str) -> Result<(), NodeError> {
        let name = format!("{prefix}{}", self.name);
        check_name(&name)?;
        self.name = name;
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_may_not_contain_delimiter() {
        assert_eq!(
            Node::switch("a-b"),
            Err(NodeError::InvalidName("a-b".to_owned()))
        );
        assert_eq!(Node::host(""), Err(NodeError::EmptyName));
        assert!(Node::host("d_0.0.0_1").is_ok());
    }

    #[test]
    fn kind_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(kind.to_string().parse::<NodeKind>(), Ok(kind));
        }
        assert_eq!(
            "router".parse::<NodeKind>(),
            Err(NodeError::InvalidKind("router".to_owned()))
        );
    }

    #[test]
    fn end_devices() {
        assert!(!NodeKind::Switch.is_end_device());
        assert!(NodeKind::Host.is_end_device());
        assert!(NodeKind::Controller.is_end_device());
        assert!(NodeKind::Sensor.is_end_device());
    }

    #[test]
    fn ports_are_sequential() {
        let mut node = Node::switch("sw").unwrap();
        assert_eq!(node.last_used_port(), None);
        assert_eq!(node.allocate_port(), 0);
        assert_eq!(node.allocate_port(), 1);
        assert_eq!(node.allocate_port(), 2);
        assert_eq!(node.last_used_port(), Some(2));
    }

    #[test]
    fn prefix() {
        let mut node = Node::host("d_1").unwrap();
        node.add_prefix("r0_").unwrap();
        assert_eq!(node.name(), "r0_d_1");
        assert!(node.add_prefix("bad-").is_err());
        assert_eq!(node.name(), "r0_d_1");
    }

    #[test]
    fn join_point_flag() {
        let node = Node::switch("sw").unwrap().with_join_point(true);
        assert!(node.join_point());
        assert_eq!(node.to_string(), "sw(switch)");
    }
}
