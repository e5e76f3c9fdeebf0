mod id;

use crate::{measure::Bandwidth, node::NodeId};

pub use self::id::LinkId;

/// One direction of a connection between two [`Node`]s.
///
/// Every physical connection is stored as two `Link`s, mirror images of
/// each other: `from` and `to` swapped, `egress_port` and `ingress_port`
/// swapped, same bandwidth. Both are part of the topology's link set on
/// their own so that per-priority guarantees can be asymmetric.
///
/// Equality covers all five fields, hence the two directions of the same
/// connection are never equal.
///
/// [`Node`]: crate::node::Node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    from: NodeId,
    to: NodeId,
    bandwidth: Bandwidth,
    egress_port: u32,
    ingress_port: u32,
}

impl Link {
    pub(crate) fn new(
        from: NodeId,
        to: NodeId,
        bandwidth: Bandwidth,
        egress_port: u32,
        ingress_port: u32,
    ) -> Self {
        Self {
            from,
            to,
            bandwidth,
            egress_port,
            ingress_port,
        }
    }

    /// the node this link leaves from
    #[inline]
    pub fn from(&self) -> NodeId {
        self.from
    }

    /// the node this link arrives at
    #[inline]
    pub fn to(&self) -> NodeId {
        self.to
    }

    #[inline]
    pub fn bandwidth(&self) -> Bandwidth {
        self.bandwidth
    }

    /// port of `from` the link leaves through
    #[inline]
    pub fn egress_port(&self) -> u32 {
        self.egress_port
    }

    /// port of `to` the link arrives on
    #[inline]
    pub fn ingress_port(&self) -> u32 {
        self.ingress_port
    }

    /// the end of the link that is not `node`
    pub fn other(&self, node: NodeId) -> NodeId {
        if node == self.from { self.to } else { self.from }
    }

    /// the same connection, seen in the other direction
    pub fn mirror(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            bandwidth: self.bandwidth,
            egress_port: self.ingress_port,
            ingress_port: self.egress_port,
        }
    }
}
