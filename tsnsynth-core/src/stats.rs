//! Topology statistics.
//!
//! [`TopologyStats`] provides a point-in-time snapshot of a topology.
//! Obtain one via [`Topology::stats`](crate::topology::Topology::stats).

use crate::{
    node::NodeKind,
    topology::Topology,
};
use std::fmt;

/// Point-in-time snapshot of a topology's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopologyStats {
    /// Number of switches.
    pub switches: usize,
    /// Number of plain hosts.
    pub hosts: usize,
    /// Number of controllers.
    pub controllers: usize,
    /// Number of sensors.
    pub sensors: usize,
    /// Number of nodes flagged as join points.
    pub join_points: usize,
    /// Number of directed links (twice the number of connections).
    pub links: usize,
    /// Number of registered streams.
    pub streams: usize,
    /// Hop count of the longest registered stream.
    pub longest_path: usize,
}

impl Topology {
    pub fn stats(&self) -> TopologyStats {
        let mut stats = TopologyStats {
            links: self.link_count(),
            streams: self.stream_count(),
            ..TopologyStats::default()
        };

        for (_, node) in self.nodes() {
            match node.kind() {
                NodeKind::Switch => stats.switches += 1,
                NodeKind::Host => stats.hosts += 1,
                NodeKind::Controller => stats.controllers += 1,
                NodeKind::Sensor => stats.sensors += 1,
            }
            if node.join_point() {
                stats.join_points += 1;
            }
        }

        stats.longest_path = self
            .get_all_streams()
            .iter()
            .map(|stream| stream.hops())
            .max()
            .unwrap_or_default();

        stats
    }
}

impl TopologyStats {
    /// hosts, controllers and sensors
    pub fn end_devices(&self) -> usize {
        self.hosts + self.controllers + self.sensors
    }
}

impl fmt::Display for TopologyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} switches, {} end devices, {} links, {} streams (longest {} hops)",
            self.switches,
            self.end_devices(),
            self.links,
            self.streams,
            self.longest_path,
        )
    }
}
