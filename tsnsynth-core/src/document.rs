//! The serialized form of a [`Topology`].
//!
//! ```json
//! {
//!   "nodes": [{"name": "main_sw0", "type": "switch"}, ...],
//!   "links": [{"n1": "main_sw0", "n2": "main_sw1", "bandwidth": 1000000000.0}, ...],
//!   "streams": [{"id": 0, "label": "st0", "path": ["d_0.0.0_0", "branch_0.0_sw0", ...],
//!                "priority": 5, "rate": 12000.0, "burst": 4096,
//!                "minFrameSize": 512, "maxFrameSize": 3936}, ...]
//! }
//! ```
//!
//! Every directed link has its own entry and streams are sorted by id.

use crate::{
    measure::{Bandwidth, Priority},
    node::NodeKind,
    stream::{Stream, StreamId},
    topology::Topology,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyDocument {
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
    pub streams: Vec<StreamRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub n1: String,
    pub n2: String,
    pub bandwidth: Bandwidth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    pub id: StreamId,
    pub label: String,
    /// node names, from the source through every hop
    pub path: Vec<String>,
    pub priority: Priority,
    pub rate: f64,
    pub burst: u64,
    pub min_frame_size: u64,
    pub max_frame_size: u64,
}

impl StreamRecord {
    fn new(stream: &Stream, topology: &Topology) -> Self {
        Self {
            id: stream.id(),
            label: stream.label().to_owned(),
            path: stream
                .node_names(topology)
                .into_iter()
                .map(str::to_owned)
                .collect(),
            priority: stream.priority(),
            rate: stream.rate(),
            burst: stream.burst(),
            min_frame_size: stream.min_frame_size(),
            max_frame_size: stream.max_frame_size(),
        }
    }
}

impl TopologyDocument {
    pub fn from_topology(topology: &Topology) -> Self {
        let name = |id| {
            topology
                .node(id)
                .map(|node| node.name().to_owned())
                .unwrap_or_default()
        };

        Self {
            nodes: topology
                .nodes()
                .map(|(_, node)| NodeRecord {
                    name: node.name().to_owned(),
                    kind: node.kind(),
                })
                .collect(),
            links: topology
                .links()
                .map(|(_, link)| LinkRecord {
                    n1: name(link.from()),
                    n2: name(link.to()),
                    bandwidth: link.bandwidth(),
                })
                .collect(),
            streams: topology
                .get_all_streams()
                .into_iter()
                .map(|stream| StreamRecord::new(stream, topology))
                .collect(),
        }
    }
}

impl From<&Topology> for TopologyDocument {
    fn from(topology: &Topology) -> Self {
        Self::from_topology(topology)
    }
}
