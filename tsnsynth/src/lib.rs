/*!
# TSN scenario synthesis

Preset industrial and automotive scenarios built on [`tsnsynth_core`],
and their JSON export.

*/

pub mod export;
pub mod scenario;

// convenient re-export of `tsnsynth_core` core objects
pub use tsnsynth_core::{
    Context, Link, LinkId, Node, NodeId, NodeKind, Stream, StreamId, Topology, TopologyDocument,
    measure::{Bandwidth, PerPriority, Priority},
};

pub use self::scenario::{DanglingBridge, ScenarioOptions, ScenarioSize, automotive, industrial};
