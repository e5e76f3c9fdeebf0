//! Randomized topology generators and the topology composer.
//!
//! Generators are plain parameter structs: every size and speed is a
//! [`Range`](crate::random::Range) resolved with the [`Context`]'s
//! generator when it is needed, so two branches of the same topology can
//! have different lengths. The structs deserialize from JSON with every
//! field optional.
//!
//! [`Context`]: crate::Context

mod combine;
mod linear_branches;
mod two_layer_tree;

pub use self::{
    combine::{CombineError, CombineOptions, combine_topologies},
    linear_branches::LinearBranches,
    two_layer_tree::TwoLayerTree,
};
use crate::{
    measure::Bandwidth,
    node::{Node, NodeError, NodeId, NodeKind},
    random::RangeError,
    topology::{Topology, TopologyError},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeneratorError {
    #[error("The main line needs at least one switch")]
    EmptyMainLine,
    #[error("Layer {0} needs at least one switch")]
    EmptyLayer(u8),
    #[error("Cannot pick {requested} join points among {available} main switches")]
    TooManyJoinPoints { requested: usize, available: usize },
    #[error("Leaves must be end devices, not {0}")]
    LeafKind(NodeKind),
    #[error("{0}")]
    Node(#[from] NodeError),
    #[error("{0}")]
    Range(#[from] RangeError),
    #[error("{0}")]
    Topology(#[from] TopologyError),
}

/// register `node` and connect it to `parent`, returns the new node
fn attach(
    topology: &mut Topology,
    parent: NodeId,
    node: Node,
    bandwidth: Bandwidth,
) -> Result<NodeId, TopologyError> {
    let id = topology.add_node(node)?;
    topology.connect(parent, id, bandwidth)?;
    Ok(id)
}
