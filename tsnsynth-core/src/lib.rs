//! Synthesis of time-sensitive network topologies, flows and their
//! static per-hop guarantees.
//!
//! The usual pipeline is: generate one or more topologies
//! ([`generator`]), compose them ([`generator::combine_topologies`]),
//! populate them with streams ([`stream::StreamFactory`]), then apply the
//! per-link guarantee tables ([`topology::Topology::update_guarantees_all_links`])
//! and hand the result over as a [`document::TopologyDocument`].
//!
//! Every random decision is drawn from a [`Context`].

mod context;
pub mod defaults;
pub mod document;
pub mod generator;
pub mod link;
pub mod measure;
pub mod node;
pub mod random;
pub mod stats;
pub mod stream;
pub mod topology;

pub use self::{
    context::Context,
    document::TopologyDocument,
    link::{Link, LinkId},
    node::{Node, NodeId, NodeKind},
    stream::{Stream, StreamId},
    topology::Topology,
};
