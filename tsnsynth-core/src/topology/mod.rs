mod guarantees;
mod route;
mod weights;

pub use self::{route::RouteError, weights::LinkWeight};
use crate::{
    link::{Link, LinkId},
    measure::{Bandwidth, PerPriority},
    node::{NAME_DELIMITER, Node, NodeError, NodeId, NodeKind},
    stream::{LocalStream, Stream, StreamId},
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;
use tracing::debug;

/// Per-link, per-priority table (max delays, idle slopes, queue sizes).
pub type LinkTable = HashMap<LinkId, PerPriority<f64>>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    #[error("Node {0} is already part of this topology.")]
    DuplicateNode(String),
    #[error("Node ({0}) Not Found")]
    UnknownNode(NodeId),
    #[error("Node `{0}' Not Found")]
    UnknownNodeName(String),
    #[error("Cannot connect node {0} to itself")]
    SelfLoop(String),
    #[error("link '{from}-{to}' not found")]
    LinkNotFound { from: String, to: String },
    #[error("link '{0}' not found")]
    LinkNameNotFound(String),
    #[error("Link ({0}) Not Found")]
    UnknownLink(LinkId),
    #[error("Stream {0} is already registered")]
    DuplicateStream(StreamId),
    #[error("Stream {0} Not Found")]
    StreamNotFound(StreamId),
    #[error("{0}")]
    Node(#[from] NodeError),
}

/// The container every other component works on.
///
/// A [`Topology`] owns its [`Node`]s, the directed [`Link`]s between
/// them, the registered [`Stream`]s and the optional per-link,
/// per-priority guarantee tables. Nodes and links live in arenas and are
/// addressed through [`NodeId`] and [`LinkId`] handles; a node's adjacency
/// list is the list of the handles of its outgoing links.
///
/// # Example
///
/// ```
/// use tsnsynth_core::{measure::Bandwidth, node::Node, topology::Topology};
///
/// let mut topo = Topology::new();
/// let bw = Bandwidth::new(1_000_000_000);
///
/// let sw = topo.add_node(Node::switch("sw0").unwrap()).unwrap();
/// let host = topo.create_and_add_links(Node::switch("sw0").unwrap(), Node::host("d0").unwrap(), bw).unwrap();
///
/// // one connection, two directed links
/// assert_eq!(topo.link_count(), 2);
/// let link = topo.get_link(sw, host).unwrap();
/// assert_eq!(topo.link_name(link).unwrap(), "sw0-d0");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Topology {
    nodes: Vec<Node>,
    names: HashMap<String, NodeId>,

    /// directed links, allocated in mirrored pairs (see [`LinkId::mirror`])
    links: Vec<Link>,

    streams: BTreeMap<StreamId, Stream>,
    /// for every link, the streams crossing it and at which hop
    streams_per_link: HashMap<LinkId, BTreeMap<StreamId, usize>>,

    /// The max delays (per-hop guarantees) per link and per priority.
    ///
    /// Do not adjust directly, the accumulated latencies of the streams
    /// depend on it: use [`Topology::update_guarantees`] and friends.
    max_delays: Option<LinkTable>,
    /// The max idle slopes per link and per priority.
    max_idle_slopes: Option<LinkTable>,
    /// The max queue sizes per link and per priority.
    max_queue_sizes: Option<LinkTable>,
}

impl Topology {
    /// Create a new, empty topology without guarantee tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// all the nodes, in registration order
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId::from_index(index), node))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub(crate) fn try_node(&self, id: NodeId) -> Result<&Node, TopologyError> {
        self.node(id).ok_or(TopologyError::UnknownNode(id))
    }

    fn node_name(&self, id: NodeId) -> String {
        self.node(id)
            .map(|node| node.name().to_owned())
            .unwrap_or_else(|| id.to_string())
    }

    /// Every directed link of the topology.
    ///
    /// This is the union of all the nodes' adjacency lists: each physical
    /// connection appears twice, once per direction.
    pub fn links(&self) -> impl ExactSizeIterator<Item = (LinkId, &Link)> {
        self.links
            .iter()
            .enumerate()
            .map(|(index, link)| (LinkId::from_index(index), link))
    }

    /// one directed link per physical connection
    pub fn physical_links(&self) -> impl Iterator<Item = (LinkId, &Link)> {
        self.links().filter(|(id, _)| id.is_forward())
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.index())
    }

    pub(crate) fn try_link(&self, id: LinkId) -> Result<&Link, TopologyError> {
        self.link(id).ok_or(TopologyError::UnknownLink(id))
    }

    /// number of directed links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// the same connection in the other direction
    pub fn mirror(&self, id: LinkId) -> Result<LinkId, TopologyError> {
        self.try_link(id)?;
        Ok(id.mirror())
    }

    /// `"<from>-<to>"`
    pub fn link_name(&self, id: LinkId) -> Result<String, TopologyError> {
        let link = self.try_link(id)?;
        Ok(format!(
            "{}{NAME_DELIMITER}{}",
            self.try_node(link.from())?.name(),
            self.try_node(link.to())?.name()
        ))
    }

    /// Register a node.
    ///
    /// The node joins the topology without links, whatever adjacency it
    /// may have carried before; only its name, kind and join-point flag
    /// are kept.
    ///
    /// # Errors
    ///
    /// [`TopologyError::DuplicateNode`] if a node of the same name is
    /// already registered.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, TopologyError> {
        if self.names.contains_key(node.name()) {
            return Err(TopologyError::DuplicateNode(node.name().to_owned()));
        }

        let node = Node::new(node.name(), node.kind())?.with_join_point(node.join_point());
        let id = NodeId::from_index(self.nodes.len());
        self.names.insert(node.name().to_owned(), id);
        self.nodes.push(node);

        Ok(id)
    }

    /// register `node` unless a node of the same name already exists
    fn get_or_add_node(&mut self, node: Node) -> Result<NodeId, TopologyError> {
        match self.node_by_name(node.name()) {
            Some(id) => Ok(id),
            None => self.add_node(node),
        }
    }

    /// Connect two nodes, registering either of them if no node of that
    /// name is part of the topology yet.
    ///
    /// Returns the [`NodeId`] of `n2`, convenient to grow chains:
    ///
    /// ```
    /// # use tsnsynth_core::{measure::Bandwidth, node::Node, topology::Topology};
    /// let mut topo = Topology::new();
    /// let bw = Bandwidth::new(100_000_000);
    /// let mut last = topo.add_node(Node::switch("sw0").unwrap()).unwrap();
    /// for i in 1..4 {
    ///     let name = topo.node(last).unwrap().name().to_owned();
    ///     last = topo
    ///         .create_and_add_links(Node::switch(name).unwrap(), Node::switch(format!("sw{i}")).unwrap(), bw)
    ///         .unwrap();
    /// }
    /// assert_eq!(topo.node_count(), 4);
    /// assert_eq!(topo.link_count(), 6);
    /// ```
    pub fn create_and_add_links(
        &mut self,
        n1: Node,
        n2: Node,
        bandwidth: Bandwidth,
    ) -> Result<NodeId, TopologyError> {
        let n1 = self.get_or_add_node(n1)?;
        let n2 = self.get_or_add_node(n2)?;
        self.connect(n1, n2, bandwidth)?;
        Ok(n2)
    }

    /// Add a bidirectional connection between two registered nodes.
    ///
    /// Allocates the next free port on each node and appends the two
    /// directed links to the respective adjacency lists. Returns the
    /// `a -> b` link and its mirror.
    pub fn connect(
        &mut self,
        a: NodeId,
        b: NodeId,
        bandwidth: Bandwidth,
    ) -> Result<(LinkId, LinkId), TopologyError> {
        self.try_node(a)?;
        self.try_node(b)?;
        if a == b {
            return Err(TopologyError::SelfLoop(self.node_name(a)));
        }

        let port_a = self.nodes[a.index()].allocate_port();
        let port_b = self.nodes[b.index()].allocate_port();

        let forward = LinkId::from_index(self.links.len());
        let backward = forward.mirror();
        debug_assert!(forward.is_forward());

        self.links.push(Link::new(a, b, bandwidth, port_a, port_b));
        self.links.push(Link::new(b, a, bandwidth, port_b, port_a));
        self.nodes[a.index()].push_link(forward);
        self.nodes[b.index()].push_link(backward);

        Ok((forward, backward))
    }

    /// the first link of `n1`'s adjacency list arriving at `n2`
    pub fn get_link(&self, n1: NodeId, n2: NodeId) -> Result<LinkId, TopologyError> {
        self.try_node(n1)?
            .links()
            .iter()
            .copied()
            .find(|id| self.links[id.index()].to() == n2)
            .ok_or_else(|| TopologyError::LinkNotFound {
                from: self.node_name(n1),
                to: self.node_name(n2),
            })
    }

    /// look a link up by its `"<from>-<to>"` name
    pub fn get_link_by_name(&self, name: &str) -> Result<LinkId, TopologyError> {
        self.links()
            .map(|(id, _)| id)
            .find(|id| self.link_name(*id).is_ok_and(|link_name| link_name == name))
            .ok_or_else(|| TopologyError::LinkNameNotFound(name.to_owned()))
    }

    fn nodes_where(&self, predicate: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| predicate(node))
            .map(|(id, _)| id)
            .collect()
    }

    /// end devices: hosts, controllers and sensors
    pub fn hosts(&self) -> Vec<NodeId> {
        self.nodes_where(Node::is_end_device)
    }

    pub fn controllers(&self) -> Vec<NodeId> {
        self.nodes_where(|node| node.kind() == NodeKind::Controller)
    }

    pub fn sensors(&self) -> Vec<NodeId> {
        self.nodes_where(|node| node.kind() == NodeKind::Sensor)
    }

    pub fn switches(&self) -> Vec<NodeId> {
        self.nodes_where(|node| node.kind() == NodeKind::Switch)
    }

    pub fn join_points(&self) -> Vec<NodeId> {
        self.nodes_where(Node::join_point)
    }

    pub fn set_join_point(&mut self, id: NodeId, join_point: bool) -> Result<(), TopologyError> {
        self.try_node(id)?;
        self.nodes[id.index()].set_join_point(join_point);
        Ok(())
    }

    /// Switches connected to at most one other switch: the ends of lines
    /// and branches, candidates for extra redundancy links.
    pub fn dangling_switches(&self) -> Vec<NodeId> {
        self.nodes_where(|node| {
            node.kind() == NodeKind::Switch
                && node
                    .links()
                    .iter()
                    .filter(|id| {
                        let to = self.links[id.index()].to();
                        self.nodes[to.index()].kind() == NodeKind::Switch
                    })
                    .count()
                    <= 1
        })
    }

    /// Rename every node to `prefix + name`.
    ///
    /// Registered streams and every guarantee table are dropped: they
    /// belong to the topology before the rename.
    pub fn with_prefix(mut self, prefix: &str) -> Result<Self, TopologyError> {
        self.remove_all_streams();
        self.max_delays = None;
        self.max_idle_slopes = None;
        self.max_queue_sizes = None;

        let mut names = HashMap::with_capacity(self.nodes.len());
        for (index, node) in self.nodes.iter_mut().enumerate() {
            node.add_prefix(prefix)?;
            names.insert(node.name().to_owned(), NodeId::from_index(index));
        }
        self.names = names;

        Ok(self)
    }

    /// Register a stream on every link of its path.
    ///
    /// If the topology already has guarantee tables, the stream's
    /// per-hop values are computed right away.
    pub fn add_stream(&mut self, stream: Stream) -> Result<StreamId, TopologyError> {
        let id = stream.id();
        if self.streams.contains_key(&id) {
            return Err(TopologyError::DuplicateStream(id));
        }
        for link in stream.path() {
            self.try_link(*link)?;
        }

        for (hop, link) in stream.path().iter().enumerate() {
            self.streams_per_link
                .entry(*link)
                .or_default()
                .insert(id, hop);
        }
        debug!(stream = %stream, "stream registered");
        self.streams.insert(id, stream);

        self.update_stream(id);

        Ok(id)
    }

    pub fn add_streams(
        &mut self,
        streams: impl IntoIterator<Item = Stream>,
    ) -> Result<(), TopologyError> {
        for stream in streams {
            self.add_stream(stream)?;
        }
        Ok(())
    }

    /// Unregister a stream from every link of its path and hand it back.
    pub fn remove_stream(&mut self, id: StreamId) -> Result<Stream, TopologyError> {
        let stream = self
            .streams
            .remove(&id)
            .ok_or(TopologyError::StreamNotFound(id))?;

        for link in stream.path() {
            if let Some(registered) = self.streams_per_link.get_mut(link) {
                registered.remove(&id);
                if registered.is_empty() {
                    self.streams_per_link.remove(link);
                }
            }
        }

        Ok(stream)
    }

    pub fn remove_all_streams(&mut self) {
        self.streams.clear();
        self.streams_per_link.clear();
    }

    pub fn stream(&self, id: StreamId) -> Option<&Stream> {
        self.streams.get(&id)
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Every stream registered on at least one link, by ascending id.
    pub fn get_all_streams(&self) -> Vec<&Stream> {
        self.streams_per_link
            .values()
            .flat_map(|registered| registered.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|id| self.streams.get(&id))
            .collect()
    }

    /// the streams crossing `link`, with their view at that hop
    pub fn get_streams_of_link(
        &self,
        link: LinkId,
    ) -> impl Iterator<Item = (&Stream, &LocalStream)> {
        self.streams_per_link
            .get(&link)
            .into_iter()
            .flat_map(|registered| registered.iter())
            .filter_map(|(id, hop)| {
                let stream = self.streams.get(id)?;
                Some((stream, stream.local_streams().get(*hop)?))
            })
    }
}
