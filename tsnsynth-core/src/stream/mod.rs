//! Streams (flows) and their per-hop views.
//!
//! A [`Stream`] is a walk through the topology from one end device to
//! another, with its traffic specification (priority, rate, burst, frame
//! sizes). For each hop it carries a [`LocalStream`] holding the values the
//! guarantee accountant derives from the topology's per-link tables.
//!
//! Streams are created with a [`StreamBuilder`] (or in bulk with a
//! [`StreamFactory`]) and then registered with
//! [`Topology::add_stream`](crate::topology::Topology::add_stream).

mod factory;
mod id;

pub use self::{
    factory::{EndpointSearch, EndpointSelection, StreamBatch, StreamError, StreamFactory},
    id::{StreamId, StreamIdGenerator},
};
use crate::{
    defaults::FRAME_OVERHEAD,
    link::LinkId,
    measure::Priority,
    node::NodeId,
    topology::Topology,
};
use std::fmt;
use thiserror::Error;

/// Errors raised when a [`Stream`] is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamBuildError {
    #[error("Missing stream information (`{0}')")]
    Missing(&'static str),
    #[error("A stream needs at least one link")]
    EmptyPath,
    #[error("Link {0} is not part of the topology")]
    UnknownLink(LinkId),
    #[error("Path is not contiguous between hop {index} and hop {next}", next = .index + 1)]
    NotContiguous { index: usize },
    #[error("burst={burst} < maxFrameSize={max_frame_size} + Preamble+IPG ({overhead})", overhead = FRAME_OVERHEAD)]
    BurstTooSmall { burst: u64, max_frame_size: u64 },
}

/// A flow of frames between two end devices.
///
/// Sizes are in bits. The `burst` includes the fixed [`FRAME_OVERHEAD`]
/// (preamble and inter-packet gap) while the frame sizes do not, hence
/// every stream satisfies `burst >= max_frame_size + FRAME_OVERHEAD`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    id: StreamId,
    label: String,
    path: Vec<LinkId>,
    priority: Priority,
    rate: f64,
    burst: u64,
    min_frame_size: u64,
    max_frame_size: u64,
    local_streams: Vec<LocalStream>,
}

/// The view of a [`Stream`] at one of its hops.
///
/// The accumulated latencies are the bounds at the moment a frame enters
/// the hop, in nanoseconds: the first hop of every stream is at `0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalStream {
    path_index: usize,
    link: LinkId,
    prev: Option<LinkId>,
    acc_max_latency: f64,
    acc_min_latency: f64,
    max_idle_slope: Option<f64>,
}

pub struct StreamBuilder<'a> {
    generator: &'a StreamIdGenerator,
    label: Option<String>,
    path: Option<Vec<LinkId>>,
    priority: Option<Priority>,
    rate: Option<f64>,
    burst: Option<u64>,
    frame_sizes: Option<(u64, u64)>,
}

impl<'a> StreamBuilder<'a> {
    pub fn new(generator: &'a StreamIdGenerator) -> Self {
        Self {
            generator,
            label: None,
            path: None,
            priority: None,
            rate: None,
            burst: None,
            frame_sizes: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn path(mut self, path: Vec<LinkId>) -> Self {
        self.path = Some(path);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// rate in bits per second
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    /// burst in bits, overhead included
    pub fn burst(mut self, burst: u64) -> Self {
        self.burst = Some(burst);
        self
    }

    /// minimum and maximum frame size in bits, overhead excluded
    pub fn frame_sizes(mut self, min_frame_size: u64, max_frame_size: u64) -> Self {
        self.frame_sizes = Some((min_frame_size, max_frame_size));
        self
    }

    /// Validate the stream against `topology` and assign its identifier.
    ///
    /// The identifier is drawn first: a failed build still consumes one.
    pub fn build(self, topology: &Topology) -> Result<Stream, StreamBuildError> {
        let id = self.generator.generate();

        let Some(label) = self.label else {
            return Err(StreamBuildError::Missing("label"));
        };
        let Some(path) = self.path else {
            return Err(StreamBuildError::Missing("path"));
        };
        let Some(priority) = self.priority else {
            return Err(StreamBuildError::Missing("priority"));
        };
        let Some(rate) = self.rate else {
            return Err(StreamBuildError::Missing("rate"));
        };
        let Some(burst) = self.burst else {
            return Err(StreamBuildError::Missing("burst"));
        };
        let Some((min_frame_size, max_frame_size)) = self.frame_sizes else {
            return Err(StreamBuildError::Missing("frame_sizes"));
        };

        check_path(topology, &path)?;

        if burst < max_frame_size.saturating_add(FRAME_OVERHEAD) {
            return Err(StreamBuildError::BurstTooSmall {
                burst,
                max_frame_size,
            });
        }

        let local_streams = local_streams(&path);

        Ok(Stream {
            id,
            label,
            path,
            priority,
            rate,
            burst,
            min_frame_size,
            max_frame_size,
            local_streams,
        })
    }
}

fn local_streams(path: &[LinkId]) -> Vec<LocalStream> {
    path.iter()
        .enumerate()
        .map(|(index, link)| {
            let prev = index.checked_sub(1).map(|prev| path[prev]);
            LocalStream::new(index, *link, prev)
        })
        .collect()
}

fn check_path(topology: &Topology, path: &[LinkId]) -> Result<(), StreamBuildError> {
    if path.is_empty() {
        return Err(StreamBuildError::EmptyPath);
    }

    let links = path
        .iter()
        .map(|id| topology.link(*id).ok_or(StreamBuildError::UnknownLink(*id)))
        .collect::<Result<Vec<_>, _>>()?;

    match links.windows(2).position(|hop| hop[0].to() != hop[1].from()) {
        Some(index) => Err(StreamBuildError::NotContiguous { index }),
        None => Ok(()),
    }
}

impl Stream {
    pub fn builder(generator: &StreamIdGenerator) -> StreamBuilder<'_> {
        StreamBuilder::new(generator)
    }

    /// A copy of the stream under a fresh identifier, so it can be
    /// registered next to the original. The per-hop values start over.
    pub fn duplicate(&self, generator: &StreamIdGenerator) -> Self {
        Self {
            id: generator.generate(),
            local_streams: local_streams(&self.path),
            ..self.clone()
        }
    }

    #[inline]
    pub fn id(&self) -> StreamId {
        self.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn path(&self) -> &[LinkId] {
        &self.path
    }

    #[inline]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    #[inline]
    pub fn burst(&self) -> u64 {
        self.burst
    }

    #[inline]
    pub fn min_frame_size(&self) -> u64 {
        self.min_frame_size
    }

    #[inline]
    pub fn max_frame_size(&self) -> u64 {
        self.max_frame_size
    }

    #[inline]
    pub fn local_streams(&self) -> &[LocalStream] {
        &self.local_streams
    }

    pub(crate) fn local_streams_mut(&mut self) -> &mut [LocalStream] {
        &mut self.local_streams
    }

    /// number of links crossed
    #[inline]
    pub fn hops(&self) -> usize {
        self.path.len()
    }

    /// the node the stream starts from
    pub fn source(&self, topology: &Topology) -> Option<NodeId> {
        let first = self.path.first()?;
        topology.link(*first).map(|link| link.from())
    }

    /// the node the stream ends at
    pub fn destination(&self, topology: &Topology) -> Option<NodeId> {
        let last = self.path.last()?;
        topology.link(*last).map(|link| link.to())
    }

    /// Node names from the source through every hop.
    pub fn node_names<'t>(&self, topology: &'t Topology) -> Vec<&'t str> {
        let source = self.source(topology).into_iter();
        let hops = self
            .path
            .iter()
            .filter_map(|id| topology.link(*id).map(|link| link.to()));

        source
            .chain(hops)
            .filter_map(|node| topology.node(node).map(|node| node.name()))
            .collect()
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stream{}{{label={}, {} hops, tspec={}/{}/{}}}",
            self.id,
            self.label,
            self.path.len(),
            self.priority,
            self.burst,
            self.rate,
        )
    }
}

impl LocalStream {
    fn new(path_index: usize, link: LinkId, prev: Option<LinkId>) -> Self {
        Self {
            path_index,
            link,
            prev,
            acc_max_latency: f64::INFINITY,
            acc_min_latency: 0.0,
            max_idle_slope: None,
        }
    }

    /// position of the hop in the stream's path
    #[inline]
    pub fn path_index(&self) -> usize {
        self.path_index
    }

    /// the link of this hop
    #[inline]
    pub fn link(&self) -> LinkId {
        self.link
    }

    /// the link of the previous hop, `None` on the first one
    #[inline]
    pub fn prev(&self) -> Option<LinkId> {
        self.prev
    }

    /// Worst-case latency accumulated before this hop, in nanoseconds.
    ///
    /// `+∞` until the topology has per-hop delay guarantees.
    #[inline]
    pub fn acc_max_latency(&self) -> f64 {
        self.acc_max_latency
    }

    /// Serialization-time lower bound accumulated before this hop, in
    /// nanoseconds.
    #[inline]
    pub fn acc_min_latency(&self) -> f64 {
        self.acc_min_latency
    }

    /// Idle slope assigned to the stream's priority on this hop.
    #[inline]
    pub fn max_idle_slope(&self) -> Option<f64> {
        self.max_idle_slope
    }

    pub(crate) fn set_latencies(&mut self, acc_max_latency: f64, acc_min_latency: f64) {
        self.acc_max_latency = acc_max_latency;
        self.acc_min_latency = acc_min_latency;
    }

    pub(crate) fn set_max_idle_slope(&mut self, max_idle_slope: Option<f64>) {
        self.max_idle_slope = max_idle_slope;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        measure::Bandwidth,
        node::Node,
    };

    const BW: Bandwidth = Bandwidth::new(1_000_000_000);

    /// a - b - c, returns the topology and the path a -> c
    fn line() -> (Topology, Vec<LinkId>) {
        let mut topo = Topology::new();
        let a = topo.add_node(Node::host("a").unwrap()).unwrap();
        let b = topo.add_node(Node::switch("b").unwrap()).unwrap();
        let c = topo.add_node(Node::host("c").unwrap()).unwrap();
        let (ab, _) = topo.connect(a, b, BW).unwrap();
        let (bc, _) = topo.connect(b, c, BW).unwrap();
        (topo, vec![ab, bc])
    }

    fn builder<'a>(generator: &'a StreamIdGenerator, path: Vec<LinkId>) -> StreamBuilder<'a> {
        Stream::builder(generator)
            .label("st0")
            .path(path)
            .priority(Priority::HIGHEST)
            .rate(1e6)
            .burst(1_000 * 8)
            .frame_sizes(512, 1_000 * 8 - FRAME_OVERHEAD)
    }

    #[test]
    fn build() {
        let (topo, path) = line();
        let generator = StreamIdGenerator::new();
        let stream = builder(&generator, path.clone()).build(&topo).unwrap();

        assert_eq!(stream.id(), StreamId::new(0));
        assert_eq!(stream.path(), path.as_slice());
        assert_eq!(stream.local_streams().len(), 2);
        assert_eq!(stream.node_names(&topo), vec!["a", "b", "c"]);
        assert_eq!(stream.local_streams()[1].path_index(), 1);
        assert_eq!(stream.local_streams()[0].link(), path[0]);
        assert_eq!(stream.local_streams()[0].prev(), None);
        assert_eq!(stream.local_streams()[1].link(), path[1]);
        assert_eq!(stream.local_streams()[1].prev(), Some(path[0]));
        assert!(stream.local_streams()[0].acc_max_latency().is_infinite());
        assert_eq!(stream.local_streams()[0].max_idle_slope(), None);
    }

    #[test]
    fn burst_must_cover_max_frame() {
        let (topo, path) = line();
        let generator = StreamIdGenerator::new();

        let err = builder(&generator, path.clone())
            .burst(1_000)
            .frame_sizes(512, 1_000)
            .build(&topo)
            .unwrap_err();
        assert_eq!(
            err,
            StreamBuildError::BurstTooSmall {
                burst: 1_000,
                max_frame_size: 1_000
            }
        );
        assert_eq!(
            err.to_string(),
            "burst=1000 < maxFrameSize=1000 + Preamble+IPG (160)"
        );

        // exactly the overhead is fine
        let stream = builder(&generator, path)
            .burst(1_160)
            .frame_sizes(512, 1_000)
            .build(&topo)
            .unwrap();
        assert!(stream.burst() >= stream.max_frame_size() + FRAME_OVERHEAD);
    }

    #[test]
    fn huge_max_frame_does_not_overflow() {
        let (topo, path) = line();
        let generator = StreamIdGenerator::new();

        assert_eq!(
            builder(&generator, path)
                .burst(u64::MAX - 1)
                .frame_sizes(512, u64::MAX)
                .build(&topo),
            Err(StreamBuildError::BurstTooSmall {
                burst: u64::MAX - 1,
                max_frame_size: u64::MAX
            })
        );
    }

    #[test]
    fn duplicate_gets_a_fresh_id() {
        let (mut topo, path) = line();
        let generator = StreamIdGenerator::new();
        let stream = builder(&generator, path).build(&topo).unwrap();
        let copy = stream.duplicate(&generator);

        assert_ne!(copy.id(), stream.id());
        assert_eq!(copy.label(), stream.label());
        assert_eq!(copy.path(), stream.path());
        assert_eq!(copy.local_streams(), stream.local_streams());

        topo.add_stream(stream).unwrap();
        topo.add_stream(copy).unwrap();
        assert_eq!(topo.stream_count(), 2);
    }

    #[test]
    fn failed_build_consumes_the_id() {
        let (topo, path) = line();
        let generator = StreamIdGenerator::new();

        assert!(builder(&generator, vec![]).build(&topo).is_err());
        let stream = builder(&generator, path).build(&topo).unwrap();
        assert_eq!(stream.id(), StreamId::new(1));
    }

    #[test]
    fn empty_path() {
        let (topo, _) = line();
        let generator = StreamIdGenerator::new();
        assert_eq!(
            builder(&generator, vec![]).build(&topo),
            Err(StreamBuildError::EmptyPath)
        );
    }

    #[test]
    fn non_contiguous_path() {
        let (topo, path) = line();
        let generator = StreamIdGenerator::new();
        let reversed = vec![path[1], path[0]];
        assert_eq!(
            builder(&generator, reversed).build(&topo),
            Err(StreamBuildError::NotContiguous { index: 0 })
        );
    }

    #[test]
    fn unknown_link() {
        let (topo, _) = line();
        let generator = StreamIdGenerator::new();
        let bogus = LinkId::from_index(99);
        assert_eq!(
            builder(&generator, vec![bogus]).build(&topo),
            Err(StreamBuildError::UnknownLink(bogus))
        );
    }

    #[test]
    fn missing_fields() {
        let (topo, _) = line();
        let generator = StreamIdGenerator::new();
        assert_eq!(
            Stream::builder(&generator).build(&topo),
            Err(StreamBuildError::Missing("label"))
        );
        assert_eq!(
            Stream::builder(&generator).label("x").build(&topo),
            Err(StreamBuildError::Missing("path"))
        );
    }
}
