use super::{Stream, StreamBuildError};
use crate::{
    Context,
    defaults::{
        FRAME_OVERHEAD, MAX_ENDPOINT_ATTEMPTS, MAX_FRAME_SIZE, MAX_PRINTED_WARNINGS, MIN_FRAME_SIZE,
    },
    measure::{Priority, PriorityError},
    node::{NodeId, NodeKind},
    random::{self, Range, RangeError},
    topology::{RouteError, Topology},
};
use rand_core::Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    #[error("Not enough end devices to create streams (found {found})")]
    NotEnoughDevices { found: usize },
    #[error("{0}")]
    Range(#[from] RangeError),
    #[error("{0}")]
    Priority(#[from] PriorityError),
    #[error("{0}")]
    Route(#[from] RouteError),
    #[error("{0}")]
    Build(#[from] StreamBuildError),
}

/// Which pairs of end devices streams may connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointSelection {
    /// any two distinct end devices
    #[default]
    General,
    /// a controller and a sensor, in either direction
    ControllerSensor,
}

/// Outcome of the search for the two ends of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSearch {
    Found(NodeId, NodeId),
    /// no source with a suitable destination was drawn in time
    Exhausted { attempts: usize },
}

/// The streams a [`StreamFactory`] produced.
///
/// `skipped` counts the requested streams that were left out because no
/// suitable pair of end devices was found: `streams.len() + skipped` is
/// always the number of requested streams.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamBatch {
    pub streams: Vec<Stream>,
    pub skipped: usize,
}

/// Randomized creation of a set of streams over a topology.
///
/// Every parameter is a [`Range`], resolved again for every stream. The
/// path length window restricts which pairs of end devices may be
/// connected; when it is too narrow for the topology some streams are
/// skipped rather than failing the whole batch (see [`StreamBatch`]).
///
/// # Example
///
/// ```
/// use tsnsynth_core::{
///     Context,
///     generator::LinearBranches,
///     random::Range,
///     stream::StreamFactory,
/// };
///
/// let mut context = Context::with_seed(1);
/// let mut topology = LinearBranches {
///     main_length: Range::fixed(3),
///     branches_per_main_switch: Range::fixed(1),
///     branch_length: Range::fixed(1),
///     hosts_per_branch_switch: Range::fixed(2),
///     ..LinearBranches::default()
/// }
/// .generate(&mut context)
/// .unwrap();
///
/// let batch = StreamFactory {
///     num_streams: 10,
///     burst: Range::uniform(512, 8_000),
///     rate: Range::log_uniform(10e3, 50e6),
///     priority: Range::uniform(4, 7),
///     ..StreamFactory::default()
/// }
/// .create_streams(&topology, &mut context)
/// .unwrap();
///
/// assert_eq!(batch.streams.len(), 10);
/// topology.add_streams(batch.streams).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamFactory {
    pub num_streams: usize,
    /// burst in bits, overhead included
    pub burst: Range<u64>,
    /// rate in bits per second
    pub rate: Range<f64>,
    pub priority: Range<u8>,
    /// minimum hop distance between the two ends
    pub min_path_len: usize,
    /// maximum hop distance between the two ends, unbounded if `None`
    pub max_path_len: Option<usize>,
    pub endpoints: EndpointSelection,
}

impl Default for StreamFactory {
    fn default() -> Self {
        Self {
            num_streams: 0,
            burst: Range::fixed(MAX_FRAME_SIZE + FRAME_OVERHEAD),
            rate: Range::fixed(1e6),
            priority: Range::fixed(0),
            min_path_len: 1,
            max_path_len: None,
            endpoints: EndpointSelection::General,
        }
    }
}

/// Logs the endpoint search failures, the first few only.
#[derive(Debug, Default)]
struct Warnings {
    printed: usize,
}

impl Warnings {
    fn no_suitable_pair(&mut self, min_path_len: usize, max_path_len: usize) {
        self.printed += 1;
        if self.printed == MAX_PRINTED_WARNINGS {
            warn!("Further warnings suppressed...");
        } else if self.printed < MAX_PRINTED_WARNINGS {
            warn!(min_path_len, max_path_len, "no suitable pairs of end devices");
        }
    }
}

impl StreamFactory {
    /// The path length window, `None` when any pair of distinct end
    /// devices is acceptable.
    fn window(&self, topology: &Topology) -> Option<(usize, usize)> {
        if self.min_path_len <= 1 && self.max_path_len.is_none() {
            None
        } else {
            Some((
                self.min_path_len,
                self.max_path_len.unwrap_or(topology.node_count()),
            ))
        }
    }

    /// the devices streams start from, and the devices they may end at
    fn candidates(&self, topology: &Topology) -> Result<(Vec<NodeId>, Vec<NodeId>), StreamError> {
        let (sources, destinations) = match self.endpoints {
            EndpointSelection::General => (topology.hosts(), topology.hosts()),
            EndpointSelection::ControllerSensor => (topology.controllers(), topology.sensors()),
        };

        let enough = match self.endpoints {
            EndpointSelection::General => sources.len() >= 2,
            EndpointSelection::ControllerSensor => !sources.is_empty() && !destinations.is_empty(),
        };
        if !enough {
            let found = match self.endpoints {
                EndpointSelection::General => sources.len(),
                EndpointSelection::ControllerSensor => sources.len() + destinations.len(),
            };
            return Err(StreamError::NotEnoughDevices { found });
        }

        Ok((sources, destinations))
    }

    /// Draw the two ends of one stream.
    ///
    /// Without a path length window the ends are two distinct devices
    /// drawn uniformly. With a window, up to [`MAX_ENDPOINT_ATTEMPTS`]
    /// sources are drawn until one has a destination within the window.
    pub fn find_endpoints<R: Rng + ?Sized>(
        &self,
        topology: &Topology,
        rng: &mut R,
    ) -> Result<EndpointSearch, StreamError> {
        let (sources, destinations) = self.candidates(topology)?;

        let found = match self.window(topology) {
            None => match self.endpoints {
                EndpointSelection::General => match random::sample(rng, &sources, 2).as_slice() {
                    [a, b] => Some((*a, *b)),
                    _ => None,
                },
                EndpointSelection::ControllerSensor => {
                    let controller = random::choose(rng, &sources).copied();
                    let sensor = random::choose(rng, &destinations).copied();
                    controller.zip(sensor)
                }
            },
            Some((min, max)) => {
                let destination_kind = |id: &NodeId| match self.endpoints {
                    EndpointSelection::General => topology.node(*id).is_some_and(|node| node.is_end_device()),
                    EndpointSelection::ControllerSensor => {
                        topology.node(*id).is_some_and(|node| node.kind() == NodeKind::Sensor)
                    }
                };

                let mut found = None;
                for _ in 0..MAX_ENDPOINT_ATTEMPTS {
                    let Some(source) = random::choose(rng, &sources).copied() else {
                        break;
                    };
                    let choices: Vec<NodeId> = topology
                        .get_other_devices_within_distance(source, min, max)?
                        .into_iter()
                        .filter(|id| destination_kind(id))
                        .collect();
                    if let Some(destination) = random::choose(rng, &choices) {
                        found = Some((source, *destination));
                        break;
                    }
                }
                found
            }
        };

        let Some((source, destination)) = found else {
            return Ok(EndpointSearch::Exhausted {
                attempts: MAX_ENDPOINT_ATTEMPTS,
            });
        };

        if self.endpoints == EndpointSelection::ControllerSensor && random::chance(rng, 0.5) {
            Ok(EndpointSearch::Found(destination, source))
        } else {
            Ok(EndpointSearch::Found(source, destination))
        }
    }

    /// Create up to `num_streams` streams over `topology`.
    ///
    /// The streams are not registered: hand them to
    /// [`Topology::add_streams`]. Labels continue from the number of
    /// streams already registered in `topology`, counting the skipped
    /// ones too.
    ///
    /// # Errors
    ///
    /// Fewer than two candidate end devices, an invalid path length
    /// window, a misconfigured [`Range`] or a stream that cannot be built
    /// (burst smaller than the minimum frame plus overhead). Failing to
    /// find endpoints within the window is not an error, see
    /// [`StreamBatch::skipped`].
    pub fn create_streams(
        &self,
        topology: &Topology,
        context: &mut Context,
    ) -> Result<StreamBatch, StreamError> {
        let counter = topology.stream_count();
        let (rng, stream_ids) = context.split();
        let mut warnings = Warnings::default();
        let mut batch = StreamBatch::default();

        for i in 0..self.num_streams {
            let (source, destination) = match self.find_endpoints(topology, rng)? {
                EndpointSearch::Found(source, destination) => (source, destination),
                EndpointSearch::Exhausted { .. } => {
                    let (min, max) = self.window(topology).unwrap_or((self.min_path_len, 0));
                    warnings.no_suitable_pair(min, max);
                    batch.skipped += 1;
                    continue;
                }
            };

            let burst = self.burst.sample(rng)?;
            let rate = self.rate.sample(rng)?;
            let priority = Priority::new(self.priority.sample(rng)?)?;

            let stream = Stream::builder(stream_ids)
                .label(format!("st{}", counter + i))
                .path(topology.shortest_path(source, destination)?)
                .priority(priority)
                .rate(rate)
                .burst(burst)
                .frame_sizes(
                    MIN_FRAME_SIZE,
                    burst.saturating_sub(FRAME_OVERHEAD).min(MAX_FRAME_SIZE),
                )
                .build(topology)?;
            batch.streams.push(stream);
        }

        debug!(
            created = batch.streams.len(),
            skipped = batch.skipped,
            "streams created"
        );

        Ok(batch)
    }
}
