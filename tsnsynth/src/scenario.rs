//! Preset scenarios: representative industrial and automotive networks.
//!
//! A scenario chains the generators, the composer and the stream factory
//! of [`tsnsynth_core`]. Streams are added in layers of decreasing size
//! by path length, so that short paths dominate as they do in real
//! plants.

use anyhow::{Context as _, Result, bail};
use serde::Deserialize;
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::{debug, info};
use tsnsynth_core::{
    Context, Node, Topology,
    generator::{CombineOptions, LinearBranches, TwoLayerTree, combine_topologies},
    measure::Bandwidth,
    node::NodeKind,
    random::{self, Range},
    stream::{EndpointSelection, StreamFactory},
};

const GBPS: u64 = 1_000_000_000;
const MBPS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioSize {
    #[default]
    Small,
    Medium,
    Big,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("size may only be one of small, medium, big, not `{0}'")]
pub struct ScenarioSizeError(String);

impl ScenarioSize {
    pub const ALL: [Self; 3] = [Self::Small, Self::Medium, Self::Big];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Big => "big",
        }
    }
}

impl fmt::Display for ScenarioSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioSize {
    type Err = ScenarioSizeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == s)
            .ok_or_else(|| ScenarioSizeError(s.to_owned()))
    }
}

/// An extra link between two dangling switches, added with the given
/// probability.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DanglingBridge {
    /// chance of adding the link, in `[0, 1]`
    pub probability: f64,
    pub bandwidth: Bandwidth,
}

impl DanglingBridge {
    pub const fn new(probability: f64, bandwidth: Bandwidth) -> Self {
        Self {
            probability,
            bandwidth,
        }
    }
}

/// Tunables of the preset scenarios.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioOptions {
    pub industrial_small_bridges: Vec<DanglingBridge>,
    pub industrial_medium_bridges: Vec<DanglingBridge>,
    pub industrial_big_bridges: Vec<DanglingBridge>,
    pub automotive_bridges: Vec<DanglingBridge>,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            industrial_small_bridges: Vec::new(),
            industrial_medium_bridges: vec![DanglingBridge::new(0.9, Bandwidth::new(100 * MBPS))],
            industrial_big_bridges: vec![DanglingBridge::new(0.5, Bandwidth::new(100 * MBPS))],
            automotive_bridges: vec![
                DanglingBridge::new(0.5, Bandwidth::new(GBPS)),
                DanglingBridge::new(0.75, Bandwidth::new(GBPS)),
            ],
        }
    }
}

/// `(num_streams, min_path_len, max_path_len)`
type StreamLayer = (usize, usize, usize);

const SMALL_LAYERS: [StreamLayer; 6] = [(30, 1, 2), (30, 3, 3), (20, 4, 4), (15, 5, 5), (10, 6, 6), (5, 7, 7)];
const MEDIUM_LAYERS: [StreamLayer; 6] = [(70, 1, 2), (50, 3, 3), (40, 4, 4), (30, 5, 5), (20, 6, 6), (10, 7, 7)];
const BIG_LAYERS: [StreamLayer; 6] = [(100, 1, 2), (100, 3, 3), (80, 4, 4), (60, 5, 5), (50, 6, 6), (40, 7, 7)];

fn industrial_streams() -> StreamFactory {
    StreamFactory {
        burst: Range::uniform(64 * 8, 1_000 * 8),
        rate: Range::log_uniform(10e3, 50e6),
        priority: Range::uniform(4, 7),
        ..StreamFactory::default()
    }
}

fn add_stream_layers(
    topology: &mut Topology,
    template: &StreamFactory,
    layers: &[StreamLayer],
    context: &mut Context,
) -> Result<()> {
    for &(num_streams, min_path_len, max_path_len) in layers {
        let batch = StreamFactory {
            num_streams,
            min_path_len,
            max_path_len: Some(max_path_len),
            ..template.clone()
        }
        .create_streams(topology, context)?;

        debug!(
            min_path_len,
            max_path_len,
            created = batch.streams.len(),
            skipped = batch.skipped,
            "stream layer"
        );
        topology.add_streams(batch.streams)?;
    }
    Ok(())
}

fn connect_dangling_switches(
    topology: &mut Topology,
    bridges: &[DanglingBridge],
    context: &mut Context,
) -> Result<()> {
    for bridge in bridges {
        let rng = context.rng();
        if !random::chance(rng, bridge.probability) {
            continue;
        }

        let dangling = topology.dangling_switches();
        let picked = random::sample(rng, &dangling, 2);
        if let &[a, b] = picked.as_slice() {
            info!(
                a = topology.node(a).map(Node::name),
                b = topology.node(b).map(Node::name),
                "combining dangling switches"
            );
            topology.connect(a, b, bridge.bandwidth)?;
        }
    }
    Ok(())
}

/// a main ring with every switch a join point, and no branch
fn backbone(main_length: usize, main_link_speed: u64, context: &mut Context) -> Result<Topology> {
    Ok(LinearBranches {
        main_length: Range::fixed(main_length),
        branches_per_main_switch: Range::fixed(0),
        branch_length: Range::fixed(0),
        hosts_per_branch_switch: Range::fixed(0),
        main_link_speed: Range::fixed(Bandwidth::new(main_link_speed)),
        branch_link_speed: Range::fixed(Bandwidth::new(GBPS)),
        connect_to_ring: Range::fixed(true),
        num_join_points: Range::fixed(main_length),
        ..LinearBranches::default()
    }
    .generate(context)?)
}

/// Attach rings of `cell` to the remaining join points of `topology`,
/// one or two join points at a time.
fn attach_cells(
    mut topology: Topology,
    mut remaining: usize,
    cell: &LinearBranches,
    context: &mut Context,
) -> Result<Topology> {
    let options = CombineOptions {
        add_name_prefixes: false,
        remove_join_points_used: true,
        remove_join_points_second: true,
        ..CombineOptions::default()
    };

    let mut index = 0;
    while remaining > 0 {
        let join_points = loop {
            let join_points = random::between(context.rng(), 1, 2) as usize;
            if join_points <= remaining {
                break join_points;
            }
        };
        remaining -= join_points;

        let cell = LinearBranches {
            num_join_points: Range::fixed(join_points),
            ..cell.clone()
        }
        .generate(context)?
        .with_prefix(&format!("r{index}_"))?;
        topology = combine_topologies(&topology, &cell, &options, context)?;
        index += 1;
    }

    Ok(topology)
}

/// An industrial network.
///
/// * `small`: a single line (or ring) with branches;
/// * `medium`: a 10 Gbit/s backbone ring with rings of branches attached
///   to it;
/// * `big`: like `medium`, with a two layer tree attached as well and
///   more varied cells.
pub fn industrial(size: ScenarioSize, options: &ScenarioOptions, context: &mut Context) -> Result<Topology> {
    info!(%size, "generating industrial scenario");

    let (mut topology, bridges, layers) = match size {
        ScenarioSize::Small => {
            let topology = LinearBranches {
                main_length: Range::uniform(2, 5),
                branches_per_main_switch: Range::fixed(1),
                branch_length: Range::uniform(1, 3),
                hosts_per_branch_switch: Range::uniform(3, 6),
                main_link_speed: Range::fixed(Bandwidth::new(GBPS)),
                branch_link_speed: Range::fixed(Bandwidth::new(100 * MBPS)),
                connect_to_ring: Range::choice([true, false]),
                num_join_points: Range::fixed(2),
                ..LinearBranches::default()
            }
            .generate(context)?;
            (topology, &options.industrial_small_bridges, &SMALL_LAYERS)
        }
        ScenarioSize::Medium => {
            let main_length = random::between(context.rng(), 3, 5) as usize;
            let topology = backbone(main_length, 10 * GBPS, context)?;
            let cell = LinearBranches {
                main_length: Range::uniform(2, 4),
                branches_per_main_switch: Range::fixed(1),
                branch_length: Range::uniform(1, 3),
                hosts_per_branch_switch: Range::uniform(3, 6),
                main_link_speed: Range::fixed(Bandwidth::new(GBPS)),
                branch_link_speed: Range::fixed(Bandwidth::new(100 * MBPS)),
                connect_to_ring: Range::choice([true, false]),
                ..LinearBranches::default()
            };
            let topology = attach_cells(topology, main_length, &cell, context)?;
            (topology, &options.industrial_medium_bridges, &MEDIUM_LAYERS)
        }
        ScenarioSize::Big => {
            let main_length = random::between(context.rng(), 4, 6) as usize;
            let topology = backbone(main_length, 10 * GBPS, context)?;

            let tree = TwoLayerTree {
                num_layer1_switches: Range::fixed(2),
                num_layer2_switches: Range::uniform(3, 5),
                hosts_per_l2switch: Range::uniform(4, 16),
                switch_link_speed: Range::fixed(Bandwidth::new(10 * GBPS)),
                host_link_speed: Range::fixed(Bandwidth::new(GBPS)),
            }
            .generate(context)?
            .with_prefix("tree_")?;
            let combine = CombineOptions {
                add_name_prefixes: false,
                remove_join_points_second: true,
                ..CombineOptions::default()
            };
            let topology = combine_topologies(&topology, &tree, &combine, context)?;

            let cell = LinearBranches {
                main_length: Range::uniform(2, 5),
                branches_per_main_switch: Range::uniform(1, 2),
                branch_length: Range::uniform(1, 4),
                hosts_per_branch_switch: Range::uniform(3, 6),
                main_link_speed: Range::choice([Bandwidth::new(GBPS), Bandwidth::new(2_500 * MBPS)]),
                branch_link_speed: Range::fixed(Bandwidth::new(100 * MBPS)),
                connect_to_ring: Range::choice([true, false]),
                ..LinearBranches::default()
            };
            let topology = attach_cells(topology, main_length - 2, &cell, context)?;
            (topology, &options.industrial_big_bridges, &BIG_LAYERS)
        }
    };

    connect_dangling_switches(&mut topology, bridges, context)?;
    add_stream_layers(&mut topology, &industrial_streams(), layers, context)?;

    info!(stats = %topology.stats(), "industrial scenario generated");
    Ok(topology)
}

/// An in-vehicle network: a ring (or line) of 10 Gbit/s zone switches,
/// one central computer on each, chains of sensor switches hanging off
/// them, and streams between the computers and the sensors.
pub fn automotive(options: &ScenarioOptions, context: &mut Context) -> Result<Topology> {
    info!("generating automotive scenario");

    let mut topology = LinearBranches {
        main_length: Range::uniform(4, 6),
        branches_per_main_switch: Range::fixed(1),
        branch_length: Range::uniform(4, 8),
        hosts_per_branch_switch: Range::log_uniform(2, 20),
        main_link_speed: Range::fixed(Bandwidth::new(10 * GBPS)),
        branch_link_speed: Range::fixed(Bandwidth::new(GBPS)),
        connect_to_ring: Range::choice([true, false]),
        num_join_points: Range::fixed(0),
        leaf_kind: NodeKind::Sensor,
    }
    .generate(context)?;

    let main_switches: Vec<String> = topology
        .switches()
        .into_iter()
        .filter_map(|id| topology.node(id))
        .map(|node| node.name().to_owned())
        .filter(|name| name.starts_with("main_sw"))
        .collect();
    for name in main_switches {
        topology.create_and_add_links(
            Node::switch(name.as_str())?,
            Node::controller(format!("HPC_{name}"))?,
            Bandwidth::new(10 * GBPS),
        )?;
    }

    connect_dangling_switches(&mut topology, &options.automotive_bridges, context)?;

    let sensors = topology.sensors().len();
    if sensors == 0 {
        bail!("automotive topology without sensors");
    }
    let batch = StreamFactory {
        num_streams: 2 * sensors,
        burst: Range::uniform(64 * 8, 512 * 8),
        rate: Range::log_uniform(10e3, 50e6),
        priority: Range::uniform(4, 7),
        endpoints: EndpointSelection::ControllerSensor,
        ..StreamFactory::default()
    }
    .create_streams(&topology, context)
    .context("cannot create the automotive streams")?;
    topology.add_streams(batch.streams)?;

    info!(stats = %topology.stats(), "automotive scenario generated");
    Ok(topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn unique_names(topology: &Topology) -> bool {
        let names: HashSet<&str> = topology.nodes().map(|(_, node)| node.name()).collect();
        names.len() == topology.node_count()
    }

    #[test]
    fn size_from_str() {
        for size in ScenarioSize::ALL {
            assert_eq!(size.to_string().parse::<ScenarioSize>(), Ok(size));
        }
        assert_eq!(
            "huge".parse::<ScenarioSize>(),
            Err(ScenarioSizeError("huge".to_owned()))
        );
    }

    #[test]
    fn industrial_small() {
        let mut context = Context::with_seed(1);
        let topology = industrial(ScenarioSize::Small, &ScenarioOptions::default(), &mut context).unwrap();

        assert!(unique_names(&topology));
        assert!(topology.switches().len() >= 4);
        assert!(topology.hosts().len() >= 6);
        assert!(topology.stream_count() > 0);
        assert!(topology.stream_count() <= 110);
        assert_eq!(topology.join_points().len(), 2);
    }

    #[test]
    fn industrial_medium_and_big() {
        for size in [ScenarioSize::Medium, ScenarioSize::Big] {
            let mut context = Context::with_seed(3);
            let topology = industrial(size, &ScenarioOptions::default(), &mut context).unwrap();

            assert!(unique_names(&topology), "{size}");
            // every backbone join point was consumed
            assert!(topology.join_points().is_empty(), "{size}");
            assert!(topology.node_by_name("main_sw0").is_some(), "{size}");
            assert!(topology.node_by_name("r0_main_sw0").is_some(), "{size}");
            assert!(topology.stream_count() > 0, "{size}");
        }

        let mut context = Context::with_seed(3);
        let big = industrial(ScenarioSize::Big, &ScenarioOptions::default(), &mut context).unwrap();
        assert!(big.node_by_name("tree_sw_l1_0").is_some());
    }

    #[test]
    fn same_seed_same_scenario() {
        let names = |seed| -> Vec<String> {
            let topology = industrial(ScenarioSize::Medium, &ScenarioOptions::default(), &mut Context::with_seed(seed)).unwrap();
            topology.nodes().map(|(_, node)| node.name().to_owned()).collect()
        };
        assert_eq!(names(8), names(8));
    }

    #[test]
    fn bridges_are_optional() {
        let never = ScenarioOptions {
            industrial_medium_bridges: vec![DanglingBridge::new(0.0, Bandwidth::new(GBPS))],
            ..ScenarioOptions::default()
        };
        let always = ScenarioOptions {
            industrial_medium_bridges: vec![DanglingBridge::new(1.0, Bandwidth::new(GBPS))],
            ..ScenarioOptions::default()
        };

        let without = industrial(ScenarioSize::Medium, &never, &mut Context::with_seed(5)).unwrap();
        let with = industrial(ScenarioSize::Medium, &always, &mut Context::with_seed(5)).unwrap();
        assert_eq!(with.node_count(), without.node_count());
        assert!(with.link_count() >= without.link_count());
    }

    #[test]
    fn automotive_streams_connect_controllers_and_sensors() {
        let mut context = Context::with_seed(2);
        let topology = automotive(&ScenarioOptions::default(), &mut context).unwrap();

        let main_switches = topology
            .switches()
            .into_iter()
            .filter(|id| topology.node(*id).unwrap().name().starts_with("main_sw"))
            .count();
        assert_eq!(topology.controllers().len(), main_switches);
        assert!(topology.node_by_name("HPC_main_sw0").is_some());
        assert_eq!(topology.stream_count(), 2 * topology.sensors().len());

        for stream in topology.get_all_streams() {
            let kinds = [
                topology.node(stream.source(&topology).unwrap()).unwrap().kind(),
                topology.node(stream.destination(&topology).unwrap()).unwrap().kind(),
            ];
            assert!(kinds.contains(&NodeKind::Controller));
            assert!(kinds.contains(&NodeKind::Sensor));
            assert!(stream.burst() <= 512 * 8);
        }
    }

    #[test]
    fn options_from_json() {
        let options: ScenarioOptions = serde_json::from_str(
            r#"{"automotive_bridges": [{"probability": 0.1, "bandwidth": "1gbps"}]}"#,
        )
        .unwrap();
        assert_eq!(
            options.automotive_bridges,
            [DanglingBridge::new(0.1, Bandwidth::new(GBPS))]
        );
        assert_eq!(
            options.industrial_big_bridges,
            ScenarioOptions::default().industrial_big_bridges
        );
    }
}
