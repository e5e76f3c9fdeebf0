use super::{GeneratorError, attach};
use crate::{
    Context,
    defaults::{DEFAULT_BRANCH_LINK_SPEED, DEFAULT_MAIN_LINK_SPEED},
    measure::Bandwidth,
    node::{Node, NodeKind},
    random::{self, Range},
    topology::Topology,
};
use serde::Deserialize;
use tracing::debug;

/// A main line of switches with branches of switches hanging off every
/// main switch, and end devices on every branch switch.
///
/// ```text
///  main_sw0 ──── main_sw1 ──── main_sw2      (ring: main_sw2 ── main_sw0)
///     │             │             │
/// branch_0.0_sw0    …             …
///     │  ├ d_0.0.0_0
///     │  └ d_0.0.0_1
/// branch_0.0_sw1
///        ├ d_0.0.1_0
///        └ d_0.0.1_1
/// ```
///
/// The main line length, ring closure, number of join points and both
/// link speeds are resolved once per topology; the number of branches is
/// resolved per main switch, the branch length per branch and the number
/// of end devices per branch switch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinearBranches {
    pub main_length: Range<usize>,
    pub branches_per_main_switch: Range<usize>,
    pub branch_length: Range<usize>,
    pub hosts_per_branch_switch: Range<usize>,
    pub main_link_speed: Range<Bandwidth>,
    pub branch_link_speed: Range<Bandwidth>,
    /// close the main line into a ring, only when it has 3 switches or
    /// more
    pub connect_to_ring: Range<bool>,
    /// how many main switches, chosen at random, are join points
    pub num_join_points: Range<usize>,
    /// the kind of the end devices on the branches
    pub leaf_kind: NodeKind,
}

impl Default for LinearBranches {
    fn default() -> Self {
        Self {
            main_length: Range::fixed(1),
            branches_per_main_switch: Range::fixed(0),
            branch_length: Range::fixed(1),
            hosts_per_branch_switch: Range::fixed(1),
            main_link_speed: Range::fixed(DEFAULT_MAIN_LINK_SPEED),
            branch_link_speed: Range::fixed(DEFAULT_BRANCH_LINK_SPEED),
            connect_to_ring: Range::fixed(false),
            num_join_points: Range::fixed(0),
            leaf_kind: NodeKind::Host,
        }
    }
}

impl LinearBranches {
    pub fn generate(&self, context: &mut Context) -> Result<Topology, GeneratorError> {
        if !self.leaf_kind.is_end_device() {
            return Err(GeneratorError::LeafKind(self.leaf_kind));
        }

        let rng = context.rng();
        let mut topology = Topology::new();

        let main_length = self.main_length.sample(rng)?;
        if main_length == 0 {
            return Err(GeneratorError::EmptyMainLine);
        }
        let main_link_speed = self.main_link_speed.sample(rng)?;

        let mut main_switches = vec![topology.add_node(Node::switch("main_sw0")?)?];
        for i in 1..main_length {
            let previous = main_switches[i - 1];
            let switch = attach(
                &mut topology,
                previous,
                Node::switch(format!("main_sw{i}"))?,
                main_link_speed,
            )?;
            main_switches.push(switch);
        }

        if self.connect_to_ring.sample(rng)? && main_length >= 3 {
            topology.connect(main_switches[0], main_switches[main_length - 1], main_link_speed)?;
        }

        let num_join_points = self.num_join_points.sample(rng)?;
        if num_join_points > main_length {
            return Err(GeneratorError::TooManyJoinPoints {
                requested: num_join_points,
                available: main_length,
            });
        }
        for index in random::sample_indices(rng, main_length, num_join_points) {
            topology.set_join_point(main_switches[index], true)?;
        }

        for (i, main_switch) in main_switches.iter().copied().enumerate() {
            let branches = self.branches_per_main_switch.sample(rng)?;
            for j in 0..branches {
                let branch_length = self.branch_length.sample(rng)?;
                let branch_link_speed = self.branch_link_speed.sample(rng)?;

                let mut parent = main_switch;
                for k in 0..branch_length {
                    let switch = attach(
                        &mut topology,
                        parent,
                        Node::switch(format!("branch_{i}.{j}_sw{k}"))?,
                        branch_link_speed,
                    )?;
                    let hosts = self.hosts_per_branch_switch.sample(rng)?;
                    for l in 0..hosts {
                        attach(
                            &mut topology,
                            switch,
                            Node::new(format!("d_{i}.{j}.{k}_{l}"), self.leaf_kind)?,
                            branch_link_speed,
                        )?;
                    }
                    parent = switch;
                }
            }
        }

        debug!(
            nodes = topology.node_count(),
            links = topology.link_count(),
            "linear branches generated"
        );

        Ok(topology)
    }
}
