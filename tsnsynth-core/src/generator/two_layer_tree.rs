use super::{GeneratorError, attach};
use crate::{
    Context,
    defaults::{DEFAULT_BRANCH_LINK_SPEED, DEFAULT_MAIN_LINK_SPEED},
    measure::Bandwidth,
    node::{Node, NodeId},
    random::Range,
    topology::Topology,
};
use rand_chacha::ChaChaRng;
use serde::Deserialize;
use tracing::debug;

/// Two chains of switches, every switch of the first layer connected to
/// every switch of the second one, end devices on the second layer.
///
/// All the layer 1 switches are join points: the tree is meant to be
/// composed with other topologies at its aggregation layer.
///
/// Link speeds are resolved per link, the number of end devices per
/// layer 2 switch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TwoLayerTree {
    pub num_layer1_switches: Range<usize>,
    pub num_layer2_switches: Range<usize>,
    pub hosts_per_l2switch: Range<usize>,
    pub switch_link_speed: Range<Bandwidth>,
    pub host_link_speed: Range<Bandwidth>,
}

impl Default for TwoLayerTree {
    fn default() -> Self {
        Self {
            num_layer1_switches: Range::fixed(2),
            num_layer2_switches: Range::fixed(2),
            hosts_per_l2switch: Range::fixed(1),
            switch_link_speed: Range::fixed(DEFAULT_MAIN_LINK_SPEED),
            host_link_speed: Range::fixed(DEFAULT_BRANCH_LINK_SPEED),
        }
    }
}

impl TwoLayerTree {
    fn layer(
        &self,
        topology: &mut Topology,
        rng: &mut ChaChaRng,
        layer: u8,
    ) -> Result<Vec<NodeId>, GeneratorError> {
        let length = match layer {
            1 => self.num_layer1_switches.sample(rng)?,
            _ => self.num_layer2_switches.sample(rng)?,
        };
        if length == 0 {
            return Err(GeneratorError::EmptyLayer(layer));
        }

        let mut switches = vec![topology.add_node(Node::switch(format!("sw_l{layer}_0"))?)?];
        for i in 1..length {
            let switch = attach(
                topology,
                switches[i - 1],
                Node::switch(format!("sw_l{layer}_{i}"))?,
                self.switch_link_speed.sample(rng)?,
            )?;
            switches.push(switch);
        }

        Ok(switches)
    }

    pub fn generate(&self, context: &mut Context) -> Result<Topology, GeneratorError> {
        let rng = context.rng();
        let mut topology = Topology::new();

        let layer1 = self.layer(&mut topology, rng, 1)?;
        let layer2 = self.layer(&mut topology, rng, 2)?;

        for sw1 in &layer1 {
            for sw2 in &layer2 {
                topology.connect(*sw1, *sw2, self.switch_link_speed.sample(rng)?)?;
            }
        }

        for (l2i, sw2) in layer2.iter().copied().enumerate() {
            let hosts = self.hosts_per_l2switch.sample(rng)?;
            for i in 0..hosts {
                attach(
                    &mut topology,
                    sw2,
                    Node::host(format!("d_{l2i}_{i}"))?,
                    self.host_link_speed.sample(rng)?,
                )?;
            }
        }

        for sw1 in layer1 {
            topology.set_join_point(sw1, true)?;
        }

        debug!(
            nodes = topology.node_count(),
            links = topology.link_count(),
            "two layer tree generated"
        );

        Ok(topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_by_two() {
        let topology = TwoLayerTree {
            num_layer1_switches: Range::fixed(2),
            num_layer2_switches: Range::fixed(2),
            hosts_per_l2switch: Range::fixed(1),
            ..TwoLayerTree::default()
        }
        .generate(&mut Context::new())
        .unwrap();

        assert_eq!(topology.switches().len(), 4);
        assert_eq!(topology.hosts().len(), 2);
        // 1 L1-L1 + 1 L2-L2 + 4 cross links + 2 host links
        assert_eq!(topology.link_count(), 2 * (1 + 1 + 4 + 2));

        let join_points: Vec<&str> = topology
            .join_points()
            .into_iter()
            .map(|id| topology.node(id).unwrap().name())
            .collect();
        assert_eq!(join_points, ["sw_l1_0", "sw_l1_1"]);
    }

    #[test]
    fn full_cross_connect() {
        let topology = TwoLayerTree {
            num_layer1_switches: Range::fixed(2),
            num_layer2_switches: Range::fixed(3),
            hosts_per_l2switch: Range::uniform(4, 16),
            ..TwoLayerTree::default()
        }
        .generate(&mut Context::with_seed(9))
        .unwrap();

        for l1 in ["sw_l1_0", "sw_l1_1"] {
            for l2 in ["sw_l2_0", "sw_l2_1", "sw_l2_2"] {
                let l1 = topology.node_by_name(l1).unwrap();
                let l2 = topology.node_by_name(l2).unwrap();
                assert!(topology.get_link(l1, l2).is_ok());
                assert!(topology.get_link(l2, l1).is_ok());
            }
        }

        let hosts = topology.hosts().len();
        assert!((12..=48).contains(&hosts));
        assert!(topology.node_by_name("d_2_3").is_some());
    }

    #[test]
    fn empty_layer() {
        let result = TwoLayerTree {
            num_layer2_switches: Range::fixed(0),
            ..TwoLayerTree::default()
        }
        .generate(&mut Context::new());
        assert_eq!(result.unwrap_err(), GeneratorError::EmptyLayer(2));
    }
}
