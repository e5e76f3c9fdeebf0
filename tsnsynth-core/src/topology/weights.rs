use super::Topology;
use crate::link::LinkId;
use serde::{Deserialize, Serialize};

/// Numeric weight of a link, for rendering collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkWeight {
    /// the link's bandwidth in bits per second
    #[default]
    Bandwidth,
    /// sum of the bursts of the streams crossing the link over its
    /// bandwidth, in seconds
    BurstLoad,
}

impl Topology {
    /// The weight of every directed link, in link order.
    ///
    /// ```
    /// # use tsnsynth_core::{measure::Bandwidth, node::Node, topology::{LinkWeight, Topology}};
    /// let mut topo = Topology::new();
    /// topo.create_and_add_links(Node::switch("a").unwrap(), Node::switch("b").unwrap(), Bandwidth::new(1_000)).unwrap();
    ///
    /// let weights = topo.link_weights(LinkWeight::Bandwidth);
    /// assert_eq!(weights.len(), 2);
    /// assert_eq!(weights[0].1, 1_000.0);
    /// ```
    pub fn link_weights(&self, weight: LinkWeight) -> Vec<(LinkId, f64)> {
        self.links()
            .map(|(id, link)| {
                let bandwidth = link.bandwidth().as_f64();
                let value = match weight {
                    LinkWeight::Bandwidth => bandwidth,
                    LinkWeight::BurstLoad if bandwidth > 0.0 => {
                        let bursts: u64 = self
                            .get_streams_of_link(id)
                            .map(|(stream, _)| stream.burst())
                            .sum();
                        bursts as f64 / bandwidth
                    }
                    LinkWeight::BurstLoad => 0.0,
                };
                (id, value)
            })
            .collect()
    }
}
