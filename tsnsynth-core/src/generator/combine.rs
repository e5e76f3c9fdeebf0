use crate::{
    Context,
    defaults::{FIRST_TOPOLOGY_PREFIX, SECOND_TOPOLOGY_PREFIX},
    measure::Bandwidth,
    node::{Node, NodeId},
    random,
    topology::{Topology, TopologyError},
};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CombineError {
    #[error("at least one topology has no join points (topo1={first}, topo2={second})")]
    NoJoinPoints { first: usize, second: usize },
    #[error(
        "The names of both topologies are not mutually exclusive (`{0}'), consider adding name prefixes"
    )]
    NameCollision(String),
    #[error("Join point {0} has no link to derive a bandwidth from")]
    IsolatedJoinPoint(String),
    #[error("{0}")]
    Topology(#[from] TopologyError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CombineOptions {
    /// upper bound on the number of new links, unbounded if `None`
    pub max_joins: Option<usize>,
    /// prefix the nodes of the first topology with `t1_` and the ones of
    /// the second with `t2_`
    pub add_name_prefixes: bool,
    /// join points lose their flag once connected
    pub remove_join_points_used: bool,
    /// every join point of the first topology loses its flag
    pub remove_join_points_first: bool,
    /// every join point of the second topology loses its flag
    pub remove_join_points_second: bool,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            max_joins: None,
            add_name_prefixes: true,
            remove_join_points_used: true,
            remove_join_points_first: false,
            remove_join_points_second: false,
        }
    }
}

/// highest bandwidth among the links leaving `id`
fn max_incident_bandwidth(topology: &Topology, id: NodeId) -> Result<Bandwidth, CombineError> {
    let node = topology.node(id).ok_or(TopologyError::UnknownNode(id))?;
    node.links()
        .iter()
        .filter_map(|link| topology.link(*link))
        .map(|link| link.bandwidth())
        .max()
        .ok_or_else(|| CombineError::IsolatedJoinPoint(node.name().to_owned()))
}

/// Copy the nodes and links of `source` into `target`, in creation order.
///
/// Returns the identifier in `target` of every node of `source`, by
/// index. Replaying the connections in creation order gives every node
/// the same ports it had in `source`.
fn copy_into(target: &mut Topology, source: &Topology, prefix: &str) -> Result<Vec<NodeId>, TopologyError> {
    let ids = source
        .nodes()
        .map(|(_, node)| {
            target.add_node(
                Node::new(format!("{prefix}{}", node.name()), node.kind())?.with_join_point(node.join_point()),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (_, link) in source.physical_links() {
        target.connect(ids[link.from().index()], ids[link.to().index()], link.bandwidth())?;
    }

    Ok(ids)
}

/// Merge two topologies into a new one, connected through pairs of join
/// points.
///
/// `k = min(max_joins, join points of first, join points of second)`
/// join points are drawn without replacement on each side and paired in
/// draw order; each pair is connected with the highest bandwidth found
/// on the links of either end, so the junction is never narrower than
/// its surroundings.
///
/// Streams and guarantee tables of the inputs are not carried over. Both
/// inputs are left untouched whatever the outcome.
///
/// # Errors
///
/// * [`CombineError::NoJoinPoints`] if either side (or `max_joins`) allows
///   no join at all;
/// * [`CombineError::NameCollision`] if the names are not disjoint and
///   prefixing is disabled;
/// * [`CombineError::IsolatedJoinPoint`] if a drawn join point has no link.
pub fn combine_topologies(
    first: &Topology,
    second: &Topology,
    options: &CombineOptions,
    context: &mut Context,
) -> Result<Topology, CombineError> {
    let join_points_first = first.join_points();
    let join_points_second = second.join_points();
    let joins = join_points_first
        .len()
        .min(join_points_second.len())
        .min(options.max_joins.unwrap_or(usize::MAX));

    if joins == 0 {
        return Err(CombineError::NoJoinPoints {
            first: join_points_first.len(),
            second: join_points_second.len(),
        });
    }

    let (prefix_first, prefix_second) = if options.add_name_prefixes {
        (FIRST_TOPOLOGY_PREFIX, SECOND_TOPOLOGY_PREFIX)
    } else {
        let names: HashSet<&str> = first.nodes().map(|(_, node)| node.name()).collect();
        if let Some((_, node)) = second.nodes().find(|(_, node)| names.contains(node.name())) {
            return Err(CombineError::NameCollision(node.name().to_owned()));
        }
        ("", "")
    };

    let rng = context.rng();
    let drawn_first = random::sample(rng, &join_points_first, joins);
    let drawn_second = random::sample(rng, &join_points_second, joins);

    let mut bridges = Vec::with_capacity(joins);
    for (a, b) in drawn_first.iter().zip(&drawn_second) {
        let bandwidth = max_incident_bandwidth(first, *a)?.max(max_incident_bandwidth(second, *b)?);
        bridges.push((*a, *b, bandwidth));
    }

    let mut topology = Topology::new();
    let ids_first = copy_into(&mut topology, first, prefix_first)?;
    let ids_second = copy_into(&mut topology, second, prefix_second)?;

    for (a, b, bandwidth) in bridges {
        let (a, b) = (ids_first[a.index()], ids_second[b.index()]);
        topology.connect(a, b, bandwidth)?;
        if options.remove_join_points_used {
            topology.set_join_point(a, false)?;
            topology.set_join_point(b, false)?;
        }
    }

    if options.remove_join_points_first {
        for id in &join_points_first {
            topology.set_join_point(ids_first[id.index()], false)?;
        }
    }
    if options.remove_join_points_second {
        for id in &join_points_second {
            topology.set_join_point(ids_second[id.index()], false)?;
        }
    }

    debug!(
        joins,
        nodes = topology.node_count(),
        links = topology.link_count(),
        "topologies combined"
    );

    Ok(topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        generator::{LinearBranches, TwoLayerTree},
        random::Range,
    };

    const GBPS: Bandwidth = Bandwidth::new(1_000_000_000);

    /// a line of `n` switches, every one a join point
    fn line(prefix: &str, n: usize, bandwidth: Bandwidth) -> Topology {
        let mut topology = Topology::new();
        let mut previous = None;
        for i in 0..n {
            let id = topology
                .add_node(Node::switch(format!("{prefix}{i}")).unwrap().with_join_point(true))
                .unwrap();
            if let Some(previous) = previous {
                topology.connect(previous, id, bandwidth).unwrap();
            }
            previous = Some(id);
        }
        topology
    }

    fn names(topology: &Topology) -> Vec<String> {
        topology.nodes().map(|(_, node)| node.name().to_owned()).collect()
    }

    #[test]
    fn prefixed_names_are_unique() {
        let a = line("sw", 3, GBPS);
        let b = line("sw", 3, GBPS);
        let combined = combine_topologies(&a, &b, &CombineOptions::default(), &mut Context::new()).unwrap();

        let names = names(&combined);
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert_eq!(names[0], "t1_sw0");
        assert_eq!(names[3], "t2_sw0");
    }

    #[test]
    fn links_are_copied_once_with_their_ports() {
        let a = line("a", 3, GBPS);
        let b = line("b", 2, GBPS);
        let options = CombineOptions {
            max_joins: Some(1),
            ..CombineOptions::default()
        };
        let combined = combine_topologies(&a, &b, &options, &mut Context::new()).unwrap();

        // 2 + 1 copied connections, 1 bridge
        assert_eq!(combined.link_count(), 2 * 4);
        for (id, link) in a.links() {
            let copy = combined.link(id).unwrap();
            assert_eq!(copy.egress_port(), link.egress_port());
            assert_eq!(copy.ingress_port(), link.ingress_port());
        }
    }

    #[test]
    fn join_points_are_consumed() {
        let a = line("a", 3, GBPS);
        let b = line("b", 2, GBPS);
        let combined = combine_topologies(&a, &b, &CombineOptions::default(), &mut Context::new()).unwrap();

        // k = 2: two bridges, 1 join point of `a` left
        assert_eq!(combined.link_count(), 2 * (2 + 1 + 2));
        assert_eq!(combined.join_points().len(), 1);

        let combined = combine_topologies(
            &a,
            &b,
            &CombineOptions {
                remove_join_points_used: false,
                remove_join_points_second: true,
                ..CombineOptions::default()
            },
            &mut Context::new(),
        )
        .unwrap();
        let left: Vec<String> = combined
            .join_points()
            .into_iter()
            .map(|id| combined.node(id).unwrap().name().to_owned())
            .collect();
        assert_eq!(left, ["t1_a0", "t1_a1", "t1_a2"]);
    }

    #[test]
    fn bridge_uses_the_fastest_incident_link() {
        let a = line("a", 2, Bandwidth::new(100_000_000));
        let b = line("b", 2, Bandwidth::new(10_000_000_000));
        let options = CombineOptions {
            max_joins: Some(1),
            ..CombineOptions::default()
        };
        let combined = combine_topologies(&a, &b, &options, &mut Context::new()).unwrap();

        let (_, bridge) = combined.links().nth(4).unwrap();
        assert_eq!(bridge.bandwidth(), Bandwidth::new(10_000_000_000));
    }

    #[test]
    fn no_join_points() {
        let a = line("a", 2, GBPS);
        let b = LinearBranches {
            main_length: Range::fixed(2),
            ..LinearBranches::default()
        }
        .generate(&mut Context::new())
        .unwrap();

        assert_eq!(
            combine_topologies(&a, &b, &CombineOptions::default(), &mut Context::new()).unwrap_err(),
            CombineError::NoJoinPoints { first: 2, second: 0 }
        );

        let options = CombineOptions {
            max_joins: Some(0),
            ..CombineOptions::default()
        };
        assert!(matches!(
            combine_topologies(&a, &a, &options, &mut Context::new()),
            Err(CombineError::NoJoinPoints { .. })
        ));
    }

    #[test]
    fn colliding_names_without_prefixes() {
        let a = line("sw", 2, GBPS);
        let b = line("sw", 3, GBPS);
        let options = CombineOptions {
            add_name_prefixes: false,
            ..CombineOptions::default()
        };

        assert_eq!(
            combine_topologies(&a, &b, &options, &mut Context::new()).unwrap_err(),
            CombineError::NameCollision("sw0".to_owned())
        );
        // inputs are untouched
        assert_eq!(a.join_points().len(), 2);
        assert_eq!(names(&b), ["sw0", "sw1", "sw2"]);

        let b = b.with_prefix("r0_").unwrap();
        let combined = combine_topologies(&a, &b, &options, &mut Context::new()).unwrap();
        assert!(combined.node_by_name("r0_sw2").is_some());
        assert!(combined.node_by_name("sw1").is_some());
    }

    #[test]
    fn isolated_join_point() {
        let a = line("a", 2, GBPS);
        let mut b = Topology::new();
        b.add_node(Node::switch("lonely").unwrap().with_join_point(true))
            .unwrap();

        assert_eq!(
            combine_topologies(&a, &b, &CombineOptions::default(), &mut Context::new()).unwrap_err(),
            CombineError::IsolatedJoinPoint("lonely".to_owned())
        );
    }

    #[test]
    fn tree_and_line() {
        let mut context = Context::with_seed(4);
        let tree = TwoLayerTree::default().generate(&mut context).unwrap();
        let line = LinearBranches {
            main_length: Range::fixed(4),
            num_join_points: Range::fixed(4),
            ..LinearBranches::default()
        }
        .generate(&mut context)
        .unwrap();

        let combined = combine_topologies(&line, &tree, &CombineOptions::default(), &mut context).unwrap();
        assert_eq!(combined.node_count(), line.node_count() + tree.node_count());
        assert_eq!(
            combined.link_count(),
            line.link_count() + tree.link_count() + 2 * 2
        );
        assert_eq!(combined.join_points().len(), 2);

        let a = combined.node_by_name("t1_main_sw0").unwrap();
        let b = combined.node_by_name("t2_d_1_0").unwrap();
        assert!(combined.shortest_path(a, b).is_ok());
    }
}
