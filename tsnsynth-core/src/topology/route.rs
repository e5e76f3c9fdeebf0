use super::Topology;
use crate::{link::LinkId, node::NodeId};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Node ({0}) Not Found")]
    UnknownNode(NodeId),
    #[error("No path from {from} to {to} exists")]
    NoPath { from: String, to: String },
    #[error("link '{from}-{to}' not found")]
    LinkNotFound { from: String, to: String },
}

impl Topology {
    fn route_node_name(&self, id: NodeId) -> Result<String, RouteError> {
        self.node(id)
            .map(|node| node.name().to_owned())
            .ok_or(RouteError::UnknownNode(id))
    }

    /// Breadth-first shortest path from `from` to `to`, as directed links.
    ///
    /// Neighbors are visited in adjacency order (port order), hence among
    /// the paths of minimal hop count the first one reached in that order
    /// is returned, every time. A path from a node to itself is empty.
    pub fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<Vec<LinkId>, RouteError> {
        self.route_node_name(from)?;
        self.route_node_name(to)?;

        let mut predecessors: HashMap<NodeId, Option<NodeId>> = HashMap::new();
        predecessors.insert(from, None);

        let mut queue = VecDeque::from([from]);

        while let Some(node) = queue.pop_front() {
            if node == to {
                let mut path = vec![node];
                let mut current = node;
                while let Some(Some(previous)) = predecessors.get(&current) {
                    path.push(*previous);
                    current = *previous;
                }
                path.reverse();
                return self.nodes_to_links(&path);
            }

            for link in self.nodes[node.index()].links() {
                let neighbor = self.links[link.index()].other(node);
                if !predecessors.contains_key(&neighbor) {
                    predecessors.insert(neighbor, Some(node));
                    queue.push_back(neighbor);
                }
            }
        }

        Err(RouteError::NoPath {
            from: self.route_node_name(from)?,
            to: self.route_node_name(to)?,
        })
    }

    /// Convert a walk of nodes into the directed links connecting each
    /// consecutive pair.
    pub fn nodes_to_links(&self, nodes: &[NodeId]) -> Result<Vec<LinkId>, RouteError> {
        nodes
            .windows(2)
            .map(|pair| {
                let (n1, n2) = (pair[0], pair[1]);
                let from = self.node(n1).ok_or(RouteError::UnknownNode(n1))?;
                let link = from
                    .links()
                    .iter()
                    .copied()
                    .find(|link| self.links[link.index()].to() == n2);
                match link {
                    Some(link) => Ok(link),
                    None => Err(RouteError::LinkNotFound {
                        from: from.name().to_owned(),
                        to: self.route_node_name(n2)?,
                    }),
                }
            })
            .collect()
    }

    /// Every node other than `start` at a hop distance in
    /// `[min_dist, max_dist]`, in breadth-first order.
    pub fn get_other_devices_within_distance(
        &self,
        start: NodeId,
        min_dist: usize,
        max_dist: usize,
    ) -> Result<Vec<NodeId>, RouteError> {
        self.route_node_name(start)?;

        let mut devices = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([(start, 0)]);

        while let Some((origin, inbound_dist)) = queue.pop_front() {
            if inbound_dist >= max_dist {
                continue;
            }
            for link in self.nodes[origin.index()].links() {
                let neighbor = self.links[link.index()].other(origin);
                if neighbor != start && seen.insert(neighbor) {
                    if inbound_dist + 1 >= min_dist {
                        devices.push(neighbor);
                    }
                    queue.push_back((neighbor, inbound_dist + 1));
                }
            }
        }

        Ok(devices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{measure::Bandwidth, node::Node};

    const BW: Bandwidth = Bandwidth::new(1_000_000_000);

    /// ```text
    /// a - b - c - d
    ///  \         /
    ///   e ------
    /// ```
    fn topology() -> (Topology, [NodeId; 5]) {
        let mut topo = Topology::new();
        let ids = ["a", "b", "c", "d", "e"].map(|name| topo.add_node(Node::switch(name).unwrap()).unwrap());
        let [a, b, c, d, e] = ids;
        topo.connect(a, b, BW).unwrap();
        topo.connect(b, c, BW).unwrap();
        topo.connect(c, d, BW).unwrap();
        topo.connect(a, e, BW).unwrap();
        topo.connect(e, d, BW).unwrap();
        (topo, ids)
    }

    fn is_contiguous(topo: &Topology, path: &[LinkId]) -> bool {
        path.windows(2)
            .all(|hop| topo.link(hop[0]).unwrap().to() == topo.link(hop[1]).unwrap().from())
    }

    #[test]
    fn shortest_path_is_minimal_and_contiguous() {
        let (topo, [a, _, c, d, e]) = topology();

        let path = topo.shortest_path(a, d).unwrap();
        assert_eq!(path.len(), 2);
        assert!(is_contiguous(&topo, &path));
        assert_eq!(topo.link(path[0]).unwrap().from(), a);
        assert_eq!(topo.link(path[0]).unwrap().to(), e);
        assert_eq!(topo.link(path[1]).unwrap().to(), d);

        let path = topo.shortest_path(c, e).unwrap();
        assert_eq!(path.len(), 2);
        assert!(is_contiguous(&topo, &path));
    }

    #[test]
    fn shortest_path_is_deterministic() {
        let (topo, [_, b, _, _, e]) = topology();
        let first = topo.shortest_path(b, e).unwrap();
        for _ in 0..10 {
            assert_eq!(topo.shortest_path(b, e).unwrap(), first);
        }
    }

    #[test]
    fn tie_break_follows_adjacency_order() {
        // a reaches d through b or c, b was connected first
        let mut topo = Topology::new();
        let [a, b, c, d] = ["a", "b", "c", "d"].map(|name| topo.add_node(Node::switch(name).unwrap()).unwrap());
        topo.connect(a, b, BW).unwrap();
        topo.connect(a, c, BW).unwrap();
        topo.connect(c, d, BW).unwrap();
        topo.connect(b, d, BW).unwrap();

        let path = topo.shortest_path(a, d).unwrap();
        assert_eq!(topo.link(path[0]).unwrap().to(), b);
    }

    #[test]
    fn no_path() {
        let (mut topo, [a, ..]) = topology();
        let lonely = topo.add_node(Node::host("z").unwrap()).unwrap();
        assert_eq!(
            topo.shortest_path(a, lonely),
            Err(RouteError::NoPath {
                from: "a".to_owned(),
                to: "z".to_owned()
            })
        );
        assert_eq!(
            topo.shortest_path(a, NodeId::from_index(99)),
            Err(RouteError::UnknownNode(NodeId::from_index(99)))
        );
    }

    #[test]
    fn path_to_self_is_empty() {
        let (topo, [a, ..]) = topology();
        assert_eq!(topo.shortest_path(a, a), Ok(vec![]));
    }

    #[test]
    fn nodes_to_links_requires_adjacency() {
        let (topo, [a, b, c, ..]) = topology();
        assert_eq!(topo.nodes_to_links(&[a, b, c]).unwrap().len(), 2);
        assert_eq!(
            topo.nodes_to_links(&[a, c]),
            Err(RouteError::LinkNotFound {
                from: "a".to_owned(),
                to: "c".to_owned()
            })
        );
        assert_eq!(topo.nodes_to_links(&[a]), Ok(vec![]));
    }

    #[test]
    fn devices_within_distance() {
        let (topo, [a, b, c, d, e]) = topology();

        assert_eq!(topo.get_other_devices_within_distance(a, 1, 1).unwrap(), vec![b, e]);
        assert_eq!(topo.get_other_devices_within_distance(a, 2, 2).unwrap(), vec![c, d]);
        assert_eq!(
            topo.get_other_devices_within_distance(a, 0, 10).unwrap(),
            vec![b, e, c, d]
        );
        assert!(topo.get_other_devices_within_distance(a, 3, 10).unwrap().is_empty());
        // start is never part of the result, even through a cycle
        assert!(!topo.get_other_devices_within_distance(b, 0, 10).unwrap().contains(&b));
    }
}
