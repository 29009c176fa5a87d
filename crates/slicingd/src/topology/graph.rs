//! Request-scoped graph of a tenant network's active links.

use crate::directory::VirtualLink;
use slice_types::DeviceId;
use std::collections::{HashMap, HashSet, VecDeque};

/// Directed adjacency list keyed by device.
///
/// Built fresh for every path request and dropped afterwards. Only active
/// links contribute edges; parallel links between the same devices collapse
/// into one edge. Neighbours keep the order in which their links were
/// listed, which decides ties between equal-length paths.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    adjacency: HashMap<DeviceId, Vec<DeviceId>>,
}

impl TopologyGraph {
    pub fn from_links<'a>(links: impl IntoIterator<Item = &'a VirtualLink>) -> Self {
        let mut adjacency: HashMap<DeviceId, Vec<DeviceId>> = HashMap::new();
        for link in links.into_iter().filter(|l| l.is_active()) {
            let next = adjacency.entry(link.src.device.clone()).or_default();
            if !next.contains(&link.dst.device) {
                next.push(link.dst.device.clone());
            }
        }
        Self { adjacency }
    }

    pub fn neighbors(&self, device: &DeviceId) -> &[DeviceId] {
        self.adjacency
            .get(device)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        let mut nodes: HashSet<&DeviceId> = self.adjacency.keys().collect();
        nodes.extend(self.adjacency.values().flatten());
        nodes.len()
    }

    /// Breadth-first search from `src`, returning the path walked back from
    /// `dst` through each node's discovering predecessor (destination first).
    ///
    /// Empty when `src == dst` or `dst` is unreachable.
    pub fn predecessor_path(&self, src: &DeviceId, dst: &DeviceId) -> Vec<DeviceId> {
        if src == dst {
            return Vec::new();
        }

        let mut predecessor: HashMap<&DeviceId, &DeviceId> = HashMap::new();
        let mut visited: HashSet<&DeviceId> = HashSet::from([src]);
        let mut queue: VecDeque<&DeviceId> = VecDeque::from([src]);

        while let Some(current) = queue.pop_front() {
            if current == dst {
                break;
            }
            for next in self.neighbors(current) {
                if visited.insert(next) {
                    predecessor.insert(next, current);
                    queue.push_back(next);
                }
            }
        }

        if !predecessor.contains_key(dst) {
            return Vec::new();
        }

        // Each node is discovered once, so the walk back is simple; the bound
        // guards against an inconsistent map all the same.
        let bound = self.node_count();
        let mut path = vec![dst.clone()];
        let mut current = dst;
        while current != src {
            match predecessor.get(current) {
                Some(prev) if path.len() <= bound => {
                    path.push((*prev).clone());
                    current = *prev;
                }
                _ => return Vec::new(),
            }
        }
        path
    }

    /// Shortest hop-count path from `src` to `dst`, both included, in
    /// source-to-destination order. Empty means no path.
    pub fn shortest_path(&self, src: &DeviceId, dst: &DeviceId) -> Vec<DeviceId> {
        let mut path = self.predecessor_path(src, dst);
        path.reverse();
        path
    }
}

/// Picks, for every consecutive pair of `path`, the first active link
/// joining them.
///
/// `None` if some pair has no such link (the link went away between graph
/// construction and use) or the path has fewer than two devices.
pub fn links_along(links: &[VirtualLink], path: &[DeviceId]) -> Option<Vec<VirtualLink>> {
    if path.len() < 2 {
        return None;
    }
    path.windows(2)
        .map(|pair| {
            links
                .iter()
                .find(|l| l.is_active() && l.src.device == pair[0] && l.dst.device == pair[1])
                .cloned()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::LinkState;
    use pretty_assertions::assert_eq;
    use slice_types::ConnectPoint;

    fn dev(s: &str) -> DeviceId {
        s.parse().unwrap()
    }

    fn link(src: &str, dst: &str) -> VirtualLink {
        VirtualLink::new(
            src.parse::<ConnectPoint>().unwrap(),
            dst.parse::<ConnectPoint>().unwrap(),
        )
    }

    fn bidi(a: &str, b: &str) -> [VirtualLink; 2] {
        [link(a, b), link(b, a)]
    }

    fn devs(names: &[&str]) -> Vec<DeviceId> {
        names.iter().map(|n| dev(n)).collect()
    }

    #[test]
    fn test_line_topology() {
        let links: Vec<_> = [bidi("x/2", "y/1"), bidi("y/2", "z/1")].concat();
        let graph = TopologyGraph::from_links(&links);

        assert_eq!(graph.shortest_path(&dev("x"), &dev("z")), devs(&["x", "y", "z"]));
        assert_eq!(graph.predecessor_path(&dev("x"), &dev("z")), devs(&["z", "y", "x"]));
        assert_eq!(graph.shortest_path(&dev("z"), &dev("x")), devs(&["z", "y", "x"]));
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_same_device_and_unreachable_are_empty() {
        let links: Vec<_> = bidi("x/2", "y/1").to_vec();
        let graph = TopologyGraph::from_links(&links);

        assert!(graph.shortest_path(&dev("x"), &dev("x")).is_empty());
        assert!(graph.shortest_path(&dev("x"), &dev("q")).is_empty());
        assert!(graph.shortest_path(&dev("q"), &dev("x")).is_empty());
    }

    #[test]
    fn test_inactive_links_are_excluded() {
        let mut links: Vec<_> = [bidi("x/2", "y/1"), bidi("y/2", "z/1")].concat();
        links[2].state = LinkState::Inactive; // y -> z

        let graph = TopologyGraph::from_links(&links);
        assert!(graph.shortest_path(&dev("x"), &dev("z")).is_empty());
        assert_eq!(graph.shortest_path(&dev("z"), &dev("x")), devs(&["z", "y", "x"]));
    }

    #[test]
    fn test_direction_matters() {
        let links = vec![link("x/1", "y/1")];
        let graph = TopologyGraph::from_links(&links);

        assert_eq!(graph.shortest_path(&dev("x"), &dev("y")), devs(&["x", "y"]));
        assert!(graph.shortest_path(&dev("y"), &dev("x")).is_empty());
    }

    #[test]
    fn test_shortest_path_beats_longer_detour() {
        // a-b-c-d-e ring plus a shortcut a-e
        let links: Vec<_> = [
            bidi("a/1", "b/1"),
            bidi("b/2", "c/1"),
            bidi("c/2", "d/1"),
            bidi("d/2", "e/1"),
            bidi("a/9", "e/9"),
        ]
        .concat();
        let graph = TopologyGraph::from_links(&links);

        assert_eq!(graph.shortest_path(&dev("a"), &dev("e")), devs(&["a", "e"]));
        assert_eq!(graph.shortest_path(&dev("b"), &dev("e")), devs(&["b", "a", "e"]));
        assert_eq!(graph.shortest_path(&dev("c"), &dev("e")).len(), 3);
    }

    #[test]
    fn test_cycles_do_not_loop() {
        let links: Vec<_> = [bidi("a/1", "b/1"), bidi("b/2", "c/1"), bidi("c/2", "a/2")].concat();
        let graph = TopologyGraph::from_links(&links);

        assert!(graph.shortest_path(&dev("a"), &dev("z")).is_empty());
        assert_eq!(graph.shortest_path(&dev("a"), &dev("c")), devs(&["a", "c"]));
    }

    #[test]
    fn test_parallel_links_collapse() {
        let links = vec![link("x/1", "y/1"), link("x/2", "y/2")];
        let graph = TopologyGraph::from_links(&links);
        assert_eq!(graph.neighbors(&dev("x")), devs(&["y"]).as_slice());
    }

    #[test]
    fn test_links_along_path() {
        let links: Vec<_> = [bidi("x/2", "y/1"), bidi("y/2", "z/1")].concat();
        let path = devs(&["x", "y", "z"]);

        let hops = links_along(&links, &path).unwrap();
        assert_eq!(hops, vec![link("x/2", "y/1"), link("y/2", "z/1")]);

        assert!(links_along(&links, &devs(&["x", "z"])).is_none());
        assert!(links_along(&links, &devs(&["x"])).is_none());
    }
}
