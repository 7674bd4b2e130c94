//! Grid road network: nodes, undirected edges with stable ids, and the
//! road-distance queries the logistics engine relies on.
//!
//! The network is built once at startup and is static afterwards. Cabs
//! drive node paths produced by [`RoadNetwork::path`]; assignment compares
//! [`EdgeId`]s to decide whether a route passes a depot or the warehouse.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::config::CELL_SIZE;

/// A road-carrying grid cell, addressed by cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoadNode(pub usize, pub usize);

impl RoadNode {
    /// World-space position of the node (center of its cell).
    pub fn world_pos(self) -> Vec2 {
        Vec2::new(
            (self.0 as f32 + 0.5) * CELL_SIZE,
            (self.1 as f32 + 0.5) * CELL_SIZE,
        )
    }
}

/// Stable identifier of an undirected road edge. The same id is returned
/// for `(a, b)` and `(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

/// Geometry of one undirected edge between two adjacent road nodes.
#[derive(Debug, Clone, Copy)]
pub struct RoadEdge {
    pub a: RoadNode,
    pub b: RoadNode,
}

impl RoadEdge {
    pub fn midpoint(&self) -> Vec2 {
        (self.a.world_pos() + self.b.world_pos()) * 0.5
    }

    pub fn length(&self) -> f32 {
        self.a.world_pos().distance(self.b.world_pos())
    }
}

/// The static road graph. Adjacency lists keep insertion order so that
/// path search is deterministic for a given construction sequence.
#[derive(Resource, Default)]
pub struct RoadNetwork {
    adjacency: HashMap<RoadNode, Vec<RoadNode>>,
    nodes: Vec<RoadNode>,
    edges: Vec<RoadEdge>,
    edge_ids: HashMap<(RoadNode, RoadNode), EdgeId>,
}

fn normalized(a: RoadNode, b: RoadNode) -> (RoadNode, RoadNode) {
    if (a.0, a.1) <= (b.0, b.1) {
        (a, b)
    } else {
        (b, a)
    }
}

impl RoadNetwork {
    /// Insert an undirected edge between `a` and `b`, registering both nodes
    /// as needed. Returns the edge's stable id; inserting the same pair
    /// twice returns the existing id.
    pub fn add_edge(&mut self, a: RoadNode, b: RoadNode) -> EdgeId {
        assert_ne!(a, b, "road edge endpoints must differ: {:?}", a);
        let key = normalized(a, b);
        if let Some(&id) = self.edge_ids.get(&key) {
            return id;
        }
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(RoadEdge { a: key.0, b: key.1 });
        self.edge_ids.insert(key, id);
        self.register_node(a);
        self.register_node(b);
        let fwd = self.adjacency.entry(a).or_default();
        if !fwd.contains(&b) {
            fwd.push(b);
        }
        let rev = self.adjacency.entry(b).or_default();
        if !rev.contains(&a) {
            rev.push(a);
        }
        id
    }

    fn register_node(&mut self, node: RoadNode) {
        if !self.adjacency.contains_key(&node) {
            self.adjacency.insert(node, Vec::new());
            self.nodes.push(node);
        }
    }

    pub fn edge_id(&self, a: RoadNode, b: RoadNode) -> Option<EdgeId> {
        self.edge_ids.get(&normalized(a, b)).copied()
    }

    pub fn edge(&self, id: EdgeId) -> &RoadEdge {
        &self.edges[id.0 as usize]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[RoadNode] {
        &self.nodes
    }

    pub fn is_road_node(&self, node: RoadNode) -> bool {
        self.adjacency.contains_key(&node)
    }

    pub fn neighbors(&self, node: RoadNode) -> &[RoadNode] {
        self.adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edge whose midpoint lies closest to `point`. `None` on an empty
    /// network.
    pub fn nearest_edge(&self, point: Vec2) -> Option<EdgeId> {
        let mut best: Option<(EdgeId, f32)> = None;
        for (i, edge) in self.edges.iter().enumerate() {
            let d = edge.midpoint().distance_squared(point);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((EdgeId(i as u32), d));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Road node closest to `point`. `None` on an empty network.
    pub fn nearest_node(&self, point: Vec2) -> Option<RoadNode> {
        let mut best: Option<(RoadNode, f32)> = None;
        for &node in &self.nodes {
            let d = node.world_pos().distance_squared(point);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((node, d));
            }
        }
        best.map(|(node, _)| node)
    }

    /// Shortest node path from `start` to `goal` (inclusive on both ends),
    /// or `None` if they are not connected.
    pub fn path(&self, start: RoadNode, goal: RoadNode) -> Option<Vec<RoadNode>> {
        if !self.is_road_node(start) || !self.is_road_node(goal) {
            return None;
        }
        let result = pathfinding::prelude::astar(
            &start,
            |&node| {
                self.neighbors(node)
                    .iter()
                    .map(|&n| (n, 1u32))
                    .collect::<Vec<_>>()
            },
            |&node| {
                let dx = (node.0 as i32 - goal.0 as i32).unsigned_abs();
                let dy = (node.1 as i32 - goal.1 as i32).unsigned_abs();
                dx + dy
            },
            |&node| node == goal,
        );
        result.map(|(path, _cost)| path)
    }

    /// Driving distance along the network between the road nodes nearest to
    /// two world-space points. `None` if the network is empty or the nodes
    /// are not connected.
    pub fn driving_distance(&self, from: Vec2, to: Vec2) -> Option<f32> {
        let start = self.nearest_node(from)?;
        let goal = self.nearest_node(to)?;
        let path = self.path(start, goal)?;
        Some((path.len().saturating_sub(1)) as f32 * CELL_SIZE)
    }

    /// Ordered edge ids traversed by a node path. Panics if the path uses a
    /// pair of nodes with no registered edge, which indicates a route that
    /// was not produced by this network.
    pub fn route_edges(&self, path: &[RoadNode]) -> Vec<EdgeId> {
        path.windows(2)
            .map(|pair| match self.edge_id(pair[0], pair[1]) {
                Some(id) => id,
                None => panic!(
                    "route step {:?} -> {:?} has no registered road edge",
                    pair[0], pair[1]
                ),
            })
            .collect()
    }
}
