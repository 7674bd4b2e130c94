use bevy::prelude::*;

use crate::config::CELL_SIZE;
use crate::road_network::{RoadNetwork, RoadNode};

use super::systems::route_via_edge;
use super::types::{CabRoute, CargoHold};

fn straight_network(len: usize) -> RoadNetwork {
    let mut net = RoadNetwork::default();
    for x in 0..len - 1 {
        net.add_edge(RoadNode(x, 0), RoadNode(x + 1, 0));
    }
    net
}

fn straight_route(net: &RoadNetwork, len: usize) -> CabRoute {
    let nodes: Vec<RoadNode> = (0..len).map(|x| RoadNode(x, 0)).collect();
    CabRoute::new(nodes, net)
}

// ====================================================================
// CabRoute
// ====================================================================

#[test]
fn test_route_starts_on_first_edge() {
    let net = straight_network(4);
    let route = straight_route(&net, 4);
    assert_eq!(
        route.current_edge(),
        net.edge_id(RoadNode(0, 0), RoadNode(1, 0)).unwrap()
    );
    assert_eq!(route.remaining_edges().len(), 3);
    assert!(!route.is_complete());
}

#[test]
fn test_route_position_interpolates_along_segment() {
    let net = straight_network(3);
    let mut route = straight_route(&net, 3);
    let start = RoadNode(0, 0).world_pos();
    assert_eq!(route.position(), start);
    route.advance(0.5);
    assert_eq!(route.position(), start + Vec2::new(CELL_SIZE * 0.5, 0.0));
}

#[test]
fn test_route_advance_moves_current_edge_one_segment_at_a_time() {
    let net = straight_network(4);
    let mut route = straight_route(&net, 4);
    let edges: Vec<_> = route.remaining_edges().to_vec();

    route.advance(0.5);
    assert_eq!(route.current_edge(), edges[0]);
    route.advance(0.5);
    assert_eq!(route.current_edge(), edges[1]);
    route.advance(1.0);
    assert_eq!(route.current_edge(), edges[2]);
}

#[test]
fn test_route_remaining_edges_shrink_as_it_drives() {
    let net = straight_network(5);
    let mut route = straight_route(&net, 5);
    let all: Vec<_> = route.remaining_edges().to_vec();
    assert!(route.passes_edge(all[3]));

    route.advance(2.0);
    assert_eq!(route.remaining_edges(), &all[2..]);
    assert!(!route.passes_edge(all[0]));
    assert!(route.passes_edge(all[2]));
}

#[test]
fn test_route_completion_clamps_and_pins_final_edge() {
    let net = straight_network(3);
    let mut route = straight_route(&net, 3);
    route.advance(100.0);
    assert!(route.is_complete());
    assert_eq!(route.position(), RoadNode(2, 0).world_pos());
    assert_eq!(
        route.current_edge(),
        net.edge_id(RoadNode(1, 0), RoadNode(2, 0)).unwrap()
    );
    assert_eq!(route.remaining_edges().len(), 1);
}

#[test]
#[should_panic(expected = "at least two nodes")]
fn test_single_node_route_panics() {
    let net = straight_network(2);
    CabRoute::new(vec![RoadNode(0, 0)], &net);
}

// ====================================================================
// route_via_edge
// ====================================================================

#[test]
fn test_route_via_edge_traverses_the_edge_itself() {
    let net = straight_network(8);
    let via = net.edge_id(RoadNode(3, 0), RoadNode(4, 0)).unwrap();

    let path = route_via_edge(&net, RoadNode(0, 0), RoadNode(7, 0), via).unwrap();
    let route = CabRoute::new(path, &net);
    assert!(route.passes_edge(via));
}

#[test]
fn test_route_via_edge_doubles_back_when_dest_is_behind() {
    let net = straight_network(8);
    let via = net.edge_id(RoadNode(5, 0), RoadNode(6, 0)).unwrap();

    // Destination sits before the via edge; the trip must overshoot to
    // node 6 and come back.
    let path = route_via_edge(&net, RoadNode(0, 0), RoadNode(2, 0), via).unwrap();
    assert!(path.contains(&RoadNode(6, 0)));
    assert_eq!(*path.last().unwrap(), RoadNode(2, 0));
    let route = CabRoute::new(path, &net);
    assert!(route.passes_edge(via));
}

#[test]
fn test_route_via_edge_from_an_endpoint() {
    let net = straight_network(5);
    let via = net.edge_id(RoadNode(0, 0), RoadNode(1, 0)).unwrap();

    let path = route_via_edge(&net, RoadNode(0, 0), RoadNode(4, 0), via).unwrap();
    assert_eq!(path[0], RoadNode(0, 0));
    assert_eq!(path[1], RoadNode(1, 0));
    assert_eq!(*path.last().unwrap(), RoadNode(4, 0));
}

#[test]
fn test_route_via_unreachable_edge_is_none() {
    let mut net = RoadNetwork::default();
    net.add_edge(RoadNode(0, 0), RoadNode(1, 0));
    let island = net.add_edge(RoadNode(10, 10), RoadNode(11, 10));
    assert!(route_via_edge(&net, RoadNode(0, 0), RoadNode(1, 0), island).is_none());
}

// ====================================================================
// CargoHold
// ====================================================================

#[test]
fn test_hold_load_unload() {
    let mut hold = CargoHold::new(2);
    let a = Entity::from_raw(1);
    let b = Entity::from_raw(2);

    assert!(hold.has_space());
    hold.load(a);
    hold.load(b);
    assert!(!hold.has_space());
    assert_eq!(hold.parcels(), &[a, b]);

    hold.unload(a);
    assert_eq!(hold.len(), 1);
    assert!(hold.has_space());
}

#[test]
#[should_panic(expected = "over capacity")]
fn test_hold_overfill_panics() {
    let mut hold = CargoHold::new(1);
    hold.load(Entity::from_raw(1));
    hold.load(Entity::from_raw(2));
}

#[test]
#[should_panic(expected = "already carries")]
fn test_hold_double_load_panics() {
    let mut hold = CargoHold::new(2);
    hold.load(Entity::from_raw(1));
    hold.load(Entity::from_raw(1));
}

#[test]
#[should_panic(expected = "not in hold")]
fn test_hold_unload_absent_panics() {
    let mut hold = CargoHold::new(2);
    hold.unload(Entity::from_raw(9));
}
