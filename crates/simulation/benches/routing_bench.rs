//! Criterion benchmarks for road routing and flight tour planning.
//!
//! Covers the hot paths of a loaded simulation tick:
//!   - A* driving routes over the arterial grid at three distance tiers
//!   - position snapping (nearest edge / driving distance between points),
//!     which the assignment pass runs for every queued parcel
//!   - delivery tour planning (nearest-neighbour + 2-opt) at shelf sizes
//!
//! Run with: cargo bench -p simulation --bench routing_bench

use bevy::math::Vec2;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use simulation::config::{GRID_HEIGHT, GRID_WIDTH, ROAD_SPACING};
use simulation::road_network::{RoadNetwork, RoadNode};
use simulation::tsp::{plan_tour, tour_length};

// ---------------------------------------------------------------------------
// Fixture: the arterial grid the generated world lays down
// ---------------------------------------------------------------------------

/// One arterial row and column every `ROAD_SPACING` cells over the 64x64
/// grid, the same plan `init_world` builds: 960 nodes, 1008 edges.
fn build_arterial_network() -> RoadNetwork {
    let mut network = RoadNetwork::default();
    for y in (0..GRID_HEIGHT).step_by(ROAD_SPACING) {
        for x in 0..GRID_WIDTH - 1 {
            network.add_edge(RoadNode(x, y), RoadNode(x + 1, y));
        }
    }
    for x in (0..GRID_WIDTH).step_by(ROAD_SPACING) {
        for y in 0..GRID_HEIGHT - 1 {
            network.add_edge(RoadNode(x, y), RoadNode(x, y + 1));
        }
    }
    network
}

// ---------------------------------------------------------------------------
// Distance-tier endpoints (all lie on the arterial grid)
// ---------------------------------------------------------------------------

/// Short hop: 8 cells along one row.
const SHORT_START: RoadNode = RoadNode(0, 0);
const SHORT_GOAL: RoadNode = RoadNode(8, 0);

/// Medium route: 64 Manhattan cells to a mid-map intersection.
const MEDIUM_START: RoadNode = RoadNode(0, 0);
const MEDIUM_GOAL: RoadNode = RoadNode(32, 32);

/// Cross-map: corner to the far end of the last arterial row, 119 cells.
const CROSS_START: RoadNode = RoadNode(0, 0);
const CROSS_GOAL: RoadNode = RoadNode(63, 56);

// ---------------------------------------------------------------------------
// Benchmark: A* driving routes at 3 distance tiers
// ---------------------------------------------------------------------------

fn bench_astar_distances(c: &mut Criterion) {
    let mut group = c.benchmark_group("astar_driving_routes");
    group.sample_size(100);

    let network = build_arterial_network();

    // Panic early if the fixture drifts from the endpoints.
    for (label, start, goal) in [
        ("short_8", SHORT_START, SHORT_GOAL),
        ("medium_64", MEDIUM_START, MEDIUM_GOAL),
        ("cross_map_119", CROSS_START, CROSS_GOAL),
    ] {
        assert!(
            network.path(start, goal).is_some(),
            "{label}: no path from {start:?} to {goal:?}"
        );
    }

    group.bench_function("short_8", |b| {
        b.iter(|| black_box(network.path(SHORT_START, SHORT_GOAL)));
    });

    group.bench_function("medium_64", |b| {
        b.iter(|| black_box(network.path(MEDIUM_START, MEDIUM_GOAL)));
    });

    group.bench_function("cross_map_119", |b| {
        b.iter(|| black_box(network.path(CROSS_START, CROSS_GOAL)));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: position snapping, as the assignment pass uses it
// ---------------------------------------------------------------------------

fn bench_position_snapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("position_snapping");
    group.sample_size(100);

    let network = build_arterial_network();
    // Off-road world positions, one near the map center and one near a corner.
    let depot_side = Vec2::new(522.0, 410.0);
    let residence_side = Vec2::new(76.0, 91.0);

    group.bench_function("nearest_edge", |b| {
        b.iter(|| black_box(network.nearest_edge(depot_side)));
    });

    group.bench_function("driving_distance_cross_map", |b| {
        b.iter(|| black_box(network.driving_distance(depot_side, residence_side)));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: delivery tour planning at shelf sizes
// ---------------------------------------------------------------------------

/// Deterministic scatter of delivery stops around a depot. The golden-angle
/// spiral keeps stops spread out so 2-opt has real work to do.
fn scatter_stops(count: usize) -> Vec<Vec2> {
    let home = Vec2::new(512.0, 512.0);
    (0..count)
        .map(|i| {
            let angle = i as f32 * 2.399_963;
            let radius = 90.0 + 30.0 * i as f32;
            home + radius * Vec2::new(angle.cos(), angle.sin())
        })
        .collect()
}

fn bench_tour_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("tour_planning");
    group.sample_size(100);

    let home = Vec2::new(512.0, 512.0);

    for &count in &[2usize, 4, 8] {
        let stops = scatter_stops(count);

        // Sanity: the planner returns a permutation no worse than shelf order.
        let order = plan_tour(home, &stops);
        assert_eq!(order.len(), count);
        let shelf_order: Vec<usize> = (0..count).collect();
        assert!(
            tour_length(home, &stops, &order)
                <= tour_length(home, &stops, &shelf_order) + 1e-3,
            "{count} stops: planned tour longer than shelf order"
        );

        group.bench_function(format!("plan_tour_{count}_stops"), |b| {
            b.iter(|| black_box(plan_tour(home, &stops)));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Register groups
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_astar_distances,
    bench_position_snapping,
    bench_tour_planning,
);
criterion_main!(benches);
