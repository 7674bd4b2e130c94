pub const GRID_WIDTH: usize = 64;
pub const GRID_HEIGHT: usize = 64;
pub const CELL_SIZE: f32 = 16.0;
pub const WORLD_WIDTH: f32 = GRID_WIDTH as f32 * CELL_SIZE;
pub const WORLD_HEIGHT: f32 = GRID_HEIGHT as f32 * CELL_SIZE;

/// Spacing of the arterial road grid, in cells. Every `ROAD_SPACING`-th row
/// and column of the map carries a road; residences sit in the blocks
/// between.
pub const ROAD_SPACING: usize = 8;

/// Footprint of a generated residence quad, in world units.
pub const RESIDENCE_SIZE: f32 = 6.0;
