//! Constants for board dimensions, piece counts, evaluation weights and search defaults.
//!
//! The board topology itself is compiled in (see [`crate::board`]); this module only
//! carries the scalar parameters the rules, evaluator and search share.

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of playable points (three concentric rings of eight).
pub const NUM_POINTS: usize = 24;

/// Number of mill lines (straight runs of three adjacent points).
pub const NUM_MILL_LINES: usize = 16;

/// Maximum number of neighbors a point can have (north, east, south, west).
pub const MAX_NEIGHBORS: usize = 4;

// =============================================================================
// Piece Counts
// =============================================================================

/// Pieces each player starts with in hand.
pub const PIECES_PER_PLAYER: u8 = 9;

/// A player out of the placing phase with fewer pieces than this has lost.
pub const MIN_PIECES: u8 = 3;

/// A player with this many pieces (or fewer) on the board may fly.
pub const FLYING_THRESHOLD: u8 = 3;

// =============================================================================
// Evaluation Weights
// =============================================================================

/// Line fully owned by one player (a mill).
pub const SCORE_LINE_THREE: i32 = 100;

/// Line with two own pieces and one empty point.
pub const SCORE_LINE_TWO: i32 = 10;

/// Line with one own piece and two empty points.
pub const SCORE_LINE_ONE: i32 = 1;

/// Positional weight of a cross point (four neighbors).
pub const WEIGHT_CROSS: i32 = 2;

/// Positional weight of a T-junction point (three neighbors).
pub const WEIGHT_JUNCTION: i32 = 1;

/// Positional weight of a corner point (two neighbors).
pub const WEIGHT_CORNER: i32 = 0;

// =============================================================================
// Search Parameters
// =============================================================================

/// Score of a won position. Dominates any sum of line and positional scores
/// (at most 16 * 100 + 24 * 2 in magnitude).
pub const WIN_SCORE: i32 = 1_000_000;

/// Score of a lost position.
pub const LOSS_SCORE: i32 = -WIN_SCORE;

/// Bound used for the initial alpha-beta window.
pub const INFINITY: i32 = WIN_SCORE + 1;

/// Default search depth in plies (the root move counts as the first ply).
pub const DEFAULT_DEPTH: u32 = 3;

/// Extra plies searched while the side to move is flying.
pub const DEFAULT_FLYING_BONUS: u32 = 1;

// =============================================================================
// Match Control
// =============================================================================

/// Consecutive plies without a capture (after placing) before a draw is declared.
pub const DEFAULT_QUIET_PLY_LIMIT: u32 = 100;
