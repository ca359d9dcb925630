//! Position model for the Tessera tile-drafting engine
//!
//! This crate provides the game-level building blocks every searcher shares:
//! - `Position`: complete game state with play/undo and an incremental Zobrist key
//! - `Move`: compound draft-and-place action, ordered for deterministic tie-breaks
//! - `movegen`: deterministic legal move generation
//! - `heuristic`: O(1) static evaluation and centipoint leaf scores
//! - `EngineError`: invalid moves and broken invariants

pub mod board;
pub mod error;
pub mod heuristic;
pub mod movegen;
pub mod moves;
pub mod position;
pub mod tile;
pub mod zobrist;

// Re-export main types for convenience
pub use board::{wall_color, wall_column, PatternLine, PlayerBoard, FLOOR_SLOTS, WALL_SIZE};
pub use error::{Completion, EngineError};
pub use heuristic::{evaluate, leaf_score, value_to_unit, CENTI};
pub use movegen::{generate_into, is_legal, legal_moves, legal_moves_for};
pub use moves::{DraftSource, Move, Placement, MOVE_INDEX_SPACE};
pub use position::{factory_count, Position, PositionParts, Undo};
pub use tile::{Color, TileCounts, NUM_COLORS, TILES_PER_COLOR, TOTAL_TILES};
pub use zobrist::MAX_AGENTS;
