//! Core data models for games and engine analysis.

mod analysis;
mod game;

pub use analysis::{AnalysisRequest, AnalysisResult, MoveInfo, Perspective};
pub use game::{
    Color, GameInfo, GameState, Move, Point, Rules, GTP_COLUMNS, MAX_BOARD_SIZE, MIN_BOARD_SIZE,
};
