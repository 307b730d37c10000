//! SGF game records: parsing, replay onto a board, and the directory of saved games.
//!
//! Games are read from the directory a board editor (such as Sabaki) saves
//! into. The most recently modified record is treated as the current game
//! unless a specific file is requested.
//!
//! SGF coordinates are column letter then row letter, with row `a` at the top
//! of the board. The internal [`Point`](crate::models::Point) uses the same
//! orientation, so records map onto the board without any vertical flip.

mod board;
mod library;
mod parser;
mod reader;

pub use board::{Board, IllegalMove};
pub use library::{GameLibrary, SgfFile};
pub use parser::{parse_collection, GameTree, Node};
pub use reader::{parse_game, read_sgf_file, GameDefaults};

use std::path::PathBuf;

use crate::utils::ValidationError;

/// Errors that can occur when reading game records
#[derive(Debug, thiserror::Error)]
pub enum SgfError {
    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed SGF text
    #[error("SGF syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// The data contains no game tree
    #[error("No game tree found in SGF data")]
    NoGameTree,

    /// Board size we cannot analyze
    #[error("Unsupported board size: {0} (square boards from 2x2 to 19x19 are supported)")]
    UnsupportedBoardSize(String),

    /// A property value that is not a point on the board
    #[error("Invalid point '{value}' in property {property}")]
    InvalidPoint { property: String, value: String },

    /// The games directory holds no records
    #[error("No SGF files found in {}. Please save your game in Sabaki first.", .0.display())]
    NoGames(PathBuf),

    /// A requested record does not exist
    #[error("SGF file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A requested path was rejected
    #[error("Invalid SGF path: {0}")]
    InvalidPath(#[from] ValidationError),
}
