//! Input validation for tool arguments: SGF paths and moves.
//!
//! Paths arrive from the assistant, so relative paths must stay inside the
//! games directory.

use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::models::Point;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path traversal detected: {0}")]
    PathTraversal(String),

    #[error("Not an SGF file: {0}")]
    InvalidExtension(String),

    #[error("Invalid move format: '{0}'. Use a GTP coordinate like 'D4' or 'Q16', or 'pass'")]
    InvalidMove(String),

    #[error("Move {vertex} is outside the {size}x{size} board")]
    MoveOffBoard { vertex: String, size: usize },
}

/// Validate a requested SGF path
///
/// Rejects empty paths, control characters, non-`.sgf` files and relative
/// paths that climb out of their base directory.
pub fn sanitize_sgf_path(path: &str) -> Result<PathBuf, ValidationError> {
    let path = path.trim();

    if path.is_empty() {
        return Err(ValidationError::InvalidPath("empty path".to_string()));
    }

    if path.contains('\0') {
        return Err(ValidationError::InvalidPath(
            "contains null byte".to_string(),
        ));
    }

    if path.chars().any(char::is_control) {
        return Err(ValidationError::InvalidPath(
            "contains control characters".to_string(),
        ));
    }

    let candidate = Path::new(path);
    let is_sgf = candidate
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sgf"));
    if !is_sgf {
        return Err(ValidationError::InvalidExtension(path.to_string()));
    }

    if candidate.is_relative()
        && candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(ValidationError::PathTraversal(path.to_string()));
    }

    Ok(candidate.to_path_buf())
}

fn move_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(?i)([A-HJ-T])([0-9]{1,2})$").ok())
        .as_ref()
}

/// Parse a move given as a GTP coordinate
///
/// Returns `None` for `pass`.
pub fn parse_move(input: &str, board_size: usize) -> Result<Option<Point>, ValidationError> {
    let input = input.trim();

    if input.eq_ignore_ascii_case("pass") {
        return Ok(None);
    }

    let well_formed = move_pattern().is_some_and(|re| re.is_match(input));
    if !well_formed {
        return Err(ValidationError::InvalidMove(input.to_string()));
    }

    Point::from_gtp(input, board_size)
        .map(Some)
        .ok_or_else(|| ValidationError::MoveOffBoard {
            vertex: input.to_uppercase(),
            size: board_size,
        })
}
