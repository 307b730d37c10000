//! Turn a parsed SGF record into a [`GameState`].

use std::path::Path;

use tracing::{debug, warn};

use super::board::Board;
use super::parser::{parse_collection, Node};
use super::SgfError;
use crate::models::{Color, GameState, Move, Point, Rules, MAX_BOARD_SIZE, MIN_BOARD_SIZE};

/// Values used when a record leaves them out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameDefaults {
    pub komi: f64,
    pub rules: Rules,
}

impl Default for GameDefaults {
    fn default() -> Self {
        Self {
            komi: 7.5,
            rules: Rules::Chinese,
        }
    }
}

/// Read and replay an SGF file
pub fn read_sgf_file(path: &Path, defaults: &GameDefaults) -> Result<GameState, SgfError> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    parse_game(&text, defaults)
}

/// Parse SGF text and replay the main line of the first game
pub fn parse_game(text: &str, defaults: &GameDefaults) -> Result<GameState, SgfError> {
    let trees = parse_collection(text)?;
    let tree = trees.first().ok_or(SgfError::NoGameTree)?;
    let root = tree.root();

    let size = board_size(root)?;
    let mut state = GameState::new(size);

    state.komi = match root.first("KM").map(str::trim) {
        Some(v) if !v.is_empty() => v.parse().unwrap_or_else(|_| {
            debug!("Unparseable komi '{}', using {}", v, defaults.komi);
            defaults.komi
        }),
        _ => defaults.komi,
    };
    state.rules = match root.first("RU") {
        Some(v) => Rules::parse(v).unwrap_or_else(|| {
            debug!("Unknown rules '{}', using {}", v, defaults.rules);
            defaults.rules
        }),
        None => defaults.rules,
    };
    if let Some(name) = non_empty(root.first("PB")) {
        state.black_player = name;
    }
    if let Some(name) = non_empty(root.first("PW")) {
        state.white_player = name;
    }
    state.result = non_empty(root.first("RE")).unwrap_or_default();
    state.game_name = non_empty(root.first("GN")).unwrap_or_default();

    let mut board = Board::new(size);
    for node in tree.main_line() {
        apply_setup(node, &mut board, &mut state)?;

        if let Some(v) = node.first("PL") {
            state.initial_player = Color::from_letter(v);
        }

        for (ident, color) in [("B", Color::Black), ("W", Color::White)] {
            let Some(value) = node.first(ident) else {
                continue;
            };
            let Some(point) = move_point(ident, value, size)? else {
                state.moves.push(Move::pass(color));
                continue;
            };
            match board.play(point, color) {
                Ok(captured) => match color {
                    Color::Black => state.black_captures += captured,
                    Color::White => state.white_captures += captured,
                },
                Err(e) => warn!(
                    "Illegal move {} {} at move {}: {}",
                    color,
                    point.to_gtp(size),
                    state.moves.len() + 1,
                    e
                ),
            }
            state.moves.push(Move::play(color, point));
        }
    }

    state.board = board.into_grid();
    state.update_current_player();
    Ok(state)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn board_size(root: &Node) -> Result<usize, SgfError> {
    let Some(raw) = root.first("SZ") else {
        return Ok(MAX_BOARD_SIZE);
    };
    let raw = raw.trim();
    let unsupported = || SgfError::UnsupportedBoardSize(raw.to_string());

    let size = match raw.split_once(':') {
        Some((cols, rows)) => {
            let cols: usize = cols.trim().parse().map_err(|_| unsupported())?;
            let rows: usize = rows.trim().parse().map_err(|_| unsupported())?;
            if cols != rows {
                return Err(unsupported());
            }
            cols
        }
        None => raw.parse().map_err(|_| unsupported())?,
    };

    if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
        return Err(unsupported());
    }
    Ok(size)
}

/// Point of a `B`/`W` value, `None` for a pass
fn move_point(ident: &str, value: &str, size: usize) -> Result<Option<Point>, SgfError> {
    let value = value.trim();
    if value.is_empty() || (value == "tt" && size <= 19) {
        return Ok(None);
    }
    board_point(ident, value, size).map(Some)
}

fn board_point(ident: &str, value: &str, size: usize) -> Result<Point, SgfError> {
    Point::from_sgf(value.trim())
        .filter(|p| p.in_bounds(size))
        .ok_or_else(|| SgfError::InvalidPoint {
            property: ident.to_string(),
            value: value.to_string(),
        })
}

/// Expand a point list, including `aa:cc` rectangles
fn point_list(ident: &str, values: &[String], size: usize) -> Result<Vec<Point>, SgfError> {
    let mut points = Vec::new();
    for value in values {
        match value.split_once(':') {
            Some((from, to)) => {
                let a = board_point(ident, from, size)?;
                let b = board_point(ident, to, size)?;
                for row in a.row.min(b.row)..=a.row.max(b.row) {
                    for col in a.col.min(b.col)..=a.col.max(b.col) {
                        points.push(Point::new(row, col));
                    }
                }
            }
            None => points.push(board_point(ident, value, size)?),
        }
    }
    Ok(points)
}

fn apply_setup(node: &Node, board: &mut Board, state: &mut GameState) -> Result<(), SgfError> {
    let size = state.board_size;
    for (ident, color) in [("AB", Some(Color::Black)), ("AW", Some(Color::White)), ("AE", None)] {
        let Some(values) = node.get(ident) else {
            continue;
        };
        if !state.moves.is_empty() {
            warn!(
                "Setup property {} after move {}; the engine only sees setup stones from before the first move",
                ident,
                state.moves.len()
            );
        }
        for point in point_list(ident, values, size)? {
            match color {
                Some(c) => {
                    board.place(point, c);
                    if state.moves.is_empty() {
                        state.initial_stones.retain(|(_, p)| *p != point);
                        state.initial_stones.push((c, point));
                    }
                }
                None => {
                    board.clear(point);
                    if state.moves.is_empty() {
                        state.initial_stones.retain(|(_, p)| *p != point);
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(text: &str) -> GameState {
        parse_game(text, &GameDefaults::default()).unwrap()
    }

    #[test]
    fn test_game_info_properties() {
        let state = parse("(;GM[1]SZ[19]KM[6.5]RU[Japanese]PB[Lee]PW[Cho]RE[W+R]GN[Final];B[pd];W[dp])");
        assert_eq!(state.board_size, 19);
        assert_eq!(state.komi, 6.5);
        assert_eq!(state.rules, Rules::Japanese);
        assert_eq!(state.black_player, "Lee");
        assert_eq!(state.white_player, "Cho");
        assert_eq!(state.result, "W+R");
        assert_eq!(state.game_name, "Final");
        assert_eq!(state.move_count(), 2);
        assert_eq!(state.current_player, Color::Black);
    }

    #[test]
    fn test_defaults_when_properties_missing() {
        let defaults = GameDefaults {
            komi: 0.5,
            rules: Rules::Aga,
        };
        let state = parse_game("(;GM[1];B[dd])", &defaults).unwrap();
        assert_eq!(state.board_size, 19);
        assert_eq!(state.komi, 0.5);
        assert_eq!(state.rules, Rules::Aga);
        assert_eq!(state.black_player, "Black");
        assert_eq!(state.white_player, "White");
        assert_eq!(state.current_player, Color::White);
        assert_eq!(state.info().result, "Game in progress");

        let unknown = parse_game("(;RU[Ing]KM[]SZ[9])", &defaults).unwrap();
        assert_eq!(unknown.rules, Rules::Aga);
        assert_eq!(unknown.komi, 0.5);
    }

    #[test]
    fn test_stones_land_top_down() {
        // "pd" is Q16 (upper right), "dp" is D4 (lower left)
        let state = parse("(;SZ[19];B[pd];W[dp])");
        assert_eq!(state.board[3][15], Some(Color::Black));
        assert_eq!(state.board[15][3], Some(Color::White));
        assert_eq!(state.moves[0].vertex(19), "Q16");
        assert_eq!(state.moves[1].vertex(19), "D4");
    }

    #[test]
    fn test_passes() {
        let state = parse("(;SZ[9];B[ee];W[];B[tt])");
        assert_eq!(state.moves.len(), 3);
        assert!(state.moves[1].is_pass());
        assert!(state.moves[2].is_pass());
        assert_eq!(state.current_player, Color::White);
    }

    #[test]
    fn test_captures_are_replayed() {
        // Black surrounds the white stone at b2 on a 5x5 board
        let state = parse("(;SZ[5];B[ba];W[bb];B[ab];W[ee];B[cb];W[ed];B[bc])");
        assert_eq!(state.board[1][1], None);
        assert_eq!(state.black_captures, 1);
        assert_eq!(state.white_captures, 0);
        assert_eq!(state.moves.len(), 7);
    }

    #[test]
    fn test_illegal_move_is_recorded_but_not_played() {
        let state = parse("(;SZ[9];B[ee];W[ee])");
        assert_eq!(state.moves.len(), 2);
        assert_eq!(state.board[4][4], Some(Color::Black));
        assert_eq!(state.current_player, Color::Black);
    }

    #[test]
    fn test_setup_stones() {
        let state = parse("(;SZ[9]AB[cc][gg]AW[aa:ab]PL[W])");
        assert_eq!(state.initial_stones.len(), 4);
        assert_eq!(state.board[2][2], Some(Color::Black));
        assert_eq!(state.board[0][0], Some(Color::White));
        assert_eq!(state.board[1][0], Some(Color::White));
        assert_eq!(state.initial_player, Some(Color::White));
        assert_eq!(state.current_player, Color::White);

        let erased = parse("(;SZ[9]AB[cc][gg];AE[gg])");
        assert_eq!(erased.initial_stones, vec![(Color::Black, Point::new(2, 2))]);
        assert_eq!(erased.board[6][6], None);
    }

    #[test]
    fn test_board_size_validation() {
        let defaults = GameDefaults::default();
        assert_eq!(parse("(;SZ[13])").board_size, 13);
        assert_eq!(parse("(;SZ[9:9])").board_size, 9);
        for bad in ["(;SZ[19:13])", "(;SZ[21])", "(;SZ[1])", "(;SZ[big])"] {
            assert!(matches!(
                parse_game(bad, &defaults),
                Err(SgfError::UnsupportedBoardSize(_))
            ));
        }
    }

    #[test]
    fn test_invalid_points() {
        let defaults = GameDefaults::default();
        assert!(matches!(
            parse_game("(;SZ[9];B[zz])", &defaults),
            Err(SgfError::InvalidPoint { .. })
        ));
        assert!(matches!(
            parse_game("(;SZ[9]AB[a])", &defaults),
            Err(SgfError::InvalidPoint { .. })
        ));
    }

    #[test]
    fn test_read_sgf_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("game.sgf");
        std::fs::write(&path, "(;SZ[9]KM[5.5];B[ee];W[cc])").unwrap();

        let state = read_sgf_file(&path, &GameDefaults::default()).unwrap();
        assert_eq!(state.board_size, 9);
        assert_eq!(state.komi, 5.5);
        assert_eq!(state.move_count(), 2);

        let missing = read_sgf_file(&dir.path().join("none.sgf"), &GameDefaults::default());
        assert!(matches!(missing, Err(SgfError::Io(_))));
    }
}
