//! Go game state model: colors, points, moves and the position read from a game record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column letters used by GTP coordinates (the letter `I` is skipped)
pub const GTP_COLUMNS: &str = "ABCDEFGHJKLMNOPQRST";

/// Largest board addressable with GTP column letters
pub const MAX_BOARD_SIZE: usize = 19;

/// Smallest board we accept
pub const MIN_BOARD_SIZE: usize = 2;

/// Stone color / player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    #[serde(rename = "B")]
    Black,
    #[serde(rename = "W")]
    White,
}

impl Color {
    /// The other player
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Single letter used by SGF and the analysis protocol
    pub fn letter(self) -> &'static str {
        match self {
            Color::Black => "B",
            Color::White => "W",
        }
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "Black",
            Color::White => "White",
        }
    }

    /// Parse `B`/`W`/`black`/`white` (case-insensitive)
    pub fn from_letter(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "b" | "black" => Some(Color::Black),
            "w" | "white" => Some(Color::White),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A point on the board.
///
/// Row 0 is the top edge of the board (GTP row `size`), column 0 is the left
/// edge (GTP column `A`). SGF coordinates use the same orientation, so points
/// read from a game record need no vertical flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Whether the point lies on a board of the given size
    pub fn in_bounds(self, board_size: usize) -> bool {
        self.row < board_size && self.col < board_size
    }

    /// GTP coordinate, e.g. `Q16`
    ///
    /// The caller guarantees `board_size <= MAX_BOARD_SIZE` and that the point
    /// is on the board.
    pub fn to_gtp(self, board_size: usize) -> String {
        let letter = GTP_COLUMNS.as_bytes()[self.col] as char;
        format!("{}{}", letter, board_size - self.row)
    }

    /// Parse a GTP coordinate (case-insensitive). `pass` is not a point.
    pub fn from_gtp(s: &str, board_size: usize) -> Option<Self> {
        let s = s.trim();
        let first = s.chars().next()?.to_ascii_uppercase();
        let col = GTP_COLUMNS.find(first)?;
        let number: usize = s[first.len_utf8()..].parse().ok()?;

        if number == 0 || number > board_size || col >= board_size {
            return None;
        }

        Some(Self::new(board_size - number, col))
    }

    /// SGF coordinate, e.g. `pd`
    pub fn to_sgf(self) -> String {
        format!("{}{}", sgf_letter(self.col), sgf_letter(self.row))
    }

    /// Parse a two-letter SGF coordinate (`aa` is the top-left corner)
    pub fn from_sgf(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let col = sgf_index(bytes[0])?;
        let row = sgf_index(bytes[1])?;
        Some(Self::new(row, col))
    }
}

fn sgf_letter(index: usize) -> char {
    if index < 26 {
        (b'a' + index as u8) as char
    } else {
        (b'A' + (index - 26) as u8) as char
    }
}

fn sgf_index(byte: u8) -> Option<usize> {
    match byte {
        b'a'..=b'z' => Some((byte - b'a') as usize),
        b'A'..=b'Z' => Some((byte - b'A') as usize + 26),
        _ => None,
    }
}

/// A move in the main line of a game. `point == None` is a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub color: Color,
    pub point: Option<Point>,
}

impl Move {
    pub fn play(color: Color, point: Point) -> Self {
        Self {
            color,
            point: Some(point),
        }
    }

    pub fn pass(color: Color) -> Self {
        Self { color, point: None }
    }

    pub fn is_pass(&self) -> bool {
        self.point.is_none()
    }

    /// GTP vertex of the move, `pass` for passes
    pub fn vertex(&self, board_size: usize) -> String {
        match self.point {
            Some(point) => point.to_gtp(board_size),
            None => "pass".to_string(),
        }
    }
}

/// Rule sets understood by the analysis engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rules {
    #[default]
    Chinese,
    Japanese,
    Korean,
    Aga,
    #[serde(rename = "nz")]
    NewZealand,
    TrompTaylor,
    StoneScoring,
}

impl Rules {
    /// Name sent to the engine
    pub fn as_str(&self) -> &'static str {
        match self {
            Rules::Chinese => "chinese",
            Rules::Japanese => "japanese",
            Rules::Korean => "korean",
            Rules::Aga => "aga",
            Rules::NewZealand => "nz",
            Rules::TrompTaylor => "tromp-taylor",
            Rules::StoneScoring => "stone-scoring",
        }
    }

    /// Parse a rule set name as found in an `RU` property or a config file
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "chinese" | "cn" => Some(Rules::Chinese),
            "japanese" | "jp" => Some(Rules::Japanese),
            "korean" | "kr" => Some(Rules::Korean),
            "aga" => Some(Rules::Aga),
            "nz" | "new zealand" | "newzealand" => Some(Rules::NewZealand),
            "tromp-taylor" | "tromp_taylor" | "tromptaylor" => Some(Rules::TrompTaylor),
            "stone-scoring" | "stone_scoring" => Some(Rules::StoneScoring),
            _ => None,
        }
    }
}

impl FromStr for Rules {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rules::parse(s).ok_or_else(|| format!("Unknown rule set: {}", s))
    }
}

impl fmt::Display for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The current state of a game read from a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Board size (square boards only)
    pub board_size: usize,

    /// Compensation points for White
    pub komi: f64,

    /// Rule set
    pub rules: Rules,

    /// Main-line moves in order
    pub moves: Vec<Move>,

    /// Setup stones (handicap and edited positions)
    pub initial_stones: Vec<(Color, Point)>,

    /// Player to move from a `PL` property, only meaningful without moves
    pub initial_player: Option<Color>,

    /// Player to move in the current position
    pub current_player: Color,

    /// White stones captured by Black
    pub black_captures: usize,

    /// Black stones captured by White
    pub white_captures: usize,

    /// Board contents, row 0 at the top
    pub board: Vec<Vec<Option<Color>>>,

    pub black_player: String,
    pub white_player: String,
    pub game_name: String,
    pub result: String,
}

impl GameState {
    /// An empty game on a board of the given size
    pub fn new(board_size: usize) -> Self {
        Self {
            board_size,
            komi: 7.5,
            rules: Rules::default(),
            moves: Vec::new(),
            initial_stones: Vec::new(),
            initial_player: None,
            current_player: Color::Black,
            black_captures: 0,
            white_captures: 0,
            board: vec![vec![None; board_size]; board_size],
            black_player: "Black".to_string(),
            white_player: "White".to_string(),
            game_name: String::new(),
            result: String::new(),
        }
    }

    /// Stone at a point, `None` if empty or off the board
    pub fn stone_at(&self, point: Point) -> Option<Color> {
        self.board
            .get(point.row)
            .and_then(|row| row.get(point.col))
            .copied()
            .flatten()
    }

    /// All points holding a stone of the given color, top row first
    pub fn stones(&self, color: Color) -> Vec<Point> {
        let mut points = Vec::new();
        for (row, cells) in self.board.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if *cell == Some(color) {
                    points.push(Point::new(row, col));
                }
            }
        }
        points
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    /// Recompute the player to move from the move list
    pub fn update_current_player(&mut self) {
        self.current_player = match self.moves.last() {
            Some(last) => last.color.opponent(),
            None => self.initial_player.unwrap_or(Color::Black),
        };
    }

    /// Summary information about the game
    pub fn info(&self) -> GameInfo {
        GameInfo {
            board_size: self.board_size,
            komi: self.komi,
            rules: self.rules.to_string(),
            black_player: self.black_player.clone(),
            white_player: self.white_player.clone(),
            move_count: self.moves.len(),
            current_player: self.current_player.name().to_string(),
            result: if self.result.is_empty() {
                GameInfo::IN_PROGRESS.to_string()
            } else {
                self.result.clone()
            },
        }
    }
}

/// Summary information about a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    pub board_size: usize,
    pub komi: f64,
    pub rules: String,
    pub black_player: String,
    pub white_player: String,
    pub move_count: usize,
    pub current_player: String,
    pub result: String,
}

impl GameInfo {
    pub const IN_PROGRESS: &'static str = "Game in progress";

    pub fn is_finished(&self) -> bool {
        self.result != Self::IN_PROGRESS
    }
}
