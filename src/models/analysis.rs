//! Analysis request and result models.

use serde::{Deserialize, Serialize};

use super::game::{Color, GameState};

/// Parameters of a single position analysis
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Position to analyze (the last position of the main line)
    pub state: GameState,

    /// Maximum number of search visits
    pub max_visits: u32,

    /// Request territory ownership estimates
    pub include_ownership: bool,

    /// Request the raw policy output
    pub include_policy: bool,

    /// Length of the principal variations returned
    pub pv_len: u32,

    /// Restrict the search to these moves (GTP vertices) for the first ply
    pub allow_moves: Option<Vec<String>>,
}

impl AnalysisRequest {
    /// Create a request with default parameters
    pub fn new(state: GameState) -> Self {
        Self {
            state,
            max_visits: 100,
            include_ownership: true,
            include_policy: false,
            pv_len: 10,
            allow_moves: None,
        }
    }

    /// Set maximum visits
    pub fn max_visits(mut self, visits: u32) -> Self {
        self.max_visits = visits;
        self
    }

    /// Set whether ownership is requested
    pub fn include_ownership(mut self, include: bool) -> Self {
        self.include_ownership = include;
        self
    }

    /// Set whether the policy is requested
    pub fn include_policy(mut self, include: bool) -> Self {
        self.include_policy = include;
        self
    }

    /// Set principal variation length
    pub fn pv_len(mut self, len: u32) -> Self {
        self.pv_len = len;
        self
    }

    /// Only consider the given moves at the root
    pub fn allow_moves(mut self, moves: Vec<String>) -> Self {
        self.allow_moves = Some(moves);
        self
    }
}

/// A candidate move from the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveInfo {
    /// GTP vertex, e.g. `Q16` or `pass`
    #[serde(rename = "move")]
    pub mv: String,

    pub visits: u64,

    /// Win probability for the side to move, 0 to 1
    pub winrate: f64,

    /// Expected score lead for the side to move
    pub score_lead: f64,

    /// Principal variation starting with this move
    pub pv: Vec<String>,

    /// Policy prior
    #[serde(default)]
    pub prior: f64,

    #[serde(default)]
    pub utility: f64,
}

/// Result of analysing one position.
///
/// Win rates and score leads are from the perspective of `current_player`.
/// Ownership is row-major from the top-left corner, positive for Black.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub turn_number: usize,
    pub current_player: Color,

    pub root_winrate: f64,
    pub root_score_lead: f64,
    pub root_visits: u64,

    /// Candidate moves, most visited first
    pub move_infos: Vec<MoveInfo>,

    pub ownership: Option<Vec<f64>>,

    /// Raw engine response, kept for debugging
    #[serde(skip)]
    pub raw_response: Option<serde_json::Value>,
}

impl AnalysisResult {
    /// Sort candidates by visit count, most visited first
    pub fn sort_moves(&mut self) {
        self.move_infos.sort_by(|a, b| b.visits.cmp(&a.visits));
    }

    /// The most visited candidate
    pub fn best_move(&self) -> Option<&MoveInfo> {
        self.move_infos.first()
    }

    /// Find a candidate by GTP vertex (case-insensitive), with its 1-based rank
    pub fn find_move(&self, vertex: &str) -> Option<(usize, &MoveInfo)> {
        let wanted = vertex.trim();
        self.move_infos
            .iter()
            .enumerate()
            .find(|(_, mi)| mi.mv.eq_ignore_ascii_case(wanted))
            .map(|(i, mi)| (i + 1, mi))
    }

    /// Black's win probability, 0 to 1
    pub fn black_winrate(&self) -> f64 {
        match self.current_player {
            Color::Black => self.root_winrate,
            Color::White => 1.0 - self.root_winrate,
        }
    }

    /// Score lead from Black's point of view
    pub fn score_for_black(&self) -> f64 {
        match self.current_player {
            Color::Black => self.root_score_lead,
            Color::White => -self.root_score_lead,
        }
    }
}

/// Perspective the engine reports win rates, scores and ownership from.
///
/// Set by `reportAnalysisWinratesAs` in the engine's config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Perspective {
    #[default]
    SideToMove,
    Black,
    White,
}

impl Perspective {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SIDETOMOVE" => Some(Perspective::SideToMove),
            "BLACK" => Some(Perspective::Black),
            "WHITE" => Some(Perspective::White),
            _ => None,
        }
    }

    /// Name as written in the engine config
    pub fn as_str(self) -> &'static str {
        match self {
            Perspective::SideToMove => "SIDETOMOVE",
            Perspective::Black => "BLACK",
            Perspective::White => "WHITE",
        }
    }

    /// Whether values reported this way must be flipped to get the side to move's view
    pub fn flips_for(self, to_move: Color) -> bool {
        match self {
            Perspective::SideToMove => false,
            Perspective::Black => to_move == Color::White,
            Perspective::White => to_move == Color::Black,
        }
    }

    /// Factor turning reported ownership into Black-positive ownership
    pub fn ownership_sign(self, to_move: Color) -> f64 {
        let black_positive = match self {
            Perspective::Black => true,
            Perspective::White => false,
            Perspective::SideToMove => to_move == Color::Black,
        };
        if black_positive {
            1.0
        } else {
            -1.0
        }
    }
}
