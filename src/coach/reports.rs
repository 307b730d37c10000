//! Results of the coaching operations.
//!
//! Each report carries structured fields for programmatic use and the
//! rendered `text` an assistant reads.

use serde::Serialize;

use crate::models::{GameInfo, MoveInfo};

/// Player level the explanation is pitched at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Level {
    /// Case-insensitive; anything unrecognised gets the advanced wording
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Level::Beginner,
            "intermediate" => Level::Intermediate,
            _ => Level::Advanced,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }

    pub fn tip(&self) -> &'static str {
        match self {
            Level::Beginner => {
                "Focus on making solid moves that secure territory or keep your groups connected."
            }
            Level::Intermediate => {
                "Consider the balance between territory and influence. The best move often addresses the biggest point on the board."
            }
            Level::Advanced => {
                "Evaluate the whole-board position and consider aji (potential) in your moves."
            }
        }
    }
}

/// A candidate move as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub rank: usize,
    #[serde(rename = "move")]
    pub mv: String,
    /// Percent, for the side to move
    pub winrate: f64,
    pub score_lead: f64,
    pub visits: u64,
    pub pv: Vec<String>,
}

impl Candidate {
    pub fn from_info(rank: usize, info: &MoveInfo) -> Self {
        Self {
            rank,
            mv: info.mv.clone(),
            winrate: info.winrate * 100.0,
            score_lead: info.score_lead,
            visits: info.visits,
            pv: info.pv.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub relative_path: String,
    pub path: String,
    /// `%Y-%m-%d %H:%M`, local time
    pub modified: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileListReport {
    pub directory: String,
    pub total: usize,
    pub files: Vec<FileEntry>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardStateReport {
    pub file: String,
    pub path: String,
    pub info: GameInfo,
    pub black_captures: usize,
    pub white_captures: usize,
    pub board: String,
    pub black_stones: Vec<String>,
    pub white_stones: Vec<String>,
    pub recent_moves: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub file: String,
    pub move_number: usize,
    pub current_player: String,
    /// Percent
    pub black_winrate: f64,
    pub score_for_black: f64,
    pub visits: u64,
    pub top_moves: Vec<Candidate>,
    pub ownership_map: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SequenceMove {
    pub player: String,
    #[serde(rename = "move")]
    pub mv: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alternative {
    #[serde(rename = "move")]
    pub mv: String,
    /// Percent
    pub winrate: f64,
    /// Percentage points relative to the best move
    pub winrate_diff: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationReport {
    pub current_player: String,
    pub level: Level,
    /// Percent, for the side to move
    pub winrate: f64,
    pub assessment: Option<String>,
    pub best: Option<Candidate>,
    pub sequence: Vec<SequenceMove>,
    pub alternatives: Vec<Alternative>,
    pub tip: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TerritoryReport {
    pub move_number: usize,
    pub score_for_black: f64,
    /// Points leaning Black (ownership above 0.2)
    pub black_points: usize,
    /// Points leaning White (ownership below -0.2)
    pub white_points: usize,
    pub ownership_map: Option<String>,
    pub text: String,
}

/// How a move compares to the engine's best
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Excellent,
    Good,
    Decent,
    Mistake,
}

impl Verdict {
    /// Classify by win-rate difference to the best move, in percentage points
    pub fn from_winrate_diff(diff: f64) -> Self {
        if diff > -1.0 {
            Verdict::Excellent
        } else if diff > -3.0 {
            Verdict::Good
        } else if diff > -7.0 {
            Verdict::Decent
        } else {
            Verdict::Mistake
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveEvaluation {
    /// Position among the engine's candidates; `None` when it had to be searched separately
    pub rank: Option<usize>,
    pub considered: usize,
    /// Percent
    pub winrate: f64,
    pub score_lead: f64,
    pub winrate_diff: Option<f64>,
    pub score_diff: Option<f64>,
    pub verdict: Option<Verdict>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    #[serde(rename = "move")]
    pub mv: String,
    pub current_player: String,
    pub best: Option<Candidate>,
    pub evaluation: Option<MoveEvaluation>,
    pub text: String,
}
