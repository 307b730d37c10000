//! Plain-text rendering of boards and analysis for the assistant.
//!
//! The output is meant to be read by a language model as much as by a
//! person, so stone positions are also listed explicitly next to the
//! diagram.

mod coaching;

pub use coaching::{
    render_board_state, render_evaluation, render_file_list, render_recommendation,
    render_territory, TERRITORY_LEGEND,
};

use crate::models::{AnalysisResult, Color, GameState, Point, GTP_COLUMNS};

/// Ownership above this is strong territory
pub const STRONG_OWNERSHIP: f64 = 0.6;

/// Ownership above this is likely territory
pub const LIKELY_OWNERSHIP: f64 = 0.2;

fn column_header(size: usize) -> String {
    let letters: Vec<String> = GTP_COLUMNS
        .chars()
        .take(size)
        .map(|c| c.to_string())
        .collect();
    format!("   {}", letters.join(" "))
}

/// Star points on 9x9, 13x13 and 19x19 boards
pub fn is_star_point(row: usize, col: usize, size: usize) -> bool {
    let stars: &[usize] = match size {
        19 => &[3, 9, 15],
        13 => &[3, 6, 9],
        9 => &[2, 4, 6],
        _ => return false,
    };
    stars.contains(&row) && stars.contains(&col)
}

/// Board diagram: `X` black, `O` white, `+` star point, `.` empty
pub fn board_to_ascii(state: &GameState) -> String {
    let size = state.board_size;
    let mut lines = vec![column_header(size)];

    for row in 0..size {
        let row_num = size - row;
        let mut line = format!("{:2} ", row_num);
        for col in 0..size {
            let cell = match state.stone_at(Point::new(row, col)) {
                Some(Color::Black) => "X ",
                Some(Color::White) => "O ",
                None if is_star_point(row, col, size) => "+ ",
                None => ". ",
            };
            line.push_str(cell);
        }
        line.push_str(&format!("{:2}", row_num));
        lines.push(line);
    }

    lines.push(column_header(size));
    lines.join("\n")
}

/// GTP coordinates of every stone of one color, top row first
pub fn stone_list(state: &GameState, color: Color) -> Vec<String> {
    state
        .stones(color)
        .into_iter()
        .map(|p| p.to_gtp(state.board_size))
        .collect()
}

/// Explicit stone lists for both colors
pub fn format_stone_positions(state: &GameState) -> String {
    stone_positions_text(
        &stone_list(state, Color::Black),
        &stone_list(state, Color::White),
    )
}

fn stone_positions_text(black: &[String], white: &[String]) -> String {
    let list = |stones: &[String]| {
        if stones.is_empty() {
            "none".to_string()
        } else {
            stones.join(", ")
        }
    };

    [
        "=== Stone Positions ===".to_string(),
        format!("Black stones ({}): {}", black.len(), list(black)),
        format!("White stones ({}): {}", white.len(), list(white)),
    ]
    .join("\n")
}

/// The last `last_n` moves as numbered lines
pub fn move_history(state: &GameState, last_n: usize) -> Vec<String> {
    let start = state.moves.len().saturating_sub(last_n);
    state.moves[start..]
        .iter()
        .enumerate()
        .map(|(i, mv)| {
            format!(
                "{}. {}: {}",
                start + i + 1,
                mv.color.name(),
                mv.vertex(state.board_size)
            )
        })
        .collect()
}

pub fn format_move_history(state: &GameState, last_n: usize) -> String {
    if state.moves.is_empty() {
        return "No moves played yet.".to_string();
    }
    move_history(state, last_n).join("\n")
}

/// Who leads and by how much, from Black's score
pub fn score_sentence(score_for_black: f64) -> String {
    ScoreLead::for_black(score_for_black).sentence()
}

/// Who is ahead, by how many points
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreLead {
    Black(f64),
    White(f64),
    Even,
}

impl ScoreLead {
    pub fn for_black(score_for_black: f64) -> Self {
        if score_for_black > 0.0 {
            ScoreLead::Black(score_for_black)
        } else if score_for_black < 0.0 {
            ScoreLead::White(score_for_black.abs())
        } else {
            ScoreLead::Even
        }
    }

    pub fn sentence(self) -> String {
        match self {
            ScoreLead::Black(points) => format!("Black leads by {:.1} points", points),
            ScoreLead::White(points) => format!("White leads by {:.1} points", points),
            ScoreLead::Even => "Even position".to_string(),
        }
    }
}

/// Win rates, score and the top candidate moves
pub fn format_analysis_result(result: &AnalysisResult, state: &GameState, top_n: usize) -> String {
    let black_winrate = result.black_winrate() * 100.0;
    let white_winrate = 100.0 - black_winrate;
    let shown = top_n.min(result.move_infos.len());

    let mut lines = vec![
        format!("=== Position Analysis (Move {}) ===", state.moves.len()),
        format!("Turn: {} to play", result.current_player.name()),
        String::new(),
        format!(
            "Win Rate: Black {:.1}% - White {:.1}%",
            black_winrate, white_winrate
        ),
        format!("Score: {}", score_sentence(result.score_for_black())),
        String::new(),
        format!("=== Top {} Recommended Moves ===", shown),
    ];

    for (i, mi) in result.move_infos.iter().take(top_n).enumerate() {
        lines.push(format!("{}. {}", i + 1, mi.mv));
        lines.push(format!(
            "   Win rate: {:.1}%, Score: {:+.1}",
            mi.winrate * 100.0,
            mi.score_lead
        ));
        if !mi.pv.is_empty() {
            let pv: Vec<&str> = mi.pv.iter().take(5).map(String::as_str).collect();
            lines.push(format!("   Variation: {}", pv.join(" → ")));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Territory map from Black-positive ownership
pub fn format_ownership_map(ownership: &[f64], size: usize) -> String {
    if ownership.is_empty() || ownership.len() != size * size {
        return "Ownership data not available".to_string();
    }

    let mut lines = vec![
        "=== Territory Map ===".to_string(),
        "(B = Black territory, W = White territory, . = neutral)".to_string(),
        String::new(),
        column_header(size),
    ];

    for (row, values) in ownership.chunks(size).enumerate() {
        let row_num = size - row;
        let mut line = format!("{:2} ", row_num);
        for &own in values {
            let cell = if own > STRONG_OWNERSHIP {
                "B "
            } else if own > LIKELY_OWNERSHIP {
                "b "
            } else if own < -STRONG_OWNERSHIP {
                "W "
            } else if own < -LIKELY_OWNERSHIP {
                "w "
            } else {
                ". "
            };
            line.push_str(cell);
        }
        line.push_str(&format!("{:2}", row_num));
        lines.push(line);
    }

    lines.push(column_header(size));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Move, MoveInfo};

    fn small_game() -> GameState {
        let mut state = GameState::new(9);
        state.board[2][2] = Some(Color::Black);
        state.board[6][6] = Some(Color::White);
        state.moves = vec![
            Move::play(Color::Black, Point::new(2, 2)),
            Move::play(Color::White, Point::new(6, 6)),
        ];
        state.update_current_player();
        state
    }

    #[test]
    fn test_board_to_ascii() {
        let text = board_to_ascii(&small_game());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "   A B C D E F G H J");
        assert_eq!(lines[1], " 9 . . . . . . . . .  9");
        assert_eq!(lines[3], " 7 . . X . + . + . .  7");
        assert_eq!(lines[5], " 5 . . + . + . + . .  5");
        assert_eq!(lines[7], " 3 . . + . + . O . .  3");
        assert_eq!(lines[10], lines[0]);
    }

    #[test]
    fn test_star_points() {
        assert!(is_star_point(3, 15, 19));
        assert!(is_star_point(9, 9, 19));
        assert!(is_star_point(6, 6, 13));
        assert!(!is_star_point(3, 4, 19));
        assert!(!is_star_point(2, 2, 7));
    }

    #[test]
    fn test_stone_positions() {
        let text = format_stone_positions(&small_game());
        assert!(text.contains("Black stones (1): C7"));
        assert!(text.contains("White stones (1): G3"));
        let empty = format_stone_positions(&GameState::new(9));
        assert!(empty.contains("Black stones (0): none"));
    }

    #[test]
    fn test_move_history() {
        let mut state = small_game();
        assert_eq!(
            format_move_history(&state, 10),
            "1. Black: C7\n2. White: G3"
        );
        state.moves.push(Move::pass(Color::Black));
        assert_eq!(format_move_history(&state, 1), "3. Black: pass");
        assert_eq!(
            format_move_history(&GameState::new(9), 10),
            "No moves played yet."
        );
    }

    #[test]
    fn test_score_sentence() {
        assert_eq!(score_sentence(2.46), "Black leads by 2.5 points");
        assert_eq!(score_sentence(-0.5), "White leads by 0.5 points");
        assert_eq!(score_sentence(0.0), "Even position");
        assert_eq!(ScoreLead::for_black(-3.0), ScoreLead::White(3.0));
    }

    #[test]
    fn test_format_analysis_result() {
        let state = small_game();
        let result = AnalysisResult {
            id: "a".into(),
            turn_number: 2,
            current_player: Color::Black,
            root_winrate: 0.6,
            root_score_lead: 1.5,
            root_visits: 100,
            move_infos: vec![MoveInfo {
                mv: "E5".into(),
                visits: 90,
                winrate: 0.61,
                score_lead: 1.6,
                pv: ["E5", "D4", "F6", "C3", "G7", "B2"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                prior: 0.2,
                utility: 0.0,
            }],
            ownership: None,
            raw_response: None,
        };
        let text = format_analysis_result(&result, &state, 5);
        assert!(text.contains("=== Position Analysis (Move 2) ==="));
        assert!(text.contains("Turn: Black to play"));
        assert!(text.contains("Win Rate: Black 60.0% - White 40.0%"));
        assert!(text.contains("Score: Black leads by 1.5 points"));
        assert!(text.contains("=== Top 1 Recommended Moves ==="));
        assert!(text.contains("   Win rate: 61.0%, Score: +1.6"));
        assert!(text.contains("   Variation: E5 → D4 → F6 → C3 → G7\n"));
    }

    #[test]
    fn test_format_ownership_map() {
        let mut ownership = vec![0.0; 4];
        ownership[0] = 0.9;
        ownership[1] = 0.3;
        ownership[2] = -0.7;
        ownership[3] = -0.3;
        let text = format_ownership_map(&ownership, 2);
        assert!(text.contains(" 2 B b  2"));
        assert!(text.contains(" 1 W w  1"));
        assert_eq!(
            format_ownership_map(&ownership, 3),
            "Ownership data not available"
        );
    }
}
