//! Text for each coaching report.

use super::{stone_positions_text, ScoreLead};
use crate::coach::{
    BoardStateReport, EvaluationReport, FileListReport, RecommendationReport, TerritoryReport,
    Verdict,
};

pub const TERRITORY_LEGEND: &str = "Legend:
  B = Strong Black territory
  b = Likely Black territory
  W = Strong White territory
  w = Likely White territory
  . = Neutral / contested";

pub fn render_file_list(report: &FileListReport) -> String {
    if report.files.is_empty() {
        return format!("No SGF files found in {}", report.directory);
    }

    let mut lines = vec![
        format!("=== SGF Files in {} ===", report.directory),
        String::new(),
    ];
    for (i, file) in report.files.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, file.relative_path));
        lines.push(format!("   Modified: {}", file.modified));
    }
    if report.total > report.files.len() {
        lines.push(format!(
            "\n... and {} more files",
            report.total - report.files.len()
        ));
    }
    lines.join("\n")
}

pub fn render_board_state(report: &BoardStateReport) -> String {
    let info = &report.info;
    let mut lines = vec![
        "=== Current Game State ===".to_string(),
        format!("File: {}", report.file),
        String::new(),
        format!("Black: {}", info.black_player),
        format!("White: {}", info.white_player),
        format!("Board: {}x{}", info.board_size, info.board_size),
        format!("Komi: {:.1}", info.komi),
        format!("Rules: {}", info.rules),
        format!("Move: {}", info.move_count),
        format!("Turn: {} to play", info.current_player),
        format!(
            "Captures: Black {}, White {}",
            report.black_captures, report.white_captures
        ),
    ];
    if info.is_finished() {
        lines.push(format!("Result: {}", info.result));
    }
    lines.push(String::new());
    lines.push(report.board.clone());
    lines.push(String::new());
    lines.push(stone_positions_text(&report.black_stones, &report.white_stones));
    lines.push(String::new());
    lines.push("=== Recent Moves ===".to_string());
    if report.recent_moves.is_empty() {
        lines.push("No moves played yet.".to_string());
    } else {
        lines.extend(report.recent_moves.iter().cloned());
    }
    lines.join("\n")
}

pub fn render_recommendation(report: &RecommendationReport) -> String {
    let Some(best) = &report.best else {
        return "No moves available (game may be over)".to_string();
    };

    let mut lines = vec![
        format!("=== Move Recommendation for {} ===", report.current_player),
        String::new(),
    ];
    if let Some(assessment) = &report.assessment {
        lines.push(format!("Position assessment: {}", assessment));
    }
    lines.push(format!("Win probability: {:.0}%", report.winrate));
    lines.push(String::new());

    lines.push(format!("📍 Recommended move: {}", best.mv));
    lines.push(format!("   Expected win rate after: {:.0}%", best.winrate));
    lines.push(format!("   Score change: {:+.1} points", best.score_lead));
    lines.push(String::new());

    if !report.sequence.is_empty() {
        lines.push("Expected sequence:".to_string());
        for (i, step) in report.sequence.iter().enumerate() {
            lines.push(format!("   {}. {}: {}", i + 1, step.player, step.mv));
        }
    }
    lines.push(String::new());

    if !report.alternatives.is_empty() {
        lines.push("Alternative moves to consider:".to_string());
        for alt in &report.alternatives {
            lines.push(format!(
                "   • {} (win rate: {:.0}%, {:+.0}% compared to best)",
                alt.mv, alt.winrate, alt.winrate_diff
            ));
        }
    }

    if let Some(tip) = &report.tip {
        lines.push(String::new());
        lines.push(format!("💡 Tip: {}", tip));
    }
    lines.join("\n")
}

pub fn render_territory(report: &TerritoryReport) -> String {
    let score = match ScoreLead::for_black(report.score_for_black) {
        ScoreLead::Even => "Even".to_string(),
        lead => lead.sentence(),
    };

    let mut lines = vec![
        format!("=== Territory Analysis (Move {}) ===", report.move_number),
        String::new(),
        format!("Estimated score: {}", score),
        String::new(),
    ];

    match &report.ownership_map {
        Some(map) => {
            lines.push(map.clone());
            lines.push(String::new());
            lines.push(format!(
                "Points leaning Black: {}, leaning White: {}",
                report.black_points, report.white_points
            ));
            lines.push(String::new());
            lines.push(TERRITORY_LEGEND.to_string());
        }
        None => lines.push("Territory map not available".to_string()),
    }
    lines.join("\n")
}

pub fn render_evaluation(report: &EvaluationReport) -> String {
    let mut lines = vec![
        format!("=== Evaluation of {} ===", report.mv),
        String::new(),
        format!("For: {}", report.current_player),
        String::new(),
    ];

    if let Some(best) = &report.best {
        lines.push(format!("Best move according to KataGo: {}", best.mv));
        lines.push(format!("Best move win rate: {:.1}%", best.winrate));
        lines.push(String::new());
    }

    let Some(eval) = &report.evaluation else {
        lines.push(format!(
            "⚠️ Move {} was not in KataGo's top candidates.",
            report.mv
        ));
        lines.push(
            "This might be a mistake, or the position requires deeper analysis.".to_string(),
        );
        if let Some(best) = &report.best {
            lines.push(format!(
                "Consider: {} (win rate: {:.1}%)",
                best.mv, best.winrate
            ));
        }
        return lines.join("\n");
    };

    lines.push(format!("Your move {}:", report.mv));
    match eval.rank {
        Some(rank) => lines.push(format!(
            "  Rank: #{} out of {} considered moves",
            rank, eval.considered
        )),
        None => lines.push(format!(
            "  Rank: not among the {} considered moves (searched separately)",
            eval.considered
        )),
    }
    lines.push(format!("  Win rate: {:.1}%", eval.winrate));
    lines.push(format!("  Score: {:+.1}", eval.score_lead));

    if let (Some(verdict), Some(diff)) = (eval.verdict, eval.winrate_diff) {
        lines.push(String::new());
        match verdict {
            Verdict::Excellent => {
                lines.push("✅ Excellent choice! This is one of the best moves.".to_string())
            }
            Verdict::Good => lines.push(format!(
                "👍 Good move! Only slightly suboptimal ({:+.1}% win rate difference)",
                diff
            )),
            Verdict::Decent => lines.push(format!(
                "⚠️ Decent move, but there are better options ({:+.1}% win rate difference)",
                diff
            )),
            Verdict::Mistake => {
                lines.push(format!(
                    "❌ This move loses significant value ({:+.1}% win rate difference)",
                    diff
                ));
                if let Some(best) = &report.best {
                    lines.push(format!("   Consider {} instead", best.mv));
                }
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::{Alternative, Candidate, FileEntry, Level, MoveEvaluation, SequenceMove};

    fn candidate(mv: &str, winrate: f64) -> Candidate {
        Candidate {
            rank: 1,
            mv: mv.to_string(),
            winrate,
            score_lead: 2.0,
            visits: 50,
            pv: vec![mv.to_string()],
        }
    }

    #[test]
    fn test_render_file_list() {
        let mut report = FileListReport {
            directory: "/games".into(),
            total: 0,
            files: Vec::new(),
            text: String::new(),
        };
        assert_eq!(render_file_list(&report), "No SGF files found in /games");

        report.total = 3;
        report.files.push(FileEntry {
            relative_path: "a.sgf".into(),
            path: "/games/a.sgf".into(),
            modified: "2024-05-01 10:30".into(),
        });
        let text = render_file_list(&report);
        assert!(text.starts_with("=== SGF Files in /games ==="));
        assert!(text.contains("1. a.sgf\n   Modified: 2024-05-01 10:30"));
        assert!(text.ends_with("... and 2 more files"));
    }

    #[test]
    fn test_render_recommendation() {
        let report = RecommendationReport {
            current_player: "White".into(),
            level: Level::Beginner,
            winrate: 58.2,
            assessment: Some("You're in a good position!".into()),
            best: Some(candidate("Q16", 60.0)),
            sequence: vec![
                SequenceMove {
                    player: "White".into(),
                    mv: "Q16".into(),
                },
                SequenceMove {
                    player: "Black".into(),
                    mv: "D4".into(),
                },
            ],
            alternatives: vec![Alternative {
                mv: "D16".into(),
                winrate: 57.0,
                winrate_diff: -3.0,
            }],
            tip: Some(Level::Beginner.tip().into()),
            text: String::new(),
        };
        let text = render_recommendation(&report);
        assert!(text.contains("=== Move Recommendation for White ==="));
        assert!(text.contains("Win probability: 58%"));
        assert!(text.contains("📍 Recommended move: Q16"));
        assert!(text.contains("   Score change: +2.0 points"));
        assert!(text.contains("   1. White: Q16\n   2. Black: D4"));
        assert!(text.contains("   • D16 (win rate: 57%, -3% compared to best)"));
        assert!(text.contains("💡 Tip: Focus on making solid moves"));

        let empty = RecommendationReport {
            best: None,
            ..report
        };
        assert_eq!(
            render_recommendation(&empty),
            "No moves available (game may be over)"
        );
    }

    #[test]
    fn test_render_territory() {
        let mut report = TerritoryReport {
            move_number: 12,
            score_for_black: 0.0,
            black_points: 0,
            white_points: 0,
            ownership_map: None,
            text: String::new(),
        };
        let text = render_territory(&report);
        assert!(text.contains("Estimated score: Even\n"));
        assert!(!text.contains("Even position"));
        assert!(text.ends_with("Territory map not available"));

        report.score_for_black = -4.3;
        report.ownership_map = Some("=== Territory Map ===".into());
        let text = render_territory(&report);
        assert!(text.contains("Estimated score: White leads by 4.3 points"));
        assert!(text.ends_with(TERRITORY_LEGEND));
    }

    #[test]
    fn test_render_evaluation_verdicts() {
        let mut report = EvaluationReport {
            mv: "C3".into(),
            current_player: "Black".into(),
            best: Some(candidate("D4", 55.0)),
            evaluation: Some(MoveEvaluation {
                rank: Some(3),
                considered: 8,
                winrate: 45.0,
                score_lead: -1.5,
                winrate_diff: Some(-10.0),
                score_diff: Some(-3.5),
                verdict: Some(Verdict::Mistake),
            }),
            text: String::new(),
        };
        let text = render_evaluation(&report);
        assert!(text.contains("  Rank: #3 out of 8 considered moves"));
        assert!(text.contains("❌ This move loses significant value (-10.0% win rate difference)"));
        assert!(text.ends_with("   Consider D4 instead"));

        report.evaluation = None;
        let text = render_evaluation(&report);
        assert!(text.contains("⚠️ Move C3 was not in KataGo's top candidates."));
        assert!(text.ends_with("Consider: D4 (win rate: 55.0%)"));
    }
}
