//! The coaching operations behind every tool.
//!
//! [`Coach`] ties the games directory, the configuration and an analysis
//! engine together. Each operation loads the requested game (or the latest
//! one), asks the engine if needed, and returns a report.

mod reports;

pub use reports::{
    Alternative, AnalysisReport, BoardStateReport, Candidate, EvaluationReport, FileEntry,
    FileListReport, Level, MoveEvaluation, RecommendationReport, SequenceMove, TerritoryReport,
    Verdict,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::engine::{AnalysisEngine, EngineError};
use crate::models::{AnalysisRequest, AnalysisResult, Color, GameState};
use crate::report::{
    board_to_ascii, format_analysis_result, format_ownership_map, move_history,
    render_board_state, render_evaluation, render_file_list, render_recommendation,
    render_territory, stone_list, LIKELY_OWNERSHIP,
};
use crate::sgf::{GameLibrary, SgfError};
use crate::utils::{parse_move, ValidationError};

/// Moves listed by `board_state`
const RECENT_MOVES: usize = 10;

/// PV moves shown in a recommendation
const SEQUENCE_LEN: usize = 6;

/// Alternatives shown next to the recommended move
const ALTERNATIVES: usize = 2;

/// Errors from the coaching operations
#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    #[error(transparent)]
    Sgf(#[from] SgfError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Point {0} is already occupied")]
    OccupiedPoint(String),
}

impl CoachError {
    /// Message for the user, prefixed with what was being attempted.
    ///
    /// Missing games are reported as is; engine errors carry their remedy.
    pub fn describe(&self, action: &str) -> String {
        match self {
            CoachError::Sgf(SgfError::NoGames(_) | SgfError::NotFound(_)) => self.to_string(),
            CoachError::Engine(e) => format!("Error {}: {}", action, e.with_hint()),
            _ => format!("Error {}: {}", action, self),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Coach {
    config: Arc<Config>,
    library: GameLibrary,
    engine: Arc<dyn AnalysisEngine>,
}

impl Coach {
    pub fn new(config: Config, engine: Arc<dyn AnalysisEngine>) -> Self {
        let library = config.library();
        Self {
            config: Arc::new(config),
            library,
            engine,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn library(&self) -> &GameLibrary {
        &self.library
    }

    pub fn engine(&self) -> &Arc<dyn AnalysisEngine> {
        &self.engine
    }

    /// Stop the engine
    pub async fn shutdown(&self) {
        self.engine.shutdown().await;
    }

    fn load(&self, sgf_path: Option<&str>) -> Result<(GameState, PathBuf), CoachError> {
        let (state, path) = self.library.load(sgf_path, &self.config.game_defaults())?;
        debug!(
            "Loaded {} ({}x{}, {} moves)",
            path.display(),
            state.board_size,
            state.board_size,
            state.move_count()
        );
        Ok((state, path))
    }

    fn request(&self, state: GameState) -> AnalysisRequest {
        AnalysisRequest::new(state)
            .max_visits(self.config.analysis.visits)
            .pv_len(self.config.analysis.pv_len)
    }

    async fn run(&self, request: AnalysisRequest) -> Result<AnalysisResult, CoachError> {
        info!(
            "Analyzing move {} with {} visits",
            request.state.move_count(),
            request.max_visits
        );
        Ok(self.engine.analyze(&request).await?)
    }

    /// SGF files in the games directory, newest first
    pub fn list_files(&self) -> FileListReport {
        let all = self.library.list();
        let files = all
            .iter()
            .take(self.config.games.max_listed)
            .map(|f| FileEntry {
                relative_path: f.relative_path.clone(),
                path: f.path.display().to_string(),
                modified: f.modified.format("%Y-%m-%d %H:%M").to_string(),
            })
            .collect();

        let mut report = FileListReport {
            directory: self.library.root().display().to_string(),
            total: all.len(),
            files,
            text: String::new(),
        };
        report.text = render_file_list(&report);
        report
    }

    /// Board diagram, game information and recent moves
    pub fn board_state(&self, sgf_path: Option<&str>) -> Result<BoardStateReport, CoachError> {
        let (state, path) = self.load(sgf_path)?;

        let mut report = BoardStateReport {
            file: file_name(&path),
            path: path.display().to_string(),
            info: state.info(),
            black_captures: state.black_captures,
            white_captures: state.white_captures,
            board: board_to_ascii(&state),
            black_stones: stone_list(&state, Color::Black),
            white_stones: stone_list(&state, Color::White),
            recent_moves: move_history(&state, RECENT_MOVES),
            text: String::new(),
        };
        report.text = render_board_state(&report);
        Ok(report)
    }

    /// Full analysis of the current position
    pub async fn analyze(
        &self,
        sgf_path: Option<&str>,
        max_visits: Option<u32>,
    ) -> Result<AnalysisReport, CoachError> {
        let (state, path) = self.load(sgf_path)?;
        let include_ownership = self.config.analysis.include_ownership;
        let request = self
            .request(state.clone())
            .max_visits(max_visits.unwrap_or(self.config.analysis.visits))
            .include_ownership(include_ownership);
        let result = self.run(request).await?;

        let top_n = self.config.analysis.max_variations;
        let ownership_map = match (&result.ownership, include_ownership) {
            (Some(own), true) => Some(format_ownership_map(own, state.board_size)),
            _ => None,
        };

        let mut text = format_analysis_result(&result, &state, top_n);
        if let Some(map) = &ownership_map {
            text.push('\n');
            text.push_str(map);
        }

        Ok(AnalysisReport {
            file: file_name(&path),
            move_number: state.move_count(),
            current_player: result.current_player.name().to_string(),
            black_winrate: result.black_winrate() * 100.0,
            score_for_black: result.score_for_black(),
            visits: result.root_visits,
            top_moves: result
                .move_infos
                .iter()
                .take(top_n)
                .enumerate()
                .map(|(i, mi)| Candidate::from_info(i + 1, mi))
                .collect(),
            ownership_map,
            text,
        })
    }

    /// Best move with an explanation pitched at `level`
    pub async fn recommend(
        &self,
        level: Level,
        sgf_path: Option<&str>,
    ) -> Result<RecommendationReport, CoachError> {
        let (state, _) = self.load(sgf_path)?;
        let result = self.run(self.request(state)).await?;

        let current = result.current_player;
        let winrate = result.root_winrate * 100.0;
        let mut report = RecommendationReport {
            current_player: current.name().to_string(),
            level,
            winrate,
            assessment: None,
            best: None,
            sequence: Vec::new(),
            alternatives: Vec::new(),
            tip: None,
            text: String::new(),
        };

        if let Some(best) = result.best_move() {
            let assessment = if winrate > 55.0 {
                "You're in a good position!"
            } else if winrate < 45.0 {
                "The position is difficult, but there's still hope."
            } else {
                "The game is close."
            };
            report.assessment = Some(assessment.to_string());
            report.best = Some(Candidate::from_info(1, best));
            report.sequence = best
                .pv
                .iter()
                .take(SEQUENCE_LEN)
                .enumerate()
                .map(|(i, mv)| SequenceMove {
                    player: (if i % 2 == 0 { current } else { current.opponent() })
                        .name()
                        .to_string(),
                    mv: mv.clone(),
                })
                .collect();
            report.alternatives = result
                .move_infos
                .iter()
                .skip(1)
                .take(ALTERNATIVES)
                .map(|mi| Alternative {
                    mv: mi.mv.clone(),
                    winrate: mi.winrate * 100.0,
                    winrate_diff: (mi.winrate - best.winrate) * 100.0,
                })
                .collect();
            report.tip = Some(level.tip().to_string());
        }

        report.text = render_recommendation(&report);
        Ok(report)
    }

    /// Score estimate and territory map
    pub async fn territory(&self, sgf_path: Option<&str>) -> Result<TerritoryReport, CoachError> {
        let (state, _) = self.load(sgf_path)?;
        let size = state.board_size;
        let move_number = state.move_count();
        let result = self
            .run(self.request(state).include_ownership(true))
            .await?;

        let ownership = result
            .ownership
            .as_deref()
            .filter(|own| own.len() == size * size);
        let count = |pred: fn(f64) -> bool| {
            ownership.map_or(0, |own| own.iter().filter(|v| pred(**v)).count())
        };

        let mut report = TerritoryReport {
            move_number,
            score_for_black: result.score_for_black(),
            black_points: count(|v| v > LIKELY_OWNERSHIP),
            white_points: count(|v| v < -LIKELY_OWNERSHIP),
            ownership_map: ownership.map(|own| format_ownership_map(own, size)),
            text: String::new(),
        };
        report.text = render_territory(&report);
        Ok(report)
    }

    /// Compare a move against the engine's choices
    pub async fn evaluate(
        &self,
        mv: &str,
        sgf_path: Option<&str>,
    ) -> Result<EvaluationReport, CoachError> {
        let (state, _) = self.load(sgf_path)?;
        let vertex = mv.trim().to_uppercase();

        if let Some(point) = parse_move(&vertex, state.board_size)? {
            if state.stone_at(point).is_some() {
                return Err(CoachError::OccupiedPoint(vertex));
            }
        }

        let result = self
            .run(self.request(state.clone()).include_ownership(false))
            .await?;

        let best = result.best_move().cloned();
        let considered = result.move_infos.len();

        let mut evaluation = result.find_move(&vertex).map(|(rank, info)| {
            (Some(rank), info.winrate, info.score_lead)
        });

        if evaluation.is_none() && self.config.analysis.deep_evaluate {
            debug!("{} not among the candidates, searching it separately", vertex);
            let forced = self
                .run(
                    self.request(state)
                        .include_ownership(false)
                        .allow_moves(vec![vertex.clone()]),
                )
                .await?;
            evaluation = forced
                .find_move(&vertex)
                .map(|(_, info)| (None, info.winrate, info.score_lead));
        }

        let evaluation = evaluation.map(|(rank, winrate, score_lead)| {
            let winrate_diff = best.as_ref().map(|b| (winrate - b.winrate) * 100.0);
            MoveEvaluation {
                rank,
                considered,
                winrate: winrate * 100.0,
                score_lead,
                winrate_diff,
                score_diff: best.as_ref().map(|b| score_lead - b.score_lead),
                verdict: winrate_diff.map(Verdict::from_winrate_diff),
            }
        });

        let mut report = EvaluationReport {
            mv: vertex,
            current_player: result.current_player.name().to_string(),
            best: best.as_ref().map(|b| Candidate::from_info(1, b)),
            evaluation,
            text: String::new(),
        };
        report.text = render_evaluation(&report);
        Ok(report)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
