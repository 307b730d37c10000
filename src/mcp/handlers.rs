//! Tool handlers, one per coaching operation.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::tools::ToolHandler;
use crate::coach::{Coach, CoachError, Level};

/// Optional `sgf_path` argument; blank counts as absent
fn sgf_path(args: &Value) -> Option<&str> {
    args.get("sgf_path")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn to_value<T: Serialize>(report: &T) -> Result<Value, String> {
    serde_json::to_value(report).map_err(|e| format!("Failed to serialize report: {}", e))
}

fn respond<T: Serialize>(outcome: Result<T, CoachError>, action: &str) -> Result<Value, String> {
    match outcome {
        Ok(report) => to_value(&report),
        Err(e) => {
            tracing::warn!("Tool failed while {}: {}", action, e);
            Err(e.describe(action))
        }
    }
}

/// Handler for listing the SGF files in the games directory
#[derive(Debug)]
pub struct ListSgfFilesHandler {
    pub coach: Arc<Coach>,
}

#[async_trait::async_trait]
impl ToolHandler for ListSgfFilesHandler {
    async fn execute(&self, _args: Value) -> Result<Value, String> {
        to_value(&self.coach.list_files())
    }
}

/// Handler for showing the board of a game
#[derive(Debug)]
pub struct GetBoardStateHandler {
    pub coach: Arc<Coach>,
}

#[async_trait::async_trait]
impl ToolHandler for GetBoardStateHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        respond(
            self.coach.board_state(sgf_path(&args)),
            "reading game state",
        )
    }
}

/// Handler for a full position analysis
#[derive(Debug)]
pub struct AnalyzePositionHandler {
    pub coach: Arc<Coach>,
}

/// Optional positive visit count; anything but a whole number is rejected
fn max_visits(args: &Value) -> Result<Option<u32>, String> {
    match args.get("max_visits") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match value.as_u64() {
            Some(0) => Err("'max_visits' must be at least 1".to_string()),
            Some(n) => Ok(Some(u32::try_from(n).unwrap_or(u32::MAX))),
            None => Err(format!(
                "Invalid 'max_visits': expected a positive integer, got {}",
                value
            )),
        },
    }
}

#[async_trait::async_trait]
impl ToolHandler for AnalyzePositionHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let max_visits = max_visits(&args)?;

        respond(
            self.coach.analyze(sgf_path(&args), max_visits).await,
            "analyzing position",
        )
    }
}

/// Handler for a move recommendation
#[derive(Debug)]
pub struct GetMoveRecommendationHandler {
    pub coach: Arc<Coach>,
}

#[async_trait::async_trait]
impl ToolHandler for GetMoveRecommendationHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let level = args
            .get("explain_for_level")
            .and_then(|v| v.as_str())
            .map(Level::parse)
            .unwrap_or_default();

        respond(
            self.coach.recommend(level, sgf_path(&args)).await,
            "getting recommendation",
        )
    }
}

/// Handler for the territory estimate
#[derive(Debug)]
pub struct GetTerritoryAnalysisHandler {
    pub coach: Arc<Coach>,
}

#[async_trait::async_trait]
impl ToolHandler for GetTerritoryAnalysisHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        respond(
            self.coach.territory(sgf_path(&args)).await,
            "analyzing territory",
        )
    }
}

/// Handler for judging a single move
#[derive(Debug)]
pub struct EvaluateMoveHandler {
    pub coach: Arc<Coach>,
}

#[async_trait::async_trait]
impl ToolHandler for EvaluateMoveHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let mv = args
            .get("move")
            .and_then(|v| v.as_str())
            .ok_or("Missing 'move' parameter")?;

        respond(
            self.coach.evaluate(mv, sgf_path(&args)).await,
            "evaluating move",
        )
    }
}
