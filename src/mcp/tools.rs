//! Tool registry for MCP tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use super::handlers::{
    AnalyzePositionHandler, EvaluateMoveHandler, GetBoardStateHandler,
    GetMoveRecommendationHandler, GetTerritoryAnalysisHandler, ListSgfFilesHandler,
};
use crate::coach::Coach;

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "analyze_position")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: serde_json::Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

fn sgf_path_schema() -> Value {
    serde_json::json!({
        "type": "string",
        "description": "Path to a specific SGF file, absolute or relative to the games directory. Defaults to the most recently modified game."
    })
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a registry with every coaching tool bound to `coach`
    pub fn new(coach: Arc<Coach>) -> Self {
        let mut registry = Self {
            tools: BTreeMap::new(),
        };
        registry.register_coaching_tools(&coach);
        registry
    }

    fn register_coaching_tools(&mut self, coach: &Arc<Coach>) {
        let default_visits = coach.config().analysis.visits;

        self.register(Tool {
            name: "list_sgf_files".to_string(),
            description: "List available SGF files in the games directory, most recently modified first.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(ListSgfFilesHandler {
                coach: coach.clone(),
            }),
        });

        self.register(Tool {
            name: "get_board_state".to_string(),
            description: "Get the current board state of a Go game: board diagram, stone positions, recent moves and game information.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "sgf_path": sgf_path_schema()
                }
            }),
            handler: Arc::new(GetBoardStateHandler {
                coach: coach.clone(),
            }),
        });

        self.register(Tool {
            name: "analyze_position".to_string(),
            description: "Run KataGo analysis on the current position. Returns win rate, score estimate and the top recommended moves with their variations.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "max_visits": {
                        "type": "integer",
                        "description": "Analysis depth (more visits = stronger analysis, slower)",
                        "minimum": 1,
                        "default": default_visits
                    },
                    "sgf_path": sgf_path_schema()
                }
            }),
            handler: Arc::new(AnalyzePositionHandler {
                coach: coach.clone(),
            }),
        });

        self.register(Tool {
            name: "get_move_recommendation".to_string(),
            description: "Get the best move with an explanation suited to the player's level.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "explain_for_level": {
                        "type": "string",
                        "description": "Player level the explanation is written for",
                        "enum": ["beginner", "intermediate", "advanced"],
                        "default": "intermediate"
                    },
                    "sgf_path": sgf_path_schema()
                }
            }),
            handler: Arc::new(GetMoveRecommendationHandler {
                coach: coach.clone(),
            }),
        });

        self.register(Tool {
            name: "get_territory_analysis".to_string(),
            description: "Estimate the score and show which areas of the board each player controls.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "sgf_path": sgf_path_schema()
                }
            }),
            handler: Arc::new(GetTerritoryAnalysisHandler {
                coach: coach.clone(),
            }),
        });

        self.register(Tool {
            name: "evaluate_move".to_string(),
            description: "Evaluate a specific move against KataGo's top recommendations.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "move": {
                        "type": "string",
                        "description": "Move in GTP format, e.g. 'Q16', 'D4' or 'pass'"
                    },
                    "sgf_path": sgf_path_schema()
                },
                "required": ["move"]
            }),
            handler: Arc::new(EvaluateMoveHandler {
                coach: coach.clone(),
            }),
        });
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools, ordered by name
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Tool names, ordered
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tool.handler.execute(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::{EngineError, MockEngine};
    use crate::models::{AnalysisResult, Color, MoveInfo};
    use serde_json::json;
    use tempfile::TempDir;

    fn mock_result() -> AnalysisResult {
        AnalysisResult {
            id: "mock".into(),
            turn_number: 0,
            current_player: Color::Black,
            root_winrate: 0.5,
            root_score_lead: 0.0,
            root_visits: 10,
            move_infos: vec![MoveInfo {
                mv: "E5".into(),
                visits: 10,
                winrate: 0.5,
                score_lead: 0.0,
                pv: vec!["E5".into()],
                prior: 0.2,
                utility: 0.0,
            }],
            ownership: None,
            raw_response: None,
        }
    }

    fn registry(mock: Arc<MockEngine>) -> (TempDir, ToolRegistry) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.sgf"), "(;SZ[9];B[cc])").unwrap();
        let mut config = Config::default();
        config.games.watch_path = dir.path().to_path_buf();
        config.analysis.visits = 25;
        let coach = Arc::new(Coach::new(config, mock));
        (dir, ToolRegistry::new(coach))
    }

    #[test]
    fn test_registry_has_six_tools() {
        let (_dir, registry) = registry(Arc::new(MockEngine::new()));
        assert_eq!(
            registry.names(),
            vec![
                "analyze_position",
                "evaluate_move",
                "get_board_state",
                "get_move_recommendation",
                "get_territory_analysis",
                "list_sgf_files",
            ]
        );

        let analyze = registry.get("analyze_position").unwrap();
        assert_eq!(analyze.input_schema["properties"]["max_visits"]["default"], 25);
        let evaluate = registry.get("evaluate_move").unwrap();
        assert_eq!(evaluate.input_schema["required"], json!(["move"]));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (_dir, registry) = registry(Arc::new(MockEngine::new()));
        let err = registry.execute("resign_game", json!({})).await.unwrap_err();
        assert_eq!(err, "Tool 'resign_game' not found");
    }

    #[tokio::test]
    async fn test_list_and_board_tools() {
        let (_dir, registry) = registry(Arc::new(MockEngine::new()));

        let files = registry.execute("list_sgf_files", json!({})).await.unwrap();
        assert_eq!(files["total"], 1);
        assert_eq!(files["files"][0]["relative_path"], "a.sgf");

        let board = registry
            .execute("get_board_state", json!({ "sgf_path": "a.sgf" }))
            .await
            .unwrap();
        assert_eq!(board["black_stones"], json!(["C7"]));
        assert!(board["text"].as_str().unwrap().contains("Turn: White to play"));
    }

    #[tokio::test]
    async fn test_analyze_arguments() {
        let mock = Arc::new(MockEngine::with_result(mock_result()));
        let (_dir, registry) = registry(mock.clone());

        registry
            .execute("analyze_position", json!({ "max_visits": 7 }))
            .await
            .unwrap();
        registry.execute("analyze_position", json!({})).await.unwrap();
        let requests = mock.requests();
        assert_eq!(requests[0].max_visits, 7);
        assert_eq!(requests[1].max_visits, 25);

        let err = registry
            .execute("analyze_position", json!({ "max_visits": 0 }))
            .await
            .unwrap_err();
        assert!(err.contains("at least 1"));

        for bad in [json!("200"), json!(150.5), json!(-3)] {
            let err = registry
                .execute("analyze_position", json!({ "max_visits": bad }))
                .await
                .unwrap_err();
            assert!(err.starts_with("Invalid 'max_visits'"), "{}", err);
        }
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_recommendation_level() {
        let mock = Arc::new(MockEngine::with_result(mock_result()));
        let (_dir, registry) = registry(mock);

        let value = registry
            .execute(
                "get_move_recommendation",
                json!({ "explain_for_level": "BEGINNER" }),
            )
            .await
            .unwrap();
        assert_eq!(value["level"], "beginner");

        let value = registry
            .execute("get_move_recommendation", json!({}))
            .await
            .unwrap();
        assert_eq!(value["level"], "intermediate");
    }

    #[tokio::test]
    async fn test_evaluate_requires_move() {
        let (_dir, registry) = registry(Arc::new(MockEngine::new()));
        let err = registry.execute("evaluate_move", json!({})).await.unwrap_err();
        assert_eq!(err, "Missing 'move' parameter");

        let err = registry
            .execute("evaluate_move", json!({ "move": "C7" }))
            .await
            .unwrap_err();
        assert_eq!(err, "Error evaluating move: Point C7 is already occupied");
    }

    #[tokio::test]
    async fn test_engine_errors_carry_hint() {
        let mock = Arc::new(MockEngine::new());
        mock.push(Err(EngineError::ProcessDied {
            stderr: "CUDA error".into(),
        }));
        let (_dir, registry) = registry(mock);

        let err = registry
            .execute("get_territory_analysis", json!({}))
            .await
            .unwrap_err();
        assert!(err.starts_with("Error analyzing territory: KataGo process exited"));
        assert!(err.contains("CUDA error"));
        assert!(err.contains("Hint:"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let (_dir, registry) = registry(Arc::new(MockEngine::new()));
        let err = registry
            .execute("get_board_state", json!({ "sgf_path": "missing.sgf" }))
            .await
            .unwrap_err();
        assert!(err.contains("missing.sgf"));
        assert!(!err.starts_with("Error"));
    }
}
