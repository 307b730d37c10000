//! Analysis protocol messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::EngineError;
use crate::models::{AnalysisRequest, AnalysisResult, GameState, MoveInfo, Perspective};

/// One analysis query, serialized as a single JSON line
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineQuery {
    pub id: String,
    pub moves: Vec<[String; 2]>,
    pub initial_stones: Vec<[String; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_player: Option<String>,
    pub rules: String,
    pub komi: f64,
    pub board_x_size: usize,
    pub board_y_size: usize,
    pub analyze_turns: Vec<usize>,
    pub max_visits: u32,
    #[serde(rename = "analysisPVLen")]
    pub analysis_pv_len: u32,
    pub include_ownership: bool,
    pub include_policy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_moves: Option<Vec<AllowMoves>>,
}

/// Restrict the search for one player to the listed moves
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowMoves {
    pub player: String,
    pub moves: Vec<String>,
    pub until_depth: u32,
}

/// Build the query for the final position of a game
pub fn build_query(request: &AnalysisRequest) -> EngineQuery {
    let state = &request.state;
    let size = state.board_size;

    let moves = state
        .moves
        .iter()
        .map(|mv| [mv.color.letter().to_string(), mv.vertex(size)])
        .collect::<Vec<_>>();

    let initial_stones = state
        .initial_stones
        .iter()
        .map(|(color, point)| [color.letter().to_string(), point.to_gtp(size)])
        .collect();

    let initial_player = if state.moves.is_empty() {
        state.initial_player.map(|c| c.letter().to_string())
    } else {
        None
    };

    let allow_moves = request.allow_moves.as_ref().map(|allowed| {
        vec![AllowMoves {
            player: state.current_player.letter().to_string(),
            moves: allowed.clone(),
            until_depth: 1,
        }]
    });

    EngineQuery {
        id: Uuid::new_v4().to_string(),
        analyze_turns: vec![moves.len()],
        moves,
        initial_stones,
        initial_player,
        rules: state.rules.as_str().to_string(),
        komi: state.komi,
        board_x_size: size,
        board_y_size: size,
        max_visits: request.max_visits,
        analysis_pv_len: request.pv_len,
        include_ownership: request.include_ownership,
        include_policy: request.include_policy,
        allow_moves,
    }
}

fn half() -> f64 {
    0.5
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    #[serde(default)]
    id: String,
    error: Option<String>,
    field: Option<String>,
    turn_number: Option<usize>,
    #[serde(default)]
    move_infos: Vec<RawMoveInfo>,
    root_info: Option<RawRootInfo>,
    ownership: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMoveInfo {
    #[serde(rename = "move", default)]
    mv: String,
    #[serde(default)]
    visits: u64,
    #[serde(default = "half")]
    winrate: f64,
    #[serde(default)]
    score_lead: f64,
    #[serde(default)]
    pv: Vec<String>,
    #[serde(default)]
    prior: f64,
    #[serde(default)]
    utility: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRootInfo {
    #[serde(default = "half")]
    winrate: f64,
    #[serde(default)]
    score_lead: f64,
    #[serde(default)]
    visits: u64,
}

/// Interpret a response line for the given position
///
/// Values are converted so win rates and scores are for the side to move
/// and ownership is positive for Black, whatever `perspective` the engine
/// was configured to report in.
pub fn parse_response(
    value: Value,
    state: &GameState,
    perspective: Perspective,
) -> Result<AnalysisResult, EngineError> {
    let raw: RawResponse = serde_json::from_value(value.clone())
        .map_err(|e| EngineError::Protocol(format!("unexpected response shape: {}", e)))?;

    if let Some(message) = raw.error {
        return Err(EngineError::Query {
            id: raw.id,
            message,
            field: raw.field,
        });
    }

    let to_move = state.current_player;
    let flip = perspective.flips_for(to_move);
    let winrate = |w: f64| if flip { 1.0 - w } else { w };
    let score = |s: f64| if flip { -s } else { s };

    let move_infos = raw
        .move_infos
        .into_iter()
        .map(|mi| MoveInfo {
            mv: mi.mv,
            visits: mi.visits,
            winrate: winrate(mi.winrate),
            score_lead: score(mi.score_lead),
            pv: mi.pv,
            prior: mi.prior,
            utility: mi.utility,
        })
        .collect();

    let (root_winrate, root_score_lead, root_visits) = match raw.root_info {
        Some(root) => (winrate(root.winrate), score(root.score_lead), root.visits),
        None => (0.5, 0.0, 0),
    };

    let sign = perspective.ownership_sign(to_move);
    let ownership = raw
        .ownership
        .map(|own| own.into_iter().map(|v| v * sign).collect());

    let mut result = AnalysisResult {
        id: raw.id,
        turn_number: raw.turn_number.unwrap_or(state.moves.len()),
        current_player: to_move,
        root_winrate,
        root_score_lead,
        root_visits,
        move_infos,
        ownership,
        raw_response: Some(value),
    };
    result.sort_moves();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Color, Move, Point, Rules};
    use serde_json::json;

    fn game() -> GameState {
        let mut state = GameState::new(19);
        state.komi = 6.5;
        state.rules = Rules::Japanese;
        state.initial_stones = vec![(Color::Black, Point::new(3, 3))];
        state.moves = vec![
            Move::play(Color::White, Point::new(3, 15)),
            Move::pass(Color::Black),
        ];
        state.update_current_player();
        state
    }

    #[test]
    fn test_query_wire_format() {
        let request = AnalysisRequest::new(game()).max_visits(200).pv_len(8);
        let query = build_query(&request);
        let wire = serde_json::to_value(&query).unwrap();

        assert_eq!(wire["moves"], json!([["W", "Q16"], ["B", "pass"]]));
        assert_eq!(wire["initialStones"], json!([["B", "D16"]]));
        assert_eq!(wire["rules"], "japanese");
        assert_eq!(wire["komi"], 6.5);
        assert_eq!(wire["boardXSize"], 19);
        assert_eq!(wire["boardYSize"], 19);
        assert_eq!(wire["analyzeTurns"], json!([2]));
        assert_eq!(wire["maxVisits"], 200);
        assert_eq!(wire["analysisPVLen"], 8);
        assert_eq!(wire["includeOwnership"], true);
        assert_eq!(wire["includePolicy"], false);
        assert!(wire.get("initialPlayer").is_none());
        assert!(wire.get("allowMoves").is_none());
        assert!(Uuid::parse_str(wire["id"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_query_ids_are_unique() {
        let request = AnalysisRequest::new(game());
        assert_ne!(build_query(&request).id, build_query(&request).id);
    }

    #[test]
    fn test_initial_player_and_allow_moves() {
        let mut state = GameState::new(9);
        state.initial_player = Some(Color::White);
        state.update_current_player();

        let request = AnalysisRequest::new(state).allow_moves(vec!["E5".to_string()]);
        let wire = serde_json::to_value(build_query(&request)).unwrap();
        assert_eq!(wire["initialPlayer"], "W");
        assert_eq!(wire["analyzeTurns"], json!([0]));
        assert_eq!(
            wire["allowMoves"],
            json!([{"player": "W", "moves": ["E5"], "untilDepth": 1}])
        );
    }

    fn response() -> Value {
        json!({
            "id": "abc",
            "turnNumber": 2,
            "isDuringSearch": false,
            "moveInfos": [
                {"move": "D4", "visits": 20, "winrate": 0.40, "scoreLead": -1.0, "pv": ["D4", "Q4"], "order": 1},
                {"move": "Q4", "visits": 80, "winrate": 0.45, "scoreLead": -0.5, "pv": ["Q4"], "prior": 0.3, "order": 0}
            ],
            "rootInfo": {"winrate": 0.44, "scoreLead": -0.6, "visits": 100, "currentPlayer": "W"},
            "ownership": [0.9, -0.8, 0.0, 0.1]
        })
    }

    #[test]
    fn test_parse_side_to_move_response() {
        let state = game();
        assert_eq!(state.current_player, Color::White);
        let result = parse_response(response(), &state, Perspective::SideToMove).unwrap();

        assert_eq!(result.id, "abc");
        assert_eq!(result.turn_number, 2);
        assert_eq!(result.current_player, Color::White);
        assert_eq!(result.root_visits, 100);
        assert!((result.root_winrate - 0.44).abs() < 1e-9);
        assert_eq!(result.best_move().unwrap().mv, "Q4");
        assert!((result.move_infos[0].prior - 0.3).abs() < 1e-9);
        // White to move: side-to-move ownership is negated to make Black positive
        assert_eq!(result.ownership, Some(vec![-0.9, 0.8, -0.0, -0.1]));
        assert!(result.raw_response.is_some());
    }

    #[test]
    fn test_parse_black_perspective_response() {
        let state = game();
        let result = parse_response(response(), &state, Perspective::Black).unwrap();

        // Reported for Black, converted to White (the side to move)
        assert!((result.root_winrate - 0.56).abs() < 1e-9);
        assert!((result.root_score_lead - 0.6).abs() < 1e-9);
        assert!((result.best_move().unwrap().winrate - 0.55).abs() < 1e-9);
        assert_eq!(result.ownership, Some(vec![0.9, -0.8, 0.0, 0.1]));
    }

    #[test]
    fn test_parse_error_response() {
        let line = json!({"id": "bad", "error": "Illegal move", "field": "moves"});
        match parse_response(line, &game(), Perspective::SideToMove) {
            Err(EngineError::Query { id, message, field }) => {
                assert_eq!(id, "bad");
                assert_eq!(message, "Illegal move");
                assert_eq!(field.as_deref(), Some("moves"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_minimal_response_uses_defaults() {
        let state = game();
        let result = parse_response(json!({"id": "x"}), &state, Perspective::SideToMove).unwrap();
        assert_eq!(result.turn_number, 2);
        assert_eq!(result.root_winrate, 0.5);
        assert!(result.move_infos.is_empty());
        assert!(result.ownership.is_none());

        assert!(matches!(
            parse_response(json!({"id": "x", "moveInfos": 3}), &state, Perspective::SideToMove),
            Err(EngineError::Protocol(_))
        ));
    }
}
