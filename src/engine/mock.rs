//! Mock engine for testing purposes.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{AnalysisEngine, EngineError};
use crate::models::{AnalysisRequest, AnalysisResult};

/// An engine that returns predefined results and records the requests it saw.
#[derive(Debug, Default)]
pub struct MockEngine {
    queued: Mutex<VecDeque<Result<AnalysisResult, EngineError>>>,
    fallback: Mutex<Option<AnalysisResult>>,
    requests: Mutex<Vec<AnalysisRequest>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that answers every query with `result`
    pub fn with_result(result: AnalysisResult) -> Self {
        let mock = Self::new();
        mock.set_result(result);
        mock
    }

    /// Set the result returned when nothing is queued
    pub fn set_result(&self, result: AnalysisResult) {
        *self.fallback.lock().unwrap_or_else(|e| e.into_inner()) = Some(result);
    }

    /// Queue a one-shot outcome, answered before the fallback
    pub fn push(&self, outcome: Result<AnalysisResult, EngineError>) {
        self.queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl AnalysisEngine for MockEngine {
    fn name(&self) -> &str {
        "Mock Engine"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, EngineError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let queued = self
            .queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        if let Some(outcome) = queued {
            return outcome;
        }

        let fallback = self
            .fallback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match fallback {
            Some(mut result) => {
                result.turn_number = request.state.move_count();
                result.current_player = request.state.current_player;
                Ok(result)
            }
            None => Err(EngineError::Protocol("no mock result configured".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Color, GameState};

    fn result() -> AnalysisResult {
        AnalysisResult {
            id: "mock".into(),
            turn_number: 0,
            current_player: Color::Black,
            root_winrate: 0.5,
            root_score_lead: 0.0,
            root_visits: 1,
            move_infos: Vec::new(),
            ownership: None,
            raw_response: None,
        }
    }

    #[tokio::test]
    async fn test_queue_then_fallback() {
        let mock = MockEngine::new();
        let request = AnalysisRequest::new(GameState::new(9));
        assert!(mock.analyze(&request).await.is_err());

        mock.set_result(result());
        mock.push(Err(EngineError::Protocol("first".into())));
        assert!(matches!(
            mock.analyze(&request).await,
            Err(EngineError::Protocol(msg)) if msg == "first"
        ));
        assert_eq!(mock.analyze(&request).await.unwrap().id, "mock");
        assert_eq!(mock.requests().len(), 3);
    }

    #[test]
    fn test_fallback_follows_request_position() {
        let mock = MockEngine::with_result(result());
        let mut state = GameState::new(9);
        state.current_player = Color::White;

        let answered = tokio_test::block_on(mock.analyze(&AnalysisRequest::new(state)));
        assert_eq!(answered.unwrap().current_player, Color::White);
    }
}
