//! # KataGo MCP
//!
//! A Model Context Protocol (MCP) server that lets an AI assistant coach Go
//! games using the KataGo analysis engine.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (GameState, AnalysisRequest, AnalysisResult)
//! - [`sgf`]: SGF parsing, board replay and the games directory
//! - [`engine`]: The KataGo subprocess client and its analysis protocol
//! - [`report`]: Plain-text boards and analysis summaries
//! - [`coach`]: The coaching operations behind each tool
//! - [`mcp`]: MCP protocol implementation and server
//! - [`doctor`]: Installation checks
//! - [`config`]: Configuration management

pub mod coach;
pub mod config;
pub mod doctor;
pub mod engine;
pub mod mcp;
pub mod models;
pub mod report;
pub mod sgf;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use coach::{Coach, CoachError};
pub use engine::{AnalysisEngine, EngineError, KataGoClient};
pub use models::{AnalysisRequest, AnalysisResult, GameState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
