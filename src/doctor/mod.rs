//! Installation checks run by `katago-mcp doctor`.
//!
//! Walks through what an operator would verify by hand: the configured
//! paths, the engine config, the newest game record and whether the engine
//! starts at all. Finally every tool is run once against the newest game,
//! so a wrong model, config or perspective shows up here rather than in a
//! conversation.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};

use crate::coach::Coach;
use crate::config::Config;
use crate::engine::{engine_version, locate_executable, EngineConfigFile, KataGoClient, KataGoSettings};
use crate::mcp::ToolRegistry;
use crate::sgf::{read_sgf_file, GameLibrary, SgfError};
use crate::ui::{section_header, status_line, Status};

/// Time allowed for `katago version`
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Visits for the tool run; enough to get candidates, quick on any hardware
const TOOL_RUN_VISITS: u32 = 20;

/// Tools that need an answer from the engine
const ENGINE_TOOLS: [&str; 4] = [
    "analyze_position",
    "get_move_recommendation",
    "get_territory_analysis",
    "evaluate_move",
];

#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub status: Status,
    pub message: String,
    /// Further explanation or remedy, printed indented
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl Check {
    fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: Vec::new(),
        }
    }

    fn detail(mut self, line: impl Into<String>) -> Self {
        self.details.push(line.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub title: String,
    pub checks: Vec<Check>,
}

impl Section {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            checks: Vec::new(),
        }
    }

    fn push(&mut self, check: Check) {
        self.checks.push(check);
    }

    fn count(&self, status: Status) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    /// Append a "passed/total" line counting the checks above it
    fn with_summary(mut self) -> Self {
        let total = self.checks.len();
        let line = format!(
            "{}/{} tools passed, {} failed, {} skipped",
            self.count(Status::Success),
            total,
            self.count(Status::Error),
            self.count(Status::Skipped)
        );
        self.push(Check::new(Status::Info, line));
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    pub sections: Vec<Section>,
}

impl DoctorReport {
    fn count(&self, status: Status) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.checks)
            .filter(|c| c.status == status)
            .count()
    }

    pub fn failures(&self) -> usize {
        self.count(Status::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Status::Warning)
    }

    /// True when no check failed; warnings are allowed
    pub fn passed(&self) -> bool {
        self.failures() == 0
    }

    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }

    pub fn render(&self, color: bool) -> String {
        let mut lines = Vec::new();
        for section in &self.sections {
            lines.push(section_header(&section.title, color));
            for check in &section.checks {
                lines.push(format!("  {}", status_line(check.status, &check.message, color)));
                for detail in &check.details {
                    lines.push(format!("    {}", detail));
                }
            }
            lines.push(String::new());
        }

        let summary = if self.passed() {
            status_line(
                Status::Success,
                &format!("All checks passed ({} warnings)", self.warnings()),
                color,
            )
        } else {
            status_line(
                Status::Error,
                &format!(
                    "{} checks failed, {} warnings",
                    self.failures(),
                    self.warnings()
                ),
                color,
            )
        };
        lines.push(summary);
        lines.join("\n")
    }
}

/// Run every check
pub async fn run(config: &Config, skip_engine: bool) -> DoctorReport {
    let settings = KataGoSettings::from(&config.katago);

    let configuration = check_configuration(config, &settings);
    let engine_config = check_engine_config(&settings.config);
    let sgf_files = check_sgf_files(config);
    let engine = check_engine(&settings, skip_engine).await;
    let engine_ok = engine.checks.iter().any(|c| c.status == Status::Success);

    let coach = Arc::new(Coach::new(
        config.clone(),
        Arc::new(KataGoClient::new(settings)),
    ));
    let registry = ToolRegistry::new(coach.clone());
    let server = check_server(&registry);

    let tool_run = if skip_engine {
        let mut section = Section::new(TOOL_RUN);
        section.push(Check::new(Status::Skipped, "Tool run skipped"));
        section
    } else {
        check_tools(&registry, coach.library(), engine_ok).await
    };
    coach.shutdown().await;

    DoctorReport {
        sections: vec![configuration, engine_config, sgf_files, engine, server, tool_run],
    }
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

fn check_configuration(config: &Config, settings: &KataGoSettings) -> Section {
    let mut section = Section::new("Configuration");

    section.push(match locate_executable(&settings.executable) {
        Some(path) if is_executable(&path) => {
            Check::new(Status::Success, format!("KataGo found at: {}", path.display()))
        }
        Some(path) => Check::new(
            Status::Error,
            format!("KataGo is not executable: {}", path.display()),
        )
        .detail("Run `chmod +x` on the binary"),
        None => Check::new(
            Status::Error,
            format!("KataGo NOT found at: {}", settings.executable.display()),
        )
        .detail("Set KATAGO_PATH (katago.path) to the correct path"),
    });

    section.push(if settings.model.is_file() {
        Check::new(
            Status::Success,
            format!("Model found at: {}", settings.model.display()),
        )
    } else {
        Check::new(
            Status::Error,
            format!("Model NOT found at: {}", settings.model.display()),
        )
        .detail("Set KATAGO_MODEL (katago.model) to your model path")
    });

    section.push(if settings.config.is_file() {
        Check::new(
            Status::Success,
            format!("Config found at: {}", settings.config.display()),
        )
    } else {
        Check::new(
            Status::Warning,
            format!("Config NOT found at: {}", settings.config.display()),
        )
        .detail("The engine will not start without an analysis config. Set KATAGO_CONFIG (katago.config).")
    });

    let games = config.watch_path();
    section.push(if games.is_dir() {
        Check::new(
            Status::Success,
            format!("SGF directory exists: {}", games.display()),
        )
    } else {
        Check::new(
            Status::Error,
            format!("SGF directory NOT found: {}", games.display()),
        )
        .detail("Create the directory or set SGF_WATCH_PATH (games.watch_path)")
    });

    section
}

fn check_engine_config(path: &Path) -> Section {
    let mut section = Section::new("Engine Config");

    if !path.is_file() {
        section.push(Check::new(Status::Skipped, "No engine config to inspect"));
        return section;
    }

    let cfg = match EngineConfigFile::load(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            section.push(Check::new(
                Status::Error,
                format!("Could not read {}: {}", path.display(), e),
            ));
            return section;
        }
    };

    section.push(Check::new(
        Status::Success,
        format!("Parsed {} settings from {}", cfg.len(), path.display()),
    ));

    if cfg.looks_like_gtp_config() {
        section.push(
            Check::new(Status::Warning, "This looks like a GTP config, not an analysis config")
                .detail("Use analysis_example.cfg from the KataGo distribution as a starting point"),
        );
    }

    let show = |value: Option<String>| value.unwrap_or_else(|| "(not set)".to_string());
    section.push(Check::new(
        Status::Info,
        format!(
            "numAnalysisThreads: {}",
            show(cfg.num_analysis_threads().map(|v| v.to_string()))
        ),
    ));
    section.push(Check::new(
        Status::Info,
        format!("maxVisits: {}", show(cfg.max_visits().map(|v| v.to_string()))),
    ));
    section.push(Check::new(
        Status::Info,
        format!(
            "cudaDeviceToUse: {}",
            show(cfg.cuda_device().map(str::to_string))
        ),
    ));
    section.push(Check::new(
        Status::Info,
        format!(
            "Values reported from perspective: {}",
            cfg.report_perspective().as_str()
        ),
    ));

    section
}

fn check_sgf_files(config: &Config) -> Section {
    let mut section = Section::new("SGF Files");
    let library = config.library();

    if !library.exists() {
        section.push(Check::new(Status::Skipped, "SGF directory does not exist"));
        return section;
    }

    let latest = match library.latest() {
        Ok(file) => file,
        Err(SgfError::NoGames(dir)) => {
            section.push(
                Check::new(
                    Status::Warning,
                    format!("No SGF files found in {}", dir.display()),
                )
                .detail("Save a game from Sabaki to this directory to test"),
            );
            return section;
        }
        Err(e) => {
            section.push(Check::new(Status::Error, e.to_string()));
            return section;
        }
    };

    section.push(match read_sgf_file(&latest.path, &config.game_defaults()) {
        Ok(state) => {
            let info = state.info();
            Check::new(
                Status::Success,
                format!("Found SGF file: {}", latest.path.display()),
            )
            .detail(format!("Board size: {}x{}", info.board_size, info.board_size))
            .detail(format!("Moves: {}", info.move_count))
            .detail(format!(
                "Players: {} vs {}",
                info.black_player, info.white_player
            ))
        }
        Err(e) => Check::new(
            Status::Error,
            format!("Error reading {}: {}", latest.path.display(), e),
        ),
    });

    section
}

async fn check_engine(settings: &KataGoSettings, skip: bool) -> Section {
    let mut section = Section::new("KataGo");

    if skip {
        section.push(Check::new(Status::Skipped, "Engine check skipped"));
        return section;
    }
    if locate_executable(&settings.executable).is_none() {
        section.push(Check::new(
            Status::Warning,
            "Skipping KataGo test - executable not found",
        ));
        return section;
    }
    if !settings.model.is_file() {
        section.push(Check::new(
            Status::Warning,
            "Skipping KataGo test - model not found",
        ));
        return section;
    }

    section.push(match engine_version(&settings.executable, VERSION_TIMEOUT).await {
        Ok(output) => {
            let version = output.lines().next().unwrap_or("(no output)");
            Check::new(Status::Success, format!("KataGo version: {}", version))
        }
        Err(e) => {
            let check = Check::new(Status::Error, format!("KataGo failed: {}", e));
            match e.hint() {
                Some(hint) => check.detail(hint),
                None => check,
            }
        }
    });

    section
}

fn check_server(registry: &ToolRegistry) -> Section {
    let mut section = Section::new("MCP Server");
    let names = registry.names();

    section.push(
        Check::new(
            Status::Success,
            format!("{} tools registered", names.len()),
        )
        .detail(names.join(", ")),
    );
    section
}

const TOOL_RUN: &str = "Tool Run";

fn tool_passed(name: &str, output: &Value) -> Check {
    let first = output
        .get("text")
        .and_then(Value::as_str)
        .and_then(|text| text.lines().find(|l| !l.trim().is_empty()))
        .unwrap_or("");
    let check = Check::new(Status::Success, format!("{}: PASS", name));
    if first.is_empty() {
        check
    } else {
        check.detail(first)
    }
}

fn tool_failed(name: &str, error: &str) -> Check {
    error
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(4)
        .fold(
            Check::new(Status::Error, format!("{}: FAIL", name)),
            |check, line| check.detail(line),
        )
}

fn tool_skipped(name: &str, reason: &str) -> Check {
    Check::new(Status::Skipped, format!("{}: SKIP", name)).detail(reason)
}

/// Run each tool once on the newest game.
///
/// Tools that need the engine are skipped when it is unavailable, and
/// everything after `analyze_position` is skipped when that fails.
pub async fn check_tools(
    registry: &ToolRegistry,
    library: &GameLibrary,
    engine_ok: bool,
) -> Section {
    let mut section = Section::new(TOOL_RUN);

    let sgf_path = match library.latest() {
        Ok(file) => file.path.to_string_lossy().into_owned(),
        Err(_) => {
            section.push(Check::new(Status::Skipped, "No SGF file to run the tools on"));
            return section;
        }
    };
    let with_game = |mut args: Value| {
        args["sgf_path"] = json!(sgf_path);
        args
    };

    for name in ["list_sgf_files", "get_board_state"] {
        let args = if name == "list_sgf_files" {
            json!({})
        } else {
            with_game(json!({}))
        };
        section.push(match registry.execute(name, args).await {
            Ok(output) => tool_passed(name, &output),
            Err(e) => tool_failed(name, &e),
        });
    }

    if !engine_ok {
        for name in ENGINE_TOOLS {
            section.push(tool_skipped(name, "KataGo is not available"));
        }
        return section.with_summary();
    }

    tracing::info!("Running analysis tools on {}", sgf_path);
    let analysis = registry
        .execute(
            "analyze_position",
            with_game(json!({ "max_visits": TOOL_RUN_VISITS })),
        )
        .await;
    let best_move = match &analysis {
        Ok(output) => {
            section.push(tool_passed("analyze_position", output));
            output["top_moves"][0]["move"]
                .as_str()
                .unwrap_or("pass")
                .to_string()
        }
        Err(e) => {
            section.push(tool_failed("analyze_position", e));
            for name in &ENGINE_TOOLS[1..] {
                section.push(tool_skipped(name, "analyze_position failed"));
            }
            return section.with_summary();
        }
    };

    let remaining = [
        ("get_move_recommendation", with_game(json!({}))),
        ("get_territory_analysis", with_game(json!({}))),
        ("evaluate_move", with_game(json!({ "move": best_move }))),
    ];
    for (name, args) in remaining {
        section.push(match registry.execute(name, args).await {
            Ok(output) => tool_passed(name, &output),
            Err(e) => tool_failed(name, &e),
        });
    }

    section.with_summary()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use crate::models::{AnalysisResult, Color, MoveInfo};
    use tempfile::TempDir;

    #[cfg(unix)]
    const SCRIPTED_ENGINE: &str = r#"#!/bin/sh
if [ "$1" = "version" ]; then
  echo 'KataGo v1.15.3'
  exit 0
fi
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed 's/.*"id":"\([^"]*\)".*/\1/')
  printf '{"id":"%s","turnNumber":2,"moveInfos":[{"move":"M12","visits":40,"winrate":0.5,"scoreLead":0.5,"pv":["M12","C3"]}],"rootInfo":{"winrate":0.5,"scoreLead":0.5,"visits":40}}\n' "$id"
done
"#;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.katago.path = dir.join("katago");
        config.katago.model = dir.join("model.bin.gz");
        config.katago.config = dir.join("analysis.cfg");
        config.games.watch_path = dir.join("games");
        config
    }

    #[tokio::test]
    async fn test_missing_installation_fails() {
        let dir = TempDir::new().unwrap();
        let report = run(&config_in(dir.path()), false).await;

        assert!(!report.passed());
        assert_eq!(report.failures(), 3);

        let configuration = report.section("Configuration").unwrap();
        assert_eq!(configuration.checks[2].status, Status::Warning);

        let engine = report.section("KataGo").unwrap();
        assert_eq!(engine.checks[0].status, Status::Warning);
        assert!(engine.checks[0].message.contains("executable not found"));

        let rendered = report.render(false);
        assert!(rendered.contains("━━━ Configuration ━━━"));
        assert!(rendered.contains("✗ Model NOT found at:"));
        assert!(rendered.ends_with("3 checks failed, 2 warnings"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_complete_installation_passes() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("katago");
        std::fs::write(&exe, SCRIPTED_ENGINE).unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        std::fs::write(dir.path().join("model.bin.gz"), b"").unwrap();
        std::fs::write(
            dir.path().join("analysis.cfg"),
            "numAnalysisThreads = 4\nreportAnalysisWinratesAs = BLACK\n",
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("games")).unwrap();
        std::fs::write(
            dir.path().join("games/game.sgf"),
            "(;SZ[13]PB[Ann]PW[Bo];B[dd];W[jj])",
        )
        .unwrap();

        let report = run(&config_in(dir.path()), false).await;
        assert!(report.passed(), "{}", report.render(false));

        let engine_cfg = report.section("Engine Config").unwrap();
        let messages: Vec<&str> = engine_cfg.checks.iter().map(|c| c.message.as_str()).collect();
        assert!(messages.contains(&"numAnalysisThreads: 4"));
        assert!(messages.contains(&"maxVisits: (not set)"));
        assert!(messages.contains(&"Values reported from perspective: BLACK"));

        let sgf = report.section("SGF Files").unwrap();
        assert_eq!(sgf.checks[0].details[0], "Board size: 13x13");
        assert_eq!(sgf.checks[0].details[2], "Players: Ann vs Bo");

        let engine = report.section("KataGo").unwrap();
        assert_eq!(engine.checks[0].message, "KataGo version: KataGo v1.15.3");

        let server = report.section("MCP Server").unwrap();
        assert_eq!(server.checks[0].message, "6 tools registered");

        let tools = report.section("Tool Run").unwrap();
        let messages: Vec<&str> = tools.checks.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "list_sgf_files: PASS",
                "get_board_state: PASS",
                "analyze_position: PASS",
                "get_move_recommendation: PASS",
                "get_territory_analysis: PASS",
                "evaluate_move: PASS",
                "6/6 tools passed, 0 failed, 0 skipped",
            ]
        );
    }

    fn mock_registry(engine: Arc<MockEngine>) -> (TempDir, Arc<Coach>, ToolRegistry) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("games")).unwrap();
        std::fs::write(dir.path().join("games/game.sgf"), "(;SZ[9];B[ee])").unwrap();
        let coach = Arc::new(Coach::new(config_in(dir.path()), engine));
        let registry = ToolRegistry::new(coach.clone());
        (dir, coach, registry)
    }

    fn statuses(section: &Section) -> Vec<Status> {
        section.checks.iter().map(|c| c.status).collect()
    }

    #[tokio::test]
    async fn test_tool_run_skips_after_failed_analysis() {
        let (_dir, coach, registry) = mock_registry(Arc::new(MockEngine::new()));

        let section = check_tools(&registry, coach.library(), true).await;
        assert_eq!(
            statuses(&section),
            vec![
                Status::Success,
                Status::Success,
                Status::Error,
                Status::Skipped,
                Status::Skipped,
                Status::Skipped,
                Status::Info,
            ]
        );
        assert!(section.checks[2].details[0].starts_with("Error analyzing position"));
        assert_eq!(section.checks[3].details, vec!["analyze_position failed"]);
        assert_eq!(
            section.checks[6].message,
            "2/6 tools passed, 1 failed, 3 skipped"
        );
    }

    #[tokio::test]
    async fn test_tool_run_without_engine() {
        let (_dir, coach, registry) = mock_registry(Arc::new(MockEngine::new()));

        let section = check_tools(&registry, coach.library(), false).await;
        assert_eq!(section.checks[1].message, "get_board_state: PASS");
        assert_eq!(section.checks[2].message, "analyze_position: SKIP");
        assert_eq!(section.checks[2].details, vec!["KataGo is not available"]);
        assert_eq!(section.count(Status::Skipped), 4);
    }

    #[tokio::test]
    async fn test_tool_run_evaluates_best_move() {
        let engine = Arc::new(MockEngine::with_result(AnalysisResult {
            id: "mock".into(),
            turn_number: 0,
            current_player: Color::White,
            root_winrate: 0.45,
            root_score_lead: -1.0,
            root_visits: 20,
            move_infos: vec![MoveInfo {
                mv: "C3".into(),
                visits: 20,
                winrate: 0.45,
                score_lead: -1.0,
                pv: vec!["C3".into(), "G7".into()],
                prior: 0.1,
                utility: 0.0,
            }],
            ownership: None,
            raw_response: None,
        }));
        let (_dir, coach, registry) = mock_registry(engine.clone());

        let section = check_tools(&registry, coach.library(), true).await;
        assert_eq!(
            section.checks.last().unwrap().message,
            "6/6 tools passed, 0 failed, 0 skipped"
        );
        let requests = engine.requests();
        assert_eq!(requests[0].max_visits, TOOL_RUN_VISITS);
        assert!(section.checks[5].details[0].contains("C3"));
    }

    #[tokio::test]
    async fn test_skip_engine_and_empty_games_dir() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir(dir.path().join("games")).unwrap();

        let report = run(&config, true).await;
        let engine = report.section("KataGo").unwrap();
        assert_eq!(engine.checks[0].status, Status::Skipped);

        let sgf = report.section("SGF Files").unwrap();
        assert_eq!(sgf.checks[0].status, Status::Warning);
        assert!(sgf.checks[0].message.starts_with("No SGF files found in"));
    }

    #[test]
    fn test_gtp_config_warning() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gtp.cfg");
        std::fs::write(&path, "logSearchInfo = true\nponderingEnabled = false\nmaxTime = 10\n").unwrap();

        let section = check_engine_config(&path);
        assert!(section
            .checks
            .iter()
            .any(|c| c.status == Status::Warning && c.message.contains("GTP config")));
    }
}
