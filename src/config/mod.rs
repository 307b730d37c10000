//! Configuration management.
//!
//! Every setting has a built-in default that can be replaced by the
//! environment variable named next to it, then by the config file, then by
//! `KATAGO_MCP_<SECTION>__<KEY>` variables.

mod file_config;

pub use file_config::{default_config_path, find_config_file, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::models::Rules;
use crate::sgf::{GameDefaults, GameLibrary};
use crate::utils::expand_tilde;

/// Environment variables read for defaults, with what they control
pub const ENV_VARS: &[(&str, &str)] = &[
    ("KATAGO_PATH", "KataGo executable"),
    ("KATAGO_MODEL", "KataGo neural network (.bin.gz)"),
    ("KATAGO_CONFIG", "KataGo analysis config"),
    ("SGF_WATCH_PATH", "Directory where the board editor saves SGF files"),
    ("ANALYSIS_VISITS", "Search visits per analysis"),
    ("MAX_VARIATIONS", "Candidate moves shown in an analysis"),
    ("ANALYSIS_PV_LEN", "Length of principal variations"),
    ("INCLUDE_OWNERSHIP", "Request territory estimates (true/false)"),
    ("DEFAULT_RULES", "Rules when the record has no RU property"),
    ("DEFAULT_KOMI", "Komi when the record has no KM property"),
    ("RUST_LOG", "Log filter, overrides --verbose/--quiet"),
];

/// Environment prefix for per-key overrides
pub const ENV_PREFIX: &str = "KATAGO_MCP";

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_path_or(name: &str, default: &str) -> PathBuf {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Engine process settings
    #[serde(default)]
    pub katago: KataGoConfig,

    /// Where games come from
    #[serde(default)]
    pub games: GamesConfig,

    /// Analysis parameters
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Defaults applied to records missing komi or rules
    pub fn game_defaults(&self) -> GameDefaults {
        GameDefaults {
            komi: self.games.default_komi,
            rules: self.games.default_rules,
        }
    }

    /// The games directory with `~` expanded
    pub fn watch_path(&self) -> PathBuf {
        expand_tilde(&self.games.watch_path)
    }

    pub fn library(&self) -> GameLibrary {
        GameLibrary::new(self.watch_path())
    }
}

/// KataGo process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KataGoConfig {
    /// Executable (KATAGO_PATH)
    pub path: PathBuf,

    /// Neural network file (KATAGO_MODEL)
    pub model: PathBuf,

    /// Analysis config file (KATAGO_CONFIG)
    pub config: PathBuf,

    pub analysis_threads: u32,

    /// How long to wait for each response
    pub timeout_seconds: u64,

    /// Pause after spawning before checking the process is still alive
    pub startup_grace_ms: u64,

    /// Stderr lines kept for error reports
    pub stderr_tail_lines: usize,
}

impl Default for KataGoConfig {
    fn default() -> Self {
        Self {
            path: env_path_or("KATAGO_PATH", "/usr/local/bin/katago"),
            model: env_path_or(
                "KATAGO_MODEL",
                "/usr/share/katago/models/kata1-b18c384nbt-s9131461376-d4087399203.bin.gz",
            ),
            config: env_path_or("KATAGO_CONFIG", "/etc/katago/analysis.cfg"),
            analysis_threads: 2,
            timeout_seconds: 120,
            startup_grace_ms: 500,
            stderr_tail_lines: 50,
        }
    }
}

/// Game directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GamesConfig {
    /// Directory the board editor saves into (SGF_WATCH_PATH)
    pub watch_path: PathBuf,

    /// Files shown by `list_sgf_files`
    pub max_listed: usize,

    /// DEFAULT_RULES
    pub default_rules: Rules,

    /// DEFAULT_KOMI
    pub default_komi: f64,
}

impl Default for GamesConfig {
    fn default() -> Self {
        Self {
            watch_path: env_path_or("SGF_WATCH_PATH", "~/go/games"),
            max_listed: 20,
            default_rules: std::env::var("DEFAULT_RULES")
                .ok()
                .and_then(|v| Rules::parse(&v))
                .unwrap_or(Rules::Chinese),
            default_komi: env_or("DEFAULT_KOMI", 7.5),
        }
    }
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// ANALYSIS_VISITS
    pub visits: u32,

    /// MAX_VARIATIONS
    pub max_variations: usize,

    /// ANALYSIS_PV_LEN
    pub pv_len: u32,

    /// INCLUDE_OWNERSHIP
    pub include_ownership: bool,

    /// Re-query with the move forced when evaluating a move the engine did not consider
    pub deep_evaluate: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            visits: env_or("ANALYSIS_VISITS", 100),
            max_variations: env_or("MAX_VARIATIONS", 5),
            pv_len: env_or("ANALYSIS_PV_LEN", 10),
            include_ownership: std::env::var("INCLUDE_OWNERSHIP")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(true),
            deep_evaluate: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,

    /// `json` for structured output, text otherwise
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: None,
        }
    }
}

/// `KATAGO_MCP_<SECTION>__<KEY>` overrides
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn build_config(
    path: Option<&Path>,
    env: config::Environment,
) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    builder.add_source(env).build()?.try_deserialize()
}

/// Load configuration from a file, with `KATAGO_MCP_*` overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    build_config(Some(path), environment())
}

/// Load the config file if one is found, defaults otherwise.
///
/// Environment overrides apply in both cases.
pub fn get_config(explicit: Option<&Path>) -> Result<Config, config::ConfigError> {
    let path = explicit.map(Path::to_path_buf).or_else(find_config_file);
    match &path {
        Some(path) => tracing::debug!("Loading configuration from {}", path.display()),
        None => tracing::debug!("No configuration file found, using defaults"),
    }
    build_config(path.as_deref(), environment())
}
