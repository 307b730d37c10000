use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use katago_mcp::coach::{Coach, CoachError, Level};
use katago_mcp::config::{default_config_path, get_config, Config, ENV_PREFIX, ENV_VARS};
use katago_mcp::engine::{KataGoClient, KataGoSettings};
use katago_mcp::mcp::server::McpServer;
use katago_mcp::ui::{self, Spinner};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// KataGo MCP - Go coaching for AI assistants, backed by the KataGo engine
#[derive(Parser, Debug)]
#[command(name = "katago-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server connecting an AI assistant with the KataGo analysis engine", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory containing SGF files (overrides games.watch_path)
    #[arg(long, global = true)]
    sgf_dir: Option<PathBuf>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Text on a terminal, JSON otherwise
    Auto,
    /// Human-readable text
    Text,
    /// JSON (machine-readable)
    Json,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Text,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

/// Player level for recommendations
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LevelArg {
    Beginner,
    Intermediate,
    Advanced,
}

impl From<LevelArg> for Level {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Beginner => Level::Beginner,
            LevelArg::Intermediate => Level::Intermediate,
            LevelArg::Advanced => Level::Advanced,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server (the default when no command is given)
    Serve {
        /// Run in stdio mode (for MCP clients like Claude Desktop)
        #[arg(long)]
        stdio: bool,

        /// Run in streamable HTTP mode (overrides --stdio)
        #[arg(long)]
        http: bool,

        /// Port for HTTP mode
        #[arg(long, short, default_value_t = 3000)]
        port: u16,

        /// Host to bind to for HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// List SGF files in the games directory, newest first
    #[command(alias = "ls")]
    Files,

    /// Show the board of a game
    Board {
        /// SGF file (defaults to the most recently modified)
        sgf: Option<String>,
    },

    /// Analyze the current position
    #[command(alias = "a")]
    Analyze {
        /// SGF file (defaults to the most recently modified)
        sgf: Option<String>,

        /// Search visits (defaults to analysis.visits)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        visits: Option<u32>,
    },

    /// Recommend the next move with an explanation
    #[command(alias = "r")]
    Recommend {
        /// SGF file (defaults to the most recently modified)
        sgf: Option<String>,

        /// Level the explanation is written for
        #[arg(long, short, value_enum, default_value_t = LevelArg::Intermediate)]
        level: LevelArg,
    },

    /// Estimate territory and score
    Territory {
        /// SGF file (defaults to the most recently modified)
        sgf: Option<String>,
    },

    /// Evaluate a move, e.g. `evaluate Q16`
    #[command(alias = "e")]
    Evaluate {
        /// Move in GTP format, or `pass`
        #[arg(value_name = "MOVE")]
        mv: String,

        /// SGF file (defaults to the most recently modified)
        sgf: Option<String>,
    },

    /// Check the installation: paths, engine config, games and engine startup
    #[command(alias = "diag")]
    Doctor {
        /// Do not run the KataGo executable
        #[arg(long)]
        skip_engine: bool,
    },

    /// Write the current configuration to a TOML file
    InitConfig {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

/// Print all available environment variables
fn print_env_vars() {
    println!("KataGo MCP - Environment Variables");
    println!();
    for (name, description) in ENV_VARS {
        println!("  {:<20} {}", name, description);
    }
    println!();
    println!("Config file keys can also be overridden with {}_<SECTION>__<KEY>:", ENV_PREFIX);
    println!("  {}_KATAGO__TIMEOUT_SECONDS=300", ENV_PREFIX);
    println!("  {}_ANALYSIS__VISITS=400", ENV_PREFIX);
    println!();
    println!("Example:");
    println!("  export KATAGO_MODEL=\"$HOME/katago/kata1-b18c384nbt.bin.gz\"");
    println!("  export SGF_WATCH_PATH=\"$HOME/go/games\"");
}

/// Logs go to stderr; stdout carries the MCP protocol in stdio mode
fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("katago_mcp={}", level)),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_deref() == Some("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn build_coach(config: Config) -> Arc<Coach> {
    let engine = Arc::new(KataGoClient::new(KataGoSettings::from(&config.katago)));
    Arc::new(Coach::new(config, engine))
}

/// Print a report as text or JSON
fn emit<T: Serialize>(report: &T, text: &str, format: OutputFormat) -> Result<()> {
    match format.resolve() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        _ => println!("{}", text),
    }
    Ok(())
}

/// Run an engine-backed operation behind a spinner, then stop the engine
async fn with_engine<T, F>(coach: &Coach, message: &str, action: &str, op: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T, CoachError>>,
{
    let spinner = Spinner::new(message);
    let outcome = op.await;
    spinner.clear();
    coach.shutdown().await;
    outcome.map_err(|e| anyhow::anyhow!(e.describe(action)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show environment variables and exit if requested
    if cli.env {
        print_env_vars();
        return Ok(());
    }

    let mut config = get_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = &cli.sgf_dir {
        config.games.watch_path = dir.clone();
    }

    init_tracing(&cli, &config);
    tracing::debug!("Games directory: {}", config.watch_path().display());

    let format = cli.output;
    let color = format.resolve() == OutputFormat::Text;

    match cli.command {
        None => {
            let server = McpServer::new(build_coach(config))?;
            server.run().await?;
        }

        Some(Commands::Serve {
            stdio,
            http,
            port,
            host,
        }) => {
            let server = McpServer::new(build_coach(config))?;

            if http {
                let coach = server.coach().clone();
                let addr = format!("{}:{}", host, port);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                eprintln!("{}", ui::banner(&bound_addr.to_string()));
                tracing::info!("MCP server listening on {}", bound_addr);

                tokio::select! {
                    joined = handle => {
                        joined.map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Interrupted, shutting down");
                    }
                }
                coach.shutdown().await;
            } else {
                if !stdio {
                    tracing::debug!("No transport given, using stdio");
                }
                server.run().await?;
            }
        }

        Some(Commands::Files) => {
            let coach = build_coach(config);
            let report = coach.list_files();
            if format.resolve() == OutputFormat::Text && !report.files.is_empty() {
                println!("{}", ui::file_table(&report));
                if report.total > report.files.len() {
                    println!("... and {} more files", report.total - report.files.len());
                }
            } else {
                emit(&report, &report.text, format)?;
            }
        }

        Some(Commands::Board { sgf }) => {
            let coach = build_coach(config);
            let report = coach
                .board_state(sgf.as_deref())
                .map_err(|e| anyhow::anyhow!(e.describe("reading game state")))?;
            emit(&report, &report.text, format)?;
        }

        Some(Commands::Analyze { sgf, visits }) => {
            let coach = build_coach(config);
            let report = with_engine(
                &coach,
                "KataGo is analyzing...",
                "analyzing position",
                coach.analyze(sgf.as_deref(), visits),
            )
            .await?;
            emit(&report, &report.text, format)?;
        }

        Some(Commands::Recommend { sgf, level }) => {
            let coach = build_coach(config);
            let report = with_engine(
                &coach,
                "KataGo is looking for the best move...",
                "getting recommendation",
                coach.recommend(level.into(), sgf.as_deref()),
            )
            .await?;
            emit(&report, &report.text, format)?;
        }

        Some(Commands::Territory { sgf }) => {
            let coach = build_coach(config);
            let report = with_engine(
                &coach,
                "KataGo is estimating territory...",
                "analyzing territory",
                coach.territory(sgf.as_deref()),
            )
            .await?;
            emit(&report, &report.text, format)?;
        }

        Some(Commands::Evaluate { mv, sgf }) => {
            let coach = build_coach(config);
            let report = with_engine(
                &coach,
                &format!("KataGo is evaluating {}...", mv),
                "evaluating move",
                coach.evaluate(&mv, sgf.as_deref()),
            )
            .await?;
            emit(&report, &report.text, format)?;
        }

        Some(Commands::Doctor { skip_engine }) => {
            let report = katago_mcp::doctor::run(&config, skip_engine).await;
            emit(&report, &report.render(color), format)?;
            if !report.passed() {
                std::process::exit(1);
            }
        }

        Some(Commands::InitConfig { path, force }) => {
            let path = match path.or_else(default_config_path) {
                Some(path) => path,
                None => bail!("Could not determine a config directory; pass a path"),
            };
            if path.exists() && !force {
                bail!(
                    "{} already exists; use --force to overwrite",
                    path.display()
                );
            }
            config.save(&path)?;
            eprintln!(
                "{}",
                ui::status_line(
                    ui::Status::Success,
                    &format!("Wrote configuration to {}", path.display()),
                    std::io::stderr().is_terminal(),
                )
            );
        }
    }

    Ok(())
}
