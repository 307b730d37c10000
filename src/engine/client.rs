//! KataGo analysis engine running as a child process.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::oneshot;

use super::engine_config::EngineConfigFile;
use super::query::{build_query, parse_response};
use super::{AnalysisEngine, EngineError};
use crate::config::KataGoConfig;
use crate::models::{AnalysisRequest, AnalysisResult, Perspective};
use crate::utils::expand_tilde;

const STDERR_TARGET: &str = "katago_mcp::engine::stderr";

/// Lines of stderr attached to errors
const ERROR_TAIL_LINES: usize = 20;

type Pending = Arc<DashMap<String, oneshot::Sender<Result<Value, EngineError>>>>;

/// How to start the engine
#[derive(Debug, Clone)]
pub struct KataGoSettings {
    pub executable: PathBuf,
    pub model: PathBuf,
    pub config: PathBuf,
    pub analysis_threads: u32,
    pub timeout: Duration,
    pub startup_grace: Duration,
    pub stderr_tail_lines: usize,
}

impl From<&KataGoConfig> for KataGoSettings {
    fn from(config: &KataGoConfig) -> Self {
        Self {
            executable: expand_tilde(&config.path),
            model: expand_tilde(&config.model),
            config: expand_tilde(&config.config),
            analysis_threads: config.analysis_threads,
            timeout: Duration::from_secs(config.timeout_seconds),
            startup_grace: Duration::from_millis(config.startup_grace_ms),
            stderr_tail_lines: config.stderr_tail_lines,
        }
    }
}

/// Last lines the engine wrote to stderr
#[derive(Debug)]
struct StderrTail {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl StderrTail {
    fn new(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    fn push(&self, line: String) {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    fn clear(&self) {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// The last `n` lines joined, or a placeholder when there are none
    fn render(&self, n: usize) -> String {
        let lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        if lines.is_empty() {
            return "(no stderr)".to_string();
        }
        let skip = lines.len().saturating_sub(n);
        lines
            .iter()
            .skip(skip)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug)]
struct EngineProcess {
    child: Child,
    stdin: ChildStdin,
    pending: Pending,
}

/// Client for the KataGo analysis engine.
///
/// The process is started on the first query and restarted if it has
/// exited. Queries may be issued concurrently: writes are serialized and
/// responses are routed back by id.
#[derive(Debug)]
pub struct KataGoClient {
    settings: KataGoSettings,
    perspective: Perspective,
    process: tokio::sync::Mutex<Option<EngineProcess>>,
    stderr_tail: Arc<StderrTail>,
}

impl KataGoClient {
    pub fn new(settings: KataGoSettings) -> Self {
        let perspective = match EngineConfigFile::load(&settings.config) {
            Ok(cfg) => {
                if cfg.looks_like_gtp_config() {
                    tracing::warn!(
                        "{} looks like a GTP config; the analysis engine needs an analysis config",
                        settings.config.display()
                    );
                }
                cfg.report_perspective()
            }
            Err(e) => {
                tracing::debug!(
                    "Could not read engine config {}: {}",
                    settings.config.display(),
                    e
                );
                Perspective::default()
            }
        };

        Self {
            stderr_tail: Arc::new(StderrTail::new(settings.stderr_tail_lines)),
            settings,
            perspective,
            process: tokio::sync::Mutex::new(None),
        }
    }

    /// Override the perspective read from the engine config
    pub fn with_perspective(mut self, perspective: Perspective) -> Self {
        self.perspective = perspective;
        self
    }

    pub fn settings(&self) -> &KataGoSettings {
        &self.settings
    }

    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    pub async fn is_running(&self) -> bool {
        let mut guard = self.process.lock().await;
        guard
            .as_mut()
            .is_some_and(|p| matches!(p.child.try_wait(), Ok(None)))
    }

    /// Start the engine now instead of on the first query
    pub async fn start(&self) -> Result<(), EngineError> {
        let mut guard = self.process.lock().await;
        self.ensure_running(&mut guard).await
    }

    /// Kill the engine process
    pub async fn stop(&self) {
        let mut guard = self.process.lock().await;
        if let Some(mut process) = guard.take() {
            if let Err(e) = process.child.kill().await {
                tracing::debug!("Killing KataGo failed: {}", e);
            }
            tracing::info!("KataGo stopped");
        }
    }

    async fn ensure_running(&self, slot: &mut Option<EngineProcess>) -> Result<(), EngineError> {
        if let Some(process) = slot.as_mut() {
            match process.child.try_wait() {
                Ok(None) => return Ok(()),
                Ok(Some(status)) => tracing::warn!("KataGo exited ({}), restarting", status),
                Err(e) => tracing::warn!("Could not check KataGo status ({}), restarting", e),
            }
            *slot = None;
        }
        *slot = Some(self.spawn().await?);
        Ok(())
    }

    fn check_paths(&self) -> Result<PathBuf, EngineError> {
        let s = &self.settings;
        let executable = locate_executable(&s.executable)
            .ok_or_else(|| EngineError::ExecutableNotFound(s.executable.clone()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&executable)?.permissions().mode();
            if mode & 0o111 == 0 {
                return Err(EngineError::PermissionDenied(executable));
            }
        }

        if !s.model.exists() {
            return Err(EngineError::ModelNotFound(s.model.clone()));
        }
        if !s.config.exists() {
            return Err(EngineError::ConfigNotFound(s.config.clone()));
        }
        Ok(executable)
    }

    async fn spawn(&self) -> Result<EngineProcess, EngineError> {
        let executable = self.check_paths()?;
        let s = &self.settings;

        tracing::info!(
            "Starting KataGo: {} analysis -model {} -config {} -analysis-threads {}",
            executable.display(),
            s.model.display(),
            s.config.display(),
            s.analysis_threads
        );

        let mut child = Command::new(&executable)
            .arg("analysis")
            .arg("-model")
            .arg(&s.model)
            .arg("-config")
            .arg(&s.config)
            .arg("-analysis-threads")
            .arg(s.analysis_threads.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: executable.clone(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdin was not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdout was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stderr was not captured".into()))?;

        self.stderr_tail.clear();
        let pending: Pending = Arc::new(DashMap::new());
        let stderr_task = tokio::spawn(read_stderr(stderr, self.stderr_tail.clone()));
        tokio::spawn(read_stdout(
            stdout,
            pending.clone(),
            self.stderr_tail.clone(),
        ));

        tokio::time::sleep(s.startup_grace).await;

        if let Some(status) = child.try_wait()? {
            // Let the reader drain what the process printed before dying
            let _ = tokio::time::timeout(Duration::from_secs(1), stderr_task).await;
            return Err(EngineError::ProcessExited {
                status: status.to_string(),
                stderr: self.stderr_tail.render(s.stderr_tail_lines),
            });
        }

        tracing::info!("KataGo started (pid {:?})", child.id());
        Ok(EngineProcess {
            child,
            stdin,
            pending,
        })
    }
}

#[async_trait]
impl AnalysisEngine for KataGoClient {
    fn name(&self) -> &str {
        "KataGo"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, EngineError> {
        let query = build_query(request);
        let id = query.id.clone();
        let line = serde_json::to_string(&query)
            .map_err(|e| EngineError::Protocol(format!("could not encode query: {}", e)))?;

        let (tx, rx) = oneshot::channel();
        let pending = {
            let mut guard = self.process.lock().await;
            self.ensure_running(&mut guard).await?;
            let process = guard
                .as_mut()
                .ok_or_else(|| EngineError::Protocol("engine is not running".into()))?;

            process.pending.insert(id.clone(), tx);
            tracing::debug!("Sending query {}: {}", id, truncate(&line, 200));

            if let Err(e) = write_line(&mut process.stdin, &line).await {
                tracing::warn!("Writing to KataGo failed: {}", e);
                process.pending.remove(&id);
                *guard = None;
                return Err(EngineError::BrokenPipe {
                    stderr: self.stderr_tail.render(ERROR_TAIL_LINES),
                });
            }
            process.pending.clone()
        };

        let seconds = self.settings.timeout.as_secs();
        tracing::debug!("Waiting up to {}s for response to {}", seconds, id);

        let value = match tokio::time::timeout(self.settings.timeout, rx).await {
            Ok(Ok(outcome)) => outcome?,
            Ok(Err(_)) => {
                return Err(EngineError::ProcessDied {
                    stderr: self.stderr_tail.render(ERROR_TAIL_LINES),
                })
            }
            Err(_) => {
                pending.remove(&id);
                tracing::warn!("Timeout waiting for {}", id);
                return Err(EngineError::Timeout {
                    id,
                    seconds,
                    stderr: self.stderr_tail.render(10),
                });
            }
        };

        tracing::debug!("Got response for {}", id);
        parse_response(value, &request.state, self.perspective)
    }

    async fn shutdown(&self) {
        self.stop().await;
    }
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Find the executable as given, or on `PATH` when it is a bare name
pub fn locate_executable(path: &Path) -> Option<PathBuf> {
    if path.exists() {
        return Some(path.to_path_buf());
    }
    if path.components().count() != 1 {
        return None;
    }
    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search)
        .map(|dir| dir.join(path))
        .find(|candidate| candidate.is_file())
}

async fn read_stdout(stdout: ChildStdout, pending: Pending, tail: Arc<StderrTail>) {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    loop {
        match read_lossy_line(&mut reader, &mut buf).await {
            Ok(Some(line)) => route_line(&line, &pending),
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Error reading KataGo output: {}", e);
                break;
            }
        }
    }

    let ids: Vec<String> = pending.iter().map(|entry| entry.key().clone()).collect();
    if !ids.is_empty() {
        tracing::warn!("KataGo output closed with {} request(s) pending", ids.len());
    }
    for id in ids {
        if let Some((_, tx)) = pending.remove(&id) {
            let _ = tx.send(Err(EngineError::ProcessDied {
                stderr: tail.render(ERROR_TAIL_LINES),
            }));
        }
    }
}

/// Read one line, replacing bytes that are not UTF-8 instead of failing.
///
/// Returns `None` at end of stream.
async fn read_lossy_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).trim_end_matches(['\r', '\n']).to_string()))
}

fn route_line(line: &str, pending: &Pending) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    tracing::trace!("KataGo stdout: {}", line);

    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Ignoring non-JSON KataGo output ({}): {}", e, truncate(line, 200));
            return;
        }
    };

    let Some(id) = value.get("id").and_then(Value::as_str).map(str::to_string) else {
        match value.get("error").and_then(Value::as_str) {
            Some(error) => tracing::warn!("KataGo reported an error without an id: {}", error),
            None => tracing::warn!("Ignoring KataGo output without an id: {}", truncate(line, 200)),
        }
        return;
    };

    if let Some(warning) = value.get("warning").and_then(Value::as_str) {
        tracing::warn!("KataGo warning for {}: {}", id, warning);
        return;
    }

    if value.get("isDuringSearch").and_then(Value::as_bool) == Some(true) {
        tracing::trace!("Skipping partial result for {}", id);
        return;
    }

    match pending.remove(&id) {
        Some((_, tx)) => {
            tracing::debug!("Received response for request {}", id);
            let _ = tx.send(Ok(value));
        }
        None => tracing::debug!("Response for unknown or expired request {}", id),
    }
}

async fn read_stderr(stderr: ChildStderr, tail: Arc<StderrTail>) {
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    loop {
        let line = match read_lossy_line(&mut reader, &mut buf).await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Error reading KataGo stderr: {}", e);
                break;
            }
        };
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        tracing::debug!(target: STDERR_TARGET, "{}", line);
        if line.contains("GTP ready") {
            tracing::warn!(
                "KataGo started in GTP mode; KATAGO_CONFIG must point at an analysis config"
            );
        } else if line.contains("ready to begin handling requests") {
            tracing::info!("KataGo is ready");
        }
        tail.push(line.to_string());
    }
}

/// Run `katago version` and return its output
pub async fn engine_version(executable: &Path, timeout: Duration) -> Result<String, EngineError> {
    let executable = locate_executable(executable)
        .ok_or_else(|| EngineError::ExecutableNotFound(executable.to_path_buf()))?;

    let output = Command::new(&executable)
        .arg("version")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, output)
        .await
        .map_err(|_| EngineError::Timeout {
            id: "version".to_string(),
            seconds: timeout.as_secs(),
            stderr: "(no stderr)".to_string(),
        })?
        .map_err(|source| EngineError::Spawn {
            path: executable.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(EngineError::ProcessExited {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
