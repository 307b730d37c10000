//! Reader for KataGo's `key = value` config files.
//!
//! Only enough to inspect the file the engine will be started with: which
//! perspective it reports values from, and whether it is an analysis config
//! at all.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::models::Perspective;

/// Keys that only mean something to the GTP engine
const GTP_ONLY_KEYS: &[&str] = &[
    "logAllGTPCommunication",
    "logSearchInfo",
    "ponderingEnabled",
    "maxTimePondering",
    "lagBuffer",
    "allowResignation",
    "resignThreshold",
    "resignConsecTurns",
    "maxTime",
];

/// Keys an analysis config normally sets
const ANALYSIS_KEYS: &[&str] = &[
    "numAnalysisThreads",
    "numSearchThreadsPerAnalysisThread",
    "nnMaxBatchSize",
    "reportAnalysisWinratesAs",
];

#[derive(Debug, Clone, Default)]
pub struct EngineConfigFile {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl EngineConfigFile {
    /// Parse config text. Later duplicates win.
    pub fn parse(text: &str) -> Self {
        let mut entries = BTreeMap::new();
        for raw in text.lines() {
            let line = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("@include") {
                debug!("Not following engine config include: {}", line);
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                entries.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Self {
            path: None,
            entries,
        }
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut file = Self::parse(&text);
        file.path = Some(path.to_path_buf());
        Ok(file)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn num_analysis_threads(&self) -> Option<u32> {
        self.get_parsed("numAnalysisThreads")
    }

    pub fn max_visits(&self) -> Option<u64> {
        self.get_parsed("maxVisits")
    }

    pub fn cuda_device(&self) -> Option<&str> {
        self.get("cudaDeviceToUse")
            .or_else(|| self.get("cudaDeviceToUseThread0"))
    }

    /// `reportAnalysisWinratesAs`, side to move when unset or unknown
    pub fn report_perspective(&self) -> Perspective {
        self.get("reportAnalysisWinratesAs")
            .and_then(Perspective::parse)
            .unwrap_or_default()
    }

    /// A GTP config passed to the analysis engine makes it fail at startup
    pub fn looks_like_gtp_config(&self) -> bool {
        let has_gtp = GTP_ONLY_KEYS.iter().any(|k| self.entries.contains_key(*k));
        let has_analysis = ANALYSIS_KEYS.iter().any(|k| self.entries.contains_key(*k));
        has_gtp && !has_analysis
    }
}
