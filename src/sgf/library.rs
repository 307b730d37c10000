//! The directory of saved games.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use super::reader::{read_sgf_file, GameDefaults};
use super::SgfError;
use crate::models::GameState;
use crate::utils::sanitize_sgf_path;

/// An SGF file found in the games directory
#[derive(Debug, Clone, Serialize)]
pub struct SgfFile {
    pub path: PathBuf,

    /// Path relative to the games directory
    pub relative_path: String,

    pub modified: DateTime<Local>,
}

/// SGF files under a root directory, newest first
#[derive(Debug, Clone)]
pub struct GameLibrary {
    root: PathBuf,
}

impl GameLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Every `.sgf` file below the root, most recently modified first
    pub fn list(&self) -> Vec<SgfFile> {
        let mut files: Vec<SgfFile> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("sgf"))
            })
            .filter_map(|entry| {
                let modified = entry.metadata().ok()?.modified().ok()?;
                let path = entry.into_path();
                let relative_path = path
                    .strip_prefix(&self.root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .into_owned();
                Some(SgfFile {
                    path,
                    relative_path,
                    modified: DateTime::<Local>::from(modified),
                })
            })
            .collect();

        files.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.relative_path.cmp(&b.relative_path))
        });
        debug!("Found {} SGF files in {}", files.len(), self.root.display());
        files
    }

    /// The most recently modified game
    pub fn latest(&self) -> Result<SgfFile, SgfError> {
        self.list()
            .into_iter()
            .next()
            .ok_or_else(|| SgfError::NoGames(self.root.clone()))
    }

    /// Resolve a requested file, or the latest game when none is given
    pub fn resolve(&self, requested: Option<&str>) -> Result<PathBuf, SgfError> {
        let requested = requested.map(str::trim).filter(|s| !s.is_empty());
        let Some(requested) = requested else {
            return Ok(self.latest()?.path);
        };

        let path = sanitize_sgf_path(requested)?;
        let path = if path.is_absolute() {
            path
        } else {
            self.root.join(path)
        };

        if !path.is_file() {
            return Err(SgfError::NotFound(path));
        }
        Ok(path)
    }

    /// Read and replay a game
    pub fn load(
        &self,
        requested: Option<&str>,
        defaults: &GameDefaults,
    ) -> Result<(GameState, PathBuf), SgfError> {
        let path = self.resolve(requested)?;
        let state = read_sgf_file(&path, defaults)?;
        Ok((state, path))
    }
}
