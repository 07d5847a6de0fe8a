use super::error::ConfigError;
use super::indexer::IndexerConfig;
use super::moves::MainLine;
use super::patterns::OpeningPatterns;
use super::types::OPENING_PLY_LIMIT;
use super::view::{PAGE_SIZE_CHOICES, ViewConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const BOARD_SIZE_CHOICES: [u32; 3] = [9, 13, 19];

pub const DEFAULT_GAME_NOTE_FOLDER: &str = "sgf-notes";
pub const DEFAULT_REVIEW_NOTE_FOLDER: &str = "sgf-review";

/// Which color a pattern must be played by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternColor {
    /// All points by the same player, whichever it is.
    #[default]
    Any,
    Black,
    White,
}

/// One `[[patterns]]` entry as written in the config file.
///
/// `color` defaults to `"any"`, under which a pattern only requires its
/// points to be taken by one player, whichever it is. A single-point pattern
/// such as a corner star point then matches for both players; set
/// `color = "black"` or `"white"` to count only games where that player
/// took it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatternConfig {
    pub name: String,
    #[serde(default)]
    pub points: Vec<[i32; 2]>,
    #[serde(default)]
    pub color: PatternColor,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Folder holding the record files, or a glob pattern.
    pub root: Option<PathBuf>,
    /// Folder the companion notes are written under.
    pub vault: PathBuf,
    pub board_size: u32,
    pub game_note_folder: String,
    pub review_note_folder: String,
    pub page_size: usize,
    pub main_line: MainLine,
    pub patterns: Vec<PatternConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            vault: PathBuf::from("."),
            board_size: 19,
            game_note_folder: DEFAULT_GAME_NOTE_FOLDER.to_string(),
            review_note_folder: DEFAULT_REVIEW_NOTE_FOLDER.to_string(),
            page_size: PAGE_SIZE_CHOICES[0],
            main_line: MainLine::default(),
            patterns: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !BOARD_SIZE_CHOICES.contains(&self.board_size) {
            return Err(ConfigError::UnsupportedBoardSize(self.board_size));
        }
        if !PAGE_SIZE_CHOICES.contains(&self.page_size) {
            return Err(ConfigError::UnsupportedPageSize(self.page_size));
        }
        if let Some(idx) = self.patterns.iter().position(|p| p.name.trim().is_empty()) {
            return Err(ConfigError::UnnamedPattern(idx + 1));
        }
        Ok(())
    }

    pub fn record_root(&self) -> Result<&Path, ConfigError> {
        match self.root.as_deref() {
            Some(root) if !root.as_os_str().is_empty() => Ok(root),
            _ => Err(ConfigError::MissingRoot),
        }
    }

    pub fn opening_patterns(&self) -> OpeningPatterns {
        OpeningPatterns::from_config(&self.patterns)
    }

    pub fn indexer_config(&self) -> IndexerConfig {
        IndexerConfig {
            board_size: self.board_size,
            patterns: self.opening_patterns(),
            move_limit: OPENING_PLY_LIMIT,
            main_line: self.main_line,
            game_note_folder: self.game_note_folder.clone(),
            review_note_folder: self.review_note_folder.clone(),
        }
    }

    pub fn view_config(&self) -> ViewConfig {
        ViewConfig {
            board_size: self.board_size,
            patterns_configured: !self.opening_patterns().is_empty(),
            page_size: self.page_size,
        }
    }
}
