use chrono::NaiveDate;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Number of opening plies kept per record.
pub const OPENING_PLY_LIMIT: usize = 7;

pub type OpeningMoves = SmallVec<[Stone; OPENING_PLY_LIMIT]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// First player.
    Black,
    /// Second player.
    White,
}

/// 1-based board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_on_board(self) -> bool {
        self.x > 0 && self.y > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stone {
    #[serde(flatten)]
    pub point: Point,
    pub color: Color,
}

impl Stone {
    pub const fn new(x: i32, y: i32, color: Color) -> Self {
        Self {
            point: Point::new(x, y),
            color,
        }
    }
}

/// Backing file of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceRef {
    pub path: PathBuf,
    pub name: String,
    /// Location below the scanned root; names the companion notes.
    pub relative: PathBuf,
}

impl SourceRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let relative = PathBuf::from(&name);
        Self {
            path,
            name,
            relative,
        }
    }

    /// A file found below `root`. Falls back to the bare file name when
    /// `path` is not inside `root`.
    pub fn under(root: &Path, path: impl Into<PathBuf>) -> Self {
        let mut source = Self::new(path);
        if let Ok(relative) = source.path.strip_prefix(root)
            && !relative.as_os_str().is_empty()
        {
            source.relative = relative.to_path_buf();
        }
        source
    }

    /// `/`-separated relative path, e.g. `2023/game1.sgf`. Unique per file
    /// within one scan.
    pub fn note_key(&self) -> String {
        self.relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// One indexed game.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GameRecord {
    pub source: SourceRef,

    // Players and game info
    pub black_player: String,
    pub white_player: String,
    pub game_name: String,
    pub date: Option<NaiveDate>,
    pub komi: String,

    pub handicap_raw: String,
    pub handicap_display: String,
    pub result_raw: String,
    pub result_display: String,

    pub board_size: u32,

    // Opening analysis
    pub opening_moves: OpeningMoves,
    pub matched_patterns: BTreeSet<String>,
    pub branch_move_numbers: Vec<u32>,

    /// Vault path of the companion game note.
    pub note_ref: String,

    /// `None` for cleanly read records, otherwise the collected diagnostics.
    pub parse_error: Option<String>,
}
