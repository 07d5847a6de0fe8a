use std::path::PathBuf;
use thiserror::Error;

/// Diagnostics gathered while reading one record, joined with `; `.
#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        match &mut self.0 {
            Some(joined) => {
                joined.push_str("; ");
                joined.push_str(msg);
            }
            None => self.0 = Some(msg.to_owned()),
        }
    }

    /// Drains the joined message, leaving the accumulator empty.
    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

/// Configuration problems. These abort a run before any record file is read.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no record root configured")]
    MissingRoot,

    #[error("record root '{}' is not an existing folder", .0.display())]
    RootNotFound(PathBuf),

    #[error("invalid record root pattern '{pattern}': {source}")]
    InvalidRootPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("unsupported board size {0} (expected one of 9, 13, 19)")]
    UnsupportedBoardSize(u32),

    #[error("unsupported page size {0} (expected one of 10, 20, 50, 100)")]
    UnsupportedPageSize(usize),

    #[error("opening pattern #{0} has an empty name")]
    UnnamedPattern(usize),

    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failures of the note store. Always recovered per record.
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("failed to create folder '{path}': {source}")]
    CreateFolder {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create note '{path}': {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read note '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to modify note '{path}': {source}")]
    Modify {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("note '{0}' already exists")]
    AlreadyExists(String),

    #[error("note '{0}' does not exist")]
    Missing(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("unsupported page size {requested} (choices: {choices:?})")]
    UnsupportedPageSize {
        requested: usize,
        choices: Vec<usize>,
    },
}
