pub mod config;
pub mod error;
pub mod format;
pub mod indexer;
pub mod log;
pub mod moves;
pub mod notes;
pub mod patterns;
pub mod reader;
pub mod render;
pub mod scanner;
pub mod stats;
pub mod tags;
pub mod types;
pub mod view;

pub use config::Config;
pub use error::{ConfigError, NoteError, ViewError};
pub use indexer::{IndexReport, IndexerConfig, RecordIndexer, index_corpus};
pub use notes::{FsNoteStore, MemoryNoteStore, NoteStore};
pub use reader::FsTree;
pub use scanner::FileTree;
pub use types::{Color, GameRecord, Point, SourceRef, Stone};
pub use view::{HandicapFilter, ViewController};
