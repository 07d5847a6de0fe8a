use super::scanner::{COMPRESSED_EXTENSION, FileTree};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use zstd::stream::read::Decoder as ZstdDecoder;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CompressionMode {
    Plain,
    Zstd,
}

impl CompressionMode {
    fn for_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case(COMPRESSED_EXTENSION) => Self::Zstd,
            _ => Self::Plain,
        }
    }
}

type RecordInput = Box<dyn Read>;

fn open_input_stream(path: &Path, compression: CompressionMode) -> io::Result<RecordInput> {
    let file = File::open(path)?;

    match compression {
        CompressionMode::Plain => Ok(Box::new(file)),
        CompressionMode::Zstd => ZstdDecoder::new(file).map(|decoder| Box::new(decoder) as RecordInput),
    }
}

/// Record files on the local filesystem. `*.zst` files are decompressed
/// on read; invalid UTF-8 is replaced rather than rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTree;

impl FileTree for FsTree {
    fn list_children(&self, container: &Path) -> io::Result<Vec<PathBuf>> {
        fs::read_dir(container)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }

    fn is_container(&self, entry: &Path) -> bool {
        entry.is_dir()
    }

    fn container_identity(&self, container: &Path) -> Option<PathBuf> {
        fs::canonicalize(container).ok()
    }

    fn read_text(&self, file: &Path) -> io::Result<String> {
        let mut input = open_input_stream(file, CompressionMode::for_path(file))?;
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

/// Text of one record, or the reason it could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Ok(String),
    /// The record is indexed with empty text.
    Degraded { reason: String },
}

impl ReadOutcome {
    pub fn read<T: FileTree + ?Sized>(tree: &T, file: &Path) -> Self {
        match tree.read_text(file) {
            Ok(text) => Self::Ok(text),
            Err(e) => Self::Degraded {
                reason: format!("Failed to read '{}': {}", file.display(), e),
            },
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Ok(text) => text,
            Self::Degraded { .. } => "",
        }
    }

    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Degraded { reason } => Some(reason),
        }
    }
}
