use super::error::NoteError;
use super::log;
use super::types::GameRecord;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Vault-style storage for companion notes. Paths are `/`-separated and
/// relative to the store root.
pub trait NoteStore {
    fn exists(&self, path: &str) -> bool;
    fn create_folder(&mut self, path: &str) -> Result<(), NoteError>;
    fn create(&mut self, path: &str, text: &str) -> Result<(), NoteError>;
    fn read(&self, path: &str) -> Result<String, NoteError>;
    fn modify(&mut self, path: &str, text: &str) -> Result<(), NoteError>;
}

/// Notes stored as files below a root folder.
#[derive(Debug, Clone)]
pub struct FsNoteStore {
    root: PathBuf,
}

impl FsNoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl NoteStore for FsNoteStore {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn create_folder(&mut self, path: &str) -> Result<(), NoteError> {
        fs::create_dir_all(self.resolve(path)).map_err(|source| NoteError::CreateFolder {
            path: path.to_string(),
            source,
        })
    }

    fn create(&mut self, path: &str, text: &str) -> Result<(), NoteError> {
        use std::io::Write;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.resolve(path))
            .map_err(|source| match source.kind() {
                io::ErrorKind::AlreadyExists => NoteError::AlreadyExists(path.to_string()),
                _ => NoteError::Create {
                    path: path.to_string(),
                    source,
                },
            })?;
        file.write_all(text.as_bytes())
            .map_err(|source| NoteError::Create {
                path: path.to_string(),
                source,
            })
    }

    fn read(&self, path: &str) -> Result<String, NoteError> {
        fs::read_to_string(self.resolve(path)).map_err(|source| NoteError::Read {
            path: path.to_string(),
            source,
        })
    }

    fn modify(&mut self, path: &str, text: &str) -> Result<(), NoteError> {
        let target = self.resolve(path);
        if !target.is_file() {
            return Err(NoteError::Missing(path.to_string()));
        }
        fs::write(target, text).map_err(|source| NoteError::Modify {
            path: path.to_string(),
            source,
        })
    }
}

/// Notes held in memory. Used for dry runs; counts every write.
#[derive(Debug, Clone, Default)]
pub struct MemoryNoteStore {
    folders: BTreeSet<String>,
    notes: BTreeMap<String, String>,
    writes: usize,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `create` and `modify` calls.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.notes.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl NoteStore for MemoryNoteStore {
    fn exists(&self, path: &str) -> bool {
        self.notes.contains_key(path) || self.folders.contains(path)
    }

    fn create_folder(&mut self, path: &str) -> Result<(), NoteError> {
        self.folders.insert(path.to_string());
        Ok(())
    }

    fn create(&mut self, path: &str, text: &str) -> Result<(), NoteError> {
        if self.notes.contains_key(path) {
            return Err(NoteError::AlreadyExists(path.to_string()));
        }
        self.notes.insert(path.to_string(), text.to_string());
        self.writes += 1;
        Ok(())
    }

    fn read(&self, path: &str) -> Result<String, NoteError> {
        self.notes
            .get(path)
            .cloned()
            .ok_or_else(|| NoteError::Missing(path.to_string()))
    }

    fn modify(&mut self, path: &str, text: &str) -> Result<(), NoteError> {
        match self.notes.get_mut(path) {
            Some(existing) => {
                *existing = text.to_string();
                self.writes += 1;
                Ok(())
            }
            None => Err(NoteError::Missing(path.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Result of materializing the notes of one record.
#[derive(Debug)]
pub struct NoteReport {
    pub game: Result<NoteOutcome, NoteError>,
    /// `None` when the record has no variations.
    pub review: Option<Result<NoteOutcome, NoteError>>,
}

impl NoteReport {
    pub fn failures(&self) -> usize {
        let game = usize::from(self.game.is_err());
        let review = usize::from(matches!(self.review, Some(Err(_))));
        game + review
    }
}

/// Writes the companion notes of indexed records.
#[derive(Debug, Clone)]
pub struct NoteMaterializer {
    game_folder: String,
    review_folder: String,
}

impl NoteMaterializer {
    pub fn new(game_folder: impl Into<String>, review_folder: impl Into<String>) -> Self {
        Self {
            game_folder: trim_folder(game_folder.into()),
            review_folder: trim_folder(review_folder.into()),
        }
    }

    /// `<game folder>/<path below the root>.md`, e.g. `sgf-notes/2023/game1.sgf.md`.
    pub fn game_note_path(&self, record: &GameRecord) -> String {
        note_path(&self.game_folder, &record.source.note_key())
    }

    pub fn review_note_path(&self, record: &GameRecord) -> String {
        note_path(&self.review_folder, &record.source.note_key())
    }

    /// Upserts the game note, and the review note when the record branches.
    /// Failures are logged and reported, never propagated.
    pub fn materialize<S: NoteStore + ?Sized>(
        &self,
        store: &mut S,
        record: &GameRecord,
        raw: &str,
    ) -> NoteReport {
        let game_path = self.game_note_path(record);
        let game = ensure_parent(store, &game_path)
            .and_then(|()| upsert(store, &game_path, &game_note_body(raw)));
        if let Err(e) = &game {
            log::warn(format!("Game note for '{}' not written: {}", record.source.name, e));
        }

        let review = (!record.branch_move_numbers.is_empty()).then(|| {
            let review_path = self.review_note_path(record);
            let result = ensure_parent(store, &review_path)
                .and_then(|()| upsert(store, &review_path, &review_note_body(record)));
            if let Err(e) = &result {
                log::warn(format!(
                    "Review note for '{}' not written: {}",
                    record.source.name, e
                ));
            }
            result
        });

        NoteReport { game, review }
    }
}

fn trim_folder(folder: String) -> String {
    folder.trim_matches('/').to_string()
}

fn note_path(folder: &str, key: &str) -> String {
    if folder.is_empty() {
        format!("{key}.md")
    } else {
        format!("{folder}/{key}.md")
    }
}

/// Creates the folder holding `note`, parents included.
fn ensure_parent<S: NoteStore + ?Sized>(store: &mut S, note: &str) -> Result<(), NoteError> {
    let Some((folder, _)) = note.rsplit_once('/') else {
        return Ok(());
    };
    if store.exists(folder) {
        return Ok(());
    }
    store.create_folder(folder)
}

/// Creates the note, or rewrites it only when its body changed. An existing
/// note that cannot be read is rewritten.
pub fn upsert<S: NoteStore + ?Sized>(
    store: &mut S,
    path: &str,
    body: &str,
) -> Result<NoteOutcome, NoteError> {
    if !store.exists(path) {
        store.create(path, body)?;
        log::debug(format!("Created note '{path}'"));
        return Ok(NoteOutcome::Created);
    }

    match store.read(path) {
        Ok(existing) if existing == body => return Ok(NoteOutcome::Unchanged),
        Ok(_) => {}
        Err(e) => log::warn(format!("Rewriting unreadable note: {e}")),
    }

    store.modify(path, body)?;
    log::debug(format!("Updated note '{path}'"));
    Ok(NoteOutcome::Updated)
}

pub fn game_note_body(raw: &str) -> String {
    format!("```sgf\n{}\n```\n", raw.trim())
}

pub fn review_note_body(record: &GameRecord) -> String {
    let source = record.source.path.to_string_lossy().replace('\\', "/");
    record
        .branch_move_numbers
        .iter()
        .map(|ply| format!("## Move {ply}\n\n```sgf-board\nfile: {source}\nmove: {ply}\n```\n"))
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}
