use super::config::Config;
use super::error::{ConfigError, ErrorAccumulator};
use super::format::{format_handicap, format_result, parse_game_date};
use super::log;
use super::moves::{MainLine, detect_branch_points, extract_opening_moves_with};
use super::notes::{NoteMaterializer, NoteStore};
use super::patterns::{OpeningPatterns, match_patterns};
use super::reader::ReadOutcome;
use super::scanner::{self, FileTree};
use super::tags::{TagSet, parse_board_size};
use super::types::{GameRecord, SourceRef};
use std::path::Path;

/// Explicit settings for one indexing run.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub board_size: u32,
    pub patterns: OpeningPatterns,
    pub move_limit: usize,
    pub main_line: MainLine,
    pub game_note_folder: String,
    pub review_note_folder: String,
}

impl IndexerConfig {
    pub fn with_patterns(mut self, patterns: OpeningPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_board_size(mut self, board_size: u32) -> Self {
        self.board_size = board_size;
        self
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Config::default().indexer_config()
    }
}

/// Records kept by one run plus what happened along the way.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub records: Vec<GameRecord>,
    /// Files read as empty text, with the reason.
    pub degraded: Vec<(SourceRef, String)>,
    /// Files dropped because their board size differs from the filter.
    pub skipped_board_size: usize,
    pub note_failures: usize,
}

pub struct RecordIndexer {
    config: IndexerConfig,
    notes: NoteMaterializer,
}

impl RecordIndexer {
    pub fn new(config: IndexerConfig) -> Self {
        let notes = NoteMaterializer::new(
            config.game_note_folder.clone(),
            config.review_note_folder.clone(),
        );
        Self { config, notes }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Builds the record for `raw` without touching any note.
    /// `None` when the board size does not match the filter.
    pub fn build_record(&self, source: SourceRef, raw: &str) -> Option<GameRecord> {
        let tags = TagSet::extract(raw);

        let board_size = parse_board_size(&tags.board_size)?;
        if board_size != self.config.board_size {
            return None;
        }

        let opening_moves =
            extract_opening_moves_with(raw, self.config.move_limit, self.config.main_line);
        let matched_patterns = match_patterns(&opening_moves, &self.config.patterns);
        let branch_move_numbers = detect_branch_points(raw);

        let mut record = GameRecord {
            handicap_display: format_handicap(&tags.handicap),
            result_display: format_result(&tags.result),
            date: parse_game_date(&tags.date),
            source,
            black_player: tags.black_player,
            white_player: tags.white_player,
            game_name: tags.game_name,
            komi: tags.komi,
            handicap_raw: tags.handicap,
            result_raw: tags.result,
            board_size,
            opening_moves,
            matched_patterns,
            branch_move_numbers,
            note_ref: String::new(),
            parse_error: None,
        };
        record.note_ref = self.notes.game_note_path(&record);
        Some(record)
    }

    /// Indexes `files` in the given order, materializing notes as it goes.
    /// Unreadable files become empty records and leave their notes untouched;
    /// note failures are counted.
    pub fn index<T, S>(&self, tree: &T, store: &mut S, files: Vec<SourceRef>) -> IndexReport
    where
        T: FileTree + ?Sized,
        S: NoteStore + ?Sized,
    {
        let mut report = IndexReport::default();

        for source in files {
            let outcome = ReadOutcome::read(tree, &source.path);
            let mut diagnostics = ErrorAccumulator::default();
            if let Some(reason) = outcome.degraded_reason() {
                log::warn(reason);
                diagnostics.push(reason);
                report.degraded.push((source.clone(), reason.to_string()));
            }

            let raw = outcome.text();
            let Some(mut record) = self.build_record(source, raw) else {
                report.skipped_board_size += 1;
                continue;
            };
            record.parse_error = diagnostics.take();

            if outcome.degraded_reason().is_none() {
                let notes = self.notes.materialize(store, &record, raw);
                report.note_failures += notes.failures();
            }

            report.records.push(record);
        }

        log::info(format!(
            "Indexed {} record(s); {} skipped by board size, {} degraded, {} note failure(s)",
            report.records.len(),
            report.skipped_board_size,
            report.degraded.len(),
            report.note_failures
        ));
        report
    }
}

/// Checks the configured root, scans it and indexes every record found.
/// A glob root is expanded instead of walked.
pub fn index_corpus<T, S>(config: &Config, tree: &T, store: &mut S) -> Result<IndexReport, ConfigError>
where
    T: FileTree + ?Sized,
    S: NoteStore + ?Sized,
{
    config.validate()?;
    let root = config.record_root()?;
    let files = scan_root(tree, root)?;

    let indexer = RecordIndexer::new(config.indexer_config());
    Ok(indexer.index(tree, store, files))
}

fn scan_root<T: FileTree + ?Sized>(tree: &T, root: &Path) -> Result<Vec<SourceRef>, ConfigError> {
    let root_str = root.to_string_lossy();
    if scanner::is_glob_pattern(&root_str) {
        return scanner::scan_pattern(tree, &root_str).map_err(|source| {
            ConfigError::InvalidRootPattern {
                pattern: root_str.to_string(),
                source,
            }
        });
    }

    if !tree.is_container(root) {
        return Err(ConfigError::RootNotFound(root.to_path_buf()));
    }
    Ok(scanner::scan(tree, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PatternColor, PatternConfig};
    use crate::notes::MemoryNoteStore;
    use crate::types::{Color, Stone};
    use std::collections::BTreeMap;
    use std::io;
    use std::path::PathBuf;

    /// Flat in-memory folder; `None` contents simulate an unreadable file.
    struct FlatTree {
        files: BTreeMap<PathBuf, Option<String>>,
    }

    impl FlatTree {
        fn new(files: &[(&str, Option<&str>)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(p, t)| (PathBuf::from(p), t.map(str::to_string)))
                    .collect(),
            }
        }

        fn sources(&self) -> Vec<SourceRef> {
            self.files.keys().cloned().map(SourceRef::new).collect()
        }
    }

    impl FileTree for FlatTree {
        fn list_children(&self, _container: &Path) -> io::Result<Vec<PathBuf>> {
            Ok(self.files.keys().cloned().collect())
        }

        fn is_container(&self, entry: &Path) -> bool {
            entry == Path::new("games")
        }

        fn read_text(&self, file: &Path) -> io::Result<String> {
            match self.files.get(file) {
                Some(Some(text)) => Ok(text.clone()),
                _ => Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked")),
            }
        }
    }

    const GAME_A: &str = "(;GM[1]SZ[19]PB[Iyama Yuta]PW[Ichiriki Ryo]HA[0]RE[B+R]DT[2023-10-05]KM[6.5];B[pd];W[dd];B[pq];W[dp])";
    const GAME_B: &str = "(;SZ[19]PB[Shibano Toramaru]PW[Iyama Yuta]RE[W+2.5];B[dd];W[pp](;B[dp])(;B[pd]))";
    const GAME_C: &str = "(;SZ[13]PB[x]PW[y]RE[B+3];B[gg])";

    fn hoshi_patterns() -> OpeningPatterns {
        OpeningPatterns::from_config(&[PatternConfig {
            name: "hoshi".to_string(),
            points: vec![[16, 4], [16, 17]],
            color: PatternColor::Any,
        }])
    }

    #[test]
    fn test_build_record_fields() {
        let indexer = RecordIndexer::new(IndexerConfig::default().with_patterns(hoshi_patterns()));
        let record = indexer
            .build_record(SourceRef::new("games/a.sgf"), GAME_A)
            .unwrap();

        assert_eq!(record.black_player, "Iyama Yuta");
        assert_eq!(record.white_player, "Ichiriki Ryo");
        assert_eq!(record.handicap_raw, "0");
        assert_eq!(record.handicap_display, "Even game");
        assert_eq!(record.result_display, "Black resignation win");
        assert_eq!(record.komi, "6.5");
        assert_eq!(record.date.unwrap().to_string(), "2023-10-05");
        assert_eq!(record.board_size, 19);
        assert_eq!(record.opening_moves[0], Stone::new(16, 4, Color::Black));
        assert_eq!(record.opening_moves.len(), 4);
        assert!(record.matched_patterns.contains("hoshi"));
        assert!(record.branch_move_numbers.is_empty());
        assert_eq!(record.note_ref, "sgf-notes/a.sgf.md");
    }

    #[test]
    fn test_build_record_rejects_other_board_size() {
        let indexer = RecordIndexer::new(IndexerConfig::default());
        assert!(indexer.build_record(SourceRef::new("c.sgf"), GAME_C).is_none());
        assert!(indexer.build_record(SourceRef::new("c.sgf"), "(;SZ[huge])").is_none());

        let small = RecordIndexer::new(IndexerConfig::default().with_board_size(13));
        assert!(small.build_record(SourceRef::new("c.sgf"), GAME_C).is_some());
    }

    #[test]
    fn test_index_filters_board_size_and_writes_notes() {
        let tree = FlatTree::new(&[
            ("games/a.sgf", Some(GAME_A)),
            ("games/b.sgf", Some(GAME_B)),
            ("games/c.sgf", Some(GAME_C)),
        ]);
        let mut store = MemoryNoteStore::new();
        let indexer = RecordIndexer::new(IndexerConfig::default());

        let report = indexer.index(&tree, &mut store, tree.sources());
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.skipped_board_size, 1);
        assert_eq!(report.note_failures, 0);

        let b = report
            .records
            .iter()
            .find(|r| r.source.name == "b.sgf")
            .unwrap();
        assert_eq!(b.branch_move_numbers, vec![2, 2]);
        assert!(store.get("sgf-notes/a.sgf.md").is_some());
        assert!(store.get("sgf-notes/b.sgf.md").is_some());
        assert!(store.get("sgf-review/b.sgf.md").is_some());
        assert!(store.get("sgf-review/a.sgf.md").is_none());
        assert!(store.get("sgf-notes/c.sgf.md").is_none());
    }

    #[test]
    fn test_index_degrades_unreadable_file() {
        let tree = FlatTree::new(&[("games/a.sgf", Some(GAME_A)), ("games/locked.sgf", None)]);
        let mut store = MemoryNoteStore::new();
        let indexer = RecordIndexer::new(IndexerConfig::default());

        let report = indexer.index(&tree, &mut store, tree.sources());
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.degraded.len(), 1);

        let locked = report
            .records
            .iter()
            .find(|r| r.source.name == "locked.sgf")
            .unwrap();
        assert_eq!(locked.black_player, "");
        assert_eq!(locked.result_raw, "");
        assert!(locked.opening_moves.is_empty());
        assert!(locked.parse_error.as_deref().unwrap().contains("locked"));
        assert!(report.records.iter().any(|r| r.parse_error.is_none()));
    }

    #[test]
    fn test_failed_read_keeps_existing_note() {
        let mut store = MemoryNoteStore::new();
        let indexer = RecordIndexer::new(IndexerConfig::default());

        let readable = FlatTree::new(&[("games/a.sgf", Some(GAME_A))]);
        indexer.index(&readable, &mut store, readable.sources());
        let before = store.get("sgf-notes/a.sgf.md").map(str::to_string);
        assert!(before.as_deref().unwrap().contains("Iyama Yuta"));

        let locked = FlatTree::new(&[("games/a.sgf", None)]);
        let report = indexer.index(&locked, &mut store, locked.sources());
        assert_eq!(report.degraded.len(), 1);
        assert_eq!(report.records.len(), 1);
        assert_eq!(store.get("sgf-notes/a.sgf.md").map(str::to_string), before);
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_index_corpus_requires_root() {
        let tree = FlatTree::new(&[]);
        let mut store = MemoryNoteStore::new();

        let missing = index_corpus(&Config::default(), &tree, &mut store);
        assert!(matches!(missing, Err(ConfigError::MissingRoot)));

        let config = Config {
            root: Some(PathBuf::from("nowhere")),
            ..Config::default()
        };
        let not_found = index_corpus(&config, &tree, &mut store);
        assert!(matches!(not_found, Err(ConfigError::RootNotFound(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_index_corpus_scans_root() {
        let tree = FlatTree::new(&[
            ("games/a.sgf", Some(GAME_A)),
            ("games/b.sgf", Some(GAME_B)),
            ("games/c.sgf", Some(GAME_C)),
            ("games/readme.txt", Some("hello")),
        ]);
        let mut store = MemoryNoteStore::new();
        let config = Config {
            root: Some(PathBuf::from("games")),
            ..Config::default()
        };

        let report = index_corpus(&config, &tree, &mut store).unwrap();
        assert_eq!(report.records.len(), 2);
    }
}
