use super::error::ViewError;
use super::format::EVEN_GAME;
use super::stats::{AggregateStats, aggregate};
use super::types::GameRecord;
use serde::Serialize;
use std::collections::BTreeSet;

pub const PAGE_SIZE_CHOICES: [usize; 4] = [10, 20, 50, 100];

/// Label of the handicap picker entry that disables the filter.
pub const ALL_HANDICAPS: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    pub board_size: u32,
    pub patterns_configured: bool,
    /// Initial page size, one of [`PAGE_SIZE_CHOICES`].
    pub page_size: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            board_size: 19,
            patterns_configured: false,
            page_size: PAGE_SIZE_CHOICES[0],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HandicapFilter {
    #[default]
    All,
    /// Exact match on the displayed handicap, e.g. "2-stone handicap".
    Exact(String),
}

impl HandicapFilter {
    /// Parses a picker value; "all" (any case) or an empty value disables the filter.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(ALL_HANDICAPS) {
            Self::All
        } else {
            Self::Exact(value.to_string())
        }
    }

    fn accepts(&self, record: &GameRecord) -> bool {
        match self {
            Self::All => true,
            Self::Exact(display) => record.handicap_display == *display,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub keyword: String,
    pub handicap_filter: HandicapFilter,
    pub page_size: usize,
    /// 1-based.
    pub current_page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            handicap_filter: HandicapFilter::All,
            page_size: PAGE_SIZE_CHOICES[0],
            current_page: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pager {
    pub current: usize,
    pub total: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl Pager {
    pub fn label(&self) -> String {
        format!("Page {} / {}", self.current, self.total)
    }
}

/// Everything a renderer needs for one screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOutput {
    pub stats: AggregateStats,
    /// Indices into the controller's records, in display order.
    pub rows: Vec<usize>,
    pub pager: Pager,
    pub filtered_count: usize,
}

pub struct ViewController {
    config: ViewConfig,
    records: Vec<GameRecord>,
    state: ViewState,
    output: ViewOutput,
}

impl ViewController {
    pub fn new(config: ViewConfig, records: Vec<GameRecord>) -> Self {
        let state = ViewState {
            page_size: if PAGE_SIZE_CHOICES.contains(&config.page_size) {
                config.page_size
            } else {
                PAGE_SIZE_CHOICES[0]
            },
            ..ViewState::default()
        };
        let mut controller = Self {
            config,
            records,
            state,
            output: ViewOutput {
                stats: AggregateStats::default(),
                rows: Vec::new(),
                pager: Pager {
                    current: 1,
                    total: 1,
                    has_prev: false,
                    has_next: false,
                },
                filtered_count: 0,
            },
        };
        controller.refresh();
        controller
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn output(&self) -> &ViewOutput {
        &self.output
    }

    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    /// Records of the current page, in display order.
    pub fn page_records(&self) -> impl Iterator<Item = &GameRecord> {
        self.output.rows.iter().map(|&i| &self.records[i])
    }

    pub fn set_keyword(&mut self, keyword: impl Into<String>) {
        self.state.keyword = keyword.into();
        self.state.current_page = 1;
        self.refresh();
    }

    pub fn set_handicap_filter(&mut self, filter: HandicapFilter) {
        self.state.handicap_filter = filter;
        self.state.current_page = 1;
        self.refresh();
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), ViewError> {
        if !PAGE_SIZE_CHOICES.contains(&page_size) {
            return Err(ViewError::UnsupportedPageSize {
                requested: page_size,
                choices: PAGE_SIZE_CHOICES.to_vec(),
            });
        }
        self.state.page_size = page_size;
        self.state.current_page = 1;
        self.refresh();
        Ok(())
    }

    /// Jumps to `page`, clamped into range.
    pub fn set_page(&mut self, page: usize) {
        self.state.current_page = page;
        self.refresh();
    }

    pub fn prev_page(&mut self) {
        if self.state.current_page > 1 {
            self.state.current_page -= 1;
            self.refresh();
        }
    }

    pub fn next_page(&mut self) {
        if self.state.current_page < self.output.pager.total {
            self.state.current_page += 1;
            self.refresh();
        }
    }

    /// Distinct handicap values among the records of the active board size,
    /// "all" first, then even game, then by ascending stone count.
    pub fn handicap_options(&self) -> Vec<String> {
        let mut values: BTreeSet<(i64, &str)> = BTreeSet::new();
        for record in self.on_board() {
            let stones = if record.handicap_display == EVEN_GAME {
                0
            } else {
                record.handicap_raw.trim().parse().unwrap_or(i64::MAX)
            };
            values.insert((stones, record.handicap_display.as_str()));
        }

        std::iter::once(ALL_HANDICAPS.to_string())
            .chain(values.into_iter().map(|(_, display)| display.to_string()))
            .collect()
    }

    fn on_board(&self) -> impl Iterator<Item = &GameRecord> {
        let board_size = self.config.board_size;
        self.records.iter().filter(move |r| r.board_size == board_size)
    }

    fn refresh(&mut self) {
        let mut filtered: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.board_size == self.config.board_size)
            .filter(|(_, r)| self.state.handicap_filter.accepts(r))
            .filter(|(_, r)| !self.config.patterns_configured || !r.matched_patterns.is_empty())
            .map(|(i, _)| i)
            .collect();

        let stats = aggregate(filtered.iter().map(|&i| &self.records[i]));

        let keyword = self.state.keyword.trim().to_lowercase();
        if !keyword.is_empty() {
            filtered.sort_by_key(|&i| keyword_rank(&self.records[i], &keyword));
        }

        let page_size = self.state.page_size;
        let total = filtered.len().div_ceil(page_size).max(1);
        let current = self.state.current_page.clamp(1, total);
        self.state.current_page = current;

        let start = (current - 1) * page_size;
        let rows = filtered
            .iter()
            .skip(start)
            .take(page_size)
            .copied()
            .collect();

        self.output = ViewOutput {
            stats,
            rows,
            pager: Pager {
                current,
                total,
                has_prev: current > 1,
                has_next: current < total,
            },
            filtered_count: filtered.len(),
        };
    }
}

/// 0 for an exact player match, 1 for a partial one, 2 otherwise.
/// `keyword` must already be lowercase.
fn keyword_rank(record: &GameRecord, keyword: &str) -> u8 {
    let black = record.black_player.to_lowercase();
    let white = record.white_player.to_lowercase();
    if black == keyword || white == keyword {
        0
    } else if black.contains(keyword) || white.contains(keyword) {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{format_handicap, format_result};
    use crate::types::SourceRef;
    use pretty_assertions::assert_eq;

    fn record(name: &str, black: &str, white: &str, handicap: &str, result: &str) -> GameRecord {
        GameRecord {
            source: SourceRef::new(format!("games/{name}.sgf")),
            black_player: black.to_string(),
            white_player: white.to_string(),
            handicap_raw: handicap.to_string(),
            handicap_display: format_handicap(handicap),
            result_raw: result.to_string(),
            result_display: format_result(result),
            board_size: 19,
            ..GameRecord::default()
        }
    }

    fn numbered(count: usize) -> Vec<GameRecord> {
        (0..count)
            .map(|i| record(&format!("g{i}"), "a", "b", "", "B+R"))
            .collect()
    }

    fn names(view: &ViewController) -> Vec<String> {
        view.page_records().map(|r| r.source.name.clone()).collect()
    }

    #[test]
    fn test_default_state() {
        let view = ViewController::new(ViewConfig::default(), Vec::new());
        assert_eq!(view.state(), &ViewState::default());
        assert_eq!(
            view.output().pager,
            Pager {
                current: 1,
                total: 1,
                has_prev: false,
                has_next: false
            }
        );
        assert!(view.output().rows.is_empty());
    }

    #[test]
    fn test_total_pages_for_every_choice() {
        for count in [0, 1, 9, 10, 11, 55, 101, 250] {
            let mut view = ViewController::new(ViewConfig::default(), numbered(count));
            for size in PAGE_SIZE_CHOICES {
                view.set_page_size(size).unwrap();
                let expected = count.div_ceil(size).max(1);
                assert_eq!(view.output().pager.total, expected, "count {count} size {size}");
                assert_eq!(view.state().current_page, 1);
            }
        }
    }

    #[test]
    fn test_paging_is_clamped() {
        let mut view = ViewController::new(ViewConfig::default(), numbered(25));
        assert_eq!(view.output().pager.total, 3);

        view.prev_page();
        assert_eq!(view.state().current_page, 1);

        view.next_page();
        view.next_page();
        assert_eq!(view.state().current_page, 3);
        assert_eq!(view.output().rows.len(), 5);
        assert!(view.output().pager.has_prev);
        assert!(!view.output().pager.has_next);

        view.next_page();
        assert_eq!(view.state().current_page, 3);

        view.set_page(0);
        assert_eq!(view.state().current_page, 1);
        view.set_page(99);
        assert_eq!(view.state().current_page, 3);
    }

    #[test]
    fn test_page_slice() {
        let mut view = ViewController::new(ViewConfig::default(), numbered(25));
        view.next_page();
        assert_eq!(view.output().rows, (10..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_set_page_size_rejects_unknown_choice() {
        let mut view = ViewController::new(ViewConfig::default(), numbered(25));
        view.next_page();

        let err = view.set_page_size(15).unwrap_err();
        assert_eq!(
            err,
            ViewError::UnsupportedPageSize {
                requested: 15,
                choices: vec![10, 20, 50, 100]
            }
        );
        assert_eq!(view.state().page_size, 10);
        assert_eq!(view.state().current_page, 2);
    }

    #[test]
    fn test_transitions_reset_page() {
        let mut view = ViewController::new(ViewConfig::default(), numbered(25));
        view.next_page();
        view.set_keyword("a");
        assert_eq!(view.state().current_page, 1);

        view.next_page();
        view.set_handicap_filter(HandicapFilter::All);
        assert_eq!(view.state().current_page, 1);

        view.next_page();
        view.set_page_size(20).unwrap();
        assert_eq!(view.state().current_page, 1);
    }

    #[test]
    fn test_board_size_restriction() {
        let mut small = record("small", "a", "b", "", "W+R");
        small.board_size = 13;
        let records = vec![record("big", "a", "b", "", "B+R"), small];

        let view = ViewController::new(ViewConfig::default(), records);
        assert_eq!(view.output().filtered_count, 1);
        assert_eq!(view.output().stats.total(), 1);
        assert_eq!(names(&view), vec!["big.sgf"]);
    }

    #[test]
    fn test_handicap_filter_exact_display() {
        let records = vec![
            record("even", "a", "b", "", "B+R"),
            record("two", "a", "b", "2", "W+R"),
            record("three", "a", "b", "3", "W+R"),
        ];
        let mut view = ViewController::new(ViewConfig::default(), records);

        view.set_handicap_filter(HandicapFilter::parse("2-stone handicap"));
        assert_eq!(names(&view), vec!["two.sgf"]);
        assert_eq!(view.output().stats.white_wins(), 1);

        view.set_handicap_filter(HandicapFilter::parse("All"));
        assert_eq!(view.output().filtered_count, 3);
    }

    #[test]
    fn test_patterns_configured_drops_unmatched() {
        let mut matched = record("matched", "a", "b", "", "B+R");
        matched.matched_patterns.insert("hoshi".to_string());
        let records = vec![record("plain", "a", "b", "", "W+R"), matched];

        let config = ViewConfig {
            patterns_configured: true,
            ..ViewConfig::default()
        };
        let view = ViewController::new(config, records.clone());
        assert_eq!(names(&view), vec!["matched.sgf"]);
        assert_eq!(view.output().stats.total(), 1);

        let unconfigured = ViewController::new(ViewConfig::default(), records);
        assert_eq!(unconfigured.output().filtered_count, 2);
    }

    #[test]
    fn test_keyword_sort_tiers_are_stable() {
        let records = vec![
            record("other", "Cho", "Kim", "", ""),
            record("partial1", "Iyama Yuta", "Kim", "", ""),
            record("exact1", "Lee", "iyama", "", ""),
            record("partial2", "Kim", "IYAMA Yuta", "", ""),
            record("exact2", "Iyama", "Cho", "", ""),
        ];
        let mut view = ViewController::new(ViewConfig::default(), records);
        view.set_keyword("Iyama");

        assert_eq!(
            names(&view),
            vec![
                "exact1.sgf",
                "exact2.sgf",
                "partial1.sgf",
                "partial2.sgf",
                "other.sgf"
            ]
        );
    }

    #[test]
    fn test_keyword_does_not_filter_or_change_stats() {
        let records = vec![
            record("a", "Cho", "Kim", "", "B+R"),
            record("b", "Lee", "Park", "", "W+R"),
        ];
        let mut view = ViewController::new(ViewConfig::default(), records);
        let before = view.output().stats.clone();

        view.set_keyword("park");
        assert_eq!(view.output().filtered_count, 2);
        assert_eq!(view.output().stats, before);
        assert_eq!(names(&view), vec!["b.sgf", "a.sgf"]);

        view.set_keyword("");
        assert_eq!(names(&view), vec!["a.sgf", "b.sgf"]);
    }

    #[test]
    fn test_handicap_options() {
        let mut small = record("small", "a", "b", "9", "");
        small.board_size = 13;
        let records = vec![
            record("three", "a", "b", "3", ""),
            record("even", "a", "b", "0", ""),
            record("two", "a", "b", "2", ""),
            record("two-again", "a", "b", "2", ""),
            small,
        ];
        let view = ViewController::new(ViewConfig::default(), records);

        assert_eq!(
            view.handicap_options(),
            vec![
                "all",
                "Even game",
                "2-stone handicap",
                "3-stone handicap"
            ]
        );
    }

    #[test]
    fn test_invalid_initial_page_size_falls_back() {
        let config = ViewConfig {
            page_size: 7,
            ..ViewConfig::default()
        };
        let view = ViewController::new(config, numbered(3));
        assert_eq!(view.state().page_size, 10);
    }
}
