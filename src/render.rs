use super::stats::{AggregateStats, WinCounts};
use super::types::GameRecord;
use super::view::{Pager, ViewController};
use serde::Serialize;
use std::io::{self, Write};

pub const TABLE_HEADER: [&str; 9] = [
    "Black", "White", "Game", "Handicap", "Result", "Date", "Patterns", "Branches", "File",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TablePayload {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Output surface for one view. A `table` call replaces the previous table.
pub trait RenderSink {
    fn paragraphs(&mut self, lines: &[String]) -> io::Result<()>;
    fn table(&mut self, table: &TablePayload) -> io::Result<()>;
}

/// Keeps what was rendered, for tests and dry runs.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub paragraphs: Vec<String>,
    pub table: Option<TablePayload>,
}

impl RenderSink for BufferSink {
    fn paragraphs(&mut self, lines: &[String]) -> io::Result<()> {
        self.paragraphs.extend_from_slice(lines);
        Ok(())
    }

    fn table(&mut self, table: &TablePayload) -> io::Result<()> {
        self.table = Some(table.clone());
        Ok(())
    }
}

/// Plain-text sink with space-aligned columns.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSink for TextSink<W> {
    fn paragraphs(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    fn table(&mut self, table: &TablePayload) -> io::Result<()> {
        let mut widths: Vec<usize> = table.header.iter().map(|h| h.chars().count()).collect();
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let mut write_row = |cells: &[String]| -> io::Result<()> {
            let line = cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ");
            writeln!(self.out, "{}", line.trim_end())
        };

        write_row(&table.header)?;
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        write_row(&rule)?;
        for row in &table.rows {
            write_row(row)?;
        }
        self.out.flush()
    }
}

fn counts_line(label: &str, counts: &WinCounts) -> String {
    format!(
        "{label}: {} game(s), Black {} ({}%), White {} ({}%)",
        counts.total,
        counts.black_wins,
        counts.black_rate(),
        counts.white_wins,
        counts.white_rate()
    )
}

pub fn stats_paragraphs(stats: &AggregateStats) -> Vec<String> {
    let mut lines = vec![counts_line("All games", &stats.overall)];
    for (name, counts) in &stats.per_pattern {
        lines.push(counts_line(&format!("Pattern '{name}'"), counts));
    }
    lines
}

fn join<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn record_row(record: &GameRecord) -> Vec<String> {
    vec![
        record.black_player.clone(),
        record.white_player.clone(),
        record.game_name.clone(),
        record.handicap_display.clone(),
        record.result_display.clone(),
        record.date.map(|d| d.to_string()).unwrap_or_default(),
        join(&record.matched_patterns),
        join(&record.branch_move_numbers),
        record.source.name.clone(),
    ]
}

pub fn page_table<'a>(records: impl IntoIterator<Item = &'a GameRecord>) -> TablePayload {
    TablePayload {
        header: TABLE_HEADER.iter().map(|h| h.to_string()).collect(),
        rows: records.into_iter().map(record_row).collect(),
    }
}

/// Stats, pager label and the current page as a table.
pub fn render_view<S: RenderSink + ?Sized>(view: &ViewController, sink: &mut S) -> io::Result<()> {
    let output = view.output();
    let mut lines = stats_paragraphs(&output.stats);
    lines.push(format!(
        "{} ({} matching game(s))",
        output.pager.label(),
        output.filtered_count
    ));
    sink.paragraphs(&lines)?;
    sink.table(&page_table(view.page_records()))
}

#[derive(Serialize)]
struct PageJson<'a> {
    stats: &'a AggregateStats,
    pager: Pager,
    filtered_count: usize,
    records: Vec<&'a GameRecord>,
}

/// The current page as pretty-printed JSON.
pub fn render_json(view: &ViewController) -> serde_json::Result<String> {
    let output = view.output();
    serde_json::to_string_pretty(&PageJson {
        stats: &output.stats,
        pager: output.pager,
        filtered_count: output.filtered_count,
        records: view.page_records().collect(),
    })
}
