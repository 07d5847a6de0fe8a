use super::format::{Winner, percentage};
use super::types::GameRecord;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WinCounts {
    pub total: usize,
    pub black_wins: usize,
    pub white_wins: usize,
}

impl WinCounts {
    fn add(&mut self, winner: Option<Winner>) {
        self.total += 1;
        match winner {
            Some(Winner::Black) => self.black_wins += 1,
            Some(Winner::White) => self.white_wins += 1,
            None => {}
        }
    }

    pub fn black_rate(&self) -> String {
        percentage(self.black_wins, self.total)
    }

    pub fn white_rate(&self) -> String {
        percentage(self.white_wins, self.total)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    #[serde(flatten)]
    pub overall: WinCounts,
    pub per_pattern: BTreeMap<String, WinCounts>,
}

impl AggregateStats {
    pub fn total(&self) -> usize {
        self.overall.total
    }

    pub fn black_wins(&self) -> usize {
        self.overall.black_wins
    }

    pub fn white_wins(&self) -> usize {
        self.overall.white_wins
    }
}

/// Win counts over `records`, overall and for every matched pattern.
/// Games without a `B+`/`W+` result count toward totals only.
pub fn aggregate<'a, I>(records: I) -> AggregateStats
where
    I: IntoIterator<Item = &'a GameRecord>,
{
    let mut stats = AggregateStats::default();
    for record in records {
        let winner = Winner::from_result(&record.result_raw);
        stats.overall.add(winner);
        for name in &record.matched_patterns {
            stats
                .per_pattern
                .entry(name.clone())
                .or_default()
                .add(winner);
        }
    }
    stats
}
