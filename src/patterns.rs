use super::config::{PatternColor, PatternConfig};
use super::types::{Color, Point, Stone};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningPattern {
    pub name: String,
    pub points: BTreeSet<Point>,
    pub color: PatternColor,
}

impl OpeningPattern {
    /// True when every point is occupied in `moves` and all those stones share
    /// one color. The first stone played on a point is the one that counts.
    pub fn matches(&self, moves: &[Stone]) -> bool {
        if self.points.is_empty() {
            return false;
        }

        let mut color: Option<Color> = None;
        for point in &self.points {
            let Some(stone) = moves.iter().find(|s| s.point == *point) else {
                return false;
            };
            match color {
                None => color = Some(stone.color),
                Some(c) if c != stone.color => return false,
                Some(_) => {}
            }
        }

        match (self.color, color) {
            (PatternColor::Any, _) => true,
            (PatternColor::Black, Some(c)) => c == Color::Black,
            (PatternColor::White, Some(c)) => c == Color::White,
            (_, None) => false,
        }
    }
}

/// Configured patterns keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpeningPatterns {
    patterns: Vec<OpeningPattern>,
}

impl OpeningPatterns {
    /// Entries sharing a name are merged into one pattern (union of points).
    /// The first entry naming a color decides the color of the merged pattern.
    /// Off-board points are dropped, and so is a pattern left without points.
    pub fn from_config(entries: &[PatternConfig]) -> Self {
        let mut merged: BTreeMap<String, (BTreeSet<Point>, PatternColor)> = BTreeMap::new();
        for entry in entries {
            let name = entry.name.trim();
            if name.is_empty() {
                continue;
            }
            let (points, color) = merged.entry(name.to_string()).or_default();
            if *color == PatternColor::Any {
                *color = entry.color;
            }
            points.extend(
                entry
                    .points
                    .iter()
                    .map(|[x, y]| Point::new(*x, *y))
                    .filter(|p| p.is_on_board()),
            );
        }

        let patterns = merged
            .into_iter()
            .filter(|(_, (points, _))| !points.is_empty())
            .map(|(name, (points, color))| OpeningPattern {
                name,
                points,
                color,
            })
            .collect();

        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpeningPattern> {
        self.patterns.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.name.as_str())
    }
}

/// Names of all patterns the opening satisfies.
pub fn match_patterns(moves: &[Stone], patterns: &OpeningPatterns) -> BTreeSet<String> {
    patterns
        .iter()
        .filter(|pattern| pattern.matches(moves))
        .map(|pattern| pattern.name.clone())
        .collect()
}
