use chrono::NaiveDate;

pub const EVEN_GAME: &str = "Even game";

const BLACK_PREFIX: &str = "B+";
const WHITE_PREFIX: &str = "W+";

/// Winner encoded at the start of a raw `RE` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Black,
    White,
}

impl Winner {
    pub fn from_result(raw: &str) -> Option<Self> {
        let s = raw.trim_start();
        if s.starts_with(BLACK_PREFIX) {
            Some(Self::Black)
        } else if s.starts_with(WHITE_PREFIX) {
            Some(Self::White)
        } else {
            None
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Black => "Black",
            Self::White => "White",
        }
    }
}

pub fn format_handicap(raw: &str) -> String {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => format!("{n}-stone handicap"),
        _ => EVEN_GAME.to_string(),
    }
}

pub fn format_result(raw: &str) -> String {
    let Some(winner) = Winner::from_result(raw) else {
        return raw.to_string();
    };

    // Both prefixes are two bytes long.
    let margin = raw.trim_start()[2..].trim();
    let label = winner.label();

    let code = margin.to_ascii_lowercase();
    match code.as_str() {
        "r" | "resign" => return format!("{label} resignation win"),
        "t" | "time" => return format!("{label} time win"),
        "f" | "forfeit" => return format!("{label} forfeit win"),
        _ => {}
    }

    let Ok(points) = margin.parse::<f64>() else {
        return raw.to_string();
    };
    if !points.is_finite() {
        return raw.to_string();
    }

    if points.fract() == 0.0 {
        format!("{label} {}-point win", points as i64)
    } else if points.fract() == 0.5 {
        format!("{label} {}-and-a-half-point win", points.floor() as i64)
    } else {
        format!("{label} {margin}-point win")
    }
}

/// Win rate with one decimal, `round(wins * 1000 / total) / 10`.
pub fn percentage(wins: usize, total: usize) -> String {
    if total == 0 {
        return "0.0".to_string();
    }
    let tenths = (wins as f64 * 1000.0 / total as f64).round() / 10.0;
    format!("{tenths:.1}")
}

/// First date of an SGF `DT` value (`2024-03-02,03` -> 2024-03-02).
/// Missing or `??` month/day parts fall back to 01; an unknown year yields `None`.
pub fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let first = raw.split(',').next()?.trim();
    if first.is_empty() {
        return None;
    }

    let normalized = first.replace('.', "-");
    let mut parts = normalized.split('-');

    let year_s = parts.next()?;
    if year_s.contains('?') {
        return None;
    }
    let year = year_s.parse::<i32>().ok()?;

    let part_or_first = |part: Option<&str>| -> Option<u32> {
        match part {
            None => Some(1),
            Some(p) if p.contains('?') => Some(1),
            Some(p) => p.parse::<u32>().ok(),
        }
    };
    let month = part_or_first(parts.next())?;
    let day = part_or_first(parts.next())?;

    if parts.next().is_some() {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}
