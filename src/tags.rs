use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

pub const BOARD_SIZE: &str = "SZ";
pub const BLACK_PLAYER: &str = "PB";
pub const WHITE_PLAYER: &str = "PW";
pub const GAME_NAME: &str = "GN";
pub const HANDICAP: &str = "HA";
pub const RESULT: &str = "RE";
pub const DATE: &str = "DT";
pub const KOMI: &str = "KM";

const KNOWN_KEYS: [&str; 8] = [
    BOARD_SIZE,
    BLACK_PLAYER,
    WHITE_PLAYER,
    GAME_NAME,
    HANDICAP,
    RESULT,
    DATE,
    KOMI,
];

static KNOWN_TAG_RES: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    KNOWN_KEYS
        .iter()
        .map(|key| (*key, tag_regex(key).expect("valid known tag regex")))
        .collect()
});

fn tag_regex(key: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"{}\s*\[([^\]]*)\]", regex::escape(key)))
}

/// A tag key must start the text or follow whitespace, `;`, `(` or `]`.
fn is_tag_boundary(byte: u8) -> bool {
    byte.is_ascii_whitespace() || matches!(byte, b';' | b'(' | b']')
}

fn find_tag(re: &Regex, raw: &str) -> String {
    let bytes = raw.as_bytes();
    for caps in re.captures_iter(raw) {
        let Some(whole) = caps.get(0) else { continue };
        let start = whole.start();
        if start == 0 || is_tag_boundary(bytes[start - 1]) {
            return caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default().to_string();
        }
    }
    String::new()
}

/// Value of the first `key[...]` property in `raw`, trimmed, or `""`.
pub fn extract_tag(raw: &str, key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }

    if let Some(re) = KNOWN_TAG_RES.get(key) {
        return find_tag(re, raw);
    }

    match tag_regex(key) {
        Ok(re) => find_tag(&re, raw),
        Err(_) => String::new(),
    }
}

/// Root properties the indexer consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    pub board_size: String,
    pub black_player: String,
    pub white_player: String,
    pub game_name: String,
    pub handicap: String,
    pub result: String,
    pub date: String,
    pub komi: String,
}

impl TagSet {
    pub fn extract(raw: &str) -> Self {
        Self {
            board_size: extract_tag(raw, BOARD_SIZE),
            black_player: extract_tag(raw, BLACK_PLAYER),
            white_player: extract_tag(raw, WHITE_PLAYER),
            game_name: extract_tag(raw, GAME_NAME),
            handicap: extract_tag(raw, HANDICAP),
            result: extract_tag(raw, RESULT),
            date: extract_tag(raw, DATE),
            komi: extract_tag(raw, KOMI),
        }
    }
}

/// Board size from a raw `SZ` value. Absent means the SGF default of 19;
/// `19:13` style rectangular sizes use the first dimension.
pub fn parse_board_size(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(19);
    }
    let first = s.split(':').next().unwrap_or(s).trim();
    first.parse::<u32>().ok()
}
