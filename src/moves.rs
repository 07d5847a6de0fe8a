use super::types::{Color, OpeningMoves, Stone};
use serde::Deserialize;

/// How far the opening extraction follows the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MainLine {
    /// Stone nodes in plain text order. A variation stored before the
    /// main line reaches the ply limit contributes its moves too.
    #[default]
    Textual,
    /// Stop at the first closing parenthesis, i.e. follow first children only.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Move { color: Color, value: &'a str },
}

/// Minimal SGF lexer: game-tree delimiters and `B[..]` / `W[..]` values.
/// Values of all other properties are skipped so that brackets or
/// parentheses inside comments never count as structure.
struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Returns the value between `[` at `self.pos` and its closing `]`,
    /// or `None` when the bracket is never closed.
    fn read_value(&mut self) -> Option<&'a str> {
        let text = self.text;
        let bytes = text.as_bytes();
        let start = self.pos + 1;
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b']' => {
                    self.pos = i + 1;
                    return Some(&text[start..i]);
                }
                _ => i += 1,
            }
        }
        self.pos = bytes.len();
        None
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let text = self.text;
        let bytes = text.as_bytes();
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'(' => {
                    self.pos += 1;
                    return Some(Token::Open);
                }
                b')' => {
                    self.pos += 1;
                    return Some(Token::Close);
                }
                b'[' => {
                    // Stray value without a property name.
                    self.read_value()?;
                }
                b if b.is_ascii_alphabetic() => {
                    let ident_start = self.pos;
                    while self.pos < bytes.len() && bytes[self.pos].is_ascii_alphabetic() {
                        self.pos += 1;
                    }
                    let ident = &text[ident_start..self.pos];
                    self.skip_whitespace();

                    let color = match ident {
                        "B" => Some(Color::Black),
                        "W" => Some(Color::White),
                        _ => None,
                    };

                    let mut first_value = None;
                    while self.pos < bytes.len() && bytes[self.pos] == b'[' {
                        let value = self.read_value()?;
                        first_value.get_or_insert(value);
                        self.skip_whitespace();
                    }

                    if let (Some(color), Some(value)) = (color, first_value) {
                        return Some(Token::Move { color, value });
                    }
                }
                _ => self.pos += 1,
            }
        }
        None
    }
}

/// Maps a two-letter lowercase coordinate to a stone (`a` -> 1).
fn parse_stone(color: Color, value: &str) -> Option<Stone> {
    let bytes = value.as_bytes();
    if bytes.len() != 2 {
        return None;
    }

    let axis = |b: u8| -> Option<i32> {
        if b.is_ascii_lowercase() {
            Some(i32::from(b - b'a') + 1)
        } else {
            None
        }
    };

    let x = axis(bytes[0])?;
    let y = axis(bytes[1])?;
    if x <= 0 || y <= 0 {
        return None;
    }
    Some(Stone::new(x, y, color))
}

/// First `limit` stones of the record in text order.
pub fn extract_opening_moves(raw: &str, limit: usize) -> OpeningMoves {
    extract_opening_moves_with(raw, limit, MainLine::Textual)
}

pub fn extract_opening_moves_with(raw: &str, limit: usize, mode: MainLine) -> OpeningMoves {
    let mut moves = OpeningMoves::new();
    if limit == 0 {
        return moves;
    }

    for token in Lexer::new(raw) {
        match token {
            Token::Open => {}
            Token::Close => {
                if mode == MainLine::Strict {
                    break;
                }
            }
            Token::Move { color, value } => {
                if let Some(stone) = parse_stone(color, value) {
                    moves.push(stone);
                    if moves.len() >= limit {
                        break;
                    }
                }
            }
        }
    }

    moves
}

/// Ply counts at which each variation after the first one starts.
pub fn detect_branch_points(raw: &str) -> Vec<u32> {
    let mut branches = Vec::new();
    let mut stack: Vec<u32> = Vec::new();
    let mut ply: u32 = 0;
    let mut seen_open = false;

    for token in Lexer::new(raw) {
        match token {
            Token::Open => {
                stack.push(ply);
                if seen_open {
                    if let Some(&top) = stack.last() {
                        branches.push(top);
                    }
                } else {
                    seen_open = true;
                }
            }
            Token::Close => {
                if let Some(restored) = stack.pop() {
                    ply = restored;
                }
            }
            Token::Move { color, value } => {
                if parse_stone(color, value).is_some() {
                    ply += 1;
                }
            }
        }
    }

    branches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn points(moves: &OpeningMoves) -> Vec<(i32, i32, Color)> {
        moves
            .iter()
            .map(|s| (s.point.x, s.point.y, s.color))
            .collect()
    }

    #[test]
    fn test_extract_basic_sequence() {
        let raw = "(;SZ[19]PB[a]PW[b];B[pd];W[dp];B[pq])";
        let moves = extract_opening_moves(raw, 7);
        assert_eq!(
            points(&moves),
            vec![
                (16, 4, Color::Black),
                (4, 16, Color::White),
                (16, 17, Color::Black)
            ]
        );
    }

    #[test]
    fn test_extract_respects_limit() {
        let raw = "(;B[aa];W[bb];B[cc];W[dd];B[ee];W[ff];B[gg];W[hh];B[ii])";
        let moves = extract_opening_moves(raw, 7);
        assert_eq!(moves.len(), 7);
        assert_eq!(moves[6].point, Point::new(7, 7));
    }

    #[test]
    fn test_extract_skips_pass_and_malformed_without_consuming_slot() {
        let raw = "(;B[];W[abc];B[A1];W[dd];B[c])";
        let moves = extract_opening_moves(raw, 1);
        assert_eq!(points(&moves), vec![(4, 4, Color::White)]);
    }

    #[test]
    fn test_extract_ignores_player_and_setup_properties() {
        let raw = "(;PB[Black Player]PW[White]AB[dd][pp]AW[dp];B[qd])";
        let moves = extract_opening_moves(raw, 7);
        assert_eq!(points(&moves), vec![(17, 4, Color::Black)]);
    }

    #[test]
    fn test_extract_ignores_moves_inside_comments() {
        let raw = "(;C[B or W (here)];B[bb])";
        let moves = extract_opening_moves(raw, 7);
        assert_eq!(points(&moves), vec![(2, 2, Color::Black)]);
    }

    #[test]
    fn test_extract_zero_limit() {
        assert!(extract_opening_moves("(;B[aa])", 0).is_empty());
    }

    #[test]
    fn test_extract_textual_includes_early_variation() {
        // Variation stored before the main line reaches the limit leaks into
        // the textual opening.
        let raw = "(;B[aa](;W[bb];B[cc])(;W[dd]))";
        let textual = extract_opening_moves(raw, 7);
        assert_eq!(
            points(&textual),
            vec![
                (1, 1, Color::Black),
                (2, 2, Color::White),
                (3, 3, Color::Black),
                (4, 4, Color::White)
            ]
        );
    }

    #[test]
    fn test_extract_strict_follows_first_children() {
        let raw = "(;B[aa](;W[bb];B[cc])(;W[dd]))";
        let strict = extract_opening_moves_with(raw, 7, MainLine::Strict);
        assert_eq!(
            points(&strict),
            vec![
                (1, 1, Color::Black),
                (2, 2, Color::White),
                (3, 3, Color::Black)
            ]
        );
    }

    #[test]
    fn test_extract_escaped_bracket_in_comment() {
        let raw = r"(;C[a \] b W\[aa\]];B[cd])";
        let moves = extract_opening_moves(raw, 7);
        assert_eq!(points(&moves), vec![(3, 4, Color::Black)]);
    }

    #[test]
    fn test_branch_points_single_line() {
        assert!(detect_branch_points("(;SZ[19];B[pd];W[dd])").is_empty());
        assert!(detect_branch_points("").is_empty());
    }

    #[test]
    fn test_branch_points_siblings_share_ply() {
        let raw = "(;B[aa];W[bb](;B[cc])(;B[dd]))";
        assert_eq!(detect_branch_points(raw), vec![2, 2]);
    }

    #[test]
    fn test_branch_points_nested() {
        let raw = "(;B[aa](;W[bb];B[cc](;W[dd])(;W[ee]))(;W[ff]))";
        assert_eq!(detect_branch_points(raw), vec![1, 3, 3, 1]);
    }

    #[test]
    fn test_branch_points_passes_do_not_count() {
        let raw = "(;B[aa];W[];B[cc](;W[dd])(;W[ee]))";
        assert_eq!(detect_branch_points(raw), vec![2, 2]);
    }

    #[test]
    fn test_branch_points_ignore_parentheses_in_comments() {
        let raw = "(;B[aa]C[(a) (b)];W[bb])";
        assert!(detect_branch_points(raw).is_empty());
    }

    #[test]
    fn test_branch_points_unbalanced_close() {
        let raw = "(;B[aa]));B[bb](;W[cc])";
        assert_eq!(detect_branch_points(raw), vec![1]);
    }

    #[test]
    fn test_unterminated_value_stops_lexing() {
        let raw = "(;B[aa];C[never closed (;W[bb])";
        assert_eq!(extract_opening_moves(raw, 7).len(), 1);
        assert!(detect_branch_points(raw).is_empty());
    }
}
