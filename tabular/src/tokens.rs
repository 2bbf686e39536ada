//! Splitting raw input text into tokens

/// Delimiter between tokens in the input text
pub const TOKEN_DELIMITER: char = ',';

/// Split `raw` on `delimiter`, keeping order.
///
/// Tokens are neither trimmed nor filtered, so `"a,,b"` yields an empty
/// middle token and `" a"` keeps its space. Empty input yields no tokens.
pub fn split_tokens(raw: &str, delimiter: char) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(delimiter).map(str::to_string).collect()
}
