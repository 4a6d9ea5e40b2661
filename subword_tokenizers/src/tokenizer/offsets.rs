//! Relating encoded tokens back to the text they came from.

use crate::{
    error::TokenizerError,
    tokenizer::base_tokenizer::{Offset, OffsetSize},
};

/// Flattens optional offsets into `(begin, end)` pairs, using `(0, 0)` for
/// tokens (special or padding) that cover no text.
pub fn offset_mapping(offsets: &[Option<Offset>]) -> Vec<(OffsetSize, OffsetSize)> {
    offsets
        .iter()
        .map(|offset| offset.map_or((0, 0), |o| (o.begin, o.end)))
        .collect()
}

/// Index of the token covering the character at `char_index`.
pub fn char_to_token(
    offsets: &[Option<Offset>],
    char_index: OffsetSize,
) -> Option<usize> {
    offsets.iter().position(|offset| {
        offset.map_or(false, |o| o.begin <= char_index && char_index < o.end)
    })
}

/// Recovers the raw text covered by tokens `start_token..=end_token`, e.g.
/// the answer span predicted by a question answering model.
///
/// Tokens without an offset are ignored, a range made only of such tokens
/// gives an empty string.
pub fn extract_span<'a>(
    text: &'a str,
    offsets: &[Option<Offset>],
    start_token: usize,
    end_token: usize,
) -> Result<&'a str, TokenizerError> {
    if end_token < start_token || end_token >= offsets.len() {
        return Err(TokenizerError::EncodingError(format!(
            "Invalid token range {}..={} for a sequence of {} tokens",
            start_token,
            end_token,
            offsets.len()
        )));
    }

    let covered = offsets[start_token..=end_token].iter().flatten();
    let begin = covered.clone().map(|o| o.begin).min();
    let end = covered.map(|o| o.end).max();
    let (begin, end) = match (begin, end) {
        (Some(begin), Some(end)) => (begin as usize, end as usize),
        _ => return Ok(""),
    };

    let byte_begin = char_to_byte(text, begin);
    let byte_end = char_to_byte(text, end);
    Ok(&text[byte_begin..byte_end])
}

fn char_to_byte(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Glues WordPiece tokens back into words by dropping the `##` prefix of
/// continuation pieces.
pub fn merge_wordpieces<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut buffer = String::new();
    for token in tokens {
        let token = token.as_ref();
        if let Some(continuation) = token.strip_prefix("##") {
            buffer.push_str(continuation);
        } else {
            if !buffer.is_empty() {
                buffer.push(' ');
            }
            buffer.push_str(token);
        }
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets() -> Vec<Option<Offset>> {
        // [CLS] où est la tour ? [SEP]
        vec![
            None,
            Some(Offset::new(0, 2)),
            Some(Offset::new(3, 6)),
            Some(Offset::new(7, 9)),
            Some(Offset::new(10, 14)),
            Some(Offset::new(15, 16)),
            None,
        ]
    }

    #[test]
    fn special_tokens_map_to_empty_spans() {
        let mapping = offset_mapping(&offsets());

        assert_eq!(mapping[0], (0, 0));
        assert_eq!(mapping[1], (0, 2));
        assert_eq!(mapping[6], (0, 0));
    }

    #[test]
    fn characters_map_to_tokens() {
        let offsets = offsets();

        assert_eq!(char_to_token(&offsets, 0), Some(1));
        assert_eq!(char_to_token(&offsets, 1), Some(1));
        assert_eq!(char_to_token(&offsets, 2), None);
        assert_eq!(char_to_token(&offsets, 12), Some(4));
        assert_eq!(char_to_token(&offsets, 40), None);
    }

    #[test]
    fn extract_multi_byte_spans() {
        let text = "où est la tour ?";

        assert_eq!(extract_span(text, &offsets(), 1, 2).unwrap(), "où est");
        assert_eq!(extract_span(text, &offsets(), 3, 6).unwrap(), "la tour ?");
        assert_eq!(extract_span(text, &offsets(), 0, 0).unwrap(), "");
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let text = "où est la tour ?";

        assert!(extract_span(text, &offsets(), 3, 2).is_err());
        assert!(extract_span(text, &offsets(), 1, 7).is_err());
    }

    #[test]
    fn wordpieces_are_glued_back() {
        let tokens = ["una", "##ffa", "##ble", "world", "!"];

        assert_eq!(merge_wordpieces(&tokens[..3]), "unaffable");
        assert_eq!(merge_wordpieces(&tokens), "unaffable world !");
    }
}
