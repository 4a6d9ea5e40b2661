// Copyright 2018 The Open AI Team Authors, The Google AI Language Team Authors
// Copyright 2018 The HuggingFace Inc. team.
// Copyright 2019-2020 Guillaume Becquin
// Copyright 2020 Maarten van Gompel
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{
    error::TokenizerError,
    tokenizer::{
        base_tokenizer::{
            Mask, Offset, OffsetSize, Side, Token, TokenIdsWithOffsets,
            TokenRef, TruncationStrategy,
        },
        constants::{
            in_ranges, ACCENT_MARKER_RANGES, ADDITIONAL_WHITESPACE_CHARS,
            BYTES_TO_UNICODE, CJK_RANGES, CONTROL_CHARS, PUNCTUATION_RANGES,
            WHITESPACE_CHARS,
        },
    },
    vocab::{BpePairRef, BpePairVocab, Vocab},
};
use regex::Regex;
use std::{
    char::REPLACEMENT_CHARACTER,
    cmp::min,
    collections::{HashMap, HashSet},
    sync::RwLock,
};
use unicode_normalization::char::decompose_canonical;

/// Memoized BPE output per byte-level word: the symbols and the number of
/// characters each one covers.
pub type BpeCache = RwLock<HashMap<String, (Vec<String>, Vec<usize>)>>;

/// Cleans text by removing control characters and normalizing whitespace
pub fn clean_text(token: &mut Token, strict: bool) {
    let capacity = token.text.capacity();
    let mut cleaned_string = String::with_capacity(capacity);
    let mut character_mapping: Vec<OffsetSize> = Vec::with_capacity(capacity);
    for (character, position) in
        token.text.chars().zip(token.reference_offsets.iter())
    {
        if is_control(&character, strict)
            || character == '\x00'
            || character == REPLACEMENT_CHARACTER
        {
            continue;
        }
        if is_whitespace(&character) {
            cleaned_string.push(' ');
        } else {
            cleaned_string.push(character);
        }
        character_mapping.push(*position);
    }
    token.text = cleaned_string;
    token.reference_offsets = character_mapping;
    token.offset.begin = *token.reference_offsets.first().unwrap_or(&(0));
    token.offset.end = *token.reference_offsets.last().unwrap_or(&(0)) + 1;
}

/// Split a text on special tokens (like BOS/EOS/UNK markers), depending on the
/// vocabulary. When several special tokens start at the same position the
/// longest one wins.
///
/// With `trim_end`, whitespace in front of a special token is dropped.
/// Byte-level tokenizers keep it so that decoding restores the text.
pub fn split_on_special_tokens<'a>(
    token: TokenRef<'a>,
    vocab: &impl Vocab,
    trim_end: bool,
) -> Vec<TokenRef<'a>> {
    let unknown_value = vocab.get_unknown_value();
    let test_substr = |s: &str| {
        let mut longest: Option<&str> = None;
        for special_value in vocab.special_values().keys() {
            if !special_value.is_empty()
                && s.starts_with(special_value.as_str())
                && longest.map_or(true, |l| special_value.len() > l.len())
            {
                longest = Some(special_value.as_str());
            }
        }
        match longest {
            Some(special_value) => (
                special_value.len(),
                special_value.chars().count(),
                if special_value == unknown_value {
                    Mask::Unknown
                } else {
                    Mask::Special
                },
            ),
            None => (0, 0, Mask::None),
        }
    };
    split_on_substr(token, test_substr, true, trim_end)
}

/// Marks a token that exactly matches an entry of `never_split` as special so
/// that no further splitting or normalization is applied to it.
pub fn mark_never_split<'a>(
    mut token: TokenRef<'a>,
    never_split: &HashSet<String>,
) -> TokenRef<'a> {
    if token.mask == Mask::None && never_split.contains(token.text) {
        token.mask = Mask::Special;
    }
    token
}

/// Tokenizes CJK characters, each character will be a token
pub fn tokenize_cjk_chars(token: TokenRef) -> Vec<TokenRef> {
    split_on_char(token, is_cjk_char, true, Mask::CJK)
}

pub fn is_cjk_char(character: &char) -> bool {
    in_ranges(*character, CJK_RANGES)
}

pub fn is_whitespace(character: &char) -> bool {
    WHITESPACE_CHARS.contains(&(*character as u32))
}

/// This is a custom method to check if a character is a control character.
/// The BERT tokenizer is taking any character whose unicode category starts
/// with `C` as a control character, which includes the traditional control
/// `Cc` category, but also the format `Cf` and private use `Co` categories.
/// The unassigned unicode category `Cn` is skipped. Tabs and line breaks are
/// whitespace, not control characters.
///
/// Setting `strict` to false only checks against the core control characters.
pub fn is_control(character: &char, strict: bool) -> bool {
    if ADDITIONAL_WHITESPACE_CHARS.contains(character) {
        false
    } else if strict {
        let u32_char = *character as u32;
        (u32_char <= 0x001F)
            | (0x007F..=0x009F).contains(&u32_char)
            | (0xE0020..=0xE007F).contains(&u32_char)
            | (0xE000..=0xF8FF).contains(&u32_char)
            | (0xF0000..=0xFFFFD).contains(&u32_char)
            | (0x100000..=0x10FFFD).contains(&u32_char)
            | CONTROL_CHARS.contains(&u32_char)
    } else {
        character.is_control()
    }
}

/// ASCII symbols count as punctuation even when Unicode classifies them as
/// math or currency symbols (`$`, `+`, `^`...).
pub fn is_punctuation(character: &char) -> bool {
    let u32_char = *character as u32;
    if (33..=47).contains(&u32_char)
        | (58..=64).contains(&u32_char)
        | (91..=96).contains(&u32_char)
        | (123..=126).contains(&u32_char)
    {
        true
    } else {
        in_ranges(*character, PUNCTUATION_RANGES)
    }
}

/// Simple tokenization based on whitespace only
pub fn whitespace_tokenize(token: TokenRef) -> Vec<TokenRef> {
    split_on_char(token, is_whitespace, false, Mask::Whitespace)
}

pub fn lowercase(token: &mut Token) {
    let capacity = token.text.capacity();
    let mut lower_cased_string: String = String::with_capacity(capacity);
    let mut character_mapping: Vec<OffsetSize> = Vec::with_capacity(capacity);
    for (character, position) in
        token.text.chars().zip(token.reference_offsets.iter())
    {
        for c in character.to_lowercase() {
            lower_cased_string.push(c);
            character_mapping.push(*position);
        }
    }
    token.text = lower_cased_string;
    token.reference_offsets = character_mapping;
    token.offset.begin = *token.reference_offsets.first().unwrap_or(&(0));
    token.offset.end = *token.reference_offsets.last().unwrap_or(&(0)) + 1;
}

/// Remove diacritics
pub fn strip_accents(token: &mut Token) {
    let capacity = token.text.capacity();
    let mut decomposed_string: String = String::with_capacity(capacity);
    let mut character_mapping: Vec<OffsetSize> = Vec::with_capacity(capacity);
    for (character, position) in
        token.text.chars().zip(token.reference_offsets.iter())
    {
        decompose_canonical(character, |c| {
            if !in_ranges(c, ACCENT_MARKER_RANGES) {
                decomposed_string.push(c);
                character_mapping.push(*position);
            }
        });
    }
    token.text = decomposed_string;
    token.reference_offsets = character_mapping;
    token.offset.begin = *token.reference_offsets.first().unwrap_or(&(0));
    token.offset.end = *token.reference_offsets.last().unwrap_or(&(0)) + 1;
}

/// Split a token on punctuation
pub fn split_on_punct(token: TokenRef) -> Vec<TokenRef> {
    split_on_char(token, is_punctuation, true, Mask::Punctuation)
}

/// Split a token on one or more characters (given a character test function)
/// * token: The token to split
/// * test_character: A function that borrows a `char` and returns a boolean. If
///   true, a split will be made here
/// * add_separators: Add the separating characters to the tokens as well?
///   (bool), separating tokens will be indicated in the returned mask by the
///   value set in `set_mask`
pub fn split_on_char<'a, F>(
    token: TokenRef<'a>,
    test_character: F,
    add_separators: bool,
    set_mask: Mask,
) -> Vec<TokenRef<'a>>
where
    F: Fn(&char) -> bool,
{
    let mut tokens: Vec<TokenRef<'a>> = Vec::new();
    let mut charbegin: usize = 0;
    let mut bytesbegin: usize = 0;
    let mut charcount: usize = 0;

    if token.mask == Mask::None {
        for (char_idx, (bytes_idx, c)) in token.text.char_indices().enumerate()
        {
            charcount += 1;
            if test_character(&c) {
                if charbegin < char_idx {
                    tokens.push(TokenRef {
                        text: &token.text[bytesbegin..bytes_idx],
                        offset: Offset {
                            begin: token.offset.begin + charbegin as OffsetSize,
                            end: token.offset.begin + char_idx as OffsetSize,
                        },
                        reference_offsets: &token.reference_offsets
                            [charbegin..char_idx],
                        mask: Mask::None,
                    });
                }
                if add_separators {
                    tokens.push(TokenRef {
                        text: &token.text[bytes_idx..bytes_idx + c.len_utf8()],
                        offset: Offset {
                            begin: token.offset.begin + char_idx as OffsetSize,
                            end: token.offset.begin
                                + char_idx as OffsetSize
                                + 1,
                        },
                        reference_offsets: &token.reference_offsets
                            [char_idx..char_idx + 1],
                        mask: set_mask,
                    });
                }
                charbegin = char_idx + 1;
                bytesbegin = bytes_idx + c.len_utf8();
            }
        }
    }
    if charcount == 0 {
        // nothing done, return token as is
        tokens.push(token);
    } else if bytesbegin < token.text.len() {
        tokens.push(TokenRef {
            text: &token.text[bytesbegin..],
            offset: Offset {
                begin: token.offset.begin + charbegin as OffsetSize,
                end: token.offset.begin + charcount as OffsetSize,
            },
            reference_offsets: &token.reference_offsets[charbegin..charcount],
            mask: Mask::None,
        });
    }
    tokens
}

/// Split a token on one or more substrings (given a substring test function)
/// * token: The token to split
/// * test_substr: A function that receives the text from the current point
///   forward and returns a 3-tuple with the length of the match in bytes,
///   chars and the mask to set (a length of zero means there is no match)
/// * add_separators: Add the matched substrings to the tokens as well?
///   (bool), their mask is the one returned by `test_substr`
/// * trim_end: Drop trailing whitespace from the text preceding a match
pub fn split_on_substr<'a, F>(
    token: TokenRef<'a>,
    test_substr: F,
    add_separators: bool,
    trim_end: bool,
) -> Vec<TokenRef<'a>>
where
    F: Fn(&'a str) -> (usize, usize, Mask),
{
    let mut tokens: Vec<TokenRef<'a>> = Vec::new();
    let mut char_begin: usize = 0;
    let mut bytes_begin: usize = 0;
    let mut char_count: usize = 0;

    if token.mask == Mask::None {
        // don't process a token that already got marked in the mask
        for (char_idx, (bytes_idx, _)) in token.text.char_indices().enumerate()
        {
            char_count += 1;
            if char_idx < char_begin {
                // still inside the previous match
                continue;
            }
            let (matched_bytes, matched_chars, set_mask): (usize, usize, Mask) =
                test_substr(&token.text[bytes_idx..]);
            if matched_chars > 0 {
                if char_begin < char_idx {
                    let preceding = &token.text[bytes_begin..bytes_idx];
                    let trimmed_text = if trim_end {
                        preceding.trim_end()
                    } else {
                        preceding
                    };
                    let trimmed_text_len = trimmed_text.chars().count();
                    if trimmed_text_len > 0 {
                        tokens.push(TokenRef {
                            text: trimmed_text,
                            offset: Offset {
                                begin: token.offset.begin
                                    + char_begin as OffsetSize,
                                end: token.offset.begin
                                    + (char_begin + trimmed_text_len)
                                        as OffsetSize,
                            },
                            reference_offsets: &token.reference_offsets
                                [char_begin..(char_begin + trimmed_text_len)],
                            mask: Mask::None,
                        });
                    }
                }
                if add_separators {
                    tokens.push(TokenRef {
                        text: &token.text[bytes_idx..bytes_idx + matched_bytes],
                        offset: Offset {
                            begin: token.offset.begin + char_idx as OffsetSize,
                            end: token.offset.begin
                                + (char_idx + matched_chars) as OffsetSize,
                        },
                        reference_offsets: &token.reference_offsets
                            [char_idx..(char_idx + matched_chars)],
                        mask: set_mask,
                    });
                }
                char_begin = char_idx + matched_chars;
                bytes_begin = bytes_idx + matched_bytes;
            }
        }
    }
    if bytes_begin < token.text.len() {
        let text = &token.text[bytes_begin..];
        if char_count == 0 {
            char_count = text.chars().count();
        }
        tokens.push(TokenRef {
            text,
            offset: Offset {
                begin: token.offset.begin + char_begin as OffsetSize,
                end: token.offset.begin + char_count as OffsetSize,
            },
            reference_offsets: &token.reference_offsets[char_begin..char_count],
            mask: token.mask,
        });
    }
    tokens
}

/// Tokenize a token into word pieces according to the supplied vocabulary
/// Continuation word pieces will all have the prefix `##`.
///
/// If any position of the token cannot be matched, the entire token becomes
/// a single unknown token.
pub fn tokenize_wordpiece(
    token: TokenRef,
    vocab: &impl Vocab,
    max_word_len: usize,
) -> Vec<Token> {
    let unknown_token = || Token {
        text: vocab.get_unknown_value().to_owned(),
        offset: token.offset,
        reference_offsets: token.reference_offsets.to_vec(),
        mask: Mask::Unknown,
    };

    let char_indices: Vec<usize> =
        token.text.char_indices().map(|v| v.0).collect();
    if char_indices.is_empty() {
        return Vec::new();
    }
    if char_indices.len() > max_word_len {
        return vec![unknown_token()];
    }

    let mut tokens: Vec<Token> = Vec::new();
    let max_end: usize = token.text.len();
    let mut start: usize = 0; // bytes
    let mut pos_begin = 0; // chars
    let mut pos_end;
    let mut end;
    while start < max_end {
        end = max_end;
        pos_end = char_indices.len();
        let mut is_unk: bool = true;
        while start < end {
            let mut substr = token.text[start..end].to_owned();
            let char_length = pos_end - pos_begin;
            let sub_offset = Offset {
                begin: token.offset.begin + pos_begin as OffsetSize,
                end: token.offset.begin
                    + pos_begin as OffsetSize
                    + char_length as OffsetSize,
            };
            if start > 0 {
                substr = format!("##{}", substr);
            }
            if vocab.values().contains_key(&substr) {
                tokens.push(Token {
                    text: substr,
                    offset: sub_offset,
                    reference_offsets: token.reference_offsets
                        [pos_begin..pos_end]
                        .to_vec(),
                    mask: if start > 0 {
                        Mask::Continuation
                    } else {
                        token.mask
                    },
                });
                is_unk = false;
                break;
            }
            pos_end -= 1;
            end = char_indices[pos_end];
        }
        if is_unk {
            return vec![unknown_token()];
        }
        start = end;
        pos_begin = pos_end;
    }

    // set Mask::Begin where a sequence of continuations is introduced
    fix_mask(&mut tokens);

    tokens
}

/// # Truncates a sequence pair in place to the maximum length.
///
///   * token_ids_with_offsets_1: first sequence (ids, offsets and masks)
///   * token_ids_with_offsets_2: optional second sequence
///   * num_tokens_to_remove: number of tokens to remove using the truncation
///     strategy
///   * truncation_strategy: truncation strategy
///       - TruncationStrategy::LongestFirst (default) Iteratively remove one
///         token from the longest sequence (the first one on ties) until
///         enough tokens were removed.
///       - TruncationStrategy::OnlyFirst: Only truncate the first sequence.
///         raise an error if the first sequence is shorter than
///         num_tokens_to_remove.
///       - TruncationStrategy::OnlySecond: Only truncate the second sequence
///       - TruncationStrategy::DoNotTruncate: Does not truncate (raise an error
///         if the input sequence is longer than max_length)
///   * side: whether tokens are removed from the end or from the start of the
///     sequences
///   * stride: number of tokens from the kept part of the truncated sequence
///     that are repeated in the overflowing tokens, next to the removed ones.
///
/// Returns the truncated sequences, the overflowing token ids and their
/// offsets.
#[allow(clippy::type_complexity)]
pub fn truncate_sequences(
    mut token_ids_with_offsets_1: TokenIdsWithOffsets,
    mut token_ids_with_offsets_2: Option<TokenIdsWithOffsets>,
    num_tokens_to_remove: usize,
    truncation_strategy: &TruncationStrategy,
    side: Side,
    stride: usize,
) -> Result<
    (
        TokenIdsWithOffsets,
        Option<TokenIdsWithOffsets>,
        Vec<i64>,
        Vec<Option<Offset>>,
    ),
    TokenizerError,
> {
    if num_tokens_to_remove == 0 {
        return Ok((
            token_ids_with_offsets_1,
            token_ids_with_offsets_2,
            Vec::new(),
            Vec::new(),
        ));
    }

    let (overflow_tokens, overflow_offsets) = match (
        truncation_strategy,
        token_ids_with_offsets_2.as_mut(),
    ) {
        (TruncationStrategy::DoNotTruncate, _) => {
            return Err(TokenizerError::EncodingError(
                "Truncation needed but no truncation requested".into(),
            ));
        },
        (TruncationStrategy::LongestFirst, Some(second)) => {
            let len_1 = token_ids_with_offsets_1.ids.len();
            let len_2 = second.ids.len();
            if len_1 + len_2 < num_tokens_to_remove {
                return Err(TokenizerError::EncodingError(
                    "Combined sequence length too short for requested truncation amount"
                        .into(),
                ));
            }
            let (mut remove_1, mut remove_2) = (0, 0);
            for _ in 0..num_tokens_to_remove {
                if len_1 - remove_1 >= len_2 - remove_2 {
                    remove_1 += 1;
                } else {
                    remove_2 += 1;
                }
            }
            let (mut overflow_tokens, mut overflow_offsets) =
                truncate_with_overflow(
                    &mut token_ids_with_offsets_1,
                    remove_1,
                    side,
                    stride,
                );
            let (tokens_2, offsets_2) =
                truncate_with_overflow(second, remove_2, side, 0);
            overflow_tokens.extend(tokens_2);
            overflow_offsets.extend(offsets_2);
            (overflow_tokens, overflow_offsets)
        },
        (TruncationStrategy::LongestFirst, None)
        | (TruncationStrategy::OnlyFirst, _) => {
            if token_ids_with_offsets_1.ids.len() < num_tokens_to_remove {
                return Err(TokenizerError::EncodingError(
                    "First sequence too short for first only truncation"
                        .into(),
                ));
            }
            truncate_with_overflow(
                &mut token_ids_with_offsets_1,
                num_tokens_to_remove,
                side,
                stride,
            )
        },
        (TruncationStrategy::OnlySecond, Some(second)) => {
            if second.ids.len() < num_tokens_to_remove {
                return Err(TokenizerError::EncodingError(
                    "Second sequence too short for second only truncation"
                        .into(),
                ));
            }
            truncate_with_overflow(second, num_tokens_to_remove, side, stride)
        },
        (TruncationStrategy::OnlySecond, None) => {
            return Err(TokenizerError::EncodingError(
                "Invalid truncation strategy for single sentence truncation"
                    .into(),
            ));
        },
    };

    tracing::debug!(
        removed = num_tokens_to_remove,
        overflowing = overflow_tokens.len(),
        ?truncation_strategy,
        ?side,
        "Truncated the input"
    );

    Ok((
        token_ids_with_offsets_1,
        token_ids_with_offsets_2,
        overflow_tokens,
        overflow_offsets,
    ))
}

fn cut<T>(values: &mut Vec<T>, count: usize, side: Side) -> Vec<T> {
    let count = min(count, values.len());
    match side {
        Side::Right => values.split_off(values.len() - count),
        Side::Left => values.drain(..count).collect(),
    }
}

fn truncate_with_overflow(
    sequence: &mut TokenIdsWithOffsets,
    num_tokens_to_remove: usize,
    side: Side,
    stride: usize,
) -> (Vec<i64>, Vec<Option<Offset>>) {
    let mut overflow_tokens = cut(&mut sequence.ids, num_tokens_to_remove, side);
    let mut overflow_offsets =
        cut(&mut sequence.offsets, num_tokens_to_remove, side);
    cut(&mut sequence.reference_offsets, num_tokens_to_remove, side);
    cut(&mut sequence.masks, num_tokens_to_remove, side);

    let window_len = min(sequence.ids.len(), stride);
    if window_len > 0 {
        let with_offsets = sequence.offsets.len() == sequence.ids.len();
        match side {
            Side::Right => {
                let from = sequence.ids.len() - window_len;
                overflow_tokens
                    .splice(0..0, sequence.ids[from..].iter().copied());
                if with_offsets {
                    overflow_offsets
                        .splice(0..0, sequence.offsets[from..].iter().copied());
                }
            },
            Side::Left => {
                overflow_tokens.extend_from_slice(&sequence.ids[..window_len]);
                if with_offsets {
                    overflow_offsets
                        .extend_from_slice(&sequence.offsets[..window_len]);
                }
            },
        }
    }
    (overflow_tokens, overflow_offsets)
}

pub fn fix_mask(tokens: &mut Vec<Token>) {
    for i in 1..tokens.len() {
        if tokens[i].mask == Mask::Continuation
            && tokens[i - 1].mask == Mask::None
        {
            if let Some(token) = tokens.get_mut(i - 1) {
                token.mask = Mask::Begin;
            }
        }
    }
}

/// Merges every occurrence of the best ranked adjacent pair, scanning left to
/// right. The boolean is true once no pair can be merged anymore.
pub fn group_common_pairs(
    tokens: Vec<String>,
    bpe_ranks: &BpePairVocab,
) -> (Vec<String>, bool) {
    if tokens.len() < 2 {
        return (tokens, true);
    }

    let best_pair = tokens
        .windows(2)
        .filter_map(|pair| {
            let query = BpePairRef {
                byte_1: &pair[0],
                byte_2: &pair[1],
            };
            bpe_ranks.byte_pair_to_id(&query).map(|rank| (rank, pair))
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, pair)| (pair[0].clone(), pair[1].clone()));

    let (first, second) = match best_pair {
        Some(pair) => pair,
        None => return (tokens, true),
    };

    let mut merged = Vec::with_capacity(tokens.len() - 1);
    let mut remaining = tokens.into_iter().peekable();
    while let Some(token) = remaining.next() {
        if token == first && remaining.peek() == Some(&second) {
            remaining.next();
            merged.push(format!("{}{}", first, second));
        } else {
            merged.push(token);
        }
    }
    let done = merged.len() == 1;
    (merged, done)
}

/// Default bpe function, as called by GPT2: starts from single characters
/// and merges pairs by increasing rank.
pub fn bpe(token: &str, bpe_ranks: &BpePairVocab) -> (Vec<String>, Vec<usize>) {
    let mut sub_tokens = token
        .chars()
        .map(|v| v.to_string())
        .collect::<Vec<String>>();

    loop {
        let (merged, done) = group_common_pairs(sub_tokens, bpe_ranks);
        sub_tokens = merged;
        if done {
            break;
        }
    }
    let char_counts = sub_tokens.iter().map(|v| v.chars().count()).collect();
    (sub_tokens, char_counts)
}

/// Maps every byte of `text` to the index of the character it belongs to.
fn bytes_offsets(text: &str) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(text.len());
    for (char_idx, character) in text.chars().enumerate() {
        for _ in 0..character.len_utf8() {
            offsets.push(char_idx);
        }
    }
    offsets
}

fn bpe_tokens(
    sub_tokens: &[String],
    char_counts: &[usize],
    reference_offsets: &[OffsetSize],
) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(sub_tokens.len());
    let mut start = 0;
    for (idx, (sub_token, &char_count)) in
        sub_tokens.iter().zip(char_counts.iter()).enumerate()
    {
        let positions = match reference_offsets.get(start..start + char_count)
        {
            Some(positions) => positions,
            None => break,
        };
        let (begin, end) = match (positions.first(), positions.last()) {
            (Some(begin), Some(end)) => (*begin, *end + 1),
            _ => continue,
        };
        tokens.push(Token {
            text: sub_token.clone(),
            offset: Offset { begin, end },
            reference_offsets: positions.to_vec(),
            mask: if sub_tokens.len() > 1 {
                if idx == 0 {
                    Mask::Begin
                } else {
                    Mask::Continuation
                }
            } else {
                Mask::None
            },
        });
        start += char_count;
    }
    tokens
}

/// Runs `bpe_function` over a token, reusing cached results when possible.
///
/// With `as_bytes` the token is first mapped to its byte-level
/// representation. Cache access never blocks: a lock that is not immediately
/// available means the result is recomputed, which yields the same symbols.
pub fn split_on_bpe_pairs<F>(
    token: TokenRef<'_>,
    bpe_function: F,
    bpe_ranks: &BpePairVocab,
    cache: &BpeCache,
    as_bytes: bool,
) -> Vec<Token>
where
    F: Fn(&str, &BpePairVocab) -> (Vec<String>, Vec<usize>),
{
    let byte_level_text: String;
    let byte_level_offsets: Vec<OffsetSize>;
    let (text, reference_offsets) = if as_bytes {
        byte_level_offsets = bytes_offsets(token.text)
            .iter()
            .filter_map(|&pos| token.reference_offsets.get(pos).copied())
            .collect();
        byte_level_text = token
            .text
            .as_bytes()
            .iter()
            .map(|byte| BYTES_TO_UNICODE[*byte as usize])
            .collect();
        (byte_level_text.as_str(), byte_level_offsets.as_slice())
    } else {
        (token.text, token.reference_offsets)
    };
    if text.is_empty() {
        return Vec::new();
    }

    let cached = match cache.try_read() {
        Ok(cache) => cache.get(text).cloned(),
        Err(_) => None,
    };
    if let Some((sub_tokens, char_counts)) = cached {
        tracing::trace!(word = text, "BPE cache hit");
        return bpe_tokens(&sub_tokens, &char_counts, reference_offsets);
    }

    let (sub_tokens, char_counts) = bpe_function(text, bpe_ranks);
    let tokens = bpe_tokens(&sub_tokens, &char_counts, reference_offsets);
    if let Ok(mut cache) = cache.try_write() {
        cache.insert(text.to_owned(), (sub_tokens, char_counts));
    }
    tokens
}

/// Pre-tokenizes with `pattern_tokenization`, after splitting ahead of the
/// last whitespace character preceding a word, so that whitespace runs stay
/// attached to the following word (emulates a `\s+(?!\S)` lookahead).
pub fn split_on_regex_with_lookahead<'a>(
    token: TokenRef<'a>,
    pattern_lookahead: &Regex,
    pattern_tokenization: &Regex,
) -> Vec<TokenRef<'a>> {
    if token.mask != Mask::None {
        return vec![token];
    }

    let mut sub_words: Vec<&str> = vec![];
    let mut splits: Vec<&str> = vec![];

    let mut i: usize = 0;
    for hit in pattern_lookahead.find_iter(token.text) {
        let mut hit_chars = hit.as_str().chars().rev();
        if let (Some(start), Some(sep)) = (hit_chars.next(), hit_chars.next()) {
            let end_byte = hit.end() - sep.len_utf8() - start.len_utf8();
            splits.push(&token.text[i..end_byte]);
            i = end_byte;
        }
    }
    splits.push(&token.text[i..]);

    for sub_word in splits {
        for hit in pattern_tokenization.find_iter(sub_word) {
            sub_words.push(hit.as_str());
        }
    }

    let mut output_tokens: Vec<TokenRef> = Vec::with_capacity(sub_words.len());
    let mut begin_char: usize = 0;
    let mut end_char: usize;
    for sub_word in sub_words {
        end_char = begin_char + sub_word.chars().count();
        output_tokens.push(TokenRef {
            text: sub_word,
            offset: Offset::new(
                token.offset.begin + begin_char as OffsetSize,
                token.offset.begin + end_char as OffsetSize,
            ),
            reference_offsets: &token.reference_offsets[begin_char..end_char],
            mask: Default::default(),
        });
        begin_char = end_char;
    }

    output_tokens
}
