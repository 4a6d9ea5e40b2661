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
        encoding::{
            self, EncodeInput, EncodedSequence, EncodingOptions, Truncation,
        },
        template::SpecialTokenTemplate,
        tokenization_utils::{
            clean_text, lowercase, mark_never_split, split_on_punct,
            split_on_special_tokens, strip_accents, tokenize_cjk_chars,
            whitespace_tokenize,
        },
    },
    vocab::Vocab,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// # Truncation strategy variants
/// Indicates if and how sequence pairs exceeding a given length should be
/// truncated
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TruncationStrategy {
    /// Truncate the longest sequence first
    #[default]
    LongestFirst,
    /// Truncate only the first sequence
    OnlyFirst,
    /// Truncate only the second sequence
    OnlySecond,
    /// Do not truncate the sequences
    DoNotTruncate,
}

/// The end of a sequence that truncation removes tokens from, or that
/// padding adds tokens to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    #[default]
    Right,
}

/// Crate-wide primitive used to store offset positions
pub type OffsetSize = u32;

///Offset information (in unicode points) to relate a token back to its
/// original input string
#[derive(
    Debug, PartialEq, PartialOrd, Clone, Copy, Eq, Serialize, Deserialize,
)]
pub struct Offset {
    pub begin: OffsetSize,
    pub end: OffsetSize,
}

impl Offset {
    /// Create a new offset from a begin and end positions
    pub fn new(begin: OffsetSize, end: OffsetSize) -> Offset {
        Offset { begin, end }
    }
}

/// # Type indication for tokens (e.g. special token, white space, unknown...)
#[allow(clippy::upper_case_acronyms)]
#[derive(
    Debug,
    PartialEq,
    PartialOrd,
    Clone,
    Copy,
    Eq,
    Default,
    Serialize,
    Deserialize,
)]
pub enum Mask {
    /// The token has no particular mask. This is the default situation. It
    /// may indicate that further processing can be done on a token.
    #[default]
    None,
    /// The token represents a whitespace (in any shape or form)
    Whitespace,
    /// The token represents punctuation (in any shape or form)
    Punctuation,
    /// The token represents a single Chinese/Japanese/Korean character
    CJK,
    /// The token is a special marker (such as a separator marker, a class
    /// marker, etc) or a member of the never-split set
    Special,
    /// The token is the begin in a series of subtokens. Subsequent tokens in
    /// this sequence will carry the 'Continuation' mask
    Begin,
    /// The token is the continuation of the previous token
    Continuation,
    /// The token is out of vocabulary and decodes to the unknown token
    Unknown,
}

/// Reference token that references the original text, with a string slice
/// representation
#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub struct TokenRef<'a> {
    /// String representation
    pub text: &'a str,
    /// Start and end positions of the token with respect to the original text
    pub offset: Offset,
    /// Sequence of positions with respect to the original text contained in
    /// the token. For example, if the token offset is `start: 4, end: 10`,
    /// corresponding reference_offsets are `[4, 5, 6, 7, 8, 9]`
    pub reference_offsets: &'a [OffsetSize],
    /// Mask indicating the type of the token
    pub mask: Mask,
}

impl<'a> TokenRef<'a> {
    /// Creates a new token reference from a text and list of offsets.
    pub fn new(text: &'a str, offsets: &'a [OffsetSize]) -> TokenRef<'a> {
        TokenRef {
            text,
            offset: Offset {
                begin: 0,
                end: offsets.len() as OffsetSize,
            },
            reference_offsets: offsets,
            mask: Mask::None,
        }
    }

    /// Converts a token reference to an owned form.
    pub fn to_owned(self) -> Token {
        Token::from(self)
    }
}

impl<'a> From<&'a Token> for TokenRef<'a> {
    fn from(other: &'a Token) -> Self {
        TokenRef {
            text: other.text.as_str(),
            offset: other.offset,
            reference_offsets: &other.reference_offsets,
            mask: other.mask,
        }
    }
}

impl From<&str> for Token {
    fn from(text: &str) -> Self {
        Token::new(text.to_owned())
    }
}

impl<'a> From<TokenRef<'a>> for Token {
    fn from(other: TokenRef<'a>) -> Self {
        Token {
            text: other.text.to_owned(),
            offset: other.offset,
            reference_offsets: other.reference_offsets.to_vec(),
            mask: other.mask,
        }
    }
}

/// Owned token that references the original text but stores its own string
/// representation.
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    /// String representation
    pub text: String,
    /// Start and end positions of the token with respect to the original text
    pub offset: Offset,
    /// Sequence of positions with respect to the original text contained in
    /// the token.
    pub reference_offsets: Vec<OffsetSize>,
    /// Mask indicating the type of the token
    pub mask: Mask,
}

impl Token {
    /// Creates a new owned token from a `String`, covering positions
    /// `0..n` where `n` is its number of characters.
    pub fn new(text: String) -> Token {
        let text_size: OffsetSize = text.chars().count() as OffsetSize;
        Token {
            text,
            offset: Offset {
                begin: 0,
                end: text_size,
            },
            reference_offsets: (0..text_size).collect(),
            mask: Mask::None,
        }
    }

    pub fn as_ref(&self) -> TokenRef {
        TokenRef::from(self)
    }
}

/// # Tokenized Input, ready for processing in language models
/// The assembled (but unpadded) encoding of a sequence or sequence pair.
#[derive(Debug, PartialEq, PartialOrd, Clone)]
pub struct TokenizedInput {
    /// Vector of token IDs
    pub token_ids: Vec<i64>,

    /// Segment ids: 0 for the first sequence, 1 for the second. This vector
    /// has the same length as token_ids.
    pub segment_ids: Vec<i8>,

    /// Flags tokens as special tokens (1) or not (0). This vector has the
    /// same length as token_ids.
    pub special_tokens_mask: Vec<i8>,

    /// Vector containing overflowing tokens, populated following a
    /// truncation step
    pub overflowing_tokens: Vec<i64>,

    /// Number of tokens removed by truncation
    pub num_truncated_tokens: usize,

    /// Offset information (as start and end positions) in relation to the
    /// original text. Tokens that can not be related to the original source
    /// are registered as None.
    pub token_offsets: Vec<Option<Offset>>,

    /// Offset information (as a sequence of positions) in relation to the
    /// original text.
    pub reference_offsets: Vec<Vec<OffsetSize>>,

    /// Masks tokens providing information on the type of tokens. This vector
    /// has the same length as token_ids.
    pub mask: Vec<Mask>,
}

/// # Encoded input with special tokens
/// Intermediate tokenization steps before truncation to a maximum length,
/// after encoding and addition of special tokens
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenIdsWithSpecialTokens {
    pub token_ids: Vec<i64>,
    pub segment_ids: Vec<i8>,
    pub special_tokens_mask: Vec<i8>,
    pub token_offsets: Vec<Option<Offset>>,
    pub reference_offsets: Vec<Vec<OffsetSize>>,
    pub mask: Vec<Mask>,
}

impl TokenIdsWithSpecialTokens {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        TokenIdsWithSpecialTokens {
            token_ids: Vec::with_capacity(capacity),
            segment_ids: Vec::with_capacity(capacity),
            special_tokens_mask: Vec::with_capacity(capacity),
            token_offsets: Vec::with_capacity(capacity),
            reference_offsets: Vec::with_capacity(capacity),
            mask: Vec::with_capacity(capacity),
        }
    }
}

/// # Tokenized sequence
/// Intermediate tokenization steps before encoding, addition of special
/// tokens and truncation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokensWithOffsets {
    /// Vector of token strings
    pub tokens: Vec<String>,

    /// Offset information (as start and end positions) in relation to the
    /// original text. Tokens that can not be related to the original source
    /// are registered as None.
    pub offsets: Vec<Option<Offset>>,

    /// Offset information (as a sequence of positions) in relation to the
    /// original text.
    pub reference_offsets: Vec<Vec<OffsetSize>>,

    /// Masks tokens providing information on the type of tokens. This vector
    /// has the same length as tokens.
    pub masks: Vec<Mask>,
}

/// # Encoded sequence
/// Intermediate tokenization steps before addition of special tokens, after
/// encoding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenIdsWithOffsets {
    pub ids: Vec<i64>,
    pub offsets: Vec<Option<Offset>>,
    pub reference_offsets: Vec<Vec<OffsetSize>>,
    pub masks: Vec<Mask>,
}

impl TokenIdsWithOffsets {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// # Base trait for tokenizers
pub trait Tokenizer<T: Vocab> {
    /// returns a reference to the tokenizer vocabulary
    fn vocab(&self) -> &T;

    /// Tokenize a TokenRef, returning a sequence of tokens
    ///
    /// This is where tokenizer families differ: the basic segmentation
    /// followed by the subword matcher of the family.
    fn tokenize_to_tokens(&self, text: TokenRef) -> Vec<Token>;

    /// The special token layout used when encoding with special tokens.
    fn template(&self) -> SpecialTokenTemplate {
        SpecialTokenTemplate::Plain
    }

    /// Tokenize a string, returns a vector of tokens as strings.
    /// Use `tokenize_with_offsets` or `tokenize_to_tokens` to return offset
    /// information.
    fn tokenize<S: AsRef<str>>(&self, text: S) -> Vec<String> {
        self.tokenize_with_offsets(text).tokens
    }

    /// Tokenize a string, returning tokens with offset information
    fn tokenize_with_offsets<S: AsRef<str>>(
        &self,
        text: S,
    ) -> TokensWithOffsets {
        let text = text.as_ref();
        if text.trim().is_empty() {
            return TokensWithOffsets::default();
        }
        let initial_offsets = (0..text.chars().count() as OffsetSize)
            .collect::<Vec<OffsetSize>>();
        let initial_token: TokenRef<'_> = TokenRef::new(text, &initial_offsets);
        let tokens = self.tokenize_to_tokens(initial_token);
        let length = tokens.len();
        let mut texts = Vec::with_capacity(length);
        let mut offsets = Vec::with_capacity(length);
        let mut original_positions = Vec::with_capacity(length);
        let mut masks = Vec::with_capacity(length);

        for token in tokens {
            texts.push(token.text);
            offsets.push(
                match (
                    token.reference_offsets.first(),
                    token.reference_offsets.last(),
                ) {
                    (Some(begin), Some(end)) => Some(Offset {
                        begin: *begin,
                        end: *end + 1,
                    }),
                    _ => None,
                },
            );
            original_positions.push(token.reference_offsets);
            masks.push(token.mask);
        }
        TokensWithOffsets {
            tokens: texts,
            offsets,
            reference_offsets: original_positions,
            masks,
        }
    }

    /// Tokenize a list of strings
    fn tokenize_list<S, ST>(&self, text_list: S) -> Vec<Vec<String>>
    where
        S: AsRef<[ST]>,
        ST: AsRef<str>,
    {
        text_list
            .as_ref()
            .iter()
            .map(|text| self.tokenize(text))
            .collect()
    }

    /// Tokenize a list of strings, where each corresponds to for example a
    /// sentence, returns a vector of TokensWithOffsets containing the tokens
    /// and their offset information.
    fn tokenize_list_with_offsets<S, ST>(
        &self,
        text_list: S,
    ) -> Vec<TokensWithOffsets>
    where
        S: AsRef<[ST]>,
        ST: AsRef<str>,
    {
        text_list
            .as_ref()
            .iter()
            .map(|text| self.tokenize_with_offsets(text))
            .collect()
    }

    /// Convert a slice of string-like to a vector ot token indices
    fn convert_tokens_to_ids<S, ST>(&self, tokens: S) -> Vec<i64>
    where
        S: AsRef<[ST]>,
        ST: AsRef<str>,
    {
        tokens
            .as_ref()
            .iter()
            .map(|v| self.vocab().token_to_id(v.as_ref()))
            .collect()
    }

    /// Tokenizes a text and looks up the id of every token.
    fn token_ids_with_offsets<S: AsRef<str>>(
        &self,
        text: S,
    ) -> TokenIdsWithOffsets {
        let tokens = self.tokenize_with_offsets(text);
        TokenIdsWithOffsets {
            ids: self.convert_tokens_to_ids(&tokens.tokens),
            offsets: tokens.offsets,
            reference_offsets: tokens.reference_offsets,
            masks: tokens.masks,
        }
    }

    /// The number of special tokens the layout adds around a single
    /// sequence (or a pair).
    fn num_special_tokens_to_add(
        &self,
        pair: bool,
    ) -> Result<usize, TokenizerError> {
        self.template().num_special_tokens(pair)
    }

    /// Marks the positions of `token_ids`, already wrapped with special
    /// tokens, that hold one of the special tokens the layout inserts.
    fn special_tokens_mask(&self, token_ids: &[i64]) -> Vec<i8> {
        let special_ids = self.template().special_token_ids(self.vocab());
        token_ids
            .iter()
            .map(|id| i8::from(special_ids.contains(id)))
            .collect()
    }

    /// Build model inputs from a sequence or a pair of sequence by
    /// concatenating and adding special tokens according to `template`.
    fn build_input_with_special_tokens(
        &self,
        tokens_ids_with_offsets_1: TokenIdsWithOffsets,
        tokens_ids_with_offsets_2: Option<TokenIdsWithOffsets>,
    ) -> Result<TokenIdsWithSpecialTokens, TokenizerError> {
        self.template().build(
            self.vocab(),
            tokens_ids_with_offsets_1,
            tokens_ids_with_offsets_2,
        )
    }

    /// Encode a string-like (tokenization followed by encoding)
    ///
    /// # Parameters
    /// - text_1: input text (string-like) to encode
    /// - text_2: optional additional input text (string-like) to encode.
    ///   When provided, both texts are combined into a single encoding by
    ///   using the `build_input_with_special_tokens` method.
    /// - max_len (`usize`): maximum combined sequence length. If the combined
    ///   encoding would exceed this max_len, the encoding is truncated
    ///   following the `TruncationStrategy` provided.
    /// - truncation_strategy (`&TruncationStrategy`): strategy to follow for
    ///   the truncation, if required
    /// - stride (`usize`): number of kept tokens repeated in the overflowing
    ///   tokens, allowing for the generation of overlapping sequences
    fn encode<S: AsRef<str>>(
        &self,
        text_1: S,
        text_2: Option<S>,
        max_len: usize,
        truncation_strategy: &TruncationStrategy,
        stride: usize,
    ) -> Result<TokenizedInput, TokenizerError> {
        let first = self.token_ids_with_offsets(text_1);
        let second = text_2.map(|text| self.token_ids_with_offsets(text));
        encoding::assemble(
            self.vocab(),
            self.template(),
            first,
            second,
            Some(Truncation {
                max_length: max_len,
                strategy: *truncation_strategy,
                side: Side::Right,
                stride,
            }),
        )
    }

    /// Encode a sequence of string-like texts, each independently.
    fn encode_list<S, ST>(
        &self,
        text_list: S,
        max_len: usize,
        truncation_strategy: &TruncationStrategy,
        stride: usize,
    ) -> Result<Vec<TokenizedInput>, TokenizerError>
    where
        S: AsRef<[ST]>,
        ST: AsRef<str>,
    {
        text_list
            .as_ref()
            .iter()
            .map(|text| {
                self.encode(
                    text.as_ref(),
                    None,
                    max_len,
                    truncation_strategy,
                    stride,
                )
            })
            .collect()
    }

    /// Encode a sequence of string-like text pairs.
    fn encode_pair_list<S, ST>(
        &self,
        text_list: S,
        max_len: usize,
        truncation_strategy: &TruncationStrategy,
        stride: usize,
    ) -> Result<Vec<TokenizedInput>, TokenizerError>
    where
        S: AsRef<[(ST, ST)]>,
        ST: AsRef<str>,
    {
        text_list
            .as_ref()
            .iter()
            .map(|text| {
                self.encode(
                    text.0.as_ref(),
                    Some(text.1.as_ref()),
                    max_len,
                    truncation_strategy,
                    stride,
                )
            })
            .collect()
    }

    /// Encodes a single input into model-ready arrays, following `options`.
    fn encode_plus<'a, I>(
        &self,
        input: I,
        options: &EncodingOptions,
    ) -> Result<EncodedSequence, TokenizerError>
    where
        I: Into<EncodeInput<'a>>,
        Self: Sized,
    {
        let mut encoded = self.encode_batch(&[input.into()], options)?;
        encoded.pop().ok_or_else(|| {
            TokenizerError::EncodingError("Nothing was encoded".into())
        })
    }

    /// Encodes a batch of inputs (all single sequences or all pairs) with
    /// padding and truncation.
    fn encode_batch(
        &self,
        inputs: &[EncodeInput<'_>],
        options: &EncodingOptions,
    ) -> Result<Vec<EncodedSequence>, TokenizerError>
    where
        Self: Sized,
    {
        encoding::encode_batch::<T, Self>(self, inputs, options)
    }

    /// Converts a sequence of ids to their token strings.
    fn convert_ids_to_tokens(
        &self,
        token_ids: &[i64],
    ) -> Result<Vec<String>, TokenizerError> {
        token_ids
            .iter()
            .map(|id| self.vocab().id_to_token(*id).map(str::to_owned))
            .collect()
    }

    /// Converts ids to tokens, optionally leaving special tokens out.
    fn decode_to_vec(
        &self,
        token_ids: &[i64],
        skip_special_tokens: bool,
    ) -> Result<Vec<String>, TokenizerError> {
        let vocab = self.vocab();
        token_ids
            .iter()
            .filter(|id| {
                !skip_special_tokens
                    || !vocab.special_indices().contains_key(*id)
            })
            .map(|id| vocab.id_to_token(*id).map(str::to_owned))
            .collect()
    }

    /// Converts a sequence of ids back to a string.
    ///
    /// # Parameters
    /// - token_ids: ids to decode
    /// - skip_special_tokens (`bool`): leave the special tokens out
    /// - clean_up_tokenization_spaces (`bool`): remove the spaces the
    ///   tokenization introduced before punctuation and contractions
    fn decode(
        &self,
        token_ids: &[i64],
        skip_special_tokens: bool,
        clean_up_tokenization_spaces: bool,
    ) -> Result<String, TokenizerError> {
        let tokens = self.decode_to_vec(token_ids, skip_special_tokens)?;
        let decoded = self.convert_tokens_to_string(tokens);
        if clean_up_tokenization_spaces {
            Ok(self.clean_up_tokenization(decoded))
        } else {
            Ok(decoded)
        }
    }

    /// Joins tokens back into a string.
    fn convert_tokens_to_string(&self, tokens: Vec<String>) -> String {
        tokens.iter().join(" ")
    }

    /// Cleans-up tokenization artifacts (for example whitespace before
    /// punctuation)
    fn clean_up_tokenization(&self, input_string: String) -> String {
        input_string
            .replace(" .", ".")
            .replace(" !", "!")
            .replace(" ?", "?")
            .replace(" ,", ",")
            .replace(" ' ", "'")
            .replace(" n't", "n't")
            .replace(" 'm", "'m")
            .replace(" do not", " don't")
            .replace(" 's", "'s")
            .replace(" 've", "'ve")
            .replace(" 're", "'re")
    }
}

/// # Base tokenizer
/// Base tokenizer performing:
/// - whitespace tokenization
/// - splitting on special tokens
/// - splitting on punctuation
/// - (optional) splitting on CJK characters
/// - (optional) lower casing
/// - (optional) accent stripping
///
/// Tokens listed in `never_split` pass through untouched. This tokenizer is
/// used as a pre-tokenizer step in the BERT tokenizer.
#[derive(Debug, Clone)]
pub struct BaseTokenizer<T: Vocab> {
    vocab: T,
    lower_case: bool,
    strip_accents: bool,
    tokenize_chinese_chars: bool,
    never_split: HashSet<String>,
}

impl<T: Vocab> BaseTokenizer<T> {
    /// Create a new instance of a `BaseTokenizer` from an existing vocabulary
    ///
    /// # Parameters
    /// - vocab (`Vocab`): vocabulary (only used for special token splitting)
    /// - lower_case (`bool`): flag indicating if the text should be
    ///   lower-cased as part of the tokenization
    /// - strip_accents (`bool`): flag indicating if accents should be
    ///   stripped from the text
    pub fn from_existing_vocab(
        vocab: T,
        lower_case: bool,
        strip_accents: bool,
    ) -> BaseTokenizer<T> {
        BaseTokenizer {
            vocab,
            lower_case,
            strip_accents,
            tokenize_chinese_chars: true,
            never_split: HashSet::new(),
        }
    }

    /// Isolate CJK ideographs as single tokens (enabled by default).
    pub fn with_tokenize_chinese_chars(mut self, enabled: bool) -> Self {
        self.tokenize_chinese_chars = enabled;
        self
    }

    pub fn with_never_split<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.never_split.extend(tokens.into_iter().map(Into::into));
        self
    }

    pub fn lower_case(&self) -> bool {
        self.lower_case
    }

    pub(crate) fn vocab_mut(&mut self) -> &mut T {
        &mut self.vocab
    }
}

impl<T: Vocab> Tokenizer<T> for BaseTokenizer<T> {
    fn vocab(&self) -> &T {
        &self.vocab
    }

    fn tokenize_to_tokens(&self, initial_token: TokenRef) -> Vec<Token> {
        // normalization runs on whole words so that punctuation produced by
        // decomposition (e.g. U+1FEF into a backtick) still gets split off
        let words: Vec<Token> = whitespace_tokenize(initial_token)
            .into_iter()
            .flat_map(|token| split_on_special_tokens(token, &self.vocab, true))
            .map(|token| mark_never_split(token, &self.never_split))
            .map(|token| {
                let mut token = token.to_owned();
                if token.mask != Mask::Special && token.mask != Mask::Unknown {
                    clean_text(&mut token, true);
                    if self.lower_case {
                        lowercase(&mut token);
                    }
                    if self.strip_accents {
                        strip_accents(&mut token);
                    }
                }
                token
            })
            .collect();

        words
            .iter()
            .flat_map(|token| split_on_punct(token.as_ref()))
            .flat_map(|token| {
                if self.tokenize_chinese_chars {
                    tokenize_cjk_chars(token)
                } else {
                    vec![token]
                }
            })
            .map(|token| token.to_owned())
            .filter(|token| !token.text.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{base_vocab::tests::vocab_from, BaseVocab};
    use pretty_assertions::assert_eq;

    fn base_tokenizer(lower_case: bool, strip: bool) -> BaseTokenizer<BaseVocab> {
        let vocab = vocab_from(
            &[
                "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "hello", ",",
                "world", "!",
            ],
            "[UNK]",
        );
        BaseTokenizer::from_existing_vocab(vocab, lower_case, strip)
    }

    #[test]
    fn test_base_tokenizer() {
        //        Given
        let tokenizer = base_tokenizer(true, true);
        let test_tuples = [
            ("Hello, World!", vec!["hello", ",", "world", "!"]),
            ("[CLS]Hello[SEP]", vec!["[CLS]", "hello", "[SEP]"]),
            ("Café  au\tlait", vec!["cafe", "au", "lait"]),
            ("中华人民", vec!["中", "华", "人", "民"]),
            ("a\u{200B}b", vec!["ab"]),
            ("   ", vec![]),
            ("", vec![]),
            ("$5.00", vec!["$", "5", ".", "00"]),
        ];

        //        When & Then
        for (source_text, expected_tokens) in test_tuples.iter() {
            assert_eq!(tokenizer.tokenize(source_text), *expected_tokens);
        }
    }

    #[test]
    fn offsets_point_into_the_raw_text() {
        let tokenizer = base_tokenizer(true, false);

        let tokens = tokenizer.tokenize_with_offsets("Hello, World!");

        assert_eq!(
            tokens.offsets,
            vec![
                Some(Offset::new(0, 5)),
                Some(Offset::new(5, 6)),
                Some(Offset::new(7, 12)),
                Some(Offset::new(12, 13)),
            ]
        );
        assert_eq!(tokens.masks[1], Mask::Punctuation);
        assert_eq!(tokens.reference_offsets[0], vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn casing_and_accents_are_optional() {
        let keep_all = base_tokenizer(false, false);
        let lower_only = base_tokenizer(true, false);

        assert_eq!(keep_all.tokenize("Café"), vec!["Café"]);
        assert_eq!(lower_only.tokenize("Café"), vec!["café"]);
    }

    #[test]
    fn punctuation_from_decomposition_is_split() {
        let tokenizer = base_tokenizer(true, true);

        let tokens = tokenizer.tokenize_with_offsets("a\u{1FEF}b");

        assert_eq!(tokens.tokens, vec!["a", "`", "b"]);
        assert_eq!(tokens.masks[1], Mask::Punctuation);
        assert_eq!(tokens.offsets[1], Some(Offset::new(1, 2)));
        assert_eq!(tokens.offsets[2], Some(Offset::new(2, 3)));
    }

    #[test]
    fn never_split_tokens_pass_through() {
        let tokenizer =
            base_tokenizer(true, true).with_never_split(vec!["[CUSTOM]"]);
        let plain = base_tokenizer(true, true);

        assert_eq!(
            tokenizer.tokenize("Hello [CUSTOM]"),
            vec!["hello", "[CUSTOM]"]
        );
        assert_eq!(
            plain.tokenize("Hello [CUSTOM]"),
            vec!["hello", "[", "custom", "]"]
        );
    }

    #[test]
    fn cjk_isolation_can_be_disabled() {
        let tokenizer =
            base_tokenizer(false, false).with_tokenize_chinese_chars(false);

        assert_eq!(tokenizer.tokenize("中华 人民"), vec!["中华", "人民"]);
    }

    #[test]
    fn encode_without_special_tokens() {
        let tokenizer = base_tokenizer(true, false);

        let encoded = tokenizer
            .encode("Hello, world!", None, 3, &TruncationStrategy::LongestFirst, 0)
            .unwrap();

        assert_eq!(encoded.token_ids, vec![5, 6, 7]);
        assert_eq!(encoded.overflowing_tokens, vec![8]);
        assert_eq!(encoded.num_truncated_tokens, 1);
        assert_eq!(encoded.segment_ids, vec![0, 0, 0]);
    }

    #[test]
    fn decode_round_trip() {
        let tokenizer = base_tokenizer(true, false);
        let ids = tokenizer
            .convert_tokens_to_ids(tokenizer.tokenize("[CLS] hello, world! [SEP]"));

        assert_eq!(ids, vec![2, 5, 6, 7, 8, 3]);
        assert_eq!(
            tokenizer.decode(&ids, true, true).unwrap(),
            "hello, world!"
        );
        assert_eq!(
            tokenizer.decode(&ids, false, false).unwrap(),
            "[CLS] hello , world ! [SEP]"
        );
    }

    #[test]
    fn decoding_unassigned_ids_fails() {
        let tokenizer = base_tokenizer(true, false);

        let err = tokenizer.decode(&[5, 99], false, false).unwrap_err();

        assert!(matches!(err, TokenizerError::IndexOutOfRange { id: 99, .. }));
    }
}
