//! Batch encoding: truncation, special tokens and padding on top of a
//! tokenizer's token ids.

use crate::{
    error::TokenizerError,
    tokenizer::{
        base_tokenizer::{
            OffsetSize, Side, TokenIdsWithOffsets, TokenizedInput, Tokenizer,
            TruncationStrategy,
        },
        offsets::offset_mapping,
        template::SpecialTokenTemplate,
        tokenization_utils::truncate_sequences,
    },
    vocab::{SpecialTokenRole, Vocab},
};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fs::File, io::BufReader, iter, path::Path};

/// A single text or a text pair to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeInput<'a> {
    Single(Cow<'a, str>),
    Pair(Cow<'a, str>, Cow<'a, str>),
}

impl<'a> EncodeInput<'a> {
    /// Decodes raw bytes, replacing malformed UTF-8 sequences with
    /// `U+FFFD` (which text cleaning later drops).
    pub fn from_utf8_lossy(bytes: &'a [u8]) -> EncodeInput<'a> {
        EncodeInput::Single(String::from_utf8_lossy(bytes))
    }

    pub fn pair_from_utf8_lossy(
        first: &'a [u8],
        second: &'a [u8],
    ) -> EncodeInput<'a> {
        EncodeInput::Pair(
            String::from_utf8_lossy(first),
            String::from_utf8_lossy(second),
        )
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, EncodeInput::Pair(..))
    }
}

impl<'a> From<&'a str> for EncodeInput<'a> {
    fn from(text: &'a str) -> Self {
        EncodeInput::Single(Cow::Borrowed(text))
    }
}

impl From<String> for EncodeInput<'static> {
    fn from(text: String) -> Self {
        EncodeInput::Single(Cow::Owned(text))
    }
}

impl<'a> From<(&'a str, &'a str)> for EncodeInput<'a> {
    fn from((first, second): (&'a str, &'a str)) -> Self {
        EncodeInput::Pair(Cow::Borrowed(first), Cow::Borrowed(second))
    }
}

impl From<(String, String)> for EncodeInput<'static> {
    fn from((first, second): (String, String)) -> Self {
        EncodeInput::Pair(Cow::Owned(first), Cow::Owned(second))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PaddingStrategy {
    #[default]
    #[serde(rename = "none")]
    DoNotPad,
    /// Pad to the longest sequence of the batch.
    Longest,
    /// Pad to `max_length`.
    MaxLength,
}

/// Per-call encoding options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingOptions {
    /// Wrap the sequences with the special tokens of the tokenizer family.
    pub add_special_tokens: bool,
    pub padding: PaddingStrategy,
    /// Length limit for truncation and for `PaddingStrategy::MaxLength`,
    /// special tokens included.
    pub max_length: Option<usize>,
    /// Truncate to `max_length`. Without it, `max_length` only drives
    /// padding.
    pub truncation: bool,
    pub truncation_strategy: TruncationStrategy,
    pub truncation_side: Side,
    pub padding_side: Side,
    pub pad_to_multiple_of: Option<usize>,
    /// Number of kept tokens repeated in the overflowing tokens.
    pub stride: usize,
    pub return_offsets_mapping: bool,
    pub return_attention_mask: bool,
    pub return_token_type_ids: bool,
    pub return_special_tokens_mask: bool,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        EncodingOptions {
            add_special_tokens: true,
            padding: PaddingStrategy::DoNotPad,
            max_length: None,
            truncation: false,
            truncation_strategy: TruncationStrategy::LongestFirst,
            truncation_side: Side::Right,
            padding_side: Side::Right,
            pad_to_multiple_of: None,
            stride: 0,
            return_offsets_mapping: false,
            return_attention_mask: true,
            return_token_type_ids: true,
            return_special_tokens_mask: false,
        }
    }
}

impl EncodingOptions {
    pub fn from_file<P: AsRef<Path>>(
        path: P,
    ) -> Result<EncodingOptions, TokenizerError> {
        let path = path.as_ref();
        let f = File::open(path)
            .map_err(|e| TokenizerError::file_not_found(path, e))?;
        serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            TokenizerError::ConfigurationError(format!(
                "Unable to read the encoding options: {}",
                e
            ))
        })
    }
}

/// Model-ready encoding of one input. All present sequences have the same
/// length as `input_ids`; optional ones are `None` when not requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedSequence {
    pub input_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type_ids: Option<Vec<i8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attention_mask: Option<Vec<i8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_tokens_mask: Option<Vec<i8>>,
    /// Character spans into the input text, `(0, 0)` for special and
    /// padding tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_mapping: Option<Vec<(OffsetSize, OffsetSize)>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overflowing_tokens: Vec<i64>,
    pub num_truncated_tokens: usize,
}

impl EncodedSequence {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Truncation {
    pub(crate) max_length: usize,
    pub(crate) strategy: TruncationStrategy,
    pub(crate) side: Side,
    pub(crate) stride: usize,
}

#[derive(Debug, Clone, Copy)]
struct Padding {
    length: usize,
    pad_id: i64,
    side: Side,
}

/// Truncates the sequences so that they fit in `max_length` once wrapped
/// with the special tokens of `template`, then wraps them.
pub(crate) fn assemble(
    vocab: &impl Vocab,
    template: SpecialTokenTemplate,
    first: TokenIdsWithOffsets,
    second: Option<TokenIdsWithOffsets>,
    truncation: Option<Truncation>,
) -> Result<TokenizedInput, TokenizerError> {
    let num_special_tokens = template.num_special_tokens(second.is_some())?;
    let total_len = first.len()
        + second.as_ref().map_or(0, TokenIdsWithOffsets::len)
        + num_special_tokens;

    let truncation = match truncation {
        Some(truncation) if total_len > truncation.max_length => {
            if truncation.max_length < num_special_tokens {
                return Err(TokenizerError::EncodingError(format!(
                    "A maximum length of {} cannot hold the {} special tokens of the {:?} layout",
                    truncation.max_length, num_special_tokens, template
                )));
            }
            Some((total_len - truncation.max_length, truncation))
        },
        _ => None,
    };

    let (first, second, overflowing_tokens, num_truncated_tokens) =
        match truncation {
            Some((num_tokens_to_remove, truncation)) => {
                let (first, second, overflowing_tokens, _) =
                    truncate_sequences(
                        first,
                        second,
                        num_tokens_to_remove,
                        &truncation.strategy,
                        truncation.side,
                        truncation.stride,
                    )?;
                (first, second, overflowing_tokens, num_tokens_to_remove)
            },
            None => (first, second, Vec::new(), 0),
        };

    let merged = template.build(vocab, first, second)?;

    Ok(TokenizedInput {
        token_ids: merged.token_ids,
        segment_ids: merged.segment_ids,
        special_tokens_mask: merged.special_tokens_mask,
        overflowing_tokens,
        num_truncated_tokens,
        token_offsets: merged.token_offsets,
        reference_offsets: merged.reference_offsets,
        mask: merged.mask,
    })
}

pub(crate) fn encode_batch<V, T>(
    tokenizer: &T,
    inputs: &[EncodeInput<'_>],
    options: &EncodingOptions,
) -> Result<Vec<EncodedSequence>, TokenizerError>
where
    V: Vocab,
    T: Tokenizer<V>,
{
    if let Some(head) = inputs.first() {
        if inputs.iter().any(|input| input.is_pair() != head.is_pair()) {
            return Err(TokenizerError::EncodingError(
                "A batch cannot mix single sequences and sequence pairs"
                    .into(),
            ));
        }
    }
    if options.padding == PaddingStrategy::MaxLength
        && options.max_length.is_none()
    {
        return Err(TokenizerError::EncodingError(
            "Padding to the maximum length requires a max_length".into(),
        ));
    }

    let template = if options.add_special_tokens {
        tokenizer.template()
    } else {
        SpecialTokenTemplate::Plain
    };
    let truncation = match (options.truncation, options.max_length) {
        (true, Some(max_length)) => Some(Truncation {
            max_length,
            strategy: options.truncation_strategy,
            side: options.truncation_side,
            stride: options.stride,
        }),
        _ => None,
    };

    let assembled = inputs
        .iter()
        .map(|input| {
            let (first, second) = match input {
                EncodeInput::Single(text) => {
                    (tokenizer.token_ids_with_offsets(text.as_ref()), None)
                },
                EncodeInput::Pair(first, second) => (
                    tokenizer.token_ids_with_offsets(first.as_ref()),
                    Some(tokenizer.token_ids_with_offsets(second.as_ref())),
                ),
            };
            assemble(tokenizer.vocab(), template, first, second, truncation)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let padding = padding(tokenizer.vocab(), &assembled, options)?;
    tracing::trace!(
        batch_size = assembled.len(),
        padded_length = padding.map(|p| p.length),
        "Encoded a batch"
    );

    Ok(assembled
        .into_iter()
        .map(|input| finalize(input, padding, options))
        .collect())
}

fn padding(
    vocab: &impl Vocab,
    assembled: &[TokenizedInput],
    options: &EncodingOptions,
) -> Result<Option<Padding>, TokenizerError> {
    let length = match (options.padding, options.max_length) {
        (PaddingStrategy::DoNotPad, _) => return Ok(None),
        (PaddingStrategy::Longest, _) => assembled
            .iter()
            .map(|input| input.token_ids.len())
            .max()
            .unwrap_or(0),
        (PaddingStrategy::MaxLength, Some(max_length)) => max_length,
        (PaddingStrategy::MaxLength, None) => {
            return Err(TokenizerError::EncodingError(
                "Padding to the maximum length requires a max_length".into(),
            ))
        },
    };
    let length = match options.pad_to_multiple_of {
        Some(multiple) if multiple > 0 => {
            (length + multiple - 1) / multiple * multiple
        },
        _ => length,
    };
    let pad_id = vocab.token_id_for(SpecialTokenRole::Pad).ok_or_else(|| {
        TokenizerError::EncodingError(
            "Padding was requested but no padding token is registered".into(),
        )
    })?;

    Ok(Some(Padding {
        length,
        pad_id,
        side: options.padding_side,
    }))
}

fn pad<X: Clone>(values: &mut Vec<X>, value: X, count: usize, side: Side) {
    match side {
        Side::Right => values.extend(iter::repeat(value).take(count)),
        Side::Left => {
            values.splice(0..0, iter::repeat(value).take(count));
        },
    }
}

fn finalize(
    input: TokenizedInput,
    padding: Option<Padding>,
    options: &EncodingOptions,
) -> EncodedSequence {
    let TokenizedInput {
        mut token_ids,
        mut segment_ids,
        mut special_tokens_mask,
        overflowing_tokens,
        num_truncated_tokens,
        mut token_offsets,
        ..
    } = input;
    let mut attention_mask = vec![1; token_ids.len()];

    if let Some(padding) = padding {
        let missing = padding.length.saturating_sub(token_ids.len());
        if missing > 0 {
            pad(&mut token_ids, padding.pad_id, missing, padding.side);
            pad(&mut segment_ids, 0, missing, padding.side);
            pad(&mut special_tokens_mask, 1, missing, padding.side);
            pad(&mut attention_mask, 0, missing, padding.side);
            pad(&mut token_offsets, None, missing, padding.side);
        }
    }

    EncodedSequence {
        input_ids: token_ids,
        token_type_ids: options.return_token_type_ids.then(|| segment_ids),
        attention_mask: options.return_attention_mask.then(|| attention_mask),
        special_tokens_mask: options
            .return_special_tokens_mask
            .then(|| special_tokens_mask),
        offset_mapping: options
            .return_offsets_mapping
            .then(|| offset_mapping(&token_offsets)),
        overflowing_tokens,
        num_truncated_tokens,
    }
}
