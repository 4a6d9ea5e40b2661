// Copyright 2018 The Open AI Team Authors
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
    config::TokenizerConfig,
    error::TokenizerError,
    tokenizer::{
        base_tokenizer::{Mask, Offset, OffsetSize, Token, TokenRef, Tokenizer},
        constants::UNICODE_TO_BYTES,
        template::SpecialTokenTemplate,
        tokenization_utils::{
            bpe, fix_mask, lowercase, split_on_bpe_pairs,
            split_on_regex_with_lookahead, split_on_special_tokens, BpeCache,
        },
    },
    vocab::{BpePairVocab, Gpt2Vocab, Vocab},
};
use regex::Regex;
use std::{collections::HashMap, path::Path, sync::RwLock};

const PATTERN_LOOKAHEAD: &str = r"\s+\S";
const PATTERN_TOKENIZATION: &str =
    r"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+";

/// # GPT2 tokenizer
/// GPT2 tokenizer performing:
/// - splitting on special characters
/// - (optional) lower casing
/// - (optional) adding a leading space
/// - GPT-2 regex pre-tokenization
/// - byte-level BPE tokenization
///
/// BPE results are memoized per pre-tokenized word, behind a lock owned by
/// the tokenizer.
#[derive(Debug)]
pub struct Gpt2Tokenizer {
    vocab: Gpt2Vocab,
    bpe_ranks: BpePairVocab,
    cache: BpeCache,
    pattern_lookahead: Regex,
    pattern_tokenization: Regex,
    lower_case: bool,
    add_prefix_space: bool,
    template: SpecialTokenTemplate,
}

impl Gpt2Tokenizer {
    /// Create a new instance of a `Gpt2Tokenizer` from an existing vocabulary
    /// and merges
    ///
    /// # Parameters
    /// - vocab (`Gpt2Vocab`): GPT-like vocabulary
    /// - merges (`BpePairVocab`): BPE pairs vocabulary
    /// - lower_case (`bool`): flag indicating if the text should be
    ///   lower-cased as part of the tokenization
    pub fn from_existing_vocab_and_merges(
        vocab: Gpt2Vocab,
        merges: BpePairVocab,
        lower_case: bool,
    ) -> Result<Gpt2Tokenizer, TokenizerError> {
        let pattern_lookahead = compile(PATTERN_LOOKAHEAD)?;
        let pattern_tokenization = compile(PATTERN_TOKENIZATION)?;
        Ok(Gpt2Tokenizer {
            vocab,
            bpe_ranks: merges,
            cache: RwLock::new(HashMap::new()),
            pattern_lookahead,
            pattern_tokenization,
            lower_case,
            add_prefix_space: false,
            template: SpecialTokenTemplate::Plain,
        })
    }

    /// Loads a `vocab.json` and a `merges.txt` with the default GPT2 special
    /// tokens.
    pub fn from_file<V, M>(
        vocab_path: V,
        merges_path: M,
        lower_case: bool,
    ) -> Result<Gpt2Tokenizer, TokenizerError>
    where
        V: AsRef<Path>,
        M: AsRef<Path>,
    {
        let vocab = Gpt2Vocab::from_file(vocab_path)?;
        let merges = BpePairVocab::from_file(merges_path)?;
        Gpt2Tokenizer::from_existing_vocab_and_merges(vocab, merges, lower_case)
    }

    /// Create a tokenizer following a `tokenizer_config.json`. Lower casing
    /// is off unless requested.
    pub fn from_config(
        vocab: Gpt2Vocab,
        merges: BpePairVocab,
        config: &TokenizerConfig,
    ) -> Result<Gpt2Tokenizer, TokenizerError> {
        let template = if config.add_bos_token {
            SpecialTokenTemplate::Bos
        } else {
            SpecialTokenTemplate::Plain
        };
        Gpt2Tokenizer::from_existing_vocab_and_merges(
            vocab,
            merges,
            config.lower_case_or(false),
        )?
        .with_add_prefix_space(config.add_prefix_space)
        .with_template(template)
    }

    /// Treat the start of the text as a word boundary, so that the first
    /// word is encoded like any other.
    pub fn with_add_prefix_space(mut self, add_prefix_space: bool) -> Self {
        self.add_prefix_space = add_prefix_space;
        self
    }

    /// Selects the special token layout, failing if the vocabulary lacks a
    /// token it needs.
    pub fn with_template(
        mut self,
        template: SpecialTokenTemplate,
    ) -> Result<Self, TokenizerError> {
        template.validate(&self.vocab)?;
        self.template = template;
        Ok(self)
    }

    pub fn add_tokens(&mut self, tokens: &[&str]) -> usize {
        self.vocab.add_tokens(tokens)
    }

    pub fn add_special_tokens(&mut self, tokens: &[&str]) -> usize {
        self.vocab.add_special_tokens(tokens)
    }

    fn needs_prefix_space(&self, text: &str) -> bool {
        self.add_prefix_space && !text.starts_with(char::is_whitespace)
    }
}

fn compile(pattern: &str) -> Result<Regex, TokenizerError> {
    Regex::new(pattern).map_err(|e| {
        TokenizerError::ConfigurationError(format!(
            "Invalid pre-tokenization pattern: {}",
            e
        ))
    })
}

/// The leading space is attributed to the first character of the text.
fn with_prefix_space(token: TokenRef<'_>) -> Token {
    let first = token
        .reference_offsets
        .first()
        .copied()
        .unwrap_or(token.offset.begin);
    let mut reference_offsets =
        Vec::with_capacity(token.reference_offsets.len() + 1);
    reference_offsets.push(first);
    reference_offsets.extend_from_slice(token.reference_offsets);

    Token {
        text: format!(" {}", token.text),
        offset: Offset::new(
            token.offset.begin,
            token.offset.begin + reference_offsets.len() as OffsetSize,
        ),
        reference_offsets,
        mask: token.mask,
    }
}

impl Tokenizer<Gpt2Vocab> for Gpt2Tokenizer {
    fn vocab(&self) -> &Gpt2Vocab {
        &self.vocab
    }

    fn tokenize_to_tokens(&self, initial_token: TokenRef) -> Vec<Token> {
        let prefixed;
        let initial_token = if self.needs_prefix_space(initial_token.text) {
            prefixed = with_prefix_space(initial_token);
            prefixed.as_ref()
        } else {
            initial_token
        };

        let mut tokens =
            split_on_special_tokens(initial_token, &self.vocab, false)
                .into_iter()
                .map(|token| token.to_owned())
                .collect::<Vec<Token>>();

        let mut sub_tokens = Vec::new();
        for token in tokens.iter_mut() {
            if token.mask != Mask::Special && token.mask != Mask::Unknown {
                if self.lower_case {
                    lowercase(token);
                }
                for token in split_on_regex_with_lookahead(
                    token.as_ref(),
                    &self.pattern_lookahead,
                    &self.pattern_tokenization,
                ) {
                    sub_tokens.extend(split_on_bpe_pairs(
                        token,
                        bpe,
                        &self.bpe_ranks,
                        &self.cache,
                        true,
                    ));
                }
            } else {
                sub_tokens.push(token.clone());
            }
        }

        fix_mask(&mut sub_tokens);
        sub_tokens
    }

    fn template(&self) -> SpecialTokenTemplate {
        self.template
    }

    /// Regular tokens are decoded byte-wise, special tokens are kept as
    /// separate words: a space is inserted next to one unless the
    /// neighbouring text already has whitespace there.
    fn convert_tokens_to_string(&self, tokens: Vec<String>) -> String {
        let mut output = String::new();
        let mut bytes = Vec::new();
        let mut after_special = false;
        for token in &tokens {
            if self.vocab.special_values().contains_key(token) {
                push_segment(&mut output, &bytes_to_string(&bytes), after_special);
                bytes.clear();
                push_segment(&mut output, token, true);
                after_special = true;
            } else {
                bytes.extend(token_bytes(token));
            }
        }
        push_segment(&mut output, &bytes_to_string(&bytes), after_special);
        output
    }
}

fn token_bytes(token: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(token.len());
    for character in token.chars() {
        match UNICODE_TO_BYTES.get(&character) {
            Some(byte) => bytes.push(*byte),
            None => {
                let mut buffer = [0; 4];
                bytes.extend_from_slice(
                    character.encode_utf8(&mut buffer).as_bytes(),
                );
            },
        }
    }
    bytes
}

fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Appends `segment`, separated by a space when `separate` is set and
/// neither side of the boundary is whitespace already.
fn push_segment(output: &mut String, segment: &str, separate: bool) {
    if segment.is_empty() {
        return;
    }
    if separate
        && !output.is_empty()
        && !output.ends_with(char::is_whitespace)
        && !segment.starts_with(char::is_whitespace)
    {
        output.push(' ');
    }
    output.push_str(segment);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        tokenizer::{
            base_tokenizer::TruncationStrategy,
            encoding::{EncodeInput, EncodingOptions, PaddingStrategy},
        },
        vocab::SpecialTokenMap,
    };
    use pretty_assertions::assert_eq;
    use std::thread;

    const MERGES: &str = "#version: 0.2\nĠ l\nĠl o\nĠlo w\ne r\n\n";

    fn generate_test_vocab(with_pad: bool) -> Gpt2Vocab {
        let mut tokens = vec![
            "l", "o", "w", "e", "r", "s", "t", "i", "d", "n", "Ġ", "Ġl", "Ġn",
            "Ġlo", "Ġlow", "er", "Ġlowest", "Ġnewer", "Ġwider", "<unk>",
            "<|endoftext|>",
        ];
        if with_pad {
            tokens.push("<pad>");
        }
        let values = tokens
            .iter()
            .enumerate()
            .map(|(id, token)| (token.to_string(), id as i64))
            .collect();
        let map = SpecialTokenMap {
            unk_token: "<unk>".to_string(),
            pad_token: with_pad.then(|| "<pad>".to_string()),
            ..SpecialTokenMap::gpt2()
        };
        Gpt2Vocab::from_values(values, map).unwrap()
    }

    fn tokenizer(with_pad: bool) -> Gpt2Tokenizer {
        Gpt2Tokenizer::from_existing_vocab_and_merges(
            generate_test_vocab(with_pad),
            MERGES.parse().unwrap(),
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_gpt2_tokenizer() {
        //        Given
        let gpt2_tokenizer = tokenizer(false).with_add_prefix_space(true);
        let test_tuples = [
            (
                "lower newer",
                vec!["Ġlow", "er", "Ġ", "n", "e", "w", "er"],
                vec![14, 15, 10, 9, 3, 2, 15],
            ),
            ("  lower", vec!["Ġ", "Ġlow", "er"], vec![10, 14, 15]),
            ("lowerz", vec!["Ġlow", "er", "z"], vec![14, 15, 19]),
            ("", vec![], vec![]),
        ];

        //        When & Then
        for (source_text, expected_tokens, expected_ids) in test_tuples.iter() {
            let tokens = gpt2_tokenizer.tokenize(source_text);
            assert_eq!(tokens, *expected_tokens);
            assert_eq!(gpt2_tokenizer.convert_tokens_to_ids(&tokens), *expected_ids);
        }
    }

    #[test]
    fn without_prefix_space_the_first_word_is_not_a_word_start() {
        let gpt2_tokenizer = tokenizer(false);

        let tokens = gpt2_tokenizer.tokenize("lower newer");

        assert_eq!(tokens, vec!["l", "o", "w", "er", "Ġ", "n", "e", "w", "er"]);
    }

    #[test]
    fn decoding_recovers_the_text() {
        let gpt2_tokenizer = tokenizer(false);
        let text = "lower newer";

        let ids = gpt2_tokenizer
            .convert_tokens_to_ids(gpt2_tokenizer.tokenize(text));

        assert_eq!(gpt2_tokenizer.decode(&ids, false, false).unwrap(), text);
    }

    #[test]
    fn prefix_space_maps_to_the_first_character() {
        let gpt2_tokenizer = tokenizer(false).with_add_prefix_space(true);

        let tokens = gpt2_tokenizer.tokenize_with_offsets("lower newer");

        assert_eq!(
            tokens.offsets,
            vec![
                Some(Offset::new(0, 3)),
                Some(Offset::new(3, 5)),
                Some(Offset::new(5, 6)),
                Some(Offset::new(6, 7)),
                Some(Offset::new(7, 8)),
                Some(Offset::new(8, 9)),
                Some(Offset::new(9, 11)),
            ]
        );
        assert_eq!(tokens.masks[0], Mask::Begin);
        assert_eq!(tokens.masks[1], Mask::Continuation);
    }

    #[test]
    fn special_tokens_are_kept_whole() {
        let gpt2_tokenizer = tokenizer(false);

        let tokens = gpt2_tokenizer.tokenize("<|endoftext|>lower");

        assert_eq!(tokens, vec!["<|endoftext|>", "l", "o", "w", "er"]);
        assert_eq!(
            gpt2_tokenizer.decode(&[20, 0, 1, 2, 15], true, false).unwrap(),
            "lower"
        );
    }

    #[test]
    fn whitespace_around_special_tokens_survives_decoding() {
        let gpt2_tokenizer = tokenizer(false);
        let text = "lower <|endoftext|> lower";

        let tokens = gpt2_tokenizer.tokenize(text);
        let ids = gpt2_tokenizer.convert_tokens_to_ids(&tokens);

        assert_eq!(
            tokens,
            vec!["l", "o", "w", "er", "Ġ", "<|endoftext|>", "Ġlow", "er"]
        );
        assert_eq!(gpt2_tokenizer.decode(&ids, false, false).unwrap(), text);
        assert_eq!(
            gpt2_tokenizer.decode(&ids, true, false).unwrap(),
            "lower  lower"
        );
    }

    #[test]
    fn decoded_bos_token_is_a_separate_word() {
        let gpt2_tokenizer = tokenizer(false)
            .with_template(SpecialTokenTemplate::Bos)
            .unwrap();

        let encoded = gpt2_tokenizer
            .encode_plus("lower newer", &EncodingOptions::default())
            .unwrap();
        let decoded = gpt2_tokenizer
            .decode(&encoded.input_ids, false, false)
            .unwrap();

        assert_eq!(decoded, "<|endoftext|> lower newer");
        assert_eq!(decoded.split_whitespace().next(), Some("<|endoftext|>"));
        assert_eq!(
            gpt2_tokenizer.decode(&[0, 1, 2, 15, 20, 20], false, false).unwrap(),
            "lower <|endoftext|> <|endoftext|>"
        );
    }

    #[test]
    fn cache_does_not_change_results() {
        let gpt2_tokenizer = tokenizer(false).with_add_prefix_space(true);

        let cold = gpt2_tokenizer.tokenize_with_offsets("lower newer lower");
        let warm = gpt2_tokenizer.tokenize_with_offsets("lower newer lower");

        assert_eq!(cold, warm);
        assert_eq!(gpt2_tokenizer.cache.read().unwrap().len(), 2);
    }

    #[test]
    fn concurrent_use_gives_the_same_results() {
        let gpt2_tokenizer = tokenizer(false).with_add_prefix_space(true);
        let expected = vec!["Ġlow", "er", "Ġ", "n", "e", "w", "er"];
        let shared = &gpt2_tokenizer;

        thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(move || shared.tokenize("lower newer")))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn bos_template() {
        let gpt2_tokenizer = tokenizer(false)
            .with_template(SpecialTokenTemplate::Bos)
            .unwrap();

        let encoded = gpt2_tokenizer
            .encode("lower", None, 16, &TruncationStrategy::LongestFirst, 0)
            .unwrap();

        assert_eq!(encoded.token_ids, vec![20, 0, 1, 2, 15]);
        assert_eq!(encoded.special_tokens_mask, vec![1, 0, 0, 0, 0]);
    }

    #[test]
    fn bos_eos_template_rejects_pairs() {
        let gpt2_tokenizer = tokenizer(false)
            .with_template(SpecialTokenTemplate::BosEos)
            .unwrap();

        let err = gpt2_tokenizer
            .encode_plus(("lower", "newer"), &EncodingOptions::default())
            .unwrap_err();

        assert!(matches!(err, TokenizerError::EncodingError(_)));
    }

    #[test]
    fn templates_need_their_tokens() {
        let err = tokenizer(false)
            .with_template(SpecialTokenTemplate::ClsSep)
            .unwrap_err();

        assert!(err.is_configuration_error());
    }

    #[test]
    fn pad_to_the_longest_sequence() {
        let gpt2_tokenizer = tokenizer(true);
        let options = EncodingOptions {
            padding: PaddingStrategy::Longest,
            ..Default::default()
        };
        let inputs: [EncodeInput; 2] = ["lower".into(), "lower newer".into()];

        let encoded = gpt2_tokenizer.encode_batch(&inputs, &options).unwrap();

        assert_eq!(encoded[0].input_ids, vec![0, 1, 2, 15, 21, 21, 21, 21, 21]);
        assert_eq!(
            encoded[0].attention_mask,
            Some(vec![1, 1, 1, 1, 0, 0, 0, 0, 0])
        );
        assert_eq!(encoded[1].input_ids, vec![0, 1, 2, 15, 10, 9, 3, 2, 15]);
    }

    #[test]
    fn padding_without_pad_token_fails() {
        let gpt2_tokenizer = tokenizer(false);
        let options = EncodingOptions {
            padding: PaddingStrategy::Longest,
            ..Default::default()
        };
        let inputs: [EncodeInput; 2] = ["lower".into(), "lower newer".into()];

        let err = gpt2_tokenizer.encode_batch(&inputs, &options).unwrap_err();

        assert!(matches!(err, TokenizerError::EncodingError(_)));
    }

    #[test]
    fn config_selects_prefix_space_and_bos() {
        let config: TokenizerConfig =
            r#"{"add_prefix_space": true, "add_bos_token": true}"#
                .parse()
                .unwrap();

        let gpt2_tokenizer = Gpt2Tokenizer::from_config(
            generate_test_vocab(false),
            MERGES.parse().unwrap(),
            &config,
        )
        .unwrap();

        assert_eq!(gpt2_tokenizer.template(), SpecialTokenTemplate::Bos);
        assert_eq!(gpt2_tokenizer.tokenize("lower"), vec!["Ġlow", "er"]);
    }
}
