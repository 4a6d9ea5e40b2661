// Copyright 2018 The Google AI Language Team Authors
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
        base_tokenizer::{BaseTokenizer, Mask, Token, TokenRef, Tokenizer},
        template::SpecialTokenTemplate,
        tokenization_utils::{
            split_on_special_tokens, tokenize_wordpiece, whitespace_tokenize,
        },
    },
    vocab::{BertVocab, Vocab},
};
use itertools::Itertools;

/// # BERT tokenizer
/// BERT tokenizer performing:
/// - BaseTokenizer tokenization (see `BaseTokenizer` for more details)
/// - WordPiece tokenization
///
/// Inputs are wrapped as `[CLS] A [SEP]` and `[CLS] A [SEP] B [SEP]`.
#[derive(Debug, Clone)]
pub struct BertTokenizer {
    base_tokenizer: BaseTokenizer<BertVocab>,
    max_word_len: usize,
    do_basic_tokenize: bool,
}

impl BertTokenizer {
    /// Words longer than this (in characters) become the unknown token.
    pub const DEFAULT_MAX_WORD_LEN: usize = 100;

    /// Create a new instance of a `BertTokenizer` from an existing vocabulary
    ///
    /// # Parameters
    /// - vocab (`BertVocab`): BERT vocabulary, must register a `[CLS]` and a
    ///   `[SEP]` token
    /// - lower_case (`bool`): flag indicating if the text should be
    ///   lower-cased as part of the tokenization
    /// - strip_accents (`bool`): flag indicating if accents should be
    ///   stripped from the text
    pub fn from_existing_vocab(
        vocab: BertVocab,
        lower_case: bool,
        strip_accents: bool,
    ) -> Result<BertTokenizer, TokenizerError> {
        SpecialTokenTemplate::ClsSep.validate(&vocab)?;
        Ok(BertTokenizer {
            base_tokenizer: BaseTokenizer::from_existing_vocab(
                vocab,
                lower_case,
                strip_accents,
            ),
            max_word_len: BertTokenizer::DEFAULT_MAX_WORD_LEN,
            do_basic_tokenize: true,
        })
    }

    /// Create a tokenizer following a `tokenizer_config.json`. Accent
    /// stripping follows lower casing unless set explicitly.
    pub fn from_config(
        vocab: BertVocab,
        config: &TokenizerConfig,
    ) -> Result<BertTokenizer, TokenizerError> {
        if config.max_word_len == 0 {
            return Err(TokenizerError::ConfigurationError(
                "max_word_len must be at least 1".into(),
            ));
        }
        SpecialTokenTemplate::ClsSep.validate(&vocab)?;
        let lower_case = config.lower_case_or(true);
        let base_tokenizer = BaseTokenizer::from_existing_vocab(
            vocab,
            lower_case,
            config.resolve_strip_accents(lower_case),
        )
        .with_tokenize_chinese_chars(config.tokenize_chinese_chars)
        .with_never_split(config.never_split.iter().cloned());

        Ok(BertTokenizer {
            base_tokenizer,
            max_word_len: config.max_word_len,
            do_basic_tokenize: config.do_basic_tokenize,
        })
    }

    pub fn with_max_word_len(mut self, max_word_len: usize) -> Self {
        self.max_word_len = max_word_len;
        self
    }

    /// Without basic tokenization, text is only split on whitespace and
    /// special tokens before WordPiece: no cleaning, casing or punctuation
    /// splitting.
    pub fn with_basic_tokenize(mut self, do_basic_tokenize: bool) -> Self {
        self.do_basic_tokenize = do_basic_tokenize;
        self
    }

    fn wordpiece(&self, token: Token) -> Vec<Token> {
        match token.mask {
            Mask::Special | Mask::Unknown => vec![token],
            _ => tokenize_wordpiece(
                token.as_ref(),
                self.vocab(),
                self.max_word_len,
            ),
        }
    }

    /// Appends regular tokens to the vocabulary, returns how many were new.
    pub fn add_tokens(&mut self, tokens: &[&str]) -> usize {
        self.base_tokenizer.vocab_mut().add_tokens(tokens)
    }

    /// Appends tokens that are matched whole and never split.
    pub fn add_special_tokens(&mut self, tokens: &[&str]) -> usize {
        self.base_tokenizer.vocab_mut().add_special_tokens(tokens)
    }
}

impl Tokenizer<BertVocab> for BertTokenizer {
    fn vocab(&self) -> &BertVocab {
        self.base_tokenizer.vocab()
    }

    fn tokenize_to_tokens(&self, initial_token: TokenRef) -> Vec<Token> {
        if !self.do_basic_tokenize {
            return whitespace_tokenize(initial_token)
                .into_iter()
                .flat_map(|token| {
                    split_on_special_tokens(token, self.vocab(), true)
                })
                .flat_map(|token| self.wordpiece(token.to_owned()))
                .collect();
        }

        // the base tokenizers does most of the work, we simply add a wordpiece
        // tokenizer on top
        self.base_tokenizer
            .tokenize_to_tokens(initial_token)
            .into_iter()
            .flat_map(|token| self.wordpiece(token))
            .collect()
    }

    fn template(&self) -> SpecialTokenTemplate {
        SpecialTokenTemplate::ClsSep
    }

    fn convert_tokens_to_string(&self, tokens: Vec<String>) -> String {
        tokens.iter().join(" ").replace(" ##", "").trim().to_owned()
    }
}
