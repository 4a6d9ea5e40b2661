// Copyright 2018 The Open AI Team Authors
// Copyright 2018 The HuggingFace Inc. team.
// Copyright 2019 Guillaume Becquin
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
    vocab::{
        base_vocab::{BaseVocab, Vocab},
        special_token_map::SpecialTokenMap,
    },
};
use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

/// # GPT2 Vocab
/// Vocabulary for GPT2 tokenizer. By default `<|endoftext|>` is registered
/// as the unknown, BOS and EOS token.
///
/// Expects a JSON-format vocabulary (an object mapping tokens to ids) when
/// created from file.
#[derive(Debug, Clone)]
pub struct Gpt2Vocab {
    base: BaseVocab,
}

impl Gpt2Vocab {
    pub fn from_file<P: AsRef<Path>>(
        path: P,
    ) -> Result<Gpt2Vocab, TokenizerError> {
        Gpt2Vocab::from_file_with_special_token_mapping(
            path,
            SpecialTokenMap::gpt2(),
        )
    }

    pub fn from_file_with_special_token_mapping<P: AsRef<Path>>(
        path: P,
        special_token_map: SpecialTokenMap,
    ) -> Result<Gpt2Vocab, TokenizerError> {
        let path = path.as_ref();
        let f = File::open(path)
            .map_err(|e| TokenizerError::file_not_found(path, e))?;
        let vocab = Gpt2Vocab::from_reader_with_special_token_mapping(
            BufReader::new(f),
            special_token_map,
        )?;
        tracing::debug!(
            path = %path.display(),
            tokens = vocab.len(),
            "Loaded a BPE vocabulary"
        );
        Ok(vocab)
    }

    pub fn from_reader_with_special_token_mapping<R: Read>(
        reader: R,
        special_token_map: SpecialTokenMap,
    ) -> Result<Gpt2Vocab, TokenizerError> {
        let values: HashMap<String, i64> = serde_json::from_reader(reader)?;
        Gpt2Vocab::from_values(values, special_token_map)
    }

    pub fn from_values(
        values: HashMap<String, i64>,
        special_token_map: SpecialTokenMap,
    ) -> Result<Gpt2Vocab, TokenizerError> {
        let base = BaseVocab::from_values(values, special_token_map)?;
        Ok(Gpt2Vocab { base })
    }
}

impl Vocab for Gpt2Vocab {
    fn base(&self) -> &BaseVocab {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseVocab {
        &mut self.base
    }
}
