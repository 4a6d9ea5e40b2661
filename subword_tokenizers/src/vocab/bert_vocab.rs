// Copyright 2018 The Open AI Team Authors, The Google AI Language Team Authors
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
    io::{BufRead, BufReader},
    path::Path,
    str::FromStr,
};

/// # BERT Vocab
/// Vocabulary for BERT tokenizer. Contains the following special values:
/// - CLS token
/// - SEP token
/// - PAD token
/// - MASK token
///
/// Expects a flat text vocabulary when created from file, the id of a token
/// being its (0-based) line number.
#[derive(Debug, Clone)]
pub struct BertVocab {
    base: BaseVocab,
}

impl BertVocab {
    /// Returns the PAD token for BERT (`[PAD]`)
    pub const PAD: &'static str = "[PAD]";

    /// Returns the SEP token for BERT (`[SEP]`)
    pub const SEPARATOR: &'static str = "[SEP]";

    /// Returns the CLS token for BERT (`[CLS]`)
    pub const CLS: &'static str = "[CLS]";

    /// Returns the MASK token for BERT (`[MASK]`)
    pub const MASK: &'static str = "[MASK]";

    /// Returns the UNK token for BERT (`[UNK]`)
    pub const UNKNOWN: &'static str = "[UNK]";

    pub fn from_file<P: AsRef<Path>>(
        path: P,
    ) -> Result<BertVocab, TokenizerError> {
        BertVocab::from_file_with_special_token_mapping(
            path,
            SpecialTokenMap::bert(),
        )
    }

    pub fn from_file_with_special_token_mapping<P: AsRef<Path>>(
        path: P,
        special_token_map: SpecialTokenMap,
    ) -> Result<BertVocab, TokenizerError> {
        let path = path.as_ref();
        let f = File::open(path)
            .map_err(|e| TokenizerError::file_not_found(path, e))?;
        let vocab = BertVocab::from_reader_with_special_token_mapping(
            BufReader::new(f),
            special_token_map,
        )?;
        tracing::debug!(path = %path.display(), tokens = vocab.len(), "Loaded a WordPiece vocabulary");
        Ok(vocab)
    }

    pub fn from_reader<R: BufRead>(
        reader: R,
    ) -> Result<BertVocab, TokenizerError> {
        BertVocab::from_reader_with_special_token_mapping(
            reader,
            SpecialTokenMap::bert(),
        )
    }

    pub fn from_reader_with_special_token_mapping<R: BufRead>(
        reader: R,
        special_token_map: SpecialTokenMap,
    ) -> Result<BertVocab, TokenizerError> {
        let values = read_lines(reader)?;
        let base = BaseVocab::from_values(values, special_token_map)?;
        Ok(BertVocab { base })
    }
}

fn read_lines<R: BufRead>(
    reader: R,
) -> Result<HashMap<String, i64>, TokenizerError> {
    let mut values = HashMap::new();

    for (next_index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            TokenizerError::VocabularyParsingError(e.to_string())
        })?;
        let word = line.trim_end_matches(&['\r', '\n'][..]);

        if let Some(original_index) =
            values.insert(word.to_string(), next_index as i64)
        {
            return Err(TokenizerError::VocabularyParsingError(format!(
                "\"{}\" appears on line {} and again on line {}",
                word,
                original_index + 1,
                next_index + 1,
            )));
        }
    }

    Ok(values)
}

impl FromStr for BertVocab {
    type Err = TokenizerError;

    fn from_str(dictionary: &str) -> Result<Self, TokenizerError> {
        BertVocab::from_reader(dictionary.as_bytes())
    }
}

impl Vocab for BertVocab {
    fn base(&self) -> &BaseVocab {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseVocab {
        &mut self.base
    }
}
