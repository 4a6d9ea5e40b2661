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

use crate::error::TokenizerError;
use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    str::FromStr,
};

/// # Byte pair query
/// Structure holding a pair of bytes for query in the BPE vocabulary
#[derive(Eq, PartialEq, Hash, Clone, Copy, Debug)]
pub struct BpePairRef<'a> {
    pub byte_1: &'a str,
    pub byte_2: &'a str,
}

/// # Byte pair Encoding Vocab
/// BPE vocab containing the merges (dictionary of pairs with their priority)
/// used to merge pairs together. A lower rank merges first.
///
/// Pairs are stored as `first -> second -> rank` so that a pair of borrowed
/// symbols can be looked up without allocating.
#[derive(Debug, Clone, Default)]
pub struct BpePairVocab {
    values: HashMap<String, HashMap<String, i64>>,
    len: usize,
}

impl BpePairVocab {
    /// Creates a `BpePairVocab` from a merges file where each line holds a
    /// whitespace-separated pair. The rank of a pair is its position among
    /// the meaningful lines: `#version` headers and blank lines are skipped.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
    ) -> Result<BpePairVocab, TokenizerError> {
        let path = path.as_ref();
        let f = File::open(path)
            .map_err(|e| TokenizerError::file_not_found(path, e))?;
        let merges = BpePairVocab::from_reader(BufReader::new(f))?;
        tracing::debug!(
            path = %path.display(),
            merges = merges.len(),
            "Loaded the BPE merge rules"
        );
        Ok(merges)
    }

    pub fn from_reader<R: BufRead>(
        reader: R,
    ) -> Result<BpePairVocab, TokenizerError> {
        let mut vocab = BpePairVocab::default();

        for (line_number, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                TokenizerError::VocabularyParsingError(e.to_string())
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with("#version") {
                continue;
            }

            let mut symbols = line.split_whitespace();
            match (symbols.next(), symbols.next(), symbols.next()) {
                (Some(first), Some(second), None) => {
                    vocab.insert(first, second);
                },
                _ => {
                    return Err(TokenizerError::VocabularyParsingError(
                        format!(
                            "Line {} of the merges is not a pair: \"{}\"",
                            line_number + 1,
                            line
                        ),
                    ))
                },
            }
        }

        Ok(vocab)
    }

    /// Builds the merge table from pairs listed in priority order.
    pub fn from_pairs<'a, I>(pairs: I) -> BpePairVocab
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut vocab = BpePairVocab::default();
        for (first, second) in pairs {
            vocab.insert(first, second);
        }
        vocab
    }

    fn insert(&mut self, first: &str, second: &str) {
        let rank = self.len as i64;
        let ranks = self.values.entry(first.to_string()).or_default();
        if !ranks.contains_key(second) {
            ranks.insert(second.to_string(), rank);
            self.len += 1;
        }
    }

    /// Gets the rank of a "byte pair" in the merges vocab, if the pair can
    /// be merged.
    pub fn byte_pair_to_id(&self, byte_pair: &BpePairRef<'_>) -> Option<i64> {
        self.values
            .get(byte_pair.byte_1)
            .and_then(|ranks| ranks.get(byte_pair.byte_2))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl FromStr for BpePairVocab {
    type Err = TokenizerError;

    fn from_str(merges: &str) -> Result<Self, TokenizerError> {
        BpePairVocab::from_reader(merges.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank(vocab: &BpePairVocab, byte_1: &str, byte_2: &str) -> Option<i64> {
        vocab.byte_pair_to_id(&BpePairRef { byte_1, byte_2 })
    }

    #[test]
    fn ranks_skip_the_header_and_blank_lines() {
        let merges: BpePairVocab =
            "#version: 0.2\nĠ l\n\nĠl o\nĠlo w\ne r\n".parse().unwrap();

        assert_eq!(merges.len(), 4);
        assert_eq!(rank(&merges, "Ġ", "l"), Some(0));
        assert_eq!(rank(&merges, "Ġl", "o"), Some(1));
        assert_eq!(rank(&merges, "e", "r"), Some(3));
        assert_eq!(rank(&merges, "r", "e"), None);
    }

    #[test]
    fn repeated_pairs_keep_their_first_rank() {
        let merges = BpePairVocab::from_pairs(vec![("a", "b"), ("c", "d"), ("a", "b"), ("e", "f")]);

        assert_eq!(merges.len(), 3);
        assert_eq!(rank(&merges, "a", "b"), Some(0));
        assert_eq!(rank(&merges, "e", "f"), Some(2));
    }

    #[test]
    fn malformed_lines_are_rejected() {
        let err = BpePairVocab::from_str("a b\nc d e\n").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Unable to parse the vocabulary: Line 2 of the merges is not a pair: \"c d e\""
        );
    }

    #[test]
    fn missing_merges_file() {
        let dir = tempfile::tempdir().unwrap();

        let err = BpePairVocab::from_file(dir.path().join("merges.txt"))
            .unwrap_err();

        assert!(err.is_configuration_error());
    }
}
