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
    vocab::special_token_map::{SpecialTokenMap, SpecialTokenRole},
};
use std::{collections::HashMap, hash::Hash};

pub(crate) fn swap_key_values<T: Clone, U: Hash + Eq + Copy>(
    input_hashmap: &HashMap<T, U>,
) -> HashMap<U, T> {
    input_hashmap
        .iter()
        .map(|(key, &value)| (value, key.clone()))
        .collect()
}

/// # Base vocabulary
///
/// Bidirectional token <-> id mapping shared by all vocabularies, together
/// with the special token registry and the ids it resolves to.
#[derive(Debug, Clone)]
pub struct BaseVocab {
    values: HashMap<String, i64>,
    indices: HashMap<i64, String>,
    special_token_map: SpecialTokenMap,
    special_values: HashMap<String, i64>,
    special_indices: HashMap<i64, String>,
    unknown_id: i64,
}

impl BaseVocab {
    /// Builds a vocabulary from a token to id mapping.
    ///
    /// Fails if an id is negative, if two tokens share an id or if a token
    /// of the special token map is missing from `values`.
    pub fn from_values(
        values: HashMap<String, i64>,
        special_token_map: SpecialTokenMap,
    ) -> Result<BaseVocab, TokenizerError> {
        if let Some((token, id)) = values.iter().find(|(_, id)| **id < 0) {
            return Err(TokenizerError::VocabularyParsingError(format!(
                "The token \"{}\" has the negative id {}",
                token, id
            )));
        }
        let indices = swap_key_values(&values);
        if indices.len() != values.len() {
            return Err(TokenizerError::VocabularyParsingError(format!(
                "{} tokens share an id with another token",
                values.len() - indices.len()
            )));
        }
        if let Some(max_id) = indices.keys().max() {
            if *max_id as usize + 1 != indices.len() {
                tracing::warn!(
                    tokens = indices.len(),
                    max_id,
                    "The vocabulary ids are not contiguous"
                );
            }
        }

        let special_values =
            special_token_map.register_special_values(&values)?;
        let special_indices = swap_key_values(&special_values);
        let unknown_id = special_values
            .get(&special_token_map.unk_token)
            .copied()
            .ok_or_else(|| {
                TokenizerError::TokenNotFound(
                    special_token_map.unk_token.clone(),
                )
            })?;

        Ok(BaseVocab {
            values,
            indices,
            special_token_map,
            special_values,
            special_indices,
            unknown_id,
        })
    }
}

/// # Base Vocab trait
/// Defines a common interface to the vocabularies for use in the tokenizers.
pub trait Vocab {
    fn base(&self) -> &BaseVocab;

    fn base_mut(&mut self) -> &mut BaseVocab;

    /// Return the map of token strings to IDs
    fn values(&self) -> &HashMap<String, i64> {
        &self.base().values
    }

    /// Return the map of token IDs to strings
    fn indices(&self) -> &HashMap<i64, String> {
        &self.base().indices
    }

    /// Return the map of special token strings to IDs
    fn special_values(&self) -> &HashMap<String, i64> {
        &self.base().special_values
    }

    /// Return the map of token IDs to strings for special values
    fn special_indices(&self) -> &HashMap<i64, String> {
        &self.base().special_indices
    }

    fn special_token_map(&self) -> &SpecialTokenMap {
        &self.base().special_token_map
    }

    fn get_unknown_value(&self) -> &str {
        &self.base().special_token_map.unk_token
    }

    fn len(&self) -> usize {
        self.base().values.len()
    }

    fn is_empty(&self) -> bool {
        self.base().values.is_empty()
    }

    /// Converts a token to an id. Tokens missing from the vocabulary map to
    /// the unknown token id.
    fn token_to_id(&self, token: &str) -> i64 {
        let base = self.base();
        match base.special_values.get(token) {
            Some(index) => *index,
            None => match base.values.get(token) {
                Some(index) => *index,
                None => {
                    tracing::trace!(token, "Out of vocabulary");
                    base.unknown_id
                },
            },
        }
    }

    /// Converts an id back to its token.
    fn id_to_token(&self, id: i64) -> Result<&str, TokenizerError> {
        let base = self.base();
        base.special_indices
            .get(&id)
            .or_else(|| base.indices.get(&id))
            .map(|s| s.as_str())
            .ok_or(TokenizerError::IndexOutOfRange {
                id,
                vocab_size: base.values.len(),
            })
    }

    /// The id of the token registered for `role`, if any.
    fn token_id_for(&self, role: SpecialTokenRole) -> Option<i64> {
        let base = self.base();
        base.special_token_map
            .token(role)
            .and_then(|token| base.special_values.get(token))
            .copied()
    }

    /// Appends the tokens that are not part of the vocabulary yet, in order,
    /// and returns how many were added.
    fn add_tokens(&mut self, tokens: &[&str]) -> usize {
        let base = self.base_mut();
        let mut next_id = base.indices.keys().max().map_or(0, |id| id + 1);
        let mut added = 0;
        for token in tokens {
            if base.values.contains_key(*token) {
                continue;
            }
            base.values.insert(token.to_string(), next_id);
            base.indices.insert(next_id, token.to_string());
            next_id += 1;
            added += 1;
        }
        added
    }

    /// Like `add_tokens`, and additionally registers every token as a
    /// special token so that it is never split.
    fn add_special_tokens(&mut self, tokens: &[&str]) -> usize {
        let added = self.add_tokens(tokens);
        let base = self.base_mut();
        for token in tokens {
            let id = match base.values.get(*token) {
                Some(id) => *id,
                None => continue,
            };
            base.special_values.insert(token.to_string(), id);
            base.special_indices.insert(id, token.to_string());
            if !base.special_token_map.iter().any(|t| t == *token) {
                base.special_token_map
                    .additional_special_tokens
                    .insert(token.to_string());
            }
        }
        added
    }
}

impl Vocab for BaseVocab {
    fn base(&self) -> &BaseVocab {
        self
    }

    fn base_mut(&mut self) -> &mut BaseVocab {
        self
    }
}
