// Copyright 2021 Guillaume Becquin
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
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeSet, HashMap},
    fs::File,
    io::BufReader,
    path::Path,
};

/// The role a special token plays when assembling model inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialTokenRole {
    Unknown,
    Pad,
    Bos,
    Eos,
    Sep,
    Cls,
    Mask,
}

impl SpecialTokenRole {
    pub const ALL: [SpecialTokenRole; 7] = [
        SpecialTokenRole::Unknown,
        SpecialTokenRole::Pad,
        SpecialTokenRole::Bos,
        SpecialTokenRole::Eos,
        SpecialTokenRole::Sep,
        SpecialTokenRole::Cls,
        SpecialTokenRole::Mask,
    ];
}

/// # Special token registry
///
/// Maps each role to the literal token used by a model. Only the unknown
/// token is mandatory. Every token listed here must be part of the
/// vocabulary it is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokenMap {
    pub unk_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pad_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bos_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eos_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sep_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cls_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask_token: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub additional_special_tokens: BTreeSet<String>,
}

impl SpecialTokenMap {
    /// The registry used by BERT-like vocabularies.
    pub fn bert() -> SpecialTokenMap {
        SpecialTokenMap {
            unk_token: "[UNK]".to_string(),
            pad_token: Some("[PAD]".to_string()),
            bos_token: None,
            eos_token: None,
            sep_token: Some("[SEP]".to_string()),
            cls_token: Some("[CLS]".to_string()),
            mask_token: Some("[MASK]".to_string()),
            additional_special_tokens: BTreeSet::new(),
        }
    }

    /// The registry used by GPT2-like vocabularies, where a single marker
    /// stands for unknown, beginning and end of text.
    pub fn gpt2() -> SpecialTokenMap {
        let end_of_text = "<|endoftext|>".to_string();
        SpecialTokenMap {
            unk_token: end_of_text.clone(),
            pad_token: None,
            bos_token: Some(end_of_text.clone()),
            eos_token: Some(end_of_text),
            sep_token: None,
            cls_token: None,
            mask_token: None,
            additional_special_tokens: BTreeSet::new(),
        }
    }

    /// Reads a JSON special token map, e.g. `special_tokens_map.json`.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
    ) -> Result<SpecialTokenMap, TokenizerError> {
        let path = path.as_ref();
        let f = File::open(path)
            .map_err(|e| TokenizerError::file_not_found(path, e))?;
        let map = serde_json::from_reader(BufReader::new(f))?;
        Ok(map)
    }

    pub fn token(&self, role: SpecialTokenRole) -> Option<&str> {
        match role {
            SpecialTokenRole::Unknown => Some(self.unk_token.as_str()),
            SpecialTokenRole::Pad => self.pad_token.as_deref(),
            SpecialTokenRole::Bos => self.bos_token.as_deref(),
            SpecialTokenRole::Eos => self.eos_token.as_deref(),
            SpecialTokenRole::Sep => self.sep_token.as_deref(),
            SpecialTokenRole::Cls => self.cls_token.as_deref(),
            SpecialTokenRole::Mask => self.mask_token.as_deref(),
        }
    }

    /// All registered tokens, role tokens first. A token shared by several
    /// roles is yielded once per role.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        SpecialTokenRole::ALL
            .iter()
            .filter_map(move |role| self.token(*role))
            .chain(self.additional_special_tokens.iter().map(|s| s.as_str()))
    }

    /// Resolves the id of every registered token, failing on the first one
    /// the vocabulary does not contain.
    pub(crate) fn register_special_values(
        &self,
        values: &HashMap<String, i64>,
    ) -> Result<HashMap<String, i64>, TokenizerError> {
        let mut special_values = HashMap::new();
        for token in self.iter() {
            match values.get(token) {
                Some(id) => {
                    special_values.insert(token.to_string(), *id);
                },
                None => {
                    return Err(TokenizerError::TokenNotFound(
                        token.to_string(),
                    ))
                },
            }
        }
        Ok(special_values)
    }
}
