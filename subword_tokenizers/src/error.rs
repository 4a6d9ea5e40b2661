// Copyright 2019-2020 Guillaume Becquin
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{io, path::PathBuf};

/// Errors raised while loading resources, encoding text or decoding ids.
#[derive(Debug, thiserror::Error)]
pub enum TokenizerError {
    #[error("Unable to read \"{}\"", .path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unable to parse the vocabulary: {0}")]
    VocabularyParsingError(String),
    /// A registered special token is absent from the vocabulary.
    #[error("The special token \"{0}\" was not found in the vocabulary")]
    TokenNotFound(String),
    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),
    #[error("Unable to encode the input: {0}")]
    EncodingError(String),
    #[error("Token id {id} is not part of a vocabulary of {vocab_size} tokens")]
    IndexOutOfRange { id: i64, vocab_size: usize },
}

impl TokenizerError {
    pub(crate) fn file_not_found(
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        TokenizerError::FileNotFound {
            path: path.into(),
            source,
        }
    }

    /// Was this error raised while constructing a tokenizer (as opposed to
    /// while encoding or decoding)?
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            TokenizerError::FileNotFound { .. }
                | TokenizerError::VocabularyParsingError(_)
                | TokenizerError::TokenNotFound(_)
                | TokenizerError::ConfigurationError(_)
        )
    }
}

impl From<serde_json::Error> for TokenizerError {
    fn from(e: serde_json::Error) -> Self {
        TokenizerError::VocabularyParsingError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_grouped() {
        let missing = TokenizerError::file_not_found(
            "vocab.txt",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        let encoding = TokenizerError::EncodingError("too long".into());
        let out_of_range = TokenizerError::IndexOutOfRange {
            id: 42,
            vocab_size: 3,
        };

        assert!(missing.is_configuration_error());
        assert!(TokenizerError::TokenNotFound("[CLS]".into())
            .is_configuration_error());
        assert!(!encoding.is_configuration_error());
        assert!(!out_of_range.is_configuration_error());
    }

    #[test]
    fn messages_name_the_culprit() {
        let err = TokenizerError::IndexOutOfRange {
            id: 42,
            vocab_size: 3,
        };

        assert_eq!(
            err.to_string(),
            "Token id 42 is not part of a vocabulary of 3 tokens"
        );
    }
}
