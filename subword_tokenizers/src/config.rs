use crate::{error::TokenizerError, vocab::SpecialTokenMap};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path, str::FromStr};

/// Construction-time settings, as found in a `tokenizer_config.json`.
///
/// Every field is optional in the JSON document. Unknown keys are ignored so
/// that configuration files written for other tools can be read as they
/// are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Lowercase the input. When absent each family picks its own default
    /// (on for WordPiece, off for byte-level BPE).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub do_lower_case: Option<bool>,
    /// Run the basic segmenter (cleaning, casing, punctuation and CJK
    /// splitting) before WordPiece. When off, whitespace-separated words go
    /// straight to WordPiece.
    pub do_basic_tokenize: bool,
    pub tokenize_chinese_chars: bool,
    /// Strip accents. When absent, accents are stripped whenever the text is
    /// lowercased.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip_accents: Option<bool>,
    pub never_split: Vec<String>,
    pub max_word_len: usize,
    pub add_prefix_space: bool,
    pub add_bos_token: bool,
    /// Default `max_length` for callers that do not set one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unk_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pad_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bos_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eos_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sep_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cls_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_token: Option<String>,
    pub additional_special_tokens: Vec<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            do_lower_case: None,
            do_basic_tokenize: true,
            tokenize_chinese_chars: true,
            strip_accents: None,
            never_split: Vec::new(),
            max_word_len: 100,
            add_prefix_space: false,
            add_bos_token: false,
            model_max_length: None,
            unk_token: None,
            pad_token: None,
            bos_token: None,
            eos_token: None,
            sep_token: None,
            cls_token: None,
            mask_token: None,
            additional_special_tokens: Vec::new(),
        }
    }
}

impl TokenizerConfig {
    pub fn from_file<P: AsRef<Path>>(
        path: P,
    ) -> Result<TokenizerConfig, TokenizerError> {
        let path = path.as_ref();
        let f = File::open(path)
            .map_err(|e| TokenizerError::file_not_found(path, e))?;
        let config = serde_json::from_reader(BufReader::new(f))
            .map_err(invalid_config)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded a tokenizer configuration");
        Ok(config)
    }

    pub fn lower_case_or(&self, default: bool) -> bool {
        self.do_lower_case.unwrap_or(default)
    }

    pub fn resolve_strip_accents(&self, lower_case: bool) -> bool {
        self.strip_accents.unwrap_or(lower_case)
    }

    /// Applies the special token overrides of this configuration on top of
    /// a family's default registry.
    pub fn special_token_map(
        &self,
        defaults: SpecialTokenMap,
    ) -> SpecialTokenMap {
        let or = |value: &Option<String>, default: Option<String>| {
            value.clone().or(default)
        };

        SpecialTokenMap {
            unk_token: self.unk_token.clone().unwrap_or(defaults.unk_token),
            pad_token: or(&self.pad_token, defaults.pad_token),
            bos_token: or(&self.bos_token, defaults.bos_token),
            eos_token: or(&self.eos_token, defaults.eos_token),
            sep_token: or(&self.sep_token, defaults.sep_token),
            cls_token: or(&self.cls_token, defaults.cls_token),
            mask_token: or(&self.mask_token, defaults.mask_token),
            additional_special_tokens: defaults
                .additional_special_tokens
                .into_iter()
                .chain(self.additional_special_tokens.iter().cloned())
                .collect(),
        }
    }
}

fn invalid_config(e: serde_json::Error) -> TokenizerError {
    TokenizerError::ConfigurationError(format!(
        "Unable to read the tokenizer configuration: {}",
        e
    ))
}

impl FromStr for TokenizerConfig {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map_err(invalid_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_document_gives_the_defaults() {
        let config: TokenizerConfig = "{}".parse().unwrap();

        assert_eq!(config, TokenizerConfig::default());
        assert!(config.lower_case_or(true));
        assert!(!config.lower_case_or(false));
        assert!(config.do_basic_tokenize);
    }

    #[test]
    fn accent_stripping_follows_lower_casing() {
        let auto: TokenizerConfig = r#"{"do_lower_case": false}"#.parse().unwrap();
        let explicit: TokenizerConfig =
            r#"{"do_lower_case": true, "strip_accents": false}"#.parse().unwrap();

        assert!(!auto.resolve_strip_accents(auto.lower_case_or(true)));
        assert!(auto.resolve_strip_accents(true));
        assert!(!explicit.resolve_strip_accents(explicit.lower_case_or(true)));
    }

    #[test]
    fn special_token_overrides() {
        let config: TokenizerConfig = r#"{
            "unk_token": "<unk>",
            "pad_token": "<pad>",
            "additional_special_tokens": ["<extra>"],
            "model_max_length": 512,
            "tokenizer_class": "SomethingElse"
        }"#
        .parse()
        .unwrap();

        let map = config.special_token_map(SpecialTokenMap::gpt2());

        assert_eq!(map.unk_token, "<unk>");
        assert_eq!(map.pad_token.as_deref(), Some("<pad>"));
        assert_eq!(map.bos_token.as_deref(), Some("<|endoftext|>"));
        assert!(map.additional_special_tokens.contains("<extra>"));
        assert_eq!(config.model_max_length, Some(512));
    }

    #[test]
    fn malformed_documents_are_configuration_errors() {
        let err = r#"{"max_word_len": "many"}"#
            .parse::<TokenizerConfig>()
            .unwrap_err();

        assert!(err.is_configuration_error());
    }

    #[test]
    fn read_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"never_split": ["[KEEP]"], "max_word_len": 8}}"#)
            .unwrap();

        let config = TokenizerConfig::from_file(file.path()).unwrap();

        assert_eq!(config.never_split, vec!["[KEEP]"]);
        assert_eq!(config.max_word_len, 8);
    }
}
