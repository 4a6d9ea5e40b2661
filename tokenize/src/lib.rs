//! Loading tokenizers from a model directory.
//!
//! A model directory holds either a WordPiece vocabulary (`vocab.txt`) or a
//! byte-level BPE vocabulary and its merges (`vocab.json` + `merges.txt`).
//! It may also contain a `tokenizer_config.json` and a
//! `special_tokens_map.json`.

use anyhow::{Context, Error};
use std::{
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
    str::FromStr,
};
use subword_tokenizers::{
    BertTokenizer, BertVocab, BpePairVocab, EncodeInput, EncodedSequence,
    EncodingOptions, Gpt2Tokenizer, Gpt2Vocab, PaddingStrategy,
    SpecialTokenMap, Tokenizer, TokenizerConfig,
};

const WORDPIECE_VOCAB: &str = "vocab.txt";
const BPE_VOCAB: &str = "vocab.json";
const BPE_MERGES: &str = "merges.txt";
const TOKENIZER_CONFIG: &str = "tokenizer_config.json";
const SPECIAL_TOKENS_MAP: &str = "special_tokens_map.json";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Family {
    WordPiece,
    Bpe,
}

impl FromStr for Family {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wordpiece" => Ok(Family::WordPiece),
            "bpe" => Ok(Family::Bpe),
            other => anyhow::bail!(
                "Unknown tokenizer family \"{}\", expected \"wordpiece\" or \"bpe\"",
                other
            ),
        }
    }
}

impl Display for Family {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Family::WordPiece => write!(f, "wordpiece"),
            Family::Bpe => write!(f, "bpe"),
        }
    }
}

/// The files making up a model's tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub family: Family,
    pub vocab: PathBuf,
    pub merges: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub special_tokens_map: Option<PathBuf>,
}

impl ModelFiles {
    /// Finds the tokenizer files in `dir`, guessing the family from the
    /// vocabulary found unless `family` is given.
    pub fn discover(
        dir: &Path,
        family: Option<Family>,
    ) -> Result<ModelFiles, Error> {
        anyhow::ensure!(
            dir.is_dir(),
            "\"{}\" is not a directory",
            dir.display()
        );

        let existing = |name: &str| {
            let path = dir.join(name);
            if path.is_file() {
                Some(path)
            } else {
                None
            }
        };

        let family = match family {
            Some(family) => family,
            None if existing(WORDPIECE_VOCAB).is_some() => Family::WordPiece,
            None if existing(BPE_VOCAB).is_some() => Family::Bpe,
            None => anyhow::bail!(
                "Unable to find a \"{}\" or \"{}\" vocabulary in \"{}\"",
                WORDPIECE_VOCAB,
                BPE_VOCAB,
                dir.display()
            ),
        };

        let (vocab, merges) = match family {
            Family::WordPiece => (existing(WORDPIECE_VOCAB), None),
            Family::Bpe => {
                let merges = existing(BPE_MERGES).with_context(|| {
                    format!(
                        "A BPE tokenizer needs \"{}\" in \"{}\"",
                        BPE_MERGES,
                        dir.display()
                    )
                })?;
                (existing(BPE_VOCAB), Some(merges))
            },
        };
        let vocab = vocab.with_context(|| {
            format!(
                "Unable to find the {} vocabulary in \"{}\"",
                family,
                dir.display()
            )
        })?;

        let files = ModelFiles {
            family,
            vocab,
            merges,
            config: existing(TOKENIZER_CONFIG),
            special_tokens_map: existing(SPECIAL_TOKENS_MAP),
        };
        tracing::debug!(?files, "Resolved the model directory");

        Ok(files)
    }
}

#[derive(Debug)]
pub enum LoadedTokenizer {
    WordPiece(BertTokenizer),
    Bpe(Gpt2Tokenizer),
}

/// A tokenizer along with the configuration it was built from.
#[derive(Debug)]
pub struct Model {
    tokenizer: LoadedTokenizer,
    config: TokenizerConfig,
}

impl Model {
    pub fn from_dir(dir: &Path, family: Option<Family>) -> Result<Model, Error> {
        let files = ModelFiles::discover(dir, family)?;
        Model::load(&files)
    }

    #[tracing::instrument(skip_all, fields(family = %files.family))]
    pub fn load(files: &ModelFiles) -> Result<Model, Error> {
        let config = match &files.config {
            Some(path) => TokenizerConfig::from_file(path)
                .context("Unable to load the tokenizer configuration")?,
            None => TokenizerConfig::default(),
        };

        let defaults = match (&files.special_tokens_map, files.family) {
            (Some(path), _) => SpecialTokenMap::from_file(path)
                .context("Unable to load the special tokens map")?,
            (None, Family::WordPiece) => SpecialTokenMap::bert(),
            (None, Family::Bpe) => SpecialTokenMap::gpt2(),
        };
        let special_token_map = config.special_token_map(defaults);

        let tokenizer = match files.family {
            Family::WordPiece => {
                let vocab = BertVocab::from_file_with_special_token_mapping(
                    &files.vocab,
                    special_token_map,
                )
                .context("Unable to load the WordPiece vocabulary")?;
                LoadedTokenizer::WordPiece(BertTokenizer::from_config(
                    vocab, &config,
                )?)
            },
            Family::Bpe => {
                let vocab = Gpt2Vocab::from_file_with_special_token_mapping(
                    &files.vocab,
                    special_token_map,
                )
                .context("Unable to load the BPE vocabulary")?;
                let merges_path = files
                    .merges
                    .as_ref()
                    .context("No merges file was provided")?;
                let merges = BpePairVocab::from_file(merges_path)
                    .context("Unable to load the BPE merges")?;
                LoadedTokenizer::Bpe(Gpt2Tokenizer::from_config(
                    vocab, merges, &config,
                )?)
            },
        };

        Ok(Model { tokenizer, config })
    }

    pub fn tokenizer(&self) -> &LoadedTokenizer {
        &self.tokenizer
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Fills in the model's maximum length for options that truncate or pad
    /// to a maximum length without setting one.
    pub fn resolve_options(&self, options: &EncodingOptions) -> EncodingOptions {
        let mut options = options.clone();
        let needs_max_length = options.truncation
            || options.padding == PaddingStrategy::MaxLength;
        if needs_max_length && options.max_length.is_none() {
            options.max_length = self.config.model_max_length;
        }
        options
    }

    pub fn encode(
        &self,
        inputs: &[EncodeInput<'_>],
        options: &EncodingOptions,
    ) -> Result<Vec<EncodedSequence>, Error> {
        let options = self.resolve_options(options);
        let encoded = match &self.tokenizer {
            LoadedTokenizer::WordPiece(t) => t.encode_batch(inputs, &options),
            LoadedTokenizer::Bpe(t) => t.encode_batch(inputs, &options),
        };
        encoded.context("Unable to encode the inputs")
    }

    /// Decodes ids, removing the spaces WordPiece tokenization introduces
    /// around punctuation.
    pub fn decode(
        &self,
        ids: &[i64],
        skip_special_tokens: bool,
    ) -> Result<String, Error> {
        let decoded = match &self.tokenizer {
            LoadedTokenizer::WordPiece(t) => {
                t.decode(ids, skip_special_tokens, true)
            },
            LoadedTokenizer::Bpe(t) => t.decode(ids, skip_special_tokens, false),
        };
        decoded.context("Unable to decode the ids")
    }
}
