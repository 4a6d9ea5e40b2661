//! Subword tokenizers turning raw text into the ids, masks and offsets
//! transformer models expect, and back.
//!
//! Two families are provided, both implementing the [`Tokenizer`] trait:
//!
//! - [`BertTokenizer`]: basic segmentation followed by WordPiece matching,
//!   wrapped as `[CLS] A [SEP] B [SEP]`
//! - [`Gpt2Tokenizer`]: GPT-2 pre-tokenization followed by byte-level BPE
//!
//! ```no_run
//! use subword_tokenizers::{
//!     BertTokenizer, BertVocab, EncodingOptions, PaddingStrategy, Tokenizer,
//! };
//!
//! # fn main() -> Result<(), subword_tokenizers::TokenizerError> {
//! let vocab = BertVocab::from_file("path/to/vocab.txt")?;
//! let tokenizer = BertTokenizer::from_existing_vocab(vocab, true, true)?;
//! let options = EncodingOptions {
//!     padding: PaddingStrategy::MaxLength,
//!     max_length: Some(32),
//!     truncation: true,
//!     ..Default::default()
//! };
//!
//! let encoded = tokenizer.encode_plus(("Who was Jim Henson?", "A puppeteer"), &options)?;
//! assert_eq!(encoded.input_ids.len(), 32);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod tokenizer;
pub mod vocab;

pub use crate::{
    config::TokenizerConfig,
    error::TokenizerError,
    tokenizer::{
        BertTokenizer, EncodeInput, EncodedSequence, EncodingOptions,
        Gpt2Tokenizer, Mask, Offset, OffsetSize, PaddingStrategy, Side,
        SpecialTokenTemplate, Token, TokenRef, TokenizedInput, Tokenizer,
        TruncationStrategy,
    },
    vocab::{
        BertVocab, BpePairVocab, Gpt2Vocab, SpecialTokenMap, SpecialTokenRole,
        Vocab,
    },
};
