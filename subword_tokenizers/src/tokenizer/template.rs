use crate::{
    error::TokenizerError,
    tokenizer::base_tokenizer::{
        Mask, TokenIdsWithOffsets, TokenIdsWithSpecialTokens,
    },
    vocab::{SpecialTokenRole, Vocab},
};
use std::iter;

/// A slot of a template: either a special token or one of the input
/// sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    Special(SpecialTokenRole),
    First,
    Second,
}

const CLS: Piece = Piece::Special(SpecialTokenRole::Cls);
const SEP: Piece = Piece::Special(SpecialTokenRole::Sep);
const BOS: Piece = Piece::Special(SpecialTokenRole::Bos);
const EOS: Piece = Piece::Special(SpecialTokenRole::Eos);

// (slot, token type id)
const CLS_SEP_SINGLE: &[(Piece, i8)] = &[(CLS, 0), (Piece::First, 0), (SEP, 0)];
const CLS_SEP_PAIR: &[(Piece, i8)] = &[
    (CLS, 0),
    (Piece::First, 0),
    (SEP, 0),
    (Piece::Second, 1),
    (SEP, 1),
];
const BOS_SINGLE: &[(Piece, i8)] = &[(BOS, 0), (Piece::First, 0)];
const BOS_PAIR: &[(Piece, i8)] =
    &[(BOS, 0), (Piece::First, 0), (BOS, 1), (Piece::Second, 1)];
const BOS_EOS_SINGLE: &[(Piece, i8)] = &[(BOS, 0), (Piece::First, 0), (EOS, 0)];
const PLAIN_SINGLE: &[(Piece, i8)] = &[(Piece::First, 0)];
const PLAIN_PAIR: &[(Piece, i8)] = &[(Piece::First, 0), (Piece::Second, 1)];

/// # Special token layout
///
/// How a tokenizer family wraps one or two encoded sequences with special
/// tokens:
///
/// | variant  | single            | pair                    |
/// |----------|-------------------|-------------------------|
/// | `ClsSep` | `[CLS] A [SEP]`   | `[CLS] A [SEP] B [SEP]` |
/// | `Bos`    | `<bos> A`         | `<bos> A <bos> B`       |
/// | `BosEos` | `<bos> A <eos>`   | not supported           |
/// | `Plain`  | `A`               | `A B`                   |
///
/// Token type ids are 0 for everything belonging to the first sequence and
/// 1 for the second sequence and its trailing special token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialTokenTemplate {
    ClsSep,
    Bos,
    BosEos,
    Plain,
}

impl SpecialTokenTemplate {
    fn layout(
        self,
        pair: bool,
    ) -> Result<&'static [(Piece, i8)], TokenizerError> {
        let layout = match (self, pair) {
            (SpecialTokenTemplate::ClsSep, false) => CLS_SEP_SINGLE,
            (SpecialTokenTemplate::ClsSep, true) => CLS_SEP_PAIR,
            (SpecialTokenTemplate::Bos, false) => BOS_SINGLE,
            (SpecialTokenTemplate::Bos, true) => BOS_PAIR,
            (SpecialTokenTemplate::BosEos, false) => BOS_EOS_SINGLE,
            (SpecialTokenTemplate::BosEos, true) => {
                return Err(TokenizerError::EncodingError(format!(
                    "The {:?} layout does not support sequence pairs",
                    self
                )))
            },
            (SpecialTokenTemplate::Plain, false) => PLAIN_SINGLE,
            (SpecialTokenTemplate::Plain, true) => PLAIN_PAIR,
        };
        Ok(layout)
    }

    /// The number of special tokens wrapped around a single sequence or a
    /// pair.
    pub fn num_special_tokens(
        self,
        pair: bool,
    ) -> Result<usize, TokenizerError> {
        let layout = self.layout(pair)?;
        Ok(layout
            .iter()
            .filter(|(piece, _)| matches!(piece, Piece::Special(_)))
            .count())
    }

    /// Ids of the special tokens the layout inserts, for single sequences
    /// and pairs alike.
    pub fn special_token_ids(self, vocab: &impl Vocab) -> Vec<i64> {
        let mut ids: Vec<i64> = [false, true]
            .iter()
            .filter_map(|pair| self.layout(*pair).ok())
            .flatten()
            .filter_map(|(piece, _)| match piece {
                Piece::Special(role) => vocab.token_id_for(*role),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Checks that every role used by the layout is registered in the
    /// vocabulary.
    pub fn validate(self, vocab: &impl Vocab) -> Result<(), TokenizerError> {
        let layout = self.layout(false)?;
        for (piece, _) in layout {
            if let Piece::Special(role) = piece {
                if vocab.token_id_for(*role).is_none() {
                    return Err(TokenizerError::ConfigurationError(format!(
                        "The {:?} layout needs a {:?} token but none is registered",
                        self, role
                    )));
                }
            }
        }
        Ok(())
    }

    /// Concatenates the sequences with the special tokens of the layout.
    /// Special positions carry `Mask::Special`, no offset and a special
    /// token mask of 1.
    pub fn build(
        self,
        vocab: &impl Vocab,
        first: TokenIdsWithOffsets,
        second: Option<TokenIdsWithOffsets>,
    ) -> Result<TokenIdsWithSpecialTokens, TokenizerError> {
        let layout = self.layout(second.is_some())?;
        let capacity = first.len()
            + second.as_ref().map_or(0, TokenIdsWithOffsets::len)
            + layout.len();
        let mut output = TokenIdsWithSpecialTokens::with_capacity(capacity);
        let mut sequences = [Some(first), second];

        for (piece, type_id) in layout {
            let slot = match piece {
                Piece::Special(role) => {
                    let id = vocab.token_id_for(*role).ok_or_else(|| {
                        TokenizerError::EncodingError(format!(
                            "No {:?} token is registered",
                            role
                        ))
                    })?;
                    output.token_ids.push(id);
                    output.segment_ids.push(*type_id);
                    output.special_tokens_mask.push(1);
                    output.token_offsets.push(None);
                    output.reference_offsets.push(Vec::new());
                    output.mask.push(Mask::Special);
                    continue;
                },
                Piece::First => 0,
                Piece::Second => 1,
            };

            if let Some(sequence) = sequences[slot].take() {
                let len = sequence.ids.len();
                output.token_ids.extend(sequence.ids);
                output.segment_ids.extend(iter::repeat(*type_id).take(len));
                output.special_tokens_mask.extend(iter::repeat(0).take(len));
                output
                    .token_offsets
                    .extend(aligned(sequence.offsets, len, None));
                output.reference_offsets.extend(aligned(
                    sequence.reference_offsets,
                    len,
                    Vec::new(),
                ));
                output.mask.extend(aligned(sequence.masks, len, Mask::None));
            }
        }

        Ok(output)
    }
}

/// Pads or cuts `values` to exactly `len` items.
fn aligned<X: Clone>(
    values: Vec<X>,
    len: usize,
    filler: X,
) -> impl Iterator<Item = X> {
    values.into_iter().chain(iter::repeat(filler)).take(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        tokenizer::base_tokenizer::Offset,
        vocab::{base_vocab::tests::vocab_from, BaseVocab, SpecialTokenMap},
    };
    use pretty_assertions::assert_eq;

    fn sequence(ids: &[i64]) -> TokenIdsWithOffsets {
        TokenIdsWithOffsets {
            ids: ids.to_vec(),
            offsets: ids
                .iter()
                .map(|i| Some(Offset::new(*i as u32, *i as u32 + 1)))
                .collect(),
            reference_offsets: ids.iter().map(|i| vec![*i as u32]).collect(),
            masks: vec![Mask::None; ids.len()],
        }
    }

    fn bert_vocab() -> BaseVocab {
        vocab_from(&["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]"], "[UNK]")
    }

    fn gpt_vocab() -> BaseVocab {
        let values = [("<s>", 0), ("</s>", 1), ("<unk>", 2)]
            .iter()
            .map(|(t, i)| (t.to_string(), *i as i64))
            .collect();
        let map = SpecialTokenMap {
            unk_token: "<unk>".into(),
            bos_token: Some("<s>".into()),
            eos_token: Some("</s>".into()),
            pad_token: None,
            sep_token: None,
            cls_token: None,
            mask_token: None,
            additional_special_tokens: Default::default(),
        };
        BaseVocab::from_values(values, map).unwrap()
    }

    #[test]
    fn cls_sep_pair() {
        let vocab = bert_vocab();

        let output = SpecialTokenTemplate::ClsSep
            .build(&vocab, sequence(&[10, 11]), Some(sequence(&[20])))
            .unwrap();

        assert_eq!(output.token_ids, vec![2, 10, 11, 3, 20, 3]);
        assert_eq!(output.segment_ids, vec![0, 0, 0, 0, 1, 1]);
        assert_eq!(output.special_tokens_mask, vec![1, 0, 0, 1, 0, 1]);
        assert_eq!(
            output.token_offsets,
            vec![
                None,
                Some(Offset::new(10, 11)),
                Some(Offset::new(11, 12)),
                None,
                Some(Offset::new(20, 21)),
                None
            ]
        );
        assert_eq!(output.mask[0], Mask::Special);
        assert!(output.reference_offsets[3].is_empty());
    }

    #[test]
    fn layouts() {
        let vocab = gpt_vocab();
        let test_tuples = [
            (SpecialTokenTemplate::Bos, false, vec![0, 7, 8]),
            (SpecialTokenTemplate::Bos, true, vec![0, 7, 8, 0, 9]),
            (SpecialTokenTemplate::BosEos, false, vec![0, 7, 8, 1]),
            (SpecialTokenTemplate::Plain, false, vec![7, 8]),
            (SpecialTokenTemplate::Plain, true, vec![7, 8, 9]),
        ];

        for (template, pair, expected) in test_tuples {
            let second = if pair { Some(sequence(&[9])) } else { None };
            let output =
                template.build(&vocab, sequence(&[7, 8]), second).unwrap();
            assert_eq!(output.token_ids, expected, "{:?}", template);
            assert_eq!(output.segment_ids.len(), expected.len());
            assert_eq!(
                output.special_tokens_mask.iter().filter(|m| **m == 1).count(),
                template.num_special_tokens(pair).unwrap()
            );
        }
    }

    #[test]
    fn inserted_special_token_ids() {
        let test_tuples = [
            (SpecialTokenTemplate::ClsSep, bert_vocab(), vec![2, 3]),
            (SpecialTokenTemplate::Bos, gpt_vocab(), vec![0]),
            (SpecialTokenTemplate::BosEos, gpt_vocab(), vec![0, 1]),
            (SpecialTokenTemplate::Plain, gpt_vocab(), vec![]),
        ];

        for (template, vocab, expected) in test_tuples {
            assert_eq!(template.special_token_ids(&vocab), expected);
        }
    }

    #[test]
    fn bos_eos_rejects_pairs() {
        let vocab = gpt_vocab();

        let err = SpecialTokenTemplate::BosEos
            .build(&vocab, sequence(&[7]), Some(sequence(&[8])))
            .unwrap_err();

        assert!(matches!(err, TokenizerError::EncodingError(_)));
        assert!(SpecialTokenTemplate::BosEos.num_special_tokens(true).is_err());
    }

    #[test]
    fn validation_requires_registered_roles() {
        assert!(SpecialTokenTemplate::ClsSep.validate(&bert_vocab()).is_ok());
        assert!(SpecialTokenTemplate::BosEos.validate(&gpt_vocab()).is_ok());

        let err = SpecialTokenTemplate::ClsSep
            .validate(&gpt_vocab())
            .unwrap_err();

        assert!(err.is_configuration_error());
    }

    #[test]
    fn missing_offsets_are_filled_in() {
        let vocab = bert_vocab();
        let bare = TokenIdsWithOffsets {
            ids: vec![10, 11],
            ..Default::default()
        };

        let output =
            SpecialTokenTemplate::ClsSep.build(&vocab, bare, None).unwrap();

        assert_eq!(output.token_offsets, vec![None; 4]);
        assert_eq!(output.mask.len(), 4);
        assert_eq!(output.reference_offsets.len(), 4);
    }
}
