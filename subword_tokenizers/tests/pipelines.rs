use pretty_assertions::assert_eq;
use std::fs;
use subword_tokenizers::{
    tokenizer::offsets::extract_span, BertTokenizer, BertVocab, BpePairVocab,
    EncodeInput, EncodedSequence, EncodingOptions, Gpt2Tokenizer, Gpt2Vocab,
    PaddingStrategy, Side, SpecialTokenMap, SpecialTokenRole, Tokenizer,
    TokenizerError, TruncationStrategy, Vocab,
};
use tempfile::TempDir;

const BERT_VOCAB: &str = "[PAD]\n[UNK]\n[CLS]\n[SEP]\n[MASK]\nwho\nwas\njim\nhenson\n?\na\npuppet\n##eer\n.\nhe\nmade\nthe\nmuppets\n";

const GPT2_VOCAB: &str = r#"{
    "l": 0, "o": 1, "w": 2, "e": 3, "r": 4, "s": 5, "t": 6, "i": 7,
    "d": 8, "n": 9, "Ġ": 10, "Ġl": 11, "Ġn": 12, "Ġlo": 13, "Ġlow": 14,
    "er": 15, "Ġlowest": 16, "Ġnewer": 17, "Ġwider": 18, "<unk>": 19,
    "<|endoftext|>": 20, "<pad>": 21
}"#;

const GPT2_MERGES: &str = "#version: 0.2\nĠ l\nĠl o\nĠlo w\ne r\n\n";

fn model_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("vocab.txt"), BERT_VOCAB).unwrap();
    fs::write(dir.path().join("vocab.json"), GPT2_VOCAB).unwrap();
    fs::write(dir.path().join("merges.txt"), GPT2_MERGES).unwrap();
    dir
}

fn bert_tokenizer(dir: &TempDir) -> BertTokenizer {
    let vocab = BertVocab::from_file(dir.path().join("vocab.txt")).unwrap();
    BertTokenizer::from_existing_vocab(vocab, true, true).unwrap()
}

fn gpt2_tokenizer(dir: &TempDir) -> Gpt2Tokenizer {
    let map = SpecialTokenMap {
        unk_token: "<unk>".to_string(),
        pad_token: Some("<pad>".to_string()),
        ..SpecialTokenMap::gpt2()
    };
    let vocab = Gpt2Vocab::from_file_with_special_token_mapping(
        dir.path().join("vocab.json"),
        map,
    )
    .unwrap();
    let merges = BpePairVocab::from_file(dir.path().join("merges.txt")).unwrap();
    Gpt2Tokenizer::from_existing_vocab_and_merges(vocab, merges, false)
        .unwrap()
        .with_add_prefix_space(true)
}

fn assert_aligned(encoded: &EncodedSequence) {
    let len = encoded.input_ids.len();
    if let Some(type_ids) = &encoded.token_type_ids {
        assert_eq!(type_ids.len(), len);
    }
    if let Some(attention_mask) = &encoded.attention_mask {
        assert_eq!(attention_mask.len(), len);
    }
    if let Some(special) = &encoded.special_tokens_mask {
        assert_eq!(special.len(), len);
    }
    if let Some(offsets) = &encoded.offset_mapping {
        assert_eq!(offsets.len(), len);
    }
}

fn all_outputs() -> EncodingOptions {
    EncodingOptions {
        return_offsets_mapping: true,
        return_special_tokens_mask: true,
        ..Default::default()
    }
}

#[test]
fn bpe_fixture_from_disk() {
    let dir = model_dir();
    let tokenizer = gpt2_tokenizer(&dir);

    let tokens = tokenizer.tokenize("lower newer");
    let ids = tokenizer.convert_tokens_to_ids(&tokens);

    assert_eq!(tokens, vec!["Ġlow", "er", "Ġ", "n", "e", "w", "er"]);
    assert_eq!(ids, vec![14, 15, 10, 9, 3, 2, 15]);
    assert_eq!(tokenizer.convert_tokens_to_ids(["<unk>"]), vec![19]);
    assert_eq!(tokenizer.vocab().token_to_id("never seen"), 19);
}

#[test]
fn bpe_decoding_is_exact() {
    let dir = model_dir();
    let tokenizer = gpt2_tokenizer(&dir).with_add_prefix_space(false);
    let text = "newer lower";

    let encoded = tokenizer
        .encode_plus(text, &EncodingOptions::default())
        .unwrap();

    assert_eq!(tokenizer.decode(&encoded.input_ids, true, false).unwrap(), text);
}

#[test]
fn bert_pair_from_disk() {
    let dir = model_dir();
    let tokenizer = bert_tokenizer(&dir);
    let question = "Who was Jim Henson?";
    let context = "Jim Henson was a puppeteer.";

    let encoded = tokenizer
        .encode_plus((question, context), &all_outputs())
        .unwrap();

    assert_eq!(
        encoded.input_ids,
        vec![2, 5, 6, 7, 8, 9, 3, 7, 8, 6, 10, 11, 12, 13, 3]
    );
    assert_eq!(
        encoded.token_type_ids,
        Some(vec![0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1])
    );
    assert_eq!(encoded.input_ids.first(), Some(&2));
    assert_eq!(encoded.input_ids.last(), Some(&3));
    assert_aligned(&encoded);

    let offsets = encoded.offset_mapping.unwrap();
    assert_eq!(offsets[11], (17, 23));
    assert_eq!(offsets[12], (23, 26));
}

#[test]
fn special_positions_have_empty_offsets() {
    let dir = model_dir();
    let tokenizer = bert_tokenizer(&dir);
    let options = EncodingOptions {
        padding: PaddingStrategy::MaxLength,
        max_length: Some(12),
        ..all_outputs()
    };

    let encoded = tokenizer
        .encode_plus(("who was jim henson?", "a puppet"), &options)
        .unwrap();

    let special = encoded.special_tokens_mask.unwrap();
    let offsets = encoded.offset_mapping.unwrap();
    for (is_special, offset) in special.iter().zip(&offsets) {
        assert_eq!(*is_special == 1, *offset == (0, 0));
    }
}

#[test]
fn pad_to_max_length() {
    let dir = model_dir();
    let tokenizer = bert_tokenizer(&dir);
    let options = EncodingOptions {
        padding: PaddingStrategy::MaxLength,
        max_length: Some(30),
        truncation: true,
        ..Default::default()
    };

    let encoded = tokenizer.encode_plus("Who was Jim Henson?", &options).unwrap();

    assert_eq!(encoded.input_ids.len(), 30);
    assert!(encoded.input_ids.contains(&0));
    assert!(encoded.attention_mask.as_ref().unwrap().contains(&0));
    assert_eq!(&encoded.input_ids[..7], &[2, 5, 6, 7, 8, 9, 3]);
    assert_aligned(&encoded);
}

#[test]
fn sequences_over_the_limit_are_not_padded() {
    let dir = model_dir();
    let tokenizer = bert_tokenizer(&dir);
    let options = EncodingOptions {
        padding: PaddingStrategy::MaxLength,
        max_length: Some(8),
        ..Default::default()
    };
    let inputs: [EncodeInput; 2] = [
        "jim".into(),
        "who was jim henson? jim henson was a puppeteer.".into(),
    ];

    let encoded = tokenizer.encode_batch(&inputs, &options).unwrap();

    assert_eq!(encoded[0].input_ids, vec![2, 7, 3, 0, 0, 0, 0, 0]);
    assert_eq!(encoded[1].len(), 14);
    assert!(!encoded[1].input_ids.contains(&0));
    assert_eq!(encoded[1].num_truncated_tokens, 0);
}

#[test]
fn pad_to_the_longest_in_the_batch() {
    let dir = model_dir();
    let tokenizer = bert_tokenizer(&dir);
    let options = EncodingOptions {
        padding: PaddingStrategy::Longest,
        padding_side: Side::Left,
        ..all_outputs()
    };
    let inputs: [EncodeInput; 3] = [
        "he made the muppets.".into(),
        "jim".into(),
        "who was jim henson?".into(),
    ];

    let encoded = tokenizer.encode_batch(&inputs, &options).unwrap();

    let longest = &encoded[2];
    assert!(!longest.input_ids.contains(&0));
    assert_eq!(encoded[1].input_ids, vec![0, 0, 0, 0, 2, 7, 3]);
    assert_eq!(encoded[1].attention_mask, Some(vec![0, 0, 0, 0, 1, 1, 1]));
    assert_eq!(encoded[1].offset_mapping.as_ref().unwrap()[5], (0, 3));
    for sequence in &encoded {
        assert_eq!(sequence.len(), longest.len());
        assert_aligned(sequence);
    }
}

#[test]
fn pad_to_a_multiple() {
    let dir = model_dir();
    let tokenizer = gpt2_tokenizer(&dir);
    let options = EncodingOptions {
        padding: PaddingStrategy::Longest,
        pad_to_multiple_of: Some(4),
        ..Default::default()
    };

    let encoded = tokenizer.encode_plus("lower newer", &options).unwrap();

    assert_eq!(encoded.input_ids, vec![14, 15, 10, 9, 3, 2, 15, 21]);
    assert_eq!(encoded.token_type_ids, Some(vec![0; 8]));
}

#[test]
fn truncation_reports_the_overflow() {
    let dir = model_dir();
    let tokenizer = bert_tokenizer(&dir);
    let options = EncodingOptions {
        max_length: Some(6),
        truncation: true,
        stride: 1,
        ..Default::default()
    };

    let encoded = tokenizer.encode_plus("Who was Jim Henson?", &options).unwrap();

    assert_eq!(encoded.input_ids, vec![2, 5, 6, 7, 8, 3]);
    assert_eq!(encoded.overflowing_tokens, vec![8, 9]);
    assert_eq!(encoded.num_truncated_tokens, 1);
}

#[test]
fn left_truncation_keeps_the_end() {
    let dir = model_dir();
    let tokenizer = bert_tokenizer(&dir);
    let options = EncodingOptions {
        max_length: Some(5),
        truncation: true,
        truncation_side: Side::Left,
        ..Default::default()
    };

    let encoded = tokenizer.encode_plus("Who was Jim Henson?", &options).unwrap();

    assert_eq!(encoded.input_ids, vec![2, 7, 8, 9, 3]);
    assert_eq!(encoded.overflowing_tokens, vec![5, 6]);
}

#[test]
fn only_second_truncation_keeps_the_question() {
    let dir = model_dir();
    let tokenizer = bert_tokenizer(&dir);
    let options = EncodingOptions {
        max_length: Some(10),
        truncation: true,
        truncation_strategy: TruncationStrategy::OnlySecond,
        ..Default::default()
    };

    let encoded = tokenizer
        .encode_plus(("who was jim henson?", "jim henson was a puppeteer."), &options)
        .unwrap();

    assert_eq!(encoded.input_ids, vec![2, 5, 6, 7, 8, 9, 3, 7, 8, 3]);
    assert_eq!(encoded.num_truncated_tokens, 5);
}

#[test]
fn recover_the_answer_span() {
    let dir = model_dir();
    let tokenizer = bert_tokenizer(&dir);
    let context = "Jim Henson was a puppeteer.";

    let tokens = tokenizer.tokenize_with_offsets(context);

    assert_eq!(
        extract_span(context, &tokens.offsets, 3, 5).unwrap(),
        "a puppeteer"
    );
}

#[test]
fn errors_are_typed() {
    let dir = model_dir();
    let bert = bert_tokenizer(&dir);
    let mixed: [EncodeInput; 2] = ["jim".into(), ("jim", "henson").into()];
    let too_short = EncodingOptions {
        max_length: Some(1),
        truncation: true,
        ..Default::default()
    };

    assert!(matches!(
        bert.encode_batch(&mixed, &EncodingOptions::default()),
        Err(TokenizerError::EncodingError(_))
    ));
    assert!(matches!(
        bert.encode_plus("jim", &too_short),
        Err(TokenizerError::EncodingError(_))
    ));
    assert!(matches!(
        bert.decode(&[4000], false, false),
        Err(TokenizerError::IndexOutOfRange { id: 4000, .. })
    ));
    assert!(BertVocab::from_file(dir.path().join("missing.txt"))
        .unwrap_err()
        .is_configuration_error());
    assert_eq!(bert.vocab().token_id_for(SpecialTokenRole::Pad), Some(0));
}

#[test]
fn malformed_utf8_is_replaced() {
    let dir = model_dir();
    let tokenizer = bert_tokenizer(&dir);
    let bytes = b"jim\xFF henson";

    let encoded = tokenizer
        .encode_plus(EncodeInput::from_utf8_lossy(bytes), &EncodingOptions::default())
        .unwrap();

    assert_eq!(encoded.input_ids, vec![2, 7, 8, 3]);
}
