use ragdb_core::config::EmbeddingSettings;
use ragdb_core::traits::Embedder;
use ragdb_embed::tokenize::PAD_ID;
use ragdb_embed::{get_default_embedder, tokenize_batch, FakeEmbedder, MINILM_DIM};

use candle_core::Device;
use std::collections::HashMap;
use tokenizers::models::wordlevel::WordLevel;
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::pre_tokenizers::PreTokenizerWrapper;
use tokenizers::Tokenizer;

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn fake_embedder_shapes_and_determinism() {
    let embedder = FakeEmbedder::new(MINILM_DIM);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    assert_eq!(embs.len(), 2);
    let (v1, v2) = (&embs[0], &embs[1]);

    assert_eq!(v1.len(), 384, "embedding dim is 384");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_ranks_shared_words_higher() {
    let embedder = FakeEmbedder::new(MINILM_DIM);
    let q = embedder.embed_one("how do I fit a linear model").unwrap();
    let near = embedder.embed_one("fit a linear model with lm()").unwrap();
    let far = embedder.embed_one("plotting colours in ggplot2 themes").unwrap();
    assert!(cosine(&q, &near) > cosine(&q, &far));
}

#[test]
fn empty_text_still_yields_unit_vector() {
    let embedder = FakeEmbedder::new(8);
    let v = embedder.embed_one("").unwrap();
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-6);
}

#[test]
fn settings_flag_selects_fake_embedder() {
    let settings = EmbeddingSettings { use_fake: true, ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    assert_eq!(embedder.model_id(), "fake-xxhash");
    assert_eq!(embedder.dim(), MINILM_DIM);
    assert!(embedder.embed_batch(&[]).unwrap().is_empty());
}

fn word_tokenizer() -> Tokenizer {
    let vocab: HashMap<String, u32> = [("[PAD]", 0), ("[UNK]", 1), ("alpha", 2), ("beta", 3), ("gamma", 4)]
        .into_iter()
        .map(|(w, id)| (w.to_string(), id))
        .collect();
    let model = WordLevel::builder().vocab(vocab).unk_token("[UNK]".to_string()).build().expect("wordlevel");
    let mut tokenizer = Tokenizer::new(model);
    tokenizer.with_pre_tokenizer(PreTokenizerWrapper::from(Whitespace::default()));
    tokenizer
}

#[test]
fn tokenize_batch_pads_to_longest_row() {
    let tokenizer = word_tokenizer();
    let texts = vec!["alpha beta gamma".to_string(), "beta".to_string()];
    let (ids, mask) = tokenize_batch(&tokenizer, &texts, 16, &Device::Cpu).expect("tokenize");

    assert_eq!(ids.dims(), &[2, 3]);
    assert_eq!(mask.dims(), &[2, 3]);
    let ids: Vec<Vec<u32>> = ids.to_vec2().unwrap();
    let mask: Vec<Vec<u32>> = mask.to_vec2().unwrap();
    assert_eq!(ids, vec![vec![2, 3, 4], vec![3, PAD_ID, PAD_ID]]);
    assert_eq!(mask, vec![vec![1, 1, 1], vec![1, 0, 0]]);
}

#[test]
fn tokenize_batch_truncates_to_max_len() {
    let tokenizer = word_tokenizer();
    let texts = vec!["alpha beta gamma".to_string(), "delta".to_string()];
    let (ids, mask) = tokenize_batch(&tokenizer, &texts, 2, &Device::Cpu).expect("tokenize");

    assert_eq!(ids.dims(), &[2, 2]);
    let ids: Vec<Vec<u32>> = ids.to_vec2().unwrap();
    let mask: Vec<Vec<u32>> = mask.to_vec2().unwrap();
    assert_eq!(ids, vec![vec![2, 3], vec![1, PAD_ID]], "unknown words map to [UNK]");
    assert_eq!(mask, vec![vec![1, 1], vec![1, 0]]);
}
