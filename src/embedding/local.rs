//! Local ONNX Runtime embedding provider.
//!
//! Runs all-MiniLM-L6-v2 through `ort`: tokenize, infer, mean-pool over the
//! attention mask, then L2-normalize.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use super::{EmbeddingProvider, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;

/// all-MiniLM-L6-v2 was trained on sequences of at most 256 tokens.
const MAX_SEQ_LEN: usize = 256;

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// ONNX-backed provider. Loading is expensive; build one per command and reuse it.
pub struct LocalEmbeddingProvider {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

// Safety: Tokenizer is Send+Sync and the Session is only touched under the Mutex.
unsafe impl Send for LocalEmbeddingProvider {}
unsafe impl Sync for LocalEmbeddingProvider {}

/// Token ids and masks for one padded batch, flattened row-major.
struct EncodedBatch {
    rows: usize,
    seq_len: usize,
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
}

/// Paths of the two files a local model needs.
pub fn model_files(cache_dir: &Path) -> (PathBuf, PathBuf) {
    (cache_dir.join(MODEL_FILE), cache_dir.join(TOKENIZER_FILE))
}

impl LocalEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let cache_dir = crate::config::expand_tilde(&config.cache_dir);
        let (model_path, tokenizer_path) = model_files(&cache_dir);

        for path in [&model_path, &tokenizer_path] {
            anyhow::ensure!(
                path.exists(),
                "{} not found. Run `episodic model download` first.",
                path.display()
            );
        }

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&model_path)
            .with_context(|| format!("failed to load ONNX model {}", model_path.display()))?;

        let tokenizer = load_tokenizer(&tokenizer_path)?;

        tracing::info!(model = %config.model, path = %cache_dir.display(), "embedding model loaded");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn encode(&self, texts: &[&str]) -> Result<EncodedBatch> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow!("tokenization failed: {e}"))?;

        let rows = encodings.len();
        let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());
        let mut input_ids = Vec::with_capacity(rows * seq_len);
        let mut attention_mask = Vec::with_capacity(rows * seq_len);
        for encoding in &encodings {
            input_ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
        }

        Ok(EncodedBatch {
            rows,
            seq_len,
            input_ids,
            attention_mask,
        })
    }
}

fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    let mut tokenizer =
        Tokenizer::from_file(path).map_err(|e| anyhow!("failed to load tokenizer: {e}"))?;
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: MAX_SEQ_LEN,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("failed to set truncation: {e}"))?;
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        ..Default::default()
    }));
    Ok(tokenizer)
}

impl EmbeddingProvider for LocalEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("model returned no embedding"))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch = self.encode(texts)?;
        let shape = vec![batch.rows as i64, batch.seq_len as i64];
        let input_ids = Tensor::from_array((shape.clone(), batch.input_ids.into_boxed_slice()))?;
        let attention_mask =
            Tensor::from_array((shape.clone(), batch.attention_mask.clone().into_boxed_slice()))?;
        // single-segment input
        let token_type_ids = Tensor::from_array((
            shape,
            vec![0i64; batch.rows * batch.seq_len].into_boxed_slice(),
        ))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("session lock poisoned: {e}"))?;

        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
            "token_type_ids" => token_type_ids,
        })?;

        // Output name varies by export; fall back to the first output.
        let hidden = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);

        let (dims, data) = hidden
            .try_extract_tensor::<f32>()
            .context("failed to extract token embeddings")?;
        let dims: &[i64] = &dims;
        anyhow::ensure!(
            dims.len() == 3
                && dims[1] as usize == batch.seq_len
                && dims[2] == EMBEDDING_DIM as i64,
            "unexpected token embedding shape {dims:?}, expected [batch, {}, {EMBEDDING_DIM}]",
            batch.seq_len
        );

        let out_seq = batch.seq_len;
        Ok((0..batch.rows)
            .map(|row| {
                let mask = &batch.attention_mask[row * batch.seq_len..][..out_seq];
                let tokens = &data[row * out_seq * EMBEDDING_DIM..][..out_seq * EMBEDDING_DIM];
                l2_normalize(&mean_pool(tokens, mask, EMBEDDING_DIM))
            })
            .collect())
    }
}

/// Average the token vectors whose attention mask is set.
fn mean_pool(tokens: &[f32], mask: &[i64], dim: usize) -> Vec<f32> {
    let mut sum = vec![0.0f32; dim];
    let mut count = 0usize;
    for (token, _) in tokens.chunks_exact(dim).zip(mask).filter(|(_, m)| **m > 0) {
        for (acc, x) in sum.iter_mut().zip(token) {
            *acc += x;
        }
        count += 1;
    }
    if count > 0 {
        sum.iter_mut().for_each(|x| *x /= count as f32);
    }
    sum
}

/// L2-normalize a vector. A zero vector is returned unchanged.
fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}
