//! # Embedder
//!
//! Deterministic text → fixed-length vector mapping.
//!
//! The [`Embedder`] trait is the seam between the RAG pipeline and the model
//! numerics: the pipeline only cares that the same text always maps to the same
//! vector of a known dimension. The production implementation is
//! [`BertEmbedder`], which runs **all-MiniLM-L6-v2** locally through Candle
//! (pure Rust, no Python) with attention-mask mean pooling and L2 normalization,
//! producing 384-dimensional sentence embeddings.
//!
//! ## Batch convention
//! [`Embedder::embed_batch`] returns exactly one vector per input string, in
//! input order. [`Embedder::embed`] is the single-text convenience and returns
//! the vector directly. All callers go through these two entry points.

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::{Repo, RepoType, api::sync::Api};
use tokenizers::Tokenizer;

use crate::error::{LoreError, Result};

/// Deterministic function mapping text to fixed-dimension float vectors.
///
/// Same model configuration + same input text ⇒ same vector. A failure on any
/// item fails the whole batch; no partial results are returned.
pub trait Embedder {
    /// Output dimension; every vector this embedder produces has this length.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts. One vector per input, order-preserving.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let mut vectors = self.embed_batch(&texts)?;
        vectors
            .pop()
            .ok_or_else(|| LoreError::Embedding("embedder returned no vector".to_string()))
    }
}

/// Sentence embeddings via Candle's BERT implementation.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimension: usize,
}

impl BertEmbedder {
    /// Load the model from the Hugging Face Hub (cached locally after the
    /// first download).
    pub fn load() -> Result<Self> {
        let device = Device::Cpu;
        let model_id = "sentence-transformers/all-MiniLM-L6-v2";
        let revision = "main";

        let repo = Repo::with_revision(model_id.to_string(), RepoType::Model, revision.to_string());
        let api = Api::new().map_err(|e| LoreError::Embedding(e.to_string()))?;
        let api_repo = api.repo(repo);

        let config_filename = api_repo
            .get("config.json")
            .map_err(|e| LoreError::Embedding(e.to_string()))?;
        let tokenizer_filename = api_repo
            .get("tokenizer.json")
            .map_err(|e| LoreError::Embedding(e.to_string()))?;
        let weights_filename = api_repo
            .get("model.safetensors")
            .map_err(|e| LoreError::Embedding(e.to_string()))?;

        let config = std::fs::read_to_string(config_filename)
            .map_err(|e| LoreError::io(e, "reading model config"))?;
        let config: Config = serde_json::from_str(&config)
            .map_err(|e| LoreError::Embedding(format!("invalid model config: {e}")))?;

        let tokenizer = Tokenizer::from_file(tokenizer_filename)
            .map_err(|e| LoreError::Embedding(format!("failed to load tokenizer: {e}")))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_filename], DTYPE, &device)
                .map_err(|e| LoreError::Embedding(e.to_string()))?
        };
        let dimension = config.hidden_size;
        let model =
            BertModel::load(vb, &config).map_err(|e| LoreError::Embedding(e.to_string()))?;

        Ok(Self {
            model,
            tokenizer,
            device,
            dimension,
        })
    }

    /// Encode one text into an embedding.
    ///
    /// The tokenizer truncates past 512 tokens; the output is mean-pooled over
    /// unmasked tokens and L2-normalized.
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| LoreError::Embedding(format!("tokenization error: {e}")))?;

        let embed = || -> candle_core::Result<Vec<f32>> {
            let token_ids = Tensor::new(tokens.get_ids(), &self.device)?.unsqueeze(0)?;
            let token_type_ids = Tensor::new(tokens.get_type_ids(), &self.device)?.unsqueeze(0)?;

            let output = self.model.forward(&token_ids, &token_type_ids, None)?;

            let embedding = self.mean_pooling(&output, tokens.get_attention_mask())?;
            let embedding = normalize(&embedding)?;
            embedding.to_vec1::<f32>()
        };

        embed().map_err(|e| LoreError::Embedding(e.to_string()))
    }

    /// Mean pooling over token embeddings, considering the attention mask.
    fn mean_pooling(
        &self,
        embeddings: &Tensor,
        attention_mask: &[u32],
    ) -> candle_core::Result<Tensor> {
        // embeddings: [1, seq_len, hidden]; mask broadcast to [1, seq_len, 1]
        let mask = Tensor::new(attention_mask, &self.device)?
            .to_dtype(DType::F32)?
            .unsqueeze(0)?
            .unsqueeze(2)?;

        let masked = embeddings.broadcast_mul(&mask)?;
        let sum = masked.sum(1)?;
        let count = mask.sum(1)?.clamp(1f32, f32::INFINITY)?;
        let mean = sum.broadcast_div(&count)?;

        mean.squeeze(0)
    }
}

/// L2 normalize an embedding vector.
fn normalize(tensor: &Tensor) -> candle_core::Result<Tensor> {
    let norm = tensor.sqr()?.sum_all()?.sqrt()?;
    tensor.broadcast_div(&norm)
}

impl Embedder for BertEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.encode(text)).collect()
    }
}


#[cfg(test)]
mod tests {
    use super::stub::StubEmbedder;
    use super::*;

    #[test]
    fn test_stub_is_deterministic_and_order_preserving() {
        let embedder = StubEmbedder::new(16);
        let texts = vec!["hello world".to_string(), "hello universe".to_string()];

        let first = embedder.embed_batch(&texts).unwrap();
        let second = embedder.embed_batch(&texts).unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(first[0], embedder.embed("hello world").unwrap());
    }

    #[test]
    fn test_stub_vectors_have_fixed_dimension_and_unit_norm() {
        let embedder = StubEmbedder::new(16);
        let vector = embedder.embed("basics of computer science").unwrap();

        assert_eq!(vector.len(), 16);
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
