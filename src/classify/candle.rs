//! Transformer backends built on Candle.
//!
//! - [`BertSequenceClassifier`]: a BERT encoder with the standard
//!   pooler + linear classification head (`BertForSequenceClassification`
//!   checkpoints). Used for sentiment.
//! - [`NliZeroShotClassifier`]: the same architecture fine-tuned on NLI,
//!   used for zero-shot topics. Each candidate becomes the hypothesis
//!   `"This example is {candidate}."` and candidates are ranked by their
//!   entailment logit.
//!
//! Model files come from a local directory when one is configured, otherwise
//! from the HuggingFace Hub cache (downloaded on first use).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use serde::Deserialize;
use tokenizers::{Encoding, Tokenizer, TruncationParams, TruncationStrategy};

use super::{SentimentModel, TopicModel, softmax};
use crate::error::{ChatmoodError, Result};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHT_FILES: [&str; 2] = ["model.safetensors", "pytorch_model.bin"];

/// Resolved paths of a model checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelFiles {
    /// Locates the files in a local directory. Nothing is downloaded.
    pub fn from_dir(dir: &Path, resource: &'static str) -> Result<Self> {
        let require = |name: &str| {
            let path = dir.join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(ChatmoodError::resource_init(
                    resource,
                    format!("{} not found", path.display()),
                ))
            }
        };

        let config = require(CONFIG_FILE)?;
        let tokenizer = require(TOKENIZER_FILE)?;
        let weights = WEIGHT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                ChatmoodError::resource_init(
                    resource,
                    format!("no model weights in {}", dir.display()),
                )
            })?;

        Ok(Self {
            config,
            tokenizer,
            weights,
        })
    }

    /// Fetches the files from the HuggingFace Hub (or its local cache).
    pub fn from_hub(model_id: &str, resource: &'static str) -> Result<Self> {
        let init = |e: hf_hub::api::sync::ApiError| {
            ChatmoodError::resource_init(resource, format!("{}: {}", model_id, e))
        };

        tracing::info!(model = model_id, "Fetching model from HuggingFace Hub");
        let api = Api::new().map_err(init)?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config = repo.get(CONFIG_FILE).map_err(init)?;
        let tokenizer = repo.get(TOKENIZER_FILE).map_err(init)?;
        let weights = repo
            .get(WEIGHT_FILES[0])
            .or_else(|_| repo.get(WEIGHT_FILES[1]))
            .map_err(init)?;

        Ok(Self {
            config,
            tokenizer,
            weights,
        })
    }

    /// Local directory if given, hub otherwise.
    pub fn resolve(model_id: &str, local_dir: Option<&Path>, resource: &'static str) -> Result<Self> {
        match local_dir {
            Some(dir) => Self::from_dir(dir, resource),
            None => Self::from_hub(model_id, resource),
        }
    }
}

/// Fields of `config.json` the classification head needs.
#[derive(Debug, Deserialize)]
struct HeadConfig {
    hidden_size: usize,
    #[serde(default)]
    id2label: BTreeMap<String, String>,
}

/// BERT encoder with a sequence classification head.
pub struct BertSequenceClassifier {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    id2label: BTreeMap<usize, String>,
    device: Device,
}

impl BertSequenceClassifier {
    /// Loads a checkpoint; `max_tokens` caps every encoded input.
    pub fn load(
        files: &ModelFiles,
        max_tokens: usize,
        strategy: TruncationStrategy,
        resource: &'static str,
    ) -> Result<Self> {
        let init = |message: String| ChatmoodError::resource_init(resource, message);
        let device = Device::Cpu;

        let raw_config = fs::read_to_string(&files.config)
            .map_err(|e| init(format!("{}: {}", files.config.display(), e)))?;
        let bert_config: BertConfig =
            serde_json::from_str(&raw_config).map_err(|e| init(e.to_string()))?;
        let head: HeadConfig = serde_json::from_str(&raw_config).map_err(|e| init(e.to_string()))?;

        let id2label: BTreeMap<usize, String> = head
            .id2label
            .into_iter()
            .filter_map(|(id, label)| id.parse().ok().map(|id| (id, label)))
            .collect();
        if id2label.is_empty() {
            return Err(init("config.json has no id2label table".to_string()));
        }

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| init(format!("failed to load tokenizer: {}", e)))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_tokens,
                strategy,
                ..Default::default()
            }))
            .map_err(|e| init(format!("invalid truncation settings: {}", e)))?;
        tokenizer.with_padding(None);

        let vb = load_weights(&files.weights, &device).map_err(|e| init(e.to_string()))?;
        let bert = BertModel::load(vb.pp("bert"), &bert_config).map_err(|e| init(e.to_string()))?;
        let pooler = candle_nn::linear(head.hidden_size, head.hidden_size, vb.pp("bert.pooler.dense"))
            .map_err(|e| init(e.to_string()))?;
        let classifier = candle_nn::linear(head.hidden_size, id2label.len(), vb.pp("classifier"))
            .map_err(|e| init(e.to_string()))?;

        tracing::info!(
            weights = %files.weights.display(),
            labels = id2label.len(),
            max_tokens,
            "Loaded sequence classifier"
        );

        Ok(Self {
            bert,
            pooler,
            classifier,
            tokenizer,
            id2label,
            device,
        })
    }

    /// Resolves the checkpoint files and loads a single-sequence classifier.
    pub fn from_source(
        model_id: &str,
        local_dir: Option<&Path>,
        max_tokens: usize,
        resource: &'static str,
    ) -> Result<Self> {
        let files = ModelFiles::resolve(model_id, local_dir, resource)?;
        Self::load(&files, max_tokens, TruncationStrategy::LongestFirst, resource)
    }

    /// Number of classes of the head.
    pub fn num_labels(&self) -> usize {
        self.id2label.len()
    }

    /// Class index to label names, as declared by the checkpoint.
    pub fn id2label(&self) -> &BTreeMap<usize, String> {
        &self.id2label
    }

    fn encode_single(&self, text: &str) -> Result<Encoding> {
        self.tokenizer
            .encode(text, true)
            .map_err(|e| ChatmoodError::inference(format!("tokenization failed: {}", e)))
    }

    fn encode_pair(&self, premise: &str, hypothesis: &str) -> Result<Encoding> {
        self.tokenizer
            .encode((premise, hypothesis), true)
            .map_err(|e| ChatmoodError::inference(format!("tokenization failed: {}", e)))
    }

    /// Raw logits of one encoded input.
    fn logits(&self, encoding: &Encoding) -> Result<Vec<f32>> {
        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden = self
            .bert
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?;

        Ok(logits.squeeze(0)?.to_vec1::<f32>()?)
    }
}

impl SentimentModel for BertSequenceClassifier {
    fn class_scores(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self.encode_single(text)?;
        self.logits(&encoding)
    }
}

/// Zero-shot topic classifier over an NLI checkpoint.
pub struct NliZeroShotClassifier {
    model: BertSequenceClassifier,
    entailment: usize,
    template: String,
}

impl NliZeroShotClassifier {
    /// Wraps an NLI model; the entailment class is looked up in `id2label`.
    pub fn new(model: BertSequenceClassifier, template: impl Into<String>) -> Result<Self> {
        let entailment = entailment_index(model.id2label()).ok_or_else(|| {
            ChatmoodError::resource_init(
                "topic model",
                "checkpoint has no entailment label; not an NLI model",
            )
        })?;
        Ok(Self {
            model,
            entailment,
            template: template.into(),
        })
    }

    /// Resolves and loads an NLI checkpoint. Only the premise is truncated.
    pub fn from_source(
        model_id: &str,
        local_dir: Option<&Path>,
        max_tokens: usize,
        template: &str,
    ) -> Result<Self> {
        let files = ModelFiles::resolve(model_id, local_dir, "topic model")?;
        let model = BertSequenceClassifier::load(
            &files,
            max_tokens,
            TruncationStrategy::OnlyFirst,
            "topic model",
        )?;
        Self::new(model, template)
    }

    fn hypothesis(&self, candidate: &str) -> String {
        self.template.replace("{}", candidate)
    }
}

impl TopicModel for NliZeroShotClassifier {
    fn candidate_scores(&self, text: &str, candidates: &[String]) -> Result<Vec<f32>> {
        let mut entailment_logits = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let encoding = self.model.encode_pair(text, &self.hypothesis(candidate))?;
            let logits = self.model.logits(&encoding)?;
            let logit = logits.get(self.entailment).copied().ok_or_else(|| {
                ChatmoodError::inference("entailment index outside model output")
            })?;
            entailment_logits.push(logit);
        }
        Ok(softmax(&entailment_logits))
    }
}

/// First class whose label starts with "entail", case-insensitively.
fn entailment_index(id2label: &BTreeMap<usize, String>) -> Option<usize> {
    id2label
        .iter()
        .find(|(_, label)| label.to_lowercase().starts_with("entail"))
        .map(|(id, _)| *id)
}

fn load_weights(path: &Path, device: &Device) -> candle_core::Result<VarBuilder<'static>> {
    if path.extension().is_some_and(|ext| ext == "safetensors") {
        // SAFETY: the file is a read-only checkpoint that outlives the mapping.
        unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device) }
    } else {
        VarBuilder::from_pth(path, DType::F32, device)
    }
}
