//! Mock model and runtime for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lectern_analytics::mock::{MockModel, MockRuntime};
//!
//! #[tokio::test]
//! async fn test_with_mock_model() {
//!     let model = MockModel::new().with_answer_field("best_span_str");
//!     // register `model.clone()` in a ModelRegistry, run requests ...
//!     assert_eq!(model.analyze_call_count(), 1);
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use lectern_core::{AnalysisModel, Error, ModelRuntime, ResolvedInput, Result};

/// One recorded `analyze` call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub input: JsonValue,
    pub params: JsonValue,
}

/// Model whose output echoes its input and numbers each invocation.
///
/// Output shape: `{"<answer_field>": text_reference, "question": text_auxiliary,
/// "params": params, "invocation": n}` where `n` counts from 1.
#[derive(Clone)]
pub struct MockModel {
    answer_field: String,
    failure: Option<String>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            answer_field: "answer".to_string(),
            failure: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Name of the output field carrying the reference text.
    pub fn with_answer_field(mut self, field: impl Into<String>) -> Self {
        self.answer_field = field.into();
        self
    }

    /// Make every `analyze` call fail with an inference error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn get_calls(&self) -> Vec<MockCall> {
        self.lock_calls().clone()
    }

    pub fn analyze_call_count(&self) -> usize {
        self.lock_calls().len()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<MockCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AnalysisModel for MockModel {
    fn convert_input(&self, input: &ResolvedInput) -> Result<JsonValue> {
        Ok(json!({
            "passage": input.text_reference,
            "question": input.text_auxiliary,
        }))
    }

    async fn analyze(&self, input: JsonValue, params: &JsonValue) -> Result<JsonValue> {
        let invocation = {
            let mut calls = self.lock_calls();
            calls.push(MockCall {
                input: input.clone(),
                params: params.clone(),
            });
            calls.len()
        };
        if let Some(msg) = &self.failure {
            return Err(Error::Inference(msg.clone()));
        }

        let mut output = serde_json::Map::new();
        output.insert(self.answer_field.clone(), input["passage"].clone());
        output.insert("question".to_string(), input["question"].clone());
        output.insert("params".to_string(), params.clone());
        output.insert("invocation".to_string(), json!(invocation));
        Ok(JsonValue::Object(output))
    }
}

/// Runtime that counts initialization attempts.
#[derive(Clone, Default)]
pub struct MockRuntime {
    attempts: Arc<AtomicUsize>,
    failures_remaining: Arc<AtomicUsize>,
    last_config: Arc<Mutex<Option<PathBuf>>>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` initialization attempts.
    pub fn failing_times(self, n: usize) -> Self {
        self.failures_remaining.store(n, Ordering::SeqCst);
        self
    }

    pub fn init_call_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Config path of the most recent attempt.
    pub fn last_config(&self) -> Option<PathBuf> {
        self.last_config
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ModelRuntime for MockRuntime {
    async fn initialize(&self, config_path: &Path) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        *self.last_config.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(config_path.to_path_buf());

        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(Error::Initialization(format!(
                "mock runtime refused {}",
                config_path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_model_echoes_and_counts() {
        let model = MockModel::new().with_answer_field("best_span_str");
        let resolved = ResolvedInput {
            text_reference: "passage".to_string(),
            text_auxiliary: "question".to_string(),
            association_id: None,
        };
        let native = model.convert_input(&resolved).unwrap();
        let out = model.analyze(native, &json!({"k": 1})).await.unwrap();

        assert_eq!(out["best_span_str"], "passage");
        assert_eq!(out["question"], "question");
        assert_eq!(out["params"], json!({"k": 1}));
        assert_eq!(out["invocation"], 1);
        assert_eq!(model.analyze_call_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_model_still_records_call() {
        let model = MockModel::new().failing("boom");
        let err = model.analyze(json!({}), &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
        assert_eq!(model.analyze_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_runtime_failures_then_success() {
        let runtime = MockRuntime::new().failing_times(1);
        assert!(runtime.initialize(Path::new("a.json")).await.is_err());
        assert!(runtime.initialize(Path::new("b.json")).await.is_ok());
        assert_eq!(runtime.init_call_count(), 2);
        assert_eq!(runtime.last_config(), Some(PathBuf::from("b.json")));
    }
}
