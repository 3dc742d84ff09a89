//! Model registry keyed by `(family, name)` descriptor.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use lectern_core::{AnalysisModel, Error, ModelDescriptor, Result};

/// Registry of analyzable models.
///
/// Populated at process start and read concurrently afterwards; wrap it in an
/// `Arc` to share it between request handlers.
#[derive(Default)]
pub struct ModelRegistry {
    models: HashMap<ModelDescriptor, Arc<dyn AnalysisModel>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model, replacing any model already registered under the
    /// same descriptor.
    pub fn register(&mut self, descriptor: ModelDescriptor, model: Arc<dyn AnalysisModel>) {
        info!(
            model_family = %descriptor.family,
            model_name = %descriptor.name,
            "Registering analysis model"
        );
        if self.models.insert(descriptor.clone(), model).is_some() {
            warn!(model = %descriptor, "Replaced previously registered model");
        }
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_model(
        mut self,
        descriptor: ModelDescriptor,
        model: Arc<dyn AnalysisModel>,
    ) -> Self {
        self.register(descriptor, model);
        self
    }

    /// Resolve a descriptor to its model.
    pub fn find(&self, descriptor: &ModelDescriptor) -> Result<Arc<dyn AnalysisModel>> {
        match self.models.get(descriptor) {
            Some(model) => {
                debug!(model = %descriptor, "Resolved analysis model");
                Ok(model.clone())
            }
            None => Err(Error::ModelNotFound {
                family: descriptor.family.clone(),
                name: descriptor.name.clone(),
            }),
        }
    }

    pub fn contains(&self, descriptor: &ModelDescriptor) -> bool {
        self.models.contains_key(descriptor)
    }

    /// Registered descriptors, sorted by family then name.
    pub fn descriptors(&self) -> Vec<&ModelDescriptor> {
        let mut descriptors: Vec<&ModelDescriptor> = self.models.keys().collect();
        descriptors.sort_by(|a, b| (&a.family, &a.name).cmp(&(&b.family, &b.name)));
        descriptors
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
