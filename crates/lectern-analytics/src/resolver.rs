//! Materializes model input into a text pair.
//!
//! Inline text passes through unchanged. A resource reference is loaded as a
//! document association whose `from` document supplies the reference text and
//! whose `to` document supplies the auxiliary text.

use std::sync::Arc;

use tracing::{debug, instrument};

use lectern_core::{
    Document, DocumentRepository, Error, ModelInput, RecordId, ResolvedInput, Result,
};

/// Resolves [`ModelInput`] against document storage.
#[derive(Clone)]
pub struct InputResolver {
    documents: Arc<dyn DocumentRepository>,
}

impl InputResolver {
    pub fn new(documents: Arc<dyn DocumentRepository>) -> Self {
        Self { documents }
    }

    #[instrument(
        skip(self, input),
        fields(subsystem = "analytics", component = "input_resolver", op = "resolve")
    )]
    pub async fn resolve(&self, input: &ModelInput) -> Result<ResolvedInput> {
        match input {
            ModelInput::Text {
                text_reference,
                text_auxiliary,
            } => {
                debug!("Using inline model input");
                Ok(ResolvedInput {
                    text_reference: text_reference.clone(),
                    text_auxiliary: text_auxiliary.clone(),
                    association_id: None,
                })
            }
            ModelInput::Resource { resource_id } => self.resolve_association(*resource_id).await,
        }
    }

    async fn resolve_association(&self, resource_id: RecordId) -> Result<ResolvedInput> {
        let association = self.documents.get_association(resource_id).await?;
        let reference = self
            .documents
            .get_document(association.from_document_id)
            .await?;
        let auxiliary = self.documents.get_document(association.to_document_id).await?;

        debug!(
            resource_id,
            reference_id = reference.id,
            auxiliary_id = auxiliary.id,
            "Resolved document association"
        );

        Ok(ResolvedInput {
            text_reference: document_text(&reference).await?,
            text_auxiliary: document_text(&auxiliary).await?,
            association_id: Some(association.id),
        })
    }
}

async fn document_text(doc: &Document) -> Result<String> {
    doc.get_text().await.ok_or_else(|| {
        Error::InvalidInput(format!("Document {} has no readable text", doc.id))
    })
}
