//! Core data models for lectern.
//!
//! These types are shared across all lectern crates and represent the
//! tenants, actors, documents, and analysis records the pipeline works on.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::error;
use uuid::Uuid;

use crate::error::{Error, Result};

pub type RecordId = i64;
pub type ClientId = i64;
pub type UserId = i64;
pub type GroupId = i64;
pub type SiteId = i64;

// =============================================================================
// TENANCY
// =============================================================================

/// Owning organization of a record.
///
/// A system client is a pseudo-tenant for free standing users who are not
/// affiliated with a real organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    /// External client identifier.
    pub client_id: String,
    /// Display name, used to group hierarchy views.
    pub name: String,
    #[serde(default)]
    pub is_system: bool,
}

/// The authenticated user issuing a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub group_ids: Vec<GroupId>,
    /// Permission codenames, e.g. `analytics.add_analysisresults`.
    #[serde(default)]
    pub permissions: HashSet<String>,
}

impl Actor {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            ..Default::default()
        }
    }

    pub fn with_groups(mut self, group_ids: impl IntoIterator<Item = GroupId>) -> Self {
        self.group_ids.extend(group_ids);
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Stable identity string used in cache keys and audit logs.
    pub fn identity(&self) -> &str {
        &self.username
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Audit columns carried by every persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFields {
    pub uuid: Uuid,
    pub version: i32,
    pub creation_user: UserId,
    pub update_user: UserId,
    /// User on whose behalf the change is made. Drives access scoping.
    pub effective_user: UserId,
    pub site: SiteId,
    pub creation_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl AuditFields {
    /// Audit fields for a record created by `user` on its own behalf.
    pub fn new(user: UserId, site: SiteId) -> Self {
        let now = Utc::now();
        Self {
            uuid: Uuid::now_v7(),
            version: 1,
            creation_user: user,
            update_user: user,
            effective_user: user,
            site,
            creation_time: now,
            update_time: now,
        }
    }

    /// Record an update by `user`.
    pub fn touch(&mut self, user: UserId) {
        self.update_user = user;
        self.update_time = Utc::now();
        self.version += 1;
    }
}

// =============================================================================
// DOCUMENTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Reference,
    Auxiliary,
    Unknown,
}

/// Where a document's text lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum DocumentContent {
    /// Text stored on the record itself.
    Inline(String),
    /// File uploaded by the user, stored on the server.
    Upload(PathBuf),
    /// Server mounted directory. Text extraction is not supported for it.
    DirPath(PathBuf),
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: RecordId,
    pub name: String,
    pub client_id: ClientId,
    pub document_type: DocumentType,
    pub mime_type: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: DocumentContent,
    pub audit: AuditFields,
}

impl Document {
    /// Text of the document: inline content, else the uploaded file's bytes.
    ///
    /// An unreadable upload is logged and yields `None`.
    pub async fn get_text(&self) -> Option<String> {
        match &self.content {
            DocumentContent::Inline(text) => Some(text.clone()),
            DocumentContent::Upload(path) => match tokio::fs::read_to_string(path).await {
                Ok(text) => Some(text),
                Err(e) => {
                    error!(
                        document_id = self.id,
                        path = %path.display(),
                        error = %e,
                        "Failed to read uploaded document"
                    );
                    None
                }
            },
            DocumentContent::DirPath(_) | DocumentContent::Empty => None,
        }
    }
}

/// Request for storing a document.
#[derive(Debug, Clone)]
pub struct CreateDocumentRequest {
    pub name: String,
    pub client_id: ClientId,
    pub document_type: DocumentType,
    pub mime_type: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: DocumentContent,
    pub user_id: UserId,
    pub site: SiteId,
}

impl CreateDocumentRequest {
    /// Plain text document with inline content.
    pub fn inline(name: impl Into<String>, client_id: ClientId, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            client_id,
            document_type: DocumentType::Unknown,
            mime_type: "text/plain".to_string(),
            title: None,
            description: None,
            content: DocumentContent::Inline(text.into()),
            user_id: 0,
            site: 0,
        }
    }

    pub fn with_content(mut self, content: DocumentContent) -> Self {
        self.content = content;
        self
    }

    pub fn with_type(mut self, document_type: DocumentType) -> Self {
        self.document_type = document_type;
        self
    }

    pub fn by_user(mut self, user_id: UserId, site: SiteId) -> Self {
        self.user_id = user_id;
        self.site = site;
        self
    }
}

/// Why two documents are linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationPurpose {
    #[default]
    Unknown,
    Question,
    Summary,
    Reference,
}

/// Directed pair of documents. Also the canonical way to reference a stored
/// reference/auxiliary pair for analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAssociation {
    pub id: RecordId,
    /// Treated as the reference text during analysis.
    pub from_document_id: RecordId,
    /// Treated as the auxiliary text during analysis.
    pub to_document_id: RecordId,
    pub client_id: ClientId,
    pub purpose: AssociationPurpose,
    pub audit: AuditFields,
}

/// Request for linking two stored documents.
#[derive(Debug, Clone)]
pub struct CreateAssociationRequest {
    pub from_document_id: RecordId,
    pub to_document_id: RecordId,
    pub client_id: ClientId,
    pub purpose: AssociationPurpose,
    pub user_id: UserId,
    pub site: SiteId,
}

// =============================================================================
// ANALYSIS REQUEST
// =============================================================================

/// Identifies which analyzable model to invoke.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelDescriptor {
    #[serde(rename = "model_family")]
    pub family: String,
    #[serde(rename = "model_name")]
    pub name: String,
}

impl ModelDescriptor {
    pub fn new(family: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            name: name.into(),
        }
    }
}

impl ModelDescriptor {
    /// Both parts must be non-blank.
    pub fn validate(&self) -> Result<()> {
        require_non_blank("model_family", &self.family)?;
        require_non_blank("model_name", &self.name)
    }
}

impl std::fmt::Display for ModelDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.family, self.name)
    }
}

/// Model input as received on the wire, before shape validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawModelInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_auxiliary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<i64>,
}

/// Validated model input: an inline text pair or a stored association id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelInput {
    Text {
        text_reference: String,
        text_auxiliary: String,
    },
    Resource {
        resource_id: RecordId,
    },
}

impl ModelInput {
    pub fn text(reference: impl Into<String>, auxiliary: impl Into<String>) -> Self {
        ModelInput::Text {
            text_reference: reference.into(),
            text_auxiliary: auxiliary.into(),
        }
    }

    pub fn resource(resource_id: RecordId) -> Self {
        ModelInput::Resource { resource_id }
    }
}

impl TryFrom<RawModelInput> for ModelInput {
    type Error = Error;

    fn try_from(raw: RawModelInput) -> Result<Self> {
        match (raw.text_reference, raw.text_auxiliary, raw.resource_id) {
            (None, None, None) => Err(Error::InvalidInput(
                "text_reference and text_auxiliary or resource_id must be defined".to_string(),
            )),
            (None, None, Some(id)) if id < 1 => Err(Error::InvalidInput(format!(
                "resource_id must be a positive integer, got {}",
                id
            ))),
            (None, None, Some(id)) => Ok(ModelInput::Resource { resource_id: id }),
            (_, _, Some(_)) => Err(Error::InvalidInput(
                "resource_id can not be combined with text_reference or text_auxiliary"
                    .to_string(),
            )),
            (Some(reference), Some(auxiliary), None) => {
                require_non_blank("text_reference", &reference)?;
                require_non_blank("text_auxiliary", &auxiliary)?;
                Ok(ModelInput::Text {
                    text_reference: reference,
                    text_auxiliary: auxiliary,
                })
            }
            _ => Err(Error::InvalidInput(
                "text_reference and text_auxiliary must be defined".to_string(),
            )),
        }
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} may not be blank", field)));
    }
    Ok(())
}

/// How the pipeline should treat caching and persistence for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingInstructions {
    pub use_cache: bool,
    pub force_analysis: bool,
    pub save_results: bool,
    pub analysis_name: Option<String>,
    pub analysis_description: Option<String>,
}

impl ProcessingInstructions {
    /// `analysis_name` is required whenever caching or saving is requested.
    pub fn validate(&self) -> Result<()> {
        let has_name = self
            .analysis_name
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty());
        if (self.use_cache || self.save_results) && !has_name {
            return Err(Error::InvalidInput(
                "analysis_name must be defined when use_cache or save_results is set".to_string(),
            ));
        }
        Ok(())
    }

    /// Cache key for this request, or `None` when the cache must not be read.
    pub fn cache_lookup_key(&self, actor: &Actor) -> Option<String> {
        if self.force_analysis {
            return None;
        }
        self.cache_store_key(actor)
    }

    /// Cache key under which a fresh output is stored, forced or not.
    pub fn cache_store_key(&self, actor: &Actor) -> Option<String> {
        if !self.use_cache {
            return None;
        }
        self.analysis_name
            .as_deref()
            .map(|name| cache_key(actor.identity(), name))
    }
}

/// `"{actor_identity}:{analysis_name}"`.
pub fn cache_key(actor_identity: &str, analysis_name: &str) -> String {
    format!("{}:{}", actor_identity, analysis_name)
}

/// Full analysis request as accepted from callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub model_descriptor: ModelDescriptor,
    pub model_input: RawModelInput,
    #[serde(default)]
    pub model_params: Option<JsonValue>,
    #[serde(default)]
    pub processing_instructions: ProcessingInstructions,
}

/// Text pair ready for model consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInput {
    pub text_reference: String,
    pub text_auxiliary: String,
    /// Association the text was loaded from, if any.
    #[serde(skip)]
    pub association_id: Option<RecordId>,
}

impl ResolvedInput {
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        map.insert(
            "text_reference".to_string(),
            JsonValue::String(self.text_reference.clone()),
        );
        map.insert(
            "text_auxiliary".to_string(),
            JsonValue::String(self.text_auxiliary.clone()),
        );
        JsonValue::Object(map)
    }
}

// =============================================================================
// ANALYSIS RESULTS
// =============================================================================

/// Persisted analysis output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: RecordId,
    pub input: JsonValue,
    pub output: JsonValue,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Association the input was resolved from.
    pub documents: Option<RecordId>,
    pub client_id: ClientId,
    pub audit: AuditFields,
}

/// Request for persisting an analysis result.
#[derive(Debug, Clone)]
pub struct CreateAnalysisResultRequest {
    pub input: JsonValue,
    pub output: JsonValue,
    pub name: Option<String>,
    pub description: Option<String>,
    pub documents: Option<RecordId>,
    pub client_id: ClientId,
    pub user_id: UserId,
    pub site: SiteId,
}
