//! Text analytics request pipeline.
//!
//! [`TextAnalyticsService::analyze`] runs one request through
//!
//! 1. request validation,
//! 2. one-time model runtime initialization,
//! 3. the results cache (a hit returns immediately),
//! 4. model resolution and input resolution,
//! 5. model invocation,
//! 6. the cache update,
//! 7. permission gated persistence.
//!
//! Validation and lookup failures abort before the model runs. A model
//! failure skips both the cache update and persistence. A denied save keeps
//! the computed output and the cache update; the [`Error::Forbidden`] is
//! carried by [`PersistenceStatus::Denied`] instead of failing the request.

use std::sync::Arc;
use std::time::Instant;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info, instrument, warn};

use lectern_core::defaults::PERM_ADD_ANALYSIS_RESULTS;
use lectern_core::{
    AccessScopeFilter, Actor, AnalysisRequest, AnalysisResult, AnalysisResultRepository,
    ClassificationKind, ClassificationRepository, Client, ClientId, ClientRepository,
    CreateAnalysisResultRequest, DocumentRepository, Error, HierarchyBuilder, HierarchyView,
    ModelInput, ModelRuntime, ProcessingInstructions, RecordId, ResolvedInput, Result, SiteId,
};

use crate::cache::ResultsCache;
use crate::config::AnalyticsConfig;
use crate::registry::ModelRegistry;
use crate::resolver::InputResolver;
use crate::runtime::RuntimeInitializer;

/// Storage collaborators the service reads from and writes to.
#[derive(Clone)]
pub struct Repositories {
    pub documents: Arc<dyn DocumentRepository>,
    pub results: Arc<dyn AnalysisResultRepository>,
    pub classifications: Arc<dyn ClassificationRepository>,
    pub clients: Arc<dyn ClientRepository>,
}

/// Who is asking, and on behalf of which tenant.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub actor: Actor,
    /// `None` before a tenant has been attached to the session.
    pub client: Option<Client>,
    pub site: SiteId,
}

impl RequestContext {
    pub fn new(actor: Actor, client: Option<Client>, site: SiteId) -> Self {
        Self {
            actor,
            client,
            site,
        }
    }
}

/// What happened to the save step of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum PersistenceStatus {
    /// Saving was not requested, or the output came from the cache.
    NotRequested,
    Saved(RecordId),
    /// Saving was requested but not allowed. Always [`Error::Forbidden`].
    Denied(#[serde(serialize_with = "serialize_error")] Error),
}

fn serialize_error<S>(error: &Error, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(error)
}

/// Result of [`TextAnalyticsService::analyze`].
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub output: JsonValue,
    pub saved: Option<AnalysisResult>,
    pub cache_hit: bool,
    pub persistence: PersistenceStatus,
}

impl AnalysisOutcome {
    pub fn saved_record_id(&self) -> Option<RecordId> {
        match self.persistence {
            PersistenceStatus::Saved(id) => Some(id),
            _ => None,
        }
    }

    /// Why the requested save was refused, if it was.
    pub fn denial(&self) -> Option<&Error> {
        match &self.persistence {
            PersistenceStatus::Denied(err) => Some(err),
            _ => None,
        }
    }
}

/// Request that passed validation.
struct ValidatedRequest {
    input: ModelInput,
    params: JsonValue,
    instructions: ProcessingInstructions,
}

/// Analysis pipeline and classification navigation.
pub struct TextAnalyticsService {
    registry: Arc<ModelRegistry>,
    runtime: RuntimeInitializer,
    cache: ResultsCache,
    resolver: InputResolver,
    repos: Repositories,
}

impl TextAnalyticsService {
    pub fn new(
        config: &AnalyticsConfig,
        registry: Arc<ModelRegistry>,
        runtime: Arc<dyn ModelRuntime>,
        repos: Repositories,
    ) -> Self {
        Self {
            registry,
            runtime: RuntimeInitializer::new(runtime, config.runtime_config_path.clone()),
            cache: ResultsCache::from_config(config),
            resolver: InputResolver::new(repos.documents.clone()),
            repos,
        }
    }

    /// Use an existing cache, e.g. one shared with other services in the
    /// same process.
    pub fn with_cache(mut self, cache: ResultsCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &ResultsCache {
        &self.cache
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Run one analysis request.
    #[instrument(
        skip(self, ctx, request),
        fields(
            subsystem = "analytics",
            component = "orchestrator",
            op = "analyze",
            actor = %ctx.actor.identity(),
            model_family = %request.model_descriptor.family,
            model_name = %request.model_descriptor.name,
        )
    )]
    pub async fn analyze(
        &self,
        ctx: &RequestContext,
        request: AnalysisRequest,
    ) -> Result<AnalysisOutcome> {
        let start = Instant::now();
        let descriptor = request.model_descriptor.clone();
        let req = validate_request(request)?;

        self.runtime.ensure_initialized().await?;

        if let Some(key) = req.instructions.cache_lookup_key(&ctx.actor) {
            if let Some(output) = self.cache.find(&key).await {
                debug!(
                    cache_key = %key,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Returning cached analysis output"
                );
                return Ok(AnalysisOutcome {
                    output,
                    saved: None,
                    cache_hit: true,
                    persistence: PersistenceStatus::NotRequested,
                });
            }
        }

        let model = self.registry.find(&descriptor)?;
        let resolved = self.resolver.resolve(&req.input).await?;
        let native = model.convert_input(&resolved)?;
        let output = model.analyze(native, &req.params).await?;
        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Model invocation complete"
        );

        if let Some(key) = req.instructions.cache_store_key(&ctx.actor) {
            self.cache.add(key, output.clone()).await;
        }

        let (saved, persistence) = if req.instructions.save_results {
            self.persist(ctx, &req.instructions, &resolved, &output)
                .await?
        } else {
            (None, PersistenceStatus::NotRequested)
        };

        info!(
            success = true,
            saved = saved.is_some(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Analysis complete"
        );
        Ok(AnalysisOutcome {
            output,
            saved,
            cache_hit: false,
            persistence,
        })
    }

    async fn persist(
        &self,
        ctx: &RequestContext,
        instructions: &ProcessingInstructions,
        resolved: &ResolvedInput,
        output: &JsonValue,
    ) -> Result<(Option<AnalysisResult>, PersistenceStatus)> {
        if !ctx.actor.has_permission(PERM_ADD_ANALYSIS_RESULTS) {
            let err = Error::Forbidden(format!(
                "User {} lacks permission {}",
                ctx.actor.identity(),
                PERM_ADD_ANALYSIS_RESULTS
            ));
            warn!(actor = %ctx.actor.identity(), error = %err, "Analysis result not saved");
            return Ok((None, PersistenceStatus::Denied(err)));
        }
        let Some(client) = &ctx.client else {
            let err = Error::Forbidden(format!("User {} has no tenant", ctx.actor.identity()));
            warn!(actor = %ctx.actor.identity(), error = %err, "Analysis result not saved");
            return Ok((None, PersistenceStatus::Denied(err)));
        };

        let record = self
            .repos
            .results
            .insert(CreateAnalysisResultRequest {
                input: resolved.to_json(),
                output: output.clone(),
                name: instructions.analysis_name.clone(),
                description: instructions.analysis_description.clone(),
                documents: resolved.association_id,
                client_id: client.id,
                user_id: ctx.actor.id,
                site: ctx.site,
            })
            .await?;
        info!(result_id = record.id, client_id = client.id, "Analysis result saved");
        let id = record.id;
        Ok((Some(record), PersistenceStatus::Saved(id)))
    }

    /// Tags or categories visible to `actor`, as trees grouped by tenant
    /// name and target.
    #[instrument(
        skip(self, actor, client),
        fields(subsystem = "analytics", component = "hierarchy", op = "build_hierarchy")
    )]
    pub async fn build_hierarchy(
        &self,
        kind: ClassificationKind,
        actor: &Actor,
        client: Option<&Client>,
    ) -> Result<HierarchyView> {
        let scope = AccessScopeFilter::classification(actor, client);
        let nodes = self.repos.classifications.list(kind, &scope).await?;

        let mut owners: Vec<ClientId> = nodes.iter().map(|n| n.client_id).collect();
        owners.sort_unstable();
        owners.dedup();
        let clients = self.repos.clients.get_clients(&owners).await?;

        let view = HierarchyBuilder::new(&clients).build(&nodes);
        debug!(
            kind = %kind,
            result_count = nodes.len(),
            tenants = owners.len(),
            "Built classification hierarchy"
        );
        Ok(view)
    }
}

fn validate_request(request: AnalysisRequest) -> Result<ValidatedRequest> {
    request.processing_instructions.validate()?;
    request.model_descriptor.validate()?;
    let input = ModelInput::try_from(request.model_input)?;
    let params = match request.model_params {
        None | Some(JsonValue::Null) => JsonValue::Object(Map::new()),
        Some(JsonValue::Object(map)) => JsonValue::Object(map),
        Some(other) => {
            return Err(Error::InvalidInput(format!(
                "model_params must be a JSON object, got {}",
                other
            )))
        }
    };
    Ok(ValidatedRequest {
        input,
        params,
        instructions: request.processing_instructions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockModel, MockRuntime};
    use lectern_core::{ErrorKind, ModelDescriptor, RawModelInput};
    use lectern_store::test_fixtures::{document_pair, seeded_store, ACME_CLIENT};
    use lectern_store::MemoryStore;
    use serde_json::json;

    fn repos(store: &MemoryStore) -> Repositories {
        Repositories {
            documents: Arc::new(store.documents.clone()),
            results: Arc::new(store.results.clone()),
            classifications: Arc::new(store.classifications.clone()),
            clients: Arc::new(store.clients.clone()),
        }
    }

    fn service(store: &MemoryStore, model: MockModel, runtime: MockRuntime) -> TextAnalyticsService {
        let registry =
            ModelRegistry::new().with_model(ModelDescriptor::new("mock", "echo"), Arc::new(model));
        TextAnalyticsService::new(
            &AnalyticsConfig::default(),
            Arc::new(registry),
            Arc::new(runtime),
            repos(store),
        )
    }

    fn request(input: RawModelInput, instructions: ProcessingInstructions) -> AnalysisRequest {
        AnalysisRequest {
            model_descriptor: ModelDescriptor::new("mock", "echo"),
            model_input: input,
            model_params: None,
            processing_instructions: instructions,
        }
    }

    fn text(reference: &str, auxiliary: &str) -> RawModelInput {
        RawModelInput {
            text_reference: Some(reference.to_string()),
            text_auxiliary: Some(auxiliary.to_string()),
            resource_id: None,
        }
    }

    fn ctx(actor: Actor) -> RequestContext {
        RequestContext::new(actor, None, 1)
    }

    #[tokio::test]
    async fn test_plain_request_invokes_model() {
        let store = MemoryStore::new();
        let model = MockModel::new();
        let svc = service(&store, model.clone(), MockRuntime::new());

        let outcome = svc
            .analyze(
                &ctx(Actor::new(1, "alice")),
                request(text("passage", "question"), Default::default()),
            )
            .await
            .unwrap();

        assert_eq!(outcome.output["answer"], "passage");
        assert!(!outcome.cache_hit);
        assert_eq!(outcome.persistence, PersistenceStatus::NotRequested);
        assert_eq!(outcome.saved_record_id(), None);
        assert_eq!(model.analyze_call_count(), 1);
        assert!(svc.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_validation_aborts_before_side_effects() {
        let store = MemoryStore::new();
        let model = MockModel::new();
        let runtime = MockRuntime::new();
        let svc = service(&store, model.clone(), runtime.clone());

        let missing_name = ProcessingInstructions {
            use_cache: true,
            ..Default::default()
        };
        let err = svc
            .analyze(
                &ctx(Actor::new(1, "alice")),
                request(text("a", "b"), missing_name),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = svc
            .analyze(
                &ctx(Actor::new(1, "alice")),
                request(RawModelInput::default(), Default::default()),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(model.analyze_call_count(), 0);
        assert_eq!(runtime.init_call_count(), 0);
    }

    #[tokio::test]
    async fn test_non_object_params_rejected() {
        let store = MemoryStore::new();
        let svc = service(&store, MockModel::new(), MockRuntime::new());
        let mut req = request(text("a", "b"), Default::default());
        req.model_params = Some(json!([1, 2]));

        let err = svc
            .analyze(&ctx(Actor::new(1, "alice")), req)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("model_params"));
    }

    #[tokio::test]
    async fn test_params_reach_the_model() {
        let store = MemoryStore::new();
        let model = MockModel::new();
        let svc = service(&store, model.clone(), MockRuntime::new());
        let mut req = request(text("a", "b"), Default::default());
        req.model_params = Some(json!({"beam_size": 3}));

        svc.analyze(&ctx(Actor::new(1, "alice")), req).await.unwrap();
        assert_eq!(model.get_calls()[0].params, json!({"beam_size": 3}));
    }

    #[tokio::test]
    async fn test_unknown_model_is_not_found() {
        let store = MemoryStore::new();
        let model = MockModel::new();
        let svc = service(&store, model.clone(), MockRuntime::new());
        let mut req = request(text("a", "b"), Default::default());
        req.model_descriptor = ModelDescriptor::new("mock", "missing");

        let err = svc
            .analyze(&ctx(Actor::new(1, "alice")), req)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ModelNotFound { .. }));
        assert_eq!(model.analyze_call_count(), 0);
    }

    #[tokio::test]
    async fn test_runtime_failure_is_fatal_then_retried() {
        let store = MemoryStore::new();
        let runtime = MockRuntime::new().failing_times(1);
        let model = MockModel::new();
        let svc = service(&store, model.clone(), runtime.clone());
        let actor = Actor::new(1, "alice");

        let err = svc
            .analyze(&ctx(actor.clone()), request(text("a", "b"), Default::default()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Initialization);
        assert_eq!(model.analyze_call_count(), 0);

        svc.analyze(&ctx(actor.clone()), request(text("a", "b"), Default::default()))
            .await
            .unwrap();
        svc.analyze(&ctx(actor), request(text("a", "b"), Default::default()))
            .await
            .unwrap();
        assert_eq!(runtime.init_call_count(), 2);
        assert_eq!(
            runtime.last_config().as_deref(),
            Some(std::path::Path::new(
                lectern_core::defaults::RUNTIME_CONFIG_PATH
            ))
        );
    }

    #[tokio::test]
    async fn test_model_failure_skips_cache_and_save() {
        let store = MemoryStore::new();
        let model = MockModel::new().failing("model crashed");
        let svc = service(&store, model, MockRuntime::new());
        let actor = Actor::new(1, "alice").with_permission(PERM_ADD_ANALYSIS_RESULTS);
        let instructions = ProcessingInstructions {
            use_cache: true,
            save_results: true,
            analysis_name: Some("run".to_string()),
            ..Default::default()
        };

        let err = svc
            .analyze(&ctx(actor), request(text("a", "b"), instructions))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelInvocation);
        assert!(svc.cache().is_empty().await);
        assert!(store
            .results
            .list(&lectern_core::ScopePredicate::All)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_saved_result_links_association() {
        let store = seeded_store().await;
        let association = document_pair(&store, ACME_CLIENT, 10, "passage", "question").await;
        let acme = store.clients.get_client(ACME_CLIENT).await.unwrap();
        let svc = service(&store, MockModel::new(), MockRuntime::new());

        let actor = Actor::new(10, "alice").with_permission(PERM_ADD_ANALYSIS_RESULTS);
        let instructions = ProcessingInstructions {
            save_results: true,
            analysis_name: Some("reading".to_string()),
            analysis_description: Some("first pass".to_string()),
            ..Default::default()
        };
        let input = RawModelInput {
            resource_id: Some(association.id),
            ..Default::default()
        };

        let outcome = svc
            .analyze(
                &RequestContext::new(actor, acme, 1),
                request(input, instructions),
            )
            .await
            .unwrap();

        let id = outcome.saved_record_id().unwrap();
        let saved = store.results.get(id).await.unwrap().unwrap();
        assert_eq!(saved.documents, Some(association.id));
        assert_eq!(saved.client_id, ACME_CLIENT);
        assert_eq!(saved.name.as_deref(), Some("reading"));
        assert_eq!(saved.description.as_deref(), Some("first pass"));
        assert_eq!(saved.input["text_reference"], "passage");
        assert_eq!(saved.output, outcome.output);
        assert_eq!(saved.audit.effective_user, 10);
    }

    #[tokio::test]
    async fn test_save_without_tenant_is_denied() {
        let store = MemoryStore::new();
        let svc = service(&store, MockModel::new(), MockRuntime::new());
        let actor = Actor::new(1, "alice").with_permission(PERM_ADD_ANALYSIS_RESULTS);
        let instructions = ProcessingInstructions {
            save_results: true,
            analysis_name: Some("run".to_string()),
            ..Default::default()
        };

        let outcome = svc
            .analyze(&ctx(actor), request(text("a", "b"), instructions))
            .await
            .unwrap();
        let denial = outcome.denial().unwrap();
        assert_eq!(denial.kind(), ErrorKind::Authorization);
        assert!(denial.to_string().contains("no tenant"));
    }

    #[tokio::test]
    async fn test_blank_descriptor_is_a_validation_error() {
        let store = MemoryStore::new();
        let model = MockModel::new();
        let runtime = MockRuntime::new();
        let svc = service(&store, model.clone(), runtime.clone());
        let mut req = request(text("a", "b"), Default::default());
        req.model_descriptor = ModelDescriptor::new("mock", "  ");

        let err = svc
            .analyze(&ctx(Actor::new(1, "alice")), req)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(runtime.init_call_count(), 0);
        assert_eq!(model.analyze_call_count(), 0);
    }

    #[test]
    fn test_persistence_status_serialization() {
        assert_eq!(
            serde_json::to_value(PersistenceStatus::Saved(4)).unwrap(),
            json!({"status": "saved", "detail": 4})
        );
        assert_eq!(
            serde_json::to_value(PersistenceStatus::NotRequested).unwrap(),
            json!({"status": "not_requested"})
        );
        assert_eq!(
            serde_json::to_value(PersistenceStatus::Denied(Error::Forbidden(
                "User alice has no tenant".to_string()
            )))
            .unwrap(),
            json!({"status": "denied", "detail": "Forbidden: User alice has no tenant"})
        );
    }
}
