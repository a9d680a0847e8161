//! Application state for the merit list server

use std::sync::Arc;

use crate::config::MeritConfig;
use crate::error::Result;
use crate::ingestion::IngestPipeline;
use crate::matching::{ApplicantMatcher, ApplicantService};
use crate::merit::{MeritAnalytics, MeritListExporter, MeritListQuery};
use crate::providers::{RecordStoreProvider, SqliteRecordStore};
use crate::storage::CollectionRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: MeritConfig,
    store: Arc<dyn RecordStoreProvider>,
    registry: Arc<CollectionRegistry>,
    pipeline: IngestPipeline,
    matcher: ApplicantMatcher,
    applicants: ApplicantService,
    query: Arc<MeritListQuery>,
    exporter: MeritListExporter,
    analytics: MeritAnalytics,
}

impl AppState {
    /// Open the configured database and wire up the services
    pub async fn new(config: MeritConfig) -> Result<Self> {
        tracing::info!(
            "Opening record store at {}",
            config.storage.database_path.display()
        );
        let store = Arc::new(SqliteRecordStore::open(&config.storage.database_path)?);
        Self::with_store(config, store)
    }

    /// Build state over an existing store
    pub fn with_store(config: MeritConfig, store: Arc<dyn RecordStoreProvider>) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(CollectionRegistry::new(Arc::clone(&store)));
        let pipeline =
            IngestPipeline::new(Arc::clone(&registry), &config.pipeline, &config.storage.upload_dir);
        Self::assemble(config, store, registry, pipeline)
    }

    /// Build state with a custom ingestion pipeline
    pub fn with_pipeline(
        config: MeritConfig,
        registry: Arc<CollectionRegistry>,
        pipeline: IngestPipeline,
    ) -> Result<Self> {
        config.validate()?;
        let store = Arc::clone(registry.store());
        Self::assemble(config, store, registry, pipeline)
    }

    fn assemble(
        config: MeritConfig,
        store: Arc<dyn RecordStoreProvider>,
        registry: Arc<CollectionRegistry>,
        pipeline: IngestPipeline,
    ) -> Result<Self> {
        let matcher = ApplicantMatcher::new(Arc::clone(&registry), config.matcher.clone());
        let applicants = ApplicantService::new(Arc::clone(&store));
        let query = Arc::new(MeritListQuery::new(Arc::clone(&registry)));
        let exporter = MeritListExporter::new(Arc::clone(&query));
        let analytics = MeritAnalytics::new(Arc::clone(&registry), config.analytics.clone())?;

        tracing::info!(
            "Services ready (store: {}, unique entries enforced: {})",
            store.name(),
            config.matcher.enforce_unique_entries
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                registry,
                pipeline,
                matcher,
                applicants,
                query,
                exporter,
                analytics,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &MeritConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<dyn RecordStoreProvider> {
        &self.inner.store
    }

    pub fn registry(&self) -> &Arc<CollectionRegistry> {
        &self.inner.registry
    }

    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    pub fn matcher(&self) -> &ApplicantMatcher {
        &self.inner.matcher
    }

    pub fn applicants(&self) -> &ApplicantService {
        &self.inner.applicants
    }

    pub fn query(&self) -> &MeritListQuery {
        &self.inner.query
    }

    pub fn exporter(&self) -> &MeritListExporter {
        &self.inner.exporter
    }

    pub fn analytics(&self) -> &MeritAnalytics {
        &self.inner.analytics
    }

    /// Whether the record store answers
    pub async fn is_ready(&self) -> bool {
        match self.inner.store.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::warn!("Store health check failed: {}", e);
                false
            }
        }
    }
}
