use credi_index::config::{AdviceConfig, LendingConfig};
use credi_index::error::AppError;
use credi_index::workflows::lending::{
    AdvicePipeline, ApplicationRecord, ApplicationRepository, AprModel, LendingService,
    RepositoryError, SessionId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

pub(crate) type SessionLendingService = LendingService<InMemoryApplicationRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) lending: Arc<SessionLendingService>,
}

/// Session store for the HTTP service; state lives for the lifetime of the process.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<SessionId, ApplicationRecord>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn save(
        &self,
        record: ApplicationRecord,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.insert(record.session_id.clone(), record))
    }

    fn fetch(&self, session: &SessionId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(session).cloned())
    }

    fn discard(&self, session: &SessionId) -> Result<bool, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.remove(session).is_some())
    }
}

impl InMemoryApplicationRepository {
    pub(crate) fn sessions(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

/// Lending service over a fresh in-memory store. `apr_override` takes precedence over the
/// configured APR model.
pub(crate) fn build_lending_service(
    config: &LendingConfig,
    apr_override: Option<AprModel>,
) -> Result<(Arc<SessionLendingService>, Arc<InMemoryApplicationRepository>), AppError> {
    let mut config = config.clone();
    if let Some(model) = apr_override {
        config.apr_model = model;
    }

    let policy = config.policy()?;
    let repository = Arc::new(InMemoryApplicationRepository::default());
    let service = Arc::new(LendingService::new(repository.clone(), policy));
    Ok((service, repository))
}

/// Hosted providers when keys are configured, the offline analyst otherwise.
pub(crate) fn advice_pipeline(config: &AdviceConfig) -> Arc<AdvicePipeline> {
    Arc::new(config.pipeline())
}

pub(crate) fn parse_apr_model(raw: &str) -> Result<AprModel, String> {
    raw.parse::<AprModel>()
}
