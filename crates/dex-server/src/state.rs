use std::sync::Arc;

use crate::config::FirehoseSettings;
use crate::orchestrator::ResourceService;
use crate::shield::ProjectService;
use crate::siren::AlertService;

#[derive(Clone)]
pub struct AppState {
    pub resources: Arc<dyn ResourceService>,
    pub projects: Arc<dyn ProjectService>,
    pub alerts: Arc<dyn AlertService>,
    pub settings: Arc<FirehoseSettings>,
}

impl AppState {
    pub fn new(
        resources: Arc<dyn ResourceService>,
        projects: Arc<dyn ProjectService>,
        alerts: Arc<dyn AlertService>,
        settings: FirehoseSettings,
    ) -> Self {
        Self {
            resources,
            projects,
            alerts,
            settings: Arc::new(settings),
        }
    }
}
