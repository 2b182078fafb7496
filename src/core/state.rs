use std::sync::Arc;

use crate::core::config::Settings;
use crate::services::catalog::{ExamCatalog, QuestionBank};

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    catalog: Arc<dyn ExamCatalog>,
    bank: Arc<dyn QuestionBank>,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        catalog: Arc<dyn ExamCatalog>,
        bank: Arc<dyn QuestionBank>,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, catalog, bank }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn catalog(&self) -> &dyn ExamCatalog {
        self.inner.catalog.as_ref()
    }

    pub(crate) fn bank(&self) -> &dyn QuestionBank {
        self.inner.bank.as_ref()
    }
}
