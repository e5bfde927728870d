use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{IssueTrackerService, KnowledgeBaseService, LanguageModelService};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub issue_tracker: Arc<dyn IssueTrackerService>,
    /// Absent when no generation key is configured; replies then use the template.
    pub language_model: Option<Arc<dyn LanguageModelService>>,
    pub knowledge_base: Option<Arc<dyn KnowledgeBaseService>>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        issue_tracker: Arc<dyn IssueTrackerService>,
        language_model: Option<Arc<dyn LanguageModelService>>,
        knowledge_base: Option<Arc<dyn KnowledgeBaseService>>,
    ) -> Self {
        Self {
            config,
            issue_tracker,
            language_model,
            knowledge_base,
        }
    }
}
