pub mod issue_tracker;
pub mod knowledge_base;
pub mod language_model;

pub use issue_tracker::IssueTrackerService;
pub use knowledge_base::KnowledgeBaseService;
pub use language_model::LanguageModelService;
