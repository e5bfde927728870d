use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use tempfile::TempDir;

use crate::config::tests::{base_env, load};
use crate::context::AppContext;
use crate::domain::ticket::{KnowledgeArticle, Ticket, Transition, find_transition};
use crate::error::{AppError, AppResult};
use crate::services::{IssueTrackerService, KnowledgeBaseService, LanguageModelService};

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerCall {
    Search(DateTime<FixedOffset>),
    Comment { issue: String, body: String },
    Assign { issue: String, account_id: String },
    Transition { issue: String, name: String },
}

pub struct FakeIssueTracker {
    candidates: Vec<Ticket>,
    available: Vec<Transition>,
    calls: Mutex<Vec<TrackerCall>>,
}

impl FakeIssueTracker {
    pub fn new(candidates: Vec<Ticket>) -> Self {
        Self::with_transitions(candidates, &["To-Do", "Iprogress", "Wating for clinet"])
    }

    pub fn with_transitions(candidates: Vec<Ticket>, names: &[&str]) -> Self {
        let available = names
            .iter()
            .enumerate()
            .map(|(index, name)| Transition {
                id: (index + 11).to_string(),
                name: name.to_string(),
            })
            .collect();
        Self {
            candidates,
            available,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<TrackerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&TrackerCall) -> bool) -> usize {
        self.calls().iter().filter(|&call| predicate(call)).count()
    }

    fn record(&self, call: TrackerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl IssueTrackerService for FakeIssueTracker {
    async fn search_candidates(&self, since: DateTime<FixedOffset>) -> AppResult<Vec<Ticket>> {
        self.record(TrackerCall::Search(since));
        Ok(self.candidates.clone())
    }

    async fn add_comment(&self, issue_key: &str, body: &str) -> AppResult<()> {
        self.record(TrackerCall::Comment {
            issue: issue_key.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn assign_issue(&self, issue_key: &str, account_id: &str) -> AppResult<()> {
        self.record(TrackerCall::Assign {
            issue: issue_key.to_string(),
            account_id: account_id.to_string(),
        });
        Ok(())
    }

    async fn list_transitions(&self, _issue_key: &str) -> AppResult<Vec<Transition>> {
        Ok(self.available.clone())
    }

    async fn transition_issue(&self, issue_key: &str, transition_name: &str) -> AppResult<()> {
        let transitions = self.list_transitions(issue_key).await?;
        if find_transition(&transitions, transition_name).is_none() {
            return Err(AppError::TransitionNotFound {
                issue: issue_key.to_string(),
                transition: transition_name.to_string(),
            });
        }
        self.record(TrackerCall::Transition {
            issue: issue_key.to_string(),
            name: transition_name.to_string(),
        });
        Ok(())
    }
}

pub struct FakeLanguageModel {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeLanguageModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModelService for FakeLanguageModel {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| AppError::GenerationApi("OpenAI responded with 500".to_string()))
    }
}

pub struct FakeKnowledgeBase {
    articles: Option<Vec<KnowledgeArticle>>,
    queries: Mutex<Vec<String>>,
}

impl FakeKnowledgeBase {
    pub fn with_articles(articles: Vec<KnowledgeArticle>) -> Self {
        Self {
            articles: Some(articles),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            articles: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeBaseService for FakeKnowledgeBase {
    async fn related_articles(&self, query: &str) -> AppResult<Vec<KnowledgeArticle>> {
        self.queries.lock().unwrap().push(query.to_string());
        self.articles
            .clone()
            .ok_or_else(|| AppError::KnowledgeBase("Confluence responded with 500".to_string()))
    }
}

/// Context over fakes, with the watermark file inside a fresh temporary directory.
pub fn context_with(
    tracker: Arc<FakeIssueTracker>,
    language_model: Option<Arc<FakeLanguageModel>>,
    knowledge_base: Option<Arc<FakeKnowledgeBase>>,
) -> (AppContext, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut env = base_env();
    env.insert(
        "LAST_RUN_PATH",
        dir.path().join("last_run.json").display().to_string(),
    );
    let config = load(&env).unwrap();

    let language_model = language_model.map(|model| model as Arc<dyn LanguageModelService>);
    let knowledge_base = knowledge_base.map(|kb| kb as Arc<dyn KnowledgeBaseService>);
    let ctx = AppContext::new(config, tracker, language_model, knowledge_base);
    (ctx, dir)
}

pub fn context(
    language_model: Option<Arc<FakeLanguageModel>>,
    knowledge_base: Option<Arc<FakeKnowledgeBase>>,
) -> (AppContext, Arc<FakeIssueTracker>, TempDir) {
    let tracker = Arc::new(FakeIssueTracker::new(Vec::new()));
    let (ctx, dir) = context_with(tracker.clone(), language_model, knowledge_base);
    (ctx, tracker, dir)
}
