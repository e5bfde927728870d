use async_trait::async_trait;

use crate::domain::ticket::KnowledgeArticle;
use crate::error::AppResult;

#[async_trait]
pub trait KnowledgeBaseService: Send + Sync {
    async fn related_articles(&self, query: &str) -> AppResult<Vec<KnowledgeArticle>>;
}
