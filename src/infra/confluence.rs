use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::domain::ticket::KnowledgeArticle;
use crate::error::{AppError, AppResult};
use crate::services::KnowledgeBaseService;

const ARTICLE_LIMIT: &str = "3";

/// CQL search over one Confluence space, authenticated with the Jira credentials.
pub struct ConfluenceClient {
    http: Client,
    base_url: String,
    auth_header: String,
    space_key: String,
}

impl ConfluenceClient {
    /// Returns `None` unless the knowledge base is enabled.
    pub fn from_config(config: &AppConfig) -> AppResult<Option<Self>> {
        if !config.use_confluence_kb {
            return Ok(None);
        }
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|err| AppError::KnowledgeBase(format!("failed to build client: {err}")))?;

        Ok(Some(Self {
            http,
            base_url: config.confluence_base_url.trim_end_matches('/').to_string(),
            auth_header: crate::infra::jira::basic_auth_header(
                &config.jira_email,
                &config.jira_api_token,
            ),
            space_key: config.confluence_space_key.clone(),
        }))
    }

    fn search_cql(&self, query: &str) -> String {
        format!(
            "space = \"{}\" AND type = page AND text ~ \"{}\"",
            escape_cql(&self.space_key),
            escape_cql(query)
        )
    }

    fn absolute_link(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            format!("{}{link}", self.base_url)
        }
    }
}

#[async_trait]
impl KnowledgeBaseService for ConfluenceClient {
    async fn related_articles(&self, query: &str) -> AppResult<Vec<KnowledgeArticle>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let cql = self.search_cql(query);
        let response = self
            .http
            .get(format!("{}/rest/api/search", self.base_url))
            .query(&[("cql", cql.as_str()), ("limit", ARTICLE_LIMIT)])
            .header(AUTHORIZATION, &self.auth_header)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| AppError::KnowledgeBase(format!("failed to call Confluence: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::KnowledgeBase(format!(
                "Confluence responded with {status}: {body}"
            )));
        }

        let payload: SearchResponse = response.json().await.map_err(|err| AppError::Decode {
            service: "Confluence",
            detail: err.to_string(),
        })?;

        Ok(payload
            .results
            .into_iter()
            .filter_map(|result| {
                let title = result
                    .title
                    .or_else(|| result.content.and_then(|content| content.title))?;
                Some(KnowledgeArticle {
                    title: strip_highlight(&title),
                    excerpt: strip_highlight(result.excerpt.as_deref().unwrap_or_default()),
                    url: result.url.as_deref().map(|link| self.absolute_link(link)),
                })
            })
            .collect())
    }
}

fn escape_cql(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
}

// Search excerpts wrap hits in @@@hl@@@ / @@@endhl@@@ markers.
fn strip_highlight(text: &str) -> String {
    text.replace("@@@hl@@@", "")
        .replace("@@@endhl@@@", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    title: Option<String>,
    excerpt: Option<String>,
    url: Option<String>,
    content: Option<SearchContent>,
}

#[derive(Deserialize)]
struct SearchContent {
    title: Option<String>,
}
