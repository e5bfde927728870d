use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::{
    Client, RequestBuilder, Response,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::AppConfig;
use crate::domain::ticket::{Ticket, Transition, find_transition};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

const SEARCH_PAGE_SIZE: &str = "50";

pub struct JiraClient {
    http: Client,
    base_url: String,
    email: String,
    token: String,
    project_key: String,
    todo_status: String,
    status_field_id: String,
}

impl JiraClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|err| AppError::TicketingTransport(format!("failed to build client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.jira_base_url.trim_end_matches('/').to_string(),
            email: config.jira_email.clone(),
            token: config.jira_api_token.clone(),
            project_key: config.project_key.clone(),
            todo_status: config.todo_status.clone(),
            status_field_id: config.status_field_id.clone(),
        })
    }

    fn api_endpoint(&self, path: &str) -> String {
        format!("{}/rest/api/3/{path}", self.base_url)
    }

    fn issue_endpoint(&self, issue_key: &str, resource: &str) -> String {
        self.api_endpoint(&format!("issue/{issue_key}/{resource}"))
    }

    /// JQL date literals are read in the API user's profile zone, so the bound is
    /// rendered relative to `now` in whole minutes, rounded up.
    fn candidate_jql(&self, since: DateTime<FixedOffset>, now: DateTime<Utc>) -> String {
        format!(
            "project = {} AND assignee is EMPTY AND status = {} AND statusCategory != Done \
             AND updated >= \"-{}m\" ORDER BY created ASC",
            quote_jql(&self.project_key),
            quote_jql(&self.todo_status),
            minutes_since(since, now),
        )
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<Response> {
        let response = request
            .header(AUTHORIZATION, basic_auth_header(&self.email, &self.token))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| AppError::TicketingTransport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::TicketingApi {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(|err| AppError::Decode {
            service: "Jira",
            detail: err.to_string(),
        })
    }
}

#[async_trait]
impl IssueTrackerService for JiraClient {
    async fn search_candidates(&self, since: DateTime<FixedOffset>) -> AppResult<Vec<Ticket>> {
        let jql = self.candidate_jql(since, Utc::now());
        let fields = format!(
            "summary,description,status,assignee,{}",
            self.status_field_id
        );
        debug!(%jql, "searching for candidate issues");

        let mut tickets = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let request = {
                let mut query = vec![
                    ("jql", jql.as_str()),
                    ("fields", fields.as_str()),
                    ("maxResults", SEARCH_PAGE_SIZE),
                ];
                if let Some(token) = page_token.as_deref() {
                    query.push(("nextPageToken", token));
                }
                self.http.get(self.api_endpoint("search/jql")).query(&query)
            };
            let page: JiraSearchResponse = self.send_json(request).await?;
            tickets.extend(
                page.issues
                    .into_iter()
                    .map(|issue| issue.into_ticket(&self.status_field_id)),
            );

            match page.next_page_token {
                Some(token) if !page.is_last && page_token.as_deref() != Some(token.as_str()) => {
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        Ok(tickets)
    }

    async fn add_comment(&self, issue_key: &str, body: &str) -> AppResult<()> {
        let payload = JiraCommentRequest {
            body: JiraDocument::from_text(body),
        };
        let request = self
            .http
            .post(self.issue_endpoint(issue_key, "comment"))
            .json(&payload);
        self.send(request).await?;
        Ok(())
    }

    async fn assign_issue(&self, issue_key: &str, account_id: &str) -> AppResult<()> {
        let request = self
            .http
            .put(self.issue_endpoint(issue_key, "assignee"))
            .json(&JiraAssigneeRequest { account_id });
        self.send(request).await?;
        Ok(())
    }

    async fn list_transitions(&self, issue_key: &str) -> AppResult<Vec<Transition>> {
        let request = self.http.get(self.issue_endpoint(issue_key, "transitions"));
        let payload: JiraTransitionsResponse = self.send_json(request).await?;
        Ok(payload
            .transitions
            .into_iter()
            .map(|transition| Transition {
                id: transition.id,
                name: transition.name,
            })
            .collect())
    }

    async fn transition_issue(&self, issue_key: &str, transition_name: &str) -> AppResult<()> {
        let transitions = self.list_transitions(issue_key).await?;
        let transition = find_transition(&transitions, transition_name).ok_or_else(|| {
            AppError::TransitionNotFound {
                issue: issue_key.to_string(),
                transition: transition_name.to_string(),
            }
        })?;

        let request = self
            .http
            .post(self.issue_endpoint(issue_key, "transitions"))
            .json(&JiraTransitionRequest {
                transition: JiraTransitionRef {
                    id: &transition.id,
                },
            });
        self.send(request).await?;
        Ok(())
    }
}

pub(crate) fn basic_auth_header(email: &str, token: &str) -> String {
    let credentials = format!("{email}:{token}");
    let encoded = BASE64_STANDARD.encode(credentials);
    format!("Basic {encoded}")
}

fn minutes_since(since: DateTime<FixedOffset>, now: DateTime<Utc>) -> i64 {
    let elapsed = now.signed_duration_since(since).num_seconds().max(0);
    (elapsed + 59) / 60
}

fn quote_jql(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraSearchResponse {
    #[serde(default)]
    issues: Vec<JiraIssue>,
    next_page_token: Option<String>,
    #[serde(default)]
    is_last: bool,
}

#[derive(Deserialize)]
struct JiraIssue {
    #[serde(default)]
    key: String,
    #[serde(default)]
    fields: JiraIssueFields,
}

impl JiraIssue {
    fn into_ticket(self, status_field_id: &str) -> Ticket {
        let mut fields = self.fields;
        let status_detail = fields
            .custom
            .remove(status_field_id)
            .as_ref()
            .and_then(field_display_value);
        Ticket {
            key: self.key,
            summary: fields.summary,
            description: fields.description.as_ref().and_then(flatten_document),
            status: fields.status.map(|status| status.name),
            assignee: fields
                .assignee
                .and_then(|user| user.display_name.or(user.account_id)),
            status_detail,
        }
    }
}

#[derive(Deserialize, Default)]
struct JiraIssueFields {
    summary: Option<String>,
    description: Option<Value>,
    status: Option<JiraStatus>,
    assignee: Option<JiraUser>,
    #[serde(flatten)]
    custom: Map<String, Value>,
}

// Select-list custom fields carry `value`; status-like objects carry `name`.
fn field_display_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(object) => object
            .get("value")
            .or_else(|| object.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[derive(Deserialize)]
struct JiraStatus {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraUser {
    account_id: Option<String>,
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct JiraTransitionsResponse {
    #[serde(default)]
    transitions: Vec<JiraTransition>,
}

#[derive(Deserialize)]
struct JiraTransition {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct JiraTransitionRequest<'a> {
    transition: JiraTransitionRef<'a>,
}

#[derive(Serialize)]
struct JiraTransitionRef<'a> {
    id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JiraAssigneeRequest<'a> {
    account_id: &'a str,
}

#[derive(Serialize)]
struct JiraCommentRequest {
    body: JiraDocument,
}

/// Atlassian Document Format body; one paragraph per blank-line separated block.
#[derive(Serialize)]
struct JiraDocument {
    #[serde(rename = "type")]
    doc_type: &'static str,
    version: u8,
    content: Vec<JiraDocNode>,
}

impl JiraDocument {
    fn from_text(text: &str) -> Self {
        let cleaned = text.replace('\r', "");
        let content = cleaned
            .split("\n\n")
            .map(|section| section.trim())
            .filter(|section| !section.is_empty())
            .map(|section| {
                let paragraph_text = section
                    .lines()
                    .map(str::trim)
                    .collect::<Vec<_>>()
                    .join(" ");
                JiraDocNode::paragraph(paragraph_text)
            })
            .collect();

        Self {
            doc_type: "doc",
            version: 1,
            content,
        }
    }
}

#[derive(Serialize)]
struct JiraDocNode {
    #[serde(rename = "type")]
    node_type: &'static str,
    content: Vec<JiraDocText>,
}

impl JiraDocNode {
    fn paragraph(text: String) -> Self {
        Self {
            node_type: "paragraph",
            content: vec![JiraDocText::text(text)],
        }
    }
}

#[derive(Serialize)]
struct JiraDocText {
    #[serde(rename = "type")]
    text_type: &'static str,
    text: String,
}

impl JiraDocText {
    fn text(text: String) -> Self {
        Self {
            text_type: "text",
            text,
        }
    }
}

/// Plain text of a description, which is an ADF document on v3 and a string on older sites.
fn flatten_document(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Object(node) => {
            let mut out = String::new();
            collect_text(node, &mut out);
            out.trim().to_string()
        }
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn collect_text(node: &Map<String, Value>, out: &mut String) {
    let node_type = node.get("type").and_then(Value::as_str).unwrap_or_default();
    match node_type {
        "hardBreak" => {
            out.push('\n');
            return;
        }
        "paragraph" | "heading" | "codeBlock" | "blockquote" | "listItem" | "rule" => {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
        }
        _ => {}
    }

    if let Some(text) = node.get("text").and_then(Value::as_str) {
        out.push_str(text);
    }
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children.iter().filter_map(Value::as_object) {
            collect_text(child, out);
        }
    }
}
