use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::domain::schedule::ReplyWindow;
use crate::error::{AppError, AppResult};

pub const DEFAULT_PROJECT_KEY: &str = "TS";
pub const DEFAULT_ASSIGNEE_FALLBACK: &str = "currentUser()";
pub const DEFAULT_STATUS_FIELD_ID: &str = "customfield_10353";
pub const DEFAULT_TODO_STATUS: &str = "To-Do";
pub const DEFAULT_TODO_TRANSITION: &str = "To-Do";
pub const DEFAULT_IN_PROGRESS_TRANSITION: &str = "Iprogress";
pub const DEFAULT_WAITING_TRANSITION: &str = "Wating for clinet";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_WINDOW_START: &str = "05:30";
pub const DEFAULT_WINDOW_END: &str = "17:30";
pub const DEFAULT_LAST_RUN_PATH: &str = "last_run.json";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Runtime settings for one invocation, resolved once from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jira_base_url: String,
    pub jira_email: String,
    pub jira_api_token: String,
    pub jira_assignee_account_id: String,
    pub project_key: String,
    pub assignee_fallback: String,
    pub status_field_id: String,
    pub todo_status: String,
    pub todo_transition: String,
    pub in_progress_transition: String,
    pub waiting_transition: String,
    pub use_confluence_kb: bool,
    pub confluence_base_url: String,
    pub confluence_space_key: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub timezone: Option<Tz>,
    pub window: ReplyWindow,
    pub last_run_path: PathBuf,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jira_base_url = required(&lookup, "JIRA_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let jira_email = required(&lookup, "JIRA_EMAIL")?;
        let jira_api_token = required(&lookup, "JIRA_API_TOKEN")?;
        let jira_assignee_account_id = required(&lookup, "JIRA_ASSIGNEE_ACCOUNT_ID")?;

        let project_key = optional(&lookup, "PROJECT_KEY", DEFAULT_PROJECT_KEY);

        let timezone = match non_empty(&lookup, "TIMEZONE") {
            Some(name) => Some(name.parse::<Tz>().map_err(|_| {
                AppError::Configuration(format!("Invalid timezone for TIMEZONE: {name}"))
            })?),
            None => None,
        };

        let window = ReplyWindow::new(
            parse_time_env(&lookup, "WINDOW_START", DEFAULT_WINDOW_START)?,
            parse_time_env(&lookup, "WINDOW_END", DEFAULT_WINDOW_END)?,
        );

        let http_timeout_secs = match non_empty(&lookup, "HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    AppError::Configuration(format!("Invalid value for HTTP_TIMEOUT_SECS: {raw}"))
                })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let confluence_base_url = non_empty(&lookup, "CONFLUENCE_BASE_URL")
            .unwrap_or_else(|| format!("{jira_base_url}/wiki"))
            .trim_end_matches('/')
            .to_string();
        let confluence_space_key = optional(&lookup, "CONFLUENCE_SPACE_KEY", &project_key);

        Ok(Self {
            jira_base_url,
            jira_email,
            jira_api_token,
            jira_assignee_account_id,
            assignee_fallback: optional(&lookup, "ASSIGNEE_FALLBACK", DEFAULT_ASSIGNEE_FALLBACK),
            status_field_id: optional(&lookup, "STATUS_FIELD_ID", DEFAULT_STATUS_FIELD_ID),
            todo_status: optional(&lookup, "TODO_STATUS", DEFAULT_TODO_STATUS),
            todo_transition: optional(
                &lookup,
                "STATUS_TRANSITION_TODO_TO_IN_PROGRESS",
                DEFAULT_TODO_TRANSITION,
            ),
            in_progress_transition: optional(
                &lookup,
                "STATUS_TRANSITION_IN_PROGRESS_TO_WAITING",
                DEFAULT_IN_PROGRESS_TRANSITION,
            ),
            waiting_transition: optional(
                &lookup,
                "STATUS_TRANSITION_WAITING_TO_IN_PROGRESS",
                DEFAULT_WAITING_TRANSITION,
            ),
            use_confluence_kb: lookup("USE_CONFLUENCE_KB")
                .is_some_and(|value| value.trim().eq_ignore_ascii_case("true")),
            confluence_base_url,
            confluence_space_key,
            openai_api_key: non_empty(&lookup, "OPENAI_API_KEY"),
            openai_model: optional(&lookup, "OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            openai_base_url: optional(&lookup, "OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            timezone,
            window,
            last_run_path: PathBuf::from(optional(
                &lookup,
                "LAST_RUN_PATH",
                DEFAULT_LAST_RUN_PATH,
            )),
            http_timeout: Duration::from_secs(http_timeout_secs),
            project_key,
        })
    }

    /// Transition names applied to every processed ticket, in order.
    pub fn transition_sequence(&self) -> [&str; 3] {
        [
            self.todo_transition.as_str(),
            self.in_progress_transition.as_str(),
            self.waiting_transition.as_str(),
        ]
    }
}

/// Reads `name` as an `HH:MM` time of day, falling back to `default_value` when unset.
pub fn parse_time_env<F>(lookup: &F, name: &str, default_value: &str) -> AppResult<NaiveTime>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name).unwrap_or_else(|| default_value.to_string());
    parse_time_of_day(name, &raw)
}

pub fn parse_time_of_day(name: &str, raw: &str) -> AppResult<NaiveTime> {
    let invalid = || AppError::Configuration(format!("Invalid time value for {name}: {raw}"));
    let (hours, minutes) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let hours = hours.trim().parse::<u32>().map_err(|_| invalid())?;
    let minutes = minutes.trim().parse::<u32>().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(invalid)
}

fn required<F>(lookup: &F, name: &str) -> AppResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, name).ok_or_else(|| {
        AppError::Configuration(format!("Missing required environment variable: {name}"))
    })
}

fn optional<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).unwrap_or_else(|| default.to_string())
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;

    pub(crate) fn base_env() -> HashMap<&'static str, String> {
        [
            ("JIRA_BASE_URL", "https://example.atlassian.net"),
            ("JIRA_EMAIL", "support@example.com"),
            ("JIRA_API_TOKEN", "token"),
            ("JIRA_ASSIGNEE_ACCOUNT_ID", "712020:abc"),
            ("PROJECT_KEY", "TS"),
            ("STATUS_TRANSITION_TODO_TO_IN_PROGRESS", "To-Do"),
            ("STATUS_TRANSITION_IN_PROGRESS_TO_WAITING", "Iprogress"),
            ("STATUS_TRANSITION_WAITING_TO_IN_PROGRESS", "Wating for clinet"),
            ("LAST_RUN_PATH", "last_run.json"),
        ]
        .into_iter()
        .map(|(key, value)| (key, value.to_string()))
        .collect()
    }

    pub(crate) fn load(env: &HashMap<&'static str, String>) -> AppResult<AppConfig> {
        AppConfig::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn loads_required_and_default_values() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.jira_assignee_account_id, "712020:abc");
        assert_eq!(config.project_key, "TS");
        assert_eq!(config.assignee_fallback, "currentUser()");
        assert_eq!(config.status_field_id, "customfield_10353");
        assert_eq!(config.todo_status, "To-Do");
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.timezone, None);
        assert!(!config.use_confluence_kb);
        assert_eq!(
            config.confluence_base_url,
            "https://example.atlassian.net/wiki"
        );
        assert_eq!(config.confluence_space_key, "TS");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(
            config.window,
            ReplyWindow::new(
                NaiveTime::from_hms_opt(5, 30, 0).unwrap(),
                NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
            )
        );
    }

    #[test]
    fn missing_required_variable_names_it() {
        let mut env = base_env();
        env.remove("JIRA_ASSIGNEE_ACCOUNT_ID");
        let err = load(&env).unwrap_err();
        match err {
            AppError::Configuration(message) => {
                assert!(message.contains("JIRA_ASSIGNEE_ACCOUNT_ID"), "got: {message}")
            }
            other => panic!("expected configuration error, got: {other:?}"),
        }
    }

    #[test]
    fn blank_required_variable_is_missing() {
        let mut env = base_env();
        env.insert("JIRA_API_TOKEN", "   ".to_string());
        assert!(matches!(load(&env), Err(AppError::Configuration(_))));
    }

    #[test]
    fn parses_time_env() {
        let env: HashMap<&str, String> = [("WINDOW_START", "06:15".to_string())].into();
        let lookup = |name: &str| env.get(name).cloned();
        let parsed = parse_time_env(&lookup, "WINDOW_START", "05:30").unwrap();
        assert_eq!(parsed, NaiveTime::from_hms_opt(6, 15, 0).unwrap());
    }

    #[test]
    fn time_env_falls_back_to_default() {
        let lookup = |_: &str| None;
        let parsed = parse_time_env(&lookup, "WINDOW_END", "17:30").unwrap();
        assert_eq!(parsed, NaiveTime::from_hms_opt(17, 30, 0).unwrap());
    }

    #[test]
    fn malformed_time_names_variable() {
        let mut env = base_env();
        env.insert("WINDOW_END", "not-a-time".to_string());
        let err = load(&env).unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: Invalid time value for WINDOW_END: not-a-time"
        );
    }

    #[test]
    fn out_of_range_time_is_rejected() {
        assert!(parse_time_of_day("WINDOW_START", "25:00").is_err());
        assert!(parse_time_of_day("WINDOW_START", "10:60").is_err());
    }

    #[test]
    fn parses_timezone_and_rejects_unknown() {
        let mut env = base_env();
        env.insert("TIMEZONE", "America/New_York".to_string());
        let config = load(&env).unwrap();
        assert_eq!(config.timezone, Some(chrono_tz::America::New_York));

        env.insert("TIMEZONE", "Mars/Olympus".to_string());
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("TIMEZONE"), "got: {err}");
    }

    #[test]
    fn reads_flags_and_trims_urls() {
        let mut env = base_env();
        env.insert("JIRA_BASE_URL", "https://example.atlassian.net/".to_string());
        env.insert("USE_CONFLUENCE_KB", "TRUE".to_string());
        env.insert("OPENAI_API_KEY", "sk-test".to_string());
        let config = load(&env).unwrap();
        assert_eq!(config.jira_base_url, "https://example.atlassian.net");
        assert!(config.use_confluence_kb);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn empty_openai_key_disables_generation() {
        let mut env = base_env();
        env.insert("OPENAI_API_KEY", String::new());
        assert_eq!(load(&env).unwrap().openai_api_key, None);
    }

    #[test]
    fn http_timeout_must_be_positive() {
        let mut env = base_env();
        env.insert("HTTP_TIMEOUT_SECS", "5".to_string());
        assert_eq!(load(&env).unwrap().http_timeout, Duration::from_secs(5));

        for raw in ["0", "-1", "soon"] {
            env.insert("HTTP_TIMEOUT_SECS", raw.to_string());
            let err = load(&env).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("configuration error: Invalid value for HTTP_TIMEOUT_SECS: {raw}")
            );
        }
    }

    #[test]
    fn transition_sequence_is_fixed_order() {
        let config = load(&base_env()).unwrap();
        assert_eq!(
            config.transition_sequence(),
            ["To-Do", "Iprogress", "Wating for clinet"]
        );
    }
}
