use clap::{Args, Subcommand};

use crate::config::AppConfig;
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show the resolved configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Show => run_show(),
    }
}

fn run_show() -> AppResult<()> {
    let cfg = AppConfig::from_env()?;
    for (label, value) in describe(&cfg) {
        println!("{label}: {value}");
    }
    Ok(())
}

fn describe(cfg: &AppConfig) -> Vec<(&'static str, String)> {
    vec![
        ("Jira base URL", cfg.jira_base_url.clone()),
        ("Jira email", cfg.jira_email.clone()),
        ("Jira API token", mask_secret(Some(&cfg.jira_api_token))),
        ("Assignee account ID", cfg.jira_assignee_account_id.clone()),
        ("Assignee fallback", cfg.assignee_fallback.clone()),
        ("Project key", cfg.project_key.clone()),
        ("Status field ID", cfg.status_field_id.clone()),
        ("To-do status", cfg.todo_status.clone()),
        ("Transitions", cfg.transition_sequence().join(" -> ")),
        ("Confluence KB", cfg.use_confluence_kb.to_string()),
        ("Confluence base URL", cfg.confluence_base_url.clone()),
        ("Confluence space", cfg.confluence_space_key.clone()),
        ("OpenAI API key", mask_secret(cfg.openai_api_key.as_deref())),
        ("OpenAI model", cfg.openai_model.clone()),
        ("OpenAI base URL", cfg.openai_base_url.clone()),
        (
            "Timezone",
            cfg.timezone
                .map(|tz| tz.name().to_string())
                .unwrap_or_else(|| "<system local>".to_string()),
        ),
        (
            "Reply window",
            format!(
                "{}-{}",
                cfg.window.start.format("%H:%M"),
                cfg.window.end.format("%H:%M")
            ),
        ),
        ("Last run file", cfg.last_run_path.display().to_string()),
        ("HTTP timeout", format!("{}s", cfg.http_timeout.as_secs())),
    ]
}

fn mask_secret(value: Option<&str>) -> String {
    match value {
        Some(token) if token.chars().count() > 6 => {
            let chars: Vec<char> = token.chars().collect();
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[chars.len() - 3..].iter().collect();
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}
