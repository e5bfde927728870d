use std::sync::Arc;

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::domain::schedule::current_local_time;
use crate::error::AppResult;
use crate::infra::confluence::ConfluenceClient;
use crate::infra::jira::JiraClient;
use crate::infra::openai::OpenAiClient;
use crate::services::{KnowledgeBaseService, LanguageModelService};
use crate::workflow::auto_reply::{RunOptions, RunOutcome, run_auto_reply};

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Process tickets even when outside the configured reply window.
    #[arg(long)]
    pub ignore_window: bool,
    /// List matching tickets without replying, assigning or saving the watermark.
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(args: RunArgs) -> AppResult<()> {
    let config = AppConfig::from_env()?;
    let ctx = build_context(config)?;
    let now = current_local_time(ctx.config.timezone);

    let options = RunOptions {
        ignore_window: args.ignore_window,
        dry_run: args.dry_run,
    };

    match run_auto_reply(&ctx, now, options).await? {
        RunOutcome::OutsideWindow { now } => {
            println!("Outside reply window ({}). Exiting.", now.format("%H:%M"))
        }
        RunOutcome::NoCandidates => println!("No matching issues found."),
        RunOutcome::DryRun { since, candidates } => {
            println!(
                "{} issue(s) updated since {} would be processed.",
                candidates.len(),
                since.to_rfc3339()
            );
            for key in candidates {
                println!("  {key}");
            }
        }
        RunOutcome::Processed { processed, skipped } => {
            if skipped > 0 {
                println!("Processed {processed} issues ({skipped} skipped).");
            } else {
                println!("Processed {processed} issues.");
            }
        }
    }

    Ok(())
}

fn build_context(config: AppConfig) -> AppResult<AppContext> {
    let issue_tracker = Arc::new(JiraClient::new(&config)?);

    let language_model = OpenAiClient::from_config(&config)?
        .map(|client| Arc::new(client) as Arc<dyn LanguageModelService>);
    if language_model.is_none() {
        info!("OPENAI_API_KEY not set; using the template reply");
    }

    let knowledge_base = ConfluenceClient::from_config(&config)?
        .map(|client| Arc::new(client) as Arc<dyn KnowledgeBaseService>);
    if knowledge_base.is_some() && language_model.is_none() {
        info!("knowledge base enabled but unused without a language model");
    }

    Ok(AppContext::new(
        config,
        issue_tracker,
        language_model,
        knowledge_base,
    ))
}
