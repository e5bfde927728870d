use tracing::{debug, warn};

use crate::context::AppContext;
use crate::domain::ticket::{KnowledgeArticle, Ticket};
use crate::error::{AppError, AppResult};

/// Reply used when no language model is configured.
pub fn default_reply(ticket: &Ticket) -> String {
    let summary = ticket.summary.as_deref().unwrap_or("your ticket");
    format!(
        "Thanks for reaching out! We received **{summary}**. \
         Our team will review this shortly and respond with next steps."
    )
}

pub fn build_prompt(ticket: &Ticket, articles: &[KnowledgeArticle]) -> String {
    let mut prompt = format!(
        "You are an assistant for support tickets. Draft a concise, friendly auto-reply \
         acknowledging the ticket and asking for any missing info. Keep it under 80 words.\n\n\
         Summary: {}\n\
         Description: {}",
        ticket.summary.as_deref().unwrap_or_default(),
        ticket.description.as_deref().unwrap_or_default(),
    );

    if !articles.is_empty() {
        prompt.push_str(
            "\n\nRelevant knowledge base articles (link one if it answers the question):",
        );
        for article in articles {
            prompt.push_str(&format!("\n- {}", article.title));
            if !article.excerpt.is_empty() {
                prompt.push_str(&format!(": {}", article.excerpt));
            }
            if let Some(url) = &article.url {
                prompt.push_str(&format!(" ({url})"));
            }
        }
    }

    prompt
}

pub async fn generate_reply(ctx: &AppContext, ticket: &Ticket) -> AppResult<String> {
    let Some(language_model) = &ctx.language_model else {
        return Ok(default_reply(ticket));
    };

    let articles = related_articles(ctx, ticket).await;
    let prompt = build_prompt(ticket, &articles);
    let reply = language_model.complete(&prompt).await?;

    if reply.trim().is_empty() {
        return Err(AppError::GenerationApi(
            "language model returned an empty reply".to_string(),
        ));
    }
    Ok(reply)
}

// Lookup failures are logged and yield no articles.
async fn related_articles(ctx: &AppContext, ticket: &Ticket) -> Vec<KnowledgeArticle> {
    let (Some(knowledge_base), Some(summary)) = (&ctx.knowledge_base, &ticket.summary) else {
        return Vec::new();
    };

    match knowledge_base.related_articles(summary).await {
        Ok(articles) => {
            debug!(issue = %ticket.key, count = articles.len(), "found knowledge base articles");
            articles
        }
        Err(err) => {
            warn!(issue = %ticket.key, error = %err, "knowledge base lookup failed");
            Vec::new()
        }
    }
}
