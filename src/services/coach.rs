// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI coach chat client.
//!
//! Talks to an OpenAI-compatible chat completions endpoint. The caller's
//! conversation is trimmed and prefixed with a system prompt describing the
//! user. Upstream failures never reach the client as errors; they get a
//! canned apology instead.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AppError;
use crate::models::{ActivityTotals, User};

/// Conversation window sent upstream (10 user/assistant turns).
pub const MAX_MESSAGES: usize = 20;
pub const MAX_MESSAGE_CHARS: usize = 50_000;

pub const FALLBACK_REPLY: &str =
    "Sorry, I couldn't process that right now. Please try again later.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TEMPERATURE: f64 = 0.6;
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Clone)]
pub struct CoachClient {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
}

impl CoachClient {
    pub fn new(api_url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            model,
            api_key,
        }
    }

    /// Reply to the conversation as the coach for `user`.
    pub async fn reply(&self, user: &User, messages: Vec<ChatMessage>) -> Result<String, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Unavailable("AI coach is not configured".to_string()))?;

        let mut conversation = vec![ChatMessage {
            role: "system".to_string(),
            content: system_prompt(user),
        }];
        conversation.extend(prepare_messages(messages)?);

        match self.complete(api_key, conversation).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                tracing::warn!(user_id = %user.user_id, error = %e, "AI coach request failed");
                Ok(FALLBACK_REPLY.to_string())
            }
        }
    }

    async fn complete(&self, api_key: &str, messages: Vec<ChatMessage>) -> anyhow::Result<String> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response: CompletionResponse = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("Completion response had no choices"))
    }
}

/// Validate roles and sizes, then keep the most recent messages.
pub fn prepare_messages(messages: Vec<ChatMessage>) -> Result<Vec<ChatMessage>, AppError> {
    if messages.is_empty() {
        return Err(AppError::BadRequest("messages cannot be empty".to_string()));
    }
    for message in &messages {
        if message.role != "user" && message.role != "assistant" {
            return Err(AppError::BadRequest(format!(
                "Unsupported message role: {}",
                message.role
            )));
        }
        if message.content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::BadRequest(format!(
                "Message exceeds {} characters",
                MAX_MESSAGE_CHARS
            )));
        }
    }

    let skip = messages.len().saturating_sub(MAX_MESSAGES);
    Ok(messages.into_iter().skip(skip).collect())
}

pub fn system_prompt(user: &User) -> String {
    let mut context = vec![format!("User name: {}", user.name)];
    if let Some(age) = user.age {
        context.push(format!("Age: {}", age));
    }
    if let Some(gender) = &user.gender {
        context.push(format!("Gender: {}", gender));
    }
    if !user.fitness_goals.is_empty() {
        context.push(format!("Goals: {}", user.fitness_goals.join(", ")));
    }

    let totals = ActivityTotals::from_logs(&user.tracked_activities);
    context.push(format!("Lifetime running km: {:.1}", totals.running_total_km));
    context.push(format!("Lifetime steps: {}", totals.steps_total));
    context.push(format!("Lifetime gym minutes: {}", totals.gym_time_total_minutes));

    format!(
        "You are a personal coach for sports, nutrition and gym training. \
         Reply in Arabic when the user's last message is mostly Arabic, otherwise in English. \
         For sports questions you may ask up to 2 clarifying questions before advising, \
         and always ask first when advice could be unsafe. \
         Keep answers clear and under 50 words; basic Markdown is fine.\n\n{}",
        context.join("\n")
    )
}
