//! Model-backed analysis of collected posts and their comments.

use std::fmt::Write as _;

use chanstat_core::ContentRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::chat::ChatClient;
use crate::error::LlmError;
use crate::extract::{excerpt, ResilientExtractor};

/// Insights and recommendations for a single post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostAnalysis {
    #[serde(default)]
    pub insights: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub metrics: serde_json::Map<String, serde_json::Value>,
}

/// Audience reaction summarised from a set of comments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentAnalysis {
    #[serde(default)]
    pub tone: String,
    #[serde(default, alias = "thems")]
    pub themes: Vec<String>,
    #[serde(default)]
    pub key_moments: String,
}

/// Prompt asking for a [`PostAnalysis`] of `record`.
#[must_use]
pub fn post_prompt(record: &ContentRecord) -> String {
    let mut prompt = String::from(
        "Ты аналитик контент-стратегии. Проанализируй статистику публикации, \
         опирайся на цифры и дай практические рекомендации.\n\n",
    );
    let _ = writeln!(prompt, "- Заголовок: {}", record.title);
    let _ = writeln!(prompt, "- Тип: {}", record.content_type);
    let _ = writeln!(prompt, "- Просмотры: {}", record.counters.views);
    let _ = writeln!(prompt, "- Лайки: {}", record.counters.likes);
    let _ = writeln!(prompt, "- Репосты: {}", record.counters.shares);
    let _ = writeln!(prompt, "- Комментарии: {}", record.counters.comment_count);
    let _ = writeln!(
        prompt,
        "- Вовлечённость: {:.2}%",
        record.derived.engagement_rate_percent
    );
    let _ = writeln!(prompt, "- Теги: {}", record.tags_str());
    prompt.push_str(
        "\nОтветь только JSON-объектом:\n\
         {\"insights\": \"ключевые выводы\", \
         \"recommendations\": [\"рекомендация\"], \
         \"metrics\": {\"название_метрики\": значение}}",
    );
    prompt
}

/// Prompt asking for a [`CommentAnalysis`] of `comments`, one bullet each.
#[must_use]
pub fn comments_prompt(comments: &[String]) -> String {
    let mut prompt = String::from(
        "Ты анализируешь реакцию аудитории. Определи общий тон комментариев, \
         основные темы и ключевые моменты.\n\nКомментарии:\n",
    );
    for comment in comments {
        let _ = writeln!(prompt, "• {comment}");
    }
    prompt.push_str(
        "\nОтветь только JSON-объектом:\n\
         {\"tone\": \"общий тон\", \"themes\": [\"тема\"], \"key_moments\": \"ключевые моменты\"}",
    );
    prompt
}

/// Ask the model to analyse one post.
///
/// # Errors
///
/// Propagates [`ChatClient::complete`] errors, returns
/// [`LlmError::NoStructuredPayload`] when the response holds no JSON and
/// [`LlmError::UnexpectedShape`] when the JSON does not match [`PostAnalysis`].
pub async fn analyze_post<C>(chat: &C, record: &ContentRecord) -> Result<PostAnalysis, LlmError>
where
    C: ChatClient + ?Sized,
{
    tracing::info!(source_id = record.source_id, "analyzing post");
    let response = chat.complete(&post_prompt(record)).await?;
    decode_payload(&response, "post analysis")
}

/// [`analyze_post`] for the record at 0-based `index`.
///
/// # Errors
///
/// Returns [`LlmError::PostNotFound`] when `index` is out of range, otherwise
/// as [`analyze_post`].
pub async fn analyze_post_at<C>(
    chat: &C,
    records: &[ContentRecord],
    index: usize,
) -> Result<PostAnalysis, LlmError>
where
    C: ChatClient + ?Sized,
{
    let record = records.get(index).ok_or(LlmError::PostNotFound {
        index,
        available: records.len(),
    })?;
    analyze_post(chat, record).await
}

/// Ask the model to summarise audience reaction across `comments`.
///
/// # Errors
///
/// Returns [`LlmError::EmptyInput`] without calling the model when there are
/// no comments, otherwise as [`analyze_post`].
pub async fn analyze_comments<C>(chat: &C, comments: &[String]) -> Result<CommentAnalysis, LlmError>
where
    C: ChatClient + ?Sized,
{
    if comments.is_empty() {
        return Err(LlmError::EmptyInput("no comment texts were collected"));
    }
    tracing::info!(comments = comments.len(), "analyzing comments");
    let response = chat.complete(&comments_prompt(comments)).await?;
    decode_payload(&response, "comment analysis")
}

fn decode_payload<T: DeserializeOwned>(
    response: &str,
    context: &'static str,
) -> Result<T, LlmError> {
    let value = ResilientExtractor
        .extract(response)
        .ok_or_else(|| LlmError::NoStructuredPayload {
            excerpt: excerpt(response),
        })?;
    serde_json::from_value(value).map_err(|source| LlmError::UnexpectedShape { context, source })
}
