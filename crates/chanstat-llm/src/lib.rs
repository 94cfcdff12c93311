//! Chat-completion access and structured-payload recovery.
//!
//! [`ResilientExtractor`] pulls a JSON value out of free-form model output.
//! [`analyze_post`] and [`analyze_comments`] combine it with a [`ChatClient`]
//! to produce typed analyses of collected channel content.

pub mod analysis;
pub mod chat;
pub mod error;
pub mod extract;

pub use analysis::{
    analyze_comments, analyze_post, analyze_post_at, comments_prompt, post_prompt,
    CommentAnalysis, PostAnalysis,
};
pub use chat::{ChatClient, OpenAiCompatClient};
pub use error::LlmError;
pub use extract::{excerpt, ResilientExtractor};
