//! Model provider integration for mangaweave.
//!
//! [`XaiClient`] speaks the OpenAI-compatible `/chat/completions` protocol
//! used by xAI (and by most hosted providers). It implements
//! [`MangaweaveDriver`](mangaweave_interface::MangaweaveDriver), sends page
//! images inline as base64 data URLs, retries transient failures with
//! exponential backoff and can throttle itself to a requests-per-minute quota.
//!
//! # Example
//!
//! ```no_run
//! use mangaweave_core::{GenerateRequest, Input, Message};
//! use mangaweave_interface::MangaweaveDriver;
//! use mangaweave_models::XaiClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = XaiClient::from_env("XAI_API_KEY", "https://api.x.ai/v1", "grok-4-fast-reasoning")?
//!     .with_requests_per_minute(Some(60));
//!
//! let request = GenerateRequest::builder()
//!     .messages(vec![Message::user(vec![Input::Text("Hello".to_string())])])
//!     .build()?;
//! let response = client.generate(&request).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod conversion;
mod dto;

pub use client::{RetryPolicy, XaiClient};
pub use conversion::{data_url, from_chat_response, to_chat_request};
pub use dto::{
    ChatCompletionRequest, ChatCompletionRequestBuilder, ChatCompletionResponse, ChatContent,
    ChatMessage, Choice, ContentPart, ImageUrl, ResponseMessage, Usage,
};
