//! Test utilities for mangaweave_models tests.

pub mod stub_server;

#[allow(unused_imports)]
pub use stub_server::{StubResponse, StubServer, completion_body};

use mangaweave_core::{GenerateRequest, Input, Message};

/// Single-message text request.
#[allow(dead_code)]
pub fn text_request(prompt: &str) -> GenerateRequest {
    GenerateRequest::builder()
        .messages(vec![Message::user(vec![Input::Text(prompt.to_string())])])
        .max_tokens(Some(16))
        .build()
        .expect("Failed to build test request")
}
