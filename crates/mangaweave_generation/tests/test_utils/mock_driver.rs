//! Scripted driver for exercising the generation loop.

use async_trait::async_trait;
use mangaweave_core::{GenerateRequest, GenerateResponse, Input, Output};
use mangaweave_error::{MangaweaveResult, ModelsError, ModelsErrorKind};
use mangaweave_interface::MangaweaveDriver;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this text
    Text(String),
    /// Fail the call
    Error(String),
    /// Sleep, then return this text
    Slow(Duration, String),
}

impl MockResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Replays a fixed sequence of replies, repeating the last one when the
/// script runs out, and records every request it receives.
#[derive(Clone)]
pub struct ScriptedDriver {
    script: Arc<Vec<MockResponse>>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl ScriptedDriver {
    pub fn new(script: Vec<MockResponse>) -> Self {
        assert!(!script.is_empty(), "script needs at least one reply");
        Self {
            script: Arc::new(script),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The user prompt text of each recorded request.
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| {
                r.messages
                    .last()
                    .and_then(|m| {
                        m.content.iter().find_map(|i| match i {
                            Input::Text(t) => Some(t.clone()),
                            _ => None,
                        })
                    })
                    .unwrap_or_default()
            })
            .collect()
    }
}

#[async_trait]
impl MangaweaveDriver for ScriptedDriver {
    async fn generate(&self, req: &GenerateRequest) -> MangaweaveResult<GenerateResponse> {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(req.clone());
            requests.len() - 1
        };
        let reply = self.script[index.min(self.script.len() - 1)].clone();

        match reply {
            MockResponse::Text(text) => Ok(GenerateResponse {
                outputs: vec![Output::Text(text)],
            }),
            MockResponse::Error(message) => {
                Err(ModelsError::new(ModelsErrorKind::Transport(message)))?
            }
            MockResponse::Slow(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(GenerateResponse {
                    outputs: vec![Output::Text(text)],
                })
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
