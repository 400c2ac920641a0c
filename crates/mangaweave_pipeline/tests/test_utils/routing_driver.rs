//! Prompt-routed driver for exercising pipeline stages.

use async_trait::async_trait;
use mangaweave_core::{GenerateRequest, GenerateResponse, Input, Output};
use mangaweave_error::{MangaweaveResult, ModelsError, ModelsErrorKind};
use mangaweave_interface::MangaweaveDriver;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Error(String),
}

/// Answers each request with the reply of the first route whose needle
/// occurs in the prompt, and records every request.
#[derive(Clone, Default)]
pub struct RoutingDriver {
    routes: Arc<Mutex<Vec<(String, Reply)>>>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl RoutingDriver {
    /// Driver answering every stage prompt with a valid reply.
    pub fn happy() -> Self {
        let driver = Self::default();
        driver.route("Chapter Title or large", "NO");
        driver.route(
            "expert manga analyst",
            r#"{"events": ["Mio finds the map"], "dialogues": ["Mio: Look!"],
                "visual_details": {"setting": "harbor", "atmosphere": "tense"},
                "page_summaries": [{"page_number": 1, "text": "Mio at the harbor"}]}"#,
        );
        driver.route(
            "refining an earlier interpretation",
            r#"{"chapter_id": "ignored", "events": ["Mio steals the map"], "dialogues": []}"#,
        );
        driver.route("light-novel writer", "Mio walked the harbor at dusk.");
        driver.route("concise ~300-word synopsis", "Mio took the map.");
        driver.route(
            "analyze an entire manga story",
            r#"{"chapters": [{"chapter_id": "ch_001", "chapter_number": 1,
                "summary": "The map", "chapter_intent": "Inciting incident"}]}"#,
        );
        driver.route(
            "You are a story analyst",
            r#"{"anchors": [{"anchor_id": "ch_001_a001", "chapter_id": "", "summary": "Mio takes the map",
                "characters": ["Mio"], "cause": "curiosity", "immediate_effect": "chase",
                "long_term_impact": "voyage", "importance_score": 4, "branching_potential": 4}]}"#,
        );
        driver.route(
            "Narrative Designer",
            r#"{"branches": [
                {"branch_type": "Behavioral", "what_if": "Mio leaves the map", "trigger_character": "Mio",
                 "short_effect": "No chase", "long_effect": "No voyage"},
                {"branch_type": "BadEnd", "what_if": "Mio is caught", "trigger_character": "Guard",
                 "short_effect": "Prison", "long_effect": "Despair"}]}"#,
        );
        driver.route(
            "character analyst",
            r#"{"characters": [
                {"character_id": "c0", "names": ["Mio"], "role": "protagonist"},
                {"character_id": "c1", "names": ["Guard"], "role": "antagonist"}]}"#,
        );
        driver.route(
            "content classifier",
            r#"{"erotism_score": 0, "romance_score": 1, "action_score": 3, "genre_labels": ["adventure"]}"#,
        );
        driver.route(
            "series editor",
            r#"{"chapter_purpose": "Mio sets sail", "acts": [
                {"act_id": 1, "page_range": "1-10", "objective": "Leave port"},
                {"act_id": 2, "page_range": "11-18", "objective": "Weather the storm"}]}"#,
        );
        driver.route(
            "simulating a Manga Chapter",
            r#"{"events": ["The ship leaves port"], "dialogues": ["Mio: Onward!"],
                "page_summaries": [{"page_number": 1, "text": "Deck at dawn"}]}"#,
        );
        driver.route(
            "summarizing the visuals",
            r#"{"setting": "open sea", "atmosphere": "hopeful"}"#,
        );
        driver
    }

    /// Add a route ahead of the existing ones.
    pub fn route(&self, needle: &str, reply: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(0, (needle.to_string(), Reply::Text(reply.to_string())));
    }

    /// Make prompts containing `needle` fail at the transport level.
    pub fn fail(&self, needle: &str, message: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(0, (needle.to_string(), Reply::Error(message.to_string())));
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Prompts of recorded requests that contain `needle`.
    pub fn prompts_with(&self, needle: &str) -> Vec<String> {
        self.requests()
            .iter()
            .map(prompt_of)
            .filter(|p| p.contains(needle))
            .collect()
    }
}

fn prompt_of(req: &GenerateRequest) -> String {
    req.messages
        .last()
        .and_then(|m| {
            m.content.iter().find_map(|i| match i {
                Input::Text(t) => Some(t.clone()),
                _ => None,
            })
        })
        .unwrap_or_default()
}

#[async_trait]
impl MangaweaveDriver for RoutingDriver {
    async fn generate(&self, req: &GenerateRequest) -> MangaweaveResult<GenerateResponse> {
        self.requests.lock().unwrap().push(req.clone());
        let prompt = prompt_of(req);
        let reply = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Reply::Error(format!("no route for prompt: {}", prompt)));

        match reply {
            Reply::Text(text) => Ok(GenerateResponse {
                outputs: vec![Output::Text(text)],
            }),
            Reply::Error(message) => {
                Err(ModelsError::new(ModelsErrorKind::Transport(message)))?
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
