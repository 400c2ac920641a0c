//! The validate-and-retry loop around a driver.

use crate::{Generated, augment_prompt, corrective_prompt, extract_json};
use mangaweave_core::{GenerateRequest, ImageDetail, Input, MediaSource, Message};
use mangaweave_error::{GenerationError, GenerationErrorKind, MangaweaveResult};
use mangaweave_interface::MangaweaveDriver;
use mangaweave_schema::{Shape, validate};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Wraps a driver with prompt augmentation, extraction, validation and
/// corrective retries.
///
/// Each call is bounded by a timeout. A driver error or a timeout counts as
/// a failed attempt and the same prompt is sent again; a candidate that
/// fails validation is answered with a corrective prompt. The temperature
/// never changes between attempts.
///
/// # Examples
///
/// ```no_run
/// use mangaweave_generation::GenerationLoop;
/// use mangaweave_interface::MangaweaveDriver;
/// use mangaweave_schema::{FieldType, Shape};
///
/// async fn anchors<D: MangaweaveDriver>(driver: D) {
///     let shape = Shape::new("anchor_list")
///         .required("anchors", FieldType::list(FieldType::String));
///     let generation = GenerationLoop::new(driver).with_model("grok-4-fast-reasoning");
///     let outcome = generation
///         .generate_validated("List turning points.", &shape, 3, 0.3)
///         .await;
///     println!("{} after {} attempt(s)", outcome.payload(), outcome.attempts());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct GenerationLoop<D> {
    driver: D,
    model: Option<String>,
    system_prompt: Option<String>,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl<D: MangaweaveDriver> GenerationLoop<D> {
    /// Wrap a driver. Calls use the driver's default model until
    /// [`with_model`](Self::with_model) is set.
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            model: None,
            system_prompt: None,
            max_tokens: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Select the model sent with every request.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Prepend a system message to every request.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = (!prompt.trim().is_empty()).then_some(prompt);
        self
    }

    /// Cap the tokens generated per call.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The wrapped driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Model name sent with requests.
    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.driver.model_name())
    }

    /// Generate a record conforming to `shape` from a text prompt.
    pub async fn generate_validated(
        &self,
        prompt: &str,
        shape: &Shape,
        max_attempts: u32,
        temperature: f32,
    ) -> Generated {
        self.generate_validated_with_images(prompt, &[], shape, max_attempts, temperature)
            .await
    }

    /// Generate a record conforming to `shape` from a prompt plus images.
    ///
    /// The images accompany every attempt. A `max_attempts` of zero is
    /// treated as one, and a shape without required fields gets a single
    /// attempt.
    #[instrument(
        skip(self, prompt, images, shape),
        fields(
            shape = %shape.name(),
            model = %self.model_name(),
            images = images.len(),
        )
    )]
    pub async fn generate_validated_with_images(
        &self,
        prompt: &str,
        images: &[Input],
        shape: &Shape,
        max_attempts: u32,
        temperature: f32,
    ) -> Generated {
        let max_attempts = if shape.has_required_fields() {
            max_attempts.max(1)
        } else {
            1
        };
        let instruction = augment_prompt(prompt, shape);
        let mut current = instruction.clone();
        let mut errors = Vec::new();

        for attempt in 1..=max_attempts {
            let text = match self.call(&current, images, temperature).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "Generation call failed");
                    errors.push(e.to_string());
                    continue;
                }
            };

            let candidate = extract_json(&text);
            match validate(&candidate, shape) {
                Ok(payload) => {
                    debug!(attempt, "Candidate passed validation");
                    return Generated::Valid {
                        payload,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts,
                        violations = e.violations().len(),
                        "Candidate failed validation"
                    );
                    current = corrective_prompt(&instruction, &candidate, &e);
                    errors.push(e.listing());
                }
            }
        }

        warn!(
            attempts = max_attempts,
            last_error = errors.last().map(String::as_str).unwrap_or_default(),
            "Attempts exhausted, falling back to default payload"
        );
        Generated::Degraded {
            payload: shape.default_payload(),
            attempts: max_attempts,
            errors,
        }
    }

    /// Generate free text, retrying failed or empty calls.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationErrorKind::Exhausted`] when no attempt produced text.
    #[instrument(skip(self, prompt), fields(model = %self.model_name()))]
    pub async fn generate_text(
        &self,
        prompt: &str,
        max_attempts: u32,
        temperature: f32,
    ) -> MangaweaveResult<String> {
        let max_attempts = max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.call(prompt, &[], temperature).await {
                Ok(text) => return Ok(text.trim().to_string()),
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "Text generation failed");
                    last_error = e.to_string();
                }
            }
        }

        Err(GenerationError::new(GenerationErrorKind::Exhausted {
            attempts: max_attempts,
            last_error,
        })
        .into())
    }

    /// Ask a short question about a single image, in one attempt.
    pub async fn classify_image(
        &self,
        prompt: &str,
        image: Vec<u8>,
        mime: &str,
        detail: ImageDetail,
    ) -> MangaweaveResult<String> {
        let input = Input::Image {
            mime: Some(mime.to_string()),
            source: MediaSource::Binary(image),
            detail,
        };
        self.call(prompt, std::slice::from_ref(&input), 0.0).await
    }

    async fn call(&self, prompt: &str, images: &[Input], temperature: f32) -> MangaweaveResult<String> {
        let mut content = Vec::with_capacity(images.len() + 1);
        content.push(Input::Text(prompt.to_string()));
        content.extend(images.iter().cloned());

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(Message::system(system.clone()));
        }
        messages.push(Message::user(content));

        let request = GenerateRequest::builder()
            .messages(messages)
            .temperature(temperature)
            .max_tokens(self.max_tokens)
            .model(self.model.clone())
            .build()
            .map_err(|e| {
                GenerationError::new(GenerationErrorKind::Driver(format!(
                    "Failed to build request: {}",
                    e
                )))
            })?;

        let response = tokio::time::timeout(self.timeout, self.driver.generate(&request))
            .await
            .map_err(|_| GenerationError::new(GenerationErrorKind::Timeout(self.timeout.as_secs())))??;

        let text = response.text();
        if text.trim().is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::EmptyResponse(
                self.driver.provider_name().to_string(),
            ))
            .into());
        }
        Ok(text)
    }
}
