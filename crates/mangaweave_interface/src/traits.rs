//! Trait definitions for generation backends.

use async_trait::async_trait;
use mangaweave_core::{GenerateRequest, GenerateResponse};
use mangaweave_error::MangaweaveResult;
use std::sync::Arc;

/// Core trait that all generation backends must implement.
///
/// A request carrying only text is a plain completion; a request whose
/// user message also carries [`mangaweave_core::Input::Image`] entries is a
/// vision call. `GenerateRequest::model` picks the model when a provider
/// serves several.
#[async_trait]
pub trait MangaweaveDriver: Send + Sync {
    /// Generate model output given a multimodal request.
    async fn generate(&self, req: &GenerateRequest) -> MangaweaveResult<GenerateResponse>;

    /// Provider name (e.g., "xai", "openai").
    fn provider_name(&self) -> &'static str;

    /// Default model identifier.
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<D: MangaweaveDriver + ?Sized> MangaweaveDriver for Arc<D> {
    async fn generate(&self, req: &GenerateRequest) -> MangaweaveResult<GenerateResponse> {
        (**self).generate(req).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
