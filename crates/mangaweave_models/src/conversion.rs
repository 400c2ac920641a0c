//! Conversion between mangaweave requests and chat completions bodies.

use crate::dto::{
    ChatCompletionRequest, ChatCompletionRequestBuilder, ChatCompletionResponse, ChatContent,
    ChatMessage, ContentPart, ImageUrl,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mangaweave_core::{GenerateRequest, GenerateResponse, Input, MediaSource, Message, Output, Role};
use mangaweave_error::{ModelsError, ModelsErrorKind};
use tracing::debug;

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Inline `data:` URL for an image source; URLs pass through unchanged.
///
/// ```
/// use mangaweave_core::MediaSource;
/// use mangaweave_models::data_url;
///
/// let url = data_url(Some("image/png"), &MediaSource::Binary(vec![1, 2, 3]));
/// assert_eq!(url, "data:image/png;base64,AQID");
/// ```
pub fn data_url(mime: Option<&str>, source: &MediaSource) -> String {
    let mime = mime.unwrap_or(DEFAULT_IMAGE_MIME);
    match source {
        MediaSource::Url(url) => url.clone(),
        MediaSource::Base64(encoded) => format!("data:{};base64,{}", mime, encoded),
        MediaSource::Binary(bytes) => format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn to_chat_message(message: &Message) -> ChatMessage {
    let role = role_name(message.role).to_string();
    let has_images = message.content.iter().any(Input::is_image);

    let content = if has_images {
        ChatContent::Parts(
            message
                .content
                .iter()
                .map(|input| match input {
                    Input::Text(text) => ContentPart::Text { text: text.clone() },
                    Input::Image {
                        mime,
                        source,
                        detail,
                    } => ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_url(mime.as_deref(), source),
                            detail: Some(detail.to_string()),
                        },
                    },
                })
                .collect(),
        )
    } else {
        ChatContent::Text(
            message
                .content
                .iter()
                .filter_map(|input| match input {
                    Input::Text(text) => Some(text.as_str()),
                    Input::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        )
    };

    ChatMessage { role, content }
}

/// Build the request body, using `default_model` when the request names none.
///
/// # Errors
///
/// `ModelsErrorKind::Builder` when the body cannot be assembled.
pub fn to_chat_request(
    request: &GenerateRequest,
    default_model: &str,
) -> Result<ChatCompletionRequest, ModelsError> {
    let model = request
        .model
        .clone()
        .unwrap_or_else(|| default_model.to_string());
    let messages: Vec<ChatMessage> = request.messages.iter().map(to_chat_message).collect();

    debug!(
        model = %model,
        messages = messages.len(),
        images = request.image_count(),
        "Built chat completion request"
    );

    ChatCompletionRequestBuilder::default()
        .model(model)
        .messages(messages)
        .max_tokens(request.max_tokens)
        .temperature(request.temperature)
        .build()
        .map_err(|e| ModelsError::new(ModelsErrorKind::Builder(e.to_string())))
}

/// Text of the first choice.
///
/// # Errors
///
/// `ModelsErrorKind::MalformedResponse` when the response carries no choice.
pub fn from_chat_response(response: ChatCompletionResponse) -> Result<GenerateResponse, ModelsError> {
    if let Some(usage) = &response.usage {
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Token usage"
        );
    }
    let choice = response.choices.into_iter().next().ok_or_else(|| {
        ModelsError::new(ModelsErrorKind::MalformedResponse(
            "No choices in response".to_string(),
        ))
    })?;

    Ok(GenerateResponse {
        outputs: vec![Output::Text(choice.message.content.unwrap_or_default())],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mangaweave_core::ImageDetail;
    use serde_json::json;

    fn request(messages: Vec<Message>) -> GenerateRequest {
        GenerateRequest::builder()
            .messages(messages)
            .temperature(0.2)
            .build()
            .unwrap()
    }

    #[test]
    fn test_text_only_request_uses_plain_content() {
        let req = request(vec![
            Message::system("Be terse."),
            Message::user(vec![Input::Text("Hello".to_string())]),
        ]);

        let body = serde_json::to_value(to_chat_request(&req, "grok-4-fast-reasoning").unwrap())
            .unwrap();

        assert_eq!(
            body,
            json!({
                "model": "grok-4-fast-reasoning",
                "messages": [
                    {"role": "system", "content": "Be terse."},
                    {"role": "user", "content": "Hello"},
                ],
                "temperature": 0.2f32,
            })
        );
    }

    #[test]
    fn test_images_become_data_url_parts() {
        let mut req = request(vec![Message::user(vec![
            Input::Text("Describe.".to_string()),
            Input::Image {
                mime: Some("image/webp".to_string()),
                source: MediaSource::Binary(b"RIFF".to_vec()),
                detail: ImageDetail::High,
            },
        ])]);
        req.model = Some("grok-vision".to_string());

        let body = serde_json::to_value(to_chat_request(&req, "grok-text").unwrap()).unwrap();

        assert_eq!(body["model"], "grok-vision");
        let parts = &body["messages"][0]["content"];
        assert_eq!(parts[0], json!({"type": "text", "text": "Describe."}));
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/webp;base64,UklGRg==");
        assert_eq!(parts[1]["image_url"]["detail"], "high");
    }

    #[test]
    fn test_data_url_defaults_and_passthrough() {
        assert_eq!(
            data_url(None, &MediaSource::Base64("AAAA".to_string())),
            "data:image/jpeg;base64,AAAA"
        );
        assert_eq!(
            data_url(Some("image/png"), &MediaSource::Url("https://x.test/p.png".to_string())),
            "https://x.test/p.png"
        );
    }

    #[test]
    fn test_response_first_choice_text() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "{\"a\": 1}"}, "finish_reason": "stop"},
                {"message": {"role": "assistant", "content": "ignored"}},
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3},
        }))
        .unwrap();

        assert_eq!(from_chat_response(response).unwrap().text(), "{\"a\": 1}");
    }

    #[test]
    fn test_response_without_choices_is_malformed() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        let err = from_chat_response(response).unwrap_err();
        assert!(matches!(err.kind, ModelsErrorKind::MalformedResponse(_)));
    }

    #[test]
    fn test_null_content_is_empty_text() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }))
        .unwrap();
        assert_eq!(from_chat_response(response).unwrap().text(), "");
    }
}
