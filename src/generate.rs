use crate::config::{GeneratorConfig, Provider};
use crate::error::ServiceError;
use crate::image::ImageError;
use base64::Engine;
use image::ImageFormat;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

const COHERE_CHAT_URL: &str = "https://api.cohere.com/v2/chat";
const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Longest error body kept in a [ServiceError::Status]
const MAX_ERROR_BODY: usize = 500;

/// An image sent along with the prompt
#[derive(Debug, Clone, PartialEq)]
pub struct PromptImage {
    pub media_type: &'static str,
    pub data: Vec<u8>,
}

impl PromptImage {
    /// Wrap uploaded image bytes. PNG, JPEG, GIF and WebP are sent as they are;
    /// anything else is converted to PNG first.
    pub fn from_bytes(bytes: &[u8]) -> Result<PromptImage, ImageError> {
        let format = image::guess_format(bytes)?;
        let media_type = match format {
            ImageFormat::Png => Some("image/png"),
            ImageFormat::Jpeg => Some("image/jpeg"),
            ImageFormat::Gif => Some("image/gif"),
            ImageFormat::WebP => Some("image/webp"),
            _ => None,
        };

        match media_type {
            Some(media_type) => Ok(PromptImage {
                media_type,
                data: bytes.to_vec(),
            }),
            None => {
                let decoded = image::load_from_memory_with_format(bytes, format)?;
                let mut png = Cursor::new(Vec::new());
                decoded.write_to(&mut png, ImageFormat::Png)?;
                Ok(PromptImage {
                    media_type: "image/png",
                    data: png.into_inner(),
                })
            }
        }
    }

    fn base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// What the generation service is asked to write
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Name of the newsletter, e.g. "Dahlia Wood"
    pub publication: String,
    /// Text of the previous issue, used as the style reference
    pub style_reference: String,
    /// Free-form description of the events to cover
    pub events: String,
    pub images: Vec<PromptImage>,
    /// The issue's month, e.g. "October 2026"
    pub month: String,
}

/// Anything that can turn a [GenerationRequest] into newsletter copy
pub trait TextGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ServiceError>;
}

/// The current month and year, as written in the newsletter ("October 2026")
pub fn current_month() -> String {
    chrono::Local::now().format("%B %Y").to_string()
}

/// The prompt sent to every provider
pub fn build_prompt(request: &GenerationRequest) -> String {
    let mut prompt = format!(
        "You are writing a new issue of the {publication} newsletter, keeping the style and \
         structure of the publication.\n\n\
         An example issue of the newsletter:\n{style}\n\n\
         Events to include in the new issue:\n{events}\n\n\
         Instructions:\n\
         1. Update every reference to the publication month or date to {month}.\n\
         2. Keep the tone, style and structure of the example issue.\n\
         3. Keep any headers, footers and section titles.\n\
         4. Build the new content around the events above, written in the style of the example.\n\
         5. Keep all branding elements and formatting consistent.\n\
         6. Do not repeat the events of the previous month.\n",
        publication = request.publication,
        style = request.style_reference.trim(),
        events = request.events.trim(),
        month = request.month,
    );
    if !request.images.is_empty() {
        prompt.push_str(&format!(
            "7. The {} attached images will be printed in the issue; mention what they show \
             where it fits.\n",
            request.images.len()
        ));
    }
    prompt.push_str(
        "\nWrite the new month's newsletter content following these instructions. Separate \
         paragraphs with a blank line.",
    );
    prompt
}

/// Build the generator the configuration asks for
pub fn from_config(config: GeneratorConfig) -> Result<Box<dyn TextGenerator>, ServiceError> {
    let client = Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(ServiceError::Network)?;

    Ok(match config.provider {
        Provider::Cohere => Box::new(CohereGenerator { config, client }),
        Provider::Anthropic => Box::new(AnthropicGenerator { config, client }),
    })
}

/// Cohere chat API client
pub struct CohereGenerator {
    config: GeneratorConfig,
    client: Client,
}

#[derive(Serialize)]
struct CohereChat<'a> {
    model: &'a str,
    messages: [CohereMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct CohereMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl TextGenerator for CohereGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ServiceError> {
        if !request.images.is_empty() {
            log::warn!(
                "cohere does not take images; {} images are left out of the prompt",
                request.images.len()
            );
        }

        let prompt = build_prompt(request);
        let body = CohereChat {
            model: &self.config.model,
            messages: [CohereMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        send(
            self.client
                .post(COHERE_CHAT_URL)
                .bearer_auth(&self.config.api_key)
                .json(&body),
        )
    }
}

/// Anthropic messages API client
pub struct AnthropicGenerator {
    config: GeneratorConfig,
    client: Client,
}

#[derive(Serialize)]
struct AnthropicMessages<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [AnthropicMessage<'a>; 1],
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: Vec<AnthropicBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicBlock<'a> {
    Image { source: ImageSource },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: String,
}

impl AnthropicGenerator {
    fn body<'a>(&'a self, request: &GenerationRequest, prompt: &'a str) -> AnthropicMessages<'a> {
        let mut content: Vec<AnthropicBlock> = request
            .images
            .iter()
            .map(|image| AnthropicBlock::Image {
                source: ImageSource {
                    kind: "base64",
                    media_type: image.media_type,
                    data: image.base64(),
                },
            })
            .collect();
        content.push(AnthropicBlock::Text { text: prompt });

        AnthropicMessages {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: [AnthropicMessage {
                role: "user",
                content,
            }],
        }
    }
}

impl TextGenerator for AnthropicGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ServiceError> {
        let prompt = build_prompt(request);
        let body = self.body(request, &prompt);

        send(
            self.client
                .post(ANTHROPIC_MESSAGES_URL)
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body),
        )
    }
}

fn send(request: RequestBuilder) -> Result<String, ServiceError> {
    let response = request.send().map_err(ServiceError::Network)?;
    let status = response.status().as_u16();
    let body = response.text().map_err(ServiceError::Network)?;
    log::debug!("generation service answered HTTP {status} with {} bytes", body.len());

    let body = check_status(status, body)?;
    normalize_response(&body)
}

fn check_status(status: u16, body: String) -> Result<String, ServiceError> {
    match status {
        200..=299 => Ok(body),
        401 | 403 => Err(ServiceError::Auth { status }),
        429 => Err(ServiceError::RateLimited),
        _ => Err(ServiceError::Status {
            status,
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        }),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GenerationResponse {
    /// Anthropic messages, `{"content": [...]}`
    Messages { content: Vec<ContentBlock> },
    /// Cohere v2 chat, `{"message": {"content": [...]}}`
    Chat { message: ChatMessage },
    /// Cohere generate, `{"generations": [{"text": ...}]}`
    Generations { generations: Vec<Generation> },
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct Generation {
    text: String,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Pull the generated text out of a service response: the first textual
/// content block, whichever of the known response shapes the body has.
pub fn normalize_response(body: &str) -> Result<String, ServiceError> {
    let response: GenerationResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;

    let text = match response {
        GenerationResponse::Messages { content }
        | GenerationResponse::Chat {
            message: ChatMessage { content },
        } => content.into_iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        }),
        GenerationResponse::Generations { generations } => {
            generations.into_iter().next().map(|g| g.text)
        }
    };

    text.map(|t| t.trim().to_string())
        .ok_or_else(|| ServiceError::MalformedResponse("no text content block".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            publication: "Dahlia Wood".into(),
            style_reference: "Dahlia Wood News - September 2026\n\nThe fete raised £400.".into(),
            events: "Pumpkin carving on the 31st".into(),
            images: vec![],
            month: "October 2026".into(),
        }
    }

    #[test]
    fn prompt_carries_the_reference_events_and_month() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("Dahlia Wood newsletter"));
        assert!(prompt.contains("The fete raised £400."));
        assert!(prompt.contains("Pumpkin carving on the 31st"));
        assert!(prompt.contains("month or date to October 2026"));
        assert!(!prompt.contains("attached images"));
    }

    #[test]
    fn prompt_mentions_attached_images() {
        let mut request = request();
        request.images.push(PromptImage {
            media_type: "image/png",
            data: vec![1, 2, 3],
        });
        assert!(build_prompt(&request).contains("The 1 attached images"));
    }

    #[test]
    fn normalizes_every_known_shape() {
        let messages = r#"{"id":"msg_1","content":[{"type":"thinking","thinking":"..."},{"type":"text","text":"  October news\n\nMore  "}]}"#;
        assert_eq!(normalize_response(messages).unwrap(), "October news\n\nMore");

        let chat = r#"{"message":{"role":"assistant","content":[{"type":"text","text":"From chat"}]},"finish_reason":"COMPLETE"}"#;
        assert_eq!(normalize_response(chat).unwrap(), "From chat");

        let legacy = r#"{"generations":[{"id":"1","text":"From generate"},{"id":"2","text":"ignored"}]}"#;
        assert_eq!(normalize_response(legacy).unwrap(), "From generate");
    }

    #[test]
    fn malformed_responses_are_reported() {
        for body in [
            "not json",
            r#"{"unexpected":true}"#,
            r#"{"content":[{"type":"tool_use","id":"x"}]}"#,
            r#"{"generations":[]}"#,
        ] {
            assert!(
                matches!(normalize_response(body), Err(ServiceError::MalformedResponse(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn maps_http_statuses() {
        assert_eq!(check_status(200, "ok".into()).unwrap(), "ok");
        assert!(matches!(check_status(401, String::new()), Err(ServiceError::Auth { status: 401 })));
        assert!(matches!(check_status(429, String::new()), Err(ServiceError::RateLimited)));
        match check_status(500, "x".repeat(2000)) {
            Err(ServiceError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), MAX_ERROR_BODY);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn anthropic_body_puts_images_before_the_prompt() {
        let config = GeneratorConfig::new(Provider::Anthropic, Some("key".into())).unwrap();
        let generator = AnthropicGenerator {
            config,
            client: Client::new(),
        };
        let mut request = request();
        request.images.push(PromptImage {
            media_type: "image/jpeg",
            data: b"jpeg".to_vec(),
        });

        let body = serde_json::to_value(generator.body(&request, "prompt")).unwrap();
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["type"], "base64");
        assert_eq!(content[0]["source"]["media_type"], "image/jpeg");
        assert_eq!(content[0]["source"]["data"], "anBlZw==");
        assert_eq!(content[1], serde_json::json!({"type": "text", "text": "prompt"}));
        assert_eq!(body["max_tokens"], 2048);
    }

    #[test]
    fn prompt_images_keep_supported_formats() {
        let png = crate::image::tests::fixture(4, 4, image::ImageOutputFormat::Png);
        let image = PromptImage::from_bytes(&png).unwrap();
        assert_eq!(image.media_type, "image/png");
        assert_eq!(image.data, png);

        let bmp = crate::image::tests::fixture(4, 4, image::ImageOutputFormat::Bmp);
        let converted = PromptImage::from_bytes(&bmp).unwrap();
        assert_eq!(converted.media_type, "image/png");
        assert!(converted.data.starts_with(b"\x89PNG"));
    }
}
