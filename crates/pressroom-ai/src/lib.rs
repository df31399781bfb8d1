//! Article generation through OpenAI, Anthropic, and Gemini.

pub mod anthropic;
pub mod error;
pub mod gemini;
pub mod generate;
pub mod generator;
pub mod openai;
pub mod parse;
pub mod prompt;
pub mod registry;
pub(crate) mod retry;

pub use anthropic::AnthropicClient;
pub use error::AiError;
pub use gemini::GeminiClient;
pub use generate::{generate_article, GenerationOutput};
pub use generator::{ClientSettings, Completion, ContentGenerator, TokenUsage};
pub use openai::OpenAiClient;
pub use parse::{parse_generated_article, GeneratedArticle};
pub use prompt::{build_prompt, GenerationRequest, ProductContext, Prompt, Tone};
pub use registry::GeneratorRegistry;
