use std::time::Instant;

use pressroom_core::AiProvider;
use serde::Serialize;

use crate::error::AiError;
use crate::generator::{ContentGenerator, TokenUsage};
use crate::parse::{parse_generated_article, GeneratedArticle};
use crate::prompt::{build_prompt, GenerationRequest};

/// A generated article plus where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutput {
    pub article: GeneratedArticle,
    pub provider: AiProvider,
    pub model: String,
    pub usage: Option<TokenUsage>,
    pub elapsed_ms: u64,
}

/// Builds the prompt, calls `generator`, and parses the result.
///
/// # Errors
///
/// Returns [`AiError::InvalidRequest`] for a blank topic, any provider
/// error from [`ContentGenerator::complete`], or [`AiError::Parse`] when the
/// output holds no usable article.
pub async fn generate_article(
    generator: &dyn ContentGenerator,
    request: &GenerationRequest,
) -> Result<GenerationOutput, AiError> {
    let prompt = build_prompt(request)?;
    let started = Instant::now();

    let completion = generator.complete(&prompt).await?;
    let article = parse_generated_article(&completion.text).inspect_err(|e| {
        tracing::warn!(
            provider = %generator.provider(),
            model = generator.model(),
            error = %e,
            output_chars = completion.text.len(),
            "model output did not contain an article"
        );
    })?;

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::info!(
        provider = %generator.provider(),
        model = generator.model(),
        elapsed_ms,
        title = %article.title,
        "generated article"
    );

    Ok(GenerationOutput {
        article,
        provider: generator.provider(),
        model: generator.model().to_owned(),
        usage: completion.usage,
        elapsed_ms,
    })
}
