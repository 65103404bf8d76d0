//! Drains a fragment stream and checks that the result is usable text.

use futures::StreamExt;
use moodlift_ollama::FragmentStream;

use crate::error::GenerationError;

/// Concatenate every fragment in order and validate the result.
///
/// Stream errors abort accumulation and are returned as-is.
pub async fn accumulate(
    mut stream: FragmentStream,
    min_chars: usize,
) -> Result<String, GenerationError> {
    let mut content = String::new();
    let mut fragments = 0usize;

    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        content.push_str(&fragment.text);
        fragments += 1;
        if fragment.done {
            break;
        }
    }

    tracing::debug!(fragments, chars = content.len(), "stream drained");
    validate_content(content, min_chars)
}

/// Reject blank or suspiciously short text. Returns the text untrimmed.
pub fn validate_content(content: String, min_chars: usize) -> Result<String, GenerationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    let chars = trimmed.chars().count();
    if chars < min_chars {
        return Err(GenerationError::InterruptedGeneration { chars });
    }

    Ok(content)
}
