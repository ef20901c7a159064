//! The injected prompt-to-text capability.

use async_trait::async_trait;

pub use crate::error::BoxError;

/// A function turning one prompt string into one completion string.
///
/// Any `Fn(&str) -> Result<String, E>` closure qualifies. Implement the trait
/// directly when the generation step itself needs to await.
#[async_trait]
pub trait TextGenerationFunction: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> std::result::Result<String, BoxError>;
}

#[async_trait]
impl<F, E> TextGenerationFunction for F
where
    F: Fn(&str) -> std::result::Result<String, E> + Send + Sync,
    E: Into<BoxError> + 'static,
{
    async fn generate_text(&self, prompt: &str) -> std::result::Result<String, BoxError> {
        (self)(prompt).map_err(Into::into)
    }
}

/// Adapter for closures that cannot fail.
pub struct InfallibleFn<F>(F);

/// Wrap a plain `Fn(&str) -> String`.
pub fn infallible<F>(f: F) -> InfallibleFn<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    InfallibleFn(f)
}

#[async_trait]
impl<F> TextGenerationFunction for InfallibleFn<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    async fn generate_text(&self, prompt: &str) -> std::result::Result<String, BoxError> {
        Ok((self.0)(prompt))
    }
}
