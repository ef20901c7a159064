//! Adapter turning a user-supplied generation function into a [`TextGenerator`].

use super::function::TextGenerationFunction;
use super::TextGenerator;
use crate::cache::{CacheConfig, CacheKeyGenerator, CacheManager, MemoryCache};
use crate::tokens::{CharacterEstimator, TokenCounter};
use crate::types::{GenerationConfig, GenerationResponse, Message, Prompt};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_PROVIDER: &str = "custom";

const DEFAULT_MEMORY_ENTRIES: usize = 1024;

/// Render a conversation as a single prompt.
///
/// System messages contribute `content\n`; every other role contributes
/// `role: content\n`. An empty slice renders as the empty string.
pub fn format_messages(messages: &[Message]) -> String {
    let mut prompt = String::new();
    for message in messages {
        if !message.is_system() {
            prompt.push_str(&message.role);
            prompt.push_str(": ");
        }
        prompt.push_str(&message.content);
        prompt.push('\n');
    }
    prompt
}

/// Wraps a [`TextGenerationFunction`] with formatting, caching and token counting.
///
/// The generator holds no per-call state. The cache is shared through an
/// `Arc`, so clones of the same manager can back several generators.
pub struct CustomGenerator {
    provider: String,
    function: Box<dyn TextGenerationFunction>,
    cache: Arc<CacheManager>,
    keys: CacheKeyGenerator,
    counter: Arc<dyn TokenCounter>,
}

impl CustomGenerator {
    /// Generator with the `"custom"` provider label, an in-memory cache and
    /// the character-based token estimator.
    pub fn new(function: impl TextGenerationFunction + 'static) -> Self {
        Self::builder(function).build()
    }

    pub fn builder(function: impl TextGenerationFunction + 'static) -> CustomGeneratorBuilder {
        CustomGeneratorBuilder::new(Box::new(function))
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    /// See [`format_messages`].
    pub fn format_messages(&self, messages: &[Message]) -> String {
        format_messages(messages)
    }

    /// The exact string handed to the generation function.
    ///
    /// Text prompts are taken as already formatted.
    pub fn render_prompt(&self, prompt: &Prompt) -> String {
        match prompt {
            Prompt::Text(text) => text.clone(),
            Prompt::Messages(messages) => format_messages(messages),
        }
    }
}

#[async_trait]
impl TextGenerator for CustomGenerator {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn generate(
        &self,
        prompt: &Prompt,
        config: &GenerationConfig,
    ) -> Result<GenerationResponse> {
        let rendered = self.render_prompt(prompt);

        let key = if config.use_cache {
            let key = self.keys.generate(&rendered, config)?;
            if let Some(cached) = self.cache.get::<GenerationResponse>(&key).await? {
                debug!(provider = %self.provider, key = %key, "cache hit");
                return Ok(cached);
            }
            debug!(provider = %self.provider, key = %key, "cache miss");
            Some(key)
        } else {
            None
        };

        let output = self
            .function
            .generate_text(&rendered)
            .await
            .map_err(|e| Error::generation(self.provider.clone(), e))?;

        let response = GenerationResponse::from_raw(output);

        if let Some(key) = key {
            self.cache.set(&key, &response).await?;
            debug!(provider = %self.provider, key = %key, "stored response");
        }

        Ok(response)
    }

    fn count_tokens(&self, prompt: &Prompt) -> usize {
        self.counter.count_prompt(prompt)
    }
}

/// Builder for [`CustomGenerator`].
pub struct CustomGeneratorBuilder {
    function: Box<dyn TextGenerationFunction>,
    provider: String,
    cache: Option<Arc<CacheManager>>,
    keys: CacheKeyGenerator,
    counter: Option<Arc<dyn TokenCounter>>,
}

impl CustomGeneratorBuilder {
    fn new(function: Box<dyn TextGenerationFunction>) -> Self {
        Self {
            function,
            provider: DEFAULT_PROVIDER.to_string(),
            cache: None,
            keys: CacheKeyGenerator::new(),
            counter: None,
        }
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn key_generator(mut self, keys: CacheKeyGenerator) -> Self {
        self.keys = keys;
        self
    }

    pub fn token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    pub fn build(self) -> CustomGenerator {
        let provider = self.provider;
        let cache = self.cache.unwrap_or_else(|| {
            Arc::new(CacheManager::new(
                CacheConfig::new().with_key_prefix(provider.clone()),
                Box::new(MemoryCache::new(DEFAULT_MEMORY_ENTRIES)),
            ))
        });
        info!(
            provider = %provider,
            cache_backend = cache.backend_name(),
            "custom text generator ready"
        );
        CustomGenerator {
            provider,
            function: self.function,
            cache,
            keys: self.keys,
            counter: self
                .counter
                .unwrap_or_else(|| Arc::new(CharacterEstimator::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_messages_prefixes_non_system_roles() {
        let msgs = vec![
            Message::system("Be brief."),
            Message::user("hi"),
            Message::assistant("hello"),
            Message::new("tool", "42"),
        ];
        assert_eq!(
            format_messages(&msgs),
            "Be brief.\nuser: hi\nassistant: hello\ntool: 42\n"
        );
    }

    #[test]
    fn test_format_messages_empty() {
        assert_eq!(format_messages(&[]), "");
    }

    #[test]
    fn test_format_messages_one_line_per_message() {
        let msgs: Vec<Message> = (0..5).map(|i| Message::user(format!("m{}", i))).collect();
        let out = format_messages(&msgs);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[3], "user: m3");
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_role_matching_is_exact() {
        assert_eq!(format_messages(&[Message::new("System", "x")]), "System: x\n");
    }

    #[test]
    fn test_text_prompt_is_not_reformatted() {
        let g = CustomGenerator::new(crate::generator::infallible(|p: &str| p.to_string()));
        assert_eq!(g.render_prompt(&Prompt::from("raw\nprompt")), "raw\nprompt");
        assert_eq!(g.provider(), DEFAULT_PROVIDER);
    }
}
