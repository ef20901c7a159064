//! 生成器模块：统一的文本生成接口与自定义函数适配器。
//!
//! # Generator Module
//!
//! [`TextGenerator`] is the uniform surface every adapter implements.
//! [`CustomGenerator`] adapts any [`TextGenerationFunction`] to it, adding
//! prompt formatting, response caching and token counting.
//!
//! ## Example
//!
//! ```rust
//! use ai_lib_textgen::generator::{infallible, CustomGenerator, TextGenerator};
//! use ai_lib_textgen::types::{GenerationConfig, Message, Prompt};
//!
//! # tokio_test::block_on(async {
//! let generator = CustomGenerator::new(infallible(|p: &str| p.to_uppercase()));
//! let prompt = Prompt::from(vec![Message::user("hi")]);
//! let response = generator.generate(&prompt, &GenerationConfig::default()).await?;
//! assert_eq!(response.first_text(), Some("USER: HI\n"));
//! # Ok::<(), ai_lib_textgen::Error>(())
//! # }).unwrap();
//! ```

mod custom;
mod function;

pub use custom::{format_messages, CustomGenerator, CustomGeneratorBuilder, DEFAULT_PROVIDER};
pub use function::{infallible, BoxError, InfallibleFn, TextGenerationFunction};

use crate::types::{GenerationConfig, GenerationResponse, Prompt};
use crate::Result;
use async_trait::async_trait;

/// Uniform interface shared by every text-generation adapter.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Label identifying the backend that produced responses.
    fn provider(&self) -> &str;

    async fn generate(&self, prompt: &Prompt, config: &GenerationConfig)
        -> Result<GenerationResponse>;

    /// `generate` with [`GenerationConfig::default`].
    async fn generate_default(&self, prompt: &Prompt) -> Result<GenerationResponse> {
        self.generate(prompt, &GenerationConfig::default()).await
    }

    fn count_tokens(&self, prompt: &Prompt) -> usize;
}
