//! # ai-lib-textgen
//!
//! 将任意"提示词 → 文本"函数适配为统一的文本生成接口。
//!
//! Adapt any prompt-to-text function into a uniform, cache-aware text generator.
//!
//! ## Overview
//!
//! A [`CustomGenerator`] takes a conversation (or a pre-formatted string),
//! renders it into one prompt, consults a response cache keyed by the prompt
//! and the full [`GenerationConfig`], calls the injected function on a miss and
//! wraps the result in a [`GenerationResponse`].
//!
//! ## Quick Start
//!
//! ```rust
//! use ai_lib_textgen::{CustomGenerator, GenerationConfig, Message, Prompt, TextGenerator};
//!
//! # tokio_test::block_on(async {
//! let generator = CustomGenerator::new(|prompt: &str| {
//!     Ok::<_, std::io::Error>(format!("echo: {}", prompt.trim_end()))
//! });
//!
//! let prompt = Prompt::from(vec![Message::user("hello")]);
//! let response = generator.generate(&prompt, &GenerationConfig::default()).await?;
//! assert_eq!(response.first_text(), Some("echo: user: hello"));
//! # Ok::<(), ai_lib_textgen::Error>(())
//! # }).unwrap();
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`generator`] | Generator trait and the custom-function adapter |
//! | [`types`] | Messages, prompts, config and response records |
//! | [`cache`] | Response caching with pluggable backends |
//! | [`tokens`] | Token counting |
//! | [`settings`] | YAML/env driven construction |

pub mod cache;
pub mod generator;
pub mod settings;
pub mod tokens;
pub mod types;

pub use generator::{CustomGenerator, TextGenerationFunction, TextGenerator};
pub use settings::GeneratorSettings;
pub use types::{GenerationConfig, GenerationResponse, Message, Prompt};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
