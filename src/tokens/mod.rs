//! Token 计数模块：为生成器提供可替换的 Token 统计实现。
//!
//! # Token Counting Module
//!
//! Generators delegate `count_tokens` to a [`TokenCounter`]. Plain text is
//! counted directly; message sequences add a fixed per-message overhead plus
//! reply-priming tokens.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`TokenCounter`] | Trait for token counting implementations |
//! | [`CharacterEstimator`] | Character-based approximation (4 chars ≈ 1 token) |
//! | [`CachingCounter`] | Wrapper that memoizes counts |
//!
//! ```rust
//! use ai_lib_textgen::tokens::{CharacterEstimator, TokenCounter};
//!
//! let counter = CharacterEstimator::new();
//! assert_eq!(counter.count("Hello, how are you?"), 5);
//! ```

mod counter;

pub use counter::{
    CachingCounter, CharacterEstimator, TokenCounter, REPLY_PRIMING_TOKENS, TOKENS_PER_MESSAGE,
};
