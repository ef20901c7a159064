//! 类型系统模块：定义文本生成适配器使用的核心数据类型。
//!
//! # Types Module
//!
//! Plain records shared by every generator: conversation messages, the
//! per-request configuration and the response envelope.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Role/content pair |
//! | [`Prompt`] | Pre-formatted text or a message sequence |
//! | [`GenerationConfig`] | Sampling options plus the `use_cache` switch |
//! | [`GenerationResponse`] | Messages, logprobs, usage and config |
//!
//! ## Example
//!
//! ```rust
//! use ai_lib_textgen::types::{Message, Prompt};
//!
//! let prompt: Prompt = vec![
//!     Message::system("You are terse."),
//!     Message::user("hi"),
//! ]
//! .into();
//! assert!(!prompt.is_empty());
//! ```

pub mod config;
pub mod message;
pub mod response;

pub use config::GenerationConfig;
pub use message::{Message, Prompt, SYSTEM_ROLE};
pub use response::{GenerationResponse, JsonMap};
