pub mod anthropic;
pub mod base;
pub mod configs;
pub mod deepseek;
pub mod factory;
pub mod groq;
pub mod mock;
pub mod openai;
pub mod openrouter;
pub mod sse;
pub mod utils;
