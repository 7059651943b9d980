//! These models represent the objects passed around by the agent
//!
//! There are a few related formats we need to interact with:
//! - openai-style messages/tools, sent between the agent and most LLM vendors
//! - anthropic messages/tools, which split the system prompt out of the thread
//! - tool execution requests, sent from the agent to registered tools
//!
//! These overlap but do not match exactly, so requests and responses are
//! immediately converted into the internal structs by each provider adapter.
pub mod message;
pub mod tool;
