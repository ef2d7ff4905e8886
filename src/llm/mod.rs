//! LLM-backed submission review
//!
//! This module handles:
//! - Talking to the AI endpoint (Ollama or OpenAI-compatible)
//! - Building the review prompt for a submission
//! - Parsing the model's reply into a structured verdict

mod client;
mod prompts;
mod verdict;

pub use client::{Completer, LlmClient, LlmConfig, LlmResponse, MockLlmClient};
pub use prompts::ReviewPrompt;
pub use verdict::{clamp_confidence, parse_verdict, ReviewVerdict, Verdict};
