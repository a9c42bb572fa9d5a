//! Language model access for MediBridge.
//!
//! This crate provides the [`ChatModel`] gateway, an OpenAI-compatible client,
//! the prompts for the three per-turn calls (reply, extraction, ranking) and
//! typed parsing of their structured output.

pub mod extraction;
pub mod gateway;
pub mod openai;
pub mod prompts;
pub mod schema;
pub mod scripted;

pub use extraction::*;
pub use gateway::*;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use prompts::*;
pub use schema::*;
pub use scripted::{RecordedRequest, ScriptedModel};
