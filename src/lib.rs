//! Agentic Poster - headless core of the Agentic Media Poster
//!
//! Generates social content through an ordered list of LLM providers with
//! automatic fallback, and keeps connections to the five backend services
//! (tool orchestration, browser automation, analytics, social, activity).

pub mod api;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod services;
