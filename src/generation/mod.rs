//! Structured generation
//!
//! This module turns prompt templates into schema-conformant JSON:
//! - `StructuredGenerator` trait (prompt + system instruction + schema in, JSON out)
//! - Gemini REST adapter
//! - Fixed prompt templates and schemas for session plans and insights
//! - Typed decoding of generator output

mod client;
mod gemini;
pub mod prompts;

pub use client::{generate_object, GenerationRequest, StructuredGenerator};
pub use gemini::GeminiClient;
