//! Inference backends for the analysis pipeline.
//!
//! The pipeline only depends on the [`InferenceClient`] trait: one prompt
//! in, one completion out. [`OllamaClient`] talks to a locally hosted
//! Ollama-compatible server; tests plug in their own implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use watch_analyst::ai::{InferenceClient, OllamaClient, OllamaConfig};
//!
//! let config = OllamaConfig::builder()
//!     .model("mistral")
//!     .base_url("http://localhost:11434")
//!     .build();
//! let client = OllamaClient::with_config(config)?;
//! let text = client.generate("Fasse diese Daten zusammen: ...")?;
//! ```

mod ollama;
mod provider;

pub use ollama::{OllamaClient, OllamaConfig, OllamaConfigBuilder};
pub use provider::InferenceClient;
