//! # Syllabus RAG Core
//!
//! Pipeline logic for Syllabus RAG: data models, chunking, embedding
//! orchestration, store traits, knowledge-base builds, retrieval-augmented
//! answering, and interaction analytics.
//!
//! This crate performs no network, filesystem, or database I/O of its own.
//! Every external service is reached through a trait ([`embedding::Embedder`],
//! [`generation::Generator`], [`store::VectorStore`], [`store::DocumentStore`],
//! [`store::InteractionLog`]) whose handles are passed in at construction.

pub mod analytics;
pub mod builder;
pub mod chunk;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod models;
pub mod responder;
pub mod store;

pub use error::{RagError, Result};
