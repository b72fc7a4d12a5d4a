//! # Syllabus RAG
//!
//! Retrieval-augmented question answering over uploaded course material,
//! with per-user topic analytics.
//!
//! The pipeline itself (chunking, embedding orchestration, knowledge-base
//! build, answering, analytics) lives in [`syllabus_rag_core`]. This crate
//! supplies the concrete backends and the `srag` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Document  │──▶│ Chunk+Embed  │──▶│ Vector store │
//! │  (SQLite)  │   │  (builder)   │   │ SQLite/Pinecone
//! └────────────┘   └──────────────┘   └──────┬───────┘
//!                                            │ top-k
//!                  ┌──────────────┐   ┌──────▼───────┐
//!                  │  Analytics   │◀──│  Responder   │──▶ LLM
//!                  │   report     │   │ + interaction│
//!                  └──────────────┘   │     log      │
//!                                     └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! srag init
//! srag ingest ./week1.txt --title "Week 1"
//! srag ask "What is a derivative?" --user alice
//! srag report --user alice
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite document store, interaction log, vector store |
//! | [`embedding`] | OpenAI / Ollama embedders |
//! | [`generation`] | OpenAI / Ollama text generation |
//! | [`pinecone`] | Pinecone vector store |
//! | [`retry`] | Timeout and retry decorator |
//! | [`services`] | Component wiring from config |

pub mod ask;
pub mod config;
pub mod db;
pub mod embedding;
pub mod generation;
pub mod http;
pub mod kb;
pub mod logging;
pub mod migrate;
pub mod pinecone;
pub mod report;
pub mod retry;
pub mod services;
pub mod sqlite_store;
