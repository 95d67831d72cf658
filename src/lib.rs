//! Long-term semantic memory for conversational agents.
//!
//! recollect stores arbitrary text alongside a vector embedding and later
//! returns the stored texts most similar to a query. It is exposed to agents as
//! an [MCP](https://modelcontextprotocol.io/) server with two tools,
//! `memory_save` and `memory_query`.
//!
//! # Architecture
//!
//! - **Record store**: SQLite table of `(id, session, timestamp, text, vector)`
//!   rows. The source of truth.
//! - **Vector index**: in-memory exact cosine-similarity index over
//!   L2-normalized vectors, snapshotted to disk and rebuilt from the record
//!   store whenever the snapshot is missing, corrupt, or stale.
//! - **Memory store**: save/query orchestration with a bounded embedding cache
//!   in front of the remote embedding service (Gemini `text-embedding-004`,
//!   768 dimensions by default).
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite initialization, schema, store metadata, and health checks
//! - [`embedding`] — Embedding provider trait, Gemini client, and cache
//! - [`error`] — Typed errors for the memory core
//! - [`index`] — Cosine-similarity vector index and its snapshot format
//! - [`memory`] — Record store, memory store orchestration, and result types
//! - [`tools`] / [`server`] — MCP tool handler and stdio server
//! - [`cli`] — Operator subcommands

pub mod cli;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod index;
pub mod memory;
pub mod server;
pub mod tools;
