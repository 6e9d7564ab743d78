//! # Lectern Core
//!
//! Platform-independent library for multi-signal document retrieval.
//!
//! This crate provides the indexing and ranking machinery used by the
//! Lectern search tool: three scoring models over one normalized corpus,
//! fused into a single ranking, with a fingerprinted on-disk index cache.
//!
//! ## Modules
//!
//! - [`search`] - Retrieval engine (TF-IDF + BM25 + dense cosine, weighted fusion)
//! - [`corpus`] - Corpus enumeration, text loading, and change fingerprinting
//! - [`text`] - Token normalization and query expansion
//! - [`embedding`] - Embedding provider trait and the built-in hashing encoder
//! - [`storage`] - Platform-agnostic blob storage trait and redb backend
//! - [`config`] - Engine tuning knobs and fusion weights

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod search;
pub mod storage;
pub mod text;
