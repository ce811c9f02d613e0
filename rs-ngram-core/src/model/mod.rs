//! Top-level module for the n-gram modelling system.
//!
//! This crate provides a count-based character language model, including:
//! - Symbol/token conversion (`Tokenizer`)
//! - A fixed-capacity sliding token window (`Tape`)
//! - Streaming window iteration over a character source (`DataLoader`)
//! - The count-table model itself (`NGramModel`)
//! - Deterministic random sampling (`RandomState`, `Generator`)
//! - Split evaluation (`evaluate`, `Metrics`)

/// Bidirectional mapping between a fixed alphabet and dense integer codes.
///
/// The alphabet is supplied at construction; the sentinel symbol always
/// occupies code 0.
pub mod tokenizer;

/// Fixed-capacity sliding window of tokens.
///
/// A finite queue that reports readiness once it has seen enough tokens
/// to form a full window.
pub mod tape;

/// Streaming producer of fixed-length token windows.
///
/// Drives a character source through the tokenizer and a tape, yielding
/// one window per tape-ready event.
pub mod dataloader;

/// Fixed-order count-table n-gram model.
///
/// Handles window counting, smoothed next-token inference, model merging
/// and binary cache loading.
pub mod ngram_model;

/// Deterministic, seedable random number generation.
///
/// An explicit 64-bit state that can be threaded through callers so
/// multiple independent streams coexist deterministically.
pub mod rng;

/// Probabilistic sampling and autoregressive sequence generation.
pub mod generator;

/// Aggregate negative log-likelihood and perplexity over a data split.
pub mod evaluator;
