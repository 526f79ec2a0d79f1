//! Enrichment: generated descriptions, categories and function tags.
//!
//! # Architecture
//!
//! * [`generator`]: the [`DescriptionGenerator`] capability and the
//!   command-line [`CliGenerator`] (binary discovery, per-call timeout).
//! * [`prompt`]: prompt text for each request kind.
//! * [`parse`]: reply parsing and primary comment composition.
//! * [`orchestrator`]: the per-item state machine ([`Orchestrator::enrich`]).
//! * [`batch`]: sequential, rate-limited, cancellable batches
//!   ([`BatchRunner`]).
//!
//! # Failure policy
//!
//! A failed generator call leaves only that field missing. A failed comment
//! write leaves the comment stale but keeps every fetched description. The
//! search index is best effort. Nothing is retried within a pass.

pub mod batch;
pub mod generator;
pub mod orchestrator;
pub mod parse;
pub mod prompt;

pub use batch::{BatchRunner, BatchSelection, BatchStatus, BatchSummary};
pub use generator::{
    locate_binary, standard_locations, CliGenerator, DescriptionGenerator, GeneratorError,
    DEFAULT_TIMEOUT, GENERATOR_BINARY,
};
pub use orchestrator::{
    CommentOutcome, EnrichStep, ItemOutcome, ItemStatus, Orchestrator, DEFAULT_INTER_ITEM_DELAY,
};
pub use parse::{compose_primary_comment, parse_category, parse_function_tags, single_line};
