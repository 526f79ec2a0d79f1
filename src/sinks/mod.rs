//! Outbound capability interfaces and their adapters.
//!
//! The enrichment core only talks to the OS through these traits. Each has a
//! production adapter and an in-memory one for tests and dry runs.
//!
//! * [`comment`]: [`CommentSink`] ([`FinderComments`], [`MemoryCommentSink`]).
//! * [`search_index`]: [`SearchIndexSink`] ([`FileSearchIndex`],
//!   [`MemorySearchIndex`]).

pub mod comment;
pub mod search_index;

pub use comment::{escape_applescript, CommentSink, FinderComments, MemoryCommentSink};
pub use search_index::{
    FileSearchIndex, IndexDocument, MemorySearchIndex, SearchIndexError, SearchIndexSink,
    APPS_DOMAIN,
};
