//! Record store for accumulated application metadata.
//!
//! # Features
//!
//! * **Merge-on-save**: saving a freshly scanned entry set never discards
//!   descriptions, categories or tags already accumulated for a path.
//! * **Original comment**: the comment found when a record is created is
//!   kept forever, whatever the primary comment later becomes.
//! * **Single writer**: every mutation is serialized through one lock.
//! * **Versioning**: the document carries a version; older bare-array files
//!   and legacy field names still load.
//! * **History**: rescans do not delete records; [`RecordStore::prune`] and
//!   [`RecordStore::clear`] are the only removal paths.
//!
//! # Architecture
//!
//! * [`record`]: serializable [`Record`] and the document envelope.
//! * [`database`]: the [`RecordStore`] itself.

pub mod database;
pub mod record;

pub use database::{RecordStore, StoreError, StoreResult};
pub use record::{Record, StoreDocument, STORE_VERSION};
