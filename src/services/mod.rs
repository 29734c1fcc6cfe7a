//! Services module - document caching and library/app resolution.
//!
//! The services are framework-agnostic and have no dependencies on the CLI
//! layer, making them testable and reusable:
//!
//! - [`DocumentCache`]: path-keyed memoization of parsed KeyValues
//!   documents, caching failures alongside successes so repeated probes
//!   never re-touch disk
//! - [`LibraryResolver`]: walks `libraryfolders.vdf` and
//!   `appmanifest_<app_id>.acf` documents to answer library and install
//!   path queries
//!
//! Data flows one way: the resolver asks the cache for a document at a
//! path, the cache runs the parser on a miss, and the resolver walks the
//! resulting tree. Parsed documents are immutable and shared as
//! `Arc<Document>`, so cached trees are safe to hand to concurrent callers.

pub mod cache;
pub mod resolver;

pub use cache::{DocumentCache, LoadError};
pub use resolver::{LibraryResolver, ResolveError};
