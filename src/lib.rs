// steamscout - Steam library folder and app manifest discovery
//
// This is the library crate containing the KeyValues parser, the document
// cache and the resolver. The binary crate (main.rs) provides the demo CLI
// entry point.

pub mod config;
pub mod fs;
pub mod keyvalues;
pub mod logging;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::{ConfigManager, Settings};
pub use keyvalues::{Document, Node, ParseError, ParseErrorKind};
pub use models::InstalledApp;
pub use services::{DocumentCache, LibraryResolver, LoadError, ResolveError};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
