//! pagemark - interactive element mapping for web pages
//!
//! Analyzes a live document, finds everything a user could act on, and hands
//! back an ordered, numbered snapshot: a selector, a type, a label and a box
//! for each element. Elements can be annotated with numbered overlays for a
//! human to review, and the page's readable text can be pulled out on its own.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **Dom**: The `Document` port, a selector engine and an in-memory backend
//! - **Page**: Classifier, descriptors, selectors, overlays, text and sessions
//! - **CLI**: Command handling and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use pagemark::{Config, MemoryDocument, PageHost};
//!
//! fn main() -> pagemark::Result<()> {
//!     let document = MemoryDocument::load("page.json")?;
//!     let mut host = PageHost::new(document, Config::load());
//!
//!     let mut session = host.install();
//!     let snapshot = session.analyze();
//!     println!("{}", snapshot.render_listing(40));
//!     if let Some(selector) = session.get_selector(1) {
//!         println!("first element: {}", selector);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod dom;
pub mod page;

// Re-export commonly used items
pub use crate::cli::Repl;
pub use crate::core::{AnalysisResult, Config, ElementDescriptor, PageError, Result};
pub use crate::dom::{Document, MemoryDocument, NodeId};
pub use crate::page::{PageHost, Session};
