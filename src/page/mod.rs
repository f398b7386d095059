//! Page analysis
//!
//! The in-page half of pagemark: candidate discovery, classification,
//! descriptors, selectors, overlays and readable text, all behind a
//! [`PageHost`] / [`Session`] pair.

pub mod analyzer;
pub mod classifier;
pub mod descriptor;
mod listing;
pub mod overlay;
pub mod session;
pub mod synthesizer;
pub mod text;

pub use analyzer::{PageAnalyzer, CANDIDATE_SELECTORS};
pub use classifier::{Classifier, Rejection};
pub use descriptor::{DescriptorBuilder, SkipReason, Skipped};
pub use listing::DEFAULT_LISTING_LIMIT;
pub use overlay::{BadgePlacement, OverlayAnnotator, OverlayRecord};
pub use session::{PageHost, Session, SessionState};
pub use synthesizer::SelectorSynthesizer;
pub use text::TextExtractor;
