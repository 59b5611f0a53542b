//! Site registry: the validated list of career pages and their rules
//!
//! Loading is forgiving by contract. A missing file, a missing column or a
//! decoding error yields an empty registry; a bad row is skipped. Invalid
//! strategies therefore never reach the dispatcher.

pub mod loader;
pub mod rules;
pub mod site;

pub use loader::{load_registry, parse_registry};
pub use rules::{CARD_TEXT_SELECTOR, ExtractionRules, RulesBook};
pub use site::{SiteDescriptor, Strategy};
