//! Line-delimited JSON stores for categories and recently launched
//! applications.

pub mod category;
pub mod jsonl;
pub mod recents;

pub use category::{AppEntry, Category, CategoryStore, Direction, CATEGORIES_FILE};
pub use jsonl::{Fingerprint, LoadReport};
pub use recents::{RecentEntry, RecentsStore, MAX_RECENTS, RECENTS_FILE};
