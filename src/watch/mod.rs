pub mod debounce;
pub mod notifier;

pub use debounce::{Debounce, DEBOUNCE_DELAY};
pub use notifier::{ChangeKind, FileChangeNotifier};
