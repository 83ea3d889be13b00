pub mod cli;
pub mod context;
pub mod error;
pub mod icons;
pub mod logging;
pub mod menu;
pub mod notice;
pub mod paths;
pub mod registry;
pub mod settings;
pub mod store;
pub mod subscription;
pub mod sync;
pub mod watch;

pub use context::MenuContext;
pub use error::StoreError;
