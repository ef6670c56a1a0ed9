pub mod config;
pub mod error;
pub mod grammar;
pub mod logging;
pub mod model;
pub mod parse;
pub mod store;
pub mod sync;
pub mod vault;
pub mod walker;

pub use config::IndexConfig;
pub use error::{Result, VaultError};
pub use grammar::{Classification, EntityType, Grammar, LinkRef};
pub use model::{Edge, EntryFailure, FailureStage, MetaKey, Node, PassError, SyncMode, SyncStats};
pub use store::{IndexCounts, IndexStore, IndexWriter};
pub use sync::SyncCoordinator;
pub use vault::VaultIndex;
