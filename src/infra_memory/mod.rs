//! In-process store with the same row-count semantics as the MySQL backend.
//! Transactions are serialized and work on a private copy of the tables.

mod edge_repo_memory;
mod store;
mod user_repo_memory;

pub use edge_repo_memory::*;
pub use store::*;
pub use user_repo_memory::*;
