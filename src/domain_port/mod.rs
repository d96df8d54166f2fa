// repo

mod edge_repo;
mod user_repo;

mod repo_tx;

pub use edge_repo::*;
pub use user_repo::*;

pub use repo_tx::*;

// notification

mod friend_notifier;

pub use friend_notifier::*;
