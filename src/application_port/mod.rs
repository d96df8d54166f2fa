mod relationship_service;
mod user_service;

pub use relationship_service::*;
pub use user_service::*;
