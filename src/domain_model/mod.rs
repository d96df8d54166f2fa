mod edge;
mod friend;
mod user;

pub use edge::*;
pub use friend::*;
pub use user::*;
