mod notifier;
mod server;

pub use notifier::*;
pub use server::*;
