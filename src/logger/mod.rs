//! Process-wide `tracing` setup. Install once with [`Logger::new_bootstrap`],
//! then narrow or widen the filter once settings are known.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
