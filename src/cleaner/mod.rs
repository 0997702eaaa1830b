pub mod executor;

pub use executor::{CleanupError, CleanupExecutor, CleanupResult};
