pub(crate) mod cache;
mod orchestrator;

pub use cache::PassCache;
pub use orchestrator::{PassListing, RefreshOrchestrator, RefreshReport};
