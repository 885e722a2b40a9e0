mod in_memory;
mod snapshot;

pub use in_memory::InMemoryVectorIndex;
pub use snapshot::{IndexSnapshot, SessionSnapshot, SnapshotEntry};
