//! Process-wide `tracing` setup shared by the feedwatch binaries.

mod tracing;

pub use self::tracing::init_with_debug;
