//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build access filter → Start listener
//!
//! Shutdown (shutdown.rs):
//!     SIGINT/SIGTERM → Stop accepting → Drain requests → Exit
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
