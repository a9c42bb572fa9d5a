//! Domain models for the MediBridge system.

mod directory;
mod session;

pub use directory::*;
pub use session::*;
