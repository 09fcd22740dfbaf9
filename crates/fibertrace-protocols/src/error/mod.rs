//! Error types for the fibertrace protocol layer.

mod extraction;
mod hook;
mod protocol;
mod selection;

pub use extraction::*;
pub use hook::*;
pub use protocol::*;
pub use selection::*;
