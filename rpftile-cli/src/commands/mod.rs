//! CLI command implementations.

pub mod decode;
pub mod info;
pub mod locate;
