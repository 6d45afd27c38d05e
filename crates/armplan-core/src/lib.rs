pub mod analyzer;
pub mod command;
pub mod config;
pub mod error;
pub mod position;
pub mod sequence;
pub mod vision;

pub use error::{ArmplanError, Result};
