pub mod model;
pub mod service;

pub use service::{TerminalInput, TerminalPlayer};
