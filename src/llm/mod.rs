pub mod assistant;
pub mod client;
pub mod extractor;
pub mod prompts;
pub mod types;

pub use assistant::*;
pub use client::*;
pub use extractor::*;
pub use types::*;
