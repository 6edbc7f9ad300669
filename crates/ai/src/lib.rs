mod traits;

pub mod llm;

pub use traits::*;
