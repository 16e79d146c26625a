//! Assessment input handling.
//!
//! Loading and saving assessment files, building the typed response
//! matrix, and discovering assessment files for batch runs.

pub mod matrix;
pub mod scanner;
pub mod store;

pub use matrix::*;
pub use scanner::*;
pub use store::*;
