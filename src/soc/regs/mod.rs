//! Register definitions and their runtime accessors.

pub mod ast;
pub mod bits;
pub mod error;
pub mod runtime;

pub use error::{RegError, RegResult};
