pub mod macros;
pub mod transit;

pub use transit::*;
