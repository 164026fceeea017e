pub mod errors;
pub mod outcome;
pub mod parameter;

pub use errors::*;
pub use outcome::*;
pub use parameter::*;
