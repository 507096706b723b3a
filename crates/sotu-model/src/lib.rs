pub mod error;
pub mod outcome;
pub mod speech;

pub use error::*;
pub use outcome::*;
pub use speech::*;
