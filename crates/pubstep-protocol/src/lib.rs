pub mod connection;
pub mod error;
pub mod input;
pub mod outcome;

pub use connection::*;
pub use error::*;
pub use input::*;
pub use outcome::*;
