pub mod config;
pub mod lookup;
pub mod todo;

pub use config::*;
pub use lookup::*;
pub use todo::*;
