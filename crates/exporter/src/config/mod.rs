pub mod cli;
pub mod filter;
pub mod settings;

pub use cli::*;
pub use filter::Filter;
pub use settings::*;
