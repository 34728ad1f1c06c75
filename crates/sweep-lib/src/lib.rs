pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod record;
pub mod stage;

pub use config::*;
pub use error::*;
pub use pipeline::*;
pub use record::*;
