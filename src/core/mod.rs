//! Core types - pure abstractions shared across the codebase.

mod error;
mod mode;
mod state;

pub use error::{BuildError, LoaderError};
pub use mode::BuildMode;
pub use state::{
    is_healthy, is_shutdown, register_server, set_healthy, setup_shutdown_handler,
};
