//! The replicate command: validate input, resolve configuration, run

mod handler;

pub use handler::handle_replicate_command;
