pub mod commands;
pub mod handlers;

pub use commands::command_argument_builder;
pub use handlers::{crawl_options_from_args, expand_output_path, parse_url_line};
