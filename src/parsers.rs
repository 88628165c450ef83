pub mod command_parser;

pub use command_parser::{ParsedCommand, parse_command, single_arg};
