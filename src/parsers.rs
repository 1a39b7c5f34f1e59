pub mod command_parser;

pub use command_parser::{CommandParseError, ConsoleCommand, HELP_TEXT, parse_console_command};
