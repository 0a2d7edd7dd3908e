pub mod commands;
pub mod formatter;
pub mod lookup;

pub use commands::{handle_message, Command};
pub use formatter::ReplyFormatter;
pub use lookup::{DramaFinder, DramaLookup};
