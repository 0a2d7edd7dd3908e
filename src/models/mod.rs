pub mod drama;
pub mod message;

pub use drama::Drama;
pub use message::{InboundMessage, ParseMode, Reply, User};

#[cfg(test)]
pub(crate) use drama::sample_drama;
