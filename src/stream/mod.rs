//! Wire framing for the chat token stream.

pub mod decoder;
pub mod encoder;

pub use decoder::SseLineDecoder;
pub use encoder::{encode_event, word_tokens};
