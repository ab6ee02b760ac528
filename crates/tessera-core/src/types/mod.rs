pub mod address;
pub mod event;
pub mod token;
pub mod value;

pub use address::Address;
pub use event::{BufferSink, Event, EventSink, NullSink};
pub use token::{token_id, Token, TokenFlags, TokenMeta};
pub use value::Value;
