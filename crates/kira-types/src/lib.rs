pub mod events;
pub mod message;

pub use events::{ClientEvent, ServerEvent};
pub use message::{ChatMessage, ResponseMessage, Role, SessionContext, SourceRef};
