mod client;
mod error;

pub use kira_types as types;

pub use client::config::Config;
pub use client::{connect, connect_with_config, Client, ClientTx, ServerRx};
pub use error::ChannelError;
