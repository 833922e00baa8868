pub mod client;
pub mod server;

use client::*;
use server::*;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "send_message")]
    SendMessage(SendMessageEvent),
    #[serde(rename = "stop_generation")]
    StopGeneration(StopGenerationEvent),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "close")]
    Close { reason: Option<String> },
    #[serde(rename = "error")]
    Error(ErrorEvent),
    #[serde(rename = "response_chunk")]
    ResponseChunk(ResponseChunkEvent),
    #[serde(rename = "sources")]
    Sources(SourcesEvent),
    #[serde(rename = "response_complete")]
    ResponseComplete(ResponseCompleteEvent),
}
