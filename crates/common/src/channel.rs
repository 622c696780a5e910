//! The browser → host result channel
//!
//! The listener only ever talks to a [`ResultChannel`]. Host-side report
//! hubs implement it directly; [`JsonLinesChannel`] serializes every call so
//! records can cross a process boundary.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::model::{CompletionPayload, ProgressInfo, ResultRecord};
use crate::Result;

/// Receiver of normalized step results and run-boundary signals
pub trait ResultChannel: Send {
    /// One completed, non-hook step
    fn result(&mut self, record: ResultRecord) -> Result<()>;

    /// Running step count for the host progress indicator
    fn info(&mut self, info: ProgressInfo) -> Result<()>;

    /// Console output produced by the page while a step runs
    fn log(&mut self, _message: String) -> Result<()> {
        Ok(())
    }

    /// The engine has finished walking all features
    fn complete(&mut self, payload: CompletionPayload) -> Result<()>;
}

impl<C: ResultChannel + ?Sized> ResultChannel for Box<C> {
    fn result(&mut self, record: ResultRecord) -> Result<()> {
        (**self).result(record)
    }

    fn info(&mut self, info: ProgressInfo) -> Result<()> {
        (**self).info(info)
    }

    fn log(&mut self, message: String) -> Result<()> {
        (**self).log(message)
    }

    fn complete(&mut self, payload: CompletionPayload) -> Result<()> {
        (**self).complete(payload)
    }
}

/// One channel call on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelMessage {
    Result(ResultRecord),
    Info(ProgressInfo),
    Log { message: String },
    Complete(CompletionPayload),
}

impl ChannelMessage {
    /// Replay a decoded message onto another channel
    pub fn deliver<C: ResultChannel + ?Sized>(self, channel: &mut C) -> Result<()> {
        match self {
            ChannelMessage::Result(record) => channel.result(record),
            ChannelMessage::Info(info) => channel.info(info),
            ChannelMessage::Log { message } => channel.log(message),
            ChannelMessage::Complete(payload) => channel.complete(payload),
        }
    }
}

/// Writes each channel call as one JSON line
pub struct JsonLinesChannel<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> JsonLinesChannel<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn send(&mut self, message: &ChannelMessage) -> Result<()> {
        serde_json::to_writer(&mut self.out, message)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> ResultChannel for JsonLinesChannel<W> {
    fn result(&mut self, record: ResultRecord) -> Result<()> {
        self.send(&ChannelMessage::Result(record))
    }

    fn info(&mut self, info: ProgressInfo) -> Result<()> {
        self.send(&ChannelMessage::Info(info))
    }

    fn log(&mut self, message: String) -> Result<()> {
        self.send(&ChannelMessage::Log { message })
    }

    fn complete(&mut self, payload: CompletionPayload) -> Result<()> {
        self.send(&ChannelMessage::Complete(payload))
    }
}

/// Keeps every call in memory, in order
#[derive(Debug, Default)]
pub struct MemoryChannel {
    pub messages: Vec<ChannelMessage>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> impl Iterator<Item = &ResultRecord> {
        self.messages.iter().filter_map(|m| match m {
            ChannelMessage::Result(record) => Some(record),
            _ => None,
        })
    }

    pub fn completion(&self) -> Option<&CompletionPayload> {
        self.messages.iter().find_map(|m| match m {
            ChannelMessage::Complete(payload) => Some(payload),
            _ => None,
        })
    }
}

impl ResultChannel for MemoryChannel {
    fn result(&mut self, record: ResultRecord) -> Result<()> {
        self.messages.push(ChannelMessage::Result(record));
        Ok(())
    }

    fn info(&mut self, info: ProgressInfo) -> Result<()> {
        self.messages.push(ChannelMessage::Info(info));
        Ok(())
    }

    fn log(&mut self, message: String) -> Result<()> {
        self.messages.push(ChannelMessage::Log { message });
        Ok(())
    }

    fn complete(&mut self, payload: CompletionPayload) -> Result<()> {
        self.messages.push(ChannelMessage::Complete(payload));
        Ok(())
    }
}

/// Sends every call to two channels, `primary` first
pub struct TeeChannel<A: ResultChannel, B: ResultChannel> {
    pub primary: A,
    pub secondary: B,
}

impl<A: ResultChannel, B: ResultChannel> TeeChannel<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }

    pub fn into_parts(self) -> (A, B) {
        (self.primary, self.secondary)
    }
}

impl<A: ResultChannel, B: ResultChannel> ResultChannel for TeeChannel<A, B> {
    fn result(&mut self, record: ResultRecord) -> Result<()> {
        self.primary.result(record.clone())?;
        self.secondary.result(record)
    }

    fn info(&mut self, info: ProgressInfo) -> Result<()> {
        self.primary.info(info)?;
        self.secondary.info(info)
    }

    fn log(&mut self, message: String) -> Result<()> {
        self.primary.log(message.clone())?;
        self.secondary.log(message)
    }

    fn complete(&mut self, payload: CompletionPayload) -> Result<()> {
        self.primary.complete(payload.clone())?;
        self.secondary.complete(payload)
    }
}
