//! Event sinks

use crate::error::Result;
use crate::record::Event;
use std::io::Write;

/// Receives events as a command produces them
pub trait EventSink {
    /// Accept one event
    fn emit(&mut self, event: Event) -> Result<()>;
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) -> Result<()> {
        self.push(event);
        Ok(())
    }
}

/// Writes one JSON object per line
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Lines written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and return the writer
    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, event: Event) -> Result<()> {
        writeln!(self.writer, "{}", event.to_json_line())?;
        self.written += 1;
        Ok(())
    }
}
