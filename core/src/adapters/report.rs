//! JSON report sink.

use std::io::Write;

use crate::domain::{DiffEvent, PortRecord};
use crate::error::Result;
use crate::ports::ReportSink;

/// Writes snapshots as a pretty-printed JSON array and watch events as
/// newline-delimited JSON objects.
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn write_records(&mut self, records: &[PortRecord]) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, records)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_event(&mut self, event: &DiffEvent) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
