//! Report sink port (interface).

use crate::domain::{DiffEvent, PortRecord};
use crate::error::Result;

/// Port for rendering or exporting scan output.
pub trait ReportSink {
    /// Write one ordered snapshot.
    fn write_records(&mut self, records: &[PortRecord]) -> Result<()>;

    /// Write one watch event.
    fn write_event(&mut self, event: &DiffEvent) -> Result<()>;

    /// Flush any buffered output.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
