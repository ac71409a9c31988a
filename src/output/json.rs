use crate::output::OutputResult;
use crate::state::CrawlResult;
use std::io::Write;

/// Writes the aggregate as pretty-printed JSON
pub fn write_json<W: Write>(writer: &mut W, result: &CrawlResult) -> OutputResult<()> {
    serde_json::to_writer_pretty(&mut *writer, result)?;
    writeln!(writer)?;
    Ok(())
}
