use crate::output::OutputResult;
use crate::state::CrawlResult;
use std::io::Write;

/// Writes one CSV row per link: `url,status,state,parent,failureDetails`
///
/// `failureDetails` is a JSON-encoded string; the CSV writer applies the
/// quoting.
pub fn write_csv<W: Write>(writer: &mut W, result: &CrawlResult) -> OutputResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["url", "status", "state", "parent", "failureDetails"])?;

    for link in &result.links {
        let status = link.status.map(|s| s.to_string()).unwrap_or_default();
        let details = serde_json::to_string(&link.failure_details)?;
        csv.write_record([
            link.url.as_str(),
            status.as_str(),
            link.state.as_str(),
            link.parent.as_deref().unwrap_or(""),
            details.as_str(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}
