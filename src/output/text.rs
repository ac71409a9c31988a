use crate::output::OutputResult;
use crate::state::{CrawlResult, LinkState};
use console::style;
use std::io::Write;

/// One progressive line per finalized link, e.g. `[200] https://example.com/`
pub fn format_link_line(result: &crate::state::LinkResult) -> String {
    let status = result
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "---".to_string());

    let tag = match result.state {
        LinkState::Ok => style(status).green(),
        LinkState::Broken => style(status).red().bold(),
        LinkState::Skipped => style("SKP".to_string()).yellow(),
    };

    format!("[{tag}] {}", result.url)
}

/// Final text summary: broken-link details and totals
pub fn write_summary<W: Write>(writer: &mut W, result: &CrawlResult) -> OutputResult<()> {
    let broken: Vec<_> = result
        .links
        .iter()
        .filter(|l| l.state == LinkState::Broken)
        .collect();

    if !broken.is_empty() {
        writeln!(writer)?;
        writeln!(
            writer,
            "{}",
            style(format!("ERROR: detected {} broken links", broken.len()))
                .red()
                .bold()
        )?;
        for link in &broken {
            let status = link
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "no response".to_string());
            writeln!(writer, "  [{status}] {}", link.url)?;
            if let Some(parent) = &link.parent {
                writeln!(writer, "        referenced by {parent}")?;
            }
        }
    }

    writeln!(writer)?;
    writeln!(
        writer,
        "{} links checked: {} ok, {} broken, {} skipped",
        result.links.len(),
        result.count(LinkState::Ok),
        result.count(LinkState::Broken),
        result.count(LinkState::Skipped),
    )?;
    writeln!(
        writer,
        "{}",
        if result.passed {
            style("PASSED").green().bold()
        } else {
            style("FAILED").red().bold()
        }
    )?;

    Ok(())
}
