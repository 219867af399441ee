//! Report command implementation

use anyhow::Result;
use std::path::PathBuf;

use threatspec::report::ReportDocument;

/// Print threat coverage or the threat hierarchy of the merged documents
pub fn report_command(files: &[PathBuf], tree: bool, json: bool) -> Result<()> {
    let doc = ReportDocument::load_all(files)?;

    if tree {
        let tree = doc.threat_tree();
        if json {
            println!("{}", serde_json::to_string_pretty(&tree)?);
        } else {
            for node in doc.threat_outline() {
                let line = format!("{}{} {}", "  ".repeat(node.depth), node.id, node.name);
                println!("{}", line.trim_end());
            }
        }
        return Ok(());
    }

    let coverage = doc.coverage();
    if json {
        println!("{}", serde_json::to_string_pretty(&coverage)?);
        return Ok(());
    }

    if coverage.is_empty() {
        println!("No threats referenced.");
        return Ok(());
    }

    println!(
        "{:<30} {:<40} {:<12} {:>4} {:>4} {:>4} {:>4}",
        "THREAT", "NAME", "STATUS", "MIT", "EXP", "TRA", "ACC"
    );
    println!("{}", "-".repeat(104));
    for c in &coverage {
        println!(
            "{:<30} {:<40} {:<12} {:>4} {:>4} {:>4} {:>4}",
            truncate(&c.id, 30),
            truncate(&c.name, 40),
            c.status().as_str(),
            c.mitigations,
            c.exposures,
            c.transfers,
            c.acceptances
        );
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
