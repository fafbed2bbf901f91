//! Validate command - surface data quality issues without generating full reports

use crate::cmd::{print_json, InputArgs, Run};
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    #[command(flatten)]
    input: InputArgs,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// A validation issue for output
#[derive(Debug, Clone, Serialize)]
struct ValidationIssue {
    #[serde(rename = "type")]
    issue_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<String>,
    location: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct ValidationOutput {
    realization_count: usize,
    issue_count: usize,
    issues: Vec<ValidationIssue>,
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let run = self.input.run()?;
        let issues = collect_issues(&run);
        let realization_count = run
            .report
            .realizations
            .values()
            .map(Vec::len)
            .sum::<usize>();

        if self.json {
            print_json(&ValidationOutput {
                realization_count,
                issue_count: issues.len(),
                issues: issues.clone(),
            })?;
        } else {
            self.print_text(&issues);
        }

        // Exit with code 1 if issues found
        if !issues.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }

    fn print_text(&self, issues: &[ValidationIssue]) {
        println!();
        println!("VALIDATION RESULTS");
        println!();

        if issues.is_empty() {
            println!("\u{2713} No issues found.");
            return;
        }

        println!("\u{26A0} {} issue(s) found:", issues.len());
        println!();
        for (i, issue) in issues.iter().enumerate() {
            println!("  {}. [{}] {}", i + 1, issue.issue_type, issue.location);
            println!("     {}", issue.message);
            println!();
        }
    }
}

fn collect_issues(run: &Run) -> Vec<ValidationIssue> {
    let rejected = run.rejected.iter().map(|r| ValidationIssue {
        issue_type: "RejectedRow".to_string(),
        symbol: None,
        location: format!("{} row {}", r.source, r.row),
        message: r.reason.clone(),
    });
    let failed = run.report.errors.iter().map(|e| ValidationIssue {
        issue_type: e.kind().to_string(),
        symbol: e.symbol().map(str::to_string),
        location: e.symbol().map_or("all securities".to_string(), |s| format!("security {}", s)),
        message: e.to_string(),
    });
    rejected.chain(failed).collect()
}
