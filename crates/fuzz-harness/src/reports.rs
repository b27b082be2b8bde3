//! Campaign reports
//!
//! A report wraps the target results of one run with where it ran and which
//! seed it used, and renders as console text, JSON, JUnit XML or Markdown.

use crate::runner::{TargetResult, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::process::Command;

/// Counterexamples shown per target in text and Markdown output
const SHOWN_COUNTEREXAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Junit,
    Markdown,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "junit" => Ok(ReportFormat::Junit),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            other => Err(format!(
                "unknown format '{}' (expected text, json, junit or markdown)",
                other
            )),
        }
    }
}

/// Where a campaign ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub commit: Option<String>,
    pub branch: Option<String>,
    /// `CI` when the `CI` variable is set, otherwise `local`
    pub environment: String,
}

impl Provenance {
    pub fn detect() -> Self {
        fn git(args: &[&str]) -> Option<String> {
            Command::new("git")
                .args(args)
                .output()
                .ok()
                .filter(|out| out.status.success())
                .and_then(|out| String::from_utf8(out.stdout).ok())
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
        }

        Self {
            commit: git(&["rev-parse", "--short", "HEAD"]),
            branch: git(&["branch", "--show-current"]),
            environment: if std::env::var_os("CI").is_some() {
                "CI".to_string()
            } else {
                "local".to_string()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub targets: usize,
    pub held: usize,
    pub falsified: usize,
    pub inconclusive: usize,
    pub cases_run: u64,
    pub cases_held: u64,
    pub cases_falsified: u64,
    pub cases_discarded: u64,
    /// Mean of the per-target throughputs, cases/sec
    pub mean_throughput: f64,
    /// Held share of the cases that were not discarded, 0-1
    pub hold_rate: f64,
}

impl CampaignSummary {
    fn of(results: &[TargetResult]) -> Self {
        let count = |verdict: Verdict| results.iter().filter(|r| r.verdict == verdict).count();
        let cases_run: u64 = results.iter().map(|r| r.cases_run).sum();
        let cases_held: u64 = results.iter().map(|r| r.held).sum();
        let cases_discarded: u64 = results.iter().map(|r| r.discarded).sum();
        let decided = cases_run - cases_discarded;

        Self {
            targets: results.len(),
            held: count(Verdict::Held),
            falsified: count(Verdict::Falsified),
            inconclusive: count(Verdict::Inconclusive),
            cases_run,
            cases_held,
            cases_falsified: results.iter().map(|r| r.falsified).sum(),
            cases_discarded,
            mean_throughput: if results.is_empty() {
                0.0
            } else {
                results.iter().map(|r| r.throughput).sum::<f64>() / results.len() as f64
            },
            hold_rate: if decided == 0 {
                0.0
            } else {
                cases_held as f64 / decided as f64
            },
        }
    }

    pub fn passed(&self) -> bool {
        self.held == self.targets
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignReport {
    pub generated_at: DateTime<Utc>,
    pub provenance: Provenance,
    /// 0 when the run drew its seed from entropy
    pub seed: u64,
    pub duration_ms: f64,
    pub results: Vec<TargetResult>,
    pub summary: CampaignSummary,
}

impl CampaignReport {
    pub fn new(results: Vec<TargetResult>) -> Self {
        Self {
            generated_at: Utc::now(),
            provenance: Provenance::detect(),
            seed: 0,
            duration_ms: results.iter().map(|r| r.duration_ms).sum(),
            summary: CampaignSummary::of(&results),
            results,
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Text => self.to_text(),
            ReportFormat::Json => self.to_json(),
            ReportFormat::Junit => self.to_junit_xml(),
            ReportFormat::Markdown => self.to_markdown(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// One row per target, then the counterexamples of any that failed
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<6} {:<24} {:>9} {:>9} {:>9} {:>9} {:>12}",
            "", "property", "cases", "held", "falsified", "discarded", "cases/sec"
        );
        let _ = writeln!(out, "{}", "-".repeat(84));
        for result in &self.results {
            let _ = writeln!(
                out,
                "{:<6} {:<24} {:>9} {:>9} {:>9} {:>9} {:>12.0}",
                verdict_label(result.verdict),
                result.name,
                result.cases_run,
                result.held,
                result.falsified,
                result.discarded,
                result.throughput
            );
        }
        let _ = writeln!(out, "{}", "-".repeat(84));

        for result in self.results.iter().filter(|r| !r.passed()) {
            let _ = writeln!(out, "\n{} ({})", result.name, verdict_label(result.verdict));
            for example in result.counterexamples.iter().take(SHOWN_COUNTEREXAMPLES) {
                let _ = writeln!(out, "  case {}: {}", example.case, example.message);
                let _ = writeln!(
                    out,
                    "    input ({} shrink steps): {}",
                    example.shrink_steps, example.input
                );
            }
            for (reason, count) in &result.discard_reasons {
                let _ = writeln!(out, "  discarded {} x {}", count, reason);
            }
        }

        let _ = writeln!(
            out,
            "\n{} of {} properties held, {} cases ({} discarded), {:.2}% held, {:.0} ms, seed {}",
            self.summary.held,
            self.summary.targets,
            self.summary.cases_run,
            self.summary.cases_discarded,
            self.summary.hold_rate * 100.0,
            self.duration_ms,
            self.seed
        );
        out
    }

    /// One test suite per property. Counterexamples become failures and an
    /// inconclusive property becomes an error.
    pub fn to_junit_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            xml,
            "<testsuites name=\"sgp-fuzz\" tests=\"{}\" failures=\"{}\" errors=\"{}\" time=\"{:.3}\">",
            self.summary.targets,
            self.summary.falsified,
            self.summary.inconclusive,
            self.duration_ms / 1000.0
        );

        for result in &self.results {
            let name = escape_xml(&result.name);
            let seconds = result.duration_ms / 1000.0;
            let (failures, errors) = match result.verdict {
                Verdict::Held => (0, 0),
                Verdict::Falsified => (1, 0),
                Verdict::Inconclusive => (0, 1),
            };
            let _ = writeln!(
                xml,
                "  <testsuite name=\"{}\" tests=\"1\" failures=\"{}\" errors=\"{}\" time=\"{:.3}\">",
                name, failures, errors, seconds
            );
            let _ = writeln!(
                xml,
                "    <testcase classname=\"properties\" name=\"{}\" time=\"{:.3}\">",
                name, seconds
            );
            match result.verdict {
                Verdict::Held => {}
                Verdict::Falsified => {
                    let first = result
                        .counterexamples
                        .first()
                        .map(|c| c.message.as_str())
                        .unwrap_or("falsified");
                    let _ = writeln!(
                        xml,
                        "      <failure message=\"{}\">",
                        escape_xml(first)
                    );
                    for example in &result.counterexamples {
                        let _ = writeln!(
                            xml,
                            "case {}: {}\n  input: {}",
                            example.case,
                            escape_xml(&example.message),
                            escape_xml(&example.input)
                        );
                    }
                    xml.push_str("      </failure>\n");
                }
                Verdict::Inconclusive => {
                    let _ = writeln!(
                        xml,
                        "      <error message=\"{:.0}% of cases discarded\"/>",
                        result.discard_ratio() * 100.0
                    );
                }
            }
            let _ = writeln!(
                xml,
                "      <system-out>{} cases, {} held, {} discarded</system-out>",
                result.cases_run, result.held, result.discarded
            );
            xml.push_str("    </testcase>\n  </testsuite>\n");
        }

        xml.push_str("</testsuites>\n");
        xml
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::from("# SGP4 Property Report\n\n");
        let _ = writeln!(
            md,
            "Generated {} ({}), seed {}.",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.provenance.environment,
            self.seed
        );
        match (&self.provenance.commit, &self.provenance.branch) {
            (Some(commit), Some(branch)) => {
                let _ = writeln!(md, "Built from `{}` on `{}`.", commit, branch);
            }
            (Some(commit), None) => {
                let _ = writeln!(md, "Built from `{}`.", commit);
            }
            _ => {}
        }

        let _ = writeln!(
            md,
            "\n**{} of {} properties held** over {} cases in {:.0} ms ({:.2}% of decided cases held, {} discarded).\n",
            self.summary.held,
            self.summary.targets,
            self.summary.cases_run,
            self.duration_ms,
            self.summary.hold_rate * 100.0,
            self.summary.cases_discarded
        );

        md.push_str("| Property | Verdict | Cases | Held | Falsified | Discarded |\n");
        md.push_str("|----------|---------|------:|-----:|----------:|----------:|\n");
        for result in &self.results {
            let _ = writeln!(
                md,
                "| {} | {} | {} | {} | {} | {} |",
                result.name,
                verdict_label(result.verdict),
                result.cases_run,
                result.held,
                result.falsified,
                result.discarded
            );
        }

        let failed: Vec<&TargetResult> = self.results.iter().filter(|r| !r.passed()).collect();
        if !failed.is_empty() {
            md.push_str("\n## Counterexamples\n");
            for result in failed {
                let _ = writeln!(md, "\n### {}\n", result.name);
                if result.verdict == Verdict::Inconclusive {
                    let _ = writeln!(
                        md,
                        "{:.0}% of cases discarded.",
                        result.discard_ratio() * 100.0
                    );
                }
                for example in result.counterexamples.iter().take(SHOWN_COUNTEREXAMPLES) {
                    let _ = writeln!(md, "- case {}: {}", example.case, example.message);
                    let _ = writeln!(md, "  ```\n  {}\n  ```", example.input);
                }
                let hidden = result
                    .counterexamples
                    .len()
                    .saturating_sub(SHOWN_COUNTEREXAMPLES);
                if hidden > 0 {
                    let _ = writeln!(md, "- {} more not shown", hidden);
                }
            }
        }

        md
    }
}

fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Held => "HELD",
        Verdict::Falsified => "FAIL",
        Verdict::Inconclusive => "INCONC",
    }
}

fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Counterexample;
    use std::time::Duration;

    fn falsified() -> TargetResult {
        let mut result = TargetResult::new("card_round_trip");
        for _ in 0..990 {
            result.record_held();
        }
        for _ in 0..9 {
            result.record_discard("satellite decayed".to_string());
        }
        result.record_falsified(
            Counterexample {
                case: 17,
                message: "read back <bad> & worse".to_string(),
                input: "ElementSet { .. }".to_string(),
                shrink_steps: 4,
            },
            20,
        );
        result.finish(Duration::from_millis(500), 0.5);
        result
    }

    fn held(name: &str) -> TargetResult {
        let mut result = TargetResult::new(name);
        for _ in 0..100 {
            result.record_held();
        }
        result.finish(Duration::from_millis(10), 0.5);
        result
    }

    #[test]
    fn test_summary_counts() {
        let report = CampaignReport::new(vec![falsified(), held("geodetic_bounds")]);

        assert_eq!(report.summary.targets, 2);
        assert_eq!(report.summary.held, 1);
        assert_eq!(report.summary.falsified, 1);
        assert_eq!(report.summary.cases_run, 1100);
        assert_eq!(report.summary.cases_discarded, 9);
        assert!((report.summary.hold_rate - 1090.0 / 1091.0).abs() < 1e-12);
        assert!(!report.summary.passed());
        assert!((report.duration_ms - 510.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_campaign() {
        let summary = CampaignReport::new(Vec::new()).summary;
        assert_eq!(summary.hold_rate, 0.0);
        assert_eq!(summary.mean_throughput, 0.0);
        assert!(summary.passed());
    }

    #[test]
    fn test_junit_escapes_counterexamples() {
        let xml = CampaignReport::new(vec![falsified()]).to_junit_xml();
        assert!(xml.contains("read back &lt;bad&gt; &amp; worse"));
        assert!(xml.contains("failures=\"1\""));
        assert!(!xml.contains("<bad>"));
    }

    #[test]
    fn test_junit_marks_inconclusive_as_error() {
        let mut result = TargetResult::new("look_angle_bounds");
        result.record_held();
        for _ in 0..3 {
            result.record_discard("satellite decayed".to_string());
        }
        result.finish(Duration::from_millis(1), 0.5);

        let xml = CampaignReport::new(vec![result]).to_junit_xml();
        assert!(xml.contains("errors=\"1\""));
        assert!(xml.contains("75% of cases discarded"));
    }

    #[test]
    fn test_text_lists_counterexamples_and_discards() {
        let text = CampaignReport::new(vec![falsified()]).with_seed(9).to_text();
        assert!(text.contains("FAIL"));
        assert!(text.contains("case 17: read back"));
        assert!(text.contains("4 shrink steps"));
        assert!(text.contains("discarded 9 x satellite decayed"));
        assert!(text.contains("seed 9"));
    }

    #[test]
    fn test_markdown_lists_counterexamples() {
        let md = CampaignReport::new(vec![falsified(), held("repeat_propagation")])
            .with_seed(42)
            .to_markdown();
        assert!(md.contains("## Counterexamples"));
        assert!(md.contains("### card_round_trip"));
        assert!(!md.contains("### repeat_propagation"));
        assert!(md.contains("seed 42"));
    }

    #[test]
    fn test_json_round_trips() {
        let report = CampaignReport::new(vec![falsified()]).with_seed(3);
        let parsed: CampaignReport = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].verdict, Verdict::Falsified);
        assert_eq!(parsed.summary.cases_discarded, 9);
        assert_eq!(parsed.seed, 3);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("md".parse::<ReportFormat>(), Ok(ReportFormat::Markdown));
        assert_eq!("JUnit".parse::<ReportFormat>(), Ok(ReportFormat::Junit));
        assert!("xml".parse::<ReportFormat>().is_err());
    }
}
