pub mod console;

use crate::report::ReportModel;
use crate::stats::{GroupStats, GroupSummary};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Xml,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".xml") {
        return Some(OutputFormat::Xml);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

pub fn render(report: &ReportModel, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(report),
        OutputFormat::Json => render_json(report),
        OutputFormat::Xml => render_xml(report),
    }
}

pub fn render_text(report: &ReportModel) -> Vec<u8> {
    console::render(report, false).into_bytes()
}

pub fn render_json(report: &ReportModel) -> Vec<u8> {
    serde_json::to_vec_pretty(report).unwrap_or_else(|_| b"{}\n".to_vec())
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn opt_ms(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.3}")).unwrap_or_default()
}

fn push_stats_xml(out: &mut String, indent: &str, stats: &GroupStats) {
    out.push_str(&format!("{indent}<stats>\n"));
    out.push_str(&format!("{indent}  <count>{}</count>\n", stats.count));
    out.push_str(&format!("{indent}  <avg>{:.3}</avg>\n", stats.avg));
    out.push_str(&format!("{indent}  <median>{:.3}</median>\n", stats.median));
    out.push_str(&format!("{indent}  <p95>{}</p95>\n", opt_ms(stats.p95)));
    out.push_str(&format!("{indent}  <p99>{}</p99>\n", opt_ms(stats.p99)));
    out.push_str(&format!("{indent}  <min>{:.3}</min>\n", stats.min));
    out.push_str(&format!("{indent}  <max>{:.3}</max>\n", stats.max));
    out.push_str(&format!(
        "{indent}  <throughput>{}</throughput>\n",
        opt_ms(stats.throughput)
    ));
    out.push_str(&format!("{indent}</stats>\n"));
}

pub fn render_xml(report: &ReportModel) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str("<report>\n");

    let run = &report.run;
    out.push_str("  <run>\n");
    out.push_str(&format!("    <target>{}</target>\n", escape_xml(&run.target)));
    out.push_str(&format!("    <requests>{}</requests>\n", run.requests));
    out.push_str(&format!(
        "    <concurrency>{}</concurrency>\n",
        run.concurrency
    ));
    out.push_str(&format!("    <security>{}</security>\n", run.security));
    out.push_str(&format!(
        "    <strategy>{}</strategy>\n",
        run.strategy.label()
    ));
    out.push_str(&format!(
        "    <elapsed_ms>{:.3}</elapsed_ms>\n",
        run.elapsed_ms
    ));
    out.push_str(&format!("    <completed>{}</completed>\n", run.completed));
    out.push_str(&format!("    <failed>{}</failed>\n", run.failed));
    out.push_str(&format!(
        "    <wall_clock_rps>{}</wall_clock_rps>\n",
        opt_ms(run.wall_clock_rps)
    ));
    out.push_str("  </run>\n");

    out.push_str("  <groups>\n");
    for g in report.groups.iter() {
        out.push_str(&format!(
            "    <group name=\"{}\" paths=\"{}\">\n",
            escape_xml(&g.name),
            g.path_count
        ));
        match &g.summary {
            GroupSummary::Stats {
                stats,
                status_counts,
                error_count,
            } => {
                push_stats_xml(&mut out, "      ", stats);
                out.push_str("      <status_counts>\n");
                for (status, n) in status_counts.iter() {
                    out.push_str(&format!(
                        "        <status code=\"{status}\">{n}</status>\n"
                    ));
                }
                out.push_str("      </status_counts>\n");
                out.push_str(&format!("      <errors>{error_count}</errors>\n"));
            }
            GroupSummary::NoRequests { error_count } => {
                out.push_str("      <no_requests/>\n");
                out.push_str(&format!("      <errors>{error_count}</errors>\n"));
            }
        }
        out.push_str("    </group>\n");
    }
    out.push_str("  </groups>\n");

    out.push_str("  <paths>\n");
    for p in report.paths.iter() {
        out.push_str(&format!("    <path value=\"{}\">\n", escape_xml(&p.path)));
        if let Some(stats) = p.stats.as_ref() {
            push_stats_xml(&mut out, "      ", stats);
        }
        for (status, n) in p.status_counts.iter() {
            out.push_str(&format!("      <status code=\"{status}\">{n}</status>\n"));
        }
        out.push_str(&format!(
            "      <error_count>{}</error_count>\n",
            p.error_count
        ));
        for e in p.errors.iter() {
            out.push_str(&format!(
                "      <error kind=\"{}\">{}</error>\n",
                e.kind.label(),
                escape_xml(&e.to_string())
            ));
        }
        out.push_str("    </path>\n");
    }
    out.push_str("  </paths>\n");

    if let Some(rows) = report.security.as_ref() {
        out.push_str("  <security>\n");
        for r in rows.iter() {
            out.push_str(&format!(
                "    <category name=\"{}\" total=\"{}\" blocked=\"{}\" allowed=\"{}\" errors=\"{}\"/>\n",
                escape_xml(&r.category),
                r.total,
                r.blocked,
                r.allowed,
                r.errors
            ));
        }
        out.push_str("  </security>\n");
    }

    out.push_str("</report>\n");
    out.into_bytes()
}
