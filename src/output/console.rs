use colored::Colorize;

use crate::report::ReportModel;
use crate::stats::{GroupStats, GroupSummary, PathReport, SecurityRow};

/// Errors printed per path before the remainder is summarized.
pub const ERRORS_SHOWN_PER_PATH: usize = 10;

const MAX_PATH_DISPLAY: usize = 64;

#[derive(Clone, Copy)]
struct Palette {
    styled: bool,
}

impl Palette {
    fn heading(self, text: &str) -> String {
        if self.styled {
            text.bold().cyan().to_string()
        } else {
            text.to_string()
        }
    }

    fn section(self, text: &str) -> String {
        if self.styled {
            text.bold().green().to_string()
        } else {
            text.to_string()
        }
    }

    fn bad(self, text: &str) -> String {
        if self.styled {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }
}

struct Table {
    title: Option<String>,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: &[&str]) -> Self {
        Self {
            title: None,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn titled(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    fn render(&self, out: &mut String) {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in self.rows.iter() {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let border: String = widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+");
        let border = format!("+{border}+\n");

        if let Some(title) = self.title.as_ref() {
            out.push_str(title);
            out.push('\n');
        }
        out.push_str(&border);
        push_cells(out, &self.headers, &widths);
        out.push_str(&border);
        for row in self.rows.iter() {
            push_cells(out, row, &widths);
        }
        out.push_str(&border);
    }
}

fn push_cells(out: &mut String, cells: &[String], widths: &[usize]) {
    out.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let pad = w.saturating_sub(cell.chars().count());
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(pad));
        out.push_str(" |");
    }
    out.push('\n');
}

fn ms(v: f64) -> String {
    format!("{v:.2}ms")
}

fn display_path(path: &str) -> String {
    let shown = format!("/{}", path.trim_start_matches('/'));
    if shown.chars().count() <= MAX_PATH_DISPLAY {
        return shown;
    }
    let head: String = shown.chars().take(MAX_PATH_DISPLAY).collect();
    format!("{head}... ({} chars)", shown.chars().count())
}

fn stats_table(stats: &GroupStats, error_count: u64) -> Table {
    let mut table = Table::new(&["Metric", "Value"]);
    table.row(vec!["Total Requests".into(), stats.count.to_string()]);
    table.row(vec!["Failed Requests".into(), error_count.to_string()]);
    table.row(vec!["Average Latency".into(), ms(stats.avg)]);
    table.row(vec!["Median Latency".into(), ms(stats.median)]);
    if let Some(p95) = stats.p95 {
        table.row(vec!["95th Percentile".into(), ms(p95)]);
    }
    if let Some(p99) = stats.p99 {
        table.row(vec!["99th Percentile".into(), ms(p99)]);
    }
    table.row(vec!["Min Latency".into(), ms(stats.min)]);
    table.row(vec!["Max Latency".into(), ms(stats.max)]);
    table.row(vec![
        "Requests/Second".into(),
        stats
            .throughput
            .map(|t| format!("{t:.2}"))
            .unwrap_or_else(|| "n/a".to_string()),
    ]);
    table
}

fn status_table<'a>(counts: impl Iterator<Item = (&'a u16, &'a u64)>) -> Table {
    let mut table = Table::new(&["Status Code", "Count"]).titled("Status Code Distribution");
    for (status, n) in counts {
        table.row(vec![status.to_string(), n.to_string()]);
    }
    table
}

fn render_path(out: &mut String, palette: Palette, p: &PathReport) {
    out.push('\n');
    out.push_str(&palette.section(&format!("Results for {}", display_path(&p.path))));
    out.push('\n');

    match p.stats.as_ref() {
        Some(stats) => {
            stats_table(stats, p.error_count).render(out);
            status_table(p.status_counts.iter()).render(out);
        }
        None => {
            out.push_str(&palette.bad("No successful requests to analyze!"));
            out.push('\n');
        }
    }

    if p.error_count > 0 {
        out.push('\n');
        out.push_str(&palette.bad("Errors encountered:"));
        out.push('\n');
        for e in p.errors.iter().take(ERRORS_SHOWN_PER_PATH) {
            out.push_str(&format!("- {e}\n"));
        }
        let shown = p.errors.len().min(ERRORS_SHOWN_PER_PATH) as u64;
        if p.error_count > shown {
            out.push_str(&format!("... and {} more errors\n", p.error_count - shown));
        }
    }
}

fn render_security(out: &mut String, palette: Palette, rows: &[SecurityRow]) {
    out.push('\n');
    out.push_str(&palette.heading("Security Test Summary"));
    out.push('\n');
    let mut table = Table::new(&["Category", "Total", "Blocked", "Allowed", "Errors"]);
    for r in rows.iter() {
        table.row(vec![
            r.category.clone(),
            r.total.to_string(),
            r.blocked.to_string(),
            r.allowed.to_string(),
            r.errors.to_string(),
        ]);
    }
    table.render(out);
}

/// Render the report as tables. Color codes are only emitted when `styled`.
pub fn render(report: &ReportModel, styled: bool) -> String {
    let palette = Palette { styled };
    let mut out = String::new();

    out.push('\n');
    out.push_str(&palette.heading("Overall Test Results"));
    out.push('\n');

    for g in report.groups.iter() {
        out.push('\n');
        out.push_str(&palette.section(&format!(
            "{} ({} paths)",
            g.name, g.path_count
        )));
        out.push('\n');
        match &g.summary {
            GroupSummary::Stats {
                stats,
                status_counts,
                error_count,
            } => {
                stats_table(stats, *error_count).render(&mut out);
                status_table(status_counts.iter()).render(&mut out);
            }
            GroupSummary::NoRequests { error_count } => {
                out.push_str(&palette.bad(&format!(
                    "No successful requests to analyze! ({error_count} failed)"
                )));
                out.push('\n');
            }
        }
    }

    // per-path breakdown only for the plain page list; security groups stay aggregated
    if !report.run.security {
        for p in report.paths.iter() {
            render_path(&mut out, palette, p);
        }
    }

    if let Some(rows) = report.security.as_ref() {
        render_security(&mut out, palette, rows);
    }

    out
}
