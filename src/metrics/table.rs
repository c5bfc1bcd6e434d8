//! Result table rendering.
//!
//! Every method becomes one row of 14 numbers: EPE and R2[%] for
//! static FG/BG, dynamic FG/BG and overall FG/BG/total. EPE is printed with
//! 3 decimals, R2[%] with 2; undefined means print as `-`.

use super::evaluation::{MethodSummary, RegionSummary};
use std::str::FromStr;

/// Output format of the result table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableFormat {
    /// LaTeX `table` environment.
    #[default]
    Latex,
    /// Aligned plain text.
    Text,
}

impl FromStr for TableFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latex" | "tex" => Ok(TableFormat::Latex),
            "text" | "txt" => Ok(TableFormat::Text),
            other => Err(format!("unknown table format '{}' (expected latex or text)", other)),
        }
    }
}

/// Render summaries in the given format.
pub fn render_table(summaries: &[MethodSummary], format: TableFormat) -> String {
    match format {
        TableFormat::Latex => render_latex(summaries),
        TableFormat::Text => render_text(summaries),
    }
}

const COLUMN_GROUPS: [&str; 7] = [
    "FG (Static)",
    "BG (Static)",
    "FG (Dynamic)",
    "BG (Dynamic)",
    "FG (all)",
    "BG (all)",
    "Total",
];

/// The regions of a summary row in column order.
fn row_regions(summary: &MethodSummary) -> [&RegionSummary; 7] {
    [
        &summary.static_scenes.fg,
        &summary.static_scenes.bg,
        &summary.dynamic_scenes.fg,
        &summary.dynamic_scenes.bg,
        &summary.overall.fg,
        &summary.overall.bg,
        &summary.overall.total,
    ]
}

fn format_value(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

/// Formatted (EPE, R2[%]) cells of one row.
fn row_cells(summary: &MethodSummary) -> Vec<String> {
    row_regions(summary)
        .iter()
        .flat_map(|r| [format_value(r.ee, 3), format_value(r.r2_percent, 2)])
        .collect()
}

fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '_' | '%' | '&' | '#' | '$' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Render summaries as a LaTeX table.
pub fn render_latex(summaries: &[MethodSummary]) -> String {
    let mut out = String::new();
    out.push_str("\\begin{table} \n \\centering \\begin{tabular}{l|crcr|crcr|crcrcr|r} \n");
    out.push_str("\\hline \n ");
    out.push_str("\\multicolumn{1}{c|}{} & \\multicolumn{2}{|c}{FG (Static) } & \\multicolumn{2}{c|} { BG (Static)} & ");
    out.push_str("\\multicolumn{2}{|c}{FG (Dynamic)} & \\multicolumn{2}{c|}{ BG (Dynamic)} & ");
    out.push_str("\\multicolumn{2}{c}{FG($\\varnothing$)}&\\multicolumn{2}{c}{BG ($\\varnothing$)} & ");
    out.push_str("\\multicolumn{2}{c|}{$\\varnothing$}  \\\\ \n ");
    out.push_str("\\multicolumn{1}{c|}{}");
    for _ in 0..COLUMN_GROUPS.len() {
        out.push_str("& EPE & R2[\\%]");
    }
    out.push_str(" \\\\ \n ");

    for summary in summaries {
        out.push_str(&escape_latex(&summary.method));
        for cell in row_cells(summary) {
            out.push_str(&format!(" & {}", cell));
        }
        out.push_str(" \\\\ \n");
    }

    out.push_str("\\end{tabular} \n \\vspace{0.1cm} \n");
    out.push_str("\\caption{Evaluation results common optical flow metrics. ");
    out.push_str("Dynamic comprised sequences with and static without camera motion, ");
    out.push_str("BG - background motion vectors and FG - motion vectors located at persons of the crowd.} \n");
    out.push_str("\\end{table}");
    out
}

/// Render summaries as an aligned plain-text table.
pub fn render_text(summaries: &[MethodSummary]) -> String {
    const CELL: usize = 8;
    let group_width = 2 * CELL + 1;

    let method_width = summaries
        .iter()
        .map(|s| s.method.chars().count())
        .max()
        .unwrap_or(0)
        .max("Method".len());

    let mut out = String::new();

    out.push_str(&format!("{:<w$}", "", w = method_width));
    for group in COLUMN_GROUPS {
        out.push_str(&format!(" | {:^w$}", group, w = group_width));
    }
    out.push('\n');

    out.push_str(&format!("{:<w$}", "Method", w = method_width));
    for _ in COLUMN_GROUPS {
        out.push_str(&format!(" | {:>w$} {:>w$}", "EPE", "R2[%]", w = CELL));
    }
    out.push('\n');

    let rule_len = method_width + COLUMN_GROUPS.len() * (group_width + 3);
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');

    for summary in summaries {
        out.push_str(&format!("{:<w$}", summary.method, w = method_width));
        for pair in row_cells(summary).chunks(2) {
            out.push_str(&format!(" | {:>w$} {:>w$}", pair[0], pair[1], w = CELL));
        }
        out.push('\n');
    }

    out
}
