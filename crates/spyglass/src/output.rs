use std::io::IsTerminal;

use chrono::SecondsFormat;
use owo_colors::OwoColorize;
use spyglass_core::model::trace::TraceSummary;
use spyglass_core::query::StatusResponse;
use spyglass_core::waterfall::Waterfall;

const LABEL_WIDTH: usize = 32;

pub fn print_waterfall_human(trace_id: &str, layout: &Waterfall, columns: usize) {
    let color = std::io::stdout().is_terminal();
    match layout.window {
        Some(window) => println!(
            "TRACE {} window=[{}, {}] duration={} spans={}",
            trace_id,
            window.start,
            window.end,
            window.duration(),
            layout.bars.len()
        ),
        None => {
            println!("TRACE {trace_id} spans=0");
            return;
        }
    }

    for bar in &layout.bars {
        let label = truncate(&format!("{}{}", "  ".repeat(bar.depth), bar.name), LABEL_WIDTH);
        let track = render_track(bar.offset_percent, bar.width_percent, columns);
        let track = if color {
            track
                .chars()
                .map(|c| if c == '█' { c.green().to_string() } else { c.bright_black().to_string() })
                .collect::<String>()
        } else {
            track
        };
        println!(
            "{label:<LABEL_WIDTH$} |{track}| {:>6.2}% +{:.2}%",
            bar.width_percent, bar.offset_percent
        );
    }
}

pub fn print_traces_human(v: &[TraceSummary]) {
    for item in v {
        let duration = item
            .duration
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "trace={} spans={} duration={} created={}",
            item.trace_id,
            item.span_count,
            duration,
            item.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
    }
    println!("-- {} traces --", v.len());
}

pub fn print_status_human(v: &StatusResponse) {
    println!("db_path={}", v.db_path);
    println!("db_size_bytes={}", v.db_size_bytes);
    println!(
        "traces={} users={} sessions={}",
        v.traces_count, v.users_count, v.sessions_count
    );
    if let Some(newest) = v.newest_trace_at {
        println!(
            "newest_trace={}",
            newest.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
    }
}

/// One waterfall row as `columns` cells: `█` inside the bar, `·` outside.
/// A bar with any width always occupies at least one cell.
pub fn render_track(offset_percent: f64, width_percent: f64, columns: usize) -> String {
    if columns == 0 {
        return String::new();
    }
    let start = ((offset_percent / 100.0) * columns as f64).floor() as usize;
    let start = start.min(columns - 1);
    let len = ((width_percent / 100.0) * columns as f64).round() as usize;
    let end = (start + len.max(1)).min(columns);

    (0..columns)
        .map(|i| if i >= start && i < end { '█' } else { '·' })
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
