//! Plain-text views printed by the commands.

use mrportal_core::map::marker_color;
use mrportal_core::{Action, MrSummary, ReportKind, ReportTable, RouteMap, TaskBoard, TaskStatus};

fn controls(actions: &[Action]) -> String {
    actions.iter().map(|a| a.label()).collect::<Vec<_>>().join(" | ")
}

/// KPI line, then one section per bucket. Controls only appear on an editable board.
pub fn schedule(subject: &str, board: &TaskBoard) -> String {
    let mut out = String::new();
    let date = board.date().unwrap_or("-");
    let mode = if board.is_editable() { "" } else { " (read-only)" };
    out.push_str(&format!("# Schedule for {subject} on {date}{mode}\n\n"));

    let buckets = board.project();
    let s = buckets.summary();
    out.push_str(&format!(
        "Total: {} | Planned: {} | Completed: {} | Cancelled: {}\n",
        s.total, s.planned, s.completed, s.cancelled
    ));

    if buckets.is_empty() {
        out.push_str("\nNo activities scheduled.\n");
        return out;
    }

    for status in TaskStatus::ALL {
        let tasks = buckets.bucket(status);
        out.push_str(&format!("\n## {} ({})\n", status.bucket_label(), tasks.len()));
        for t in tasks {
            out.push_str(&format!("- [{}] {} {}", t.activity_id, t.time_window(), t.customer_name));
            if !t.locality.is_empty() {
                out.push_str(&format!(" ({})", t.locality));
            }
            if let Some(phone) = t.phone() {
                out.push_str(&format!(" tel {phone}"));
            }
            if board.is_processing(&t.activity_id) {
                out.push_str("  [updating]");
            }
            let actions = board.controls_for(&t.activity_id);
            if !actions.is_empty() {
                out.push_str(&format!("  -> {}", controls(actions)));
            }
            out.push('\n');
            if !t.suggested_talking_points.is_empty() {
                out.push_str(&format!("    talking points: {}\n", t.suggested_talking_points));
            }
        }
    }
    out
}

pub fn route(map: &RouteMap) -> String {
    if map.stops.is_empty() {
        return format!(
            "No plottable activities. Map centre {:.4}, {:.4}\n",
            map.center.0, map.center.1
        );
    }
    let mut out = String::new();
    for s in &map.stops {
        out.push_str(&format!(
            "{:>3}. {:.5}, {:.5}  {} [{}] {} {}\n",
            s.number,
            s.latitude,
            s.longitude,
            s.customer_name,
            s.activity_id,
            s.status,
            marker_color(s.status)
        ));
    }
    match map.polyline() {
        Some(line) => out.push_str(&format!("\nRoute: {} points\n", line.len())),
        None => out.push_str("\nRoute: single stop, no line\n"),
    }
    out
}

/// One page of a report as aligned columns, 1-based `page`.
pub fn report_page(kind: ReportKind, table: &ReportTable, page: usize, page_size: usize) -> String {
    let mut out = format!("# {}\n\n", kind.label());

    if let (Some(total), Some(done)) = (table.total_activities, table.completed_activities) {
        out.push_str(&format!("Total activities: {total} | Completed: {done}\n\n"));
    }

    let columns = table.columns();
    if columns.is_empty() {
        out.push_str("No data for this period.\n");
        return out;
    }

    let rows: Vec<Vec<String>> = table
        .page(page, page_size)
        .iter()
        .map(|r| table.cells(r, &columns))
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| {
        let joined = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ");
        format!("{}\n", joined.trim_end())
    };
    out.push_str(&line(&columns));
    for r in &rows {
        out.push_str(&line(r));
    }
    out.push_str(&format!(
        "\nPage {} of {} ({} rows)\n",
        page.max(1),
        table.page_count(page_size).max(1),
        table.len()
    ));
    out
}

pub fn roster(list: &[MrSummary]) -> String {
    if list.is_empty() {
        return "No MRs found.\n".to_string();
    }
    list.iter().map(|m| format!("- {}\n", m.label())).collect()
}
