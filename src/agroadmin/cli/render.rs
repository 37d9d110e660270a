use super::styles::STYLES;
use agroadmin::api::{CmdMessage, DistanceEntry, MessageLevel, ProbeReport};
use agroadmin::geo::format_distance;
use agroadmin::index::DisplayRecord;
use agroadmin::lifecycle::LifecycleFilter;
use chrono::{DateTime, Utc};
use colored::Colorize;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 16;
const INDEX_WIDTH: usize = 6;

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => eprintln!("{}", message.content.red()),
        }
    }
}

/// One line per record: index, title, age. The bin shows when a record was
/// deleted rather than when it was created.
pub(super) fn render_record_list(records: &[DisplayRecord], filter: LifecycleFilter) -> String {
    if records.is_empty() {
        return match filter {
            LifecycleFilter::Active => "No records found.\n".to_string(),
            LifecycleFilter::Archived => "No archived records.\n".to_string(),
            LifecycleFilter::Deleted => "The recycle bin is empty.\n".to_string(),
        };
    }

    let mut out = String::new();
    for dr in records {
        let idx = format!("{}.", dr.index);
        let idx_padded = format!("{:<width$}", idx, width = INDEX_WIDTH);

        let stamp = match filter {
            LifecycleFilter::Deleted => dr.record.deleted_at.unwrap_or(dr.record.created_at),
            _ => dr.record.created_at,
        };
        let time = format_time_ago(stamp);

        let available = LINE_WIDTH.saturating_sub(INDEX_WIDTH + TIME_WIDTH + 2);
        let title = truncate_to_width(&dr.record.title(), available);
        let padding = available.saturating_sub(title.width());

        out.push_str(&format!(
            "  {}{}{}{}\n",
            STYLES.index(filter).apply_to(idx_padded),
            title,
            " ".repeat(padding),
            STYLES.time.apply_to(time)
        ));
    }
    out
}

pub(super) fn render_probe(report: &ProbeReport) -> String {
    let caps = &report.capabilities;
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    let model = report
        .model
        .map(|m| m.to_string())
        .unwrap_or_else(|| "none".to_string());

    let mut out = format!(
        "{} ({})\n",
        STYLES.heading.apply_to(&report.collection),
        report.table
    );
    out.push_str(&format!("  lifecycle model   {}\n", model));
    out.push_str(&format!("  status column     {}\n", yes_no(caps.has_status_column)));
    out.push_str(&format!("  deleted_at column {}\n", yes_no(caps.has_deleted_at_column)));
    out.push_str(&format!("  type column       {}\n", yes_no(caps.has_type_column)));
    if let Some(shadow) = &report.shadow_table {
        out.push_str(&format!(
            "  recycle-bin table {} ({})\n",
            shadow,
            if caps.uses_shadow_table { "in use" } else { "missing" }
        ));
    }
    out
}

pub(super) fn render_distances(entries: &[DistanceEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let label = truncate_to_width(&entry.label, 40);
        let padding = 40usize.saturating_sub(label.width());
        out.push_str(&format!(
            "  {}{}{:>10}\n    {}\n",
            label,
            " ".repeat(padding),
            format_distance(entry.km),
            STYLES.link.apply_to(entry.link.as_str())
        ));
    }
    out
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }
    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
