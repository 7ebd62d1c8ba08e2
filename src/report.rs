//! Turns a [`RunReport`] into user-facing events and a track usage table.

use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use serde_json::json;

use crate::danmaku::RunReport;
use crate::ui::prelude::{Level, OutputFormat, emit, get_output_format, print_block};

#[derive(Debug, Clone)]
pub(crate) struct ReportLine {
    pub(crate) level: Level,
    pub(crate) code: &'static str,
    pub(crate) message: String,
    pub(crate) data: Option<serde_json::Value>,
}

impl ReportLine {
    fn new(level: Level, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            code,
            message: message.into(),
            data: None,
        }
    }

    fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

pub(crate) fn report_lines(report: &RunReport) -> Vec<ReportLine> {
    let mut lines = Vec::new();

    lines.push(
        ReportLine::new(
            Level::Info,
            "barrage.layout.parsed",
            format!(
                "Parsed {} of {} comment records",
                report.records_accepted, report.records_total
            ),
        )
        .with_data(json!({
            "total": report.records_total,
            "accepted": report.records_accepted,
            "skipped_malformed": report.skipped_malformed,
            "skipped_empty": report.skipped_empty,
        })),
    );

    if report.skipped() > 0 {
        lines.push(ReportLine::new(
            Level::Warn,
            "barrage.layout.skipped",
            format!(
                "Skipped {} record(s): {} with a bad timestamp, {} without text",
                report.skipped(),
                report.skipped_malformed,
                report.skipped_empty
            ),
        ));
    }

    if let (Some(first), Some(last)) = (report.first_timestamp, report.last_timestamp) {
        lines.push(ReportLine::new(
            Level::Info,
            "barrage.layout.range",
            format!(
                "Comments span {first:.2}s - {last:.2}s ({:.2}s, {:.2} per second)",
                report.span(),
                report.overall_density
            ),
        ));
    }

    for window in &report.windows {
        let line = ReportLine::new(
            Level::Debug,
            "barrage.layout.window",
            format!(
                "Window {}: {} comments, {:.2} per second{}",
                window.index,
                window.count,
                window.density,
                if window.overloaded { " (spread)" } else { "" }
            ),
        );
        lines.push(line.with_data(json!(window)));
    }

    let overloaded = report.overloaded_windows().count();
    if overloaded > 0 {
        lines.push(ReportLine::new(
            Level::Info,
            "barrage.layout.smoothed",
            format!("Spread start times in {overloaded} dense window(s)"),
        ));
    }

    if report.clamped_starts > 0 {
        lines.push(ReportLine::new(
            Level::Warn,
            "barrage.layout.clamped",
            format!(
                "{} comment(s) have negative timestamps and will start at 0:00:00.00",
                report.clamped_starts
            ),
        ));
    }

    lines
}

pub(crate) fn track_usage_table(usage: &[usize]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Track", "Comments"]);
    for (track, count) in usage.iter().enumerate() {
        table.add_row(vec![Cell::new(track), Cell::new(count)]);
    }
    table.add_row(vec![
        Cell::new("total"),
        Cell::new(usage.iter().sum::<usize>()),
    ]);
    table.to_string()
}

pub(crate) fn emit_run_report(report: &RunReport) {
    for line in report_lines(report) {
        emit(line.level, line.code, &line.message, line.data);
    }

    if report.records_accepted == 0 {
        return;
    }
    match get_output_format() {
        OutputFormat::Json => emit(
            Level::Info,
            "barrage.layout.tracks",
            "Track usage",
            Some(json!({ "usage": report.track_usage })),
        ),
        OutputFormat::Text => print_block(&track_usage_table(&report.track_usage)),
    }
}
