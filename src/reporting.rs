use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Result};
use chrono::Utc;
use itertools::Itertools;
use plotly::{
    common::{DashType, Font, Line, Marker, MarkerSymbol, Mode, Title},
    layout::{Axis, AxisType, BarMode},
    Bar, Configuration, Layout, Plot, Scatter,
};

use crate::aggregate::{
    detect_regressions, latest_per_configuration, time_ordered_series, AnalysisStatus,
    RegressionAnalysis, RegressionConfig,
};
use crate::data::{short_hash, FlatRow, Snapshot};
use crate::flatten::flatten;
use crate::stats;

/// RGBA color for regression markers. Red with 80% opacity.
const REGRESSION_COLOR: &str = "rgba(220, 53, 69, 0.8)";

/// Color for the regression threshold line.
const THRESHOLD_LINE_COLOR: &str = "gray";

/// Qualitative palette for per-series traces.
const TRACE_COLORS: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Timestamp format used for plot x-axes; plotly parses this as a date.
const PLOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default HTML document wrapped around the generated plots.
///
/// Placeholders are substituted in [`apply_template`]. The plotly.js library
/// script is included once in the head; each plot body is an inline div plus
/// script that assumes the library is already loaded.
const DEFAULT_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{{TITLE}}</title>
    {{PLOTLY_HEAD}}
    <style>
        body { font-family: Arial, sans-serif; margin: 20px; }
        .plot-container { margin: 20px 0; }
        .summary { background-color: #f0f0f0; padding: 15px; border-radius: 5px; margin-bottom: 20px; }
        h1, h2 { color: #333; }
        .metric { display: inline-block; margin: 10px 20px; }
        .metric-value { font-size: 1.5em; font-weight: bold; color: #0066cc; }
        .metric-label { font-size: 0.9em; color: #666; }
        .note { color: #666; font-style: italic; }
    </style>
</head>
<body>
    <h1>{{TITLE}}</h1>
    {{SUMMARY}}
    {{PLOTS}}
    <footer class="note">Generated {{TIMESTAMP}}</footer>
</body>
</html>"#;

/// Metadata rendered into the report's summary header.
struct ReportMetadata {
    title: String,
    generated_at: String,
    latest_commit: String,
    latest_run: String,
    build_config: String,
    operations_tested: usize,
    mean_throughput: f64,
}

impl ReportMetadata {
    fn new(rows: &[FlatRow], latest: &[FlatRow]) -> ReportMetadata {
        let generated_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

        let latest_row = rows.iter().max_by_key(|r| r.parsed_at);
        let (latest_commit, latest_run, build_config) = match latest_row {
            Some(row) => (
                row.commit_short.clone(),
                row.timestamp.clone(),
                row.build_config.clone(),
            ),
            None => ("unknown".to_string(), "unknown".to_string(), "unknown".to_string()),
        };

        let operations_tested = rows
            .iter()
            .map(|r| r.operation_name.as_str())
            .unique()
            .count();

        let throughputs: Vec<f64> = latest.iter().map(|r| r.throughput_mops).collect();
        let mean_throughput = stats::aggregate_measurements(throughputs.iter()).mean;

        ReportMetadata {
            title: "PRISM Performance Dashboard".to_string(),
            generated_at,
            latest_commit,
            latest_run,
            build_config,
            operations_tested,
            mean_throughput,
        }
    }

    fn summary_html(&self, analysis: &RegressionAnalysis) -> String {
        let regression_note = match analysis.status {
            AnalysisStatus::RegressionsDetected => format!(
                "<div class=\"metric\"><div class=\"metric-value\">{}</div>\
                 <div class=\"metric-label\">Regressions Detected</div></div>",
                analysis.events.len()
            ),
            AnalysisStatus::NoRegressions => "<div class=\"metric\"><div class=\"metric-value\">none</div>\
                 <div class=\"metric-label\">Regressions Detected</div></div>"
                .to_string(),
            AnalysisStatus::NoData => String::new(),
        };

        format!(
            "<div class=\"summary\">\n\
             <h2>Latest Benchmark Summary</h2>\n\
             <div class=\"metric\"><div class=\"metric-value\">{}</div><div class=\"metric-label\">Latest Commit</div></div>\n\
             <div class=\"metric\"><div class=\"metric-value\">{}</div><div class=\"metric-label\">Timestamp</div></div>\n\
             <div class=\"metric\"><div class=\"metric-value\">{}</div><div class=\"metric-label\">Build Config</div></div>\n\
             <div class=\"metric\"><div class=\"metric-value\">{}</div><div class=\"metric-label\">Operations Tested</div></div>\n\
             <div class=\"metric\"><div class=\"metric-value\">{:.2}</div><div class=\"metric-label\">Mean Throughput (MOPS)</div></div>\n\
             {}\n\
             </div>",
            self.latest_commit,
            self.latest_run,
            self.build_config,
            self.operations_tested,
            self.mean_throughput,
            regression_note,
        )
    }
}

/// Extract plotly.js dependencies and plot content.
///
/// `plotly_head` holds the script tags loading plotly.js from CDN;
/// `plotly_body` is the inline div plus script for the plot itself, which
/// assumes the library is already available on the page.
fn extract_plotly_parts(plot: &Plot) -> (String, String) {
    let plotly_head = Plot::online_cdn_js();
    let plotly_body = plot.to_inline_html(None);
    (plotly_head, plotly_body)
}

fn apply_template(
    template: &str,
    metadata: &ReportMetadata,
    summary: &str,
    plot_bodies: &str,
) -> String {
    let (plotly_head, _) = extract_plotly_parts(&Plot::new());

    template
        .replace("{{TITLE}}", &metadata.title)
        .replace("{{PLOTLY_HEAD}}", &plotly_head)
        .replace("{{SUMMARY}}", summary)
        .replace("{{PLOTS}}", plot_bodies)
        .replace("{{TIMESTAMP}}", &metadata.generated_at)
}

fn new_plot() -> Plot {
    let config = Configuration::default().responsive(true).fill_frame(false);
    let mut plot = Plot::new();
    plot.set_configuration(config);
    plot
}

/// Grouped bar chart of the latest throughput per configuration, one bar
/// group per operation.
fn throughput_comparison_plot(latest: &[FlatRow]) -> Plot {
    let mut plot = new_plot();

    let operations: Vec<&str> = latest
        .iter()
        .map(|r| r.operation_name.as_str())
        .unique()
        .collect();

    for (i, operation) in operations.iter().enumerate() {
        let op_rows = latest
            .iter()
            .filter(|r| r.operation_name == *operation)
            .collect_vec();

        let x: Vec<String> = op_rows
            .iter()
            .map(|r| format!("{} {}", r.data_type, r.vector_size))
            .collect();
        let y: Vec<f64> = op_rows.iter().map(|r| r.throughput_mops).collect();
        let hover: Vec<String> = op_rows
            .iter()
            .map(|r| {
                format!(
                    "{}<br>Configuration: {} {}<br>Throughput: {:.2} MOPS",
                    r.operation_name, r.data_type, r.vector_size, r.throughput_mops
                )
            })
            .collect();

        let trace = Bar::new(x, y)
            .name(*operation)
            .marker(Marker::new().color(TRACE_COLORS[i % TRACE_COLORS.len()]))
            .hover_text_array(hover);
        plot.add_trace(trace);
    }

    let layout = Layout::new()
        .title(Title::from("Throughput Comparison (Latest Results)"))
        .bar_mode(BarMode::Group)
        .x_axis(
            Axis::new()
                .title(Title::from("Data Type and Vector Size"))
                .tick_angle(-45.0)
                .tick_font(Font::new().family("monospace")),
        )
        .y_axis(Axis::new().title(Title::from("Throughput (MOPS)")))
        .height(600);
    plot.set_layout(layout);

    plot
}

/// Scatter of detected regressions over time, one trace per operation,
/// with a dashed line marking the configured threshold.
fn regression_plot(analysis: &RegressionAnalysis, config: &RegressionConfig) -> Plot {
    let mut plot = new_plot();

    let operations: Vec<String> = analysis
        .events
        .iter()
        .map(|e| e.key.operation_name.clone())
        .unique()
        .collect();

    for (i, operation) in operations.iter().enumerate() {
        let events = analysis
            .events
            .iter()
            .filter(|e| e.key.operation_name == *operation)
            .collect_vec();

        let x: Vec<String> = events
            .iter()
            .map(|e| e.timestamp.format(PLOT_TIMESTAMP_FORMAT).to_string())
            .collect();
        let y: Vec<f64> = events.iter().map(|e| e.change_percent()).collect();
        let hover: Vec<String> = events
            .iter()
            .map(|e| {
                format!(
                    "{}<br>Performance Change: {:.1}%<br>Commit: {}<br>Config: {} {}<br>\
                     Before: {:.2} MOPS<br>After: {:.2} MOPS",
                    e.key.operation_name,
                    e.change_percent(),
                    short_hash(&e.to_commit),
                    e.key.data_type,
                    e.key.vector_size,
                    e.prev_throughput,
                    e.curr_throughput
                )
            })
            .collect();

        let trace = Scatter::new(x, y)
            .mode(Mode::Markers)
            .name(operation)
            .marker(
                Marker::new()
                    .color(TRACE_COLORS[i % TRACE_COLORS.len()])
                    .symbol(MarkerSymbol::X)
                    .size(10),
            )
            .hover_text_array(hover);
        plot.add_trace(trace);
    }

    // Dashed threshold line spanning the event time range.
    if !analysis.events.is_empty() {
        let mut timestamps: Vec<_> = analysis.events.iter().map(|e| e.timestamp).collect();
        timestamps.sort();
        let x = vec![
            timestamps[0].format(PLOT_TIMESTAMP_FORMAT).to_string(),
            timestamps[timestamps.len() - 1]
                .format(PLOT_TIMESTAMP_FORMAT)
                .to_string(),
        ];
        let threshold_pct = -config.threshold * 100.0;
        let trace = Scatter::new(x, vec![threshold_pct, threshold_pct])
            .mode(Mode::Lines)
            .name(format!("Threshold ({:.0}%)", config.threshold * 100.0))
            .line(
                Line::new()
                    .color(THRESHOLD_LINE_COLOR)
                    .dash(DashType::Dash)
                    .width(2.0),
            );
        plot.add_trace(trace);
    }

    let title = if analysis.events.is_empty() {
        "No performance regressions detected".to_string()
    } else {
        format!(
            "Performance Regressions (>{:.0}% degradation)",
            config.threshold * 100.0
        )
    };

    let layout = Layout::new()
        .title(Title::from(title.as_str()))
        .x_axis(Axis::new().title(Title::from("Time")))
        .y_axis(Axis::new().title(Title::from("Performance Change (%)")))
        .height(500);
    plot.set_layout(layout);

    plot
}

/// Trend lines for one operation: median time over commit time, one trace
/// per data type and vector size.
fn performance_trend_plot(operation: &str, rows: &[FlatRow]) -> Plot {
    let mut plot = new_plot();

    let op_rows = rows
        .iter()
        .filter(|r| r.operation_name == operation)
        .cloned()
        .collect_vec();

    for (i, (key, group)) in time_ordered_series(&op_rows).iter().enumerate() {
        let x: Vec<String> = group
            .iter()
            .map(|r| r.parsed_at.format(PLOT_TIMESTAMP_FORMAT).to_string())
            .collect();
        let y: Vec<f64> = group.iter().map(|r| r.median_time).collect();
        let hover: Vec<String> = group
            .iter()
            .map(|r| {
                format!(
                    "Median Time: {:.2} ns<br>Commit: {}<br>Throughput: {:.2} MOPS",
                    r.median_time, r.commit_short, r.throughput_mops
                )
            })
            .collect();

        let trace = Scatter::new(x, y)
            .mode(Mode::LinesMarkers)
            .name(format!("{} {} (median)", key.data_type, key.vector_size))
            .line(Line::new().color(TRACE_COLORS[i % TRACE_COLORS.len()]))
            .hover_text_array(hover);
        plot.add_trace(trace);
    }

    let layout = Layout::new()
        .title(Title::from(
            format!("Performance Trend: {operation} Operation").as_str(),
        ))
        .x_axis(Axis::new().title(Title::from("Time")))
        .y_axis(Axis::new().title(Title::from("Execution Time (ns)")))
        .height(500);
    plot.set_layout(layout);

    plot
}

/// Throughput over vector size for one operation, latest data only,
/// log-scaled x-axis. One trace per data type.
fn size_scaling_plot(operation: &str, latest: &[FlatRow]) -> Plot {
    let mut plot = new_plot();

    let op_rows = latest
        .iter()
        .filter(|r| r.operation_name == operation)
        .collect_vec();

    let data_types: Vec<&str> = op_rows.iter().map(|r| r.data_type.as_str()).unique().collect();

    for (i, data_type) in data_types.iter().enumerate() {
        let mut dtype_rows = op_rows
            .iter()
            .filter(|r| r.data_type == *data_type)
            .collect_vec();
        dtype_rows.sort_by_key(|r| r.vector_size);

        let x: Vec<u64> = dtype_rows.iter().map(|r| r.vector_size).collect();
        let y: Vec<f64> = dtype_rows.iter().map(|r| r.throughput_mops).collect();
        let hover: Vec<String> = dtype_rows
            .iter()
            .map(|r| {
                format!(
                    "Vector Size: {}<br>Throughput: {:.2} MOPS",
                    r.vector_size, r.throughput_mops
                )
            })
            .collect();

        let trace = Scatter::new(x, y)
            .mode(Mode::LinesMarkers)
            .name(*data_type)
            .line(Line::new().color(TRACE_COLORS[i % TRACE_COLORS.len()]))
            .marker(Marker::new().size(8))
            .hover_text_array(hover);
        plot.add_trace(trace);
    }

    let layout = Layout::new()
        .title(Title::from(
            format!("Performance Scaling: {operation}").as_str(),
        ))
        .x_axis(
            Axis::new()
                .title(Title::from("Vector Size"))
                .type_(AxisType::Log),
        )
        .y_axis(Axis::new().title(Title::from("Throughput (MOPS)")))
        .height(500);
    plot.set_layout(layout);

    plot
}

/// Renders the complete report document from loaded snapshots.
///
/// Fails only when there is nothing to render; individual data-quality
/// problems were already handled upstream by the loader and flattener.
pub fn render_report(snapshots: &[Snapshot], config: &RegressionConfig) -> Result<String> {
    let rows = flatten(snapshots);
    if rows.is_empty() {
        bail!("No benchmark data available for report generation");
    }

    let latest = latest_per_configuration(&rows);
    let analysis = detect_regressions(&rows, config);

    log::info!(
        "Loaded {} snapshots with {} data points across {} configurations; {} regression(s)",
        snapshots.len(),
        rows.len(),
        analysis.configurations_analyzed,
        analysis.events.len()
    );

    let metadata = ReportMetadata::new(&rows, &latest);
    let summary = metadata.summary_html(&analysis);

    let operations: Vec<String> = rows
        .iter()
        .map(|r| r.operation_name.clone())
        .unique()
        .collect();

    let mut plots = vec![
        throughput_comparison_plot(&latest),
        regression_plot(&analysis, config),
    ];
    for operation in &operations {
        plots.push(performance_trend_plot(operation, &rows));
    }
    for operation in &operations {
        plots.push(size_scaling_plot(operation, &latest));
    }

    let plot_bodies: String = plots
        .iter()
        .map(|plot| {
            let (_, body) = extract_plotly_parts(plot);
            format!("<div class=\"plot-container\">{body}</div>\n")
        })
        .collect();

    Ok(apply_template(
        DEFAULT_HTML_TEMPLATE,
        &metadata,
        &summary,
        &plot_bodies,
    ))
}

/// Renders the report and writes it to `output`.
pub fn generate_report(
    snapshots: &[Snapshot],
    output: &Path,
    config: &RegressionConfig,
) -> Result<()> {
    let html = render_report(snapshots, config)?;
    File::create(output)?.write_all(html.as_bytes())?;
    log::info!("Performance report generated: {}", output.display());
    Ok(())
}
