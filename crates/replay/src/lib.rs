//! Drowsiness Trace Replay
//!
//! Feeds a recorded EAR/MAR trace through a monitoring session frame by frame
//! and writes the per-frame status reports.

pub mod settings;
pub mod trace;

use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use drowsiness::{AlertLevel, MonitorSession, StatusReport};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub use settings::ReplaySettings;
pub use trace::{parse_line, TraceError, TraceRecord};

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One aligned text line per frame
    Text,
    /// One JSON object per frame
    Json,
}

/// Replay behaviour switches
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub format: OutputFormat,
    /// Pace frames at the configured frame rate
    pub realtime: bool,
    /// Acknowledge every DANGER report as soon as it is raised
    pub auto_ack: bool,
    /// Calibrate thresholds from the first face frames
    pub calibrate: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            realtime: false,
            auto_ack: false,
            calibrate: false,
        }
    }
}

/// Totals for one replay run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub frames: usize,
    pub no_face_frames: usize,
    pub warning_frames: usize,
    pub danger_frames: usize,
    /// Times the alert flag went from clear to set
    pub alerts_raised: usize,
    pub acknowledged: usize,
    pub max_score: f64,
    /// Thresholds applied by calibration
    pub calibrated: Option<(f64, f64)>,
    #[serde(skip)]
    alert_was_active: bool,
}

impl ReplaySummary {
    fn record(&mut self, report: &StatusReport) {
        self.frames += 1;
        match report.alert_level {
            AlertLevel::NoFace => {
                self.no_face_frames += 1;
                return;
            }
            AlertLevel::Warning => self.warning_frames += 1,
            AlertLevel::Danger => self.danger_frames += 1,
            AlertLevel::Safe => {}
        }
        if report.alert_active && !self.alert_was_active {
            self.alerts_raised += 1;
        }
        self.alert_was_active = report.alert_active;
        self.max_score = self.max_score.max(report.drowsiness_score);
    }
}

/// Initialize logging to stderr. `RUST_LOG` overrides the `info` default.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Replay a trace through `session`, writing one report per frame to `out`
pub async fn run_replay<R, W>(
    session: &mut MonitorSession,
    input: R,
    out: &mut W,
    options: &ReplayOptions,
) -> anyhow::Result<ReplaySummary>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let frame_rate = session.detector().config().frame_rate.max(1);
    let danger_score = session.detector().config().danger_score;
    let mut pacer = options
        .realtime
        .then(|| tokio::time::interval(Duration::from_secs_f64(1.0 / frame_rate as f64)));

    session.start();
    if options.calibrate {
        session.begin_calibration();
    }

    let mut summary = ReplaySummary::default();
    let mut lines = input.lines();
    let mut line_number = 0;

    while let Some(line) = lines.next_line().await.context("Failed to read trace")? {
        line_number += 1;
        let Some(record) = parse_line(&line, line_number)? else {
            continue;
        };

        if let Some(interval) = pacer.as_mut() {
            interval.tick().await;
        }

        let Some(report) = session.process(record.signal()) else {
            break;
        };
        summary.record(&report);
        write_report(out, &report, options.format, summary.frames, danger_score)?;
        if options.realtime {
            out.flush()?;
        }

        let calibrator = session.calibrator();
        if calibrator.is_active() && calibrator.sample_count() >= calibrator.required_samples() {
            finish_calibration(session, &mut summary);
        }

        if options.auto_ack && report.alert_level == AlertLevel::Danger {
            session.acknowledge_alert();
            summary.acknowledged += 1;
        }
    }

    if session.is_calibrating() {
        finish_calibration(session, &mut summary);
    }
    session.stop();
    out.flush()?;

    info!(
        frames = summary.frames,
        no_face_frames = summary.no_face_frames,
        warning_frames = summary.warning_frames,
        danger_frames = summary.danger_frames,
        alerts_raised = summary.alerts_raised,
        max_score = summary.max_score,
        "Replay finished"
    );
    Ok(summary)
}

fn finish_calibration(session: &mut MonitorSession, summary: &mut ReplaySummary) {
    match session.finish_calibration() {
        Ok(thresholds) => summary.calibrated = Some(thresholds),
        Err(e) => warn!(error = %e, "Calibration did not complete"),
    }
}

fn write_report<W: Write>(
    out: &mut W,
    report: &StatusReport,
    format: OutputFormat,
    frame: usize,
    danger_score: f64,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => writeln!(
            out,
            "{:>6} {:<8} ear={:.2} mar={:.2} score={:>6.1} ({:>3.0}%) yawns={} {}",
            frame,
            report.alert_level,
            report.ear,
            report.mar,
            report.drowsiness_score,
            report.score_percentage(danger_score),
            report.total_yawns,
            report.status_text()
        )?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, report)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
