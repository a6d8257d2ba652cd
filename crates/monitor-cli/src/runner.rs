//! Per-subject replay runner
//!
//! Every subject gets a task owning its monitor, detector and alert
//! manager. Frames reach the task through a bounded channel, so frames of
//! one subject are classified strictly in input order while different
//! subjects proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use alerting::{AlertManager, AlertOutcome};
use chrono::{DateTime, Duration, TimeZone, Utc};
use dms::{DrowsinessMonitor, FrameAnalysis, LandmarkFrame, ReplayDetector};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::settings::MonitorSettings;
use crate::MonitorError;

/// One output line
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub subject: String,
    pub sequence: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    /// Human-readable status line for the frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<FrameAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertOutcome>,
    /// Per-frame error; the subject's state is unaffected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FrameReport {
    fn analyzed(frame: &LandmarkFrame, analysis: FrameAnalysis, alert: AlertOutcome) -> Self {
        Self {
            subject: frame.subject.clone(),
            sequence: frame.sequence,
            timestamp_ms: frame.timestamp_ms,
            status: Some(analysis.status_text()),
            analysis: Some(analysis),
            alert: Some(alert).filter(|a| a != &AlertOutcome::default()),
            error: None,
        }
    }

    fn failed(frame: &LandmarkFrame, error: String) -> Self {
        Self {
            subject: frame.subject.clone(),
            sequence: frame.sequence,
            timestamp_ms: frame.timestamp_ms,
            status: None,
            analysis: None,
            alert: None,
            error: Some(error),
        }
    }
}

/// Totals for one subject
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubjectSummary {
    pub subject: String,
    pub frames: u64,
    pub errors: u64,
    pub alerts: usize,
}

/// Totals for one replay
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub lines_read: u64,
    pub malformed_lines: u64,
    pub reports_written: u64,
    pub subjects: Vec<SubjectSummary>,
}

/// Replay all frames from `input`, writing JSON reports to `output`
///
/// Returns the summary and the writer once every subject task finished.
pub async fn run<R, W>(
    input: R,
    output: W,
    settings: MonitorSettings,
) -> Result<(RunSummary, W), MonitorError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    settings.validate()?;
    let settings = Arc::new(settings);

    let (report_tx, report_rx) = mpsc::channel(settings.channel_capacity);
    let writer = tokio::spawn(write_reports(report_rx, output));

    let mut router = SubjectRouter::new(Arc::clone(&settings), report_tx);
    let mut summary = RunSummary::default();

    // Subject tasks are wound down even when reading fails part way
    let dispatched = dispatch(input, &mut router, &mut summary).await;
    summary.subjects = router.finish().await?;

    let (written, output) = writer.await.map_err(|e| MonitorError::Task(e.to_string()))??;
    summary.reports_written = written;
    dispatched?;

    info!(
        "Replay finished: {} lines, {} subjects, {} reports",
        summary.lines_read,
        summary.subjects.len(),
        summary.reports_written
    );
    Ok((summary, output))
}

/// Read newline-delimited frames and route each to its subject
///
/// Lines are split on raw bytes, so a line that is not UTF-8 is counted as
/// malformed like any other unparsable line.
async fn dispatch<R>(
    input: R,
    router: &mut SubjectRouter,
    summary: &mut RunSummary,
) -> Result<(), MonitorError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.split(b'\n');
    while let Some(mut line) = lines.next_segment().await? {
        summary.lines_read += 1;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let frame: LandmarkFrame = match serde_json::from_slice(&line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping malformed line {}: {}", summary.lines_read, e);
                summary.malformed_lines += 1;
                continue;
            }
        };

        router.route(frame).await?;
    }
    Ok(())
}

/// Owns the per-subject channels and tasks of one replay
struct SubjectRouter {
    settings: Arc<MonitorSettings>,
    reports: mpsc::Sender<FrameReport>,
    routes: HashMap<String, mpsc::Sender<LandmarkFrame>>,
    tasks: Vec<JoinHandle<Result<SubjectSummary, MonitorError>>>,
}

impl SubjectRouter {
    fn new(settings: Arc<MonitorSettings>, reports: mpsc::Sender<FrameReport>) -> Self {
        Self {
            settings,
            reports,
            routes: HashMap::new(),
            tasks: Vec::new(),
        }
    }

    async fn route(&mut self, frame: LandmarkFrame) -> Result<(), MonitorError> {
        let route = match self.routes.get(&frame.subject) {
            Some(tx) => tx.clone(),
            None => {
                info!("Tracking new subject: {}", frame.subject);
                let (tx, rx) = mpsc::channel(self.settings.channel_capacity);
                self.tasks.push(tokio::spawn(track_subject(
                    frame.subject.clone(),
                    rx,
                    self.reports.clone(),
                    Arc::clone(&self.settings),
                )));
                self.routes.insert(frame.subject.clone(), tx.clone());
                tx
            }
        };

        route
            .send(frame)
            .await
            .map_err(|_| MonitorError::Task("subject task stopped early".into()))
    }

    /// Close every subject's stream and collect the summaries, sorted by subject
    async fn finish(self) -> Result<Vec<SubjectSummary>, MonitorError> {
        // Closing the routes ends each subject's stream
        drop(self.routes);
        drop(self.reports);

        let mut subjects = Vec::with_capacity(self.tasks.len());
        for task in self.tasks {
            subjects.push(task.await.map_err(|e| MonitorError::Task(e.to_string()))??);
        }
        subjects.sort_by(|a, b| a.subject.cmp(&b.subject));
        Ok(subjects)
    }
}

async fn track_subject(
    subject: String,
    mut frames: mpsc::Receiver<LandmarkFrame>,
    reports: mpsc::Sender<FrameReport>,
    settings: Arc<MonitorSettings>,
) -> Result<SubjectSummary, MonitorError> {
    let mut monitor = DrowsinessMonitor::new(settings.dms.clone())?;
    let mut detector = ReplayDetector::new(settings.scheme);
    let mut alerts = AlertManager::new(settings.alerts.clone());
    let mut clock = FrameClock::new(settings.dms.frame_interval_ms);
    let mut summary = SubjectSummary {
        subject: subject.clone(),
        ..Default::default()
    };

    while let Some(frame) = frames.recv().await {
        summary.frames += 1;

        let at = clock.time_of(&frame);
        let report = match monitor.analyze_frame(&mut detector, &frame) {
            Ok(analysis) => {
                let outcome = alerts.observe(analysis.label, at);
                FrameReport::analyzed(&frame, analysis, outcome)
            }
            Err(e) => {
                warn!("Frame {} of {} not classified: {}", frame.sequence, subject, e);
                summary.errors += 1;
                FrameReport::failed(&frame, e.to_string())
            }
        };

        if reports.send(report).await.is_err() {
            debug!("Report channel closed, stopping {}", subject);
            break;
        }
    }

    summary.alerts = alerts.history().count();
    debug!("Subject {} finished: {:?}", subject, summary);
    Ok(summary)
}

/// Capture times of one subject's frames
///
/// A frame without a usable timestamp is placed one frame interval after the
/// previous frame; only the subject's first frame falls back to the wall clock.
struct FrameClock {
    interval: Duration,
    last: Option<DateTime<Utc>>,
}

impl FrameClock {
    fn new(frame_interval_ms: u64) -> Self {
        let interval = i64::try_from(frame_interval_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .unwrap_or(Duration::MAX);
        Self { interval, last: None }
    }

    fn time_of(&mut self, frame: &LandmarkFrame) -> DateTime<Utc> {
        let stamped = frame
            .timestamp_ms
            .and_then(|ms| i64::try_from(ms).ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

        let at = match (stamped, self.last) {
            (Some(at), _) => at,
            (None, Some(last)) => last.checked_add_signed(self.interval).unwrap_or(last),
            (None, None) => Utc::now(),
        };
        self.last = Some(at);
        at
    }
}

async fn write_reports<W>(
    mut reports: mpsc::Receiver<FrameReport>,
    mut output: W,
) -> Result<(u64, W), MonitorError>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    while let Some(report) = reports.recv().await {
        let mut line = serde_json::to_vec(&report)?;
        line.push(b'\n');
        output.write_all(&line).await?;
        written += 1;
    }
    output.flush().await?;
    Ok((written, output))
}
