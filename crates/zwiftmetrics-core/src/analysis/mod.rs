use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::protocols::zwift::{ZWIFT_OUTGOING_PORT, parse_telemetry};
use crate::source::{PacketEvent, PacketSource, PcapFileSource, SourceError};
use crate::{
    CaptureSummary, DEFAULT_GENERATED_AT, InputInfo, Report, TelemetrySample, TelemetrySummary,
    make_stub_report,
};

mod failures;
mod stats;
mod udp;

pub use stats::RideStats;

use failures::FailureTally;
use udp::parse_udp_packet;

/// Examples kept per decode failure id unless configured otherwise.
pub const DEFAULT_MAX_FAILURE_EXAMPLES: usize = 3;

/// Knobs for a capture analysis run.
///
/// # Examples
/// ```
/// use zwiftmetrics_core::AnalysisConfig;
///
/// let config = AnalysisConfig {
///     include_samples: true,
///     ..AnalysisConfig::default()
/// };
/// assert_eq!(config.port, 3022);
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// UDP destination port carrying player-state datagrams.
    pub port: u16,
    /// Emit every decoded packet in `Report::samples`.
    pub include_samples: bool,
    /// Upper bound on examples recorded per failure id.
    pub max_failure_examples: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            port: ZWIFT_OUTGOING_PORT,
            include_samples: false,
            max_failure_examples: DEFAULT_MAX_FAILURE_EXAMPLES,
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

pub fn analyze_pcap_file(path: &Path, config: &AnalysisConfig) -> Result<Report, AnalysisError> {
    let source = PcapFileSource::open(path)?;
    let input = InputInfo {
        path: path.display().to_string(),
        bytes: path.metadata()?.len(),
    };
    analyze_source(input, source, config)
}

/// Decode every player-state datagram delivered by `source`.
///
/// Frames that are not UDP, or not addressed to the configured port, are
/// counted in the capture summary only. A payload that fails to decode is
/// tallied under its error id and skipped; it never aborts the run.
pub fn analyze_source<S: PacketSource>(
    input: InputInfo,
    mut source: S,
    config: &AnalysisConfig,
) -> Result<Report, AnalysisError> {
    let mut packets_total = 0u64;
    let mut first_ts = None;
    let mut last_ts = None;
    let mut telemetry = TelemetrySummary {
        port: config.port,
        datagrams: 0,
        decoded: 0,
        failed: 0,
    };
    let mut riders: HashMap<i32, RideStats> = HashMap::new();
    let mut failures = FailureTally::new(config.max_failure_examples);
    let mut samples = Vec::new();

    while let Some(PacketEvent { ts, linktype, data }) = source.next_packet()? {
        packets_total += 1;
        update_ts_bounds(&mut first_ts, &mut last_ts, ts);

        let datagram = match parse_udp_packet(linktype, &data) {
            Ok(Some(datagram)) => datagram,
            Ok(None) => continue,
            Err(err) => {
                tracing::trace!(error = %err, "frame skipped");
                continue;
            }
        };
        if !datagram.is_destined_to(config.port) {
            continue;
        }

        telemetry.datagrams += 1;
        match parse_telemetry(datagram.payload) {
            Ok(packet) => {
                telemetry.decoded += 1;
                riders
                    .entry(packet.zwift_user_id)
                    .or_default()
                    .record(&packet);
                if config.include_samples {
                    samples.push(TelemetrySample {
                        ts: ts_to_rfc3339(ts),
                        src: datagram.src.to_string(),
                        packet,
                    });
                }
            }
            Err(err) => {
                telemetry.failed += 1;
                tracing::debug!(
                    src = %datagram.src,
                    id = err.id(),
                    error = %err,
                    "skipping malformed player-state payload"
                );
                failures.record(&err, example_context(&datagram.src, ts));
            }
        }
    }

    tracing::info!(
        packets_total,
        datagrams = telemetry.datagrams,
        decoded = telemetry.decoded,
        failed = telemetry.failed,
        "capture analysed"
    );

    let mut report = make_stub_report(&input.path, input.bytes);
    report.capture_summary = Some(CaptureSummary {
        packets_total,
        time_start: ts_to_rfc3339(first_ts),
        time_end: ts_to_rfc3339(last_ts),
    });
    report.generated_at = report
        .capture_summary
        .as_ref()
        .and_then(|summary| summary.time_end.clone().or(summary.time_start.clone()))
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report.telemetry = telemetry;
    report.riders = {
        let mut riders: Vec<_> = riders
            .into_iter()
            .map(|(user_id, stats)| stats.summary(user_id))
            .collect();
        riders.sort_by_key(|rider| rider.zwift_user_id);
        riders
    };
    report.decode_failures = failures.into_summaries();
    report.samples = samples;
    Ok(report)
}

fn example_context(src: &SocketAddr, ts: Option<f64>) -> String {
    let when = ts_to_rfc3339(ts).unwrap_or_else(|| "unknown time".to_string());
    format!("source {src} @ {when}")
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: Option<f64>) {
    let Some(ts) = ts else {
        return;
    };
    if first.is_none_or(|existing| ts < existing) {
        *first = Some(ts);
    }
    if last.is_none_or(|existing| ts > existing) {
        *last = Some(ts);
    }
}

fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
