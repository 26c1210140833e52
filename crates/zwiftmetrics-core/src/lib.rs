//! zwiftmetrics core library: decoding of Zwift player-state telemetry.
//!
//! The game broadcasts rider telemetry (power, heart rate, cadence, speed,
//! distance, elevation) in UDP datagrams whose payload resembles protobuf
//! but breaks generic decoders. This crate implements the purpose-built
//! decoder (varint reader, schema-less message walk, fixed telemetry
//! schema) and an offline pipeline that replays a PCAP/PCAPNG capture
//! through it into a deterministic report.
//!
//! Decoding is pure and synchronous: every call works on an immutable
//! payload and can run on any thread. All I/O is isolated in `source`.
//!
//! Invariants:
//! - Tags are one byte; field numbers above 15 are rejected.
//! - Nested bodies declare their length in one unsigned byte.
//! - The first occurrence of a field number wins.
//! - A payload that fails to decode never yields a partial packet.
//!
//! # Examples
//! ```
//! use zwiftmetrics_core::parse_telemetry_hex;
//!
//! let packet = parse_telemetry_hex("080210b9603a0f18e807301e485a58910160dc017832")?;
//! assert_eq!(packet.power, 220);
//! assert_eq!(packet.heart_rate, 145);
//! # Ok::<(), zwiftmetrics_core::ZwiftError>(())
//! ```
//!
//! ```no_run
//! use std::path::Path;
//!
//! use zwiftmetrics_core::{AnalysisConfig, analyze_pcap_file};
//!
//! let report = analyze_pcap_file(Path::new("ride.pcapng"), &AnalysisConfig::default())?;
//! println!("decoded packets: {}", report.telemetry.decoded);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
mod protocols;
mod source;

pub use analysis::{
    AnalysisConfig, AnalysisError, DEFAULT_MAX_FAILURE_EXAMPLES, RideStats, analyze_pcap_file,
    analyze_source,
};
pub use protocols::zwift::{
    DecodedMessage, DecodedValue, FieldPath, TelemetryPacket, ZWIFT_OUTGOING_PORT, ZwiftError,
    decode_hex, decode_message, map_telemetry, parse_telemetry, parse_telemetry_hex, read_varint,
};
pub use source::{PacketEvent, PacketSource, PcapFileSource, SourceError};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Analysis report with deterministic ordering.
///
/// # Examples
/// ```
/// use zwiftmetrics_core::make_stub_report;
///
/// let report = make_stub_report("ride.pcapng", 123);
/// assert_eq!(report.report_version, zwiftmetrics_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,

    /// Input capture metadata.
    pub input: InputInfo,

    /// Optional capture summary (may be empty when unavailable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Datagram and decode counters.
    pub telemetry: TelemetrySummary,
    /// Per-rider statistics sorted by user id.
    pub riders: Vec<RiderSummary>,
    /// Decode failures sorted by id.
    pub decode_failures: Vec<DecodeFailureSummary>,
    /// Every decoded packet in capture order, when requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<TelemetrySample>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "zwiftmetrics").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input capture metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Basic capture summary (timestamps may be absent).
///
/// # Examples
/// ```
/// use zwiftmetrics_core::CaptureSummary;
///
/// let summary = CaptureSummary {
///     packets_total: 10,
///     time_start: None,
///     time_end: None,
/// };
/// assert_eq!(summary.packets_total, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Total packet count observed in the capture.
    pub packets_total: u64,
    /// RFC3339 timestamp of the first packet (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the last packet (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Counters for datagrams addressed to the telemetry port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySummary {
    /// UDP destination port that was decoded.
    pub port: u16,
    /// Datagrams addressed to `port`.
    pub datagrams: u64,
    /// Datagrams decoded into a telemetry packet.
    pub decoded: u64,
    /// Datagrams skipped because decoding failed.
    pub failed: u64,
}

/// Last, average and maximum of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub last: i32,
    /// Mean rounded half away from zero.
    pub average: i32,
    pub max: i32,
}

/// Ride statistics for one rider.
///
/// # Examples
/// ```
/// use zwiftmetrics_core::RideStats;
///
/// let summary = RideStats::new().summary(12345);
/// assert_eq!(summary.zwift_user_id, 12345);
/// assert!(summary.power.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderSummary {
    pub zwift_user_id: i32,
    /// Decoded packets attributed to this rider.
    pub samples: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<MetricSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<MetricSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence: Option<MetricSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<MetricSummary>,
    /// Distance reported by the latest packet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<i64>,
    /// Elevation gain reported by the latest packet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_gain: Option<i64>,
    /// Earliest non-zero world timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world_time_start: Option<i64>,
    /// Latest non-zero world timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world_time_end: Option<i64>,
}

/// Decode failures sharing one error id.
///
/// # Examples
/// ```
/// use zwiftmetrics_core::DecodeFailureSummary;
///
/// let failure = DecodeFailureSummary {
///     id: "ZM-TRUNCATED-MESSAGE".to_string(),
///     message: "truncated message at offset 3: need 1 bytes, got 0".to_string(),
///     count: 1,
///     examples: vec!["source 10.0.0.1:50000 @ 1970-01-01T00:00:00Z".to_string()],
/// };
/// assert_eq!(failure.count, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeFailureSummary {
    /// Stable failure identifier (e.g., `ZM-SCHEMA-MISMATCH`).
    pub id: String,
    /// Message of the first failure with this id.
    pub message: String,
    /// Number of payloads that failed with this id.
    pub count: u64,
    /// At most `max_failure_examples` contexts, formatted as `source ip:port @ ts`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// One decoded packet with its capture context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// RFC3339 capture timestamp (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    /// Sender endpoint in `ip:port` form.
    pub src: String,
    pub packet: TelemetryPacket,
}

/// Build a stub report with base fields filled and empty aggregates.
///
/// # Examples
/// ```
/// use zwiftmetrics_core::make_stub_report;
///
/// let report = make_stub_report("ride.pcapng", 123);
/// assert_eq!(report.input.bytes, 123);
/// assert!(report.riders.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "zwiftmetrics".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        capture_summary: None,
        telemetry: TelemetrySummary::default(),
        riders: vec![],
        decode_failures: vec![],
        samples: vec![],
    }
}
