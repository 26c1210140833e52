use crate::protocols::zwift::TelemetryPacket;
use crate::{MetricSummary, RiderSummary};

#[derive(Debug, Default, Clone, Copy)]
struct MetricStats {
    last: i32,
    max: i32,
    total: i64,
    count: u64,
}

impl MetricStats {
    fn record(&mut self, value: i32) {
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.last = value;
        self.total += i64::from(value);
        self.count += 1;
    }

    fn summary(&self) -> Option<MetricSummary> {
        if self.count == 0 {
            return None;
        }
        let average = (self.total as f64 / self.count as f64).round() as i32;
        Some(MetricSummary {
            last: self.last,
            average,
            max: self.max,
        })
    }
}

/// Running statistics for one rider, fed once per decoded packet.
///
/// The accumulator never looks at decoder internals; it only consumes
/// finished [`TelemetryPacket`]s.
///
/// # Examples
/// ```
/// use zwiftmetrics_core::{RideStats, TelemetryPacket};
///
/// let mut stats = RideStats::new();
/// for power in [200, 250] {
///     stats.record(&TelemetryPacket {
///         connection_status_id: 1,
///         zwift_user_id: 42,
///         world_timestamp: 0,
///         distance: 10,
///         speed: 30,
///         cadence: 90,
///         heart_rate: 140,
///         power,
///         elevation_gain: 0,
///     });
/// }
/// let summary = stats.summary(42);
/// assert_eq!(summary.power.unwrap().average, 225);
/// assert_eq!(summary.power.unwrap().max, 250);
/// ```
#[derive(Debug, Default, Clone)]
pub struct RideStats {
    samples: u64,
    power: MetricStats,
    heart_rate: MetricStats,
    cadence: MetricStats,
    speed: MetricStats,
    distance: Option<i64>,
    elevation_gain: Option<i64>,
    world_time_start: Option<i64>,
    world_time_end: Option<i64>,
}

impl RideStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn record(&mut self, packet: &TelemetryPacket) {
        self.samples += 1;
        self.power.record(packet.power);
        self.heart_rate.record(packet.heart_rate);
        self.cadence.record(packet.cadence);
        self.speed.record(packet.speed);
        self.distance = Some(packet.distance);
        self.elevation_gain = Some(packet.elevation_gain);

        // Zero means the datagram carried no world clock.
        if packet.world_timestamp != 0 {
            let ts = packet.world_timestamp;
            self.world_time_start = Some(self.world_time_start.map_or(ts, |start| start.min(ts)));
            self.world_time_end = Some(self.world_time_end.map_or(ts, |end| end.max(ts)));
        }
    }

    /// Start a new lap: totals, counts and maxima are cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn summary(&self, zwift_user_id: i32) -> RiderSummary {
        RiderSummary {
            zwift_user_id,
            samples: self.samples,
            power: self.power.summary(),
            heart_rate: self.heart_rate.summary(),
            cadence: self.cadence.summary(),
            speed: self.speed.summary(),
            distance: self.distance,
            elevation_gain: self.elevation_gain,
            world_time_start: self.world_time_start,
            world_time_end: self.world_time_end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RideStats;
    use crate::protocols::zwift::TelemetryPacket;

    fn packet(power: i32, heart_rate: i32, world_timestamp: i64) -> TelemetryPacket {
        TelemetryPacket {
            connection_status_id: 1,
            zwift_user_id: 7,
            world_timestamp,
            distance: 1000,
            speed: 30,
            cadence: 90,
            heart_rate,
            power,
            elevation_gain: 12,
        }
    }

    #[test]
    fn empty_stats_have_no_metrics() {
        let summary = RideStats::new().summary(7);
        assert_eq!(summary.samples, 0);
        assert!(summary.power.is_none());
        assert!(summary.distance.is_none());
    }

    #[test]
    fn tracks_last_average_and_max() {
        let mut stats = RideStats::new();
        stats.record(&packet(100, 120, 0));
        stats.record(&packet(300, 150, 0));
        stats.record(&packet(201, 130, 0));

        let summary = stats.summary(7);
        assert_eq!(summary.samples, 3);
        let power = summary.power.unwrap();
        assert_eq!(power.last, 201);
        assert_eq!(power.max, 300);
        assert_eq!(power.average, 200);
        let heart_rate = summary.heart_rate.unwrap();
        assert_eq!(heart_rate.max, 150);
        assert_eq!(heart_rate.average, 133);
        assert_eq!(summary.distance, Some(1000));
        assert_eq!(summary.elevation_gain, Some(12));
    }

    #[test]
    fn average_rounds_half_away_from_zero() {
        let mut stats = RideStats::new();
        stats.record(&packet(100, 0, 0));
        stats.record(&packet(101, 0, 0));
        assert_eq!(stats.summary(7).power.unwrap().average, 101);
    }

    #[test]
    fn world_time_bounds_ignore_missing_clock() {
        let mut stats = RideStats::new();
        stats.record(&packet(100, 100, 0));
        stats.record(&packet(100, 100, 5_000));
        stats.record(&packet(100, 100, 4_000));

        let summary = stats.summary(7);
        assert_eq!(summary.world_time_start, Some(4_000));
        assert_eq!(summary.world_time_end, Some(5_000));
    }

    #[test]
    fn reset_starts_a_new_lap() {
        let mut stats = RideStats::new();
        stats.record(&packet(400, 180, 10));
        stats.reset();
        stats.record(&packet(150, 110, 20));

        let summary = stats.summary(7);
        assert_eq!(summary.samples, 1);
        assert_eq!(summary.power.unwrap().max, 150);
        assert_eq!(summary.heart_rate.unwrap().max, 110);
        assert_eq!(summary.world_time_start, Some(20));
    }
}
