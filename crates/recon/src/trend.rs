//! Trend over an ordered sequence of snapshots.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tabtrack_config::TrendSettings;
use tabtrack_core::Snapshot;

use crate::diff::diff;
use crate::error::ReconError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Increasing,
    Decreasing,
    Stable,
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotPoint {
    pub date: NaiveDate,
    pub records: usize,
    pub total_tablets: u64,
    pub total_open: u64,
}

impl SnapshotPoint {
    fn of(s: &Snapshot) -> Self {
        Self {
            date: s.date(),
            records: s.len(),
            total_tablets: s.total_tablets(),
            total_open: s.total_open(),
        }
    }
}

/// One consecutive pair of snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntervalReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub new: usize,
    pub closed: usize,
    pub modified: usize,
    pub closed_tablets: u64,
    pub added_tablets: u64,
    /// `closed_tablets - added_tablets`.
    pub net_tablet_delta: i64,
    pub pending_before: u64,
    pub pending_after: u64,
}

impl IntervalReport {
    /// Growth of pending tablets over the interval.
    pub fn pending_change(&self) -> i64 {
        -self.net_tablet_delta
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub series: Vec<SnapshotPoint>,
    pub intervals: Vec<IntervalReport>,
    /// Intervals the label was computed over.
    pub window: usize,
    pub label: TrendLabel,
}

/// `snapshots` must be in strictly increasing date order.
pub fn trend(snapshots: &[Snapshot], settings: &TrendSettings) -> Result<TrendReport, ReconError> {
    if snapshots.len() < 2 {
        return Err(ReconError::InsufficientSnapshots {
            found: snapshots.len(),
        });
    }
    for pair in snapshots.windows(2) {
        if pair[1].date() <= pair[0].date() {
            return Err(ReconError::NonMonotonicDate {
                last: pair[0].date(),
                date: pair[1].date(),
            });
        }
    }

    let intervals: Vec<IntervalReport> = snapshots
        .windows(2)
        .map(|pair| {
            let d = diff(&pair[0], &pair[1]);
            IntervalReport {
                from: pair[0].date(),
                to: pair[1].date(),
                new: d.summary.new,
                closed: d.summary.closed,
                modified: d.summary.modified,
                closed_tablets: d.summary.closed_tablets,
                added_tablets: d.summary.added_tablets,
                net_tablet_delta: d.summary.net_tablet_delta,
                pending_before: pair[0].total_tablets(),
                pending_after: pair[1].total_tablets(),
            }
        })
        .collect();

    let window = settings.window.clamp(1, intervals.len());
    let label = classify(&intervals[intervals.len() - window..], settings.stability_threshold);

    Ok(TrendReport {
        series: snapshots.iter().map(SnapshotPoint::of).collect(),
        intervals,
        window,
        label,
    })
}

/// Consistent movement beyond the threshold in every interval, else stable.
fn classify(recent: &[IntervalReport], threshold: f64) -> TrendLabel {
    let threshold = threshold.abs();
    let changes = || recent.iter().map(|i| i.pending_change() as f64);
    if changes().all(|c| c > threshold) {
        TrendLabel::Increasing
    } else if changes().all(|c| c < -threshold) {
        TrendLabel::Decreasing
    } else {
        TrendLabel::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabtrack_core::Record;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    /// One slip per tablet count, tablets numbered from 1.
    fn snap(d: u32, slips: &[(&str, usize)]) -> Snapshot {
        let records = slips
            .iter()
            .map(|(slip, n)| {
                let mut r = Record::new(*slip);
                r.tablet_ids = (1..=*n).map(|t| format!("{slip}{t}")).collect();
                r
            })
            .collect();
        Snapshot::new(day(d), records).unwrap()
    }

    #[test]
    fn rising_backlog_is_increasing() {
        let snaps = vec![
            snap(1, &[("A", 1)]),
            snap(2, &[("A", 1), ("B", 2)]),
            snap(3, &[("A", 1), ("B", 2), ("C", 1)]),
        ];
        let t = trend(&snaps, &TrendSettings::default()).unwrap();
        assert_eq!(t.label, TrendLabel::Increasing);
        assert_eq!(t.intervals.len(), 2);
        assert_eq!(t.window, 2);
        assert_eq!(t.intervals[0].net_tablet_delta, -2);
        assert_eq!(t.intervals[0].pending_before, 1);
        assert_eq!(t.intervals[0].pending_after, 3);
        assert_eq!(t.series[2].total_tablets, 4);
    }

    #[test]
    fn falling_backlog_is_decreasing() {
        let snaps = vec![
            snap(1, &[("A", 3), ("B", 2)]),
            snap(2, &[("B", 2)]),
            snap(3, &[("B", 1)]),
        ];
        let t = trend(&snaps, &TrendSettings::default()).unwrap();
        assert_eq!(t.label, TrendLabel::Decreasing);
        assert_eq!(t.intervals[1].closed_tablets, 1);
        assert_eq!(t.intervals[1].modified, 1);
    }

    #[test]
    fn mixed_or_small_moves_are_stable() {
        let snaps = vec![
            snap(1, &[("A", 1)]),
            snap(2, &[("A", 1), ("B", 2)]),
            snap(3, &[("B", 2)]),
        ];
        let t = trend(&snaps, &TrendSettings::default()).unwrap();
        assert_eq!(t.label, TrendLabel::Stable);

        let rising = vec![snap(1, &[("A", 1)]), snap(2, &[("A", 1), ("B", 2)])];
        let settings = TrendSettings {
            window: 3,
            stability_threshold: 2.0,
        };
        assert_eq!(trend(&rising, &settings).unwrap().label, TrendLabel::Stable);
    }

    #[test]
    fn window_limits_to_recent_intervals() {
        let snaps = vec![
            snap(1, &[("A", 5)]),
            snap(2, &[("A", 1)]),
            snap(3, &[("A", 1), ("B", 1)]),
            snap(4, &[("A", 1), ("B", 1), ("C", 1)]),
        ];
        let settings = TrendSettings {
            window: 2,
            stability_threshold: 0.0,
        };
        let t = trend(&snaps, &settings).unwrap();
        assert_eq!(t.label, TrendLabel::Increasing);
    }

    #[test]
    fn single_snapshot_is_an_error() {
        let err = trend(&[snap(1, &[])], &TrendSettings::default()).unwrap_err();
        assert_eq!(err, ReconError::InsufficientSnapshots { found: 1 });
    }

    #[test]
    fn out_of_order_input_is_rejected() {
        let snaps = vec![snap(2, &[]), snap(1, &[])];
        let err = trend(&snaps, &TrendSettings::default()).unwrap_err();
        assert!(matches!(err, ReconError::NonMonotonicDate { .. }));
    }
}
