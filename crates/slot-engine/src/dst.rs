//! DST transition policies for wall-clock availability windows.

use std::str::FromStr;

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Policy for rule boundaries that fall in a spring-forward gap.
///
/// Ambiguous wall-clock times (fall back) always resolve to the earliest instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DstPolicy {
    /// Drop the window: a boundary inside the gap has no instant.
    Skip,
    /// Read the gap time with the offset in force before the transition,
    /// which lands it after the gap (02:30 -> 03:30 for a one-hour jump).
    #[default]
    ShiftForward,
}

impl FromStr for DstPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(DstPolicy::Skip),
            "shift-forward" => Ok(DstPolicy::ShiftForward),
            other => Err(format!(
                "Unknown DST policy: '{}'. Expected skip or shift-forward",
                other
            )),
        }
    }
}

/// Convert a wall-clock time in `tz` to UTC under `policy`.
///
/// Returns `None` only for a gap time under [`DstPolicy::Skip`].
pub fn localize(tz: Tz, local: NaiveDateTime, policy: DstPolicy) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => match policy {
            DstPolicy::Skip => None,
            DstPolicy::ShiftForward => {
                // A day earlier is safely before the transition.
                let before = tz
                    .offset_from_utc_datetime(&(local - Duration::days(1)))
                    .fix();
                let utc = local - Duration::seconds(i64::from(before.local_minus_utc()));
                Some(utc.and_utc())
            }
        },
    }
}
