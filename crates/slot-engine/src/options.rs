//! Behaviour switches shared by the resolver and the validator.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;

/// How the resolver drops candidates that collide with existing bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotExclusion {
    /// Drop a candidate only when a meeting starts at exactly the same instant.
    /// A meeting that partially overlaps the candidate does not remove it.
    ExactStart,
    /// Drop a candidate whose interval overlaps any booked interval.
    #[default]
    Overlap,
}

impl FromStr for SlotExclusion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact-start" => Ok(SlotExclusion::ExactStart),
            "overlap" => Ok(SlotExclusion::Overlap),
            other => Err(format!(
                "Unknown slot exclusion: '{}'. Expected exact-start or overlap",
                other
            )),
        }
    }
}

/// How the validator decides that a proposed interval fits a rule window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Containment {
    /// Compare the instant's UTC time-of-day against the rule's raw
    /// `start_time`/`end_time`, ignoring the rule's timezone.
    RawTimeOfDay,
    /// Localize each rule window into its own timezone on the instant's local
    /// date, the same conversion the resolver performs.
    #[default]
    RuleLocal,
}

impl FromStr for Containment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw-time-of-day" => Ok(Containment::RawTimeOfDay),
            "rule-local" => Ok(Containment::RuleLocal),
            other => Err(format!(
                "Unknown containment mode: '{}'. Expected raw-time-of-day or rule-local",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineOptions {
    pub exclusion: SlotExclusion,
    pub containment: Containment,
    pub dst_policy: DstPolicy,
}

impl EngineOptions {
    /// Exact-start exclusion and raw time-of-day containment.
    pub fn legacy() -> Self {
        Self {
            exclusion: SlotExclusion::ExactStart,
            containment: Containment::RawTimeOfDay,
            dst_policy: DstPolicy::ShiftForward,
        }
    }
}
