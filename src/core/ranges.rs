//! Range registry: id bands and the status policy each band enforces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::document::Status;
use crate::error::{Error, Result};

/// Policy for one contiguous, inclusive band of ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangePolicy {
    pub low: u32,
    pub high: u32,
    pub name: String,
    pub allowed_statuses: BTreeSet<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_status: Option<Status>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub forbidden_statuses: BTreeSet<Status>,
}

impl RangePolicy {
    pub fn contains(&self, id: u32) -> bool {
        self.low <= id && id <= self.high
    }

    fn overlaps(&self, other: &RangePolicy) -> bool {
        self.low <= other.high && other.low <= self.high
    }
}

/// Read-only, ordered, non-overlapping set of range policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeRegistry {
    ranges: Vec<RangePolicy>,
}

impl RangeRegistry {
    /// Build a registry, rejecting inverted bounds and overlapping ranges.
    pub fn new(mut ranges: Vec<RangePolicy>) -> Result<Self> {
        for range in &ranges {
            if range.low > range.high {
                return Err(Error::config_invalid_value(
                    "ranges",
                    Some(format!("{}-{}", range.low, range.high)),
                    format!("Range '{}' has low > high", range.name),
                ));
            }
        }

        ranges.sort_by_key(|r| r.low);

        for pair in ranges.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(Error::config_invalid_value(
                    "ranges",
                    Some(format!(
                        "{}-{} / {}-{}",
                        pair[0].low, pair[0].high, pair[1].low, pair[1].high
                    )),
                    format!("Ranges '{}' and '{}' overlap", pair[0].name, pair[1].name),
                ));
            }
        }

        Ok(Self { ranges })
    }

    /// Policy whose band contains `id`. `None` means no range is defined for
    /// it, which callers must treat as an error rather than fall back.
    pub fn policy_for(&self, id: u32) -> Option<&RangePolicy> {
        let idx = self.ranges.partition_point(|r| r.high < id);
        self.ranges.get(idx).filter(|r| r.contains(id))
    }

    pub fn ranges(&self) -> &[RangePolicy] {
        &self.ranges
    }
}

impl Default for RangeRegistry {
    fn default() -> Self {
        Self {
            ranges: default_ranges(),
        }
    }
}

fn policy(low: u32, high: u32, name: &str, allowed: &[Status]) -> RangePolicy {
    RangePolicy {
        low,
        high,
        name: name.to_string(),
        allowed_statuses: allowed.iter().copied().collect(),
        required_status: None,
        forbidden_statuses: BTreeSet::new(),
    }
}

/// The stock band table, already sorted and disjoint.
pub fn default_ranges() -> Vec<RangePolicy> {
    use Status::*;

    const STANDARD: &[Status] = &[Draft, Final, Superseded];

    let mut constitutional = policy(0, 99, "Constitutional/Meta", &[Final]);
    constitutional.required_status = Some(Final);

    let mut learning = policy(10000, 19999, "Learning Paths", &[Draft, Research]);
    learning.forbidden_statuses.insert(Final);

    let mut research = policy(50000, 59999, "Research Indexes", &[Research]);
    research.forbidden_statuses.insert(Final);

    vec![
        constitutional,
        policy(100, 999, "Core Protocols", STANDARD),
        policy(1000, 1999, "Chain Specifications", STANDARD),
        policy(
            2000,
            2999,
            "DAO, Governance & ESG",
            &[Draft, Final, Superseded, Research],
        ),
        policy(3000, 3999, "Solidity, Tokens & Web3", STANDARD),
        policy(4000, 4999, "Cryptography/PQC", STANDARD),
        policy(5000, 5999, "AI/Attestation", STANDARD),
        policy(6000, 6999, "Bridges/Interop", STANDARD),
        policy(7000, 7999, "Threshold/MPC", STANDARD),
        policy(8000, 8999, "ZK/Privacy", STANDARD),
        policy(9000, 9999, "DeFi/Markets", STANDARD),
        learning,
        research,
    ]
}
