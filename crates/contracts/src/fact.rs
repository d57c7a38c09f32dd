//! Fact - the unit of work flowing through the relay

use serde::{Deserialize, Serialize};

/// One KPI fact to be saved downstream.
///
/// Field names double as the form keys sent by the HTTP sink, so renaming a
/// field changes the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub period_start: String,
    pub period_end: String,
    /// Period granularity (e.g., "month")
    pub period_key: String,
    pub indicator_to_mo_id: i64,
    pub indicator_to_mo_fact_id: i64,
    pub value: i64,
    pub fact_time: String,
    /// 0 = actual value, 1 = plan
    pub is_plan: i64,
    pub auth_user_id: i64,
    #[serde(default)]
    pub comment: String,
}

/// A fact together with its producer-assigned sequence number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactEnvelope {
    /// Monotonic per-producer sequence, starts at 1
    pub seq: u64,
    pub fact: Fact,
}

impl FactEnvelope {
    pub fn new(seq: u64, fact: Fact) -> Self {
        Self { seq, fact }
    }
}
