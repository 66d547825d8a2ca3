//! Recurring-series schedule type and date arithmetic.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// How often a recurring document regenerates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "recurrence_frequency", rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    /// Anything outside the closed set is treated as monthly.
    pub fn from_string(s: &str) -> Self {
        match s {
            "weekly" => Frequency::Weekly,
            "yearly" => Frequency::Yearly,
            _ => Frequency::Monthly,
        }
    }
}

/// Next occurrence of a schedule anchored at `anchor`.
///
/// Month and year steps use calendar arithmetic. An end-of-month anchor is
/// clamped to the last valid day of the target month: Jan 31 + 1 month is
/// Feb 28 (or 29), while a yearly step keeps the day of month whenever the
/// target year has it.
pub fn next_occurrence(anchor: DateTime<Utc>, frequency: Frequency) -> DateTime<Utc> {
    match frequency {
        Frequency::Weekly => anchor + Duration::days(7),
        Frequency::Monthly => anchor + Months::new(1),
        Frequency::Yearly => anchor + Months::new(12),
    }
}
