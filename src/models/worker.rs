use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::{deserialize_due_date, deserialize_optional_date};
use super::fields::{deserialize_optional_id, deserialize_text};
use crate::status::today;

/// A worker under periodic medical surveillance.
///
/// `last_exam_date` and `next_exam_due` are derived: only the status engine
/// computes them (see `status::recalculate_worker_status`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub full_name: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub national_id: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub phone: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub job_role: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub department_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub workplace_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub notes: String,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub last_exam_date: Option<NaiveDate>,
    #[serde(default = "today", deserialize_with = "deserialize_due_date")]
    pub next_exam_due: NaiveDate,
}

impl Worker {
    /// A new, unsaved worker with no history: due today.
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            id: None,
            full_name: full_name.into(),
            national_id: String::new(),
            phone: String::new(),
            job_role: String::new(),
            department_id: None,
            workplace_id: None,
            start_date: None,
            notes: String::new(),
            last_exam_date: None,
            next_exam_due: today(),
        }
    }
}
