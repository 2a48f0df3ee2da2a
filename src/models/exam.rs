use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::{deserialize_date, deserialize_optional_date};
use super::enums::{DecisionStatus, ExamStatus, LabOutcome};
use super::fields::{deserialize_id, deserialize_optional_id, deserialize_or_default, deserialize_text};

/// One medical visit for a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "deserialize_id")]
    pub worker_id: i64,
    #[serde(deserialize_with = "deserialize_date")]
    pub exam_date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub physician_name: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub notes: String,
    #[serde(default, deserialize_with = "deserialize_or_default")]
    pub status: ExamStatus,
    #[serde(default)]
    pub lab_result: Option<LabResult>,
    #[serde(default)]
    pub treatment: Option<Treatment>,
    #[serde(default)]
    pub decision: Option<Decision>,
}

/// Stool parasitology result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    pub result: LabOutcome,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub parasite: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub drug: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub dose: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub duration: String,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub retest_date: Option<NaiveDate>,
}

/// Fitness decision closing an exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub status: DecisionStatus,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date: Option<NaiveDate>,
}

impl Exam {
    /// A new open exam with no lab result, treatment or decision.
    pub fn new(worker_id: i64, exam_date: NaiveDate) -> Self {
        Self {
            id: None,
            worker_id,
            exam_date,
            physician_name: String::new(),
            notes: String::new(),
            status: ExamStatus::Open,
            lab_result: None,
            treatment: None,
            decision: None,
        }
    }

    pub fn decision_status(&self) -> Option<DecisionStatus> {
        self.decision.as_ref().map(|d| d.status)
    }

    pub fn is_positive(&self) -> bool {
        matches!(
            self.lab_result,
            Some(LabResult { result: LabOutcome::Positive, .. })
        )
    }

    pub fn retest_date(&self) -> Option<NaiveDate> {
        self.treatment.as_ref().and_then(|t| t.retest_date)
    }
}
