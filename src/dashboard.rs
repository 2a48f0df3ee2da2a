//! Dashboard aggregation over the whole dataset.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Exam, Worker};
use crate::status::{is_due_soon_on, is_overdue_on, newest_exam, today};

/// A worker whose most recent exam has a positive lab result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCase {
    pub worker: Worker,
    pub exam: Exam,
}

/// A scheduled retest for an active positive case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retest {
    pub worker: Worker,
    pub exam: Exam,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub due_soon: Vec<Worker>,
    pub overdue: Vec<Worker>,
    pub active_positive: Vec<ActiveCase>,
    pub retests: Vec<Retest>,
}

/// Counts shown on the dashboard cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub due_soon: usize,
    pub overdue: usize,
    pub active_positive: usize,
    pub retests: usize,
}

impl DashboardStats {
    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary {
            due_soon: self.due_soon.len(),
            overdue: self.overdue.len(),
            active_positive: self.active_positive.len(),
            retests: self.retests.len(),
        }
    }
}

pub fn get_dashboard_stats(workers: &[Worker], exams: &[Exam]) -> DashboardStats {
    get_dashboard_stats_on(workers, exams, today())
}

/// Overdue takes precedence over due-soon, so the two lists never overlap.
/// Exams whose worker no longer exists are ignored.
pub fn get_dashboard_stats_on(workers: &[Worker], exams: &[Exam], today: NaiveDate) -> DashboardStats {
    let mut stats = DashboardStats::default();

    let mut by_worker: HashMap<i64, Vec<Exam>> = HashMap::new();
    for exam in exams {
        by_worker.entry(exam.worker_id).or_default().push(exam.clone());
    }

    for worker in workers {
        let due = Some(worker.next_exam_due);
        if is_overdue_on(due, today) {
            stats.overdue.push(worker.clone());
        } else if is_due_soon_on(due, today) {
            stats.due_soon.push(worker.clone());
        }

        let latest = worker
            .id
            .and_then(|id| by_worker.get(&id))
            .and_then(|history| newest_exam(history));

        if let Some(exam) = latest.filter(|e| e.is_positive()) {
            if let Some(date) = exam.retest_date() {
                stats.retests.push(Retest {
                    worker: worker.clone(),
                    exam: exam.clone(),
                    date,
                });
            }
            stats.active_positive.push(ActiveCase {
                worker: worker.clone(),
                exam: exam.clone(),
            });
        }
    }

    stats.retests.sort_by_key(|r| r.date);

    tracing::debug!(
        due_soon = stats.due_soon.len(),
        overdue = stats.overdue.len(),
        active_positive = stats.active_positive.len(),
        retests = stats.retests.len(),
        "Dashboard computed"
    );

    stats
}
