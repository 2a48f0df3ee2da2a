//! Exam workflow on top of the store: every exam write is followed by a
//! recomputation of the owning worker's derived fields.

use std::cmp::Reverse;

use crate::db::{Store, StoreError};
use crate::models::{Decision, DecisionStatus, Exam, ExamStatus, Worker};
use crate::status::{newest_finalized_exam, recalculate_worker_status};

/// Result of saving an exam: the stored exam and its refreshed worker.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedExam {
    pub exam: Exam,
    pub worker: Worker,
}

fn worker_not_found(id: i64) -> StoreError {
    StoreError::NotFound {
        entity_type: "worker".into(),
        id,
    }
}

/// Recompute `last_exam_date`/`next_exam_due` from the full history and save.
fn refresh(store: &mut Store, mut worker: Worker) -> Result<Worker, StoreError> {
    let exams: Vec<Exam> = store
        .get_exams()?
        .into_iter()
        .filter(|e| worker.id == Some(e.worker_id))
        .collect();
    let status = recalculate_worker_status(&exams);
    status.apply_to(&mut worker);
    tracing::debug!(
        worker_id = worker.id,
        exams = exams.len(),
        next_exam_due = %status.next_exam_due,
        "Worker status recalculated"
    );
    store.save_worker(worker)
}

/// Save an exam and refresh its worker. Fails if the worker does not exist.
pub fn record_exam(store: &mut Store, exam: Exam) -> Result<RecordedExam, StoreError> {
    let worker = store
        .get_worker(exam.worker_id)?
        .ok_or_else(|| worker_not_found(exam.worker_id))?;
    let exam = store.save_exam(exam)?;
    let worker = refresh(store, worker)?;
    Ok(RecordedExam { exam, worker })
}

/// Attach a decision dated on the exam day, close the exam and record it.
pub fn close_exam(store: &mut Store, mut exam: Exam, status: DecisionStatus) -> Result<RecordedExam, StoreError> {
    exam.decision = Some(Decision {
        status,
        date: Some(exam.exam_date),
    });
    exam.status = ExamStatus::Closed;
    record_exam(store, exam)
}

/// Delete an exam. Returns the refreshed owner when the exam existed and its
/// worker is still on file.
pub fn remove_exam(store: &mut Store, exam_id: i64) -> Result<Option<Worker>, StoreError> {
    let owner = store
        .get_exams()?
        .iter()
        .find(|e| e.id == Some(exam_id))
        .map(|e| e.worker_id);
    let Some(worker_id) = owner else {
        return Ok(None);
    };
    if !store.delete_exam(exam_id)? {
        return Ok(None);
    }
    match store.get_worker(worker_id)? {
        Some(worker) => Ok(Some(refresh(store, worker)?)),
        None => Ok(None),
    }
}

pub fn refresh_worker_status(store: &mut Store, worker_id: i64) -> Result<Worker, StoreError> {
    let worker = store
        .get_worker(worker_id)?
        .ok_or_else(|| worker_not_found(worker_id))?;
    refresh(store, worker)
}

/// Delete a worker. Their exams stay stored but no view reaches them.
pub fn remove_worker(store: &mut Store, worker_id: i64) -> Result<bool, StoreError> {
    if !store.delete_worker(worker_id)? {
        return Ok(false);
    }
    let orphaned = store
        .get_exams()?
        .iter()
        .filter(|e| e.worker_id == worker_id)
        .count();
    if orphaned > 0 {
        tracing::info!(worker_id, orphaned, "Worker removed, exams kept");
    }
    Ok(true)
}

/// A worker's exams, newest first.
pub fn worker_history(exams: &[Exam], worker_id: i64) -> Vec<Exam> {
    let mut history: Vec<Exam> = exams
        .iter()
        .filter(|e| e.worker_id == worker_id)
        .cloned()
        .collect();
    history.sort_by_key(|e| Reverse((e.exam_date, e.id.unwrap_or(i64::MIN))));
    history
}

/// Decision of the worker's newest finalized exam.
pub fn latest_decision(exams: &[Exam], worker_id: i64) -> Option<DecisionStatus> {
    let own: Vec<Exam> = exams
        .iter()
        .filter(|e| e.worker_id == worker_id)
        .cloned()
        .collect();
    newest_finalized_exam(&own).and_then(Exam::decision_status)
}

/// Workers whose name (case-insensitive) or national id contains `query`,
/// optionally restricted to one department.
pub fn filter_workers<'a>(workers: &'a [Worker], query: &str, department_id: Option<i64>) -> Vec<&'a Worker> {
    let needle = query.trim().to_lowercase();
    workers
        .iter()
        .filter(|w| department_id.is_none() || w.department_id == department_id)
        .filter(|w| {
            needle.is_empty()
                || w.full_name.to_lowercase().contains(&needle)
                || w.national_id.contains(&needle)
        })
        .collect()
}
