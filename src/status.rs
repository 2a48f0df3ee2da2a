//! Status engine: due-date arithmetic and the exam-history reducer.
//!
//! Everything here is pure. Functions that depend on the current date come
//! in pairs: `foo(..)` reads the local calendar date, `foo_on(.., today)`
//! takes it explicitly so callers (and tests) can pin the clock.
//!
//! All comparisons work on calendar dates; there is no time-of-day component.

use chrono::{Days, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Exam, Worker};

/// Periodic exam cycle for fit workers.
pub const EXAM_INTERVAL_MONTHS: u32 = 6;
/// Window before the due date in which a worker shows as "due soon".
pub const DUE_WARNING_DAYS: i64 = 15;
/// Retest window when an unfit decision carries no explicit retest date.
pub const RETEST_INTERVAL_DAYS_DEFAULT: u32 = 7;

/// Derived scheduling fields of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub last_exam_date: Option<NaiveDate>,
    pub next_exam_due: NaiveDate,
}

impl WorkerStatus {
    pub fn apply_to(&self, worker: &mut Worker) {
        worker.last_exam_date = self.last_exam_date;
        worker.next_exam_due = self.next_exam_due;
    }
}

/// Current local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Canonical `YYYY-MM-DD` serialisation.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse `YYYY-MM-DD`, or the date part of an ISO timestamp.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        let head = s.get(..10)?;
        let rest = &s[10..];
        if rest.starts_with('T') || rest.starts_with(' ') {
            NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
        } else {
            None
        }
    })
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

pub fn calculate_next_exam_due(last_exam_date: Option<NaiveDate>) -> NaiveDate {
    calculate_next_exam_due_on(last_exam_date, today())
}

/// Never examined means due now; otherwise six months after the last exam.
/// Month arithmetic clamps to the last day of the month (Aug 31 -> Feb 28).
pub fn calculate_next_exam_due_on(last_exam_date: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    match last_exam_date {
        None => today,
        Some(last) => add_months(last, EXAM_INTERVAL_MONTHS),
    }
}

pub fn is_due_soon(due: Option<NaiveDate>) -> bool {
    is_due_soon_on(due, today())
}

/// True when the due date falls within the next `DUE_WARNING_DAYS` days,
/// today included. A missing due date counts as due soon.
pub fn is_due_soon_on(due: Option<NaiveDate>, today: NaiveDate) -> bool {
    match due {
        None => true,
        Some(due) => (0..=DUE_WARNING_DAYS).contains(&(due - today).num_days()),
    }
}

pub fn is_overdue(due: Option<NaiveDate>) -> bool {
    is_overdue_on(due, today())
}

/// True when the due date is at least one full day in the past.
/// Due today is not overdue. A missing due date is overdue.
pub fn is_overdue_on(due: Option<NaiveDate>, today: NaiveDate) -> bool {
    match due {
        None => true,
        Some(due) => due < today,
    }
}

pub fn calculate_retest_date(treatment_start: NaiveDate, days: u32) -> NaiveDate {
    add_days(treatment_start, days)
}

/// Index of the newest exam among those accepted by `keep`.
///
/// Ordering is `(exam_date, id)`, a missing id ranking lowest; on a full tie
/// the later slice position wins. With unique ids the choice does not depend
/// on input order.
pub(crate) fn newest_index<'a, I>(exams: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a Exam>,
{
    exams
        .into_iter()
        .enumerate()
        .max_by_key(|(pos, exam)| (exam.exam_date, exam.id.unwrap_or(i64::MIN), *pos))
        .map(|(pos, _)| pos)
}

/// Newest exam of a history (see `newest_index` for tie-breaking).
pub fn newest_exam(exams: &[Exam]) -> Option<&Exam> {
    newest_index(exams).map(|i| &exams[i])
}

/// Newest exam carrying a fitness decision.
pub fn newest_finalized_exam(exams: &[Exam]) -> Option<&Exam> {
    let finalized: Vec<&Exam> = exams.iter().filter(|e| e.decision.is_some()).collect();
    newest_index(finalized.iter().copied()).map(|i| finalized[i])
}

pub fn recalculate_worker_status(exams: &[Exam]) -> WorkerStatus {
    recalculate_worker_status_on(exams, today())
}

/// Reduce a worker's full, unordered exam history to its derived fields.
///
/// `last_exam_date` follows the newest exam whatever its state; the due date
/// follows the newest *finalized* exam, so an open visit never moves the
/// periodic clock. A history with no decision at all is due now.
pub fn recalculate_worker_status_on(exams: &[Exam], today: NaiveDate) -> WorkerStatus {
    let Some(newest) = newest_exam(exams) else {
        return WorkerStatus {
            last_exam_date: None,
            next_exam_due: today,
        };
    };

    let next_exam_due = match newest_finalized_exam(exams) {
        None => today,
        Some(exam) => next_due_after_decision(exam, today),
    };

    WorkerStatus {
        last_exam_date: Some(newest.exam_date),
        next_exam_due,
    }
}

fn next_due_after_decision(exam: &Exam, today: NaiveDate) -> NaiveDate {
    match exam.decision_status() {
        Some(status) if status.requires_retest() => exam
            .retest_date()
            .unwrap_or_else(|| calculate_retest_date(exam.exam_date, RETEST_INTERVAL_DAYS_DEFAULT)),
        _ => calculate_next_exam_due_on(Some(exam.exam_date), today),
    }
}
