//! Reference data written on first launch.

use crate::models::{Department, Workplace, Worker};
use crate::status::parse_date;

/// Department whose absence marks an outdated reference list.
pub const SENTINEL_DEPARTMENT: &str = "SWASS";

const DEPARTMENTS: [(i64, &str); 6] = [
    (1, "SWAG"),
    (2, "BMPJ"),
    (3, "SD INGHAR"),
    (4, "BPFA"),
    (5, SENTINEL_DEPARTMENT),
    (6, "AUTRES"),
];

const WORKPLACES: [(i64, &str); 3] = [(1, "Cuisine"), (2, "Foyer"), (3, "Autres")];

struct SeedWorker {
    id: i64,
    full_name: &'static str,
    national_id: &'static str,
    phone: &'static str,
    workplace_id: i64,
    department_id: i64,
    job_role: &'static str,
    start_date: &'static str,
    notes: &'static str,
    last_exam_date: Option<&'static str>,
    next_exam_due: &'static str,
}

const WORKERS: [SeedWorker; 5] = [
    SeedWorker {
        id: 1,
        full_name: "Ahmed Benali",
        national_id: "1001",
        phone: "0661123456",
        workplace_id: 1,
        department_id: 1,
        job_role: "Cuisinier",
        start_date: "2023-01-15",
        notes: "Allergie aux arachides",
        last_exam_date: Some("2025-02-01"),
        next_exam_due: "2025-08-01",
    },
    SeedWorker {
        id: 2,
        full_name: "Sarah Idrissi",
        national_id: "1002",
        phone: "0661123457",
        workplace_id: 1,
        department_id: 1,
        job_role: "Serveuse",
        start_date: "2023-03-10",
        notes: "",
        last_exam_date: Some("2024-09-01"),
        next_exam_due: "2025-03-01",
    },
    SeedWorker {
        id: 3,
        full_name: "Karim Tazi",
        national_id: "1003",
        phone: "0661123458",
        workplace_id: 2,
        department_id: 4,
        job_role: "Plongeur",
        start_date: "2022-11-05",
        notes: "",
        last_exam_date: Some("2024-05-15"),
        next_exam_due: "2024-11-15",
    },
    SeedWorker {
        id: 4,
        full_name: "Fatima Zahra",
        national_id: "1004",
        phone: "0661123459",
        workplace_id: 3,
        department_id: 3,
        job_role: "Entretien",
        start_date: "2024-01-20",
        notes: "",
        last_exam_date: None,
        next_exam_due: "2024-01-20",
    },
    SeedWorker {
        id: 5,
        full_name: "Youssef Amrani",
        national_id: "1005",
        phone: "0661123460",
        workplace_id: 1,
        department_id: 1,
        job_role: "Chef de Partie",
        start_date: "2021-06-01",
        notes: "",
        last_exam_date: Some("2025-01-10"),
        next_exam_due: "2025-07-10",
    },
];

pub fn departments() -> Vec<Department> {
    DEPARTMENTS
        .iter()
        .map(|&(id, name)| Department { id, name: name.into() })
        .collect()
}

pub fn workplaces() -> Vec<Workplace> {
    WORKPLACES
        .iter()
        .map(|&(id, name)| Workplace { id, name: name.into() })
        .collect()
}

pub fn workers() -> Vec<Worker> {
    WORKERS
        .iter()
        .map(|w| {
            let mut worker = Worker::new(w.full_name);
            worker.id = Some(w.id);
            worker.national_id = w.national_id.into();
            worker.phone = w.phone.into();
            worker.job_role = w.job_role.into();
            worker.department_id = Some(w.department_id);
            worker.workplace_id = Some(w.workplace_id);
            worker.start_date = parse_date(w.start_date);
            worker.notes = w.notes.into();
            worker.last_exam_date = w.last_exam_date.and_then(parse_date);
            if let Some(due) = parse_date(w.next_exam_due) {
                worker.next_exam_due = due;
            }
            worker
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_department_is_seeded() {
        assert!(departments().iter().any(|d| d.name == SENTINEL_DEPARTMENT));
    }

    #[test]
    fn seed_workers_have_unique_ids_and_valid_dates() {
        let workers = workers();
        assert_eq!(workers.len(), 5);
        let mut ids: Vec<_> = workers.iter().filter_map(|w| w.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 5);
        assert!(workers.iter().all(|w| w.start_date.is_some()));
        assert_eq!(workers[3].last_exam_date, None);
        assert_eq!(workers[3].next_exam_due, parse_date("2024-01-20").unwrap());
    }

    #[test]
    fn seed_workers_reference_seeded_workplaces() {
        let places: Vec<_> = workplaces().iter().map(|w| w.id).collect();
        assert!(workers()
            .iter()
            .all(|w| w.workplace_id.is_some_and(|id| places.contains(&id))));
    }
}
