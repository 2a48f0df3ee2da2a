//! Collection store: departments, workplaces, workers, exams and settings
//! kept as JSON documents in the key/value table.
//!
//! Every mutation rewrites the whole collection. Exam mutations feed the
//! backup coordinator, which snapshots `export_data` once its threshold is
//! reached.

use std::path::Path;

use chrono::Utc;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{kv, seed, sqlite, DatabaseError};
use crate::backup::{manual_export_file_name, BackupCoordinator, BackupError, BackupTarget, DirectoryHost};
use crate::crypto::{decrypt_string, encrypt_string, CryptoError};
use crate::models::{is_valid_pin, Department, Exam, Settings, Worker, Workplace};
use crate::status::today;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Backup error: {0}")]
    Backup(#[from] BackupError),

    #[error("{0}")]
    Validation(String),

    #[error("Not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: i64 },
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(DatabaseError::from(e))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Departments,
    Workplaces,
    Workers,
    Exams,
    Settings,
}

impl Collection {
    pub fn key(self) -> &'static str {
        match self {
            Self::Departments => "departments",
            Self::Workplaces => "workplaces",
            Self::Workers => "workers",
            Self::Exams => "exams",
            Self::Settings => "settings",
        }
    }
}

/// Records addressed by an optional numeric id.
pub trait Record {
    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: i64);
}

impl Record for Worker {
    fn id(&self) -> Option<i64> {
        self.id
    }
    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

impl Record for Exam {
    fn id(&self) -> Option<i64> {
        self.id
    }
    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

/// Fresh id: the current epoch millis, bumped past any existing id.
pub fn next_id<T: Record>(items: &[T]) -> i64 {
    let now = Utc::now().timestamp_millis();
    match items.iter().filter_map(Record::id).max() {
        Some(max) => now.max(max.saturating_add(1)),
        None => now,
    }
}

/// Replace the record with the same id, or append. Missing ids are assigned.
fn upsert<T: Record + Clone>(items: &mut Vec<T>, mut item: T) -> T {
    match item.id() {
        None => {
            let id = next_id(items);
            item.set_id(id);
            items.push(item.clone());
        }
        Some(id) => match items.iter_mut().find(|existing| existing.id() == Some(id)) {
            Some(slot) => *slot = item.clone(),
            None => items.push(item.clone()),
        },
    }
    item
}

fn remove<T: Record>(items: &mut Vec<T>, id: i64) -> bool {
    let before = items.len();
    items.retain(|item| item.id() != Some(id));
    items.len() != before
}

pub fn get_all<T: DeserializeOwned>(conn: &Connection, collection: Collection) -> Result<Vec<T>, StoreError> {
    Ok(kv::get_json(conn, collection.key())?.unwrap_or_default())
}

pub fn save_all<T: Serialize>(conn: &Connection, collection: Collection, items: &[T]) -> Result<(), StoreError> {
    kv::set_json(conn, collection.key(), items)?;
    Ok(())
}

/// Export/import document. Absent or null collections are left untouched on
/// import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataBundle {
    #[serde(default)]
    pub departments: Option<Vec<Department>>,
    #[serde(default)]
    pub workplaces: Option<Vec<Workplace>>,
    #[serde(default)]
    pub workers: Option<Vec<Worker>>,
    #[serde(default)]
    pub exams: Option<Vec<Exam>>,
}

fn export_json(conn: &Connection) -> Result<String, StoreError> {
    let bundle = DataBundle {
        departments: Some(get_all(conn, Collection::Departments)?),
        workplaces: Some(get_all(conn, Collection::Workplaces)?),
        workers: Some(get_all(conn, Collection::Workers)?),
        exams: Some(get_all(conn, Collection::Exams)?),
    };
    Ok(serde_json::to_string(&bundle)?)
}

/// Import document before records are read. Each collection must be an
/// array when present; its records are read one by one.
#[derive(Deserialize)]
struct RawBundle {
    #[serde(default)]
    departments: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    workplaces: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    workers: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    exams: Option<Vec<serde_json::Value>>,
}

/// Records that cannot be read (an exam without a usable date, say) are
/// skipped with a warning; the rest of the collection is kept.
fn read_records<T: DeserializeOwned>(collection: Collection, raw: Option<Vec<serde_json::Value>>) -> Option<Vec<T>> {
    let values = raw?;
    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(collection = collection.key(), error = %e, "Skipping unreadable record");
                None
            }
        })
        .collect();
    if records.len() < total {
        tracing::warn!(
            collection = collection.key(),
            skipped = total - records.len(),
            kept = records.len(),
            "Import skipped records"
        );
    }
    Some(records)
}

/// Parse the whole document, then replace collections in one transaction.
fn apply_import(conn: &Connection, text: &str) -> Result<DataBundle, StoreError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(StoreError::Validation("Backup must be a JSON object".into()));
    }
    let raw: RawBundle = serde_json::from_value(value)?;
    let bundle = DataBundle {
        departments: read_records(Collection::Departments, raw.departments),
        workplaces: read_records(Collection::Workplaces, raw.workplaces),
        workers: read_records(Collection::Workers, raw.workers),
        exams: read_records(Collection::Exams, raw.exams),
    };

    let tx = conn.unchecked_transaction()?;
    if let Some(departments) = &bundle.departments {
        save_all(&tx, Collection::Departments, departments)?;
    }
    if let Some(workplaces) = &bundle.workplaces {
        save_all(&tx, Collection::Workplaces, workplaces)?;
    }
    if let Some(workers) = &bundle.workers {
        save_all(&tx, Collection::Workers, workers)?;
    }
    if let Some(exams) = &bundle.exams {
        save_all(&tx, Collection::Exams, exams)?;
    }
    tx.commit()?;
    Ok(bundle)
}

fn import_json(conn: &Connection, text: &str) -> bool {
    match apply_import(conn, text) {
        Ok(bundle) => {
            tracing::info!(
                departments = bundle.departments.as_ref().map(Vec::len),
                workplaces = bundle.workplaces.as_ref().map(Vec::len),
                workers = bundle.workers.as_ref().map(Vec::len),
                exams = bundle.exams.as_ref().map(Vec::len),
                "Data imported"
            );
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Import failed");
            false
        }
    }
}

pub struct Store {
    conn: Connection,
    backup: BackupCoordinator,
}

impl Store {
    pub fn open(path: &Path, host: Box<dyn DirectoryHost>) -> Result<Self, StoreError> {
        let conn = sqlite::open_database(path)?;
        Ok(Self::with_connection(conn, host))
    }

    pub fn open_in_memory(host: Box<dyn DirectoryHost>) -> Result<Self, StoreError> {
        let conn = sqlite::open_memory_database()?;
        Ok(Self::with_connection(conn, host))
    }

    fn with_connection(conn: Connection, host: Box<dyn DirectoryHost>) -> Self {
        let backup = BackupCoordinator::init(&conn, host);
        Self { conn, backup }
    }

    /// Seed reference data when missing or outdated.
    ///
    /// Sample workers are written only alongside a reseed and only into an
    /// empty worker list, so user data is never overwritten.
    pub fn init(&self) -> Result<(), StoreError> {
        let departments = self.get_departments()?;
        let current = departments.iter().any(|d| d.name == seed::SENTINEL_DEPARTMENT);
        if current {
            return Ok(());
        }

        tracing::info!(existing = departments.len(), "Seeding reference data");
        let tx = self.conn.unchecked_transaction()?;
        save_all(&tx, Collection::Departments, &seed::departments())?;
        save_all(&tx, Collection::Workplaces, &seed::workplaces())?;
        if get_all::<Worker>(&tx, Collection::Workers)?.is_empty() {
            save_all(&tx, Collection::Workers, &seed::workers())?;
            save_all::<Exam>(&tx, Collection::Exams, &[])?;
            tracing::info!("Seeded sample workers");
        }
        tx.commit()?;
        Ok(())
    }

    // ── Reads ───────────────────────────────────────────────

    pub fn get_workers(&self) -> Result<Vec<Worker>, StoreError> {
        get_all(&self.conn, Collection::Workers)
    }

    pub fn get_worker(&self, id: i64) -> Result<Option<Worker>, StoreError> {
        Ok(self.get_workers()?.into_iter().find(|w| w.id == Some(id)))
    }

    pub fn get_exams(&self) -> Result<Vec<Exam>, StoreError> {
        get_all(&self.conn, Collection::Exams)
    }

    pub fn get_departments(&self) -> Result<Vec<Department>, StoreError> {
        get_all(&self.conn, Collection::Departments)
    }

    pub fn get_workplaces(&self) -> Result<Vec<Workplace>, StoreError> {
        get_all(&self.conn, Collection::Workplaces)
    }

    // ── Workers ─────────────────────────────────────────────

    pub fn save_worker(&mut self, worker: Worker) -> Result<Worker, StoreError> {
        let mut workers = self.get_workers()?;
        let saved = upsert(&mut workers, worker);
        save_all(&self.conn, Collection::Workers, &workers)?;
        Ok(saved)
    }

    /// Exams of the removed worker are left in place.
    pub fn delete_worker(&mut self, id: i64) -> Result<bool, StoreError> {
        let mut workers = self.get_workers()?;
        if !remove(&mut workers, id) {
            return Ok(false);
        }
        save_all(&self.conn, Collection::Workers, &workers)?;
        Ok(true)
    }

    // ── Exams ───────────────────────────────────────────────

    pub fn save_exam(&mut self, exam: Exam) -> Result<Exam, StoreError> {
        let mut exams = self.get_exams()?;
        let saved = upsert(&mut exams, exam);
        save_all(&self.conn, Collection::Exams, &exams)?;
        self.exams_changed();
        Ok(saved)
    }

    pub fn delete_exam(&mut self, id: i64) -> Result<bool, StoreError> {
        let mut exams = self.get_exams()?;
        if !remove(&mut exams, id) {
            return Ok(false);
        }
        save_all(&self.conn, Collection::Exams, &exams)?;
        self.exams_changed();
        Ok(true)
    }

    /// Count the mutation and snapshot once the threshold is reached.
    fn exams_changed(&mut self) {
        if self.backup.register_mutation(&self.conn) {
            let conn = &self.conn;
            self.backup.perform_auto_export(conn, || export_json(conn));
        }
    }

    // ── Import / export ─────────────────────────────────────

    /// `{departments, workplaces, workers, exams}` as JSON. Settings stay local.
    pub fn export_data(&self) -> Result<String, StoreError> {
        export_json(&self.conn)
    }

    pub fn export_data_encrypted(&self, password: &str) -> Result<String, StoreError> {
        if password.is_empty() {
            return Err(StoreError::Validation("Password required".into()));
        }
        let json = self.export_data()?;
        Ok(encrypt_string(password, &json)?)
    }

    /// Replace the collections present in `text`. Nothing is written unless
    /// the whole document parses.
    pub fn import_data(&self, text: &str) -> bool {
        import_json(&self.conn, text)
    }

    /// `Ok(false)` on a wrong password or corrupted payload.
    pub fn import_data_encrypted(&self, text: &str, password: &str) -> Result<bool, StoreError> {
        if password.is_empty() {
            return Err(StoreError::Validation("Password required".into()));
        }
        match decrypt_string(password, text) {
            Ok(json) => Ok(self.import_data(&json)),
            Err(e) => {
                tracing::error!(error = %e, "Decryption failed");
                Ok(false)
            }
        }
    }

    /// Write a dated export (encrypted when a password is given) to the
    /// backup directory, or download it.
    pub fn manual_export(&self, password: Option<&str>) -> Result<BackupTarget, StoreError> {
        let json = match password {
            Some(password) => self.export_data_encrypted(password)?,
            None => self.export_data()?,
        };
        let file_name = manual_export_file_name(today());
        let target = self.backup.save_backup_json(&file_name, &json)?;
        tracing::info!(file = %file_name, encrypted = password.is_some(), "Manual export written");
        Ok(target)
    }

    // ── Settings ────────────────────────────────────────────

    pub fn get_settings(&self) -> Result<Settings, StoreError> {
        Ok(kv::get_json(&self.conn, Collection::Settings.key())?.unwrap_or_default())
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        if let Some(pin) = &settings.pin {
            if !is_valid_pin(pin) {
                return Err(StoreError::Validation("PIN must be exactly 4 digits".into()));
            }
        }
        kv::set_json(&self.conn, Collection::Settings.key(), settings)?;
        Ok(())
    }

    // ── Backup ──────────────────────────────────────────────

    pub fn backup(&self) -> &BackupCoordinator {
        &self.backup
    }

    /// Coordinator plus the connection its setters persist through.
    pub fn backup_mut(&mut self) -> (&mut BackupCoordinator, &Connection) {
        (&mut self.backup, &self.conn)
    }

    /// Import `backup-auto.json` when auto-import is on and the file is new.
    pub fn check_and_auto_import(&mut self) -> bool {
        let conn = &self.conn;
        self.backup.check_and_auto_import(conn, |text| import_json(conn, text))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::backup::{FsHost, UnsupportedHost, BACKUP_FILE_NAME};
    use crate::models::ExamStatus;

    fn store() -> Store {
        let store = Store::open_in_memory(Box::new(UnsupportedHost)).unwrap();
        store.init().unwrap();
        store
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // ── Seeding ─────────────────────────────────────────────

    #[test]
    fn init_seeds_reference_data_and_samples() {
        let store = store();
        assert_eq!(store.get_departments().unwrap().len(), 6);
        assert_eq!(store.get_workplaces().unwrap().len(), 3);
        assert_eq!(store.get_workers().unwrap().len(), 5);
        assert!(store.get_exams().unwrap().is_empty());
    }

    #[test]
    fn init_is_idempotent() {
        let mut store = store();
        let mine = store.save_worker(Worker::new("Nadia Rahmouni")).unwrap();
        store.init().unwrap();
        store.init().unwrap();
        let workers = store.get_workers().unwrap();
        assert_eq!(workers.len(), 6);
        assert!(workers.iter().any(|w| w.id == mine.id));
    }

    #[test]
    fn outdated_departments_reseeded_without_touching_workers() {
        let store = store();
        save_all(
            &store.conn,
            Collection::Departments,
            &[Department { id: 1, name: "OLD".into() }],
        )
        .unwrap();
        save_all(&store.conn, Collection::Workers, &[Worker::new("Kept")]).unwrap();

        store.init().unwrap();
        assert!(store
            .get_departments()
            .unwrap()
            .iter()
            .any(|d| d.name == seed::SENTINEL_DEPARTMENT));
        let workers = store.get_workers().unwrap();
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].full_name, "Kept");
    }

    // ── Upsert ──────────────────────────────────────────────

    #[test]
    fn save_worker_assigns_id_then_replaces_in_place() {
        let mut store = store();
        let mut worker = store.save_worker(Worker::new("Nadia")).unwrap();
        let id = worker.id.unwrap();
        assert!(store.get_workers().unwrap().iter().all(|w| w.id.unwrap() <= id));

        worker.phone = "0600000000".into();
        store.save_worker(worker).unwrap();
        let workers = store.get_workers().unwrap();
        assert_eq!(workers.len(), 6);
        assert_eq!(store.get_worker(id).unwrap().unwrap().phone, "0600000000");
    }

    #[test]
    fn unmatched_id_is_appended_with_that_id() {
        let mut store = store();
        let mut worker = Worker::new("Imported");
        worker.id = Some(42);
        store.save_worker(worker).unwrap();
        assert!(store.get_worker(42).unwrap().is_some());
    }

    #[test]
    fn next_id_is_monotonic_past_existing_ids() {
        let mut far = Worker::new("Future");
        far.id = Some(i64::MAX / 2);
        let id = next_id(&[far]);
        assert_eq!(id, i64::MAX / 2 + 1);

        let now = Utc::now().timestamp_millis();
        assert!(next_id::<Worker>(&[]) >= now);
    }

    #[test]
    fn back_to_back_inserts_get_distinct_ids() {
        let mut store = store();
        let a = store.save_exam(Exam::new(1, date("2025-01-01"))).unwrap();
        let b = store.save_exam(Exam::new(1, date("2025-01-02"))).unwrap();
        assert_ne!(a.id, b.id);
        assert!(b.id > a.id);
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let mut store = store();
        assert!(store.delete_worker(1).unwrap());
        assert!(!store.delete_worker(1).unwrap());
        let exam = store.save_exam(Exam::new(2, date("2025-01-01"))).unwrap();
        assert!(store.delete_exam(exam.id.unwrap()).unwrap());
        assert!(!store.delete_exam(exam.id.unwrap()).unwrap());
    }

    #[test]
    fn deleting_worker_keeps_their_exams() {
        let mut store = store();
        store.save_exam(Exam::new(3, date("2025-01-01"))).unwrap();
        store.delete_worker(3).unwrap();
        assert_eq!(store.get_exams().unwrap().len(), 1);
    }

    // ── Import / export ─────────────────────────────────────

    #[test]
    fn export_import_round_trip_is_idempotent() {
        let mut store = store();
        let mut exam = Exam::new(1, date("2025-02-01"));
        exam.status = ExamStatus::Closed;
        store.save_exam(exam).unwrap();

        let first = store.export_data().unwrap();
        assert!(store.import_data(&first));
        let second = store.export_data().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn export_excludes_settings() {
        let store = store();
        store.save_settings(&Settings { pin: Some("1234".into()) }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&store.export_data().unwrap()).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 4);
        assert!(!keys.contains(&"settings".to_string()));
    }

    #[test]
    fn partial_import_leaves_other_collections() {
        let store = store();
        assert!(store.import_data(r#"{"workers":[{"id":9,"full_name":"Solo","next_exam_due":""}],"exams":null}"#));
        let workers = store.get_workers().unwrap();
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].next_exam_due, today());
        assert_eq!(store.get_departments().unwrap().len(), 6);
    }

    #[test]
    fn malformed_import_changes_nothing() {
        let store = store();
        let before = store.export_data().unwrap();
        assert!(!store.import_data("{not json"));
        assert!(!store.import_data("[1, 2, 3]"));
        // Second collection is not an array: the first must not be written either
        assert!(!store.import_data(r#"{"workers":[],"exams":{"worker_id":1}}"#));
        assert_eq!(store.export_data().unwrap(), before);
    }

    #[test]
    fn import_tolerates_null_text_and_string_ids() {
        let store = store();
        let json = r#"{"workers":[
            {"id":1,"full_name":"A","phone":null,"notes":null,"department_id":"1","workplace_id":""},
            {"id":"2","full_name":"B","national_id":612345678}
        ]}"#;
        assert!(store.import_data(json));

        let workers = store.get_workers().unwrap();
        assert_eq!(workers.len(), 2);
        assert_eq!(workers[0].phone, "");
        assert_eq!(workers[0].department_id, Some(1));
        assert_eq!(workers[0].workplace_id, None);
        assert_eq!(workers[1].id, Some(2));
        assert_eq!(workers[1].national_id, "612345678");
    }

    #[test]
    fn import_skips_exam_with_blank_date() {
        let store = store();
        let json = r#"{"exams":[
            {"id":5,"worker_id":1,"exam_date":""},
            {"id":6,"worker_id":"1","exam_date":"2025-01-10","physician_name":null,"status":null}
        ]}"#;
        assert!(store.import_data(json));

        let exams = store.get_exams().unwrap();
        assert_eq!(exams.len(), 1);
        assert_eq!(exams[0].id, Some(6));
        assert_eq!(exams[0].worker_id, 1);
        assert_eq!(exams[0].status, ExamStatus::Open);
    }

    #[test]
    fn encrypted_round_trip() {
        let mut store = store();
        store.save_exam(Exam::new(4, date("2025-03-01"))).unwrap();
        let payload = store.export_data_encrypted("secret").unwrap();
        let expected = store.export_data().unwrap();

        let other = Store::open_in_memory(Box::new(UnsupportedHost)).unwrap();
        assert!(!other.import_data_encrypted(&payload, "wrong").unwrap());
        assert!(other.get_workers().unwrap().is_empty());
        assert!(other.import_data_encrypted(&payload, "secret").unwrap());
        assert_eq!(other.export_data().unwrap(), expected);
    }

    #[test]
    fn empty_password_is_a_validation_error() {
        let store = store();
        assert!(matches!(
            store.export_data_encrypted(""),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            store.import_data_encrypted("{}", ""),
            Err(StoreError::Validation(_))
        ));
    }

    // ── Settings ────────────────────────────────────────────

    #[test]
    fn settings_default_then_persist() {
        let store = store();
        assert_eq!(store.get_settings().unwrap(), Settings::default());
        store.save_settings(&Settings { pin: Some("4321".into()) }).unwrap();
        assert_eq!(store.get_settings().unwrap().effective_pin(), "4321");
    }

    #[test]
    fn invalid_pin_rejected() {
        let store = store();
        let result = store.save_settings(&Settings { pin: Some("12".into()) });
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(store.get_settings().unwrap(), Settings::default());
    }

    // ── Backup integration ──────────────────────────────────

    fn store_with_backup_dir(tmp: &Path) -> Store {
        let backups = tmp.join("backups");
        std::fs::create_dir_all(&backups).unwrap();
        let host = FsHost::new(tmp.join("dl")).with_picker(move || Some(backups.clone()));
        let mut store = Store::open(&tmp.join("gestmed.db"), Box::new(host)).unwrap();
        store.init().unwrap();
        let (backup, conn) = store.backup_mut();
        backup.choose_directory(conn).unwrap();
        store
    }

    #[test]
    fn exam_mutations_trigger_auto_export_at_threshold() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = store_with_backup_dir(tmp.path());
        let (backup, conn) = store.backup_mut();
        backup.set_threshold(conn, 2).unwrap();

        store.save_exam(Exam::new(1, date("2025-01-01"))).unwrap();
        assert_eq!(store.backup().counter(), 1);
        assert!(!tmp.path().join("backups").join(BACKUP_FILE_NAME).exists());

        store.save_exam(Exam::new(2, date("2025-01-02"))).unwrap();
        assert_eq!(store.backup().counter(), 0);
        let written = std::fs::read_to_string(tmp.path().join("backups").join(BACKUP_FILE_NAME)).unwrap();
        assert_eq!(written, store.export_data().unwrap());
    }

    #[test]
    fn worker_mutations_do_not_count() {
        let mut store = store();
        store.save_worker(Worker::new("Nadia")).unwrap();
        assert_eq!(store.backup().counter(), 0);
    }

    #[test]
    fn auto_import_restores_newer_backup() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = store_with_backup_dir(tmp.path());
        let (backup, conn) = store.backup_mut();
        backup.set_auto_import(conn, true).unwrap();

        let snapshot = r#"{"workers":[{"id":77,"full_name":"From backup","next_exam_due":"2026-01-01"}]}"#;
        std::fs::write(tmp.path().join("backups").join(BACKUP_FILE_NAME), snapshot).unwrap();

        assert!(store.check_and_auto_import());
        assert_eq!(store.get_workers().unwrap()[0].full_name, "From backup");
        assert!(!store.check_and_auto_import());
    }

    #[test]
    fn manual_export_downloads_without_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::open_in_memory(Box::new(FsHost::new(tmp.path()))).unwrap();
        store.init().unwrap();
        let target = store.manual_export(None).unwrap();
        let expected = tmp.path().join(manual_export_file_name(today()));
        assert_eq!(target, BackupTarget::Download(expected.clone()));
        assert_eq!(std::fs::read_to_string(expected).unwrap(), store.export_data().unwrap());
    }
}
