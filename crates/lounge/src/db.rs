//! Database operations module for SQLite storage
//!
//! This module handles all database operations including:
//! - Database initialization and migrations
//! - Student management, with explicit cascade on delete
//! - Assignment creation, month range queries and the completion toggle
//! - Global calendar events

use anyhow::Context;
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};

use crate::calendar;
use crate::error::{LoungeError, Result};
use crate::types::{Assignment, Event, NewAssignment, NewStudent, Student};

/// Embedded schema migrations, applied in order
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial_schema",
    include_str!("../db/migrations/001_initial_schema.sql"),
)];

const STUDENT_COLUMNS: &str = "id, name, notes, strengths, weaknesses";
const ASSIGNMENT_COLUMNS: &str = "id, student_id, title, description, due_date, is_test, completed";

/// Open the database at the given path, running any pending migrations
pub fn init_db(db_path: &Path) -> anyhow::Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    // Enable foreign keys
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    let count = run_migrations(&conn)?;
    if count > 0 {
        info!(count = count, "Applied migrations");
    }

    Ok(conn)
}

/// Run pending migrations, returning how many were applied
pub fn run_migrations(conn: &Connection) -> anyhow::Result<usize> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )
    .context("Failed to create schema_migrations table")?;

    let mut applied = 0;

    for (version, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
            [version],
            |row| row.get(0),
        )?;

        if already_applied {
            continue;
        }

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)
            .with_context(|| format!("Failed to apply migration: {}", version))?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            [version],
        )?;
        tx.commit()?;

        debug!(version = %version, "Applied migration");
        applied += 1;
    }

    Ok(applied)
}

// ---------- Input normalisation ----------

/// Parse a strict ISO `YYYY-MM-DD` date
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if !is_iso_shape(value) {
        return Err(LoungeError::validation(format!(
            "date '{}' is not in YYYY-MM-DD format",
            value
        )));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| LoungeError::validation(format!("date '{}' is not a valid date", value)))
}

/// Four digits, dash, two digits, dash, two digits. `%Y` alone would accept a sign.
fn is_iso_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn required_text(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LoungeError::validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Trim tags, dropping empty ones and case-insensitive duplicates
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !out.iter().any(|seen| seen.eq_ignore_ascii_case(tag)) {
            out.push(tag.to_string());
        }
    }
    out
}

// ---------- Row mapping ----------

fn tags_from_column(row: &Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn student_from_row(row: &Row) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        notes: row.get(2)?,
        strengths: tags_from_column(row, 3)?,
        weaknesses: tags_from_column(row, 4)?,
    })
}

fn assignment_from_row(row: &Row) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: row.get(0)?,
        student_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        due_date: row.get(4)?,
        is_test: row.get::<_, i32>(5)? != 0,
        completed: row.get::<_, i32>(6)? != 0,
    })
}

fn event_from_row(row: &Row) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        date: row.get(2)?,
    })
}

// ---------- Students ----------

pub fn add_student(conn: &Connection, input: &NewStudent) -> Result<Student> {
    let name = required_text(&input.name, "name")?;
    let notes = optional_text(input.notes.as_deref());
    let strengths = normalize_tags(&input.strengths);
    let weaknesses = normalize_tags(&input.weaknesses);

    let strengths_json = serde_json::to_string(&strengths)
        .map_err(|e| LoungeError::validation(format!("invalid strengths: {}", e)))?;
    let weaknesses_json = serde_json::to_string(&weaknesses)
        .map_err(|e| LoungeError::validation(format!("invalid weaknesses: {}", e)))?;

    conn.execute(
        "INSERT INTO students (name, notes, strengths, weaknesses) VALUES (?1, ?2, ?3, ?4)",
        params![name, notes, strengths_json, weaknesses_json],
    )?;
    let id = conn.last_insert_rowid();
    debug!(student_id = id, "Added student");

    Ok(Student {
        id,
        name,
        notes,
        strengths,
        weaknesses,
    })
}

/// All students, ordered by name ignoring case
pub fn list_students(conn: &Connection) -> Result<Vec<Student>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM students ORDER BY name COLLATE NOCASE ASC, id ASC",
        STUDENT_COLUMNS
    ))?;
    let students = stmt
        .query_map([], student_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(students)
}

pub fn get_student(conn: &Connection, id: i64) -> Result<Option<Student>> {
    let student = conn
        .query_row(
            &format!("SELECT {} FROM students WHERE id = ?1", STUDENT_COLUMNS),
            [id],
            student_from_row,
        )
        .optional()?;
    Ok(student)
}

pub fn student_exists(conn: &Connection, id: i64) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM students WHERE id = ?1",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Delete a student and all of its assignments in one transaction.
/// Returns the number of assignments removed.
pub fn delete_student(conn: &Connection, id: i64) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;

    let assignments_deleted = tx.execute("DELETE FROM assignments WHERE student_id = ?1", [id])?;
    let student_deleted = tx.execute("DELETE FROM students WHERE id = ?1", [id])?;

    if student_deleted == 0 {
        // Dropping the transaction rolls it back
        return Err(LoungeError::not_found("student", id));
    }

    tx.commit()?;
    info!(
        student_id = id,
        assignments = assignments_deleted,
        "Deleted student"
    );
    Ok(assignments_deleted)
}

// ---------- Assignments ----------

/// Validate and insert a new assignment for a student
pub fn add_assignment(
    conn: &Connection,
    student_id: i64,
    input: &NewAssignment,
) -> Result<Assignment> {
    let title = required_text(&input.title, "title")?;
    let due_date = parse_iso_date(&input.due_date)?;
    let description = optional_text(input.description.as_deref());

    if !student_exists(conn, student_id)? {
        return Err(LoungeError::validation(format!(
            "student {} does not exist",
            student_id
        )));
    }

    conn.execute(
        "INSERT INTO assignments (student_id, title, description, due_date, is_test, completed)
         VALUES (?1, ?2, ?3, ?4, ?5, 0)",
        params![student_id, title, description, due_date, input.is_test as i32],
    )?;
    let id = conn.last_insert_rowid();
    debug!(assignment_id = id, student_id = student_id, due = %due_date, "Added assignment");

    Ok(Assignment {
        id,
        student_id,
        title,
        description,
        due_date,
        is_test: input.is_test,
        completed: false,
    })
}

#[cfg(test)]
pub fn get_assignment(conn: &Connection, id: i64) -> Result<Option<Assignment>> {
    let assignment = conn
        .query_row(
            &format!("SELECT {} FROM assignments WHERE id = ?1", ASSIGNMENT_COLUMNS),
            [id],
            assignment_from_row,
        )
        .optional()?;
    Ok(assignment)
}

/// Assignments of a student due within the month, ascending by due date.
///
/// The range is inclusive on both ends.
pub fn list_assignments_for_month(
    conn: &Connection,
    student_id: i64,
    year: i32,
    month: u32,
) -> Result<Vec<Assignment>> {
    let (first, last) = calendar::month_bounds(year, month)?;

    if !student_exists(conn, student_id)? {
        return Err(LoungeError::not_found("student", student_id));
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM assignments
         WHERE student_id = ?1 AND due_date BETWEEN ?2 AND ?3
         ORDER BY due_date ASC, id ASC",
        ASSIGNMENT_COLUMNS
    ))?;
    let assignments = stmt
        .query_map(params![student_id, first, last], assignment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(assignments)
}

/// Flip the completion flag and return the new state.
///
/// A single UPDATE statement, so concurrent toggles on the same row
/// are serialised by SQLite.
pub fn toggle_completion(conn: &Connection, id: i64) -> Result<bool> {
    let completed: Option<bool> = conn
        .query_row(
            "UPDATE assignments SET completed = NOT completed WHERE id = ?1 RETURNING completed",
            [id],
            |row| Ok(row.get::<_, i32>(0)? != 0),
        )
        .optional()?;

    let completed = completed.ok_or(LoungeError::not_found("assignment", id))?;
    debug!(assignment_id = id, completed = completed, "Toggled completion");
    Ok(completed)
}

/// Delete an assignment, returning the id of the student that owned it
pub fn delete_assignment(conn: &Connection, id: i64) -> Result<i64> {
    let owner: Option<i64> = conn
        .query_row(
            "DELETE FROM assignments WHERE id = ?1 RETURNING student_id",
            [id],
            |row| row.get(0),
        )
        .optional()?;

    let owner = owner.ok_or(LoungeError::not_found("assignment", id))?;
    debug!(assignment_id = id, student_id = owner, "Deleted assignment");
    Ok(owner)
}

/// Count all assignments in the database
pub fn count_assignments(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM assignments", [], |row| row.get(0))?;
    Ok(count as usize)
}

// ---------- Events ----------

pub fn add_event(conn: &Connection, title: &str, date_iso: &str) -> Result<Event> {
    let title = required_text(title, "title")?;
    let date = parse_iso_date(date_iso)?;

    conn.execute(
        "INSERT INTO events (title, date) VALUES (?1, ?2)",
        params![title, date],
    )?;
    let id = conn.last_insert_rowid();
    debug!(event_id = id, date = %date, "Added event");

    Ok(Event { id, title, date })
}

/// Events within the month, ascending by date
pub fn list_events_for_month(conn: &Connection, year: i32, month: u32) -> Result<Vec<Event>> {
    let (first, last) = calendar::month_bounds(year, month)?;

    let mut stmt = conn.prepare(
        "SELECT id, title, date FROM events
         WHERE date BETWEEN ?1 AND ?2
         ORDER BY date ASC, id ASC",
    )?;
    let events = stmt
        .query_map(params![first, last], event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

pub fn delete_event(conn: &Connection, id: i64) -> Result<()> {
    let affected = conn.execute("DELETE FROM events WHERE id = ?1", [id])?;
    if affected == 0 {
        return Err(LoungeError::not_found("event", id));
    }
    debug!(event_id = id, "Deleted event");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) fn setup_test_db() -> (TempDir, Connection) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let conn = init_db(&db_path).unwrap();
        (temp_dir, conn)
    }

    fn make_student(conn: &Connection, name: &str) -> Student {
        add_student(conn, &NewStudent::named(name)).unwrap()
    }

    fn homework(title: &str, due: &str) -> NewAssignment {
        NewAssignment {
            title: title.to_string(),
            due_date: due.to_string(),
            is_test: false,
            description: None,
        }
    }

    // ========== init_db tests ==========

    #[test]
    fn test_init_db_creates_tables() {
        let (_temp_dir, conn) = setup_test_db();

        for table in ["students", "assignments", "events", "schema_migrations"] {
            let exists: bool = conn
                .query_row(
                    "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(exists, "missing table {}", table);
        }
    }

    #[test]
    fn test_init_db_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let conn1 = init_db(&db_path).unwrap();
        make_student(&conn1, "Ada");
        drop(conn1);

        let conn2 = init_db(&db_path).unwrap();
        assert_eq!(run_migrations(&conn2).unwrap(), 0);
        assert_eq!(list_students(&conn2).unwrap().len(), 1);
    }

    // ========== Validation helpers ==========

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(
            parse_iso_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_iso_date(" 2024-02-29 ").is_ok());
        assert!(matches!(
            parse_iso_date("2024-13-01"),
            Err(LoungeError::Validation(_))
        ));
        assert!(parse_iso_date("2023-02-29").is_err());
        assert!(parse_iso_date("2024-1-5").is_err());
        assert!(parse_iso_date("").is_err());
        assert!(matches!(
            parse_iso_date("-999-01-01"),
            Err(LoungeError::Validation(_))
        ));
        assert!(matches!(
            parse_iso_date("+999-01-01"),
            Err(LoungeError::Validation(_))
        ));
        assert!(parse_iso_date("2024/03/01").is_err());
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            " Math ".to_string(),
            "".to_string(),
            "math".to_string(),
            "Physics".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["Math", "Physics"]);
    }

    // ========== Student tests ==========

    #[test]
    fn test_add_and_get_student() {
        let (_temp_dir, conn) = setup_test_db();
        let input = NewStudent {
            name: "  Ada Lovelace ".to_string(),
            notes: Some("   ".to_string()),
            strengths: vec!["Math".to_string()],
            weaknesses: vec!["History".to_string(), " ".to_string()],
        };

        let student = add_student(&conn, &input).unwrap();
        assert_eq!(student.name, "Ada Lovelace");
        assert!(student.notes.is_none());

        let retrieved = get_student(&conn, student.id).unwrap().unwrap();
        assert_eq!(retrieved, student);
        assert_eq!(retrieved.strengths, vec!["Math"]);
        assert_eq!(retrieved.weaknesses, vec!["History"]);
    }

    #[test]
    fn test_add_student_requires_name() {
        let (_temp_dir, conn) = setup_test_db();
        let result = add_student(&conn, &NewStudent::named("   "));
        assert!(matches!(result, Err(LoungeError::Validation(_))));
        assert!(list_students(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_list_students_sorted_case_insensitive() {
        let (_temp_dir, conn) = setup_test_db();
        make_student(&conn, "charlie");
        make_student(&conn, "Bob");
        make_student(&conn, "alice");

        let names: Vec<String> = list_students(&conn)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["alice", "Bob", "charlie"]);
    }

    #[test]
    fn test_get_nonexistent_student() {
        let (_temp_dir, conn) = setup_test_db();
        assert!(get_student(&conn, 999).unwrap().is_none());
    }

    #[test]
    fn test_delete_student_cascades() {
        let (_temp_dir, conn) = setup_test_db();
        let ada = make_student(&conn, "Ada");
        let bob = make_student(&conn, "Bob");
        add_assignment(&conn, ada.id, &homework("Essay", "2024-03-01")).unwrap();
        add_assignment(&conn, ada.id, &homework("Quiz prep", "2024-03-20")).unwrap();
        add_assignment(&conn, bob.id, &homework("Lab report", "2024-03-10")).unwrap();

        let removed = delete_student(&conn, ada.id).unwrap();
        assert_eq!(removed, 2);

        assert!(matches!(
            list_assignments_for_month(&conn, ada.id, 2024, 3),
            Err(LoungeError::NotFound { kind: "student", .. })
        ));
        let orphans: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM assignments WHERE student_id = ?1",
                [ada.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(orphans, 0);
        assert_eq!(count_assignments(&conn).unwrap(), 1);
    }

    #[test]
    fn test_delete_nonexistent_student() {
        let (_temp_dir, conn) = setup_test_db();
        assert!(matches!(
            delete_student(&conn, 42),
            Err(LoungeError::NotFound { kind: "student", id: 42 })
        ));
    }

    // ========== Assignment tests ==========

    #[test]
    fn test_add_assignment() {
        let (_temp_dir, conn) = setup_test_db();
        let ada = make_student(&conn, "Ada");
        let input = NewAssignment {
            title: " Algebra test ".to_string(),
            due_date: "2024-03-15".to_string(),
            is_test: true,
            description: Some("Chapters 3-4".to_string()),
        };

        let assignment = add_assignment(&conn, ada.id, &input).unwrap();
        assert_eq!(assignment.title, "Algebra test");
        assert!(assignment.is_test);
        assert!(!assignment.completed);

        let retrieved = get_assignment(&conn, assignment.id).unwrap().unwrap();
        assert_eq!(retrieved, assignment);
    }

    #[test]
    fn test_add_assignment_rejects_empty_title() {
        let (_temp_dir, conn) = setup_test_db();
        let ada = make_student(&conn, "Ada");

        let result = add_assignment(&conn, ada.id, &homework("   ", "2024-03-15"));
        assert!(matches!(result, Err(LoungeError::Validation(_))));
        assert_eq!(count_assignments(&conn).unwrap(), 0);
    }

    #[test]
    fn test_add_assignment_rejects_bad_date() {
        let (_temp_dir, conn) = setup_test_db();
        let ada = make_student(&conn, "Ada");

        let result = add_assignment(&conn, ada.id, &homework("Essay", "2024-13-01"));
        assert!(matches!(result, Err(LoungeError::Validation(_))));
        assert_eq!(count_assignments(&conn).unwrap(), 0);
    }

    #[test]
    fn test_add_assignment_rejects_unknown_student() {
        let (_temp_dir, conn) = setup_test_db();

        let result = add_assignment(&conn, 77, &homework("Essay", "2024-03-01"));
        assert!(matches!(result, Err(LoungeError::Validation(_))));
        assert_eq!(count_assignments(&conn).unwrap(), 0);
    }

    #[test]
    fn test_list_assignments_month_boundaries() {
        let (_temp_dir, conn) = setup_test_db();
        let ada = make_student(&conn, "Ada");
        for (title, due) in [
            ("before", "2024-01-31"),
            ("last", "2024-02-29"),
            ("first", "2024-02-01"),
            ("after", "2024-03-01"),
        ] {
            add_assignment(&conn, ada.id, &homework(title, due)).unwrap();
        }

        let titles: Vec<String> = list_assignments_for_month(&conn, ada.id, 2024, 2)
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["first", "last"]);
    }

    #[test]
    fn test_list_assignments_sorted_and_scoped() {
        let (_temp_dir, conn) = setup_test_db();
        let ada = make_student(&conn, "Ada");
        let bob = make_student(&conn, "Bob");
        add_assignment(&conn, ada.id, &homework("B", "2024-03-20")).unwrap();
        add_assignment(&conn, ada.id, &homework("A", "2024-03-05")).unwrap();
        add_assignment(&conn, ada.id, &homework("C", "2024-03-20")).unwrap();
        add_assignment(&conn, bob.id, &homework("Other", "2024-03-10")).unwrap();

        let titles: Vec<String> = list_assignments_for_month(&conn, ada.id, 2024, 3)
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_list_assignments_errors() {
        let (_temp_dir, conn) = setup_test_db();
        let ada = make_student(&conn, "Ada");

        assert!(matches!(
            list_assignments_for_month(&conn, ada.id, 2024, 13),
            Err(LoungeError::InvalidArgument(_))
        ));
        assert!(matches!(
            list_assignments_for_month(&conn, 999, 2024, 3),
            Err(LoungeError::NotFound { kind: "student", id: 999 })
        ));
    }

    #[test]
    fn test_toggle_completion() {
        let (_temp_dir, conn) = setup_test_db();
        let ada = make_student(&conn, "Ada");
        let assignment = add_assignment(&conn, ada.id, &homework("Essay", "2024-03-01")).unwrap();

        assert!(toggle_completion(&conn, assignment.id).unwrap());
        assert!(get_assignment(&conn, assignment.id).unwrap().unwrap().completed);

        assert!(!toggle_completion(&conn, assignment.id).unwrap());
        assert!(!get_assignment(&conn, assignment.id).unwrap().unwrap().completed);
    }

    #[test]
    fn test_toggle_from_completed() {
        let (_temp_dir, conn) = setup_test_db();
        let ada = make_student(&conn, "Ada");
        let assignment = add_assignment(&conn, ada.id, &homework("Essay", "2024-03-01")).unwrap();
        conn.execute(
            "UPDATE assignments SET completed = 1 WHERE id = ?1",
            [assignment.id],
        )
        .unwrap();

        assert!(!toggle_completion(&conn, assignment.id).unwrap());
        assert!(!get_assignment(&conn, assignment.id).unwrap().unwrap().completed);
    }

    #[test]
    fn test_toggle_only_affects_one_row() {
        let (_temp_dir, conn) = setup_test_db();
        let ada = make_student(&conn, "Ada");
        let a = add_assignment(&conn, ada.id, &homework("A", "2024-03-01")).unwrap();
        let b = add_assignment(&conn, ada.id, &homework("B", "2024-03-01")).unwrap();

        toggle_completion(&conn, a.id).unwrap();
        assert!(!get_assignment(&conn, b.id).unwrap().unwrap().completed);
    }

    #[test]
    fn test_toggle_nonexistent_assignment() {
        let (_temp_dir, conn) = setup_test_db();
        assert!(matches!(
            toggle_completion(&conn, 5),
            Err(LoungeError::NotFound { kind: "assignment", id: 5 })
        ));
    }

    #[test]
    fn test_delete_assignment() {
        let (_temp_dir, conn) = setup_test_db();
        let ada = make_student(&conn, "Ada");
        let assignment = add_assignment(&conn, ada.id, &homework("Essay", "2024-03-01")).unwrap();

        assert_eq!(delete_assignment(&conn, assignment.id).unwrap(), ada.id);
        assert!(get_assignment(&conn, assignment.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_nonexistent_assignment() {
        let (_temp_dir, conn) = setup_test_db();
        assert!(matches!(
            delete_assignment(&conn, 3),
            Err(LoungeError::NotFound { kind: "assignment", id: 3 })
        ));
    }

    // ========== Event tests ==========

    #[test]
    fn test_events_for_month() {
        let (_temp_dir, conn) = setup_test_db();
        add_event(&conn, "Parent night", "2024-04-18").unwrap();
        add_event(&conn, "Open day", "2024-04-01").unwrap();
        add_event(&conn, "Exams", "2024-05-01").unwrap();

        let titles: Vec<String> = list_events_for_month(&conn, 2024, 4)
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Open day", "Parent night"]);
    }

    #[test]
    fn test_add_event_validation() {
        let (_temp_dir, conn) = setup_test_db();
        assert!(matches!(
            add_event(&conn, "", "2024-04-01"),
            Err(LoungeError::Validation(_))
        ));
        assert!(matches!(
            add_event(&conn, "Open day", "April 1st"),
            Err(LoungeError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_event() {
        let (_temp_dir, conn) = setup_test_db();
        let event = add_event(&conn, "Open day", "2024-04-01").unwrap();

        delete_event(&conn, event.id).unwrap();
        assert!(list_events_for_month(&conn, 2024, 4).unwrap().is_empty());
        assert!(matches!(
            delete_event(&conn, event.id),
            Err(LoungeError::NotFound { kind: "event", .. })
        ));
    }
}
