use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::calendar::{self, MonthGrid};
use crate::db;
use crate::error::{LoungeError, Result};
use crate::types::{Assignment, Event, Student};

/// Group assignments by ISO due date.
/// Order within a date follows the input order.
pub fn group_by_date(assignments: &[Assignment]) -> BTreeMap<String, Vec<&Assignment>> {
    let mut by_date: BTreeMap<String, Vec<&Assignment>> = BTreeMap::new();
    for assignment in assignments {
        by_date.entry(assignment.due_iso()).or_default().push(assignment);
    }
    by_date
}

pub fn group_events_by_date(events: &[Event]) -> BTreeMap<String, Vec<&Event>> {
    let mut by_date: BTreeMap<String, Vec<&Event>> = BTreeMap::new();
    for event in events {
        by_date.entry(event.date_iso()).or_default().push(event);
    }
    by_date
}

/// A real day of the month with everything due on it
#[derive(Debug, Serialize)]
pub struct DayCell<'a> {
    pub day: u32,
    pub iso: String,
    pub assignments: Vec<&'a Assignment>,
    pub events: Vec<&'a Event>,
}

/// Row of cells, `None` for days outside the month
pub type WeekCells<'a> = Vec<Option<DayCell<'a>>>;

/// A student's month: the day grid plus assignments and global events
#[derive(Debug)]
pub struct MonthView {
    pub student: Student,
    pub grid: MonthGrid,
    pub assignments: Vec<Assignment>,
    pub events: Vec<Event>,
}

impl MonthView {
    pub fn build(conn: &Connection, student_id: i64, year: i32, month: u32) -> Result<Self> {
        let grid = calendar::build_month_grid(year, month)?;
        let student = db::get_student(conn, student_id)?
            .ok_or(LoungeError::not_found("student", student_id))?;
        let assignments = db::list_assignments_for_month(conn, student_id, year, month)?;
        let events = db::list_events_for_month(conn, year, month)?;

        Ok(Self {
            student,
            grid,
            assignments,
            events,
        })
    }

    /// Merge assignments and events into the grid, week by week
    pub fn weeks(&self) -> Vec<WeekCells<'_>> {
        let assignments = group_by_date(&self.assignments);
        let events = group_events_by_date(&self.events);

        self.grid
            .weeks
            .iter()
            .map(|week| {
                week.iter()
                    .map(|cell| {
                        let day = (*cell)?;
                        let iso = self.grid.iso_of(day)?;
                        Some(DayCell {
                            day,
                            assignments: assignments.get(&iso).cloned().unwrap_or_default(),
                            events: events.get(&iso).cloned().unwrap_or_default(),
                            iso,
                        })
                    })
                    .collect()
            })
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.assignments.iter().filter(|a| a.completed).count()
    }

    pub fn pending_count(&self) -> usize {
        self.assignments.len() - self.completed_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::setup_test_db;
    use crate::types::{NewAssignment, NewStudent};
    use chrono::NaiveDate;

    fn make_assignment(id: i64, due: &str, title: &str) -> Assignment {
        Assignment {
            id,
            student_id: 1,
            title: title.to_string(),
            description: None,
            due_date: NaiveDate::parse_from_str(due, "%Y-%m-%d").unwrap(),
            is_test: false,
            completed: false,
        }
    }

    #[test]
    fn test_group_by_date_preserves_order() {
        let assignments = vec![
            make_assignment(1, "2024-03-05", "first"),
            make_assignment(2, "2024-03-05", "second"),
            make_assignment(3, "2024-03-07", "other"),
        ];

        let grouped = group_by_date(&assignments);
        assert_eq!(grouped.len(), 2);

        let titles: Vec<&str> = grouped["2024-03-05"].iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert_eq!(grouped["2024-03-07"].len(), 1);
    }

    #[test]
    fn test_group_by_date_empty() {
        assert!(group_by_date(&[]).is_empty());
    }

    #[test]
    fn test_month_view_merges_cells() {
        let (_temp_dir, conn) = setup_test_db();
        let ada = db::add_student(&conn, &NewStudent::named("Ada")).unwrap();
        for (title, due) in [("Essay", "2024-01-01"), ("Quiz", "2024-01-31"), ("Later", "2024-02-01")] {
            let input = NewAssignment {
                title: title.to_string(),
                due_date: due.to_string(),
                is_test: title == "Quiz",
                description: None,
            };
            db::add_assignment(&conn, ada.id, &input).unwrap();
        }
        db::add_event(&conn, "Open day", "2024-01-31").unwrap();

        let view = MonthView::build(&conn, ada.id, 2024, 1).unwrap();
        assert_eq!(view.assignments.len(), 2);
        assert_eq!(view.pending_count(), 2);

        let weeks = view.weeks();
        assert_eq!(weeks.len(), 5);

        let first = weeks[0][0].as_ref().unwrap();
        assert_eq!(first.day, 1);
        assert_eq!(first.iso, "2024-01-01");
        assert_eq!(first.assignments[0].title, "Essay");

        // Jan 31 2024 is the Wednesday of the last week
        let last = weeks[4][2].as_ref().unwrap();
        assert_eq!(last.day, 31);
        assert_eq!(last.assignments[0].title, "Quiz");
        assert_eq!(last.events[0].title, "Open day");

        assert!(weeks[4][3].is_none());
    }

    #[test]
    fn test_month_view_unknown_student() {
        let (_temp_dir, conn) = setup_test_db();
        assert!(matches!(
            MonthView::build(&conn, 12, 2024, 1),
            Err(LoungeError::NotFound { kind: "student", id: 12 })
        ));
    }

    #[test]
    fn test_month_view_invalid_month() {
        let (_temp_dir, conn) = setup_test_db();
        let ada = db::add_student(&conn, &NewStudent::named("Ada")).unwrap();
        assert!(matches!(
            MonthView::build(&conn, ada.id, 2024, 0),
            Err(LoungeError::InvalidArgument(_))
        ));
    }
}
