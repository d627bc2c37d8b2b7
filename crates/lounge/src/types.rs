use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A tracked student
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub notes: Option<String>,
    /// Subjects the student is good at
    pub strengths: Vec<String>,
    /// Subjects the student needs help with
    pub weaknesses: Vec<String>,
}

/// Input for creating a student
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStudent {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

impl NewStudent {
    #[cfg(test)]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A homework item or test owned by one student
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    pub id: i64,
    pub student_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub is_test: bool,
    pub completed: bool,
}

impl Assignment {
    pub fn kind(&self) -> AssignmentKind {
        if self.is_test {
            AssignmentKind::Test
        } else {
            AssignmentKind::Homework
        }
    }

    /// Due date as an ISO `YYYY-MM-DD` string
    pub fn due_iso(&self) -> String {
        self.due_date.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentKind {
    Homework,
    Test,
}

impl AssignmentKind {
    pub fn label(self) -> &'static str {
        match self {
            AssignmentKind::Homework => "Homework",
            AssignmentKind::Test => "Test",
        }
    }

    /// CSS class used by the month view
    pub fn css_class(self) -> &'static str {
        match self {
            AssignmentKind::Homework => "homework",
            AssignmentKind::Test => "test",
        }
    }
}

/// Unvalidated input for creating an assignment, as it arrives from a form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAssignment {
    pub title: String,
    pub due_date: String,
    #[serde(default)]
    pub is_test: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// A global calendar entry, not tied to any student
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
}

impl Event {
    pub fn date_iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_assignment(is_test: bool) -> Assignment {
        Assignment {
            id: 1,
            student_id: 7,
            title: "Algebra HW".to_string(),
            description: None,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            is_test,
            completed: false,
        }
    }

    #[test]
    fn test_assignment_kind() {
        assert_eq!(make_assignment(true).kind(), AssignmentKind::Test);
        assert_eq!(make_assignment(false).kind(), AssignmentKind::Homework);
        assert_eq!(AssignmentKind::Test.label(), "Test");
        assert_eq!(AssignmentKind::Homework.css_class(), "homework");
    }

    #[test]
    fn test_due_iso() {
        assert_eq!(make_assignment(false).due_iso(), "2024-03-05");
    }

    #[test]
    fn test_assignment_serialization() {
        let json = serde_json::to_string(&make_assignment(true)).unwrap();
        assert!(json.contains("\"due_date\":\"2024-03-05\""));
        assert!(json.contains("\"is_test\":true"));
        assert!(json.contains("\"completed\":false"));
    }

    #[test]
    fn test_new_student_defaults() {
        let json = r#"{"name":"Ada"}"#;
        let student: NewStudent = serde_json::from_str(json).unwrap();
        assert_eq!(student.name, "Ada");
        assert!(student.notes.is_none());
        assert!(student.strengths.is_empty());
        assert!(student.weaknesses.is_empty());
    }
}
