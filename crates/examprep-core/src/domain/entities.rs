//! Entities pushed by the server when a new item is created.
//!
//! Both entities mirror the JSON objects returned by the REST API and
//! broadcast over the WebSocket.  JSON keys are identical to the Rust field
//! names, so no `#[serde(rename)]` is needed except for the course status
//! values.
//!
//! # Example payloads
//!
//! ```json
//! {"id":7,"date":"2024-01-15","title":"Pancakes","ingredients":"flour, eggs, milk","category":"breakfast","rating":4.5}
//! {"id":3,"name":"Rust 101","instructor":"Ana","description":"Intro","status":"ongoing","students":24,"duration":12}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A recipe as created through the REST API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Server-assigned identifier.
    pub id: i64,
    /// Creation date as the server formats it (e.g. `"2024-01-15"`).
    pub date: String,
    pub title: String,
    /// Free-form ingredient list.
    pub ingredients: String,
    pub category: String,
    /// Average rating, typically `0.0..=5.0`.
    pub rating: f64,
}

/// Lifecycle status of a [`Course`].
///
/// Statuses the client does not know yet decode as [`CourseStatus::Unknown`]
/// instead of rejecting the whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Upcoming,
    Ongoing,
    Completed,
    #[serde(other)]
    Unknown,
}

impl CourseStatus {
    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Upcoming => "upcoming",
            CourseStatus::Ongoing => "ongoing",
            CourseStatus::Completed => "completed",
            CourseStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A course as created through the REST API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Server-assigned identifier.
    pub id: i64,
    pub name: String,
    pub instructor: String,
    pub description: String,
    pub status: CourseStatus,
    /// Number of enrolled students.
    pub students: i64,
    /// Course length in hours.
    pub duration: i64,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_deserializes_from_server_json() {
        // Arrange
        let json = r#"{"id":7,"date":"2024-01-15","title":"Pancakes","ingredients":"flour, eggs","category":"breakfast","rating":4.5}"#;

        // Act
        let recipe: Recipe = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(recipe.id, 7);
        assert_eq!(recipe.title, "Pancakes");
        assert_eq!(recipe.category, "breakfast");
        assert!((recipe.rating - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_recipe_accepts_integer_rating() {
        let json = r#"{"id":1,"date":"d","title":"t","ingredients":"i","category":"c","rating":4}"#;
        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert!((recipe.rating - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_course_status_known_values() {
        for (raw, expected) in [
            ("upcoming", CourseStatus::Upcoming),
            ("ongoing", CourseStatus::Ongoing),
            ("completed", CourseStatus::Completed),
        ] {
            let status: CourseStatus = serde_json::from_str(&format!("\"{raw}\"")).unwrap();
            assert_eq!(status, expected);
            assert_eq!(status.as_str(), raw);
        }
    }

    #[test]
    fn test_course_status_unrecognised_value_is_unknown() {
        // Arrange: a status the server may add in the future
        let json = r#"{"id":3,"name":"Rust","instructor":"Ana","description":"d","status":"archived","students":2,"duration":10}"#;

        // Act
        let course: Course = serde_json::from_str(json).unwrap();

        // Assert – the frame is still usable
        assert_eq!(course.status, CourseStatus::Unknown);
        assert_eq!(course.name, "Rust");
    }

    #[test]
    fn test_course_missing_field_is_rejected() {
        let json = r#"{"id":3,"name":"Rust","instructor":"Ana","status":"ongoing","students":2,"duration":10}"#;
        let result: Result<Course, _> = serde_json::from_str(json);
        assert!(result.is_err(), "description is required");
    }

    #[test]
    fn test_course_status_display_matches_wire_name() {
        assert_eq!(CourseStatus::Ongoing.to_string(), "ongoing");
    }
}
