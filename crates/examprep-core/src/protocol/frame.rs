//! Text-frame decoding: one JSON object per frame, one entity per object.
//!
//! The server pushes every newly created entity as a single UTF-8 JSON text
//! frame.  [`decode_frame`] turns such a frame into a typed entity.  Anything
//! the decoder rejects is reported as a [`FrameError`]; callers log it and
//! drop the frame, the connection itself is never affected.
//!
//! # What counts as malformed?
//!
//! - An empty (or whitespace-only) frame.
//! - Text that is not valid JSON.
//! - Valid JSON that is not an object (arrays, strings, numbers, `null`).
//! - An object with a missing key or a value of the wrong type.
//!
//! Extra keys the entity does not know about are ignored, so the server can
//! add fields without breaking older clients.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::domain::entities::{Course, Recipe};

/// Reasons a text frame could not be turned into an entity.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame carried no payload.
    #[error("empty frame")]
    Empty,

    /// The payload parsed as JSON but is not an object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// The payload is not valid JSON or does not match the entity's shape.
    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// An entity that can arrive as a push notification.
///
/// Implemented for [`Recipe`] and [`Course`].  The client is generic over
/// this trait so one implementation serves both feeds.
pub trait LiveEvent: DeserializeOwned + Send + 'static {
    /// Short lowercase name used in log output (`"recipe"`, `"course"`).
    const KIND: &'static str;

    /// One-line human-readable description shown when the entity arrives.
    fn headline(&self) -> String;
}

impl LiveEvent for Recipe {
    const KIND: &'static str = "recipe";

    fn headline(&self) -> String {
        format!("{} ({})", self.title, self.category)
    }
}

impl LiveEvent for Course {
    const KIND: &'static str = "course";

    fn headline(&self) -> String {
        format!("{} by {} ({})", self.name, self.instructor, self.status)
    }
}

/// Decodes one text frame into an entity of type `E`.
///
/// # Errors
///
/// Returns a [`FrameError`] describing why the frame was rejected.  The error
/// is meant for logging only.
///
/// # Example
///
/// ```rust
/// use examprep_core::{decode_frame, Recipe};
///
/// let frame = r#"{"id":1,"date":"2024-01-15","title":"Soup","ingredients":"water","category":"lunch","rating":3.0}"#;
/// let recipe: Recipe = decode_frame(frame).unwrap();
/// assert_eq!(recipe.title, "Soup");
/// ```
pub fn decode_frame<E: LiveEvent>(text: &str) -> Result<E, FrameError> {
    if text.trim().is_empty() {
        return Err(FrameError::Empty);
    }

    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(FrameError::NotAnObject {
            found: json_kind(&value),
        });
    }

    Ok(E::deserialize(value)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CourseStatus;
    use tokio_test::{assert_err, assert_ok};

    const RECIPE_FRAME: &str = r#"{"id":12,"date":"2024-03-01","title":"Ramen","ingredients":"noodles, broth","category":"dinner","rating":4.8}"#;

    #[test]
    fn test_decode_valid_recipe_frame() {
        // Act
        let recipe: Recipe = assert_ok!(decode_frame(RECIPE_FRAME));

        // Assert
        assert_eq!(recipe.id, 12);
        assert_eq!(recipe.title, "Ramen");
    }

    #[test]
    fn test_decode_valid_course_frame() {
        let frame = r#"{"id":4,"name":"Algorithms","instructor":"Bo","description":"Graphs","status":"upcoming","students":40,"duration":30}"#;
        let course: Course = assert_ok!(decode_frame(frame));
        assert_eq!(course.status, CourseStatus::Upcoming);
        assert_eq!(course.duration, 30);
    }

    #[test]
    fn test_decode_empty_frame_is_rejected() {
        let err = assert_err!(decode_frame::<Recipe>("   "));
        assert!(matches!(err, FrameError::Empty));
    }

    #[test]
    fn test_decode_non_json_is_rejected() {
        let err = assert_err!(decode_frame::<Recipe>("hello server"));
        assert!(matches!(err, FrameError::Json(_)));
    }

    #[test]
    fn test_decode_json_array_is_rejected_as_not_an_object() {
        // serde would happily map a positional array onto a struct; frames
        // must be objects.
        let frame = r#"[12,"2024-03-01","Ramen","noodles","dinner",4.8]"#;
        let err = assert_err!(decode_frame::<Recipe>(frame));
        assert!(matches!(err, FrameError::NotAnObject { found: "an array" }));
    }

    #[test]
    fn test_decode_wrong_entity_shape_is_rejected() {
        // Arrange: a course frame arriving on the recipe feed
        let frame = r#"{"id":4,"name":"Algorithms","instructor":"Bo","description":"Graphs","status":"upcoming","students":40,"duration":30}"#;

        // Act / Assert
        let err = assert_err!(decode_frame::<Recipe>(frame));
        assert!(matches!(err, FrameError::Json(_)));
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let frame = r#"{"id":1,"date":"d","title":"t","ingredients":"i","category":"c","rating":1.0,"author":"x"}"#;
        assert_ok!(decode_frame::<Recipe>(frame));
    }

    #[test]
    fn test_recipe_headline_contains_title_and_category() {
        let recipe: Recipe = decode_frame(RECIPE_FRAME).unwrap();
        assert_eq!(recipe.headline(), "Ramen (dinner)");
    }

    #[test]
    fn test_event_kinds() {
        assert_eq!(Recipe::KIND, "recipe");
        assert_eq!(Course::KIND, "course");
    }
}
