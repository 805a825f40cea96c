use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use time::{macros::format_description, Date, OffsetDateTime};

/// Task row as stored and as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(serialize_with = "due_date::serialize")]
    pub due_date: Option<Date>,
    pub priority: Option<String>,
    pub tags: Vec<String>,
    pub done: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The editable part of a task, written as a whole on create and full edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFields {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<Date>,
    pub tags: Vec<String>,
}

/// `YYYY-MM-DD` on the wire. Empty string and null both mean "no date";
/// anything after the first ten characters (a time part) is ignored.
pub mod due_date {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<Date>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => {
                let text = d
                    .format(format_description!("[year]-[month]-[day]"))
                    .map_err(<S::Error as serde::ser::Error>::custom)?;
                s.serialize_str(&text)
            }
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => {
                let day = text.get(..10).unwrap_or(text);
                Date::parse(day, format_description!("[year]-[month]-[day]"))
                    .map(Some)
                    .map_err(|e| serde::de::Error::custom(format!("invalid due date {text:?}: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[derive(Debug, Deserialize)]
    struct Due {
        #[serde(default, deserialize_with = "due_date::deserialize")]
        due: Option<Date>,
    }

    fn parse(json: &str) -> Result<Option<Date>, serde_json::Error> {
        serde_json::from_str::<Due>(json).map(|d| d.due)
    }

    #[test]
    fn due_date_accepts_blank_null_and_iso() {
        assert_eq!(parse(r#"{}"#).unwrap(), None);
        assert_eq!(parse(r#"{"due": null}"#).unwrap(), None);
        assert_eq!(parse(r#"{"due": ""}"#).unwrap(), None);
        assert_eq!(parse(r#"{"due": "2025-03-09"}"#).unwrap(), Some(date!(2025 - 03 - 09)));
        assert_eq!(
            parse(r#"{"due": "2025-03-09T00:00:00.000Z"}"#).unwrap(),
            Some(date!(2025 - 03 - 09))
        );
        assert!(parse(r#"{"due": "tomorrow"}"#).is_err());
    }

    #[test]
    fn task_serializes_with_row_field_names() {
        let task = Task {
            id: 12,
            user_id: 1,
            title: "Buy milk".into(),
            description: None,
            due_date: Some(date!(2025 - 01 - 31)),
            priority: Some("low".into()),
            tags: vec!["home".into()],
            done: false,
            completed_at: None,
            created_at: datetime!(2025-01-01 10:00 UTC),
            updated_at: datetime!(2025-01-01 10:00 UTC),
        };
        let v = serde_json::to_value(&task).unwrap();
        assert_eq!(v["id"], 12);
        assert_eq!(v["user_id"], 1);
        assert_eq!(v["due_date"], "2025-01-31");
        assert_eq!(v["tags"], serde_json::json!(["home"]));
        assert_eq!(v["done"], false);
        assert!(v["completed_at"].is_null());
        assert_eq!(v["created_at"], "2025-01-01T10:00:00Z");
    }
}
