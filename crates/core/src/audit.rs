//! Audit column auto-fill.
//!
//! Persistence code calls a [`FillHandler`] right before writing a row. The
//! handler sees the entity only through [`FieldAccessor`], so entities that
//! lack some audit column are left alone for that column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context;

/// Identity recorded when no caller is known (jobs, migrations, anonymous calls).
pub const DEFAULT_USERNAME: &str = "system";

pub const CREATED_BY: &str = "createdBy";
pub const CREATED_TIME: &str = "createdTime";
pub const UPDATED_BY: &str = "updatedBy";
pub const UPDATED_TIME: &str = "updatedTime";

/// Value written into an audit column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillValue {
    Text(String),
    Time(DateTime<Utc>),
}

/// Name-based write access to an entity's fields.
pub trait FieldAccessor {
    /// Set `field` to `value`. Returns `false` (and changes nothing) when the
    /// entity has no such field or the value does not fit it.
    fn set_field(&mut self, field: &str, value: FillValue) -> bool;
}

/// Pre-write hook registered with the persistence layer.
pub trait FillHandler: Send + Sync {
    fn insert_fill(&self, target: &mut dyn FieldAccessor);

    fn update_fill(&self, target: &mut dyn FieldAccessor);
}

/// Stamps `createdBy/createdTime` on insert and `updatedBy/updatedTime` on
/// every write, using the current caller's user name.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuditFillHandler;

impl AuditFillHandler {
    pub fn new() -> Self {
        Self
    }

    fn current_username(&self) -> String {
        context::current_username().unwrap_or_else(|| DEFAULT_USERNAME.to_string())
    }
}

impl FillHandler for AuditFillHandler {
    fn insert_fill(&self, target: &mut dyn FieldAccessor) {
        target.set_field(CREATED_BY, FillValue::Text(self.current_username()));
        target.set_field(CREATED_TIME, FillValue::Time(Utc::now()));
        self.update_fill(target);
    }

    fn update_fill(&self, target: &mut dyn FieldAccessor) {
        let username = self.current_username();
        tracing::trace!(%username, "stamping update audit columns");
        target.set_field(UPDATED_BY, FillValue::Text(username));
        target.set_field(UPDATED_TIME, FillValue::Time(Utc::now()));
    }
}

/// The four audit columns, embeddable in any persisted record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStamp {
    pub created_by: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub updated_time: Option<DateTime<Utc>>,
}

impl FieldAccessor for AuditStamp {
    fn set_field(&mut self, field: &str, value: FillValue) -> bool {
        match (field, value) {
            (CREATED_BY, FillValue::Text(v)) => self.created_by = Some(v),
            (CREATED_TIME, FillValue::Time(v)) => self.created_time = Some(v),
            (UPDATED_BY, FillValue::Text(v)) => self.updated_by = Some(v),
            (UPDATED_TIME, FillValue::Time(v)) => self.updated_time = Some(v),
            _ => return false,
        }
        true
    }
}

/// JSON documents: only keys that already exist are filled.
impl FieldAccessor for Map<String, Value> {
    fn set_field(&mut self, field: &str, value: FillValue) -> bool {
        let Some(slot) = self.get_mut(field) else {
            return false;
        };
        *slot = match value {
            FillValue::Text(v) => Value::String(v),
            FillValue::Time(v) => Value::String(v.to_rfc3339()),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::context::{self, CallerContext};

    fn as_alice<R>(f: impl FnOnce() -> R) -> R {
        context::sync_scope(CallerContext::from_header(Some(r#"{"user_name":"alice"}"#)), f)
    }

    #[test]
    fn insert_with_caller_stamps_all_columns() {
        let before = Utc::now();
        let mut stamp = AuditStamp::default();

        as_alice(|| AuditFillHandler::new().insert_fill(&mut stamp));

        assert_eq!(stamp.created_by.as_deref(), Some("alice"));
        assert_eq!(stamp.updated_by.as_deref(), Some("alice"));
        assert!(stamp.created_time.unwrap() >= before);
        assert!(stamp.updated_time.unwrap() >= stamp.created_time.unwrap());
    }

    #[test]
    fn insert_without_caller_uses_system() {
        let mut stamp = AuditStamp::default();
        AuditFillHandler::new().insert_fill(&mut stamp);

        assert_eq!(stamp.created_by.as_deref(), Some(DEFAULT_USERNAME));
        assert_eq!(stamp.updated_by.as_deref(), Some(DEFAULT_USERNAME));
    }

    #[test]
    fn blank_user_name_falls_back_to_system() {
        let mut stamp = AuditStamp::default();
        let ctx = CallerContext::from_header(Some(r#"{"user_name":"   "}"#));
        context::sync_scope(ctx, || AuditFillHandler::new().insert_fill(&mut stamp));

        assert_eq!(stamp.created_by.as_deref(), Some(DEFAULT_USERNAME));
    }

    #[test]
    fn update_leaves_created_columns_untouched() {
        let handler = AuditFillHandler::new();
        let mut stamp = AuditStamp::default();
        handler.insert_fill(&mut stamp);
        let created = (stamp.created_by.clone(), stamp.created_time);

        as_alice(|| handler.update_fill(&mut stamp));

        assert_eq!((stamp.created_by.clone(), stamp.created_time), created);
        assert_eq!(stamp.updated_by.as_deref(), Some("alice"));
        assert!(stamp.updated_time >= created.1);
    }

    #[test]
    fn json_documents_only_fill_existing_keys() {
        let mut doc = json!({ "name": "widget", "createdBy": null, "updatedBy": null })
            .as_object()
            .cloned()
            .unwrap();

        as_alice(|| AuditFillHandler::new().insert_fill(&mut doc));

        assert_eq!(doc["createdBy"], json!("alice"));
        assert_eq!(doc["updatedBy"], json!("alice"));
        assert!(!doc.contains_key("createdTime"));
        assert!(!doc.contains_key("updatedTime"));
        assert_eq!(doc["name"], json!("widget"));
    }

    #[test]
    fn entities_without_audit_fields_are_unaffected() {
        struct Tag {
            label: String,
        }

        impl FieldAccessor for Tag {
            fn set_field(&mut self, _field: &str, _value: FillValue) -> bool {
                false
            }
        }

        let mut tag = Tag { label: "x".into() };
        AuditFillHandler::new().insert_fill(&mut tag);
        assert_eq!(tag.label, "x");
    }

    #[test]
    fn mismatched_value_kind_is_rejected() {
        let mut stamp = AuditStamp::default();
        assert!(!stamp.set_field(CREATED_BY, FillValue::Time(Utc::now())));
        assert!(!stamp.set_field("deletedBy", FillValue::Text("x".into())));
        assert_eq!(stamp, AuditStamp::default());
    }
}
