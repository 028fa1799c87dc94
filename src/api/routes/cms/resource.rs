//! The portfolio content tables that can be edited through the CMS and
//! the columns each one accepts.

use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kind {
    Text,
    Integer,
    Bool,
    /// Arrays and objects, stored as JSON text
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Presence {
    /// Must be given on insert and can never be null
    Required,
    /// Falls back to a column default and can never be null
    Defaulted,
    Optional,
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub kind: Kind,
    presence: Presence,
}

const fn required(name: &'static str, kind: Kind) -> Column {
    Column {
        name,
        kind,
        presence: Presence::Required,
    }
}

const fn defaulted(name: &'static str, kind: Kind) -> Column {
    Column {
        name,
        kind,
        presence: Presence::Defaulted,
    }
}

const fn optional(name: &'static str, kind: Kind) -> Column {
    Column {
        name,
        kind,
        presence: Presence::Optional,
    }
}

#[derive(Debug)]
pub struct Resource {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// Listed by `sort_order` rather than insertion order
    pub sorted: bool,
    pub has_created_at: bool,
}

pub static RESOURCES: [Resource; 9] = [
    Resource {
        name: "hero_content",
        columns: &[
            required("name", Kind::Text),
            required("title", Kind::Text),
            required("branding_statement", Kind::Text),
        ],
        sorted: false,
        has_created_at: false,
    },
    Resource {
        name: "about_content",
        columns: &[required("content", Kind::Text), optional("gwa", Kind::Text)],
        sorted: false,
        has_created_at: false,
    },
    Resource {
        name: "skill_categories",
        columns: &[
            required("title", Kind::Text),
            defaulted("sort_order", Kind::Integer),
        ],
        sorted: true,
        has_created_at: true,
    },
    Resource {
        name: "skills",
        columns: &[
            required("category_id", Kind::Text),
            required("name", Kind::Text),
            required("level", Kind::Integer),
            defaulted("sort_order", Kind::Integer),
        ],
        sorted: true,
        has_created_at: true,
    },
    Resource {
        name: "projects",
        columns: &[
            required("title", Kind::Text),
            required("role", Kind::Text),
            required("description", Kind::Text),
            defaulted("tech", Kind::Json),
            optional("impact", Kind::Text),
            optional("link", Kind::Text),
            optional("image_url", Kind::Text),
            defaulted("featured", Kind::Bool),
            defaulted("sort_order", Kind::Integer),
        ],
        sorted: true,
        has_created_at: true,
    },
    Resource {
        name: "achievements",
        columns: &[
            required("title", Kind::Text),
            optional("description", Kind::Text),
            optional("icon", Kind::Text),
            defaulted("sort_order", Kind::Integer),
        ],
        sorted: true,
        has_created_at: true,
    },
    Resource {
        name: "leadership_content",
        columns: &[
            required("title", Kind::Text),
            optional("description", Kind::Text),
            defaulted("traits", Kind::Json),
        ],
        sorted: false,
        has_created_at: false,
    },
    Resource {
        name: "contact_info",
        columns: &[
            optional("email", Kind::Text),
            optional("phone", Kind::Text),
            optional("location", Kind::Text),
            optional("linkedin", Kind::Text),
            optional("github", Kind::Text),
        ],
        sorted: false,
        has_created_at: false,
    },
    Resource {
        name: "site_settings",
        columns: &[
            optional("profile_image_url", Kind::Text),
            optional("resume_url", Kind::Text),
        ],
        sorted: false,
        has_created_at: false,
    },
];

// Maintained by the store. Clients send them back along with the rest
// of a row and they are ignored.
const MANAGED_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Look up an editable resource by table name.
pub fn find(name: &str) -> Option<&'static Resource> {
    RESOURCES.iter().find(|r| r.name == name)
}

impl Resource {
    /// Every column of a row in the order it is selected.
    pub fn output_columns(&self) -> Vec<(&'static str, Kind)> {
        let mut columns = vec![("id", Kind::Text)];
        columns.extend(self.columns.iter().map(|c| (c.name, c.kind)));
        if self.has_created_at {
            columns.push(("created_at", Kind::Text));
        }
        columns.push(("updated_at", Kind::Text));
        columns
    }

    /// Convert the fields of a request body into column values. An
    /// insert must carry every required column.
    pub fn bind(
        &self,
        fields: &Map<String, Value>,
        insert: bool,
    ) -> Result<Vec<(&'static str, SqlValue)>, String> {
        let mut values = Vec::new();

        for (name, value) in fields {
            if MANAGED_FIELDS.contains(&name.as_str()) {
                continue;
            }
            let Some(column) = self.columns.iter().find(|c| c.name == name) else {
                return Err(format!("Unknown field: {}", name));
            };
            values.push((column.name, column.to_sql(value)?));
        }

        if insert {
            let missing = self.columns.iter().find(|c| {
                c.presence == Presence::Required && !values.iter().any(|(name, _)| *name == c.name)
            });
            if let Some(column) = missing {
                return Err(format!("Missing required field: {}", column.name));
            }
        }

        Ok(values)
    }
}

impl Column {
    fn to_sql(&self, value: &Value) -> Result<SqlValue, String> {
        let sql_value = match (self.kind, value) {
            (_, Value::Null) if self.presence == Presence::Optional => Some(SqlValue::Null),
            (Kind::Text, Value::String(s)) => Some(SqlValue::Text(s.clone())),
            (Kind::Integer, Value::Number(n)) => n.as_i64().map(SqlValue::Integer),
            (Kind::Bool, Value::Bool(b)) => Some(SqlValue::Integer(i64::from(*b))),
            (Kind::Json, Value::Array(_) | Value::Object(_)) => {
                Some(SqlValue::Text(value.to_string()))
            }
            _ => None,
        };
        sql_value.ok_or_else(|| format!("Invalid value for {}", self.name))
    }
}

/// Convert a stored value back to JSON.
pub fn to_json(kind: Kind, value: SqlValue) -> Value {
    match (kind, value) {
        (_, SqlValue::Null) => Value::Null,
        (Kind::Bool, SqlValue::Integer(i)) => Value::Bool(i != 0),
        (Kind::Json, SqlValue::Text(s)) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        (_, SqlValue::Integer(i)) => Value::from(i),
        (_, SqlValue::Real(f)) => Value::from(f),
        (_, SqlValue::Text(s)) => Value::String(s),
        (_, SqlValue::Blob(b)) => Value::from(b),
    }
}
