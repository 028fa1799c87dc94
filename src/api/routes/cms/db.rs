//! Database queries for portfolio content
use anyhow::{Error, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{OptionalExtension, params_from_iter};
use serde_json::{Map, Value};
use tokio_rusqlite::Connection;

use super::resource::{Resource, to_json};

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

fn select_sql(resource: &Resource) -> String {
    let columns: Vec<&str> = resource
        .output_columns()
        .iter()
        .map(|(name, _)| *name)
        .collect();
    format!("SELECT {} FROM {}", columns.join(", "), resource.name)
}

fn row_to_json(resource: &Resource, row: &rusqlite::Row) -> rusqlite::Result<Value> {
    let mut object = Map::new();
    for (i, (name, kind)) in resource.output_columns().into_iter().enumerate() {
        let value: SqlValue = row.get(i)?;
        object.insert(name.to_string(), to_json(kind, value));
    }
    Ok(Value::Object(object))
}

fn find_row(
    conn: &rusqlite::Connection,
    resource: &Resource,
    id: &str,
) -> rusqlite::Result<Option<Value>> {
    conn.query_row(
        &format!("{} WHERE id = ?1", select_sql(resource)),
        [id],
        |row| row_to_json(resource, row),
    )
    .optional()
}

/// All rows of a resource, by `sort_order` when it has one.
pub async fn list_rows(db: &Connection, resource: &'static Resource) -> Result<Vec<Value>, Error> {
    let rows = db
        .call(move |conn| {
            let order = if resource.sorted {
                "ORDER BY sort_order ASC, rowid ASC"
            } else {
                "ORDER BY rowid ASC"
            };
            let mut stmt = conn.prepare(&format!("{} {}", select_sql(resource), order))?;
            let rows = stmt
                .query_map([], |row| row_to_json(resource, row))?
                .collect::<rusqlite::Result<Vec<Value>>>()?;
            Ok(rows)
        })
        .await?;
    Ok(rows)
}

pub async fn insert_row(
    db: &Connection,
    resource: &'static Resource,
    id: &str,
    values: Vec<(&'static str, SqlValue)>,
) -> Result<Value, Error> {
    let id = id.to_owned();
    let row = db
        .call(move |conn| {
            let mut columns = vec!["id"];
            let mut params = vec![SqlValue::Text(id.clone())];
            for (name, value) in values {
                columns.push(name);
                params.push(value);
            }
            let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("?{i}")).collect();

            conn.execute(
                &format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    resource.name,
                    columns.join(", "),
                    placeholders.join(", ")
                ),
                params_from_iter(params),
            )?;
            let row = find_row(conn, resource, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            Ok(row)
        })
        .await?;
    Ok(row)
}

/// Update the given columns of a row. Returns `None` when no row has
/// that id.
pub async fn update_row(
    db: &Connection,
    resource: &'static Resource,
    id: &str,
    values: Vec<(&'static str, SqlValue)>,
) -> Result<Option<Value>, Error> {
    let id = id.to_owned();
    let row = db
        .call(move |conn| {
            let mut assignments = Vec::new();
            let mut params = Vec::new();
            for (i, (name, value)) in values.into_iter().enumerate() {
                assignments.push(format!("{} = ?{}", name, i + 1));
                params.push(value);
            }
            assignments.push(format!("updated_at = {NOW}"));
            params.push(SqlValue::Text(id.clone()));

            let updated = conn.execute(
                &format!(
                    "UPDATE {} SET {} WHERE id = ?{}",
                    resource.name,
                    assignments.join(", "),
                    params.len()
                ),
                params_from_iter(params),
            )?;
            if updated == 0 {
                return Ok(None);
            }
            Ok(find_row(conn, resource, &id)?)
        })
        .await?;
    Ok(row)
}

pub async fn delete_row(db: &Connection, resource: &'static Resource, id: &str) -> Result<(), Error> {
    let id = id.to_owned();
    db.call(move |conn| {
        conn.execute(&format!("DELETE FROM {} WHERE id = ?1", resource.name), [id])?;
        Ok(())
    })
    .await?;
    Ok(())
}

/// True when a write was refused by a uniqueness or foreign key
/// constraint, which is the caller's fault rather than the server's.
pub fn is_constraint_violation(err: &Error) -> bool {
    matches!(
        err.downcast_ref::<tokio_rusqlite::Error>(),
        Some(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes::cms::resource::find;
    use crate::core::db::initialize_db;
    use serde_json::json;

    async fn test_db() -> Connection {
        let db = Connection::open_in_memory().await.unwrap();
        db.call(|conn| {
            initialize_db(conn)?;
            Ok(())
        })
        .await
        .unwrap();
        db
    }

    fn bind(resource: &Resource, value: Value) -> Vec<(&'static str, SqlValue)> {
        resource.bind(value.as_object().unwrap(), true).unwrap()
    }

    #[tokio::test]
    async fn test_rows_are_listed_by_sort_order() {
        let db = test_db().await;
        let categories = find("skill_categories").unwrap();

        for (id, title, sort_order) in [("b", "Backend", 2), ("f", "Frontend", 1), ("t", "Tools", 3)] {
            insert_row(
                &db,
                categories,
                id,
                bind(categories, json!({"title": title, "sort_order": sort_order})),
            )
            .await
            .unwrap();
        }

        let titles: Vec<Value> = list_rows(&db, categories)
            .await
            .unwrap()
            .into_iter()
            .map(|row| row["title"].clone())
            .collect();
        assert_eq!(titles, vec![json!("Frontend"), json!("Backend"), json!("Tools")]);
    }

    #[tokio::test]
    async fn test_insert_returns_the_stored_row() {
        let db = test_db().await;
        let projects = find("projects").unwrap();

        let row = insert_row(
            &db,
            projects,
            "p1",
            bind(
                projects,
                json!({"title": "Folio", "role": "Author", "description": "Site", "tech": ["Rust"]}),
            ),
        )
        .await
        .unwrap();

        assert_eq!(row["id"], "p1");
        assert_eq!(row["tech"], json!(["Rust"]));
        assert_eq!(row["featured"], json!(false));
        assert_eq!(row["sort_order"], json!(0));
        assert_eq!(row["link"], Value::Null);
        assert!(row["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_db().await;
        let about = find("about_content").unwrap();
        insert_row(&db, about, "a1", bind(about, json!({"content": "Hello"})))
            .await
            .unwrap();

        let row = update_row(&db, about, "a1", vec![("gwa", SqlValue::Text("1.25".into()))])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["content"], "Hello");
        assert_eq!(row["gwa"], "1.25");

        assert!(update_row(&db, about, "missing", vec![]).await.unwrap().is_none());

        delete_row(&db, about, "a1").await.unwrap();
        assert!(list_rows(&db, about).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_constraint_violations_are_detected() {
        let db = test_db().await;
        let skills = find("skills").unwrap();

        let err = insert_row(
            &db,
            skills,
            "s1",
            bind(skills, json!({"category_id": "nope", "name": "Rust", "level": 5})),
        )
        .await
        .unwrap_err();
        assert!(is_constraint_violation(&err));
    }
}
