//! Database queries for admin users and their sessions
use anyhow::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use tokio_rusqlite::{Connection, params};

pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

pub struct AdminSession {
    pub id: i64,
    pub admin_user_id: i64,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of checking a session token
pub enum SessionStatus {
    Valid(AdminSession),
    Expired,
    Missing,
}

pub async fn admin_user_exists(db: &Connection) -> Result<bool, Error> {
    let exists = db
        .call(|conn| {
            let exists: bool =
                conn.query_row("SELECT EXISTS(SELECT 1 FROM admin_user)", [], |row| {
                    row.get(0)
                })?;
            Ok(exists)
        })
        .await?;
    Ok(exists)
}

pub async fn insert_admin_user(
    db: &Connection,
    username: &str,
    password_hash: &str,
) -> Result<i64, Error> {
    let username = username.to_owned();
    let password_hash = password_hash.to_owned();
    let id = db
        .call(move |conn| {
            conn.execute(
                "INSERT INTO admin_user (username, password_hash) VALUES (?1, ?2)",
                params![username, password_hash],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await?;
    Ok(id)
}

fn find_admin_user(
    conn: &rusqlite::Connection,
    column: &str,
    value: rusqlite::types::Value,
) -> rusqlite::Result<Option<AdminUser>> {
    conn.query_row(
        &format!("SELECT id, username, password_hash FROM admin_user WHERE {column} = ?1"),
        [value],
        |row| {
            Ok(AdminUser {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
            })
        },
    )
    .optional()
}

pub async fn find_admin_user_by_username(
    db: &Connection,
    username: &str,
) -> Result<Option<AdminUser>, Error> {
    let username = username.to_owned();
    let user = db
        .call(move |conn| Ok(find_admin_user(conn, "username", username.into())?))
        .await?;
    Ok(user)
}

pub async fn find_admin_user_by_id(db: &Connection, id: i64) -> Result<Option<AdminUser>, Error> {
    let user = db
        .call(move |conn| Ok(find_admin_user(conn, "id", id.into())?))
        .await?;
    Ok(user)
}

pub async fn update_password_hash(
    db: &Connection,
    admin_user_id: i64,
    password_hash: &str,
) -> Result<(), Error> {
    let password_hash = password_hash.to_owned();
    let updated_at = Utc::now().to_rfc3339();
    db.call(move |conn| {
        conn.execute(
            "UPDATE admin_user SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            params![password_hash, updated_at, admin_user_id],
        )?;
        Ok(())
    })
    .await?;
    Ok(())
}

/// Start a new session for the user, ending any previous ones.
pub async fn replace_sessions(
    db: &Connection,
    admin_user_id: i64,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), Error> {
    let token = token.to_owned();
    let expires_at = expires_at.to_rfc3339();
    db.call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM admin_session WHERE admin_user_id = ?1",
            [admin_user_id],
        )?;
        tx.execute(
            "INSERT INTO admin_session (admin_user_id, token, expires_at) VALUES (?1, ?2, ?3)",
            params![admin_user_id, token, expires_at],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await?;
    Ok(())
}

pub async fn find_session_by_token(
    db: &Connection,
    token: &str,
) -> Result<Option<AdminSession>, Error> {
    let token = token.to_owned();
    let row = db
        .call(move |conn| {
            let row = conn
                .query_row(
                    r"
                    SELECT s.id, s.admin_user_id, u.username, s.expires_at
                    FROM admin_session s
                    JOIN admin_user u ON u.id = s.admin_user_id
                    WHERE s.token = ?1
                    ",
                    [token],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;
            Ok(row)
        })
        .await?;

    let Some((id, admin_user_id, username, expires_at)) = row else {
        return Ok(None);
    };
    let expires_at = DateTime::parse_from_rfc3339(&expires_at)?.with_timezone(&Utc);

    Ok(Some(AdminSession {
        id,
        admin_user_id,
        username,
        expires_at,
    }))
}

pub async fn delete_session(db: &Connection, id: i64) -> Result<(), Error> {
    db.call(move |conn| {
        conn.execute("DELETE FROM admin_session WHERE id = ?1", [id])?;
        Ok(())
    })
    .await?;
    Ok(())
}

pub async fn delete_session_by_token(db: &Connection, token: &str) -> Result<(), Error> {
    let token = token.to_owned();
    db.call(move |conn| {
        conn.execute("DELETE FROM admin_session WHERE token = ?1", [token])?;
        Ok(())
    })
    .await?;
    Ok(())
}

/// Check a session token. Expired sessions are deleted as they are
/// found.
pub async fn verify_session(
    db: &Connection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<SessionStatus, Error> {
    let Some(session) = find_session_by_token(db, token).await? else {
        return Ok(SessionStatus::Missing);
    };

    if session.expires_at < now {
        delete_session(db, session.id).await?;
        return Ok(SessionStatus::Expired);
    }

    Ok(SessionStatus::Valid(session))
}
