use anyhow::Result;

use crate::core::db::{async_db, initialize_db};

pub async fn run(db_path: &str) -> Result<()> {
    println!("Initializing db...");
    let db = async_db(db_path).await?;
    db.call(|conn| {
        initialize_db(conn)?;
        Ok(())
    })
    .await?;
    println!("Finished initializing db at {}", db_path);

    Ok(())
}
