#![cfg(test)]
//! Shared test scaffolding: database bootstrap and DTO factories.

use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

// Run migrations only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

async fn connect() -> anyhow::Result<DatabaseConnection> {
    let cfg = configs::DatabaseConfig::from_file()
        .unwrap_or_else(|_| configs::DatabaseConfig::from_env());
    models::db::connect_with_config(&cfg).await
}

/// Fresh connection with migrations applied once per test process, or `None`
/// when no database is reachable (DB-backed tests skip themselves then).
pub async fn try_get_db() -> Option<DatabaseConnection> {
    common::utils::logging::init_logging_default();
    let db = connect().await.ok()?;
    MIGRATED
        .get_or_init(|| async {
            migration::Migrator::up(&db, None).await.expect("migrate up");
        })
        .await;
    Some(db)
}

pub mod factory {
    use chrono::{TimeZone, Utc};

    use crate::dto::{ProductDto, UserInsertDto};

    pub fn product_dto(name: &str) -> ProductDto {
        ProductDto {
            id: None,
            name: name.to_string(),
            description: "Good phone".into(),
            price: 800.0,
            img_url: "https://img.test/img.png".into(),
            date: Utc.with_ymd_and_hms(2022, 6, 24, 15, 0, 0).unwrap(),
            categories: Vec::new(),
        }
    }

    pub fn user_insert_dto(email: &str) -> UserInsertDto {
        UserInsertDto {
            first_name: "Maria".into(),
            last_name: "Brown".into(),
            email: email.to_string(),
            roles: Vec::new(),
            password: "safe-password".into(),
        }
    }
}
