//! Shared setup for tests that need a live PostgreSQL.
//!
//! Run with: `DATABASE_URL=postgres://... cargo test -p roster-db -- --ignored`

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use roster_core::{Department, Employee, EmployeeStatus, EmploymentType, Position, Site};
use roster_db::{CallContext, ConnectionPool, DatabaseSettings, PoolConfig, RepositoryFactory};
use uuid::Uuid;

pub fn ctx() -> CallContext {
    CallContext::with_timeout(Duration::from_secs(30))
}

pub fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../migrations/postgres")
}

pub fn settings() -> DatabaseSettings {
    let mut settings = DatabaseSettings::from_env().expect("database settings");
    settings.pool = PoolConfig::default()
        .max_connections(5)
        .min_connections(0)
        .retries(1, Duration::from_millis(100));
    settings
}

/// Pool against `DATABASE_URL` with the real schema applied.
pub async fn migrated_pool() -> ConnectionPool {
    let pool = ConnectionPool::initialize(&settings())
        .await
        .expect("connect to DATABASE_URL");
    pool.migrations()
        .run_migrations(&ctx(), &migrations_dir())
        .await
        .expect("apply migrations");
    pool
}

/// Short unique suffix so tests never collide on names or e-mails.
pub fn unique() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_string()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn position(title: &str) -> Position {
    Position {
        id: Uuid::nil(),
        title: title.to_string(),
        description: "Test position".to_string(),
        requirements: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn department(name: &str) -> Department {
    Department {
        id: Uuid::nil(),
        name: name.to_string(),
        description: None,
        lead_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn site(name: &str, city: &str) -> Site {
    Site {
        id: Uuid::nil(),
        name: name.to_string(),
        city: city.to_string(),
        address: "1 Test Street".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Position, department and site ids every employee needs.
#[derive(Debug, Clone, Copy)]
pub struct Refs {
    pub position_id: Uuid,
    pub department_id: Uuid,
    pub site_id: Uuid,
}

pub async fn create_refs(factory: &RepositoryFactory) -> Refs {
    let ctx = ctx();
    let tag = unique();
    Refs {
        position_id: factory
            .positions()
            .create(&ctx, &position(&format!("Engineer {tag}")))
            .await
            .unwrap(),
        department_id: factory
            .departments()
            .create(&ctx, &department(&format!("Dept {tag}")))
            .await
            .unwrap(),
        site_id: factory
            .sites()
            .create(&ctx, &site(&format!("Site {tag}"), "Berlin"))
            .await
            .unwrap(),
    }
}

pub fn employee(refs: Refs, first: &str, last: &str) -> Employee {
    Employee {
        id: Uuid::nil(),
        first_name: first.to_string(),
        middle_name: None,
        last_name: last.to_string(),
        display_name: Employee::compose_display_name(first, last),
        email: format!(
            "{}.{}.{}@roster.test",
            first.to_lowercase(),
            last.to_lowercase(),
            unique()
        ),
        address: None,
        position_id: refs.position_id,
        department_id: refs.department_id,
        site_id: refs.site_id,
        manager_id: None,
        employment_type: EmploymentType::FullTime,
        start_date: date(2024, 1, 1),
        end_date: None,
        status: EmployeeStatus::Active,
        profile_picture_url: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
