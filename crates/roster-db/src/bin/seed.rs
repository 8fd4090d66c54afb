//! # Seed Data Generator
//!
//! Populates the database with a small sample organization for development.
//!
//! ## Usage
//! ```bash
//! # Apply migrations first
//! cargo run -p roster-db --bin migrate -- up
//!
//! # Then seed
//! cargo run -p roster-db --bin seed
//! ```
//!
//! ## Generated Data
//! - Positions: engineering, product and operations roles
//! - Departments: one per function, each with a lead
//! - Sites: a few office locations
//! - Employees: a lead per department plus reports spread across sites
//!
//! Everything is written through one transaction: either the whole
//! organization appears or nothing does. E-mails carry a run suffix so the
//! tool can be run repeatedly against the same database.

use std::time::Duration;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use roster_core::{Department, Employee, EmployeeStatus, EmploymentType, Position, Site};
use roster_db::{CallContext, ConnectionPool, DatabaseSettings, RepositoryFactory};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// (title, description)
const POSITIONS: &[(&str, &str)] = &[
    ("Software Engineer", "Builds and maintains services"),
    ("Engineering Manager", "Leads an engineering team"),
    ("Product Manager", "Owns product direction"),
    ("Operations Specialist", "Keeps the offices running"),
];

/// (name, description)
const DEPARTMENTS: &[(&str, &str)] = &[
    ("Engineering", "Platform and product engineering"),
    ("Product", "Product management and design"),
    ("Operations", "Facilities and IT"),
];

/// (name, city, address)
const SITES: &[(&str, &str, &str)] = &[
    ("Berlin HQ", "Berlin", "Torstrasse 1"),
    ("Lisbon Hub", "Lisbon", "Avenida da Liberdade 100"),
    ("Remote", "Remote", ""),
];

/// (first, last, position index, department index, is lead)
const PEOPLE: &[(&str, &str, usize, usize, bool)] = &[
    ("Grace", "Hopper", 1, 0, true),
    ("Ada", "Lovelace", 0, 0, false),
    ("Alan", "Turing", 0, 0, false),
    ("Katherine", "Johnson", 2, 1, true),
    ("Margaret", "Hamilton", 2, 1, false),
    ("Linus", "Pauling", 3, 2, true),
    ("Edsger", "Dijkstra", 0, 0, false),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("Roster Seed Data Generator");
    println!("==========================");

    let settings = DatabaseSettings::from_env().context("loading database settings")?;
    let pool = ConnectionPool::initialize(&settings)
        .await
        .context("connecting to database")?;
    let ctx = CallContext::with_timeout(Duration::from_secs(60));

    let tx = pool.factory().begin_transaction(&ctx).await?;
    let outcome = seed(&tx, &ctx).await;

    match outcome {
        Ok(count) => {
            tx.commit(&ctx).await?;
            println!("✓ Seeded {count} employees");
        }
        Err(e) => {
            error!(error = %e, "Seeding failed, rolling back");
            tx.rollback(&ctx).await?;
            pool.close().await;
            return Err(e.into());
        }
    }

    let stats = pool.stats();
    info!(active = stats.active, idle = stats.idle, "Pool after seeding");
    pool.close().await;

    Ok(())
}

async fn seed(tx: &RepositoryFactory, ctx: &CallContext) -> roster_db::DbResult<usize> {
    let now = Utc::now();
    let run = Uuid::new_v4().simple().to_string();
    let run = &run[..8];

    let mut position_ids = Vec::with_capacity(POSITIONS.len());
    for (title, description) in POSITIONS {
        let position = Position {
            id: Uuid::nil(),
            title: title.to_string(),
            description: description.to_string(),
            requirements: None,
            created_at: now,
            updated_at: now,
        };
        position_ids.push(tx.positions().create(ctx, &position).await?);
    }
    println!("  Positions:   {}", position_ids.len());

    let mut departments = Vec::with_capacity(DEPARTMENTS.len());
    for (name, description) in DEPARTMENTS {
        let mut department = Department {
            id: Uuid::nil(),
            name: name.to_string(),
            description: Some(description.to_string()),
            lead_id: None,
            created_at: now,
            updated_at: now,
        };
        department.id = tx.departments().create(ctx, &department).await?;
        departments.push(department);
    }
    println!("  Departments: {}", departments.len());

    let mut site_ids = Vec::with_capacity(SITES.len());
    for (name, city, address) in SITES {
        let site = Site {
            id: Uuid::nil(),
            name: name.to_string(),
            city: city.to_string(),
            address: address.to_string(),
            created_at: now,
            updated_at: now,
        };
        site_ids.push(tx.sites().create(ctx, &site).await?);
    }
    println!("  Sites:       {}", site_ids.len());

    // Leads first, so reports can point at them.
    let mut leads: Vec<Option<Uuid>> = vec![None; departments.len()];
    let ordered = PEOPLE
        .iter()
        .enumerate()
        .filter(|(_, p)| p.4)
        .chain(PEOPLE.iter().enumerate().filter(|(_, p)| !p.4));

    let mut count = 0;
    for (i, (first, last, position, department, is_lead)) in ordered {
        let employee = Employee {
            id: Uuid::nil(),
            first_name: first.to_string(),
            middle_name: None,
            last_name: last.to_string(),
            display_name: Employee::compose_display_name(first, last),
            email: format!(
                "{}.{}+{run}@roster.example",
                first.to_lowercase(),
                last.to_lowercase()
            ),
            address: None,
            position_id: position_ids[*position],
            department_id: departments[*department].id,
            site_id: site_ids[i % site_ids.len()],
            manager_id: if *is_lead { None } else { leads[*department] },
            employment_type: if i % 5 == 4 {
                EmploymentType::Contractor
            } else {
                EmploymentType::FullTime
            },
            start_date: NaiveDate::from_ymd_opt(2020 + (i as i32 % 4), 1 + (i as u32 % 12), 1)
                .unwrap_or_default(),
            end_date: None,
            status: EmployeeStatus::Active,
            profile_picture_url: None,
            created_at: now,
            updated_at: now,
        };

        let id = tx.employees().create(ctx, &employee).await?;
        if *is_lead {
            leads[*department] = Some(id);
        }
        count += 1;
    }

    for (department, lead) in departments.iter_mut().zip(&leads) {
        department.lead_id = *lead;
        tx.departments().update(ctx, department).await?;
    }

    Ok(count)
}
