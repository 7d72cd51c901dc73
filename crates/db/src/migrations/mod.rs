//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20251001_000001_create_users_and_profiles;
mod m20251001_000002_create_news_tables;
mod m20251001_000003_create_contact_messages_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_users_and_profiles::Migration),
            Box::new(m20251001_000002_create_news_tables::Migration),
            Box::new(m20251001_000003_create_contact_messages_table::Migration),
        ]
    }
}
