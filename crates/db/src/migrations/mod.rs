//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_kms_tables;
mod m20250101_000002_create_certificate_authority_tables;
mod m20250101_000003_create_certificate_tables;
mod m20250101_000004_create_ssh_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_kms_tables::Migration),
            Box::new(m20250101_000002_create_certificate_authority_tables::Migration),
            Box::new(m20250101_000003_create_certificate_tables::Migration),
            Box::new(m20250101_000004_create_ssh_tables::Migration),
        ]
    }
}
