// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

use crate::m20261012_000001_create_leads::Leads;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Dedup identity: one lead per (normalized name, normalized address)
        manager
            .create_index(
                Index::create()
                    .name("idx_leads_identity")
                    .table(Leads::Table)
                    .col(Leads::NameKey)
                    .col(Leads::AddressKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // GET /leads?high_priority_only=true
        manager
            .create_index(
                Index::create()
                    .name("idx_leads_has_website")
                    .table(Leads::Table)
                    .col(Leads::HasWebsite)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_leads_has_website").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_leads_identity").to_owned())
            .await?;

        Ok(())
    }
}
