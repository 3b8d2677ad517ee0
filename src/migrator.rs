use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_companies_table::Migration),
            Box::new(m20240101_000002_create_working_hours_table::Migration),
            Box::new(m20240101_000003_create_catalog_tables::Migration),
            Box::new(m20240101_000004_create_inventory_items_table::Migration),
            Box::new(m20240101_000005_create_installations_table::Migration),
            Box::new(m20240101_000006_create_follow_up_tables::Migration),
            Box::new(m20240101_000007_create_maintenance_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_companies_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_companies_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Companies::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Companies::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Companies::Name).string().not_null())
                        .col(ColumnDef::new(Companies::CompanyType).string().not_null())
                        .col(ColumnDef::new(Companies::RelatedCompanyId).uuid())
                        .col(ColumnDef::new(Companies::RelatedManagerId).uuid())
                        .col(ColumnDef::new(Companies::TaxNumber).string())
                        .col(ColumnDef::new(Companies::Email).string())
                        .col(ColumnDef::new(Companies::Telephone).string())
                        .col(
                            ColumnDef::new(Companies::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Companies::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Companies::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_companies_related_company")
                                .from(Companies::Table, Companies::RelatedCompanyId)
                                .to(Companies::Table, Companies::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("ux_companies_name")
                        .table(Companies::Table)
                        .col(Companies::Name)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_companies_related_company_id")
                        .table(Companies::Table)
                        .col(Companies::RelatedCompanyId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_companies_related_manager_id")
                        .table(Companies::Table)
                        .col(Companies::RelatedManagerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Companies::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Companies {
        Table,
        Id,
        Name,
        CompanyType,
        RelatedCompanyId,
        RelatedManagerId,
        TaxNumber,
        Email,
        Telephone,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_working_hours_table {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_companies_table::Companies;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_working_hours_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WorkingHours::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkingHours::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkingHours::CompanyId).uuid().not_null())
                        .col(
                            ColumnDef::new(WorkingHours::DailyWorkingHours)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkingHours::WorkingOnSaturday)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(WorkingHours::WorkingOnSunday)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(WorkingHours::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkingHours::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_working_hours_company")
                                .from(WorkingHours::Table, WorkingHours::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // One profile per customer
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("ux_working_hours_company_id")
                        .table(WorkingHours::Table)
                        .col(WorkingHours::CompanyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WorkingHours::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum WorkingHours {
        Table,
        Id,
        CompanyId,
        DailyWorkingHours,
        WorkingOnSaturday,
        WorkingOnSunday,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ItemMasters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemMasters::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ItemMasters::Shortcode).string().not_null())
                        .col(ColumnDef::new(ItemMasters::Name).string().not_null())
                        .col(ColumnDef::new(ItemMasters::Description).text())
                        .col(
                            ColumnDef::new(ItemMasters::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ItemMasters::UpdatedAt).timestamp_with_time_zone())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("ux_item_masters_shortcode")
                        .table(ItemMasters::Table)
                        .col(ItemMasters::Shortcode)
                        .to_owned(),
                )
                .await?;

            for (table, fk_name, index_name) in [
                (
                    ItemRuleTable::Warranty,
                    "fk_item_warranty_rules_item_master",
                    "ux_item_warranty_rules_rule",
                ),
                (
                    ItemRuleTable::Service,
                    "fk_item_service_rules_item_master",
                    "ux_item_service_rules_rule",
                ),
            ] {
                manager
                    .create_table(
                        Table::create()
                            .table(table.iden())
                            .if_not_exists()
                            .col(
                                ColumnDef::new(ItemRules::Id)
                                    .uuid()
                                    .primary_key()
                                    .not_null(),
                            )
                            .col(ColumnDef::new(ItemRules::ItemMasterId).uuid().not_null())
                            .col(ColumnDef::new(ItemRules::RuleKind).string().not_null())
                            .col(
                                ColumnDef::new(ItemRules::Value)
                                    .decimal_len(10, 2)
                                    .not_null(),
                            )
                            .col(
                                ColumnDef::new(ItemRules::CreatedAt)
                                    .timestamp_with_time_zone()
                                    .not_null(),
                            )
                            .col(ColumnDef::new(ItemRules::UpdatedAt).timestamp_with_time_zone())
                            .foreign_key(
                                ForeignKey::create()
                                    .name(fk_name)
                                    .from(table.iden(), ItemRules::ItemMasterId)
                                    .to(ItemMasters::Table, ItemMasters::Id)
                                    .on_delete(ForeignKeyAction::Cascade),
                            )
                            .to_owned(),
                    )
                    .await?;

                manager
                    .create_index(
                        Index::create()
                            .if_not_exists()
                            .unique()
                            .name(index_name)
                            .table(table.iden())
                            .col(ItemRules::ItemMasterId)
                            .col(ItemRules::RuleKind)
                            .col(ItemRules::Value)
                            .to_owned(),
                    )
                    .await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(ItemRuleTable::Service.iden())
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(
                    Table::drop()
                        .table(ItemRuleTable::Warranty.iden())
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(ItemMasters::Table).to_owned())
                .await
        }
    }

    #[derive(Copy, Clone)]
    pub(super) enum ItemRuleTable {
        Warranty,
        Service,
    }

    impl ItemRuleTable {
        pub(super) fn iden(self) -> Alias {
            match self {
                ItemRuleTable::Warranty => Alias::new("item_warranty_rules"),
                ItemRuleTable::Service => Alias::new("item_service_rules"),
            }
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ItemMasters {
        Table,
        Id,
        Shortcode,
        Name,
        Description,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ItemRules {
        Id,
        ItemMasterId,
        RuleKind,
        Value,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_inventory_items_table {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000003_create_catalog_tables::ItemMasters;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_inventory_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::ItemMasterId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::SerialNo).string().not_null())
                        .col(
                            ColumnDef::new(InventoryItems::ProductionDate)
                                .timestamp_with_time_zone(),
                        )
                        .col(ColumnDef::new(InventoryItems::CreatedBy).uuid())
                        .col(
                            ColumnDef::new(InventoryItems::InUse)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_items_item_master")
                                .from(InventoryItems::Table, InventoryItems::ItemMasterId)
                                .to(ItemMasters::Table, ItemMasters::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_items_item_master_id")
                        .table(InventoryItems::Table)
                        .col(InventoryItems::ItemMasterId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_items_in_use")
                        .table(InventoryItems::Table)
                        .col(InventoryItems::InUse)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryItems {
        Table,
        Id,
        ItemMasterId,
        SerialNo,
        ProductionDate,
        CreatedBy,
        InUse,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_installations_table {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_companies_table::Companies;
    use super::m20240101_000004_create_inventory_items_table::InventoryItems;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_installations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Installations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Installations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Installations::InstallerId).uuid().not_null())
                        .col(
                            ColumnDef::new(Installations::InventoryItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Installations::CustomerId).uuid().not_null())
                        .col(
                            ColumnDef::new(Installations::SetupDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Installations::LocationLatitude).decimal_len(10, 8),
                        )
                        .col(
                            ColumnDef::new(Installations::LocationLongitude).decimal_len(11, 8),
                        )
                        .col(ColumnDef::new(Installations::LocationAddress).text())
                        .col(ColumnDef::new(Installations::InstallationNotes).text())
                        .col(
                            ColumnDef::new(Installations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Installations::UpdatedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_installations_customer")
                                .from(Installations::Table, Installations::CustomerId)
                                .to(Companies::Table, Companies::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_installations_inventory_item")
                                .from(Installations::Table, Installations::InventoryItemId)
                                .to(InventoryItems::Table, InventoryItems::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_installations_customer_id")
                        .table(Installations::Table)
                        .col(Installations::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_installations_inventory_item_id")
                        .table(Installations::Table)
                        .col(Installations::InventoryItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_installations_setup_date")
                        .table(Installations::Table)
                        .col(Installations::SetupDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Installations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Installations {
        Table,
        Id,
        InstallerId,
        InventoryItemId,
        CustomerId,
        SetupDate,
        LocationLatitude,
        LocationLongitude,
        LocationAddress,
        InstallationNotes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000006_create_follow_up_tables {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000005_create_installations_table::Installations;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_follow_up_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WarrantyFollowUps::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WarrantyFollowUps::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyFollowUps::InstallationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyFollowUps::WarrantyType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyFollowUps::WarrantyValue)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyFollowUps::EndOfWarrantyDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyFollowUps::CalculationNotes)
                                .text()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyFollowUps::UsedFallback)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(WarrantyFollowUps::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarrantyFollowUps::UpdatedAt)
                                .timestamp_with_time_zone(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_warranty_follow_ups_installation")
                                .from(WarrantyFollowUps::Table, WarrantyFollowUps::InstallationId)
                                .to(Installations::Table, Installations::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Fan-out idempotence key
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("ux_warranty_follow_ups_rule")
                        .table(WarrantyFollowUps::Table)
                        .col(WarrantyFollowUps::InstallationId)
                        .col(WarrantyFollowUps::WarrantyType)
                        .col(WarrantyFollowUps::WarrantyValue)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ServiceFollowUps::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServiceFollowUps::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceFollowUps::InstallationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceFollowUps::ServiceType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceFollowUps::ServiceValue)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceFollowUps::NextServiceDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceFollowUps::IsCompleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ServiceFollowUps::CompletedDate)
                                .timestamp_with_time_zone(),
                        )
                        .col(
                            ColumnDef::new(ServiceFollowUps::CalculationNotes)
                                .text()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceFollowUps::UsedFallback)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ServiceFollowUps::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceFollowUps::UpdatedAt)
                                .timestamp_with_time_zone(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_service_follow_ups_installation")
                                .from(ServiceFollowUps::Table, ServiceFollowUps::InstallationId)
                                .to(Installations::Table, Installations::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_follow_ups_installation_id")
                        .table(ServiceFollowUps::Table)
                        .col(ServiceFollowUps::InstallationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_follow_ups_next_service_date")
                        .table(ServiceFollowUps::Table)
                        .col(ServiceFollowUps::NextServiceDate)
                        .to_owned(),
                )
                .await?;

            // Fan-out idempotence key, open rows only: the chain reuses
            // (installation, type, value) across completed generations.
            // sea-query has no portable partial-index builder, hence raw SQL.
            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS ux_service_follow_ups_open_rule \
                     ON service_follow_ups (installation_id, service_type, service_value) \
                     WHERE NOT is_completed",
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ServiceFollowUps::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WarrantyFollowUps::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum WarrantyFollowUps {
        Table,
        Id,
        InstallationId,
        WarrantyType,
        WarrantyValue,
        EndOfWarrantyDate,
        CalculationNotes,
        UsedFallback,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ServiceFollowUps {
        Table,
        Id,
        InstallationId,
        ServiceType,
        ServiceValue,
        NextServiceDate,
        IsCompleted,
        CompletedDate,
        CalculationNotes,
        UsedFallback,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000007_create_maintenance_tables {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000003_create_catalog_tables::ItemMasters;
    use super::m20240101_000006_create_follow_up_tables::ServiceFollowUps;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_maintenance_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MaintenanceRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MaintenanceRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaintenanceRecords::ServiceFollowUpId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaintenanceRecords::MaintenanceType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaintenanceRecords::TechnicianId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MaintenanceRecords::BreakdownReason).text())
                        .col(ColumnDef::new(MaintenanceRecords::Notes).text())
                        .col(
                            ColumnDef::new(MaintenanceRecords::ServiceDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaintenanceRecords::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaintenanceRecords::UpdatedAt)
                                .timestamp_with_time_zone(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_maintenance_records_service_follow_up")
                                .from(
                                    MaintenanceRecords::Table,
                                    MaintenanceRecords::ServiceFollowUpId,
                                )
                                .to(ServiceFollowUps::Table, ServiceFollowUps::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // One record per completed follow-up
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("ux_maintenance_records_service_follow_up_id")
                        .table(MaintenanceRecords::Table)
                        .col(MaintenanceRecords::ServiceFollowUpId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SparePartUsages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SparePartUsages::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SparePartUsages::MaintenanceRecordId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SparePartUsages::ItemMasterId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SparePartUsages::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(SparePartUsages::Notes).text())
                        .col(
                            ColumnDef::new(SparePartUsages::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SparePartUsages::UpdatedAt).timestamp_with_time_zone(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_spare_part_usages_maintenance_record")
                                .from(
                                    SparePartUsages::Table,
                                    SparePartUsages::MaintenanceRecordId,
                                )
                                .to(MaintenanceRecords::Table, MaintenanceRecords::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_spare_part_usages_item_master")
                                .from(SparePartUsages::Table, SparePartUsages::ItemMasterId)
                                .to(ItemMasters::Table, ItemMasters::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ServiceFormEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServiceFormEntries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceFormEntries::MaintenanceRecordId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceFormEntries::FormName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceFormEntries::Completed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ServiceFormEntries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceFormEntries::UpdatedAt)
                                .timestamp_with_time_zone(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_service_form_entries_maintenance_record")
                                .from(
                                    ServiceFormEntries::Table,
                                    ServiceFormEntries::MaintenanceRecordId,
                                )
                                .to(MaintenanceRecords::Table, MaintenanceRecords::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ServiceFormEntries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SparePartUsages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MaintenanceRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum MaintenanceRecords {
        Table,
        Id,
        ServiceFollowUpId,
        MaintenanceType,
        TechnicianId,
        BreakdownReason,
        Notes,
        ServiceDate,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum SparePartUsages {
        Table,
        Id,
        MaintenanceRecordId,
        ItemMasterId,
        Quantity,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ServiceFormEntries {
        Table,
        Id,
        MaintenanceRecordId,
        FormName,
        Completed,
        CreatedAt,
        UpdatedAt,
    }
}
