use sea_orm_migration::prelude::*;
use som_db_entity::db::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000004_create_marketplace_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(item::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(item::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(item::Column::Name).string().not_null())
                    .col(ColumnDef::new(item::Column::Price).decimal_len(16, 5).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(cart_item::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(cart_item::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(cart_item::Column::UserId).integer().not_null())
                    .col(ColumnDef::new(cart_item::Column::ItemId).integer().not_null())
                    .col(ColumnDef::new(cart_item::Column::Quantity).integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(order::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(order::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(order::Column::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(order::Column::TotalAmount)
                            .decimal_len(16, 5)
                            .not_null(),
                    )
                    .col(ColumnDef::new(order::Column::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(order_item::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(order_item::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(order_item::Column::OrderId).integer().not_null())
                    .col(ColumnDef::new(order_item::Column::ItemId).integer().not_null())
                    .col(ColumnDef::new(order_item::Column::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(order_item::Column::UnitPrice)
                            .decimal_len(16, 5)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(user_item::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(user_item::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(user_item::Column::UserId).integer().not_null())
                    .col(ColumnDef::new(user_item::Column::ItemId).integer().not_null())
                    .col(ColumnDef::new(user_item::Column::OrderId).integer().not_null())
                    .col(ColumnDef::new(user_item::Column::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(user_item::Column::AcquiredAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(user_item::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(order_item::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(order::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(cart_item::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(item::Entity).to_owned())
            .await
    }
}
