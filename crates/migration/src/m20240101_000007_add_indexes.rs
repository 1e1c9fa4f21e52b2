//! Secondary indexes for the common sort/lookup paths.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_product_name")
                    .table(Product::Table)
                    .col(Product::Name)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_category_name")
                    .table(Category::Table)
                    .col(Category::Name)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_product_name").table(Product::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_category_name").table(Category::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Product { Table, Name }

#[derive(DeriveIden)]
enum Category { Table, Name }
