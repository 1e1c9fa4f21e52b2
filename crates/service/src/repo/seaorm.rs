//! SeaORM-backed stores over the tables of the `models` crate.
//!
//! Every mutating port call runs in its own transaction: `save` upserts the
//! row and replaces its junction links as one unit, `delete_by_id` is a
//! single statement whose constraint failures surface as `Integrity`.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait, NotSet,
    Order, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

use crate::domain::{Category, Product, Role, User};
use crate::repository::{EntityStore, Page, PageRequest, Record, StoreError};

fn map_db_err(e: DbErr) -> StoreError {
    match e.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(msg))
        | Some(SqlErr::UniqueConstraintViolation(msg)) => StoreError::Integrity(msg),
        _ => StoreError::Backend(e.to_string()),
    }
}

fn map_update_err(id: i64, e: DbErr) -> StoreError {
    match e {
        DbErr::RecordNotUpdated => StoreError::NoSuchRow(id),
        other => map_db_err(other),
    }
}

fn category_from_row(row: models::category::Model) -> Category {
    Category { id: Some(row.id), name: row.name }
}

fn role_from_row(row: models::role::Model) -> Role {
    Role { id: Some(row.id), authority: row.authority }
}

fn product_from_row(row: models::product::Model, categories: Vec<models::category::Model>) -> Product {
    Product {
        id: Some(row.id),
        name: row.name,
        description: row.description,
        price: row.price,
        img_url: row.img_url,
        date: row.date.with_timezone(&Utc),
        categories: categories.into_iter().map(category_from_row).collect(),
    }
}

fn user_from_row(row: models::user::Model, roles: Vec<models::role::Model>) -> User {
    User {
        id: Some(row.id),
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        password: row.password,
        roles: roles.into_iter().map(role_from_row).collect(),
    }
}

pub struct SeaOrmProductStore {
    db: DatabaseConnection,
}

impl SeaOrmProductStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EntityStore<Product> for SeaOrmProductStore {
    async fn find_page(&self, req: &PageRequest) -> Result<Page<Product>, StoreError> {
        use models::product::Column;
        let mut query = models::product::Entity::find();
        if let Some(sort) = &req.sort {
            let order = if sort.ascending { Order::Asc } else { Order::Desc };
            query = match sort.field.as_str() {
                "name" => query.order_by(Column::Name, order),
                "price" => query.order_by(Column::Price, order),
                "date" => query.order_by(Column::Date, order),
                _ => query.order_by(Column::Id, order),
            };
        } else {
            query = query.order_by(Column::Id, Order::Asc);
        }
        let size = req.normalized_size();
        let paginator = query.paginate(&self.db, size);
        let total = paginator.num_items().await.map_err(map_db_err)?;
        let rows = paginator.fetch_page(req.page).await.map_err(map_db_err)?;
        Ok(Page {
            content: rows.into_iter().map(|r| product_from_row(r, Vec::new())).collect(),
            page: req.page,
            size,
            total_elements: total,
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let Some(row) = models::product::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };
        let categories = row
            .find_related(models::category::Entity)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(Some(product_from_row(row, categories)))
    }

    async fn save(&self, entity: Product) -> Result<Product, StoreError> {
        let links = entity.link_ids();
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let row = match entity.id {
            None => models::product::ActiveModel {
                id: NotSet,
                name: Set(entity.name.clone()),
                description: Set(entity.description.clone()),
                price: Set(entity.price),
                img_url: Set(entity.img_url.clone()),
                date: Set(entity.date.into()),
            }
            .insert(&txn)
            .await
            .map_err(map_db_err)?,
            Some(id) => models::product::ActiveModel {
                id: Set(id),
                name: Set(entity.name.clone()),
                description: Set(entity.description.clone()),
                price: Set(entity.price),
                img_url: Set(entity.img_url.clone()),
                date: Set(entity.date.into()),
            }
            .update(&txn)
            .await
            .map_err(|e| map_update_err(id, e))?,
        };
        // full link replacement: clear, then write the incoming set
        models::product_category::Entity::delete_many()
            .filter(models::product_category::Column::ProductId.eq(row.id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        if !links.is_empty() {
            let link_rows = links.iter().map(|category_id| models::product_category::ActiveModel {
                product_id: Set(row.id),
                category_id: Set(*category_id),
            });
            models::product_category::Entity::insert_many(link_rows)
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
        }
        txn.commit().await.map_err(map_db_err)?;
        let mut saved = entity;
        saved.id = Some(row.id);
        Ok(saved)
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        // junction rows cascade away at the schema level
        let res = models::product::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        if res.rows_affected == 0 {
            return Err(StoreError::NoSuchRow(id));
        }
        Ok(())
    }
}

pub struct SeaOrmCategoryStore {
    db: DatabaseConnection,
}

impl SeaOrmCategoryStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EntityStore<Category> for SeaOrmCategoryStore {
    async fn find_page(&self, req: &PageRequest) -> Result<Page<Category>, StoreError> {
        use models::category::Column;
        let mut query = models::category::Entity::find();
        if let Some(sort) = &req.sort {
            let order = if sort.ascending { Order::Asc } else { Order::Desc };
            query = match sort.field.as_str() {
                "name" => query.order_by(Column::Name, order),
                _ => query.order_by(Column::Id, order),
            };
        } else {
            query = query.order_by(Column::Id, Order::Asc);
        }
        let size = req.normalized_size();
        let paginator = query.paginate(&self.db, size);
        let total = paginator.num_items().await.map_err(map_db_err)?;
        let rows = paginator.fetch_page(req.page).await.map_err(map_db_err)?;
        Ok(Page {
            content: rows.into_iter().map(category_from_row).collect(),
            page: req.page,
            size,
            total_elements: total,
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, StoreError> {
        let row = models::category::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(row.map(category_from_row))
    }

    async fn save(&self, entity: Category) -> Result<Category, StoreError> {
        let row = match entity.id {
            None => models::category::ActiveModel {
                id: NotSet,
                name: Set(entity.name.clone()),
            }
            .insert(&self.db)
            .await
            .map_err(map_db_err)?,
            Some(id) => models::category::ActiveModel {
                id: Set(id),
                name: Set(entity.name.clone()),
            }
            .update(&self.db)
            .await
            .map_err(|e| map_update_err(id, e))?,
        };
        Ok(category_from_row(row))
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        // a category still linked from product_category fails here (RESTRICT)
        let res = models::category::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        if res.rows_affected == 0 {
            return Err(StoreError::NoSuchRow(id));
        }
        Ok(())
    }
}

pub struct SeaOrmUserStore {
    db: DatabaseConnection,
}

impl SeaOrmUserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EntityStore<User> for SeaOrmUserStore {
    async fn find_page(&self, req: &PageRequest) -> Result<Page<User>, StoreError> {
        use models::user::Column;
        let mut query = models::user::Entity::find();
        if let Some(sort) = &req.sort {
            let order = if sort.ascending { Order::Asc } else { Order::Desc };
            query = match sort.field.as_str() {
                "first_name" => query.order_by(Column::FirstName, order),
                "last_name" => query.order_by(Column::LastName, order),
                "email" => query.order_by(Column::Email, order),
                _ => query.order_by(Column::Id, order),
            };
        } else {
            query = query.order_by(Column::Id, Order::Asc);
        }
        let size = req.normalized_size();
        let paginator = query.paginate(&self.db, size);
        let total = paginator.num_items().await.map_err(map_db_err)?;
        let rows = paginator.fetch_page(req.page).await.map_err(map_db_err)?;
        Ok(Page {
            content: rows.into_iter().map(|r| user_from_row(r, Vec::new())).collect(),
            page: req.page,
            size,
            total_elements: total,
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let Some(row) = models::user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };
        let roles = row
            .find_related(models::role::Entity)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(Some(user_from_row(row, roles)))
    }

    async fn save(&self, entity: User) -> Result<User, StoreError> {
        let links = entity.link_ids();
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let row = match entity.id {
            None => models::user::ActiveModel {
                id: NotSet,
                first_name: Set(entity.first_name.clone()),
                last_name: Set(entity.last_name.clone()),
                email: Set(entity.email.clone()),
                password: Set(entity.password.clone()),
            }
            .insert(&txn)
            .await
            .map_err(map_db_err)?,
            Some(id) => models::user::ActiveModel {
                id: Set(id),
                first_name: Set(entity.first_name.clone()),
                last_name: Set(entity.last_name.clone()),
                email: Set(entity.email.clone()),
                password: Set(entity.password.clone()),
            }
            .update(&txn)
            .await
            .map_err(|e| map_update_err(id, e))?,
        };
        models::user_role::Entity::delete_many()
            .filter(models::user_role::Column::UserId.eq(row.id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        if !links.is_empty() {
            let link_rows = links.iter().map(|role_id| models::user_role::ActiveModel {
                user_id: Set(row.id),
                role_id: Set(*role_id),
            });
            models::user_role::Entity::insert_many(link_rows)
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
        }
        txn.commit().await.map_err(map_db_err)?;
        let mut saved = entity;
        saved.id = Some(row.id);
        Ok(saved)
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        let res = models::user::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        if res.rows_affected == 0 {
            return Err(StoreError::NoSuchRow(id));
        }
        Ok(())
    }
}

pub struct SeaOrmRoleStore {
    db: DatabaseConnection,
}

impl SeaOrmRoleStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EntityStore<Role> for SeaOrmRoleStore {
    async fn find_page(&self, req: &PageRequest) -> Result<Page<Role>, StoreError> {
        use models::role::Column;
        let mut query = models::role::Entity::find();
        if let Some(sort) = &req.sort {
            let order = if sort.ascending { Order::Asc } else { Order::Desc };
            query = match sort.field.as_str() {
                "authority" => query.order_by(Column::Authority, order),
                _ => query.order_by(Column::Id, order),
            };
        } else {
            query = query.order_by(Column::Id, Order::Asc);
        }
        let size = req.normalized_size();
        let paginator = query.paginate(&self.db, size);
        let total = paginator.num_items().await.map_err(map_db_err)?;
        let rows = paginator.fetch_page(req.page).await.map_err(map_db_err)?;
        Ok(Page {
            content: rows.into_iter().map(role_from_row).collect(),
            page: req.page,
            size,
            total_elements: total,
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Role>, StoreError> {
        let row = models::role::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(row.map(role_from_row))
    }

    async fn save(&self, entity: Role) -> Result<Role, StoreError> {
        let row = match entity.id {
            None => models::role::ActiveModel {
                id: NotSet,
                authority: Set(entity.authority.clone()),
            }
            .insert(&self.db)
            .await
            .map_err(map_db_err)?,
            Some(id) => models::role::ActiveModel {
                id: Set(id),
                authority: Set(entity.authority.clone()),
            }
            .update(&self.db)
            .await
            .map_err(|e| map_update_err(id, e))?,
        };
        Ok(role_from_row(row))
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        let res = models::role::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        if res.rows_affected == 0 {
            return Err(StoreError::NoSuchRow(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! End-to-end CRUD against a live database; skips without one.
    use std::sync::Arc;

    use anyhow::Result;

    use super::*;
    use crate::dto::{CategoryDto, ProductDto};
    use crate::errors::ServiceError;
    use crate::repository::Sort;
    use crate::test_support;

    #[tokio::test]
    async fn product_crud_round_trip_on_database() -> Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() {
            return Ok(());
        }
        let db = match test_support::try_get_db().await {
            Some(db) => db,
            None => {
                eprintln!("skip: cannot connect to db");
                return Ok(());
            }
        };

        let products: Arc<dyn EntityStore<Product>> = Arc::new(SeaOrmProductStore::new(db.clone()));
        let categories: Arc<dyn EntityStore<Category>> = Arc::new(SeaOrmCategoryStore::new(db.clone()));
        let product_service = crate::product::service(products, categories.clone());
        let category_service = crate::category::service(categories);

        let cat = category_service
            .insert(&CategoryDto { id: None, name: "Electronics".into() })
            .await?;
        let cat_id = cat.id.expect("category id assigned");

        let mut dto = test_support::factory::product_dto("Phone");
        dto.categories = vec![CategoryDto { id: Some(cat_id), name: String::new() }];
        let created = product_service.insert(&dto).await?;
        let product_id = created.id.expect("product id assigned");
        assert_eq!(created.name, "Phone");
        assert!(created.categories.is_empty());

        let detail = product_service.find_by_id(product_id).await?;
        assert_eq!(detail.categories.len(), 1);
        assert_eq!(detail.categories[0].name, "Electronics");

        // the linked category cannot be deleted while the product exists
        let blocked = category_service.delete(cat_id).await;
        assert!(matches!(blocked, Err(ServiceError::Conflict(_))));

        let page = product_service
            .find_all_paged(&crate::repository::PageRequest::of(0, 10).sorted_by(Sort::asc("name")))
            .await?;
        assert!(page.total_elements >= 1);

        product_service.delete(product_id).await?;
        assert!(matches!(
            product_service.find_by_id(product_id).await,
            Err(ServiceError::NotFound(_))
        ));
        category_service.delete(cat_id).await?;
        Ok(())
    }
}
