//! Category aggregate: a leaf with no association collection of its own.
//! Its delete path is where referential conflicts actually show up, when
//! products still link to the category being removed.

use std::sync::Arc;

use crate::crud::{Aggregate, CrudService};
use crate::domain::Category;
use crate::dto::CategoryDto;
use crate::errors::ServiceError;
use crate::repository::EntityStore;

pub enum CategoryAggregate {}

impl Aggregate for CategoryAggregate {
    const NAME: &'static str = "category";

    type Entity = Category;
    type Assoc = Category;
    type Dto = CategoryDto;
    type InsertDto = CategoryDto;

    fn blank() -> Category {
        Category::default()
    }

    fn summary(entity: &Category) -> CategoryDto {
        CategoryDto { id: entity.id, name: entity.name.clone() }
    }

    fn detail(entity: &Category) -> CategoryDto {
        // a leaf has no association payload; detail equals summary
        Self::summary(entity)
    }

    fn apply(dto: &CategoryDto, entity: &mut Category, _refs: &dyn EntityStore<Category>) {
        entity.name = dto.name.clone();
    }

    fn apply_insert(
        dto: &CategoryDto,
        entity: &mut Category,
        refs: &dyn EntityStore<Category>,
    ) -> Result<(), ServiceError> {
        Self::apply(dto, entity, refs);
        Ok(())
    }
}

pub type CategoryService = CrudService<CategoryAggregate>;

pub fn service(categories: Arc<dyn EntityStore<Category>>) -> CategoryService {
    CrudService::new(categories.clone(), categories)
}
