//! Product aggregate: scalar fields plus a replace-on-write category set.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::crud::{Aggregate, CrudService};
use crate::domain::{Category, Product};
use crate::dto::{CategoryDto, ProductDto};
use crate::errors::ServiceError;
use crate::repository::EntityStore;

pub enum ProductAggregate {}

impl Aggregate for ProductAggregate {
    const NAME: &'static str = "product";

    type Entity = Product;
    type Assoc = Category;
    type Dto = ProductDto;
    type InsertDto = ProductDto;

    fn blank() -> Product {
        Product::default()
    }

    fn summary(entity: &Product) -> ProductDto {
        ProductDto {
            id: entity.id,
            name: entity.name.clone(),
            description: entity.description.clone(),
            price: entity.price,
            img_url: entity.img_url.clone(),
            date: entity.date,
            categories: Vec::new(),
        }
    }

    fn detail(entity: &Product) -> ProductDto {
        let mut dto = Self::summary(entity);
        dto.categories = entity
            .categories
            .iter()
            .map(|c| CategoryDto { id: c.id, name: c.name.clone() })
            .collect();
        dto
    }

    fn apply(dto: &ProductDto, entity: &mut Product, refs: &dyn EntityStore<Category>) {
        entity.name = dto.name.clone();
        entity.description = dto.description.clone();
        entity.price = dto.price;
        entity.img_url = dto.img_url.clone();
        entity.date = dto.date;
        // full replacement: a fresh deduplicated set built from the incoming ids
        let ids: BTreeSet<i64> = dto.categories.iter().filter_map(|c| c.id).collect();
        entity.categories = ids.into_iter().map(|id| refs.get_ref(id).into()).collect();
    }

    fn apply_insert(
        dto: &ProductDto,
        entity: &mut Product,
        refs: &dyn EntityStore<Category>,
    ) -> Result<(), ServiceError> {
        Self::apply(dto, entity, refs);
        Ok(())
    }
}

pub type ProductService = CrudService<ProductAggregate>;

pub fn service(
    products: Arc<dyn EntityStore<Product>>,
    categories: Arc<dyn EntityStore<Category>>,
) -> ProductService {
    CrudService::new(products, categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{self, CategoryService};
    use crate::repo::memory::MemoryCatalog;
    use crate::repository::{PageRequest, Sort};
    use crate::test_support::factory;

    fn services(catalog: &MemoryCatalog) -> (ProductService, CategoryService) {
        (
            service(catalog.products.clone(), catalog.categories.clone()),
            category::service(catalog.categories.clone()),
        )
    }

    async fn seed_category(categories: &CategoryService, name: &str) -> i64 {
        let dto = CategoryDto { id: None, name: name.to_string() };
        categories.insert(&dto).await.unwrap().id.unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_fresh_id_and_preserves_scalars() {
        let catalog = MemoryCatalog::new();
        let (products, _) = services(&catalog);

        let dto = factory::product_dto("Phone");
        let first = products.insert(&dto).await.unwrap();
        let second = products.insert(&factory::product_dto("Smart TV")).await.unwrap();

        let id = first.id.expect("id assigned on insert");
        assert_ne!(Some(id), second.id);
        assert_eq!(first.name, dto.name);
        assert_eq!(first.description, dto.description);
        assert_eq!(first.price, dto.price);
        assert_eq!(first.img_url, dto.img_url);
        assert_eq!(first.date, dto.date);
        // insert answers with the scalar-only view
        assert!(first.categories.is_empty());
    }

    #[tokio::test]
    async fn find_by_id_round_trips_the_inserted_product() {
        let catalog = MemoryCatalog::new();
        let (products, categories) = services(&catalog);
        let cat_id = seed_category(&categories, "Electronics").await;

        let mut dto = factory::product_dto("Phone");
        dto.categories = vec![CategoryDto { id: Some(cat_id), name: String::new() }];
        let created = products.insert(&dto).await.unwrap();
        let found = products.find_by_id(created.id.unwrap()).await.unwrap();

        assert_eq!(found.id, created.id);
        assert_eq!(found.name, created.name);
        assert_eq!(found.price, created.price);
        assert_eq!(found.date, created.date);
        // the detail view resolves association display names
        assert_eq!(found.categories.len(), 1);
        assert_eq!(found.categories[0].id, Some(cat_id));
        assert_eq!(found.categories[0].name, "Electronics");
    }

    #[tokio::test]
    async fn find_by_id_misses_with_not_found() {
        let catalog = MemoryCatalog::new();
        let (products, _) = services(&catalog);
        let err = products.find_by_id(1000).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(1000)));
    }

    #[tokio::test]
    async fn update_replaces_the_association_set_totally() {
        let catalog = MemoryCatalog::new();
        let (products, categories) = services(&catalog);
        let a = seed_category(&categories, "Audio").await;
        let b = seed_category(&categories, "Bluetooth").await;
        let c = seed_category(&categories, "Computers").await;

        let mut dto = factory::product_dto("Phone");
        dto.categories = vec![
            CategoryDto { id: Some(a), name: String::new() },
            CategoryDto { id: Some(b), name: String::new() },
        ];
        let created = products.insert(&dto).await.unwrap();
        let id = created.id.unwrap();

        dto.name = "Phone v2".into();
        dto.categories = vec![CategoryDto { id: Some(c), name: String::new() }];
        let updated = products.update(id, &dto).await.unwrap();
        assert_eq!(updated.name, "Phone v2");

        let found = products.find_by_id(id).await.unwrap();
        let linked: Vec<Option<i64>> = found.categories.iter().map(|x| x.id).collect();
        // {A, B} is gone, not merged
        assert_eq!(linked, vec![Some(c)]);
    }

    #[tokio::test]
    async fn update_deduplicates_incoming_member_ids() {
        let catalog = MemoryCatalog::new();
        let (products, categories) = services(&catalog);
        let a = seed_category(&categories, "Audio").await;

        let mut dto = factory::product_dto("Phone");
        let created = products.insert(&dto).await.unwrap();
        dto.categories = vec![
            CategoryDto { id: Some(a), name: String::new() },
            CategoryDto { id: Some(a), name: String::new() },
        ];
        let id = created.id.unwrap();
        products.update(id, &dto).await.unwrap();
        let found = products.find_by_id(id).await.unwrap();
        assert_eq!(found.categories.len(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_id_is_not_found() {
        let catalog = MemoryCatalog::new();
        let (products, _) = services(&catalog);
        let err = products.update(1000, &factory::product_dto("Phone")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(1000)));
    }

    #[tokio::test]
    async fn update_with_unknown_category_id_is_a_conflict() {
        let catalog = MemoryCatalog::new();
        let (products, _) = services(&catalog);
        let mut dto = factory::product_dto("Phone");
        let created = products.insert(&dto).await.unwrap();

        dto.categories = vec![CategoryDto { id: Some(999), name: String::new() }];
        let err = products.update(created.id.unwrap(), &dto).await.unwrap_err();
        // surfaces only at commit, as an integrity conflict
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_then_find_is_not_found() {
        let catalog = MemoryCatalog::new();
        let (products, _) = services(&catalog);
        let created = products.insert(&factory::product_dto("Phone")).await.unwrap();
        let id = created.id.unwrap();

        products.delete(id).await.unwrap();
        assert!(matches!(products.find_by_id(id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_of_missing_id_is_not_found() {
        let catalog = MemoryCatalog::new();
        let (products, _) = services(&catalog);
        let err = products.delete(1000).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(1000)));
    }

    async fn seed_twenty_five(products: &ProductService) {
        products.insert(&factory::product_dto("Macbook Pro")).await.unwrap();
        products.insert(&factory::product_dto("PC Gamer")).await.unwrap();
        products.insert(&factory::product_dto("PC Gamer Alfa")).await.unwrap();
        for i in 1..=22 {
            let name = format!("PC Gamer Alfa {i:02}");
            products.insert(&factory::product_dto(&name)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn page_metadata_passes_through_unchanged() {
        let catalog = MemoryCatalog::new();
        let (products, _) = services(&catalog);
        seed_twenty_five(&products).await;

        let page = products.find_all_paged(&PageRequest::of(0, 10)).await.unwrap();
        assert_eq!(page.page, 0);
        assert_eq!(page.size, 10);
        assert_eq!(page.content.len(), 10);
        assert_eq!(page.total_elements, 25);

        let beyond = products.find_all_paged(&PageRequest::of(50, 10)).await.unwrap();
        assert!(beyond.is_empty());
        assert_eq!(beyond.total_elements, 25);
    }

    #[tokio::test]
    async fn pages_sorted_by_name_start_with_the_expected_rows() {
        let catalog = MemoryCatalog::new();
        let (products, _) = services(&catalog);
        seed_twenty_five(&products).await;

        let req = PageRequest::of(0, 12).sorted_by(Sort::asc("name"));
        let page = products.find_all_paged(&req).await.unwrap();
        assert_eq!(page.total_elements, 25);
        assert_eq!(page.content.len(), 12);
        assert_eq!(page.content[0].name, "Macbook Pro");
        assert_eq!(page.content[1].name, "PC Gamer");
        assert_eq!(page.content[2].name, "PC Gamer Alfa");
        // page rows are the scalar-only view
        assert!(page.content.iter().all(|p| p.categories.is_empty()));
    }
}
