use serde::{Deserialize, Serialize};
use shop_types::domain::pagination::{PageRequest, Pagination};
use shop_types::domain::product::{NewProduct, Product, StockUpdate};
use shop_types::domain::user::Principal;
use shop_types::ports::product_repository::ProductRepository;
use std::sync::Arc;

use super::{parse_reference, require_admin};
use crate::cache::{self, ResponseCache};
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

pub struct InventoryService<P: ProductRepository> {
    products: Arc<P>,
    cache: Arc<ResponseCache>,
}

impl<P: ProductRepository> InventoryService<P> {
    pub fn new(products: Arc<P>, cache: Arc<ResponseCache>) -> Self {
        Self { products, cache }
    }

    pub async fn list_products(&self, req: PageRequest) -> Result<ProductPage, AppError> {
        let key = cache::products_key(req.page, req.limit);
        if let Some(hit) = self.cache.get_as::<ProductPage>(&key) {
            return Ok(hit);
        }

        let products = self.products.list_products(req.offset(), req.limit).await?;
        let total = self.products.count_products().await?;
        let page = ProductPage {
            products,
            pagination: Pagination::new(req, total),
        };
        self.cache.put(key, &page, cache::PRODUCT_TTL);
        Ok(page)
    }

    pub async fn get_product(&self, raw_id: &str) -> Result<Product, AppError> {
        let key = cache::product_key(raw_id.trim());
        if let Some(hit) = self.cache.get_as::<Product>(&key) {
            return Ok(hit);
        }

        let id = parse_reference(raw_id, "product")?;
        let product = self
            .products
            .get_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
        self.cache.put(key, &product, cache::PRODUCT_TTL);
        Ok(product)
    }

    pub async fn create_product(&self, actor: &Principal, input: NewProduct) -> Result<Product, AppError> {
        require_admin(actor)?;
        let product = Product::new(input)?;
        let created = self.products.create_product(product).await?;
        tracing::info!(product_id = %created.id, stock = created.stock, "product created");
        self.cache.invalidate_after_mutation();
        Ok(created)
    }

    pub async fn update_stock(
        &self,
        actor: &Principal,
        raw_id: &str,
        update: StockUpdate,
    ) -> Result<Product, AppError> {
        require_admin(actor)?;
        let id = parse_reference(raw_id, "product")?;
        let stock = update.validate()?;
        let product = self
            .products
            .set_stock(id, stock)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
        tracing::info!(product_id = %id, stock, "stock updated");
        self.cache.invalidate_after_mutation();
        Ok(product)
    }
}
