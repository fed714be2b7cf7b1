use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use shop_types::domain::pagination::PageRequest;
use shop_types::domain::product::{NewProduct, StockUpdate};
use shop_types::ports::Store;

use super::auth::{json_body, Authenticated};
use super::server::AppState;
use crate::application::inventory_service::ProductPage;
use crate::errors::AppError;

/// Raw `page`/`limit`/`status` query values; parsed leniently downstream.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
}

impl ListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref(), self.limit.as_deref())
    }
}

pub(crate) async fn list_products<S: Store>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductPage>, AppError> {
    let page = state.inventory.list_products(params.page_request()).await?;
    Ok(Json(page))
}

pub(crate) async fn get_product<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let product = state.inventory.get_product(&id).await?;
    Ok(Json(json!({ "product": product })))
}

pub(crate) async fn create_product<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(actor): Authenticated,
    body: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let product = state.inventory.create_product(&actor, json_body(body)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Product created successfully",
            "product": product,
        })),
    ))
}

pub(crate) async fn update_stock<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(actor): Authenticated,
    Path(id): Path<String>,
    body: Result<Json<StockUpdate>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let product = state
        .inventory
        .update_stock(&actor, &id, json_body(body)?)
        .await?;
    Ok(Json(json!({
        "message": "Stock updated successfully",
        "product": product,
    })))
}
