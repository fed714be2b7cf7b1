use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use shop_types::domain::order::NewOrder;
use shop_types::ports::Store;

use super::auth::{json_body, Authenticated};
use super::inventory::ListParams;
use super::server::AppState;
use crate::application::order_service::{OrderPage, OrderQuery};
use crate::errors::AppError;

fn order_query(params: &ListParams) -> Result<OrderQuery, AppError> {
    Ok(OrderQuery::parse(
        params.page.as_deref(),
        params.limit.as_deref(),
        params.status.as_deref(),
    )?)
}

pub(crate) async fn create_order<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(actor): Authenticated,
    body: Result<Json<NewOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let order = state.orders.create_order(&actor, json_body(body)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Order created successfully",
            "order": order,
        })),
    ))
}

pub(crate) async fn my_orders<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(actor): Authenticated,
    Query(params): Query<ListParams>,
) -> Result<Json<OrderPage>, AppError> {
    let page = state.orders.customer_orders(&actor, order_query(&params)?).await?;
    Ok(Json(page))
}

pub(crate) async fn all_orders<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(actor): Authenticated,
    Query(params): Query<ListParams>,
) -> Result<Json<OrderPage>, AppError> {
    let page = state.orders.all_orders(&actor, order_query(&params)?).await?;
    Ok(Json(page))
}

pub(crate) async fn get_order<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(actor): Authenticated,
    Path(code): Path<String>,
) -> Result<Json<Value>, AppError> {
    let order = state.orders.get_order(&actor, &code).await?;
    Ok(Json(json!({ "order": order })))
}

pub(crate) async fn cancel_order<S: Store>(
    State(state): State<AppState<S>>,
    Authenticated(actor): Authenticated,
    Path(code): Path<String>,
) -> Result<Json<Value>, AppError> {
    let order = state.orders.cancel_order(&actor, &code).await?;
    Ok(Json(json!({
        "message": "Order cancelled successfully",
        "order": order,
    })))
}
