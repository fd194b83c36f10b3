use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::app_system::{AppConfig, OrderSystem};
use crate::clients::{CartClient, OrderClient, ProductClient, UserClient};
use crate::domain::{Checkout, OrderEdit, ProductCreate, StatusUpdate, StockKey, UserCreate};
use crate::error::CommerceError;
use crate::retry::{retry_transient, RetryPolicy};

use super::problem::ProblemResponse;

pub const USER_HEADER: &str = "x-user-id";
pub const ADMIN_HEADER: &str = "x-admin-token";

#[derive(Clone)]
pub struct AppState {
    orders: OrderClient,
    carts: CartClient,
    users: UserClient,
    products: ProductClient,
    admin_token: Arc<str>,
    retry: RetryPolicy,
}

impl AppState {
    pub fn new(system: &OrderSystem, config: &AppConfig) -> Self {
        Self {
            orders: system.order_client.clone(),
            carts: system.cart_client.clone(),
            users: system.user_client.clone(),
            products: system.product_client.clone(),
            admin_token: Arc::from(config.admin_token.as_str()),
            retry: config.retry,
        }
    }
}

/// Who is calling, as asserted by the upstream auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Caller {
    Admin,
    Customer(String),
}

impl Caller {
    fn from_headers(headers: &HeaderMap, state: &AppState) -> Result<Self, ProblemResponse> {
        if let Some(token) = headers.get(ADMIN_HEADER) {
            let matches: bool = token.as_bytes().ct_eq(state.admin_token.as_bytes()).into();
            if !matches {
                warn!("Rejected admin token");
                return Err(ProblemResponse::forbidden("invalid admin token"));
            }
            return Ok(Self::Admin);
        }
        match headers.get(USER_HEADER).and_then(|value| value.to_str().ok()) {
            Some(user_id) if !user_id.trim().is_empty() => Ok(Self::Customer(user_id.to_string())),
            _ => Err(ProblemResponse::unauthorized(format!("missing {} header", USER_HEADER))),
        }
    }

    fn customer(headers: &HeaderMap, state: &AppState) -> Result<String, ProblemResponse> {
        match Self::from_headers(headers, state)? {
            Self::Customer(user_id) => Ok(user_id),
            Self::Admin => Err(ProblemResponse::forbidden("this route acts on the caller's own account")),
        }
    }

    fn admin(headers: &HeaderMap, state: &AppState) -> Result<(), ProblemResponse> {
        if headers.get(ADMIN_HEADER).is_none() {
            return Err(ProblemResponse::unauthorized(format!("missing {} header", ADMIN_HEADER)));
        }
        Self::from_headers(headers, state).map(|_| ())
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, CommerceError> {
    serde_json::from_slice(body).map_err(|e| CommerceError::ValidationError(format!("invalid request body: {}", e)))
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/users", post(create_user))
        .route("/admin/products", post(create_product))
        .route("/products/:id", get(get_product))
        .route("/cart", get(get_cart))
        .route("/cart/items", post(add_cart_item).put(update_cart_item).delete(remove_cart_item))
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order).put(update_order).delete(cancel_order))
        .route("/orders/:id/payment-proof", post(submit_payment_proof))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn create_user(State(state): State<AppState>, body: Bytes) -> Result<Response, ProblemResponse> {
    let params: UserCreate = parse_body(&body)?;
    let user_id = state.users.create_user(params).await?;
    let user = retry_transient(state.retry, "get_user", || state.users.require_user(user_id.clone())).await?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

async fn create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProblemResponse> {
    Caller::admin(&headers, &state)?;
    let params: ProductCreate = parse_body(&body)?;
    let product_id = state.products.create_product(params).await?;
    let product =
        retry_transient(state.retry, "get_product", || state.products.require_product(product_id.clone())).await?;
    Ok((StatusCode::CREATED, Json(product)).into_response())
}

async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ProblemResponse> {
    let product = retry_transient(state.retry, "get_product", || state.products.require_product(id.clone())).await?;
    Ok(Json(product).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartItemRequest {
    product_id: String,
    #[serde(default)]
    variant_id: Option<String>,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartKeyQuery {
    product_id: String,
    #[serde(default)]
    variant_id: Option<String>,
}

fn stock_key(product_id: String, variant_id: Option<String>) -> StockKey {
    StockKey { product_id, variant_id }
}

async fn get_cart(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ProblemResponse> {
    let user_id = Caller::customer(&headers, &state)?;
    let cart = retry_transient(state.retry, "get_cart", || state.carts.get_cart(user_id.clone())).await?;
    Ok(Json(cart).into_response())
}

async fn add_cart_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProblemResponse> {
    let user_id = Caller::customer(&headers, &state)?;
    let request: CartItemRequest = parse_body(&body)?;
    let key = stock_key(request.product_id, request.variant_id);
    let line = retry_transient(state.retry, "add_cart_item", || {
        state.carts.add_item(user_id.clone(), key.clone(), request.quantity)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(line)).into_response())
}

async fn update_cart_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProblemResponse> {
    let user_id = Caller::customer(&headers, &state)?;
    let request: CartItemRequest = parse_body(&body)?;
    let key = stock_key(request.product_id, request.variant_id);
    let line = retry_transient(state.retry, "update_cart_item", || {
        state.carts.update_quantity(user_id.clone(), key.clone(), request.quantity)
    })
    .await?;
    Ok(Json(line).into_response())
}

async fn remove_cart_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CartKeyQuery>,
) -> Result<Response, ProblemResponse> {
    let user_id = Caller::customer(&headers, &state)?;
    let key = stock_key(query.product_id, query.variant_id);
    let line = retry_transient(state.retry, "remove_cart_item", || {
        state.carts.remove_item(user_id.clone(), key.clone())
    })
    .await?;
    Ok(Json(line).into_response())
}

async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProblemResponse> {
    let user_id = Caller::customer(&headers, &state)?;
    let checkout: Checkout = parse_body(&body)?;
    let order = retry_transient(state.retry, "create_order", || {
        state.orders.create_order(user_id.clone(), checkout.clone())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(order)).into_response())
}

async fn get_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ProblemResponse> {
    let order = match Caller::from_headers(&headers, &state)? {
        Caller::Admin => retry_transient(state.retry, "get_order", || state.orders.require_order(id.clone())).await?,
        Caller::Customer(user_id) => {
            retry_transient(state.retry, "get_order", || state.orders.get_order_for(id.clone(), &user_id)).await?
        }
    };
    Ok(Json(order).into_response())
}

/// Admins send `{paymentStatus?, orderStatus?}`; owners send `{deliveryInfo?, paymentMethod?}`.
async fn update_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ProblemResponse> {
    let order = match Caller::from_headers(&headers, &state)? {
        Caller::Admin => {
            let update: StatusUpdate = parse_body(&body)?;
            info!(order_id = %id, ?update, "Admin status update");
            retry_transient(state.retry, "update_status", || state.orders.update_status(id.clone(), update)).await?
        }
        Caller::Customer(user_id) => {
            let edit: OrderEdit = parse_body(&body)?;
            retry_transient(state.retry, "edit_order", || {
                state.orders.edit_order(id.clone(), &user_id, edit.clone())
            })
            .await?
        }
    };
    Ok(Json(order).into_response())
}

async fn cancel_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ProblemResponse> {
    let user_id = Caller::customer(&headers, &state)?;
    let order =
        retry_transient(state.retry, "cancel_order", || state.orders.cancel_order(id.clone(), &user_id)).await?;
    Ok(Json(order).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentProofRequest {
    proof_ref: String,
}

async fn submit_payment_proof(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ProblemResponse> {
    let user_id = Caller::customer(&headers, &state)?;
    let request: PaymentProofRequest = parse_body(&body)?;
    let order = retry_transient(state.retry, "submit_payment_proof", || {
        state.orders.submit_payment_proof(id.clone(), &user_id, request.proof_ref.clone())
    })
    .await?;
    Ok(Json(order).into_response())
}
