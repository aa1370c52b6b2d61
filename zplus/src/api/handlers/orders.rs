//! Checkout: placing orders and paying for them from the wallet.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use tracing::{info, warn};

use crate::{
    AppState,
    api::models::{
        envelope::ApiResponse,
        orders::{ListOrdersQuery, OrderCreate, OrderResponse, OrderStatusUpdate, PaymentResponse},
        pagination::PaginatedResponse,
        users::CurrentUser,
    },
    auth::current_user::AdminUser,
    db::{
        errors::DbError,
        handlers::{Orders, Points, Products, Repository, Wallets, orders::OrderFilter},
        models::orders::{OrderCreateDBRequest, OrderLine, PaymentStatus},
    },
    errors::{Error, Result},
    types::OrderId,
};

const WALLET_PAYMENT_METHOD: &str = "wallet";

fn order_not_found(id: OrderId) -> Error {
    Error::NotFound {
        resource: "Order".to_string(),
        id: id.to_string(),
    }
}

/// Points earned for a purchase: one per full `unit` spent
pub(crate) fn purchase_points(amount: Decimal, unit: u64) -> i64 {
    if unit == 0 {
        return 0;
    }
    (amount / Decimal::from(unit)).floor().to_i64().unwrap_or(0).max(0)
}

async fn list_with_filter(state: &AppState, filter: OrderFilter, page: i64) -> Result<PaginatedResponse<OrderResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Orders::new(&mut conn);
    let orders = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    let items = orders.into_iter().map(OrderResponse::from).collect();
    Ok(PaginatedResponse::new(items, page, filter.limit, total))
}

/// Place an order for active catalog products
#[utoipa::path(
    post,
    path = "/orders",
    request_body = OrderCreate,
    tag = "orders",
    responses(
        (status = 201, description = "Order created successfully", body = OrderResponse),
        (status = 400, description = "Empty order, bad quantity or unavailable product"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<OrderCreate>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>)> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut lines = Vec::with_capacity(request.items.len());
    {
        let mut products = Products::new(&mut conn);
        for item in &request.items {
            let product = products
                .get_by_id(item.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| Error::BadRequest {
                    message: format!("product {} is not available", item.product_id),
                })?;
            lines.push(OrderLine {
                product_id: product.id,
                unit_price: product.effective_price(),
                list_price: product.price,
                product_name: product.name,
                quantity: item.quantity,
            });
        }
    }

    let mut orders = Orders::new(&mut conn);
    let order = orders
        .create(&OrderCreateDBRequest {
            user_id: current_user.id,
            lines,
            notes: request.notes,
        })
        .await?;
    let items = orders.items(order.id).await?;

    info!("Order {} placed by {}", order.order_number, current_user.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Order created successfully",
            OrderResponse::from(order).with_items(items),
        )),
    ))
}

/// The caller's orders, newest first
#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    params(ListOrdersQuery),
    responses(
        (status = 200, description = "Orders retrieved successfully", body = PaginatedResponse<OrderResponse>),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_my_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<PaginatedResponse<OrderResponse>>>> {
    let filter = OrderFilter::new(query.pagination.skip(), query.pagination.limit()).for_user(current_user.id);
    let page = list_with_filter(&state, filter, query.pagination.page()).await?;
    Ok(Json(ApiResponse::success("Orders retrieved successfully", page)))
}

/// One order with its lines. Customers only see their own orders.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "orders",
    params(("id" = uuid::Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order retrieved successfully", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<OrderResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut orders = Orders::new(&mut conn);
    let order = orders
        .get_by_id(id)
        .await?
        .filter(|order| current_user.is_admin() || order.user_id == Some(current_user.id))
        .ok_or_else(|| order_not_found(id))?;
    let items = orders.items(id).await?;

    Ok(Json(ApiResponse::success(
        "Order retrieved successfully",
        OrderResponse::from(order).with_items(items),
    )))
}

/// Pay an unpaid order from the wallet balance.
///
/// The wallet debit and the order update commit together; loyalty points are awarded afterwards.
#[utoipa::path(
    post,
    path = "/orders/{id}/pay",
    tag = "orders",
    params(("id" = uuid::Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order paid successfully", body = PaymentResponse),
        (status = 400, description = "Order belongs to someone else or is already paid"),
        (status = 402, description = "Wallet balance too low"),
        (status = 404, description = "Order not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn pay_order(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<PaymentResponse>>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let order = Orders::new(&mut tx).get_for_update(id).await?.ok_or_else(|| order_not_found(id))?;
    if order.user_id != Some(current_user.id) {
        return Err(Error::BadRequest {
            message: "Order does not belong to the current user".to_string(),
        });
    }
    if order.payment_status != PaymentStatus::Pending {
        return Err(Error::BadRequest {
            message: format!("Order is already {}", order.payment_status.as_str()),
        });
    }

    let charge = Wallets::new(&mut tx)
        .charge(
            current_user.id,
            order.final_amount,
            WALLET_PAYMENT_METHOD,
            Some(&order.order_number),
        )
        .await?;
    let order = Orders::new(&mut tx)
        .mark_paid(id, WALLET_PAYMENT_METHOD)
        .await
        .map_err(|e| match e {
            DbError::NotFound => order_not_found(id),
            other => other.into(),
        })?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    info!("Order {} paid from wallet by {}", order.order_number, current_user.id);

    let mut points_earned = purchase_points(order.final_amount, state.config.wallet.points_unit);
    if points_earned > 0 {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let awarded = Points::new(&mut conn)
            .award(
                current_user.id,
                points_earned,
                "Purchase reward",
                Some(&order.order_number),
                state.config.wallet.points_validity,
            )
            .await;
        // The payment has committed, so a failed award must not turn into a failed response
        if let Err(e) = awarded {
            warn!("Failed to award {} points for order {}: {}", points_earned, order.order_number, e);
            points_earned = 0;
        }
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let items = Orders::new(&mut conn).items(id).await?;
    Ok(Json(ApiResponse::success(
        "Order paid successfully",
        PaymentResponse {
            order: OrderResponse::from(order).with_items(items),
            wallet_balance: charge.balance_after,
            points_earned,
        },
    )))
}

/// Every order, optionally filtered by status
#[utoipa::path(
    get,
    path = "/admin/orders",
    tag = "admin",
    params(ListOrdersQuery),
    responses(
        (status = 200, description = "Orders retrieved successfully", body = PaginatedResponse<OrderResponse>),
        (status = 403, description = "Admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
    _: AdminUser,
) -> Result<Json<ApiResponse<PaginatedResponse<OrderResponse>>>> {
    let filter = OrderFilter {
        order_status: query.order_status,
        ..OrderFilter::new(query.pagination.skip(), query.pagination.limit())
    };
    let page = list_with_filter(&state, filter, query.pagination.page()).await?;
    Ok(Json(ApiResponse::success("Orders retrieved successfully", page)))
}

#[utoipa::path(
    put,
    path = "/admin/orders/{id}/status",
    request_body = OrderStatusUpdate,
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order status updated successfully", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    _: AdminUser,
    Json(request): Json<OrderStatusUpdate>,
) -> Result<Json<ApiResponse<OrderResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let order = Orders::new(&mut conn)
        .update_status(id, request.order_status)
        .await
        .map_err(|e| match e {
            DbError::NotFound => order_not_found(id),
            other => other.into(),
        })?;
    Ok(Json(ApiResponse::success(
        "Order status updated successfully",
        OrderResponse::from(order),
    )))
}

#[cfg(test)]
mod tests {
    use super::purchase_points;
    use crate::api::models::envelope::ApiResponse;
    use crate::api::models::orders::{OrderResponse, PaymentResponse};
    use crate::db::handlers::{Wallets, repository::Repository};
    use crate::db::handlers::products::Products;
    use crate::db::models::products::{ProductDBRequest, ProductDBResponse};
    use crate::test_utils::{bearer, create_test_admin, create_test_app, create_test_user, token_for};
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;
    use sqlx::PgPool;

    async fn create_product(pool: &PgPool, slug: &str, price: i64, discount: Option<i64>) -> ProductDBResponse {
        let mut conn = pool.acquire().await.unwrap();
        Products::new(&mut conn)
            .create(&ProductDBRequest {
                name: format!("Product {slug}"),
                slug: slug.to_string(),
                description: "Software".to_string(),
                short_description: None,
                featured_image: None,
                gallery_images: vec![],
                price: Decimal::from(price),
                discount_price: discount.map(Decimal::from),
                version: None,
                requirements: None,
                features: vec![],
                category_id: None,
                download_url: None,
                file_size: None,
                is_active: true,
                is_featured: false,
            })
            .await
            .unwrap()
    }

    async fn fund_wallet(pool: &PgPool, user_id: crate::types::UserId, amount: i64) {
        let mut conn = pool.acquire().await.unwrap();
        let mut wallets = Wallets::new(&mut conn);
        let deposit = wallets.create_deposit(user_id, Decimal::from(amount), "banking").await.unwrap();
        wallets.complete_deposit(deposit.id).await.unwrap();
    }

    #[test]
    fn test_purchase_points() {
        assert_eq!(purchase_points(Decimal::from(2500), 1000), 2);
        assert_eq!(purchase_points(Decimal::from(999), 1000), 0);
        assert_eq!(purchase_points(Decimal::from(5000), 0), 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_order_totals_use_discounts(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "shopper").await;
        let full = create_product(&pool, "full", 10000, None).await;
        let sale = create_product(&pool, "sale", 20000, Some(15000)).await;

        let response = server
            .post("/api/v1/orders")
            .add_header("authorization", bearer(&token_for(&user, &config)))
            .json(&json!({"items": [
                {"product_id": full.id, "quantity": 2},
                {"product_id": sale.id, "quantity": 1}
            ]}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let order = response.json::<ApiResponse<OrderResponse>>().data.unwrap();

        assert_eq!(order.total_amount, Decimal::from(40000));
        assert_eq!(order.final_amount, Decimal::from(35000));
        assert_eq!(order.discount_amount, Decimal::from(5000));
        assert!(order.order_number.starts_with("ORD-"));
        assert_eq!(order.items.unwrap().len(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_product_rejected(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "shopper").await;

        let response = server
            .post("/api/v1/orders")
            .add_header("authorization", bearer(&token_for(&user, &config)))
            .json(&json!({"items": [{"product_id": uuid::Uuid::new_v4(), "quantity": 1}]}))
            .await;
        response.assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_pay_order_from_wallet(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "payer").await;
        let auth = bearer(&token_for(&user, &config));
        let product = create_product(&pool, "suite", 25000, None).await;

        let order = server
            .post("/api/v1/orders")
            .add_header("authorization", auth.clone())
            .json(&json!({"items": [{"product_id": product.id, "quantity": 1}]}))
            .await
            .json::<ApiResponse<OrderResponse>>()
            .data
            .unwrap();

        let response = server
            .post(&format!("/api/v1/orders/{}/pay", order.id))
            .add_header("authorization", auth.clone())
            .await;
        response.assert_status(StatusCode::PAYMENT_REQUIRED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["code"], "INSUFFICIENT_FUNDS");

        fund_wallet(&pool, user.id, 30000).await;

        let response = server
            .post(&format!("/api/v1/orders/{}/pay", order.id))
            .add_header("authorization", auth.clone())
            .await;
        response.assert_status_ok();
        let payment = response.json::<ApiResponse<PaymentResponse>>().data.unwrap();
        assert_eq!(payment.wallet_balance, Decimal::from(5000));
        assert_eq!(payment.points_earned, 25);
        assert_eq!(payment.order.payment_method.as_deref(), Some("wallet"));

        let again = server
            .post(&format!("/api/v1/orders/{}/pay", order.id))
            .add_header("authorization", auth.clone())
            .await;
        again.assert_status_bad_request();

        let body: serde_json::Value = server.get("/api/v1/points").add_header("authorization", auth).await.json();
        assert_eq!(body["data"]["available_points"], 25);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_orders_are_private(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let owner = create_test_user(&pool, "owner").await;
        let other = create_test_user(&pool, "other").await;
        let admin = create_test_admin(&pool, "staff").await;
        let product = create_product(&pool, "tool", 1000, None).await;

        let order = server
            .post("/api/v1/orders")
            .add_header("authorization", bearer(&token_for(&owner, &config)))
            .json(&json!({"items": [{"product_id": product.id, "quantity": 1}]}))
            .await
            .json::<ApiResponse<OrderResponse>>()
            .data
            .unwrap();
        let path = format!("/api/v1/orders/{}", order.id);

        server
            .get(&path)
            .add_header("authorization", bearer(&token_for(&other, &config)))
            .await
            .assert_status_not_found();
        server
            .post(&format!("{path}/pay"))
            .add_header("authorization", bearer(&token_for(&other, &config)))
            .await
            .assert_status_bad_request();
        server
            .get(&path)
            .add_header("authorization", bearer(&token_for(&admin, &config)))
            .await
            .assert_status_ok();

        let body: serde_json::Value = server
            .get("/api/v1/orders")
            .add_header("authorization", bearer(&token_for(&other, &config)))
            .await
            .json();
        assert_eq!(body["data"]["pagination"]["total_items"], 0);

        let response = server
            .put(&format!("/api/v1/admin/orders/{}/status", order.id))
            .add_header("authorization", bearer(&token_for(&admin, &config)))
            .json(&json!({"order_status": "cancelled"}))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = server
            .get("/api/v1/admin/orders?order_status=cancelled")
            .add_header("authorization", bearer(&token_for(&admin, &config)))
            .await
            .json();
        assert_eq!(body["data"]["pagination"]["total_items"], 1);
    }
}
