//! Wallet balance, deposit flow and the loyalty points summary.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use tracing::{info, warn};

use crate::{
    AppState,
    api::models::{
        envelope::ApiResponse,
        pagination::{DEFAULT_HISTORY_LIMIT, PaginatedResponse, offset_for},
        users::CurrentUser,
        wallet::{
            DepositCallback, DepositRequest, DepositResponse, ListWalletTransactionsQuery, PointsResponse, WalletResponse,
            WalletTransactionResponse,
        },
    },
    db::{
        errors::DbError,
        handlers::{Points, Wallets},
        models::wallets::WalletTransactionFilter,
    },
    errors::{Error, Result},
    payments::signing::verify_callback,
};

/// Number of point movements shown with the points summary
const RECENT_POINT_TRANSACTIONS: i64 = 10;

#[utoipa::path(
    get,
    path = "/wallet",
    tag = "wallet",
    responses(
        (status = 200, description = "Wallet information retrieved successfully", body = WalletResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_wallet(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ApiResponse<WalletResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let wallet = Wallets::new(&mut conn).get_or_create(current_user.id).await?;
    Ok(Json(ApiResponse::success(
        "Wallet information retrieved successfully",
        WalletResponse::from(wallet),
    )))
}

/// Wallet history, newest first. Limits outside `[1, 100]` fall back to 20.
#[utoipa::path(
    get,
    path = "/wallet/transactions",
    tag = "wallet",
    params(ListWalletTransactionsQuery),
    responses(
        (status = 200, description = "Transaction history retrieved successfully", body = PaginatedResponse<WalletTransactionResponse>),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListWalletTransactionsQuery>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<PaginatedResponse<WalletTransactionResponse>>>> {
    let page = query.pagination.page();
    let limit = query.pagination.limit_or(DEFAULT_HISTORY_LIMIT);
    let filter = WalletTransactionFilter {
        transaction_type: query.transaction_type,
        ..WalletTransactionFilter::new(current_user.id, offset_for(page, limit), limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut wallets = Wallets::new(&mut conn);
    let transactions = wallets.list_transactions(&filter).await?;
    let total = wallets.count_transactions(&filter).await?;

    let items = transactions.into_iter().map(WalletTransactionResponse::from).collect();
    Ok(Json(ApiResponse::success(
        "Transaction history retrieved successfully",
        PaginatedResponse::new(items, page, limit, total),
    )))
}

/// Start a deposit. The wallet is credited once the gateway reports success.
#[utoipa::path(
    post,
    path = "/wallet/deposit",
    request_body = DepositRequest,
    tag = "wallet",
    responses(
        (status = 201, description = "Deposit request created successfully", body = DepositResponse),
        (status = 400, description = "Amount below the minimum or unknown payment method"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_deposit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<DepositRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DepositResponse>>)> {
    request.validate(state.config.wallet.min_deposit)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let transaction = Wallets::new(&mut conn)
        .create_deposit(current_user.id, request.amount, request.payment_method.as_str())
        .await?;

    let reference_id = transaction.reference_id.clone().unwrap_or_else(|| transaction.id.to_string());
    let payment_url = request.payment_method.payment_url(&reference_id, request.amount);
    info!("Deposit {} of {} started via {}", transaction.id, request.amount, request.payment_method.as_str());

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Deposit request created successfully",
            DepositResponse {
                transaction: WalletTransactionResponse::from(transaction),
                payment_url,
                redirect_info: "Please complete payment on the payment gateway page".to_string(),
            },
        )),
    ))
}

/// Gateway notification for a deposit. A `success` status credits the wallet exactly once.
#[utoipa::path(
    post,
    path = "/wallet/deposit/callback",
    request_body = DepositCallback,
    tag = "wallet",
    responses(
        (status = 200, description = "Callback processed successfully"),
        (status = 401, description = "Signature missing or invalid"),
        (status = 404, description = "Unknown transaction"),
        (status = 409, description = "Deposit is no longer pending"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn deposit_callback(
    State(state): State<AppState>,
    Json(callback): Json<DepositCallback>,
) -> Result<Json<ApiResponse<Option<WalletTransactionResponse>>>> {
    if let Some(secret) = &state.config.payments.callback_secret
        && !verify_callback(&callback.signing_payload(), &callback.signature, secret)
    {
        warn!("Rejected deposit callback with a bad signature");
        return Err(Error::InvalidToken {
            message: "Invalid callback signature".to_string(),
        });
    }

    if callback.status != "success" {
        info!("Deposit callback reported status {}", callback.status);
        return Ok(Json(ApiResponse::success("Callback processed successfully", None)));
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let transaction = Wallets::new(&mut conn)
        .complete_deposit(callback.transaction_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => Error::NotFound {
                resource: "Transaction".to_string(),
                id: callback.transaction_id.to_string(),
            },
            other => other.into(),
        })?;

    Ok(Json(ApiResponse::success(
        "Callback processed successfully",
        Some(WalletTransactionResponse::from(transaction)),
    )))
}

#[utoipa::path(
    get,
    path = "/points",
    tag = "wallet",
    responses(
        (status = 200, description = "Points information retrieved successfully", body = PointsResponse),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_points(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ApiResponse<PointsResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut points = Points::new(&mut conn);
    let account = points.get_or_create(current_user.id).await?;
    let recent = points.list_transactions(current_user.id, 0, RECENT_POINT_TRANSACTIONS).await?;
    Ok(Json(ApiResponse::success(
        "Points information retrieved successfully",
        PointsResponse::new(account, recent),
    )))
}

#[cfg(test)]
mod tests {
    use crate::api::models::envelope::ApiResponse;
    use crate::api::models::wallet::{DepositResponse, WalletResponse};
    use crate::payments::signing::sign_callback;
    use crate::test_utils::{bearer, create_test_app, create_test_app_with_config, create_test_config, create_test_user, token_for};
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_wallet_created_on_first_read(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "saver").await;

        let response = server
            .get("/api/v1/wallet")
            .add_header("authorization", bearer(&token_for(&user, &config)))
            .await;
        response.assert_status_ok();
        let wallet = response.json::<ApiResponse<WalletResponse>>().data.unwrap();
        assert_eq!(wallet.balance, Decimal::ZERO);
        assert_eq!(wallet.user_id, user.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deposit_then_callback_credits_once(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "depositor").await;
        let auth = bearer(&token_for(&user, &config));

        let response = server
            .post("/api/v1/wallet/deposit")
            .add_header("authorization", auth.clone())
            .json(&json!({"amount": "50000", "payment_method": "vnpay"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let deposit = response.json::<ApiResponse<DepositResponse>>().data.unwrap();
        assert!(deposit.payment_url.contains("vnp_Amount=5000000"));
        assert!(deposit.transaction.reference_id.as_deref().unwrap().starts_with("DEP_"));

        let callback = json!({"transaction_id": deposit.transaction.id, "status": "success", "reference_id": "VNP1"});
        server.post("/api/v1/wallet/deposit/callback").json(&callback).await.assert_status_ok();
        let replay = server.post("/api/v1/wallet/deposit/callback").json(&callback).await;
        replay.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = replay.json();
        assert_eq!(body["error"]["code"], "NOT_PENDING");

        let wallet = server
            .get("/api/v1/wallet")
            .add_header("authorization", auth.clone())
            .await
            .json::<ApiResponse<WalletResponse>>()
            .data
            .unwrap();
        assert_eq!(wallet.balance, Decimal::from(50000));

        let body: serde_json::Value = server
            .get("/api/v1/wallet/transactions?limit=500")
            .add_header("authorization", auth)
            .await
            .json();
        assert_eq!(body["data"]["pagination"]["items_per_page"], 20);
        assert_eq!(body["data"]["items"][0]["status"], "completed");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deposit_below_minimum(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "frugal").await;

        let response = server
            .post("/api/v1/wallet/deposit")
            .add_header("authorization", bearer(&token_for(&user, &config)))
            .json(&json!({"amount": "999", "payment_method": "momo"}))
            .await;
        response.assert_status_bad_request();

        let response = server
            .post("/api/v1/wallet/deposit")
            .add_header("authorization", bearer(&token_for(&user, &config)))
            .json(&json!({"amount": "100000000000000", "payment_method": "momo"}))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<serde_json::Value>()["error"]["code"], "VALIDATION_ERROR");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_history_page_past_the_end_is_empty(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "historian").await;

        let response = server
            .get(&format!("/api/v1/wallet/transactions?page={}", i64::MAX))
            .add_header("authorization", bearer(&token_for(&user, &config)))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_signed_callbacks(pool: PgPool) {
        let mut config = create_test_config();
        config.payments.callback_secret = Some("gateway-secret".to_string());
        let server = create_test_app_with_config(pool.clone(), config.clone()).await;
        let user = create_test_user(&pool, "signed").await;

        let deposit = server
            .post("/api/v1/wallet/deposit")
            .add_header("authorization", bearer(&token_for(&user, &config)))
            .json(&json!({"amount": "10000", "payment_method": "banking"}))
            .await
            .json::<ApiResponse<DepositResponse>>()
            .data
            .unwrap();
        let id = deposit.transaction.id;

        let unsigned = server
            .post("/api/v1/wallet/deposit/callback")
            .json(&json!({"transaction_id": id, "status": "success", "reference_id": "B1", "signature": "00"}))
            .await;
        unsigned.assert_status_unauthorized();

        let signature = sign_callback(&format!("{id}:success:B1"), "gateway-secret").unwrap();
        server
            .post("/api/v1/wallet/deposit/callback")
            .json(&json!({"transaction_id": id, "status": "success", "reference_id": "B1", "signature": signature}))
            .await
            .assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_points_summary_starts_empty(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, "collector").await;

        let body: serde_json::Value = server
            .get("/api/v1/points")
            .add_header("authorization", bearer(&token_for(&user, &config)))
            .await
            .json();
        assert_eq!(body["data"]["available_points"], 0);
        assert_eq!(body["data"]["recent_transactions"], json!([]));
    }
}
