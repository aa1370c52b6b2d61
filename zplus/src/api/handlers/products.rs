//! The software catalog: public browsing and admin maintenance.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        envelope::ApiResponse,
        pagination::PaginatedResponse,
        products::{ListProductsQuery, ProductCategoryCreate, ProductCategoryResponse, ProductRequest, ProductResponse},
    },
    auth::current_user::AdminUser,
    db::{
        errors::DbError,
        handlers::{ProductCategories, Products, Repository, products::ProductFilter},
    },
    errors::{Error, Result},
    types::ProductId,
};

fn product_not_found(id: impl ToString) -> Error {
    Error::NotFound {
        resource: "Product".to_string(),
        id: id.to_string(),
    }
}

async fn list_with_filter(state: &AppState, filter: ProductFilter, page: i64) -> Result<PaginatedResponse<ProductResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Products::new(&mut conn);
    let products = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    let items = products.into_iter().map(ProductResponse::from).collect();
    Ok(PaginatedResponse::new(items, page, filter.limit, total))
}

/// Active products, newest first
#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Products retrieved successfully", body = PaginatedResponse<ProductResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<ProductResponse>>>> {
    let filter = ProductFilter {
        category_slug: query.category,
        featured: query.featured,
        search: query.search,
        ..ProductFilter::active(query.pagination.skip(), query.pagination.limit())
    };
    let page = list_with_filter(&state, filter, query.pagination.page()).await?;
    Ok(Json(ApiResponse::success("Products retrieved successfully", page)))
}

#[utoipa::path(
    get,
    path = "/products/{slug}",
    tag = "products",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product retrieved successfully", body = ProductResponse),
        (status = 404, description = "No active product with this slug"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_product(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<ApiResponse<ProductResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let product = Products::new(&mut conn)
        .get_by_slug(&slug, true)
        .await?
        .ok_or_else(|| product_not_found(&slug))?;
    Ok(Json(ApiResponse::success("Product retrieved successfully", ProductResponse::from(product))))
}

#[utoipa::path(
    get,
    path = "/products/categories",
    tag = "products",
    responses(
        (status = 200, description = "Product categories retrieved successfully", body = Vec<ProductCategoryResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<ProductCategoryResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let categories = ProductCategories::new(&mut conn).list().await?;
    Ok(Json(ApiResponse::success(
        "Product categories retrieved successfully",
        categories.into_iter().map(ProductCategoryResponse::from).collect(),
    )))
}

/// Every product including inactive ones
#[utoipa::path(
    get,
    path = "/admin/products",
    tag = "admin",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Admin products retrieved successfully", body = PaginatedResponse<ProductResponse>),
        (status = 403, description = "Admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
    _: AdminUser,
) -> Result<Json<ApiResponse<PaginatedResponse<ProductResponse>>>> {
    let filter = ProductFilter {
        category_slug: query.category,
        featured: query.featured,
        search: query.search,
        ..ProductFilter::new(query.pagination.skip(), query.pagination.limit())
    };
    let page = list_with_filter(&state, filter, query.pagination.page()).await?;
    Ok(Json(ApiResponse::success("Admin products retrieved successfully", page)))
}

#[utoipa::path(
    post,
    path = "/admin/products",
    request_body = ProductRequest,
    tag = "admin",
    responses(
        (status = 201, description = "Product created successfully", body = ProductResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Slug already in use"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_product(
    State(state): State<AppState>,
    _: AdminUser,
    Json(request): Json<ProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>)> {
    request.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let product = Products::new(&mut conn).create(&request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Product created successfully", ProductResponse::from(product))),
    ))
}

#[utoipa::path(
    put,
    path = "/admin/products/{id}",
    request_body = ProductRequest,
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product updated successfully", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    _: AdminUser,
    Json(request): Json<ProductRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>> {
    request.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let product = Products::new(&mut conn).update(id, &request.into()).await.map_err(|e| match e {
        DbError::NotFound => product_not_found(id),
        other => other.into(),
    })?;
    Ok(Json(ApiResponse::success("Product updated successfully", ProductResponse::from(product))))
}

#[utoipa::path(
    delete,
    path = "/admin/products/{id}",
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted successfully"),
        (status = 404, description = "Product not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_product(State(state): State<AppState>, Path(id): Path<ProductId>, _: AdminUser) -> Result<Json<ApiResponse<()>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Products::new(&mut conn).delete(id).await? {
        return Err(product_not_found(id));
    }
    Ok(Json(ApiResponse::message("Product deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/admin/products/categories",
    request_body = ProductCategoryCreate,
    tag = "admin",
    responses(
        (status = 201, description = "Product category created successfully", body = ProductCategoryResponse),
        (status = 409, description = "Slug already in use"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_category(
    State(state): State<AppState>,
    _: AdminUser,
    Json(request): Json<ProductCategoryCreate>,
) -> Result<(StatusCode, Json<ApiResponse<ProductCategoryResponse>>)> {
    request.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = ProductCategories::new(&mut conn).create(&request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Product category created successfully",
            ProductCategoryResponse::from(category),
        )),
    ))
}
