//! Public blog reads and the admin editor endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    AppState,
    api::models::{
        blog::{
            AdminListPostsQuery, BlogCategoryCreate, BlogCategoryResponse, BlogPostCreate, BlogPostResponse, BlogPostUpdate,
            ListPostsQuery,
        },
        envelope::ApiResponse,
        pagination::PaginatedResponse,
    },
    auth::current_user::AdminUser,
    cache::BLOG_CATEGORIES_KEY,
    db::{
        errors::DbError,
        handlers::{BlogCategories, BlogPosts, Repository, blog_posts::BlogPostFilter},
    },
    errors::{Error, Result},
    types::PostId,
};

fn post_not_found(id: impl ToString) -> Error {
    Error::NotFound {
        resource: "Blog post".to_string(),
        id: id.to_string(),
    }
}

async fn list_with_filter(state: &AppState, filter: BlogPostFilter, page: i64) -> Result<PaginatedResponse<BlogPostResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = BlogPosts::new(&mut conn);
    let posts = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    let items = posts.into_iter().map(BlogPostResponse::from).collect();
    Ok(PaginatedResponse::new(items, page, filter.limit, total))
}

/// Published posts, newest first
#[utoipa::path(
    get,
    path = "/blog/posts",
    tag = "blog",
    params(ListPostsQuery),
    responses(
        (status = 200, description = "Blog posts retrieved successfully", body = PaginatedResponse<BlogPostResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<BlogPostResponse>>>> {
    let filter = BlogPostFilter {
        category_slug: query.category,
        featured: query.featured,
        search: query.search,
        ..BlogPostFilter::published(query.pagination.skip(), query.pagination.limit())
    };
    let page = list_with_filter(&state, filter, query.pagination.page()).await?;
    Ok(Json(ApiResponse::success("Blog posts retrieved successfully", page)))
}

/// A published post with its categories. Each call counts as a view.
#[utoipa::path(
    get,
    path = "/blog/posts/{slug}",
    tag = "blog",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Blog post retrieved successfully", body = BlogPostResponse),
        (status = 404, description = "No published post with this slug"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_post(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<ApiResponse<BlogPostResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = BlogPosts::new(&mut conn);
    let post = repo.view_published(&slug).await?.ok_or_else(|| post_not_found(&slug))?;
    let categories = repo.categories_for(post.id).await?;

    Ok(Json(ApiResponse::success(
        "Blog post retrieved successfully",
        BlogPostResponse::from(post).with_categories(categories),
    )))
}

/// Every blog category, by name
#[utoipa::path(
    get,
    path = "/blog/categories",
    tag = "blog",
    responses(
        (status = 200, description = "Blog categories retrieved successfully", body = Vec<BlogCategoryResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<BlogCategoryResponse>>>> {
    if let Some(cache) = &state.cache
        && let Some(categories) = cache.get_json::<Vec<BlogCategoryResponse>>(BLOG_CATEGORIES_KEY).await
    {
        return Ok(Json(ApiResponse::success("Blog categories retrieved successfully", categories)));
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let categories: Vec<BlogCategoryResponse> = BlogCategories::new(&mut conn)
        .list()
        .await?
        .into_iter()
        .map(BlogCategoryResponse::from)
        .collect();

    if let Some(cache) = &state.cache {
        cache.set_json(BLOG_CATEGORIES_KEY, &categories).await;
    }
    Ok(Json(ApiResponse::success("Blog categories retrieved successfully", categories)))
}

/// Posts in every status, newest first
#[utoipa::path(
    get,
    path = "/admin/blog/posts",
    tag = "admin",
    params(AdminListPostsQuery),
    responses(
        (status = 200, description = "Admin blog posts retrieved successfully", body = PaginatedResponse<BlogPostResponse>),
        (status = 403, description = "Admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_list_posts(
    State(state): State<AppState>,
    Query(query): Query<AdminListPostsQuery>,
    _: AdminUser,
) -> Result<Json<ApiResponse<PaginatedResponse<BlogPostResponse>>>> {
    let filter = BlogPostFilter {
        status: query.status,
        search: query.search,
        ..BlogPostFilter::new(query.pagination.skip(), query.pagination.limit())
    };
    let page = list_with_filter(&state, filter, query.pagination.page()).await?;
    Ok(Json(ApiResponse::success("Admin blog posts retrieved successfully", page)))
}

#[utoipa::path(
    get,
    path = "/admin/blog/posts/{id}",
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Blog post retrieved successfully", body = BlogPostResponse),
        (status = 404, description = "Blog post not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_get_post(State(state): State<AppState>, Path(id): Path<PostId>, _: AdminUser) -> Result<Json<ApiResponse<BlogPostResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = BlogPosts::new(&mut conn);
    let post = repo.get_by_id(id).await?.ok_or_else(|| post_not_found(id))?;
    let categories = repo.categories_for(id).await?;
    Ok(Json(ApiResponse::success(
        "Blog post retrieved successfully",
        BlogPostResponse::from(post).with_categories(categories),
    )))
}

#[utoipa::path(
    post,
    path = "/admin/blog/posts",
    request_body = BlogPostCreate,
    tag = "admin",
    responses(
        (status = 201, description = "Blog post created successfully", body = BlogPostResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Slug already in use"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_post(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<BlogPostCreate>,
) -> Result<(StatusCode, Json<ApiResponse<BlogPostResponse>>)> {
    request.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = BlogPosts::new(&mut conn);
    let post = repo.create(&request.into_db(admin.id)).await?;
    let categories = repo.categories_for(post.id).await?;

    info!("Blog post {} created by {}", post.slug, admin.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Blog post created successfully",
            BlogPostResponse::from(post).with_categories(categories),
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/admin/blog/posts/{id}",
    request_body = BlogPostUpdate,
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Blog post updated successfully", body = BlogPostResponse),
        (status = 404, description = "Blog post not found"),
        (status = 409, description = "Slug already in use"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    _: AdminUser,
    Json(request): Json<BlogPostUpdate>,
) -> Result<Json<ApiResponse<BlogPostResponse>>> {
    request.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = BlogPosts::new(&mut conn);
    let post = repo.update(id, &request.into()).await.map_err(|e| match e {
        DbError::NotFound => post_not_found(id),
        other => other.into(),
    })?;
    let categories = repo.categories_for(id).await?;

    Ok(Json(ApiResponse::success(
        "Blog post updated successfully",
        BlogPostResponse::from(post).with_categories(categories),
    )))
}

#[utoipa::path(
    delete,
    path = "/admin/blog/posts/{id}",
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Blog post deleted successfully"),
        (status = 404, description = "Blog post not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_post(State(state): State<AppState>, Path(id): Path<PostId>, _: AdminUser) -> Result<Json<ApiResponse<()>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !BlogPosts::new(&mut conn).delete(id).await? {
        return Err(post_not_found(id));
    }
    Ok(Json(ApiResponse::message("Blog post deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/admin/blog/categories",
    request_body = BlogCategoryCreate,
    tag = "admin",
    responses(
        (status = 201, description = "Blog category created successfully", body = BlogCategoryResponse),
        (status = 409, description = "Slug already in use"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_category(
    State(state): State<AppState>,
    _: AdminUser,
    Json(request): Json<BlogCategoryCreate>,
) -> Result<(StatusCode, Json<ApiResponse<BlogCategoryResponse>>)> {
    request.validate()?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = BlogCategories::new(&mut conn).create(&request.into()).await?;

    if let Some(cache) = &state.cache {
        cache.invalidate(BLOG_CATEGORIES_KEY).await;
    }
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Blog category created successfully", BlogCategoryResponse::from(category))),
    ))
}
