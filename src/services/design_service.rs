use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_tailor},
    models::{DESIGN_CATEGORIES, Design},
    response::{ApiResponse, Meta},
    routes::designs::{CreateDesignRequest, DesignList, UpdateDesignRequest},
    routes::params::{DesignQuery, Pagination},
};

/// Public gallery. `is_public = TRUE` is forced here, not left to the
/// caller, so a draft can never leak through a filter combination.
pub async fn list_public(pool: &DbPool, query: DesignQuery) -> AppResult<ApiResponse<DesignList>> {
    let (page, limit, offset) = query.pagination().normalize();

    if let Some(category) = query.category.as_deref() {
        validate_category(category)?;
    }

    let items = sqlx::query_as::<_, Design>(
        r#"
        SELECT * FROM designs
        WHERE is_public = TRUE
          AND ($1::text IS NULL OR category = $1)
          AND ($2::uuid IS NULL OR tailor_id = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(query.category.as_deref())
    .bind(query.tailor_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT count(*) FROM designs
        WHERE is_public = TRUE
          AND ($1::text IS NULL OR category = $1)
          AND ($2::uuid IS NULL OR tailor_id = $2)
        "#,
    )
    .bind(query.category.as_deref())
    .bind(query.tailor_id)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success(
        "Designs",
        DesignList { items },
        Some(Meta::new(page, limit, total.0)),
    ))
}

/// The owning tailor's catalogue, drafts included.
pub async fn list_mine(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<DesignList>> {
    ensure_tailor(user)?;
    let (page, limit, offset) = pagination.normalize();

    let items = sqlx::query_as::<_, Design>(
        "SELECT * FROM designs WHERE tailor_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT count(*) FROM designs WHERE tailor_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    Ok(ApiResponse::success(
        "Designs",
        DesignList { items },
        Some(Meta::new(page, limit, total.0)),
    ))
}

/// Anonymous single-design fetch; drafts look like missing rows.
pub async fn get_public(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<Design>> {
    let design =
        sqlx::query_as::<_, Design>("SELECT * FROM designs WHERE id = $1 AND is_public = TRUE")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("Design", design, None))
}

pub async fn create_design(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateDesignRequest,
) -> AppResult<ApiResponse<Design>> {
    ensure_tailor(user)?;
    validate_category(&payload.category)?;
    if payload.price < 0 {
        return Err(AppError::BadRequest("Price cannot be negative".into()));
    }

    let design = sqlx::query_as::<_, Design>(
        r#"
        INSERT INTO designs (id, tailor_id, name, description, category, images,
                             price, estimated_days, is_public)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.name)
    .bind(payload.description)
    .bind(payload.category)
    .bind(payload.images)
    .bind(payload.price)
    .bind(payload.estimated_days)
    .bind(payload.is_public)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success(
        "Design created",
        design,
        Some(Meta::empty()),
    ))
}

pub async fn update_design(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateDesignRequest,
) -> AppResult<ApiResponse<Design>> {
    let existing = find_owned(pool, user, id).await?;

    let category = payload.category.unwrap_or(existing.category);
    validate_category(&category)?;
    let price = payload.price.unwrap_or(existing.price);
    if price < 0 {
        return Err(AppError::BadRequest("Price cannot be negative".into()));
    }

    let design = sqlx::query_as::<_, Design>(
        r#"
        UPDATE designs
        SET name = $2, description = $3, category = $4, images = $5,
            price = $6, estimated_days = $7, is_public = $8, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.name.unwrap_or(existing.name))
    .bind(payload.description.unwrap_or(existing.description))
    .bind(category)
    .bind(payload.images.unwrap_or(existing.images))
    .bind(price)
    .bind(payload.estimated_days.unwrap_or(existing.estimated_days))
    .bind(payload.is_public.unwrap_or(existing.is_public))
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success("Updated", design, Some(Meta::empty())))
}

pub async fn delete_design(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    find_owned(pool, user, id).await?;

    sqlx::query("DELETE FROM designs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_owned(pool: &DbPool, user: &AuthUser, id: Uuid) -> AppResult<Design> {
    let design = sqlx::query_as::<_, Design>("SELECT * FROM designs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;

    if design.tailor_id != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(design)
}

fn validate_category(category: &str) -> AppResult<()> {
    if DESIGN_CATEGORIES.contains(&category) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Unknown design category: {category}"
        )))
    }
}
