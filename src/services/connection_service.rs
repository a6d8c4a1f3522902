use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_client, ensure_tailor},
    models::CustomerConnection,
    response::{ApiResponse, Meta},
    routes::connections::{ConnectionList, CreateConnectionRequest, UpdateConnectionRequest},
};

/// A client asks a tailor for a pairing. At most one connection may ever
/// exist per (client, tailor) pair, whatever its status.
pub async fn create_connection(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateConnectionRequest,
) -> AppResult<ApiResponse<CustomerConnection>> {
    ensure_client(user)?;

    let tailor: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE id = $1 AND role = 'tailor'")
            .bind(payload.tailor_id)
            .fetch_optional(pool)
            .await?;
    if tailor.is_none() {
        return Err(AppError::BadRequest("Unknown tailor".into()));
    }

    let exists: (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM customer_connections WHERE client_id = $1 AND tailor_id = $2)",
    )
    .bind(user.user_id)
    .bind(payload.tailor_id)
    .fetch_one(pool)
    .await?;
    if exists.0 {
        return Err(AppError::BadRequest(
            "Connection already exists between these users".into(),
        ));
    }

    let connection = sqlx::query_as::<_, CustomerConnection>(
        r#"
        INSERT INTO customer_connections (id, client_id, tailor_id, status)
        VALUES ($1, $2, $3, 'pending')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.tailor_id)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "connection_created",
        Some("customer_connections"),
        Some(serde_json::json!({ "connection_id": connection.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Connection requested",
        connection,
        Some(Meta::empty()),
    ))
}

/// Both sides see the same list: every connection the user participates in,
/// optionally narrowed by status.
pub async fn list_connections(
    pool: &DbPool,
    user: &AuthUser,
    status: Option<String>,
) -> AppResult<ApiResponse<ConnectionList>> {
    if let Some(s) = status.as_deref() {
        if !["pending", "accepted", "rejected"].contains(&s) {
            return Err(AppError::BadRequest(format!("Unknown status: {s}")));
        }
    }

    let items = sqlx::query_as::<_, CustomerConnection>(
        r#"
        SELECT * FROM customer_connections
        WHERE (client_id = $1 OR tailor_id = $1)
          AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(user.user_id)
    .bind(status.as_deref())
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Connections",
        ConnectionList { items },
        Some(Meta::empty()),
    ))
}

/// Only the receiving tailor decides, and only while the request is
/// still pending.
pub async fn update_connection_status(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateConnectionRequest,
) -> AppResult<ApiResponse<CustomerConnection>> {
    ensure_tailor(user)?;

    if !["accepted", "rejected"].contains(&payload.status.as_str()) {
        return Err(AppError::BadRequest(
            "Status must be 'accepted' or 'rejected'".into(),
        ));
    }

    let connection = sqlx::query_as::<_, CustomerConnection>(
        "SELECT * FROM customer_connections WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;

    if connection.tailor_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    if connection.status != "pending" {
        return Err(AppError::BadRequest(
            "Connection has already been resolved".into(),
        ));
    }

    let updated = sqlx::query_as::<_, CustomerConnection>(
        r#"
        UPDATE customer_connections
        SET status = $2, updated_at = now()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&payload.status)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::Conflict("Connection was resolved concurrently".into()))?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "connection_resolved",
        Some("customer_connections"),
        Some(serde_json::json!({ "connection_id": id, "status": payload.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Connection updated",
        updated,
        Some(Meta::empty()),
    ))
}
