use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::order_status::OrderStatus,
    dto::orders::OrderList,
    entity::orders::{Column as OrderCol, Entity as Orders},
    entity::subscriptions::{Column as SubCol, Entity as Subscriptions},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_CLIENT, ROLE_TAILOR, ensure_admin},
    models::{Subscription, User},
    response::{ApiResponse, Meta},
    routes::admin::{AdminCheckResponse, ForceOrderStatusRequest, SetRoleRequest, UserList},
    routes::params::{OrderListQuery, Pagination},
    services::order_service::order_from_entity,
    services::payment_service::subscription_from_entity,
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;

    let (page, limit, offset) = pagination.normalize();
    let users: Vec<User> = sqlx::query_as(
        "SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&state.pool)
        .await?;

    Ok(ApiResponse::success(
        "Users",
        UserList { items: users },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Promote or demote a user, addressed by email.
pub async fn set_role(
    state: &AppState,
    user: &AuthUser,
    payload: SetRoleRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;

    let role = payload.role.as_str();
    if role != ROLE_CLIENT && role != ROLE_TAILOR && role != ROLE_ADMIN {
        return Err(AppError::BadRequest(format!("Unknown role '{role}'")));
    }

    let updated: Option<User> = sqlx::query_as(
        "UPDATE users SET role = $1 WHERE email = $2 RETURNING *",
    )
    .bind(role)
    .bind(&payload.email)
    .fetch_optional(&state.pool)
    .await?;
    let target = updated.ok_or(AppError::NotFound)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "role_changed",
        Some("users"),
        Some(serde_json::json!({ "target": target.id, "role": role })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Role updated", target, Some(Meta::empty())))
}

pub async fn check_admin(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AdminCheckResponse>> {
    let is_admin: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND role = 'admin')")
            .bind(user.user_id)
            .fetch_one(&state.pool)
            .await?;

    Ok(ApiResponse::success(
        "Admin check",
        AdminCheckResponse {
            user_id: user.user_id,
            is_admin,
        },
        Some(Meta::empty()),
    ))
}

/// Every order in the system, regardless of participants.
pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;

    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status = status
            .parse::<OrderStatus>()
            .map_err(AppError::BadRequest)?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }
    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Moderation override: set an order status directly, skipping the
/// lifecycle table. Still version-guarded and audited.
pub async fn force_order_status(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: ForceOrderStatusRequest,
) -> AppResult<ApiResponse<crate::models::Order>> {
    ensure_admin(user)?;

    let status: OrderStatus = payload
        .status
        .parse()
        .map_err(AppError::BadRequest)?;

    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous = order.status.clone();
    let expected = payload.expected_version.unwrap_or(order.version);

    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(status.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(OrderCol::Version, Expr::col(OrderCol::Version).add(1))
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(order_id))
                .add(OrderCol::Version.eq(expected)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Order was modified concurrently; re-read and retry".into(),
        ));
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_forced",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order_id,
            "from": previous,
            "to": status.as_str(),
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let updated = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Order status updated",
        order_from_entity(updated)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_subscriptions(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<Vec<Subscription>>> {
    ensure_admin(user)?;

    let (page, limit, offset) = pagination.normalize();
    let finder = Subscriptions::find().order_by_desc(SubCol::UpdatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Subscriptions",
        models.into_iter().map(subscription_from_entity).collect(),
        Some(Meta::new(page, limit, total)),
    ))
}

/// Flip a subscription on or off without touching its dates.
pub async fn set_subscription_active(
    state: &AppState,
    user: &AuthUser,
    target: Uuid,
    active: bool,
) -> AppResult<ApiResponse<Subscription>> {
    ensure_admin(user)?;

    let existing = Subscriptions::find_by_id(target)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let result = Subscriptions::update_many()
        .col_expr(SubCol::Active, Expr::value(active))
        .col_expr(SubCol::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(SubCol::Version, Expr::col(SubCol::Version).add(1))
        .filter(
            Condition::all()
                .add(SubCol::UserId.eq(target))
                .add(SubCol::Version.eq(existing.version)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Subscription was modified concurrently; re-read and retry".into(),
        ));
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "subscription_toggled",
        Some("subscriptions"),
        Some(serde_json::json!({ "target": target, "active": active })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let updated = Subscriptions::find_by_id(target)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Subscription updated",
        subscription_from_entity(updated),
        Some(Meta::empty()),
    ))
}
