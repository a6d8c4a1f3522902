use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::order_status::{Actor, OrderStatus},
    dto::orders::{
        ApplyActionRequest, CreateOrderRequest, OrderList, UpdateClientOrderRequest,
        UpdateOrderDetailsRequest,
    },
    entity::orders::{
        ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{ROLE_CLIENT, ROLE_TAILOR, AuthUser, ensure_client},
    models::Order,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_client(user)?;

    let tailor: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE id = $1 AND role = 'tailor'")
            .bind(payload.tailor_id)
            .fetch_optional(&state.pool)
            .await?;
    if tailor.is_none() {
        return Err(AppError::BadRequest("Unknown tailor".into()));
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        client_id: Set(user.user_id),
        tailor_id: Set(payload.tailor_id),
        design_id: Set(payload.design_id),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        description: Set(payload.description),
        measurements: Set(serde_json::to_value(&payload.measurements)
            .map_err(|e| AppError::Internal(e.into()))?),
        price: Set(0),
        down_payment: Set(None),
        estimated_completion_date: Set(None),
        attachments: Set(serde_json::to_value(&payload.attachments)
            .map_err(|e| AppError::Internal(e.into()))?),
        notes: Set(None),
        client_notes: Set(None),
        payment_received: Set(false),
        payment_amount: Set(None),
        payment_date: Set(None),
        payment_note: Set(None),
        version: Set(1),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_created",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let side = match user.role.as_str() {
        ROLE_CLIENT => OrderCol::ClientId.eq(user.user_id),
        ROLE_TAILOR => OrderCol::TailorId.eq(user.user_id),
        _ => return Err(AppError::Forbidden),
    };
    let mut condition = Condition::all().add(side);
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        // Reject unknown status strings instead of silently matching nothing.
        let status = status
            .parse::<OrderStatus>()
            .map_err(AppError::BadRequest)?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let order = find_visible(state, user, id).await?;
    Ok(ApiResponse::success(
        "OK",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

/// Apply a lifecycle action. The successor state comes from the single
/// transition table; the write is a compare-and-swap on `version`.
pub async fn apply_action(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ApplyActionRequest,
) -> AppResult<ApiResponse<Order>> {
    let order = find_visible(state, user, id).await?;
    let actor = actor_for(user, &order)?;

    let current = order
        .status
        .parse::<OrderStatus>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    let next = OrderStatus::next(current, actor, payload.action)
        .map_err(|e| AppError::InvalidTransition(e.to_string()))?;

    let notes = append_note(order.notes.clone(), payload.note.as_deref());
    let expected_version = payload.expected_version.unwrap_or(order.version);

    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(next.as_str()))
        .col_expr(OrderCol::Notes, Expr::value(notes))
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(OrderCol::Version, Expr::col(OrderCol::Version).add(1))
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::Version.eq(expected_version)),
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
        "order_status",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": id,
            "from": current.as_str(),
            "to": next.as_str(),
            "action": payload.action.to_string(),
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let updated = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Status updated",
        order_from_entity(updated)?,
        Some(Meta::empty()),
    ))
}

/// Tailor-side detail update: quote, schedule, notes, measurements merge.
pub async fn update_details(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderDetailsRequest,
) -> AppResult<ApiResponse<Order>> {
    let order = find_visible(state, user, id).await?;
    if actor_for(user, &order)? != Actor::Tailor {
        return Err(AppError::Forbidden);
    }

    let expected_version = payload.expected_version.unwrap_or(order.version);
    let mut update = Orders::update_many()
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(OrderCol::Version, Expr::col(OrderCol::Version).add(1));

    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("Price cannot be negative".into()));
        }
        update = update.col_expr(OrderCol::Price, Expr::value(price));
    }
    if let Some(down_payment) = payload.down_payment {
        update = update.col_expr(OrderCol::DownPayment, Expr::value(down_payment));
    }
    if let Some(date) = payload.estimated_completion_date {
        update = update.col_expr(OrderCol::EstimatedCompletionDate, Expr::value(date));
    }
    if let Some(measurements) = payload.measurements.as_ref() {
        let merged = merge_measurements(&order.measurements, measurements)?;
        update = update.col_expr(OrderCol::Measurements, Expr::value(merged));
    }
    if let Some(attachments) = payload.attachments.as_ref() {
        let value = serde_json::to_value(attachments).map_err(|e| AppError::Internal(e.into()))?;
        update = update.col_expr(OrderCol::Attachments, Expr::value(value));
    }
    if let Some(notes) = payload.notes {
        update = update.col_expr(OrderCol::Notes, Expr::value(Some(notes)));
    }

    cas_exec(state, update, id, expected_version).await?;
    fetch_updated(state, user, id, "Order updated").await
}

/// Client-side update: description, measurements merge, client notes.
pub async fn update_client_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateClientOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let order = find_visible(state, user, id).await?;
    if actor_for(user, &order)? != Actor::Client {
        return Err(AppError::Forbidden);
    }

    let expected_version = payload.expected_version.unwrap_or(order.version);
    let mut update = Orders::update_many()
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(OrderCol::Version, Expr::col(OrderCol::Version).add(1));

    if let Some(description) = payload.description {
        update = update.col_expr(OrderCol::Description, Expr::value(description));
    }
    if let Some(measurements) = payload.measurements.as_ref() {
        let merged = merge_measurements(&order.measurements, measurements)?;
        update = update.col_expr(OrderCol::Measurements, Expr::value(merged));
    }
    if let Some(client_notes) = payload.client_notes {
        update = update.col_expr(OrderCol::ClientNotes, Expr::value(Some(client_notes)));
    }

    cas_exec(state, update, id, expected_version).await?;
    fetch_updated(state, user, id, "Order updated").await
}

pub async fn add_attachment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    url: String,
) -> AppResult<ApiResponse<Order>> {
    let order = find_visible(state, user, id).await?;
    actor_for(user, &order)?;

    let mut attachments: Vec<String> =
        serde_json::from_value(order.attachments.clone()).unwrap_or_default();
    attachments.push(url);
    write_attachments(state, user, id, order.version, attachments).await
}

pub async fn remove_attachment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    url: String,
) -> AppResult<ApiResponse<Order>> {
    let order = find_visible(state, user, id).await?;
    actor_for(user, &order)?;

    let mut attachments: Vec<String> =
        serde_json::from_value(order.attachments.clone()).unwrap_or_default();
    attachments.retain(|u| u != &url);
    write_attachments(state, user, id, order.version, attachments).await
}

async fn write_attachments(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    expected_version: i64,
    attachments: Vec<String>,
) -> AppResult<ApiResponse<Order>> {
    let value = serde_json::to_value(&attachments).map_err(|e| AppError::Internal(e.into()))?;
    let update = Orders::update_many()
        .col_expr(OrderCol::Attachments, Expr::value(value))
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(OrderCol::Version, Expr::col(OrderCol::Version).add(1));

    cas_exec(state, update, id, expected_version).await?;
    fetch_updated(state, user, id, "Attachments updated").await
}

async fn cas_exec(
    state: &AppState,
    update: sea_orm::UpdateMany<Orders>,
    id: Uuid,
    expected_version: i64,
) -> AppResult<()> {
    let result = update
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::Version.eq(expected_version)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Order was modified concurrently; re-read and retry".into(),
        ));
    }
    Ok(())
}

async fn fetch_updated(
    state: &AppState,
    _user: &AuthUser,
    id: Uuid,
    message: &str,
) -> AppResult<ApiResponse<Order>> {
    let updated = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        message,
        order_from_entity(updated)?,
        Some(Meta::empty()),
    ))
}

/// Fetch an order the caller is allowed to see: one of the two parties,
/// or an admin.
async fn find_visible(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<OrderModel> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let participant = order.client_id == user.user_id || order.tailor_id == user.user_id;
    if !participant && !user.is_admin() {
        return Err(AppError::NotFound);
    }
    Ok(order)
}

fn actor_for(user: &AuthUser, order: &OrderModel) -> AppResult<Actor> {
    if user.role == ROLE_CLIENT && order.client_id == user.user_id {
        Ok(Actor::Client)
    } else if user.role == ROLE_TAILOR && order.tailor_id == user.user_id {
        Ok(Actor::Tailor)
    } else {
        Err(AppError::Forbidden)
    }
}

/// Append `note` to the existing notes with a newline separator. A first
/// note must not introduce a leading separator; an empty or missing note
/// leaves the field untouched.
fn append_note(existing: Option<String>, note: Option<&str>) -> Option<String> {
    match note {
        None | Some("") => existing,
        Some(n) => Some(match existing.as_deref() {
            Some(prev) if !prev.is_empty() => format!("{prev}\n{n}"),
            _ => n.to_string(),
        }),
    }
}

fn merge_measurements(
    current: &serde_json::Value,
    update: &crate::models::OrderMeasurements,
) -> AppResult<serde_json::Value> {
    let mut merged: crate::models::OrderMeasurements =
        serde_json::from_value(current.clone()).unwrap_or_default();
    for (key, value) in update {
        merged.insert(key.clone(), *value);
    }
    serde_json::to_value(&merged).map_err(|e| AppError::Internal(e.into()))
}

pub fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    let status = model
        .status
        .parse::<OrderStatus>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(Order {
        id: model.id,
        client_id: model.client_id,
        tailor_id: model.tailor_id,
        design_id: model.design_id,
        status,
        description: model.description,
        measurements: serde_json::from_value(model.measurements).unwrap_or_default(),
        price: model.price,
        down_payment: model.down_payment,
        estimated_completion_date: model
            .estimated_completion_date
            .map(|dt| dt.with_timezone(&chrono::Utc)),
        attachments: serde_json::from_value(model.attachments).unwrap_or_default(),
        notes: model.notes,
        client_notes: model.client_notes,
        payment_received: model.payment_received,
        payment_amount: model.payment_amount,
        payment_date: model.payment_date.map(|dt| dt.with_timezone(&chrono::Utc)),
        payment_note: model.payment_note,
        version: model.version,
        created_at: model.created_at.with_timezone(&chrono::Utc),
        updated_at: model.updated_at.with_timezone(&chrono::Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::append_note;

    #[test]
    fn first_note_has_no_leading_separator() {
        assert_eq!(append_note(None, Some("measured")), Some("measured".into()));
        assert_eq!(
            append_note(Some(String::new()), Some("measured")),
            Some("measured".into())
        );
    }

    #[test]
    fn notes_accumulate_with_newlines() {
        assert_eq!(
            append_note(Some("first".into()), Some("second")),
            Some("first\nsecond".into())
        );
    }

    #[test]
    fn missing_note_leaves_notes_unchanged() {
        assert_eq!(append_note(Some("kept".into()), None), Some("kept".into()));
        assert_eq!(append_note(Some("kept".into()), Some("")), Some("kept".into()));
        assert_eq!(append_note(None, None), None);
    }
}
