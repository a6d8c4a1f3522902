use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::payments::{
        CreatePaymentRequest, CreatePaymentResponse, OrderPaymentStatusResponse,
        SubscriptionStatusResponse, UpdateOrderPaymentStatusRequest, WebhookPayload,
        WebhookResponse,
    },
    entity::orders::{Column as OrderCol, Entity as Orders},
    entity::subscriptions::{
        ActiveModel as SubscriptionActive, Entity as Subscriptions, Model as SubscriptionModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_self_or_admin},
    models::{Subscription, SubscriptionPayment},
    paytech,
    plans::{SubscriptionPlan, find_plan},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Create a payment session for a plan. Free plans never touch the
/// payment provider: the subscription is activated on the spot.
pub async fn create_payment(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentRequest,
) -> AppResult<ApiResponse<CreatePaymentResponse>> {
    ensure_self_or_admin(user, payload.user_id)?;

    let plan = find_plan(&payload.plan_id).ok_or(AppError::NotFound)?;
    let now_ts = Utc::now().timestamp();

    if plan.price <= 0 {
        let payment_id = format!("free_{}_{}", now_ts, payload.user_id);
        upsert_subscription(state, payload.user_id, plan, Some(payment_id.clone()), "free")
            .await?;

        let response = CreatePaymentResponse {
            payment_id,
            redirect_url: payload
                .return_url
                .unwrap_or_else(|| "/dashboard".to_string()),
            status: "success".to_string(),
            message: "Abonnement gratuit activé avec succès".to_string(),
        };
        return Ok(ApiResponse::success(
            "Free plan activated",
            response,
            Some(Meta::empty()),
        ));
    }

    let payment_id = format!("pay_{}_{}", now_ts, payload.user_id);
    let ref_command = format!("SUB_{}_{}", payload.user_id, now_ts);

    record_pending_payment(state, &payment_id, &ref_command, payload.user_id, plan).await?;

    let base = &state.config.public_base_url;
    let session = paytech::create_session(
        &state.http,
        &state.config.paytech,
        &paytech::CreateSessionRequest {
            item_name: plan.name.to_string(),
            item_price: plan.price,
            currency: plan.currency.to_string(),
            ref_command: ref_command.clone(),
            command_name: format!("Abonnement {}", plan.name),
            success_url: payload
                .return_url
                .unwrap_or_else(|| format!("{base}/payment-success")),
            cancel_url: payload
                .cancel_url
                .unwrap_or_else(|| format!("{base}/payment-cancelled")),
            ipn_url: format!("{base}/routes/webhook"),
        },
    )
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(payload.user_id),
        "payment_session_created",
        Some("subscription_payments"),
        Some(serde_json::json!({ "payment_id": payment_id, "plan_id": plan.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let response = CreatePaymentResponse {
        payment_id,
        redirect_url: session.redirect_url,
        status: "success".to_string(),
        message: "Redirection vers la page de paiement".to_string(),
    };
    Ok(ApiResponse::success(
        "Payment session created",
        response,
        Some(Meta::empty()),
    ))
}

/// Record a pending payment row ahead of the provider session. Paytech
/// refs are second-granular, so a same-second retry collides on the
/// unique keys; report that as a conflict rather than a server error.
pub async fn record_pending_payment(
    state: &AppState,
    payment_id: &str,
    ref_command: &str,
    user_id: Uuid,
    plan: &SubscriptionPlan,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO subscription_payments
            (payment_id, user_id, plan_id, amount, currency, ref_command, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'pending')
        "#,
    )
    .bind(payment_id)
    .bind(user_id)
    .bind(plan.id)
    .bind(plan.price)
    .bind(plan.currency)
    .bind(ref_command)
    .execute(&state.pool)
    .await
    .map_err(|err| match err.as_database_error() {
        Some(db) if db.is_unique_violation() => AppError::Conflict(
            "A payment session was just created for this user; retry in a moment".into(),
        ),
        _ => AppError::DbError(err),
    })?;
    Ok(())
}

/// Paytech IPN handler: the only code path that activates a paid
/// subscription. Replays are idempotent.
pub async fn handle_webhook(
    state: &AppState,
    payload: WebhookPayload,
) -> AppResult<ApiResponse<WebhookResponse>> {
    let api_key = state
        .config
        .paytech
        .api_key
        .as_deref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("PAYTECH_API_KEY is not set")))?;
    let secret_key = state
        .config
        .paytech
        .secret_key
        .as_deref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("PAYTECH_SECRET_KEY is not set")))?;
    verify_webhook(api_key, secret_key, &payload)?;

    let payment: SubscriptionPayment =
        sqlx::query_as("SELECT * FROM subscription_payments WHERE ref_command = $1")
            .bind(&payload.ref_command)
            .fetch_optional(&state.pool)
            .await?
            .ok_or(AppError::NotFound)?;

    match payload.type_event.as_str() {
        "sale_complete" => {
            if payment.status != "completed" {
                sqlx::query(
                    "UPDATE subscription_payments SET status = 'completed', updated_at = now() WHERE payment_id = $1",
                )
                .bind(&payment.payment_id)
                .execute(&state.pool)
                .await?;

                let plan = find_plan(&payment.plan_id).ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!(
                        "payment references unknown plan {}",
                        payment.plan_id
                    ))
                })?;
                upsert_subscription(
                    state,
                    payment.user_id,
                    plan,
                    Some(payment.payment_id.clone()),
                    "paid",
                )
                .await?;

                if let Err(err) = log_audit(
                    &state.pool,
                    Some(payment.user_id),
                    "subscription_activated",
                    Some("subscriptions"),
                    Some(serde_json::json!({
                        "payment_id": payment.payment_id,
                        "plan_id": payment.plan_id,
                    })),
                )
                .await
                {
                    tracing::warn!(error = %err, "audit log failed");
                }
            }
        }
        "sale_canceled" => {
            if payment.status == "pending" {
                sqlx::query(
                    "UPDATE subscription_payments SET status = 'cancelled', updated_at = now() WHERE payment_id = $1",
                )
                .bind(&payment.payment_id)
                .execute(&state.pool)
                .await?;
            }
        }
        other => {
            tracing::info!(event = other, ref_command = %payload.ref_command, "ignoring webhook event");
        }
    }

    Ok(ApiResponse::success(
        "Webhook processed",
        WebhookResponse {
            status: "success".to_string(),
        },
        Some(Meta::empty()),
    ))
}

/// Current subscription for a user; absent rows materialize as the
/// implicit free plan.
pub async fn subscription_status(
    state: &AppState,
    user: &AuthUser,
    user_id: Uuid,
) -> AppResult<ApiResponse<SubscriptionStatusResponse>> {
    ensure_self_or_admin(user, user_id)?;

    let existing = Subscriptions::find_by_id(user_id).one(&state.orm).await?;
    let subscription = match existing {
        Some(model) => subscription_from_entity(model),
        None => {
            let plan = find_plan("free")
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("free plan missing")))?;
            upsert_subscription(state, user_id, plan, None, "free").await?
        }
    };

    Ok(ApiResponse::success(
        "Subscription",
        SubscriptionStatusResponse {
            user_id: subscription.user_id,
            plan_id: subscription.plan_id,
            active: subscription.active,
            start_date: subscription.start_date,
            expiry_date: subscription.expiry_date,
            payment_status: subscription.payment_status,
            auto_renew: subscription.auto_renew,
        },
        Some(Meta::empty()),
    ))
}

/// Tailor marks a manual (out-of-band) payment as received or not.
pub async fn update_order_payment_status(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateOrderPaymentStatusRequest,
) -> AppResult<ApiResponse<OrderPaymentStatusResponse>> {
    let order = Orders::find_by_id(payload.order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.tailor_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    if order.client_id != payload.client_id || order.tailor_id != payload.tailor_id {
        return Err(AppError::BadRequest(
            "Order does not match the given client/tailor pair".into(),
        ));
    }
    if payload.payment_amount < 0 {
        return Err(AppError::BadRequest("Amount cannot be negative".into()));
    }

    let payment_date = payload.payment_received.then(Utc::now);

    let result = Orders::update_many()
        .col_expr(
            OrderCol::PaymentReceived,
            Expr::value(payload.payment_received),
        )
        .col_expr(
            OrderCol::PaymentAmount,
            Expr::value(Some(payload.payment_amount)),
        )
        .col_expr(OrderCol::PaymentDate, Expr::value(payment_date))
        .col_expr(
            OrderCol::PaymentNote,
            Expr::value(payload.payment_note.clone()),
        )
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(OrderCol::Version, Expr::col(OrderCol::Version).add(1))
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(payload.order_id))
                .add(OrderCol::Version.eq(order.version)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Order was modified concurrently; re-read and retry".into(),
        ));
    }

    Ok(ApiResponse::success(
        "Payment status updated",
        OrderPaymentStatusResponse {
            order_id: payload.order_id,
            status: "success".to_string(),
            client_id: payload.client_id,
            tailor_id: payload.tailor_id,
            payment_received: payload.payment_received,
            payment_amount: Some(payload.payment_amount),
            payment_date,
            payment_note: payload.payment_note,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_order_payment_status(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    client_id: Uuid,
    tailor_id: Uuid,
) -> AppResult<ApiResponse<OrderPaymentStatusResponse>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(order_id))
                .add(OrderCol::ClientId.eq(client_id))
                .add(OrderCol::TailorId.eq(tailor_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let participant = order.client_id == user.user_id || order.tailor_id == user.user_id;
    if !participant && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    Ok(ApiResponse::success(
        "Payment status",
        OrderPaymentStatusResponse {
            order_id,
            status: "success".to_string(),
            client_id,
            tailor_id,
            payment_received: order.payment_received,
            payment_amount: order.payment_amount,
            payment_date: order.payment_date.map(|dt| dt.with_timezone(&Utc)),
            payment_note: order.payment_note,
        },
        Some(Meta::empty()),
    ))
}

/// Merge-style upsert of the single subscription row per user.
pub async fn upsert_subscription(
    state: &AppState,
    user_id: Uuid,
    plan: &SubscriptionPlan,
    payment_id: Option<String>,
    payment_status: &str,
) -> AppResult<Subscription> {
    let now = Utc::now();
    let expiry = now + Duration::days(plan.duration_days);

    let existing = Subscriptions::find_by_id(user_id).one(&state.orm).await?;
    let model = match existing {
        Some(model) => {
            let mut active: SubscriptionActive = model.into();
            active.plan_id = Set(plan.id.to_string());
            active.active = Set(true);
            active.start_date = Set(Some(now.into()));
            active.expiry_date = Set(Some(expiry.into()));
            active.payment_id = Set(payment_id);
            active.payment_status = Set(Some(payment_status.to_string()));
            active.version = Set(active.version.take().unwrap_or(1) + 1);
            active.updated_at = Set(now.into());
            active.update(&state.orm).await?
        }
        None => {
            SubscriptionActive {
                user_id: Set(user_id),
                plan_id: Set(plan.id.to_string()),
                active: Set(true),
                start_date: Set(Some(now.into())),
                expiry_date: Set(Some(expiry.into())),
                payment_id: Set(payment_id),
                payment_status: Set(Some(payment_status.to_string())),
                auto_renew: Set(false),
                version: Set(1),
                updated_at: Set(now.into()),
            }
            .insert(&state.orm)
            .await?
        }
    };

    Ok(subscription_from_entity(model))
}

pub fn subscription_from_entity(model: SubscriptionModel) -> Subscription {
    Subscription {
        user_id: model.user_id,
        plan_id: model.plan_id,
        active: model.active,
        start_date: model.start_date.map(|dt| dt.with_timezone(&Utc)),
        expiry_date: model.expiry_date.map(|dt| dt.with_timezone(&Utc)),
        payment_id: model.payment_id,
        payment_status: model.payment_status,
        auto_renew: model.auto_renew,
        version: model.version,
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

/// The IPN proves itself by echoing SHA-256 digests of the merchant
/// credentials.
fn verify_webhook(api_key: &str, secret_key: &str, payload: &WebhookPayload) -> AppResult<()> {
    let key_digest = hex::encode(Sha256::digest(api_key.as_bytes()));
    let secret_digest = hex::encode(Sha256::digest(secret_key.as_bytes()));

    if !payload.api_key_sha256.eq_ignore_ascii_case(&key_digest)
        || !payload.secret_sha256.eq_ignore_ascii_case(&secret_digest)
    {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(api_key_sha256: &str, secret_sha256: &str) -> WebhookPayload {
        WebhookPayload {
            type_event: "sale_complete".into(),
            ref_command: "SUB_test_1".into(),
            api_key_sha256: api_key_sha256.into(),
            secret_sha256: secret_sha256.into(),
            payment_method: None,
            item_price: None,
        }
    }

    fn digest(input: &str) -> String {
        hex::encode(Sha256::digest(input.as_bytes()))
    }

    #[test]
    fn accepts_matching_credential_digests() {
        let p = payload(&digest("key"), &digest("secret"));
        assert!(verify_webhook("key", "secret", &p).is_ok());
    }

    #[test]
    fn digest_comparison_ignores_hex_case() {
        let p = payload(
            &digest("key").to_uppercase(),
            &digest("secret").to_uppercase(),
        );
        assert!(verify_webhook("key", "secret", &p).is_ok());
    }

    #[test]
    fn rejects_wrong_api_key_digest() {
        let p = payload(&digest("wrong"), &digest("secret"));
        assert!(matches!(
            verify_webhook("key", "secret", &p),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn rejects_wrong_secret_digest() {
        let p = payload(&digest("key"), &digest("wrong"));
        assert!(matches!(
            verify_webhook("key", "secret", &p),
            Err(AppError::Forbidden)
        ));
    }
}
