use crate::{
    audit::log_audit,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::AppSettings,
    response::{ApiResponse, Meta},
    routes::settings::UpdateSettingsRequest,
    state::AppState,
};

const SETTINGS_ID: &str = "global";

/// Read the singleton settings row, creating it with defaults on first
/// access. Anyone authenticated can read.
pub async fn get_settings(state: &AppState) -> AppResult<ApiResponse<AppSettings>> {
    let existing: Option<AppSettings> =
        sqlx::query_as("SELECT * FROM app_settings WHERE id = $1")
            .bind(SETTINGS_ID)
            .fetch_optional(&state.pool)
            .await?;

    let settings = match existing {
        Some(settings) => settings,
        None => {
            sqlx::query("INSERT INTO app_settings (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
                .bind(SETTINGS_ID)
                .execute(&state.pool)
                .await?;
            sqlx::query_as("SELECT * FROM app_settings WHERE id = $1")
                .bind(SETTINGS_ID)
                .fetch_one(&state.pool)
                .await?
        }
    };

    Ok(ApiResponse::success("Settings", settings, Some(Meta::empty())))
}

/// Admin-only partial update, guarded by the row version.
pub async fn update_settings(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSettingsRequest,
) -> AppResult<ApiResponse<AppSettings>> {
    ensure_admin(user)?;

    if let Some(position) = payload.currency_position.as_deref() {
        if position != "before" && position != "after" {
            return Err(AppError::BadRequest(
                "currency_position must be 'before' or 'after'".into(),
            ));
        }
    }

    // Materialize the row first so the CAS update always has a target.
    sqlx::query("INSERT INTO app_settings (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(SETTINGS_ID)
        .execute(&state.pool)
        .await?;
    let current: AppSettings = sqlx::query_as("SELECT * FROM app_settings WHERE id = $1")
        .bind(SETTINGS_ID)
        .fetch_one(&state.pool)
        .await?;
    let expected = payload.expected_version.unwrap_or(current.version);

    let updated: Option<AppSettings> = sqlx::query_as(
        r#"
        UPDATE app_settings SET
            currency_code = COALESCE($1, currency_code),
            currency_symbol = COALESCE($2, currency_symbol),
            currency_position = COALESCE($3, currency_position),
            company_name = COALESCE($4, company_name),
            contact_email = COALESCE($5, contact_email),
            contact_phone = COALESCE($6, contact_phone),
            logo_url = COALESCE($7, logo_url),
            primary_color = COALESCE($8, primary_color),
            secondary_color = COALESCE($9, secondary_color),
            version = version + 1,
            updated_at = now(),
            updated_by = $10
        WHERE id = $11 AND version = $12
        RETURNING *
        "#,
    )
    .bind(payload.currency_code)
    .bind(payload.currency_symbol)
    .bind(payload.currency_position)
    .bind(payload.company_name)
    .bind(payload.contact_email)
    .bind(payload.contact_phone)
    .bind(payload.logo_url)
    .bind(payload.primary_color)
    .bind(payload.secondary_color)
    .bind(user.user_id)
    .bind(SETTINGS_ID)
    .bind(expected)
    .fetch_optional(&state.pool)
    .await?;

    let settings = updated.ok_or_else(|| {
        AppError::Conflict("Settings were modified concurrently; re-read and retry".into())
    })?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "settings_updated",
        Some("app_settings"),
        Some(serde_json::json!({ "version": settings.version })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Settings updated",
        settings,
        Some(Meta::empty()),
    ))
}
