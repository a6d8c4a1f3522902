use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ROLE_TAILOR, ensure_client, ensure_tailor},
    models::{ClientProfile, Measurements, TailorProfile, default_business_hours},
    response::{ApiResponse, Meta},
    routes::profiles::{ClientProfileRequest, TailorProfileList, TailorProfileRequest},
    routes::params::Pagination,
};

pub async fn get_client_profile(
    pool: &DbPool,
    user: &AuthUser,
    user_id: Uuid,
) -> AppResult<ApiResponse<ClientProfile>> {
    ensure_can_view_client(pool, user, user_id).await?;

    let profile = sqlx::query_as::<_, ClientProfile>(
        "SELECT * FROM client_profiles WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("Profile", profile, None))
}

pub async fn upsert_client_profile(
    pool: &DbPool,
    user: &AuthUser,
    payload: ClientProfileRequest,
) -> AppResult<ApiResponse<ClientProfile>> {
    ensure_client(user)?;
    let m = payload.measurements.unwrap_or_default();

    let profile = sqlx::query_as::<_, ClientProfile>(
        r#"
        INSERT INTO client_profiles (
            user_id, full_name, phone_number, address, notes, preferred_styles,
            chest, waist, hips, inseam, shoulder, sleeve, neck, thigh, calf, ankle,
            front_waist_length, back_waist_length, across_front, across_back,
            bust_point, armhole, wrist, rise_height
        )
        VALUES ($1, $2, $3, $4, $5, $6,
                $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20, $21, $22, $23, $24)
        ON CONFLICT (user_id) DO UPDATE SET
            full_name = EXCLUDED.full_name,
            phone_number = EXCLUDED.phone_number,
            address = EXCLUDED.address,
            notes = EXCLUDED.notes,
            preferred_styles = EXCLUDED.preferred_styles,
            chest = EXCLUDED.chest,
            waist = EXCLUDED.waist,
            hips = EXCLUDED.hips,
            inseam = EXCLUDED.inseam,
            shoulder = EXCLUDED.shoulder,
            sleeve = EXCLUDED.sleeve,
            neck = EXCLUDED.neck,
            thigh = EXCLUDED.thigh,
            calf = EXCLUDED.calf,
            ankle = EXCLUDED.ankle,
            front_waist_length = EXCLUDED.front_waist_length,
            back_waist_length = EXCLUDED.back_waist_length,
            across_front = EXCLUDED.across_front,
            across_back = EXCLUDED.across_back,
            bust_point = EXCLUDED.bust_point,
            armhole = EXCLUDED.armhole,
            wrist = EXCLUDED.wrist,
            rise_height = EXCLUDED.rise_height,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(payload.full_name)
    .bind(payload.phone_number)
    .bind(payload.address)
    .bind(payload.notes)
    .bind(payload.preferred_styles)
    .bind(m.chest)
    .bind(m.waist)
    .bind(m.hips)
    .bind(m.inseam)
    .bind(m.shoulder)
    .bind(m.sleeve)
    .bind(m.neck)
    .bind(m.thigh)
    .bind(m.calf)
    .bind(m.ankle)
    .bind(m.front_waist_length)
    .bind(m.back_waist_length)
    .bind(m.across_front)
    .bind(m.across_back)
    .bind(m.bust_point)
    .bind(m.armhole)
    .bind(m.wrist)
    .bind(m.rise_height)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success("Profile saved", profile, Some(Meta::empty())))
}

/// Merge a partial measurement update into the profile; a client with no
/// profile yet gets one created with empty personal info.
pub async fn update_measurements(
    pool: &DbPool,
    user: &AuthUser,
    update: Measurements,
) -> AppResult<ApiResponse<ClientProfile>> {
    ensure_client(user)?;

    let existing = sqlx::query_as::<_, ClientProfile>(
        "SELECT * FROM client_profiles WHERE user_id = $1",
    )
    .bind(user.user_id)
    .fetch_optional(pool)
    .await?;

    let merged = match &existing {
        Some(profile) => profile.measurements.merged_with(&update),
        None => Measurements::default().merged_with(&update),
    };

    let request = ClientProfileRequest {
        full_name: existing.as_ref().map(|p| p.full_name.clone()).unwrap_or_default(),
        phone_number: existing.as_ref().map(|p| p.phone_number.clone()).unwrap_or_default(),
        address: existing.as_ref().map(|p| p.address.clone()).unwrap_or_default(),
        notes: existing.as_ref().map(|p| p.notes.clone()).unwrap_or_default(),
        preferred_styles: existing.as_ref().map(|p| p.preferred_styles.clone()).unwrap_or_default(),
        measurements: Some(merged),
    };

    upsert_client_profile(pool, user, request).await
}

pub async fn get_tailor_profile(
    pool: &DbPool,
    user_id: Uuid,
) -> AppResult<ApiResponse<TailorProfile>> {
    let profile = sqlx::query_as::<_, TailorProfile>(
        "SELECT * FROM tailor_profiles WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("Profile", profile, None))
}

pub async fn upsert_tailor_profile(
    pool: &DbPool,
    user: &AuthUser,
    payload: TailorProfileRequest,
) -> AppResult<ApiResponse<TailorProfile>> {
    ensure_tailor(user)?;

    let license_type = payload.license_type.unwrap_or_else(|| "free".to_string());
    if !["free", "basic", "premium"].contains(&license_type.as_str()) {
        return Err(AppError::BadRequest("Unknown license type".into()));
    }
    let business_hours = payload.business_hours.unwrap_or_else(default_business_hours);
    let hours_json =
        serde_json::to_value(&business_hours).map_err(|e| AppError::Internal(e.into()))?;

    let profile = sqlx::query_as::<_, TailorProfile>(
        r#"
        INSERT INTO tailor_profiles (
            user_id, business_name, owner_name, phone_number, address, bio,
            specialties, years_of_experience, profile_picture_url, license_type,
            business_hours
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (user_id) DO UPDATE SET
            business_name = EXCLUDED.business_name,
            owner_name = EXCLUDED.owner_name,
            phone_number = EXCLUDED.phone_number,
            address = EXCLUDED.address,
            bio = EXCLUDED.bio,
            specialties = EXCLUDED.specialties,
            years_of_experience = EXCLUDED.years_of_experience,
            profile_picture_url = EXCLUDED.profile_picture_url,
            license_type = EXCLUDED.license_type,
            business_hours = EXCLUDED.business_hours,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(payload.business_name)
    .bind(payload.owner_name)
    .bind(payload.phone_number)
    .bind(payload.address)
    .bind(payload.bio)
    .bind(payload.specialties)
    .bind(payload.years_of_experience)
    .bind(payload.profile_picture_url)
    .bind(license_type)
    .bind(hours_json)
    .fetch_one(pool)
    .await?;

    Ok(ApiResponse::success("Profile saved", profile, Some(Meta::empty())))
}

/// Public tailor directory.
pub async fn list_tailors(
    pool: &DbPool,
    pagination: Pagination,
) -> AppResult<ApiResponse<TailorProfileList>> {
    let (page, limit, offset) = pagination.normalize();

    let items = sqlx::query_as::<_, TailorProfile>(
        "SELECT * FROM tailor_profiles ORDER BY business_name LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT count(*) FROM tailor_profiles")
        .fetch_one(pool)
        .await?;

    Ok(ApiResponse::success(
        "Tailors",
        TailorProfileList { items },
        Some(Meta::new(page, limit, total.0)),
    ))
}

/// A client profile is visible to its owner, admins, and any tailor who
/// has an order or accepted connection with the client.
async fn ensure_can_view_client(pool: &DbPool, user: &AuthUser, user_id: Uuid) -> AppResult<()> {
    if user.user_id == user_id || user.is_admin() {
        return Ok(());
    }
    if user.role == ROLE_TAILOR {
        let related: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM orders WHERE client_id = $1 AND tailor_id = $2
                UNION
                SELECT 1 FROM customer_connections
                WHERE client_id = $1 AND tailor_id = $2 AND status = 'accepted'
            )
            "#,
        )
        .bind(user_id)
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;
        if related.0 {
            return Ok(());
        }
    }
    Err(AppError::Forbidden)
}
