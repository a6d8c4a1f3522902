use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use couture_fusion_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "admin").await?;
    let client_id = ensure_user(&pool, "client@example.com", "client123", "client").await?;
    let tailor_id = ensure_user(&pool, "tailor@example.com", "tailor123", "tailor").await?;
    seed_designs(&pool, tailor_id).await?;
    seed_settings(&pool).await?;

    println!("Seed completed. Admin: {admin_id}, Client: {client_id}, Tailor: {tailor_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };
    Ok(user_id)
}

async fn seed_designs(pool: &sqlx::PgPool, tailor_id: Uuid) -> anyhow::Result<()> {
    let count: (i64,) = sqlx::query_as("SELECT count(*) FROM designs WHERE tailor_id = $1")
        .bind(tailor_id)
        .fetch_one(pool)
        .await?;
    if count.0 > 0 {
        return Ok(());
    }

    let designs: [(&str, &str, i64); 3] = [
        ("Robe de soirée", "dress", 45000),
        ("Costume trois pièces", "suit", 85000),
        ("Boubou brodé", "traditional", 60000),
    ];
    for (name, category, price) in designs {
        sqlx::query(
            r#"
            INSERT INTO designs (id, tailor_id, name, description, category, images,
                                 price, estimated_days, is_public)
            VALUES ($1, $2, $3, '', $4, '{}', $5, 14, TRUE)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tailor_id)
        .bind(name)
        .bind(category)
        .bind(price)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_settings(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO app_settings (id, currency_code, currency_symbol, currency_position)
        VALUES ('global', 'XOF', 'FCFA', 'after')
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
