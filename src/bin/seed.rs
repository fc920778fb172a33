//! Loads reference data: an admin account, default tags and the ingredient
//! catalogue. Usage: `seed [path/to/ingredients.json]`.

use anyhow::Context;
use foodgram::{
    config::AppConfig,
    db::{DbPool, create_pool, orm_from_pool, run_migrations},
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
    services::{auth_service::hash_password, reference_service::slugify},
};
use serde::Deserialize;
use uuid::Uuid;

const DEFAULT_INGREDIENTS: &str = "data/ingredients.json";

#[derive(Deserialize)]
struct IngredientRecord {
    name: String,
    measurement_unit: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&orm_from_pool(pool.clone())).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@example.com", "admin-password", ROLE_ADMIN).await?;
    let user_id = ensure_user(&pool, "cook", "cook@example.com", "cook-password", ROLE_USER).await?;
    seed_tags(&pool).await?;

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_INGREDIENTS.to_string());
    let loaded = seed_ingredients(&pool, &path).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}, ingredients: {loaded}");
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, username, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(username)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {username} (role={role})");
    Ok(id)
}

async fn seed_tags(pool: &DbPool) -> anyhow::Result<()> {
    let tags = [
        ("Breakfast", "#E26C2D"),
        ("Lunch", "#49B64E"),
        ("Dinner", "#8775D2"),
    ];

    for (name, color) in tags {
        sqlx::query(
            r#"
            INSERT INTO tags (name, color, slug)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(color)
        .bind(slugify(name))
        .execute(pool)
        .await?;
    }

    println!("Seeded tags");
    Ok(())
}

async fn seed_ingredients(pool: &DbPool, path: &str) -> anyhow::Result<usize> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {path}"))?;
    let records: Vec<IngredientRecord> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;

    let mut inserted = 0;
    for record in &records {
        let result = sqlx::query(
            r#"
            INSERT INTO ingredients (name, measurement_unit)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(record.name.trim())
        .bind(record.measurement_unit.trim())
        .execute(pool)
        .await?;
        inserted += result.rows_affected() as usize;
    }

    println!("Seeded {inserted} of {} ingredients from {path}", records.len());
    Ok(inserted)
}
