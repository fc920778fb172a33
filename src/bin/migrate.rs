use foodgram::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let orm = orm_from_pool(create_pool(&config.database_url).await?);
    run_migrations(&orm).await?;
    println!("Migrations applied");
    Ok(())
}
