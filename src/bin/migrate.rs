use restaurante_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, 1).await?;
    run_migrations(&pool).await?;
    println!("Migrations applied");
    Ok(())
}
