use restaurante_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    models::UserRole,
    phone,
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    run_migrations(&pool).await?;

    let admin_phone = std::env::var("SEED_ADMIN_PHONE").unwrap_or_else(|_| "5500000000".into());
    let admin_password = std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());
    let admin_phone = phone::canonicalize(&admin_phone, &config.phone_country_code)?;

    let admin_id = ensure_user_with_role(
        &pool,
        "Administrador",
        &admin_phone,
        &admin_password,
        UserRole::Admin,
    )
    .await?;
    seed_menu(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    name: &str,
    phone: &str,
    password: &str,
    role: UserRole,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, phone, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (phone) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(phone)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    println!("Ensured user {phone} (role={})", role.as_str());
    Ok(user_id)
}

async fn seed_menu(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let menu: [(&str, &[(&str, &str, i64)]); 3] = [
        (
            "Tacos",
            &[
                ("Tacos al pastor", "Cerdo adobado con piña", 4500),
                ("Tacos de suadero", "Con cebolla y cilantro", 4200),
            ],
        ),
        (
            "Platos fuertes",
            &[
                ("Mole poblano", "Pollo en mole con arroz", 12000),
                ("Pozole rojo", "Maíz, cerdo y chile guajillo", 9500),
            ],
        ),
        (
            "Bebidas",
            &[
                ("Agua de horchata", "Vaso de 500 ml", 2500),
                ("Agua de jamaica", "Vaso de 500 ml", 2500),
            ],
        ),
    ];

    for (category, dishes) in menu {
        let (category_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO categories (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category)
        .fetch_one(pool)
        .await?;

        for &(name, description, price) in dishes {
            sqlx::query(
                r#"
                INSERT INTO dishes (id, name, description, price, category_id)
                SELECT $1, $2, $3, $4, $5
                WHERE NOT EXISTS (SELECT 1 FROM dishes WHERE name = $2)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(description)
            .bind(price)
            .bind(category_id)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded categories and dishes");
    Ok(())
}
