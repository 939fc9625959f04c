mod common;

use std::sync::Arc;

use restaurante_api::{
    dto::{
        catalog::{CreateDishRequest, UpdateDishRequest},
        orders::{CartLine, SubmitOrderRequest},
        ratings::SubmitRatingRequest,
        users::{CreateUserRequest, UpdateUserRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::UserRole,
    services::{
        auth_service::verify_password, catalog_service, order_service, rating_service,
        user_service,
    },
    sms::LogSms,
    state::AppState,
};
use uuid::Uuid;

fn new_user(name: &str, phone: &str, password: &str) -> CreateUserRequest {
    CreateUserRequest {
        name: name.into(),
        phone: phone.into(),
        password: password.into(),
        role: "client".into(),
    }
}

fn new_dish(name: &str, price: i64, category_id: Uuid) -> CreateDishRequest {
    CreateDishRequest {
        name: name.into(),
        description: String::new(),
        price,
        category_id,
        image: None,
    }
}

fn local_order(dish_id: Uuid, total: i64, user: Option<&AuthUser>) -> SubmitOrderRequest {
    SubmitOrderRequest {
        cart: Some(vec![CartLine {
            dish_id,
            quantity: Some(1),
        }]),
        total: Some(total),
        payment_method: Some("local".into()),
        client_ref: user.is_none().then(|| "mesa-7".to_string()),
        ..Default::default()
    }
}

fn four_stars() -> SubmitRatingRequest {
    SubmitRatingRequest {
        stars: Some(4.0),
        comment: None,
    }
}

async fn password_hash(state: &AppState, id: Uuid) -> anyhow::Result<String> {
    let (hash,): (String,) = sqlx::query_as("SELECT password_hash FROM users WHERE id = $1")
        .bind(id)
        .fetch_one(&state.pool)
        .await?;
    Ok(hash)
}

#[tokio::test]
async fn admin_manages_users() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let _guard = common::db_lock().await;

    let state = common::setup_state(&database_url, Arc::new(LogSms)).await?;
    let admin = common::create_user(&state, UserRole::Admin, "+525500000000", "admin").await?;
    let client = common::create_user(&state, UserRole::Client, "+525512345678", "pw1").await?;

    let err = user_service::create_user(&state, &client, new_user("Eva", "5511112222", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let luis = user_service::create_user(&state, &admin, new_user("Luis", "55 8765 4321", "pw2"))
        .await?
        .data
        .unwrap();
    assert_eq!(luis.phone, "+525587654321");
    assert_eq!(luis.role, "client");

    let err = user_service::create_user(&state, &admin, new_user("Otro", "5587654321", "pw3"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Blank password leaves the stored hash alone.
    let before = password_hash(&state, luis.id).await?;
    let renamed = user_service::update_user(
        &state,
        &admin,
        luis.id,
        UpdateUserRequest {
            name: Some("Luis Ramírez".into()),
            password: Some("   ".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(renamed.name, "Luis Ramírez");
    assert_eq!(password_hash(&state, luis.id).await?, before);

    user_service::update_user(
        &state,
        &admin,
        luis.id,
        UpdateUserRequest {
            password: Some("nuevo".into()),
            ..Default::default()
        },
    )
    .await?;
    let after = password_hash(&state, luis.id).await?;
    assert_ne!(after, before);
    assert!(verify_password("nuevo", &after)?);
    assert!(!verify_password("pw2", &after)?);

    let err = user_service::update_user(
        &state,
        &admin,
        Uuid::new_v4(),
        UpdateUserRequest::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let listed = user_service::list_users(&state, &admin).await?.data.unwrap();
    assert_eq!(listed.items.len(), 3);

    // Deleting a user takes their orders and ratings along.
    let luis_auth = AuthUser {
        user_id: luis.id,
        phone: luis.phone.clone(),
        role: luis.role.clone(),
    };
    let category = common::create_category(&state, "Bebidas").await?;
    let agua = common::create_dish(&state, category, "Agua de jamaica", 3000).await?;
    let order = local_order(agua, 3000, Some(&luis_auth));
    order_service::submit_order(&state, Some(&luis_auth), order).await?;
    let order = local_order(agua, 3000, Some(&client));
    order_service::submit_order(&state, Some(&client), order).await?;
    rating_service::submit_rating(&state, &luis_auth, agua, four_stars()).await?;
    assert_eq!(common::count(&state, "orders").await?, 2);
    assert_eq!(common::count(&state, "ratings").await?, 1);

    user_service::delete_user(&state, &admin, luis.id).await?;
    assert_eq!(common::count(&state, "orders").await?, 1);
    assert_eq!(common::count(&state, "order_lines").await?, 1);
    assert_eq!(common::count(&state, "ratings").await?, 0);
    assert_eq!(common::count(&state, "users").await?, 2);

    let err = user_service::delete_user(&state, &admin, luis.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn admin_manages_the_catalog() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let _guard = common::db_lock().await;

    let state = common::setup_state(&database_url, Arc::new(LogSms)).await?;
    let admin = common::create_user(&state, UserRole::Admin, "+525500000000", "admin").await?;
    let client = common::create_user(&state, UserRole::Client, "+525512345678", "pw1").await?;
    let postres = common::create_category(&state, "Postres").await?;
    let sopas = common::create_category(&state, "Sopas").await?;

    let err = catalog_service::create_dish(&state, &admin, new_dish("Flan", 3500, Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = catalog_service::create_dish(&state, &client, new_dish("Flan", 3500, postres))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    let err = catalog_service::create_dish(&state, &admin, new_dish("Flan", 0, postres))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let flan = catalog_service::create_dish(&state, &admin, new_dish("Flan", 3500, postres))
        .await?
        .data
        .unwrap();
    assert_eq!(flan.category.id, postres);
    assert_eq!(flan.category.name, "Postres");
    let pozole = catalog_service::create_dish(&state, &admin, new_dish("Pozole", 9000, sopas))
        .await?
        .data
        .unwrap();

    let categories = catalog_service::list_categories(&state).await?.data.unwrap();
    let names: Vec<&str> = categories.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Postres", "Sopas"]);

    let dishes = catalog_service::list_dishes(&state).await?.data.unwrap();
    let ids: Vec<Uuid> = dishes.items.iter().map(|d| d.id).collect();
    assert_eq!(ids, [flan.id, pozole.id]);

    let in_sopas = catalog_service::list_dishes_by_category(&state, sopas)
        .await?
        .data
        .unwrap();
    assert_eq!(in_sopas.items.len(), 1);
    assert_eq!(in_sopas.items[0].name, "Pozole");
    let err = catalog_service::list_dishes_by_category(&state, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let updated = catalog_service::update_dish(
        &state,
        &admin,
        flan.id,
        UpdateDishRequest {
            price: Some(3800),
            category_id: Some(sopas),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.price, 3800);
    assert_eq!(updated.category.id, sopas);
    let err = catalog_service::update_dish(
        &state,
        &admin,
        flan.id,
        UpdateDishRequest {
            category_id: Some(Uuid::new_v4()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // An ordered dish cannot be removed.
    order_service::submit_order(&state, None, local_order(pozole.id, 9000, None)).await?;
    let err = catalog_service::delete_dish(&state, &admin, pozole.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(common::count(&state, "dishes").await?, 2);

    catalog_service::delete_dish(&state, &admin, flan.id).await?;
    let err = catalog_service::delete_dish(&state, &admin, flan.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn deleted_user_with_live_token_gets_not_found() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let _guard = common::db_lock().await;

    let state = common::setup_state(&database_url, Arc::new(LogSms)).await?;
    let admin = common::create_user(&state, UserRole::Admin, "+525500000000", "admin").await?;
    let stale = common::create_user(&state, UserRole::Client, "+525512345678", "pw1").await?;
    let category = common::create_category(&state, "Tortas").await?;
    let torta = common::create_dish(&state, category, "Torta ahogada", 6500).await?;

    user_service::delete_user(&state, &admin, stale.user_id).await?;

    let order = local_order(torta, 6500, Some(&stale));
    let err = order_service::submit_order(&state, Some(&stale), order)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
    assert_eq!(common::count(&state, "orders").await?, 0);
    assert_eq!(common::count(&state, "order_lines").await?, 0);

    let err = rating_service::submit_rating(&state, &stale, torta, four_stars())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
    assert_eq!(common::count(&state, "ratings").await?, 0);

    Ok(())
}
