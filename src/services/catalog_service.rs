use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, EntityTrait, Set};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    dto::catalog::{CategoryList, CreateDishRequest, DishList, UpdateDishRequest},
    entity::{
        categories::Entity as Categories,
        dishes::{ActiveModel as DishActive, Entity as Dishes},
    },
    error::{AppError, AppResult},
    media,
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, CategoryRef, Dish},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    image: Option<Vec<u8>>,
}

#[derive(FromRow)]
struct DishRow {
    id: Uuid,
    name: String,
    description: String,
    price: i64,
    image: Option<Vec<u8>>,
    category_id: Uuid,
    category_name: String,
}

const DISH_SELECT: &str = r#"
    SELECT d.id, d.name, d.description, d.price, d.image, d.category_id,
           c.name AS category_name
    FROM dishes d
    JOIN categories c ON c.id = d.category_id
"#;

fn dish_from_row(row: DishRow) -> Dish {
    Dish {
        id: row.id,
        name: row.name,
        description: row.description,
        price: row.price,
        image: media::encode_opt(row.image.as_deref()),
        category: CategoryRef {
            id: row.category_id,
            name: row.category_name,
        },
    }
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let rows =
        sqlx::query_as::<_, CategoryRow>("SELECT id, name, image FROM categories ORDER BY name")
            .fetch_all(&state.pool)
            .await?;

    let items: Vec<Category> = rows
        .into_iter()
        .map(|row| Category {
            id: row.id,
            name: row.name,
            image: media::encode_opt(row.image.as_deref()),
        })
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Categories", CategoryList { items }, Some(meta)))
}

pub async fn list_dishes(state: &AppState) -> AppResult<ApiResponse<DishList>> {
    let rows = sqlx::query_as::<_, DishRow>(&format!("{DISH_SELECT} ORDER BY c.name, d.name"))
        .fetch_all(&state.pool)
        .await?;

    let items: Vec<Dish> = rows.into_iter().map(dish_from_row).collect();
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Dishes", DishList { items }, Some(meta)))
}

pub async fn list_dishes_by_category(
    state: &AppState,
    category_id: Uuid,
) -> AppResult<ApiResponse<DishList>> {
    if Categories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::not_found("Category"));
    }

    let rows = sqlx::query_as::<_, DishRow>(&format!(
        "{DISH_SELECT} WHERE d.category_id = $1 ORDER BY d.name"
    ))
    .bind(category_id)
    .fetch_all(&state.pool)
    .await?;

    tracing::debug!(%category_id, count = rows.len(), "dishes by category");

    let items: Vec<Dish> = rows.into_iter().map(dish_from_row).collect();
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Dishes", DishList { items }, Some(meta)))
}

async fn fetch_dish(state: &AppState, id: Uuid) -> AppResult<Dish> {
    sqlx::query_as::<_, DishRow>(&format!("{DISH_SELECT} WHERE d.id = $1"))
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .map(dish_from_row)
        .ok_or_else(|| AppError::not_found("Dish"))
}

fn validate_price(price: i64) -> AppResult<()> {
    if price <= 0 {
        return Err(AppError::Validation("price must be greater than 0".into()));
    }
    Ok(())
}

async fn ensure_category(state: &AppState, category_id: Uuid) -> AppResult<()> {
    match Categories::find_by_id(category_id).one(&state.orm).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Validation("Unknown category".into())),
    }
}

fn decode_image(image: Option<&str>) -> AppResult<Option<Vec<u8>>> {
    match image.map(str::trim).filter(|s| !s.is_empty()) {
        Some(payload) => Ok(Some(media::decode_upload(payload, None)?.bytes)),
        None => Ok(None),
    }
}

pub async fn create_dish(
    state: &AppState,
    user: &AuthUser,
    payload: CreateDishRequest,
) -> AppResult<ApiResponse<Dish>> {
    ensure_admin(user)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    validate_price(payload.price)?;
    ensure_category(state, payload.category_id).await?;
    let image = decode_image(payload.image.as_deref())?;

    let dish = DishActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price),
        image: Set(image),
        category_id: Set(payload.category_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "dish_create",
        "dishes",
        serde_json::json!({ "dish_id": dish.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Dish created",
        fetch_dish(state, dish.id).await?,
        Some(Meta::empty()),
    ))
}

pub async fn update_dish(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateDishRequest,
) -> AppResult<ApiResponse<Dish>> {
    ensure_admin(user)?;
    let existing = Dishes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Dish"))?;

    let mut active: DishActive = existing.into();
    if let Some(name) = payload.name.filter(|n| !n.trim().is_empty()) {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
        active.price = Set(price);
    }
    if let Some(category_id) = payload.category_id {
        ensure_category(state, category_id).await?;
        active.category_id = Set(category_id);
    }
    if let Some(image) = decode_image(payload.image.as_deref())? {
        active.image = Set(Some(image));
    }
    active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "dish_update",
        "dishes",
        serde_json::json!({ "dish_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Dish updated",
        fetch_dish(state, id).await?,
        Some(Meta::empty()),
    ))
}

pub async fn delete_dish(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Dishes::delete_by_id(id).exec(&state.orm).await.map_err(|err| {
        match err.sql_err() {
            Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(_)) => {
                AppError::Conflict("Dish is referenced by existing orders".into())
            }
            _ => AppError::OrmError(err),
        }
    })?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Dish"));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "dish_delete",
        "dishes",
        serde_json::json!({ "dish_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Dish deleted"))
}
