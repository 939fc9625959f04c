use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        catalog::TopRatedList,
        ratings::{RatingList, SubmitRatingRequest},
    },
    entity::{
        dishes::Entity as Dishes,
        ratings::{ActiveModel as RatingActive, Column as RatingCol, Entity as Ratings},
    },
    error::{AppError, AppResult, is_unique_violation, missing_reference},
    media::{self, DEFAULT_IMAGE_MIME},
    middleware::auth::AuthUser,
    models::{Rating, TopRatedDish},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const MIN_STARS: i16 = 1;
pub const MAX_STARS: i16 = 5;
pub const MAX_TOP_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Half-up rounding onto the 1..=5 scale.
pub fn normalize_stars(raw: f64) -> AppResult<i16> {
    if !raw.is_finite() {
        return Err(AppError::Validation("stars must be a number".into()));
    }
    let rounded = raw.round();
    if rounded < f64::from(MIN_STARS) || rounded > f64::from(MAX_STARS) {
        return Err(AppError::Validation(format!(
            "stars must be between {MIN_STARS} and {MAX_STARS}"
        )));
    }
    Ok(rounded as i16)
}

pub fn format_average(average: Option<f64>) -> String {
    format!("{:.1}", average.unwrap_or(0.0))
}

pub fn clamp_limit(requested: Option<i64>, default: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, MAX_TOP_LIMIT)
}

/// Ranked dishes first, then distinct fillers until `limit` is reached.
pub fn pad_with_fillers(
    ranked: Vec<TopRatedDish>,
    fillers: Vec<TopRatedDish>,
    limit: usize,
) -> Vec<TopRatedDish> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    ranked
        .into_iter()
        .chain(fillers)
        .filter(|dish| seen.insert(dish.id))
        .take(limit)
        .collect()
}

#[derive(FromRow)]
struct TopRatedRow {
    id: Uuid,
    name: String,
    description: String,
    price: i64,
    image: Option<Vec<u8>>,
    average_rating: f64,
    rating_count: i64,
}

impl From<TopRatedRow> for TopRatedDish {
    fn from(row: TopRatedRow) -> Self {
        TopRatedDish {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            average_rating: (row.average_rating * 100.0).round() / 100.0,
            rating_count: row.rating_count,
            image: row
                .image
                .filter(|bytes| !bytes.is_empty())
                .map(|bytes| media::data_url(DEFAULT_IMAGE_MIME, &bytes)),
        }
    }
}

const RATING_SELECT: &str = r#"
    SELECT r.id, r.user_id, r.dish_id, r.stars, r.comment, r.rated_at,
           u.name AS user_name, d.name AS dish_name
    FROM ratings r
    JOIN users u ON u.id = r.user_id
    JOIN dishes d ON d.id = r.dish_id
"#;

async fn ensure_dish(state: &AppState, dish_id: Uuid) -> AppResult<()> {
    match Dishes::find_by_id(dish_id).one(&state.orm).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("Dish")),
    }
}

pub async fn submit_rating(
    state: &AppState,
    user: &AuthUser,
    dish_id: Uuid,
    payload: SubmitRatingRequest,
) -> AppResult<(UpsertOutcome, ApiResponse<Rating>)> {
    let raw = payload
        .stars
        .ok_or_else(|| AppError::Validation("stars is required".into()))?;
    ensure_dish(state, dish_id).await?;
    let stars = normalize_stars(raw)?;
    let comment = payload
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let txn = state.orm.begin().await?;

    let existing = Ratings::find()
        .filter(RatingCol::UserId.eq(user.user_id))
        .filter(RatingCol::DishId.eq(dish_id))
        .lock_exclusive()
        .one(&txn)
        .await?;

    let (outcome, rating_id) = match existing {
        Some(model) => {
            let id = model.id;
            let mut active: RatingActive = model.into();
            active.stars = Set(stars);
            active.comment = Set(comment);
            active.rated_at = Set(Utc::now().into());
            active.update(&txn).await?;
            (UpsertOutcome::Updated, id)
        }
        None => {
            let inserted = RatingActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                dish_id: Set(dish_id),
                stars: Set(stars),
                comment: Set(comment),
                rated_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    AppError::Duplicate("You already rated this dish".into())
                } else {
                    missing_reference(err, "User")
                }
            })?;
            (UpsertOutcome::Created, inserted.id)
        }
    };

    txn.commit().await?;

    let rating = sqlx::query_as::<_, Rating>(&format!("{RATING_SELECT} WHERE r.id = $1"))
        .bind(rating_id)
        .fetch_one(&state.pool)
        .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "rating_upsert",
        "ratings",
        serde_json::json!({ "rating_id": rating_id, "dish_id": dish_id, "stars": stars }),
    )
    .await;

    let message = match outcome {
        UpsertOutcome::Created => "Rating created",
        UpsertOutcome::Updated => "Rating updated",
    };
    Ok((outcome, ApiResponse::success(message, rating, Some(Meta::empty()))))
}

pub async fn list_ratings(state: &AppState, dish_id: Uuid) -> AppResult<ApiResponse<RatingList>> {
    ensure_dish(state, dish_id).await?;

    let ratings = sqlx::query_as::<_, Rating>(&format!(
        "{RATING_SELECT} WHERE r.dish_id = $1 ORDER BY r.rated_at DESC"
    ))
    .bind(dish_id)
    .fetch_all(&state.pool)
    .await?;

    let (average, count): (Option<f64>, i64) = sqlx::query_as(
        "SELECT AVG(stars)::float8, COUNT(*) FROM ratings WHERE dish_id = $1",
    )
    .bind(dish_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Ratings",
        RatingList {
            ratings,
            average: format_average(average),
            count,
        },
        Some(Meta::total(count.max(0) as usize)),
    ))
}

pub async fn delete_rating(
    state: &AppState,
    user: &AuthUser,
    rating_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    // Unknown ids are indistinguishable from someone else's rating.
    let owned: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM ratings WHERE id = $1 AND user_id = $2")
            .bind(rating_id)
            .bind(user.user_id)
            .fetch_optional(&state.pool)
            .await?;
    if owned.is_none() {
        return Err(AppError::Forbidden);
    }

    let result = Ratings::delete_many()
        .filter(RatingCol::Id.eq(rating_id))
        .filter(RatingCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Rating"));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "rating_delete",
        "ratings",
        serde_json::json!({ "rating_id": rating_id }),
    )
    .await;

    Ok(ApiResponse::done("Rating deleted"))
}

pub async fn top_rated_dishes(
    state: &AppState,
    limit: i64,
) -> AppResult<ApiResponse<TopRatedList>> {
    let limit = limit.clamp(1, MAX_TOP_LIMIT);

    let (rated,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ratings")
        .fetch_one(&state.pool)
        .await?;

    let items: Vec<TopRatedDish> = if rated == 0 {
        random_dishes(state, &[], limit).await?
    } else {
        let ranked: Vec<TopRatedDish> = sqlx::query_as::<_, TopRatedRow>(
            r#"
            SELECT d.id, d.name, d.description, d.price, d.image,
                   AVG(r.stars)::float8 AS average_rating,
                   COUNT(r.id) AS rating_count
            FROM dishes d
            JOIN ratings r ON r.dish_id = d.id
            GROUP BY d.id
            ORDER BY average_rating DESC, rating_count DESC, d.name
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&state.pool)
        .await?
        .into_iter()
        .map(TopRatedDish::from)
        .collect();

        let missing = limit - ranked.len() as i64;
        let fillers = if missing > 0 {
            let taken: Vec<Uuid> = ranked.iter().map(|d| d.id).collect();
            random_dishes(state, &taken, missing).await?
        } else {
            Vec::new()
        };
        pad_with_fillers(ranked, fillers, limit as usize)
    };

    tracing::debug!(limit, returned = items.len(), "top rated dishes");

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Top rated dishes", TopRatedList { items }, Some(meta)))
}

async fn random_dishes(
    state: &AppState,
    exclude: &[Uuid],
    limit: i64,
) -> AppResult<Vec<TopRatedDish>> {
    let rows = sqlx::query_as::<_, TopRatedRow>(
        r#"
        SELECT d.id, d.name, d.description, d.price, d.image,
               0::float8 AS average_rating,
               0::int8 AS rating_count
        FROM dishes d
        WHERE d.id <> ALL($1)
        ORDER BY RANDOM()
        LIMIT $2
        "#,
    )
    .bind(exclude)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;
    Ok(rows.into_iter().map(TopRatedDish::from).collect())
}
