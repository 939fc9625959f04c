use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit,
    db::OrmConn,
    dto::orders::{
        CartLine, OrderList, OrderStatusResponse, OrderWithLines, SubmitOrderRequest,
        SubmitOrderResponse, UpdateOrderStatusRequest,
    },
    entity::{
        dishes::{Column as DishCol, Entity as Dishes},
        order_lines::{ActiveModel as OrderLineActive, Entity as OrderLines},
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult, missing_reference},
    media::{self, Upload},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderLine, OrderStatus, PaymentMethod, UserSummary},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    state::AppState,
};

/// Who an order belongs to: exactly one of a registered user or an anonymous reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderParty {
    User(Uuid),
    Anonymous(String),
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub party: OrderParty,
    pub payment_method: PaymentMethod,
    pub total: i64,
    pub receipt: Option<Upload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderLine {
    pub dish_id: Uuid,
    pub quantity: i32,
}

pub fn resolve_party(user: Option<&AuthUser>, client_ref: Option<&str>) -> AppResult<OrderParty> {
    let client_ref = client_ref.map(str::trim).filter(|r| !r.is_empty());
    match (user, client_ref) {
        (Some(user), None) => Ok(OrderParty::User(user.user_id)),
        (None, Some(reference)) => Ok(OrderParty::Anonymous(reference.to_string())),
        (Some(_), Some(_)) => Err(AppError::Validation(
            "Send either a bearer token or a client reference, not both".into(),
        )),
        (None, None) => Err(AppError::Validation(
            "An order needs a registered user or a client reference".into(),
        )),
    }
}

pub fn normalize_lines(cart: &[CartLine]) -> AppResult<Vec<NewOrderLine>> {
    if cart.is_empty() {
        return Err(AppError::Validation("Cart is empty".into()));
    }
    cart.iter()
        .map(|line| {
            let quantity = line.quantity.unwrap_or(1);
            if quantity < 1 {
                return Err(AppError::Validation(format!(
                    "Quantity for dish {} must be at least 1",
                    line.dish_id
                )));
            }
            Ok(NewOrderLine {
                dish_id: line.dish_id,
                quantity,
            })
        })
        .collect()
}

/// Sum of price × quantity; every dish must have a known price.
pub fn compute_total(lines: &[NewOrderLine], prices: &HashMap<Uuid, i64>) -> AppResult<i64> {
    lines.iter().try_fold(0_i64, |acc, line| {
        let price = prices
            .get(&line.dish_id)
            .ok_or_else(|| AppError::Validation(format!("Unknown dish {}", line.dish_id)))?;
        price
            .checked_mul(i64::from(line.quantity))
            .and_then(|subtotal| acc.checked_add(subtotal))
            .ok_or_else(|| AppError::Validation("Order total is too large".into()))
    })
}

/// Insert the header and its lines in one transaction. Nothing is visible
/// unless every statement succeeds.
pub async fn persist_order(
    orm: &OrmConn,
    order: NewOrder,
    lines: &[NewOrderLine],
) -> AppResult<OrderModel> {
    let (user_id, client_ref) = match order.party {
        OrderParty::User(id) => (Some(id), None),
        OrderParty::Anonymous(reference) => (None, Some(reference)),
    };
    let (receipt, receipt_mime) = match order.receipt {
        Some(upload) => (Some(upload.bytes), upload.mime),
        None => (None, None),
    };

    let txn = orm.begin().await?;

    let header = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        client_ref: Set(client_ref),
        payment_method: Set(order.payment_method.as_str().to_string()),
        total: Set(order.total),
        receipt: Set(receipt),
        receipt_mime: Set(receipt_mime),
        status: Set(OrderStatus::Pendiente.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|err| missing_reference(err, "User"))?;

    let rows = lines.iter().map(|line| OrderLineActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(header.id),
        dish_id: Set(line.dish_id),
        quantity: Set(line.quantity),
    });
    OrderLines::insert_many(rows)
        .exec(&txn)
        .await
        .map_err(|err| missing_reference(err, "Dish"))?;

    txn.commit().await?;
    Ok(header)
}

pub async fn submit_order(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: SubmitOrderRequest,
) -> AppResult<ApiResponse<SubmitOrderResponse>> {
    let cart = payload
        .cart
        .ok_or_else(|| AppError::Validation("Cart is empty".into()))?;
    let lines = normalize_lines(&cart)?;
    let total = payload
        .total
        .ok_or_else(|| AppError::Validation("total is required".into()))?;
    let payment_method: PaymentMethod = payload
        .payment_method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::Validation("payment_method is required".into()))?
        .parse()?;
    let party = resolve_party(user, payload.client_ref.as_deref())?;

    let receipt = match payload
        .receipt_base64
        .as_deref()
        .filter(|r| !r.trim().is_empty())
    {
        Some(encoded) => Some(media::decode_upload(encoded, payload.receipt_mime.as_deref())?),
        None => None,
    };
    if receipt.is_none() && state.config.receipt_required(payment_method.as_str()) {
        return Err(AppError::Validation(format!(
            "Payment method '{}' requires a receipt",
            payment_method.as_str()
        )));
    }
    if receipt.as_ref().is_some_and(|r| r.mime.is_none()) {
        return Err(AppError::Validation(
            "receipt_mime is required with a receipt".into(),
        ));
    }

    let dish_ids: Vec<Uuid> = lines.iter().map(|l| l.dish_id).collect();
    let prices: HashMap<Uuid, i64> = Dishes::find()
        .filter(DishCol::Id.is_in(dish_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|dish| (dish.id, dish.price))
        .collect();
    let expected = compute_total(&lines, &prices)?;
    if expected != total {
        return Err(AppError::Validation(format!(
            "total {total} does not match cart total {expected}"
        )));
    }

    let order = persist_order(
        &state.orm,
        NewOrder {
            party: party.clone(),
            payment_method,
            total,
            receipt,
        },
        &lines,
    )
    .await?;

    let summary = match &party {
        OrderParty::User(id) => Users::find_by_id(*id)
            .one(&state.orm)
            .await?
            .map(summary_from_entity),
        OrderParty::Anonymous(_) => None,
    };

    audit::record(
        &state.pool,
        user.map(|u| u.user_id),
        "order_submit",
        "orders",
        serde_json::json!({ "order_id": order.id, "lines": lines.len(), "total": total }),
    )
    .await;
    tracing::info!(order_id = %order.id, lines = lines.len(), total, "order submitted");

    Ok(ApiResponse::success(
        "Order created",
        SubmitOrderResponse {
            order_id: order.id,
            user: summary,
            client_ref: order.client_ref,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let orders = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut lines_by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for line in fetch_lines(state, &order_ids).await? {
        lines_by_order.entry(line.order_id).or_default().push(line);
    }

    let user_ids: Vec<Uuid> = orders.iter().filter_map(|o| o.user_id).collect();
    let users: HashMap<Uuid, UserSummary> = if user_ids.is_empty() {
        HashMap::new()
    } else {
        Users::find()
            .filter(UserCol::Id.is_in(user_ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|u| (u.id, summary_from_entity(u)))
            .collect()
    };

    let items: Vec<OrderWithLines> = orders
        .into_iter()
        .map(|order| {
            let lines = lines_by_order.remove(&order.id).unwrap_or_default();
            let owner = order.user_id.and_then(|id| users.get(&id).cloned());
            OrderWithLines {
                order: order_from_entity(order, owner),
                lines,
            }
        })
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Admins see every order; other callers only their own. Anything else is
/// reported as missing.
async fn find_visible_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<OrderModel> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;
    if !user.is_admin() && order.user_id != Some(user.user_id) {
        return Err(AppError::not_found("Order"));
    }
    Ok(order)
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let order = find_visible_order(state, user, id).await?;
    let lines = fetch_lines(state, &[order.id]).await?;
    let owner = match order.user_id {
        Some(user_id) => Users::find_by_id(user_id)
            .one(&state.orm)
            .await?
            .map(summary_from_entity),
        None => None,
    };

    Ok(ApiResponse::success(
        "Order found",
        OrderWithLines {
            order: order_from_entity(order, owner),
            lines,
        },
        Some(Meta::empty()),
    ))
}

/// Raw receipt bytes with the MIME type they were uploaded with.
pub async fn get_receipt(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<(String, Vec<u8>)> {
    let order = find_visible_order(state, user, id).await?;
    match (order.receipt_mime, order.receipt) {
        (Some(mime), Some(bytes)) if !bytes.is_empty() => Ok((mime, bytes)),
        _ => Err(AppError::not_found("Receipt")),
    }
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderStatusResponse>> {
    ensure_admin(user)?;
    let status: OrderStatus = payload.status.parse()?;

    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(status.as_str()))
        .filter(OrderCol::Id.eq(id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Order"));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": id, "status": status.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        OrderStatusResponse {
            id,
            status: status.as_str().to_string(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    // order_lines rows go with it (ON DELETE CASCADE)
    let result = Orders::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Order"));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Order deleted"))
}

async fn fetch_lines(state: &AppState, order_ids: &[Uuid]) -> AppResult<Vec<OrderLine>> {
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }
    let lines = sqlx::query_as::<_, OrderLine>(
        r#"
        SELECT ol.order_id, ol.dish_id, d.name AS dish_name, d.price, ol.quantity
        FROM order_lines ol
        JOIN dishes d ON d.id = ol.dish_id
        WHERE ol.order_id = ANY($1)
        ORDER BY d.name
        "#,
    )
    .bind(order_ids)
    .fetch_all(&state.pool)
    .await?;
    Ok(lines)
}

fn summary_from_entity(model: UserModel) -> UserSummary {
    UserSummary {
        id: model.id,
        name: model.name,
        phone: model.phone,
    }
}

fn order_from_entity(model: OrderModel, user: Option<UserSummary>) -> Order {
    let receipt = match (&model.receipt_mime, &model.receipt) {
        (Some(mime), Some(bytes)) => Some(media::data_url(mime, bytes)),
        _ => None,
    };
    Order {
        id: model.id,
        user,
        client_ref: model.client_ref,
        payment_method: model.payment_method,
        total: model.total,
        status: model.status,
        receipt,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
