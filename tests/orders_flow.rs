mod common;

use std::sync::Arc;

use restaurante_api::{
    dto::orders::{CartLine, SubmitOrderRequest, UpdateOrderStatusRequest},
    error::AppError,
    models::{PaymentMethod, UserRole},
    routes::params::OrderListQuery,
    services::order_service::{self, NewOrder, NewOrderLine, OrderParty},
    sms::LogSms,
};
use uuid::Uuid;

fn line(dish_id: Uuid, quantity: i32) -> CartLine {
    CartLine {
        dish_id,
        quantity: Some(quantity),
    }
}

// Integration flow: client and anonymous checkout, then admin follow-up on the orders.
#[tokio::test]
async fn submit_list_update_and_delete_orders() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let _guard = common::db_lock().await;

    let state = common::setup_state(&database_url, Arc::new(LogSms)).await?;
    let admin = common::create_user(&state, UserRole::Admin, "+525500000000", "admin").await?;
    let client = common::create_user(&state, UserRole::Client, "+525512345678", "pw1").await?;
    let other = common::create_user(&state, UserRole::Client, "+525587654321", "pw2").await?;

    let tacos = common::create_category(&state, "Tacos").await?;
    let pastor = common::create_dish(&state, tacos, "Pastor", 4500).await?;
    let suadero = common::create_dish(&state, tacos, "Suadero", 4200).await?;
    let horchata = common::create_dish(&state, tacos, "Horchata", 2500).await?;

    // 2 x 4500 + 1 x 4200 + 3 x 2500
    let cart = vec![line(pastor, 2), line(suadero, 1), line(horchata, 3)];
    let submitted = order_service::submit_order(
        &state,
        Some(&client),
        SubmitOrderRequest {
            cart: Some(cart.clone()),
            total: Some(20700),
            payment_method: Some("transferencia".into()),
            receipt_base64: Some("aGVsbG8=".into()),
            receipt_mime: Some("image/png".into()),
            client_ref: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(submitted.user.as_ref().map(|u| u.id), Some(client.user_id));
    assert_eq!(common::count(&state, "orders").await?, 1);
    assert_eq!(common::count(&state, "order_lines").await?, 3);

    let anonymous = order_service::submit_order(
        &state,
        None,
        SubmitOrderRequest {
            cart: Some(vec![CartLine {
                dish_id: horchata,
                quantity: None,
            }]),
            total: Some(2500),
            payment_method: Some("local".into()),
            client_ref: Some("mesa-4".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert!(anonymous.user.is_none());
    assert_eq!(anonymous.client_ref.as_deref(), Some("mesa-4"));

    let mismatch = order_service::submit_order(
        &state,
        None,
        SubmitOrderRequest {
            cart: Some(cart.clone()),
            total: Some(100),
            payment_method: Some("local".into()),
            client_ref: Some("mesa-4".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(mismatch, AppError::Validation(_)));

    let no_receipt = order_service::submit_order(
        &state,
        Some(&client),
        SubmitOrderRequest {
            cart: Some(cart.clone()),
            total: Some(20700),
            payment_method: Some("transferencia".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(no_receipt, AppError::Validation(_)));

    let both_parties = order_service::submit_order(
        &state,
        Some(&client),
        SubmitOrderRequest {
            cart: Some(cart.clone()),
            total: Some(20700),
            payment_method: Some("local".into()),
            client_ref: Some("mesa-4".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(both_parties, AppError::Validation(_)));

    // A failing line insert leaves neither header nor lines behind.
    let orders_before = common::count(&state, "orders").await?;
    let lines_before = common::count(&state, "order_lines").await?;
    let failed = order_service::persist_order(
        &state.orm,
        NewOrder {
            party: OrderParty::Anonymous("mesa-9".into()),
            payment_method: PaymentMethod::Local,
            total: 4500,
            receipt: None,
        },
        &[
            NewOrderLine { dish_id: pastor, quantity: 1 },
            NewOrderLine { dish_id: Uuid::new_v4(), quantity: 1 },
        ],
    )
    .await;
    assert!(failed.is_err());
    assert_eq!(common::count(&state, "orders").await?, orders_before);
    assert_eq!(common::count(&state, "order_lines").await?, lines_before);

    let listed = order_service::list_orders(&state, &admin, OrderListQuery::default())
        .await?
        .data
        .unwrap();
    assert_eq!(listed.items.len(), 2);
    assert_eq!(listed.items[0].order.id, anonymous.order_id);
    let first = &listed.items[1];
    assert_eq!(first.order.id, submitted.order_id);
    assert_eq!(first.lines.len(), 3);
    assert_eq!(first.order.status, "pendiente");
    assert_eq!(
        first.order.receipt.as_deref(),
        Some("data:image/png;base64,aGVsbG8=")
    );

    let forbidden = order_service::list_orders(&state, &client, OrderListQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(forbidden, AppError::Forbidden));

    let own = order_service::get_order(&state, &client, submitted.order_id).await?;
    assert_eq!(own.data.unwrap().lines.len(), 3);
    let hidden = order_service::get_order(&state, &other, submitted.order_id)
        .await
        .unwrap_err();
    assert!(matches!(hidden, AppError::NotFound(_)));

    let (mime, bytes) = order_service::get_receipt(&state, &admin, submitted.order_id).await?;
    assert_eq!(mime, "image/png");
    assert_eq!(bytes, b"hello");
    let no_file = order_service::get_receipt(&state, &admin, anonymous.order_id)
        .await
        .unwrap_err();
    assert!(matches!(no_file, AppError::NotFound(_)));

    let updated = order_service::update_order_status(
        &state,
        &admin,
        submitted.order_id,
        UpdateOrderStatusRequest {
            status: "pagado".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.status, "en_proceso");

    let bad_status = order_service::update_order_status(
        &state,
        &admin,
        submitted.order_id,
        UpdateOrderStatusRequest {
            status: "enviado".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(bad_status, AppError::Validation(_)));

    let missing = order_service::update_order_status(
        &state,
        &admin,
        Uuid::new_v4(),
        UpdateOrderStatusRequest {
            status: "cancelado".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));

    let in_progress = order_service::list_orders(
        &state,
        &admin,
        OrderListQuery {
            status: Some("en_proceso".into()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(in_progress.items.len(), 1);

    order_service::delete_order(&state, &admin, submitted.order_id).await?;
    assert_eq!(common::count(&state, "orders").await?, 1);
    assert_eq!(common::count(&state, "order_lines").await?, 1);
    let gone = order_service::delete_order(&state, &admin, submitted.order_id)
        .await
        .unwrap_err();
    assert!(matches!(gone, AppError::NotFound(_)));

    Ok(())
}
