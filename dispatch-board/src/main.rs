use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use dispatch_board::{
    BoardEvent, Config, DispatchBoard, MemoryOrderStore, ReceiptPrinter, init_logger_with_file,
    print_banner,
};
use shared::order::{Customer, Order, OrderItem, OrderStatus, OrderType};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration (.env + environment)
    let config = Config::from_env().context("invalid configuration")?;
    let _log_guard = init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    print_banner();
    tracing::info!("Dispatch board starting...");

    // 2. Order store, seeded from SEED_ORDERS or a small demo set
    let store = Arc::new(MemoryOrderStore::new());
    let establishment_id = std::env::var("ESTABLISHMENT_ID").unwrap_or_else(|_| "demo".into());
    let seed = match std::env::var("SEED_ORDERS") {
        Ok(path) => load_seed(Path::new(&path))?,
        Err(_) => demo_orders(&establishment_id),
    };
    tracing::info!(count = seed.len(), "Seeding order store");
    for order in seed {
        store.insert(order);
    }

    // 3. Board
    let printer = ReceiptPrinter::from_config(&config).context("invalid printer address")?;
    if printer.is_none() {
        tracing::warn!("No printer configured, receipts are preview-only");
    }
    let board: DispatchBoard = DispatchBoard::new(config, store, printer);
    board.alerts().arm_user_interaction();

    let mut events = board.events();
    board.open(&establishment_id, OrderType::Delivery).await;

    for bucket in &board.view().buckets {
        tracing::info!(status = %bucket.status, orders = bucket.orders.len(), "Bucket loaded");
    }

    // 4. Run until Ctrl+C
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = events.recv() => match received {
                Ok(event) => log_event(&event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event log lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    tracing::info!("Shutting down...");
    board.close().await;
    Ok(())
}

fn log_event(event: &BoardEvent) {
    match serde_json::to_string(event) {
        Ok(json) => tracing::debug!(event = event.name(), %json, "Board event"),
        Err(e) => tracing::warn!(event = event.name(), error = %e, "Board event not serialisable"),
    }
}

fn load_seed(path: &Path) -> anyhow::Result<Vec<Order>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read seed file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid seed file {}", path.display()))
}

fn demo_orders(establishment_id: &str) -> Vec<Order> {
    let now = Utc::now();
    let order = |id: &str, status: OrderStatus, minutes_ago: i64, phone: &str| Order {
        id: id.into(),
        establishment_id: establishment_id.into(),
        order_type: OrderType::Delivery,
        status,
        items: vec![OrderItem {
            name: "X-Burger".into(),
            quantity: 2,
            unit_price: 25.0,
            note: None,
            recipient_name: None,
            add_ons: vec![],
        }],
        customer: Customer {
            name: "Cliente Demo".into(),
            phone: Some(phone.into()),
            address: None,
        },
        payment_method: "pix".into(),
        change_for: None,
        table_number: None,
        pickup: true,
        delivery_fee: 0.0,
        coupon_discount: 0.0,
        coupon_code: None,
        subtotal: 50.0,
        total: 50.0,
        created_at: now - Duration::minutes(minutes_ago),
    };

    vec![
        order("a1b2c3d4", OrderStatus::Recebido, 12, "11987654321"),
        order("b2c3d4e5", OrderStatus::Preparo, 25, "11912345678"),
        order("c3d4e5f6", OrderStatus::EmEntrega, 40, "21998765432"),
        order("d4e5f6a7", OrderStatus::Finalizado, 5, "31988887777"),
    ]
}
