//! Example: Wiring an Order Service Through the Mediator
//!
//! This example registers command handlers at startup, dispatches requests
//! to them, and shows how each kind of failure surfaces to the caller.
//!
//! Run with `cargo run --example order_service`.

use mediator::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

// =============================================================================
// REQUESTS AND RESULTS
// =============================================================================

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub sku: String,
    pub quantity: u32,
}

#[derive(Debug, Clone)]
pub struct OrderPlaced {
    pub order_id: u64,
    pub remaining: u32,
}

#[derive(Debug, Clone)]
pub struct Restock {
    pub sku: String,
    pub quantity: u32,
}

#[derive(Debug, Clone)]
pub struct StockLevel {
    pub sku: String,
}

/// Domain errors raised by the handlers.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("quantity must be positive")]
    ZeroQuantity,
    #[error("unknown sku: {0}")]
    UnknownSku(String),
    #[error("insufficient stock for {sku}: {available} available")]
    InsufficientStock { sku: String, available: u32 },
    #[error("warehouse name is not configured")]
    NoWarehouse,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Shared in-memory stock table.
#[derive(Debug, Default)]
pub struct Inventory {
    stock: RwLock<HashMap<String, u32>>,
}

/// Places orders against the inventory.
pub struct PlaceOrderHandler {
    warehouse: String,
    inventory: Arc<Inventory>,
    next_id: std::sync::atomic::AtomicU64,
}

#[async_trait]
impl CommandHandler<PlaceOrder, OrderPlaced> for PlaceOrderHandler {
    async fn execute(&self, _ctx: &Context, request: PlaceOrder) -> Result<OrderPlaced, BoxError> {
        let mut stock = self.inventory.stock.write().await;
        let available = stock
            .get_mut(&request.sku)
            .ok_or_else(|| InventoryError::UnknownSku(request.sku.clone()))?;
        if *available < request.quantity {
            return Err(Box::new(InventoryError::InsufficientStock {
                sku: request.sku,
                available: *available,
            }));
        }
        *available -= request.quantity;

        let order_id = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            + 1;
        Ok(OrderPlaced {
            order_id,
            remaining: *available,
        })
    }

    fn configuration_checker(&self) -> Option<&dyn ConfigurationChecker> {
        Some(self)
    }

    fn validator(&self) -> Option<&dyn Validator<PlaceOrder>> {
        Some(self)
    }
}

#[async_trait]
impl ConfigurationChecker for PlaceOrderHandler {
    async fn check_configuration(&self, _ctx: &Context) -> Result<(), BoxError> {
        if self.warehouse.is_empty() {
            return Err(Box::new(InventoryError::NoWarehouse));
        }
        Ok(())
    }
}

#[async_trait]
impl Validator<PlaceOrder> for PlaceOrderHandler {
    async fn validate(&self, _ctx: &Context, request: &PlaceOrder) -> Result<(), BoxError> {
        if request.quantity == 0 {
            return Err(Box::new(InventoryError::ZeroQuantity));
        }
        Ok(())
    }
}

// =============================================================================
// WIRING
// =============================================================================

async fn build_mediator(warehouse: &str, inventory: Arc<Inventory>) -> MediatorResult<Mediator> {
    let registry = Registry::with_config(RegistryConfig::new().with_name("orders").verbose())
        .map_err(ConfigurationError::new)?;
    let ctx = Context::background();

    let _ = registry
        .register(
            &ctx,
            PlaceOrderHandler {
                warehouse: warehouse.to_string(),
                inventory: inventory.clone(),
                next_id: Default::default(),
            },
        )
        .await?;

    let restock_inventory = inventory.clone();
    let _ = registry
        .register(
            &ctx,
            handler_fn(move |_ctx: Context, request: Restock| {
                let inventory = restock_inventory.clone();
                async move {
                    let mut stock = inventory.stock.write().await;
                    let level = stock.entry(request.sku).or_insert(0);
                    *level += request.quantity;
                    Ok::<_, BoxError>(*level)
                }
            }),
        )
        .await?;

    let _ = registry
        .register(
            &ctx,
            handler_fn(move |_ctx: Context, request: StockLevel| {
                let inventory = inventory.clone();
                async move {
                    let stock = inventory.stock.read().await;
                    Ok::<_, BoxError>(stock.get(&request.sku).copied().unwrap_or(0))
                }
            }),
        )
        .await?;

    Ok(Mediator::new(registry))
}

// =============================================================================
// MAIN - Usage demonstration
// =============================================================================

#[tokio::main]
async fn main() {
    println!("=== Mediator Order Service Example ===\n");

    // A handler with a failing configuration check is never registered
    match build_mediator("", Arc::default()).await {
        Ok(_) => println!("unexpected: misconfigured handler was registered"),
        Err(e) => println!("Startup rejected: {}", e),
    }

    let mediator = match build_mediator("north", Arc::default()).await {
        Ok(mediator) => mediator,
        Err(e) => {
            println!("Failed to start: {}", e);
            return;
        }
    };
    let ctx = Context::background();

    let restock = Restock {
        sku: "widget".to_string(),
        quantity: 5,
    };
    match mediator.execute::<_, u32>(&ctx, restock).await {
        Ok(level) => println!("Restocked widget, level now {}", level),
        Err(e) => println!("Restock failed: {}", e),
    }

    let orders = [("widget", 3), ("widget", 0), ("widget", 9), ("gizmo", 1)];
    for (sku, quantity) in orders {
        let request = PlaceOrder {
            sku: sku.to_string(),
            quantity,
        };
        match mediator.execute::<_, OrderPlaced>(&ctx, request).await {
            Ok(placed) => println!(
                "Order {} placed for {} x{} ({} left)",
                placed.order_id, sku, quantity, placed.remaining
            ),
            Err(e @ MediatorError::Validation(_)) => println!("Rejected order: {}", e),
            Err(e) => println!("Order failed: {}", e),
        }
    }

    // Asking for the wrong result type is a wiring bug, reported as such
    let level = StockLevel {
        sku: "widget".to_string(),
    };
    if let Err(e) = mediator.execute::<_, String>(&ctx, level).await {
        println!("Wiring error: {}", e);
    }

    // Nothing handles bool requests
    let (result, err) = mediator.execute_or_default::<_, u32>(&ctx, true).await;
    println!("Unhandled request returned {} with error: {:?}", result, err.map(|e| e.to_string()));

    println!("\n=== Registered Request Types ===");
    for request in mediator.registry().request_types() {
        println!("{}", request);
    }
}
