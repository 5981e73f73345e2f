//! Request payloads and response mappers.
//!
//! Domain documents serialize straight to JSON; the one mapper here is the
//! SKU view, which adds the derived `available` column. Identifiers arrive
//! as strings and are parsed in the handlers so a bad id never reaches a
//! service.

use serde::Deserialize;

use atelier_infra::SkuRecord;
use atelier_orders::{OrderStatus, PaymentStatus};
use atelier_production::ProductionStatus;

#[derive(Debug, Deserialize)]
pub struct RegisterSkuRequest {
    pub reference: String,
    pub color: String,
    pub size: String,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    /// Signed quantity; the sign picks the movement kind.
    pub delta: i64,
    pub note: Option<String>,
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiveStockRequest {
    pub quantity: i64,
    pub note: Option<String>,
    pub reference: Option<String>,
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MovementsQuery {
    pub sku_id: Option<String>,
    pub kind: Option<String>,
    pub reference: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub sku_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub items: Vec<OrderItemRequest>,
    pub note: Option<String>,
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetOrderStatusRequest {
    pub status: OrderStatus,
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetPaymentStatusRequest {
    pub status: PaymentStatus,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductionOrderRequest {
    pub sku_id: String,
    pub quantity: i64,
    pub assignee: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReopenProductionRequest {
    pub to: ProductionStatus,
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReturnItemRequest {
    pub sku_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateReturnRequest {
    pub order_id: String,
    pub items: Vec<ReturnItemRequest>,
    pub reason: String,
    pub note: Option<String>,
    pub actor: Option<String>,
}

/// SKU row plus the derived `available` quantity.
pub fn sku_to_json(record: &SkuRecord) -> serde_json::Value {
    serde_json::json!({
        "id": record.id,
        "reference": record.key.reference(),
        "color": record.key.color(),
        "size": record.key.size(),
        "physical": record.balances.physical,
        "reserved": record.balances.reserved,
        "available": record.balances.available(),
        "version": record.version,
        "created_at": record.created_at,
    })
}
