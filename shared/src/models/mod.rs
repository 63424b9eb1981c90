//! Domain models for orders and workers

pub mod order;
pub mod worker;

pub use order::{
    CreateOrderRequest, CreateOrderResponse, OrderItem, OrderStatus, OrderStatusEntry, OrderType,
    OrderTrackingResponse, format_order_number, order_total, priority_for_total,
};
pub use worker::{WorkerStatus, WorkerStatusResponse, effective_worker_status};
