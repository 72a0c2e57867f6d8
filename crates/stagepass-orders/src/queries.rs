//! Read-side queries over the order store.

use stagepass_core::error::OrderError;
use stagepass_core::model::{Order, OrderStatistics};
use stagepass_core::store::OrderStore;

use crate::views::{OrderResponse, PaginatedOrders, Pagination, TicketResponse};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Upper bound a caller-supplied page size is clamped to.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Fetches one order with its tickets.
///
/// # Errors
///
/// Fails with `NotFound` for an unknown order id.
pub async fn get_order(store: &dyn OrderStore, order_id: i64) -> Result<OrderResponse, OrderError> {
    let order = store
        .find_order(order_id)
        .await?
        .ok_or_else(|| OrderError::NotFound(format!("order {order_id} not found")))?;
    with_tickets(store, order).await
}

/// Fetches all orders of a user, tickets included.
pub async fn orders_for_user(
    store: &dyn OrderStore,
    user_id: i64,
) -> Result<Vec<OrderResponse>, OrderError> {
    let orders = store.find_orders_by_user(user_id).await?;
    collect_with_tickets(store, orders).await
}

/// Fetches all orders of an event, tickets included.
pub async fn orders_for_event(
    store: &dyn OrderStore,
    event_id: i64,
) -> Result<Vec<OrderResponse>, OrderError> {
    let orders = store.find_orders_by_event(event_id).await?;
    collect_with_tickets(store, orders).await
}

/// Lists orders page by page. `page` clamps to at least 1 and `page_size`
/// to 1..=100, defaulting to 50.
pub async fn list_orders(
    store: &dyn OrderStore,
    page: Option<u32>,
    page_size: Option<u32>,
) -> Result<PaginatedOrders, OrderError> {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let order_page = store.list_orders(page, page_size).await?;
    let total_items = order_page.total;
    let data = collect_with_tickets(store, order_page.orders).await?;

    Ok(PaginatedOrders {
        data,
        pagination: Pagination {
            page,
            page_size,
            total_items,
            total_pages: total_items.div_ceil(u64::from(page_size)),
        },
    })
}

/// Aggregate order counts and revenue.
pub async fn statistics(store: &dyn OrderStore) -> Result<OrderStatistics, OrderError> {
    Ok(store.order_statistics().await?)
}

/// Fetches one ticket.
///
/// # Errors
///
/// Fails with `NotFound` for an unknown ticket id.
pub async fn get_ticket(
    store: &dyn OrderStore,
    ticket_id: i64,
) -> Result<TicketResponse, OrderError> {
    let ticket = store
        .find_ticket(ticket_id)
        .await?
        .ok_or_else(|| OrderError::NotFound(format!("ticket {ticket_id} not found")))?;
    Ok(TicketResponse::from(ticket))
}

/// Fetches all tickets of an order.
pub async fn tickets_for_order(
    store: &dyn OrderStore,
    order_id: i64,
) -> Result<Vec<TicketResponse>, OrderError> {
    let tickets = store.find_tickets_by_order(order_id).await?;
    Ok(tickets.into_iter().map(TicketResponse::from).collect())
}

/// Fetches all tickets of an event.
pub async fn tickets_for_event(
    store: &dyn OrderStore,
    event_id: i64,
) -> Result<Vec<TicketResponse>, OrderError> {
    let tickets = store.find_tickets_by_event(event_id).await?;
    Ok(tickets.into_iter().map(TicketResponse::from).collect())
}

async fn with_tickets(store: &dyn OrderStore, order: Order) -> Result<OrderResponse, OrderError> {
    let tickets = store.find_tickets_by_order(order.order_id).await?;
    Ok(OrderResponse::from_parts(order, tickets))
}

async fn collect_with_tickets(
    store: &dyn OrderStore,
    orders: Vec<Order>,
) -> Result<Vec<OrderResponse>, OrderError> {
    let mut responses = Vec::with_capacity(orders.len());
    for order in orders {
        responses.push(with_tickets(store, order).await?);
    }
    Ok(responses)
}
