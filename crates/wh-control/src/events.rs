//! Order lifecycle events published by the fulfillment controller.

use wh_core::{ItemId, OrderId, PodId, StationId};
use wh_sim::{Event, EventKind};

use crate::Order;

pub fn order_created(time: f64, order: &Order) -> Event {
    let e = Event::new(EventKind::OrderCreated, time)
        .with("order", order.id)
        .with("lines", order.line_count())
        .with("items", order.total_items())
        .with("priority", order.priority);
    match order.station {
        Some(s) => e.with("station", s),
        None => e,
    }
}

pub fn item_picked(time: f64, order: OrderId, station: StationId, pod: PodId, item: ItemId, count: u32) -> Event {
    Event::new(EventKind::ItemPicked, time)
        .with("order", order)
        .with("station", station)
        .with("pod", pod)
        .with("item", item)
        .with("count", count)
}

/// `order` must have its completion time set.
pub fn order_completed(time: f64, order: &Order, station: StationId) -> Event {
    Event::new(EventKind::OrderCompleted, time)
        .with("order", order.id)
        .with("station", station)
        .with("items", order.total_items())
        .with("processing_time", order.processing_time().unwrap_or(0.0))
}
