//! Flat row types written by the output backends.

use wh_sim::Event;

/// One event as a CSV row.  `data` joins the payload as `key=value` pairs
/// separated by `;`, in key order.
#[derive(Clone, Debug, PartialEq)]
pub struct EventRow {
    pub time:  f64,
    pub event: &'static str,
    pub data:  String,
}

impl From<&Event> for EventRow {
    fn from(e: &Event) -> Self {
        let data = e
            .payload
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(";");
        Self { time: e.time, event: e.kind.as_str(), data }
    }
}
