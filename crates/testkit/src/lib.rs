use serde_json::json;
use spyglass_core::model::span::Span;
use spyglass_core::model::trace::TracePayload;

/// Two overlapping flat spans spanning the window `[0, 150]`.
pub fn flat_spans() -> Vec<Span> {
    vec![
        Span::new("GET /api/users", 0.0, 100.0).with_attribute("http.status", 200),
        Span::new("db.users.findMany", 50.0, 150.0).with_attribute("rows", 12),
    ]
}

/// A checkout request with payment and shipping children.
pub fn nested_spans() -> Vec<Span> {
    vec![
        Span::new("order-processing", 0.0, 1800.0)
            .with_ids("root", None)
            .with_attribute("order.id", "A-1001"),
        Span::new("payment-service", 100.0, 900.0)
            .with_ids("payment", Some("root"))
            .with_attribute("amount", 99),
        Span::new("shipping-service", 950.0, 1600.0).with_ids("shipping", Some("root")),
        Span::new("carrier.quote", 1000.0, 1400.0).with_ids("quote", Some("shipping")),
    ]
}

pub fn payload(trace_id: &str, spans: Vec<Span>) -> TracePayload {
    TracePayload {
        trace_id: trace_id.to_string(),
        spans,
    }
}

/// Raw ingestion body, optionally carrying a spoofed `userId` field.
pub fn ingest_body(trace_id: &str, spans: &[Span], spoofed_user: Option<&str>) -> String {
    let mut body = json!({ "traceId": trace_id, "spans": spans });
    if let Some(user) = spoofed_user {
        body["userId"] = json!(user);
    }
    body.to_string()
}
