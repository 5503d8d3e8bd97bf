use chrono::Utc;
use spyglass_core::error::Result;
use spyglass_core::ids::{TraceId, UserId};
use spyglass_core::model::span::Span;
use spyglass_core::model::trace::TraceSummary;
use spyglass_core::query::TracesRequest;
use spyglass_store::Store;

/// Persistence collaborator behind the trace endpoints. Every read is scoped
/// to the owning user.
pub trait TraceRepository: Send + Sync {
    fn create_trace(&self, user: &UserId, trace_id: &TraceId, spans: &[Span]) -> Result<()>;

    fn fetch_spans(&self, user: &UserId, trace_id: &TraceId) -> Result<Option<Vec<Span>>>;

    fn list_summaries(&self, user: &UserId, req: &TracesRequest) -> Result<Vec<TraceSummary>>;
}

impl TraceRepository for Store {
    fn create_trace(&self, user: &UserId, trace_id: &TraceId, spans: &[Span]) -> Result<()> {
        self.insert_trace(user, trace_id, spans, Utc::now())
    }

    fn fetch_spans(&self, user: &UserId, trace_id: &TraceId) -> Result<Option<Vec<Span>>> {
        Ok(self.get_trace(user, trace_id)?.map(|t| t.spans))
    }

    fn list_summaries(&self, user: &UserId, req: &TracesRequest) -> Result<Vec<TraceSummary>> {
        self.list_traces(user, req)
    }
}
