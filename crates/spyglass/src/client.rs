use anyhow::Context;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use spyglass_core::model::trace::TracePayload;
use spyglass_core::query::{
    IngestResponse, IssueSessionRequest, SessionResponse, TraceListResponse, TraceSpansResponse,
};

pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(addr: &str, token: Option<String>) -> anyhow::Result<Self> {
        let base = if addr.starts_with("http://") || addr.starts_with("https://") {
            addr.to_string()
        } else {
            format!("http://{addr}")
        };
        let base = Url::parse(&base).with_context(|| format!("invalid server address {addr}"))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token,
        })
    }

    pub async fn ingest(&self, payload: &TracePayload) -> anyhow::Result<IngestResponse> {
        let url = self.url(&["api", "traces"])?;
        let req = self.http.post(url).json(payload);
        decode(self.send(req).await?).await
    }

    pub async fn fetch_trace(&self, trace_id: &str) -> anyhow::Result<TraceSpansResponse> {
        let url = self.url(&["api", "traces", trace_id])?;
        decode(self.send(self.http.get(url)).await?).await
    }

    pub async fn list_traces(&self, limit: usize) -> anyhow::Result<TraceListResponse> {
        let url = self.url(&["api", "traces"])?;
        let req = self.http.get(url).query(&[("limit", limit)]);
        decode(self.send(req).await?).await
    }

    pub async fn issue_session(
        &self,
        req: &IssueSessionRequest,
    ) -> anyhow::Result<SessionResponse> {
        let url = self.url(&["api", "sessions"])?;
        decode(self.send(self.http.post(url).json(req)).await?).await
    }

    pub async fn revoke_session(&self, token: &str) -> anyhow::Result<()> {
        let url = self.url(&["api", "sessions", token])?;
        ensure_success(self.send(self.http.delete(url)).await?).await?;
        Ok(())
    }

    fn url(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("server address cannot carry a path: {}", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, req: RequestBuilder) -> anyhow::Result<Response> {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        req.send()
            .await
            .with_context(|| format!("request to spyglass server {} failed", self.base))
    }
}

async fn ensure_success(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("server returned {status}: {}", body.trim());
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
    ensure_success(response)
        .await?
        .json::<T>()
        .await
        .context("decode server response")
}
