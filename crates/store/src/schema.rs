pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS traces (
  user_id TEXT NOT NULL,
  trace_id TEXT NOT NULL,
  spans_json TEXT NOT NULL,
  span_count BIGINT NOT NULL,
  window_start DOUBLE,
  window_end DOUBLE,
  created_at BIGINT NOT NULL,
  PRIMARY KEY(user_id, trace_id)
);

CREATE TABLE IF NOT EXISTS sessions (
  token TEXT PRIMARY KEY,
  user_id TEXT NOT NULL,
  created_at BIGINT NOT NULL,
  expires_at BIGINT
);

CREATE INDEX IF NOT EXISTS idx_traces_user_created ON traces(user_id, created_at);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
"#;
