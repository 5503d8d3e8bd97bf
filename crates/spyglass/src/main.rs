mod client;
mod output;
mod telemetry;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use spyglass_api::server::run_http_server;
use spyglass_api::session::SessionAdmin;
use spyglass_api::{AppState, RouterConfig};
use spyglass_core::config::Config;
use spyglass_core::ids::UserId;
use spyglass_core::model::trace::TracePayload;
use spyglass_core::query::{IssueSessionRequest, SessionResponse};
use spyglass_core::time::session_expiry;
use spyglass_core::waterfall::{self, BarOrder};
use spyglass_store::Store;

use crate::client::ApiClient;
use crate::output::{print_status_human, print_traces_human, print_waterfall_human};
use crate::telemetry::{init_cli_tracing, init_server_tracing, shutdown_tracing};

#[derive(Parser, Debug)]
#[command(name = "spyglass")]
#[command(about = "Trace ingestion server and waterfall viewer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true, env = "SPYGLASS_ADDR")]
    addr: Option<String>,

    #[arg(long, global = true, env = "SPYGLASS_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run the HTTP API")]
    Serve {
        #[arg(long)]
        db_path: Option<PathBuf>,
        #[arg(long)]
        http_addr: Option<String>,
    },
    #[command(about = "Issue or revoke sessions")]
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    #[command(about = "Send a trace payload file to the server")]
    Ingest { file: PathBuf },
    #[command(about = "Render a trace as a waterfall")]
    Trace {
        trace_id: String,
        #[arg(long, default_value = "received")]
        order: String,
        #[arg(long, default_value_t = 60)]
        width: usize,
    },
    #[command(about = "List your traces, newest first")]
    Traces {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    #[command(about = "Show local database status (server must be stopped)")]
    Status {
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

/// With `--admin-token` the running server handles the request; otherwise
/// the database file is opened directly, which needs the server stopped.
#[derive(Subcommand, Debug)]
enum SessionAction {
    Create {
        #[arg(long)]
        user: String,
        #[arg(long, help = "Session lifetime, e.g. 12h or 30d")]
        ttl: Option<String>,
        #[arg(long, conflicts_with = "ttl")]
        no_expiry: bool,
        #[arg(long, conflicts_with = "admin_token")]
        db_path: Option<PathBuf>,
        #[arg(long, env = "SPYGLASS_ADMIN_TOKEN", hide_env_values = true)]
        admin_token: Option<String>,
    },
    Revoke {
        token: String,
        #[arg(long, conflicts_with = "admin_token")]
        db_path: Option<PathBuf>,
        #[arg(long, env = "SPYGLASS_ADMIN_TOKEN", hide_env_values = true)]
        admin_token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { db_path, http_addr } => run_server(db_path, http_addr).await,
        Commands::Session { action } => {
            init_cli_tracing();
            run_session(action, cli.addr, cli.json).await
        }
        Commands::Ingest { file } => {
            init_cli_tracing();
            let client = connect(cli.addr, cli.token)?;
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("read {}", file.display()))?;
            let payload: TracePayload = serde_json::from_str(&raw)
                .with_context(|| format!("parse trace payload in {}", file.display()))?;
            let trace_id = payload.validate()?;
            let response = client.ingest(&payload).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("ingested trace={trace_id} spans={}", payload.spans.len());
            }
            Ok(())
        }
        Commands::Trace {
            trace_id,
            order,
            width,
        } => {
            init_cli_tracing();
            let order: BarOrder = order.parse()?;
            let client = connect(cli.addr, cli.token)?;
            let response = client.fetch_trace(&trace_id).await?;
            let layout = waterfall::layout(&response.spans, order)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&layout)?);
            } else {
                print_waterfall_human(&trace_id, &layout, width);
            }
            Ok(())
        }
        Commands::Traces { limit } => {
            init_cli_tracing();
            let client = connect(cli.addr, cli.token)?;
            let response = client.list_traces(limit).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_traces_human(&response.traces);
            }
            Ok(())
        }
        Commands::Status { db_path } => {
            init_cli_tracing();
            let cfg = load_config(db_path, None)?;
            let store = Store::open(&cfg.db_path)?;
            let status = store.status()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status_human(&status);
            }
            Ok(())
        }
    }
}

fn load_config(db_path: Option<PathBuf>, http_addr: Option<String>) -> anyhow::Result<Config> {
    let mut cfg = Config::load().context("load config")?;
    if let Some(v) = db_path {
        cfg.db_path = v;
    }
    if let Some(v) = http_addr {
        cfg.http_addr = v;
    }
    Ok(cfg)
}

fn connect(addr: Option<String>, token: Option<String>) -> anyhow::Result<ApiClient> {
    let addr = match addr {
        Some(addr) => addr,
        None => Config::load().context("load config")?.http_addr,
    };
    ApiClient::new(&addr, token)
}

async fn run_server(db_path: Option<PathBuf>, http_addr: Option<String>) -> anyhow::Result<()> {
    let cfg = load_config(db_path, http_addr)?;
    init_server_tracing();

    let store = Store::open(&cfg.db_path)?;
    let addr: SocketAddr = cfg
        .http_addr
        .parse()
        .with_context(|| format!("invalid http_addr {}", cfg.http_addr))?;

    eprintln!("spyglass serve");
    eprintln!("  db: {}", cfg.db_path.display());
    eprintln!("  http: {}", cfg.http_addr);
    eprintln!("  session cookie: {}", cfg.session_cookie);

    let mut state = AppState::from_store(store.clone(), cfg.session_cookie.clone());
    if let Some(token) = cfg.admin_token.clone() {
        eprintln!("  session admin: enabled");
        state = state.with_session_admin(SessionAdmin {
            token,
            default_ttl: cfg.session_ttl,
            sessions: Arc::new(store),
        });
    }
    let router_cfg = RouterConfig {
        max_body_bytes: cfg.max_body_bytes,
        cors_allow_any: cfg.cors_allow_any,
    };
    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received ctrl-c, shutting down");
        }
    };

    let result = run_http_server(state, router_cfg, addr, shutdown).await;
    shutdown_tracing();
    Ok(result?)
}

async fn run_session(
    action: SessionAction,
    addr: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    match action {
        SessionAction::Create {
            user,
            ttl,
            no_expiry,
            db_path,
            admin_token,
        } => {
            let issued = match admin_token {
                Some(admin_token) => {
                    let req = IssueSessionRequest {
                        user_id: user,
                        ttl,
                        no_expiry,
                    };
                    connect(addr, Some(admin_token))?.issue_session(&req).await?
                }
                None => {
                    let cfg = load_config(db_path, None)?;
                    let user = UserId::parse(&user)?;
                    let now = Utc::now();
                    let expires_at =
                        session_expiry(now, ttl.as_deref(), no_expiry, cfg.session_ttl)?;
                    let store = Store::open(&cfg.db_path)?;
                    store.create_session(&user, now, expires_at)?.into()
                }
            };
            print_issued_session(&issued, json)
        }
        SessionAction::Revoke {
            token,
            db_path,
            admin_token,
        } => {
            match admin_token {
                Some(admin_token) => {
                    connect(addr, Some(admin_token))?
                        .revoke_session(&token)
                        .await?
                }
                None => {
                    let cfg = load_config(db_path, None)?;
                    let store = Store::open(&cfg.db_path)?;
                    if !store.revoke_session(&token)? {
                        anyhow::bail!("no such session");
                    }
                }
            }
            if json {
                println!("{}", serde_json::json!({ "revoked": true }));
            } else {
                println!("revoked");
            }
            Ok(())
        }
    }
}

fn print_issued_session(issued: &SessionResponse, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(issued)?);
        return Ok(());
    }
    println!("token={}", issued.token);
    println!("user={}", issued.user_id);
    match issued.expires_at {
        Some(at) => println!("expires={}", at.to_rfc3339()),
        None => println!("expires=never"),
    }
    Ok(())
}
