use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};
use warp::http::StatusCode;
use warp::path::FullPath;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::chart::{ChartData, Selection};
use crate::settings::Settings;
use crate::render::{render_page, PageOptions};

/// Everything a request needs. Read-only once the server starts.
pub struct AppState {
    pub chart: ChartData,
    pub y_label: String,
    pub legend_form: bool,
}

/// Selection from a raw query string. `show` may repeat or hold a comma list.
/// Without `show` or the legend form's `picked` marker every series is shown.
pub fn selection_from_query(query: &str) -> Selection {
    let mut picked = false;
    let mut values = Vec::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            "show" => {
                picked = true;
                values.push(value.replace("%2C", ",").replace("%2c", ","));
            }
            "picked" => picked = true,
            _ => {}
        }
    }
    if picked {
        Selection::parse(&values.join(","))
    } else {
        Selection::All
    }
}

pub fn routes(
    state: Arc<AppState>,
    base: &str,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let base = base.trim_end_matches('/').to_string();
    let state_filter = warp::any().map(move || state.clone());
    let query = warp::query::raw()
        .or(warp::any().map(String::new))
        .unify();

    warp::get()
        .and(warp::path::full())
        .and(query)
        .and(state_filter)
        .and_then(move |full: FullPath, query: String, state: Arc<AppState>| {
            let base = base.clone();
            async move { dispatch(&base, full.as_str(), &query, &state) }
        })
        .recover(handle_rejection)
}

fn dispatch(base: &str, path: &str, query: &str, state: &AppState) -> Result<Response, Rejection> {
    let rest = path.strip_prefix(base).ok_or_else(warp::reject::not_found)?;
    let selection = selection_from_query(query);
    debug!(path, ?selection, "Handling request");

    match rest {
        "" | "/" => {
            let opts = PageOptions {
                title: "articles",
                y_label: &state.y_label,
                legend_form: state.legend_form,
            };
            Ok(warp::reply::html(render_page(&state.chart, &selection, &opts)).into_response())
        }
        "/api/series" => Ok(warp::reply::json(&state.chart.select(&selection)).into_response()),
        _ => Err(warp::reject::not_found()),
    }
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({ "error": message })),
        code,
    ))
}

/// Bind the chart server, moving to the next port while the current one is
/// taken. Returns the bound address and the future that runs the server.
pub async fn start_server(
    state: Arc<AppState>,
    settings: &Settings,
) -> Result<(SocketAddr, impl Future<Output = ()>)> {
    let routes = routes(state, &settings.path);
    let mut port = settings.port;

    for _ in 0..settings.attempts {
        let addr = tokio::net::lookup_host((settings.address.as_str(), port))
            .await
            .with_context(|| format!("Failed to resolve {}", settings.address))?
            .next()
            .with_context(|| format!("No address found for {}", settings.address))?;

        match warp::serve(routes.clone()).try_bind_ephemeral(addr) {
            Ok(bound) => return Ok(bound),
            Err(e) if is_addr_in_use(&e) => {
                warn!("Port {} busy", port);
                port = port.checked_add(1).context("Ran out of ports")?;
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to bind {}", addr)),
        }
    }

    bail!("Failed to find available port")
}

/// Serve until Ctrl-C.
pub async fn serve(state: Arc<AppState>, settings: &Settings) -> Result<()> {
    let (addr, server) = start_server(state, settings).await?;
    info!("Opening chart on http://{}{}", addr, settings.path);

    tokio::select! {
        _ = server => {}
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }
    Ok(())
}

fn is_addr_in_use(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::AddrInUse {
                return true;
            }
        }
        current = e.source();
    }
    err.to_string().contains("Address already in use")
}
