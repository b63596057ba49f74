//! HTTP handler functions for the ZAN dashboard API.

use actix_web::error::{InternalError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use zan_dashboard_analytics::filter::{Selection, filter};
use zan_dashboard_analytics::{
    AnalyticsError, benchmark, breakdown, metrics, options, ranking, require, resolve_perimeter,
    series,
};
use zan_dashboard_commune_models::{Dataset, Perimeter};
use zan_dashboard_dataset::context::DatasetContext;
use zan_dashboard_dataset::metadata::DataMetadata;
use zan_dashboard_server_models::{
    ApiHealth, ApiMetrics, ApiReload, FilterOptionsParams, SelectionParams,
};

use crate::AppState;

/// Maps a builder error to its HTTP response.
fn error_response(e: &AnalyticsError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        AnalyticsError::DataUnavailable { .. } => {
            log::error!("{e}");
            HttpResponse::ServiceUnavailable().json(body)
        }
        AnalyticsError::UnknownPerimeter { .. } => {
            log::warn!("{e}");
            HttpResponse::BadRequest().json(body)
        }
    }
}

/// Answers unparsable query strings with the same JSON error body as the
/// builders.
pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::warn!("Rejected query string: {err}");
    let body = serde_json::json!({ "error": format!("Invalid query: {err}") });
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

fn respond<T: Serialize>(result: Result<T, AnalyticsError>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => error_response(&e),
    }
}

/// Resolves the requested perimeter in the current snapshot and hands its
/// dataset to `f`.
fn with_dataset<T: Serialize>(
    state: &AppState,
    perimeter_name: &str,
    f: impl FnOnce(&Dataset) -> T,
) -> HttpResponse {
    let context = state.context.snapshot();
    respond(
        resolve_perimeter(perimeter_name)
            .and_then(|perimeter| require(context.dataset(perimeter), perimeter))
            .map(f),
    )
}

/// Runs a builder on the filtered selection described by `params`.
fn with_selection<T: Serialize>(
    state: &AppState,
    params: &SelectionParams,
    builder: impl FnOnce(&Selection<'_>) -> T,
) -> HttpResponse {
    with_dataset(state, params.perimeter_name(), |dataset| {
        builder(&filter(dataset, &params.selector()))
    })
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let context = state.context.snapshot();
    let loaded = context.loaded_perimeters();

    HttpResponse::Ok().json(ApiHealth {
        healthy: loaded.len() == Perimeter::all().len(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        loaded,
        load_error: context.load_error().map(ToString::to_string),
    })
}

/// `GET /api/metrics`
///
/// Returns the aggregate metrics of the filtered perimeter, with its
/// display name.
pub async fn metrics(
    state: web::Data<AppState>,
    params: web::Query<SelectionParams>,
) -> HttpResponse {
    with_dataset(&state, params.perimeter_name(), |dataset| ApiMetrics {
        perimetre: dataset.name.clone(),
        metrics: metrics::compute_metrics(&filter(dataset, &params.selector())).rounded(),
    })
}

/// `GET /api/evolution`
pub async fn evolution(
    state: web::Data<AppState>,
    params: web::Query<SelectionParams>,
) -> HttpResponse {
    with_selection(&state, &params, series::annual_evolution)
}

/// `GET /api/repartition`
pub async fn repartition(
    state: web::Data<AppState>,
    params: web::Query<SelectionParams>,
) -> HttpResponse {
    with_selection(&state, &params, breakdown::repartition)
}

/// `GET /api/top-communes`
pub async fn top_communes(
    state: web::Data<AppState>,
    params: web::Query<SelectionParams>,
) -> HttpResponse {
    let n = params.limit();
    with_selection(&state, &params, |selection| {
        ranking::top_communes(selection, n)
    })
}

/// `GET /api/typologie`
pub async fn typologie(
    state: web::Data<AppState>,
    params: web::Query<SelectionParams>,
) -> HttpResponse {
    with_selection(&state, &params, breakdown::typology_aggregation)
}

/// `GET /api/trajectoire`
pub async fn trajectoire(
    state: web::Data<AppState>,
    params: web::Query<SelectionParams>,
) -> HttpResponse {
    with_selection(&state, &params, series::trajectory)
}

/// `GET /api/densification`
pub async fn densification(
    state: web::Data<AppState>,
    params: web::Query<SelectionParams>,
) -> HttpResponse {
    with_selection(&state, &params, series::densification)
}

/// `GET /api/risques`
pub async fn risques(
    state: web::Data<AppState>,
    params: web::Query<SelectionParams>,
) -> HttpResponse {
    let n = params.limit();
    with_selection(&state, &params, |selection| {
        ranking::risk_classification(selection, n)
    })
}

/// `GET /api/benchmark`
///
/// Compares both perimeters; the `perimetre` parameter is ignored.
pub async fn benchmark(
    state: web::Data<AppState>,
    params: web::Query<SelectionParams>,
) -> HttpResponse {
    let context = state.context.snapshot();
    respond(benchmark::benchmark(
        |perimeter| context.dataset(perimeter),
        &params.selector(),
    ))
}

/// `GET /api/filters`
pub async fn filters(
    state: web::Data<AppState>,
    params: web::Query<FilterOptionsParams>,
) -> HttpResponse {
    with_dataset(&state, params.perimeter_name(), |dataset| {
        options::filter_options(dataset, &params.departments())
    })
}

/// `GET /api/metadata`
///
/// Data provenance, dated by the SCOT export's modification time.
pub async fn metadata(state: web::Data<AppState>) -> HttpResponse {
    let context = state.context.snapshot();
    let scot_file = context
        .definition(Perimeter::Scot)
        .map(|d| d.data_path(context.data_dir()))
        .unwrap_or_default();

    HttpResponse::Ok().json(DataMetadata::for_file(&scot_file))
}

/// `POST /api/reload`
///
/// Reloads every perimeter from the data directory and publishes the new
/// snapshot. A failed load keeps the current snapshot.
pub async fn reload(state: web::Data<AppState>) -> HttpResponse {
    if !state.allow_reload {
        log::warn!("Rejected reload request: reloading is disabled");
        return HttpResponse::Forbidden().json(serde_json::json!({
            "error": "Reloading is disabled (set ZAN_ALLOW_RELOAD=1)"
        }));
    }

    let data_dir = state.data_dir.clone();
    let context = match web::block(move || DatasetContext::load(&data_dir)).await {
        Ok(context) => context,
        Err(e) => {
            log::error!("Reload task failed: {e}");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Reload task failed"
            }));
        }
    };

    if let Some(e) = context.load_error() {
        log::error!("Reload failed, keeping current datasets: {e}");
        return HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "error": format!("Reload failed: {e}")
        }));
    }

    let body = ApiReload {
        loaded: context.loaded_perimeters(),
        loaded_at: context.loaded_at().to_rfc3339(),
    };
    state.context.publish(context);
    log::info!("Reloaded datasets: {:?}", body.loaded);

    HttpResponse::Ok().json(body)
}
