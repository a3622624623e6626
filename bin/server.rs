// Congestion Toll Calculator - Web Server
// REST surface over the toll engine

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use toll_calculator::{
    normalize_plate, CachedHolidayProvider, SqliteLedger, StaticVehicleRegistry, TollCalculator,
    TollRecord,
};
use tower_http::cors::CorsLayer;

const HOLIDAY_CACHE_DIR: &str = "data/holidays";
const LEDGER_PATH: &str = "tolls.db";

/// Shared application state
#[derive(Clone)]
struct AppState {
    calculator: Arc<TollCalculator>,
}

#[derive(Serialize)]
struct HistoryResponse {
    tolls: Vec<TollRecord>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TotalResponse {
    total_toll_fee: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    license_number: String,
    date: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    message: String,
    value: u32,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /toll-fees/:license_number - recorded passages for a vehicle
async fn get_toll_fees(
    State(state): State<AppState>,
    Path(license_number): Path<String>,
) -> impl IntoResponse {
    let plate = decode_plate(&license_number);
    let calculator = state.calculator.clone();

    let result = tokio::task::spawn_blocking(move || calculator.toll_history_for(&plate))
        .await
        .expect("history task panicked");

    match result {
        Ok(tolls) => (StatusCode::OK, Json(HistoryResponse { tolls })).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /toll-fees/:license_number/total - total recorded toll for a vehicle
async fn get_total_toll_fee(
    State(state): State<AppState>,
    Path(license_number): Path<String>,
) -> impl IntoResponse {
    let plate = decode_plate(&license_number);
    let calculator = state.calculator.clone();

    let result = tokio::task::spawn_blocking(move || calculator.total_toll_for_vehicle(&plate))
        .await
        .expect("total task panicked");

    match result {
        Ok(total_toll_fee) => {
            (StatusCode::OK, Json(TotalResponse { total_toll_fee })).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// POST /toll-fees - register a passage
async fn register_toll_fee(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> impl IntoResponse {
    // Reject malformed dates before the engine or any collaborator runs
    let timestamp = match DateTime::parse_from_rfc3339(&body.date) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid date '{}': {}", body.date, e),
                }),
            )
                .into_response();
        }
    };

    let plate = normalize_plate(&body.license_number);
    let calculator = state.calculator.clone();
    let task_plate = plate.clone();

    let result =
        tokio::task::spawn_blocking(move || calculator.register_toll_fee(&task_plate, timestamp))
            .await
            .expect("registration task panicked");

    match result {
        Ok(value) => (
            StatusCode::OK,
            Json(RegisterResponse {
                message: format!("Toll fee added to vehicle '{}'", plate),
                value,
            }),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

fn decode_plate(raw: &str) -> String {
    let decoded = urlencoding::decode(raw)
        .unwrap_or_else(|_| raw.into())
        .into_owned();

    normalize_plate(&decoded)
}

fn internal_error(e: impl Display) -> Response {
    eprintln!("Error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Something went wrong".to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🚦 Congestion Toll Calculator - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let holidays = Arc::new(CachedHolidayProvider::new(HOLIDAY_CACHE_DIR));
    let vehicles = Arc::new(StaticVehicleRegistry::default_fleet());
    let ledger = Arc::new(SqliteLedger::open(LEDGER_PATH).expect("Failed to open toll ledger"));
    println!("✓ Ledger opened: {}", LEDGER_PATH);

    let state = AppState {
        calculator: Arc::new(TollCalculator::new(holidays, vehicles, ledger)),
    };

    let app = Router::new()
        .route("/toll-fees", post(register_toll_fee))
        .route("/toll-fees/:license_number", get(get_toll_fees))
        .route("/toll-fees/:license_number/total", get(get_total_toll_fee))
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr = "0.0.0.0:3001";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3001");
    println!("   POST /toll-fees                       register a passage");
    println!("   GET  /toll-fees/:plate                recorded passages");
    println!("   GET  /toll-fees/:plate/total          total recorded toll");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
