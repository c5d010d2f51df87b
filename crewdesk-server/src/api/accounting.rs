//! Luca accounting endpoints (read-only)

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::services::luca_client::{Customer, IncomeSummary, Invoice};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct PartialErrors {
    pub invoices: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvoicesResponse {
    pub success: bool,
    pub invoices: Vec<Invoice>,
    pub summary: Option<IncomeSummary>,
    pub errors: PartialErrors,
}

#[derive(Debug, Serialize)]
pub struct CustomersResponse {
    pub success: bool,
    pub customers: Vec<Customer>,
}

#[derive(Debug, Serialize)]
pub struct AccountingConnectionResponse {
    pub connected: bool,
    pub error: Option<String>,
}

fn parse_date(field: &str, value: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid {} date '{}', expected YYYY-MM-DD", field, raw))),
    }
}

/// GET /api/luca/invoices?from=&to=
///
/// Invoices and the income summary are fetched concurrently; either may
/// fail on its own, and its error is reported alongside the other result.
pub async fn list_invoices(
    State(state): State<AppState>,
    query: Result<Query<InvoiceQuery>, QueryRejection>,
) -> ApiResult<Json<InvoicesResponse>> {
    let Query(query) = query?;
    let from = parse_date("from", query.from.as_deref())?;
    let to = parse_date("to", query.to.as_deref())?;

    let (invoices, summary) = tokio::join!(
        state.accounting.fetch_invoices(from, to),
        state.accounting.fetch_income_summary()
    );

    let mut errors = PartialErrors::default();
    let invoices = invoices.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to fetch invoices");
        errors.invoices = Some(e.to_string());
        Vec::new()
    });
    let summary = match summary {
        Ok(summary) => Some(summary),
        Err(e) => {
            warn!(error = %e, "Failed to fetch income summary");
            errors.summary = Some(e.to_string());
            None
        }
    };

    Ok(Json(InvoicesResponse {
        success: true,
        invoices,
        summary,
        errors,
    }))
}

/// GET /api/luca/customers
pub async fn list_customers(State(state): State<AppState>) -> ApiResult<Json<CustomersResponse>> {
    let customers = state.accounting.fetch_customers_with_revenue().await?;
    Ok(Json(CustomersResponse {
        success: true,
        customers,
    }))
}

/// GET /api/luca/test
pub async fn test_accounting_connection(
    State(state): State<AppState>,
) -> Json<AccountingConnectionResponse> {
    let error = state.accounting.test_connection().await.err().map(|e| {
        warn!(error = %e, "Luca connection test failed");
        e.to_string()
    });
    Json(AccountingConnectionResponse {
        connected: error.is_none(),
        error,
    })
}

pub fn accounting_routes() -> Router<AppState> {
    Router::new()
        .route("/api/luca/invoices", get(list_invoices))
        .route("/api/luca/customers", get(list_customers))
        .route("/api/luca/test", get(test_accounting_connection))
}
