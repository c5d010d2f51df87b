//! Luca Regnskap accounting client
//!
//! Read-only GraphQL access to sale invoices and customers. Every request
//! is a POST of `{query, variables}` to the single GraphQL endpoint. A
//! response carrying `errors` is a failure even when the HTTP status is 200.

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::{build_http_client, describe_failure};
use crate::config::AccountingSettings;

const INVOICE_PAGE_SIZE: u32 = 100;
const CUSTOMER_PAGE_SIZE: u32 = 100;

const INVOICES_QUERY: &str = r#"
query GetPaidInvoices($first: Int) {
  saleInvoices(first: $first) {
    nodes {
      id
      invoiceNumber
      customer { id name }
      totalIncVat
      paidAmount
      status
      dueDate
      paidAt
      createdAt
    }
  }
}
"#;

const CUSTOMERS_QUERY: &str = r#"
query GetCustomers($first: Int) {
  customers(first: $first) {
    nodes { id name email phone organizationNumber }
  }
  saleInvoices(first: 500) {
    nodes {
      customer { id }
      totalIncVat
      paidAmount
      status
    }
  }
}
"#;

const INCOME_SUMMARY_QUERY: &str = r#"
query GetIncomeSummary {
  saleInvoices(first: 500) {
    nodes { totalIncVat paidAmount status }
  }
}
"#;

const TEST_QUERY: &str = r#"
query TestConnection {
  saleInvoices(first: 1) {
    nodes { id }
  }
}
"#;

/// Accounting client errors
#[derive(Debug, Error)]
pub enum AccountingError {
    #[error("{0}")]
    Configuration(String),

    #[error("Luca request failed: {0}")]
    Connectivity(String),

    #[error("{0}")]
    GraphQl(String),

    #[error("Unexpected Luca response: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub status: String,
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_number: Option<String>,
    pub total_revenue: f64,
    pub invoice_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSummary {
    pub total_revenue: f64,
    pub paid_invoices: u64,
    pub unpaid_invoices: u64,
    pub pending_amount: f64,
}

// Wire shapes

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphQlErrorItem>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorItem {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct CustomerRef {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceNode {
    #[serde(default)]
    id: String,
    #[serde(default)]
    invoice_number: String,
    #[serde(default)]
    customer: Option<CustomerRef>,
    #[serde(default)]
    total_inc_vat: f64,
    #[serde(default)]
    paid_amount: f64,
    #[serde(default)]
    status: String,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    paid_at: Option<String>,
    #[serde(default)]
    created_at: String,
}

impl InvoiceNode {
    fn is_paid(&self) -> bool {
        self.status == "paid" || self.paid_amount >= self.total_inc_vat
    }

    fn created_on(&self) -> Option<NaiveDate> {
        let date = self.created_at.get(..10)?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    }

    fn into_invoice(self) -> Invoice {
        let customer = self.customer.unwrap_or_default();
        Invoice {
            id: self.id,
            invoice_number: self.invoice_number,
            customer_name: customer.name.unwrap_or_else(|| "Unknown".to_string()),
            customer_id: customer.id,
            total_amount: self.total_inc_vat,
            paid_amount: self.paid_amount,
            status: self.status,
            due_date: self.due_date,
            paid_date: self.paid_at,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerNode {
    id: String,
    #[serde(default)]
    name: String,
    email: Option<String>,
    phone: Option<String>,
    organization_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvoicesData {
    sale_invoices: Connection<InvoiceNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomersData {
    customers: Connection<CustomerNode>,
    sale_invoices: Connection<InvoiceNode>,
}

pub struct AccountingClient {
    http_client: reqwest::Client,
    settings: AccountingSettings,
}

impl AccountingClient {
    pub fn new(settings: AccountingSettings, timeout: Duration) -> Result<Self, AccountingError> {
        let http_client = build_http_client(timeout)
            .map_err(|e| AccountingError::Configuration(e.to_string()))?;
        Ok(Self {
            http_client,
            settings,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    /// Sale invoices, optionally limited to those created within `[from, to]`
    pub async fn fetch_invoices(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Invoice>, AccountingError> {
        let data: InvoicesData = self
            .query(INVOICES_QUERY, json!({ "first": INVOICE_PAGE_SIZE }))
            .await?;

        let invoices: Vec<Invoice> = data
            .sale_invoices
            .nodes
            .into_iter()
            .filter(|inv| created_within(inv.created_on(), from, to))
            .map(InvoiceNode::into_invoice)
            .collect();

        debug!(count = invoices.len(), "Fetched invoices");
        Ok(invoices)
    }

    /// Customers with paid revenue and invoice count, highest revenue first
    pub async fn fetch_customers_with_revenue(&self) -> Result<Vec<Customer>, AccountingError> {
        let data: CustomersData = self
            .query(CUSTOMERS_QUERY, json!({ "first": CUSTOMER_PAGE_SIZE }))
            .await?;
        Ok(customers_with_revenue(data))
    }

    pub async fn fetch_income_summary(&self) -> Result<IncomeSummary, AccountingError> {
        let data: InvoicesData = self.query(INCOME_SUMMARY_QUERY, Value::Null).await?;
        Ok(income_summary(&data.sale_invoices.nodes))
    }

    pub async fn test_connection(&self) -> Result<(), AccountingError> {
        self.query::<Value>(TEST_QUERY, Value::Null).await.map(|_| ())
    }

    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, AccountingError> {
        let api_key = self.settings.api_key.as_deref().ok_or_else(|| {
            AccountingError::Configuration("Luca API key not configured".to_string())
        })?;

        let mut body = json!({ "query": query });
        if !variables.is_null() {
            body["variables"] = variables;
        }

        let response = self
            .http_client
            .post(&self.settings.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AccountingError::Connectivity(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AccountingError::Connectivity(describe_failure(response).await));
        }

        let result: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| AccountingError::Parse(e.to_string()))?;

        if let Some(errors) = result.errors {
            let message = errors
                .into_iter()
                .next()
                .and_then(|e| e.message)
                .unwrap_or_else(|| "GraphQL error".to_string());
            return Err(AccountingError::GraphQl(message));
        }

        result
            .data
            .ok_or_else(|| AccountingError::Parse("response has no data".to_string()))
    }
}

/// Unparseable creation dates are never filtered out
fn created_within(created: Option<NaiveDate>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    let Some(created) = created else {
        return true;
    };
    from.map_or(true, |f| created >= f) && to.map_or(true, |t| created <= t)
}

fn customers_with_revenue(data: CustomersData) -> Vec<Customer> {
    let mut revenue: HashMap<String, (f64, u64)> = HashMap::new();
    for inv in &data.sale_invoices.nodes {
        if let Some(id) = inv.customer.as_ref().and_then(|c| c.id.clone()) {
            let entry = revenue.entry(id).or_insert((0.0, 0));
            entry.0 += inv.paid_amount;
            entry.1 += 1;
        }
    }

    let mut customers: Vec<Customer> = data
        .customers
        .nodes
        .into_iter()
        .map(|c| {
            let (total_revenue, invoice_count) = revenue.get(&c.id).copied().unwrap_or((0.0, 0));
            Customer {
                id: c.id,
                name: c.name,
                email: c.email,
                phone: c.phone,
                organization_number: c.organization_number,
                total_revenue,
                invoice_count,
            }
        })
        .collect();

    customers.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));
    customers
}

fn income_summary(invoices: &[InvoiceNode]) -> IncomeSummary {
    let paid = invoices.iter().filter(|inv| inv.is_paid()).count() as u64;
    IncomeSummary {
        total_revenue: invoices.iter().map(|inv| inv.paid_amount).sum(),
        paid_invoices: paid,
        unpaid_invoices: invoices.len() as u64 - paid,
        pending_amount: invoices
            .iter()
            .map(|inv| inv.total_inc_vat - inv.paid_amount)
            .sum(),
    }
}
