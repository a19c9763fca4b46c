//! Nova Poshta address API client.
//!
//! Proxies settlement and warehouse search so the API key never reaches the
//! browser. Results are cached for 10 minutes; the carrier's directory
//! changes daily at most.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Nova Poshta JSON API endpoint.
const API_URL: &str = "https://api.novaposhta.ua/v2.0/json/";

const CACHE_TTL: Duration = Duration::from_secs(600);
const CITY_LIMIT: u32 = 20;
const WAREHOUSE_LIMIT: u32 = 50;

/// Errors that can occur when interacting with the Nova Poshta API.
#[derive(Debug, Error)]
pub enum NovaPoshtaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with `success: false`.
    #[error("API error: {0}")]
    Api(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A settlement suitable for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct City {
    /// Delivery city ref, used to look up warehouses.
    #[serde(rename = "ref")]
    pub city_ref: String,
    /// Display name, e.g. "м. Київ, Київська обл.".
    pub name: String,
    pub area: String,
}

/// A branch, postomat or cargo office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warehouse {
    #[serde(rename = "ref")]
    pub warehouse_ref: String,
    pub number: String,
    pub name: String,
    pub short_address: String,
    pub category: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest<'a, P> {
    api_key: &'a str,
    model_name: &'static str,
    called_method: &'static str,
    method_properties: P,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    data: Vec<T>,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SettlementQuery<'a> {
    city_name: &'a str,
    limit: String,
    page: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SettlementPage {
    #[serde(default)]
    addresses: Vec<SettlementAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SettlementAddress {
    present: String,
    delivery_city: String,
    #[serde(default)]
    area: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct WarehouseQuery<'a> {
    city_ref: &'a str,
    find_by_string: &'a str,
    limit: String,
    page: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WarehouseRow {
    #[serde(rename = "Ref")]
    warehouse_ref: String,
    #[serde(default)]
    number: String,
    description: String,
    #[serde(default)]
    short_address: String,
    #[serde(default)]
    category_of_warehouse: String,
}

impl From<SettlementAddress> for City {
    fn from(a: SettlementAddress) -> Self {
        Self {
            city_ref: a.delivery_city,
            name: a.present,
            area: a.area,
        }
    }
}

impl From<WarehouseRow> for Warehouse {
    fn from(w: WarehouseRow) -> Self {
        Self {
            warehouse_ref: w.warehouse_ref,
            number: w.number,
            name: w.description,
            short_address: w.short_address,
            category: w.category_of_warehouse,
        }
    }
}

/// Client for the Nova Poshta address API.
#[derive(Clone)]
pub struct NovaPoshtaClient {
    inner: Arc<NovaPoshtaClientInner>,
}

struct NovaPoshtaClientInner {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    cities: Cache<String, Arc<Vec<City>>>,
    warehouses: Cache<String, Arc<Vec<Warehouse>>>,
}

impl NovaPoshtaClient {
    /// Create a client. Without a key the public (rate-limited) tier is used.
    #[must_use]
    pub fn new(api_key: Option<SecretString>, client: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(NovaPoshtaClientInner {
                client,
                api_key,
                cities: lookup_cache(),
                warehouses: lookup_cache(),
            }),
        }
    }

    /// Search settlements by name.
    ///
    /// # Errors
    ///
    /// Returns `NovaPoshtaError` if the request fails or the API refuses it.
    #[instrument(skip(self))]
    pub async fn search_cities(&self, query: &str) -> Result<Arc<Vec<City>>, NovaPoshtaError> {
        let key = cache_key(&[query]);
        if let Some(hit) = self.inner.cities.get(&key).await {
            debug!("City search served from cache");
            return Ok(hit);
        }

        let pages: Vec<SettlementPage> = self
            .call(
                "Address",
                "searchSettlements",
                SettlementQuery {
                    city_name: query.trim(),
                    limit: CITY_LIMIT.to_string(),
                    page: "1",
                },
            )
            .await?;

        let cities = Arc::new(
            pages
                .into_iter()
                .flat_map(|p| p.addresses)
                .map(City::from)
                .collect::<Vec<_>>(),
        );
        self.inner.cities.insert(key, Arc::clone(&cities)).await;
        Ok(cities)
    }

    /// Warehouses of a delivery city, optionally filtered by text.
    ///
    /// # Errors
    ///
    /// Returns `NovaPoshtaError` if the request fails or the API refuses it.
    #[instrument(skip(self))]
    pub async fn warehouses(
        &self,
        city_ref: &str,
        query: &str,
    ) -> Result<Arc<Vec<Warehouse>>, NovaPoshtaError> {
        let key = cache_key(&[city_ref, query]);
        if let Some(hit) = self.inner.warehouses.get(&key).await {
            debug!("Warehouse search served from cache");
            return Ok(hit);
        }

        let rows: Vec<WarehouseRow> = self
            .call(
                "AddressGeneral",
                "getWarehouses",
                WarehouseQuery {
                    city_ref: city_ref.trim(),
                    find_by_string: query.trim(),
                    limit: WAREHOUSE_LIMIT.to_string(),
                    page: "1",
                },
            )
            .await?;

        let warehouses = Arc::new(rows.into_iter().map(Warehouse::from).collect::<Vec<_>>());
        self.inner
            .warehouses
            .insert(key, Arc::clone(&warehouses))
            .await;
        Ok(warehouses)
    }

    async fn call<P, T>(
        &self,
        model_name: &'static str,
        called_method: &'static str,
        method_properties: P,
    ) -> Result<Vec<T>, NovaPoshtaError>
    where
        P: Serialize,
        T: for<'de> Deserialize<'de>,
    {
        let request = ApiRequest {
            api_key: self
                .inner
                .api_key
                .as_ref()
                .map_or("", |k| k.expose_secret()),
            model_name,
            called_method,
            method_properties,
        };

        let response = self
            .inner
            .client
            .post(API_URL)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(NovaPoshtaError::Api(format!(
                "HTTP {status}: {}",
                text.chars().take(200).collect::<String>()
            )));
        }

        parse_response(&text)
    }
}

fn lookup_cache<V: Clone + Send + Sync + 'static>() -> Cache<String, V> {
    Cache::builder()
        .max_capacity(1000)
        .time_to_live(CACHE_TTL)
        .build()
}

fn parse_response<T: for<'de> Deserialize<'de>>(text: &str) -> Result<Vec<T>, NovaPoshtaError> {
    let response: ApiResponse<T> =
        serde_json::from_str(text).map_err(|e| NovaPoshtaError::Parse(e.to_string()))?;

    if !response.success {
        let message = if response.errors.is_empty() {
            "request was not successful".to_string()
        } else {
            response.errors.join("; ")
        };
        return Err(NovaPoshtaError::Api(message));
    }
    Ok(response.data)
}

fn cache_key(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settlements() {
        let body = r#"{
            "success": true,
            "data": [{
                "TotalCount": 1,
                "Addresses": [{
                    "Warehouses": 2765,
                    "MainDescription": "Київ",
                    "Area": "Київська",
                    "Region": "",
                    "SettlementTypeCode": "м.",
                    "Ref": "e718a680-4b33-11e4-ab6d-005056801329",
                    "DeliveryCity": "8d5a980d-391c-11dd-90d9-001a92567626",
                    "Present": "м. Київ, Київська обл."
                }]
            }],
            "errors": [],
            "warnings": []
        }"#;

        let pages: Vec<SettlementPage> = parse_response(body).unwrap();
        let cities: Vec<City> = pages
            .into_iter()
            .flat_map(|p| p.addresses)
            .map(City::from)
            .collect();

        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].city_ref, "8d5a980d-391c-11dd-90d9-001a92567626");
        assert_eq!(cities[0].name, "м. Київ, Київська обл.");

        let json = serde_json::to_value(&cities[0]).unwrap();
        assert_eq!(json["ref"], "8d5a980d-391c-11dd-90d9-001a92567626");
    }

    #[test]
    fn test_parse_warehouses() {
        let body = r#"{
            "success": true,
            "data": [{
                "Ref": "1ec09d88-e1c2-11e3-8c4a-0050568002cf",
                "Number": "1",
                "Description": "Відділення №1: вул. Пироговський шлях, 135",
                "ShortAddress": "Київ, Пироговський шлях, 135",
                "CategoryOfWarehouse": "Branch",
                "CityRef": "8d5a980d-391c-11dd-90d9-001a92567626"
            }]
        }"#;

        let rows: Vec<WarehouseRow> = parse_response(body).unwrap();
        let warehouse = Warehouse::from(rows.into_iter().next().unwrap());

        assert_eq!(warehouse.number, "1");
        assert_eq!(warehouse.category, "Branch");
        assert!(warehouse.name.starts_with("Відділення №1"));
    }

    #[test]
    fn test_unsuccessful_response_is_api_error() {
        let body = r#"{"success": false, "data": [], "errors": ["API key expired"]}"#;
        let err = parse_response::<WarehouseRow>(body).unwrap_err();
        assert!(matches!(err, NovaPoshtaError::Api(ref m) if m == "API key expired"));

        assert!(matches!(
            parse_response::<WarehouseRow>("<html>"),
            Err(NovaPoshtaError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_data_defaults_to_empty() {
        let rows: Vec<WarehouseRow> = parse_response(r#"{"success": true}"#).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_new_client_has_separate_empty_caches() {
        let client = NovaPoshtaClient::new(None, reqwest::Client::new());
        assert_eq!(client.inner.cities.entry_count(), 0);
        assert_eq!(client.inner.warehouses.entry_count(), 0);
    }

    #[test]
    fn test_cache_key_normalizes_queries() {
        assert_eq!(cache_key(&[" Київ "]), cache_key(&["київ"]));
        assert_ne!(cache_key(&["ab", "c"]), cache_key(&["a", "bc"]));
    }
}
