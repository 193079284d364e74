// Inventory service access: the Inventory seam and its PuppetDB (v3 API) implementation via reqwest.

mod wire;

use crate::models::{Event, Node, Run};
use crate::version::{NAME, VERSION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::instrument;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("invalid PuppetDB URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("building HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("decoding response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Queries the aggregation core needs from the inventory/run-history service.
///
/// `runs` must return runs newest-first; the node aggregator stops scanning at the
/// first run older than its window.
pub trait Inventory {
    fn nodes(&self) -> impl Future<Output = Result<Vec<Node>, InventoryError>> + Send;

    fn runs(&self, node: &Node) -> impl Future<Output = Result<Vec<Run>, InventoryError>> + Send;

    fn events(&self, run_id: &str)
    -> impl Future<Output = Result<Vec<Event>, InventoryError>> + Send;

    /// Raw JSON for one named metric (mbean).
    fn metric(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<serde_json::Value, InventoryError>> + Send;

    /// One value per node reporting the fact.
    fn fact_values(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Vec<String>, InventoryError>> + Send;
}

pub struct PuppetDbRepo {
    client: Client,
    base: Url,
}

impl PuppetDbRepo {
    /// `host` is a bare hostname (port from config, plain http) or a full base URL.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, InventoryError> {
        let base = base_url(host, port)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", NAME, VERSION))
            .build()
            .map_err(InventoryError::Client)?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // http(s) URLs always have a path to extend
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, InventoryError> {
        let mut request = self.client.get(url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request
            .send()
            .await
            .map_err(|source| InventoryError::Request {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(InventoryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|source| InventoryError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

impl Inventory for PuppetDbRepo {
    #[instrument(skip(self), fields(repo = "puppetdb", operation = "nodes"))]
    async fn nodes(&self) -> Result<Vec<Node>, InventoryError> {
        let records: Vec<wire::NodeRecord> =
            self.get_json(self.endpoint(&["v3", "nodes"]), &[]).await?;
        Ok(records.into_iter().map(Node::from).collect())
    }

    #[instrument(skip(self, node), fields(repo = "puppetdb", operation = "runs", node = %node.name))]
    async fn runs(&self, node: &Node) -> Result<Vec<Run>, InventoryError> {
        let records: Vec<wire::ReportRecord> = self
            .get_json(
                self.endpoint(&["v3", "reports"]),
                &[
                    ("query", wire::equals_query("certname", &node.name)),
                    ("order-by", wire::reports_order_by()),
                ],
            )
            .await?;
        let mut runs: Vec<Run> = records.into_iter().map(Run::from).collect();
        // order-by is honoured by the service; re-sort so the contract holds regardless
        runs.sort_by(|a, b| b.start.cmp(&a.start));
        Ok(runs)
    }

    #[instrument(skip(self), fields(repo = "puppetdb", operation = "events"))]
    async fn events(&self, run_id: &str) -> Result<Vec<Event>, InventoryError> {
        let records: Vec<wire::EventRecord> = self
            .get_json(
                self.endpoint(&["v3", "events"]),
                &[("query", wire::equals_query("report", run_id))],
            )
            .await?;
        Ok(records.into_iter().map(Event::from).collect())
    }

    #[instrument(skip(self), fields(repo = "puppetdb", operation = "metric"))]
    async fn metric(&self, path: &str) -> Result<serde_json::Value, InventoryError> {
        self.get_json(self.endpoint(&["v3", "metrics", "mbean", path]), &[])
            .await
    }

    #[instrument(skip(self), fields(repo = "puppetdb", operation = "fact_values"))]
    async fn fact_values(&self, name: &str) -> Result<Vec<String>, InventoryError> {
        let records: Vec<wire::FactRecord> = self
            .get_json(self.endpoint(&["v3", "facts", name]), &[])
            .await?;
        Ok(records
            .into_iter()
            .map(wire::FactRecord::into_value_string)
            .collect())
    }
}

/// Base URL for the service: `http://<host>:<port>/` for a bare hostname, else the URL as given.
pub fn base_url(host: &str, port: u16) -> Result<Url, InventoryError> {
    let raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}:{}/", host, port)
    };
    Url::parse(&raw).map_err(|source| InventoryError::InvalidUrl { url: raw, source })
}
