//! Items endpoint client.
//!
//! `GET <endpoint>` answers `{ "items": [...], "limit": n }` and
//! `DELETE <endpoint><id>/` removes one item.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::item::{RawItem, lenient_items};

/// One listing returned by the items endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemsPage {
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Vec<RawItem>,
    #[serde(default)]
    pub limit: Option<usize>,
}

pub trait ItemsBackend: Send + Sync + 'static {
    fn fetch_items(&self) -> impl Future<Output = Result<ItemsPage>> + Send;
    fn delete_item(&self, id: &str) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    endpoint: Url,
    csrf_token: Option<String>,
}

impl HttpBackend {
    pub fn new(endpoint: &str, csrf_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(client, endpoint, csrf_token)
    }

    pub fn with_client(client: Client, endpoint: &str, csrf_token: Option<String>) -> Result<Self> {
        let mut endpoint =
            Url::parse(endpoint).map_err(|err| Error::InvalidEndpoint(format!("{endpoint}: {err}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::InvalidEndpoint(endpoint.to_string()));
        }
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        Ok(Self {
            client,
            endpoint,
            csrf_token,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// `<endpoint><percent-encoded id>/`
    pub fn item_url(&self, id: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id).push("");
        }
        url
    }
}

impl ItemsBackend for HttpBackend {
    async fn fetch_items(&self) -> Result<ItemsPage> {
        debug!(url = %self.endpoint, "fetching gallery items");
        let res = self
            .client
            .get(self.endpoint.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Error::Status {
                method: "GET",
                url: self.endpoint.to_string(),
                status: res.status().as_u16(),
            });
        }
        Ok(res.json::<ItemsPage>().await?)
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        let url = self.item_url(id);
        debug!(%url, "deleting gallery item");
        let mut req = self.client.delete(url.clone());
        if let Some(token) = &self.csrf_token {
            req = req.header("X-CSRFToken", token);
        }
        let res = req.send().await?;
        if !res.status().is_success() {
            return Err(Error::Status {
                method: "DELETE",
                url: url.to_string(),
                status: res.status().as_u16(),
            });
        }
        Ok(())
    }
}
