use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::traits::{Fetcher, FontLoader, HostHandle, ImageLoader};
use crate::engine::error::LoadError;

/// Network host for headless use: generic fetches, image and font preloads over reqwest.
pub struct HttpLoader {
    client: Client,
    /// Sent with same-origin requests only. Cross-origin images go out anonymous.
    headers: Arc<RwLock<HashMap<String, String>>>,
    next_handle: AtomicU64,
}

impl HttpLoader {
    pub fn new(headers: HashMap<String, String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| anyhow!("failed to build http client: {}", e))?;
        Ok(Self::with_client(client, headers))
    }

    pub fn with_client(client: Client, headers: HashMap<String, String>) -> Self {
        Self {
            client,
            headers: Arc::new(RwLock::new(headers)),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Replace the credential headers (e.g. after a token refresh).
    pub fn update_headers(&self, new_headers: HashMap<String, String>) {
        *self.headers.write() = new_headers;
    }

    fn build_request(&self, url: &str, with_credentials: bool) -> RequestBuilder {
        let mut req = self.client.get(url);
        if with_credentials {
            let headers = self.headers.read().clone();
            for (k, v) in &headers {
                req = req.header(k.as_str(), v.as_str());
            }
        }
        req
    }

    async fn send(&self, url: &str, with_credentials: bool) -> Result<Response, LoadError> {
        self.build_request(url, with_credentials)
            .send()
            .await
            .map_err(|e| LoadError::Network(e.to_string()))
    }

    fn mint_handle(&self) -> HostHandle {
        HostHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }
}

#[async_trait]
impl Fetcher for HttpLoader {
    async fn fetch(&self, url: &str, cancel: CancellationToken) -> Result<Bytes, LoadError> {
        let request = async {
            let resp = self.send(url, true).await?;
            let status = resp.status();
            debug!("http fetch url={} status={}", url, status.as_u16());
            if !status.is_success() {
                warn!("http fetch failed url={} status={}", url, status.as_u16());
                return Err(LoadError::Http(status.as_u16()));
            }
            resp.bytes()
                .await
                .map_err(|e| LoadError::Decode(e.to_string()))
        };

        tokio::select! {
            res = request => res,
            _ = cancel.cancelled() => {
                debug!("http fetch cancelled url={}", url);
                Err(LoadError::Cancelled)
            }
        }
    }
}

#[async_trait]
impl ImageLoader for HttpLoader {
    async fn load_image(&self, url: &str, cross_origin: bool) -> Result<HostHandle, LoadError> {
        let resp = self.send(url, !cross_origin).await?;
        let status = resp.status();
        if !status.is_success() {
            warn!("image load failed url={} status={}", url, status.as_u16());
            return Err(LoadError::ImageLoad);
        }

        let is_image = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            warn!("image load rejected url={}: not an image content type", url);
            return Err(LoadError::ImageLoad);
        }

        // The body must arrive in full for the image to count as loaded.
        resp.bytes().await.map_err(|_| LoadError::ImageLoad)?;
        Ok(self.mint_handle())
    }
}

#[async_trait]
impl FontLoader for HttpLoader {
    async fn preload_font(&self, url: &str) -> Result<HostHandle, LoadError> {
        // Font preloads are always anonymous.
        let resp = self.send(url, false).await?;
        if !resp.status().is_success() {
            warn!(
                "font preload failed url={} status={}",
                url,
                resp.status().as_u16()
            );
            return Err(LoadError::FontLoad);
        }
        resp.bytes().await.map_err(|_| LoadError::FontLoad)?;
        Ok(self.mint_handle())
    }
}
