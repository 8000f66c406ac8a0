use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use nl_api_types::TokenMetadata;
use nl_chain_client::{DappError, MetadataFetcher};

/// Fetches token metadata documents over HTTP(S).
///
/// `ipfs://` references are rewritten through `ipfs_gateway`, both for the
/// document itself and for the `image` it points at.
pub struct HttpMetadataFetcher {
    http: reqwest::Client,
    ipfs_gateway: String,
}

impl HttpMetadataFetcher {
    pub fn new(ipfs_gateway: &str) -> Self {
        let mut gateway = ipfs_gateway.trim().to_owned();
        if !gateway.ends_with('/') {
            gateway.push('/');
        }
        Self {
            http: reqwest::Client::new(),
            ipfs_gateway: gateway,
        }
    }

    pub fn resolve_uri(&self, uri: &str) -> String {
        match uri.strip_prefix("ipfs://") {
            Some(path) => {
                let path = path.strip_prefix("ipfs/").unwrap_or(path);
                format!("{}{}", self.ipfs_gateway, path)
            }
            None => uri.to_owned(),
        }
    }

    async fn fetch_document(&self, uri: &str) -> Result<TokenMetadata> {
        let url = self.resolve_uri(uri);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("metadata transport")?;

        let status = response.status();
        if !status.is_success() {
            bail!("metadata HTTP {status}");
        }

        let mut metadata: TokenMetadata = response.json().await.context("metadata parse")?;
        if let Err(reason) = metadata.validate() {
            bail!(reason);
        }
        metadata.image = self.resolve_uri(&metadata.image);
        Ok(metadata)
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, uri: &str) -> Result<TokenMetadata, DappError> {
        self.fetch_document(uri)
            .await
            .map_err(|err| DappError::metadata_fetch(uri, format!("{err:#}")))
    }
}
