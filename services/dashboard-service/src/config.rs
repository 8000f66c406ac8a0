use anyhow::Context;
use nl_api_types::IndexBase;
use nl_chain_evm::EvmConfig;
use std::net::SocketAddr;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub(crate) struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub index_base: IndexBase,
    pub evm: EvmConfig,
}

impl ServiceConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        Self::parse(
            std::env::var("NL_BIND_ADDR").ok(),
            std::env::var("NL_TOKEN_INDEX_BASE").ok(),
            EvmConfig::default(),
        )
    }

    fn parse(bind_addr: Option<String>, index_base: Option<String>, evm: EvmConfig) -> anyhow::Result<Self> {
        let bind_addr = bind_addr
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = bind_addr
            .trim()
            .parse()
            .with_context(|| format!("NL_BIND_ADDR '{bind_addr}' is not a socket address"))?;

        let index_base = match index_base.filter(|value| !value.trim().is_empty()) {
            Some(value) => value.parse().map_err(anyhow::Error::msg)?,
            None => IndexBase::default(),
        };

        Ok(Self {
            bind_addr,
            index_base,
            evm,
        })
    }
}
