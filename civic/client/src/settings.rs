use {
    crate::Result,
    alloy::primitives::{Address, address},
    config::{Config, Environment, File},
    serde::Deserialize,
    std::{path::Path, time::Duration},
};

/// Prefix of the environment variables overriding file settings, e.g.
/// `CIVIC__SERVICE__ENDPOINT`.
pub const ENV_PREFIX: &str = "CIVIC";

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
pub const DEFAULT_CONTRACT_ADDRESS: Address = address!("0x94aA64E4f6DbE62c8910BeC0e088CE89FdA89B55");
pub const DEFAULT_SERVICE_ENDPOINT: &str = "https://civicgpt.onrender.com";

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub chain: ChainConfig,
    pub service: ServiceConfig,
    pub drafts: DraftConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub contract_address: Address,
    /// When set, connecting to a wallet on any other chain fails.
    pub chain_id: Option<u64>,
    /// How often the wallet watcher polls for account and chain changes.
    pub poll_interval_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            chain_id: None,
            poll_interval_ms: 1_000,
        }
    }
}

impl ChainConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: String,
    /// Host receiving vote tally updates, if different from `endpoint`.
    pub sync_endpoint: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SERVICE_ENDPOINT.to_string(),
            sync_endpoint: None,
            timeout_ms: 30_000,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DraftConfig {
    pub path: String,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            path: "proposal_draft.json".to_string(),
        }
    }
}

impl ClientConfig {
    /// Reads a config file, then applies `CIVIC__*` environment overrides.
    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Self::build(Config::builder().add_source(File::from(path.as_ref())))
    }

    /// Defaults plus environment overrides, for running without a file.
    pub fn from_env() -> Result<Self> {
        Self::build(Config::builder())
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {super::*, assertor::*, std::io::Write};

    #[test]
    fn parsing_config_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [chain]
            rpc_url = "http://127.0.0.1:9545"
            contract_address = "0x0000000000000000000000000000000000000001"
            chain_id = 11155111

            [service]
            endpoint = "http://localhost:8000"
            "#
        )
        .unwrap();

        let config = ClientConfig::load(file.path()).unwrap();

        assert_that!(config.chain.rpc_url.as_str()).is_equal_to("http://127.0.0.1:9545");
        assert_that!(config.chain.contract_address).is_equal_to(Address::with_last_byte(1));
        assert_that!(config.chain.chain_id).is_equal_to(Some(11155111));
        assert_that!(config.chain.poll_interval()).is_equal_to(Duration::from_secs(1));
        assert_that!(config.service.endpoint.as_str()).is_equal_to("http://localhost:8000");
        assert_that!(config.service.sync_endpoint).is_none();
        assert_that!(config.drafts).is_equal_to(DraftConfig::default());
    }

    #[test]
    fn defaults_without_file() {
        let config = ClientConfig::default();

        assert_that!(config.chain.contract_address).is_equal_to(DEFAULT_CONTRACT_ADDRESS);
        assert_that!(config.service.timeout()).is_equal_to(Duration::from_secs(30));
    }
}
