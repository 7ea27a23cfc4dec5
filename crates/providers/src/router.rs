//! Adapter router — selects the vendor adapter for a request's `api_mode`.

use std::collections::HashMap;
use std::sync::Arc;

use loreweave_config::AppConfig;
use loreweave_core::error::ProviderError;

use crate::adapter::Adapter;
use crate::anthropic::AnthropicAdapter;
use crate::deepseek::DeepSeekAdapter;
use crate::google::GoogleAdapter;
use crate::mistral::MistralAdapter;
use crate::openai::OpenAiAdapter;
use crate::xai::XaiAdapter;
use crate::zai::ZaiAdapter;

/// Routes generation requests to the correct adapter.
///
/// Adapters are stateless, so one instance per vendor is shared by all
/// requests.
pub struct AdapterRouter {
    adapters: HashMap<String, Arc<dyn Adapter>>,
    default_mode: String,
}

impl AdapterRouter {
    pub fn new(default_mode: impl Into<String>) -> Self {
        Self {
            adapters: HashMap::new(),
            default_mode: default_mode.into(),
        }
    }

    pub fn register(&mut self, mode: impl Into<String>, adapter: Arc<dyn Adapter>) {
        self.adapters.insert(mode.into(), adapter);
    }

    pub fn get(&self, mode: &str) -> Option<Arc<dyn Adapter>> {
        self.adapters.get(mode).cloned()
    }

    /// The adapter for `mode`, falling back to the configured default when
    /// `mode` is empty.
    pub fn resolve(&self, mode: &str) -> Result<Arc<dyn Adapter>, ProviderError> {
        let mode = if mode.is_empty() { &self.default_mode } else { mode };
        self.get(mode)
            .ok_or_else(|| ProviderError::NotConfigured(mode.to_string()))
    }

    pub fn list(&self) -> Vec<&str> {
        self.adapters.keys().map(|s| s.as_str()).collect()
    }
}

/// Build the full adapter registry from configuration.
pub fn build_from_config(config: &AppConfig) -> AdapterRouter {
    let mut router = AdapterRouter::new(&config.default_api_mode);

    for mode in ["openai", "anthropic", "google", "mistral", "deepseek", "xai", "zai"] {
        let api_key = config.api_key_for(mode).unwrap_or_default();
        let api_url = config.api_url_for(mode);
        router.register(mode, make_adapter(mode, &api_key, api_url.as_deref()));
    }

    router
}

fn make_adapter(mode: &str, api_key: &str, api_url: Option<&str>) -> Arc<dyn Adapter> {
    match mode {
        "anthropic" => {
            let mut a = AnthropicAdapter::new(api_key);
            if let Some(url) = api_url {
                a = a.with_base_url(url);
            }
            Arc::new(a)
        }
        "google" => {
            let mut a = GoogleAdapter::new(api_key);
            if let Some(url) = api_url {
                a = a.with_base_url(url);
            }
            Arc::new(a)
        }
        "mistral" => {
            let mut a = MistralAdapter::new(api_key);
            if let Some(url) = api_url {
                a = a.with_base_url(url);
            }
            Arc::new(a)
        }
        "deepseek" => {
            let mut a = DeepSeekAdapter::new(api_key);
            if let Some(url) = api_url {
                a = a.with_base_url(url);
            }
            Arc::new(a)
        }
        "xai" => {
            let mut a = XaiAdapter::new(api_key);
            if let Some(url) = api_url {
                a = a.with_base_url(url);
            }
            Arc::new(a)
        }
        "zai" => {
            let mut a = ZaiAdapter::new(api_key);
            if let Some(url) = api_url {
                a = a.with_base_url(url);
            }
            Arc::new(a)
        }
        _ => {
            let mut a = OpenAiAdapter::new(api_key);
            if let Some(url) = api_url {
                a = a.with_base_url(url);
            }
            Arc::new(a)
        }
    }
}
