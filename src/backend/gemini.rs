pub struct Backend {
    client: Option<crate::gemini::Client>,
    model: String,
    generation_config: Option<crate::gemini::GenerationConfig>,
    request_timeout: std::time::Duration,
}

fn model_default() -> String {
    "gemini-2.0-flash".to_owned()
}

fn base_url_default() -> String {
    crate::gemini::DEFAULT_BASE_URL.to_owned()
}

const fn request_timeout_secs_default() -> u64 {
    60
}

#[derive(serde::Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "model_default")]
    pub model: String,
    pub api_key: Option<String>,
    #[serde(default = "base_url_default")]
    pub base_url: String,
    #[serde(default = "request_timeout_secs_default")]
    pub request_timeout_secs: u64,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: model_default(),
            api_key: None,
            base_url: base_url_default(),
            request_timeout_secs: request_timeout_secs_default(),
            temperature: None,
            top_p: None,
            max_output_tokens: None,
        }
    }
}

impl Backend {
    pub fn new(config: &Config) -> Result<Self, anyhow::Error> {
        let client = match config.api_key.as_ref().filter(|k| !k.is_empty()) {
            Some(api_key) => Some(crate::gemini::Client::new(api_key, config.base_url.clone())?),
            None => {
                log::warn!("GOOGLE_API_KEY is not set, diet plans will fail");
                None
            }
        };
        let generation_config = if config.temperature.is_some() || config.top_p.is_some() || config.max_output_tokens.is_some() {
            Some(crate::gemini::GenerationConfig {
                temperature: config.temperature,
                top_p: config.top_p,
                max_output_tokens: config.max_output_tokens,
            })
        } else {
            None
        };

        Ok(Self {
            client,
            model: config.model.clone(),
            generation_config,
            request_timeout: std::time::Duration::from_secs(config.request_timeout_secs),
        })
    }
}

#[async_trait::async_trait]
impl super::Backend for Backend {
    async fn generate(&self, prompt: &str) -> Result<String, anyhow::Error> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("GOOGLE_API_KEY is not set"))?;

        let mut req = crate::gemini::GenerateContentRequest::from_prompt(prompt);
        req.generation_config = self.generation_config.clone();
        log::info!("gemini request: model={} prompt_len={}", self.model, prompt.len());

        let resp = client.generate_content(&self.model, &req).await?;
        if let Some(reason) = resp.candidates.first().and_then(|c| c.finish_reason.as_ref()) {
            log::info!("gemini finish reason: {}", reason);
        }
        Ok(resp.text()?)
    }

    fn request_timeout(&self) -> std::time::Duration {
        self.request_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend as _;

    #[test]
    fn test_config_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(config.request_timeout_secs, 60);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_generation_config() {
        let backend = Backend::new(&toml::from_str::<Config>("temperature = 0.4").unwrap()).unwrap();
        let config = backend.generation_config.unwrap();
        assert_eq!(config.temperature, Some(0.4));
        assert!(config.max_output_tokens.is_none());

        assert!(Backend::new(&Config::default()).unwrap().generation_config.is_none());
    }

    #[test]
    fn test_config_rejects_unknown() {
        assert!(toml::from_str::<Config>("temprature = 0.3").is_err());
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let backend = Backend::new(&Config::default()).unwrap();
        assert_eq!(backend.request_timeout(), std::time::Duration::from_secs(60));
        let err = backend.generate("hello").await.unwrap_err();
        assert_eq!(err.to_string(), "GOOGLE_API_KEY is not set");
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let backend = Backend::new(&Config {
            api_key: Some("key".to_owned()),
            base_url: "http://127.0.0.1:9".to_owned(),
            ..Default::default()
        })
        .unwrap();
        let err = backend.generate("hello").await.unwrap_err();
        assert!(err.to_string().starts_with("request: "), "{}", err);
    }
}
