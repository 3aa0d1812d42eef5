pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("request: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("request: {0} ({1})")]
    ReqwestWithBody(reqwest::Error, String),

    #[error("invalid api key header: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),

    #[error("serde: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("no candidates returned{}", .0.as_ref().map(|r| format!(" (blocked: {})", r)).unwrap_or_default())]
    NoCandidates(Option<String>),

    #[error("empty response")]
    EmptyResponse,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct Part {
    pub text: String,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(serde::Serialize, Default, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(serde::Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_owned()),
                parts: vec![Part { text: prompt.into() }],
            }],
            generation_config: None,
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(serde::Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(serde::Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Joins the text parts of the first candidate.
    pub fn text(&self) -> Result<String, Error> {
        let candidate = self.candidates.first().ok_or_else(|| {
            Error::NoCandidates(self.prompt_feedback.as_ref().and_then(|f| f.block_reason.clone()))
        })?;

        let text = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .map(|p| p.text.as_str())
            .collect::<String>();

        if text.trim().is_empty() {
            return Err(Error::EmptyResponse);
        }
        Ok(text)
    }
}

impl Client {
    pub fn new(api_key: impl AsRef<str>, base_url: impl Into<String>) -> Result<Self, Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::CONTENT_TYPE, reqwest::header::HeaderValue::from_static("application/json"));
        let mut key = reqwest::header::HeaderValue::from_str(api_key.as_ref())?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);
        Ok(Self {
            client: reqwest::ClientBuilder::new().default_headers(headers).build()?,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    pub fn generate_content_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    pub async fn generate_content(&self, model: &str, req: &GenerateContentRequest) -> Result<GenerateContentResponse, Error> {
        let resp = self
            .client
            .post(self.generate_content_url(model))
            .json(req)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        if let Err(e) = resp.error_for_status_ref() {
            let body = resp.text().await.map_err(|e| e.without_url())?;
            return Err(Error::ReqwestWithBody(e.without_url(), body));
        }

        let body = resp.bytes().await.map_err(|e| e.without_url())?;
        Ok(serde_json::from_slice::<GenerateContentResponse>(&body)?)
    }
}
