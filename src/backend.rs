pub mod gemini;

#[async_trait::async_trait]
pub trait Backend {
    /// Sends a single prompt and returns the reply as Markdown.
    async fn generate(&self, prompt: &str) -> Result<String, anyhow::Error>;
    fn request_timeout(&self) -> std::time::Duration;
}
