/// Process-wide context, built once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct AppState {
    pub model: std::sync::Arc<crate::model::Model>,
    pub backend: std::sync::Arc<dyn crate::backend::Backend + Send + Sync>,
    pub renderer: std::sync::Arc<crate::render::Renderer>,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error: {0}")]
    Prediction(#[from] crate::predict::Error),

    #[error("Gemini API Error: {0:#}")]
    Generation(anyhow::Error),

    #[error("Error: {0}")]
    Render(#[from] handlebars::RenderError),
}

// Every handler failure ends up here as a plain-text body.
impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        log::warn!("request failed: {}", self);
        (axum::http::StatusCode::OK, self.to_string()).into_response()
    }
}

pub fn router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/", axum::routing::get(home))
        .route("/predict", axum::routing::post(crate::predict::predict))
        .route("/diet", axum::routing::post(crate::diet::diet))
        .with_state(state)
}

async fn home(axum::extract::State(state): axum::extract::State<AppState>) -> Result<axum::response::Html<String>, Error> {
    Ok(axum::response::Html(state.renderer.index()?))
}
