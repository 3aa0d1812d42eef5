mod app;
mod backend;
mod diet;
mod gemini;
mod model;
mod predict;
mod render;

use anyhow::Context;
use clap::Parser;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(clap::Parser, Debug)]
struct Opts {
    /// Defaults to ./config.toml when present, built-in defaults otherwise.
    config: Option<std::path::PathBuf>,

    #[clap(long, default_value = "0.0.0.0")]
    host: String,

    #[clap(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    #[clap(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: Option<String>,
}

fn model_path_default() -> std::path::PathBuf {
    "diabetes_model.json".into()
}

fn scaler_path_default() -> std::path::PathBuf {
    "scaler.json".into()
}

#[derive(serde::Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct Config {
    #[serde(default = "model_path_default")]
    model_path: std::path::PathBuf,
    #[serde(default = "scaler_path_default")]
    scaler_path: std::path::PathBuf,
    #[serde(default)]
    gemini: backend::gemini::Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: model_path_default(),
            scaler_path: scaler_path_default(),
            gemini: backend::gemini::Config::default(),
        }
    }
}

fn load_config(opts: &Opts) -> Result<Config, anyhow::Error> {
    let path = match opts.config.as_ref() {
        Some(path) => path.clone(),
        None if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => DEFAULT_CONFIG_PATH.into(),
        None => {
            log::info!("no config file, using defaults");
            return Ok(Config::default());
        }
    };

    let buf = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let config = toml::from_str::<Config>(std::str::from_utf8(&buf)?).with_context(|| format!("parsing {}", path.display()))?;
    log::info!("loaded config from {}", path.display());
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::builder()
        .filter_module("glucoguard", log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let opts = Opts::parse();

    let mut config = load_config(&opts)?;
    if opts.google_api_key.is_some() {
        config.gemini.api_key = opts.google_api_key.clone();
    }

    let model = model::Model::load(&config.model_path, &config.scaler_path).context("loading model artifacts")?;
    log::info!(
        "model loaded from {} (scaler {})",
        config.model_path.display(),
        config.scaler_path.display()
    );

    let state = app::AppState {
        model: std::sync::Arc::new(model),
        backend: std::sync::Arc::new(backend::gemini::Backend::new(&config.gemini)?),
        renderer: std::sync::Arc::new(render::Renderer::new()?),
    };

    let listener = tokio::net::TcpListener::bind((opts.host.as_str(), opts.port))
        .await
        .with_context(|| format!("binding {}:{}", opts.host, opts.port))?;
    log::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app::router(state)).await?;

    Ok(())
}
