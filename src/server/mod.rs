//! Web form server: one route, GET renders the form, POST processes a URL.

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::FormRejection, State},
    response::Html,
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::output::views::{render_form, render_result};
use crate::transcribe::TranscriptionPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TranscriptionPipeline>,
}

/// Form body of a submission
#[derive(Debug, Default, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub url: String,
}

/// Build the router
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Render the empty form
async fn index() -> Html<String> {
    Html(render_form(None))
}

/// Process a submitted URL and render either the result or the form with an error.
///
/// A body that is not a urlencoded form counts as a submission without a URL.
async fn submit(
    State(state): State<AppState>,
    form: Result<Form<SubmitForm>, FormRejection>,
) -> Html<String> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("submission", %request_id);

    async move {
        let form = match form {
            Ok(Form(form)) => form,
            Err(rejection) => {
                tracing::debug!(%rejection, "Unreadable form body");
                SubmitForm::default()
            }
        };

        match state.pipeline.transcribe_from_url(&form.url).await {
            Ok(result) => Html(render_result(&result)),
            Err(error) => {
                tracing::info!(error = %error, "Submission rejected");
                Html(render_form(Some(&error.to_string())))
            }
        }
    }
    .instrument(span)
    .await
}

/// Bind and serve until the process is stopped
pub async fn serve(config: &Config, pipeline: TranscriptionPipeline) -> Result<()> {
    if config.uses_default_secret() {
        tracing::warn!("SECRET_KEY not set; using the default placeholder secret");
    }
    if config.openai.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; every submission will report a missing API key");
    }

    let app = build_app(AppState {
        pipeline: Arc::new(pipeline),
    });

    let addr = config.bind_address()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!("Starting server on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
