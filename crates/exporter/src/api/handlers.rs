use std::sync::Arc;

use poem::handler;
use poem::http::StatusCode;
use poem::web::Data;
use poem::web::Html;
use poem::Response;
use tracing::error;

use crate::collector::Orchestrator;
use crate::metrics::exposition::CONTENT_TYPE;

/// Landing page content, rendered once at startup.
#[derive(Debug, Clone)]
pub struct LandingPage(pub Arc<str>);

impl LandingPage {
    pub fn new(telemetry_path: &str) -> Self {
        Self(
            format!(
                "<html>\n\
                 <head><title>NSONE Exporter</title></head>\n\
                 <body>\n\
                 <h1>NSONE Exporter</h1>\n\
                 <p><a href='{telemetry_path}'>Metrics</a></p>\n\
                 </body>\n\
                 </html>\n"
            )
            .into(),
        )
    }
}

/// Run a collection cycle and expose its snapshot
#[handler]
pub async fn get_metrics(orchestrator: Data<&Arc<Orchestrator>>) -> poem::Result<Response> {
    let orchestrator = Arc::clone(orchestrator.0);
    let body = tokio::task::spawn_blocking(move || orchestrator.scrape())
        .await
        .map_err(|err| {
            error!("Collection task aborted: {err}");
            poem::Error::from_string("collection aborted", StatusCode::INTERNAL_SERVER_ERROR)
        })?
        .map_err(|report| {
            error!("Failed to render metrics: {report:?}");
            poem::Error::from_string("failed to render metrics", StatusCode::INTERNAL_SERVER_ERROR)
        })?;

    Ok(Response::builder().content_type(CONTENT_TYPE).body(body))
}

#[handler]
pub async fn get_index(page: Data<&LandingPage>) -> Html<String> {
    Html(page.0 .0.to_string())
}
