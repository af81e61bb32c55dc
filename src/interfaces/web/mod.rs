mod handlers;
mod router;
mod sse;

use std::convert::Infallible;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use tracing::info;

use crate::core::llm::LlmClient;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) llm: Arc<dyn LlmClient>,
    pub(crate) log_tx: tokio::sync::broadcast::Sender<String>,
}

pub struct ApiServer {
    llm: Arc<dyn LlmClient>,
    log_tx: tokio::sync::broadcast::Sender<String>,
    api_host: String,
    api_port: u16,
}

impl ApiServer {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        log_tx: tokio::sync::broadcast::Sender<String>,
        api_host: String,
        api_port: u16,
    ) -> Self {
        Self {
            llm,
            log_tx,
            api_host,
            api_port,
        }
    }

    /// Binds and serves until the process exits.
    pub async fn serve(self) -> Result<()> {
        let addr = format!("{}:{}", self.api_host, self.api_port);
        let state = AppState {
            llm: self.llm,
            log_tx: self.log_tx,
        };
        let app = router::build_api_router(state, self.api_port);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("CareerPilot API running at http://{addr}");
        axum::serve(listener, app).await?;
        Ok(())
    }
}

// --- SSE logs (used by router) ---

async fn sse_logs_endpoint(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.log_tx.subscribe();
    let stream = BroadcastStream::new(receiver).map(|msg| match msg {
        Ok(line) => Ok(Event::default().data(line)),
        Err(_) => Ok(Event::default().data("Log stream lagged")),
    });

    Sse::new(stream)
}
