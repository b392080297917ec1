//! Fintrack command-line client.
//!
//! Usage: `fintrack [LOCATION]`, e.g. `fintrack "/transactions?period=thisMonth"`.
//! The filters in the location's query are parsed through the filter
//! synchronizer and the matching resource is fetched from the API.

use std::env;
use std::sync::Arc;

use fintrack_application::{
    ClientConfig, FilterStateSynchronizer, Navigator, RequestExecutor, RequestOptions, SyncOptions,
};
use fintrack_domain::{FilterState, Location};
use fintrack_infrastructure::{HistoryNavigator, ReqwestHttpClient, logging};
use tokio::sync::mpsc;
use tracing::{error, info};

const DEFAULT_LOCATION: &str = "/transactions";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = Arc::new(ClientConfig::from_env());
    info!(
        base_url = config.base_url(),
        timeout_ms = u64::try_from(config.timeout().as_millis()).unwrap_or(u64::MAX),
        max_retries = config.retry().max_retries,
        "Fintrack client starting"
    );
    let executor = RequestExecutor::new(Arc::new(ReqwestHttpClient::new()?), config);

    let start = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
    let history = Arc::new(HistoryNavigator::new(Location::parse(&start)));
    let navigator: Arc<dyn Navigator> = Arc::<HistoryNavigator>::clone(&history);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let sync = FilterStateSynchronizer::with_callback(
        Some(navigator),
        SyncOptions::default(),
        move |filters: FilterState| {
            // Later notifications may outlive the receiver after the fetch.
            let _ = tx.send(filters);
        },
    );

    // The first notification carries the filters parsed on mount.
    let Some(filters) = rx.recv().await else {
        return Ok(());
    };
    info!(
        active = filters.active_count(),
        query = %filters.to_query_string(),
        "filters applied"
    );

    let endpoint = endpoint_for(&history.location(), &filters);
    let result = executor
        .request_payload(&endpoint, RequestOptions::new())
        .await;
    sync.shutdown();

    match result {
        Ok(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload.into_value())?);
            Ok(())
        }
        Err(e) => {
            error!(
                kind = %e.kind,
                status = ?e.status_code,
                "{}: {}",
                e.kind.title(),
                e.message
            );
            Err(e.into())
        }
    }
}

fn endpoint_for(location: &Location, filters: &FilterState) -> String {
    let query = filters.to_query_string();
    if query.is_empty() {
        location.path.clone()
    } else {
        format!("{}?{query}", location.path)
    }
}
