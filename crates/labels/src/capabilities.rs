//! Optional-service discovery.

use grid_codec::DataSource;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Where the capability document lives, relative to the scene folder.
pub const CAPABILITIES_URL: &str = "service_info/services.json";

/// Optional remote services advertised by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Label persistence endpoint is available
    #[serde(default)]
    pub labels: bool,
}

/// Fetch the capability document.
///
/// A missing or malformed document means no optional services.
pub async fn probe_capabilities(source: &dyn DataSource) -> Capabilities {
    let bytes = match source.fetch(CAPABILITIES_URL).await {
        Ok(bytes) => bytes,
        Err(e) => {
            info!(error = %e, "No capability document, running local-only");
            return Capabilities::default();
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(caps) => {
            info!(?caps, "Probed capabilities");
            caps
        }
        Err(e) => {
            warn!(error = %e, "Malformed capability document, running local-only");
            Capabilities::default()
        }
    }
}
