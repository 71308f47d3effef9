use thiserror::Error;

/// Failures at the browser boundary. The pure pipeline itself never fails.
#[derive(Debug, Error)]
pub enum LinksError {
	#[error("no browser window available")]
	NoWindow,
	#[error("failed to build request: {0}")]
	Request(String),
	#[error("fetch failed: {0}")]
	Network(String),
	#[error("HTTP {status} from {url}")]
	Status { status: u16, url: String },
	#[error("failed to decode payload: {0}")]
	Decode(#[from] serde_json::Error),
}
