use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub cors_origins: Vec<String>,
    /// Endpoint of the optional generic analytics collector. `None` disables
    /// the side channel entirely.
    pub collector_url: Option<String>,
    pub snapshot_interval_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("CARDLYTICS_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("CARDLYTICS_DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string()),
            cors_origins: std::env::var("CARDLYTICS_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            collector_url: std::env::var("CARDLYTICS_COLLECTOR_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            snapshot_interval_ms: std::env::var("CARDLYTICS_SNAPSHOT_INTERVAL_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
        })
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_interval_ms)
    }
}
