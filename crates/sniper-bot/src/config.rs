//! Application configuration.
//!
//! Engine tuning only. The listing itself (credentials, symbol, amounts,
//! time) arrives separately as a JSON record.

use crate::error::{AppError, AppResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sniper_executor::ExecutorConfig;
use sniper_rest::RestClientConfig;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Timing around the listing instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Setup sleeps until this long before the announced time (ms).
    #[serde(default = "default_prewindow_lead_ms")]
    pub prewindow_lead_ms: u64,
    /// Buy offsets relative to T0 (ms), strictly increasing.
    #[serde(default = "default_attempt_offsets_ms")]
    pub attempt_offsets_ms: Vec<i64>,
    /// Pure spin window before each fire instant (us).
    #[serde(default = "default_spin_window_us")]
    pub spin_window_us: u64,
    /// Pause between placement ack and status query (ms).
    #[serde(default = "default_fill_grace_ms")]
    pub fill_grace_ms: u64,
    /// First-trade wait budget past the announced time (ms).
    #[serde(default = "default_trigger_timeout_ms")]
    pub trigger_timeout_ms: u64,
    /// Re-measure the clock offset after the pre-window wait.
    #[serde(default = "default_resync_clock")]
    pub resync_clock: bool,
    /// Backoff before the single clock-sync retry (ms).
    #[serde(default = "default_sync_retry_backoff_ms")]
    pub sync_retry_backoff_ms: u64,
}

fn default_prewindow_lead_ms() -> u64 {
    3_000
}

fn default_attempt_offsets_ms() -> Vec<i64> {
    vec![-10, -5, 0]
}

fn default_spin_window_us() -> u64 {
    2_000
}

fn default_fill_grace_ms() -> u64 {
    150
}

fn default_trigger_timeout_ms() -> u64 {
    3_000
}

fn default_resync_clock() -> bool {
    true
}

fn default_sync_retry_backoff_ms() -> u64 {
    500
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            prewindow_lead_ms: default_prewindow_lead_ms(),
            attempt_offsets_ms: default_attempt_offsets_ms(),
            spin_window_us: default_spin_window_us(),
            fill_grace_ms: default_fill_grace_ms(),
            trigger_timeout_ms: default_trigger_timeout_ms(),
            resync_clock: default_resync_clock(),
            sync_retry_backoff_ms: default_sync_retry_backoff_ms(),
        }
    }
}

/// Order parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersConfig {
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
    #[serde(default = "default_warmup_recv_window_ms")]
    pub warmup_recv_window_ms: u64,
    /// Dust notional of the warmup order.
    #[serde(default = "default_warmup_quote_qty")]
    pub warmup_quote_qty: Decimal,
    /// How far in the past the warmup timestamp is (ms).
    #[serde(default = "default_warmup_stale_ms")]
    pub warmup_stale_ms: u64,
    #[serde(default = "default_depth_limit")]
    pub depth_limit: u32,
    #[serde(default = "default_price_decimals")]
    pub price_decimals: u32,
    #[serde(default = "default_qty_decimals")]
    pub qty_decimals: u32,
}

fn default_recv_window_ms() -> u64 {
    5_000
}

fn default_warmup_recv_window_ms() -> u64 {
    2_000
}

fn default_warmup_quote_qty() -> Decimal {
    Decimal::new(1, 6)
}

fn default_warmup_stale_ms() -> u64 {
    100_000
}

fn default_depth_limit() -> u32 {
    5
}

fn default_price_decimals() -> u32 {
    8
}

fn default_qty_decimals() -> u32 {
    6
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            recv_window_ms: default_recv_window_ms(),
            warmup_recv_window_ms: default_warmup_recv_window_ms(),
            warmup_quote_qty: default_warmup_quote_qty(),
            warmup_stale_ms: default_warmup_stale_ms(),
            depth_limit: default_depth_limit(),
            price_decimals: default_price_decimals(),
            qty_decimals: default_qty_decimals(),
        }
    }
}

/// Shared HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    3_000
}

fn default_pool_max_idle_per_host() -> usize {
    8
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
        }
    }
}

/// Run report output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// JSON run report destination. No report when unset.
    #[serde(default)]
    pub path: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// REST base URL.
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    /// Public stream URL.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub orders: OrdersConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

fn default_rest_url() -> String {
    "https://api.mexc.com".to_string()
}

fn default_ws_url() -> String {
    "wss://wbs.mexc.com/ws".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rest_url: default_rest_url(),
            ws_url: default_ws_url(),
            timing: TimingConfig::default(),
            orders: OrdersConfig::default(),
            http: HttpConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or fall back to defaults when the file is absent.
    pub fn load_or_default(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            return Self::from_file(path);
        }
        warn!(%path, "Config file not found, using defaults");
        Ok(Self::default())
    }

    pub fn validate(&self) -> AppResult<()> {
        self.executor_config()
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        if self.http.request_timeout_ms == 0 || self.http.connect_timeout_ms == 0 {
            return Err(AppError::Config(
                "http timeouts must be positive".to_string(),
            ));
        }
        if self.rest_url.is_empty() || self.ws_url.is_empty() {
            return Err(AppError::Config("endpoint URLs must be set".to_string()));
        }
        Ok(())
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            attempt_offsets_ms: self.timing.attempt_offsets_ms.clone(),
            spin_window: Duration::from_micros(self.timing.spin_window_us),
            fill_grace: Duration::from_millis(self.timing.fill_grace_ms),
            trigger_timeout: Duration::from_millis(self.timing.trigger_timeout_ms),
            sync_retry_backoff: Duration::from_millis(self.timing.sync_retry_backoff_ms),
            recv_window_ms: self.orders.recv_window_ms,
            warmup_recv_window_ms: self.orders.warmup_recv_window_ms,
            warmup_quote_qty: self.orders.warmup_quote_qty,
            warmup_stale_ms: self.orders.warmup_stale_ms,
            depth_limit: self.orders.depth_limit,
            price_decimals: self.orders.price_decimals,
            qty_decimals: self.orders.qty_decimals,
        }
    }

    pub fn rest_client_config(&self) -> RestClientConfig {
        RestClientConfig {
            base_url: self.rest_url.clone(),
            request_timeout: Duration::from_millis(self.http.request_timeout_ms),
            connect_timeout: Duration::from_millis(self.http.connect_timeout_ms),
            pool_max_idle_per_host: self.http.pool_max_idle_per_host,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timing.attempt_offsets_ms, vec![-10, -5, 0]);
        assert_eq!(config.orders.warmup_quote_qty, dec!(0.000001));
        assert!(config.report.path.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            rest_url = "http://127.0.0.1:9000"

            [timing]
            attempt_offsets_ms = [-20, -10, 0, 10]
            fill_grace_ms = 80

            [orders]
            warmup_quote_qty = "0.00001"
            "#,
        )
        .unwrap();
        assert_eq!(config.rest_url, "http://127.0.0.1:9000");
        assert_eq!(config.ws_url, "wss://wbs.mexc.com/ws");
        assert_eq!(config.timing.attempt_offsets_ms.len(), 4);
        assert_eq!(config.timing.trigger_timeout_ms, 3_000);
        assert_eq!(config.orders.warmup_quote_qty, dec!(0.00001));
        assert_eq!(
            config.executor_config().fill_grace,
            Duration::from_millis(80)
        );
    }

    #[test]
    fn test_invalid_offsets_rejected() {
        let mut config = AppConfig::default();
        config.timing.attempt_offsets_ms = vec![0, -5];
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = AppConfig::load_or_default("does/not/exist.toml").unwrap();
        assert_eq!(config.rest_url, "https://api.mexc.com");
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = toml::to_string(&AppConfig::default()).unwrap();
        assert!(toml_str.contains("rest_url"));
        assert!(toml_str.contains("[timing]"));
    }
}
