//! Application orchestration.
//!
//! One `Application` runs exactly one listing:
//! sync clock -> wait for the pre-window -> warm up -> probe the book ->
//! determine T0 -> fire buys -> reconcile -> sell -> report.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use sniper_core::{ExecutionPlan, ListingSpec, RunOutcome};
use sniper_executor::{
    ClockSynchronizer, ConnectionWarmer, DynGateway, ExecutionScheduler, ExecutionState,
    ExecutorConfig, OrderBookProber, SellPlacer, ServerClock, TriggerDetector,
};
use sniper_rest::RestClient;
use sniper_telemetry::{AttemptLogger, Metrics, RunReport};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AppResult;

pub struct Application {
    config: AppConfig,
    executor: ExecutorConfig,
    listing: ListingSpec,
    gateway: DynGateway,
    clock: Arc<ServerClock>,
    report_path: Option<PathBuf>,
}

impl Application {
    /// Build the application and its shared REST client.
    pub fn new(config: AppConfig, listing: ListingSpec) -> AppResult<Self> {
        config.validate()?;
        let client = RestClient::new(
            config.rest_client_config(),
            listing.api_key.clone(),
            &listing.api_secret,
        )?;
        let report_path = config.report.path.as_ref().map(PathBuf::from);

        Ok(Self {
            executor: config.executor_config(),
            config,
            listing,
            gateway: Arc::new(client),
            clock: Arc::new(ServerClock::new()),
            report_path,
        })
    }

    /// Override the report destination from the config.
    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Run the listing to completion.
    ///
    /// Setup failures (clock sync, depth transport) are returned as errors.
    /// Everything after T0 is folded into the returned `RunOutcome`.
    pub async fn run(&self) -> AppResult<RunOutcome> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let symbol = self.listing.symbol.as_str();
        info!(
            %run_id,
            %symbol,
            quote_amount = %self.listing.quote_amount,
            listing_time = %self.listing.listing_time,
            "Starting listing run"
        );

        let synchronizer =
            ClockSynchronizer::new(Arc::clone(&self.gateway), self.executor.sync_retry_backoff);
        synchronizer.sync(&self.clock).await?;

        self.wait_for_prewindow().await;
        if self.config.timing.resync_clock {
            synchronizer.resync(&self.clock).await;
        }
        let announced_local_ms = self.clock.to_local_ms(self.listing.listing_ms());

        let warmer = ConnectionWarmer::new(
            Arc::clone(&self.gateway),
            symbol,
            self.executor.warmup_quote_qty,
            self.executor.warmup_recv_window_ms,
            self.executor.warmup_stale_ms,
        );
        warmer.warm(&self.clock).await;

        let prober = OrderBookProber::new(
            Arc::clone(&self.gateway),
            self.executor.depth_limit,
            self.executor.price_decimals,
        );
        let plan = prober.probe(symbol, self.listing.price_markup_pct).await?;

        let trigger = match plan {
            ExecutionPlan::Limit { .. } => {
                TriggerDetector::new(self.config.ws_url.as_str(), self.executor.trigger_timeout)
                    .first_trade(&self.clock, symbol, announced_local_ms)
                    .await
            }
            ExecutionPlan::Market => TriggerDetector::announced(&self.clock, announced_local_ms),
        };

        let state = Arc::new(ExecutionState::new(plan, self.listing.quote_amount));
        let scheduler = Arc::new(ExecutionScheduler::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.clock),
            symbol,
            &self.executor,
        ));
        let result = scheduler.run(Arc::clone(&state), trigger).await;

        let logger = AttemptLogger::new(symbol);
        logger.log_attempts(&result.attempts, result.skipped);

        let placer = SellPlacer::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.clock),
            symbol,
            self.executor.recv_window_ms,
            self.executor.price_decimals,
            self.executor.qty_decimals,
        );
        let outcome = placer
            .settle(plan, &result.attempts, self.listing.profit_pct)
            .await;
        if let RunOutcome::BoughtAndListed { sell, .. } = &outcome {
            logger.log_sell(sell);
        }
        info!(%run_id, outcome = outcome.label(), "Listing run finished");

        if let Some(path) = &self.report_path {
            let report = RunReport {
                run_id,
                listing_id: self.listing.id.clone(),
                symbol: symbol.to_string(),
                started_at,
                finished_at: Utc::now(),
                clock_offset_ms: self.clock.offset().as_millis(),
                plan: Some(plan),
                trigger_source: Some(trigger.source),
                trigger_at_ms: Some(trigger.local_ms),
                attempts: result.attempts,
                outcome: outcome.clone(),
            };
            match report.write_json(path) {
                Ok(()) => info!(path = %path.display(), "Run report written"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to write run report"),
            }
        }

        match Metrics::render() {
            Ok(text) => debug!(metrics = %text, "Run metrics"),
            Err(e) => warn!(error = %e, "Failed to render metrics"),
        }

        Ok(outcome)
    }

    /// Sleep until `prewindow_lead_ms` before the announced time.
    async fn wait_for_prewindow(&self) {
        let announced_local_ms = self.clock.to_local_ms(self.listing.listing_ms());
        let wake_local_ms =
            announced_local_ms.saturating_sub(self.config.timing.prewindow_lead_ms);
        let now_ms = self.clock.local_now_ms();
        if wake_local_ms <= now_ms {
            debug!(announced_local_ms, "Pre-window already open");
            return;
        }

        info!(
            wait_secs = (wake_local_ms - now_ms) / 1000,
            clock_offset = %self.clock.offset(),
            "Waiting for pre-window"
        );
        let wake = self.clock.instant_at_local_ms(wake_local_ms);
        tokio::time::sleep_until(tokio::time::Instant::from_std(wake)).await;
    }
}
