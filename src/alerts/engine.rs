use log::{error, info, warn};

use super::error::AlertError;
use super::message::format_alert;
use super::payload::{nominal_gain, real_gain, AlertPayload};
use super::state::NotificationState;
use super::thresholds::AlertThresholds;
use crate::analysis::{analyze_rating, analyze_sentiment, analyze_technicals};
use crate::config::EngineSettings;
use crate::dispatch::{AlertDispatcher, MessageReceipt};
use crate::portfolio::{Portfolio, Position};
use crate::stock::MarketDataProvider;

/// An alert that reached the messaging API
#[derive(Debug, Clone)]
pub struct SentAlert {
    pub payload: AlertPayload,
    pub receipt: MessageReceipt,
}

/// A ticker that was skipped this cycle, and why
#[derive(Debug)]
pub struct TickerFailure {
    pub ticker: String,
    pub error: AlertError,
}

/// Outcome of one pass over the portfolio
#[derive(Debug, Default)]
pub struct CycleReport {
    pub sent: Vec<SentAlert>,
    pub failures: Vec<TickerFailure>,
    /// Set when the cycle could not start at all (no FX rate)
    pub aborted: Option<AlertError>,
}

/// Decides which positions crossed a new tier and sends one alert for each
pub struct NotificationEngine {
    provider: Box<dyn MarketDataProvider>,
    dispatcher: Box<dyn AlertDispatcher>,
    thresholds: AlertThresholds,
    settings: EngineSettings,
    sender: String,
    recipient: String,
}

impl NotificationEngine {
    pub fn new(
        provider: Box<dyn MarketDataProvider>,
        dispatcher: Box<dyn AlertDispatcher>,
        thresholds: AlertThresholds,
        settings: EngineSettings,
        sender: String,
        recipient: String,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            thresholds,
            settings,
            sender,
            recipient,
        }
    }

    /// Check every position once, alerting at most once per ticker
    pub async fn run_cycle(&self, portfolio: &Portfolio, state: &mut NotificationState) -> CycleReport {
        let mut report = CycleReport::default();

        let fx_rate = match self.fetch_fx_rate().await {
            Ok(rate) => rate,
            Err(e) => {
                error!("❌ Skipping cycle, no exchange rate: {e}");
                report.aborted = Some(e);
                return report;
            }
        };

        let benchmark_change = self.fetch_benchmark_change().await;

        for position in portfolio.iter() {
            match self.check_position(position, fx_rate, benchmark_change, state).await {
                Ok(Some(sent)) => report.sent.push(sent),
                Ok(None) => {}
                Err(e) => {
                    warn!("❌ Error with {}: {e}", position.ticker);
                    report.failures.push(TickerFailure {
                        ticker: position.ticker.clone(),
                        error: e,
                    });
                }
            }
        }

        info!(
            "✅ Cycle complete: {} positions, {} alerts sent, {} failures",
            portfolio.len(),
            report.sent.len(),
            report.failures.len()
        );
        report
    }

    async fn fetch_fx_rate(&self) -> Result<f64, AlertError> {
        let EngineSettings { fx_from, fx_to, fx_fallback_rate, .. } = &self.settings;
        if fx_from.eq_ignore_ascii_case(fx_to) {
            return Ok(1.0);
        }

        match self.provider.get_fx_rate(fx_from, fx_to).await {
            Ok(rate) => {
                info!("💱 {fx_from}/{fx_to} rate: {rate:.4}");
                Ok(rate)
            }
            Err(e) => match fx_fallback_rate {
                Some(fallback) => {
                    warn!("⚠️ {fx_from}/{fx_to} lookup failed ({e}), using fallback rate {fallback}");
                    Ok(*fallback)
                }
                None => Err(e.into()),
            },
        }
    }

    async fn fetch_benchmark_change(&self) -> Option<f64> {
        let symbol = &self.settings.benchmark_symbol;
        match self.provider.get_quote(symbol).await {
            Ok(quote) => {
                info!("📊 Benchmark {symbol} day change: {:.2}%", quote.change_percent);
                Some(quote.change_percent)
            }
            Err(e) => {
                warn!("⚠️ Benchmark {symbol} unavailable: {e}");
                None
            }
        }
    }

    async fn check_position(
        &self,
        position: &Position,
        fx_rate: f64,
        benchmark_change: Option<f64>,
        state: &mut NotificationState,
    ) -> Result<Option<SentAlert>, AlertError> {
        let ticker = position.ticker.as_str();
        let quote = self.provider.get_quote(ticker).await?;
        log::debug!(
            "{ticker}: {:.2} (prev close {:.2}, {:+.2}) as of {}",
            quote.price,
            quote.previous_close,
            quote.change,
            quote.timestamp.format("%H:%M:%S UTC")
        );

        let current_price_local = quote.price * fx_rate;
        let nominal = nominal_gain(position.buy_price_local, current_price_local)?;
        let real = real_gain(position.buy_price_local, position.buy_fx_rate, quote.price)?;

        let day_change = quote.change_percent;
        let last_tier = state.last_tier(ticker);
        let Some(tier) = self.thresholds.fire_tier(day_change.abs(), last_tier) else {
            log::debug!("{ticker}: {day_change:+.2}% today, no new tier (last {last_tier:?})");
            return Ok(None);
        };

        info!("🚨 {ticker} moved {day_change:+.2}%, crossing the {tier}% tier");

        let payload = AlertPayload {
            ticker: ticker.to_string(),
            tier,
            day_change_percent: day_change,
            local_currency: self.settings.fx_to.clone(),
            buy_price_local: position.buy_price_local,
            current_price_local,
            nominal_gain: nominal,
            real_gain: real,
            sentiment: analyze_sentiment(self.provider.as_ref(), ticker, self.settings.news_limit).await,
            technical: analyze_technicals(self.provider.as_ref(), ticker, self.settings.history_points).await,
            rating: analyze_rating(self.provider.as_ref(), ticker).await,
            benchmark_delta: benchmark_change.map(|benchmark| day_change - benchmark),
        };

        let body = format_alert(&payload);
        let receipt = self
            .dispatcher
            .send(&body, &self.sender, &self.recipient)
            .await?;
        info!(
            "📤 Alert for {ticker} sent via {} (message {})",
            self.dispatcher.name(),
            receipt.message_id
        );

        // Only a delivered alert counts; a failed send is retried next cycle
        state.record(ticker, tier);

        Ok(Some(SentAlert { payload, receipt }))
    }
}
