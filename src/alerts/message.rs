use super::payload::AlertPayload;

fn signed(value: f64, decimals: usize) -> String {
    let sign = if value >= 0.0 { "+" } else { "" };
    format!("{sign}{value:.decimals$}")
}

/// Render an alert as a chat message
pub fn format_alert(payload: &AlertPayload) -> String {
    let change = payload.day_change_percent;

    // Determine emoji based on price change
    let trend_emoji = if change > 0.0 {
        "📈"
    } else if change < 0.0 {
        "📉"
    } else {
        "➡️"
    };

    let benchmark_str = match payload.benchmark_delta {
        Some(delta) => format!("{}%", signed(delta, 2)),
        None => "N/A".to_string(),
    };

    let currency = &payload.local_currency;

    format!(
        "🚨 Unusual move in your portfolio 🚨\n\n\
         📍 Stock: {}\n\
         {} Daily change: {}% (alert tier {}%)\n\n\
         💰 Buy price: {:.2} {}\n\
         💸 Current price: {:.2} {}\n\
         📈 Nominal return: {}%\n\
         📉 Real return: {}%\n\n\
         📊 vs benchmark: {}\n\
         📰 News sentiment: {}\n\
         🔬 Technicals: {}\n\
         🧑‍💼 Analysts: {}",
        payload.ticker,
        trend_emoji,
        signed(change, 2),
        payload.tier,
        payload.buy_price_local,
        currency,
        payload.current_price_local,
        currency,
        signed(payload.nominal_gain * 100.0, 2),
        signed(payload.real_gain * 100.0, 2),
        benchmark_str,
        payload.sentiment,
        payload.technical,
        payload.rating,
    )
}
