use anyhow::{Context, Result};

use super::{ui, view};
use crate::core::{Currency, ExchangeState, RateSource};

/// Fetches the rates once and prints a single conversion.
pub async fn run(
    source: &dyn RateSource,
    amount: &str,
    from: Currency,
    to: Currency,
) -> Result<()> {
    let mut state = ExchangeState::new(from, to, amount);
    // Reject bad input before touching the network
    state.conversion().context("Cannot convert")?;

    let pb = ui::new_spinner("Fetching rates...");
    let snapshot = source.fetch_snapshot().await;
    pb.finish_and_clear();

    state.apply_snapshot(snapshot.context("Failed to fetch rates")?);
    println!("{}", view::render_calculator(&state));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::static_provider::StaticRateSource;

    #[tokio::test]
    async fn test_convert_with_static_rates() {
        let source = StaticRateSource::new();
        let result = run(&source, "1000", Currency::Usdt, Currency::Rub).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_convert_rejects_invalid_amount() {
        let source = StaticRateSource::new();
        let result = run(&source, "ten", Currency::Usdt, Currency::Rub).await;
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Cannot convert");
        assert_eq!(err.root_cause().to_string(), "Amount is not a number: ten");
    }
}
