use anyhow::{Context, Result};

use super::{ui, view};
use crate::core::RateSource;

/// Fetches the rates once and prints the ranked list and the full table.
pub async fn run(source: &dyn RateSource) -> Result<()> {
    let pb = ui::new_spinner("Fetching rates...");
    let snapshot = source.fetch_snapshot().await;
    pb.finish_and_clear();
    let snapshot = snapshot.context("Failed to fetch rates")?;

    println!(
        "{}\n\n{}\n",
        ui::style_text("Current rates", ui::StyleType::Title),
        view::render_top_rates(&snapshot.top_rates)
    );
    println!(
        "{}\n\n{}",
        ui::style_text("All rates", ui::StyleType::Title),
        view::render_rate_matrix(&snapshot.rates)
    );
    println!(
        "\n{}",
        ui::style_text(
            &format!("Updated {}", snapshot.updated_at.to_rfc3339()),
            ui::StyleType::Subtle
        )
    );
    Ok(())
}
