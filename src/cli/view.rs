//! Text rendering of the exchange view.
//!
//! Every function here only reads state, so the whole screen can be rebuilt
//! after any input or refresh.

use comfy_table::Cell;

use super::ui;
use crate::core::{Currency, ExchangeState, RankedRate, RateTable, RatesSnapshot};

pub const LOADING_PLACEHOLDER: &str = "Loading rates...";
const NO_RESULT: &str = "—";

fn currency_display(currency: Currency) -> String {
    format!("{} ({})", currency.code(), currency.label())
}

/// The calculator block: amounts, selected currencies and the rate line.
pub fn render_calculator(state: &ExchangeState) -> String {
    let result = match (state.snapshot(), state.conversion()) {
        (None, _) => ui::style_text(LOADING_PLACEHOLDER, ui::StyleType::Subtle),
        (Some(_), Ok(conversion)) => {
            ui::style_text(&conversion.to_string(), ui::StyleType::Value)
        }
        (Some(_), Err(e)) => format!(
            "{} {}",
            NO_RESULT,
            ui::style_text(&format!("({e})"), ui::StyleType::Error)
        ),
    };

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Exchange calculator", ui::StyleType::Title)
    );
    output.push_str(&format!(
        "  {} {} {}\n",
        ui::style_text("You give:", ui::StyleType::Label),
        state.amount(),
        currency_display(state.from())
    ));
    output.push_str(&format!(
        "  {} {} {}\n",
        ui::style_text("You get: ", ui::StyleType::Label),
        result,
        currency_display(state.to())
    ));
    if state.snapshot().is_some() {
        output.push_str(&format!(
            "  {} {}\n",
            ui::style_text("Rate:    ", ui::StyleType::Label),
            state.rate_line()
        ));
    }
    output
}

/// The informational list of current rates.
pub fn render_top_rates(top_rates: &[RankedRate]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Rate"),
        ui::header_cell("Change"),
    ]);
    for entry in top_rates {
        table.add_row(vec![
            Cell::new(format!("{} → {}", entry.from, entry.to)),
            ui::rate_cell(entry.rate),
            ui::trend_cell(entry.trend, entry.change),
        ]);
    }
    table.to_string()
}

/// Full rate table as a from/to matrix. Pairs without a rate show N/A.
pub fn render_rate_matrix(rates: &RateTable) -> String {
    let mut table = ui::new_styled_table();
    let mut header = vec![ui::header_cell("From \\ To")];
    header.extend(Currency::ALL.iter().map(|c| ui::header_cell(c.code())));
    table.set_header(header);

    for from in Currency::ALL {
        let mut row = vec![ui::header_cell(from.code())];
        row.extend(Currency::ALL.iter().map(|to| {
            rates
                .get(from, *to)
                .map_or_else(ui::na_cell, ui::rate_cell)
        }));
        table.add_row(row);
    }
    table.to_string()
}

fn render_update_info(snapshot: &RatesSnapshot) -> String {
    let next_update_min = snapshot.next_update_secs / 60;
    ui::style_text(
        &format!(
            "Updated {} · next update in {} min",
            snapshot.updated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            next_update_min
        ),
        ui::StyleType::Subtle,
    )
}

/// The current rates block, or the loading placeholder while degraded.
pub fn render_rates(state: &ExchangeState) -> String {
    let mut output = format!(
        "{}\n\n",
        ui::style_text("Current rates", ui::StyleType::Title)
    );
    match state.snapshot() {
        Some(snapshot) if !state.is_degraded() => {
            output.push_str(&render_top_rates(&snapshot.top_rates));
            output.push_str("\n\n");
            output.push_str(&render_update_info(snapshot));
        }
        _ => output.push_str(&ui::style_text(LOADING_PLACEHOLDER, ui::StyleType::Subtle)),
    }
    output.push('\n');
    output
}

/// The whole screen.
pub fn render_view(state: &ExchangeState) -> String {
    format!(
        "{}\n{}\n\n{}",
        render_calculator(state),
        ui::separator(),
        render_rates(state)
    )
}
