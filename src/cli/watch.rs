//! Interactive exchange view: live rates plus a line-based calculator.

use anyhow::Result;
use std::io;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{ui, view};
use crate::core::config::AppConfig;
use crate::core::{Currency, ExchangeState, RatePoller, RateSource, SharedState, UnknownCurrency};

const HELP: &str = "Commands: <amount> | from <CODE> | to <CODE> | swap | refresh | help | quit
Currencies: USDT, RUB, EUR-CASH, EUR-CARD";

/// Consecutive read failures after which input is considered gone.
const MAX_READ_ERRORS: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Amount(String),
    From(Currency),
    To(Currency),
    Swap,
    Refresh,
    Help,
    Quit,
    Redraw,
}

impl FromStr for Command {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        match word.to_lowercase().as_str() {
            "" => Ok(Command::Redraw),
            "from" => rest.parse().map(Command::From),
            "to" => rest.parse().map(Command::To),
            "swap" | "s" => Ok(Command::Swap),
            "refresh" | "r" | "exchange" => Ok(Command::Refresh),
            "help" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            "amount" => Ok(Command::Amount(rest.to_string())),
            // Anything else is amount input, valid or not
            _ => Ok(Command::Amount(line.to_string())),
        }
    }
}

/// Applies a command to the view. Returns false when the view should close.
pub async fn apply(command: Command, state: &SharedState, poller: &RatePoller) -> bool {
    debug!(?command, "Applying command");
    match command {
        Command::Amount(amount) => state.lock().await.set_amount(&amount),
        Command::From(currency) => state.lock().await.set_from(currency),
        Command::To(currency) => state.lock().await.set_to(currency),
        Command::Swap => state.lock().await.swap(),
        Command::Refresh => poller.refresh_now(),
        // Every redraw ends with the help text
        Command::Help => {}
        Command::Quit => return false,
        Command::Redraw => {}
    }
    true
}

async fn redraw(state: &SharedState) {
    let screen = view::render_view(&*state.lock().await);
    let term = console::Term::stdout();
    let _ = term.clear_screen();
    println!("{screen}");
    println!("{}", ui::style_text(HELP, ui::StyleType::Subtle));
}

/// Reads one line of input, replacing bytes that are not UTF-8. `buf` must
/// outlive the call so a read interrupted by `select!` is resumed, not lost.
/// Returns `None` at end of input.
async fn read_command_line<R>(input: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let read = input.read_until(b'\n', buf).await?;
    if read == 0 && buf.is_empty() {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf.as_slice())
        .trim_end_matches(['\r', '\n'])
        .to_string();
    buf.clear();
    Ok(Some(line))
}

async fn event_loop<R>(
    mut input: R,
    state: &SharedState,
    poller: &RatePoller,
    mut updates: watch::Receiver<u64>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut read_errors = 0;
    redraw(state).await;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                redraw(state).await;
            }
            line = read_command_line(&mut input, &mut buf) => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Failed to read input");
                        println!("{}", ui::style_text(&format!("Input error: {e}"), ui::StyleType::Error));
                        read_errors += 1;
                        if read_errors >= MAX_READ_ERRORS {
                            break;
                        }
                        continue;
                    }
                };
                read_errors = 0;
                match line.parse::<Command>() {
                    Ok(command) => {
                        if !apply(command, state, poller).await {
                            break;
                        }
                        redraw(state).await;
                    }
                    Err(e) => println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
}

pub async fn run(source: Arc<dyn RateSource>, config: &AppConfig) -> Result<()> {
    let defaults = &config.defaults;
    let state = ExchangeState::new(defaults.from, defaults.to, &defaults.amount).shared();
    let mut poller = RatePoller::new(source, Arc::clone(&state), config.refresh_interval());
    let updates = poller.subscribe();
    poller.start();

    event_loop(BufReader::new(tokio::io::stdin()), &state, &poller, updates).await;

    poller.stop();
    info!("Exchange view closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::poller::DEFAULT_INTERVAL;
    use crate::providers::static_provider::StaticRateSource;

    #[test]
    fn test_parse_commands() {
        assert_eq!("swap".parse::<Command>(), Ok(Command::Swap));
        assert_eq!(" S ".parse::<Command>(), Ok(Command::Swap));
        assert_eq!("refresh".parse::<Command>(), Ok(Command::Refresh));
        assert_eq!("q".parse::<Command>(), Ok(Command::Quit));
        assert_eq!("".parse::<Command>(), Ok(Command::Redraw));
        assert_eq!("from eur-cash".parse::<Command>(), Ok(Command::From(Currency::EurCash)));
        assert_eq!("TO  usdt".parse::<Command>(), Ok(Command::To(Currency::Usdt)));
        assert_eq!("250.5".parse::<Command>(), Ok(Command::Amount("250.5".to_string())));
        assert_eq!("amount 12,5".parse::<Command>(), Ok(Command::Amount("12,5".to_string())));
        assert_eq!("abc".parse::<Command>(), Ok(Command::Amount("abc".to_string())));
        assert_eq!(
            "from GBP".parse::<Command>(),
            Err(UnknownCurrency("GBP".to_string()))
        );
    }

    #[tokio::test]
    async fn test_apply_commands() {
        let state = ExchangeState::default().shared();
        let poller = RatePoller::new(
            Arc::new(StaticRateSource::new()),
            Arc::clone(&state),
            DEFAULT_INTERVAL,
        );

        assert!(apply(Command::Amount("50".to_string()), &state, &poller).await);
        assert!(apply(Command::From(Currency::EurCard), &state, &poller).await);
        assert!(apply(Command::Swap, &state, &poller).await);
        assert!(apply(Command::Help, &state, &poller).await);
        // Inactive poller ignores refresh
        assert!(apply(Command::Refresh, &state, &poller).await);
        assert!(!apply(Command::Quit, &state, &poller).await);

        let state = state.lock().await;
        assert_eq!(state.amount(), "50");
        assert_eq!(state.from(), Currency::Rub);
        assert_eq!(state.to(), Currency::EurCard);
        assert!(state.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_read_command_line_decodes_lossily() {
        let mut input = &b"50\n\xff\xfe\r\nq"[..];
        let mut buf = Vec::new();

        let first = read_command_line(&mut input, &mut buf).await.unwrap();
        assert_eq!(first.as_deref(), Some("50"));

        let second = read_command_line(&mut input, &mut buf).await.unwrap().unwrap();
        assert_eq!(second, "\u{FFFD}\u{FFFD}");
        assert_eq!(
            second.parse::<Command>(),
            Ok(Command::Amount("\u{FFFD}\u{FFFD}".to_string()))
        );

        let last = read_command_line(&mut input, &mut buf).await.unwrap();
        assert_eq!(last.as_deref(), Some("q"));
        assert_eq!(read_command_line(&mut input, &mut buf).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_event_loop_survives_invalid_utf8() {
        let state = ExchangeState::default().shared();
        let poller = RatePoller::new(
            Arc::new(StaticRateSource::new()),
            Arc::clone(&state),
            DEFAULT_INTERVAL,
        );
        let input = &b"\xff\xfe\n50\nfrom eur-cash\nhelp\nq\nto usdt\n"[..];

        event_loop(input, &state, &poller, poller.subscribe()).await;

        let state = state.lock().await;
        assert_eq!(state.amount(), "50");
        assert_eq!(state.from(), Currency::EurCash);
        // Input after quit is never read
        assert_eq!(state.to(), Currency::Rub);
    }
}
