use super::convert::render;
use super::ui::{self, StyleType};
use crate::core::{ConversionRequest, ConverterState, RatesProvider};
use anyhow::{Context, Result, anyhow};
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "\
Commands:
  amount <N>   set the amount to convert (a bare number works too)
  from <CODE>  set the source currency
  to <CODE>    set the target currency
  swap         exchange source and target
  list         list available currencies
  show         redisplay the conversion
  help         show this help
  quit         leave";

/// One line of input in an interactive session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Amount(f64),
    From(String),
    To(String),
    Swap,
    List,
    Show,
    Help,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let keyword = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(anyhow!("Too many arguments: {}", s.trim()));
        }

        match (keyword.as_str(), arg) {
            ("" | "show", None) => Ok(SessionCommand::Show),
            ("amount", Some(value)) => value
                .parse()
                .map(SessionCommand::Amount)
                .with_context(|| format!("Invalid amount: {value}")),
            ("from", Some(code)) => Ok(SessionCommand::From(code.to_uppercase())),
            ("to", Some(code)) => Ok(SessionCommand::To(code.to_uppercase())),
            ("swap", None) => Ok(SessionCommand::Swap),
            ("list", None) => Ok(SessionCommand::List),
            ("help" | "?", None) => Ok(SessionCommand::Help),
            ("quit" | "exit" | "q", None) => Ok(SessionCommand::Quit),
            (other, None) => other
                .parse()
                .map(SessionCommand::Amount)
                .map_err(|_| anyhow!("Unknown command: {}. Type 'help' for usage.", s.trim())),
            _ => Err(anyhow!("Unknown command: {}. Type 'help' for usage.", s.trim())),
        }
    }
}

fn apply<W: Write>(state: &mut ConverterState, command: SessionCommand, out: &mut W) -> Result<()> {
    debug!(?command, "Applying session command");
    match command {
        SessionCommand::Amount(amount) => state.set_amount(amount),
        SessionCommand::From(code) => state.set_from(&code),
        SessionCommand::To(code) => state.set_to(&code),
        SessionCommand::Swap => state.swap(),
        SessionCommand::List => {
            for option in state.currency_options() {
                writeln!(out, "  {}", option.label)?;
            }
            return Ok(());
        }
        SessionCommand::Help => {
            writeln!(out, "{HELP}")?;
            return Ok(());
        }
        SessionCommand::Show | SessionCommand::Quit => {}
    }
    writeln!(out, "{}", render(state))?;
    Ok(())
}

/// Reads commands from `input` until it ends or `quit`, redisplaying the
/// conversion after every change.
pub async fn run_session<R, W>(state: &mut ConverterState, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{}", render(state))?;
    writeln!(out, "{}", ui::style_text("Type 'help' for commands.", StyleType::Subtle))?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.parse::<SessionCommand>() {
            Ok(SessionCommand::Quit) => break,
            Ok(command) => apply(state, command, out)?,
            Err(e) => writeln!(out, "{}", ui::style_text(&format!("{e:#}"), StyleType::Error))?,
        }
    }
    Ok(())
}

pub async fn run(
    provider: Arc<dyn RatesProvider>,
    base: &str,
    request: ConversionRequest,
) -> Result<()> {
    let mut state = ConverterState::new(request);
    state.load(provider, base);

    let input = BufReader::new(tokio::io::stdin());
    run_session(&mut state, input, &mut std::io::stdout()).await
}
