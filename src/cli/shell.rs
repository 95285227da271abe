//! Interactive loop that keeps one session alive across commands.
use super::{commands, ui};
use crate::core::session::Session;
use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, PartialEq)]
pub enum ShellCommand {
    Convert {
        amount: f64,
        from: Option<String>,
        to: Option<String>,
    },
    Swap,
    From(String),
    To(String),
    Refresh,
    Rates,
    History,
    Clear,
    Status,
    Currencies,
    Help,
    Quit,
}

const HELP: &str = "\
Commands:
  <amount>                   convert using the selected pair
  convert <amount> [FROM] [TO]
  from <CODE> / to <CODE>    change the selected pair
  swap                       swap source and target
  refresh                    fetch the latest rates
  rates                      show current rates
  history                    show past conversions
  clear                      clear the history
  status                     show connection status
  currencies                 list supported currencies
  quit                       leave the shell";

/// Parses an amount, accepting `,` as the decimal separator.
pub fn parse_amount(input: &str) -> Result<f64, String> {
    let normalized = input.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .map_err(|_| format!("Not a number: {input}"))
}

pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("Empty command".to_string());
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb.to_lowercase().as_str(), args.as_slice()) {
        ("convert" | "c", [amount, rest @ ..]) if rest.len() <= 2 => ShellCommand::Convert {
            amount: parse_amount(amount)?,
            from: rest.first().map(|s| s.to_string()),
            to: rest.get(1).map(|s| s.to_string()),
        },
        ("swap" | "s", []) => ShellCommand::Swap,
        ("from", [code]) => ShellCommand::From(code.to_string()),
        ("to", [code]) => ShellCommand::To(code.to_string()),
        ("refresh" | "r", []) => ShellCommand::Refresh,
        ("rates", []) => ShellCommand::Rates,
        ("history" | "h", []) => ShellCommand::History,
        ("clear", []) => ShellCommand::Clear,
        ("status", []) => ShellCommand::Status,
        ("currencies", []) => ShellCommand::Currencies,
        ("help" | "?", []) => ShellCommand::Help,
        ("quit" | "exit" | "q", []) => ShellCommand::Quit,
        (_, []) => ShellCommand::Convert {
            amount: parse_amount(verb).map_err(|_| format!("Unknown command: {verb}"))?,
            from: None,
            to: None,
        },
        _ => return Err(format!("Invalid arguments for {verb}. Type 'help' for usage.")),
    };
    Ok(command)
}

fn write_prompt<W: Write>(out: &mut W, session: &Session) -> std::io::Result<()> {
    let (source, target) = session.selection();
    write!(out, "{source} → {target} > ")?;
    out.flush()
}

/// Runs the shell until `quit` or end of input.
pub async fn run(session: &mut Session) -> Result<()> {
    ui::print_status(session);
    println!("{}", ui::style_text("Type 'help' for commands.", ui::StyleType::Subtle));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();
    loop {
        write_prompt(&mut stdout, session)?;
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", ui::style_text(&message, ui::StyleType::Error));
                continue;
            }
        };

        if command == ShellCommand::Quit {
            break;
        }
        if let Err(e) = execute(session, command).await {
            println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
        }
    }
    Ok(())
}

async fn execute(session: &mut Session, command: ShellCommand) -> Result<()> {
    match command {
        ShellCommand::Convert { amount, from, to } => {
            commands::convert(session, amount, from.as_deref(), to.as_deref(), false).await?
        }
        ShellCommand::Swap => {
            session.swap();
            let (source, target) = session.selection();
            println!("Now converting {source} → {target}");
        }
        ShellCommand::From(code) => session.select_source(&code)?,
        ShellCommand::To(code) => session.select_target(&code)?,
        ShellCommand::Refresh => commands::refresh(session).await?,
        ShellCommand::Rates => commands::rates(session)?,
        ShellCommand::History => commands::history(session),
        ShellCommand::Clear => commands::clear_history(session).await,
        ShellCommand::Status => ui::print_status(session),
        ShellCommand::Currencies => commands::currencies(session.currencies()),
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::Quit => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::{CurrencySet, default_currencies};
    use crate::providers::ExchangeRateApiProvider;
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_prompt_shows_selected_pair() {
        let currencies = CurrencySet::new("ARS", default_currencies()).unwrap();
        let feed = ExchangeRateApiProvider::new("http://127.0.0.1:9").unwrap();
        let session = Session::new(currencies, Arc::new(feed), Arc::new(MemoryStore::new()))
            .with_selection("eur", "gbp")
            .unwrap();

        let mut out = Vec::new();
        write_prompt(&mut out, &session).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "EUR → GBP > ");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1000"), Ok(1000.0));
        assert_eq!(parse_amount("12,5"), Ok(12.5));
        assert_eq!(parse_amount(" 0.25 "), Ok(0.25));
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn test_parse_convert() {
        assert_eq!(
            parse_command("convert 100 eur usd"),
            Ok(ShellCommand::Convert {
                amount: 100.0,
                from: Some("eur".to_string()),
                to: Some("usd".to_string()),
            })
        );
        assert_eq!(
            parse_command("c 5"),
            Ok(ShellCommand::Convert {
                amount: 5.0,
                from: None,
                to: None,
            })
        );
        assert!(parse_command("convert").is_err());
        assert!(parse_command("convert 1 a b c").is_err());
    }

    #[test]
    fn test_bare_number_converts_selection() {
        assert_eq!(
            parse_command("250"),
            Ok(ShellCommand::Convert {
                amount: 250.0,
                from: None,
                to: None,
            })
        );
    }

    #[test]
    fn test_parse_verbs() {
        assert_eq!(parse_command("SWAP"), Ok(ShellCommand::Swap));
        assert_eq!(parse_command("from gbp"), Ok(ShellCommand::From("gbp".to_string())));
        assert_eq!(parse_command("to JPY"), Ok(ShellCommand::To("JPY".to_string())));
        assert_eq!(parse_command("refresh"), Ok(ShellCommand::Refresh));
        assert_eq!(parse_command("history"), Ok(ShellCommand::History));
        assert_eq!(parse_command("exit"), Ok(ShellCommand::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_command("   "), Err("Empty command".to_string()));
        assert_eq!(
            parse_command("dance"),
            Err("Unknown command: dance".to_string())
        );
        assert!(parse_command("swap now").is_err());
    }
}
