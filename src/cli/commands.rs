//! One function per CLI verb. Each expects an initialized session.
use super::ui;
use crate::core::currency::CurrencySet;
use crate::core::session::{RateStatus, Session};
use anyhow::{Result, bail};

pub async fn convert(
    session: &mut Session,
    amount: f64,
    from: Option<&str>,
    to: Option<&str>,
    swap: bool,
) -> Result<()> {
    if let Some(code) = from {
        session.select_source(code)?;
    }
    if let Some(code) = to {
        session.select_target(code)?;
    }
    if swap {
        session.swap();
    }

    match session.convert_selected(amount).await? {
        Some(record) => {
            println!(
                "{}",
                ui::style_text(
                    &ui::conversion_line(session.currencies(), &record),
                    ui::StyleType::Result
                )
            );
            if session.status() != RateStatus::Live {
                ui::print_status(session);
            }
            Ok(())
        }
        None => {
            ui::print_status(session);
            bail!("Cannot convert: no exchange rates are available")
        }
    }
}

pub fn rates(session: &Session) -> Result<()> {
    ui::print_status(session);
    match ui::rates_table(session) {
        Some(table) => {
            println!("{table}");
            Ok(())
        }
        None => bail!("No exchange rates are available"),
    }
}

pub async fn refresh(session: &mut Session) -> Result<()> {
    let pb = ui::new_spinner("Fetching latest rates...");
    let status = session.refresh().await;
    pb.finish_and_clear();

    rates(session)?;
    if status == RateStatus::Live {
        Ok(())
    } else {
        bail!("Rate refresh failed")
    }
}

pub fn history(session: &Session) {
    if session.history().is_empty() {
        println!("{}", ui::style_text("No conversions recorded", ui::StyleType::Subtle));
        return;
    }
    println!(
        "{}",
        ui::history_table(session.currencies(), session.history())
    );
}

pub async fn clear_history(session: &mut Session) {
    session.clear_history().await;
    println!("History cleared");
}

pub fn currencies(currencies: &CurrencySet) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Symbol"),
    ]);
    for currency in currencies.iter() {
        let code = if currency.code == currencies.base() {
            format!("{} (base)", currency.code)
        } else {
            currency.code.clone()
        };
        table.add_row(vec![code, currency.name.clone(), currency.symbol.clone()]);
    }
    println!("{table}");
}
