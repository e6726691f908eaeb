//! Interactive text menu.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the menu provides the "run `eph` and pick an analysis" UX
//!
//! Every menu choice maps onto the same pipeline the subcommands use.

use std::io::{self, Write};

use crate::error::AppError;

/// One analysis chosen from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    YearlyRates(u16),
    YearlyIncome(u16),
    Evolution,
    Quit,
}

/// Prompt for the next analysis to run. Loops until the input is valid.
pub fn prompt_for_action() -> Result<MenuAction, AppError> {
    println!();
    println!("1) Labor-market rates for one year");
    println!("2) Income distribution for one year");
    println!("3) 2016-2024 evolution (rates + income)");
    println!("q) Quit");

    loop {
        let input = read_line("Choose an option (1-3, q to quit): ")?;
        match input.as_str() {
            "1" => return Ok(MenuAction::YearlyRates(prompt_for_year()?)),
            "2" => return Ok(MenuAction::YearlyIncome(prompt_for_year()?)),
            "3" => return Ok(MenuAction::Evolution),
            "q" | "Q" => return Ok(MenuAction::Quit),
            other => println!("Invalid choice: '{other}'. Enter 1, 2, 3 or q."),
        }
    }
}

fn prompt_for_year() -> Result<u16, AppError> {
    loop {
        let input = read_line("Survey year (2016-2024): ")?;
        match input.parse::<u16>() {
            Ok(year) if (2016..=2024).contains(&year) => return Ok(year),
            _ => println!("Invalid year: '{input}'. Enter a year between 2016 and 2024."),
        }
    }
}

fn read_line(prompt: &str) -> Result<String, AppError> {
    print!("{prompt}");
    io::stdout()
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

    let mut input = String::new();
    let bytes = io::stdin()
        .read_line(&mut input)
        .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

    // EOF on stdin means there is no interactive user; bail instead of
    // looping forever on empty input.
    if bytes == 0 {
        return Err(AppError::new(
            2,
            "No input received. Use a subcommand (`eph rates -y 2017`) for scripted runs.",
        ));
    }

    Ok(input.trim().to_string())
}
