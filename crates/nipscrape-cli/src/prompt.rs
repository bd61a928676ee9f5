//! Interactive year selection

use anyhow::{Context, Result};
use dialoguer::Input;
use nipscrape_neurips::YearSelection;
use nipscrape_neurips::years::{MAX_SELECTED, MAX_YEAR, MIN_YEAR};

/// Ask for years until the answer is a valid selection
pub fn years() -> Result<YearSelection> {
    let answer: String = Input::new()
        .with_prompt(format!(
            "Enter up to {MAX_SELECTED} years between {MIN_YEAR} and {MAX_YEAR}, separated by commas"
        ))
        .validate_with(|input: &String| -> Result<(), String> {
            YearSelection::parse(input).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()
        .context("Failed to read years (pass --years when not on a terminal)")?;
    Ok(YearSelection::parse(&answer)?)
}
