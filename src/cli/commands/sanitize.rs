//! Sanitize command.

use std::path::Path;

use console::style;

use super::super::helpers::{read_input, write_file};
use crate::markdown::sanitize;

/// Run the Google Maps cleanup chain over a markdown file or stdin.
pub fn cmd_sanitize(input: Option<&Path>, output: Option<&Path>) -> anyhow::Result<()> {
    let raw = read_input(input)?;
    let cleaned = sanitize(&raw)?;

    match output {
        Some(path) => {
            write_file(path, &cleaned)?;
            eprintln!(
                "{} Wrote {} bytes to {}",
                style("✓").green(),
                cleaned.len(),
                path.display()
            );
        }
        None => println!("{}", cleaned),
    }

    Ok(())
}
