use std::path::Path;

use anyhow::Result;

use crate::cli::OutputFormat;
use crate::output::{print_state, print_warning};
use crate::state;

pub fn show(state_path: &Path, format: OutputFormat) -> Result<()> {
    match state::load(state_path)? {
        Some(state) if !state.id.is_empty() => print_state(&state, format),
        _ => print_warning(&format!("No auth method tracked in {}", state_path.display())),
    }
    Ok(())
}
