//! Argument parsing helpers shared by the command handlers.

use anyhow::{Context, Result};
use uuid::Uuid;

/// Parse a command-line id, naming the kind of id in the error.
pub fn parse_id(kind: &str, input: &str) -> Result<Uuid> {
    Uuid::parse_str(input.trim()).with_context(|| format!("invalid {kind} ID: {input:?}"))
}
