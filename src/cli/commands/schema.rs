//! Schema version command.

use super::print_json;
use crate::error::Result;
use crate::storage::Store;
use crate::storage::schema::CURRENT_SCHEMA_VERSION;

/// Print the stored and supported schema versions.
///
/// # Errors
///
/// Returns an error if the version cannot be read.
pub fn execute(store: &Store, json: bool) -> Result<()> {
    let stored = store.schema_version()?;
    if json {
        print_json(&serde_json::json!({
            "stored": stored,
            "supported": CURRENT_SCHEMA_VERSION,
        }))
    } else {
        println!("{stored} (supported: {CURRENT_SCHEMA_VERSION})");
        Ok(())
    }
}
