//! Cross-list search command.

use super::print_json;
use crate::cli::SearchArgs;
use crate::error::Result;
use crate::storage::Store;

/// Print entries whose phrase or translation contains the query.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn execute(args: &SearchArgs, store: &Store, json: bool) -> Result<()> {
    let hits = store.search_entries(&args.query)?;

    if json {
        return print_json(&hits);
    }

    if hits.is_empty() {
        println!("No matches.");
        return Ok(());
    }
    for hit in &hits {
        println!(
            "{}:{}  {}  =  {}",
            hit.list_id, hit.position, hit.entry.phrase, hit.entry.translation
        );
    }
    Ok(())
}
