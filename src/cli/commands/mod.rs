//! Command implementations.

pub mod entry;
pub mod list;
pub mod schema;
pub mod search;

use crate::error::Result;
use serde::Serialize;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
