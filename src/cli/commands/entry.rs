//! Entry commands: add, remove, set.

use super::print_json;
use crate::cli::{AddArgs, RemoveArgs, SetArgs};
use crate::error::Result;
use crate::model::{Entry, EntryProperty, ListId, PropertyValue};
use crate::storage::Store;

/// Append (or insert with `--at`) one entry.
///
/// # Errors
///
/// Returns `ListNotFound`, `InvalidArgument` for a bad position, or a storage error.
pub fn add(args: &AddArgs, store: &mut Store, json: bool) -> Result<()> {
    let list = store.get_list(ListId(args.id))?;
    let entry = Entry::new(&args.phrase, &args.translation);

    let position = match args.at {
        Some(position) => {
            list.insert(position, entry.clone())?;
            position
        }
        None => list.add(entry.clone())?,
    };

    if json {
        print_json(&serde_json::json!({
            "list_id": list.id(),
            "position": position,
            "entry": entry,
        }))
    } else {
        println!("Added \"{}\" to list {} at {position}", entry.phrase, list.id());
        Ok(())
    }
}

/// Remove the entries at the given positions in one step.
///
/// # Errors
///
/// Returns `InvalidArgument` for duplicate or out-of-range positions.
pub fn remove(args: &RemoveArgs, store: &mut Store, json: bool) -> Result<()> {
    let list = store.get_list(ListId(args.id))?;
    list.remove_indices(&args.positions)?;

    if json {
        print_json(&serde_json::json!({
            "list_id": list.id(),
            "removed": args.positions.len(),
            "remaining": list.len(),
        }))
    } else {
        println!(
            "Removed {} entr{} from list {}",
            args.positions.len(),
            if args.positions.len() == 1 { "y" } else { "ies" },
            list.id()
        );
        Ok(())
    }
}

/// Overwrite one property of one entry.
///
/// # Errors
///
/// Returns `InvalidArgument` for an unknown property, a bad value or position.
pub fn set(args: &SetArgs, store: &mut Store, json: bool) -> Result<()> {
    let property: EntryProperty = args.property.parse()?;
    let value = PropertyValue::parse(property, &args.value)?;
    let list = store.get_list(ListId(args.id))?;
    list.set_property(args.position, value)?;

    let stored = list.table().get_property(args.position, property)?;
    if json {
        print_json(&serde_json::json!({
            "list_id": list.id(),
            "position": args.position,
            "property": property,
            "value": stored,
        }))
    } else {
        println!("{property} of entry {} is now {stored}", args.position);
        Ok(())
    }
}
