//! List-level commands: catalog, create, show, rename, delete.

use super::print_json;
use crate::cli::{CreateArgs, DeleteArgs, RenameArgs, ShowArgs};
use crate::error::Result;
use crate::model::{ListId, ListInfo};
use crate::storage::Store;
use serde::Serialize;

/// Print every list with its entry count.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
pub fn catalog(store: &Store, json: bool) -> Result<()> {
    let lists = store.get_all_lists()?;

    if json {
        return print_json(&lists);
    }

    if lists.is_empty() {
        println!("No lists.");
        return Ok(());
    }
    for summary in &lists {
        let language = summary
            .info
            .language
            .as_deref()
            .map(|l| format!(" [{l}]"))
            .unwrap_or_default();
        println!(
            "{:>4}  {}{language}  ({} entries)",
            summary.id, summary.info.name, summary.entry_count
        );
    }
    Ok(())
}

/// Create a list from the given metadata.
///
/// # Errors
///
/// Returns `InvalidArgument` for a blank name, or a storage error.
pub fn create(args: &CreateArgs, store: &mut Store, json: bool) -> Result<()> {
    let info = ListInfo {
        name: args.name.clone(),
        author: args.author.clone(),
        language: args.language.clone(),
        url: args.url.clone(),
        created: args.created,
    };
    let list = store.create_list(info)?;

    if json {
        #[derive(Serialize)]
        struct Created {
            id: ListId,
            #[serde(flatten)]
            info: ListInfo,
        }
        print_json(&Created {
            id: list.id(),
            info: list.info(),
        })
    } else {
        println!("Created list {} \"{}\"", list.id(), list.name());
        Ok(())
    }
}

/// Print a list's metadata, properties and entries.
///
/// # Errors
///
/// Returns `ListNotFound` for an unknown id, or a storage error.
pub fn show(args: &ShowArgs, store: &mut Store, json: bool) -> Result<()> {
    let id = ListId(args.id);
    let list = store.get_list(id)?;
    let properties = store.list_properties(id)?;

    if json {
        #[derive(Serialize)]
        struct Shown {
            id: ListId,
            #[serde(flatten)]
            info: ListInfo,
            properties: std::collections::BTreeMap<String, String>,
            entries: Vec<crate::model::Entry>,
        }
        return print_json(&Shown {
            id,
            info: list.info(),
            properties,
            entries: list.entries(),
        });
    }

    let info = list.info();
    println!("{} {}", id, info.name);
    for (label, value) in [
        ("author", info.author.as_deref()),
        ("language", info.language.as_deref()),
        ("url", info.url.as_deref()),
    ] {
        if let Some(value) = value {
            println!("  {label}: {value}");
        }
    }
    if let Some(created) = info.created {
        println!("  created: {created}");
    }
    for (key, value) in &properties {
        println!("  {key} = {value}");
    }

    list.with_entries(|entries| {
        if entries.is_empty() {
            println!("  (empty)");
        }
        for (position, entry) in entries.iter().enumerate() {
            println!(
                "{position:>4}  {}  =  {}  ({}/{})",
                entry.phrase, entry.translation, entry.times_failed, entry.times_tried
            );
        }
    });
    Ok(())
}

/// Change the name of a list, keeping the rest of its metadata.
///
/// # Errors
///
/// Returns `ListNotFound`, `InvalidArgument` for a blank name, or a storage error.
pub fn rename(args: &RenameArgs, store: &mut Store, json: bool) -> Result<()> {
    let id = ListId(args.id);
    let list = store.get_list(id)?;
    let mut info = list.info();
    let old_name = std::mem::replace(&mut info.name, args.name.clone());
    store.update_list_info(id, info)?;

    if json {
        print_json(&serde_json::json!({
            "id": id,
            "old_name": old_name,
            "name": list.name(),
        }))
    } else {
        println!("Renamed list {id}: \"{old_name}\" -> \"{}\"", list.name());
        Ok(())
    }
}

/// Delete a list and its entries.
///
/// # Errors
///
/// Returns `ListNotFound` for an unknown id, or a storage error.
pub fn delete(args: &DeleteArgs, store: &mut Store, json: bool) -> Result<()> {
    let id = ListId(args.id);
    store.delete_list(id)?;

    if json {
        print_json(&serde_json::json!({ "deleted": id }))
    } else {
        println!("Deleted list {id}");
        Ok(())
    }
}
