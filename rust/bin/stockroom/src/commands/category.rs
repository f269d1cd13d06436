//! `stockroom category ...` commands.

use anyhow::Result;
use serde_json::Value;
use stockroom_catalog::Category;

use super::{compact, print_json, Output, Stores};

pub fn put(stores: &Stores, body: Value, output: Output) -> Result<()> {
    let category: Category =
        serde_json::from_value(body).map_err(|e| anyhow::anyhow!("Invalid category: {}", e))?;
    let stored = stores.categories.put(category)?;
    match output {
        Output::Json => print_json(&stored),
        Output::Table => {
            println!("category {} saved.", stored.id);
            Ok(())
        }
    }
}

pub fn list(stores: &Stores, output: Output) -> Result<()> {
    let categories = stores.categories.list()?;
    match output {
        Output::Json => print_json(&categories),
        Output::Table => {
            println!("{:<20}  FIELDS", "ID");
            for c in &categories {
                println!("{:<20}  {}", c.id, compact(&c.fields));
            }
            Ok(())
        }
    }
}

pub fn get(stores: &Stores, id: &str, output: Output) -> Result<()> {
    let category = stores
        .categories
        .get(id)?
        .ok_or_else(|| anyhow::anyhow!("category {} not found", id))?;
    match output {
        Output::Json => print_json(&category),
        Output::Table => {
            println!("{:<20}  {}", category.id, compact(&category.fields));
            Ok(())
        }
    }
}

pub fn delete(stores: &Stores, id: &str) -> Result<()> {
    if stores.categories.delete(id)? {
        println!("category {} deleted.", id);
    } else {
        println!("category {} not found, nothing deleted.", id);
    }
    Ok(())
}
