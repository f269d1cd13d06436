//! `stockroom product ...` commands.

use anyhow::Result;
use serde_json::Value;
use stockroom_catalog::{Code, Product};

use super::{compact, print_json, Output, Stores};

fn parse_product(body: Value) -> Result<Product> {
    Product::from_json(body).map_err(|e| anyhow::anyhow!("Invalid product: {}", e))
}

fn print_one(product: &Product, output: Output) -> Result<()> {
    match output {
        Output::Json => print_json(product),
        Output::Table => {
            let code = product.code.map(|c| c.to_string()).unwrap_or_default();
            println!("{:>10}  {}", code, compact(&product.fields));
            Ok(())
        }
    }
}

pub fn add(stores: &Stores, body: Value, output: Output) -> Result<()> {
    let stored = stores.products.add(parse_product(body)?)?;
    if output == Output::Table {
        let code = stored.code.map(|c| c.to_string()).unwrap_or_default();
        println!("product {} created.", code);
    }
    print_one(&stored, output)
}

pub fn list(stores: &Stores, offline_only: bool, output: Output) -> Result<()> {
    let products = if offline_only {
        stores.products.offline_products()?
    } else {
        stores.products.get_all()?
    };

    match output {
        Output::Json => print_json(&products),
        Output::Table => {
            println!("{:>10}  FIELDS", "CODE");
            for product in &products {
                print_one(product, output)?;
            }
            println!("({} products)", products.len());
            Ok(())
        }
    }
}

pub fn get(stores: &Stores, code: Code, output: Output) -> Result<()> {
    match stores.products.get_one(code)? {
        Some(product) => print_one(&product, output),
        None => anyhow::bail!("product {} not found", code),
    }
}

pub fn update(stores: &Stores, code: Code, body: Value, output: Output) -> Result<()> {
    let updated = stores.products.update(code, parse_product(body)?)?;
    if output == Output::Table {
        println!("product {} updated.", code);
    }
    print_one(&updated, output)
}

pub fn delete(stores: &Stores, code: Code) -> Result<()> {
    if stores.products.delete(code)? {
        println!("product {} deleted.", code);
    } else {
        println!("product {} not found, nothing deleted.", code);
    }
    Ok(())
}
