use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::errors::Error;

#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    // Carried through to the report verbatim, so it stays a string.
    pub loyalty_score: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub product_category: String,
}

pub type CustomerTable = HashMap<String, Customer>;
pub type ProductTable = HashMap<String, Product>;

/// Loads a header-keyed CSV table into a map from each record's identifier to
/// the full record. A row missing a mapped column fails the load.
fn load_keyed<T, F>(path: &Path, key: F) -> Result<HashMap<String, T>, Error>
where
    T: DeserializeOwned,
    F: Fn(&T) -> String,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut table = HashMap::new();
    for record in reader.deserialize() {
        let record: T = record?;
        table.insert(key(&record), record);
    }
    Ok(table)
}

pub fn load_customers(path: &Path) -> Result<CustomerTable, Error> {
    load_keyed(path, |customer: &Customer| customer.customer_id.clone())
}

pub fn load_products(path: &Path) -> Result<ProductTable, Error> {
    load_keyed(path, |product: &Product| product.product_id.clone())
}
