// Fleet-wide counts of selected fact values.

use std::collections::BTreeMap;

use crate::models::FactTally;
use crate::puppetdb_repo::{Inventory, InventoryError};

pub const FACTS: [&str; 3] = ["puppetversion", "facterversion", "lsbdistdescription"];

/// For each fact in [`FACTS`], how many nodes report each distinct value.
pub async fn get_facts<I: Inventory>(inventory: &I) -> Result<FactTally, InventoryError> {
    let mut tally = FactTally::new();
    for fact in FACTS {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for value in inventory.fact_values(fact).await? {
            *counts.entry(value).or_insert(0) += 1;
        }
        tally.insert(fact.to_string(), counts);
    }
    Ok(tally)
}
