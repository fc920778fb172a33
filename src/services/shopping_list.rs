use std::collections::BTreeMap;

use crate::dto::cart::{CartLine, ShoppingListEntry};

/// Groups cart lines by ingredient name and sums their amounts.
///
/// Records sharing a name are merged even if they come from different
/// ingredient rows; the unit of the first line seen for a name is kept.
/// Entries come back ordered by name.
pub fn aggregate<I>(lines: I) -> Vec<ShoppingListEntry>
where
    I: IntoIterator<Item = CartLine>,
{
    let mut grouped: BTreeMap<String, (String, i64)> = BTreeMap::new();
    for line in lines {
        let entry = grouped
            .entry(line.name)
            .or_insert_with(|| (line.measurement_unit, 0));
        entry.1 += i64::from(line.amount);
    }

    grouped
        .into_iter()
        .map(|(name, (measurement_unit, amount))| ShoppingListEntry {
            name,
            measurement_unit,
            amount,
        })
        .collect()
}

pub fn format_entry(entry: &ShoppingListEntry) -> String {
    format!("{} - {} {}", entry.name, entry.amount, entry.measurement_unit)
}
