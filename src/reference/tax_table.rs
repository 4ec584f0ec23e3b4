use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::decimal::Rate;

/// year-indexed withholding tax percentages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxTable {
    rates: BTreeMap<i32, Rate>,
}

impl TaxTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year(mut self, year: i32, percentage: Rate) -> Self {
        self.rates.insert(year, percentage);
        self
    }

    pub fn insert(&mut self, year: i32, percentage: Rate) {
        self.rates.insert(year, percentage);
    }

    pub fn percentage_for(&self, year: i32) -> Option<Rate> {
        self.rates.get(&year).copied()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.rates.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_year() {
        let table = TaxTable::new()
            .with_year(2019, Rate::from_percent_str("1.04").unwrap())
            .with_year(2020, Rate::from_percent_str("1.45").unwrap());

        assert_eq!(table.percentage_for(2020), Some(Rate::from_percent_str("1.45").unwrap()));
        assert_eq!(table.percentage_for(2021), None);
        assert_eq!(table.years().collect::<Vec<_>>(), vec![2019, 2020]);
    }
}
