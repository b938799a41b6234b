use std::collections::BTreeMap;

use super::raw_trigger::Scalar;

/// One exported field: a typed value per trigger
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Integer(Vec<i64>),
    Float(Vec<f64>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Self::Integer(values) => values.len(),
            Self::Float(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a value. An integer column receiving a float is promoted to floats.
    pub fn push(&mut self, value: Scalar) {
        match (&mut *self, value) {
            (Self::Integer(values), Scalar::Integer(i)) => values.push(i),
            (Self::Float(values), value) => values.push(value.as_f64()),
            (Self::Integer(values), Scalar::Float(f)) => {
                let mut promoted: Vec<f64> = values.iter().map(|i| *i as f64).collect();
                promoted.push(f);
                *self = Self::Float(promoted);
            }
        }
    }

    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            Self::Integer(values) => values.iter().map(|i| *i as f64).collect(),
            Self::Float(values) => values.clone(),
        }
    }
}

impl From<Scalar> for Column {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Integer(i) => Self::Integer(vec![i]),
            Scalar::Float(f) => Self::Float(vec![f]),
        }
    }
}

/// Named columns describing every trigger of a run, one row per trigger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    columns: BTreeMap<String, Column>,
}

impl FeatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, column: Column) {
        self.columns.insert(name.to_string(), column);
    }

    /// Append a value to the named column, creating it if needed
    pub fn push(&mut self, name: &str, value: Scalar) {
        match self.columns.get_mut(name) {
            Some(column) => column.push(value),
            None => {
                self.columns.insert(name.to_string(), Column::from(value));
            }
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Column)> {
        self.columns.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.columns.keys()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Length of the longest column (all columns have this length in a well formed table)
    pub fn n_rows(&self) -> usize {
        self.columns.values().map(|c| c.len()).max().unwrap_or(0)
    }

    /// The first column whose length differs from `n_rows`, as (name, length)
    pub fn find_short_column(&self) -> Option<(&String, usize)> {
        let n_rows = self.n_rows();
        self.columns
            .iter()
            .find(|(_, column)| column.len() != n_rows)
            .map(|(name, column)| (name, column.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promotion() {
        let mut column = Column::from(Scalar::Integer(1));
        column.push(Scalar::Integer(2));
        assert_eq!(column, Column::Integer(vec![1, 2]));
        column.push(Scalar::Float(2.5));
        assert_eq!(column, Column::Float(vec![1.0, 2.0, 2.5]));
        column.push(Scalar::Integer(3));
        assert_eq!(column, Column::Float(vec![1.0, 2.0, 2.5, 3.0]));
    }

    #[test]
    fn test_short_column() {
        let mut table = FeatureTable::new();
        table.push("a", Scalar::Float(1.0));
        table.push("a", Scalar::Float(2.0));
        table.push("b", Scalar::Integer(1));
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.n_columns(), 2);
        assert_eq!(table.find_short_column(), Some((&"b".to_string(), 1)));
        table.push("b", Scalar::Integer(2));
        assert_eq!(table.find_short_column(), None);
    }
}
