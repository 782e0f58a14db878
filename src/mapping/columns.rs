use std::collections::HashMap;

use super::record::FieldBinding;
use crate::results::ColumnSchema;

/// A record field matched to a column ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundField {
    /// Index into the record's field bindings.
    pub field: usize,
    /// Column ordinal in the current result set.
    pub ordinal: usize,
}

/// Per-call intersection of a result set's columns with a record's fields.
///
/// Names are compared upper-cased, with no other normalization. Fields without
/// a column and columns without a field are simply absent from the binding.
/// When the result set repeats a column name the first ordinal wins.
#[derive(Debug, Default)]
pub struct ColumnBinding {
    bound: Vec<BoundField>,
}

impl ColumnBinding {
    #[must_use]
    pub fn build<T>(columns: &[ColumnSchema], fields: &[FieldBinding<T>]) -> Self {
        let mut by_name: HashMap<String, usize> = HashMap::with_capacity(columns.len());
        for column in columns {
            by_name
                .entry(column.name.to_uppercase())
                .or_insert(column.ordinal);
        }

        let bound = fields
            .iter()
            .enumerate()
            .filter_map(|(field, binding)| {
                by_name
                    .get(&binding.name().to_uppercase())
                    .map(|&ordinal| BoundField { field, ordinal })
            })
            .collect();

        Self { bound }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundField> {
        self.bound.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::assign_field;
    use crate::types::RowValues;

    #[derive(Default)]
    struct Account {
        user_id: i64,
    }

    fn fields() -> Vec<FieldBinding<Account>> {
        vec![
            FieldBinding::new("userId", |record: &mut Account, value: &RowValues| {
                assign_field(&mut record.user_id, value)
            }),
            FieldBinding::new("missing", |_: &mut Account, _: &RowValues| Ok(())),
        ]
    }

    #[test]
    fn matches_case_insensitively_and_skips_unknown() {
        let columns = vec![ColumnSchema::new("Other", 0), ColumnSchema::new("USERID", 1)];
        let binding = ColumnBinding::build(&columns, &fields());
        assert_eq!(binding.len(), 1);
        assert_eq!(
            binding.iter().next(),
            Some(&BoundField {
                field: 0,
                ordinal: 1
            })
        );
    }

    #[test]
    fn underscores_are_not_normalized() {
        let columns = vec![ColumnSchema::new("user_id", 0)];
        assert!(ColumnBinding::build(&columns, &fields()).is_empty());
    }

    #[test]
    fn first_duplicate_column_wins() {
        let columns = vec![ColumnSchema::new("UserId", 0), ColumnSchema::new("userid", 1)];
        let binding = ColumnBinding::build(&columns, &fields());
        assert_eq!(binding.iter().next().map(|b| b.ordinal), Some(0));
    }
}
