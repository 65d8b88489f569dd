//! Input shapes shared by several operations.
//!
//! # Design
//! Several Buffer operations accept either a single value or a sequence of
//! values (a weekday code or a list of them, one update id or a full queue
//! order). `OneOrMany` captures that choice at the type level so the
//! builders can decide per operation whether a sequence is coerced,
//! validated element-wise, or rejected.

/// Either a single value or an ordered sequence of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Flatten into a sequence, wrapping a single value in a one-element vec.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, OneOrMany::Many(_))
    }
}

impl From<&str> for OneOrMany<String> {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<String> for OneOrMany<String> {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

impl From<Vec<String>> for OneOrMany<String> {
    fn from(values: Vec<String>) -> Self {
        OneOrMany::Many(values)
    }
}

impl From<Vec<&str>> for OneOrMany<String> {
    fn from(values: Vec<&str>) -> Self {
        OneOrMany::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for OneOrMany<String> {
    fn from(values: &[&str]) -> Self {
        OneOrMany::Many(values.iter().map(|v| v.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OneOrMany<String> {
    fn from(values: [&str; N]) -> Self {
        OneOrMany::Many(values.iter().map(|v| v.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_value_becomes_one_element_vec() {
        let order: OneOrMany<String> = "4eb854340acb04e870000010".into();
        assert!(!order.is_many());
        assert_eq!(order.into_vec(), vec!["4eb854340acb04e870000010".to_string()]);
    }

    #[test]
    fn sequences_keep_their_order() {
        let days: OneOrMany<String> = ["sat", "mon", "sat"].into();
        assert!(days.is_many());
        assert_eq!(days.into_vec(), vec!["sat", "mon", "sat"]);
    }

    #[test]
    fn empty_sequence_stays_many() {
        let empty: OneOrMany<String> = Vec::<String>::new().into();
        assert!(empty.is_many());
        assert!(empty.into_vec().is_empty());
    }
}
