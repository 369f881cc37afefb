use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::model::{CategoricalField, NumericField, Table, VideoRecord};
use crate::error::{EngineError, EngineResult, Outcome};

// ---------------------------------------------------------------------------
// Filter predicates: allowed values per categorical column, ranges per
// numeric column
// ---------------------------------------------------------------------------

/// A user selection with no values in it does not restrict the column.
///
/// Selecting nothing in a multi-select means "show everything", never
/// "hide everything". [`Membership::from_selection`] is the only place
/// that turns a raw selection into a predicate and it honours this flag.
pub const EMPTY_SELECTION_IS_UNRESTRICTED: bool = true;

/// Membership predicate for one categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Membership {
    /// Every value passes, including absent ones.
    Unrestricted,
    /// Only the listed values pass. An empty set here is the result of
    /// intersecting disjoint selections and passes nothing.
    OneOf(BTreeSet<String>),
}

impl Membership {
    /// Build the predicate for a multi-select widget's current selection.
    pub fn from_selection<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if allowed.is_empty() && EMPTY_SELECTION_IS_UNRESTRICTED {
            Membership::Unrestricted
        } else {
            Membership::OneOf(allowed)
        }
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Membership::Unrestricted => true,
            Membership::OneOf(allowed) => value.is_some_and(|v| allowed.contains(v)),
        }
    }

    fn and(&self, other: &Membership) -> Membership {
        match (self, other) {
            (Membership::Unrestricted, m) | (m, Membership::Unrestricted) => m.clone(),
            (Membership::OneOf(a), Membership::OneOf(b)) => {
                Membership::OneOf(a.intersection(b).cloned().collect())
            }
        }
    }
}

/// Closed interval `[lo, hi]` over a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    lo: f64,
    hi: f64,
}

impl NumericRange {
    pub fn new(field: NumericField, lo: f64, hi: f64) -> EngineResult<Self> {
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Err(EngineError::InvalidRange {
                field: field.as_str().to_string(),
                lo,
                hi,
            });
        }
        Ok(NumericRange { lo, hi })
    }

    /// Missing values never pass.
    pub fn matches(&self, value: Option<f64>) -> bool {
        value.is_some_and(|v| self.lo <= v && v <= self.hi)
    }

    /// Overlap of two ranges. Disjoint ranges give an inverted interval,
    /// which matches nothing.
    fn and(&self, other: &NumericRange) -> NumericRange {
        NumericRange {
            lo: self.lo.max(other.lo),
            hi: self.hi.min(other.hi),
        }
    }
}

/// All active filter constraints, combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredicateSet {
    categorical: BTreeMap<CategoricalField, Membership>,
    numeric: BTreeMap<NumericField, NumericRange>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict a categorical column to a multi-select's values.
    /// Replaces any earlier predicate on the same column.
    pub fn with_selection<I, S>(mut self, field: CategoricalField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical
            .insert(field, Membership::from_selection(values));
        self
    }

    /// Restrict a numeric column to `[lo, hi]`.
    /// Replaces any earlier predicate on the same column.
    pub fn with_range(mut self, field: NumericField, lo: f64, hi: f64) -> EngineResult<Self> {
        self.numeric.insert(field, NumericRange::new(field, lo, hi)?);
        Ok(self)
    }

    pub fn membership(&self, field: CategoricalField) -> Option<&Membership> {
        self.categorical.get(&field)
    }

    /// Conjunction of two predicate sets: a record passes the result iff it
    /// passes both inputs.
    pub fn and(&self, other: &PredicateSet) -> PredicateSet {
        let mut combined = self.clone();
        for (field, membership) in &other.categorical {
            let merged = match combined.categorical.get(field) {
                Some(existing) => existing.and(membership),
                None => membership.clone(),
            };
            combined.categorical.insert(*field, merged);
        }
        for (field, range) in &other.numeric {
            let merged = match combined.numeric.get(field) {
                Some(existing) => existing.and(range),
                None => *range,
            };
            combined.numeric.insert(*field, merged);
        }
        combined
    }

    /// Whether a single record passes every predicate.
    pub fn matches(&self, record: &VideoRecord) -> bool {
        self.categorical
            .iter()
            .all(|(field, membership)| membership.matches(record.categorical(*field)))
            && self
                .numeric
                .iter()
                .all(|(field, range)| range.matches(record.numeric(*field)))
    }
}

// ---------------------------------------------------------------------------
// Filtered view over a table
// ---------------------------------------------------------------------------

/// The rows of a [`Table`] that passed a [`PredicateSet`], in table order.
#[derive(Debug, Clone)]
pub struct FilteredRows<'a> {
    table: &'a Table,
    indices: Vec<usize>,
}

impl<'a> FilteredRows<'a> {
    /// Every row of the table, unfiltered.
    pub fn all(table: &'a Table) -> Self {
        FilteredRows {
            table,
            indices: (0..table.len()).collect(),
        }
    }

    /// Table positions of the surviving rows, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a VideoRecord> + '_ {
        let records = self.table.records();
        self.indices.iter().map(move |&i| &records[i])
    }
}

/// Return the rows passing every predicate, or [`Outcome::Empty`] when none
/// do. The table is not modified and row order is preserved.
pub fn apply<'a>(table: &'a Table, predicates: &PredicateSet) -> Outcome<FilteredRows<'a>> {
    let indices: Vec<usize> = table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| predicates.matches(record))
        .map(|(i, _)| i)
        .collect();

    log::debug!("filter kept {} of {} rows", indices.len(), table.len());

    if indices.is_empty() {
        Outcome::Empty
    } else {
        Outcome::Ready(FilteredRows { table, indices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(claim: &str, ban: &str, views: Option<f64>) -> VideoRecord {
        VideoRecord {
            claim_status: Some(claim.to_string()),
            author_ban_status: Some(ban.to_string()),
            video_view_count: views,
            ..Default::default()
        }
    }

    fn table() -> Table {
        Table::from_records(vec![
            video("claim", "active", Some(100.0)),
            video("opinion", "under review", Some(2_000.0)),
            video("claim", "banned", None),
            video("opinion", "active", Some(50.0)),
            video("claim", "under review", Some(900.0)),
        ])
    }

    fn kept(table: &Table, predicates: &PredicateSet) -> Vec<usize> {
        match apply(table, predicates) {
            Outcome::Ready(rows) => rows.indices().to_vec(),
            Outcome::Empty => Vec::new(),
        }
    }

    #[test]
    fn empty_selection_passes_every_value() {
        assert!(EMPTY_SELECTION_IS_UNRESTRICTED);
        let t = table();
        assert_eq!(t.distinct_values(CategoricalField::AuthorBanStatus).len(), 3);
        let p = PredicateSet::new().with_selection(CategoricalField::AuthorBanStatus, Vec::<String>::new());
        assert_eq!(kept(&t, &p), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn selection_keeps_table_order() {
        let t = table();
        let p = PredicateSet::new()
            .with_selection(CategoricalField::AuthorBanStatus, ["under review", "active"]);
        assert_eq!(kept(&t, &p), vec![0, 1, 3, 4]);
    }

    #[test]
    fn range_is_inclusive_and_drops_missing() {
        let t = table();
        let p = PredicateSet::new()
            .with_range(NumericField::VideoViewCount, 100.0, 900.0)
            .unwrap();
        assert_eq!(kept(&t, &p), vec![0, 4]);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = PredicateSet::new()
            .with_range(NumericField::VideoLikeCount, 5.0, 1.0)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRange { .. }));
        assert!(NumericRange::new(NumericField::VideoLikeCount, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn no_match_is_empty_outcome() {
        let t = table();
        let p = PredicateSet::new().with_selection(CategoricalField::ClaimStatus, ["rumour"]);
        assert!(apply(&t, &p).is_empty());
    }

    #[test]
    fn disjoint_selections_pass_nothing() {
        let a = PredicateSet::new().with_selection(CategoricalField::ClaimStatus, ["claim"]);
        let b = PredicateSet::new().with_selection(CategoricalField::ClaimStatus, ["opinion"]);
        let both = a.and(&b);
        assert_eq!(
            both.membership(CategoricalField::ClaimStatus),
            Some(&Membership::OneOf(BTreeSet::new()))
        );
        assert!(apply(&table(), &both).is_empty());
    }

    #[test]
    fn unrestricted_is_identity_for_and() {
        let a = PredicateSet::new().with_selection(CategoricalField::ClaimStatus, Vec::<&str>::new());
        let b = PredicateSet::new().with_selection(CategoricalField::ClaimStatus, ["opinion"]);
        assert_eq!(
            a.and(&b).membership(CategoricalField::ClaimStatus),
            b.membership(CategoricalField::ClaimStatus)
        );
    }

    #[test]
    fn absent_value_fails_restricted_membership() {
        let t = Table::from_records(vec![VideoRecord::default()]);
        let restricted = PredicateSet::new().with_selection(CategoricalField::ClaimStatus, ["claim"]);
        assert!(apply(&t, &restricted).is_empty());
        assert_eq!(kept(&t, &PredicateSet::new()), vec![0]);
    }
}
