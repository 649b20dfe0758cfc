//! Primary-key/foreign-key join detection.
//!
//! For `T1 JOIN T2 ON T1.x = T2.y` where `y` is a unique key of `T2`, each
//! surviving `T1` row matches at most one `T2` row, so the join behaves like
//! a semi-join of `T1` (the FK side) filtered by the selectivity of `T2` (the
//! PK side). This gives far better estimates than the generic formula.
//!
//! When the PK side is filtered on its key (or on an alternate key), the
//! filter removes key values that may be common on the unfiltered FK side; the
//! ratio of the two sides' distinct key counts corrects for that. The classic
//! case is a sales fact table joined to a date dimension that is populated
//! years beyond the fact data.

use super::filters::classify_filters;
use super::metadata::{MetadataProvider, is_key};
use super::simple_tree::SimpleTreeChecker;
use crate::query::plan::{BinaryOp, JoinOp, JoinType, LogicalExpression, LogicalOperator};
use cardinal_common::types::ColumnSet;
use cardinal_common::utils::error::Result;
use std::fmt;

/// NDV placeholder reported when distinct counts were not computed.
pub const NDV_NOT_COMPUTED: f64 = -1.0;

/// One input of a binary join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    /// The left input (index 0).
    Left,
    /// The right input (index 1).
    Right,
}

impl JoinSide {
    /// Input index: 0 for left, 1 for right.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            JoinSide::Left => 0,
            JoinSide::Right => 1,
        }
    }

    /// The other input.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            JoinSide::Left => JoinSide::Right,
            JoinSide::Right => JoinSide::Left,
        }
    }
}

/// Statistics of the foreign-key (many) side after its local filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FkSideInfo {
    /// Filtered row count.
    pub row_count: f64,
    /// Distinct join-key values, or [`NDV_NOT_COMPUTED`].
    pub distinct_count: f64,
}

impl fmt::Display for FkSideInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rows={:.2}, ndv={:.2}", self.row_count, self.distinct_count)
    }
}

/// Statistics of the primary-key (one) side after its local filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PkSideInfo {
    /// Filtered row count.
    pub row_count: f64,
    /// Distinct join-key values, or [`NDV_NOT_COMPUTED`].
    pub distinct_count: f64,
    /// Fraction of the PK side's rows that survive its own filters; 1.0 when
    /// the join pads the PK side with nulls, since then no FK row is lost.
    pub selectivity: f64,
}

impl fmt::Display for PkSideInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows={:.2}, ndv={:.2}, selectivity={:.4}",
            self.row_count, self.distinct_count, self.selectivity
        )
    }
}

/// A detected primary-key/foreign-key relationship between join inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PkFkRelationInfo {
    /// Input holding the foreign key.
    pub fk_side: JoinSide,
    /// Foreign-key side statistics.
    pub fk_info: FkSideInfo,
    /// Primary-key side statistics.
    pub pk_info: PkSideInfo,
    /// `pk_ndv / fk_ndv` when the PK side is simple, otherwise exactly 1.0.
    pub ndv_scaling_factor: f64,
    /// Whether the PK subtree is simple on the join key.
    pub is_pk_side_simple: bool,
}

impl PkFkRelationInfo {
    /// Input holding the unique key.
    #[must_use]
    pub fn pk_side(&self) -> JoinSide {
        self.fk_side.opposite()
    }

    /// Fraction of FK-side rows expected to find a match, capped at 1.0.
    #[must_use]
    pub fn join_selectivity(&self) -> f64 {
        (self.pk_info.selectivity * self.ndv_scaling_factor).min(1.0)
    }
}

impl fmt::Display for PkFkRelationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pk-fk join: fk side {}", self.fk_side.index())?;
        writeln!(f, "  fk: {}", self.fk_info)?;
        writeln!(f, "  pk: {}", self.pk_info)?;
        writeln!(f, "  pk side simple: {}", self.is_pk_side_simple)?;
        writeln!(f, "  ndv scaling factor: {:.2}", self.ndv_scaling_factor)
    }
}

/// Per-input facts gathered while analyzing a join.
struct SideFacts<'j> {
    input: &'j LogicalOperator,
    column: usize,
    predicate: LogicalExpression,
    selectivity: f64,
    row_count: f64,
}

/// Decides whether a join follows a PK/FK pattern.
pub struct PkFkJoinAnalyzer<'a, M: MetadataProvider + ?Sized> {
    provider: &'a M,
    ndv_scaling: bool,
}

impl<'a, M: MetadataProvider + ?Sized> PkFkJoinAnalyzer<'a, M> {
    /// Creates an analyzer querying `provider`, with NDV scaling enabled.
    pub fn new(provider: &'a M) -> Self {
        Self {
            provider,
            ndv_scaling: true,
        }
    }

    /// Enables or disables NDV scaling.
    #[must_use]
    pub fn with_ndv_scaling(mut self, enabled: bool) -> Self {
        self.ndv_scaling = enabled;
        self
    }

    /// Analyzes `join`, returning the PK/FK relationship if one exists.
    ///
    /// `Ok(None)` means the join does not qualify: no condition, a semi-join,
    /// anything other than a single column-to-column equality left after
    /// pushing single-input predicates down, or no side unique on its join
    /// column.
    ///
    /// # Errors
    ///
    /// Returns an error if the condition references columns outside the joined
    /// row, and propagates metadata provider failures.
    pub fn analyze(&self, join: &JoinOp) -> Result<Option<PkFkRelationInfo>> {
        let conjuncts = join.condition.conjunctions();
        if conjuncts.is_empty() {
            tracing::trace!("join has no condition");
            return Ok(None);
        }

        // Semi-join rows are laid out differently from their conditions.
        if join.join_type == JoinType::Semi {
            return Ok(None);
        }

        let classified = classify_filters(
            join,
            conjuncts,
            !join.join_type.generates_nulls_on_right(),
            !join.join_type.generates_nulls_on_left(),
        )?;
        let join_type = classified.join_type;

        let Some((left_column, right_column)) = join_columns(join, &classified.join_filters)
        else {
            return Ok(None);
        };

        let left_predicate = LogicalExpression::conjunction(classified.left_filters);
        let right_predicate = LogicalExpression::conjunction(classified.right_filters);

        // Dim LEFT JOIN Fact and Fact RIGHT JOIN Dim are not PK/FK shaped:
        // the unique side would be the preserved one.
        let mut left_is_key = matches!(join_type, JoinType::Inner | JoinType::Right)
            && is_key(self.provider, &ColumnSet::of(left_column), &join.left)?;
        let right_is_key = matches!(join_type, JoinType::Inner | JoinType::Left)
            && is_key(self.provider, &ColumnSet::of(right_column), &join.right)?;

        if !left_is_key && !right_is_key {
            tracing::trace!(left_column, right_column, "neither join column is a unique key");
            return Ok(None);
        }

        let left = self.side_facts(&join.left, left_column, left_predicate)?;
        let right = self.side_facts(&join.right, right_column, right_predicate)?;

        // Both unique: the smaller side is taken as the dimension.
        if left_is_key && right_is_key && right.row_count < left.row_count {
            left_is_key = false;
        }

        let pk_side = if left_is_key {
            JoinSide::Left
        } else {
            JoinSide::Right
        };
        let (pk, fk) = match pk_side {
            JoinSide::Left => (&left, &right),
            JoinSide::Right => (&right, &left),
        };

        let is_pk_side_simple = SimpleTreeChecker::new(self.provider).is_simple(pk.input, pk.column)?;

        let (pk_ndv, fk_ndv) = if is_pk_side_simple {
            (self.distinct_count(pk)?, self.distinct_count(fk)?)
        } else {
            (NDV_NOT_COMPUTED, NDV_NOT_COMPUTED)
        };

        let ndv_scaling_factor = if is_pk_side_simple && self.ndv_scaling {
            scaling_factor(pk_ndv, fk_ndv)
        } else {
            1.0
        };

        let nulls_on_pk_side = match pk_side {
            JoinSide::Left => join_type.generates_nulls_on_left(),
            JoinSide::Right => join_type.generates_nulls_on_right(),
        };
        let pk_selectivity = if nulls_on_pk_side {
            1.0
        } else {
            pk.selectivity
        };

        let info = PkFkRelationInfo {
            fk_side: pk_side.opposite(),
            fk_info: FkSideInfo {
                row_count: fk.row_count,
                distinct_count: fk_ndv,
            },
            pk_info: PkSideInfo {
                row_count: pk.row_count,
                distinct_count: pk_ndv,
                selectivity: pk_selectivity,
            },
            ndv_scaling_factor,
            is_pk_side_simple,
        };
        tracing::debug!("{info}for join:\n{join}");
        Ok(Some(info))
    }

    fn side_facts<'j>(
        &self,
        input: &'j LogicalOperator,
        column: usize,
        predicate: LogicalExpression,
    ) -> Result<SideFacts<'j>> {
        let selectivity = self.provider.selectivity(input, &predicate)?;
        let row_count = self.provider.row_count(input)? * selectivity;
        Ok(SideFacts {
            input,
            column,
            predicate,
            selectivity,
            row_count,
        })
    }

    fn distinct_count(&self, side: &SideFacts<'_>) -> Result<f64> {
        self.provider
            .distinct_row_count(side.input, &ColumnSet::of(side.column), &side.predicate)
    }
}

/// Extracts `(left_column, right_column)` from the single residual join
/// predicate, in each input's own ordinals.
///
/// Operands given in right-then-left order are swapped.
fn join_columns(join: &JoinOp, join_filters: &[LogicalExpression]) -> Option<(usize, usize)> {
    let [condition] = join_filters else {
        tracing::trace!(count = join_filters.len(), "expected exactly one join predicate");
        return None;
    };
    let LogicalExpression::Binary {
        left,
        op: BinaryOp::Eq,
        right,
    } = condition
    else {
        tracing::trace!(%condition, "join predicate is not an equality");
        return None;
    };

    let left_refs = left.referenced_columns();
    let right_refs = right.referenced_columns();
    if left_refs.len() != 1 || right_refs.len() != 1 {
        tracing::trace!(%condition, "equality operands must each reference one column");
        return None;
    }
    let mut left_ordinal = left_refs.first()?;
    let mut right_ordinal = right_refs.first()?;

    let left_range = join.left_columns();
    let right_range = join.right_columns();
    if right_range.contains(left_ordinal) {
        std::mem::swap(&mut left_ordinal, &mut right_ordinal);
    }
    if !left_range.contains(left_ordinal) || !right_range.contains(right_ordinal) {
        tracing::trace!(%condition, "equality does not connect the two inputs");
        return None;
    }

    let sys = join.system_field_count;
    Some((left_ordinal - sys, right_ordinal - sys - join.left.column_count()))
}

fn scaling_factor(pk_ndv: f64, fk_ndv: f64) -> f64 {
    if fk_ndv > 0.0 && fk_ndv.is_finite() && pk_ndv.is_finite() {
        pk_ndv / fk_ndv
    } else {
        tracing::warn!(pk_ndv, fk_ndv, "unusable distinct counts, skipping NDV scaling");
        1.0
    }
}
