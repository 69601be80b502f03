//! Content matching of rows and columns in merge mode
//!
//! There is no durable cross-restore key for a row or column, so merge mode
//! recovers the destination record by comparing content. Callers only see
//! [`DimensionMatcher`]; a hash-indexed matcher can replace the linear scan
//! without touching them.
//!
//! Known weakness: when two destination records share identical content the
//! first one in store order wins.

use crate::model::{Dimension, DimensionKind};
use crate::restore::records::DimensionRecord;

/// The compared fields of a backup row or column
#[derive(Debug, Clone, Copy)]
pub struct DimensionProbe<'a> {
    pub kind: DimensionKind,
    pub shorttext: &'a str,
    pub description: &'a str,
    pub feedback: &'a str,
}

impl<'a> DimensionProbe<'a> {
    pub fn from_record(kind: DimensionKind, record: &'a DimensionRecord) -> Self {
        Self {
            kind,
            shorttext: &record.shorttext,
            description: &record.description.text,
            feedback: record.feedback.as_ref().map_or("", |f| f.text.as_str()),
        }
    }
}

/// Strategy for recovering an existing row or column
pub trait DimensionMatcher {
    /// First candidate equivalent to the probe, if any
    fn find<'c>(&self, candidates: &'c [Dimension], probe: &DimensionProbe<'_>)
        -> Option<&'c Dimension>;
}

/// Byte-exact comparison of short text, description text and (rows only)
/// feedback text. No case or whitespace normalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactContentMatcher;

impl DimensionMatcher for ExactContentMatcher {
    fn find<'c>(
        &self,
        candidates: &'c [Dimension],
        probe: &DimensionProbe<'_>,
    ) -> Option<&'c Dimension> {
        find_matching_dimension(candidates, probe)
    }
}

/// Linear first-match scan used by [`ExactContentMatcher`]
pub fn find_matching_dimension<'c>(
    candidates: &'c [Dimension],
    probe: &DimensionProbe<'_>,
) -> Option<&'c Dimension> {
    candidates.iter().find(|existing| {
        if existing.kind != probe.kind
            || existing.shorttext != probe.shorttext
            || existing.description.text != probe.description
        {
            return false;
        }
        if probe.kind.has_feedback() {
            let feedback = existing.feedback.as_ref().map_or("", |f| f.text.as_str());
            return feedback == probe.feedback;
        }
        true
    })
}
