//! Per-frame annotation records and the frame → record index.
//!
//! A recorded-video analysis arrives as a sparse, unordered batch of
//! `{"frame", "violations", "keypoints"}` entries. [`AnnotationIndex`] is
//! built once per batch and answers O(1) lookups by frame index while the
//! video plays. Entries that cannot be interpreted are skipped, never
//! fatal to the batch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::skeleton::KeypointSet;
use crate::types::FrameIndex;

// ---------------------------------------------------------------------------
// AnnotationRecord
// ---------------------------------------------------------------------------

/// Keypoints and violation messages computed for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationRecord {
    pub frame_index: FrameIndex,
    pub keypoints: Option<KeypointSet>,
    pub violations: Vec<String>,
}

impl AnnotationRecord {
    pub fn new(frame_index: FrameIndex) -> Self {
        Self {
            frame_index,
            keypoints: None,
            violations: Vec::new(),
        }
    }

    pub fn with_keypoints(mut self, keypoints: KeypointSet) -> Self {
        self.keypoints = Some(keypoints);
        self
    }

    pub fn with_violations<I, S>(mut self, violations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.violations = violations.into_iter().map(Into::into).collect();
        self
    }

    /// Keypoints worth drawing: present and non-empty.
    pub fn drawable_keypoints(&self) -> Option<&KeypointSet> {
        self.keypoints.as_ref().filter(|kp| !kp.is_empty())
    }
}

/// Wire shape of one batch entry before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnnotation {
    #[serde(default)]
    pub frame: Option<i64>,
    #[serde(default)]
    pub violations: Option<Vec<String>>,
    #[serde(default)]
    pub keypoints: Option<KeypointSet>,
}

impl TryFrom<RawAnnotation> for AnnotationRecord {
    type Error = CoreError;

    fn try_from(raw: RawAnnotation) -> Result<Self, Self::Error> {
        let frame = raw.frame.ok_or_else(|| {
            CoreError::MalformedAnnotation("missing frame index".to_string())
        })?;
        let frame_index = FrameIndex::try_from(frame).map_err(|_| {
            CoreError::MalformedAnnotation(format!("negative frame index {frame}"))
        })?;

        Ok(Self {
            frame_index,
            keypoints: raw.keypoints,
            violations: raw.violations.unwrap_or_default(),
        })
    }
}

/// Interpret a single JSON batch entry.
pub fn parse_annotation(value: &serde_json::Value) -> Result<AnnotationRecord, CoreError> {
    let raw: RawAnnotation = serde_json::from_value(value.clone())
        .map_err(|e| CoreError::MalformedAnnotation(e.to_string()))?;
    AnnotationRecord::try_from(raw)
}

// ---------------------------------------------------------------------------
// AnnotationIndex
// ---------------------------------------------------------------------------

/// Counts gathered while indexing a JSON batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Distinct frames in the resulting index.
    pub indexed: usize,
    /// Entries dropped as malformed.
    pub skipped: usize,
    /// Entries that replaced an earlier entry for the same frame.
    pub overwritten: usize,
}

/// Frame index → annotation record for one analysis batch.
///
/// Immutable once built; a new batch produces a new index.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    records: HashMap<FrameIndex, AnnotationRecord>,
}

impl AnnotationIndex {
    /// Index `records`. When two records share a frame index, the later
    /// one in iteration order wins.
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = AnnotationRecord>,
    {
        Self::build_counting(records).0
    }

    /// Index a raw JSON batch, skipping malformed entries.
    pub fn from_batch(entries: &[serde_json::Value]) -> (Self, BatchSummary) {
        let mut skipped = 0;
        let records = entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| match parse_annotation(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(entry = i, error = %e, "Skipping malformed annotation");
                    None
                }
            })
            .collect::<Vec<_>>();

        let (index, overwritten) = Self::build_counting(records);
        let summary = BatchSummary {
            indexed: index.len(),
            skipped,
            overwritten,
        };
        tracing::debug!(
            indexed = summary.indexed,
            skipped = summary.skipped,
            overwritten = summary.overwritten,
            "Annotation batch indexed",
        );
        (index, summary)
    }

    /// Record for `frame`, or `None` when the batch has nothing for it.
    pub fn lookup(&self, frame: FrameIndex) -> Option<&AnnotationRecord> {
        self.records.get(&frame)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Indexed frames in ascending order.
    pub fn frames(&self) -> Vec<FrameIndex> {
        let mut frames: Vec<_> = self.records.keys().copied().collect();
        frames.sort_unstable();
        frames
    }

    fn build_counting<I>(records: I) -> (Self, usize)
    where
        I: IntoIterator<Item = AnnotationRecord>,
    {
        let iter = records.into_iter();
        let mut map = HashMap::with_capacity(iter.size_hint().0);
        let mut overwritten = 0;
        for record in iter {
            if map.insert(record.frame_index, record).is_some() {
                overwritten += 1;
            }
        }
        (Self { records: map }, overwritten)
    }
}
