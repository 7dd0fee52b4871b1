use log::{debug, info};

use crate::alignment::resolver::Alignment;
use crate::errors::AlignmentError;
use crate::timecode::micros_to_seconds;

// @const: Pairs sampled on each side of the midpoint
pub const DEFAULT_SAMPLE_WINDOW: usize = 20;

/// Systematic timing difference between the two tracks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftEstimate {
    // @field: Mean absolute start/end difference, microseconds
    pub offset_micros: i64,

    // @field: Mean signed difference (target minus source); positive when the target runs late
    pub signed_micros: i64,

    // @field: Number of pairs that contributed
    pub samples: usize,
}

impl DriftEstimate {
    pub fn offset_secs(&self) -> f64 {
        micros_to_seconds(self.offset_micros)
    }

    /// The source track runs ahead of the target
    pub fn source_is_early(&self) -> bool {
        self.signed_micros > 0
    }
}

/// Estimate drift from a window of pairs around the middle of the alignment.
///
/// `window` pairs are taken on each side of the midpoint. Each pair with both
/// sides present contributes the mean of its start and end differences. Fewer
/// than `2 * window` pairs is an error, as is a window with no usable pair.
pub fn estimate_drift(alignment: &Alignment, window: usize) -> Result<DriftEstimate, AlignmentError> {
    let required = window * 2;
    if window == 0 || alignment.len() < required {
        return Err(AlignmentError::InsufficientAlignments {
            found: alignment.len(),
            required: required.max(1),
        });
    }

    let midpoint = alignment.len() / 2;
    let sample = &alignment.pairs()[midpoint - window..midpoint + window];

    let mut absolute_total = 0i64;
    let mut signed_total = 0i64;
    let mut samples = 0i64;
    for pair in sample {
        let Some(target) = pair.target() else {
            continue;
        };
        if pair.source.units.is_empty() || target.units.is_empty() {
            continue;
        }
        let start_diff = target.span.start - pair.source.span.start;
        let end_diff = target.span.end - pair.source.span.end;
        absolute_total += (start_diff.abs() + end_diff.abs()) / 2;
        signed_total += (start_diff + end_diff) / 2;
        samples += 1;
    }

    if samples == 0 {
        return Err(AlignmentError::NoUsableSamples);
    }

    let estimate = DriftEstimate {
        offset_micros: absolute_total / samples,
        signed_micros: signed_total / samples,
        samples: samples as usize,
    };
    debug!(
        "Drift sampled over {} of {} pairs around position {}",
        estimate.samples,
        sample.len(),
        midpoint
    );
    info!("Estimated drift: {:.3}s", estimate.offset_secs());
    Ok(estimate)
}
