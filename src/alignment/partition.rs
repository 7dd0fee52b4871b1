/*!
 * Partitioning of the collated timeline into independent sections.
 *
 * - connected components of overlapping units (including links through a shared utterance)
 * - sections separated by silences of at least a threshold
 * - merging of sections whose last sentence trails off into the next one
 * - equal-count groups extended until they end at a large enough gap
 */

use std::collections::{HashMap, HashSet};
use std::fmt;
use log::debug;

use crate::alignment::utterance::UtteranceSet;
use crate::errors::AlignmentError;
use crate::subtitle_processor::{CaptionUnit, TrackSide, UnitId};
use crate::text_filter::trails_off;
use crate::timecode::{TimeSpan, Timed};

/// Units and utterances of one language within a partition
#[derive(Debug, Clone, Default)]
pub struct PartitionSide {
    pub units: Vec<CaptionUnit>,
    pub utterances: UtteranceSet,
}

impl PartitionSide {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The latest-starting utterance trails off
    pub fn trails_off(&self) -> bool {
        self.utterances
            .as_slice()
            .last()
            .is_some_and(|utterance| trails_off(&utterance.text))
    }

    /// Utterance texts in time order
    pub fn texts(&self) -> Vec<String> {
        self.utterances.iter().map(|u| u.text.clone()).collect()
    }
}

// @struct: A time-bounded group of units from both languages
#[derive(Debug, Clone)]
pub struct Partition {
    // @field: Position in the partition list
    pub index: usize,

    // @field: Union of every member unit's interval
    pub span: TimeSpan,

    pub source: PartitionSide,
    pub target: PartitionSide,
}

impl Partition {
    /// Group units by side; `utterances_for` supplies each side's utterances
    fn from_units<F>(index: usize, units: Vec<&CaptionUnit>, mut utterances_for: F) -> Self
    where
        F: FnMut(TrackSide, &[CaptionUnit]) -> UtteranceSet,
    {
        let span = units
            .iter()
            .map(|unit| unit.span)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();

        let (mut source_units, mut target_units): (Vec<CaptionUnit>, Vec<CaptionUnit>) = units
            .into_iter()
            .cloned()
            .partition(|unit| unit.is_source());
        source_units.sort_by_key(|unit| (unit.span.start, unit.id));
        target_units.sort_by_key(|unit| (unit.span.start, unit.id));

        let source_utterances = utterances_for(TrackSide::Source, &source_units);
        let target_utterances = utterances_for(TrackSide::Target, &target_units);

        Partition {
            index,
            span,
            source: PartitionSide { units: source_units, utterances: source_utterances },
            target: PartitionSide { units: target_units, utterances: target_utterances },
        }
    }

    pub fn side(&self, side: TrackSide) -> &PartitionSide {
        match side {
            TrackSide::Source => &self.source,
            TrackSide::Target => &self.target,
        }
    }

    pub fn unit_count(&self) -> usize {
        self.source.units.len() + self.target.units.len()
    }

    pub fn unit_ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.source.units.iter().chain(self.target.units.iter()).map(|unit| unit.id)
    }

    /// Silence between this partition and a later one
    pub fn gap_to(&self, later: &Partition) -> i64 {
        self.span.gap_to(&later.span)
    }

    /// Absorb a later partition and re-derive both sides' utterances
    pub fn absorb(&mut self, later: Partition, find_boundaries: bool) {
        self.span = self.span.union(&later.span);
        for (mine, theirs) in [(&mut self.source, later.source), (&mut self.target, later.target)] {
            mine.units.extend(theirs.units);
            mine.units.sort_by_key(|unit| (unit.span.start, unit.id));
            mine.utterances = UtteranceSet::assemble(&mine.units, find_boundaries);
        }
    }
}

impl Timed for Partition {
    fn span(&self) -> TimeSpan {
        self.span
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Units: {} <-> {}, Utterances: {} <-> {}",
            self.source.units.len(),
            self.target.units.len(),
            self.source.utterances.len(),
            self.target.utterances.len()
        )
    }
}

/// Connected components of the collated units.
///
/// Two units are linked when their intervals overlap strictly or when one
/// utterance draws on both. Components are found with an explicit stack and
/// emitted in order of their earliest unit. Each side keeps the utterances
/// already assembled for the whole track.
pub fn partition_by_components(
    collated: &[&CaptionUnit],
    source_utterances: &UtteranceSet,
    target_utterances: &UtteranceSet,
) -> Vec<Partition> {
    let by_id: HashMap<UnitId, &CaptionUnit> = collated.iter().map(|unit| (unit.id, *unit)).collect();
    let utterances_of = |side: TrackSide| match side {
        TrackSide::Source => source_utterances,
        TrackSide::Target => target_utterances,
    };

    let mut assigned: HashSet<UnitId> = HashSet::with_capacity(collated.len());
    let mut partitions = Vec::new();

    for seed in collated {
        if assigned.contains(&seed.id) {
            continue;
        }

        let mut members: Vec<&CaptionUnit> = Vec::new();
        let mut stack = vec![*seed];
        assigned.insert(seed.id);

        while let Some(unit) = stack.pop() {
            members.push(unit);

            // Collated is sorted by start, so nothing past `unit.end` can overlap
            for other in collated.iter().take_while(|other| other.span.start < unit.span.end) {
                if !assigned.contains(&other.id) && other.span.overlaps_strictly(&unit.span) {
                    assigned.insert(other.id);
                    stack.push(*other);
                }
            }

            let utterances = utterances_of(unit.id.side);
            for utterance in utterances.utterances_for_unit(unit.id) {
                for linked in &utterance.units {
                    if let Some(other) = by_id.get(linked) {
                        if assigned.insert(*linked) {
                            stack.push(*other);
                        }
                    }
                }
            }
        }

        let index = partitions.len();
        partitions.push(Partition::from_units(index, members, |side, units| {
            inherited_utterances(utterances_of(side), units)
        }));
    }

    debug!("Found {} connected partitions over {} units", partitions.len(), collated.len());
    partitions
}

fn inherited_utterances(all: &UtteranceSet, units: &[CaptionUnit]) -> UtteranceSet {
    let mut ids: Vec<usize> = units
        .iter()
        .flat_map(|unit| all.utterance_ids_for_unit(unit.id))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    UtteranceSet::from_utterances(ids.into_iter().filter_map(|id| all.get(id).cloned()).collect())
}

/// Contiguous runs of start-sorted items separated by gaps of at least `threshold_micros`.
///
/// Each gap is measured from the latest end seen so far, so a long item keeps
/// covering the ones it spans. The trailing run is always emitted.
pub fn gap_sections<T: Timed>(items: &[T], threshold_micros: i64) -> Vec<&[T]> {
    let mut sections = Vec::new();
    let Some(first) = items.first() else {
        return sections;
    };

    let mut section_start = 0;
    let mut latest_end = first.end();
    for (i, item) in items.iter().enumerate().skip(1) {
        if item.start() - latest_end >= threshold_micros {
            sections.push(&items[section_start..i]);
            section_start = i;
        }
        latest_end = latest_end.max(item.end());
    }
    sections.push(&items[section_start..]);
    sections
}

/// Partition the collated units at silences, re-deriving utterances inside each section
pub fn partition_by_gaps(collated: &[&CaptionUnit], threshold_micros: i64, find_boundaries: bool) -> Vec<Partition> {
    let partitions: Vec<Partition> = gap_sections(collated, threshold_micros)
        .into_iter()
        .enumerate()
        .map(|(index, section)| {
            Partition::from_units(index, section.to_vec(), |_, units| UtteranceSet::assemble(units, find_boundaries))
        })
        .collect();

    debug!(
        "Split {} units into {} sections at gaps of {} us",
        collated.len(),
        partitions.len(),
        threshold_micros
    );
    partitions
}

/// Merge a partition into its successor while the gap between them is below
/// `threshold_micros` and either side's last utterance trails off.
/// A non-positive threshold leaves the list untouched.
pub fn merge_ellipsized(partitions: Vec<Partition>, threshold_micros: i64, find_boundaries: bool) -> Vec<Partition> {
    if threshold_micros <= 0 {
        return partitions;
    }

    let before = partitions.len();
    let mut merged: Vec<Partition> = Vec::with_capacity(before);
    for next in partitions {
        match merged.last_mut() {
            Some(current)
                if current.gap_to(&next) < threshold_micros
                    && (current.source.trails_off() || current.target.trails_off()) =>
            {
                current.absorb(next, find_boundaries);
            }
            _ => merged.push(next),
        }
    }

    for (index, partition) in merged.iter_mut().enumerate() {
        partition.index = index;
    }
    debug!("Ellipsis merge: {} -> {} partitions", before, merged.len());
    merged
}

/// Split items into `n` groups of near-equal count, then grow each group
/// (except the last) until the gap after it reaches `gap_threshold_micros`
/// or only one item would be left for the rest.
pub fn partition_equal_size<T: Timed>(
    items: &[T],
    n: usize,
    gap_threshold_micros: i64,
) -> Result<Vec<&[T]>, AlignmentError> {
    if n == 0 {
        return Err(AlignmentError::InvalidPartitionCount(n));
    }

    let total = items.len();
    let base = total / n;
    let remainder = total % n;
    let mut groups = Vec::with_capacity(n);
    let mut start = 0;

    for i in 0..n {
        if start >= total {
            break;
        }
        let mut size = (base + usize::from(i < remainder)).min(total - start);
        if size == 0 {
            continue;
        }

        if i + 1 < n {
            while start + size < total - 1
                && items[start + size].start() - items[start + size - 1].end() < gap_threshold_micros
            {
                size += 1;
            }
        }

        groups.push(&items[start..start + size]);
        start += size;
    }

    Ok(groups)
}

/// Source units of one split section paired with the target units assigned to it
pub type SplitGroup<'a> = (Vec<&'a CaptionUnit>, Vec<&'a CaptionUnit>);

/// Cut both tracks at the silences of the source track.
///
/// Each target unit goes to the last section starting at or before it (the
/// first section for units before any). Units keep their relative order.
pub fn split_by_source_gaps<'a>(
    source: &'a [CaptionUnit],
    target: &'a [CaptionUnit],
    threshold_micros: i64,
) -> Vec<SplitGroup<'a>> {
    assign_targets(gap_sections(source, threshold_micros), target)
}

/// Cut both tracks into `parts` source groups of near-equal size, each ending at a silence
pub fn split_equal_by_source<'a>(
    source: &'a [CaptionUnit],
    target: &'a [CaptionUnit],
    parts: usize,
    gap_threshold_micros: i64,
) -> Result<Vec<SplitGroup<'a>>, AlignmentError> {
    let sections = partition_equal_size(source, parts, gap_threshold_micros)?;
    Ok(assign_targets(sections, target))
}

fn assign_targets<'a>(sections: Vec<&'a [CaptionUnit]>, target: &'a [CaptionUnit]) -> Vec<SplitGroup<'a>> {
    let mut groups: Vec<SplitGroup<'a>> = sections
        .iter()
        .map(|&section| (section.iter().collect(), Vec::new()))
        .collect();

    if groups.is_empty() {
        return groups;
    }

    let section_starts: Vec<i64> = sections.iter().filter_map(|s| s.first()).map(|unit| unit.span.start).collect();
    for unit in target {
        let position = section_starts.partition_point(|&start| start <= unit.span.start);
        groups[position.saturating_sub(1)].1.push(unit);
    }
    groups
}
