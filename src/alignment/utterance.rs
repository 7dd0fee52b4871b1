use std::collections::{BTreeSet, HashMap};
use std::fmt;
use log::debug;

use crate::subtitle_processor::{CaptionUnit, TrackSide, UnitId};
use crate::text_filter::{ends_sentence, starts_sentence};
use crate::timecode::{TimeSpan, Timed};

// @module: Utterances assembled from caption fragments

// @struct: One sentence, possibly spanning several caption units
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    // @field: Position in the owning set
    pub id: usize,

    // @field: Filtered text
    pub text: String,

    // @field: Caption units this utterance draws on (never empty)
    pub units: BTreeSet<UnitId>,

    // @field: Union of the units' intervals
    pub span: TimeSpan,
}

impl Utterance {
    /// Provisional utterance for one fragment of one unit
    pub fn from_fragment(unit: &CaptionUnit, text: &str) -> Self {
        Utterance {
            id: 0,
            text: text.trim().to_string(),
            units: BTreeSet::from([unit.id]),
            span: unit.span,
        }
    }

    /// Absorb `other`: texts joined by one space, units and span unioned
    pub fn merge(&mut self, other: &Utterance) {
        if self.text.is_empty() {
            self.text = other.text.clone();
        } else if !other.text.is_empty() {
            self.text.push(' ');
            self.text.push_str(&other.text);
        }
        self.units.extend(other.units.iter().copied());
        self.span = self.span.union(&other.span);
    }

    /// File indices of the contributing units, for `.sent-index` output.
    /// `units` may be a whole track or any subset of it.
    pub fn unit_indices(&self, units: &[CaptionUnit]) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .units
            .iter()
            .filter_map(|id| {
                units
                    .get(id.position)
                    .filter(|unit| unit.id == *id)
                    .or_else(|| units.iter().find(|unit| unit.id == *id))
            })
            .map(|unit| unit.index)
            .collect();
        indices.sort_unstable();
        indices
    }

    pub fn side(&self) -> Option<TrackSide> {
        self.units.iter().next().map(|id| id.side)
    }
}

impl Timed for Utterance {
    fn span(&self) -> TimeSpan {
        self.span
    }
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// All utterances of one side, sorted by start, with a unit -> utterance index
#[derive(Debug, Clone, Default)]
pub struct UtteranceSet {
    utterances: Vec<Utterance>,
    by_unit: HashMap<UnitId, BTreeSet<usize>>,
}

impl UtteranceSet {
    /// Assemble utterances from units given in time order.
    ///
    /// Each fragment starts as its own utterance. Consecutive utterances are then
    /// merged until the accumulated text ends a sentence and the next one starts
    /// one. With `find_boundaries` off, every fragment stays separate.
    pub fn assemble<'a, I>(units: I, find_boundaries: bool) -> Self
    where
        I: IntoIterator<Item = &'a CaptionUnit>,
    {
        let provisional: Vec<Utterance> = units
            .into_iter()
            .flat_map(|unit| unit.fragments.iter().map(move |text| Utterance::from_fragment(unit, text)))
            .collect();

        let provisional_count = provisional.len();
        let utterances = if find_boundaries {
            merge_across_units(provisional)
        } else {
            provisional
        };
        debug!("Assembled {} utterances from {} fragments", utterances.len(), provisional_count);

        Self::from_utterances(utterances)
    }

    /// Take ownership of utterances, sort them by start and rebuild the index
    pub fn from_utterances(mut utterances: Vec<Utterance>) -> Self {
        utterances.sort_by_key(|u| (u.span.start, u.span.end));
        let mut set = UtteranceSet { utterances, by_unit: HashMap::new() };
        set.reindex();
        set
    }

    fn reindex(&mut self) {
        self.by_unit.clear();
        for (id, utterance) in self.utterances.iter_mut().enumerate() {
            utterance.id = id;
            for unit in &utterance.units {
                self.by_unit.entry(*unit).or_default().insert(id);
            }
        }
    }

    /// Merge utterance `from` into `into` and rebuild the index; ids above `from` shift down
    pub fn merge_pair(&mut self, into: usize, from: usize) {
        if into == from || into >= self.utterances.len() || from >= self.utterances.len() {
            return;
        }
        let absorbed = self.utterances.remove(from);
        let into = if from < into { into - 1 } else { into };
        self.utterances[into].merge(&absorbed);
        let utterances = std::mem::take(&mut self.utterances);
        *self = Self::from_utterances(utterances);
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Utterance> {
        self.utterances.get(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Utterance> {
        self.utterances.iter()
    }

    pub fn as_slice(&self) -> &[Utterance] {
        &self.utterances
    }

    /// Ids of utterances drawing on a unit
    pub fn utterance_ids_for_unit(&self, unit: UnitId) -> impl Iterator<Item = usize> + '_ {
        self.by_unit.get(&unit).into_iter().flat_map(|ids| ids.iter().copied())
    }

    /// Utterances drawing on a unit
    pub fn utterances_for_unit(&self, unit: UnitId) -> Vec<&Utterance> {
        self.utterance_ids_for_unit(unit)
            .filter_map(|id| self.utterances.get(id))
            .collect()
    }

    /// Utterances intersecting `[start, end]` (inclusive)
    pub fn utterances_in(&self, span: TimeSpan) -> Vec<&Utterance> {
        self.utterances.iter().filter(|u| u.span.intersects(&span)).collect()
    }

    /// Check that each utterance is listed under every one of its units and nowhere else
    pub fn is_consistent(&self) -> bool {
        let forward = self.utterances.iter().all(|u| {
            u.units.iter().all(|unit| self.by_unit.get(unit).is_some_and(|ids| ids.contains(&u.id)))
        });
        let backward = self.by_unit.iter().all(|(unit, ids)| {
            ids.iter().all(|id| self.utterances.get(*id).is_some_and(|u| u.units.contains(unit)))
        });
        forward && backward
    }
}

impl<'a> IntoIterator for &'a UtteranceSet {
    type Item = &'a Utterance;
    type IntoIter = std::slice::Iter<'a, Utterance>;

    fn into_iter(self) -> Self::IntoIter {
        self.utterances.iter()
    }
}

fn merge_across_units(provisional: Vec<Utterance>) -> Vec<Utterance> {
    let mut merged: Vec<Utterance> = Vec::with_capacity(provisional.len());
    for next in provisional {
        match merged.last_mut() {
            Some(current) if !(ends_sentence(&current.text) && starts_sentence(&next.text)) => {
                current.merge(&next);
            }
            _ => merged.push(next),
        }
    }
    merged
}
