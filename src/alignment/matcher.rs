use std::fmt;

use crate::alignment::utterance::Utterance;
use crate::timecode::Timed;

/// Target utterances competing for one source utterance, in target start order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    items: Vec<Utterance>,
}

impl CandidateSet {
    pub fn new(items: Vec<Utterance>) -> Self {
        CandidateSet { items }
    }

    pub fn items(&self) -> &[Utterance] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: usize) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    /// Ids present in both sets, in this set's order
    pub fn shared_with(&self, other: &CandidateSet) -> Vec<usize> {
        self.items
            .iter()
            .map(|item| item.id)
            .filter(|id| other.contains(*id))
            .collect()
    }

    pub fn get(&self, id: usize) -> Option<&Utterance> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn remove(&mut self, id: usize) -> Option<Utterance> {
        let position = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(position))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn push(&mut self, item: Utterance) {
        self.items.push(item);
    }

    /// Fold every item into the first; leaves zero or one item
    pub fn merge(&mut self) {
        if self.items.len() < 2 {
            return;
        }
        let mut rest = self.items.split_off(1);
        let first = &mut self.items[0];
        for item in rest.drain(..) {
            first.merge(&item);
        }
    }
}

impl fmt::Display for CandidateSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let texts: Vec<&str> = self.items.iter().map(|item| item.text.as_str()).collect();
        write!(f, "{}", texts.join("--"))
    }
}

/// Targets whose interval intersects the source (inclusive bounds).
///
/// `targets` must be sorted by start; the scan stops at the first target
/// starting after the source ends. Sorting by end is not assumed, so earlier
/// targets are all visited.
pub fn find_candidates(source: &Utterance, targets: &[Utterance]) -> CandidateSet {
    let mut items = Vec::new();
    for target in targets {
        if target.start() > source.end() {
            break;
        }
        if target.end() >= source.start() {
            items.push(target.clone());
        }
    }
    CandidateSet::new(items)
}
