/*!
 * Alignment pairs and conflict resolution.
 *
 * One pair is built per source utterance, in source start order. Neighbours
 * are addressed by position in the pair vector. Resolution is a greedy
 * left-to-right pass: a target claimed by two pairs goes to the pair whose
 * source overlaps it strictly more, the earlier pair winning ties.
 */

use std::fmt;
use log::{debug, trace};

use crate::alignment::matcher::{find_candidates, CandidateSet};
use crate::alignment::utterance::{Utterance, UtteranceSet};
use crate::errors::AlignmentError;
use crate::timecode::overlap;

/// A source utterance and the target utterances matched to it
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentPair {
    pub source: Utterance,
    pub candidates: CandidateSet,
}

impl AlignmentPair {
    pub fn new(source: Utterance, candidates: CandidateSet) -> Self {
        AlignmentPair { source, candidates }
    }

    pub fn has_target(&self) -> bool {
        !self.candidates.is_empty()
    }

    /// The merged target, once resolution has run
    pub fn target(&self) -> Option<&Utterance> {
        self.candidates.items().first()
    }

    pub fn target_text(&self) -> String {
        self.candidates.to_string()
    }

    /// Both sides longer than `limit` characters
    pub fn is_longer_than(&self, limit: usize) -> bool {
        if !self.has_target() {
            return false;
        }
        self.source.text.chars().count() > limit && self.target_text().chars().count() > limit
    }
}

impl fmt::Display for AlignmentPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\n{}\n", self.source, self.candidates)
    }
}

/// Ordered sequence of alignment pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pairs: Vec<AlignmentPair>,
}

impl Alignment {
    /// One pair per source utterance with its raw candidate set
    pub fn build(source: &UtteranceSet, target: &UtteranceSet) -> Self {
        let pairs = source
            .iter()
            .map(|utterance| AlignmentPair::new(utterance.clone(), find_candidates(utterance, target.as_slice())))
            .collect();
        Alignment { pairs }
    }

    pub fn from_pairs(pairs: Vec<AlignmentPair>) -> Self {
        Alignment { pairs }
    }

    /// Settle every target claimed by more than one pair.
    ///
    /// For pair `i` and each of its candidates, the next pair still claiming the
    /// same target is found (normally `i + 1`). If `i`'s source overlaps the
    /// target strictly less, `i` gives it up. Otherwise the other pair loses it
    /// and the search continues with the following claimant.
    pub fn resolve_conflicts(&mut self) {
        let mut removed = 0usize;
        for i in 0..self.pairs.len() {
            let ids: Vec<usize> = self.pairs[i].candidates.items().iter().map(|item| item.id).collect();
            for id in ids {
                let mut search_from = i + 1;
                while let Some(j) = self.next_claimant(id, search_from) {
                    let Some(target) = self.pairs[i].candidates.get(id) else {
                        break;
                    };
                    let with_current = overlap(&self.pairs[i].source, target);
                    let with_other = overlap(&self.pairs[j].source, target);
                    if with_other > with_current {
                        trace!("Target {} moves from pair {} to pair {}", id, i, j);
                        self.pairs[i].candidates.remove(id);
                        removed += 1;
                        break;
                    }
                    trace!("Target {} stays with pair {}, dropped from pair {}", id, i, j);
                    self.pairs[j].candidates.remove(id);
                    removed += 1;
                    search_from = j + 1;
                }
            }
        }
        debug!("Conflict resolution removed {} shared candidates", removed);
    }

    fn next_claimant(&self, id: usize, from: usize) -> Option<usize> {
        (from..self.pairs.len()).find(|&j| self.pairs[j].candidates.contains(id))
    }

    /// Collapse every candidate set to at most one utterance
    pub fn merge_candidates(&mut self) {
        for pair in &mut self.pairs {
            pair.candidates.merge();
        }
    }

    pub fn pairs(&self) -> &[AlignmentPair] {
        &self.pairs
    }

    pub fn into_pairs(self) -> Vec<AlignmentPair> {
        self.pairs
    }

    pub fn get(&self, index: usize) -> Option<&AlignmentPair> {
        self.pairs.get(index)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AlignmentPair> {
        self.pairs.iter()
    }

    pub fn previous(&self, index: usize) -> Option<usize> {
        index.checked_sub(1).filter(|&i| i < self.pairs.len())
    }

    pub fn next(&self, index: usize) -> Option<usize> {
        let next = index + 1;
        (next < self.pairs.len()).then_some(next)
    }

    /// Number of pairs with a target
    pub fn aligned_count(&self) -> usize {
        self.pairs.iter().filter(|pair| pair.has_target()).count()
    }

    fn check_index(&self, index: usize) -> Result<(), AlignmentError> {
        if index >= self.pairs.len() {
            return Err(AlignmentError::PairOutOfRange { index, len: self.pairs.len() });
        }
        Ok(())
    }

    /// Drop the target side of one pair
    pub fn clear_target(&mut self, index: usize) -> Result<(), AlignmentError> {
        self.check_index(index)?;
        self.pairs[index].candidates.clear();
        Ok(())
    }

    /// Insert a copy of a pair right after it, with the copy's target cleared
    pub fn duplicate(&mut self, index: usize) -> Result<usize, AlignmentError> {
        self.check_index(index)?;
        let mut copy = self.pairs[index].clone();
        copy.candidates.clear();
        self.pairs.insert(index + 1, copy);
        Ok(index + 1)
    }

    /// Fold every pair up to and including the next one with a target into `index`
    pub fn join_with_next(&mut self, index: usize) -> Result<(), AlignmentError> {
        self.check_index(index)?;
        let last = (index + 1..self.pairs.len())
            .find(|&j| self.pairs[j].has_target())
            .ok_or(AlignmentError::NothingToJoin { index })?;

        let absorbed: Vec<AlignmentPair> = self.pairs.drain(index + 1..=last).collect();
        let pair = &mut self.pairs[index];
        for other in absorbed {
            pair.source.merge(&other.source);
            for item in other.candidates.items() {
                pair.candidates.push(item.clone());
            }
        }
        pair.candidates.merge();
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Alignment {
    type Item = &'a AlignmentPair;
    type IntoIter = std::slice::Iter<'a, AlignmentPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

/// Build, resolve and merge: each source utterance ends with zero or one target
pub fn align(source: &UtteranceSet, target: &UtteranceSet) -> Alignment {
    let mut alignment = Alignment::build(source, target);
    alignment.resolve_conflicts();
    alignment.merge_candidates();
    debug!(
        "Aligned {} of {} source utterances against {} target utterances",
        alignment.aligned_count(),
        alignment.len(),
        target.len()
    );
    alignment
}
