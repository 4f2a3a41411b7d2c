use log::debug;

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::candidates::{CandidateId, CandidateOrdering};

/// An approval ballot: the set of candidates approved by the voter.
///
/// An empty set is a blank ballot and does not count in any tally.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ApprovalBallot {
    approved: BTreeSet<CandidateId>,
    // Guaranteed to never be zero at construction.
    weight: u64,
}

impl ApprovalBallot {
    pub fn new<I: IntoIterator<Item = CandidateId>>(approved: I) -> ApprovalBallot {
        ApprovalBallot {
            approved: approved.into_iter().collect(),
            weight: 1,
        }
    }

    /// Sets the number of identical ballots this ballot stands for.
    /// A weight of zero is treated as one.
    pub fn with_weight(self, weight: u64) -> ApprovalBallot {
        ApprovalBallot {
            approved: self.approved,
            weight: weight.max(1),
        }
    }

    pub fn approved(&self) -> &BTreeSet<CandidateId> {
        &self.approved
    }

    pub fn approves(&self, cid: &CandidateId) -> bool {
        self.approved.contains(cid)
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    pub fn len(&self) -> usize {
        self.approved.len()
    }

    pub fn is_blank(&self) -> bool {
        self.approved.is_empty()
    }
}

/// A ranked ballot: candidates in decreasing order of preference, without
/// repetition.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct RankedBallot {
    ranking: Vec<CandidateId>,
    weight: u64,
}

impl RankedBallot {
    /// Builds a ranked ballot. A candidate ranked more than once only keeps
    /// its highest rank.
    pub fn new<I: IntoIterator<Item = CandidateId>>(ranking: I) -> RankedBallot {
        let mut seen: HashSet<CandidateId> = HashSet::new();
        let ranking: Vec<CandidateId> = ranking.into_iter().filter(|c| seen.insert(*c)).collect();
        RankedBallot { ranking, weight: 1 }
    }

    /// A weight of zero is treated as one.
    pub fn with_weight(self, weight: u64) -> RankedBallot {
        RankedBallot {
            ranking: self.ranking,
            weight: weight.max(1),
        }
    }

    /// Removes the withdrawn candidates from the ranking.
    pub fn without(&self, withdrawn: &HashSet<CandidateId>) -> RankedBallot {
        RankedBallot {
            ranking: self
                .ranking
                .iter()
                .filter(|c| !withdrawn.contains(*c))
                .cloned()
                .collect(),
            weight: self.weight,
        }
    }

    pub fn ranking(&self) -> &[CandidateId] {
        &self.ranking
    }

    pub fn first(&self) -> Option<CandidateId> {
        self.ranking.first().cloned()
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    pub fn is_blank(&self) -> bool {
        self.ranking.is_empty()
    }
}

/// Merges the ballots with identical rankings, adding up their weights.
/// The ballots are returned in the order of their first appearance.
pub fn aggregate_ranked(ballots: &[RankedBallot]) -> Vec<RankedBallot> {
    let mut positions: HashMap<&[CandidateId], usize> = HashMap::new();
    let mut res: Vec<RankedBallot> = Vec::new();
    for b in ballots.iter() {
        if let Some(&idx) = positions.get(b.ranking()) {
            res[idx].weight += b.weight;
        } else {
            positions.insert(b.ranking(), res.len());
            res.push(b.clone());
        }
    }
    debug!(
        "aggregate_ranked: {} ballots aggregated into {} distinct rankings",
        ballots.len(),
        res.len()
    );
    res
}

/// Simulates approval ballots from ranked ballots: every voter approves
/// their `approval_threshold` first choices.
pub fn ranked_to_approval(
    ballots: &[RankedBallot],
    approval_threshold: usize,
) -> Vec<ApprovalBallot> {
    ballots
        .iter()
        .map(|b| {
            ApprovalBallot::new(b.ranking().iter().take(approval_threshold).cloned())
                .with_weight(b.weight())
        })
        .collect()
}

/// Simulates ranked ballots from approval ballots: the approved candidates
/// are ranked following the candidate ordering.
pub fn approval_to_ranked(
    ballots: &[ApprovalBallot],
    ordering: &CandidateOrdering<'_>,
) -> Vec<RankedBallot> {
    ballots
        .iter()
        .map(|b| {
            let mut ranking: Vec<CandidateId> = b.approved().iter().cloned().collect();
            ordering.sort(&mut ranking);
            RankedBallot::new(ranking).with_weight(b.weight())
        })
        .collect()
}
