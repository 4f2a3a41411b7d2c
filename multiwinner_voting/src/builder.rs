pub use crate::ballots::*;
pub use crate::candidates::*;
pub use crate::config::*;
pub use crate::election::Election;

use log::debug;
use snafu::OptionExt;

use std::collections::{HashMap, HashSet};

/// A builder for adding votes by candidate name.
///
/// Candidates are numbered from 1 in the order they are given. Withdrawn
/// candidates are not registered and are removed from every ballot.
///
/// ```
/// pub use multiwinner_voting::builder::Builder;
/// # use multiwinner_voting::TallyError;
///
/// let mut builder = Builder::new(1)
///     .candidates(&["Anna".to_string(), "Bob".to_string()]);
///
/// builder.add_ranked_vote(&["Anna".to_string(), "Bob".to_string()], 1)?;
/// builder.add_approval_vote(&["Bob".to_string()], 2)?;
/// let election = builder.build();
/// assert_eq!(election.context.count(), 2);
///
/// # Ok::<(), TallyError>(())
/// ```
pub struct Builder {
    pub(crate) _seat_count: u32,
    pub(crate) _names: Vec<String>,
    pub(crate) _ids: HashMap<String, CandidateId>,
    pub(crate) _withdrawn: HashSet<CandidateId>,
    pub(crate) _ranked: Vec<RankedBallot>,
    pub(crate) _approval: Vec<ApprovalBallot>,
}

impl Builder {
    pub fn new(seat_count: u32) -> Builder {
        Builder {
            _seat_count: seat_count,
            _names: Vec::new(),
            _ids: HashMap::new(),
            _withdrawn: HashSet::new(),
            _ranked: Vec::new(),
            _approval: Vec::new(),
        }
    }

    pub fn candidates(self, cands: &[String]) -> Builder {
        let ids = cands
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), CandidateId(idx as i32 + 1)))
            .collect();
        Builder {
            _names: cands.to_vec(),
            _ids: ids,
            ..self
        }
    }

    pub fn seat_count(&self) -> u32 {
        self._seat_count
    }

    /// Withdraws a candidate from the election.
    pub fn withdraw(&mut self, name: &str) -> TallyResult<()> {
        let cid = self.lookup(name)?;
        self._withdrawn.insert(cid);
        Ok(())
    }

    /// Adds a ranked vote, with a weight attached to it.
    ///
    /// candidates: the choices made by the voter, the preferred one first.
    /// Empty names are skipped.
    pub fn add_ranked_vote(&mut self, candidates: &[String], count: u64) -> TallyResult<()> {
        let ranking = self.lookup_all(candidates)?;
        self._ranked.push(RankedBallot::new(ranking).with_weight(count));
        Ok(())
    }

    /// Adds an approval vote, with a weight attached to it.
    pub fn add_approval_vote(&mut self, candidates: &[String], count: u64) -> TallyResult<()> {
        let approved = self.lookup_all(candidates)?;
        self._approval.push(ApprovalBallot::new(approved).with_weight(count));
        Ok(())
    }

    fn lookup(&self, name: &str) -> TallyResult<CandidateId> {
        self._ids
            .get(name)
            .cloned()
            .context(UnknownNameSnafu { name })
    }

    fn lookup_all(&self, names: &[String]) -> TallyResult<Vec<CandidateId>> {
        names
            .iter()
            .filter(|n| !n.is_empty())
            .map(|n| self.lookup(n))
            .collect()
    }

    /// Builds the election. If only one kind of ballot was added, the other
    /// kind is simulated from it.
    pub fn build(self) -> Election {
        let mut context = ElectionContext::new();
        for (idx, name) in self._names.iter().enumerate() {
            let cid = CandidateId(idx as i32 + 1);
            if !self._withdrawn.contains(&cid) {
                context.register(cid.0, name);
            }
        }
        let withdrawn = &self._withdrawn;
        let ranked: Vec<RankedBallot> = self._ranked.iter().map(|b| b.without(withdrawn)).collect();
        let approval: Vec<ApprovalBallot> = self
            ._approval
            .iter()
            .map(|b| {
                ApprovalBallot::new(b.approved().iter().filter(|c| !withdrawn.contains(*c)).cloned())
                    .with_weight(b.weight())
            })
            .collect();
        debug!(
            "build: {} candidates ({} withdrawn), {} ranked votes, {} approval votes",
            context.count(),
            withdrawn.len(),
            ranked.len(),
            approval.len()
        );

        match (ranked.is_empty(), approval.is_empty()) {
            (false, true) => Election::from_ranked(context, ranked, self._seat_count),
            (true, false) => Election::from_approval(context, approval, self._seat_count),
            _ => Election {
                context,
                approval_ballots: approval,
                ranked_ballots: ranked,
                seat_count: self._seat_count,
            },
        }
    }
}
