// ********* Errors ***********

use snafu::Snafu;

use crate::candidates::CandidateId;
use crate::pav::Slate;

/// Errors that prevent a tally from completing.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TallyError {
    #[snafu(display("the number of seats must be at least 1"))]
    NoSeats,
    #[snafu(display("cannot fill {seat_count} seats with {candidate_count} candidates"))]
    TooManySeats {
        seat_count: u32,
        candidate_count: usize,
    },
    #[snafu(display("no candidate is named {name:?}"))]
    UnknownName { name: String },
    #[snafu(display("a ballot refers to the unregistered candidate {cid}"))]
    UnknownCandidate { cid: CandidateId },
    #[snafu(display("the count did not complete after {rounds} rounds"))]
    NoConvergence { rounds: usize },
}

pub type TallyResult<T> = Result<T, TallyError>;

// ******** Output data structures *********

/// What happened to a candidate during one step of an STV count.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum StvAction {
    Seat,
    Eliminate,
}

/// One step of an STV count: a candidate is seated or eliminated and part of
/// their votes moves to the next usable choices.
#[derive(PartialEq, Debug, Clone)]
pub struct StvStep {
    pub action: StvAction,
    pub candidate: CandidateId,
    /// The vote total of the candidate when the step started.
    pub total: f64,
    /// The amount of votes moved away from the candidate, including the
    /// exhausted part.
    pub redistributed: f64,
    /// The votes received by each next usable choice.
    pub transfers: Vec<(CandidateId, f64)>,
    /// The votes that had no next usable choice.
    pub exhausted: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct StvResult {
    /// Seated candidates, in the order they were seated.
    pub elected: Vec<CandidateId>,
    pub quota: f64,
    /// The number of non-blank ballots.
    pub ballot_count: u64,
    /// First preference totals, highest first.
    pub first_preferences: Vec<(CandidateId, f64)>,
    pub steps: Vec<StvStep>,
}

/// The results of all the counting methods for one election, each sorted
/// from the highest score to the lowest.
#[derive(PartialEq, Debug, Clone)]
pub struct ElectionResults {
    pub approval: Vec<(CandidateId, i64)>,
    pub net_approval: Vec<(CandidateId, i64)>,
    pub satisfaction_approval: Vec<(CandidateId, f64)>,
    /// Truncated to the requested number of slates.
    pub proportional_approval: Vec<(Slate, f64)>,
    /// Total number of slates that were scored.
    pub slate_count: u64,
    pub sequential_proportional_approval: Vec<(CandidateId, f64)>,
    pub stv: StvResult,
}
