use log::{debug, log_enabled, trace, Level};

use std::collections::HashMap;

use crate::ballots::ApprovalBallot;
use crate::candidates::{CandidateId, ElectionContext};

/// Approval voting: one point per approved candidate.
pub fn count_av(ballots: &[ApprovalBallot]) -> HashMap<CandidateId, i64> {
    let mut tally: HashMap<CandidateId, i64> = HashMap::new();
    for b in ballots.iter().filter(|b| !b.is_blank()) {
        for cid in b.approved() {
            *tally.entry(*cid).or_insert(0) += b.weight() as i64;
        }
    }
    debug!("count_av: {:?}", tally);
    tally
}

/// Net approval voting: every registered candidate gains one point on each
/// non-blank ballot that approves them, and loses one point otherwise.
pub fn count_net_av(ctx: &ElectionContext, ballots: &[ApprovalBallot]) -> HashMap<CandidateId, i64> {
    let mut tally: HashMap<CandidateId, i64> = HashMap::new();
    for b in ballots.iter().filter(|b| !b.is_blank()) {
        let w = b.weight() as i64;
        for c in ctx.all() {
            let points = if b.approves(&c.id) { w } else { -w };
            *tally.entry(c.id).or_insert(0) += points;
        }
    }
    debug!("count_net_av: {:?}", tally);
    tally
}

/// Satisfaction approval voting: each ballot has a total weight of one,
/// shared equally among the approved candidates.
pub fn count_sav(ballots: &[ApprovalBallot]) -> HashMap<CandidateId, f64> {
    let mut tally: HashMap<CandidateId, f64> = HashMap::new();
    for b in ballots.iter().filter(|b| !b.is_blank()) {
        let share = b.weight() as f64 / b.len() as f64;
        for cid in b.approved() {
            *tally.entry(*cid).or_insert(0.0) += share;
        }
    }
    debug!("count_sav: {:?}", tally);
    tally
}

/// Sequential proportional approval voting.
///
/// In each round, a ballot that already approves `m` selected candidates
/// contributes `1 / (1 + m)` to every other candidate it approves. The
/// candidates with the highest round score are selected, all of them in case
/// of a tie, and keep that round score as their final score.
///
/// Candidates that no ballot approves are never selected and do not appear
/// in the result.
pub fn count_spav(ctx: &ElectionContext, ballots: &[ApprovalBallot]) -> HashMap<CandidateId, f64> {
    let mut selected: HashMap<CandidateId, f64> = HashMap::new();
    for round in 1..=ctx.count() {
        trace!("count_spav: round {}", round);
        let mut round_scores: HashMap<CandidateId, f64> = HashMap::new();
        for b in ballots.iter().filter(|b| !b.is_blank()) {
            let represented = b
                .approved()
                .iter()
                .filter(|cid| selected.contains_key(*cid))
                .count();
            let score = b.weight() as f64 / (1.0 + represented as f64);
            for cid in b.approved().iter().filter(|cid| !selected.contains_key(*cid)) {
                *round_scores.entry(*cid).or_insert(0.0) += score;
            }
        }
        if round_scores.is_empty() {
            break;
        }

        let sorted = ctx.ordering().sort_desc_by_value(&round_scores);
        if log_enabled!(Level::Trace) {
            for (cid, score) in sorted.iter() {
                trace!("count_spav: {} {}", ctx.name(*cid), score);
            }
        }
        // Seat the winner of the round, or all the winners if there is a tie.
        let top_score = sorted[0].1;
        for (cid, score) in sorted.into_iter().take_while(|(_, s)| *s == top_score) {
            debug!(
                "count_spav: round {}: selecting {} with {}",
                round,
                ctx.name(cid),
                score
            );
            selected.insert(cid, score);
        }
    }
    selected
}
