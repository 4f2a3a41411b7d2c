use itertools::Itertools;
use log::{debug, info};
use snafu::ensure;

use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
};

use crate::ballots::ApprovalBallot;
use crate::candidates::{CandidateId, CandidateOrdering, ElectionContext};
use crate::config::*;

/// Above this number of slates, the scoring reports its progress.
pub const MIN_SLATE_COUNT_FOR_PROGRESS: u64 = 3000;

// The result map is never pre-allocated beyond this number of slates.
const MAX_PREALLOCATED_SLATES: usize = 1 << 20;

/// An unordered set of candidates, scored as a whole.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Slate(BTreeSet<CandidateId>);

impl Slate {
    pub fn new<I: IntoIterator<Item = CandidateId>>(members: I) -> Slate {
        Slate(members.into_iter().collect())
    }

    pub fn members(&self) -> &BTreeSet<CandidateId> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The members, following the candidate ordering.
    pub fn sorted_members(&self, ordering: &CandidateOrdering<'_>) -> Vec<CandidateId> {
        let mut res: Vec<CandidateId> = self.0.iter().cloned().collect();
        ordering.sort(&mut res);
        res
    }

    /// The number of members approved on a ballot.
    fn overlap(&self, ballot: &ApprovalBallot) -> usize {
        self.0.iter().filter(|cid| ballot.approves(cid)).count()
    }
}

/// The binomial coefficient C(n, k), or `None` if it does not fit in 64 bits.
pub fn binomial(n: u64, k: u64) -> Option<u64> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut res: u128 = 1;
    for i in 0..k {
        // res is C(n, i) here, so the division is exact.
        res = res.checked_mul((n - i) as u128)? / (i as u128 + 1);
    }
    u64::try_from(res).ok()
}

/// The harmonic number H(k) = 1 + 1/2 + ... + 1/k. H(0) is 0.
pub fn harmonic(k: usize) -> f64 {
    (1..=k).map(|i| 1.0 / i as f64).sum()
}

pub(crate) fn check_seat_count(ctx: &ElectionContext, seat_count: u32) -> TallyResult<()> {
    ensure!(seat_count > 0, NoSeatsSnafu);
    ensure!(
        seat_count as usize <= ctx.count(),
        TooManySeatsSnafu {
            seat_count,
            candidate_count: ctx.count(),
        }
    );
    Ok(())
}

/// Proportional approval voting.
///
/// Every slate of `seat_count` registered candidates is scored: a ballot
/// approving `k > 0` members of a slate adds H(k) to its score. Slates that
/// no ballot approves are not in the result.
///
/// The number of slates grows as C(candidates, seats), which quickly becomes
/// intractable.
pub fn count_pav(
    ctx: &ElectionContext,
    ballots: &[ApprovalBallot],
    seat_count: u32,
) -> TallyResult<HashMap<Slate, f64>> {
    count_pav_with_progress(ctx, ballots, seat_count, &mut |_, _| {})
}

/// Same as [count_pav], calling `progress(scored, total)` while scoring when
/// there are more than [MIN_SLATE_COUNT_FOR_PROGRESS] slates.
pub fn count_pav_with_progress(
    ctx: &ElectionContext,
    ballots: &[ApprovalBallot],
    seat_count: u32,
    progress: &mut dyn FnMut(u64, u64),
) -> TallyResult<HashMap<Slate, f64>> {
    check_seat_count(ctx, seat_count)?;

    let slate_count = binomial(ctx.count() as u64, seat_count as u64);
    let capacity = slate_count
        .and_then(|c| usize::try_from(c).ok())
        .unwrap_or(usize::MAX)
        .min(MAX_PREALLOCATED_SLATES);
    let total = slate_count.unwrap_or(u64::MAX);
    info!(
        "count_pav: scoring {} slates of {} candidates among {}",
        total,
        seat_count,
        ctx.count()
    );
    let report_progress = total > MIN_SLATE_COUNT_FOR_PROGRESS;
    let step = (total / 100).max(1);

    let non_blank: Vec<&ApprovalBallot> = ballots.iter().filter(|b| !b.is_blank()).collect();
    let mut res: HashMap<Slate, f64> = HashMap::with_capacity(capacity);
    let mut scored: u64 = 0;
    for members in ctx.ids().into_iter().combinations(seat_count as usize) {
        let slate = Slate(members.into_iter().collect());
        let mut score = 0.0;
        for b in non_blank.iter() {
            let k = slate.overlap(b);
            if k > 0 {
                score += b.weight() as f64 * harmonic(k);
            }
        }
        if score > 0.0 {
            res.insert(slate, score);
        }
        scored += 1;
        if report_progress && (scored % step == 0 || scored == total) {
            progress(scored, total);
        }
    }
    debug!("count_pav: {} slates with a positive score", res.len());
    Ok(res)
}

/// The best `max_slates` slates, highest score first. Slates with equal
/// scores are compared member by member with the candidate ordering.
pub fn top_slates(
    results: &HashMap<Slate, f64>,
    max_slates: usize,
    ordering: &CandidateOrdering<'_>,
) -> Vec<(Slate, f64)> {
    let mut sorted: Vec<(Vec<CandidateId>, &Slate, f64)> = results
        .iter()
        .map(|(s, score)| (s.sorted_members(ordering), s, *score))
        .collect();
    sorted.sort_by(|(ma, _, sa), (mb, _, sb)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| compare_members(ma, mb, ordering))
    });
    sorted
        .into_iter()
        .take(max_slates)
        .map(|(_, s, score)| (s.clone(), score))
        .collect()
}

fn compare_members(a: &[CandidateId], b: &[CandidateId], ordering: &CandidateOrdering<'_>) -> Ordering {
    for (ca, cb) in a.iter().zip(b.iter()) {
        let o = ordering.compare(*ca, *cb);
        if o != Ordering::Equal {
            return o;
        }
    }
    a.len().cmp(&b.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn ctx(n: i32) -> ElectionContext {
        let mut ctx = ElectionContext::new();
        for i in 1..=n {
            ctx.register(i, &format!("Candidate {}", i));
        }
        ctx
    }

    fn ballot(xs: &[i32]) -> ApprovalBallot {
        ApprovalBallot::new(xs.iter().map(|x| CandidateId(*x)))
    }

    fn slate(xs: &[i32]) -> Slate {
        Slate::new(xs.iter().map(|x| CandidateId(*x)))
    }

    #[test]
    fn binomial_values() {
        assert_eq!(binomial(5, 2), Some(10));
        assert_eq!(binomial(10, 0), Some(1));
        assert_eq!(binomial(10, 10), Some(1));
        assert_eq!(binomial(3, 4), Some(0));
        assert_eq!(binomial(52, 5), Some(2_598_960));
        assert_eq!(binomial(64, 32), Some(1_832_624_140_942_590_534));
        assert_eq!(binomial(200, 100), None);
    }

    #[test]
    fn harmonic_values() {
        assert!((harmonic(1) - 1.0).abs() < EPS);
        assert!((harmonic(2) - 1.5).abs() < EPS);
        assert!((harmonic(3) - 11.0 / 6.0).abs() < EPS);
        assert_eq!(harmonic(0), 0.0);
    }

    #[test]
    fn slates_compare_as_sets() {
        assert_eq!(slate(&[1, 2]), slate(&[2, 1]));
        let mut m: HashMap<Slate, f64> = HashMap::new();
        m.insert(slate(&[3, 1]), 1.0);
        assert!(m.contains_key(&slate(&[1, 3])));
    }

    #[test]
    fn harmonic_scoring_of_two_seat_slates() {
        let ctx = ctx(3);
        let res = count_pav(&ctx, &[ballot(&[1])], 2).unwrap();
        assert!((res[&slate(&[1, 2])] - 1.0).abs() < EPS);
        assert!((res[&slate(&[1, 3])] - 1.0).abs() < EPS);
        assert!(!res.contains_key(&slate(&[2, 3])));

        let res = count_pav(&ctx, &[ballot(&[1, 2])], 2).unwrap();
        assert!((res[&slate(&[1, 2])] - 1.5).abs() < EPS);
        assert!((res[&slate(&[2, 3])] - 1.0).abs() < EPS);
    }

    #[test]
    fn weights_and_blank_ballots() {
        let ctx = ctx(3);
        let ballots = vec![ballot(&[1, 2]).with_weight(2), ballot(&[]), ballot(&[3])];
        let res = count_pav(&ctx, &ballots, 2).unwrap();
        assert!((res[&slate(&[1, 2])] - 3.0).abs() < EPS);
        assert!((res[&slate(&[1, 3])] - 3.0).abs() < EPS);
        assert!((res[&slate(&[2, 3])] - 3.0).abs() < EPS);
    }

    #[test]
    fn proportional_slate_wins() {
        let ctx = ctx(4);
        // A majority for 1 and 2, a minority for 3.
        let mut ballots = Vec::new();
        ballots.push(ballot(&[1, 2]).with_weight(6));
        ballots.push(ballot(&[3]).with_weight(4));
        let res = count_pav(&ctx, &ballots, 2).unwrap();
        let top = top_slates(&res, 3, &ctx.ordering());
        // {1,3}: 6 + 4 = 10, {2,3}: 10, {1,2}: 6 * 1.5 = 9
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].0, slate(&[1, 3]));
        assert_eq!(top[1].0, slate(&[2, 3]));
        assert_eq!(top[2].0, slate(&[1, 2]));
        assert!((top[2].1 - 9.0).abs() < EPS);
    }

    #[test]
    fn top_slates_truncates() {
        let ctx = ctx(5);
        let ballots = vec![ballot(&[1, 2, 3, 4, 5])];
        let res = count_pav(&ctx, &ballots, 2).unwrap();
        assert_eq!(res.len(), 10);
        assert_eq!(top_slates(&res, 4, &ctx.ordering()).len(), 4);
        assert_eq!(top_slates(&res, 40, &ctx.ordering()).len(), 10);
    }

    #[test]
    fn invalid_seat_counts() {
        let ctx = ctx(3);
        assert_eq!(count_pav(&ctx, &[], 0), Err(TallyError::NoSeats));
        assert_eq!(
            count_pav(&ctx, &[], 4),
            Err(TallyError::TooManySeats {
                seat_count: 4,
                candidate_count: 3
            })
        );
    }

    #[test]
    fn progress_reported_for_large_elections() {
        let ctx = ctx(20);
        let ballots = vec![ballot(&[1, 2, 3])];
        let mut calls: Vec<(u64, u64)> = Vec::new();
        let res = count_pav_with_progress(&ctx, &ballots, 3, &mut |d, t| calls.push((d, t)));
        assert!(res.is_ok());
        // C(20, 3) = 1140 slates: too few to report.
        assert!(calls.is_empty());

        let mut calls: Vec<(u64, u64)> = Vec::new();
        let res = count_pav_with_progress(&ctx, &ballots, 4, &mut |d, t| calls.push((d, t)));
        assert!(res.is_ok());
        // C(20, 4) = 4845 slates.
        assert_eq!(calls.last(), Some(&(4845, 4845)));
        assert!(calls.len() >= 100);
    }
}
