use log::{debug, info};
use snafu::ensure;

use std::collections::{HashMap, HashSet};

use crate::ballots::RankedBallot;
use crate::candidates::{CandidateId, CandidateOrdering, ElectionContext};
use crate::config::*;
use crate::pav::check_seat_count;

/// The Hagenbach-Bischoff quota. A candidate whose total strictly exceeds it
/// is elected.
pub fn hagenbach_bischoff_quota(ballot_count: u64, seat_count: u32) -> f64 {
    ballot_count as f64 / (seat_count as f64 + 1.0)
}

/// The Droop quota. A candidate whose total reaches it is elected.
pub fn droop_quota(ballot_count: u64, seat_count: u32) -> u64 {
    ballot_count / (seat_count as u64 + 1) + 1
}

/// Single transferable vote, returning the elected candidates in the order
/// they were seated.
pub fn count_stv(
    ctx: &ElectionContext,
    ballots: &[RankedBallot],
    seat_count: u32,
) -> TallyResult<Vec<CandidateId>> {
    run_stv(ctx, ballots, seat_count).map(|r| r.elected)
}

/// Single transferable vote with the Hagenbach-Bischoff quota and the Wright
/// system of redistribution.
///
/// Blank ballots are ignored, including for the quota. At every step, all the
/// candidates above the quota are seated together and their surplus is moved
/// to the next usable choices. If none is above the quota, the last candidate
/// is eliminated and all their votes are moved. Equal totals are ranked with
/// the candidate ordering of the context.
///
/// When no candidate reaches the quota and the continuing candidates are no
/// more than the open seats, they are all seated.
pub fn run_stv(
    ctx: &ElectionContext,
    ballots: &[RankedBallot],
    seat_count: u32,
) -> TallyResult<StvResult> {
    check_seat_count(ctx, seat_count)?;

    // Blank ballots must not lower the quota.
    let ballots: Vec<&RankedBallot> = ballots.iter().filter(|b| !b.is_blank()).collect();
    for b in ballots.iter() {
        for cid in b.ranking() {
            ensure!(ctx.contains(*cid), UnknownCandidateSnafu { cid: *cid });
        }
    }
    let ballot_count: u64 = ballots.iter().map(|b| b.weight()).sum();
    let quota = hagenbach_bischoff_quota(ballot_count, seat_count);
    info!(
        "run_stv: {} ballots, {} seats, quota: {:.2}",
        ballot_count, seat_count, quota
    );

    let mut count = StvCount::new(ctx, ballots, seat_count as usize, quota);
    for c in ctx.all() {
        count.vote_totals.entry(c.id).or_insert(0.0);
    }
    let first_preferences = count.sorted_totals();
    debug!("run_stv: first preferences: {:?}", first_preferences);

    let max_rounds = ctx.count() + 1;
    let mut rounds = 0;
    loop {
        ensure!(rounds <= max_rounds, NoConvergenceSnafu { rounds });
        rounds += 1;
        match count.next_state() {
            CountState::Done => break,
            CountState::Seating(provisionals) => count.seat(&provisionals),
            CountState::Eliminating(cid) => count.eliminate(cid),
        }
    }

    Ok(StvResult {
        elected: count.elected,
        quota,
        ballot_count,
        first_preferences,
        steps: count.steps,
    })
}

#[derive(Eq, PartialEq, Debug, Clone)]
enum CountState {
    /// These candidates take a seat, in this order.
    Seating(Vec<CandidateId>),
    Eliminating(CandidateId),
    Done,
}

struct StvCount<'a> {
    ctx: &'a ElectionContext,
    ordering: CandidateOrdering<'a>,
    ballots: Vec<&'a RankedBallot>,
    seat_count: usize,
    quota: f64,
    elected: Vec<CandidateId>,
    excluded: HashSet<CandidateId>,
    // The continuing candidates and their current totals.
    vote_totals: HashMap<CandidateId, f64>,
    steps: Vec<StvStep>,
}

impl<'a> StvCount<'a> {
    fn new(
        ctx: &'a ElectionContext,
        ballots: Vec<&'a RankedBallot>,
        seat_count: usize,
        quota: f64,
    ) -> StvCount<'a> {
        let mut vote_totals: HashMap<CandidateId, f64> = HashMap::new();
        for b in ballots.iter() {
            if let Some(cid) = b.first() {
                *vote_totals.entry(cid).or_insert(0.0) += b.weight() as f64;
            }
        }
        StvCount {
            ctx,
            ordering: ctx.ordering(),
            ballots,
            seat_count,
            quota,
            elected: Vec::with_capacity(seat_count),
            excluded: HashSet::new(),
            vote_totals,
            steps: Vec::new(),
        }
    }

    fn sorted_totals(&self) -> Vec<(CandidateId, f64)> {
        self.ordering.sort_desc_by_value(&self.vote_totals)
    }

    fn next_state(&self) -> CountState {
        if self.elected.len() >= self.seat_count {
            return CountState::Done;
        }
        let open_seats = self.seat_count - self.elected.len();
        let sorted = self.sorted_totals();
        debug!("next_state: open seats: {}, totals: {:?}", open_seats, sorted);

        // Ties above the quota may claim more seats than are left.
        let provisionals: Vec<CandidateId> = sorted
            .iter()
            .filter(|(_, total)| *total > self.quota)
            .map(|(cid, _)| *cid)
            .take(open_seats)
            .collect();
        if !provisionals.is_empty() {
            return CountState::Seating(provisionals);
        }
        if sorted.len() <= open_seats {
            return CountState::Seating(sorted.iter().map(|(cid, _)| *cid).collect());
        }
        match sorted.last() {
            Some((cid, _)) => CountState::Eliminating(*cid),
            None => CountState::Done,
        }
    }

    fn seat(&mut self, provisionals: &[CandidateId]) {
        // All the provisional candidates are seated before any surplus moves,
        // so that no surplus goes to one of them.
        self.elected.extend_from_slice(provisionals);
        for cid in provisionals {
            let total = self.vote_totals.get(cid).cloned().unwrap_or(0.0);
            let surplus = total - self.quota;
            info!("{}", self.describe(StvAction::Seat, *cid, total));
            let step = if self.elected.len() < self.seat_count && surplus > 0.0 {
                self.redistribute(StvAction::Seat, *cid, surplus)
            } else {
                StvStep {
                    action: StvAction::Seat,
                    candidate: *cid,
                    total,
                    redistributed: 0.0,
                    transfers: Vec::new(),
                    exhausted: 0.0,
                }
            };
            self.steps.push(step);
            self.vote_totals.remove(cid);
        }
    }

    fn describe(&self, action: StvAction, cid: CandidateId, total: f64) -> String {
        let verb = match action {
            StvAction::Seat => "Seat",
            StvAction::Eliminate => "Eliminate",
        };
        format!("{} {}: {:.1}", verb, self.ctx.name(cid), total)
    }

    fn eliminate(&mut self, cid: CandidateId) {
        self.excluded.insert(cid);
        let total = self.vote_totals.get(&cid).cloned().unwrap_or(0.0);
        info!("{}", self.describe(StvAction::Eliminate, cid, total));
        let step = if total > 0.0 {
            self.redistribute(StvAction::Eliminate, cid, total)
        } else {
            StvStep {
                action: StvAction::Eliminate,
                candidate: cid,
                total,
                redistributed: 0.0,
                transfers: Vec::new(),
                exhausted: 0.0,
            }
        };
        self.steps.push(step);
        self.vote_totals.remove(&cid);
    }

    /// Moves `amount` votes from `source` to the next usable choices, in
    /// proportion of the ballots that name each of them.
    fn redistribute(&mut self, action: StvAction, source: CandidateId, amount: f64) -> StvStep {
        let total = self.vote_totals.get(&source).cloned().unwrap_or(0.0);
        let elected: HashSet<CandidateId> = self.elected.iter().cloned().collect();
        let next_choices = next_usable_choices(&self.ballots, &elected, &self.excluded, source);
        let next_total: u64 = next_choices.values().sum();

        let mut recipients: Vec<CandidateId> = next_choices.keys().cloned().collect();
        self.ordering.sort(&mut recipients);
        let mut transfers: Vec<(CandidateId, f64)> = Vec::with_capacity(recipients.len());
        let mut given = 0.0;
        for cid in recipients {
            let share = amount * next_choices[&cid] as f64 / next_total as f64;
            let current = self.vote_totals.entry(cid).or_insert(0.0);
            debug!(
                "redistribute: {} -> {}: {:.3}+{:.3}={:.3}",
                source,
                cid,
                current,
                share,
                *current + share
            );
            *current += share;
            given += share;
            transfers.push((cid, share));
        }
        // Whatever could not be given away stays with the source and leaves the
        // count with it.
        if let Some(t) = self.vote_totals.get_mut(&source) {
            *t -= given;
        }
        StvStep {
            action,
            candidate: source,
            total,
            redistributed: amount,
            transfers,
            exhausted: amount - given,
        }
    }
}

/// For every ballot that ranks `source`, the first continuing candidate ranked
/// after it. Elected and excluded candidates are skipped. A ballot that ranks
/// a continuing candidate before `source` does not count.
fn next_usable_choices(
    ballots: &[&RankedBallot],
    elected: &HashSet<CandidateId>,
    excluded: &HashSet<CandidateId>,
    source: CandidateId,
) -> HashMap<CandidateId, u64> {
    let mut res: HashMap<CandidateId, u64> = HashMap::new();
    for b in ballots.iter() {
        let mut source_found = false;
        for cid in b.ranking() {
            let continuing = !elected.contains(cid) && !excluded.contains(cid);
            if source_found && continuing {
                *res.entry(*cid).or_insert(0) += b.weight();
                break;
            } else if *cid == source {
                source_found = true;
            } else if continuing {
                break;
            }
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn ctx(names: &[&str]) -> ElectionContext {
        let mut ctx = ElectionContext::new();
        for (i, n) in names.iter().enumerate() {
            ctx.register(i as i32 + 1, n);
        }
        ctx
    }

    fn ballot(xs: &[i32]) -> RankedBallot {
        RankedBallot::new(xs.iter().map(|x| CandidateId(*x)))
    }

    fn ids(xs: &[i32]) -> Vec<CandidateId> {
        xs.iter().map(|x| CandidateId(*x)).collect()
    }

    fn assert_conserved(res: &StvResult) {
        for step in res.steps.iter() {
            let moved: f64 = step.transfers.iter().map(|(_, v)| v).sum();
            assert!((moved + step.exhausted - step.redistributed).abs() < EPS);
            if !step.transfers.is_empty() {
                assert!(step.exhausted.abs() < EPS);
            }
        }
    }

    #[test]
    fn hagenbach_bischoff_quotas() {
        let expected = [50.0, 33.333333, 25.0, 20.0, 16.666667, 14.285714, 12.5];
        for (idx, q) in expected.iter().enumerate() {
            assert!((hagenbach_bischoff_quota(100, idx as u32 + 1) - q).abs() < 1e-6);
        }
    }

    #[test]
    fn droop_quotas() {
        let expected = [51, 34, 26, 21, 17, 15, 13];
        for (idx, q) in expected.iter().enumerate() {
            assert_eq!(droop_quota(100, idx as u32 + 1), *q);
        }
    }

    #[test]
    fn single_seat_scenario() {
        let ctx = ctx(&["A", "B", "C"]);
        let ballots = vec![ballot(&[1, 2]), ballot(&[2, 1]), ballot(&[1])];
        let res = run_stv(&ctx, &ballots, 1).unwrap();
        assert!((res.quota - 1.5).abs() < EPS);
        assert_eq!(res.ballot_count, 3);
        assert_eq!(
            res.first_preferences,
            vec![
                (CandidateId(1), 2.0),
                (CandidateId(2), 1.0),
                (CandidateId(3), 0.0)
            ]
        );
        assert_eq!(res.elected, ids(&[1]));
        assert_eq!(res.steps.len(), 1);
        assert_eq!(res.steps[0].action, StvAction::Seat);
    }

    #[test]
    fn surplus_moves_while_seats_remain() {
        let ctx = ctx(&["A", "B", "C", "D"]);
        // 9 ballots, 2 seats: quota 3.
        let ballots = vec![
            ballot(&[1, 2]).with_weight(4),
            ballot(&[1, 3]).with_weight(2),
            ballot(&[3]).with_weight(1),
            ballot(&[4]).with_weight(2),
        ];
        let res = run_stv(&ctx, &ballots, 2).unwrap();
        assert!((res.quota - 3.0).abs() < EPS);
        // A has 6: surplus 3 goes 2 to B and 1 to C.
        let first = &res.steps[0];
        assert_eq!(first.action, StvAction::Seat);
        assert_eq!(first.candidate, CandidateId(1));
        assert!((first.redistributed - 3.0).abs() < EPS);
        assert_eq!(first.transfers.len(), 2);
        assert_eq!(first.transfers[0].0, CandidateId(2));
        assert!((first.transfers[0].1 - 2.0).abs() < EPS);
        assert!((first.transfers[1].1 - 1.0).abs() < EPS);
        // B: 2, C: 2, D: 2. Nobody above 3: B, C, D tie and D is eliminated
        // last by name. D's ballots are exhausted.
        assert_eq!(res.steps[1].action, StvAction::Eliminate);
        assert_eq!(res.steps[1].candidate, CandidateId(4));
        assert!((res.steps[1].exhausted - 2.0).abs() < EPS);
        // Then C, whose first-preference ballot has no further choice.
        assert_eq!(res.steps[2].candidate, CandidateId(3));
        assert_eq!(res.elected, ids(&[1, 2]));
        assert_conserved(&res);
    }

    #[test]
    fn elimination_transfers_everything() {
        let ctx = ctx(&["A", "B", "C"]);
        // 7 ballots, 1 seat: quota 3.5
        let ballots = vec![
            ballot(&[1]).with_weight(3),
            ballot(&[2]).with_weight(2),
            ballot(&[3, 2]).with_weight(2),
        ];
        let res = run_stv(&ctx, &ballots, 1).unwrap();
        // B and C tie at 2, C is eliminated. B reaches 4 > 3.5.
        assert_eq!(res.steps[0].action, StvAction::Eliminate);
        assert_eq!(res.steps[0].candidate, CandidateId(3));
        assert_eq!(res.steps[0].transfers, vec![(CandidateId(2), 2.0)]);
        assert_eq!(res.elected, ids(&[2]));
        assert_conserved(&res);
    }

    #[test]
    fn continuing_candidate_before_source_blocks_transfer() {
        let ballots = vec![ballot(&[2, 1, 3]), ballot(&[1, 3])];
        let b: Vec<&RankedBallot> = ballots.iter().collect();
        let none: HashSet<CandidateId> = HashSet::new();
        let res = next_usable_choices(&b, &none, &none, CandidateId(1));
        assert_eq!(res.len(), 1);
        assert_eq!(res.get(&CandidateId(3)), Some(&1));

        // Once 2 is elected, it is skipped.
        let elected: HashSet<CandidateId> = ids(&[2]).into_iter().collect();
        let res = next_usable_choices(&b, &elected, &none, CandidateId(1));
        assert_eq!(res.get(&CandidateId(3)), Some(&2));
    }

    #[test]
    fn next_choice_skips_elected_and_excluded() {
        let ballots = vec![ballot(&[1, 2, 3, 4]).with_weight(5)];
        let b: Vec<&RankedBallot> = ballots.iter().collect();
        let elected: HashSet<CandidateId> = ids(&[2]).into_iter().collect();
        let excluded: HashSet<CandidateId> = ids(&[3]).into_iter().collect();
        let res = next_usable_choices(&b, &elected, &excluded, CandidateId(1));
        assert_eq!(res.get(&CandidateId(4)), Some(&5));
    }

    #[test]
    fn simultaneous_provisionals_are_capped_to_open_seats() {
        let ctx = ctx(&["A", "B", "C", "D"]);
        let mut count = StvCount::new(&ctx, Vec::new(), 2, 1.0);
        for (cid, total) in [(3, 5.0), (1, 5.0), (2, 5.0), (4, 0.5)] {
            count.vote_totals.insert(CandidateId(cid), total);
        }
        // Equal totals are seated by name.
        assert_eq!(count.next_state(), CountState::Seating(ids(&[1, 2])));
        count.seat(&ids(&[1, 2]));
        assert_eq!(count.elected, ids(&[1, 2]));
        // No surplus moves once the seats are filled.
        assert!(count.steps.iter().all(|s| s.redistributed == 0.0));
        assert_eq!(count.next_state(), CountState::Done);
    }

    #[test]
    fn steps_are_logged_by_name() {
        let _ = env_logger::builder().is_test(true).try_init();
        let ctx = ctx(&["Ann Lee", "Bo Chen"]);
        let count = StvCount::new(&ctx, Vec::new(), 1, 1.0);
        assert_eq!(
            count.describe(StvAction::Seat, CandidateId(1), 2.0),
            "Seat Ann Lee: 2.0"
        );
        assert_eq!(
            count.describe(StvAction::Eliminate, CandidateId(2), 0.5),
            "Eliminate Bo Chen: 0.5"
        );
        let res = run_stv(&ctx, &[ballot(&[1, 2]), ballot(&[1])], 1).unwrap();
        assert_eq!(res.elected, ids(&[1]));
    }

    #[test]
    fn at_most_one_step_per_seat_above_quota() {
        let ctx = ctx(&["A", "B", "C"]);
        let mut count = StvCount::new(&ctx, Vec::new(), 3, 1.0);
        for (cid, total) in [(1, 3.0), (2, 2.0), (3, 1.0)] {
            count.vote_totals.insert(CandidateId(cid), total);
        }
        assert_eq!(count.next_state(), CountState::Seating(ids(&[1, 2])));
    }

    #[test]
    fn blank_ballots_are_ignored() {
        let ctx = ctx(&["A", "B"]);
        let ballots = vec![ballot(&[1]), ballot(&[]).with_weight(10), ballot(&[2, 1])];
        let res = run_stv(&ctx, &ballots, 1).unwrap();
        assert_eq!(res.ballot_count, 2);
        assert!((res.quota - 1.0).abs() < EPS);
        let total: f64 = res.first_preferences.iter().map(|(_, v)| v).sum();
        assert!((total - 2.0).abs() < EPS);
    }

    #[test]
    fn zero_ballots_still_fill_the_seats() {
        let ctx = ctx(&["A", "B", "C"]);
        let res = run_stv(&ctx, &[ballot(&[])], 2).unwrap();
        assert_eq!(res.quota, 0.0);
        assert_eq!(res.ballot_count, 0);
        // C is eliminated last by name, A and B are seated.
        assert_eq!(res.elected, ids(&[1, 2]));
        assert_eq!(res.steps[0].action, StvAction::Eliminate);
        assert_eq!(res.steps[0].candidate, CandidateId(3));
    }

    #[test]
    fn single_ballot_elects_its_choice() {
        let ctx = ctx(&["A", "B", "C"]);
        // One ballot: quota 0.5.
        let res = run_stv(&ctx, &[ballot(&[3])], 1).unwrap();
        assert_eq!(res.elected, ids(&[3]));
    }

    #[test]
    fn candidates_without_first_preferences_are_present() {
        let ctx = ctx(&["A", "B", "C"]);
        let res = run_stv(&ctx, &[ballot(&[1, 3]).with_weight(3), ballot(&[2])], 1).unwrap();
        assert!(res
            .first_preferences
            .iter()
            .any(|(cid, v)| *cid == CandidateId(3) && *v == 0.0));
    }

    #[test]
    fn invalid_configurations() {
        let ctx = ctx(&["A", "B"]);
        assert_eq!(count_stv(&ctx, &[], 0), Err(TallyError::NoSeats));
        assert_eq!(
            count_stv(&ctx, &[], 3),
            Err(TallyError::TooManySeats {
                seat_count: 3,
                candidate_count: 2
            })
        );
        assert_eq!(
            count_stv(&ctx, &[ballot(&[7])], 1),
            Err(TallyError::UnknownCandidate {
                cid: CandidateId(7)
            })
        );
    }

    #[test]
    fn every_seat_is_filled_without_duplicates() {
        let ctx = ctx(&["A", "B", "C", "D", "E", "F"]);
        let ballots = vec![
            ballot(&[1, 2, 3]).with_weight(7),
            ballot(&[2, 4]).with_weight(3),
            ballot(&[5]).with_weight(1),
            ballot(&[6, 5, 4]).with_weight(4),
            ballot(&[3, 1]).with_weight(2),
            ballot(&[4, 6, 1]).with_weight(5),
        ];
        for seats in 1..=6 {
            let res = run_stv(&ctx, &ballots, seats).unwrap();
            assert_eq!(res.elected.len(), seats as usize);
            let unique: HashSet<CandidateId> = res.elected.iter().cloned().collect();
            assert_eq!(unique.len(), seats as usize);
            assert!(res.elected.iter().all(|cid| ctx.contains(*cid)));
            assert_conserved(&res);
        }
    }

    #[test]
    fn same_input_same_result() {
        let ctx = ctx(&["A", "B", "C", "D"]);
        let ballots = vec![
            ballot(&[1, 2]),
            ballot(&[2, 3]),
            ballot(&[3, 4]),
            ballot(&[4, 1]),
        ];
        let first = run_stv(&ctx, &ballots, 2).unwrap();
        for _ in 0..5 {
            assert_eq!(run_stv(&ctx, &ballots, 2).unwrap(), first);
        }
    }
}
