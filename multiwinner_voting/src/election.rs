use log::{debug, info};

use crate::approval::*;
use crate::ballots::*;
use crate::candidates::ElectionContext;
use crate::config::*;
use crate::pav::*;
use crate::stv::run_stv;

/// The ballots of one election, in both approval and ranked forms.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Election {
    pub context: ElectionContext,
    pub approval_ballots: Vec<ApprovalBallot>,
    pub ranked_ballots: Vec<RankedBallot>,
    pub seat_count: u32,
}

impl Election {
    /// An election collected with ranked ballots. The approval ballots are
    /// simulated: every voter approves as many choices as there are seats.
    pub fn from_ranked(
        context: ElectionContext,
        ranked_ballots: Vec<RankedBallot>,
        seat_count: u32,
    ) -> Election {
        Election::from_ranked_approving(context, ranked_ballots, seat_count, seat_count as usize)
    }

    /// Same as [Election::from_ranked], but every voter approves their first
    /// `approved_ranks` choices whatever the number of seats.
    pub fn from_ranked_approving(
        context: ElectionContext,
        ranked_ballots: Vec<RankedBallot>,
        seat_count: u32,
        approved_ranks: usize,
    ) -> Election {
        let approval_ballots = ranked_to_approval(&ranked_ballots, approved_ranks);
        Election {
            context,
            approval_ballots,
            ranked_ballots,
            seat_count,
        }
    }

    /// An election collected with approval ballots. The ranked ballots are
    /// simulated by ordering every approval set by approval count, then name.
    pub fn from_approval(
        mut context: ElectionContext,
        approval_ballots: Vec<ApprovalBallot>,
        seat_count: u32,
    ) -> Election {
        context.set_counts(count_av(&approval_ballots));
        let ranked_ballots = approval_to_ranked(&approval_ballots, &context.ordering());
        Election {
            context,
            approval_ballots,
            ranked_ballots,
            seat_count,
        }
    }
}

/// Runs every counting method on the election.
///
/// The approval counts are computed first and become the ordering of the
/// candidates for everything that follows. They do not change any score.
pub fn tally_election(election: &mut Election, max_slates: usize) -> TallyResult<ElectionResults> {
    tally_election_with_progress(election, max_slates, &mut |_, _| {})
}

pub fn tally_election_with_progress(
    election: &mut Election,
    max_slates: usize,
    progress: &mut dyn FnMut(u64, u64),
) -> TallyResult<ElectionResults> {
    info!(
        "tally_election: {} candidates, {} approval ballots, {} ranked ballots, {} seats",
        election.context.count(),
        election.approval_ballots.len(),
        election.ranked_ballots.len(),
        election.seat_count
    );
    let approval_counts = count_av(&election.approval_ballots);
    election.context.set_counts(approval_counts.clone());

    let ctx = &election.context;
    let ordering = ctx.ordering();
    let ballots = &election.approval_ballots;

    let approval = ordering.sort_desc_by_value(&approval_counts);
    let net_approval = ordering.sort_desc_by_value(&count_net_av(ctx, ballots));
    let satisfaction_approval = ordering.sort_desc_by_value(&count_sav(ballots));

    let pav = count_pav_with_progress(ctx, ballots, election.seat_count, progress)?;
    let slate_count = binomial(ctx.count() as u64, election.seat_count as u64).unwrap_or(u64::MAX);
    let proportional_approval = top_slates(&pav, max_slates, &ordering);
    debug!(
        "tally_election: {} scored slates, keeping {}",
        pav.len(),
        proportional_approval.len()
    );

    let sequential_proportional_approval = ordering.sort_desc_by_value(&count_spav(ctx, ballots));
    let stv = run_stv(ctx, &election.ranked_ballots, election.seat_count)?;

    Ok(ElectionResults {
        approval,
        net_approval,
        satisfaction_approval,
        proportional_approval,
        slate_count,
        sequential_proportional_approval,
        stv,
    })
}
