/*!
Tallying of multi-winner elections.

The following counting methods are implemented:
* Approval Voting (AV), Net Approval Voting and Satisfaction Approval Voting (SAV)
* Sequential Proportional Approval Voting (SPAV)
* Proportional Approval Voting (PAV), by enumeration of all the slates
* Single Transferable Vote (STV) with the Hagenbach-Bischoff quota and the Wright system

All the candidates of an election live in an [ElectionContext] that is passed
explicitly to every count. See the [builder] module to build an election from
candidate names, and the [manual] for the input formats understood by the
`mwtally` program.

```
use multiwinner_voting::builder::Builder;
use multiwinner_voting::tally_election;

let names: Vec<String> = vec!["Ann".to_string(), "Bob".to_string(), "Cyd".to_string()];
let mut builder = Builder::new(1).candidates(&names);
builder.add_ranked_vote(&["Ann".to_string(), "Bob".to_string()], 1)?;
builder.add_ranked_vote(&["Bob".to_string(), "Ann".to_string()], 1)?;
builder.add_ranked_vote(&["Ann".to_string()], 1)?;
let mut election = builder.build();

let results = tally_election(&mut election, 10)?;
assert_eq!(election.context.name(results.stv.elected[0]), "Ann");
# Ok::<(), multiwinner_voting::TallyError>(())
```
*/

mod approval;
mod ballots;
mod candidates;
mod config;
mod election;
mod pav;
mod stv;

pub mod builder;
pub mod manual;

pub use crate::approval::{count_av, count_net_av, count_sav, count_spav};
pub use crate::ballots::{
    aggregate_ranked, approval_to_ranked, ranked_to_approval, ApprovalBallot, RankedBallot,
};
pub use crate::candidates::{Candidate, CandidateId, CandidateOrdering, ElectionContext};
pub use crate::config::*;
pub use crate::election::{tally_election, tally_election_with_progress, Election};
pub use crate::pav::{
    binomial, count_pav, count_pav_with_progress, harmonic, top_slates, Slate,
    MIN_SLATE_COUNT_FOR_PROGRESS,
};
pub use crate::stv::{count_stv, droop_quota, hagenbach_bischoff_quota, run_stv};
