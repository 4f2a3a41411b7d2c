// The console report of all the counts.

use std::collections::HashMap;
use std::io::Write;

use crate::tally::*;

const MIN_NAME_FIELD_LENGTH: usize = 31;

fn section<W: Write>(w: &mut W, title: &str) -> std::io::Result<()> {
    writeln!(w, "\n{}", title)?;
    writeln!(w, "=======================================")
}

fn print_stv<W: Write>(w: &mut W, ctx: &ElectionContext, stv: &StvResult) -> std::io::Result<()> {
    writeln!(w, "Quota: {:.2}", stv.quota)?;
    write!(w, "First preferences: ")?;
    for (cid, count) in stv.first_preferences.iter() {
        write!(w, "{}: {:.0}; ", ctx.last_name(*cid), count)?;
    }
    writeln!(w)?;

    // Replays the count to show the totals before and after every transfer.
    let mut totals: HashMap<CandidateId, f64> = stv.first_preferences.iter().cloned().collect();
    for step in stv.steps.iter() {
        let action = match step.action {
            StvAction::Seat => "Seat",
            StvAction::Eliminate => "Eliminate",
        };
        write!(
            w,
            "{}, {}, {:.1}; ",
            action,
            ctx.last_name(step.candidate),
            step.total
        )?;
        if step.redistributed > 0.0 {
            write!(w, "Redistribute {:.1} votes; ", step.redistributed)?;
        }
        for (cid, share) in step.transfers.iter() {
            let current = totals.entry(*cid).or_insert(0.0);
            write!(
                w,
                "{}: {:.1}+{:.1}={:.1}; ",
                ctx.last_name(*cid),
                current,
                share,
                *current + share
            )?;
            *current += share;
        }
        writeln!(w)?;
        totals.remove(&step.candidate);
    }
    Ok(())
}

pub fn print_report<W: Write>(
    w: &mut W,
    election: &Election,
    results: &ElectionResults,
) -> std::io::Result<()> {
    let ctx = &election.context;
    let ordering = ctx.ordering();
    let width = ctx.max_name_length().max(MIN_NAME_FIELD_LENGTH);

    section(w, "APPROVAL VOTING")?;
    for (cid, count) in results.approval.iter() {
        writeln!(w, "{:<width$}{:>8}", ctx.name(*cid), count, width = width)?;
    }

    section(w, "NET APPROVAL VOTING")?;
    for (cid, count) in results.net_approval.iter() {
        writeln!(w, "{:<width$}{:>8}", ctx.name(*cid), count, width = width)?;
    }

    section(w, "SATISFACTION APPROVAL VOTING")?;
    for (cid, score) in results.satisfaction_approval.iter() {
        writeln!(w, "{:<width$}{:>8.3}", ctx.name(*cid), score, width = width)?;
    }

    section(w, "PROPORTIONAL APPROVAL VOTING")?;
    let slate_width = ctx.max_name_length() * election.seat_count as usize;
    for (slate, score) in results.proportional_approval.iter() {
        let names: Vec<String> = slate
            .sorted_members(&ordering)
            .iter()
            .map(|cid| ctx.name(*cid))
            .collect();
        let label = format!("[{}]", names.join(", "));
        writeln!(w, "{:<width$}{:>8.3}", label, score, width = slate_width)?;
    }

    section(w, "SEQUENTIAL PROPORTIONAL APPROVAL VOTING")?;
    for (cid, score) in results.sequential_proportional_approval.iter() {
        writeln!(w, "{:<width$}{:>8.3}", ctx.name(*cid), score, width = width)?;
    }

    section(w, "SINGLE TRANSFERABLE VOTE")?;
    print_stv(w, ctx, &results.stv)?;
    writeln!(w, "Final Results")?;
    writeln!(w, "-------------")?;
    for cid in results.stv.elected.iter() {
        writeln!(w, "{:<width$}", ctx.name(*cid), width = width)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(blt: &str) -> String {
        let parsed = io_blt::parse_blt(blt).unwrap();
        let seats = parsed.seat_count.unwrap();
        let mut election = build_election(parsed, seats);
        let results = tally_election(&mut election, 10).unwrap();
        let mut buf: Vec<u8> = Vec::new();
        print_report(&mut buf, &election, &results).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn all_sections() {
        let text = report("3 1\n1 1 2 0\n1 2 1 0\n1 1 0\n0\n\"Ann Lee\" \"Bo Chen\" \"Cy Diaz\"\n\"t\"");
        for title in [
            "\nAPPROVAL VOTING\n",
            "\nNET APPROVAL VOTING\n",
            "\nSATISFACTION APPROVAL VOTING\n",
            "\nPROPORTIONAL APPROVAL VOTING\n",
            "\nSEQUENTIAL PROPORTIONAL APPROVAL VOTING\n",
            "\nSINGLE TRANSFERABLE VOTE\n",
        ] {
            assert!(text.contains(title), "missing {:?}", title);
        }
        assert!(text.contains(&format!("{:<31}{:>8}\n", "Ann Lee", 2)));
        assert!(text.contains("Quota: 1.50\n"));
        assert!(text.contains("First preferences: Lee: 2; Chen: 1; Diaz: 0; \n"));
        assert!(text.contains("Seat, Lee, 2.0; \n"));
        assert!(text.ends_with(&format!("Final Results\n-------------\n{:<31}\n", "Ann Lee")));
    }

    #[test]
    fn transfers_are_replayed() {
        // Ann is seated with a surplus of 2 - 4/3 that goes to Bo.
        let text = report("3 2\n2 1 2 0\n1 3 0\n1 2 0\n0\n\"Ann Lee\" \"Bo Chen\" \"Cy Diaz\"\n\"t\"");
        assert!(text.contains("Seat, Lee, 2.0; Redistribute 0.7 votes; Chen: 1.0+0.7=1.7; \n"));
        assert!(text.contains("Seat, Chen, 1.7; \n"));
    }
}
