// Primitives for reading CSV files.

use std::io::Read;

use csv::StringRecord;

use crate::tally::*;

fn get_records<R: Read>(rdr: R) -> BMwResult<(Vec<String>, csv::StringRecordsIntoIter<R>)> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(rdr);
    let mut records = rdr.into_records();
    let header: StringRecord = records
        .next()
        .context(CsvEmptySnafu {})?
        .context(CsvLineParseSnafu {})?;
    let names: Vec<String> = header.iter().map(|s| s.to_string()).collect();
    debug!("get_records: header: {:?}", names);
    Ok((names, records))
}

fn open_file(path: &str) -> BMwResult<std::fs::File> {
    let f = std::fs::File::open(path).context(OpeningFileSnafu { path })?;
    Ok(f)
}

// The cells past the last candidate must be empty.
fn check_extra_cells(line: &StringRecord, candidate_count: usize, lineno: usize) -> BMwResult<()> {
    if let Some(s) = line.iter().skip(candidate_count).find(|s| !s.trim().is_empty()) {
        return Err(Box::new(MwError::CsvWrongCell {
            lineno,
            content: s.to_string(),
        }));
    }
    Ok(())
}

/// Approval ballots as a matrix: the first line holds the names of the
/// candidates, numbered from 0, and every non-empty cell is an approval.
pub fn parse_csv_approval<R: Read>(rdr: R) -> BMwResult<ParsedElection> {
    let (names, records) = get_records(rdr)?;
    let mut ballots: Vec<ApprovalBallot> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // The header is on the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        check_extra_cells(&line, names.len(), lineno)?;
        let approved: Vec<CandidateId> = line
            .iter()
            .take(names.len())
            .enumerate()
            .filter(|(_, s)| !s.is_empty())
            .map(|(col, _)| CandidateId(col as i32))
            .collect();
        debug!("parse_csv_approval: lineno: {:?} approved: {:?}", lineno, approved);
        ballots.push(ApprovalBallot::new(approved));
    }
    info!(
        "parse_csv_approval: {} candidates, {} ballots",
        names.len(),
        ballots.len()
    );
    Ok(ParsedElection {
        title: None,
        candidates: names
            .into_iter()
            .enumerate()
            .map(|(col, name)| (col as i32, name))
            .collect(),
        withdrawn: HashSet::new(),
        seat_count: None,
        ballots: ParsedBallots::Approval(ballots),
    })
}

pub fn read_csv_approval(path: &str) -> BMwResult<ParsedElection> {
    parse_csv_approval(open_file(path)?)
}

/// Ranking questions exported by SurveyMonkey: the first line holds the names
/// of the candidates, numbered from 1, and every cell holds the rank given to
/// the candidate. A lower rank is a higher preference and empty cells are not
/// ranked. Candidates with the same rank are ordered by index.
pub fn parse_surveymonkey<R: Read>(rdr: R) -> BMwResult<ParsedElection> {
    let (names, records) = get_records(rdr)?;
    let mut ballots: Vec<RankedBallot> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        check_extra_cells(&line, names.len(), lineno)?;
        let mut ranks: Vec<(f64, CandidateId)> = Vec::new();
        for (col, cell) in line.iter().take(names.len()).enumerate() {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            let rank = cell.parse::<f64>().ok().context(CsvWrongCellSnafu {
                lineno,
                content: cell,
            })?;
            ranks.push((rank, CandidateId(col as i32 + 1)));
        }
        ranks.sort_by(|(ra, ca), (rb, cb)| {
            ra.partial_cmp(rb)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ca.cmp(cb))
        });
        debug!("parse_surveymonkey: lineno: {:?} ranks: {:?}", lineno, ranks);
        ballots.push(RankedBallot::new(ranks.into_iter().map(|(_, cid)| cid)));
    }
    let ballots = aggregate_ranked(&ballots);
    info!(
        "parse_surveymonkey: {} candidates, {} distinct ballots",
        names.len(),
        ballots.len()
    );
    Ok(ParsedElection {
        title: None,
        candidates: names
            .into_iter()
            .enumerate()
            .map(|(col, name)| (col as i32 + 1, name))
            .collect(),
        withdrawn: HashSet::new(),
        seat_count: None,
        ballots: ParsedBallots::Ranked(ballots),
    })
}

pub fn read_surveymonkey(path: &str) -> BMwResult<ParsedElection> {
    parse_surveymonkey(open_file(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_matrix() {
        let parsed = parse_csv_approval("Ann,Bob,Cyd\nx,,1\n,,\n,yes\n".as_bytes()).unwrap();
        assert_eq!(parsed.candidates[0], (0, "Ann".to_string()));
        assert_eq!(parsed.candidates.len(), 3);
        match parsed.ballots {
            ParsedBallots::Approval(b) => {
                assert_eq!(b.len(), 3);
                assert_eq!(b[0].len(), 2);
                assert!(b[0].approves(&CandidateId(0)));
                assert!(b[0].approves(&CandidateId(2)));
                assert!(b[1].is_blank());
                assert!(b[2].approves(&CandidateId(1)));
            }
            ParsedBallots::Ranked(_) => panic!("expected approval ballots"),
        }
    }

    #[test]
    fn approval_extra_cells() {
        assert!(parse_csv_approval("A,B\nx,x,\n".as_bytes()).is_ok());
        assert!(parse_csv_approval("A,B\nx,x,x\n".as_bytes()).is_err());
        assert!(parse_csv_approval("".as_bytes()).is_err());
    }

    #[test]
    fn surveymonkey_ranks() {
        let parsed = parse_surveymonkey("A,B,C\n2,1,3\n,1,\n2,1,3\n1,1,\n".as_bytes()).unwrap();
        assert_eq!(parsed.candidates[2], (3, "C".to_string()));
        match parsed.ballots {
            ParsedBallots::Ranked(b) => {
                assert_eq!(b.len(), 3);
                assert_eq!(
                    b[0].ranking(),
                    &[CandidateId(2), CandidateId(1), CandidateId(3)]
                );
                assert_eq!(b[0].weight(), 2);
                assert_eq!(b[1].ranking(), &[CandidateId(2)]);
                assert_eq!(b[2].ranking(), &[CandidateId(1), CandidateId(2)]);
            }
            ParsedBallots::Approval(_) => panic!("expected ranked ballots"),
        }
    }

    #[test]
    fn surveymonkey_bad_cell() {
        match parse_surveymonkey("A,B\n1,first\n".as_bytes()) {
            Err(e) => match *e {
                MwError::CsvWrongCell { lineno, content } => {
                    assert_eq!(lineno, 2);
                    assert_eq!(content, "first");
                }
                other => panic!("unexpected error {:?}", other),
            },
            Ok(_) => panic!("expected an error"),
        }
    }
}
