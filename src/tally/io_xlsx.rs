use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::tally::*;

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> BMwResult<calamine::Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => Err(Box::new(MwError::EmptyExcel {})),
            [(worksheet_name, wrange)] => {
                debug!("get_range: using worksheet {:?}", worksheet_name);
                Ok(wrange.clone())
            }
            _ => Err(Box::new(MwError::TooManyWorksheets {
                count: all_worksheets.len(),
            })),
        }
    }
}

fn header_name(cell: &DataType, lineno: u64) -> BMwResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Empty => Ok("".to_string()),
        _ => Err(Box::new(MwError::ExcelWrongCellType {
            lineno,
            content: format!("{:?}", cell),
        })),
    }
}

fn is_approval(cell: &DataType, lineno: u64) -> BMwResult<bool> {
    match cell {
        DataType::Empty => Ok(false),
        DataType::String(s) => Ok(!s.trim().is_empty()),
        DataType::Error(_) => Err(Box::new(MwError::ExcelWrongCellType {
            lineno,
            content: format!("{:?}", cell),
        })),
        _ => Ok(true),
    }
}

/// Approval ballots as a matrix of cells, in the same layout as the CSV
/// approval files. The rows are given in the order of the worksheet.
pub fn parse_approval_rows<'a, I>(mut rows: I) -> BMwResult<ParsedElection>
where
    I: Iterator<Item = &'a [DataType]>,
{
    let header = rows.next().context(EmptyExcelSnafu {})?;
    let mut names: Vec<String> = header
        .iter()
        .map(|cell| header_name(cell, 1))
        .collect::<BMwResult<Vec<String>>>()?;
    while names.last().map(|s| s.is_empty()).unwrap_or(false) {
        names.pop();
    }
    debug!("parse_approval_rows: header: {:?}", names);

    let mut ballots: Vec<ApprovalBallot> = Vec::new();
    for (idx, row) in rows.enumerate() {
        let lineno = (idx + 2) as u64;
        let mut approved: Vec<CandidateId> = Vec::new();
        for (col, cell) in row.iter().enumerate() {
            if !is_approval(cell, lineno)? {
                continue;
            }
            if col >= names.len() {
                return Err(Box::new(MwError::ExcelWrongCellType {
                    lineno,
                    content: format!("{:?}", cell),
                }));
            }
            approved.push(CandidateId(col as i32));
        }
        ballots.push(ApprovalBallot::new(approved));
    }
    info!(
        "parse_approval_rows: {} candidates, {} ballots",
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

pub fn read_xlsx_approval(path: &str, worksheet_name: Option<&str>) -> BMwResult<ParsedElection> {
    let wrange = get_range(path, worksheet_name)?;
    parse_approval_rows(wrange.rows())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(x: &str) -> DataType {
        DataType::String(x.to_string())
    }

    #[test]
    fn approval_rows() {
        let rows: Vec<Vec<DataType>> = vec![
            vec![s("Ann"), s("Bob"), DataType::Empty],
            vec![DataType::Int(1), DataType::Empty, DataType::Empty],
            vec![s(" "), s("x")],
            vec![DataType::Bool(true), DataType::Float(1.0)],
        ];
        let parsed = parse_approval_rows(rows.iter().map(|r| r.as_slice())).unwrap();
        assert_eq!(
            parsed.candidates,
            vec![(0, "Ann".to_string()), (1, "Bob".to_string())]
        );
        match parsed.ballots {
            ParsedBallots::Approval(b) => {
                assert_eq!(b.len(), 3);
                assert!(b[0].approves(&CandidateId(0)));
                assert_eq!(b[0].len(), 1);
                assert!(b[1].approves(&CandidateId(1)));
                assert_eq!(b[1].len(), 1);
                assert_eq!(b[2].len(), 2);
            }
            ParsedBallots::Ranked(_) => panic!("expected approval ballots"),
        }
    }

    #[test]
    fn approval_outside_the_header() {
        let rows: Vec<Vec<DataType>> = vec![vec![s("Ann")], vec![s("x"), s("x")]];
        assert!(parse_approval_rows(rows.iter().map(|r| r.as_slice())).is_err());
        let empty: Vec<Vec<DataType>> = vec![];
        assert!(parse_approval_rows(empty.iter().map(|r| r.as_slice())).is_err());
    }
}
