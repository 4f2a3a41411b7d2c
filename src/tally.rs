pub mod config_reader;
pub mod io_blt;
pub mod io_common;
pub mod io_csv;
pub mod io_xlsx;
pub mod report;

use log::{debug, info, warn};

use multiwinner_voting::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::tally::config_reader::*;
use crate::tally::io_common::InputType;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MwError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file has no data"))]
    EmptyExcel {},
    #[snafu(display("Cannot find worksheet {name:?}"))]
    MissingWorksheet { name: String },
    #[snafu(display("The workbook has {count} worksheets, use --excel-worksheet-name to choose one"))]
    TooManyWorksheets { count: usize },
    #[snafu(display("Unexpected cell on line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error reading CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("The CSV file has no header line"))]
    CsvEmpty {},
    #[snafu(display("Unexpected cell on line {lineno}: {content:?}"))]
    CsvWrongCell { lineno: usize, content: String },
    #[snafu(display("BLT syntax error on line {lineno}: {message}"))]
    BltSyntax { lineno: usize, message: String },
    #[snafu(display("Unknown input type {input_type:?}"))]
    UnknownInputType { input_type: String },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error while tallying"))]
    Tallying { source: TallyError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type MwResult<T> = Result<T, MwError>;

// The readers return boxed errors, the variants holding the parsers' errors are large.
pub type BMwResult<T> = Result<T, Box<MwError>>;

/// The ballots of a file.
#[derive(PartialEq, Debug, Clone)]
pub enum ParsedBallots {
    Ranked(Vec<RankedBallot>),
    Approval(Vec<ApprovalBallot>),
}

/// An election, as parsed by the readers.
/// Withdrawn candidates are already removed from the candidates and from the ballots.
#[derive(PartialEq, Debug, Clone)]
pub struct ParsedElection {
    pub title: Option<String>,
    pub candidates: Vec<(i32, String)>,
    pub withdrawn: HashSet<i32>,
    pub seat_count: Option<u32>,
    pub ballots: ParsedBallots,
}

/// Registers the candidates and completes the ballots with the simulated ones.
///
/// The simulated approval ballots approve as many choices as the seats
/// declared by the file, even when another seat count is requested.
pub fn build_election(parsed: ParsedElection, seat_count: u32) -> Election {
    let mut context = ElectionContext::new();
    for (idx, name) in parsed.candidates.iter() {
        context.register(*idx, name);
    }
    let approved_ranks = parsed.seat_count.unwrap_or(seat_count) as usize;
    match parsed.ballots {
        ParsedBallots::Ranked(ballots) => {
            Election::from_ranked_approving(context, ballots, seat_count, approved_ranks)
        }
        ParsedBallots::Approval(ballots) => Election::from_approval(context, ballots, seat_count),
    }
}

fn read_input(path: &str, input_type: InputType, worksheet: Option<&str>) -> BMwResult<ParsedElection> {
    info!("read_input: reading {:?} as {:?}", path, input_type);
    match input_type {
        InputType::Blt => io_blt::read_blt(path),
        InputType::Csv => io_csv::read_csv_approval(path),
        InputType::SurveyMonkey => io_csv::read_surveymonkey(path),
        InputType::Xlsx => io_xlsx::read_xlsx_approval(path, worksheet),
    }
}

fn read_config(path: &str) -> MwResult<(TallyConfig, PathBuf)> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: TallyConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    let root = Path::new(path)
        .parent()
        .context(MissingParentDirSnafu {})?
        .to_path_buf();
    debug!("read_config: config: {:?} root: {:?}", config, root);
    Ok((config, root))
}

fn join_path(root: &Option<PathBuf>, p: &str) -> String {
    match root {
        Some(r) => r.join(p).display().to_string(),
        None => p.to_string(),
    }
}

fn scores_to_json<V: Into<JSValue> + Copy>(ctx: &ElectionContext, scores: &[(CandidateId, V)]) -> Vec<JSValue> {
    scores
        .iter()
        .map(|(cid, score)| {
            let v: JSValue = (*score).into();
            json!({"name": ctx.name(*cid), "score": v})
        })
        .collect()
}

fn stv_to_json(ctx: &ElectionContext, stv: &StvResult) -> JSValue {
    let mut first_preferences: JSMap<String, JSValue> = JSMap::new();
    for (cid, count) in stv.first_preferences.iter() {
        first_preferences.insert(ctx.name(*cid), json!(count));
    }
    let steps: Vec<JSValue> = stv
        .steps
        .iter()
        .map(|step| {
            let mut transfers: JSMap<String, JSValue> = JSMap::new();
            for (cid, amount) in step.transfers.iter() {
                transfers.insert(ctx.name(*cid), json!(amount));
            }
            if step.exhausted > 0.0 {
                transfers.insert("exhausted".to_string(), json!(step.exhausted));
            }
            let action = match step.action {
                StvAction::Seat => "seated",
                StvAction::Eliminate => "eliminated",
            };
            json!({action: ctx.name(step.candidate), "total": step.total, "transfers": transfers})
        })
        .collect();
    let elected: Vec<String> = stv.elected.iter().map(|cid| ctx.name(*cid)).collect();
    json!({
        "quota": stv.quota,
        "ballots": stv.ballot_count,
        "firstPreferences": first_preferences,
        "steps": steps,
        "elected": elected,
    })
}

/// The JSON summary of all the counts.
pub fn build_summary_js(
    contest: &OutputSettings,
    election: &Election,
    results: &ElectionResults,
) -> JSValue {
    let ctx = &election.context;
    let ordering = ctx.ordering();
    let config = OutputConfig {
        contest: contest.contest_name.clone(),
        date: contest.contest_date.clone(),
        jurisdiction: contest.contest_jurisdiction.clone(),
        office: contest.contest_office.clone(),
        seats: election.seat_count,
        quota: Some(format!("{:.6}", results.stv.quota)),
    };
    let slates: Vec<JSValue> = results
        .proportional_approval
        .iter()
        .map(|(slate, score)| {
            let names: Vec<String> = slate
                .sorted_members(&ordering)
                .iter()
                .map(|cid| ctx.name(*cid))
                .collect();
            json!({"slate": names, "score": score})
        })
        .collect();
    json!({
        "config": config,
        "results": {
            "approval": scores_to_json(ctx, &results.approval),
            "netApproval": scores_to_json(ctx, &results.net_approval),
            "satisfactionApproval": scores_to_json(ctx, &results.satisfaction_approval),
            "proportionalApproval": {
                "slateCount": results.slate_count,
                "slates": slates,
            },
            "sequentialProportionalApproval":
                scores_to_json(ctx, &results.sequential_proportional_approval),
            "singleTransferableVote": stv_to_json(ctx, &results.stv),
        }
    })
}

fn write_output(out: &str, contents: &str) -> MwResult<()> {
    if out == "stdout" {
        println!("{}", contents);
    } else {
        info!("write_output: writing summary to {:?}", out);
        fs::write(out, contents).context(WritingFileSnafu { path: out })?;
    }
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> MwResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("check_reference: found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("check_reference: the summary matches {:?}", reference_path);
    Ok(())
}

pub fn run_election(args: &Args) -> MwResult<()> {
    let (config, root) = match &args.config {
        Some(p) => {
            let (c, r) = read_config(p)?;
            (Some(c), Some(r))
        }
        None => (None, None),
    };
    let source = config.as_ref().map(|c| c.source.clone());
    let rules = config.as_ref().and_then(|c| c.rules.clone());

    let input_path: String = match (&args.input, &source) {
        (Some(p), _) => p.clone(),
        (None, Some(s)) => join_path(&root, &s.file_path),
        (None, None) => whatever!("No input file: use --input or --config"),
    };
    let input_type: InputType = match (&args.input_type, &source) {
        (Some(t), _) => io_common::parse_input_type(t)?,
        (None, Some(s)) => io_common::parse_input_type(&s.provider)?,
        (None, None) => io_common::infer_input_type(&input_path),
    };
    let worksheet: Option<String> = args
        .excel_worksheet_name
        .clone()
        .or_else(|| source.as_ref().and_then(|s| s.excel_worksheet_name.clone()));

    let parsed = read_input(&input_path, input_type, worksheet.as_deref()).map_err(|e| *e)?;
    info!(
        "run_election: {} candidates, {} withdrawn",
        parsed.candidates.len(),
        parsed.withdrawn.len()
    );

    let seat_count: u32 = args
        .seats
        .or_else(|| rules.as_ref().and_then(|r| r.seat_count))
        .or(parsed.seat_count)
        .unwrap_or(1);
    let max_slates: usize = args
        .max_slates
        .or_else(|| rules.as_ref().and_then(|r| r.max_proportional_slates))
        .unwrap_or(10);

    let contest = match &config {
        Some(c) => c.output_settings.clone(),
        None => OutputSettings::from_title(
            parsed
                .title
                .clone()
                .unwrap_or_else(|| io_common::simplify_file_name(&input_path)),
        ),
    };

    let mut election = build_election(parsed, seat_count);

    if let Some(blt_path) = &args.blt_out {
        let mut f = fs::File::create(blt_path).context(WritingFileSnafu { path: blt_path })?;
        io_blt::write_blt(
            &mut f,
            &election.context,
            seat_count,
            &aggregate_ranked(&election.ranked_ballots),
            &contest.contest_name,
        )
        .context(WritingFileSnafu { path: blt_path })?;
        info!("run_election: ballots written to {:?}", blt_path);
    }

    let results = tally_election_with_progress(&mut election, max_slates, &mut |done, total| {
        info!("count_pav: {}/{} slates ({}%)", done, total, done * 100 / total)
    })
    .context(TallyingSnafu {})?;

    let stdout = std::io::stdout();
    report::print_report(&mut stdout.lock(), &election, &results)
        .context(WritingFileSnafu { path: "stdout" })?;

    let result_js = build_summary_js(&contest, &election, &results);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    let out: Option<String> = args.out.clone().or_else(|| {
        contest
            .output_directory
            .as_ref()
            .map(|d| join_path(&root, &format!("{}/summary.json", d)))
    });
    if let Some(out) = out {
        write_output(&out, &pretty_js_stats)?;
    }

    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }

    Ok(())
}
