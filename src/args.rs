use clap::Parser;

/// This is a multi-winner election tabulation program: approval voting and its
/// proportional variants, and single transferable vote.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file containing the ballots. Setting this option overrides what may be
    /// specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (blt, csv, surveymonkey or xlsx) The type of the input. If not specified, it is
    /// inferred from the extension of the input file.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (number) The number of seats to fill. Defaults to the number of seats of a BLT file,
    /// or to 1.
    #[clap(short, long, value_parser)]
    pub seats: Option<u32>,

    /// (number, default 10) The number of slates to print for proportional approval voting.
    #[clap(long, value_parser)]
    pub max_slates: Option<usize>,

    /// (file path, optional) A JSON file describing the election.
    /// For more information about the file format, read the manual of the multiwinner_voting crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, mwtally will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path) If specified, the ranked ballots are also written to this file in the BLT format.
    #[clap(long, value_parser)]
    pub blt_out: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
