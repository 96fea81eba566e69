use clap::Parser;

/// This is an accessibility self-assessment scoring and reporting program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The assessment description in JSON format: output settings,
    /// the location of the question catalog and the answer sources to read.
    /// For more information about the file format, read the documentation.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference report in JSON format. If provided, dostup will
    /// check that the assembled report matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the assembled report will be written
    /// in JSON format to the given location. Setting this option overrides the output
    /// directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) A single answers file. Shortcut for a configuration with one
    /// answer source; requires --questions.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default json) The type of the answers input: json, csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path) The question catalog in JSON format, when --input is used without a
    /// configuration file.
    #[clap(long, value_parser)]
    pub questions: Option<String>,

    /// (first worksheet when empty) When reading answers from an Excel file, indicates
    /// the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
