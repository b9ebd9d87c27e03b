use clap::Parser;

/// Computes competency scores and team averages from a 360-degree feedback survey export.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The survey export to read. Excel workbooks (.xlsx, .xls) and delimited
    /// text files (.csv) are supported.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (default auto) The type of the input: xlsx, xls, csv or auto. With auto, the type is
    /// deduced from the file extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use. By default, the
    /// only worksheet of the workbook (or the first one) is used.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (single character) The delimiter of a CSV file. By default, it is guessed from the
    /// header line (';' or ',').
    #[clap(long, value_parser)]
    pub csv_delimiter: Option<String>,

    /// (file path, optional) A JSON file with processing rules: identity column phrasings,
    /// answer scale, category aliases. See the manual of competency_scores for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the JSON result. Defaults to the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file with the expected JSON result. If provided, radarfb will
    /// check that its output matches the reference and fail otherwise.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// Outputs the list of subjects instead of the full result.
    #[clap(long, takes_value = false)]
    pub list_subjects: bool,

    /// (subject name) Outputs the scores of this subject next to the team averages.
    #[clap(long, value_parser)]
    pub subject: Option<String>,

    /// Together with --subject, outputs the per-relationship detail of the subject instead.
    #[clap(long, takes_value = false)]
    pub detail: bool,

    /// Outputs the scores of every subject, for batch export.
    #[clap(long, takes_value = false)]
    pub export: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
