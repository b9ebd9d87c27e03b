use log::{debug, info, warn};

use competency_scores::snapshot::SnapshotExport;
use competency_scores::*;
use snafu::prelude::*;

use std::fs;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::radar::config_reader::*;
use crate::radar::io_common::InputType;

mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;

#[derive(Debug, Snafu)]
pub enum RadarError {
    #[snafu(display("could not decode table: error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("could not decode table: the workbook {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("could not decode table: worksheet {name:?} not found, available: {available:?}"))]
    MissingWorksheet { name: String, available: Vec<String> },
    #[snafu(display("could not decode table: error reading {path}"))]
    ReadingInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("could not decode table: line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("could not decode table: {path} is not valid UTF-8: {source}"))]
    InvalidEncoding {
        source: std::string::FromUtf8Error,
        path: String,
    },
    #[snafu(display("could not decode table: {path} contains no header line"))]
    EmptyInput { path: String },
    #[snafu(display("the input file {path} has {size} bytes, the limit is {limit} bytes"))]
    FileTooLarge { path: String, size: u64, limit: u64 },
    #[snafu(display("unknown input type {input_type:?} (expected xlsx, xls, csv or auto)"))]
    UnknownInputType { input_type: String },

    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the output to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("{source}"))]
    Pipeline { source: PipelineError },
    #[snafu(display("{source}"))]
    Query { source: QueryError },

    #[snafu(display("Difference detected between the computed result and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RadarResult<T> = Result<T, RadarError>;

/// What the caller wants to see from the committed snapshot.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Request {
    Summary,
    ListSubjects,
    SubjectScores(String),
    SubjectDetail(String),
    Export,
}

impl Request {
    pub fn from_args(args: &Args) -> RadarResult<Request> {
        let res = match (&args.subject, args.detail) {
            _ if args.list_subjects => Request::ListSubjects,
            (Some(s), false) => Request::SubjectScores(s.clone()),
            (Some(s), true) => Request::SubjectDetail(s.clone()),
            (None, true) => whatever!("--detail can only be used together with --subject"),
            (None, false) if args.export => Request::Export,
            (None, false) => Request::Summary,
        };
        Ok(res)
    }
}

// ******** Output JSON *********

fn score_to_json(s: &PersonCompetencyScore) -> JSValue {
    let mut obj: JSMap<String, JSValue> = JSMap::new();
    obj.insert("mean".to_string(), json!(s.mean));
    obj.insert("count".to_string(), json!(s.response_count));
    if let Some(std_dev) = s.std_dev {
        obj.insert("std_dev".to_string(), json!(std_dev));
    }
    if !s.by_relationship.is_empty() {
        let mut rels: JSMap<String, JSValue> = JSMap::new();
        for (rel, rs) in s.by_relationship.iter() {
            rels.insert(
                rel.to_string(),
                json!({"mean": rs.mean, "count": rs.count}),
            );
        }
        obj.insert("by_relationship".to_string(), JSValue::Object(rels));
    }
    JSValue::Object(obj)
}

fn team_averages_to_json(team: &[TeamCompetencyAverage]) -> JSValue {
    let mut obj: JSMap<String, JSValue> = JSMap::new();
    for t in team.iter() {
        obj.insert(t.category.clone(), json!(t.mean));
    }
    JSValue::Object(obj)
}

fn summary_to_json(summary: &ProcessingSummary) -> JSValue {
    json!({
        "rows_read": summary.rows_read,
        "rows_skipped": summary.rows_skipped,
        "records_valid": summary.records_valid,
        "records_no_opinion": summary.records_no_opinion,
        "subjects_found": summary.subjects_found,
        "categories_found": summary.categories_found,
        "warnings": summary.warnings,
    })
}

/// The full result of a successful run.
pub fn snapshot_to_json(snapshot: &FeedbackSnapshot) -> JSValue {
    let mut per_subject: JSMap<String, JSValue> = JSMap::new();
    for (subject, scores) in snapshot.export() {
        let mut cats: JSMap<String, JSValue> = JSMap::new();
        for s in scores {
            cats.insert(s.category.clone(), score_to_json(s));
        }
        per_subject.insert(subject.to_string(), JSValue::Object(cats));
    }
    json!({
        "subjects": snapshot.subjects,
        "categories": snapshot.categories,
        "team_averages": team_averages_to_json(&snapshot.team_averages),
        "per_subject": per_subject,
        "summary": summary_to_json(&snapshot.summary),
    })
}

fn comparison_to_json(cmp: &competency_scores::snapshot::SubjectComparison) -> JSValue {
    let competencies: Vec<JSValue> = cmp
        .competencies
        .iter()
        .map(|c| {
            json!({
                "axis": c.category,
                "individual_score": c.individual,
                "team_score": c.team,
            })
        })
        .collect();
    json!({"subject": cmp.subject, "competencies": competencies})
}

fn detail_to_json(subject: &str, scores: &[PersonCompetencyScore]) -> JSValue {
    let mut cats: JSMap<String, JSValue> = JSMap::new();
    for s in scores.iter() {
        cats.insert(s.category.clone(), score_to_json(s));
    }
    json!({"subject": subject.trim(), "categories": cats})
}

fn export_to_json(exported: &SnapshotExport) -> JSValue {
    let subjects: Vec<JSValue> = exported
        .subjects
        .iter()
        .map(|(subject, scores)| {
            let mut means: JSMap<String, JSValue> = JSMap::new();
            for s in scores.iter() {
                means.insert(s.category.clone(), json!(s.mean));
            }
            json!({"subject": subject, "scores": means})
        })
        .collect();
    json!({
        "subjects": subjects,
        "team_averages": team_averages_to_json(&exported.team_averages),
    })
}

/// The JSON written in place of a result when the run fails.
///
/// Errors about the output itself or about the reference produce nothing:
/// the output, if any, is already written.
pub fn failure_json(err: &RadarError) -> Option<JSValue> {
    match err {
        RadarError::Pipeline {
            source: PipelineError::StructuralValidation { report },
        } => Some(json!({"success": false, "errors": report.issues()})),
        RadarError::Query {
            source: QueryError::SubjectNotFound { available, .. },
        } => Some(json!({
            "success": false,
            "error": err.to_string(),
            "available_subjects": available,
        })),
        RadarError::WritingOutput { .. } | RadarError::ReferenceMismatch { .. } => None,
        _ => Some(json!({"success": false, "error": err.to_string()})),
    }
}

/// The line printed on stderr when a run fails.
pub fn error_report(err: &RadarError) -> String {
    format!("An error occurred: {}", err)
}

// ******** Running *********

/// Answers one request from the committed snapshot.
pub fn answer(store: &SnapshotStore, request: &Request) -> RadarResult<JSValue> {
    debug!("answer: {:?}", request);
    let res = match request {
        Request::Summary => {
            let snapshot = store.current().context(QuerySnafu {})?;
            snapshot_to_json(&snapshot)
        }
        Request::ListSubjects => {
            json!({"subjects": store.list_subjects().context(QuerySnafu {})?})
        }
        Request::SubjectScores(subject) => {
            let cmp = store.subject_scores(subject).context(QuerySnafu {})?;
            comparison_to_json(&cmp)
        }
        Request::SubjectDetail(subject) => {
            let detail = store.subject_detail(subject).context(QuerySnafu {})?;
            detail_to_json(subject, &detail)
        }
        Request::Export => {
            let exported = store.export_all().context(QuerySnafu {})?;
            export_to_json(&exported)
        }
    };
    Ok(res)
}

/// Decodes the input file into a table, following the type given on the command line.
pub fn read_table(args: &Args) -> RadarResult<RawTable> {
    let path = args.input.as_str();
    io_common::check_file_size(path, io_common::MAX_INPUT_BYTES)?;
    let input_type = io_common::detect_input_type(path, args.input_type.as_deref())?;
    info!(
        "read_table: reading {:?} as {:?}",
        io_common::simplify_file_name(path),
        input_type
    );
    let table = match input_type {
        InputType::Excel => io_excel::read_excel_table(path, args.excel_worksheet_name.as_deref())?,
        InputType::Csv => {
            let delimiter = io_csv::parse_delimiter(args.csv_delimiter.as_deref())?;
            io_csv::read_csv_table(path, delimiter)?
        }
    };
    info!(
        "read_table: {} columns, {} rows",
        table.headers.len(),
        table.num_rows()
    );
    Ok(table)
}

fn write_output(out: &Option<String>, js: &JSValue) -> RadarResult<String> {
    let pretty = serde_json::to_string_pretty(js).context(ParsingJsonSnafu {})?;
    match out.as_deref() {
        None | Some("") | Some("stdout") => {
            println!("{}", pretty);
        }
        Some(path) => {
            info!("write_output: writing the result to {:?}", path);
            fs::write(path, pretty.as_bytes()).context(WritingOutputSnafu { path })?;
        }
    }
    Ok(pretty)
}

/// Compares a result with the reference, printing the differences if there are any.
pub fn check_reference(result: &JSValue, reference: &JSValue, path: &str) -> RadarResult<()> {
    if result != reference {
        warn!("Found differences with the reference {:?}", path);
        let pretty_ref = serde_json::to_string_pretty(reference).context(ParsingJsonSnafu {})?;
        let pretty_res = serde_json::to_string_pretty(result).context(ParsingJsonSnafu {})?;
        print_diff(pretty_ref.as_str(), pretty_res.as_str(), "\n");
        return ReferenceMismatchSnafu { path }.fail();
    }
    info!("check_reference: the result matches {:?}", path);
    Ok(())
}

fn run_request(args: &Args) -> RadarResult<JSValue> {
    let request = Request::from_args(args)?;
    let rules = match &args.config {
        Some(config_path) => read_config(config_path)?.processing_rules()?,
        None => ProcessingRules::default(),
    };
    debug!("run_request: rules: {:?}", rules);

    let table = read_table(args)?;
    let store = SnapshotStore::new();
    let snapshot = process_and_commit(&store, &table, &rules).context(PipelineSnafu {})?;
    for w in snapshot.summary.warnings.iter() {
        warn!("{}", w);
    }
    answer(&store, &request)
}

/// Reads the input, runs the pipeline and writes the requested JSON.
///
/// When the run fails before a result is produced, the failure is written as
/// JSON to the same place and the error is returned.
pub fn run(args: &Args) -> RadarResult<()> {
    let result = match run_request(args) {
        Ok(js) => js,
        Err(e) => {
            if let Some(js) = failure_json(&e) {
                write_output(&args.out, &js)?;
            }
            return Err(e);
        }
    };
    write_output(&args.out, &result)?;

    if let Some(reference_path) = &args.reference {
        let reference = read_reference(reference_path)?;
        check_reference(&result, &reference, reference_path)?;
    }
    Ok(())
}

/// Location of the checked-in sample export.
#[cfg(test)]
fn sample_path() -> String {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join("sample_feedback.csv")
        .display()
        .to_string()
}
