//! Loading of the delimited input files
//!
//! Each file is decoded in full with its declared text encoding and then
//! parsed as CSV with a header row. Columns are matched to record fields by
//! header name; columns the records do not use are ignored.

use crate::core::{Result, StackSampleError};
use crate::data::{Answer, Question, Tag};
use encoding_rs::Encoding;
use log::info;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Encoding assumed for all three files unless told otherwise
pub const DEFAULT_ENCODING: &str = "ISO8859-1";

/// Location and text encoding of one input file
#[derive(Debug, Clone, PartialEq)]
pub struct TableSource {
    pub path: PathBuf,
    pub encoding: String,
}

impl TableSource {
    pub fn new<P: Into<PathBuf>>(path: P, encoding: &str) -> Self {
        Self {
            path: path.into(),
            encoding: encoding.to_string(),
        }
    }
}

/// The three input files
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    pub answers: TableSource,
    pub questions: TableSource,
    pub tags: TableSource,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            answers: TableSource::new("data/Answers.csv", DEFAULT_ENCODING),
            questions: TableSource::new("data/Questions.csv", DEFAULT_ENCODING),
            tags: TableSource::new("data/Tags.csv", DEFAULT_ENCODING),
        }
    }
}

/// The three tables as read from disk
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub answers: Vec<Answer>,
    pub questions: Vec<Question>,
    pub tags: Vec<Tag>,
}

/// Labels that name ISO-8859-1 itself rather than its WHATWG alias
const LATIN1_LABELS: &[&str] = &[
    "iso8859-1",
    "iso-8859-1",
    "iso_8859-1",
    "iso88591",
    "iso_8859-1:1987",
    "iso-ir-100",
    "latin1",
    "latin-1",
    "l1",
    "cp819",
    "ibm819",
    "csisolatin1",
];

fn is_latin1(label: &str) -> bool {
    let label = label.trim().to_ascii_lowercase();
    LATIN1_LABELS.contains(&label.as_str())
}

/// Read a file and decode it with the named encoding
///
/// ISO-8859-1 maps every byte to the code point of the same value, so
/// 0x80-0x9F stay C1 controls. Any other label goes through encoding_rs:
/// a leading byte order mark is dropped and bytes that are invalid in the
/// encoding are an error rather than being replaced.
pub fn read_decoded<P: AsRef<Path>>(path: P, encoding_label: &str) -> Result<String> {
    let path = path.as_ref();
    if is_latin1(encoding_label) {
        let bytes = fs::read(path)?;
        return Ok(bytes.iter().map(|&b| char::from(b)).collect());
    }

    let encoding = Encoding::for_label(encoding_label.trim().as_bytes())
        .ok_or_else(|| StackSampleError::UnknownEncoding(encoding_label.to_string()))?;

    let bytes = fs::read(path)?;
    let (text, had_errors) = encoding.decode_with_bom_removal(&bytes);
    if had_errors {
        return Err(StackSampleError::Decode {
            path: path.to_path_buf(),
            encoding: encoding.name().to_string(),
        });
    }

    Ok(text.into_owned())
}

/// Load one table of records from a CSV file
pub fn load_table<R: DeserializeOwned>(source: &TableSource) -> Result<Vec<R>> {
    let text = read_decoded(&source.path, &source.encoding)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Load the answers, questions and tags tables
pub fn load_all(config: &LoaderConfig) -> Result<RawTables> {
    let answers: Vec<Answer> = load_table(&config.answers)?;
    info!("Loaded {} answers from {:?}", answers.len(), config.answers.path);

    let questions: Vec<Question> = load_table(&config.questions)?;
    info!(
        "Loaded {} questions from {:?}",
        questions.len(),
        config.questions.path
    );

    let tags: Vec<Tag> = load_table(&config.tags)?;
    info!("Loaded {} tags from {:?}", tags.len(), config.tags.path);

    Ok(RawTables {
        answers,
        questions,
        tags,
    })
}
