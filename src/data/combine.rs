//! Joining and cleaning the raw tables into tagged text rows

use crate::core::Result;
use crate::data::{CombinedRecord, Question, RawTables};
use crate::sampling::{sample_indices, seeded_rng};
use crate::text::{crop, remove_line_breaks, strip_html_tags};
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};

/// Options controlling how the combined table is built
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatConfig {
    pub remove_html_tags: bool,
    pub remove_line_breaks: bool,
    /// Drop tags with fewer rows than this
    pub minimum_labels: Option<usize>,
    /// Upper bound on the number of rows kept
    pub reduce_number_of_samples: Option<usize>,
    /// Maximum text length in characters
    pub crop_sentences: Option<usize>,
    pub random_state: Option<u64>,
    pub exclude_answers: bool,
    pub exclude_title: bool,
}

impl FormatConfig {
    fn clean(&self, text: String) -> String {
        let text = if self.remove_html_tags {
            strip_html_tags(&text)
        } else {
            text
        };
        let text = if self.remove_line_breaks {
            remove_line_breaks(&text)
        } else {
            text
        };
        match self.crop_sentences {
            Some(max_chars) => crop(&text, max_chars),
            None => text,
        }
    }
}

/// Join answers, questions and tags into one row per (question, tag) pair
///
/// Steps run in a fixed order so a seeded run is reproducible: join,
/// assemble text, strip markup, strip line breaks, crop, filter rare tags,
/// subsample. The sample is drawn from the filtered rows, so a cap below the
/// filtered row count is met exactly.
pub fn combine_and_format(
    tables: &RawTables,
    config: &FormatConfig,
) -> Result<Vec<CombinedRecord>> {
    let answer_text = if config.exclude_answers {
        HashMap::new()
    } else {
        aggregate_answers(tables)
    };

    let questions: HashMap<u64, &Question> =
        tables.questions.iter().map(|q| (q.id, q)).collect();

    let mut records = Vec::with_capacity(tables.tags.len());
    let mut orphan_tags = 0usize;
    for tag in &tables.tags {
        let Some(label) = &tag.tag else {
            continue;
        };
        let Some(question) = questions.get(&tag.question_id) else {
            orphan_tags += 1;
            continue;
        };

        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if !config.exclude_title {
            parts.push(&question.title);
        }
        parts.push(&question.body);
        if let Some(answers) = answer_text.get(&question.id) {
            parts.push(answers);
        }
        let text = parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        records.push(CombinedRecord {
            question_id: question.id,
            text: config.clean(text),
            tag: label.clone(),
        });
    }
    if orphan_tags > 0 {
        debug!("Skipped {orphan_tags} tags that refer to unknown questions");
    }
    info!("Combined {} tagged rows", records.len());

    if let Some(minimum) = config.minimum_labels {
        records = filter_minimum_labels(records, minimum);
        info!("{} rows left after keeping tags with >= {minimum} rows", records.len());
    }

    if let Some(cap) = config.reduce_number_of_samples {
        if records.len() > cap {
            let mut rng = seeded_rng(config.random_state);
            let keep = sample_indices(records.len(), cap, &mut rng);
            let mut keep = keep.into_iter().peekable();
            records = records
                .into_iter()
                .enumerate()
                .filter_map(|(i, r)| keep.next_if_eq(&i).map(|_| r))
                .collect();
            info!("Sampled {} rows", records.len());
        }
    }

    Ok(records)
}

/// All answer bodies per question, joined by spaces in file order
fn aggregate_answers(tables: &RawTables) -> HashMap<u64, String> {
    let mut joined: HashMap<u64, String> = HashMap::new();
    for answer in &tables.answers {
        let entry = joined.entry(answer.parent_id).or_default();
        if !entry.is_empty() && !answer.body.is_empty() {
            entry.push(' ');
        }
        entry.push_str(&answer.body);
    }
    joined
}

/// Keep rows whose tag has at least `minimum` rows
pub fn filter_minimum_labels(records: Vec<CombinedRecord>, minimum: usize) -> Vec<CombinedRecord> {
    let counts = label_counts(&records);
    records
        .into_iter()
        .filter(|r| counts[&r.tag] >= minimum)
        .collect()
}

/// Row count per tag, sorted by tag
pub fn label_counts(records: &[CombinedRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.tag.clone()).or_insert(0) += 1;
    }
    counts
}
