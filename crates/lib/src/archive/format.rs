//! On-disk counters file format.
//!
//! A JSON array of `{"question_id": "<id>", "correct_times": i64}` objects,
//! written in ascending question order. Question ids are written as decimal
//! strings; numeric ids are accepted on read as well.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use crate::cache::counters::CounterMap;

/// One line of the counters file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    #[serde(with = "question_id")]
    pub question_id: u64,
    pub correct_times: i64,
}

mod question_id {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Repr::deserialize(deserializer) {
            Ok(Repr::Number(id)) => Ok(id),
            Ok(Repr::Text(text)) => text.trim().parse().map_err(|_| {
                D::Error::custom(format!("question_id {text:?} is not a non-negative integer"))
            }),
            Err(_) => Err(D::Error::custom(
                "question_id must be a non-negative integer or a decimal string",
            )),
        }
    }
}

/// Parse a counters file. Negative counts are rejected; a repeated id keeps its last value.
pub fn parse(text: &str) -> Result<CounterMap, serde_json::Error> {
    let records: Vec<CounterRecord> = serde_json::from_str(text)?;
    let mut counters = CounterMap::new();
    for record in records {
        if record.correct_times < 0 {
            return Err(serde_json::Error::custom(format!(
                "question {} has negative correct_times {}",
                record.question_id, record.correct_times
            )));
        }
        counters.insert(record.question_id, record.correct_times);
    }
    Ok(counters)
}

/// Render `counters` as a counters file.
pub fn render(counters: &CounterMap) -> Result<String, serde_json::Error> {
    let records: Vec<CounterRecord> = counters
        .iter()
        .map(|(&question_id, &correct_times)| CounterRecord {
            question_id,
            correct_times,
        })
        .collect();
    serde_json::to_string_pretty(&records)
}

/// All-zero counters for question ids `0..count`.
pub fn zeroed(count: u64) -> CounterMap {
    (0..count).map(|id| (id, 0)).collect()
}
