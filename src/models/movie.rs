use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A movie record as produced by ingestion.
///
/// Read-only from the pipeline's perspective: once indexed, records are only
/// ever queried, never mutated. The `plot` field is the embedding source;
/// records without one cannot be indexed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    /// Release year. Source files are inconsistent about the key and the
    /// representation (integer, float, or string), so both are tolerated.
    #[serde(default, alias = "release_year", deserialize_with = "year_flexible")]
    pub year: Option<i32>,
    #[serde(default)]
    pub plot: Option<String>,
}

/// Extracts a year from a loosely-typed JSON value.
///
/// Upstream stores hand back years as integers, floats (`2005.0` after a trip
/// through a dataframe), or strings. Anything unparseable maps to `None`
/// rather than an error.
pub fn year_from_value(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok()
            } else {
                n.as_f64().map(|f| f.trunc() as i32)
            }
        }
        Value::String(s) => {
            let integral = s.split('.').next().unwrap_or(s).trim();
            integral.parse::<i32>().ok()
        }
        _ => None,
    }
}

/// Serde adapter around [`year_from_value`] for payload fields.
pub fn year_flexible<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(year_from_value))
}
