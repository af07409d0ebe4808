// Serde types for `flickr.photos.search` responses.
//
// Flickr is loose with JSON types: page counts and totals arrive as either
// numbers or strings, coordinates are numbers for geotagged photos and "0"
// strings otherwise, and tags are one space-separated string. These types
// accept all of it and leave interpretation to the pipeline.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Top-level envelope. `stat` is "ok" or "fail"; on failure `code` and
/// `message` explain why and `photos` is absent.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub stat: String,
    pub photos: Option<PhotoPage>,
    pub code: Option<i64>,
    pub message: Option<String>,
}

/// The `photos` object of a successful search.
#[derive(Debug, Deserialize)]
pub struct PhotoPage {
    #[serde(deserialize_with = "lenient_u64")]
    pub page: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub pages: u64,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub total: Option<u64>,
    /// Kept untyped so one bad entry doesn't sink the whole page.
    pub photo: Vec<Value>,
}

impl PhotoPage {
    /// Decode each photo entry, dropping the ones that don't parse.
    pub fn into_records(self) -> Vec<RawPhoto> {
        self.photo
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<RawPhoto>(value) {
                Ok(photo) => Some(photo),
                Err(e) => {
                    debug!(error = %e, "Dropping malformed photo entry");
                    None
                }
            })
            .collect()
    }
}

/// One candidate photo as returned by the search API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPhoto {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// `None` when the tags field is missing entirely (a malformed record).
    #[serde(default, deserialize_with = "tag_list")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub latitude: Option<Value>,
    #[serde(default)]
    pub longitude: Option<Value>,
    /// Upload time in unix seconds.
    #[serde(default)]
    pub dateupload: Option<Value>,
}

impl RawPhoto {
    /// Convenience constructor for a record with tags and coordinates.
    pub fn new(id: &str, tags: &[&str], lat: f64, lon: f64) -> Self {
        Self {
            id: id.to_string(),
            title: format!("photo {id}"),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            latitude: Some(Value::from(lat)),
            longitude: Some(Value::from(lon)),
            dateupload: None,
        }
    }
}

/// Read a JSON number or numeric string as f64.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a JSON number or numeric string as i64.
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagsField {
    Text(String),
    List(Vec<String>),
}

fn tag_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<TagsField>::deserialize(deserializer)?;
    Ok(field.map(|f| match f {
        TagsField::Text(s) => s.split_whitespace().map(str::to_string).collect(),
        TagsField::List(list) => list,
    }))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_as_i64(&value)
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| serde::de::Error::custom(format!("expected a count, got {value}")))
}

fn lenient_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_as_i64)
        .and_then(|n| u64::try_from(n).ok()))
}
