//! Typed response shapes for the photo service
//!
//! Every response carries an `errno` field; zero means success. The listing and
//! authorization payloads are decoded into raw structs first and then validated
//! into [`ListPage`] / download URLs, so a missing field surfaces as
//! [`FetcherError::MalformedResponse`] instead of a panic further down.

use serde::{Deserialize, Deserializer};

use super::{FetcherError, FetcherResult};

/// One raw entry of the listing `list` array
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ListEntry {
    /// Remote item identifier; the service sends it as a JSON number
    #[serde(deserialize_with = "string_or_number")]
    pub fsid: String,
    /// Content checksum
    pub md5: String,
    /// Remote path, e.g. `/youai/2019/IMG_0001.JPG`
    pub path: String,
    /// Creation time in Unix seconds
    #[serde(default)]
    pub ctime: i64,
}

impl ListEntry {
    /// Final path segment, used as the local file name
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }
}

/// A validated listing page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    /// Entries in page order
    pub entries: Vec<ListEntry>,
    /// Cursor for the next page; `None` when the listing is complete
    pub next_cursor: Option<String>,
}

impl ListPage {
    /// Whether more pages follow
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct RawListPage {
    errno: i64,
    #[serde(default)]
    list: Option<Vec<ListEntry>>,
    #[serde(default)]
    has_more: Option<i64>,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDownloadLink {
    errno: i64,
    #[serde(default)]
    dlink: Option<String>,
}

/// Decode and validate a listing response body
pub fn parse_list_page(body: &[u8]) -> FetcherResult<ListPage> {
    let raw: RawListPage = serde_json::from_slice(body)
        .map_err(|e| FetcherError::MalformedResponse(format!("listing page: {e}")))?;

    if raw.errno != 0 {
        return Err(FetcherError::ApiError { errno: raw.errno });
    }

    let entries = raw
        .list
        .ok_or_else(|| FetcherError::MalformedResponse("listing page without `list`".to_string()))?;
    let has_more = raw.has_more.ok_or_else(|| {
        FetcherError::MalformedResponse("listing page without `has_more`".to_string())
    })?;

    let next_cursor = if has_more == 1 {
        let cursor = raw.cursor.ok_or_else(|| {
            FetcherError::MalformedResponse("`has_more` set but no `cursor`".to_string())
        })?;
        Some(cursor)
    } else {
        None
    };

    Ok(ListPage {
        entries,
        next_cursor,
    })
}

/// Decode and validate a download authorization response body
pub fn parse_download_link(body: &[u8]) -> FetcherResult<String> {
    let raw: RawDownloadLink = serde_json::from_slice(body)
        .map_err(|e| FetcherError::MalformedResponse(format!("download link: {e}")))?;

    if raw.errno != 0 {
        return Err(FetcherError::ApiError { errno: raw.errno });
    }

    match raw.dlink {
        Some(link) if !link.is_empty() => Ok(link),
        _ => Err(FetcherError::MalformedResponse(
            "download response without `dlink`".to_string(),
        )),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}
