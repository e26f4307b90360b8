use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::{Error, Result};

/// Timestamp format used by the v1.1 REST API, e.g. "Wed Oct 10 20:19:24 +0000 2018"
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// A single post from the user's timeline
#[derive(Debug, Clone)]
pub struct Post {
    pub id: u64,
    pub id_str: String,
    pub created_at: DateTime<Utc>,
    pub media: Vec<Media>,
    /// The full record as returned by the API, archived unchanged
    pub raw: Value,
}

/// Media attached to a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub id_str: String,
    pub url: String,
}

impl Media {
    /// File name for the downloaded media: the media id plus the URL's extension
    pub fn file_name(&self) -> String {
        let path = url::Url::parse(&self.url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| self.url.clone());

        match Path::new(&path).extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!("{}.{}", self.id_str, ext),
            None => self.id_str.clone(),
        }
    }
}

#[derive(Deserialize)]
struct PostFields {
    id: u64,
    id_str: String,
    created_at: String,
    #[serde(default)]
    entities: Option<Entities>,
    #[serde(default)]
    extended_entities: Option<Entities>,
}

#[derive(Deserialize)]
struct Entities {
    #[serde(default)]
    media: Vec<MediaEntity>,
}

#[derive(Deserialize)]
struct MediaEntity {
    id_str: String,
    #[serde(default)]
    media_url: Option<String>,
    #[serde(default)]
    media_url_https: Option<String>,
}

impl Post {
    /// Build a post from one element of the timeline response
    pub fn from_json(raw: Value) -> Result<Self> {
        let fields = PostFields::deserialize(&raw)
            .map_err(|e| Error::PostParse(format!("invalid post record: {}", e)))?;

        let created_at = parse_created_at(&fields.created_at)?;

        // extended_entities carries every attached photo; entities only the first
        let media = fields
            .extended_entities
            .filter(|e| !e.media.is_empty())
            .or(fields.entities)
            .map(|e| e.media)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| {
                let url = m.media_url_https.or(m.media_url)?;
                Some(Media { id_str: m.id_str, url })
            })
            .collect();

        Ok(Self {
            id: fields.id,
            id_str: fields.id_str,
            created_at,
            media,
            raw,
        })
    }

    /// Parse a timeline response body (a JSON array of posts)
    pub fn parse_page(body: &[u8]) -> Result<Vec<Self>> {
        let records: Vec<Value> = serde_json::from_slice(body)?;
        records.into_iter().map(Self::from_json).collect()
    }
}

fn parse_created_at(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_str(value, CREATED_AT_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::PostParse(format!("invalid created_at {:?}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_parse_post_with_extended_media() {
        let raw = json!({
            "id": 1050118621198921728u64,
            "id_str": "1050118621198921728",
            "created_at": "Wed Oct 10 20:19:24 +0000 2018",
            "text": "hello",
            "entities": {
                "media": [
                    {"id_str": "1", "media_url": "http://pbs.twimg.com/media/a.jpg", "media_url_https": "https://pbs.twimg.com/media/a.jpg"}
                ]
            },
            "extended_entities": {
                "media": [
                    {"id_str": "1", "media_url_https": "https://pbs.twimg.com/media/a.jpg"},
                    {"id_str": "2", "media_url": "http://pbs.twimg.com/media/b.png"}
                ]
            }
        });

        let post = Post::from_json(raw.clone()).unwrap();
        assert_eq!(post.id, 1050118621198921728);
        assert_eq!(post.id_str, "1050118621198921728");
        assert_eq!(
            post.created_at,
            Utc.with_ymd_and_hms(2018, 10, 10, 20, 19, 24).unwrap()
        );
        assert_eq!(post.media.len(), 2);
        assert_eq!(post.media[0].url, "https://pbs.twimg.com/media/a.jpg");
        assert_eq!(post.media[1].url, "http://pbs.twimg.com/media/b.png");
        assert_eq!(post.raw, raw);
    }

    #[test]
    fn test_parse_post_falls_back_to_entities() {
        let post = Post::from_json(json!({
            "id": 5,
            "id_str": "5",
            "created_at": "Mon Jan 02 15:04:05 +0000 2006",
            "entities": {
                "hashtags": [],
                "media": [{"id_str": "9", "media_url": "http://pbs.twimg.com/media/x.gif"}]
            }
        }))
        .unwrap();

        assert_eq!(
            post.media,
            vec![Media {
                id_str: "9".to_string(),
                url: "http://pbs.twimg.com/media/x.gif".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_post_without_media() {
        let post = Post::from_json(json!({
            "id": 5,
            "id_str": "5",
            "created_at": "Mon Jan 02 15:04:05 -0700 2006",
            "entities": {"urls": []}
        }))
        .unwrap();

        assert!(post.media.is_empty());
        assert_eq!(
            post.created_at,
            Utc.with_ymd_and_hms(2006, 1, 2, 22, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_parse_post_drops_media_without_url() {
        let post = Post::from_json(json!({
            "id": 5,
            "id_str": "5",
            "created_at": "Mon Jan 02 15:04:05 +0000 2006",
            "entities": {"media": [{"id_str": "9"}]}
        }))
        .unwrap();

        assert!(post.media.is_empty());
    }

    #[test]
    fn test_parse_post_rejects_bad_records() {
        assert!(Post::from_json(json!({"id_str": "1", "created_at": "Mon Jan 02 15:04:05 +0000 2006"})).is_err());
        assert!(Post::from_json(json!({"id": 1, "id_str": "1", "created_at": "yesterday"})).is_err());
    }

    #[test]
    fn test_parse_page() {
        let body = br#"[
            {"id": 3, "id_str": "3", "created_at": "Mon Jan 02 15:04:05 +0000 2006"},
            {"id": 2, "id_str": "2", "created_at": "Sun Jan 01 15:04:05 +0000 2006"}
        ]"#;
        let posts = Post::parse_page(body).unwrap();
        assert_eq!(posts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 2]);

        assert!(Post::parse_page(b"[]").unwrap().is_empty());
        assert!(Post::parse_page(b"{\"errors\": []}").is_err());
    }

    #[test]
    fn test_media_file_name() {
        let media = Media {
            id_str: "42".to_string(),
            url: "https://pbs.twimg.com/media/DpJ8.jpg".to_string(),
        };
        assert_eq!(media.file_name(), "42.jpg");

        let with_query = Media {
            id_str: "43".to_string(),
            url: "https://pbs.twimg.com/media/DpJ8.png?name=orig".to_string(),
        };
        assert_eq!(with_query.file_name(), "43.png");

        let no_ext = Media {
            id_str: "44".to_string(),
            url: "https://pbs.twimg.com/media/DpJ8".to_string(),
        };
        assert_eq!(no_ext.file_name(), "44");
    }
}
