use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(
    /// Channel handle as configured (e.g. `MrBeast`).
    ChannelHandle
);
opaque_id!(
    /// Playlist token; the uploads playlist of a channel.
    PlaylistId
);
opaque_id!(
    /// One video in the catalogue.
    ItemId
);

impl ItemId {
    /// Comma-join ids for a batch lookup.
    pub fn join(ids: &[ItemId]) -> String {
        ids.iter().map(ItemId::as_str).collect::<Vec<_>>().join(",")
    }
}

/// The flat record handed to persistence.
///
/// Statistics are `None` when the upstream omits them (comments disabled,
/// hidden likes), never zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(rename = "video_id")]
    pub id: ItemId,
    pub title: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    /// ISO-8601 duration, e.g. `PT14M3S`
    pub duration: String,
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
    #[serde(rename = "likeCount")]
    pub like_count: Option<String>,
    #[serde(rename = "commentCount")]
    pub comment_count: Option<String>,
}

impl EnrichedRecord {
    /// Keys a record is exchanged under, in snapshot order.
    pub const KEYS: [&'static str; 7] = [
        "video_id",
        "title",
        "publishedAt",
        "duration",
        "viewCount",
        "likeCount",
        "commentCount",
    ];

    /// The record as `(key, value)` pairs; absent counts are `None`.
    pub fn to_fields(&self) -> [(&'static str, Option<&str>); 7] {
        let [id, title, published_at, duration, views, likes, comments] = Self::KEYS;
        [
            (id, Some(self.id.as_str())),
            (title, Some(self.title.as_str())),
            (published_at, Some(self.published_at.as_str())),
            (duration, Some(self.duration.as_str())),
            (views, self.view_count.as_deref()),
            (likes, self.like_count.as_deref()),
            (comments, self.comment_count.as_deref()),
        ]
    }

    /// Rebuild a record from loosely typed key/value data.
    ///
    /// `get` returns `Ok(None)` for a key that is missing or null. A missing
    /// count is absent; a missing required key becomes `missing(key)`.
    pub fn from_fields<F, M, E>(get: F, missing: M) -> Result<Self, E>
    where
        F: Fn(&'static str) -> Result<Option<String>, E>,
        M: Fn(&'static str) -> E,
    {
        let required = |key: &'static str| get(key)?.ok_or_else(|| missing(key));
        let [id, title, published_at, duration, views, likes, comments] = Self::KEYS;
        Ok(EnrichedRecord {
            id: ItemId(required(id)?),
            title: required(title)?,
            published_at: required(published_at)?,
            duration: required(duration)?,
            view_count: get(views)?,
            like_count: get(likes)?,
            comment_count: get(comments)?,
        })
    }
}

// `channels?part=contentDetails`

#[derive(Deserialize, Debug)]
pub(crate) struct ChannelListResponse {
    pub(crate) items: Option<Vec<Value>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChannelResource {
    pub(crate) content_details: ChannelContentDetails,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChannelContentDetails {
    pub(crate) related_playlists: RelatedPlaylists,
}

#[derive(Deserialize, Debug)]
pub(crate) struct RelatedPlaylists {
    pub(crate) uploads: String,
}

// `playlistItems?part=contentDetails`

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistItemListResponse {
    pub(crate) items: Option<Vec<PlaylistItem>>,
    pub(crate) next_page_token: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistItem {
    pub(crate) content_details: PlaylistItemContentDetails,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistItemContentDetails {
    pub(crate) video_id: String,
}

// `videos?part=contentDetails,snippet,statistics`

#[derive(Deserialize, Debug)]
pub(crate) struct VideoListResponse {
    pub(crate) items: Option<Vec<VideoResource>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoResource {
    pub(crate) id: String,
    pub(crate) snippet: VideoSnippet,
    pub(crate) content_details: VideoContentDetails,
    #[serde(default)]
    pub(crate) statistics: Option<VideoStatistics>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoSnippet {
    pub(crate) title: String,
    pub(crate) published_at: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct VideoContentDetails {
    pub(crate) duration: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoStatistics {
    #[serde(default, deserialize_with = "numeric_string")]
    pub(crate) view_count: Option<String>,
    #[serde(default, deserialize_with = "numeric_string")]
    pub(crate) like_count: Option<String>,
    #[serde(default, deserialize_with = "numeric_string")]
    pub(crate) comment_count: Option<String>,
}

impl VideoResource {
    pub(crate) fn into_record(self) -> EnrichedRecord {
        let stats = self.statistics.unwrap_or_default();
        EnrichedRecord {
            id: ItemId(self.id),
            title: self.snippet.title,
            published_at: self.snippet.published_at,
            duration: self.content_details.duration,
            view_count: stats.view_count,
            like_count: stats.like_count,
            comment_count: stats.comment_count,
        }
    }
}

/// Counts arrive as strings (`"1234"`); accept bare numbers too.
fn numeric_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a count, got {other}"
        ))),
    }
}
