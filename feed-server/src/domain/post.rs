use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::error::{DomainError, PostValidationError};

pub(crate) const DEFAULT_TITLE: &str = "Untitled Post";
pub(crate) const MAX_TITLE_LENGTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum PostType {
    Text,
    Image,
    Video,
}

impl PostType {
    pub(crate) const ALL: [PostType; 3] = [PostType::Text, PostType::Image, PostType::Video];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            PostType::Text => "text",
            PostType::Image => "image",
            PostType::Video => "video",
        }
    }

    pub(crate) fn requires_media(self) -> bool {
        !matches!(self, PostType::Text)
    }

    /// Lower-case extensions accepted for this type's media file.
    pub(crate) fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            PostType::Text => &[],
            PostType::Image => &["png", "jpg", "jpeg", "gif", "webp"],
            PostType::Video => &["mp4", "mov", "avi", "wmv", "webm"],
        }
    }

    pub(crate) fn allowed_list() -> String {
        Self::ALL
            .iter()
            .map(|post_type| post_type.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostType {
    type Err = PostValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "text" => Ok(PostType::Text),
            "image" => Ok(PostType::Image),
            "video" => Ok(PostType::Video),
            other => Err(PostValidationError::InvalidPostType {
                given: other.to_string(),
            }),
        }
    }
}

/// Attributes derived from an uploaded file. These always override whatever the
/// caller put under the same keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileAttributes {
    pub(crate) file_size: u64,
    pub(crate) file_type: String,
    pub(crate) content_type: Option<String>,
}

/// Type-dependent post metadata. Only converted to an open JSON object at the
/// storage and wire boundary.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PostMetadata {
    Text {
        extra: Map<String, Value>,
    },
    Image {
        file: FileAttributes,
        extra: Map<String, Value>,
    },
    Video {
        file: FileAttributes,
        duration: Option<Number>,
        extra: Map<String, Value>,
    },
}

impl PostMetadata {
    const FILE_SIZE: &'static str = "file_size";
    const FILE_TYPE: &'static str = "file_type";
    const CONTENT_TYPE: &'static str = "content_type";
    pub(crate) const DURATION: &'static str = "duration";

    #[cfg(test)]
    pub(crate) fn file(&self) -> Option<&FileAttributes> {
        match self {
            PostMetadata::Text { .. } => None,
            PostMetadata::Image { file, .. } | PostMetadata::Video { file, .. } => Some(file),
        }
    }

    /// Builds the variant for `post_type` from caller metadata and, for media
    /// posts, the derived file attributes. Derived keys are stripped from
    /// `extra` so they cannot shadow the real values.
    pub(crate) fn compose(
        post_type: PostType,
        mut extra: Map<String, Value>,
        file: Option<FileAttributes>,
    ) -> Result<Self, PostValidationError> {
        match (post_type, file) {
            (PostType::Text, _) => Ok(PostMetadata::Text { extra }),
            (PostType::Image, Some(file)) => {
                strip_file_keys(&mut extra);
                Ok(PostMetadata::Image { file, extra })
            }
            (PostType::Video, Some(file)) => {
                strip_file_keys(&mut extra);
                let duration = take_duration(&mut extra)?;
                Ok(PostMetadata::Video {
                    file,
                    duration,
                    extra,
                })
            }
            (post_type, None) => Err(PostValidationError::MediaRequired { post_type }),
        }
    }

    /// Reads metadata back from its stored JSON form.
    pub(crate) fn from_stored(post_type: PostType, value: Value) -> Result<Self, DomainError> {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(DomainError::Unexpected(format!(
                    "stored metadata is not an object: {other}"
                )));
            }
        };

        if post_type == PostType::Text {
            return Ok(PostMetadata::Text { extra: map });
        }

        let file_size = map
            .get(Self::FILE_SIZE)
            .and_then(Value::as_u64)
            .ok_or_else(|| DomainError::Unexpected("stored metadata lacks file_size".into()))?;
        let file_type = map
            .get(Self::FILE_TYPE)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DomainError::Unexpected("stored metadata lacks file_type".into()))?;
        let content_type = map
            .get(Self::CONTENT_TYPE)
            .and_then(Value::as_str)
            .map(str::to_string);
        let file = FileAttributes {
            file_size,
            file_type,
            content_type,
        };

        Self::compose(post_type, map, Some(file))
            .map_err(|err| DomainError::Unexpected(err.to_string()))
    }

    /// Replaces the caller-controlled part of the metadata, keeping derived keys.
    pub(crate) fn with_extra(self, extra: Map<String, Value>) -> Result<Self, PostValidationError> {
        match self {
            PostMetadata::Text { .. } => Ok(PostMetadata::Text { extra }),
            PostMetadata::Image { file, .. } => {
                PostMetadata::compose(PostType::Image, extra, Some(file))
            }
            PostMetadata::Video { file, .. } => {
                PostMetadata::compose(PostType::Video, extra, Some(file))
            }
        }
    }

    pub(crate) fn into_map(self) -> Map<String, Value> {
        match self {
            PostMetadata::Text { extra } => extra,
            PostMetadata::Image { file, mut extra } => {
                insert_file_keys(&mut extra, file);
                extra
            }
            PostMetadata::Video {
                file,
                duration,
                mut extra,
            } => {
                insert_file_keys(&mut extra, file);
                if let Some(duration) = duration {
                    extra.insert(Self::DURATION.to_string(), Value::Number(duration));
                }
                extra
            }
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        Value::Object(self.clone().into_map())
    }
}

fn strip_file_keys(extra: &mut Map<String, Value>) {
    extra.remove(PostMetadata::FILE_SIZE);
    extra.remove(PostMetadata::FILE_TYPE);
    extra.remove(PostMetadata::CONTENT_TYPE);
}

fn insert_file_keys(extra: &mut Map<String, Value>, file: FileAttributes) {
    extra.insert(PostMetadata::FILE_SIZE.to_string(), Value::from(file.file_size));
    extra.insert(PostMetadata::FILE_TYPE.to_string(), Value::from(file.file_type));
    if let Some(content_type) = file.content_type {
        extra.insert(PostMetadata::CONTENT_TYPE.to_string(), Value::from(content_type));
    }
}

fn take_duration(extra: &mut Map<String, Value>) -> Result<Option<Number>, PostValidationError> {
    let duration = parse_duration(extra.get(PostMetadata::DURATION))?;
    extra.remove(PostMetadata::DURATION);
    Ok(duration)
}

/// A video `duration`, when given, must be a positive finite number. The
/// number is kept as written, so `31` stays an integer.
pub(crate) fn parse_duration(value: Option<&Value>) -> Result<Option<Number>, PostValidationError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => match number.as_f64() {
            Some(duration) if duration > 0.0 && duration.is_finite() => Ok(Some(number.clone())),
            _ => Err(invalid_duration()),
        },
        Some(_) => Err(invalid_duration()),
    }
}

fn invalid_duration() -> PostValidationError {
    PostValidationError::InvalidMetadataFormat {
        reason: "video duration must be a positive number".to_string(),
    }
}

/// A file attached to a create/update request, before it reaches media storage.
#[derive(Clone)]
pub(crate) struct MediaUpload {
    pub(crate) file_name: String,
    pub(crate) content_type: Option<String>,
    pub(crate) data: Vec<u8>,
}

impl MediaUpload {
    pub(crate) fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Lower-cased extension of the file name, empty when there is none.
    pub(crate) fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default()
    }
}

impl fmt::Debug for MediaUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) author_id: i64,
    pub(crate) author_username: String,
    pub(crate) post_type: PostType,
    pub(crate) media_key: Option<String>,
    pub(crate) metadata: PostMetadata,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Post {
    pub(crate) fn is_authored_by(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }
}

/// A post as seen by one particular viewer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PostView {
    pub(crate) post: Post,
    pub(crate) like_count: i64,
    pub(crate) comment_count: i64,
    pub(crate) can_edit: bool,
    pub(crate) is_following_author: bool,
    pub(crate) liked_by_viewer: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::{FileAttributes, MediaUpload, PostMetadata, PostType};
    use crate::domain::error::PostValidationError;

    fn png_file() -> FileAttributes {
        FileAttributes {
            file_size: 2048,
            file_type: "png".to_string(),
            content_type: Some("image/png".to_string()),
        }
    }

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[test]
    fn post_type_parses_known_names_only() {
        assert_eq!("video".parse::<PostType>(), Ok(PostType::Video));
        let err = "poll".parse::<PostType>().expect_err("poll is not a post type");
        assert_eq!(
            err.to_string(),
            "invalid post type 'poll'. Allowed types: text, image, video"
        );
    }

    #[test]
    fn upload_extension_is_lower_cased() {
        let upload = MediaUpload {
            file_name: "holiday.Photo.PNG".to_string(),
            content_type: None,
            data: vec![1, 2, 3],
        };
        assert_eq!(upload.extension(), "png");
        assert_eq!(upload.size(), 3);
    }

    #[test]
    fn upload_without_extension_yields_empty_string() {
        let upload = MediaUpload {
            file_name: "README".to_string(),
            content_type: None,
            data: Vec::new(),
        };
        assert_eq!(upload.extension(), "");
    }

    #[test]
    fn derived_file_keys_override_caller_values() {
        let extra = as_map(json!({"file_size": 1, "file_type": "gif", "caption": "sunset"}));
        let metadata = PostMetadata::compose(PostType::Image, extra, Some(png_file()))
            .expect("image metadata must compose");

        let map = metadata.into_map();
        assert_eq!(map["file_size"], json!(2048));
        assert_eq!(map["file_type"], json!("png"));
        assert_eq!(map["content_type"], json!("image/png"));
        assert_eq!(map["caption"], json!("sunset"));
    }

    #[test]
    fn video_duration_must_be_positive() {
        let extra = as_map(json!({"duration": -4}));
        let err = PostMetadata::compose(PostType::Video, extra, Some(png_file()))
            .expect_err("negative duration must fail");
        assert!(matches!(err, PostValidationError::InvalidMetadataFormat { .. }));
    }

    #[test]
    fn stored_video_metadata_reads_back() {
        let stored = json!({
            "file_size": 4096,
            "file_type": "mp4",
            "duration": 12.5,
            "resolution": "1080p"
        });

        let metadata =
            PostMetadata::from_stored(PostType::Video, stored.clone()).expect("must parse");
        match &metadata {
            PostMetadata::Video { file, duration, extra } => {
                assert_eq!(file.file_size, 4096);
                assert_eq!(file.content_type, None);
                assert_eq!(duration.as_ref().and_then(|d| d.as_f64()), Some(12.5));
                assert_eq!(extra["resolution"], json!("1080p"));
            }
            other => panic!("expected video metadata, got {other:?}"),
        }
        assert_eq!(metadata.to_value(), stored);
    }

    #[test]
    fn integer_and_float_durations_are_stored_as_written() {
        for duration in [json!(31), json!(2.75)] {
            let extra = as_map(json!({"duration": duration.clone()}));
            let metadata = PostMetadata::compose(PostType::Video, extra, Some(png_file()))
                .expect("video metadata must compose");

            let stored = metadata.to_value();
            assert_eq!(stored["duration"], duration);

            let restored =
                PostMetadata::from_stored(PostType::Video, stored.clone()).expect("must parse");
            assert_eq!(restored, metadata);
            assert_eq!(restored.to_value()["duration"], duration);
        }
    }

    #[test]
    fn with_extra_keeps_derived_keys() {
        let metadata = PostMetadata::compose(PostType::Image, Map::new(), Some(png_file()))
            .expect("must compose");
        let replaced = metadata
            .with_extra(as_map(json!({"file_size": 1, "alt": "a cat"})))
            .expect("must replace extra");

        assert_eq!(replaced.file(), Some(&png_file()));
        assert_eq!(replaced.into_map()["alt"], json!("a cat"));
    }
}
