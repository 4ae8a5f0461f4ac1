//! Data models for SkyDrive API responses.

use serde::{Deserialize, Serialize};

/// Well-known path of the signed-in user's root folder.
pub const ROOT_FOLDER: &str = "me/skydrive";

/// Type of a resource as reported in its `type` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Folder,
    Album,
    File,
    Photo,
    Video,
    Audio,
    Notebook,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Folder => "folder",
            ResourceKind::Album => "album",
            ResourceKind::File => "file",
            ResourceKind::Photo => "photo",
            ResourceKind::Video => "video",
            ResourceKind::Audio => "audio",
            ResourceKind::Notebook => "notebook",
            ResourceKind::Unknown => "-",
        }
    }
}

/// Owner of a resource, the `from` field on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Sharing state of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedWith {
    #[serde(default)]
    pub access: Option<String>,
}

/// Fields present on files and everything derived from them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments_enabled: Option<bool>,
    /// Download URL; short-lived, do not cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Fields present on videos and photos.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Run time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Bits per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
}

/// A file, folder or media item stored in SkyDrive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ResourceKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub from: Option<Owner>,
    #[serde(default)]
    pub upload_location: Option<String>,
    #[serde(default)]
    pub is_embeddable: Option<bool>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub shared_with: Option<SharedWith>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub updated_time: Option<String>,
    /// Number of children, folders and albums only.
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(flatten)]
    pub file: FileDetails,
    #[serde(flatten)]
    pub media: MediaDetails,
}

impl Resource {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, ResourceKind::Folder | ResourceKind::Album)
    }

    pub fn size(&self) -> Option<u64> {
        self.file.size
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size_str = if self.is_folder() {
            "-".to_string()
        } else {
            self.size().map(format_size).unwrap_or_else(|| "-".to_string())
        };
        write!(f, "{}\t{}\t{}\t{}", self.id, size_str, self.kind.as_str(), self.name)
    }
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Envelope returned by folder listings.
#[derive(Debug, Default, Deserialize)]
pub struct ResourceList {
    #[serde(default)]
    pub data: Vec<Resource>,
}

/// Storage quota of the signed-in user, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuota {
    #[serde(default)]
    pub available: u64,
    #[serde(default)]
    pub quota: u64,
}

impl UserQuota {
    pub fn used(&self) -> u64 {
        self.quota.saturating_sub(self.available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(1073741824), "1.00 GB");
    }

    #[test]
    fn test_video_deserialize() {
        let json = r#"{
            "id": "file.a1b2.A1B2!110",
            "name": "clip.mp4",
            "type": "video",
            "parent_id": "folder.a1b2",
            "size": 2048,
            "comments_enabled": true,
            "height": 480,
            "width": 640,
            "duration": 12000,
            "bitrate": 128000
        }"#;

        let resource: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(resource.kind, ResourceKind::Video);
        assert_eq!(resource.size(), Some(2048));
        assert_eq!(resource.file.comments_enabled, Some(true));
        assert_eq!(resource.media.width, Some(640));
        assert_eq!(resource.media.duration, Some(12000));
        assert_eq!(resource.parent_id.as_deref(), Some("folder.a1b2"));
    }

    #[test]
    fn test_unknown_kind_and_missing_fields() {
        let resource: Resource = serde_json::from_str(r#"{"type": "calendar"}"#).unwrap();
        assert_eq!(resource.kind, ResourceKind::Unknown);
        assert!(resource.id.is_empty());
        assert_eq!(resource.size(), None);
        assert_eq!(resource.media, MediaDetails::default());
    }

    #[test]
    fn test_folder_display() {
        let resource = Resource {
            id: "folder.a1b2".to_string(),
            name: "Documents".to_string(),
            kind: ResourceKind::Folder,
            count: Some(3),
            ..Default::default()
        };

        let display = format!("{}", resource);
        assert_eq!(display, "folder.a1b2\t-\tfolder\tDocuments");
    }

    #[test]
    fn test_quota_used() {
        let quota = UserQuota {
            available: 100,
            quota: 250,
        };
        assert_eq!(quota.used(), 150);
    }
}
