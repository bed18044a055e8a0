//! Playlist and tag data types.

use serde::{Deserialize, Serialize};

pub type PlaylistId = i64;
pub type TagId = i64;

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_TAG_LEN: usize = 30;

/// A label shared by any number of playlists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// A curated playlist and the tags attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: PlaylistId,
    pub title: String,
    pub description: String,
    /// Sorted by name, no duplicates.
    pub tags: Vec<Tag>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Playlist {
    pub fn tag_ids(&self) -> std::collections::BTreeSet<TagId> {
        self.tags.iter().map(|t| t.id).collect()
    }

    pub fn has_any_tag(&self, tags: &std::collections::BTreeSet<TagId>) -> bool {
        self.tags.iter().any(|t| tags.contains(&t.id))
    }
}

/// Request body for creating a playlist.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NewPlaylist {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Request body for a partial update. `tags`, when present, replaces the set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaylistUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Trim a title and enforce its bounds.
pub fn normalize_title(title: &str) -> Result<String, String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("title must not be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(format!("title must be at most {} characters", MAX_TITLE_LEN));
    }
    Ok(title.to_string())
}

/// Trim, validate and de-duplicate tag names, keeping first-seen order.
pub fn normalize_tag_names(names: &[String]) -> Result<Vec<String>, String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for raw in names {
        let name = raw.trim();
        if name.is_empty() {
            return Err("tag names must not be empty".to_string());
        }
        if name.chars().count() > MAX_TAG_LEN {
            return Err(format!("tag '{}' is longer than {} characters", name, MAX_TAG_LEN));
        }
        if !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag_names() {
        let names = vec![" rock ".to_string(), "pop".to_string(), "rock".to_string()];
        assert_eq!(normalize_tag_names(&names).unwrap(), vec!["rock", "pop"]);

        assert!(normalize_tag_names(&["  ".to_string()]).is_err());
        assert!(normalize_tag_names(&["x".repeat(MAX_TAG_LEN + 1)]).is_err());
        assert!(normalize_tag_names(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Road trip ").unwrap(), "Road trip");
        assert!(normalize_title("").is_err());
        assert!(normalize_title(&"a".repeat(MAX_TITLE_LEN + 1)).is_err());
    }

    #[test]
    fn test_playlist_serializes_camel_case() {
        let playlist = Playlist {
            id: 1,
            title: "Mix".into(),
            description: String::new(),
            tags: vec![Tag { id: 3, name: "pop".into() }],
            created_at: 10,
            updated_at: 20,
        };
        let json = serde_json::to_value(&playlist).unwrap();
        assert_eq!(json["createdAt"], 10);
        assert_eq!(json["updatedAt"], 20);
        assert_eq!(json["tags"][0]["name"], "pop");
    }
}
