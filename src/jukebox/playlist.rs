use serde::{Deserialize, Serialize};

/// A playlist entry. Deserializes from a bare URL string or `{ "url", "title" }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TrackEntry")]
pub struct Track {
    pub url: String,
    pub title: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TrackEntry {
    Url(String),
    Full {
        url: String,
        #[serde(default)]
        title: Option<String>,
    },
}

impl From<TrackEntry> for Track {
    fn from(entry: TrackEntry) -> Self {
        match entry {
            TrackEntry::Url(url) => Track { url, title: None },
            TrackEntry::Full { url, title } => Track { url, title },
        }
    }
}

impl Track {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), title: None }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}

/// Fixed, cyclic list of tracks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Playlist {
    tracks: Vec<Track>,
}

impl Playlist {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Index taken modulo the playlist length.
    pub fn get(&self, index: usize) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        self.tracks.get(index % self.tracks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_from_plain_url() {
        let tracks: Vec<Track> =
            serde_json::from_str(r#"["music/a.mp3", {"url": "music/b.mp3", "title": "B"}]"#).unwrap();
        assert_eq!(Track::new("music/a.mp3"), tracks[0]);
        assert_eq!("music/a.mp3", tracks[0].display_name());
        assert_eq!("B", tracks[1].display_name());
    }

    #[test]
    fn test_playlist_wraps() {
        let playlist = Playlist::new(vec![Track::new("a"), Track::new("b")]);
        assert_eq!("a", playlist.get(2).unwrap().url);
        assert_eq!("b", playlist.get(3).unwrap().url);
        assert!(Playlist::default().get(0).is_none());
    }
}
