//! Audio sources and the resource factories built from them.
//!
//! Every factory captures only a description of its source and builds a
//! new lazy songbird input on each call, so looping and restarting an item
//! never reuse a consumed stream.

pub mod sounds;
pub mod tts;

use reqwest::Client;
use songbird::input::{AuxMetadata, Compose, File, HttpRequest, YoutubeDl};
use std::{path::PathBuf, time::Duration};
use tracing::info;

use crate::{
    audio::resource::{AudioResource, ResourceFactory},
    error::VoiceError,
};

pub use sounds::SoundLibrary;

/// A track resolved from a `/play` query.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrack {
    pub title: String,
    pub url: String,
    pub duration: Option<Duration>,
}

impl ResolvedTrack {
    /// Needs a source URL, either reported by yt-dlp or the query itself.
    fn from_metadata(meta: AuxMetadata, fallback_url: Option<&str>) -> Option<Self> {
        let url = meta
            .source_url
            .or_else(|| fallback_url.map(str::to_string))?;
        Some(Self {
            title: meta.title.unwrap_or_else(|| url.clone()),
            url,
            duration: meta.duration,
        })
    }

    /// `title (m:ss)`, or just the title for live streams.
    pub fn display_name(&self) -> String {
        match self.duration {
            Some(duration) => format!("{} ({})", self.title, format_duration(duration)),
            None => self.title.clone(),
        }
    }
}

/// How many yt-dlp hits a search offers to pick from.
pub const SEARCH_RESULTS: usize = 5;

/// Resolves a URL to its single track, or a search term to the top
/// [`SEARCH_RESULTS`] yt-dlp hits.
pub async fn search(client: &Client, query: &str) -> Result<Vec<ResolvedTrack>, VoiceError> {
    if is_url(query) {
        let mut source = YoutubeDl::new(client.clone(), query.to_string());
        let meta = source.aux_metadata().await?;
        let track = ResolvedTrack::from_metadata(meta, Some(query));
        return Ok(track.into_iter().collect());
    }

    let mut source = YoutubeDl::new_search(client.clone(), query.to_string());
    let tracks: Vec<ResolvedTrack> = source
        .search(Some(SEARCH_RESULTS))
        .await?
        .into_iter()
        .filter_map(|meta| ResolvedTrack::from_metadata(meta, None))
        .take(SEARCH_RESULTS)
        .collect();

    info!("🔍 {} resultados para '{}'", tracks.len(), query);
    Ok(tracks)
}

/// yt-dlp backed stream for a resolved URL.
pub fn youtube_factory(client: Client, url: String) -> ResourceFactory {
    ResourceFactory::new(move || AudioResource::new(YoutubeDl::new(client.clone(), url.clone())))
}

/// Direct HTTP stream.
pub fn http_factory(client: Client, url: String) -> ResourceFactory {
    ResourceFactory::new(move || AudioResource::new(HttpRequest::new(client.clone(), url.clone())))
}

/// Local file played at a fixed attenuation.
pub fn file_factory(path: PathBuf, volume: f32) -> ResourceFactory {
    ResourceFactory::new(move || AudioResource::new(File::new(path.clone())).with_volume(volume))
}

pub fn is_url(query: &str) -> bool {
    url::Url::parse(query)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// `m:ss`, or `h:mm:ss` past an hour.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_url_detection() {
        assert!(is_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_url("http://example.com/a.mp3"));
        assert!(!is_url("library of ruina ost"));
        assert!(!is_url("ftp://example.com/a.mp3"));
    }

    #[test]
    fn test_duration_format() {
        assert_eq!(format_duration(Duration::from_secs(5)), "0:05");
        assert_eq!(format_duration(Duration::from_secs(272)), "4:32");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1:02:05");
    }

    #[test]
    fn metadata_without_a_url_is_skipped() {
        let meta = AuxMetadata {
            title: Some("Gone Angels".to_string()),
            ..AuxMetadata::default()
        };
        assert_eq!(ResolvedTrack::from_metadata(meta.clone(), None), None);

        let track = ResolvedTrack::from_metadata(meta, Some("https://youtu.be/x")).unwrap();
        assert_eq!(track.url, "https://youtu.be/x");
        assert_eq!(track.title, "Gone Angels");

        let untitled = AuxMetadata {
            source_url: Some("https://youtu.be/y".to_string()),
            ..AuxMetadata::default()
        };
        let track = ResolvedTrack::from_metadata(untitled, None).unwrap();
        assert_eq!(track.title, "https://youtu.be/y");
    }

    #[test]
    fn display_name_includes_duration() {
        let track = ResolvedTrack {
            title: "Gone Angels".to_string(),
            url: "https://youtu.be/x".to_string(),
            duration: Some(Duration::from_secs(245)),
        };
        assert_eq!(track.display_name(), "Gone Angels (4:05)");

        let live = ResolvedTrack { duration: None, ..track };
        assert_eq!(live.display_name(), "Gone Angels");
    }
}
