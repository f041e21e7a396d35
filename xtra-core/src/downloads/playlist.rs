//! Reading a downloaded HLS media playlist back from disk.

use std::path::{Path, PathBuf};

use m3u8_rs::{MediaPlaylist, Playlist, parse_playlist_res};

use crate::{Error, Result};

pub fn parse_media_playlist(bytes: &[u8]) -> Result<MediaPlaylist> {
    match parse_playlist_res(bytes) {
        Ok(Playlist::MediaPlaylist(pl)) => Ok(pl),
        Ok(Playlist::MasterPlaylist(_)) => Err(Error::Playlist(
            "Expected Media Playlist, got Master".to_string(),
        )),
        Err(e) => Err(Error::Playlist(format!(
            "Failed to parse media playlist: {e}"
        ))),
    }
}

/// Local files referenced by `playlist`, in playlist order, without duplicates.
///
/// Includes `EXT-X-MAP` initialization sections. Remote URIs are skipped.
pub fn segment_files(playlist: &MediaPlaylist, playlist_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::with_capacity(playlist.segments.len());
    let uris = playlist.segments.iter().flat_map(|segment| {
        segment
            .map
            .as_ref()
            .map(|m| m.uri.as_str())
            .into_iter()
            .chain(std::iter::once(segment.uri.as_str()))
    });
    for uri in uris {
        if let Some(path) = resolve_local(uri, playlist_dir)
            && !files.contains(&path)
        {
            files.push(path);
        }
    }
    files
}

/// Read and parse the playlist at `path`, returning the files it lists.
pub async fn read_segment_files(path: &Path) -> Result<Vec<PathBuf>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::io_path("reading playlist", path, e))?;
    let playlist = parse_media_playlist(&bytes)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(segment_files(&playlist, dir))
}

fn resolve_local(uri: &str, playlist_dir: &Path) -> Option<PathBuf> {
    let uri = uri.trim();
    if uri.is_empty() {
        return None;
    }
    if uri.starts_with("file:") {
        return url::Url::parse(uri).ok()?.to_file_path().ok();
    }
    if uri.contains("://") {
        return None;
    }
    let path = Path::new(uri);
    if path.is_absolute() {
        Some(path.to_path_buf())
    } else {
        Some(playlist_dir.join(path))
    }
}
