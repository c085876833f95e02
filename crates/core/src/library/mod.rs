//! Completed-video library: the metadata store and the catalog reader.
//!
//! Every completed job owns one directory under the output root, named by its
//! job id, holding the playlist, the segments and a single `metadata.json`.
//! The catalog is the union of those files; directories without one are
//! failed or in-flight jobs and are never listed.

mod store;
mod types;

pub use store::{CatalogReader, MetadataStore};
pub use types::*;

/// Name of the per-video metadata file.
pub const METADATA_FILENAME: &str = "metadata.json";

/// Route prefix under which playlists and segments are served.
pub const STREAMS_PREFIX: &str = "/streams";

/// Public URL of a video's playlist, derived at read time.
pub fn playlist_url(video_id: &str, playlist_filename: &str) -> String {
    format!("{}/{}/{}", STREAMS_PREFIX, video_id, playlist_filename)
}

/// True when `name` is a single, non-hidden path component.
///
/// Used for anything that comes from a request and is joined onto the
/// output root.
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
}
