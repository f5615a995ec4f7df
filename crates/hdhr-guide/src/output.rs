//! Output file writing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hdhr_cache::{path_component, write_atomic};

use super::assembler::Assembly;
use super::xmltv::to_xml;

/// Default XMLTV file name inside the output directory.
pub const DEFAULT_XMLTV_FILENAME: &str = "hdhr.xml";

/// Writes the XMLTV guide and one `{device_id}.m3u` per playlist into
/// `output_dir`, each replaced atomically. Device ids are reduced to a
/// single path component.
///
/// Returns the written paths, guide first.
///
/// # Errors
///
/// Returns an error if serialization or any write fails.
pub fn write_outputs(
    output_dir: &Path,
    xmltv_filename: &str,
    assembly: &Assembly,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create directory {}", output_dir.display()))?;

    let mut written = Vec::new();

    let xml = to_xml(&assembly.guide).context("failed to serialize XMLTV")?;
    let xml_path = output_dir.join(xmltv_filename);
    write_atomic(&xml_path, &xml)?;
    tracing::info!(
        path = %xml_path.display(),
        bytes = xml.len(),
        channels = assembly.guide.channels.len(),
        programmes = assembly.guide.programmes.len(),
        "XMLTV written"
    );
    written.push(xml_path);

    for (device_id, playlist) in &assembly.playlists {
        let path = output_dir.join(format!("{}.m3u", path_component(device_id)));
        write_atomic(&path, playlist.render().as_bytes())?;
        tracing::info!(path = %path.display(), channels = playlist.entries.len(), "M3U written");
        written.push(path);
    }

    Ok(written)
}
