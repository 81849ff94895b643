use std::path::Path;

use anyhow::{Context, Result};

/// Swaps B and R of every pixel.
pub fn bgra_to_rgba(bgra: &[u8]) -> Vec<u8> {
    bgra.chunks_exact(4)
        .flat_map(|px| [px[2], px[1], px[0], px[3]])
        .collect()
}

/// Writes a top-down BGRA frame as a PNG file.
pub fn save_png(path: &Path, width: u32, height: u32, bgra: &[u8]) -> Result<()> {
    let rgba = bgra_to_rgba(bgra);
    let image = image::RgbaImage::from_raw(width, height, rgba)
        .with_context(|| format!("frame does not hold {width}x{height} pixels"))?;

    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    log::info!("saved snapshot {}", path.display());
    Ok(())
}

/// `nabu-<unix seconds>.png` in the working directory.
pub fn default_path() -> std::path::PathBuf {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("nabu-{secs}.png").into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_red_and_blue() {
        let bgra = [1, 2, 3, 4, 10, 20, 30, 40];
        assert_eq!(bgra_to_rgba(&bgra), vec![3, 2, 1, 4, 30, 20, 10, 40]);
    }

    #[test]
    fn rejects_short_frames() {
        let dir = std::env::temp_dir().join("nabu-preview-short.png");
        assert!(save_png(&dir, 4, 4, &[0; 12]).is_err());
    }
}
