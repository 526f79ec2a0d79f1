//! Icon images and the rendering capability.

use std::path::{Path, PathBuf};

use image::{imageops, DynamicImage, Rgba, RgbaImage};
use thiserror::Error;

/// Edge length, in pixels, icons are thumbnailed to.
pub const ICON_EDGE: u32 = 64;

/// Errors that can occur while rendering an icon.
#[derive(Debug, Error)]
pub enum IconError {
    /// The bundle holds no image this build can decode.
    #[error("No decodable icon in {0}")]
    NotFound(PathBuf),

    /// An icon file exists but failed to decode.
    #[error("Failed to load icon {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// A decoded RGBA icon.
#[derive(Clone)]
pub struct Icon {
    image: RgbaImage,
}

impl Icon {
    #[must_use]
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Neutral rounded-square stand-in shown until the real icon loads.
    #[must_use]
    pub fn placeholder(edge: u32) -> Self {
        let radius = edge / 5;
        let image = RgbaImage::from_fn(edge, edge, |x, y| {
            let cx = x.min(edge - 1 - x);
            let cy = y.min(edge - 1 - y);
            let outside_corner = cx < radius
                && cy < radius
                && (radius - cx).pow(2) + (radius - cy).pow(2) > radius.pow(2);
            if outside_corner {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([142, 142, 147, 255])
            }
        });
        Self { image }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Memory held by the pixel buffer, used for the cache byte budget.
    #[must_use]
    pub fn byte_cost(&self) -> usize {
        self.image.as_raw().len()
    }

    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl std::fmt::Debug for Icon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Icon")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Capability that turns a bundle path into an image.
pub trait IconRenderer: Send + Sync {
    fn render(&self, path: &Path) -> Result<Icon, IconError>;
}

/// Reads the PNG artwork shipped in `Contents/Resources`.
#[derive(Debug, Clone, Default)]
pub struct BundleIconRenderer;

impl BundleIconRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// PNG candidates, most icon-like names first.
    fn candidates(resources: &Path) -> Vec<PathBuf> {
        let Ok(read_dir) = std::fs::read_dir(resources) else {
            return Vec::new();
        };
        let mut pngs: Vec<PathBuf> = read_dir
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("png"))
            })
            .collect();
        pngs.sort_by_key(|p| {
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            let rank = if name.contains("appicon") {
                0
            } else if name.contains("icon") {
                1
            } else {
                2
            };
            (rank, name)
        });
        pngs
    }
}

impl IconRenderer for BundleIconRenderer {
    fn render(&self, path: &Path) -> Result<Icon, IconError> {
        let resources = path.join("Contents").join("Resources");
        let mut last_error = None;

        for candidate in Self::candidates(&resources) {
            match image::open(&candidate) {
                Ok(img) => return Ok(Icon::new(thumbnail(&img))),
                Err(source) => {
                    log::trace!("Skipping icon candidate {}: {}", candidate.display(), source);
                    last_error = Some(IconError::Decode {
                        path: candidate,
                        source,
                    });
                }
            }
        }

        Err(last_error.unwrap_or_else(|| IconError::NotFound(path.to_path_buf())))
    }
}

fn thumbnail(img: &DynamicImage) -> RgbaImage {
    if img.width() <= ICON_EDGE && img.height() <= ICON_EDGE {
        return img.to_rgba8();
    }
    let scale = f64::from(ICON_EDGE) / f64::from(img.width().max(img.height()));
    let width = ((f64::from(img.width()) * scale).round() as u32).max(1);
    let height = ((f64::from(img.height()) * scale).round() as u32).max(1);
    imageops::thumbnail(&img.to_rgba8(), width, height)
}
