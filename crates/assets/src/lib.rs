//! Texture loading for scene materials.
//!
//! Textures are identified by a content-addressed hash of their relative
//! path, so two materials asking for the same file share one decoded image.
//! The renderer consumes textures by handle, never by raw file paths.
//!
//! # Layout
//! Texture sets live under `<root>/textures/<set>/<map>.jpg`.

use haunted_common::TextureHandle;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Errors from texture operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("texture not found: {0}")]
    NotFound(PathBuf),
    #[error("image decode error in {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Decoded image data ready for GPU upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 pixels, row-major.
    pub pixels: Vec<u8>,
}

impl ImageData {
    /// A single-color image, used as the default binding for absent maps.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = (width * height) as usize;
        Self {
            width,
            height,
            pixels: rgba.repeat(count),
        }
    }
}

/// A loaded texture and the relative path it came from.
#[derive(Debug, Clone)]
pub struct Texture {
    pub path: String,
    pub image: ImageData,
}

/// The texture maps a standard material can carry. Absent maps fall back to
/// the material's flat parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureMaps {
    pub color: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    pub ambient_occlusion: Option<TextureHandle>,
    pub roughness: Option<TextureHandle>,
    pub alpha: Option<TextureHandle>,
}

impl TextureMaps {
    pub fn is_empty(&self) -> bool {
        self.handles().next().is_none()
    }

    /// Iterate the maps that are present.
    pub fn handles(&self) -> impl Iterator<Item = TextureHandle> {
        [
            self.color,
            self.normal,
            self.ambient_occlusion,
            self.roughness,
            self.alpha,
        ]
        .into_iter()
        .flatten()
    }
}

/// Relative paths of one texture set on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSet {
    pub color: &'static str,
    pub normal: &'static str,
    pub ambient_occlusion: &'static str,
    pub roughness: &'static str,
    pub alpha: Option<&'static str>,
}

impl TextureSet {
    pub const BRICKS: Self = Self {
        color: "textures/bricks/color.jpg",
        normal: "textures/bricks/normal.jpg",
        ambient_occlusion: "textures/bricks/ambientOcclusion.jpg",
        roughness: "textures/bricks/roughness.jpg",
        alpha: None,
    };

    pub const DOOR: Self = Self {
        color: "textures/door/color.jpg",
        normal: "textures/door/normal.jpg",
        ambient_occlusion: "textures/door/ambientOcclusion.jpg",
        roughness: "textures/door/roughness.jpg",
        alpha: Some("textures/door/alpha.jpg"),
    };

    pub const GRASS: Self = Self {
        color: "textures/grass/color.jpg",
        normal: "textures/grass/normal.jpg",
        ambient_occlusion: "textures/grass/ambientOcclusion.jpg",
        roughness: "textures/grass/roughness.jpg",
        alpha: None,
    };
}

/// Decoded textures indexed by handle.
#[derive(Debug, Clone, Default)]
pub struct TextureStore {
    textures: BTreeMap<TextureHandle, Texture>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(&handle)
    }

    pub fn contains(&self, handle: TextureHandle) -> bool {
        self.textures.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Insert already-decoded pixels under the handle for `path`.
    pub fn insert(&mut self, path: &str, image: ImageData) -> TextureHandle {
        let handle = handle_for(path);
        self.textures.insert(
            handle,
            Texture {
                path: path.to_string(),
                image,
            },
        );
        handle
    }
}

/// Loads texture files relative to an asset root and caches the results.
#[derive(Debug)]
pub struct TextureLoader {
    root: PathBuf,
    store: TextureStore,
}

impl TextureLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            store: TextureStore::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &TextureStore {
        &self.store
    }

    pub fn into_store(self) -> TextureStore {
        self.store
    }

    /// Load and decode one texture. Repeated loads of the same path return
    /// the cached handle without touching the disk.
    pub fn load(&mut self, relative: &str) -> Result<TextureHandle, AssetError> {
        let handle = handle_for(relative);
        if self.store.contains(handle) {
            return Ok(handle);
        }

        let path = self.root.join(relative);
        if !path.exists() {
            return Err(AssetError::NotFound(path));
        }
        let bytes = std::fs::read(&path)?;
        let decoded = image::load_from_memory(&bytes).map_err(|source| AssetError::Decode {
            path: path.clone(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        tracing::debug!("loaded texture {relative} ({width}x{height})");

        Ok(self.store.insert(
            relative,
            ImageData {
                width,
                height,
                pixels: rgba.into_raw(),
            },
        ))
    }

    /// Load every map of a set. A map that fails to load is logged and left
    /// empty so the material falls back to its flat color.
    pub fn load_set(&mut self, set: &TextureSet) -> TextureMaps {
        let mut load = |relative: &str| match self.load(relative) {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("texture unavailable, using flat color: {e}");
                None
            }
        };
        TextureMaps {
            color: load(set.color),
            normal: load(set.normal),
            ambient_occlusion: load(set.ambient_occlusion),
            roughness: load(set.roughness),
            alpha: set.alpha.and_then(&mut load),
        }
    }
}

/// Content-addressed handle for a relative texture path.
pub fn handle_for(relative: &str) -> TextureHandle {
    let mut hasher = Sha256::new();
    hasher.update(relative.as_bytes());
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    TextureHandle(u64::from_le_bytes(bytes))
}

pub fn crate_info() -> &'static str {
    "haunted-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(root: &Path, relative: &str, w: u32, h: u32) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        // PNG bytes regardless of extension; decoding sniffs the content.
        let pixels = [10u8, 20, 30].repeat((w * h) as usize);
        image::save_buffer_with_format(
            &path,
            &pixels,
            w,
            h,
            image::ColorType::Rgb8,
            image::ImageFormat::Png,
        )
        .unwrap();
    }

    #[test]
    fn handles_are_content_addressed() {
        assert_eq!(handle_for("a.png"), handle_for("a.png"));
        assert_ne!(handle_for("a.png"), handle_for("b.png"));
    }

    #[test]
    fn load_decodes_rgba() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "textures/test/color.png", 4, 2);

        let mut loader = TextureLoader::new(dir.path());
        let handle = loader.load("textures/test/color.png").unwrap();
        let tex = loader.store().get(handle).unwrap();
        assert_eq!(tex.image.width, 4);
        assert_eq!(tex.image.height, 2);
        assert_eq!(tex.image.pixels.len(), 4 * 2 * 4);
        assert_eq!(&tex.image.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn repeated_load_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "t.png", 1, 1);

        let mut loader = TextureLoader::new(dir.path());
        let a = loader.load("t.png").unwrap();
        std::fs::remove_file(dir.path().join("t.png")).unwrap();
        let b = loader.load("t.png").unwrap();
        assert_eq!(a, b);
        assert_eq!(loader.store().len(), 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = TextureLoader::new(dir.path());
        let err = loader.load("textures/bricks/color.jpg").unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[test]
    fn corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.png"), b"not an image").unwrap();
        let mut loader = TextureLoader::new(dir.path());
        let err = loader.load("bad.png").unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }

    #[test]
    fn load_set_degrades_missing_maps() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), TextureSet::BRICKS.color, 2, 2);

        let mut loader = TextureLoader::new(dir.path());
        let maps = loader.load_set(&TextureSet::BRICKS);
        assert!(maps.color.is_some());
        assert!(maps.normal.is_none());
        assert!(maps.alpha.is_none());
        assert_eq!(maps.handles().count(), 1);
    }

    #[test]
    fn solid_image_size() {
        let img = ImageData::solid(2, 3, [1, 2, 3, 4]);
        assert_eq!(img.pixels.len(), 24);
        assert_eq!(&img.pixels[20..], &[1, 2, 3, 4]);
        assert!(TextureMaps::default().is_empty());
    }
}
