//! Optional image resolution.
//!
//! Every lookup yields either a file on disk or a placeholder descriptor;
//! a missing image is never an error. Only the hero image reports a
//! user-visible warning when it falls back.

use std::path::{Path, PathBuf};

use crate::recommend::RECOMMENDATION_COUNT;

pub const HERO_FILE: &str = "hero-image.jpg";
pub const HERO_MISSING_WARNING: &str = "Hero image not found - using placeholder";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Hero,
    /// 1-based result slot.
    Thumbnail(usize),
}

impl AssetKind {
    /// Parse a thumbnail slot, accepting only 1..=RECOMMENDATION_COUNT.
    pub fn thumbnail(slot: usize) -> Option<Self> {
        (1..=RECOMMENDATION_COUNT)
            .contains(&slot)
            .then_some(AssetKind::Thumbnail(slot))
    }

    pub fn file_name(&self) -> String {
        match self {
            AssetKind::Hero => HERO_FILE.to_string(),
            AssetKind::Thumbnail(slot) => format!("med_{slot}.jpg"),
        }
    }

    /// URL under which the web layer serves this asset.
    pub fn url(&self) -> String {
        match self {
            AssetKind::Hero => "/assets/hero".to_string(),
            AssetKind::Thumbnail(slot) => format!("/assets/thumb/{slot}"),
        }
    }

    fn placeholder(&self) -> Placeholder {
        match self {
            AssetKind::Hero => Placeholder {
                width: 800,
                height: 400,
                color: "#4a90e2",
            },
            AssetKind::Thumbnail(_) => Placeholder {
                width: 100,
                height: 100,
                color: "#2b5876",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    pub width: u32,
    pub height: u32,
    pub color: &'static str,
}

impl Placeholder {
    /// Solid-colour inline SVG of the placeholder's size.
    pub fn to_svg(&self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="{c}"/></svg>"#,
            w = self.width,
            h = self.height,
            c = self.color,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    Located(PathBuf),
    Placeholder(Placeholder),
}

/// Resolved asset plus the warning to surface, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub asset: Asset,
    pub warning: Option<&'static str>,
}

pub struct AssetResolver {
    images_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn resolve(&self, kind: AssetKind) -> Resolution {
        let path = self.images_dir.join(kind.file_name());
        if path.is_file() {
            return Resolution {
                asset: Asset::Located(path),
                warning: None,
            };
        }

        let warning = match kind {
            AssetKind::Hero => {
                tracing::warn!(path = %path.display(), "Hero image missing, using placeholder");
                Some(HERO_MISSING_WARNING)
            }
            AssetKind::Thumbnail(_) => None,
        };

        Resolution {
            asset: Asset::Placeholder(kind.placeholder()),
            warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_hero_is_placeholder_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = AssetResolver::new(dir.path());
        let resolution = resolver.resolve(AssetKind::Hero);
        assert_eq!(
            resolution.asset,
            Asset::Placeholder(Placeholder {
                width: 800,
                height: 400,
                color: "#4a90e2"
            })
        );
        assert_eq!(resolution.warning, Some(HERO_MISSING_WARNING));
    }

    #[test]
    fn missing_thumbnail_is_silent_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = AssetResolver::new(dir.path());
        let resolution = resolver.resolve(AssetKind::Thumbnail(3));
        assert!(matches!(resolution.asset, Asset::Placeholder(p) if p.width == 100 && p.color == "#2b5876"));
        assert!(resolution.warning.is_none());
    }

    #[test]
    fn present_files_are_located() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hero-image.jpg"), b"jpg").unwrap();
        std::fs::write(dir.path().join("med_2.jpg"), b"jpg").unwrap();
        let resolver = AssetResolver::new(dir.path());

        let hero = resolver.resolve(AssetKind::Hero);
        assert_eq!(hero.asset, Asset::Located(dir.path().join("hero-image.jpg")));
        assert!(hero.warning.is_none());

        let thumb = resolver.resolve(AssetKind::Thumbnail(2));
        assert_eq!(thumb.asset, Asset::Located(dir.path().join("med_2.jpg")));
    }

    #[test]
    fn thumbnail_slots_are_bounded() {
        assert_eq!(AssetKind::thumbnail(1), Some(AssetKind::Thumbnail(1)));
        assert_eq!(AssetKind::thumbnail(5), Some(AssetKind::Thumbnail(5)));
        assert!(AssetKind::thumbnail(0).is_none());
        assert!(AssetKind::thumbnail(6).is_none());
    }

    #[test]
    fn placeholder_svg_has_dimensions_and_colour() {
        let svg = AssetKind::Hero.placeholder().to_svg();
        assert!(svg.contains(r#"width="800""#));
        assert!(svg.contains(r#"height="400""#));
        assert!(svg.contains("#4a90e2"));
    }
}
