use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::assets::Sprite;
use crate::io;
use crate::renderer::{Rect, Texture};

/// Trimmed off the right/bottom edge of every atlas frame so nearest
/// sampling at frame borders never bleeds the neighboring frame in.
const EDGE_BLEED: f32 = 1.1;

#[derive(Deserialize)]
struct AtlasManifest {
    /// name -> image file, relative to the assets directory.
    textures: HashMap<String, String>,
    /// sprite name -> frame within one of the textures.
    #[serde(default)]
    sprites: HashMap<String, FrameDef>,
}

#[derive(Deserialize)]
struct FrameDef {
    texture: String,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

/// Explicitly owned asset table.
///
/// Constructed empty, populated once by [`load`](Self::load) during
/// initialization, queried thereafter. Passed by reference to whatever
/// needs it; there is no ambient global registry.
pub struct AssetRegistry {
    textures: HashMap<String, Texture>,
    sprites: HashMap<String, Sprite>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            sprites: HashMap::new(),
        }
    }

    /// Loads every texture and sprite frame listed in
    /// `<assets_dir>/atlas.json`. Any missing file, decode failure or
    /// dangling texture reference fails the whole load; initialization
    /// must not continue with a partial registry.
    pub fn load(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        assets_dir: &Path,
    ) -> Result<(), String> {
        let manifest_path = assets_dir.join("atlas.json");
        let manifest_text = io::load_string(&manifest_path)?;
        let manifest: AtlasManifest = serde_json::from_str(&manifest_text)
            .map_err(|e| format!("asset load failed: bad manifest {:?}: {}", manifest_path, e))?;

        for (name, file) in &manifest.textures {
            let texture = Texture::from_path(device, queue, assets_dir.join(file))?;
            self.textures.insert(name.clone(), texture);
        }

        for (name, frame) in &manifest.sprites {
            let texture = self.textures.get(&frame.texture).ok_or_else(|| {
                format!(
                    "asset load failed: sprite {:?} references unknown texture {:?}",
                    name, frame.texture
                )
            })?;
            let source_rect = Rect::new(
                frame.x,
                frame.y,
                frame.width - EDGE_BLEED,
                frame.height - EDGE_BLEED,
            );
            let draw_rect = Rect::new(0.0, 0.0, frame.width, frame.height);
            self.sprites.insert(
                name.clone(),
                Sprite::new(texture.clone(), source_rect, draw_rect),
            );
        }

        log::info!(
            "Loaded {} textures and {} sprites from {:?}",
            self.textures.len(),
            self.sprites.len(),
            assets_dir
        );
        Ok(())
    }

    pub fn texture(&self, name: &str) -> Result<&Texture, String> {
        self.textures
            .get(name)
            .ok_or_else(|| format!("unknown texture: {:?}", name))
    }

    /// A fresh sprite instance: the texture is shared, both rects are
    /// independent copies of the template's.
    pub fn sprite(&self, name: &str) -> Result<Sprite, String> {
        self.sprites
            .get(name)
            .cloned()
            .ok_or_else(|| format!("unknown sprite: {:?}", name))
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_parses_textures_and_frames() {
        let manifest: AtlasManifest = serde_json::from_str(
            r#"{
                "textures": { "sheet": "sheet.png" },
                "sprites": {
                    "ship": { "texture": "sheet", "x": 224, "y": 832, "width": 99, "height": 75 }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.textures["sheet"], "sheet.png");
        let ship = &manifest.sprites["ship"];
        assert_eq!((ship.x, ship.y), (224.0, 832.0));
        assert_eq!((ship.width, ship.height), (99.0, 75.0));
    }

    #[test]
    fn manifest_without_sprites_is_valid() {
        let manifest: AtlasManifest =
            serde_json::from_str(r#"{ "textures": { "bg": "bg.png" } }"#).unwrap();
        assert!(manifest.sprites.is_empty());
    }

    #[test]
    fn empty_registry_reports_unknown_names() {
        let registry = AssetRegistry::new();
        assert!(registry.texture("sheet").is_err());
        assert!(registry.sprite("ship").is_err());
    }
}
