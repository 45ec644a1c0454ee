//! World configuration: noise, ground plane, materials, initial region.

use std::path::Path;
use std::sync::Arc;

use glam::{I64Vec3, IVec3, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::terrain::{DensityField, DensityFunction, GradientSettings, NoiseSettings, SphereField, TerrainField};
use crate::voxel::hierarchy::{BrickKey, BRICK_SIZE, BRICK_SIZE_LOG2, MAX_VOXEL_COORD, VOXELS_PER_UNIT};

/// Largest number of bricks a configured region may request
pub const MAX_REGION_BRICKS: usize = 1 << 22;

/// Largest brick coordinate magnitude a region may use
pub const MAX_BRICK_COORD: i32 = MAX_VOXEL_COORD >> BRICK_SIZE_LOG2;

/// Voxel coloring rules applied when attributes are generated.
///
/// A solid voxel is grass when its normal points up by more than
/// `grass_min_up` (dot with +Z) and its density is above
/// `grass_min_density` (close to the surface); otherwise it is dirt.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSettings {
    pub grass_color: Vec3,
    pub dirt_color: Vec3,
    pub grass_min_up: f32,
    pub grass_min_density: f32,
    /// Half-angle in radians of the cone used to dither shading normals
    pub normal_jitter: f32,
    /// Seed mixed into the per-voxel dither hash
    pub jitter_seed: u32,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            grass_color: Vec3::new(0.28, 0.55, 0.18),
            dirt_color: Vec3::new(0.42, 0.30, 0.20),
            grass_min_up: 0.5,
            grass_min_density: -0.5,
            normal_jitter: 0.15,
            jitter_seed: 0x9e37_79b9,
        }
    }
}

/// Level-0 brick range: `min` inclusive, `max` exclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub min: IVec3,
    pub max: IVec3,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            min: IVec3::ZERO,
            max: IVec3::new(16, 16, 12),
        }
    }
}

impl RegionConfig {
    pub fn new(min: IVec3, max: IVec3) -> Self {
        Self { min, max }
    }

    /// Bricks per axis (zero when the range is empty)
    pub fn extent(&self) -> I64Vec3 {
        (self.max.as_i64vec3() - self.min.as_i64vec3()).max(I64Vec3::ZERO)
    }

    /// Number of bricks in the region, saturating at `usize::MAX`
    pub fn brick_count(&self) -> usize {
        let e = self.extent().as_u64vec3();
        let count = e.x.saturating_mul(e.y).saturating_mul(e.z);
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.brick_count() == 0
    }

    /// Level-0 keys of every brick in the region, x fastest
    pub fn keys(&self) -> Vec<BrickKey> {
        let mut keys = Vec::with_capacity(self.brick_count().min(MAX_REGION_BRICKS));
        for z in self.min.z..self.max.z {
            for y in self.min.y..self.max.y {
                for x in self.min.x..self.max.x {
                    keys.push(BrickKey::level0(IVec3::new(x, y, z)));
                }
            }
        }
        keys
    }

    /// World-space center of the region
    pub fn world_center(&self) -> Vec3 {
        (self.min.as_vec3() + self.max.as_vec3()) * 0.5 * brick_world_size()
    }
}

/// Side length of a level-0 brick in world units
pub fn brick_world_size() -> f32 {
    BRICK_SIZE as f32 / VOXELS_PER_UNIT
}

/// Shape used to populate the initial region
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeedShape {
    /// One sphere per `tile_bricks` x `tile_bricks` column of bricks,
    /// centered in the tile and at the region's vertical middle.
    /// `tile_bricks = 0` places a single sphere at the region center.
    Spheres { radius: f32, tile_bricks: u32 },
    /// Procedural terrain from the density function
    Terrain,
}

impl Default for SeedShape {
    fn default() -> Self {
        SeedShape::Terrain
    }
}

/// Complete world configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed for the noise lattice table
    pub seed: u64,
    pub noise: NoiseSettings,
    pub gradient: GradientSettings,
    pub materials: MaterialSettings,
    pub region: RegionConfig,
    pub shape: SeedShape,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            noise: NoiseSettings::default(),
            gradient: GradientSettings::default(),
            materials: MaterialSettings::default(),
            region: RegionConfig::default(),
            shape: SeedShape::default(),
        }
    }
}

impl WorldConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: WorldConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Check that every numeric setting is usable
    pub fn validate(&self) -> Result<()> {
        let n = &self.noise;
        let finite = [
            ("noise.scale", n.scale),
            ("noise.amplitude", n.amplitude),
            ("noise.persistence", n.persistence),
            ("noise.lacunarity", n.lacunarity),
            ("gradient.offset", self.gradient.offset),
            ("gradient.slope", self.gradient.slope),
            ("materials.grass_min_up", self.materials.grass_min_up),
            ("materials.grass_min_density", self.materials.grass_min_density),
            ("materials.normal_jitter", self.materials.normal_jitter),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(Error::Config(format!("{} must be finite, got {}", name, value)));
            }
        }
        if !(0.0..=std::f32::consts::FRAC_PI_2).contains(&self.materials.normal_jitter) {
            return Err(Error::Config(format!(
                "materials.normal_jitter must be within [0, pi/2], got {}",
                self.materials.normal_jitter
            )));
        }
        for (name, color) in [("grass_color", self.materials.grass_color), ("dirt_color", self.materials.dirt_color)] {
            if !color.is_finite() {
                return Err(Error::Config(format!("materials.{} must be finite", name)));
            }
        }
        if self.region.is_empty() {
            return Err(Error::Config(format!(
                "region is empty: min {:?}, max {:?}",
                self.region.min, self.region.max
            )));
        }
        let corner = self.region.min.as_i64vec3().abs().max(self.region.max.as_i64vec3().abs()).max_element();
        if corner > MAX_BRICK_COORD as i64 {
            return Err(Error::Config(format!(
                "region coordinates must be within +/-{}: min {:?}, max {:?}",
                MAX_BRICK_COORD, self.region.min, self.region.max
            )));
        }
        if self.region.brick_count() > MAX_REGION_BRICKS {
            return Err(Error::Config(format!(
                "region has {} bricks, limit is {}",
                self.region.brick_count(),
                MAX_REGION_BRICKS
            )));
        }
        if let SeedShape::Spheres { radius, .. } = self.shape {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(Error::Config(format!("sphere radius must be positive, got {}", radius)));
            }
        }
        Ok(())
    }

    /// Terrain density function described by this config
    pub fn density_function(&self) -> DensityFunction {
        DensityFunction::new(self.noise, self.gradient)
    }

    /// Density field for the configured seed shape
    pub fn field(&self) -> Arc<dyn DensityField> {
        match self.shape {
            SeedShape::Terrain => Arc::new(TerrainField::new(self.seed, self.density_function())),
            SeedShape::Spheres { radius, tile_bricks } => {
                let center = self.region.world_center();
                if tile_bricks == 0 {
                    return Arc::new(SphereField::single(center, radius));
                }
                let tile = tile_bricks as f32 * brick_world_size();
                let origin = Vec3::new(
                    self.region.min.x as f32 * brick_world_size() + tile * 0.5,
                    self.region.min.y as f32 * brick_world_size() + tile * 0.5,
                    center.z,
                );
                Arc::new(SphereField::tiled(origin, radius, Vec2::splat(tile)))
            }
        }
    }
}
