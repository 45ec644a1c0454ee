//! Sparse brick collection with point and ray queries

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use glam::{IVec3, Vec3};

use super::brick::{BrickAttributes, BrickBitmask, BrickMetadata, BrickPosition};
use super::hierarchy::{voxel_to_brick, world_to_voxel, BrickKey};
use super::query::{traverse, RayHit};
use crate::core::{Error, Result};
use crate::generation::{generate_bricks, BrickGenerator, CancelToken, GeneratedBrick, GenerationStats, RegionConfig, WorldConfig};
use crate::math::{Aabb, Ray};

/// Owns every generated brick as parallel arrays laid out for direct
/// upload: bitmask `i` belongs to position `i`.
///
/// A brick keeps its index for as long as the world lives; regenerating it
/// rewrites the slot in place.
pub struct VoxelWorld {
    generator: BrickGenerator,
    bitmasks: Vec<BrickBitmask>,
    positions: Vec<BrickPosition>,
    metadata: Vec<BrickMetadata>,
    /// Filled on first request, cleared when the slot is rewritten
    attributes: Vec<OnceLock<BrickAttributes>>,
    lookup: HashMap<BrickKey, usize>,
    /// Union of level-0 brick bounds, used to reject rays early
    level0_bounds: Option<Aabb>,
    dirty: AtomicBool,
}

impl VoxelWorld {
    /// Create an empty world that generates bricks with `generator`
    pub fn new(generator: BrickGenerator) -> Self {
        Self {
            generator,
            bitmasks: Vec::new(),
            positions: Vec::new(),
            metadata: Vec::new(),
            attributes: Vec::new(),
            lookup: HashMap::new(),
            level0_bounds: None,
            dirty: AtomicBool::new(false),
        }
    }

    /// Build a world and populate the configured region.
    ///
    /// The world starts out changed so the first consumer sees every brick.
    pub fn create(config: &WorldConfig) -> Result<Self> {
        config.validate()?;
        let mut world = Self::new(BrickGenerator::from_config(config));
        world.generate_region(&config.region, &CancelToken::new());
        world.dirty.store(true, Ordering::Release);
        log::info!(
            "Created world: seed {}, {:?}, {} bricks",
            config.seed,
            config.shape,
            world.brick_count()
        );
        Ok(world)
    }

    pub fn generator(&self) -> &BrickGenerator {
        &self.generator
    }

    /// Generate and insert every level-0 brick of `region` that has geometry
    pub fn generate_region(&mut self, region: &RegionConfig, cancel: &CancelToken) -> GenerationStats {
        self.generate_keys(&region.keys(), cancel)
    }

    /// Generate and insert the bricks for `keys` (any LOD level)
    pub fn generate_keys(&mut self, keys: &[BrickKey], cancel: &CancelToken) -> GenerationStats {
        let (bricks, stats) = generate_bricks(&self.generator, keys, cancel);
        for brick in bricks {
            self.insert_brick(brick);
        }
        stats
    }

    /// Store a generated brick and return its index. A brick with the same
    /// key is replaced in its existing slot.
    pub fn insert_brick(&mut self, brick: GeneratedBrick) -> usize {
        let index = match self.lookup.get(&brick.key) {
            Some(&index) => {
                self.bitmasks[index] = brick.bitmask;
                self.metadata[index] = brick.metadata;
                self.attributes[index] = OnceLock::new();
                index
            }
            None => {
                let index = self.bitmasks.len();
                self.bitmasks.push(brick.bitmask);
                self.positions.push(BrickPosition::from_key(brick.key));
                self.metadata.push(brick.metadata);
                self.attributes.push(OnceLock::new());
                self.lookup.insert(brick.key, index);
                if brick.key.level == 0 {
                    let bounds = brick.key.world_bounds();
                    self.level0_bounds = Some(match self.level0_bounds {
                        Some(existing) => existing.union(&bounds),
                        None => bounds,
                    });
                }
                index
            }
        };
        self.dirty.store(true, Ordering::Release);
        index
    }

    /// Re-run generation for the brick in slot `index`
    pub fn regenerate_brick(&mut self, index: usize) -> Result<BrickMetadata> {
        let key = self.brick_key(index).ok_or_else(|| {
            Error::Voxel(format!("brick index {} out of range ({} bricks)", index, self.brick_count()))
        })?;
        let brick = self.generator.generate_bitmask(key);
        log::debug!("Regenerated brick {} at {:?} ({:?})", index, key, brick.hint);
        self.insert_brick(brick);
        Ok(brick.metadata)
    }

    /// Bitmask per brick, index-aligned with [`Self::brick_positions`]
    pub fn brick_bitmasks(&self) -> &[BrickBitmask] {
        &self.bitmasks
    }

    /// Position per brick: `(bx, by, bz, level)`
    pub fn brick_positions(&self) -> &[BrickPosition] {
        &self.positions
    }

    pub fn brick_metadata(&self) -> &[BrickMetadata] {
        &self.metadata
    }

    pub fn brick_count(&self) -> usize {
        self.bitmasks.len()
    }

    pub fn brick_key(&self, index: usize) -> Option<BrickKey> {
        self.positions.get(index).map(BrickPosition::key)
    }

    pub fn brick_index(&self, key: BrickKey) -> Option<usize> {
        self.lookup.get(&key).copied()
    }

    /// World-space box covering every level-0 brick
    pub fn level0_bounds(&self) -> Option<Aabb> {
        self.level0_bounds
    }

    /// True when bricks were generated since the last [`Self::mark_consumed`]
    pub fn bricks_changed(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Acknowledge the current brick data. Only this clears the changed flag.
    pub fn mark_consumed(&self) {
        self.dirty.store(false, Ordering::Release);
    }

    /// Read and clear the changed flag in one step
    pub fn take_changed(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    /// Packed color and normal per voxel of brick `index`, generated on
    /// first request
    pub fn attributes(&self, index: usize) -> Option<&BrickAttributes> {
        let key = self.brick_key(index)?;
        let bitmask = &self.bitmasks[index];
        Some(self.attributes[index].get_or_init(|| self.generator.generate_attributes(key, bitmask)))
    }

    /// Stored solidity of a level-0 voxel; unallocated voxels are empty
    pub fn voxel_solid(&self, voxel: IVec3) -> bool {
        let (brick, local) = voxel_to_brick(voxel);
        match self.lookup.get(&BrickKey::level0(brick)) {
            Some(&index) => self.bitmasks[index].is_solid(local),
            None => false,
        }
    }

    /// Stored solidity of the level-0 voxel containing `p`
    pub fn is_solid(&self, p: Vec3) -> bool {
        world_to_voxel(p).is_some_and(|voxel| self.voxel_solid(voxel))
    }

    /// First solid level-0 voxel along a ray.
    ///
    /// Returns `None` when the direction is degenerate, when the ray misses
    /// every stored brick, or when `max_iter` or `max_distance` runs out.
    pub fn ray_cast(&self, origin: Vec3, direction: Vec3, max_iter: u32, max_distance: f32) -> Option<RayHit> {
        let ray = Ray::new(origin, direction)?;
        let bounds = self.level0_bounds?;
        let (t_near, _) = ray.intersects_aabb(&bounds)?;
        if t_near > max_distance {
            return None;
        }
        traverse(&ray, max_iter, max_distance, |voxel| self.voxel_solid(voxel))
    }
}

impl std::fmt::Debug for VoxelWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoxelWorld")
            .field("bricks", &self.brick_count())
            .field("level0_bounds", &self.level0_bounds)
            .field("dirty", &self.bricks_changed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{MaterialSettings, SeedShape};
    use crate::terrain::SphereField;
    use crate::voxel::hierarchy::{BRICK_VOXELS, VOXEL_SIZE};
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;
    use std::sync::Arc;

    /// Single sphere of radius 6 centered at (8, 8, 8) inside a 4x4x4 brick region
    fn sphere_config() -> WorldConfig {
        WorldConfig {
            region: RegionConfig::new(IVec3::ZERO, IVec3::splat(4)),
            shape: SeedShape::Spheres { radius: 6.0, tile_bricks: 0 },
            ..Default::default()
        }
    }

    fn terrain_config() -> WorldConfig {
        WorldConfig {
            region: RegionConfig::new(IVec3::new(-2, -2, 0), IVec3::new(2, 2, 12)),
            ..Default::default()
        }
    }

    #[test]
    fn test_dirty_flag_protocol() {
        let mut world = VoxelWorld::create(&sphere_config()).unwrap();
        assert!(world.bricks_changed());
        // Reading does not consume
        let _ = world.brick_bitmasks();
        assert!(world.bricks_changed());
        world.mark_consumed();
        assert!(!world.bricks_changed());
        world.regenerate_brick(0).unwrap();
        assert!(world.bricks_changed());
        assert!(world.take_changed());
        assert!(!world.take_changed());
        assert!(!world.bricks_changed());
    }

    #[test]
    fn test_create_rejects_invalid_config() {
        let mut config = sphere_config();
        config.region = RegionConfig::new(IVec3::ZERO, IVec3::ZERO);
        assert!(matches!(VoxelWorld::create(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_arrays_are_aligned() {
        let world = VoxelWorld::create(&terrain_config()).unwrap();
        assert!(world.brick_count() > 0);
        assert_eq!(world.brick_bitmasks().len(), world.brick_count());
        assert_eq!(world.brick_positions().len(), world.brick_count());
        assert_eq!(world.brick_metadata().len(), world.brick_count());
        for (i, position) in world.brick_positions().iter().enumerate() {
            assert_eq!(world.brick_index(position.key()), Some(i));
            assert_eq!(world.brick_metadata()[i], BrickMetadata::from_bitmask(&world.brick_bitmasks()[i]));
            assert!(world.brick_metadata()[i].any_solid());
        }
    }

    #[test]
    fn test_is_solid_matches_density() {
        let config = terrain_config();
        let world = VoxelWorld::create(&config).unwrap();
        let field = config.field();
        let mut rng = StdRng::seed_from_u64(3);
        let min = config.region.min.as_vec3() * 4.0;
        let max = config.region.max.as_vec3() * 4.0;
        let mut solid = 0;
        for _ in 0..5000 {
            let p = Vec3::new(
                rng.gen_range(min.x..max.x),
                rng.gen_range(min.y..max.y),
                rng.gen_range(min.z..max.z),
            );
            let voxel = world_to_voxel(p).unwrap();
            let center = (voxel.as_vec3() + Vec3::splat(0.5)) * VOXEL_SIZE;
            let expected = field.density(center) < 0.0;
            assert_eq!(world.is_solid(p), expected, "{:?}", p);
            if expected {
                solid += 1;
            }
        }
        assert!(solid > 0);
    }

    #[test]
    fn test_out_of_range_queries() {
        let world = VoxelWorld::create(&sphere_config()).unwrap();
        assert!(!world.is_solid(Vec3::new(-100.0, 0.0, 0.0)));
        assert!(!world.is_solid(Vec3::new(1e9, 1e9, 1e9)));
        assert!(!world.is_solid(Vec3::splat(f32::NAN)));
        assert!(world.is_solid(Vec3::splat(8.0)));

        let empty = VoxelWorld::new(BrickGenerator::from_config(&sphere_config()));
        assert!(!empty.is_solid(Vec3::splat(8.0)));
        assert!(empty.ray_cast(Vec3::ZERO, Vec3::X, 100, 100.0).is_none());
    }

    #[test]
    fn test_ray_hits_sphere() {
        let world = VoxelWorld::create(&sphere_config()).unwrap();
        let center = Vec3::splat(8.0);
        let origin = Vec3::new(-10.0, 8.1, 8.2);
        let hit = world.ray_cast(origin, center - origin, 256, 100.0).unwrap();
        // Analytic surface distance along the ray
        let offset = origin - center;
        let b = offset.dot((center - origin).normalize());
        let analytic = -b - (b * b - offset.length_squared() + 36.0).sqrt();
        assert!((hit.distance - analytic).abs() <= VOXEL_SIZE, "{} vs {}", hit.distance, analytic);
        assert_eq!(hit.normal, IVec3::NEG_X);
        assert!(world.voxel_solid(hit.voxel));
    }

    #[test]
    fn test_diagonal_ray_normal_faces_origin() {
        let world = VoxelWorld::create(&sphere_config()).unwrap();
        let center = Vec3::splat(8.0);
        let origin = Vec3::new(20.0, 19.0, 21.0);
        let hit = world.ray_cast(origin, center - origin, 256, 100.0).unwrap();
        let analytic = (origin - center).length() - 6.0;
        assert!((hit.distance - analytic).abs() <= VOXEL_SIZE * 3.0_f32.sqrt());
        assert_eq!(hit.normal.abs().element_sum(), 1);
        assert!(hit.normal.as_vec3().dot(origin - center) > 0.0);
    }

    #[test]
    fn test_ray_misses() {
        let world = VoxelWorld::create(&sphere_config()).unwrap();
        // Pointing away from the sphere
        let origin = Vec3::new(8.0, 8.0, 15.0);
        assert!(!world.is_solid(origin));
        assert!(world.ray_cast(origin, Vec3::Z, 256, 100.0).is_none());
        // Aimed at the sphere but stopping short of its surface (12 units away)
        assert!(world.ray_cast(Vec3::new(-10.0, 8.0, 8.0), Vec3::X, 256, 5.0).is_none());
        // Degenerate direction
        assert!(world.ray_cast(Vec3::new(-10.0, 8.0, 8.0), Vec3::ZERO, 256, 100.0).is_none());
        // Never reaches the stored bricks
        assert!(world.ray_cast(Vec3::new(-10.0, 8.0, 8.0), Vec3::NEG_X, 256, 100.0).is_none());
    }

    #[test]
    fn test_ray_along_bounds_face_plane() {
        let world = VoxelWorld::create(&terrain_config()).unwrap();
        let bounds = world.level0_bounds().unwrap();
        assert_eq!(bounds.min.y, -8.0);
        assert!(world.is_solid(Vec3::new(-7.9, -8.0, 1.0)));

        let on_plane = world.ray_cast(Vec3::new(-20.0, -8.0, 1.0), Vec3::X, 256, 100.0).unwrap();
        let inside = world.ray_cast(Vec3::new(-20.0, -7.99, 1.0), Vec3::X, 256, 100.0).unwrap();
        assert_eq!(on_plane.voxel, IVec3::new(-16, -16, 2));
        assert_eq!(on_plane, inside);
        assert_eq!(on_plane.normal, IVec3::NEG_X);
        assert!((on_plane.distance - 12.0).abs() < 1e-4);

        // Lying in the bottom face plane
        assert!(world.ray_cast(Vec3::new(0.5, -20.0, 0.0), Vec3::Y, 256, 100.0).is_some());
    }

    #[test]
    fn test_ray_from_inside_solid() {
        let world = VoxelWorld::create(&sphere_config()).unwrap();
        let hit = world.ray_cast(Vec3::splat(8.0), Vec3::X, 16, 10.0).unwrap();
        assert_eq!(hit.distance, 0.0);
        assert_eq!(hit.normal, IVec3::ZERO);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut world = VoxelWorld::create(&sphere_config()).unwrap();
        let count = world.brick_count();
        let key = world.brick_key(0).unwrap();
        let replacement = GeneratedBrick {
            key,
            bitmask: BrickBitmask::EMPTY,
            metadata: BrickMetadata::EMPTY,
            hint: crate::generation::RegionHint::Empty,
        };
        assert_eq!(world.insert_brick(replacement), 0);
        assert_eq!(world.brick_count(), count);
        assert!(world.brick_bitmasks()[0].is_empty());

        // Regenerating restores the generated content
        let metadata = world.regenerate_brick(0).unwrap();
        assert!(metadata.any_solid());
        assert_eq!(world.brick_metadata()[0], metadata);
    }

    #[test]
    fn test_regenerate_out_of_range() {
        let mut world = VoxelWorld::create(&sphere_config()).unwrap();
        let count = world.brick_count();
        assert!(matches!(world.regenerate_brick(count), Err(Error::Voxel(_))));
    }

    #[test]
    fn test_attributes_are_lazy_and_stable() {
        let world = VoxelWorld::create(&terrain_config()).unwrap();
        let index = (0..world.brick_count())
            .find(|&i| !world.brick_bitmasks()[i].is_full())
            .unwrap();
        let key = world.brick_key(index).unwrap();
        let attributes = world.attributes(index).unwrap().clone();
        let direct = world.generator().generate_attributes(key, &world.brick_bitmasks()[index]);
        assert_eq!(attributes, direct);
        assert_eq!(world.attributes(index), Some(&direct));
        let bitmask = world.brick_bitmasks()[index];
        for i in (0..BRICK_VOXELS).filter(|&i| !bitmask.get(i)) {
            assert_eq!(attributes.voxels[i], 0);
        }
        assert!(world.attributes(world.brick_count()).is_none());
    }

    #[test]
    fn test_coarse_bricks_do_not_affect_point_queries() {
        let sphere = SphereField::single(Vec3::splat(8.0), 6.0);
        let mut world = VoxelWorld::new(BrickGenerator::new(Arc::new(sphere), MaterialSettings::default()));
        let stats = world.generate_keys(&[BrickKey::new(IVec3::ZERO, 2)], &CancelToken::new());
        assert_eq!(stats.with_geometry, 1);
        assert_eq!(world.brick_positions()[0].w, 2);
        assert!(world.level0_bounds().is_none());
        assert!(!world.is_solid(Vec3::splat(8.0)));
    }
}
