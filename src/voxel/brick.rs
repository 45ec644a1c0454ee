//! 8x8x8 bitmask brick and the metadata derived from it

use bytemuck::{Pod, Zeroable};
use glam::{IVec3, UVec3};

use super::hierarchy::{voxel_index, BrickKey, BITMASK_WORDS, BRICK_SIZE, BRICK_VOXELS};

/// One bit per voxel (1 = solid), 64 bytes. Renderer-facing layout.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct BrickBitmask {
    pub words: [u32; BITMASK_WORDS],
}

impl BrickBitmask {
    /// All voxels empty
    pub const EMPTY: BrickBitmask = BrickBitmask { words: [0; BITMASK_WORDS] };

    /// All voxels solid
    pub const FULL: BrickBitmask = BrickBitmask { words: [u32::MAX; BITMASK_WORDS] };

    /// Get bit at brick-local linear index
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        self.words[index >> 5] & (1 << (index & 31)) != 0
    }

    /// Set bit at brick-local linear index
    #[inline]
    pub fn set(&mut self, index: usize, solid: bool) {
        let bit = 1 << (index & 31);
        if solid {
            self.words[index >> 5] |= bit;
        } else {
            self.words[index >> 5] &= !bit;
        }
    }

    /// Get bit at local coordinates (0-7 each axis)
    #[inline]
    pub fn is_solid(&self, local: UVec3) -> bool {
        self.get(voxel_index(local.x, local.y, local.z))
    }

    /// Number of solid voxels
    pub fn count_solid(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Check if all voxels are empty
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Check if all voxels are solid
    pub fn is_full(&self) -> bool {
        self.words.iter().all(|&w| w == u32::MAX)
    }
}

impl Default for BrickBitmask {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Brick position as consumed by the renderer: `(bx, by, bz, w)`.
/// `w` is reserved and carries the LOD level.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct BrickPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub w: i32,
}

impl BrickPosition {
    pub fn from_key(key: BrickKey) -> Self {
        Self {
            x: key.coord.x,
            y: key.coord.y,
            z: key.coord.z,
            w: key.level as i32,
        }
    }

    pub fn key(&self) -> BrickKey {
        BrickKey::new(IVec3::new(self.x, self.y, self.z), self.w.max(0) as u32)
    }
}

/// Brick face directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    NegX,
    PosX,
    NegY,
    PosY,
    NegZ,
    PosZ,
}

impl Face {
    pub const ALL: [Face; 6] = [Face::NegX, Face::PosX, Face::NegY, Face::PosY, Face::NegZ, Face::PosZ];

    /// Axis index (0 = x, 1 = y, 2 = z)
    pub fn axis(self) -> usize {
        match self {
            Face::NegX | Face::PosX => 0,
            Face::NegY | Face::PosY => 1,
            Face::NegZ | Face::PosZ => 2,
        }
    }

    /// Outward normal
    pub fn normal(self) -> IVec3 {
        match self {
            Face::NegX => IVec3::NEG_X,
            Face::PosX => IVec3::X,
            Face::NegY => IVec3::NEG_Y,
            Face::PosY => IVec3::Y,
            Face::NegZ => IVec3::NEG_Z,
            Face::PosZ => IVec3::Z,
        }
    }

    /// Local coordinate of the boundary layer on this face's axis
    pub fn layer(self) -> u32 {
        match self {
            Face::NegX | Face::NegY | Face::NegZ => 0,
            Face::PosX | Face::PosY | Face::PosZ => BRICK_SIZE - 1,
        }
    }

    fn bit(self) -> u32 {
        1 << (1 + self as u32)
    }

    /// Local coordinates of every voxel in this face's boundary layer
    pub fn layer_voxels(self) -> impl Iterator<Item = UVec3> {
        let axis = self.axis();
        let layer = self.layer();
        (0..BRICK_SIZE).flat_map(move |a| {
            (0..BRICK_SIZE).map(move |b| match axis {
                0 => UVec3::new(layer, a, b),
                1 => UVec3::new(a, layer, b),
                _ => UVec3::new(a, b, layer),
            })
        })
    }
}

/// Brick summary bits: bit 0 is "any voxel solid", bits 1-6 are
/// "boundary layer fully empty" for each [`Face`] in `Face::ALL` order.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct BrickMetadata(pub u32);

impl BrickMetadata {
    pub const ANY_SOLID: u32 = 1 << 0;
    pub const ALL_FACES_EMPTY: u32 = 0b111_1110;

    /// Metadata of an all-empty brick
    pub const EMPTY: BrickMetadata = BrickMetadata(Self::ALL_FACES_EMPTY);

    /// Metadata of an all-solid brick
    pub const FULL: BrickMetadata = BrickMetadata(Self::ANY_SOLID);

    /// Derive metadata from a bitmask
    pub fn from_bitmask(bitmask: &BrickBitmask) -> Self {
        let mut bits = 0;
        if !bitmask.is_empty() {
            bits |= Self::ANY_SOLID;
        }
        for face in Face::ALL {
            if face.layer_voxels().all(|v| !bitmask.is_solid(v)) {
                bits |= face.bit();
            }
        }
        Self(bits)
    }

    /// True if at least one voxel is solid
    pub fn any_solid(&self) -> bool {
        self.0 & Self::ANY_SOLID != 0
    }

    /// True if the boundary layer on `face` has no solid voxel
    pub fn face_empty(&self, face: Face) -> bool {
        self.0 & face.bit() != 0
    }
}

/// Packed per-voxel attributes (see [`crate::voxel::codec::pack_voxel`]),
/// valid only where the bitmask bit is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrickAttributes {
    pub voxels: Box<[u32; BRICK_VOXELS]>,
}

impl BrickAttributes {
    pub fn new() -> Self {
        Self { voxels: Box::new([0; BRICK_VOXELS]) }
    }

    pub fn get(&self, local: UVec3) -> u32 {
        self.voxels[voxel_index(local.x, local.y, local.z)]
    }
}

impl Default for BrickAttributes {
    fn default() -> Self {
        Self::new()
    }
}
