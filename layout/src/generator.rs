//! Seeded random generation of valid shader interfaces.
//!
//! The same seed, features and limits always produce the same interface.

use bitflags::bitflags;
use log::debug;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::LayoutResult;
use crate::flags::LayoutFlags;
use crate::interface::{BufferVar, ShaderInterface};
use crate::types::{BasicType, ScalarKind, VarType};

bitflags! {
    /// Language features the generator may use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u32 {
        /// Vector types.
        const VECTORS = 1 << 0;
        /// Matrix types.
        const MATRICES = 1 << 1;
        /// Sized arrays.
        const ARRAYS = 1 << 2;
        /// Structs as block members.
        const STRUCTS = 1 << 3;
        /// Structs inside structs.
        const NESTED_STRUCTS = 1 << 4;
        /// Instanced block arrays.
        const INSTANCE_ARRAYS = 1 << 5;
        /// Runtime-sized trailing arrays.
        const UNSIZED_ARRAYS = 1 << 6;
        /// Arrays of arrays.
        const ARRAYS_OF_ARRAYS = 1 << 7;
        /// std140 blocks.
        const STD140 = 1 << 8;
        /// std430 blocks.
        const STD430 = 1 << 9;
        /// Shared blocks.
        const SHARED = 1 << 10;
        /// Packed blocks.
        const PACKED = 1 << 11;
        /// Explicit row- and column-major qualifiers.
        const MATRIX_LAYOUT = 1 << 12;
        /// Read-only and write-only variables.
        const ACCESS = 1 << 13;
    }
}

impl Default for Features {
    fn default() -> Self {
        Self::all()
    }
}

/// Upper bounds on the size of generated interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneratorLimits {
    pub max_blocks: u32,
    pub max_instances: u32,
    pub max_block_members: u32,
    pub max_struct_members: u32,
    pub max_struct_depth: u32,
    pub max_array_length: u32,
}

impl Default for GeneratorLimits {
    fn default() -> Self {
        Self {
            max_blocks: 4,
            max_instances: 3,
            max_block_members: 5,
            max_struct_members: 4,
            max_struct_depth: 2,
            max_array_length: 8,
        }
    }
}

/// Generates random interfaces from a seed.
#[derive(Debug, Clone)]
pub struct InterfaceGenerator {
    rng: ChaCha8Rng,
    features: Features,
    limits: GeneratorLimits,
    struct_count: usize,
    var_count: usize,
}

impl InterfaceGenerator {
    pub fn new(seed: u64, features: Features) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            features,
            limits: GeneratorLimits::default(),
            struct_count: 0,
            var_count: 0,
        }
    }

    /// Set size limits. Zero counts are treated as 1, except the struct depth.
    pub fn with_limits(mut self, limits: GeneratorLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn features(&self) -> Features {
        self.features
    }

    /// Generate the next interface.
    pub fn generate(&mut self) -> LayoutResult<ShaderInterface> {
        let mut interface = ShaderInterface::new();
        self.struct_count = 0;
        self.var_count = 0;

        let num_blocks = self.rng.gen_range(1..=self.limits.max_blocks.max(1));
        for index in 0..num_blocks {
            self.generate_block(&mut interface, index)?;
        }
        debug!(
            "Generated interface with {} blocks and {} structs",
            interface.block_count(),
            self.struct_count
        );
        Ok(interface)
    }

    fn generate_block(&mut self, interface: &mut ShaderInterface, index: u32) -> LayoutResult<()> {
        let packings: Vec<LayoutFlags> = [
            (Features::STD140, LayoutFlags::STD140),
            (Features::STD430, LayoutFlags::STD430),
            (Features::SHARED, LayoutFlags::SHARED),
            (Features::PACKED, LayoutFlags::PACKED),
        ]
        .into_iter()
        .filter(|(feature, _)| self.features.contains(*feature))
        .map(|(_, flag)| flag)
        .collect();
        let mut flags = packings
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_else(LayoutFlags::empty);
        if self.features.contains(Features::MATRIX_LAYOUT) && self.rng.gen_bool(0.5) {
            flags |= self.majorness();
        }

        let instanced =
            self.features.contains(Features::INSTANCE_ARRAYS) && self.rng.gen_ratio(1, 3);
        let array_size = if instanced {
            self.rng.gen_range(1..=self.limits.max_instances.max(1))
        } else {
            0
        };

        let num_members = self.rng.gen_range(1..=self.limits.max_block_members.max(1));
        let mut members = Vec::with_capacity(num_members as usize);
        for member in 0..num_members {
            let mut ty = self.generate_type(interface, 0, true)?;
            let is_last = member + 1 == num_members;
            if is_last
                && self.features.contains(Features::UNSIZED_ARRAYS)
                && self.rng.gen_ratio(1, 3)
                && (!ty.is_array() || self.features.contains(Features::ARRAYS_OF_ARRAYS))
            {
                ty = VarType::unsized_array(ty);
            }

            let mut var_flags = self.access();
            if self.features.contains(Features::MATRIX_LAYOUT) && self.rng.gen_ratio(1, 4) {
                var_flags |= self.majorness();
            }
            members.push(BufferVar::new(format!("var{}", self.var_count), ty, var_flags));
            self.var_count += 1;
        }

        let handle = interface.alloc_block(format!("Block{index}"))?;
        let instance_named = array_size > 0 || self.rng.gen_bool(0.5);
        let block = interface.block_mut(handle)?;
        block.set_flags(flags);
        block.set_array_size(array_size);
        if instance_named {
            block.set_instance_name(format!("block{index}"));
        }
        for member in members {
            block.add_member(member);
        }
        if block.has_unsized_array() {
            for instance in 0..block.instance_count() {
                let len = self.rng.gen_range(0..=self.limits.max_array_length.max(1));
                block.set_last_unsized_array_size(instance, len)?;
            }
        }
        Ok(())
    }

    fn generate_type(
        &mut self,
        interface: &mut ShaderInterface,
        struct_depth: u32,
        array_ok: bool,
    ) -> LayoutResult<VarType> {
        let struct_ok = self.features.contains(Features::STRUCTS)
            && struct_depth < self.limits.max_struct_depth
            && (struct_depth == 0 || self.features.contains(Features::NESTED_STRUCTS));
        let array_ok = array_ok && self.features.contains(Features::ARRAYS);

        let roll = self.rng.gen_range(0..10);
        if struct_ok && roll < 2 {
            self.generate_struct(interface, struct_depth)
        } else if array_ok && roll < 5 {
            let nested_ok = self.features.contains(Features::ARRAYS_OF_ARRAYS);
            let element = self.generate_type(interface, struct_depth, nested_ok)?;
            let size = self.rng.gen_range(1..=self.limits.max_array_length.max(1));
            Ok(VarType::array(element, size))
        } else {
            Ok(self.generate_basic_type().into())
        }
    }

    /// Members are generated first so that nested structs are registered
    /// before the struct that uses them.
    fn generate_struct(
        &mut self,
        interface: &mut ShaderInterface,
        struct_depth: u32,
    ) -> LayoutResult<VarType> {
        let num_members = self.rng.gen_range(1..=self.limits.max_struct_members.max(1));
        let mut members = Vec::with_capacity(num_members as usize);
        for member in 0..num_members {
            let ty = self.generate_type(interface, struct_depth + 1, true)?;
            members.push((format!("m{member}"), ty));
        }

        let name = format!("S{}", self.struct_count);
        self.struct_count += 1;
        let handle = interface.alloc_struct(name.as_str())?;
        for (member, ty) in members {
            interface.add_struct_member(handle, member, ty)?;
        }
        Ok(VarType::structure(name))
    }

    fn generate_basic_type(&mut self) -> BasicType {
        let vectors = self.features.contains(Features::VECTORS);
        let matrices = self.features.contains(Features::MATRICES);
        let roll = self.rng.gen_range(0..3);
        if matrices && (roll == 0 || (roll == 1 && !vectors)) {
            let columns = self.rng.gen_range(2..=4);
            let rows = self.rng.gen_range(2..=4);
            return BasicType::mat(columns, rows);
        }

        let kind = ScalarKind::ALL[self.rng.gen_range(0..ScalarKind::ALL.len())];
        if vectors && roll != 2 {
            BasicType::vec(kind, self.rng.gen_range(2..=4))
        } else {
            BasicType::Scalar(kind)
        }
    }

    fn majorness(&mut self) -> LayoutFlags {
        if self.rng.gen_bool(0.5) {
            LayoutFlags::ROW_MAJOR
        } else {
            LayoutFlags::COLUMN_MAJOR
        }
    }

    fn access(&mut self) -> LayoutFlags {
        if !self.features.contains(Features::ACCESS) {
            return LayoutFlags::ACCESS_MASK;
        }
        match self.rng.gen_range(0..3) {
            0 => LayoutFlags::ACCESS_READ,
            1 => LayoutFlags::ACCESS_WRITE,
            _ => LayoutFlags::ACCESS_MASK,
        }
    }
}
