//! Common utilities for layout integration tests.
//!
//! Builders for small hand-written interfaces and helpers for editing a
//! reported layout the way a faulty implementation would.

#![allow(dead_code)]

use ssbo_layout::{
    BufferLayout, BufferVar, BufferVarLayoutEntry, CaseConfig, LayoutCase, LayoutComputer,
    LayoutFlags, ReferenceLayout, ShaderInterface, VarType,
};

// ============================================================================
// Interface Builders
// ============================================================================

/// A read-write member.
pub fn var(name: &str, ty: impl Into<VarType>) -> BufferVar {
    BufferVar::new(name, ty, LayoutFlags::ACCESS_MASK)
}

/// A member with explicit qualifiers.
pub fn var_with(name: &str, ty: impl Into<VarType>, flags: LayoutFlags) -> BufferVar {
    BufferVar::new(name, ty, flags)
}

/// Add a block to `interface`.
pub fn add_block(
    interface: &mut ShaderInterface,
    name: &str,
    instance_name: Option<&str>,
    flags: LayoutFlags,
    members: Vec<BufferVar>,
) {
    let handle = interface.alloc_block(name).unwrap();
    let block = interface.block_mut(handle).unwrap();
    block.set_flags(flags);
    if let Some(instance_name) = instance_name {
        block.set_instance_name(instance_name);
    }
    for member in members {
        block.add_member(member);
    }
}

/// An interface with one unnamed-instance block called `Block`.
pub fn single_block(flags: LayoutFlags, members: Vec<BufferVar>) -> ShaderInterface {
    let mut interface = ShaderInterface::new();
    add_block(&mut interface, "Block", None, flags, members);
    interface
}

/// An interface with one block whose last member is runtime-sized.
pub fn single_unsized_block(
    flags: LayoutFlags,
    members: Vec<BufferVar>,
    unsized_len: u32,
) -> ShaderInterface {
    let mut interface = single_block(flags, members);
    let handle = interface.block_handles().next().unwrap();
    interface
        .block_mut(handle)
        .unwrap()
        .set_last_unsized_array_size(0, unsized_len)
        .unwrap();
    interface
}

// ============================================================================
// Layout Helpers
// ============================================================================

/// Compute the reference layout, panicking on an illegal interface.
pub fn compute(interface: &ShaderInterface) -> ReferenceLayout {
    LayoutComputer::new(interface).compute().unwrap()
}

/// Find a variable entry by full name.
pub fn entry<'a>(layout: &'a BufferLayout, name: &str) -> &'a BufferVarLayoutEntry {
    let index = layout
        .variable_index(name)
        .unwrap_or_else(|| panic!("no variable named {name} in\n{layout}"));
    &layout.buffer_vars[index]
}

/// Find a variable entry by full name for modification.
pub fn entry_mut<'a>(layout: &'a mut BufferLayout, name: &str) -> &'a mut BufferVarLayoutEntry {
    let index = layout.variable_index(name).unwrap();
    &mut layout.buffer_vars[index]
}

/// Drop a variable from a layout, keeping the remaining indices consistent.
pub fn remove_variable(layout: &mut BufferLayout, name: &str) {
    let removed = layout.variable_index(name).unwrap();
    layout.buffer_vars.remove(removed);
    for block in &mut layout.blocks {
        block.active_var_indices.retain(|&index| index != removed);
        for index in &mut block.active_var_indices {
            if *index > removed {
                *index -= 1;
            }
        }
    }
}

/// Build a case with the given config.
pub fn case(interface: ShaderInterface, config: CaseConfig) -> LayoutCase {
    LayoutCase::new("test", interface, config).unwrap()
}
