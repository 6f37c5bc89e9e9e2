//! Per-mesh material overrides.

use std::collections::BTreeMap;

use crate::materials::MaterialAsset;

/// Sparse mapping from submesh material index to [`MaterialAsset`].
///
/// `material_count` never decreases and is greater than the largest present
/// index, saturating at `u32::MAX` when that index is `u32::MAX` itself.
/// Cloning copies the mapping; the materials themselves are shared.
#[derive(Debug, Clone, Default)]
pub struct MaterialTable {
    materials: BTreeMap<u32, MaterialAsset>,
    material_count: u32,
}

impl MaterialTable {
    /// Empty table sized for `material_count` slots.
    pub fn new(material_count: u32) -> Self {
        Self {
            materials: BTreeMap::new(),
            material_count,
        }
    }

    /// Table holding `materials` at indices `0..materials.len()`.
    pub fn from_materials(materials: &[MaterialAsset]) -> Self {
        let mut table = Self::new(materials.len() as u32);
        for (index, material) in materials.iter().enumerate() {
            table.set_material(index as u32, material.clone());
        }
        table
    }

    /// Set the material for `index`, growing `material_count` if needed.
    pub fn set_material(&mut self, index: u32, material: MaterialAsset) {
        self.materials.insert(index, material);
        self.material_count = self.material_count.max(index.saturating_add(1));
    }

    /// Remove the material at `index`.
    ///
    /// # Panics
    ///
    /// Panics if no material is set at `index`.
    pub fn clear_material(&mut self, index: u32) {
        assert!(
            self.materials.remove(&index).is_some(),
            "no material at index {index} in material table"
        );
    }

    pub fn has_material(&self, index: u32) -> bool {
        self.materials.contains_key(&index)
    }

    pub fn material(&self, index: u32) -> Option<&MaterialAsset> {
        self.materials.get(&index)
    }

    pub fn material_count(&self) -> u32 {
        self.material_count
    }

    /// Number of indices that currently hold a material.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Remove every material. `material_count` is kept.
    pub fn clear(&mut self) {
        self.materials.clear();
    }

    /// Present entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &MaterialAsset)> {
        self.materials.iter().map(|(index, material)| (*index, material))
    }
}
