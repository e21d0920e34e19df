// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static model catalog, loaded at startup and read-only at request time.

use std::collections::HashMap;

use modelgate_core::{ModelDescriptor, TierSet};
use serde::{Deserialize, Serialize};

/// Model id without any `provider/` prefix.
pub fn bare_model_id(id: &str) -> &str {
    id.rsplit_once('/').map_or(id, |(_, bare)| bare)
}

/// Whether two ids name the same model, ignoring provider prefixes and case.
pub fn same_model(a: &str, b: &str) -> bool {
    bare_model_id(a).eq_ignore_ascii_case(bare_model_id(b))
}

/// A model the caller can dispatch to, as seen by affinity selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AvailableModel {
    pub id: String,
    pub provider_id: String,
}

impl AvailableModel {
    pub fn new(id: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider_id: provider_id.into(),
        }
    }
}

impl From<&ModelDescriptor> for AvailableModel {
    fn from(model: &ModelDescriptor) -> Self {
        Self::new(model.id.clone(), model.provider_id.clone())
    }
}

/// Indexed model catalog.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
    by_id: HashMap<String, usize>,
}

impl ModelCatalog {
    /// Build from descriptors. Later duplicates of an id are ignored.
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        let mut by_id = HashMap::with_capacity(models.len());
        let mut unique = Vec::with_capacity(models.len());
        for model in models {
            if by_id.contains_key(&model.id) {
                continue;
            }
            by_id.insert(model.id.clone(), unique.len());
            unique.push(model);
        }
        Self {
            models: unique,
            by_id,
        }
    }

    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.by_id.get(id).map(|&i| &self.models[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// All descriptors in catalog order.
    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Catalog entries whose tier is in `tiers`, in catalog order.
    pub fn in_tiers<'a>(
        &'a self,
        tiers: &'a TierSet,
    ) -> impl Iterator<Item = &'a ModelDescriptor> + 'a {
        self.models.iter().filter(move |m| tiers.contains(m.tier))
    }

    /// Entitlement-filtered available set for affinity selection.
    pub fn available_for(&self, tiers: &TierSet) -> Vec<AvailableModel> {
        self.in_tiers(tiers).map(AvailableModel::from).collect()
    }
}
