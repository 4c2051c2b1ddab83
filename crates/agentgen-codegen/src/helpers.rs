use crate::error::{CodegenError, Result};
use crate::transform::TransformHelper;
use std::collections::HashMap;

/// File-scoped helper list in order of first sighting. A name maps to exactly
/// one signature; Go rejects a second declaration of the same function.
#[derive(Debug, Default)]
pub struct HelperSet {
    signatures: HashMap<String, (String, String)>,
    helpers: Vec<TransformHelper>,
}

impl HelperSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Ok(false)` when an equivalent helper is already present.
    pub fn insert(&mut self, helper: TransformHelper) -> Result<bool> {
        if let Some((param, result)) = self.signatures.get(&helper.name) {
            if *param == helper.param_type_ref && *result == helper.result_type_ref {
                return Ok(false);
            }
            return Err(CodegenError::HelperNameConflict {
                name: helper.name.clone(),
                existing: format!("func({param}) {result}"),
                requested: format!("func({}) {}", helper.param_type_ref, helper.result_type_ref),
            });
        }
        self.signatures.insert(
            helper.name.clone(),
            (helper.param_type_ref.clone(), helper.result_type_ref.clone()),
        );
        self.helpers.push(helper);
        Ok(true)
    }

    pub fn extend(&mut self, helpers: impl IntoIterator<Item = TransformHelper>) -> Result<()> {
        for helper in helpers {
            self.insert(helper)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }

    pub fn into_vec(self) -> Vec<TransformHelper> {
        self.helpers
    }
}
