use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::patch::path::AttrPath;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to marshal value at '{path}': {source}")]
    Marshal {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One mutation against the stored record. Produced transiently per diff
/// call and consumed by the assembler; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    Set { path: AttrPath, value: Value },
    Remove { path: AttrPath },
    Add { path: AttrPath, value: Value },
}

/// Accumulator for patch operations. Every diff step consumes the builder
/// and returns a new one, so steps compose without mutating anything
/// through a side channel.
#[derive(Debug, Default)]
pub struct PatchBuilder {
    ops: Vec<PatchOp>,
}

impl PatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: AttrPath, value: Value) -> Self {
        self.ops.push(PatchOp::Set { path, value });
        self
    }

    pub fn remove(mut self, path: AttrPath) -> Self {
        self.ops.push(PatchOp::Remove { path });
        self
    }

    pub fn add(mut self, path: AttrPath, value: Value) -> Self {
        self.ops.push(PatchOp::Add { path, value });
        self
    }

    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<PatchOp> {
        self.ops
    }
}

pub(crate) fn marshal<T: Serialize>(path: &AttrPath, value: &T) -> Result<Value, PatchError> {
    serde_json::to_value(value).map_err(|source| PatchError::Marshal {
        path: path.to_string(),
        source,
    })
}

/// Compares one field of the current and proposed records. Equality is
/// exact; a changed field is replaced wholesale with a single Set.
pub fn diff_scalar<T>(
    builder: PatchBuilder,
    path: AttrPath,
    current: &T,
    proposed: &T,
) -> Result<PatchBuilder, PatchError>
where
    T: PartialEq + Serialize,
{
    if current == proposed {
        return Ok(builder);
    }
    let value = marshal(&path, proposed)?;
    Ok(builder.set(path, value))
}

/// Positional reconciliation of two ordered sequences rooted at `base`.
///
/// Overlapping indices are handed to `differ` at path `base[idx]`; indices
/// present only in `current` become Removes; indices present only in
/// `proposed` become Adds carrying the marshalled full element. There is no
/// content-based matching: swapping two elements yields two Sets, not a
/// no-op.
pub fn reconcile_list<T, F>(
    mut builder: PatchBuilder,
    base: &AttrPath,
    current: &[T],
    proposed: &[T],
    differ: F,
) -> Result<PatchBuilder, PatchError>
where
    T: Serialize,
    F: Fn(PatchBuilder, &AttrPath, &T, &T) -> Result<PatchBuilder, PatchError>,
{
    for (idx, current_element) in current.iter().enumerate() {
        if idx < proposed.len() {
            let element = base.clone().index(idx);
            builder = differ(builder, &element, current_element, &proposed[idx])?;
        } else {
            builder = builder.remove(base.clone().index(idx));
        }
    }
    for idx in current.len()..proposed.len() {
        let element = base.clone().index(idx);
        let value = marshal(&element, &proposed[idx])?;
        builder = builder.add(element, value);
    }
    Ok(builder)
}
