use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::user::User;
use crate::patch::diff::{
    diff_scalar, marshal, reconcile_list, PatchBuilder, PatchError, PatchOp,
};
use crate::patch::entities::{
    diff_certification, diff_degree, diff_experience, diff_skill, CERTIFICATIONS, DEGREES,
    EXPERIENCE, SKILLS,
};
use crate::patch::path::AttrPath;
use crate::patch::placeholder::PlaceholderTable;

const LAST_UPDATED: &str = "last_updated";

/// A Set clause entry: `name = value`, both as placeholder tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOp {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoveOp {
    pub name: String,
}

/// An Add clause entry. The name token addresses the element at its final
/// index, the value token carries the full element. Gateways translate
/// these into their store's list-append primitive; the index exists so the
/// operation count and ordering stay observable.
#[derive(Debug, Clone, PartialEq)]
pub struct AddOp {
    pub name: String,
    pub value: String,
}

/// The compiled patch handed to the storage gateway. Clauses are grouped in
/// fixed SET, REMOVE, ADD order; stores that concatenate clause text depend
/// on that ordering, so it is part of the contract.
#[derive(Debug, Clone)]
pub struct Patch {
    /// name token -> rendered attribute path
    pub names: BTreeMap<String, String>,
    /// value token -> payload
    pub values: BTreeMap<String, Value>,
    pub set_ops: Vec<SetOp>,
    pub remove_ops: Vec<RemoveOp>,
    pub add_ops: Vec<AddOp>,
}

/// Compiles the minimal patch transforming `current` into `proposed`.
///
/// Always emits one Set for the `last_updated` timestamp, then at most one
/// Set per changed scalar field, then the positional reconciliation of the
/// four collections. Pure: the only failure mode is marshalling a value.
pub fn compile_patch(
    current: &User,
    proposed: &User,
    now: DateTime<Utc>,
) -> Result<Patch, PatchError> {
    let timestamp_path = AttrPath::attr(LAST_UPDATED);
    let timestamp = marshal(&timestamp_path, &now)?;
    let mut builder = PatchBuilder::new().set(timestamp_path, timestamp);

    builder = diff_scalar(builder, AttrPath::attr("email"), &current.email, &proposed.email)?;
    builder = diff_scalar(
        builder,
        AttrPath::attr("github"),
        &current.github,
        &proposed.github,
    )?;
    builder = diff_scalar(
        builder,
        AttrPath::attr("given_name"),
        &current.given_name,
        &proposed.given_name,
    )?;
    builder = diff_scalar(
        builder,
        AttrPath::attr("location"),
        &current.location,
        &proposed.location,
    )?;
    builder = diff_scalar(
        builder,
        AttrPath::attr("linkedin"),
        &current.linkedin,
        &proposed.linkedin,
    )?;
    builder = diff_scalar(
        builder,
        AttrPath::attr("phone_number"),
        &current.phone_number,
        &proposed.phone_number,
    )?;
    builder = diff_scalar(
        builder,
        AttrPath::attr("summary"),
        &current.summary,
        &proposed.summary,
    )?;
    builder = diff_scalar(
        builder,
        AttrPath::attr("sur_name"),
        &current.sur_name,
        &proposed.sur_name,
    )?;

    builder = reconcile_list(
        builder,
        &AttrPath::attr(CERTIFICATIONS),
        &current.certifications,
        &proposed.certifications,
        diff_certification,
    )?;
    builder = reconcile_list(
        builder,
        &AttrPath::attr(DEGREES),
        &current.degrees,
        &proposed.degrees,
        diff_degree,
    )?;
    builder = reconcile_list(
        builder,
        &AttrPath::attr(EXPERIENCE),
        &current.experience,
        &proposed.experience,
        diff_experience,
    )?;
    builder = reconcile_list(
        builder,
        &AttrPath::attr(SKILLS),
        &current.skills,
        &proposed.skills,
        diff_skill,
    )?;

    Ok(assemble(builder.into_ops()))
}

/// Folds raw operations into the clause structure, allocating placeholder
/// tokens along the way. Operation order within each clause follows
/// emission order.
fn assemble(ops: Vec<PatchOp>) -> Patch {
    let mut table = PlaceholderTable::new();
    let mut set_ops = Vec::new();
    let mut remove_ops = Vec::new();
    let mut add_ops = Vec::new();

    for op in ops {
        match op {
            PatchOp::Set { path, value } => {
                let name = table.name_token(&path);
                let value = table.value_token(value);
                set_ops.push(SetOp { name, value });
            }
            PatchOp::Remove { path } => {
                let name = table.name_token(&path);
                remove_ops.push(RemoveOp { name });
            }
            PatchOp::Add { path, value } => {
                let name = table.name_token(&path);
                let value = table.value_token(value);
                add_ops.push(AddOp { name, value });
            }
        }
    }

    let (names, values) = table.into_maps();
    Patch {
        names,
        values,
        set_ops,
        remove_ops,
        add_ops,
    }
}
