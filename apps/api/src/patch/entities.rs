//! Per-entity differs for the four resume collections. Each differ walks
//! one element pair at a given element path and derives every field path
//! from that base, so no operation can land under another collection's
//! prefix.

use crate::models::user::{Certification, Degree, Experience, Skill};
use crate::patch::diff::{diff_scalar, reconcile_list, PatchBuilder, PatchError};
use crate::patch::path::AttrPath;

pub(crate) const CERTIFICATIONS: &str = "certifications";
pub(crate) const DEGREES: &str = "degrees";
pub(crate) const EXPERIENCE: &str = "experience";
pub(crate) const SKILLS: &str = "skills";
const RESPONSIBILITIES: &str = "responsibilities";

pub(crate) fn diff_certification(
    builder: PatchBuilder,
    element: &AttrPath,
    current: &Certification,
    proposed: &Certification,
) -> Result<PatchBuilder, PatchError> {
    let builder = diff_scalar(
        builder,
        element.clone().field("name"),
        &current.name,
        &proposed.name,
    )?;
    let builder = diff_scalar(
        builder,
        element.clone().field("date_achieved"),
        &current.date_achieved,
        &proposed.date_achieved,
    )?;
    let builder = diff_scalar(
        builder,
        element.clone().field("badge_link"),
        &current.badge_link,
        &proposed.badge_link,
    )?;
    diff_scalar(
        builder,
        element.clone().field("date_expires"),
        &current.date_expires,
        &proposed.date_expires,
    )
}

pub(crate) fn diff_degree(
    builder: PatchBuilder,
    element: &AttrPath,
    current: &Degree,
    proposed: &Degree,
) -> Result<PatchBuilder, PatchError> {
    let builder = diff_scalar(
        builder,
        element.clone().field("degree"),
        &current.degree,
        &proposed.degree,
    )?;
    let builder = diff_scalar(
        builder,
        element.clone().field("major"),
        &current.major,
        &proposed.major,
    )?;
    let builder = diff_scalar(
        builder,
        element.clone().field("school"),
        &current.school,
        &proposed.school,
    )?;
    let builder = diff_scalar(
        builder,
        element.clone().field("start_year"),
        &current.start_year,
        &proposed.start_year,
    )?;
    diff_scalar(
        builder,
        element.clone().field("end_year"),
        &current.end_year,
        &proposed.end_year,
    )
}

pub(crate) fn diff_experience(
    builder: PatchBuilder,
    element: &AttrPath,
    current: &Experience,
    proposed: &Experience,
) -> Result<PatchBuilder, PatchError> {
    let builder = diff_scalar(
        builder,
        element.clone().field("company"),
        &current.company,
        &proposed.company,
    )?;
    let builder = diff_scalar(
        builder,
        element.clone().field("job_title"),
        &current.job_title,
        &proposed.job_title,
    )?;
    let builder = diff_scalar(
        builder,
        element.clone().field("start_month"),
        &current.start_month,
        &proposed.start_month,
    )?;
    let builder = diff_scalar(
        builder,
        element.clone().field("start_year"),
        &current.start_year,
        &proposed.start_year,
    )?;
    let builder = diff_scalar(
        builder,
        element.clone().field("end_month"),
        &current.end_month,
        &proposed.end_month,
    )?;
    let builder = diff_scalar(
        builder,
        element.clone().field("end_year"),
        &current.end_year,
        &proposed.end_year,
    )?;

    // Responsibility lines are themselves an ordered list, reconciled with
    // the same positional algorithm one level down.
    reconcile_list(
        builder,
        &element.clone().field(RESPONSIBILITIES),
        &current.responsibilities,
        &proposed.responsibilities,
        diff_responsibility,
    )
}

fn diff_responsibility(
    builder: PatchBuilder,
    element: &AttrPath,
    current: &String,
    proposed: &String,
) -> Result<PatchBuilder, PatchError> {
    diff_scalar(builder, element.clone(), current, proposed)
}

pub(crate) fn diff_skill(
    builder: PatchBuilder,
    element: &AttrPath,
    current: &Skill,
    proposed: &Skill,
) -> Result<PatchBuilder, PatchError> {
    let builder = diff_scalar(
        builder,
        element.clone().field("name"),
        &current.name,
        &proposed.name,
    )?;
    diff_scalar(
        builder,
        element.clone().field("years_of_experience"),
        &current.years_of_experience,
        &proposed.years_of_experience,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::diff::PatchOp;
    use serde_json::json;

    fn experience() -> Experience {
        Experience {
            company: "Co".to_string(),
            job_title: "SRE".to_string(),
            start_month: "May".to_string(),
            start_year: 2020,
            end_month: Some("June".to_string()),
            end_year: Some(2020),
            responsibilities: vec!["foo".to_string(), "bar".to_string()],
        }
    }

    #[test]
    fn test_identical_experience_emits_nothing() {
        let element = AttrPath::attr(EXPERIENCE).index(0);
        let builder = diff_experience(PatchBuilder::new(), &element, &experience(), &experience())
            .unwrap();
        assert!(builder.ops().is_empty());
    }

    #[test]
    fn test_changed_job_title_sets_element_field() {
        let element = AttrPath::attr(EXPERIENCE).index(0);
        let mut proposed = experience();
        proposed.job_title = "Platform Engineer".to_string();
        let builder =
            diff_experience(PatchBuilder::new(), &element, &experience(), &proposed).unwrap();
        assert_eq!(
            builder.ops(),
            &[PatchOp::Set {
                path: AttrPath::attr(EXPERIENCE).index(0).field("job_title"),
                value: json!("Platform Engineer"),
            }]
        );
    }

    #[test]
    fn test_dropped_responsibility_removes_nested_element() {
        let element = AttrPath::attr(EXPERIENCE).index(0);
        let mut proposed = experience();
        proposed.responsibilities = vec!["foo".to_string()];
        let builder =
            diff_experience(PatchBuilder::new(), &element, &experience(), &proposed).unwrap();
        assert_eq!(
            builder.ops(),
            &[PatchOp::Remove {
                path: AttrPath::attr(EXPERIENCE)
                    .index(0)
                    .field("responsibilities")
                    .index(1),
            }]
        );
    }

    #[test]
    fn test_new_responsibility_adds_nested_element() {
        let element = AttrPath::attr(EXPERIENCE).index(1);
        let mut proposed = experience();
        proposed.responsibilities.push("baz".to_string());
        let builder =
            diff_experience(PatchBuilder::new(), &element, &experience(), &proposed).unwrap();
        assert_eq!(
            builder.ops(),
            &[PatchOp::Add {
                path: AttrPath::attr(EXPERIENCE)
                    .index(1)
                    .field("responsibilities")
                    .index(2),
                value: json!("baz"),
            }]
        );
    }

    #[test]
    fn test_skill_years_cleared_sets_null() {
        let element = AttrPath::attr(SKILLS).index(0);
        let current = Skill {
            name: "Rust".to_string(),
            years_of_experience: Some(3),
        };
        let proposed = Skill {
            name: "Rust".to_string(),
            years_of_experience: None,
        };
        let builder = diff_skill(PatchBuilder::new(), &element, &current, &proposed).unwrap();
        assert_eq!(
            builder.ops(),
            &[PatchOp::Set {
                path: AttrPath::attr(SKILLS).index(0).field("years_of_experience"),
                value: json!(null),
            }]
        );
    }
}
