//! Cross-source identity resolution.
//!
//! Same-named skills discovered under different platforms and custom paths
//! collapse into one group per name, with a deterministic representative.
//! This is a pure function over the loaded skill set: no IO, so it stays
//! unit-testable without a filesystem.

use std::collections::BTreeSet;

use crate::types::{LocalSkillGroup, PlatformSource, Skill};

/// Group a (possibly filtered) view of skills by name.
///
/// `visible` drives which names appear and which members are eligible as
/// representatives; `all` is the full unfiltered set, consulted so platform
/// membership badges and delete ids stay accurate under filtering. Filtering
/// must happen before grouping when platform purity is required — a filtered
/// `visible` never lets excluded members leak back into representative
/// selection.
pub fn group_skills(visible: &[Skill], all: &[Skill]) -> Vec<LocalSkillGroup> {
    group_skills_with_preference(
        visible,
        all,
        &PlatformSource::PREFERENCE.map(PlatformSource::storage_key),
    )
}

/// Grouping with an explicit representative preference order of storage keys.
pub fn group_skills_with_preference(
    visible: &[Skill],
    all: &[Skill],
    preference: &[&str],
) -> Vec<LocalSkillGroup> {
    // Partition by name, preserving first-encounter order within a name.
    let mut names: Vec<&str> = Vec::new();
    for skill in visible {
        if !names.contains(&skill.name.as_str()) {
            names.push(&skill.name);
        }
    }

    let mut groups: Vec<LocalSkillGroup> = names
        .into_iter()
        .map(|name| {
            let members: Vec<&Skill> = visible.iter().filter(|s| s.name == name).collect();
            let representative = select_representative(&members, preference);

            let installed_platforms: BTreeSet<String> = all
                .iter()
                .filter(|s| s.name == name && !s.is_custom())
                .map(|s| s.source_key.clone())
                .collect();
            let delete_ids: Vec<String> = all
                .iter()
                .filter(|s| s.name == name)
                .map(|s| s.id.clone())
                .collect();

            LocalSkillGroup {
                id: name.to_string(),
                skill: representative.clone(),
                installed_platforms,
                delete_ids,
            }
        })
        .collect();

    groups.sort_by(|a, b| {
        a.skill
            .display_name
            .to_lowercase()
            .cmp(&b.skill.display_name.to_lowercase())
    });
    groups
}

/// First preference-order match, falling back to the first-encountered member.
fn select_representative<'a>(members: &[&'a Skill], preference: &[&str]) -> &'a Skill {
    for key in preference {
        if let Some(found) = members.iter().find(|s| s.source_key == *key) {
            return found;
        }
    }
    members[0]
}
