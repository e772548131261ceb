//! Pure helpers used by the site's content pages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A skill shown on the home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Skill {
    pub name: String,
    pub category: String,
    pub proficiency: u8,
    #[serde(default)]
    pub order_index: i32,
}

/// Derive a URL slug from a post title.
///
/// Lowercases, drops everything that is not an ASCII word character or whitespace,
/// then replaces each whitespace run with a single `-`. Leading and trailing
/// whitespace become dashes too.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut in_space = false;

    for c in lowered.chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
                in_space = true;
            }
        } else if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c);
            in_space = false;
        }
    }

    slug
}

/// Group skills by category; each group sorted by `order_index`, then name.
pub fn group_skills_by_category(skills: Vec<Skill>) -> BTreeMap<String, Vec<Skill>> {
    let mut groups: BTreeMap<String, Vec<Skill>> = BTreeMap::new();
    for skill in skills {
        groups.entry(skill.category.clone()).or_default().push(skill);
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then_with(|| a.name.cmp(&b.name))
        });
    }
    groups
}
