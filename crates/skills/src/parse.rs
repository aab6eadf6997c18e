//! Manifest metadata extraction.
//!
//! A SKILL.md carries `name`/`description` either in a `---`-delimited front
//! matter block or, failing that, as the first markdown heading and the first
//! body line after it. Malformed manifests never error; missing fields stay
//! `None` and callers substitute defaults.

/// Title/description pair extracted from manifest text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Extract metadata from raw manifest text.
///
/// Front-matter fields are never overwritten by the markdown fallback; the
/// fallback only fills fields the front matter did not provide.
pub fn parse_manifest(text: &str) -> ManifestMetadata {
    let mut meta = front_matter_fields(text);
    if meta.name.is_none() || meta.description.is_none() {
        let fallback = markdown_fallback(text);
        if meta.name.is_none() {
            meta.name = fallback.name;
        }
        if meta.description.is_none() {
            meta.description = fallback.description;
        }
    }
    meta
}

/// Scan a leading `---` block for `name:`/`description:` pairs.
///
/// Lines split on the first colon; values are trimmed of whitespace and
/// surrounding quotes. Anything unparsable is skipped, not an error.
fn front_matter_fields(text: &str) -> ManifestMetadata {
    let mut meta = ManifestMetadata::default();
    let mut lines = text.lines();
    match lines.next() {
        Some(first) if first.trim() == "---" => {},
        _ => return meta,
    }

    for line in lines {
        if line.trim() == "---" {
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "name" => {
                if meta.name.is_none() {
                    meta.name = Some(value.to_string());
                }
            },
            "description" => {
                if meta.description.is_none() {
                    meta.description = Some(value.to_string());
                }
            },
            _ => {},
        }
    }
    meta
}

/// Fallback extraction: first `# ` heading as the title stem, first non-empty
/// non-heading line after it as the description.
fn markdown_fallback(text: &str) -> ManifestMetadata {
    let mut meta = ManifestMetadata::default();
    let mut in_front_matter = false;
    let mut first_line = true;
    let mut seen_heading = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if first_line {
            first_line = false;
            if trimmed == "---" {
                in_front_matter = true;
                continue;
            }
        }
        if in_front_matter {
            if trimmed == "---" {
                in_front_matter = false;
            }
            continue;
        }

        if !seen_heading {
            if let Some(stem) = trimmed.strip_prefix("# ") {
                meta.name = Some(stem.trim().to_string());
                seen_heading = true;
            }
            continue;
        }

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        meta.description = Some(trimmed.to_string());
        break;
    }
    meta
}

/// The single display-formatting rule: `-`/`_` become spaces, then each word
/// is capitalized. Used everywhere a raw slug becomes a title.
pub fn title_case(slug: &str) -> String {
    slug.replace(['-', '_'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
