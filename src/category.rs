//! Category inference and overrides.
//!
//! A controller's category comes from the module that owns it when the source
//! model knows one, and otherwise from its file location. Configured mappings
//! can then replace inferred categories.

use crate::extractor::ControllerDescriptor;
use heck::ToTitleCase;
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::OnceLock;

/// Label of controllers without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Directory names describing the artifact kind rather than a domain
pub const DEFAULT_ARTIFACT_DIRS: &[&str] = &["controllers", "controller", "handlers", "routes"];

/// Generic source anchors, most specific first
const SOURCE_ANCHORS: &[&str] = &["src/modules/", "src/api/", "src/"];

/// Derives categories from source locations.
#[derive(Debug, Clone)]
pub struct PathHeuristic {
    source_root: Option<String>,
    artifact_dirs: Vec<String>,
}

impl Default for PathHeuristic {
    fn default() -> Self {
        Self {
            source_root: None,
            artifact_dirs: DEFAULT_ARTIFACT_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl PathHeuristic {
    pub fn new(source_root: Option<String>, artifact_dirs: Vec<String>) -> Self {
        Self {
            source_root: source_root
                .map(|root| root.replace('\\', "/").trim_matches('/').to_string())
                .filter(|root| !root.is_empty()),
            artifact_dirs,
        }
    }

    /// Category of a controller declared at `path`.
    ///
    /// The configured source root is stripped first, then everything up to a
    /// `vN/` segment, or failing that up to the first generic source anchor.
    /// The file name and artifact-kind directories are dropped, the rest is
    /// humanized and consecutive duplicates collapse.
    pub fn infer(&self, path: &Path) -> String {
        let mut location = path.to_string_lossy().replace('\\', "/");

        if let Some(root) = &self.source_root {
            location = strip_through(&location, &format!("{}/", root)).unwrap_or(location);
        }

        location = match version_anchor().find(&location) {
            Some(anchor) => location[anchor.end()..].to_string(),
            None => SOURCE_ANCHORS
                .iter()
                .find_map(|anchor| strip_through(&location, anchor))
                .unwrap_or(location),
        };

        let mut segments: Vec<&str> = location.split('/').filter(|s| !s.is_empty()).collect();
        // File name
        segments.pop();

        let humanized: Vec<String> = segments
            .into_iter()
            .filter(|segment| {
                !self
                    .artifact_dirs
                    .iter()
                    .any(|dir| dir.eq_ignore_ascii_case(segment))
            })
            .map(humanize)
            .filter(|segment| !segment.is_empty())
            .collect();

        let category = collapse_duplicates(humanized).join(" - ");
        debug!("Inferred category {:?} from {}", category, path.display());

        if category.is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            category
        }
    }
}

/// `(^|/)vN/`
fn version_anchor() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|/)v\d+/").expect("valid regex"))
}

/// Everything after the first occurrence of `anchor` at a segment boundary
fn strip_through(location: &str, anchor: &str) -> Option<String> {
    let mut search_from = 0;
    while let Some(offset) = location[search_from..].find(anchor) {
        let start = search_from + offset;
        if start == 0 || location.as_bytes()[start - 1] == b'/' {
            return Some(location[start + anchor.len()..].to_string());
        }
        search_from = start + 1;
    }
    None
}

/// `user-profile` / `user_profile` becomes `User Profile`.
///
/// Only the first letter of each word changes; `API` and `userProfile` keep
/// their inner casing.
pub fn humanize(segment: &str) -> String {
    segment
        .split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Category of a controller owned by a module: `AdminPanelModule` becomes
/// `Admin Panel`.
pub fn module_category(module_name: &str) -> String {
    let base = module_name.strip_suffix("Module").unwrap_or(module_name);
    base.to_title_case()
}

/// Case, space and hyphen insensitive form used for comparisons
fn normalize(category: &str) -> String {
    category
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn collapse_duplicates(segments: Vec<String>) -> Vec<String> {
    let mut collapsed: Vec<String> = Vec::with_capacity(segments.len());
    for segment in segments {
        let duplicate = collapsed
            .last()
            .map(|previous| normalize(previous) == normalize(&segment))
            .unwrap_or(false);
        if !duplicate {
            collapsed.push(segment);
        }
    }
    collapsed
}

/// Replaces controller categories from a mapping.
///
/// Keys are tried in three passes, each in mapping order: exact match, then
/// normalized match, then normalized prefix match. The first hit wins; without
/// one the inferred category is kept.
pub fn apply_category_mapping(
    controllers: &mut [ControllerDescriptor],
    mapping: &IndexMap<String, String>,
) {
    if mapping.is_empty() {
        return;
    }

    for controller in controllers.iter_mut() {
        if let Some(mapped) = lookup_mapping(&controller.category, mapping) {
            debug!(
                "Mapping category of {}: {:?} -> {:?}",
                controller.name, controller.category, mapped
            );
            controller.category = mapped.to_string();
        }
    }
}

fn lookup_mapping<'m>(category: &str, mapping: &'m IndexMap<String, String>) -> Option<&'m str> {
    if let Some(mapped) = mapping.get(category) {
        return Some(mapped);
    }

    let normalized = normalize(category);
    mapping
        .iter()
        .find(|(key, _)| normalize(key) == normalized)
        .or_else(|| {
            mapping.iter().find(|(key, _)| {
                let key = normalize(key);
                !key.is_empty() && normalized.starts_with(&key)
            })
        })
        .map(|(_, mapped)| mapped.as_str())
}

/// Sorted distinct non-empty categories
pub fn get_categories(controllers: &[ControllerDescriptor]) -> Vec<String> {
    controllers
        .iter()
        .filter(|c| !c.category.is_empty())
        .map(|c| c.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Controllers grouped by category; an empty category counts as
/// [`UNCATEGORIZED`].
pub fn group_by_category(
    controllers: &[ControllerDescriptor],
) -> BTreeMap<String, Vec<&ControllerDescriptor>> {
    let mut groups: BTreeMap<String, Vec<&ControllerDescriptor>> = BTreeMap::new();
    for controller in controllers {
        let key = if controller.category.is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            controller.category.clone()
        };
        groups.entry(key).or_default().push(controller);
    }
    groups
}
