use crate::engine::models::{CatalogEntry, Language, Platform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFilter {
    All,
    MacOs,
    Ios,
}

impl PlatformFilter {
    pub const ALL: [PlatformFilter; 3] = [
        PlatformFilter::All,
        PlatformFilter::MacOs,
        PlatformFilter::Ios,
    ];

    fn admits(self, platform: Platform) -> bool {
        match self {
            PlatformFilter::All => true,
            PlatformFilter::MacOs => platform == Platform::MacOs,
            PlatformFilter::Ios => platform == Platform::Ios,
        }
    }
}

/// The panel's current list of apps; the only mutable copy of the catalog.
#[derive(Debug, Default)]
pub struct AppList {
    entries: Vec<CatalogEntry>,
}

impl AppList {
    pub fn replace_all(&mut self, entries: Vec<CatalogEntry>) {
        self.entries = entries;
    }

    /// A newer record supersedes the one stored under the same identifier.
    pub fn upsert(&mut self, entry: CatalogEntry) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.identifier == entry.identifier)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Drop apps the remote catalog stopped listing.
    pub fn remove_all(&mut self, identifiers: &[String]) {
        self.entries
            .retain(|entry| !identifiers.contains(&entry.identifier));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn visible(&self, language: Language, filter: PlatformFilter) -> Vec<&CatalogEntry> {
        let mut visible: Vec<&CatalogEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.record.lang == language && filter.admits(entry.record.platform))
            .collect();
        // Stable, so same-platform apps keep their arrival order.
        visible.sort_by_key(|entry| entry.record.platform.raw_name());
        visible
    }
}

fn parse_locale_token(token: &str) -> Option<Language> {
    let normalized = token
        .split(['.', '@'])
        .next()
        .unwrap_or(token)
        .replace('-', "_")
        .to_ascii_lowercase();
    let code = normalized.split('_').next().unwrap_or(&normalized);
    match code {
        "zh" | "zho" | "chi" => Some(Language::ZhHans),
        "" | "c" | "posix" => None,
        _ => Some(Language::En),
    }
}

/// Catalog language matching the user's locale.
pub fn detect_catalog_language() -> Language {
    for var in ["LC_ALL", "LANGUAGE", "LANG"] {
        if let Ok(value) = std::env::var(var) {
            for token in value.split(':') {
                if let Some(language) = parse_locale_token(token) {
                    return language;
                }
            }
        }
    }
    Language::En
}

pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max_len).collect();
    out.push_str("...");
    out
}

/// At most `max_lines` lines of a changelog, marking the cut.
pub fn clip_lines(text: &str, max_lines: usize) -> String {
    let mut lines = text.trim().lines();
    let mut out: Vec<&str> = lines.by_ref().take(max_lines).collect();
    if lines.next().is_some() {
        out.push("...");
    }
    out.join("\n")
}
