use log::{info, warn};
use reqwest::Url;

use crate::config::PanelConfig;
use crate::engine::models::Platform;
use crate::engine::state::UserAction;

const REPORT_SUBJECT: &str = concat!("Other Apps feedback (v", env!("CARGO_PKG_VERSION"), ")");

/// What the presentation layer should do for a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTarget {
    Open(String),
    /// iOS apps cannot be installed from the desktop; show the link for another device.
    ShowForDevice(String),
    ConfirmCoffee(String),
}

pub fn resolve(action: &UserAction, config: &PanelConfig) -> Option<ActionTarget> {
    match action {
        UserAction::Download(record) => {
            let url = normalize_url(&record.app_store_url)?;
            if record.platform == Platform::Ios {
                Some(ActionTarget::ShowForDevice(url))
            } else {
                Some(ActionTarget::Open(url))
            }
        }
        UserAction::ShowMore(record) => normalize_url(&record.home_url).map(ActionTarget::Open),
        UserAction::Follow => normalize_url(&config.follow_url).map(ActionTarget::Open),
        UserAction::BuyCoffee => normalize_url(&config.coffee_url).map(ActionTarget::ConfirmCoffee),
        UserAction::Report => report_url(&config.report_email).map(ActionTarget::Open),
    }
}

/// Parse a possibly hand-written URL, percent-encoding what needs it.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Url::parse(trimmed) {
        Ok(url) => Some(url.to_string()),
        Err(err) => {
            warn!("actions: ignoring invalid URL {trimmed:?}: {err}");
            None
        }
    }
}

fn report_url(email: &str) -> Option<String> {
    let email = email.trim();
    if email.is_empty() {
        return None;
    }
    normalize_url(&format!("mailto:{email}?subject={REPORT_SUBJECT}"))
}

pub fn open_url(url: &str) -> Result<(), String> {
    info!("actions: opening {url}");
    open::that(url).map_err(|err| format!("failed to open {url}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::models::{AppRecord, Language};

    fn record(platform: Platform, store: &str) -> AppRecord {
        AppRecord {
            platform,
            lang: Language::En,
            icon: String::new(),
            name: "Poster 2".into(),
            version: "2.8.12".into(),
            changelog: String::new(),
            home_url: "https://parussoft.com/poster 2/".into(),
            app_store_url: store.into(),
        }
    }

    #[test]
    fn macos_download_opens_store_page() {
        let action = UserAction::Download(record(Platform::MacOs, "https://apps.apple.com/app/id1"));
        assert_eq!(
            resolve(&action, &PanelConfig::default()),
            Some(ActionTarget::Open("https://apps.apple.com/app/id1".into()))
        );
    }

    #[test]
    fn ios_download_is_shown_for_another_device() {
        let action = UserAction::Download(record(Platform::Ios, "https://apps.apple.com/app/id2"));
        assert_eq!(
            resolve(&action, &PanelConfig::default()),
            Some(ActionTarget::ShowForDevice("https://apps.apple.com/app/id2".into()))
        );
    }

    #[test]
    fn missing_store_url_resolves_to_nothing() {
        let action = UserAction::Download(record(Platform::MacOs, "  "));
        assert_eq!(resolve(&action, &PanelConfig::default()), None);
    }

    #[test]
    fn home_url_spaces_are_encoded() {
        let action = UserAction::ShowMore(record(Platform::MacOs, ""));
        assert_eq!(
            resolve(&action, &PanelConfig::default()),
            Some(ActionTarget::Open("https://parussoft.com/poster%202/".into()))
        );
    }

    #[test]
    fn coffee_needs_confirmation() {
        assert!(matches!(
            resolve(&UserAction::BuyCoffee, &PanelConfig::default()),
            Some(ActionTarget::ConfirmCoffee(url)) if url.starts_with("https://buymeacoffee.com/")
        ));
    }

    #[test]
    fn report_composes_mailto_with_subject() {
        let Some(ActionTarget::Open(url)) = resolve(&UserAction::Report, &PanelConfig::default())
        else {
            panic!("report should resolve to a mailto link");
        };
        assert!(url.starts_with("mailto:support@parussoft.com?subject=Other%20Apps%20feedback"));
    }
}
