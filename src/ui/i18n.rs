use crate::engine::models::Language;

use super::list::PlatformFilter;

#[derive(Debug, Clone, Copy)]
pub struct I18n {
    language: Language,
}

impl I18n {
    #[must_use]
    pub const fn new(language: Language) -> Self {
        Self { language }
    }

    fn pick<'a>(self, english: &'a str, chinese: &'a str) -> &'a str {
        match self.language {
            Language::En => english,
            Language::ZhHans => chinese,
        }
    }

    pub fn window_title(self) -> &'static str {
        self.pick("Developer Other Apps", "开发者的其它应用")
    }

    pub fn platform_label(self, filter: PlatformFilter) -> &'static str {
        match (filter, self.language) {
            (PlatformFilter::All, Language::En) => "All",
            (PlatformFilter::All, Language::ZhHans) => "全部",
            (PlatformFilter::MacOs, _) => "macOS",
            (PlatformFilter::Ios, _) => "iOS",
        }
    }

    pub fn report_tooltip(self) -> &'static str {
        self.pick("Report a problem", "报告问题")
    }

    pub fn coffee_tooltip(self) -> &'static str {
        self.pick("Buy developer a coffee", "请开发者喝杯咖啡")
    }

    pub fn follow_tooltip(self) -> &'static str {
        self.pick("Follow developer on Twitter", "在 Twitter 上关注开发者")
    }

    pub fn refresh_button(self) -> &'static str {
        self.pick("Refresh", "刷新")
    }

    pub fn download_button(self) -> &'static str {
        self.pick("Download", "下载")
    }

    pub fn more_button(self) -> &'static str {
        self.pick("More", "更多")
    }

    pub fn close_button(self) -> &'static str {
        self.pick("Close", "关闭")
    }

    pub fn ok_button(self) -> &'static str {
        self.pick("OK", "好的")
    }

    pub fn cancel_button(self) -> &'static str {
        self.pick("Cancel", "取消")
    }

    pub fn copy_url_button(self) -> &'static str {
        self.pick("Copy URL", "拷贝链接")
    }

    pub fn copied(self) -> &'static str {
        self.pick("Copied.", "已拷贝。")
    }

    pub fn ios_download_heading(self) -> &'static str {
        self.pick("Download on iPhone or iPad", "在 iPhone 或 iPad 上下载")
    }

    pub fn ios_download_hint(self) -> &'static str {
        self.pick(
            "Open this link on your iOS device to install the app.",
            "请在 iOS 设备上打开此链接以安装应用。",
        )
    }

    pub fn coffee_heading(self) -> &'static str {
        self.pick("Buy a coffee", "买杯咖啡")
    }

    pub fn coffee_prompt(self) -> &'static str {
        self.pick(
            "Buy a coffee for the developer.",
            "给开发者买杯咖啡。",
        )
    }

    pub fn status_loading(self) -> &'static str {
        self.pick("Loading cached apps...", "正在读取缓存...")
    }

    pub fn status_syncing(self) -> &'static str {
        self.pick("Checking for updates...", "正在检查更新...")
    }

    pub fn status_progress(self, done: usize, total: usize) -> String {
        match self.language {
            Language::En => format!("Updating apps {done}/{total}..."),
            Language::ZhHans => format!("正在更新应用 {done}/{total}..."),
        }
    }

    pub fn status_finished(self, at: &str, updated: usize, failed: usize) -> String {
        match (self.language, failed) {
            (Language::En, 0) => format!("Up to date as of {at} ({updated} updated)"),
            (Language::En, _) => {
                format!("Checked at {at}: {updated} updated, {failed} will retry next time")
            }
            (Language::ZhHans, 0) => format!("{at} 已是最新（更新 {updated} 项）"),
            (Language::ZhHans, _) => {
                format!("{at} 已检查：更新 {updated} 项，{failed} 项将在下次重试")
            }
        }
    }

    pub fn status_failed(self, err: &str) -> String {
        match self.language {
            Language::En => format!("Update failed: {err}"),
            Language::ZhHans => format!("更新失败：{err}"),
        }
    }

    pub fn open_failed(self, err: &str) -> String {
        match self.language {
            Language::En => format!("Could not open link: {err}"),
            Language::ZhHans => format!("无法打开链接：{err}"),
        }
    }

    pub fn empty_list(self) -> &'static str {
        self.pick("No apps to show yet.", "暂无可显示的应用。")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_strings_for_catalog_language() {
        assert_eq!(I18n::new(Language::En).download_button(), "Download");
        assert_eq!(I18n::new(Language::ZhHans).download_button(), "下载");
        assert_eq!(
            I18n::new(Language::En).platform_label(PlatformFilter::Ios),
            "iOS"
        );
    }

    #[test]
    fn finished_status_mentions_retries_only_on_failure() {
        let i18n = I18n::new(Language::En);
        assert_eq!(
            i18n.status_finished("10:00", 2, 0),
            "Up to date as of 10:00 (2 updated)"
        );
        assert!(i18n.status_finished("10:00", 2, 1).contains("1 will retry"));
    }
}
