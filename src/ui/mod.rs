use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eframe::egui::{
    self, Align, Align2, Color32, CornerRadius, FontData, FontDefinitions, FontFamily, FontId,
    Frame, Layout, Margin, RichText, Stroke, Vec2,
};
use log::{debug, error, info, warn};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::{Mutex, mpsc};

use crate::actions::{self, ActionTarget};
use crate::config::PanelConfig;
use crate::engine::SyncEngine;
use crate::engine::models::{AppRecord, CatalogEntry, Language};
use crate::engine::state::{SyncEvent, UserAction};
use crate::networking::CatalogClient;
use crate::storage::ManifestStore;

mod i18n;
pub mod list;

use self::i18n::I18n;
use self::list::{AppList, PlatformFilter, clip_lines, detect_catalog_language, truncate_text};

const ICON_SIZE: f32 = 64.0;
const NAME_MAX_CHARS: usize = 48;
const CHANGELOG_LINES: usize = 3;
const SYNC_REPAINT_INTERVAL: Duration = Duration::from_millis(100);
const CJK_FONT_ID: &str = "system_cjk";
const CJK_FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/PingFang.ttc",
    "/System/Library/Fonts/STHeiti Light.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "C:\\Windows\\Fonts\\msyh.ttc",
    "C:\\Windows\\Fonts\\simhei.ttf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ThemePalette {
    accent: Color32,
    accent_soft: Color32,
    surface: Color32,
    border: Color32,
    text_muted: Color32,
    danger: Color32,
}

impl ThemePalette {
    const fn dark() -> Self {
        Self {
            accent: Color32::from_rgb(92, 219, 195),
            accent_soft: Color32::from_rgb(63, 140, 125),
            surface: Color32::from_rgb(24, 31, 39),
            border: Color32::from_rgb(45, 57, 72),
            text_muted: Color32::from_rgb(167, 182, 197),
            danger: Color32::from_rgb(239, 117, 117),
        }
    }

    const fn light() -> Self {
        Self {
            accent: Color32::from_rgb(27, 170, 152),
            accent_soft: Color32::from_rgb(152, 223, 212),
            surface: Color32::from_rgb(245, 249, 255),
            border: Color32::from_rgb(195, 205, 221),
            text_muted: Color32::from_rgb(80, 99, 121),
            danger: Color32::from_rgb(219, 83, 83),
        }
    }

    fn for_context(ctx: &egui::Context) -> Self {
        if ctx.style().visuals.dark_mode {
            Self::dark()
        } else {
            Self::light()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Status {
    Loading,
    Checking,
    Updating { done: usize, total: usize },
    Finished { at: String, updated: usize, failed: usize },
    Failed(String),
}

fn build_runtime() -> Arc<Runtime> {
    match Runtime::new() {
        Ok(rt) => Arc::new(rt),
        Err(err) => {
            warn!(
                "ui: failed to create multithreaded runtime ({}); trying single-threaded runtime",
                err
            );
            match Builder::new_current_thread().enable_all().build() {
                Ok(rt) => Arc::new(rt),
                Err(fallback_err) => {
                    error!(
                        "ui: failed to create any Tokio runtime ({}); terminating",
                        fallback_err
                    );
                    std::process::exit(1);
                }
            }
        }
    }
}

// egui's bundled fonts have no CJK glyphs; borrow one from the system when available.
fn setup_fonts(ctx: &egui::Context) {
    let Some((path, bytes)) = CJK_FONT_CANDIDATES
        .iter()
        .find_map(|path| fs::read(path).ok().map(|bytes| (*path, bytes)))
    else {
        warn!("ui: no CJK system font found; Chinese text may not render");
        return;
    };
    debug!("ui: using {path} for CJK text");

    let mut fonts = FontDefinitions::default();
    fonts.font_data.insert(
        CJK_FONT_ID.to_owned(),
        Arc::new(FontData::from_owned(bytes)),
    );
    for family in [FontFamily::Proportional, FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .push(CJK_FONT_ID.to_owned());
    }
    ctx.set_fonts(fonts);
}

fn decode_icon(record: &AppRecord) -> Option<egui::ColorImage> {
    let bytes = record.icon_bytes()?;
    let image = match image::load_from_memory(&bytes) {
        Ok(image) => image,
        Err(err) => {
            debug!("ui: icon of {} not decodable: {err}", record.name);
            return None;
        }
    };
    let rgba = image.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Some(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

fn icon_texture<'a>(
    icons: &'a mut HashMap<String, Option<egui::TextureHandle>>,
    ctx: &egui::Context,
    entry: &CatalogEntry,
) -> Option<&'a egui::TextureHandle> {
    icons
        .entry(entry.identifier.clone())
        .or_insert_with(|| {
            decode_icon(&entry.record).map(|image| {
                ctx.load_texture(
                    format!("icon-{}", entry.identifier),
                    image,
                    egui::TextureOptions::LINEAR,
                )
            })
        })
        .as_ref()
}

fn primary_button(label: &str, colors: &ThemePalette) -> egui::Button<'static> {
    egui::Button::new(RichText::new(label.to_owned()).strong())
        .fill(colors.accent_soft)
        .stroke(Stroke::new(1.0, colors.accent))
        .min_size(Vec2::new(96.0, 28.0))
}

fn render_icon(ui: &mut egui::Ui, texture: Option<&egui::TextureHandle>, colors: &ThemePalette) {
    match texture {
        Some(texture) => {
            ui.add(egui::Image::new(egui::load::SizedTexture::new(
                texture.id(),
                Vec2::splat(ICON_SIZE),
            )));
        }
        None => {
            let (rect, _) = ui.allocate_exact_size(Vec2::splat(ICON_SIZE), egui::Sense::hover());
            ui.painter()
                .rect_filled(rect, CornerRadius::same(14), colors.surface);
            ui.painter().text(
                rect.center(),
                Align2::CENTER_CENTER,
                "🗔",
                FontId::proportional(28.0),
                colors.text_muted,
            );
        }
    }
}

fn render_row(
    ui: &mut egui::Ui,
    record: &AppRecord,
    texture: Option<&egui::TextureHandle>,
    colors: &ThemePalette,
    i18n: I18n,
) -> Option<UserAction> {
    let mut action = None;
    ui.horizontal(|ui| {
        render_icon(ui, texture, colors);
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(record.lang.flag()).size(20.0));
                ui.label(RichText::new(record.platform.glyph()).size(20.0));
            });
            ui.label(
                RichText::new(truncate_text(&record.name, NAME_MAX_CHARS))
                    .size(18.0)
                    .strong(),
            );
            ui.label(RichText::new(&record.version).color(colors.text_muted));
        });
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui.add(primary_button(i18n.download_button(), colors)).clicked() {
                action = Some(UserAction::Download(record.clone()));
            }
        });
    });
    ui.horizontal(|ui| {
        ui.with_layout(Layout::right_to_left(Align::TOP), |ui| {
            if ui.button(i18n.more_button()).clicked() {
                action = Some(UserAction::ShowMore(record.clone()));
            }
            ui.with_layout(Layout::left_to_right(Align::TOP), |ui| {
                ui.add(
                    egui::Label::new(clip_lines(&record.changelog, CHANGELOG_LINES)).wrap(),
                );
            });
        });
    });
    action
}

pub struct PanelApp {
    runtime: Arc<Runtime>,
    engine: Arc<Mutex<SyncEngine>>,
    cancel_flag: Arc<AtomicBool>,
    updates_rx: mpsc::UnboundedReceiver<SyncEvent>,
    updates_tx: mpsc::UnboundedSender<SyncEvent>,
    config: PanelConfig,
    language: Language,
    platform: PlatformFilter,
    list: AppList,
    icons: HashMap<String, Option<egui::TextureHandle>>,
    status: Status,
    syncing: bool,
    ios_link: Option<String>,
    link_copied: bool,
    pending_coffee: Option<String>,
    action_error: Option<String>,
}

impl PanelApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: PanelConfig) -> Self {
        let runtime = build_runtime();

        let cancel_flag = Arc::new(AtomicBool::new(false));
        let store = ManifestStore::new(config.cache_dir());
        let source = Arc::new(CatalogClient::new(&config));
        let engine = SyncEngine::new(store, source, &config, cancel_flag.clone());
        let engine = Arc::new(Mutex::new(engine));
        let (tx, rx) = mpsc::unbounded_channel();

        setup_fonts(&cc.egui_ctx);
        let mut style = (*cc.egui_ctx.style()).clone();
        style.spacing.item_spacing = Vec2::new(10.0, 8.0);
        style.spacing.button_padding = Vec2::new(12.0, 6.0);
        cc.egui_ctx.set_style(style);

        let language = detect_catalog_language();
        info!("ui: showing {language:?} catalog entries");

        let mut app = Self {
            runtime,
            engine,
            cancel_flag,
            updates_rx: rx,
            updates_tx: tx,
            config,
            language,
            platform: PlatformFilter::All,
            list: AppList::default(),
            icons: HashMap::new(),
            status: Status::Loading,
            syncing: false,
            ios_link: None,
            link_copied: false,
            pending_coffee: None,
            action_error: None,
        };
        app.start_sync(true);
        app
    }

    fn i18n(&self) -> I18n {
        I18n::new(self.language)
    }

    fn start_sync(&mut self, load_cache: bool) {
        if self.syncing {
            return;
        }
        self.syncing = true;
        let engine = self.engine.clone();
        let tx = self.updates_tx.clone();
        self.runtime.spawn(async move {
            let locked = engine.lock().await;
            if load_cache && let Err(err) = locked.load_cached(&tx) {
                warn!("ui: cached catalog unavailable: {err}");
            }
            // The outcome reaches the panel as events.
            let _ = locked.sync(&tx).await;
        });
    }

    fn sync_events(&mut self) {
        while let Ok(event) = self.updates_rx.try_recv() {
            match event {
                SyncEvent::Loaded(entries) => {
                    self.icons.clear();
                    self.list.replace_all(entries);
                }
                SyncEvent::Started => self.status = Status::Checking,
                SyncEvent::Planned { total } => {
                    self.status = Status::Updating { done: 0, total };
                }
                SyncEvent::RecordUpdated(entry) => {
                    self.icons.remove(&entry.identifier);
                    self.list.upsert(entry);
                    self.bump_progress();
                }
                SyncEvent::RecordFailed { identifier, error } => {
                    debug!("ui: {identifier} keeps its cached record ({error})");
                    self.bump_progress();
                }
                SyncEvent::Finished(report) => {
                    self.syncing = false;
                    self.list.remove_all(&report.stale);
                    self.status = Status::Finished {
                        at: report
                            .finished_at
                            .map(|at| at.format("%H:%M").to_string())
                            .unwrap_or_default(),
                        updated: report.updated.len(),
                        failed: report.failed.len(),
                    };
                }
                SyncEvent::Failed(err) => {
                    self.syncing = false;
                    self.status = Status::Failed(err);
                }
            }
        }
    }

    fn bump_progress(&mut self) {
        if let Status::Updating { done, total } = &mut self.status {
            *done = (*done + 1).min(*total);
        }
    }

    fn trigger_action(&mut self, action: UserAction) {
        match actions::resolve(&action, &self.config) {
            Some(ActionTarget::Open(url)) => self.open_link(&url),
            Some(ActionTarget::ShowForDevice(url)) => {
                self.ios_link = Some(url);
                self.link_copied = false;
            }
            Some(ActionTarget::ConfirmCoffee(url)) => self.pending_coffee = Some(url),
            None => debug!("ui: nothing to open for {action:?}"),
        }
    }

    fn open_link(&mut self, url: &str) {
        match actions::open_url(url) {
            Ok(()) => self.action_error = None,
            Err(err) => {
                warn!("ui: {err}");
                self.action_error = Some(err);
            }
        }
    }

    fn status_text(&self, i18n: I18n) -> String {
        match &self.status {
            Status::Loading => i18n.status_loading().to_owned(),
            Status::Checking => i18n.status_syncing().to_owned(),
            Status::Updating { done, total } => i18n.status_progress(*done, *total),
            Status::Finished {
                at,
                updated,
                failed,
            } => i18n.status_finished(at, *updated, *failed),
            Status::Failed(err) => i18n.status_failed(err),
        }
    }

    fn render_top_bar(&mut self, ui: &mut egui::Ui, colors: &ThemePalette, i18n: I18n) {
        let mut action = None;
        ui.horizontal(|ui| {
            ui.heading(RichText::new(i18n.window_title()).color(colors.accent));
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui
                    .add_enabled(!self.syncing, egui::Button::new(i18n.refresh_button()))
                    .clicked()
                {
                    self.start_sync(false);
                }
                egui::ComboBox::from_id_salt("platform_combo")
                    .selected_text(i18n.platform_label(self.platform))
                    .show_ui(ui, |ui| {
                        for filter in PlatformFilter::ALL {
                            ui.selectable_value(
                                &mut self.platform,
                                filter,
                                i18n.platform_label(filter),
                            );
                        }
                    });
                if ui
                    .button(RichText::new("🐦").size(18.0))
                    .on_hover_text(i18n.follow_tooltip())
                    .clicked()
                {
                    action = Some(UserAction::Follow);
                }
                if ui
                    .button(RichText::new("☕").size(18.0))
                    .on_hover_text(i18n.coffee_tooltip())
                    .clicked()
                {
                    action = Some(UserAction::BuyCoffee);
                }
                if ui
                    .button(RichText::new("🐞").size(18.0))
                    .on_hover_text(i18n.report_tooltip())
                    .clicked()
                {
                    action = Some(UserAction::Report);
                }
            });
        });
        if let Some(action) = action {
            self.trigger_action(action);
        }
    }

    fn render_status(&self, ui: &mut egui::Ui, colors: &ThemePalette, i18n: I18n) {
        ui.horizontal(|ui| {
            if self.syncing {
                ui.spinner();
            }
            let text = RichText::new(self.status_text(i18n)).small();
            if matches!(self.status, Status::Failed(_)) {
                ui.label(text.color(colors.danger));
            } else {
                ui.label(text.color(colors.text_muted));
            }
            if let Some(err) = &self.action_error {
                ui.label(
                    RichText::new(i18n.open_failed(err))
                        .small()
                        .color(colors.danger),
                );
            }
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(
                    RichText::new(format!("v{}", env!("CARGO_PKG_VERSION")))
                        .small()
                        .color(colors.text_muted),
                );
            });
        });
    }

    fn render_list(&mut self, ui: &mut egui::Ui, colors: &ThemePalette, i18n: I18n) {
        let visible = self.list.visible(self.language, self.platform);
        if visible.is_empty() {
            ui.add_space(24.0);
            ui.vertical_centered(|ui| {
                ui.label(RichText::new(i18n.empty_list()).color(colors.text_muted));
            });
            return;
        }

        let mut action = None;
        let ctx = ui.ctx().clone();
        let last = visible.len() - 1;
        for (idx, entry) in visible.into_iter().enumerate() {
            let texture = icon_texture(&mut self.icons, &ctx, entry);
            if let Some(clicked) = render_row(ui, &entry.record, texture, colors, i18n) {
                action = Some(clicked);
            }
            if idx < last {
                ui.separator();
            }
        }
        if let Some(action) = action {
            self.trigger_action(action);
        }
    }

    fn render_ios_dialog(&mut self, ctx: &egui::Context, i18n: I18n) {
        let Some(url) = self.ios_link.clone() else {
            return;
        };
        let mut open = true;
        let mut close_requested = false;
        egui::Window::new(i18n.ios_download_heading())
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label(i18n.ios_download_hint());
                ui.add_space(6.0);
                ui.add(egui::Label::new(RichText::new(&url).monospace()).selectable(true));
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    if ui.button(i18n.copy_url_button()).clicked() {
                        ui.ctx().copy_text(url.clone());
                        self.link_copied = true;
                    }
                    if ui.button(i18n.close_button()).clicked() {
                        close_requested = true;
                    }
                    if self.link_copied {
                        ui.label(i18n.copied());
                    }
                });
            });
        if !open || close_requested {
            self.ios_link = None;
            self.link_copied = false;
        }
    }

    fn render_coffee_dialog(&mut self, ctx: &egui::Context, colors: &ThemePalette, i18n: I18n) {
        let Some(url) = self.pending_coffee.clone() else {
            return;
        };
        let mut confirmed = false;
        let mut dismissed = false;
        egui::Window::new(i18n.coffee_heading())
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(i18n.coffee_prompt());
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    confirmed = ui.add(primary_button(i18n.ok_button(), colors)).clicked();
                    dismissed = ui.button(i18n.cancel_button()).clicked();
                });
            });
        if confirmed {
            self.open_link(&url);
        }
        if confirmed || dismissed {
            self.pending_coffee = None;
        }
    }
}

impl eframe::App for PanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.sync_events();
        let colors = ThemePalette::for_context(ctx);
        let i18n = self.i18n();

        egui::TopBottomPanel::top("top_bar")
            .frame(
                Frame::new()
                    .fill(ctx.style().visuals.panel_fill)
                    .stroke(Stroke::new(1.0, colors.border))
                    .inner_margin(Margin::symmetric(14, 10)),
            )
            .show(ctx, |ui| self.render_top_bar(ui, &colors, i18n));

        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                Frame::new()
                    .fill(ctx.style().visuals.panel_fill)
                    .inner_margin(Margin::symmetric(14, 6)),
            )
            .show(ctx, |ui| self.render_status(ui, &colors, i18n));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| self.render_list(ui, &colors, i18n));
        });

        self.render_ios_dialog(ctx, i18n);
        self.render_coffee_dialog(ctx, &colors, i18n);

        if self.syncing {
            ctx.request_repaint_after(SYNC_REPAINT_INTERVAL);
        }
    }
}

impl Drop for PanelApp {
    fn drop(&mut self) {
        // Fetched records are still saved; the rest stay planned for the next launch.
        self.cancel_flag.store(true, Ordering::SeqCst);
    }
}
