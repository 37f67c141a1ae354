//! The eframe workspace: controls, live ASCII preview and the crop inspector.

use std::path::{Path, PathBuf};
use std::time::Instant;

use eframe::egui;
use eframe::egui::{Color32, Rect, Stroke, pos2, vec2};
use image::DynamicImage;
use log::{info, warn};

use crate::adjust::{Adjustments, FACTOR_RANGE};
use crate::ascii::{Charset, CharsetPreset, Pipeline, RenderSettings};
use crate::aspect::{HEIGHT_RANGE, OutputSize, WIDTH_RANGE, reference_aspect};
use crate::clipboard;
use crate::debounce::Debouncer;
use crate::editor::{CropEditor, Interaction};
use crate::export::{self, ExportFormat, ExportOptions, FONT_SIZE_RANGE, MAX_EXPORT_PIXELS};
use crate::geometry::ViewTransform;
use crate::hit_test::Handle;
use crate::project::{PROJECT_EXTENSION, Project, SavedSelection};
use crate::settings::Settings;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "bmp"];
const SELECTION_BLUE: Color32 = Color32::from_rgb(0, 153, 255);
const HANDLE_SIZE: f32 = 10.0;
const PREVIEW_FONT_SIZE: f32 = 8.0;

pub struct AsciiApp {
    source: Option<DynamicImage>,
    source_path: Option<PathBuf>,
    texture: Option<egui::TextureHandle>,
    editor: CropEditor,
    adjustments: Adjustments,
    output_size: OutputSize,
    charset: Charset,
    pipeline: Pipeline,
    debounce: Debouncer,
    ascii: String,
    status: Option<String>,
    inspector_open: bool,
    export_dialog: Option<ExportOptions>,
    settings: Settings,
}

impl AsciiApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            source: None,
            source_path: None,
            texture: None,
            editor: CropEditor::new(),
            adjustments: Adjustments::default(),
            output_size: OutputSize::default(),
            charset: Charset::default(),
            pipeline: Pipeline::default(),
            debounce: Debouncer::default(),
            ascii: String::new(),
            status: None,
            inspector_open: false,
            export_dialog: None,
            settings: Settings::load(),
        }
    }

    fn load_texture(&mut self, ctx: &egui::Context) {
        if let Some(image) = &self.source {
            let size = [image.width() as _, image.height() as _];
            let image_buffer = image.to_rgba8();
            let pixels = image_buffer.as_flat_samples();
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
            self.texture =
                Some(ctx.load_texture("source", color_image, egui::TextureOptions::LINEAR));
        }
    }

    fn set_source(&mut self, ctx: &egui::Context, image: DynamicImage, path: Option<PathBuf>) {
        info!("loaded {}x{} source image", image.width(), image.height());
        self.editor.set_image_bounds(image.width(), image.height());
        self.source = Some(image);
        self.source_path = path;
        self.load_texture(ctx);
        self.inspector_open = true;
        self.status = None;
        self.output_size.resync(self.reference());
        self.debounce.trigger();
    }

    /// Returns `false` (with the reason in the status line) when the image
    /// could not be loaded; the previous source stays in place.
    fn open_image_path(&mut self, ctx: &egui::Context, path: &Path) -> bool {
        match image::open(path) {
            Ok(img) => {
                self.settings.remember_dir_of(path);
                self.persist_settings();
                self.set_source(ctx, img, Some(path.to_path_buf()));
                true
            }
            Err(e) => {
                warn!("failed to open {}: {e}", path.display());
                self.status = Some(format!("Failed to open {}: {e}", path.display()));
                false
            }
        }
    }

    fn open_dialog(&mut self, ctx: &egui::Context) {
        let mut dialog = rfd::FileDialog::new().add_filter("Image", &IMAGE_EXTENSIONS);
        if let Some(dir) = &self.settings.last_dir {
            dialog = dialog.set_directory(dir);
        }
        if let Some(path) = dialog.pick_file() {
            self.open_image_path(ctx, &path);
        }
    }

    fn paste(&mut self, ctx: &egui::Context) {
        match clipboard::paste_image() {
            Ok(img) => self.set_source(ctx, img, None),
            Err(e) => {
                warn!("paste failed: {e}");
                self.status = Some("CLIPBOARD ERROR: No valid image found in clipboard.".into());
            }
        }
    }

    fn copy(&mut self) {
        self.status = Some(match clipboard::copy_text(&self.ascii) {
            Ok(()) => "Copied!".into(),
            Err(e) => {
                warn!("copy failed: {e}");
                format!("Clipboard error: {e}. Make sure a clipboard utility is installed.")
            }
        });
    }

    fn persist_settings(&self) {
        if let Err(e) = self.settings.save() {
            warn!("could not save settings: {e}");
        }
    }

    /// Aspect used to link output width and height; `None` without an image.
    fn reference(&self) -> Option<f32> {
        self.editor
            .bounds()
            .map(|b| reference_aspect(self.editor.selection(), b))
    }

    fn on_crop_changed(&mut self) {
        self.output_size.resync(self.reference());
        self.debounce.trigger();
    }

    fn process_ascii(&mut self) {
        let Some(source) = &self.source else {
            return;
        };
        let settings = RenderSettings {
            crop: self.editor.crop_box(),
            adjustments: &self.adjustments,
            width: self.output_size.width(),
            height: self.output_size.height(),
            ramp: self.charset.ramp(),
        };
        let result = self.pipeline.run(source, &settings);
        match result {
            Ok(text) => self.ascii = text,
            Err(e) => {
                warn!("conversion failed: {e}");
                self.ascii = format!("ASCII ENGINE ERROR: {e}");
            }
        }
    }

    fn save_project(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Asciigen project", &[PROJECT_EXTENSION])
            .save_file()
        else {
            return;
        };
        let project = Project {
            source: self.source_path.clone(),
            selection: self.editor.selection().map(SavedSelection::from_rect),
            crop_box: self.editor.crop_box(),
            adjustments: self.adjustments.clone(),
            output: self.output_size.clone(),
            charset: self.charset.clone(),
            ..Default::default()
        };
        self.status = Some(match project.save(&path, self.source.as_ref()) {
            Ok(()) => format!("Project saved to {}", path.display()),
            Err(e) => format!("Failed to save project: {e}"),
        });
    }

    fn open_project(&mut self, ctx: &egui::Context) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Asciigen project", &[PROJECT_EXTENSION])
            .pick_file()
        else {
            return;
        };
        let (project, image) = match Project::load(&path) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("failed to load project {}: {e}", path.display());
                self.status = Some(format!("Failed to open project: {e}"));
                return;
            }
        };

        // an unrestorable image already failed the load above
        if let Some(image) = image {
            self.set_source(ctx, image, project.source.clone());
        }
        self.status = Some(format!("Project loaded from {}", path.display()));
        self.adjustments = project.adjustments;
        self.output_size = project.output;
        self.charset = project.charset;
        self.editor
            .restore(project.selection.map(SavedSelection::to_rect));
        self.debounce.trigger();
    }

    fn export(&mut self, options: ExportOptions) {
        self.settings.export_format = options.format;
        self.settings.font_size = options.font_size;
        self.persist_settings();

        let ext = options.format.extension();
        let mut dialog = rfd::FileDialog::new()
            .add_filter(ext.to_uppercase(), &[ext])
            .set_file_name(format!("ascii.{ext}"));
        if let Some(dir) = &self.settings.last_dir {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };

        self.status = Some(
            match export::export_to(&path, &self.ascii, &options, self.adjustments.invert) {
                Ok(()) => format!("Exported to {}", path.display()),
                Err(e) => {
                    warn!("export failed: {e}");
                    format!("Failed to export: {e}")
                }
            },
        );
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let pressed: Vec<Shortcut> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        repeat: false,
                        modifiers,
                        ..
                    } => shortcut_for(*key, *modifiers),
                    _ => None,
                })
                .collect()
        });
        for shortcut in pressed {
            match shortcut {
                Shortcut::Paste => self.paste(ctx),
                Shortcut::ToggleInspector => self.inspector_open = !self.inspector_open,
                Shortcut::ToggleInvert => {
                    self.adjustments.invert = !self.adjustments.invert;
                    self.debounce.trigger();
                }
            }
        }
    }

    fn top_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open Image").clicked() {
                self.open_dialog(ui.ctx());
            }
            if ui
                .button("Paste")
                .on_hover_text("Paste image from clipboard (P)")
                .clicked()
            {
                self.paste(ui.ctx());
            }
            ui.toggle_value(&mut self.inspector_open, "Inspector");
            if ui
                .toggle_value(&mut self.adjustments.invert, "Invert")
                .changed()
            {
                self.debounce.trigger();
            }

            ui.separator();
            if ui.button("Open Project").clicked() {
                self.open_project(ui.ctx());
            }
            if ui.button("Save Project").clicked() {
                self.save_project();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let has_output = !self.ascii.is_empty();
                if ui.add_enabled(has_output, egui::Button::new("Copy")).clicked() {
                    self.copy();
                }
                if ui
                    .add_enabled(has_output, egui::Button::new("Export…"))
                    .clicked()
                {
                    self.export_dialog = Some(ExportOptions {
                        format: self.settings.export_format,
                        font_size: self.settings.font_size,
                    });
                }
            });
        });
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        let mut changed = false;

        ui.heading("Image Adjustments");
        changed |= ui
            .add(
                egui::Slider::new(&mut self.adjustments.contrast, FACTOR_RANGE)
                    .step_by(0.1)
                    .text("Contrast"),
            )
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut self.adjustments.brightness, FACTOR_RANGE)
                    .step_by(0.1)
                    .text("Brightness"),
            )
            .changed();

        ui.separator();
        ui.heading("ASCII Settings");
        let reference = self.reference();

        let mut width = self.output_size.width();
        if ui
            .add(egui::Slider::new(&mut width, WIDTH_RANGE).text("Output width"))
            .changed()
        {
            self.output_size.set_width(width, reference);
            changed = true;
        }
        let mut height = self.output_size.height();
        if ui
            .add(egui::Slider::new(&mut height, HEIGHT_RANGE).text("Output height"))
            .changed()
        {
            self.output_size.set_height(height, reference);
            changed = true;
        }
        let mut locked = self.output_size.locked();
        if ui.checkbox(&mut locked, "Keep aspect ratio").changed() {
            self.output_size.set_locked(locked, reference);
            changed = true;
        }

        ui.label("Charset ramp:");
        let mut preset = self.charset.preset();
        egui::ComboBox::from_id_salt("charset_preset")
            .selected_text(preset.to_string())
            .show_ui(ui, |ui| {
                for p in CharsetPreset::ALL {
                    ui.selectable_value(&mut preset, p, p.to_string());
                }
            });
        if preset != self.charset.preset() {
            self.charset.select(preset);
            changed = true;
        }
        let mut ramp = self.charset.ramp().to_owned();
        if ui.text_edit_singleline(&mut ramp).changed() {
            self.charset.edit(ramp);
            changed = true;
        }

        ui.separator();
        ui.heading("Crop");
        self.crop_fields(ui);

        if changed {
            self.debounce.trigger();
        }
    }

    /// Numeric crop entry; feeds the same clipping path as the pointer.
    fn crop_fields(&mut self, ui: &mut egui::Ui) {
        let Some(bounds) = self.editor.bounds() else {
            ui.label("No image loaded.");
            return;
        };
        let selection = self.editor.selection();
        let mut values = selection
            .map(|r| [r.min.x, r.min.y, r.width(), r.height()])
            .unwrap_or([0.0; 4]);

        let mut edited = false;
        egui::Grid::new("crop_fields").num_columns(2).show(ui, |ui| {
            let [x, y, w, h] = &mut values;
            for (label, value, max) in [
                ("X", x, bounds.width()),
                ("Y", y, bounds.height()),
                ("Width", w, bounds.width()),
                ("Height", h, bounds.height()),
            ] {
                ui.label(label);
                edited |= ui
                    .add(egui::DragValue::new(value).range(0.0..=max).speed(1.0))
                    .changed();
                ui.end_row();
            }
        });

        if edited && self.editor.set_manual(values[0], values[1], values[2], values[3]) {
            self.on_crop_changed();
        }
        if ui
            .add_enabled(selection.is_some(), egui::Button::new("Clear crop"))
            .clicked()
        {
            self.editor.clear_selection();
            self.on_crop_changed();
        }
    }

    fn preview(&mut self, ui: &mut egui::Ui, ink: Color32) {
        if self.source.is_none() {
            ui.centered_and_justified(|ui| {
                ui.label(egui::RichText::new("Open, paste or drop an image to start.").color(ink));
            });
            return;
        }
        egui::ScrollArea::both()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.add(
                    egui::Label::new(
                        egui::RichText::new(&self.ascii)
                            .monospace()
                            .size(PREVIEW_FONT_SIZE)
                            .color(ink),
                    )
                    .extend(),
                );
            });
    }

    fn inspector(&mut self, ui: &mut egui::Ui) {
        let (Some(texture_id), Some(bounds)) =
            (self.texture.as_ref().map(|t| t.id()), self.editor.bounds())
        else {
            ui.label("Load an image to inspect it.");
            return;
        };

        let size = ui.available_size().max(vec2(300.0, 300.0));
        let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
        let view = ViewTransform::fit(response.rect, bounds.size());
        self.editor.set_view(view);

        // Handle Input
        let mut changed = false;
        if response.drag_started() {
            let origin = ui
                .input(|i| i.pointer.press_origin())
                .or(response.interact_pointer_pos());
            if let Some(pos) = origin {
                self.editor.pointer_down(pos);
            }
        }
        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                changed |= self.editor.pointer_move(pos);
            }
        }
        if response.drag_stopped() {
            changed |= self.editor.pointer_up();
        }
        if response.clicked() {
            // press and release without movement
            if let Some(pos) = response.interact_pointer_pos() {
                self.editor.pointer_down(pos);
                changed |= self.editor.pointer_up();
            }
        }
        if changed {
            self.on_crop_changed();
        }

        if self.editor.interaction() == Interaction::Idle {
            if let Some(pos) = response.hover_pos() {
                ui.ctx().set_cursor_icon(self.editor.hover(pos).cursor());
            }
        }

        // Draw image
        painter.image(
            texture_id,
            view.image_rect(&bounds),
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            Color32::WHITE,
        );

        if let Some(selection) = self
            .editor
            .selection()
            .filter(|r| r.width() > 0.0 && r.height() > 0.0)
        {
            paint_selection(&painter, response.rect, view.to_display_rect(selection));
        }
    }

    fn export_window(&mut self, ctx: &egui::Context) {
        let Some(mut options) = self.export_dialog else {
            return;
        };
        let mut confirmed = false;
        let mut cancelled = false;

        egui::Window::new("Export Settings")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                egui::ComboBox::from_label("Format")
                    .selected_text(options.format.to_string())
                    .show_ui(ui, |ui| {
                        for format in ExportFormat::ALL {
                            ui.selectable_value(&mut options.format, format, format.to_string());
                        }
                    });
                ui.horizontal(|ui| {
                    ui.label("Font size:");
                    ui.add(egui::DragValue::new(&mut options.font_size).range(FONT_SIZE_RANGE))
                        .on_hover_text("Higher font sizes produce larger images.");
                });
                let (w, h) = export::resolution(&self.ascii, options.font_size);
                let allowed = options.format != ExportFormat::Png || export::fits_png(w, h);
                if allowed {
                    ui.label(egui::RichText::new(format!("Final resolution: {w}x{h}")).weak());
                } else {
                    ui.colored_label(
                        ui.visuals().error_fg_color,
                        format!(
                            "Final resolution: {w}x{h} exceeds the {} MP PNG limit",
                            MAX_EXPORT_PIXELS / 1_000_000
                        ),
                    );
                }
                ui.horizontal(|ui| {
                    confirmed = ui.add_enabled(allowed, egui::Button::new("OK")).clicked();
                    cancelled = ui.button("Cancel").clicked();
                });
            });

        if confirmed {
            self.export_dialog = None;
            self.export(options);
        } else if cancelled {
            self.export_dialog = None;
        } else {
            self.export_dialog = Some(options);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shortcut {
    Paste,
    ToggleInspector,
    ToggleInvert,
}

/// Unmodified single-key bindings. Command+V is not usable: egui-winit turns
/// it into a text-only paste event and never delivers the key press.
fn shortcut_for(key: egui::Key, modifiers: egui::Modifiers) -> Option<Shortcut> {
    if modifiers.any() {
        return None;
    }
    match key {
        egui::Key::P => Some(Shortcut::Paste),
        egui::Key::V => Some(Shortcut::ToggleInspector),
        egui::Key::F => Some(Shortcut::ToggleInvert),
        _ => None,
    }
}

/// Dims everything outside the selection and draws its border and handles.
fn paint_selection(painter: &egui::Painter, area: Rect, screen: Rect) {
    let overlay_color = Color32::from_black_alpha(150);

    // Top
    painter.rect_filled(
        Rect::from_min_max(area.min, pos2(area.max.x, screen.min.y)),
        0.0,
        overlay_color,
    );
    // Bottom
    painter.rect_filled(
        Rect::from_min_max(pos2(area.min.x, screen.max.y), area.max),
        0.0,
        overlay_color,
    );
    // Left
    painter.rect_filled(
        Rect::from_min_max(
            pos2(area.min.x, screen.min.y),
            pos2(screen.min.x, screen.max.y),
        ),
        0.0,
        overlay_color,
    );
    // Right
    painter.rect_filled(
        Rect::from_min_max(
            pos2(screen.max.x, screen.min.y),
            pos2(area.max.x, screen.max.y),
        ),
        0.0,
        overlay_color,
    );

    painter.rect_stroke(screen, 0.0, Stroke::new(2.0, SELECTION_BLUE));

    for handle in Handle::ALL {
        painter.rect_filled(
            Rect::from_center_size(handle.corner_of(screen), vec2(HANDLE_SIZE, HANDLE_SIZE)),
            0.0,
            SELECTION_BLUE,
        );
    }
}

impl eframe::App for AsciiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.debounce.poll() {
            self.process_ascii();
        }

        // Handle dropped files
        if !ctx.input(|i| i.raw.dropped_files.is_empty()) {
            let dropped_files = ctx.input(|i| i.raw.dropped_files.clone());
            if let Some(file) = dropped_files.first() {
                if let Some(path) = &file.path {
                    self.open_image_path(ctx, path);
                }
            }
        }

        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("actions").show(ctx, |ui| self.top_bar(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(self.status.as_deref().unwrap_or(""));
        });
        egui::SidePanel::left("controls")
            .resizable(false)
            .exact_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.controls(ui));
            });

        let (paper, ink) = if self.adjustments.invert {
            (Color32::BLACK, Color32::WHITE)
        } else {
            (Color32::WHITE, Color32::BLACK)
        };
        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(paper).inner_margin(8.0))
            .show(ctx, |ui| self.preview(ui, ink));

        let mut open = self.inspector_open;
        egui::Window::new("Source Inspector")
            .open(&mut open)
            .default_size([520.0, 400.0])
            .resizable(true)
            .show(ctx, |ui| self.inspector(ui));
        if !open && self.editor.interaction() != Interaction::Idle && self.editor.pointer_up() {
            self.on_crop_changed();
        }
        self.inspector_open = open;

        self.export_window(ctx);

        if let Some(remaining) = self.debounce.remaining_at(Instant::now()) {
            ctx.request_repaint_after(remaining);
        }
    }
}
