use crate::domain::models::{ConnectionStatus, MessageSeverity, StatusMessage};
use eframe::egui;

pub struct Components;

impl Components {
    pub fn heading(ui: &mut egui::Ui, text: &str) {
        ui.label(egui::RichText::new(text).heading().strong());
    }

    pub fn sub_heading(ui: &mut egui::Ui, text: &str) {
        ui.label(egui::RichText::new(text).strong().size(16.0));
    }

    pub fn brutalist_card<R>(
        ui: &mut egui::Ui,
        title: &str,
        add_contents: impl FnOnce(&mut egui::Ui) -> R,
    ) -> R {
        let stroke = ui.style().visuals.widgets.noninteractive.bg_stroke;
        let bg = ui.style().visuals.widgets.noninteractive.bg_fill;

        egui::Frame::none()
            .inner_margin(egui::Margin::same(15.0))
            .stroke(stroke)
            .fill(bg)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.label(egui::RichText::new(title).strong().size(18.0));
                    ui.add_space(8.0);
                    add_contents(ui)
                })
                .inner
            })
            .inner
    }

    pub fn status_banner(
        ui: &mut egui::Ui,
        text: &str,
        bg_color: egui::Color32,
        text_color: egui::Color32,
    ) {
        ui.add_sized(
            [ui.available_width(), 35.0],
            egui::Label::new(
                egui::RichText::new(text)
                    .color(text_color)
                    .background_color(bg_color)
                    .size(16.0)
                    .strong(),
            )
            .wrap_mode(egui::TextWrapMode::Extend),
        );
    }

    pub fn connection_banner(ui: &mut egui::Ui, status: ConnectionStatus) {
        let (text, bg_color, text_color) = match status {
            ConnectionStatus::Connected => (
                "SENSOR CONNECTED",
                egui::Color32::from_rgb(0, 200, 0),
                egui::Color32::BLACK,
            ),
            ConnectionStatus::Connecting => (
                "CONNECTING...",
                egui::Color32::from_rgb(255, 200, 0),
                egui::Color32::BLACK,
            ),
            ConnectionStatus::Scanning => (
                "SCANNING...",
                egui::Color32::from_rgb(0, 200, 255),
                egui::Color32::BLACK,
            ),
            ConnectionStatus::Disconnected => (
                "DISCONNECTED",
                egui::Color32::from_gray(100),
                egui::Color32::WHITE,
            ),
            ConnectionStatus::Error => (
                "CONNECTION ERROR",
                egui::Color32::from_rgb(255, 50, 50),
                egui::Color32::WHITE,
            ),
        };
        Self::status_banner(ui, text, bg_color, text_color);
    }

    pub fn status_message(ui: &mut egui::Ui, message: &StatusMessage) {
        let color = match message.severity {
            MessageSeverity::Info => egui::Color32::from_rgb(50, 50, 255),
            MessageSeverity::Success => egui::Color32::from_rgb(0, 150, 0),
            MessageSeverity::Warning => egui::Color32::from_rgb(200, 150, 0),
            MessageSeverity::Error => egui::Color32::RED,
        };
        ui.label(egui::RichText::new(&message.message).color(color).strong());
    }

    /// Big number with a caption, used on the dashboard and session screens
    pub fn stat_tile(ui: &mut egui::Ui, caption: &str, value: &str) {
        let stroke = ui.style().visuals.widgets.noninteractive.bg_stroke;
        egui::Frame::none()
            .inner_margin(egui::Margin::same(10.0))
            .stroke(stroke)
            .show(ui, |ui| {
                ui.set_min_width(140.0);
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new(value).strong().size(26.0));
                    ui.label(egui::RichText::new(caption).size(12.0));
                });
            });
    }

    /// Labelled single-line input; `password` hides the text
    pub fn form_field(ui: &mut egui::Ui, label: &str, value: &mut String, password: bool) {
        ui.horizontal(|ui| {
            ui.add_sized([140.0, 20.0], egui::Label::new(label));
            ui.add(
                egui::TextEdit::singleline(value)
                    .password(password)
                    .desired_width(260.0),
            );
        });
    }
}
