use crate::domain::models::MessageSeverity;
use crate::presentation::app::{AccuAimApp, Tab};
use crate::presentation::components::Components;
use eframe::egui;
use tracing::{error, info};

pub fn render(app: &mut AccuAimApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Settings");
    ui.add_space(20.0);

    let settings_mut = app.settings.get_mut();

    Components::brutalist_card(ui, "Server", |ui| {
        egui::Grid::new("server_grid")
            .spacing([10.0, 10.0])
            .show(ui, |ui| {
                ui.label("API base URL:");
                ui.text_edit_singleline(&mut settings_mut.api_base_url);
                ui.end_row();
                ui.label("Request timeout (s):");
                ui.add(egui::DragValue::new(&mut settings_mut.request_timeout_secs).range(1..=120));
                ui.end_row();
            });
    });

    ui.add_space(10.0);

    Components::brutalist_card(ui, "Impact Sensor", |ui| {
        egui::Grid::new("sensor_grid")
            .spacing([10.0, 10.0])
            .show(ui, |ui| {
                ui.label("Device name:");
                ui.text_edit_singleline(&mut settings_mut.sensor_name);
                ui.end_row();
                ui.label("Scan timeout (s):");
                ui.add(egui::DragValue::new(&mut settings_mut.scan_timeout_secs).range(1..=120));
                ui.end_row();
                ui.label("Connect timeout (s):");
                ui.add(egui::DragValue::new(&mut settings_mut.connect_timeout_secs).range(1..=60));
                ui.end_row();
            });
        ui.checkbox(
            &mut settings_mut.filter_by_name,
            "Only connect to sensors with this exact name",
        );

        ui.collapsing("Override Service UUIDs", |ui| {
            ui.label(
                egui::RichText::new("⚠️ Warning: Altering these may break device discovery.")
                    .color(egui::Color32::from_rgb(255, 200, 0)),
            );

            egui::Grid::new("ble_uuids")
                .spacing([10.0, 10.0])
                .show(ui, |ui| {
                    ui.label("Service:");
                    ui.text_edit_singleline(&mut settings_mut.ble_service_uuid);
                    ui.end_row();
                    ui.label("Impact counter:");
                    ui.text_edit_singleline(&mut settings_mut.ble_impact_char_uuid);
                    ui.end_row();
                });
        });
        ui.label(
            egui::RichText::new("Sensor changes apply the next time the Active Session tab opens.")
                .italics()
                .size(12.0),
        );
    });

    ui.add_space(10.0);

    Components::brutalist_card(ui, "Logging & Debug", |ui| {
        ui.horizontal(|ui| {
            ui.label("Verbosity Level:");
            egui::ComboBox::from_id_salt("log_level")
                .selected_text(&settings_mut.log_settings.level)
                .show_ui(ui, |ui| {
                    for level in &["trace", "debug", "info", "warn", "error"] {
                        ui.selectable_value(
                            &mut settings_mut.log_settings.level,
                            level.to_string(),
                            *level,
                        );
                    }
                });
        });

        ui.checkbox(
            &mut settings_mut.log_settings.console_logging_enabled,
            "Standard Console Logs",
        );
        ui.checkbox(
            &mut settings_mut.log_settings.file_logging_enabled,
            "Persistent File Logs",
        );

        if settings_mut.log_settings.file_logging_enabled {
            ui.indent("file_logs", |ui| {
                ui.horizontal(|ui| {
                    ui.label("Save Path:");
                    ui.text_edit_singleline(&mut settings_mut.log_settings.log_dir);
                });
                ui.horizontal(|ui| {
                    ui.label("Rotation:");
                    egui::ComboBox::from_id_salt("log_rot")
                        .selected_text(&settings_mut.log_settings.rotation)
                        .show_ui(ui, |ui| {
                            for rot in &["daily", "hourly", "never"] {
                                ui.selectable_value(
                                    &mut settings_mut.log_settings.rotation,
                                    rot.to_string(),
                                    *rot,
                                );
                            }
                        });
                });
            });
            ui.label(
                egui::RichText::new("Restart required for log changes.")
                    .italics()
                    .size(12.0),
            );
        }
    });

    ui.add_space(10.0);

    ui.horizontal(|ui| {
        if ui.button("Save Settings").clicked() {
            save(app);
        }
        if app.user.is_none() && ui.button("Back to Log In").clicked() {
            app.select_tab(Tab::Login);
        }
    });

    if let Some(msg) = &app.status_message {
        Components::status_message(ui, msg);
    }
}

fn save(app: &mut AccuAimApp) {
    app.apply_server_settings();
    match app.settings.save() {
        Ok(()) => {
            info!("Settings saved to {}", app.settings.path().display());
            app.set_status("Settings saved", MessageSeverity::Success);
        }
        Err(e) => {
            error!("Failed to save settings: {}", e);
            app.set_status(format!("Could not save settings: {}", e), MessageSeverity::Error);
        }
    }
}
