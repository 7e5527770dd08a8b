use crate::domain::models::{BluetoothCommand, ConnectionStatus, MessageSeverity};
use crate::infrastructure::bluetooth::protocol;
use crate::presentation::app::AccuAimApp;
use crate::presentation::components::Components;
use eframe::egui;
use tracing::info;

pub fn render(app: &mut AccuAimApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Debug & Internal State");
    ui.add_space(20.0);

    Components::brutalist_card(ui, "Bluetooth Engine Status", |ui| {
        ui.horizontal(|ui| {
            ui.label("State:");
            let (text, color) = match app.connection_status {
                ConnectionStatus::Connected => ("STREAMING", egui::Color32::from_rgb(0, 255, 100)),
                ConnectionStatus::Disconnected => ("IDLE", egui::Color32::from_gray(150)),
                ConnectionStatus::Error => ("FAULT", egui::Color32::from_rgb(255, 50, 50)),
                _ => ("TRANSITIONING", egui::Color32::from_rgb(255, 200, 0)),
            };
            ui.label(egui::RichText::new(text).color(color).strong());
        });
        ui.label(format!(
            "Sensor session: {}",
            if app.sensor.is_some() { "open" } else { "closed" }
        ));
        if let Some(count) = app.impact_count {
            ui.label(format!("Last impact count: {}", count));
        }
        ui.label(format!("Pending requests: {}", app.pending_requests));
        ui.label(format!("API: {}", app.api.base_url()));
    });

    ui.add_space(10.0);

    if let Ok(guard) = app.session.lock() {
        if let Some(active) = guard.as_ref() {
            Components::brutalist_card(ui, "Session Progress", |ui| {
                egui::Grid::new("debug_grid")
                    .spacing([20.0, 5.0])
                    .show(ui, |ui| {
                        ui.label("Session:");
                        ui.label(active.session_id().to_string());
                        ui.end_row();
                        ui.label("Active index:");
                        ui.label(format!(
                            "{} of {}",
                            active.progress.active_index(),
                            active.progress.blocks().len()
                        ));
                        ui.end_row();
                        ui.label("Complete:");
                        ui.label(active.progress.is_complete().to_string());
                        ui.end_row();
                    });
            });
            ui.add_space(10.0);
        }
    }
}

/// Feed a base64 payload through the notification path of the open sensor
/// session, as if the sensor had sent it.
pub fn ui_injection_panel(app: &mut AccuAimApp, ui: &mut egui::Ui) {
    ui.label("Base64 payload (4-byte little-endian count):");
    ui.horizontal(|ui| {
        ui.text_edit_singleline(&mut app.debug_payload);
        if ui
            .add_enabled(app.sensor.is_some(), egui::Button::new("Inject"))
            .clicked()
        {
            inject(app);
        }
        if ui.button("Next count").clicked() {
            let next = app.impact_count.unwrap_or(0).saturating_add(1);
            app.debug_payload = encode_count(next);
        }
    });
}

fn inject(app: &mut AccuAimApp) {
    match protocol::decode_base64_payload(&app.debug_payload) {
        Ok(bytes) => {
            info!("Injecting debug payload {:?}", bytes);
            app.send_bluetooth(BluetoothCommand::InjectNotification(bytes));
        }
        Err(e) => app.set_status(e.to_string(), MessageSeverity::Warning),
    }
}

fn encode_count(count: i32) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(count.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_count_decodes_back() {
        assert_eq!(encode_count(5), "BQAAAA==");
        let bytes = protocol::decode_base64_payload(&encode_count(300)).unwrap();
        assert_eq!(protocol::decode_impact(&bytes).unwrap(), 300);
    }
}
