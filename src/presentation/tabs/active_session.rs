use crate::domain::models::{AppEvent, BluetoothCommand, ConnectionStatus, MessageSeverity};
use crate::domain::progress::ActiveSession;
use crate::presentation::app::{AccuAimApp, Tab};
use crate::presentation::components::Components;
use crate::presentation::theme::BrutalistPalette;
use eframe::egui;
use tracing::info;

pub fn render(app: &mut AccuAimApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Active Session");
    ui.add_space(20.0);

    ui_sensor_panel(app, ui);
    ui.add_space(15.0);

    if let Some(msg) = &app.status_message {
        Components::brutalist_card(ui, "Status", |ui| Components::status_message(ui, msg));
        ui.add_space(15.0);
    }

    ui.collapsing("Debug: inject notification", |ui| {
        crate::presentation::tabs::debug::ui_injection_panel(app, ui);
    });
    ui.add_space(15.0);

    // Work on a copy so the recorder never waits on the UI
    let snapshot = app.session.lock().ok().and_then(|s| s.clone());
    match snapshot {
        Some(active) => ui_progress_panel(app, ui, &active),
        None => {
            Components::brutalist_card(ui, "No Session", |ui| {
                ui.label("Impacts are only recorded while a session is running.");
                if ui.button("Create Session").clicked() {
                    app.select_tab(Tab::CreateSession);
                }
            });
        }
    }
}

fn ui_sensor_panel(app: &mut AccuAimApp, ui: &mut egui::Ui) {
    Components::brutalist_card(ui, "Impact Sensor", |ui| {
        Components::connection_banner(ui, app.connection_status);
        ui.add_space(10.0);

        ui.horizontal(|ui| {
            ui.label("Impacts:");
            let count = app
                .impact_count
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            ui.label(egui::RichText::new(count).strong().size(22.0));
        });

        ui.horizontal(|ui| match app.connection_status {
            ConnectionStatus::Disconnected | ConnectionStatus::Error => {
                if ui.button("Scan for Sensor").clicked() {
                    app.send_bluetooth(BluetoothCommand::StartScan);
                }
            }
            ConnectionStatus::Scanning => {
                if ui.button("Stop Scan").clicked() {
                    app.send_bluetooth(BluetoothCommand::StopScan);
                }
                ui.spinner();
            }
            ConnectionStatus::Connecting => {
                ui.spinner();
                if ui.button("Cancel").clicked() {
                    app.send_bluetooth(BluetoothCommand::Disconnect);
                }
            }
            ConnectionStatus::Connected => {
                if ui.button("Disconnect").clicked() {
                    app.send_bluetooth(BluetoothCommand::Disconnect);
                }
            }
        });

        if !app.scanned_devices.is_empty() {
            ui.separator();
            ui.label("Nearby Sensors:");
            let can_connect = matches!(
                app.connection_status,
                ConnectionStatus::Disconnected | ConnectionStatus::Scanning
            );
            let mut picked = None;
            egui::ScrollArea::vertical()
                .id_salt("scan_results")
                .max_height(120.0)
                .show(ui, |ui| {
                    for device in &app.scanned_devices {
                        ui.horizontal(|ui| {
                            let rssi = device
                                .signal_strength
                                .map(|s| format!("{} dBm", s))
                                .unwrap_or_else(|| "n/a".to_string());
                            ui.label(format!("{} ({})", device.name, rssi));
                            if ui
                                .add_enabled(can_connect, egui::Button::new("Connect"))
                                .clicked()
                            {
                                picked = Some(device.id.clone());
                            }
                        });
                    }
                });
            if let Some(id) = picked {
                app.send_bluetooth(BluetoothCommand::Connect(id));
            }
        }
    });
}

fn ui_progress_panel(app: &mut AccuAimApp, ui: &mut egui::Ui, active: &ActiveSession) {
    let progress = &active.progress;
    let palette = BrutalistPalette::for_ui(ui);

    if app.session_complete || progress.is_complete() {
        Components::status_banner(
            ui,
            "SESSION COMPLETE",
            palette.accent_green,
            egui::Color32::BLACK,
        );
        ui.add_space(10.0);
    }

    Components::brutalist_card(ui, &format!("Session #{}", progress.session_id()), |ui| {
        ui.horizontal_wrapped(|ui| {
            Components::stat_tile(ui, "Made", &progress.made_total().to_string());
            Components::stat_tile(ui, "Missed", &progress.missed_total().to_string());
            Components::stat_tile(ui, "Planned", &progress.planned_total().to_string());
        });
        ui.add_space(10.0);

        for (i, block) in progress.blocks().iter().enumerate() {
            let is_active = i == progress.active_index();
            let fraction = if block.shots_planned == 0 {
                1.0
            } else {
                (block.made_shots as f32 / block.shots_planned as f32).min(1.0)
            };

            ui.horizontal(|ui| {
                let title = if is_active {
                    egui::RichText::new(format!("▶ {}", block.target_area.label())).strong()
                } else {
                    egui::RichText::new(block.target_area.label())
                };
                ui.add_sized([150.0, 20.0], egui::Label::new(title));
                ui.add(
                    egui::ProgressBar::new(fraction)
                        .desired_width(320.0)
                        .fill(palette.block_fill(block.is_finished(), is_active))
                        .text(format!("{} / {}", block.made_shots, block.shots_planned)),
                );
            });
        }
    });

    ui.add_space(10.0);

    ui.horizontal(|ui| {
        if ui
            .add_enabled(!progress.is_complete(), egui::Button::new("Finish Block"))
            .clicked()
        {
            finish_block(app);
        }
        if ui
            .add_enabled(!app.is_busy(), egui::Button::new("Finish Session"))
            .clicked()
        {
            finish_session(app, active);
        }
    });
}

fn finish_block(app: &mut AccuAimApp) {
    let completed = match app.session.lock() {
        Ok(mut guard) => match guard.as_mut() {
            Some(active) => {
                active.progress.finish_block_manually();
                info!(
                    "Block finished manually, active index now {}",
                    active.progress.active_index()
                );
                active.progress.is_complete()
            }
            None => return,
        },
        Err(_) => return,
    };
    if completed {
        app.session_complete = true;
        app.set_status("All blocks finished", MessageSeverity::Success);
    }
}

fn finish_session(app: &mut AccuAimApp, active: &ActiveSession) {
    let api = app.api.clone();
    let user_id = active.user_id;
    let session_id = active.session_id();
    app.send_bluetooth(BluetoothCommand::Disconnect);
    app.spawn_request(
        async move {
            api.finish_session(user_id, session_id)
                .await
                .map(|_| session_id)
        },
        AppEvent::SessionFinished,
    );
}
