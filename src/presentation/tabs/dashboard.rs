use crate::presentation::app::{AccuAimApp, Tab};
use crate::presentation::components::Components;
use eframe::egui;

pub fn render(app: &mut AccuAimApp, ui: &mut egui::Ui) {
    let name = app.user.as_ref().map(|u| u.name.clone()).unwrap_or_default();
    Components::heading(ui, &format!("Welcome back, {}", name));
    ui.add_space(20.0);

    if let Some(msg) = &app.status_message {
        Components::status_message(ui, msg);
        ui.add_space(10.0);
    }

    Components::brutalist_card(ui, "Your Stats", |ui| match &app.dashboard {
        Some(stats) => {
            ui.horizontal_wrapped(|ui| {
                Components::stat_tile(ui, "All-time accuracy", &percent(&stats.all_time_accuracy));
                Components::stat_tile(
                    ui,
                    "Last session",
                    &percent(&stats.last_session_accuracy),
                );
                Components::stat_tile(ui, "Day streak", &stats.streak.to_string());
            });
            ui.label(format!(
                "{} made of {} planned shots",
                stats.total_made, stats.total_planned
            ));
        }
        None => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading stats...");
            });
        }
    });

    ui.add_space(10.0);

    let has_active = app
        .session
        .lock()
        .map(|s| s.is_some())
        .unwrap_or(false);

    ui.horizontal(|ui| {
        if has_active {
            if ui.button("Resume Active Session").clicked() {
                app.select_tab(Tab::ActiveSession);
            }
        } else if ui.button("Start New Session").clicked() {
            app.select_tab(Tab::CreateSession);
        }
        if ui.button("Refresh").clicked() {
            app.refresh_dashboard();
        }
    });
}

/// Server sends accuracies as bare numbers in text, sometimes empty
fn percent(value: &str) -> String {
    let value = value.trim().trim_end_matches('%');
    if value.is_empty() {
        "-".to_string()
    } else {
        format!("{}%", value)
    }
}
