use crate::domain::models::LeaderboardSort;
use crate::presentation::app::AccuAimApp;
use crate::presentation::components::Components;
use eframe::egui;
use egui_extras::{Column, TableBuilder};

pub fn render(app: &mut AccuAimApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Leaderboard");
    ui.add_space(20.0);

    Components::brutalist_card(ui, "Top Shooters", |ui| {
        ui.horizontal(|ui| {
            ui.label("Sort by:");
            let mut sort = app.leaderboard_sort;
            for option in [LeaderboardSort::Accuracy, LeaderboardSort::TotalMade] {
                ui.selectable_value(&mut sort, option, option.label());
            }
            if sort != app.leaderboard_sort {
                app.leaderboard_sort = sort;
                app.refresh_leaderboard();
            }
        });

        if app.leaderboard.is_empty() {
            ui.label("Nobody on the board yet.");
            return;
        }

        let me = app.user_id();
        ui.push_id("leaderboard_table", |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .column(Column::exact(40.0))
                .column(Column::remainder())
                .column(Column::exact(80.0))
                .column(Column::exact(80.0))
                .column(Column::exact(90.0))
                .header(22.0, |mut header| {
                    for title in ["#", "Name", "Made", "Planned", "Accuracy"] {
                        header.col(|ui| {
                            ui.strong(title);
                        });
                    }
                })
                .body(|mut body| {
                    for (rank, entry) in app.leaderboard.iter().enumerate() {
                        body.row(22.0, |mut row| {
                            let name = if Some(entry.user_id) == me {
                                egui::RichText::new(format!("{} (you)", entry.full_name)).strong()
                            } else {
                                egui::RichText::new(&entry.full_name)
                            };
                            row.col(|ui| {
                                ui.label((rank + 1).to_string());
                            });
                            row.col(|ui| {
                                ui.label(name);
                            });
                            row.col(|ui| {
                                ui.label(entry.total_made.to_string());
                            });
                            row.col(|ui| {
                                ui.label(entry.total_planned.to_string());
                            });
                            row.col(|ui| {
                                ui.label(format!("{}%", entry.accuracy_percent));
                            });
                        });
                    }
                });
        });
    });
}
