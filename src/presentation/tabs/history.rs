use crate::domain::heatmap::{HeatmapGrid, NET_HEIGHT_FT, NET_WIDTH_FT};
use crate::domain::models::{SessionDetails, ShotResult};
use crate::presentation::app::AccuAimApp;
use crate::presentation::components::Components;
use crate::presentation::theme::BrutalistPalette;
use eframe::egui;
use egui_extras::{Column, TableBuilder};

const HEATMAP_COLS: usize = 6;
const HEATMAP_ROWS: usize = 4;

pub fn render(app: &mut AccuAimApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Session History");
    ui.add_space(20.0);

    if let Some(msg) = &app.status_message {
        Components::status_message(ui, msg);
        ui.add_space(10.0);
    }

    ui_session_list(app, ui);

    if let Some(details) = app.selected_session.clone() {
        ui.add_space(15.0);
        ui_session_details(app, ui, &details);
    }
}

fn ui_session_list(app: &mut AccuAimApp, ui: &mut egui::Ui) {
    let mut open = None;

    Components::brutalist_card(ui, "Sessions", |ui| {
        if ui.button("Refresh").clicked() {
            app.refresh_sessions();
        }
        if app.sessions.is_empty() {
            ui.label("No sessions yet.");
            return;
        }

        ui.push_id("sessions_table", |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .max_scroll_height(220.0)
                .column(Column::exact(60.0))
                .column(Column::remainder())
                .column(Column::remainder())
                .column(Column::exact(70.0))
                .header(22.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("#");
                    });
                    header.col(|ui| {
                        ui.strong("Started");
                    });
                    header.col(|ui| {
                        ui.strong("Ended");
                    });
                    header.col(|_| {});
                })
                .body(|mut body| {
                    // Newest first
                    for session in app.sessions.iter().rev() {
                        body.row(24.0, |mut row| {
                            row.col(|ui| {
                                ui.label(session.session_id.to_string());
                            });
                            row.col(|ui| {
                                ui.label(session.start_time.as_deref().unwrap_or("-"));
                            });
                            row.col(|ui| {
                                ui.label(session.end_time.as_deref().unwrap_or("in progress"));
                            });
                            row.col(|ui| {
                                if ui.button("View").clicked() {
                                    open = Some(session.session_id);
                                }
                            });
                        });
                    }
                });
        });
    });

    if let Some(session_id) = open {
        app.open_session_details(session_id);
    }
}

fn ui_session_details(app: &mut AccuAimApp, ui: &mut egui::Ui, details: &SessionDetails) {
    Components::brutalist_card(ui, &format!("Session #{}", details.session_id), |ui| {
        ui.horizontal_wrapped(|ui| {
            Components::stat_tile(ui, "Made", &details.made_shots.to_string());
            Components::stat_tile(ui, "Missed", &details.missed_shots.to_string());
            Components::stat_tile(ui, "Total", &details.total_shots.to_string());
            let pct = if details.shooting_percentage.is_empty() {
                "-".to_string()
            } else {
                format!("{}%", details.shooting_percentage.trim_end_matches('%'))
            };
            Components::stat_tile(ui, "Accuracy", &pct);
        });

        if !details.blocks.is_empty() {
            ui.add_space(10.0);
            Components::sub_heading(ui, "Blocks");
            egui::Grid::new("detail_blocks")
                .striped(true)
                .spacing([30.0, 6.0])
                .show(ui, |ui| {
                    for block in &details.blocks {
                        ui.label(block.target_area.label());
                        ui.label(format!("{} / {} made", block.made_shots, block.shots_planned));
                        ui.label(format!("{} missed", block.missed_shots));
                        ui.end_row();
                    }
                });
        }

        ui.add_space(10.0);
        Components::sub_heading(ui, "Shot Map");
        if details.shots.is_empty() {
            ui.label("No shot positions recorded for this session.");
        } else {
            draw_heatmap(ui, details);
        }

        ui.add_space(10.0);
        if ui.button("Close").clicked() {
            app.selected_session = None;
        }
    });
}

fn draw_heatmap(ui: &mut egui::Ui, details: &SessionDetails) {
    let palette = BrutalistPalette::for_ui(ui);
    let grid = HeatmapGrid::from_shots(&details.shots, HEATMAP_COLS, HEATMAP_ROWS);

    let width = ui.available_width().min(480.0);
    let size = egui::vec2(width, width * NET_HEIGHT_FT / NET_WIDTH_FT);
    let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
    let rect = response.rect;

    let cell_w = rect.width() / grid.cols() as f32;
    let cell_h = rect.height() / grid.rows() as f32;
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let min = rect.min + egui::vec2(col as f32 * cell_w, row as f32 * cell_h);
            let cell = egui::Rect::from_min_size(min, egui::vec2(cell_w, cell_h));
            painter.rect_filled(cell, 0.0, palette.heat(grid.intensity(col, row)));
            let count = grid.count(col, row);
            if count > 0 {
                painter.text(
                    cell.center(),
                    egui::Align2::CENTER_CENTER,
                    count.to_string(),
                    egui::FontId::proportional(14.0),
                    egui::Color32::BLACK,
                );
            }
        }
    }

    // Individual shots on top, y grows upward from the ice
    for shot in &details.shots {
        let pos = egui::pos2(
            rect.left() + shot.x / NET_WIDTH_FT * rect.width(),
            rect.bottom() - shot.y / NET_HEIGHT_FT * rect.height(),
        );
        if !rect.contains(pos) {
            continue;
        }
        let color = match shot.result {
            ShotResult::Made => palette.accent_green,
            ShotResult::Missed => palette.accent_red,
        };
        painter.circle(pos, 4.0, color, egui::Stroke::new(1.0, palette.stroke));
    }

    painter.rect_stroke(rect, 0.0, egui::Stroke::new(3.0, palette.stroke));
    ui.label(format!("{} shots on net", grid.total()));
}
