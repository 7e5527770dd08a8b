use crate::domain::models::{AppEvent, BlockPlan, TargetArea};
use crate::domain::validation;
use crate::presentation::app::AccuAimApp;
use crate::presentation::components::Components;
use eframe::egui;

const MAX_BLOCKS: usize = 8;

pub fn render(app: &mut AccuAimApp, ui: &mut egui::Ui) {
    Components::heading(ui, "New Session");
    ui.add_space(20.0);

    if let Some(msg) = &app.status_message {
        Components::status_message(ui, msg);
        ui.add_space(10.0);
    }

    Components::brutalist_card(ui, "Blocks", |ui| {
        let mut remove = None;
        egui::Grid::new("block_plans")
            .spacing([20.0, 8.0])
            .show(ui, |ui| {
                ui.label(egui::RichText::new("#").strong());
                ui.label(egui::RichText::new("Target").strong());
                ui.label(egui::RichText::new("Shots").strong());
                ui.end_row();

                let count = app.block_plans.len();
                for (i, plan) in app.block_plans.iter_mut().enumerate() {
                    ui.label(format!("{}", i + 1));
                    egui::ComboBox::from_id_salt(("target_area", i))
                        .selected_text(plan.target_area.label())
                        .show_ui(ui, |ui| {
                            for area in TargetArea::ALL {
                                ui.selectable_value(&mut plan.target_area, area, area.label());
                            }
                        });
                    ui.add(egui::DragValue::new(&mut plan.shots_planned).range(0..=100));
                    if count > 1 && ui.button("Remove").clicked() {
                        remove = Some(i);
                    }
                    ui.end_row();
                }
            });

        if let Some(i) = remove {
            app.block_plans.remove(i);
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(
                    app.block_plans.len() < MAX_BLOCKS,
                    egui::Button::new("Add Block"),
                )
                .clicked()
            {
                app.block_plans.push(next_plan(&app.block_plans));
            }
            let total: u32 = app.block_plans.iter().map(|p| p.shots_planned).sum();
            ui.label(format!("{} shots planned", total));
        });
    });

    ui.add_space(10.0);

    let has_active = app.session.lock().map(|s| s.is_some()).unwrap_or(false);
    if has_active {
        ui.label(
            egui::RichText::new("Starting a new session replaces the one in progress.")
                .italics()
                .size(12.0),
        );
    }

    if ui
        .add_enabled(!app.is_busy(), egui::Button::new("Start Session"))
        .clicked()
    {
        start_session(app);
    }
}

/// New rows default to the next target area after the last row
fn next_plan(plans: &[BlockPlan]) -> BlockPlan {
    let Some(last) = plans.last() else {
        return BlockPlan::default();
    };
    let index = TargetArea::ALL
        .iter()
        .position(|a| *a == last.target_area)
        .unwrap_or(0);
    BlockPlan {
        target_area: TargetArea::ALL[(index + 1) % TargetArea::ALL.len()],
        shots_planned: last.shots_planned,
    }
}

fn start_session(app: &mut AccuAimApp) {
    if let Err(e) = validation::validate_blocks(&app.block_plans) {
        app.show_error(&e);
        return;
    }
    let Some(user_id) = app.user_id() else {
        return;
    };

    let plans = app.block_plans.clone();
    let api = app.api.clone();
    app.spawn_request(
        async move { api.start_session(user_id, &plans).await },
        AppEvent::SessionStarted,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_plan_cycles_target_areas() {
        let plans = vec![BlockPlan {
            target_area: TargetArea::FiveHole,
            shots_planned: 4,
        }];
        let next = next_plan(&plans);
        assert_eq!(next.target_area, TargetArea::TopRight);
        assert_eq!(next.shots_planned, 4);
        assert_eq!(next_plan(&[]), BlockPlan::default());
    }
}
