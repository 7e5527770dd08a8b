use crate::domain::models::AppEvent;
use crate::domain::validation;
use crate::presentation::app::AccuAimApp;
use crate::presentation::components::Components;
use eframe::egui;

/// Account screen mode. Only one form can be open at a time and each carries
/// just its own fields.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountView {
    Main,
    EditingProfile { name: String, email: String },
    ChangingPassword {
        current: String,
        new: String,
        confirm: String,
    },
    ConfirmingDelete { password: String },
}

pub fn render(app: &mut AccuAimApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Account");
    ui.add_space(20.0);

    if let Some(msg) = &app.status_message {
        Components::status_message(ui, msg);
        ui.add_space(10.0);
    }

    let Some(user) = app.user.clone() else {
        return;
    };

    // Edit a detached copy, then store it back unless an action replaced it
    let mut view = app.account_view.clone();
    let mut action = None;

    match &mut view {
        AccountView::Main => {
            Components::brutalist_card(ui, "Profile", |ui| {
                egui::Grid::new("profile_grid")
                    .spacing([20.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("Name:");
                        ui.label(&user.name);
                        ui.end_row();
                        ui.label("Email:");
                        ui.label(&user.email);
                        ui.end_row();
                    });
            });
            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui.button("Edit Profile").clicked() {
                    action = Some(Action::Open(AccountView::EditingProfile {
                        name: user.name.clone(),
                        email: user.email.clone(),
                    }));
                }
                if ui.button("Change Password").clicked() {
                    action = Some(Action::Open(AccountView::ChangingPassword {
                        current: String::new(),
                        new: String::new(),
                        confirm: String::new(),
                    }));
                }
                if ui.button("Log Out").clicked() {
                    action = Some(Action::LogOut);
                }
            });
            ui.add_space(20.0);
            if ui
                .button(egui::RichText::new("Delete Account").color(egui::Color32::RED))
                .clicked()
            {
                action = Some(Action::Open(AccountView::ConfirmingDelete {
                    password: String::new(),
                }));
            }
        }
        AccountView::EditingProfile { name, email } => {
            Components::brutalist_card(ui, "Edit Profile", |ui| {
                Components::form_field(ui, "Name:", name, false);
                Components::form_field(ui, "Email:", email, false);
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        action = Some(Action::SaveProfile);
                    }
                    if ui.button("Cancel").clicked() {
                        action = Some(Action::Open(AccountView::Main));
                    }
                });
            });
        }
        AccountView::ChangingPassword {
            current,
            new,
            confirm,
        } => {
            Components::brutalist_card(ui, "Change Password", |ui| {
                Components::form_field(ui, "Current:", current, true);
                Components::form_field(ui, "New:", new, true);
                Components::form_field(ui, "Confirm new:", confirm, true);
                ui.horizontal(|ui| {
                    if ui.button("Update Password").clicked() {
                        action = Some(Action::ChangePassword);
                    }
                    if ui.button("Cancel").clicked() {
                        action = Some(Action::Open(AccountView::Main));
                    }
                });
            });
        }
        AccountView::ConfirmingDelete { password } => {
            Components::brutalist_card(ui, "Delete Account", |ui| {
                ui.label(
                    egui::RichText::new("This removes your account and all sessions.")
                        .color(egui::Color32::RED)
                        .strong(),
                );
                Components::form_field(ui, "Password:", password, true);
                ui.horizontal(|ui| {
                    if ui.button("Delete Forever").clicked() {
                        action = Some(Action::Delete);
                    }
                    if ui.button("Cancel").clicked() {
                        action = Some(Action::Open(AccountView::Main));
                    }
                });
            });
        }
    }

    app.account_view = view;
    if let Some(action) = action {
        apply(app, user.id, action);
    }
}

enum Action {
    Open(AccountView),
    SaveProfile,
    ChangePassword,
    Delete,
    LogOut,
}

fn apply(app: &mut AccuAimApp, user_id: i64, action: Action) {
    let api = app.api.clone();
    match (action, app.account_view.clone()) {
        (Action::Open(view), _) => app.account_view = view,
        (Action::LogOut, _) => app.log_out(),
        (Action::SaveProfile, AccountView::EditingProfile { name, email }) => {
            if let Err(e) = validation::validate_profile(&name, &email) {
                app.show_error(&e);
                return;
            }
            app.spawn_request(
                async move {
                    api.update_profile(user_id, name.trim(), email.trim())
                        .await
                },
                AppEvent::ProfileUpdated,
            );
        }
        (
            Action::ChangePassword,
            AccountView::ChangingPassword {
                current,
                new,
                confirm,
            },
        ) => {
            if let Err(e) = validation::validate_password_change(&current, &new, &confirm) {
                app.show_error(&e);
                return;
            }
            app.spawn_request(
                async move { api.change_password(user_id, &current, &new).await },
                AppEvent::PasswordChanged,
            );
        }
        (Action::Delete, AccountView::ConfirmingDelete { password }) => {
            if let Err(e) = validation::validate_delete(&password) {
                app.show_error(&e);
                return;
            }
            app.spawn_request(
                async move { api.delete_account(user_id, &password).await },
                AppEvent::AccountDeleted,
            );
        }
        _ => {}
    }
}
