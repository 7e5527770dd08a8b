use crate::domain::models::AppEvent;
use crate::domain::validation;
use crate::presentation::app::{AccuAimApp, Tab};
use crate::presentation::components::Components;
use eframe::egui;

#[derive(Debug, Default, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub fn render(app: &mut AccuAimApp, ui: &mut egui::Ui) {
    Components::heading(ui, "AccuAim");
    ui.label("Track every shot.");
    ui.add_space(20.0);

    if let Some(msg) = &app.status_message {
        Components::status_message(ui, msg);
        ui.add_space(10.0);
    }

    Components::brutalist_card(ui, "Log In", |ui| {
        Components::form_field(ui, "Email:", &mut app.login_form.email, false);
        Components::form_field(ui, "Password:", &mut app.login_form.password, true);

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            let submit = ui.add_enabled(!app.is_busy(), egui::Button::new("Log In"));
            if submit.clicked() {
                submit_login(app);
            }
            if ui.link("No account yet? Sign up").clicked() {
                app.select_tab(Tab::SignUp);
            }
        });
    });
}

fn submit_login(app: &mut AccuAimApp) {
    let email = app.login_form.email.trim().to_string();
    if let Err(e) = validation::validate_login(&email) {
        app.show_error(&e);
        return;
    }

    let password = app.login_form.password.clone();
    let api = app.api.clone();
    app.spawn_request(
        async move { api.login(&email, &password).await },
        AppEvent::LoggedIn,
    );
}
