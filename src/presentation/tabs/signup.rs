use crate::domain::models::AppEvent;
use crate::domain::validation;
use crate::presentation::app::{AccuAimApp, Tab};
use crate::presentation::components::Components;
use eframe::egui;

#[derive(Debug, Default, Clone)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
}

pub fn render(app: &mut AccuAimApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Create Account");
    ui.add_space(20.0);

    if let Some(msg) = &app.status_message {
        Components::status_message(ui, msg);
        ui.add_space(10.0);
    }

    Components::brutalist_card(ui, "Sign Up", |ui| {
        let form = &mut app.signup_form;
        Components::form_field(ui, "Full name:", &mut form.name, false);
        Components::form_field(ui, "Email:", &mut form.email, false);
        Components::form_field(ui, "Password:", &mut form.password, true);
        Components::form_field(ui, "Confirm:", &mut form.confirm, true);
        ui.label(
            egui::RichText::new(format!(
                "At least {} characters.",
                validation::MIN_PASSWORD_LEN
            ))
            .italics()
            .size(12.0),
        );

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!app.is_busy(), egui::Button::new("Create Account"))
                .clicked()
            {
                submit_signup(app);
            }
            if ui.link("Back to log in").clicked() {
                app.select_tab(Tab::Login);
            }
        });
    });
}

fn submit_signup(app: &mut AccuAimApp) {
    let form = app.signup_form.clone();
    if let Err(e) =
        validation::validate_signup(&form.name, &form.email, &form.password, &form.confirm)
    {
        app.show_error(&e);
        return;
    }

    let api = app.api.clone();
    app.spawn_request(
        async move {
            api.register(form.name.trim(), form.email.trim(), &form.password)
                .await
        },
        AppEvent::Registered,
    );
}
