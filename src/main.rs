mod domain;
mod infrastructure;
mod presentation;

use eframe::egui;
use presentation::app::AccuAimApp;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 720.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("AccuAim"),
        ..Default::default()
    };

    eframe::run_native(
        "AccuAim",
        options,
        Box::new(|cc| Ok(Box::new(AccuAimApp::new(cc)?))),
    )
}
