use crate::ui;

use eframe::egui;
use eframe::{App, Frame};
use sketchml::{CoordinateMapper, PredictionClient, Session, Studio, SyncChannel};

/// The main application struct.
/// All sketch state lives in the studio; this only wires it to egui.
pub struct SketchApp {
    pub studio: Studio,
}

impl SketchApp {
    /// Opens the training channel and the prediction client for `session`.
    /// Both wake the UI whenever a reply lands.
    pub fn new(session: &Session, ctx: &egui::Context) -> Self {
        let repaint = ctx.clone();
        let sync = SyncChannel::open(session, move || repaint.request_repaint());
        let repaint = ctx.clone();
        let predictor = PredictionClient::new(session, move || repaint.request_repaint());

        Self {
            studio: Studio::new(
                CoordinateMapper::default(),
                Box::new(sync),
                Box::new(predictor),
            ),
        }
    }
}

impl App for SketchApp {
    /// Called by eframe on every frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.studio.tick();
        ui::draw_side_panel(&mut self.studio, ctx);
        ui::draw_central_panel(&mut self.studio, ctx);
    }
}
