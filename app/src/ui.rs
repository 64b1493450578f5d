use ecolor::Color32;
use eframe::egui::{self, Align2, FontId, Pos2, Rect, RichText, Sense, Ui, Vec2};
use sketchml::protocol::{format_metric_key, format_value};
use sketchml::render::{self, Anchor, Shape};
use sketchml::studio::CLASS_LABELS;
use sketchml::{Algorithm, Kernel, ParamField, ParamValue, ScreenPos, Studio};

const CONNECTED: Color32 = Color32::from_rgb(0x00, 0xff, 0x88);
const DISCONNECTED: Color32 = Color32::from_rgb(0xff, 0x44, 0x44);

/// Draws the entire left-side panel with all the controls.
pub fn draw_side_panel(studio: &mut Studio, ctx: &egui::Context) {
    egui::SidePanel::left("controls_panel")
        .min_width(280.0)
        .show(ctx, |ui| {
            ui.heading("SketchML");
            draw_connection_status(studio, ui);
            ui.separator();

            draw_algorithm_selector(studio, ui);
            if studio.algorithm().is_classification() {
                draw_label_selector(studio, ui);
            }
            ui.separator();

            draw_parameter_controls(studio, ui);
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                draw_model_output(studio, ui);
                draw_test_point(studio, ui);
                ui.separator();

                ui.label(format!("Points: {}", studio.points().len()));
                if ui.button("Clear All").clicked() {
                    studio.clear_all();
                }
                ui.separator();
                ui.small("Click to add a point. Click a point to remove it.");
                ui.small("Shift+click to place the test point.");
            });
        });
}

/// Draws the plot and turns clicks on it into studio gestures.
pub fn draw_central_panel(studio: &mut Studio, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let viewport = *studio.mapper().viewport();
        let size = Vec2::new(viewport.width as f32, viewport.height as f32);
        let (response, painter) = ui.allocate_painter(size, Sense::click());
        let origin = response.rect.min;
        let to_screen = |p: ScreenPos| origin + Vec2::new(p.x as f32, p.y as f32);

        let scene = studio.scene();
        for layer in &scene.layers {
            for shape in &layer.shapes {
                paint_shape(&painter, shape, to_screen);
            }
        }

        if response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let local = pointer - origin;
                let shift = ui.input(|i| i.modifiers.shift);
                studio.click(ScreenPos::new(local.x as f64, local.y as f64), shift);
            }
        }
    });
}

fn paint_shape(painter: &egui::Painter, shape: &Shape, to_screen: impl Fn(ScreenPos) -> Pos2) {
    let stroke = |s: &render::Stroke| egui::Stroke::new(s.width as f32, s.color);
    match shape {
        Shape::Rect { min, max, fill } => {
            painter.rect_filled(Rect::from_min_max(to_screen(*min), to_screen(*max)), 0.0, *fill);
        }
        Shape::Circle {
            center,
            radius,
            fill,
            stroke: outline,
        } => {
            let center = to_screen(*center);
            let radius = *radius as f32;
            if let Some(fill) = fill {
                painter.circle_filled(center, radius, *fill);
            }
            if let Some(outline) = outline {
                painter.circle_stroke(center, radius, stroke(outline));
            }
        }
        Shape::Segment {
            from,
            to,
            stroke: line,
        } => {
            painter.line_segment([to_screen(*from), to_screen(*to)], stroke(line));
        }
        Shape::Polyline {
            points,
            stroke: line,
        } => {
            let points = points.iter().map(|p| to_screen(*p)).collect();
            painter.add(egui::Shape::line(points, stroke(line)));
        }
        Shape::Text {
            at,
            anchor,
            text,
            color,
        } => {
            let align = match anchor {
                Anchor::CenterTop => Align2::CENTER_TOP,
                Anchor::RightCenter => Align2::RIGHT_CENTER,
            };
            painter.text(to_screen(*at), align, text, FontId::proportional(11.0), *color);
        }
    }
}

fn draw_connection_status(studio: &Studio, ui: &mut Ui) {
    let (color, text) = if studio.is_connected() {
        (CONNECTED, "● Connected")
    } else {
        (DISCONNECTED, "● Disconnected")
    };
    ui.colored_label(color, text);
}

fn draw_algorithm_selector(studio: &mut Studio, ui: &mut Ui) {
    ui.label(RichText::new("Algorithm").strong());
    let mut selected = studio.algorithm();

    egui::ComboBox::from_id_salt("algorithm")
        .selected_text(selected.display_name())
        .show_ui(ui, |ui| {
            for algorithm in Algorithm::ALL {
                ui.selectable_value(&mut selected, algorithm, algorithm.display_name());
            }
        });

    // Switching drops every point, the test point and the last model.
    studio.set_algorithm(selected);
}

fn draw_label_selector(studio: &mut Studio, ui: &mut Ui) {
    ui.horizontal(|ui| {
        ui.label("Class:");
        for label in CLASS_LABELS {
            let text = RichText::new(format!("Class {label}")).color(render::palette_color(label));
            if ui
                .selectable_label(studio.current_label() == label, text)
                .clicked()
            {
                studio.select_label(label);
            }
        }
    });
}

fn draw_parameter_controls(studio: &mut Studio, ui: &mut Ui) {
    let fields = ParamField::editable_for(studio.algorithm());
    if fields.is_empty() {
        ui.label("No parameters to tune.");
        return;
    }
    ui.label(RichText::new("Parameters").strong());
    for &field in fields {
        if field == ParamField::MaxDepth {
            draw_max_depth_slider(studio, ui);
            continue;
        }
        if let Some(value) = draw_param(studio.params().get(field), field, ui) {
            studio.set_param(value);
        }
    }
}

/// Draws the control for one field; returns the new value if it was edited.
fn draw_param(value: ParamValue, field: ParamField, ui: &mut Ui) -> Option<ParamValue> {
    match value {
        ParamValue::C(mut c) => {
            let range = field.range()?;
            let slider = egui::Slider::new(&mut c, range.min..=range.max)
                .step_by(range.step)
                .text(field.label());
            ui.add(slider).changed().then_some(ParamValue::C(c))
        }
        ParamValue::NClusters(n) => int_slider(n, field, ui).map(ParamValue::NClusters),
        ParamValue::NNeighbors(n) => int_slider(n, field, ui).map(ParamValue::NNeighbors),
        ParamValue::NEstimators(n) => int_slider(n, field, ui).map(ParamValue::NEstimators),
        ParamValue::Kernel(mut kernel) => {
            let before = kernel;
            egui::ComboBox::from_label(field.label())
                .selected_text(kernel.to_string())
                .show_ui(ui, |ui| {
                    for option in Kernel::ALL {
                        ui.selectable_value(&mut kernel, option, option.to_string());
                    }
                });
            (kernel != before).then_some(ParamValue::Kernel(kernel))
        }
        ParamValue::Gamma(_) | ParamValue::MaxDepth(_) => None,
    }
}

fn int_slider(mut n: i64, field: ParamField, ui: &mut Ui) -> Option<i64> {
    let range = field.range()?;
    let slider = egui::Slider::new(&mut n, range.min as i64..=range.max as i64)
        .step_by(range.step)
        .text(field.label());
    ui.add(slider).changed().then_some(n)
}

fn draw_max_depth_slider(studio: &mut Studio, ui: &mut Ui) {
    let Some(range) = ParamField::MaxDepth.range() else {
        return;
    };
    let mut depth = studio.params().max_depth_slider();
    let slider = egui::Slider::new(&mut depth, range.min as i64..=range.max as i64)
        .step_by(range.step)
        .text(ParamField::MaxDepth.label());
    if ui.add(slider).changed() {
        studio.set_max_depth_slider(depth);
    }
    if depth == 0 {
        ui.small("0 = no limit");
    }
}

fn draw_model_output(studio: &Studio, ui: &mut Ui) {
    let Some(payload) = studio.payload() else {
        return;
    };
    if let Some(parameters) = payload.parameters.as_ref().filter(|p| !p.is_empty()) {
        ui.label(RichText::new("Model Parameters").strong());
        for (key, value) in parameters {
            ui.monospace(format!("{key}: {}", format_value(value)));
        }
        ui.separator();
    }
    if let Some(metrics) = payload.metrics.as_ref().filter(|m| !m.is_empty()) {
        ui.label(RichText::new("Metrics").strong());
        for (key, value) in metrics {
            ui.monospace(format!("{}: {}", format_metric_key(key), format_value(value)));
        }
        ui.separator();
    }
}

fn draw_test_point(studio: &mut Studio, ui: &mut Ui) {
    let Some(point) = studio.test_point() else {
        return;
    };
    ui.label(RichText::new("Test Point").strong());
    ui.label(format!("({:.2}, {:.2})", point.x, point.y));
    match studio.prediction() {
        Some(prediction) => ui.colored_label(render::TEST_POINT, format!("Prediction: {prediction}")),
        None => ui.weak("Waiting for prediction..."),
    };
    if ui.button("Clear Test Point").clicked() {
        studio.clear_test_point();
    }
}
