use std::cell::RefCell;

use egui::{Context, TextureHandle, TextureOptions};
use tracing::debug;

use crate::controller::input::{apply_edge, ButtonLatch, PanelAction, PANEL_LAYOUT};
use crate::controller::property_editor::CREATE_ENTRY;
use crate::controller::{CameraController, PropertyEditor};

struct PanelControl {
    action: PanelAction,
    texture: TextureHandle,
    latch: ButtonLatch,
    /// Where the button was laid out on the last frame
    rect: egui::Rect,
}

/// The viewer's egui windows: movement panel, properties panel and the
/// invalid input dialog
pub struct ViewerUi {
    controls: Vec<PanelControl>,
    icon_size: f32,
}

impl ViewerUi {
    /// Uploads the decoded icons as egui textures.
    pub fn new(ctx: &Context, icons: Vec<(PanelAction, egui::ColorImage)>, icon_size: u32) -> Self {
        let controls = icons
            .into_iter()
            .map(|(action, image)| PanelControl {
                action,
                texture: ctx.load_texture(
                    format!("icon_{}", action.icon_name()),
                    image,
                    TextureOptions::LINEAR,
                ),
                latch: ButtonLatch::default(),
                rect: egui::Rect::NOTHING,
            })
            .collect();
        Self {
            controls,
            icon_size: icon_size as f32,
        }
    }

    pub fn show(
        &mut self,
        ctx: &Context,
        camera: &RefCell<CameraController>,
        editor: &mut PropertyEditor,
        fps: f32,
    ) {
        self.movement_window(ctx, camera, fps);
        properties_window(ctx, editor);
        invalid_input_modal(ctx, editor);
    }

    fn movement_window(&mut self, ctx: &Context, camera: &RefCell<CameraController>, fps: f32) {
        let icon_size = self.icon_size;
        let controls = &mut self.controls;

        egui::Window::new("Movement")
            .default_pos([8.0, 8.0])
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("movement_grid")
                    .spacing([4.0, 4.0])
                    .show(ui, |ui| {
                        for row in PANEL_LAYOUT {
                            for cell in row {
                                let control = cell.and_then(|action| {
                                    controls.iter_mut().find(|c| c.action == action)
                                });
                                match control {
                                    Some(control) => control_button(ui, control, icon_size, camera),
                                    None => {
                                        ui.allocate_space(egui::vec2(icon_size, icon_size));
                                    }
                                }
                            }
                            ui.end_row();
                        }
                    });

                ui.separator();
                let eye = camera.borrow().position();
                ui.label(
                    egui::RichText::new(format!(
                        "Camera: x {:.2} y {:.2} z {:.2}",
                        eye.x, eye.y, eye.z
                    ))
                    .small(),
                );
                ui.label(egui::RichText::new(format!("FPS: {fps:.0}")).small());
            });
    }
}

fn control_button(
    ui: &mut egui::Ui,
    control: &mut PanelControl,
    icon_size: f32,
    camera: &RefCell<CameraController>,
) {
    let sized = egui::load::SizedTexture::new(control.texture.id(), egui::vec2(icon_size, icon_size));
    let response = ui
        .add(egui::Button::image(egui::Image::from_texture(sized)))
        .on_hover_text(control.action.tooltip());

    control.rect = response.rect;

    let edge = control
        .latch
        .update(response.is_pointer_button_down_on(), response.clicked());
    if let Some(edge) = edge {
        apply_edge(control.action, edge, &mut camera.borrow_mut());
    }
}

fn properties_window(ctx: &Context, editor: &mut PropertyEditor) {
    egui::Window::new("Properties")
        .default_pos([8.0, 280.0])
        .resizable(false)
        .show(ctx, |ui| {
            let mut chosen: Option<String> = None;
            egui::ComboBox::from_id_salt("object_select")
                .selected_text(editor.selection_label())
                .show_ui(ui, |ui| {
                    for entry in editor.menu_entries() {
                        let selected = entry.as_str() == editor.selection_label();
                        if ui.selectable_label(selected, entry.as_str()).clicked() {
                            chosen = Some(entry.clone());
                        }
                    }
                });
            if let Some(token) = chosen {
                debug!("object menu picked {token:?}");
                editor.select_object(&token);
            }

            ui.label("Position (x, y, z):");
            ui.text_edit_singleline(editor.position_text_mut());
            ui.label("Scale (x, y, z):");
            ui.text_edit_singleline(editor.scale_text_mut());

            ui.horizontal(|ui| {
                if ui.button("Update Object").clicked() {
                    // Failure is kept on the editor and shown by the modal.
                    let _ = editor.submit_fields();
                }
                if ui.button(CREATE_ENTRY).clicked() {
                    editor.create_and_select_new();
                }
            });
        });
}

fn invalid_input_modal(ctx: &Context, editor: &mut PropertyEditor) {
    let Some(err) = editor.pending_error() else {
        return;
    };
    let message = err.to_string();

    let mut dismissed = false;
    let modal = egui::Modal::new(egui::Id::new("invalid_input")).show(ctx, |ui| {
        ui.heading("Invalid Input");
        ui.label("Please enter valid numbers in the format 'x, y, z' for position and scale.");
        ui.label(egui::RichText::new(message).small().weak());
        ui.add_space(8.0);
        if ui.button("OK").clicked() {
            dismissed = true;
        }
    });
    if dismissed || modal.should_close() {
        editor.dismiss_error();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::audio::CountingCue;
    use crate::config::ViewerConfig;
    use crate::controller::input::panel_actions;
    use crate::model::SceneObjectStore;

    fn blank_icons() -> Vec<(PanelAction, egui::ColorImage)> {
        panel_actions()
            .map(|action| (action, egui::ColorImage::from_rgba_unmultiplied([4, 4], &[255; 64])))
            .collect()
    }

    #[test]
    fn ui_runs_headless_without_moving_the_camera() {
        let ctx = Context::default();
        let mut ui = ViewerUi::new(&ctx, blank_icons(), 50);
        assert_eq!(ui.controls.len(), 7);

        let config = ViewerConfig::default();
        let cue = Rc::new(CountingCue::default());
        let camera = RefCell::new(CameraController::new(&config, cue.clone()));
        let store = Rc::new(RefCell::new(SceneObjectStore::new()));
        store.borrow_mut().create_object();
        let mut editor = PropertyEditor::new(store);

        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                ui.show(ctx, &camera, &mut editor, 60.0);
            });
        }

        assert!(!camera.borrow().keys().any_pending());
        assert_eq!(camera.borrow().position(), config.camera_home);
        assert_eq!(cue.count(), 0);
    }

    fn pointer_input(events: Vec<egui::Event>) -> egui::RawInput {
        egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(1280.0, 720.0),
            )),
            events,
            ..Default::default()
        }
    }

    fn primary(pos: egui::Pos2, pressed: bool) -> egui::Event {
        egui::Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: egui::Modifiers::default(),
        }
    }

    #[test]
    fn quick_tap_on_a_direction_button_plays_sound_and_queues_a_step() {
        let ctx = Context::default();
        let mut ui = ViewerUi::new(&ctx, blank_icons(), 50);
        let config = ViewerConfig::default();
        let cue = Rc::new(CountingCue::default());
        let camera = RefCell::new(CameraController::new(&config, cue.clone()));
        let store = Rc::new(RefCell::new(SceneObjectStore::new()));
        store.borrow_mut().create_object();
        let mut editor = PropertyEditor::new(store);

        let mut frame = |ui: &mut ViewerUi, events: Vec<egui::Event>| {
            let _ = ctx.run(pointer_input(events), |ctx| {
                ui.show(ctx, &camera, &mut editor, 60.0);
            });
        };

        // Let the windows settle into their final layout.
        for _ in 0..3 {
            frame(&mut ui, Vec::new());
        }
        let up = PanelAction::Move(crate::controller::Direction::Up);
        let target = ui
            .controls
            .iter()
            .find(|c| c.action == up)
            .map(|c| c.rect.center())
            .unwrap();

        frame(&mut ui, vec![egui::Event::PointerMoved(target)]);
        frame(&mut ui, vec![primary(target, true), primary(target, false)]);
        frame(&mut ui, Vec::new());

        assert_eq!(cue.count(), 1);
        assert!(camera
            .borrow()
            .keys()
            .is_pending(crate::controller::Direction::Up));
        assert_eq!(camera.borrow_mut().tick(), 1);
        assert_eq!(camera.borrow().position(), config.camera_home + glam::Vec3::Y);
    }

    #[test]
    fn modal_stays_until_dismissed() {
        let ctx = Context::default();
        let store = Rc::new(RefCell::new(SceneObjectStore::new()));
        store.borrow_mut().create_object();
        let mut editor = PropertyEditor::new(store);
        assert!(editor.submit("1, 2", "1, 1, 1").is_err());

        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            invalid_input_modal(ctx, &mut editor);
        });
        assert!(editor.pending_error().is_some());
    }
}
