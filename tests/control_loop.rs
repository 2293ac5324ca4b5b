// Host-side integration tests: store, camera controller, property editor and
// frame loop wired together the way the viewer does it, minus window and GPU.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use hypercube::audio::CountingCue;
use hypercube::config::ViewerConfig;
use hypercube::controller::{
    apply_edge, ButtonEdge, CameraController, Direction, FrameLoop, PanelAction, PropertyEditor,
};
use hypercube::model::{SceneObjectStore, StoreEvent};

struct Viewer {
    store: Rc<RefCell<SceneObjectStore>>,
    camera: Rc<RefCell<CameraController>>,
    editor: PropertyEditor,
    frame_loop: FrameLoop,
    cue: Rc<CountingCue>,
    events: Rc<RefCell<Vec<StoreEvent>>>,
}

fn viewer() -> Viewer {
    let store = Rc::new(RefCell::new(SceneObjectStore::new()));
    let events = Rc::new(RefCell::new(Vec::new()));
    {
        let events = events.clone();
        store
            .borrow_mut()
            .subscribe(move |event| events.borrow_mut().push(*event));
    }
    store.borrow_mut().create_object();

    let cue = Rc::new(CountingCue::default());
    let camera = Rc::new(RefCell::new(CameraController::new(
        &ViewerConfig::default(),
        cue.clone(),
    )));
    let editor = PropertyEditor::new(store.clone());
    let frame_loop = FrameLoop::new(camera.clone());

    Viewer {
        store,
        camera,
        editor,
        frame_loop,
        cue,
        events,
    }
}

#[test]
fn button_press_moves_camera_on_the_next_frame() {
    let mut v = viewer();
    let camera = v.camera.clone();
    let home = camera.borrow().position();

    // Frame 1: the UI pump delivers a press.
    let report = v.frame_loop.run_frame(&mut || {
        apply_edge(
            PanelAction::Move(Direction::Up),
            ButtonEdge::Pressed,
            &mut camera.borrow_mut(),
        );
    });
    assert_eq!(report.camera_steps, 0);
    assert_eq!(v.cue.count(), 1);

    // Frame 2: the tick applies it before the UI sees the release.
    let report = v.frame_loop.run_frame(&mut || {
        apply_edge(
            PanelAction::Move(Direction::Up),
            ButtonEdge::Released,
            &mut camera.borrow_mut(),
        );
    });
    assert_eq!(report.camera_steps, 1);
    assert_eq!(camera.borrow().position(), home + Vec3::Y);

    // Held or not, no further movement without a new press.
    let report = v.frame_loop.run_frame(&mut || {});
    assert_eq!(report.camera_steps, 0);
    assert_eq!(v.frame_loop.frames(), 3);
}

#[test]
fn reset_button_returns_home_and_plays_sound() {
    let mut v = viewer();
    let camera = v.camera.clone();
    let home = camera.borrow().position();

    camera.borrow_mut().set_key(Direction::VUp, true);
    camera.borrow_mut().set_key(Direction::Left, true);
    v.frame_loop.run_frame(&mut || {});
    assert_eq!(camera.borrow().position(), home + Vec3::new(-1.0, 0.0, 1.0));

    v.frame_loop.run_frame(&mut || {
        apply_edge(PanelAction::Reset, ButtonEdge::Pressed, &mut camera.borrow_mut());
        apply_edge(PanelAction::Reset, ButtonEdge::Released, &mut camera.borrow_mut());
    });
    assert_eq!(camera.borrow().position(), home);
    assert_eq!(v.cue.count(), 3);
}

#[test]
fn editing_objects_through_the_editor_reaches_the_store() {
    let mut v = viewer();

    v.editor.select_object("Object 0");
    assert_eq!(v.editor.position_text(), "0.00, 0.00, 0.00");
    assert_eq!(v.editor.scale_text(), "1.00, 1.00, 1.00");

    v.editor.submit("1, 2, 3", "2, 2, 2").unwrap();
    let index = v.editor.create_and_select_new();
    assert_eq!(index, 1);
    assert_eq!(v.editor.selection_label(), "Object 1");
    assert_eq!(
        v.editor.menu_entries(),
        &["Object 0", "Object 1", "Create New Object"]
    );

    v.editor.submit("-1.5, 0, 4", "1, 1, 3").unwrap();
    assert!(v.editor.submit("a, b, c", "1, 1, 1").is_err());
    assert!(v.editor.pending_error().is_some());

    let store = v.store.borrow();
    assert_eq!(store.get(0).unwrap().position, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(store.get(1).unwrap().scale, Vec3::new(1.0, 1.0, 3.0));

    // Created 0, updated 0, created 1, updated 1. The rejected submit left no trace.
    let events = v.events.borrow();
    let indices: Vec<usize> = events.iter().map(StoreEvent::index).collect();
    assert_eq!(indices, vec![0, 0, 1, 1]);
    assert!(matches!(events[2], StoreEvent::Created { index: 1, .. }));
}

#[test]
fn unknown_selection_falls_back_to_first_object() {
    let mut v = viewer();
    v.editor.create_and_select_new();
    v.editor.select_object("Create New Object");
    assert_eq!(v.editor.current_index(), 0);
    v.editor.select_object("Object 9");
    assert_eq!(v.editor.current_index(), 0);
    assert_eq!(v.store.borrow().len(), 2);
}
