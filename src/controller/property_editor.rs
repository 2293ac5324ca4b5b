use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use tracing::{error, info, warn};

use crate::error::{TransformField, TransformParseError};
use crate::model::SceneObjectStore;

pub const CREATE_ENTRY: &str = "Create New Object";
pub const SELECT_PLACEHOLDER: &str = "Select Object";

pub fn object_label(index: usize) -> String {
    format!("Object {index}")
}

/// Parse `"x, y, z"` into a vector. Exactly three comma separated finite numbers.
pub fn parse_triple(text: &str, field: TransformField) -> Result<Vec3, TransformParseError> {
    let tokens: Vec<&str> = text.split(',').map(str::trim).collect();
    let mut values = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let value = token
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| TransformParseError::NotANumber {
                field,
                token: token.to_string(),
            })?;
        values.push(value);
    }
    match values.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(TransformParseError::WrongArity {
            field,
            count: values.len(),
        }),
    }
}

fn format_triple(v: Vec3) -> String {
    format!("{:.2}, {:.2}, {:.2}", v.x, v.y, v.z)
}

/// Backing state of the properties panel, bound to one selected object
pub struct PropertyEditor {
    store: Rc<RefCell<SceneObjectStore>>,
    current_index: usize,
    selection_label: String,
    menu: Vec<String>,
    position_text: String,
    scale_text: String,
    pending_error: Option<TransformParseError>,
}

impl PropertyEditor {
    pub fn new(store: Rc<RefCell<SceneObjectStore>>) -> Self {
        let mut editor = Self {
            store,
            current_index: 0,
            selection_label: SELECT_PLACEHOLDER.to_string(),
            menu: Vec::new(),
            position_text: String::new(),
            scale_text: String::new(),
            pending_error: None,
        };
        editor.refresh_menu();
        editor
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn selection_label(&self) -> &str {
        &self.selection_label
    }

    pub fn menu_entries(&self) -> &[String] {
        &self.menu
    }

    pub fn position_text(&self) -> &str {
        &self.position_text
    }

    pub fn scale_text(&self) -> &str {
        &self.scale_text
    }

    pub fn position_text_mut(&mut self) -> &mut String {
        &mut self.position_text
    }

    pub fn scale_text_mut(&mut self) -> &mut String {
        &mut self.scale_text
    }

    /// Validation failure waiting to be shown to the user
    pub fn pending_error(&self) -> Option<&TransformParseError> {
        self.pending_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.pending_error = None;
    }

    /// Select by menu label. Anything that is not `"Object N"` with N in
    /// range falls back to object 0.
    pub fn select_object(&mut self, token: &str) {
        let len = self.store.borrow().len();
        let parsed = token
            .strip_prefix("Object ")
            .and_then(|rest| rest.trim().parse::<usize>().ok());

        match parsed {
            Some(index) if index < len => {
                self.current_index = index;
                self.selection_label = token.to_string();
            }
            _ => {
                warn!("error selecting object: {token:?}, falling back to object 0");
                self.current_index = 0;
                self.selection_label = if len > 0 {
                    object_label(0)
                } else {
                    SELECT_PLACEHOLDER.to_string()
                };
            }
        }
        self.read_fields();
    }

    /// Copy the selected object's transform into the text fields.
    pub fn read_fields(&mut self) {
        let store = self.store.borrow();
        let Some(object) = store.get(self.current_index) else {
            return;
        };
        self.position_text = format_triple(object.position);
        self.scale_text = format_triple(object.scale);
    }

    pub fn submit(&mut self, position_text: &str, scale_text: &str) -> Result<(), TransformParseError> {
        let parsed = parse_triple(position_text, TransformField::Position)
            .and_then(|pos| {
                parse_triple(scale_text, TransformField::Scale).map(|scale| (pos, scale))
            });

        let (position, scale) = match parsed {
            Ok(values) => values,
            Err(err) => {
                error!("invalid input for position or scale: {err}");
                self.pending_error = Some(err.clone());
                return Err(err);
            }
        };

        self.store
            .borrow_mut()
            .update_object(self.current_index, position, scale);
        self.read_fields();
        Ok(())
    }

    /// Submit whatever is currently typed into the fields.
    pub fn submit_fields(&mut self) -> Result<(), TransformParseError> {
        let position = self.position_text.clone();
        let scale = self.scale_text.clone();
        self.submit(&position, &scale)
    }

    pub fn create_and_select_new(&mut self) -> usize {
        let index = self.store.borrow_mut().create_object();
        self.refresh_menu();
        self.current_index = index;
        self.selection_label = object_label(index);
        self.read_fields();
        info!("selected new object {index}");
        index
    }

    fn refresh_menu(&mut self) {
        let len = self.store.borrow().len();
        self.menu = (0..len).map(object_label).collect();
        self.menu.push(CREATE_ENTRY.to_string());
    }
}
