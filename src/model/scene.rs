use glam::{Mat4, Quat, Vec3};
use tracing::{debug, info, warn};

/// A placed box: where it sits and how it is stretched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub position: Vec3,
    pub scale: Vec3,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl SceneObject {
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, Quat::IDENTITY, self.position)
    }
}

/// Emitted to observers after a store mutation has been applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreEvent {
    Created { index: usize, object: SceneObject },
    Updated { index: usize, object: SceneObject },
}

impl StoreEvent {
    pub fn index(&self) -> usize {
        match self {
            StoreEvent::Created { index, .. } | StoreEvent::Updated { index, .. } => *index,
        }
    }
}

type Observer = Box<dyn FnMut(&StoreEvent)>;

/// Ordered collection of scene objects. The index is the object's identity
/// for the session; nothing is ever removed.
#[derive(Default)]
pub struct SceneObjectStore {
    objects: Vec<SceneObject>,
    observers: Vec<Observer>,
}

impl SceneObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback that runs after every successful create or update.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        self.observers.push(Box::new(observer));
        debug!("store observer registered ({} total)", self.observers.len());
    }

    pub fn create_object(&mut self) -> usize {
        let index = self.objects.len();
        let object = SceneObject::default();
        self.objects.push(object);
        info!("created object {index}");
        self.notify(StoreEvent::Created { index, object });
        index
    }

    /// Overwrite position and scale of `index`. Returns false (and changes
    /// nothing) when the index is out of bounds.
    pub fn update_object(&mut self, index: usize, position: Vec3, scale: Vec3) -> bool {
        let Some(object) = self.objects.get_mut(index) else {
            warn!(
                "update of object {index} ignored: only {} objects exist",
                self.objects.len()
            );
            return false;
        };
        *object = SceneObject { position, scale };
        let object = *object;
        info!("updated object {index} to position {position} and scale {scale}");
        self.notify(StoreEvent::Updated { index, object });
        true
    }

    pub fn get(&self, index: usize) -> Option<&SceneObject> {
        self.objects.get(index)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    fn notify(&mut self, event: StoreEvent) {
        for observer in self.observers.iter_mut() {
            observer(&event);
        }
    }
}
