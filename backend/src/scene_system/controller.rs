use crate::data::prelude::*;

/// A pointer event in both screen and scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub screen: ScreenPoint,
    pub pick: PickPoint,
    pub shift: bool,
}

impl PointerEvent {
    pub fn new(view: &ViewData, screen: ScreenPoint, shift: bool) -> Self {
        Self { screen, pick: view.pick(screen), shift }
    }

    pub fn offset(&self) -> ScenePoint {
        self.pick.position
    }
}

pub type Tracker<S> = Box<dyn FnMut(&mut MouseContext<S>, &PointerEvent, &mut S)>;
pub type MoveListener<S> = Box<dyn FnMut(&PointerEvent, &mut S)>;
pub type ReleaseListener<S> = Box<dyn FnOnce(&PointerEvent, &mut S)>;
/// Receives every move; the flag tells whether a gesture is in progress.
pub type MoveObserver<S> = Box<dyn FnMut(&PointerEvent, bool, &mut S)>;

/// Listeners collected for one press-drag-release gesture.
pub struct MouseContext<S> {
    move_listeners: Vec<MoveListener<S>>,
    release_listeners: Vec<ReleaseListener<S>>,
}

impl<S> MouseContext<S> {
    fn new() -> Self {
        Self {
            move_listeners: Vec::new(),
            release_listeners: Vec::new(),
        }
    }

    pub fn on_move<F: FnMut(&PointerEvent, &mut S) + 'static>(&mut self, listener: F) {
        self.move_listeners.push(Box::new(listener));
    }

    pub fn on_release<F: FnOnce(&PointerEvent, &mut S) + 'static>(&mut self, listener: F) {
        self.release_listeners.push(Box::new(listener));
    }
}

/// Dispatches pointer events to keyed trackers and move observers.
///
/// `S` is the state every callback gets to mutate.
pub struct Controller<S> {
    trackers: Vec<(String, Tracker<S>)>,
    move_observers: Vec<(String, MoveObserver<S>)>,
    current: Option<MouseContext<S>>,
}

impl<S> Default for Controller<S> {
    fn default() -> Self {
        Self {
            trackers: Vec::new(),
            move_observers: Vec::new(),
            current: None,
        }
    }
}

fn register<T>(list: &mut Vec<(String, T)>, key: &str, value: T) {
    match list.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value,
        None => list.push((key.to_string(), value)),
    }
}

fn deregister<T>(list: &mut Vec<(String, T)>, key: &str) -> bool {
    let before = list.len();
    list.retain(|(k, _)| k != key);
    before != list.len()
}

impl<S> Controller<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tracker` for pointer-down under `key`, replacing any previous one.
    pub fn begin_track_mouse(&mut self, key: &str, tracker: Tracker<S>) {
        log::trace!("tracking mouse for `{}`", key);
        register(&mut self.trackers, key, tracker);
    }

    /// Safe to call for keys that were never registered.
    pub fn end_track_mouse(&mut self, key: &str) -> bool {
        deregister(&mut self.trackers, key)
    }

    pub fn begin_track_mouse_move(&mut self, key: &str, observer: MoveObserver<S>) {
        register(&mut self.move_observers, key, observer);
    }

    pub fn end_track_mouse_move(&mut self, key: &str) -> bool {
        deregister(&mut self.move_observers, key)
    }

    pub fn is_tracking(&self) -> bool {
        self.current.is_some()
    }

    pub fn has_tracker(&self, key: &str) -> bool {
        self.trackers.iter().any(|(k, _)| k == key) || self.move_observers.iter().any(|(k, _)| k == key)
    }

    pub fn pointer_down(&mut self, event: &PointerEvent, state: &mut S) {
        if self.current.is_some() {
            log::debug!("pointer down ignored during a gesture");
            return;
        }

        let mut context = MouseContext::new();
        for (_, tracker) in self.trackers.iter_mut() {
            tracker(&mut context, event, state);
        }
        self.current = Some(context);
    }

    pub fn pointer_move(&mut self, event: &PointerEvent, state: &mut S) {
        if let Some(context) = self.current.as_mut() {
            for listener in context.move_listeners.iter_mut() {
                listener(event, state);
            }
        }

        let tracking = self.current.is_some();
        for (_, observer) in self.move_observers.iter_mut() {
            observer(event, tracking, state);
        }
    }

    pub fn pointer_up(&mut self, event: &PointerEvent, state: &mut S) {
        if let Some(context) = self.current.take() {
            for listener in context.release_listeners {
                listener(event, state);
            }
        }
    }
}
