use std::{ cell::RefCell, collections::HashSet, rc::Rc };

use crate::{
    data::prelude::*,
    error::ObjectError,
    objects::*,
    renderer::{ OverlayPainter, canvas::{ Canvas, cross, segment } },
};
use super::{
    controller::{ Controller, MouseContext, PointerEvent },
    scene::Visualization,
    tools::Tool,
};

/// Receives the object captured by a select-location gesture.
pub type LocationCallback = Rc<RefCell<dyn FnMut(ObjectId, &PointerEvent, &mut Workspace)>>;

/// Transient state drawn on the overlay layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayInfo {
    pub hover: Option<Selection>,
    pub line: Option<(ScenePoint, ScenePoint)>,
}

/// Local coordinate frame of the component being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentFrame {
    pub to_scene: LocalTransform,
}

impl ComponentFrame {
    pub fn translation(origin: ScenePoint) -> Self {
        Self { to_scene: LocalTransform::translation(origin.x, origin.y) }
    }

    pub fn from_local(&self, point: ScenePoint) -> ScenePoint {
        self.to_scene.transform_point(point)
    }

    /// A singular frame leaves points where they are.
    pub fn to_local(&self, point: ScenePoint) -> ScenePoint {
        match self.to_scene.inverse() {
            Some(inverse) => inverse.transform_point(point),
            None => {
                log::warn!("component frame is not invertible");
                point
            }
        }
    }
}

/// A shift-captured track waiting for the user to name the field it should map.
pub struct PathPrompt {
    pub track: ObjectId,
    event: PointerEvent,
    callback: LocationCallback,
}

/// Everything tool callbacks may read and change.
pub struct Workspace {
    pub vis: Visualization,
    pub data: Box<dyn Dataset>,
    pub overlay: OverlayInfo,
    pub selected_path: Option<Path>,
    /// Reference field and optional target collection applied to captured locations.
    pub reference: Option<(Path, Option<Path>)>,
    pub component: Option<ComponentFrame>,
    pub status: String,
    pub prompt: Option<PathPrompt>,
    dirty: LayerSet,
    /// Objects made by location captures, freed again if a tool rejects them.
    captured: HashSet<ObjectId>,
}

impl Workspace {
    pub fn new(vis: Visualization, data: Box<dyn Dataset>) -> Self {
        Self {
            vis,
            data,
            overlay: OverlayInfo::default(),
            selected_path: None,
            reference: None,
            component: None,
            status: String::new(),
            prompt: None,
            dirty: LayerSet::all(),
            captured: HashSet::new(),
        }
    }

    pub fn trigger<L: Into<LayerSet>>(&mut self, layers: L) {
        self.dirty = self.dirty.union(layers.into());
    }

    /// Layers invalidated by tools or by the visualization since the last call.
    pub fn take_dirty(&mut self) -> LayerSet {
        self.dirty.take().union(self.vis.take_dirty())
    }

    pub fn set_status<S: Into<String>>(&mut self, status: S) {
        self.status = status.into();
        log::debug!("status: {}", self.status);
    }

    /// Swaps the dataset. Selections may point at records that no longer exist.
    pub fn set_dataset(&mut self, data: Box<dyn Dataset>) {
        self.data = data;
        self.vis.clear_selection();
        self.overlay = OverlayInfo::default();
        if let Some(path) = &self.selected_path {
            if self.data.schema(path).is_none() {
                self.selected_path = None;
            }
        }
        self.trigger(LayerSet::all());
    }

    fn insert_captured(&mut self, object: GeoObject) -> ObjectId {
        let id = self.vis.insert(object);
        self.captured.insert(id);
        id
    }

    /// Frees a capture the tool did not use, along with the captured objects
    /// it was built on. Existing objects and anything still referred to stay.
    pub fn discard(&mut self, id: ObjectId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if !self.captured.contains(&id) {
                continue;
            }
            if let Some(object) = self.vis.discard(id) {
                self.captured.remove(&id);
                pending.extend(object.kind.as_object().dependencies());
            }
        }
    }

    pub fn set_component(&mut self, component: Option<ComponentFrame>) {
        self.component = component;
        self.trigger(Layer::Overlay);
    }

    fn hover(&mut self, event: &PointerEvent, tracking: bool, action: SelectAction) {
        self.overlay.hover = match tracking {
            true => None,
            false => self.vis.select_object(&*self.data, &event.pick, action),
        };
        self.trigger(Layer::Overlay);
    }
}

/// Finishes a location capture: shift on a track asks for a field first, an
/// active reference wraps the result.
fn capture(ws: &mut Workspace, object: ObjectId, event: &PointerEvent, callback: &LocationCallback) {
    let is_track = matches!(ws.vis.get(object).map(|o| &o.kind), Some(Kind::Track(_)));
    if event.shift && is_track {
        ws.prompt = Some(PathPrompt { track: object, event: *event, callback: callback.clone() });
        ws.set_status("Choose the field the track should map.");
        return;
    }

    let object = match ws.reference.clone() {
        Some((reference, target)) => {
            let capabilities = ws.vis.get(object)
                .map(|o| o.kind.as_object().capabilities())
                .unwrap_or_else(Capabilities::empty);
            ws.insert_captured(GeoObject::new(ReferenceWrapper::new(reference, target, object, capabilities)))
        }
        None => object,
    };
    (*callback.borrow_mut())(object, event, ws);
}

/// Pointer routing, the active tool and the workspace it edits.
pub struct ToolSession {
    pub controller: Controller<Workspace>,
    pub workspace: Workspace,
    tool: Option<Box<dyn Tool>>,
}

impl ToolSession {
    pub fn new(vis: Visualization, data: Box<dyn Dataset>) -> Self {
        Self {
            controller: Controller::new(),
            workspace: Workspace::new(vis, data),
            tool: None,
        }
    }

    pub fn tool_name(&self) -> Option<&'static str> {
        self.tool.as_ref().map(|tool| tool.name())
    }

    /// Lets the current tool clean up, then drops whatever it left registered
    /// under its key.
    fn deactivate(&mut self) {
        if let Some(mut old) = self.tool.take() {
            old.on_inactive(self);
            let key = old.key();
            self.controller.end_track_mouse(&key);
            self.controller.end_track_mouse_move(&key);
        }
    }

    /// Deactivates the current tool before activating `tool`.
    pub fn set_tool(&mut self, mut tool: Box<dyn Tool>) {
        self.deactivate();
        log::info!("tool: {}", tool.name());
        tool.on_active(self);
        self.tool = Some(tool);
        self.workspace.trigger(Layer::Overlay);
    }

    pub fn clear_tool(&mut self) {
        self.deactivate();
        self.workspace.overlay = OverlayInfo::default();
        self.workspace.trigger(Layer::Overlay);
    }

    pub fn pointer_down(&mut self, event: &PointerEvent) {
        self.controller.pointer_down(event, &mut self.workspace);
    }

    pub fn pointer_move(&mut self, event: &PointerEvent) {
        self.controller.pointer_move(event, &mut self.workspace);
    }

    pub fn pointer_up(&mut self, event: &PointerEvent) {
        self.controller.pointer_up(event, &mut self.workspace);
    }

    /// Captures a point-capable object per click.
    ///
    /// Pressing on a point-capable object and releasing elsewhere captures that
    /// object offset by the drag. Pressing on empty space captures a new plain
    /// point, in component-local units when a component frame is active.
    pub fn begin_select_location<F>(&mut self, key: &str, callback: F)
    where
        F: FnMut(ObjectId, &PointerEvent, &mut Workspace) + 'static,
    {
        let callback: LocationCallback = Rc::new(RefCell::new(callback));
        self.workspace.overlay = OverlayInfo::default();

        self.controller.begin_track_mouse(key, Box::new(move |context: &mut MouseContext<Workspace>, down: &PointerEvent, ws: &mut Workspace| {
            let start = down.offset();
            let down = *down;
            let hit = ws.vis
                .select_object(&*ws.data, &down.pick, SelectAction::GetPoint)
                .filter(|s| ws.vis.can(s.object, Capability::GetPoint));
            let callback = callback.clone();

            match hit {
                Some(selection) => {
                    context.on_move(move |e, ws: &mut Workspace| {
                        ws.overlay.line = Some((start, e.offset()));
                        ws.trigger(Layer::Overlay);
                    });
                    context.on_release(move |e, ws: &mut Workspace| {
                        ws.overlay.line = None;
                        ws.trigger(Layer::Overlay);
                        let delta = e.offset() - start;
                        let object = match delta == SceneVector::zero() {
                            true => selection.object,
                            false => ws.insert_captured(GeoObject::new(PointOffset::new(selection.object, delta))),
                        };
                        capture(ws, object, &down, &callback);
                    });
                }
                None => {
                    context.on_release(move |_, ws: &mut Workspace| {
                        let point = match &ws.component {
                            Some(frame) => frame.to_local(start),
                            None => start,
                        };
                        let object = ws.insert_captured(GeoObject::new(Plain::Point(point)));
                        capture(ws, object, &down, &callback);
                    });
                }
            }
        }));

        self.controller.begin_track_mouse_move(key, Box::new(|e, tracking, ws: &mut Workspace| {
            ws.hover(e, tracking, SelectAction::GetPoint);
        }));
    }

    pub fn end_select_location(&mut self, key: &str) {
        self.end_select_object(key);
    }

    /// Hit-tests every press and hands the result, possibly a miss, to `callback`.
    pub fn begin_select_object<F>(&mut self, key: &str, action: SelectAction, mut callback: F)
    where
        F: FnMut(Option<Selection>, &PointerEvent, &mut Workspace) + 'static,
    {
        self.workspace.overlay = OverlayInfo::default();

        self.controller.begin_track_mouse(key, Box::new(move |_, e, ws: &mut Workspace| {
            let hit = ws.vis.select_object(&*ws.data, &e.pick, action);
            callback(hit, e, ws);
        }));
        self.controller.begin_track_mouse_move(key, Box::new(|e, tracking, ws: &mut Workspace| {
            ws.hover(e, tracking, SelectAction::Select);
        }));
    }

    pub fn end_select_object(&mut self, key: &str) {
        self.controller.end_track_mouse(key);
        self.controller.end_track_mouse_move(key);
        self.workspace.overlay = OverlayInfo::default();
        self.workspace.trigger(Layer::Overlay);
    }

    /// Answers a pending field prompt. `None` cancels the capture.
    pub fn resolve_prompt(&mut self, path: Option<Path>) {
        let Some(prompt) = self.workspace.prompt.take() else {
            return;
        };
        match path {
            Some(path) => {
                log::debug!("wrapping {} for `{}`", prompt.track, path);
                let ws = &mut self.workspace;
                let wrapper = ws.insert_captured(GeoObject::new(TrackWrapper::new(prompt.track, path)));
                capture(ws, wrapper, &prompt.event, &prompt.callback);
            }
            None => self.workspace.set_status("Capture cancelled."),
        }
    }
}

impl OverlayPainter for ToolSession {
    fn paint_overlay(&self, canvas: &mut dyn Canvas) -> Vec<ObjectError> {
        let ws = &self.workspace;
        let r = ws.vis.resolver(&*ws.data);
        let w = canvas.guide_line_width();
        let mut errors = Vec::new();

        if let Some(hover) = &ws.overlay.hover {
            if let Some(object) = ws.vis.get(hover.object) {
                let object = object.kind.as_object();
                errors.extend(object.render_selected(&r, &mut *canvas, hover).err());
                errors.extend(object.render_guide_selected(&r, &mut *canvas, hover).err());
            }
        }

        if let Some((from, to)) = ws.overlay.line {
            canvas.stroke(&segment(from, to), color::GUIDE, w);
        }

        if let Some(frame) = &ws.component {
            let origin = frame.from_local(ScenePoint::origin());
            canvas.stroke(&cross(origin, 200.0 * w), color::ORIGIN, w);
        }

        if let Some(tool) = &self.tool {
            errors.extend(tool.render_overlay(&mut *canvas, ws).err());
        }
        errors
    }
}
