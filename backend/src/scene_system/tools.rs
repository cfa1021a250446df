//! Editing tools. Each tool owns the gestures registered under its key while it
//! is active and shows its next step in the status line.

use std::{ cell::Cell, rc::Rc };

use crate::{
    data::prelude::*,
    error::ObjectError,
    objects::*,
    renderer::canvas::{ Canvas, circle },
};
use super::session::{ ToolSession, Workspace };

/// Radius given to circles created by the circle tool.
pub const DEFAULT_RADIUS: f32 = 2.0;

pub const TOOL_NAMES: [&str; 6] = ["Select", "Track", "Circle", "Scatter", "Line", "LineThrough"];

pub trait Tool {
    fn name(&self) -> &'static str;

    /// Gesture key, unique per tool.
    fn key(&self) -> String {
        format!("tools:{}", self.name())
    }

    fn on_active(&mut self, session: &mut ToolSession);

    fn on_inactive(&mut self, session: &mut ToolSession);

    #[allow(unused)]
    fn render_overlay(&self, canvas: &mut dyn Canvas, ws: &Workspace) -> Result<(), ObjectError> {
        Ok(())
    }
}

pub fn tool_by_name(name: &str) -> Option<Box<dyn Tool>> {
    let tool: Box<dyn Tool> = match name {
        "Select" => Box::new(SelectTool),
        "Track" => Box::new(TrackTool::default()),
        "Circle" => Box::new(CircleTool),
        "Scatter" => Box::new(ScatterTool::default()),
        "Line" => Box::new(LineTool::default()),
        "LineThrough" => Box::new(LineThroughTool),
        _ => return None,
    };
    Some(tool)
}

/// The selected path, if the dataset knows it.
fn selected_path(ws: &Workspace) -> Option<Path> {
    ws.selected_path.clone().filter(|path| ws.data.schema(path).is_some())
}

/// Marks the first captured point of a two-step tool.
fn mark_pending(canvas: &mut dyn Canvas, ws: &Workspace, pending: Option<ObjectId>) -> Result<(), ObjectError> {
    let Some(id) = pending else {
        return Ok(());
    };
    if let Some(p) = ws.vis.resolver(&*ws.data).point(id, Context::Constant)? {
        let w = canvas.guide_line_width();
        canvas.stroke(&circle(p, 4.0 * w), color::GUIDE, w);
    }
    Ok(())
}

/// Clicking selects the topmost object; shift extends the selection.
pub struct SelectTool;

impl Tool for SelectTool {
    fn name(&self) -> &'static str {
        "Select"
    }

    fn on_active(&mut self, session: &mut ToolSession) {
        session.workspace.set_status("Select: Click an object.");
        session.begin_select_object(&self.key(), SelectAction::Select, |hit, e, ws| {
            match hit {
                Some(selection) if e.shift => ws.vis.append_selection(selection),
                Some(selection) => {
                    ws.vis.clear_selection();
                    ws.vis.append_selection(selection);
                }
                None => ws.vis.clear_selection(),
            }
        });
    }

    fn on_inactive(&mut self, session: &mut ToolSession) {
        session.end_select_object(&self.key());
    }
}

/// Two locations and the selected numeric field make a track.
#[derive(Default)]
pub struct TrackTool {
    first: Rc<Cell<Option<ObjectId>>>,
}

impl Tool for TrackTool {
    fn name(&self) -> &'static str {
        "Track"
    }

    fn on_active(&mut self, session: &mut ToolSession) {
        self.first.set(None);
        session.workspace.set_status("Track: Select point A.");

        let first = self.first.clone();
        session.begin_select_location(&self.key(), move |location, _, ws| {
            let Some(a) = first.take() else {
                first.set(Some(location));
                ws.set_status("Track: Select point B.");
                return;
            };

            let numeric = selected_path(ws).filter(|path| ws.data.schema(path).map_or(false, |s| s.is_numeric()));
            match numeric.and_then(|path| Some((ws.data.basic_statistics(&path)?, path))) {
                Some((stats, path)) => {
                    let track = ws.vis.add_object(GeoObject::new(Track::with_statistics(path, a, location, &stats)));
                    log::info!("track {} spans {:?}..{:?}", track, stats.min, stats.max);
                }
                None => {
                    log::warn!("a track needs a numeric field with values");
                    ws.discard(location);
                    ws.discard(a);
                }
            }
            ws.set_status("Track: Select point A.");
            ws.trigger(Layer::Overlay);
        });
    }

    fn on_inactive(&mut self, session: &mut ToolSession) {
        if let Some(a) = self.first.take() {
            session.workspace.discard(a);
        }
        session.end_select_location(&self.key());
    }

    fn render_overlay(&self, canvas: &mut dyn Canvas, ws: &Workspace) -> Result<(), ObjectError> {
        mark_pending(canvas, ws, self.first.get())
    }
}

/// One location becomes the center of a circle per record of the selected path.
pub struct CircleTool;

impl Tool for CircleTool {
    fn name(&self) -> &'static str {
        "Circle"
    }

    fn on_active(&mut self, session: &mut ToolSession) {
        session.workspace.set_status("Circle: Select the center.");
        session.begin_select_location(&self.key(), |center, _, ws| {
            let Some(path) = selected_path(ws) else {
                log::warn!("a circle needs a selected path");
                ws.discard(center);
                return;
            };
            let radius = ws.vis.insert(GeoObject::new(Plain::Number(DEFAULT_RADIUS)));
            ws.vis.add_object(GeoObject::new(Circle::new(path, center, radius)));
        });
    }

    fn on_inactive(&mut self, session: &mut ToolSession) {
        session.end_select_location(&self.key());
    }
}

/// Two picked tracks make a scatter point source.
#[derive(Default)]
pub struct ScatterTool {
    first: Rc<Cell<Option<ObjectId>>>,
}

fn is_track(ws: &Workspace, id: ObjectId) -> bool {
    matches!(ws.vis.get(id).map(|o| &o.kind), Some(Kind::Track(_)))
}

impl Tool for ScatterTool {
    fn name(&self) -> &'static str {
        "Scatter"
    }

    fn on_active(&mut self, session: &mut ToolSession) {
        self.first.set(None);
        let ws = &mut session.workspace;
        ws.vis.clear_selection();
        ws.trigger([Layer::Main, Layer::Back]);
        ws.set_status("Scatter: Select track A.");

        let first = self.first.clone();
        session.begin_select_object(&self.key(), SelectAction::Select, move |hit, _, ws| {
            let Some(hit) = hit else {
                first.set(None);
                ws.vis.clear_selection();
                ws.set_status("Scatter: Select track A.");
                return;
            };

            match first.take() {
                None => {
                    first.set(Some(hit.object));
                    ws.vis.append_selection(hit);
                    ws.set_status("Scatter: Select track B.");
                }
                Some(a) => {
                    if is_track(ws, a) && is_track(ws, hit.object) {
                        ws.vis.add_object(GeoObject::new(Scatter::new(a, hit.object)));
                    } else {
                        log::warn!("scatter needs two tracks, got {} and {}", a, hit.object);
                    }
                    ws.vis.clear_selection();
                    ws.set_status("Scatter: Select track A.");
                }
            }
        });
    }

    fn on_inactive(&mut self, session: &mut ToolSession) {
        self.first.set(None);
        session.end_select_object(&self.key());
    }
}

/// Two locations joined by a segment per record.
#[derive(Default)]
pub struct LineTool {
    first: Rc<Cell<Option<ObjectId>>>,
}

impl Tool for LineTool {
    fn name(&self) -> &'static str {
        "Line"
    }

    fn on_active(&mut self, session: &mut ToolSession) {
        self.first.set(None);
        session.workspace.set_status("Line: Select point A.");

        let first = self.first.clone();
        session.begin_select_location(&self.key(), move |location, _, ws| {
            let Some(a) = first.take() else {
                first.set(Some(location));
                ws.set_status("Line: Select point B.");
                return;
            };
            match selected_path(ws) {
                Some(path) => {
                    ws.vis.add_object(GeoObject::new(Line::new(path, a, location)));
                }
                None => {
                    log::warn!("a line needs a selected path");
                    ws.discard(location);
                    ws.discard(a);
                }
            }
            ws.set_status("Line: Select point A.");
            ws.trigger(Layer::Overlay);
        });
    }

    fn on_inactive(&mut self, session: &mut ToolSession) {
        if let Some(a) = self.first.take() {
            session.workspace.discard(a);
        }
        session.end_select_location(&self.key());
    }

    fn render_overlay(&self, canvas: &mut dyn Canvas, ws: &Workspace) -> Result<(), ObjectError> {
        mark_pending(canvas, ws, self.first.get())
    }
}

/// One location evaluated per record becomes a polyline.
pub struct LineThroughTool;

impl Tool for LineThroughTool {
    fn name(&self) -> &'static str {
        "LineThrough"
    }

    fn on_active(&mut self, session: &mut ToolSession) {
        session.workspace.set_status("LineThrough: Select a point.");
        session.begin_select_location(&self.key(), |points, _, ws| match selected_path(ws) {
            Some(path) => {
                ws.vis.add_object(GeoObject::new(LineThrough::new(path, points)));
            }
            None => {
                log::warn!("a line through points needs a selected path");
                ws.discard(points);
            }
        });
    }

    fn on_inactive(&mut self, session: &mut ToolSession) {
        session.end_select_location(&self.key());
    }
}

#[cfg(test)]
mod test_tools {
    use super::*;
    use crate::data::dataset::JsonDataset;
    use crate::scene_system::{ controller::PointerEvent, scene::Visualization };

    fn session() -> ToolSession {
        let data = JsonDataset::from_str(r#"{
            "cars": [ { "mpg": 10, "name": "a" }, { "mpg": 30, "name": "b" } ]
        }"#).unwrap();
        ToolSession::new(Visualization::default(), Box::new(data))
    }

    fn click(session: &mut ToolSession, x: f32, y: f32) {
        let e = PointerEvent::new(&ViewData::default(), ScreenPoint::new(300.0 + x, 200.0 - y), false);
        session.pointer_down(&e);
        session.pointer_up(&e);
    }

    fn kinds(session: &ToolSession) -> Vec<&'static str> {
        let vis = &session.workspace.vis;
        vis.order().iter().filter_map(|id| vis.get(*id)).map(|o| o.kind_name()).collect()
    }

    #[test]
    fn test_track_tool_two_clicks() {
        let mut session = session();
        session.workspace.selected_path = Some(Path::new("cars.mpg"));
        session.set_tool(tool_by_name("Track").unwrap());
        assert_eq!(session.workspace.status, "Track: Select point A.");

        click(&mut session, -100.0, 0.0);
        assert_eq!(session.workspace.status, "Track: Select point B.");
        click(&mut session, 100.0, 0.0);
        assert_eq!(session.workspace.status, "Track: Select point A.");
        assert_eq!(kinds(&session), ["Track"]);

        let id = session.workspace.vis.order()[0];
        match session.workspace.vis.get(id).map(|o| &o.kind) {
            Some(Kind::Track(track)) => assert_eq!((track.min, track.max), (8.0, 32.0)),
            other => panic!("expected a track, got {:?}", other),
        }
    }

    #[test]
    fn test_track_tool_needs_numeric_field() {
        let mut session = session();
        session.workspace.selected_path = Some(Path::new("cars.name"));
        session.set_tool(tool_by_name("Track").unwrap());

        click(&mut session, -100.0, 0.0);
        click(&mut session, 100.0, 0.0);
        assert!(kinds(&session).is_empty());
        assert!(session.workspace.vis.objects().is_empty());
    }

    #[test]
    fn test_switching_away_frees_first_point() {
        let mut session = session();
        session.workspace.selected_path = Some(Path::new("cars.mpg"));
        session.set_tool(tool_by_name("Line").unwrap());
        click(&mut session, -100.0, 0.0);
        assert_eq!(session.workspace.vis.objects().len(), 1);

        session.set_tool(tool_by_name("Track").unwrap());
        assert!(session.workspace.vis.objects().is_empty());
        click(&mut session, -100.0, 0.0);
        session.clear_tool();
        assert!(session.workspace.vis.objects().is_empty());
    }

    #[test]
    fn test_circle_tool() {
        let mut session = session();
        session.set_tool(tool_by_name("Circle").unwrap());
        click(&mut session, 0.0, 0.0);
        assert!(kinds(&session).is_empty());
        assert!(session.workspace.vis.objects().is_empty());

        session.workspace.selected_path = Some(Path::new("cars"));
        click(&mut session, 0.0, 0.0);
        assert_eq!(kinds(&session), ["Circle"]);
        // Center, radius and the circle.
        assert_eq!(session.workspace.vis.objects().len(), 3);
    }

    #[test]
    fn test_scatter_tool_picks_two_tracks() {
        let mut session = session();
        session.workspace.selected_path = Some(Path::new("cars.mpg"));
        session.set_tool(tool_by_name("Track").unwrap());
        click(&mut session, -100.0, -50.0);
        click(&mut session, 100.0, -50.0);
        click(&mut session, -150.0, -40.0);
        click(&mut session, -150.0, 90.0);
        assert_eq!(kinds(&session), ["Track", "Track"]);

        session.set_tool(tool_by_name("Scatter").unwrap());
        assert!(!session.controller.has_tracker("tools:Track"));
        assert_eq!(session.workspace.status, "Scatter: Select track A.");

        click(&mut session, 0.0, -50.0);
        assert_eq!(session.workspace.vis.selection().len(), 1);
        assert_eq!(session.workspace.status, "Scatter: Select track B.");
        click(&mut session, -150.0, 20.0);
        assert!(session.workspace.vis.selection().is_empty());
        assert_eq!(kinds(&session), ["Track", "Track", "Scatter"]);
    }

    #[test]
    fn test_scatter_tool_miss_resets() {
        let mut session = session();
        session.set_tool(tool_by_name("Scatter").unwrap());
        click(&mut session, 0.0, 0.0);
        assert_eq!(session.workspace.status, "Scatter: Select track A.");
        assert!(kinds(&session).is_empty());
    }

    #[test]
    fn test_select_tool() {
        let mut session = session();
        let p = session.workspace.vis.add_object(GeoObject::new(Plain::Point(ScenePoint::origin())));
        session.set_tool(tool_by_name("Select").unwrap());

        click(&mut session, 1.0, 1.0);
        assert!(session.workspace.vis.is_selected(p));
        click(&mut session, 80.0, 80.0);
        assert!(session.workspace.vis.selection().is_empty());
    }

    #[test]
    fn test_unknown_tool() {
        assert!(tool_by_name("Lasso").is_none());
        for name in TOOL_NAMES {
            assert_eq!(tool_by_name(name).map(|t| t.key()), Some(format!("tools:{}", name)));
        }
    }
}
