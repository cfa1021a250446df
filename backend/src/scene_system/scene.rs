use std::collections::HashMap;

use crate::{
    data::prelude::*,
    error::ObjectError,
    objects::*,
    renderer::canvas::Canvas,
};

/// Change notifications for panels bound to the visualization.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    ObjectAdded(ObjectId),
    ObjectRemoved(ObjectId),
    PropertyChanged { id: ObjectId, property: Property },
    SelectionChanged,
}

pub type Observer = Box<dyn FnMut(&Notification)>;

/// The ordered object graph being edited. Later objects draw on top and win hit tests.
pub struct Visualization {
    objects: Objects,
    order: Vec<ObjectId>,
    pub artboard: SceneRect,
    selection: Vec<Selection>,
    observers: Vec<Observer>,
    dirty: LayerSet,
}

impl Default for Visualization {
    fn default() -> Self {
        Self::new(SceneRect::new(ScenePoint::new(-300.0, -200.0), SceneSize::new(600.0, 400.0)))
    }
}

impl Visualization {
    pub fn new(artboard: SceneRect) -> Self {
        Self {
            objects: Objects::default(),
            order: Vec::new(),
            artboard,
            selection: Vec::new(),
            observers: Vec::new(),
            dirty: LayerSet::all(),
        }
    }

    pub fn objects(&self) -> &Objects {
        &self.objects
    }

    /// Top-level objects in z-order.
    pub fn order(&self) -> &[ObjectId] {
        &self.order
    }

    pub fn get(&self, id: ObjectId) -> Option<&GeoObject> {
        self.objects.get(id)
    }

    /// Unknown or not yet inserted objects can do nothing.
    pub fn can(&self, id: ObjectId, capability: Capability) -> bool {
        self.objects.get(id).map_or(false, |object| object.can(capability))
    }

    pub fn resolver<'a>(&'a self, data: &'a dyn Dataset) -> Resolver<'a> {
        Resolver::new(&self.objects, data)
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    fn notify(&mut self, notification: Notification) {
        self.observers.iter_mut().for_each(|observer| observer(&notification));
    }

    /// Layers invalidated since the last call.
    pub fn take_dirty(&mut self) -> LayerSet {
        self.dirty.take()
    }

    /// Stores a supporting object, such as an anchor, without drawing it.
    pub fn insert(&mut self, object: GeoObject) -> ObjectId {
        let id = self.objects.insert(object);
        log::trace!("inserted {} {}", self.objects.get(id).map_or("?", |o| o.kind_name()), id);
        id
    }

    pub fn add_object(&mut self, object: GeoObject) -> ObjectId {
        let id = self.insert(object);
        self.show(id);
        id
    }

    /// Appends an already inserted object to the top-level list.
    pub fn show(&mut self, id: ObjectId) {
        if self.order.contains(&id) || !self.objects.contains(id) {
            log::warn!("cannot show {}", id);
            return;
        }
        log::debug!("added {}", id);
        self.order.push(id);
        self.dirty = self.dirty.union(LayerSet::from([Layer::Main, Layer::Back]));
        self.notify(Notification::ObjectAdded(id));
    }

    /// Drops `id` from the top-level list and the selection. The arena keeps it
    /// for any object still referring to it.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        let Some(index) = self.order.iter().position(|o| *o == id) else {
            return false;
        };
        log::debug!("removed {}", id);
        self.order.remove(index);
        self.dirty = self.dirty.union(LayerSet::from([Layer::Main, Layer::Back, Layer::Front]));
        self.notify(Notification::ObjectRemoved(id));

        let selected = self.selection.len();
        self.selection.retain(|s| s.object != id);
        if selected != self.selection.len() {
            self.notify(Notification::SelectionChanged);
        }
        true
    }

    /// Whether any stored object refers to `id`.
    pub fn is_referenced(&self, id: ObjectId) -> bool {
        self.objects.iter().any(|(_, object)| object.kind.as_object().dependencies().contains(&id))
    }

    /// Frees a supporting object that is neither top level nor referred to.
    pub fn discard(&mut self, id: ObjectId) -> Option<GeoObject> {
        if self.order.contains(&id) || self.is_referenced(id) {
            return None;
        }
        log::trace!("discarded {}", id);
        self.objects.remove(id)
    }

    /// Topmost hit at `pick`. Objects that fail to resolve are not hit.
    pub fn select_object(&self, data: &dyn Dataset, pick: &PickPoint, action: SelectAction) -> Option<Selection> {
        let r = self.resolver(data);
        self.order.iter().rev().find_map(|id| {
            let object = self.objects.get(*id)?;
            match object.kind.as_object().select(*id, &r, pick, action) {
                Ok(hit) => hit,
                Err(e) => {
                    log::debug!("hit test skipped {}: {}", id, e);
                    None
                }
            }
        })
    }

    pub fn selection(&self) -> &[Selection] {
        &self.selection
    }

    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.selection.iter().any(|s| s.object == id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.dirty.insert(Layer::Front);
        self.notify(Notification::SelectionChanged);
    }

    pub fn append_selection(&mut self, selection: Selection) {
        self.selection.push(selection);
        self.dirty.insert(Layer::Front);
        self.notify(Notification::SelectionChanged);
    }

    /// Returns whether the value changed; only a change notifies.
    pub fn set_property(&mut self, id: ObjectId, property: Property) -> Result<bool, ObjectError> {
        let object = self.objects.get_mut(id).ok_or(ObjectError::UnknownObject(id))?;
        if !object.apply(property.clone())? {
            return Ok(false);
        }
        self.dirty = self.dirty.union(LayerSet::from([Layer::Main, Layer::Back, Layer::Front]));
        self.notify(Notification::PropertyChanged { id, property });
        Ok(true)
    }

    pub fn set_name(&mut self, id: ObjectId, name: &str) -> Result<bool, ObjectError> {
        let name = (!name.is_empty()).then(|| name.to_string());
        self.set_property(id, Property::Name(name))
    }

    /// Adds a copy of `id` on top.
    pub fn duplicate(&mut self, id: ObjectId) -> Result<ObjectId, ObjectError> {
        let copy = self.objects.get(id).ok_or(ObjectError::UnknownObject(id))?.duplicate()?;
        Ok(self.add_object(copy))
    }

    /// Fails on the first object found inside a reference cycle.
    pub fn check_acyclic(&self) -> Result<(), ObjectError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit(objects: &Objects, id: ObjectId, marks: &mut HashMap<ObjectId, Mark>) -> Result<(), ObjectError> {
            match marks.get(&id) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => return Err(ObjectError::CycleDetected(id)),
                None => {}
            }
            marks.insert(id, Mark::Visiting);
            if let Some(object) = objects.get(id) {
                for dependency in object.kind.as_object().dependencies() {
                    visit(objects, dependency, marks)?;
                }
            }
            marks.insert(id, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        self.objects.iter().try_for_each(|(id, _)| visit(&self.objects, id, &mut marks))
    }

    fn each_top_level<F>(&self, data: &dyn Dataset, mut paint: F) -> Vec<ObjectError>
    where
        F: FnMut(&dyn Object, &Resolver) -> Result<(), ObjectError>,
    {
        let r = self.resolver(data);
        self.order
            .iter()
            .filter_map(|id| {
                let object = self.objects.get(*id)?;
                paint(object.kind.as_object(), &r).err().map(|e| {
                    log::debug!("{} not drawn: {}", id, e);
                    e
                })
            })
            .collect()
    }

    fn each_selected<F>(&self, data: &dyn Dataset, mut paint: F) -> Vec<ObjectError>
    where
        F: FnMut(&dyn Object, &Resolver, &Selection) -> Result<(), ObjectError>,
    {
        let r = self.resolver(data);
        self.selection
            .iter()
            .filter_map(|selection| {
                let object = self.objects.get(selection.object)?;
                paint(object.kind.as_object(), &r, selection).err()
            })
            .collect()
    }

    /// Draws every top-level object. A failing object is skipped and reported.
    pub fn render(&self, data: &dyn Dataset, canvas: &mut dyn Canvas) -> Vec<ObjectError> {
        self.each_top_level(data, |object, r| object.render(r, &mut *canvas))
    }

    pub fn render_guide(&self, data: &dyn Dataset, canvas: &mut dyn Canvas) -> Vec<ObjectError> {
        self.each_top_level(data, |object, r| object.render_guide(r, &mut *canvas))
    }

    pub fn render_guide_selected(&self, data: &dyn Dataset, canvas: &mut dyn Canvas) -> Vec<ObjectError> {
        self.each_selected(data, |object, r, selection| object.render_guide_selected(r, &mut *canvas, selection))
    }

    pub fn render_selection(&self, data: &dyn Dataset, canvas: &mut dyn Canvas) -> Vec<ObjectError> {
        self.each_selected(data, |object, r, selection| object.render_selected(r, &mut *canvas, selection))
    }
}

#[cfg(test)]
mod test_scene {
    use std::{ cell::RefCell, rc::Rc };

    use super::*;
    use crate::data::dataset::JsonDataset;
    use crate::renderer::display_list::DisplayList;

    fn data() -> JsonDataset {
        JsonDataset::from_str(r#"{ "points": [ { "v": 1 } ] }"#).unwrap()
    }

    fn circle_at(vis: &mut Visualization, x: f32, y: f32, radius: f32) -> ObjectId {
        let center = vis.insert(GeoObject::new(Plain::Point(ScenePoint::new(x, y))));
        let radius = vis.insert(GeoObject::new(Plain::Number(radius)));
        vis.add_object(GeoObject::new(Circle::new(Path::new("points"), center, radius)))
    }

    #[test]
    fn test_topmost_circle_wins() {
        let data = data();
        let mut vis = Visualization::default();
        let first = circle_at(&mut vis, 0.0, 0.0, 10.0);
        let second = circle_at(&mut vis, 5.0, 0.0, 10.0);
        let pick = PickPoint::new(ScenePoint::new(2.0, 0.0), 1.0);

        assert_eq!(vis.order(), &[first, second]);
        assert_eq!(vis.select_object(&data, &pick, SelectAction::Select).map(|s| s.object), Some(second));

        vis.remove_object(second);
        assert_eq!(vis.select_object(&data, &pick, SelectAction::Select).map(|s| s.object), Some(first));
        assert_eq!(vis.select_object(&data, &PickPoint::new(ScenePoint::new(90.0, 0.0), 1.0), SelectAction::Select), None);
    }

    #[test]
    fn test_add_marks_main_and_back() {
        let mut vis = Visualization::default();
        vis.take_dirty();

        circle_at(&mut vis, 0.0, 0.0, 1.0);
        assert_eq!(vis.take_dirty(), LayerSet::from([Layer::Main, Layer::Back]));
        assert!(vis.take_dirty().is_empty());
    }

    #[test]
    fn test_selection_notifies() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut vis = Visualization::default();
        let sink = log.clone();
        vis.subscribe(Box::new(move |n: &Notification| sink.borrow_mut().push(n.clone())));

        let id = circle_at(&mut vis, 0.0, 0.0, 1.0);
        vis.append_selection(Selection::object(id));
        assert!(vis.is_selected(id));
        vis.remove_object(id);

        assert_eq!(
            *log.borrow(),
            vec![
                Notification::ObjectAdded(id),
                Notification::SelectionChanged,
                Notification::ObjectRemoved(id),
                Notification::SelectionChanged,
            ]
        );
        assert!(vis.selection().is_empty());
        assert!(!vis.remove_object(id));
    }

    #[test]
    fn test_property_change_notifies_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut vis = Visualization::default();
        let id = circle_at(&mut vis, 0.0, 0.0, 1.0);
        let sink = log.clone();
        vis.subscribe(Box::new(move |n: &Notification| sink.borrow_mut().push(n.clone())));

        assert_eq!(vis.set_name(id, "dots"), Ok(true));
        assert_eq!(vis.set_name(id, "dots"), Ok(false));
        assert_eq!(vis.set_property(id, Property::Min(1.0)), Err(ObjectError::NoSuchProperty("min")));
        assert_eq!(
            *log.borrow(),
            vec![Notification::PropertyChanged { id, property: Property::Name(Some("dots".into())) }]
        );
        assert_eq!(vis.get(id).and_then(|o| o.name.clone()), Some("dots".to_string()));
    }

    #[test]
    fn test_can_unknown_is_false() {
        let mut vis = Visualization::default();
        let p = vis.insert(GeoObject::new(Plain::Point(ScenePoint::origin())));

        assert!(vis.can(p, Capability::GetPoint));
        assert!(!vis.can(ObjectId(999), Capability::GetPoint));
    }

    #[test]
    fn test_check_acyclic() {
        let mut vis = Visualization::default();
        let p = vis.insert(GeoObject::new(Plain::Point(ScenePoint::origin())));
        let a = vis.insert(GeoObject::new(PointOffset::new(p, SceneVector::new(1.0, 1.0))));
        assert_eq!(vis.check_acyclic(), Ok(()));

        let b = vis.insert(GeoObject::new(PointOffset::new(a, SceneVector::new(1.0, 1.0))));
        if let Some(Kind::PointOffset(o)) = vis.objects.get_mut(a).map(|o| &mut o.kind) {
            o.object = b;
        }
        assert!(matches!(vis.check_acyclic(), Err(ObjectError::CycleDetected(_))));
    }

    #[test]
    fn test_render_skips_failing_object() {
        let data = data();
        let mut vis = Visualization::default();
        let a1 = vis.insert(GeoObject::new(Plain::Point(ScenePoint::origin())));
        let a2 = vis.insert(GeoObject::new(Plain::Point(ScenePoint::new(0.0, 10.0))));
        vis.add_object(GeoObject::new(Track::new(Path::new("points.v"), a1, a2, 3.0, 3.0)));
        circle_at(&mut vis, 0.0, 0.0, 1.0);
        let mut canvas = DisplayList::new(DeviceSize::new(10.0, 10.0));

        let errors = vis.render(&data, &mut canvas);
        assert_eq!(errors, vec![ObjectError::InvalidDomain { min: 3.0, max: 3.0 }]);
        assert_eq!(canvas.commands().len(), 1);
    }

    #[test]
    fn test_duplicate() {
        let mut vis = Visualization::default();
        let id = circle_at(&mut vis, 0.0, 0.0, 1.0);
        let copy = vis.duplicate(id).unwrap();

        assert_ne!(id, copy);
        assert_eq!(vis.get(id).map(|o| &o.kind), vis.get(copy).map(|o| &o.kind));
        assert_eq!(vis.order(), &[id, copy]);
    }
}
