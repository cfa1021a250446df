//! Data-bound geometric objects.
//!
//! Objects live in an [`Objects`] arena and refer to each other by
//! [`ObjectId`]. Evaluating an object goes through a [`Resolver`], which
//! carries the dataset and a depth counter so that a reference cycle fails
//! with [`ObjectError::CycleDetected`] instead of recursing forever.

use std::collections::BTreeMap;
use std::fmt;

use crate::{
    data::prelude::*,
    error::ObjectError,
    renderer::canvas::Canvas,
};

mod plain;
mod track;
mod shapes;
mod wrappers;

pub use plain::Plain;
pub use track::{ Scatter, Track, TrackWrapper };
pub use shapes::{ Circle, Line, LineThrough };
pub use wrappers::{ PointOffset, ReferenceWrapper };

/// Nested resolutions allowed before a reference cycle is assumed.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    GetPoint,
    GetNumber,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::GetPoint => "get-point",
            Capability::GetNumber => "get-number",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | 1 << capability as u8)
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & 1 << capability as u8 != 0
    }
}

impl From<Capability> for Capabilities {
    fn from(capability: Capability) -> Self {
        Capabilities::empty().with(capability)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Point(ScenePoint),
    Number(f32),
}

impl Value {
    pub fn as_point(&self) -> Option<ScenePoint> {
        match self {
            Value::Point(p) => Some(*p),
            Value::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Point(_) => None,
        }
    }
}

/// What a hit test is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAction {
    Select,
    /// Capturing a point source; handles answer with the object behind them.
    GetPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Anchor1,
    Anchor2,
}

/// A hit: the object plus where on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub object: ObjectId,
    pub record: Option<usize>,
    pub handle: Option<Handle>,
}

impl Selection {
    pub fn object(object: ObjectId) -> Self {
        Self { object, record: None, handle: None }
    }

    pub fn with_record(mut self, record: usize) -> Self {
        self.record = Some(record);
        self
    }

    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Evaluation context of the selected record.
    pub fn context(&self) -> Context {
        self.record.map_or(Context::Constant, Context::Record)
    }
}

/// Evaluation environment handed to every object.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    objects: &'a Objects,
    data: &'a dyn Dataset,
    depth: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(objects: &'a Objects, data: &'a dyn Dataset) -> Self {
        Self { objects, data, depth: 0 }
    }

    pub fn data(&self) -> &'a dyn Dataset {
        self.data
    }

    pub fn object(&self, id: ObjectId) -> Result<&'a GeoObject, ObjectError> {
        self.objects.get(id).ok_or(ObjectError::UnknownObject(id))
    }

    fn deeper(&self, id: ObjectId) -> Result<Self, ObjectError> {
        if self.depth >= MAX_DEPTH {
            return Err(ObjectError::CycleDetected(id));
        }
        Ok(Self { depth: self.depth + 1, ..*self })
    }

    pub fn get(&self, id: ObjectId, ctx: Context) -> Result<Option<Value>, ObjectError> {
        let inner = self.deeper(id)?;
        self.object(id)?.kind.as_object().get(&inner, ctx)
    }

    fn require(&self, id: ObjectId, capability: Capability) -> Result<(), ObjectError> {
        if self.object(id)?.can(capability) {
            Ok(())
        } else {
            Err(ObjectError::CapabilityMissing { id, capability })
        }
    }

    pub fn point(&self, id: ObjectId, ctx: Context) -> Result<Option<ScenePoint>, ObjectError> {
        self.require(id, Capability::GetPoint)?;
        Ok(self.get(id, ctx)?.and_then(|v| v.as_point()))
    }

    pub fn number(&self, id: ObjectId, ctx: Context) -> Result<Option<f32>, ObjectError> {
        self.require(id, Capability::GetNumber)?;
        Ok(self.get(id, ctx)?.and_then(|v| v.as_number()))
    }

    pub fn track(&self, id: ObjectId) -> Result<&'a Track, ObjectError> {
        match &self.object(id)?.kind {
            Kind::Track(track) => Ok(track),
            _ => Err(ObjectError::NotATrack(id)),
        }
    }

    /// Anchor points of a track, or of the track behind a track wrapper.
    pub fn axis(&self, id: ObjectId, ctx: Context) -> Result<Option<(ScenePoint, ScenePoint)>, ObjectError> {
        let inner = self.deeper(id)?;
        match &self.object(id)?.kind {
            Kind::Track(track) => track.anchors(&inner, ctx),
            Kind::TrackWrapper(wrapper) => inner.axis(wrapper.track, ctx),
            _ => Ok(None),
        }
    }

    /// Records a multi-record object bound to `path` iterates, in ascending order.
    pub fn records(&self, path: &Path) -> std::ops::Range<usize> {
        0..self.data.record_count(path)
    }
}

/// Behaviour shared by every object kind. Defaults describe an object that
/// provides nothing and draws nothing.
#[allow(unused)]
pub trait Object {
    fn kind_name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    fn get(&self, r: &Resolver, ctx: Context) -> Result<Option<Value>, ObjectError> {
        Ok(None)
    }

    /// Objects this one reads while resolving or drawing.
    fn dependencies(&self) -> Vec<ObjectId>;

    fn render(&self, r: &Resolver, canvas: &mut dyn Canvas) -> Result<(), ObjectError> {
        Ok(())
    }

    fn render_selected(&self, r: &Resolver, canvas: &mut dyn Canvas, selection: &Selection) -> Result<(), ObjectError> {
        Ok(())
    }

    fn render_guide(&self, r: &Resolver, canvas: &mut dyn Canvas) -> Result<(), ObjectError> {
        Ok(())
    }

    fn render_guide_selected(&self, r: &Resolver, canvas: &mut dyn Canvas, selection: &Selection) -> Result<(), ObjectError> {
        Ok(())
    }

    /// Hit test at `pick`; `id` is this object's own id.
    fn select(&self, id: ObjectId, r: &Resolver, pick: &PickPoint, action: SelectAction) -> Result<Option<Selection>, ObjectError> {
        Ok(None)
    }

    fn duplicate(&self) -> Result<Kind, ObjectError> {
        Err(ObjectError::CloneNotImplemented(self.kind_name()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Plain(Plain),
    Track(Track),
    Scatter(Scatter),
    Circle(Circle),
    Line(Line),
    LineThrough(LineThrough),
    PointOffset(PointOffset),
    ReferenceWrapper(ReferenceWrapper),
    TrackWrapper(TrackWrapper),
}

impl Kind {
    pub fn as_object(&self) -> &dyn Object {
        match self {
            Kind::Plain(o) => o,
            Kind::Track(o) => o,
            Kind::Scatter(o) => o,
            Kind::Circle(o) => o,
            Kind::Line(o) => o,
            Kind::LineThrough(o) => o,
            Kind::PointOffset(o) => o,
            Kind::ReferenceWrapper(o) => o,
            Kind::TrackWrapper(o) => o,
        }
    }
}

macro_rules! impl_from_kind {
    ($($variant:ident),*) => {
        $(impl From<$variant> for Kind {
            fn from(object: $variant) -> Self {
                Kind::$variant(object)
            }
        })*
    };
}

impl_from_kind!(Plain, Track, Scatter, Circle, Line, LineThrough, PointOffset, ReferenceWrapper, TrackWrapper);

/// Named setters on objects. Applying a property only reports a change when
/// the stored value actually differs.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Name(Option<String>),
    Path(Path),
    Min(f64),
    Max(f64),
    Point(ScenePoint),
    Number(f32),
    Offset(SceneVector),
    Fill(Option<Rgba8>),
    Stroke(Option<Rgba8>),
}

impl Property {
    pub fn key(&self) -> &'static str {
        match self {
            Property::Name(_) => "name",
            Property::Path(_) => "path",
            Property::Min(_) => "min",
            Property::Max(_) => "max",
            Property::Point(_) => "point",
            Property::Number(_) => "number",
            Property::Offset(_) => "offset",
            Property::Fill(_) => "fill",
            Property::Stroke(_) => "stroke",
        }
    }
}

fn assign<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoObject {
    pub name: Option<String>,
    pub kind: Kind,
}

impl GeoObject {
    pub fn new<K: Into<Kind>>(kind: K) -> Self {
        Self { name: None, kind: kind.into() }
    }

    pub fn named<K: Into<Kind>>(name: &str, kind: K) -> Self {
        Self { name: Some(name.to_string()), kind: kind.into() }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.kind.as_object().capabilities().contains(capability)
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.as_object().kind_name()
    }

    /// A copy of this object with the same references. Wrappers refuse.
    pub fn duplicate(&self) -> Result<GeoObject, ObjectError> {
        Ok(Self { name: self.name.clone(), kind: self.kind.as_object().duplicate()? })
    }

    /// Returns whether the value changed.
    pub fn apply(&mut self, property: Property) -> Result<bool, ObjectError> {
        let changed = match (&mut self.kind, property) {
            (_, Property::Name(name)) => assign(&mut self.name, name),
            (Kind::Track(o), Property::Path(v)) => assign(&mut o.path, v),
            (Kind::Track(o), Property::Min(v)) => assign(&mut o.min, v),
            (Kind::Track(o), Property::Max(v)) => assign(&mut o.max, v),
            (Kind::Circle(o), Property::Path(v)) => assign(&mut o.path, v),
            (Kind::Circle(o), Property::Fill(v)) => assign(&mut o.fill, v),
            (Kind::Circle(o), Property::Stroke(v)) => assign(&mut o.stroke, v),
            (Kind::Line(o), Property::Path(v)) => assign(&mut o.path, v),
            (Kind::Line(o), Property::Stroke(v)) => assign(&mut o.stroke, v),
            (Kind::LineThrough(o), Property::Path(v)) => assign(&mut o.path, v),
            (Kind::LineThrough(o), Property::Stroke(v)) => assign(&mut o.stroke, v),
            (Kind::TrackWrapper(o), Property::Path(v)) => assign(&mut o.path, v),
            (Kind::ReferenceWrapper(o), Property::Path(v)) => assign(&mut o.reference, v),
            (Kind::Plain(Plain::Point(p)), Property::Point(v)) => assign(p, v),
            (Kind::Plain(Plain::Number(n)), Property::Number(v)) => assign(n, v),
            (Kind::PointOffset(o), Property::Offset(v)) => assign(&mut o.offset, v),
            (_, property) => return Err(ObjectError::NoSuchProperty(property.key())),
        };
        Ok(changed)
    }
}

/// Arena of every object in a visualization, top level or not.
#[derive(Debug, Default)]
pub struct Objects {
    next_id: u32,
    items: BTreeMap<ObjectId, GeoObject>,
}

impl Objects {
    pub fn insert(&mut self, object: GeoObject) -> ObjectId {
        self.next_id += 1;
        let id = ObjectId(self.next_id);
        self.items.insert(id, object);
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&GeoObject> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GeoObject> {
        self.items.get_mut(&id)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<GeoObject> {
        self.items.remove(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &GeoObject)> {
        self.items.iter().map(|(id, object)| (*id, object))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub(crate) fn distance_to_segment(p: ScenePoint, a: ScenePoint, b: ScenePoint) -> f32 {
    let ab = b - a;
    let length = ab.square_length();
    if length <= f32::EPSILON {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / length).clamp(0.0, 1.0);
    (p - a.lerp(b, t)).length()
}

#[cfg(test)]
pub(crate) mod test_objects {
    use super::*;
    use crate::data::dataset::JsonDataset;

    pub(crate) fn cars() -> JsonDataset {
        JsonDataset::from_str(r#"{
            "cars": [
                { "mpg": 30, "horsepower": 100, "weight": 2 },
                { "mpg": 10, "horsepower": 50, "weight": "heavy" },
                { "mpg": 50, "horsepower": 200 }
            ]
        }"#).unwrap()
    }

    pub(crate) fn point(objects: &mut Objects, x: f32, y: f32) -> ObjectId {
        objects.insert(GeoObject::new(Plain::Point(ScenePoint::new(x, y))))
    }

    #[test]
    fn test_capabilities() {
        let caps = Capabilities::from(Capability::GetPoint);
        assert!(caps.contains(Capability::GetPoint));
        assert!(!caps.contains(Capability::GetNumber));
        assert!(caps.with(Capability::GetNumber).contains(Capability::GetNumber));
        assert_eq!(Capability::GetPoint.to_string(), "get-point");
    }

    #[test]
    fn test_missing_capability_fails_fast() {
        let data = cars();
        let mut objects = Objects::default();
        let radius = objects.insert(GeoObject::new(Plain::Number(2.0)));
        let r = Resolver::new(&objects, &data);

        assert_eq!(r.number(radius, Context::Constant), Ok(Some(2.0)));
        assert_eq!(
            r.point(radius, Context::Constant),
            Err(ObjectError::CapabilityMissing { id: radius, capability: Capability::GetPoint })
        );
        assert_eq!(r.point(ObjectId(99), Context::Constant), Err(ObjectError::UnknownObject(ObjectId(99))));
    }

    #[test]
    fn test_cycle_detected() {
        let data = cars();
        let mut objects = Objects::default();
        let a = point(&mut objects, 0.0, 0.0);
        let offset = objects.insert(GeoObject::new(PointOffset::new(a, SceneVector::new(1.0, 0.0))));
        // Point the offset at itself.
        if let Some(Kind::PointOffset(o)) = objects.get_mut(offset).map(|o| &mut o.kind) {
            o.object = offset;
        }

        let r = Resolver::new(&objects, &data);
        assert_eq!(r.point(offset, Context::Constant), Err(ObjectError::CycleDetected(offset)));
    }

    #[test]
    fn test_apply_compares() {
        let mut object = GeoObject::new(Plain::Point(ScenePoint::new(1.0, 2.0)));

        assert_eq!(object.apply(Property::Point(ScenePoint::new(1.0, 2.0))), Ok(false));
        assert_eq!(object.apply(Property::Point(ScenePoint::new(3.0, 2.0))), Ok(true));
        assert_eq!(object.apply(Property::Name(Some("origin".into()))), Ok(true));
        assert_eq!(object.apply(Property::Min(0.0)), Err(ObjectError::NoSuchProperty("min")));
        assert_eq!(object.kind, Kind::Plain(Plain::Point(ScenePoint::new(3.0, 2.0))));
    }

    #[test]
    fn test_distance_to_segment() {
        let a = ScenePoint::new(0.0, 0.0);
        let b = ScenePoint::new(10.0, 0.0);
        assert_eq!(distance_to_segment(ScenePoint::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(ScenePoint::new(-4.0, 3.0), a, b), 5.0);
        assert_eq!(distance_to_segment(ScenePoint::new(1.0, 1.0), a, a), 2f32.sqrt());
    }
}
