use super::*;
use crate::renderer::canvas::{ circle, cross, polyline, segment };

/// One circle per record of `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub path: Path,
    pub center: ObjectId,
    pub radius: ObjectId,
    pub fill: Option<Rgba8>,
    pub stroke: Option<Rgba8>,
}

impl Circle {
    pub fn new(path: Path, center: ObjectId, radius: ObjectId) -> Self {
        Self { path, center, radius, fill: Some(color::FILL), stroke: None }
    }

    /// Center and radius for record `i`, `None` when either is missing.
    fn resolve(&self, r: &Resolver, i: usize) -> Result<Option<(ScenePoint, f32)>, ObjectError> {
        let ctx = Context::Record(i);
        let found = r.point(self.center, ctx)?.zip(r.number(self.radius, ctx)?);
        Ok(found.filter(|(_, radius)| radius.is_finite() && *radius >= 0.0))
    }

    fn selected_records(&self, r: &Resolver, selection: &Selection) -> std::ops::Range<usize> {
        match selection.record {
            Some(i) => i..i + 1,
            None => r.records(&self.path),
        }
    }
}

impl Object for Circle {
    fn kind_name(&self) -> &'static str {
        "Circle"
    }

    fn dependencies(&self) -> Vec<ObjectId> {
        vec![self.center, self.radius]
    }

    fn render(&self, r: &Resolver, canvas: &mut dyn Canvas) -> Result<(), ObjectError> {
        let w = canvas.guide_line_width();
        for i in r.records(&self.path) {
            let Some((center, radius)) = self.resolve(r, i)? else {
                log::trace!("circle skips record {}", i);
                continue;
            };
            let outline = circle(center, radius);
            if let Some(fill) = self.fill {
                canvas.fill(&outline, fill);
            }
            if let Some(stroke) = self.stroke {
                canvas.stroke(&outline, stroke, w);
            }
        }
        Ok(())
    }

    fn render_selected(&self, r: &Resolver, canvas: &mut dyn Canvas, selection: &Selection) -> Result<(), ObjectError> {
        let w = canvas.guide_line_width();
        for i in self.selected_records(r, selection) {
            if let Some((center, radius)) = self.resolve(r, i)? {
                canvas.stroke(&circle(center, radius + w), color::SELECTION, 2.0 * w);
            }
        }
        Ok(())
    }

    fn render_guide_selected(&self, r: &Resolver, canvas: &mut dyn Canvas, selection: &Selection) -> Result<(), ObjectError> {
        let w = canvas.guide_line_width();
        for i in self.selected_records(r, selection) {
            if let Some((center, _)) = self.resolve(r, i)? {
                canvas.stroke(&cross(center, 3.0 * w), color::GUIDE, w);
            }
        }
        Ok(())
    }

    fn select(&self, id: ObjectId, r: &Resolver, pick: &PickPoint, _action: SelectAction) -> Result<Option<Selection>, ObjectError> {
        // Later records are drawn on top.
        for i in r.records(&self.path).rev() {
            if let Some((center, radius)) = self.resolve(r, i)? {
                if (pick.position - center).length() <= radius + pick.tolerance {
                    return Ok(Some(Selection::object(id).with_record(i)));
                }
            }
        }
        Ok(None)
    }

    fn duplicate(&self) -> Result<Kind, ObjectError> {
        Ok(Kind::Circle(self.clone()))
    }
}

/// One segment per record of `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub path: Path,
    pub point1: ObjectId,
    pub point2: ObjectId,
    pub stroke: Option<Rgba8>,
}

impl Line {
    pub fn new(path: Path, point1: ObjectId, point2: ObjectId) -> Self {
        Self { path, point1, point2, stroke: Some(color::STROKE) }
    }

    fn resolve(&self, r: &Resolver, i: usize) -> Result<Option<(ScenePoint, ScenePoint)>, ObjectError> {
        let ctx = Context::Record(i);
        Ok(r.point(self.point1, ctx)?.zip(r.point(self.point2, ctx)?))
    }
}

impl Object for Line {
    fn kind_name(&self) -> &'static str {
        "Line"
    }

    fn dependencies(&self) -> Vec<ObjectId> {
        vec![self.point1, self.point2]
    }

    fn render(&self, r: &Resolver, canvas: &mut dyn Canvas) -> Result<(), ObjectError> {
        let Some(stroke) = self.stroke else {
            return Ok(());
        };
        let w = canvas.guide_line_width();
        for i in r.records(&self.path) {
            if let Some((p1, p2)) = self.resolve(r, i)? {
                canvas.stroke(&segment(p1, p2), stroke, w);
            }
        }
        Ok(())
    }

    fn render_selected(&self, r: &Resolver, canvas: &mut dyn Canvas, selection: &Selection) -> Result<(), ObjectError> {
        let w = canvas.guide_line_width();
        let records = match selection.record {
            Some(i) => i..i + 1,
            None => r.records(&self.path),
        };
        for i in records {
            if let Some((p1, p2)) = self.resolve(r, i)? {
                canvas.stroke(&segment(p1, p2), color::SELECTION, 2.0 * w);
            }
        }
        Ok(())
    }

    fn select(&self, id: ObjectId, r: &Resolver, pick: &PickPoint, _action: SelectAction) -> Result<Option<Selection>, ObjectError> {
        for i in r.records(&self.path).rev() {
            if let Some((p1, p2)) = self.resolve(r, i)? {
                if distance_to_segment(pick.position, p1, p2) <= pick.tolerance {
                    return Ok(Some(Selection::object(id).with_record(i)));
                }
            }
        }
        Ok(None)
    }

    fn duplicate(&self) -> Result<Kind, ObjectError> {
        Ok(Kind::Line(self.clone()))
    }
}

/// A polyline through `points` evaluated for every record of `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct LineThrough {
    pub path: Path,
    pub points: ObjectId,
    pub stroke: Option<Rgba8>,
}

impl LineThrough {
    pub fn new(path: Path, points: ObjectId) -> Self {
        Self { path, points, stroke: Some(color::STROKE) }
    }

    /// Resolved vertices in record order. Missing records are left out.
    fn vertices(&self, r: &Resolver) -> Result<Vec<ScenePoint>, ObjectError> {
        let mut vertices = Vec::new();
        for i in r.records(&self.path) {
            if let Some(p) = r.point(self.points, Context::Record(i))? {
                vertices.push(p);
            }
        }
        Ok(vertices)
    }
}

impl Object for LineThrough {
    fn kind_name(&self) -> &'static str {
        "LineThrough"
    }

    fn dependencies(&self) -> Vec<ObjectId> {
        vec![self.points]
    }

    fn render(&self, r: &Resolver, canvas: &mut dyn Canvas) -> Result<(), ObjectError> {
        if let Some(stroke) = self.stroke {
            let w = canvas.guide_line_width();
            canvas.stroke(&polyline(&self.vertices(r)?, false), stroke, w);
        }
        Ok(())
    }

    fn render_selected(&self, r: &Resolver, canvas: &mut dyn Canvas, _selection: &Selection) -> Result<(), ObjectError> {
        let w = canvas.guide_line_width();
        canvas.stroke(&polyline(&self.vertices(r)?, false), color::SELECTION, 2.0 * w);
        Ok(())
    }

    fn select(&self, id: ObjectId, r: &Resolver, pick: &PickPoint, _action: SelectAction) -> Result<Option<Selection>, ObjectError> {
        let vertices = self.vertices(r)?;
        let hit = vertices
            .windows(2)
            .any(|pair| distance_to_segment(pick.position, pair[0], pair[1]) <= pick.tolerance);
        Ok(hit.then(|| Selection::object(id)))
    }

    fn duplicate(&self) -> Result<Kind, ObjectError> {
        Ok(Kind::LineThrough(self.clone()))
    }
}

#[cfg(test)]
mod test_shapes {
    use super::*;
    use super::super::test_objects::{ cars, point };
    use crate::renderer::display_list::{ Command, DisplayList };

    fn scatter_circle(objects: &mut Objects, radius: f32) -> (ObjectId, Circle) {
        let a1 = point(objects, 0.0, 0.0);
        let a2 = point(objects, 0.0, 100.0);
        let mpg = objects.insert(GeoObject::new(Track::new(Path::new("cars.mpg"), a1, a2, 0.0, 100.0)));
        let r = objects.insert(GeoObject::new(Plain::Number(radius)));
        let circle = Circle::new(Path::new("cars"), mpg, r);
        (objects.insert(GeoObject::new(circle.clone())), circle)
    }

    #[test]
    fn test_circle_skips_missing_records() {
        let data = crate::data::dataset::JsonDataset::from_str(
            r#"{ "cars": [ { "mpg": 10 }, { "mpg": "?" }, { }, { "mpg": 40 } ] }"#,
        ).unwrap();
        let mut objects = Objects::default();
        let (_, circle) = scatter_circle(&mut objects, 2.0);
        let mut canvas = DisplayList::new(DeviceSize::new(100.0, 100.0));

        circle.render(&Resolver::new(&objects, &data), &mut canvas).unwrap();
        assert_eq!(canvas.commands().len(), 2);
        assert!(canvas.commands().iter().all(|c| matches!(c, Command::Fill { .. })));
    }

    #[test]
    fn test_circle_select_record() {
        let data = cars();
        let mut objects = Objects::default();
        let (id, circle) = scatter_circle(&mut objects, 2.0);
        let r = Resolver::new(&objects, &data);

        // Record 2 has mpg 50.
        let pick = PickPoint::new(ScenePoint::new(1.0, 51.0), 0.5);
        assert_eq!(circle.select(id, &r, &pick, SelectAction::Select), Ok(Some(Selection::object(id).with_record(2))));

        let miss = PickPoint::new(ScenePoint::new(10.0, 51.0), 0.5);
        assert_eq!(circle.select(id, &r, &miss, SelectAction::Select), Ok(None));
    }

    #[test]
    fn test_circle_needs_number_radius() {
        let data = cars();
        let mut objects = Objects::default();
        let center = point(&mut objects, 0.0, 0.0);
        let circle = Circle::new(Path::new("cars"), center, center);
        let mut canvas = DisplayList::new(DeviceSize::new(100.0, 100.0));

        assert_eq!(
            circle.render(&Resolver::new(&objects, &data), &mut canvas),
            Err(ObjectError::CapabilityMissing { id: center, capability: Capability::GetNumber })
        );
    }

    #[test]
    fn test_line_through_hits_polyline() {
        let data = cars();
        let mut objects = Objects::default();
        let a1 = point(&mut objects, 0.0, 0.0);
        let a2 = point(&mut objects, 100.0, 0.0);
        let mpg = objects.insert(GeoObject::new(Track::new(Path::new("cars.mpg"), a1, a2, 0.0, 100.0)));
        let through = LineThrough::new(Path::new("cars"), mpg);
        let id = objects.insert(GeoObject::new(through.clone()));
        let r = Resolver::new(&objects, &data);

        assert_eq!(through.vertices(&r).unwrap().len(), 3);
        let pick = PickPoint::new(ScenePoint::new(20.0, 0.5), 1.0);
        assert_eq!(through.select(id, &r, &pick, SelectAction::Select), Ok(Some(Selection::object(id))));
    }

    #[test]
    fn test_line_per_record() {
        let data = cars();
        let mut objects = Objects::default();
        let a1 = point(&mut objects, 0.0, 0.0);
        let a2 = point(&mut objects, 0.0, 100.0);
        let mpg = objects.insert(GeoObject::new(Track::new(Path::new("cars.mpg"), a1, a2, 0.0, 100.0)));
        let origin = point(&mut objects, -10.0, 0.0);
        let line = Line::new(Path::new("cars"), origin, mpg);
        let mut canvas = DisplayList::new(DeviceSize::new(100.0, 100.0));

        line.render(&Resolver::new(&objects, &data), &mut canvas).unwrap();
        assert_eq!(canvas.commands().len(), 3);
    }
}
