use super::*;
use crate::renderer::canvas::{ circle, cross, segment, segments };

/// Label size in pixels.
const LABEL_SIZE: f32 = 10.0;
/// Tick length in pixels.
const TICK: f32 = 4.0;

/// Maps a numeric field linearly from `[min, max]` onto the segment between two anchors.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub path: Path,
    pub anchor1: ObjectId,
    pub anchor2: ObjectId,
    pub min: f64,
    pub max: f64,
}

impl Track {
    pub fn new(path: Path, anchor1: ObjectId, anchor2: ObjectId, min: f64, max: f64) -> Self {
        Self { path, anchor1, anchor2, min, max }
    }

    /// Domain padded by a tenth of the data range on each side.
    pub fn with_statistics(path: Path, anchor1: ObjectId, anchor2: ObjectId, stats: &Statistics) -> Self {
        let pad = if stats.range > 0.0 {
            stats.range / 10.0
        } else {
            log::debug!("constant field `{}`, padding its domain by one", path);
            1.0
        };
        Self::new(path, anchor1, anchor2, stats.min - pad, stats.max + pad)
    }

    pub fn check_domain(&self) -> Result<(), ObjectError> {
        if self.min.is_finite() && self.max.is_finite() && self.min < self.max {
            Ok(())
        } else {
            Err(ObjectError::InvalidDomain { min: self.min, max: self.max })
        }
    }

    pub fn anchors(&self, r: &Resolver, ctx: Context) -> Result<Option<(ScenePoint, ScenePoint)>, ObjectError> {
        Ok(r.point(self.anchor1, ctx)?.zip(r.point(self.anchor2, ctx)?))
    }

    /// Position of `value` on the axis. Values outside the domain extrapolate.
    pub fn map_value(&self, r: &Resolver, value: f64, ctx: Context) -> Result<Option<ScenePoint>, ObjectError> {
        self.check_domain()?;
        let t = ((value - self.min) / (self.max - self.min)) as f32;
        Ok(self.anchors(r, ctx)?.map(|(p1, p2)| p1.lerp(p2, t)))
    }
}

fn label(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

impl Object for Track {
    fn kind_name(&self) -> &'static str {
        "Track"
    }

    fn capabilities(&self) -> Capabilities {
        Capability::GetPoint.into()
    }

    fn get(&self, r: &Resolver, ctx: Context) -> Result<Option<Value>, ObjectError> {
        self.check_domain()?;
        match r.data().resolve(&self.path, ctx).and_then(|s| s.as_number()) {
            Some(value) => Ok(self.map_value(r, value, ctx)?.map(Value::Point)),
            None => Ok(None),
        }
    }

    fn dependencies(&self) -> Vec<ObjectId> {
        vec![self.anchor1, self.anchor2]
    }

    fn render(&self, r: &Resolver, canvas: &mut dyn Canvas) -> Result<(), ObjectError> {
        self.check_domain()?;
        let Some((p1, p2)) = self.anchors(r, Context::Constant)? else {
            return Ok(());
        };

        let w = canvas.guide_line_width();
        let direction = (p2 - p1).try_normalize().unwrap_or(SceneVector::new(1.0, 0.0));
        let normal = SceneVector::new(-direction.y, direction.x) * TICK * w;
        canvas.stroke(
            &segments([(p1, p2), (p1 - normal, p1 + normal), (p2 - normal, p2 + normal)]),
            color::FOREGROUND,
            w,
        );
        canvas.fill_text(&label(self.min), p1 + normal * 2.0, LABEL_SIZE * w, color::FOREGROUND);
        canvas.fill_text(&label(self.max), p2 + normal * 2.0, LABEL_SIZE * w, color::FOREGROUND);
        Ok(())
    }

    fn render_selected(&self, r: &Resolver, canvas: &mut dyn Canvas, _selection: &Selection) -> Result<(), ObjectError> {
        if let Some((p1, p2)) = self.anchors(r, Context::Constant)? {
            let w = canvas.guide_line_width();
            canvas.stroke(&segment(p1, p2), color::SELECTION, 2.0 * w);
        }
        Ok(())
    }

    fn render_guide(&self, r: &Resolver, canvas: &mut dyn Canvas) -> Result<(), ObjectError> {
        if let Some((p1, p2)) = self.anchors(r, Context::Constant)? {
            let w = canvas.guide_line_width();
            canvas.stroke(&cross(p1, TICK * w), color::GUIDE, w);
            canvas.stroke(&cross(p2, TICK * w), color::GUIDE, w);
        }
        Ok(())
    }

    fn render_guide_selected(&self, r: &Resolver, canvas: &mut dyn Canvas, selection: &Selection) -> Result<(), ObjectError> {
        if let Some((p1, p2)) = self.anchors(r, Context::Constant)? {
            let w = canvas.guide_line_width();
            let marked = match selection.handle {
                Some(Handle::Anchor1) => vec![p1],
                Some(Handle::Anchor2) => vec![p2],
                None => vec![p1, p2],
            };
            for p in marked {
                canvas.stroke(&circle(p, TICK * w), color::SELECTION, w);
            }
        }
        Ok(())
    }

    fn select(&self, id: ObjectId, r: &Resolver, pick: &PickPoint, action: SelectAction) -> Result<Option<Selection>, ObjectError> {
        let Some((p1, p2)) = self.anchors(r, Context::Constant)? else {
            return Ok(None);
        };

        for (anchor, at, handle) in [(self.anchor1, p1, Handle::Anchor1), (self.anchor2, p2, Handle::Anchor2)] {
            if (pick.position - at).length() <= pick.tolerance {
                return Ok(Some(match action {
                    SelectAction::GetPoint => Selection::object(anchor),
                    SelectAction::Select => Selection::object(id).with_handle(handle),
                }));
            }
        }

        Ok((distance_to_segment(pick.position, p1, p2) <= pick.tolerance).then(|| Selection::object(id)))
    }

    fn duplicate(&self) -> Result<Kind, ObjectError> {
        Ok(Kind::Track(self.clone()))
    }
}

/// Two point sources combined into one: the point whose projection onto each
/// track axis is that track's mapped position.
#[derive(Debug, Clone, PartialEq)]
pub struct Scatter {
    pub track1: ObjectId,
    pub track2: ObjectId,
}

impl Scatter {
    pub fn new(track1: ObjectId, track2: ObjectId) -> Self {
        Self { track1, track2 }
    }
}

impl Object for Scatter {
    fn kind_name(&self) -> &'static str {
        "Scatter"
    }

    fn capabilities(&self) -> Capabilities {
        Capability::GetPoint.into()
    }

    fn get(&self, r: &Resolver, ctx: Context) -> Result<Option<Value>, ObjectError> {
        let (Some(p1), Some(p2)) = (r.point(self.track1, ctx)?, r.point(self.track2, ctx)?) else {
            return Ok(None);
        };

        let point = match (r.axis(self.track1, ctx)?, r.axis(self.track2, ctx)?) {
            (Some((a1, b1)), Some((a2, b2))) => {
                // Solve (q - p1).d1 = 0 and (q - p2).d2 = 0.
                let (d1, d2) = (b1 - a1, b2 - a2);
                let det = d1.x * d2.y - d1.y * d2.x;
                if det.abs() <= f32::EPSILON * d1.length() * d2.length() {
                    return Err(ObjectError::ParallelTracks);
                }
                let (c1, c2) = (d1.dot(p1.to_vector()), d2.dot(p2.to_vector()));
                ScenePoint::new((c1 * d2.y - c2 * d1.y) / det, (d1.x * c2 - d2.x * c1) / det)
            }
            _ => ScenePoint::new(p1.x, p2.y),
        };
        Ok(Some(Value::Point(point)))
    }

    fn dependencies(&self) -> Vec<ObjectId> {
        vec![self.track1, self.track2]
    }

    fn duplicate(&self) -> Result<Kind, ObjectError> {
        Ok(Kind::Scatter(self.clone()))
    }
}

/// A track read through a different field than its own.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackWrapper {
    pub track: ObjectId,
    pub path: Path,
}

impl TrackWrapper {
    pub fn new(track: ObjectId, path: Path) -> Self {
        Self { track, path }
    }
}

impl Object for TrackWrapper {
    fn kind_name(&self) -> &'static str {
        "TrackWrapper"
    }

    fn capabilities(&self) -> Capabilities {
        Capability::GetPoint.into()
    }

    fn get(&self, r: &Resolver, ctx: Context) -> Result<Option<Value>, ObjectError> {
        let track = r.track(self.track)?;
        match r.data().resolve(&self.path, ctx).and_then(|s| s.as_number()) {
            Some(value) => Ok(track.map_value(r, value, ctx)?.map(Value::Point)),
            None => Ok(None),
        }
    }

    fn dependencies(&self) -> Vec<ObjectId> {
        vec![self.track]
    }
}
