use super::*;
use crate::renderer::canvas::segment;

/// Another object's point shifted by a fixed vector.
#[derive(Debug, Clone, PartialEq)]
pub struct PointOffset {
    pub object: ObjectId,
    pub offset: SceneVector,
}

impl PointOffset {
    pub fn new(object: ObjectId, offset: SceneVector) -> Self {
        Self { object, offset }
    }
}

impl Object for PointOffset {
    fn kind_name(&self) -> &'static str {
        "PointOffset"
    }

    fn capabilities(&self) -> Capabilities {
        Capability::GetPoint.into()
    }

    fn get(&self, r: &Resolver, ctx: Context) -> Result<Option<Value>, ObjectError> {
        Ok(r.point(self.object, ctx)?.map(|p| Value::Point(p + self.offset)))
    }

    fn dependencies(&self) -> Vec<ObjectId> {
        vec![self.object]
    }

    fn render_guide_selected(&self, r: &Resolver, canvas: &mut dyn Canvas, selection: &Selection) -> Result<(), ObjectError> {
        if let Some(base) = r.point(self.object, selection.context())? {
            let w = canvas.guide_line_width();
            canvas.stroke(&segment(base, base + self.offset), color::GUIDE, w);
        }
        Ok(())
    }

    fn duplicate(&self) -> Result<Kind, ObjectError> {
        Ok(Kind::PointOffset(self.clone()))
    }
}

/// Evaluates `object` for the record whose index is stored in the `reference` field.
///
/// With a `target` collection, indices past its end resolve to nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceWrapper {
    pub reference: Path,
    pub target: Option<Path>,
    pub object: ObjectId,
    capabilities: Capabilities,
}

impl ReferenceWrapper {
    /// `capabilities` are those of the wrapped object, fixed at construction.
    pub fn new(reference: Path, target: Option<Path>, object: ObjectId, capabilities: Capabilities) -> Self {
        Self { reference, target, object, capabilities }
    }

    fn referenced(&self, r: &Resolver, ctx: Context) -> Option<Context> {
        let index = r.data().resolve(&self.reference, ctx)?.as_number()?;
        if index < 0.0 || index.fract() != 0.0 {
            return None;
        }
        let index = index as usize;
        match &self.target {
            Some(target) if index >= r.data().record_count(target) => None,
            _ => Some(Context::Record(index)),
        }
    }
}

impl Object for ReferenceWrapper {
    fn kind_name(&self) -> &'static str {
        "ReferenceWrapper"
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn get(&self, r: &Resolver, ctx: Context) -> Result<Option<Value>, ObjectError> {
        match self.referenced(r, ctx) {
            Some(referenced) => r.get(self.object, referenced),
            None => Ok(None),
        }
    }

    fn dependencies(&self) -> Vec<ObjectId> {
        vec![self.object]
    }
}
