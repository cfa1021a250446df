use super::*;
use crate::renderer::canvas::{ circle, cross };

/// A literal point or number.
#[derive(Debug, Clone, PartialEq)]
pub enum Plain {
    Point(ScenePoint),
    Number(f32),
}

impl Object for Plain {
    fn kind_name(&self) -> &'static str {
        "Plain"
    }

    fn capabilities(&self) -> Capabilities {
        match self {
            Plain::Point(_) => Capability::GetPoint.into(),
            Plain::Number(_) => Capability::GetNumber.into(),
        }
    }

    fn get(&self, _r: &Resolver, _ctx: Context) -> Result<Option<Value>, ObjectError> {
        Ok(Some(match self {
            Plain::Point(p) => Value::Point(*p),
            Plain::Number(n) => Value::Number(*n),
        }))
    }

    fn dependencies(&self) -> Vec<ObjectId> {
        Vec::new()
    }

    fn render_guide(&self, _r: &Resolver, canvas: &mut dyn Canvas) -> Result<(), ObjectError> {
        if let Plain::Point(p) = self {
            let w = canvas.guide_line_width();
            canvas.stroke(&cross(*p, 4.0 * w), color::GUIDE, w);
        }
        Ok(())
    }

    fn render_guide_selected(&self, _r: &Resolver, canvas: &mut dyn Canvas, _selection: &Selection) -> Result<(), ObjectError> {
        if let Plain::Point(p) = self {
            let w = canvas.guide_line_width();
            canvas.stroke(&circle(*p, 4.0 * w), color::SELECTION, w);
        }
        Ok(())
    }

    fn select(&self, id: ObjectId, _r: &Resolver, pick: &PickPoint, _action: SelectAction) -> Result<Option<Selection>, ObjectError> {
        Ok(match self {
            Plain::Point(p) if (pick.position - *p).length() <= pick.tolerance => Some(Selection::object(id)),
            _ => None,
        })
    }

    fn duplicate(&self) -> Result<Kind, ObjectError> {
        Ok(Kind::Plain(self.clone()))
    }
}
