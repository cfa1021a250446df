pub mod matrix;
pub mod dirty_flag;
pub mod color;
pub mod path;
pub mod dataset;

use lyon::geom::euclid;

pub mod prelude {
    pub use super::matrix::{ ProjectSceneToDevice, ViewData, PickPoint, MIN_SCALE, MAX_SCALE, is_valid_scale };
    pub use super::color::{ self, Rgba8 };
    pub use super::dirty_flag::{ DirtyFlag, Layer, LayerSet };
    pub use super::path::Path;
    pub use super::dataset::{ Context, Dataset, FieldKind, Scalar, Schema, Statistics };

    /// Visualization units, y axis pointing up.
    pub struct SceneSpace;
    pub type ScenePoint = super::euclid::Point2D<f32, SceneSpace>;
    pub type SceneVector = super::euclid::Vector2D<f32, SceneSpace>;
    pub type SceneSize = super::euclid::Size2D<f32, SceneSpace>;
    pub type SceneRect = super::euclid::Rect<f32, SceneSpace>;
    pub type LocalTransform = super::euclid::Transform2D<f32, SceneSpace, SceneSpace>;

    /// Logical window pixels, y axis pointing down.
    pub struct ScreenSpace;
    pub type ScreenPoint = super::euclid::Point2D<f32, ScreenSpace>;
    pub type ScreenSize = super::euclid::Size2D<f32, ScreenSpace>;
    pub type ScreenVector = super::euclid::Vector2D<f32, ScreenSpace>;

    /// Physical pixels of a layer's backing store.
    pub struct DeviceSpace;
    pub type DevicePoint = super::euclid::Point2D<f32, DeviceSpace>;
    pub type DeviceSize = super::euclid::Size2D<f32, DeviceSpace>;
    pub type DeviceTransform = super::euclid::Transform2D<f32, SceneSpace, DeviceSpace>;
}
