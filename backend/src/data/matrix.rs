use super::prelude::*;

/// Screen distance, in logical pixels, within which a pointer hits an object.
pub const PICK_RADIUS: f32 = 5.0;

/// Zoom range of the editor view.
pub const MIN_SCALE: f32 = 1e-4;
pub const MAX_SCALE: f32 = 1e4;

pub fn is_valid_scale(scale: f32) -> bool {
    (MIN_SCALE..=MAX_SCALE).contains(&scale)
}

/// Live view of the editor: pan offset, zoom and viewport geometry.
///
/// `center` is the pan offset in logical pixels, measured y-up like the scene.
/// A scene point `p` lands on screen at
/// `(p.x * scale + center.x + width / 2, -p.y * scale - center.y + height / 2)`,
/// and the device pixel is that times `ratio`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewData {
    pub center: ScreenVector,
    pub scale: f32,
    pub size: ScreenSize,
    pub ratio: f32,
}

impl Default for ViewData {
    fn default() -> Self {
        Self {
            center: ScreenVector::zero(),
            scale: 1.0,
            size: ScreenSize::new(600.0, 400.0),
            ratio: 1.0,
        }
    }
}

/// A pointer location in scene units, with the hit tolerance at the current zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickPoint {
    pub position: ScenePoint,
    pub tolerance: f32,
}

impl PickPoint {
    pub fn new(position: ScenePoint, tolerance: f32) -> Self {
        Self { position, tolerance }
    }
}

impl ViewData {
    pub fn device_size(&self) -> DeviceSize {
        DeviceSize::new(self.size.width * self.ratio, self.size.height * self.ratio)
    }

    pub fn screen_from_offset(&self, point: ScenePoint) -> ScreenPoint {
        ScreenPoint::new(
            point.x * self.scale + self.center.x + self.size.width / 2.0,
            -point.y * self.scale - self.center.y + self.size.height / 2.0,
        )
    }

    pub fn offset_from_screen(&self, point: ScreenPoint) -> ScenePoint {
        ScenePoint::new(
            (point.x - self.size.width / 2.0 - self.center.x) / self.scale,
            -(point.y - self.size.height / 2.0 + self.center.y) / self.scale,
        )
    }

    pub fn pick(&self, point: ScreenPoint) -> PickPoint {
        PickPoint::new(self.offset_from_screen(point), PICK_RADIUS / self.scale)
    }

    /// Fits `artboard` into the viewport with a 5 pixel margin on each side.
    pub fn auto_view(&mut self, artboard: &SceneRect) {
        if artboard.width() <= 0.0 || artboard.height() <= 0.0 {
            log::warn!("auto view skipped for empty artboard {:?}", artboard);
            return;
        }
        self.scale = ((self.size.width - 10.0) / artboard.width())
            .min((self.size.height - 10.0) / artboard.height())
            .clamp(MIN_SCALE, MAX_SCALE);
        let middle = artboard.center();
        self.center = ScreenVector::new(-middle.x * self.scale, -middle.y * self.scale);
    }

    pub fn pan(&mut self, delta: ScreenVector) {
        self.center.x += delta.x;
        self.center.y -= delta.y;
    }

    /// Multiplies the zoom by `factor` keeping the scene point under `anchor` fixed.
    /// The result stays within [`MIN_SCALE`]..=[`MAX_SCALE`].
    pub fn zoom_about(&mut self, anchor: ScreenPoint, factor: f32) {
        let fixed = self.offset_from_screen(anchor);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.center = ScreenVector::new(
            anchor.x - self.size.width / 2.0 - fixed.x * self.scale,
            self.size.height / 2.0 - anchor.y - fixed.y * self.scale,
        );
    }
}

pub trait ProjectSceneToDevice {
    /// Scene to device pixels through the live pan/zoom.
    fn look_to(view_data: &ViewData) -> Self;
    /// Scene to device pixels for exporting `artboard`, independent of the live view.
    fn look_to_artboard(artboard: &SceneRect, ratio: f32) -> Self;
}

impl ProjectSceneToDevice for DeviceTransform {
    fn look_to(view_data: &ViewData) -> Self {
        let r = view_data.ratio;
        let s = view_data.scale;

        Self::new(
            r * s, 0.0,
            0.0, -r * s,
            r * (view_data.center.x + view_data.size.width / 2.0),
            r * (-view_data.center.y + view_data.size.height / 2.0),
        )
    }

    fn look_to_artboard(artboard: &SceneRect, ratio: f32) -> Self {
        Self::new(
            ratio, 0.0,
            0.0, -ratio,
            -ratio * artboard.min_x(),
            ratio * (artboard.min_y() + artboard.height()),
        )
    }
}
