//! Layered rendering of a visualization.
//!
//! The [`Renderer`] keeps one canvas per [`Layer`] and repaints only the layers
//! marked dirty. Exports ignore the live view and map the artboard to the
//! output origin.

pub mod canvas;
pub mod display_list;
pub mod config;
pub mod tessellate;
pub mod raster;
pub mod svg;
pub mod gpu;

use crate::{
    data::prelude::*,
    error::ObjectError,
    scene_system::scene::Visualization,
};
use canvas::{ Canvas, cross, rectangle, segments };

pub use config::{ Guides, RendererConfig };

/// When a hook runs relative to a layer's built-in content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Before,
    Main,
    After,
}

pub type Hook = Box<dyn FnMut(&mut dyn Canvas, &Visualization, &dyn Dataset)>;

/// Paints transient interaction state on the overlay layer.
pub trait OverlayPainter {
    fn paint_overlay(&self, canvas: &mut dyn Canvas) -> Vec<ObjectError>;
}

impl OverlayPainter for () {
    fn paint_overlay(&self, _canvas: &mut dyn Canvas) -> Vec<ObjectError> {
        Vec::new()
    }
}

/// Grid spacing readable at `scale`: `grid_size` stepped by factors of ten
/// until one cell spans 5 to 50 pixels.
pub fn grid_spacing(grid_size: f32, scale: f32) -> f32 {
    if !(grid_size > 0.0 && scale > 0.0 && grid_size.is_finite() && scale.is_finite()) {
        return grid_size;
    }
    let mut gs = grid_size;
    while gs * scale < 5.0 && gs.is_finite() {
        gs *= 10.0;
    }
    while gs * scale > 50.0 && gs.is_finite() {
        gs /= 10.0;
    }
    match gs.is_finite() && gs > 0.0 {
        true => gs,
        false => grid_size,
    }
}

fn layer_index(layer: Layer) -> usize {
    match layer {
        Layer::Back => 0,
        Layer::Main => 1,
        Layer::Front => 2,
        Layer::Overlay => 3,
    }
}

pub struct Renderer<C: Canvas> {
    view: ViewData,
    pub guides: Guides,
    layers: [C; 4],
    dirty: LayerSet,
    painted: LayerSet,
    hooks: Vec<(Layer, Stage, Hook)>,
    errors: Vec<ObjectError>,
}

impl<C: Canvas> Renderer<C> {
    /// `make` creates a layer canvas of the given device size.
    pub fn new<F: Fn(DeviceSize) -> C>(make: F) -> Self {
        let view = ViewData::default();
        let size = view.device_size();
        Self {
            view,
            guides: Guides::default(),
            layers: Layer::ALL.map(|_| make(size)),
            dirty: LayerSet::all(),
            painted: LayerSet::empty(),
            hooks: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn layer(&self, layer: Layer) -> &C {
        &self.layers[layer_index(layer)]
    }

    pub fn view(&self) -> &ViewData {
        &self.view
    }

    pub fn is_dirty(&self, layer: Layer) -> bool {
        self.dirty.contains(layer)
    }

    pub fn trigger<L: Into<LayerSet>>(&mut self, layers: L) {
        self.dirty = self.dirty.union(layers.into());
    }

    /// Comma separated layer names; an empty list means every layer.
    pub fn trigger_names(&mut self, names: &str) {
        match names.trim().is_empty() {
            true => self.trigger(LayerSet::all()),
            false => self.trigger(LayerSet::parse(names)),
        }
    }

    pub fn on(&mut self, layer: Layer, stage: Stage, hook: Hook) {
        self.hooks.push((layer, stage, hook));
    }

    /// Ignores scales outside [`MIN_SCALE`]..=[`MAX_SCALE`].
    pub fn set_view(&mut self, center: ScreenVector, scale: f32) {
        if !is_valid_scale(scale) {
            log::warn!("ignored view scale {}", scale);
            return;
        }
        self.view.center = center;
        self.view.scale = scale;
        self.trigger(LayerSet::all());
    }

    pub fn auto_view(&mut self, artboard: &SceneRect) {
        self.view.auto_view(artboard);
        self.trigger(LayerSet::all());
    }

    pub fn pan(&mut self, delta: ScreenVector) {
        self.view.pan(delta);
        self.trigger(LayerSet::all());
    }

    pub fn zoom_about(&mut self, anchor: ScreenPoint, factor: f32) {
        if !(factor > 0.0 && factor.is_finite()) {
            return;
        }
        self.view.zoom_about(anchor, factor);
        self.trigger(LayerSet::all());
    }

    /// Logical size of every layer.
    pub fn resize(&mut self, size: ScreenSize) {
        self.view.size = size;
        self.resize_layers();
    }

    pub fn resolution_ratio(&self) -> f32 {
        self.view.ratio
    }

    pub fn set_resolution_ratio(&mut self, ratio: f32) {
        if !(ratio > 0.0 && ratio.is_finite()) {
            log::warn!("ignored resolution ratio {}", ratio);
            return;
        }
        self.view.ratio = ratio;
        self.resize_layers();
    }

    fn resize_layers(&mut self) {
        let size = self.view.device_size();
        log::debug!("layers resized to {}x{}", size.width, size.height);
        self.layers.iter_mut().for_each(|canvas| canvas.resize(size));
        self.trigger(LayerSet::all());
    }

    pub fn config(&self) -> RendererConfig {
        RendererConfig {
            center: self.view.center,
            scale: self.view.scale,
            guides: self.guides,
        }
    }

    pub fn set_config(&mut self, config: &RendererConfig) {
        self.guides = config.guides;
        self.set_view(config.center, config.scale);
    }

    /// Layers painted since the last call.
    pub fn take_painted(&mut self) -> LayerSet {
        self.painted.take()
    }

    /// Configuration errors met while painting, oldest first.
    pub fn take_errors(&mut self) -> Vec<ObjectError> {
        std::mem::take(&mut self.errors)
    }

    /// Repaints every layer dirty at call time. Returns whether anything was painted.
    pub fn render(&mut self, vis: &Visualization, data: &dyn Dataset, overlay: &dyn OverlayPainter) -> bool {
        let dirty = self.dirty.take();
        if dirty.is_empty() {
            return false;
        }

        let transform = DeviceTransform::look_to(&self.view);
        let Self { view, guides, layers, hooks, errors, painted, .. } = self;

        for layer in dirty.iter() {
            let canvas = &mut layers[layer_index(layer)];
            canvas.clear();
            canvas.save();
            canvas.set_transform(transform);

            let mut run_hooks = |stage: Stage, canvas: &mut C| {
                hooks
                    .iter_mut()
                    .filter(|(l, s, _)| *l == layer && *s == stage)
                    .for_each(|(_, _, hook)| hook(&mut *canvas, vis, data));
            };

            run_hooks(Stage::Before, canvas);
            errors.extend(paint_layer(layer, canvas, view, guides, vis, data, overlay));
            run_hooks(Stage::Main, canvas);
            run_hooks(Stage::After, canvas);

            canvas.restore();
            painted.insert(layer);
        }
        log::trace!("painted {:?}", dirty);
        true
    }
}

fn paint_layer(
    layer: Layer,
    canvas: &mut dyn Canvas,
    view: &ViewData,
    guides: &Guides,
    vis: &Visualization,
    data: &dyn Dataset,
    overlay: &dyn OverlayPainter,
) -> Vec<ObjectError> {
    match layer {
        Layer::Main => vis.render(data, canvas),
        Layer::Front => {
            let mut errors = Vec::new();
            if guides.show_guide {
                errors.extend(vis.render_guide_selected(data, &mut *canvas));
            }
            errors.extend(vis.render_selection(data, canvas));
            errors
        }
        Layer::Back => {
            let w = canvas.guide_line_width();
            if guides.show_guide {
                canvas.stroke(&rectangle(&vis.artboard), color::ARTBOARD, w);
            }
            if guides.frame_grid {
                let gs = grid_spacing(guides.grid_size, view.scale);
                paint_grid(canvas, view, gs, color::GRID_FINE);
                paint_grid(canvas, view, gs * 10.0, color::GRID_COARSE);
            }
            if guides.frame_origin {
                canvas.stroke(&cross(ScenePoint::origin(), 10.0 * w), color::ORIGIN, w);
            }
            match guides.show_guide {
                true => vis.render_guide(data, canvas),
                false => Vec::new(),
            }
        }
        Layer::Overlay => overlay.paint_overlay(canvas),
    }
}

/// Grid lines every `gs` scene units covering the viewport. Cells under a
/// pixel are not drawn.
fn paint_grid(canvas: &mut dyn Canvas, view: &ViewData, gs: f32, color: Rgba8) {
    if !(gs * view.scale >= 1.0 && gs.is_finite()) {
        return;
    }
    let nx = (view.size.width / view.scale / 2.0 / gs).ceil() as i32;
    let kx = (-view.center.x / gs / view.scale).round() as i32;
    let ny = (view.size.height / view.scale / 2.0 / gs).ceil() as i32;
    let ky = (-view.center.y / gs / view.scale).round() as i32;
    let at = |i: i32, j: i32| ScenePoint::new(i as f32 * gs, j as f32 * gs);

    let vertical = (-nx..=nx).map(|i| (at(i + kx, ky + ny), at(i + kx, ky - ny)));
    let horizontal = (-ny..=ny).map(|j| (at(kx + nx, j + ky), at(kx - nx, j + ky)));
    let w = canvas.guide_line_width();
    canvas.stroke(&segments(vertical.chain(horizontal)), color, w);
}

/// Paints the top-level objects of `vis` onto `canvas` with the artboard at the origin.
fn paint_export(canvas: &mut dyn Canvas, vis: &Visualization, data: &dyn Dataset, ratio: f32) -> anyhow::Result<()> {
    canvas.set_transform(DeviceTransform::look_to_artboard(&vis.artboard, ratio));
    match vis.render(data, canvas).into_iter().next() {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

/// SVG document of the artboard, independent of the live view.
pub fn render_vector(vis: &Visualization, data: &dyn Dataset) -> anyhow::Result<String> {
    let size = vis.artboard.size;
    let mut canvas = svg::SvgCanvas::new(DeviceSize::new(size.width, size.height));
    paint_export(&mut canvas, vis, data, 1.0)?;
    log::info!("vector export with {} elements", canvas.len());
    Ok(canvas.finish())
}

/// Bitmap of the artboard at `ratio` pixels per scene unit.
pub fn render_raster(vis: &Visualization, data: &dyn Dataset, ratio: f32) -> anyhow::Result<tiny_skia::Pixmap> {
    let size = vis.artboard.size;
    let mut canvas = raster::RasterCanvas::new(DeviceSize::new(size.width * ratio, size.height * ratio))?;
    paint_export(&mut canvas, vis, data, ratio)?;
    log::info!("raster export {}x{}", canvas.pixmap().width(), canvas.pixmap().height());
    Ok(canvas.into_pixmap())
}

#[cfg(test)]
mod test_renderer {
    use std::{ cell::RefCell, rc::Rc };

    use super::*;
    use crate::data::dataset::JsonDataset;
    use crate::objects::*;
    use display_list::{ Command, DisplayList };

    fn renderer() -> Renderer<DisplayList> {
        Renderer::new(DisplayList::new)
    }

    fn data() -> JsonDataset {
        JsonDataset::from_str(r#"{ "points": [ { "v": 1 }, { "v": 2 } ] }"#).unwrap()
    }

    fn scene() -> Visualization {
        let mut vis = Visualization::default();
        let center = vis.insert(GeoObject::new(Plain::Point(ScenePoint::origin())));
        let radius = vis.insert(GeoObject::new(Plain::Number(3.0)));
        vis.add_object(GeoObject::new(Circle::new(Path::new("points"), center, radius)));
        vis
    }

    #[test]
    fn test_grid_spacing() {
        assert_eq!(grid_spacing(10.0, 1.0), 10.0);
        assert_eq!(grid_spacing(10.0, 0.1), 100.0);
        assert_eq!(grid_spacing(10.0, 100.0), 0.1);
        assert_eq!(grid_spacing(10.0, 0.0), 10.0);
        let gs = grid_spacing(10.0, 0.013);
        assert!(gs * 0.013 >= 5.0 && gs * 0.013 <= 50.0);
    }

    #[test]
    fn test_grid_spacing_at_tiny_scale_returns() {
        assert_eq!(grid_spacing(10.0, 1e-40), 10.0);
        assert_eq!(grid_spacing(10.0, f32::MIN_POSITIVE), 10.0);
    }

    #[test]
    fn test_grid_at_min_scale_paints() {
        let vis = Visualization::default();
        let data = data();
        let mut renderer = renderer();
        renderer.guides = Guides { frame_grid: true, show_guide: false, ..Guides::default() };
        renderer.set_view(ScreenVector::zero(), MIN_SCALE);

        assert!(renderer.render(&vis, &data, &()));
        assert_eq!(renderer.layer(Layer::Back).commands().len(), 2);
    }

    #[test]
    fn test_set_view_rejects_tiny_scale() {
        let mut renderer = renderer();
        renderer.set_view(ScreenVector::zero(), 1e-40);
        assert_eq!(renderer.view().scale, 1.0);
        renderer.set_view(ScreenVector::zero(), MIN_SCALE);
        assert_eq!(renderer.view().scale, MIN_SCALE);
    }

    #[test]
    fn test_clean_render_is_noop() {
        let (vis, data) = (scene(), data());
        let mut renderer = renderer();

        assert!(renderer.render(&vis, &data, &()));
        assert_eq!(renderer.take_painted(), LayerSet::all());
        let clears: Vec<usize> = Layer::ALL.iter().map(|l| renderer.layer(*l).clears()).collect();

        assert!(!renderer.render(&vis, &data, &()));
        assert!(renderer.take_painted().is_empty());
        for (layer, before) in Layer::ALL.iter().zip(clears) {
            assert_eq!(renderer.layer(*layer).clears(), before);
        }
    }

    #[test]
    fn test_one_dirty_layer() {
        let (vis, data) = (scene(), data());
        let mut renderer = renderer();
        renderer.render(&vis, &data, &());

        renderer.trigger_names("main");
        assert!(renderer.is_dirty(Layer::Main));
        assert!(renderer.render(&vis, &data, &()));
        assert_eq!(renderer.layer(Layer::Main).clears(), 2);
        assert_eq!(renderer.layer(Layer::Back).clears(), 1);
        assert!(!renderer.is_dirty(Layer::Main));
        assert_eq!(renderer.layer(Layer::Main).commands().len(), 2);
    }

    #[test]
    fn test_hooks_run_in_stage_order() {
        let (vis, data) = (scene(), data());
        let mut renderer = renderer();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (stage, name) in [(Stage::After, "after"), (Stage::Before, "before"), (Stage::Main, "main")] {
            let sink = log.clone();
            renderer.on(Layer::Main, stage, Box::new(move |canvas: &mut dyn Canvas, _: &Visualization, _: &dyn Dataset| {
                sink.borrow_mut().push((name, canvas.size().width));
            }));
        }
        renderer.trigger_names("main");
        renderer.render(&vis, &data, &());

        let names: Vec<&str> = log.borrow().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["before", "main", "after"]);
    }

    #[test]
    fn test_back_layer_guides() {
        let vis = Visualization::default();
        let data = data();
        let mut renderer = renderer();
        renderer.guides = Guides { frame_origin: true, frame_grid: true, ..Guides::default() };
        renderer.render(&vis, &data, &());
        // Artboard, two grid passes and the origin cross.
        assert_eq!(renderer.layer(Layer::Back).commands().len(), 4);

        renderer.guides = Guides { show_guide: false, ..Guides::default() };
        renderer.trigger(Layer::Back);
        renderer.render(&vis, &data, &());
        assert!(renderer.layer(Layer::Back).commands().is_empty());
    }

    #[test]
    fn test_errors_are_queued() {
        let data = data();
        let mut vis = Visualization::default();
        let a1 = vis.insert(GeoObject::new(Plain::Point(ScenePoint::origin())));
        let a2 = vis.insert(GeoObject::new(Plain::Point(ScenePoint::new(0.0, 10.0))));
        vis.add_object(GeoObject::new(Track::new(Path::new("points.v"), a1, a2, 1.0, 1.0)));
        let mut renderer = renderer();

        renderer.render(&vis, &data, &());
        assert_eq!(renderer.take_errors(), vec![ObjectError::InvalidDomain { min: 1.0, max: 1.0 }]);
        assert!(renderer.take_errors().is_empty());
        assert!(render_vector(&vis, &data).is_err());
    }

    #[test]
    fn test_resize_marks_all_dirty() {
        let (vis, data) = (scene(), data());
        let mut renderer = renderer();
        renderer.render(&vis, &data, &());

        renderer.set_resolution_ratio(2.0);
        assert_eq!(renderer.layer(Layer::Overlay).size(), DeviceSize::new(1200.0, 800.0));
        renderer.resize(ScreenSize::new(100.0, 50.0));
        assert_eq!(renderer.layer(Layer::Front).size(), DeviceSize::new(200.0, 100.0));
        assert_eq!(renderer.take_painted(), LayerSet::all());
        assert!(Layer::ALL.iter().all(|l| renderer.is_dirty(*l)));
    }

    #[test]
    fn test_main_layer_uses_view_transform() {
        let (vis, data) = (scene(), data());
        let mut renderer = renderer();
        renderer.set_view(ScreenVector::new(100.0, 0.0), 1.0);
        renderer.render(&vis, &data, &());

        match &renderer.layer(Layer::Main).commands()[0] {
            Command::Fill { outline, .. } => {
                let ends: Vec<_> = outline.iter().filter_map(|event| match event {
                    lyon::path::Event::Line { to, .. }
                    | lyon::path::Event::Quadratic { to, .. }
                    | lyon::path::Event::Cubic { to, .. } => Some(to),
                    _ => None,
                }).collect();
                let min_x = ends.iter().map(|p| p.x).fold(f32::MAX, f32::min);
                let max_x = ends.iter().map(|p| p.x).fold(f32::MIN, f32::max);
                let min_y = ends.iter().map(|p| p.y).fold(f32::MAX, f32::min);
                let max_y = ends.iter().map(|p| p.y).fold(f32::MIN, f32::max);
                assert!(((min_x + max_x) / 2.0 - 400.0).abs() < 1e-3);
                assert!(((min_y + max_y) / 2.0 - 200.0).abs() < 1e-3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_config_round_trip() {
        let mut renderer = renderer();
        let mut config = renderer.config();
        config.scale = 2.0;
        config.guides.grid_size = 5.0;
        renderer.set_config(&config);

        assert_eq!(renderer.view().scale, 2.0);
        assert_eq!(renderer.config(), config);
    }
}
