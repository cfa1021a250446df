use vis_backend::{
    app::App,
    data::{ dataset::JsonDataset, prelude::* },
    scene_system::SceneSystem,
};
use winit::{
    event_loop::EventLoop,
    window::WindowBuilder,
};

mod demo;
mod ui_system;

/// `vis-editor [dataset.json [field.path]]`. Without a dataset a demo scene opens.
fn main() -> anyhow::Result<()> {
    vis_backend::app::init();

    let mut args = std::env::args().skip(1);
    let mut scene = match args.next() {
        Some(file) => SceneSystem::new(Default::default(), Box::new(JsonDataset::from_file(&file)?)),
        None => {
            let (vis, data) = demo::scene()?;
            SceneSystem::new(vis, Box::new(data))
        }
    };
    if let Some(field) = args.next() {
        scene.session.workspace.selected_path = Some(Path::new(field));
    }

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("Vis Designer")
        .with_maximized(true)
        .build(&event_loop)?;
    let app = App::new(event_loop, window)?;
    let system = ui_system::UiSystem::new(&app, scene);

    app.run(system)
}
