use vis_backend::{
    data::prelude::*,
    renderer::{ Guides, RendererConfig },
    scene_system::{
        SceneSystem,
        session::ComponentFrame,
        tools::TOOL_NAMES,
    },
};

const VECTOR_FILE_NAME: &str = "vis.svg";
const RASTER_FILE_NAME: &str = "vis.png";

/// Fields and their record collections, for path pickers.
fn field_choices(data: &dyn Dataset) -> Vec<Path> {
    let mut choices: Vec<Path> = Vec::new();
    for field in data.numeric_fields() {
        if let Some(parent) = field.parent().filter(|p| !p.is_root()) {
            if !choices.contains(&parent) {
                choices.push(parent);
            }
        }
        choices.push(field);
    }
    choices
}

fn path_label(path: &Option<Path>) -> String {
    path.as_ref().map_or_else(|| "none".to_string(), ToString::to_string)
}

/// Tools, guides, view and file commands, plus the prompts a tool may raise.
pub struct EditorPanel {
    guides: DirtyFlag<Guides>,
    component: Option<ScenePoint>,
    raster_ratio: f32,
    errors: Vec<String>,
}

impl EditorPanel {
    pub fn new(scene: &SceneSystem) -> Self {
        Self {
            guides: DirtyFlag::new(scene.renderer.guides),
            component: None,
            raster_ratio: 2.0,
            errors: Vec::new(),
        }
    }

    pub fn ui(&mut self, ctx: &egui::Context, scene: &mut SceneSystem) {
        for error in scene.take_errors() {
            let message = error.to_string();
            log::error!("{}", message);
            if !self.errors.contains(&message) {
                self.errors.push(message);
            }
        }
        if !self.guides.is_dirty() {
            self.guides.sync(scene.renderer.guides);
        }

        egui::SidePanel::left("editor_panel").show(ctx, |ui| {
            self.tools_ui(ui, scene);
            ui.separator();
            self.guides_ui(ui, scene);
            ui.separator();
            self.view_ui(ui, scene);
            ui.separator();
            self.files_ui(ui, scene);
            ui.separator();
            ui.label(scene.session.workspace.status.as_str());
        });

        self.prompt_ui(ctx, scene);
        self.errors_ui(ctx);
    }

    fn tools_ui(&mut self, ui: &mut egui::Ui, scene: &mut SceneSystem) {
        ui.heading("Tools");
        ui.horizontal_wrapped(|ui| {
            for name in TOOL_NAMES {
                if ui.selectable_label(scene.session.tool_name() == Some(name), name).clicked() {
                    scene.set_tool_by_name(name);
                }
            }
            if ui.button("None").clicked() {
                scene.session.clear_tool();
            }
        });

        let ws = &mut scene.session.workspace;
        let choices = field_choices(&*ws.data);

        let mut selected = ws.selected_path.clone();
        egui::ComboBox::from_label("Field")
            .selected_text(path_label(&selected))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut selected, None, "none");
                for path in &choices {
                    ui.selectable_value(&mut selected, Some(path.clone()), path.to_string());
                }
            });
        if selected != ws.selected_path {
            ws.selected_path = selected;
        }

        let mut reference = ws.reference.as_ref().map(|(path, _)| path.clone());
        egui::ComboBox::from_label("Reference")
            .selected_text(path_label(&reference))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut reference, None, "none");
                for path in &choices {
                    ui.selectable_value(&mut reference, Some(path.clone()), path.to_string());
                }
            });
        if reference != ws.reference.as_ref().map(|(path, _)| path.clone()) {
            ws.reference = reference.map(|path| (path, None));
        }
    }

    fn guides_ui(&mut self, ui: &mut egui::Ui, scene: &mut SceneSystem) {
        ui.heading("Guides");
        let (guides, dirty) = self.guides.get_all();
        *dirty |= ui.checkbox(&mut guides.show_guide, "Show guides").changed();
        *dirty |= ui.checkbox(&mut guides.frame_grid, "Grid").changed();
        *dirty |= ui.checkbox(&mut guides.frame_origin, "Origin").changed();
        ui.horizontal(|ui| {
            *dirty |= ui.add(egui::DragValue::new(&mut guides.grid_size)
                .speed(0.5)
                .clamp_range(0.1..=1000.0)
            ).changed();
            ui.label("Grid size");
        });

        if *dirty {
            scene.renderer.guides = *guides;
            scene.renderer.trigger([Layer::Back, Layer::Front]);
            self.guides.clean_flag();
        }
    }

    fn view_ui(&mut self, ui: &mut egui::Ui, scene: &mut SceneSystem) {
        ui.heading("View");
        ui.label(format!("zoom: {:.0}%", scene.renderer.view().scale * 100.0));
        if ui.button("Fit artboard").clicked() {
            scene.auto_view();
        }

        let mut enabled = self.component.is_some();
        if ui.checkbox(&mut enabled, "Component frame").changed() {
            self.component = enabled.then(ScenePoint::origin);
            scene.session.workspace.set_component(self.component.map(ComponentFrame::translation));
        }
        if let Some(origin) = &mut self.component {
            let mut changed = false;
            ui.horizontal(|ui| {
                changed |= ui.add(egui::DragValue::new(&mut origin.x).prefix("x: ")).changed();
                changed |= ui.add(egui::DragValue::new(&mut origin.y).prefix("y: ")).changed();
            });
            if changed {
                scene.session.workspace.set_component(Some(ComponentFrame::translation(*origin)));
            }
        }
    }

    fn files_ui(&mut self, ui: &mut egui::Ui, scene: &mut SceneSystem) {
        ui.heading("Files");
        let config = std::path::Path::new(RendererConfig::FILE_NAME);

        let mut result = None;
        ui.horizontal(|ui| {
            if ui.button("Save view").clicked() {
                result = Some(scene.save_config(config).map(|_| "View saved."));
            }
            if ui.button("Load view").clicked() {
                result = Some(scene.load_config(config).map(|_| "View loaded."));
            }
        });
        ui.horizontal(|ui| {
            if ui.button("Export SVG").clicked() {
                result = Some(scene.export_vector(std::path::Path::new(VECTOR_FILE_NAME)).map(|_| "SVG exported."));
            }
            if ui.button("Export PNG").clicked() {
                result = Some(scene.export_raster(std::path::Path::new(RASTER_FILE_NAME), self.raster_ratio).map(|_| "PNG exported."));
            }
            ui.add(egui::DragValue::new(&mut self.raster_ratio).speed(0.1).clamp_range(0.5..=8.0).suffix("x"));
        });

        match result {
            Some(Ok(message)) => scene.session.workspace.set_status(message),
            Some(Err(e)) => {
                log::error!("{:?}", e);
                self.errors.push(format!("{:#}", e));
            }
            None => {}
        }
    }

    fn prompt_ui(&mut self, ctx: &egui::Context, scene: &mut SceneSystem) {
        if scene.session.workspace.prompt.is_none() {
            return;
        }
        let choices = scene.session.workspace.data.numeric_fields();

        let mut answer = None;
        egui::Window::new("Map track")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Choose the field the track should map.");
                for path in choices {
                    if ui.button(path.to_string()).clicked() {
                        answer = Some(Some(path));
                    }
                }
                ui.separator();
                if ui.button("Cancel").clicked() {
                    answer = Some(None);
                }
            });
        if let Some(path) = answer {
            scene.session.resolve_prompt(path);
        }
    }

    fn errors_ui(&mut self, ctx: &egui::Context) {
        if self.errors.is_empty() {
            return;
        }
        let mut dismiss = false;
        egui::Window::new("Errors")
            .collapsible(false)
            .show(ctx, |ui| {
                for error in &self.errors {
                    ui.colored_label(egui::Color32::RED, error.as_str());
                }
                dismiss = ui.button("Dismiss").clicked();
            });
        if dismiss {
            self.errors.clear();
        }
    }
}
