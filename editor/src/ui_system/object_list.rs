use vis_backend::{
    objects::*,
    scene_system::SceneSystem,
};

enum Edit {
    Rename(ObjectId, String),
    Domain(ObjectId, Property),
    Select(ObjectId),
    Duplicate(ObjectId),
    Remove(ObjectId),
}

/// Top-level objects, topmost last, with their editable properties.
pub struct ObjectList {
    pub open: bool,
}

impl ObjectList {
    pub fn new() -> Self {
        Self { open: true }
    }

    pub fn ui(&mut self, ctx: &egui::Context, scene: &mut SceneSystem) {
        let vis = &scene.session.workspace.vis;
        let mut edits = Vec::new();

        egui::Window::new("Objects")
            .open(&mut self.open)
            .default_pos([ctx.available_rect().right() - 260.0, 20.0])
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for id in vis.order() {
                        let Some(object) = vis.get(*id) else {
                            continue;
                        };
                        ui.horizontal(|ui| {
                            let label = format!("{} {}", id, object.kind_name());
                            if ui.selectable_label(vis.is_selected(*id), label).clicked() {
                                edits.push(Edit::Select(*id));
                            }
                            if ui.small_button("Copy").clicked() {
                                edits.push(Edit::Duplicate(*id));
                            }
                            if ui.small_button("Delete").clicked() {
                                edits.push(Edit::Remove(*id));
                            }
                        });

                        let mut name = object.name.clone().unwrap_or_default();
                        if ui.text_edit_singleline(&mut name).changed() {
                            edits.push(Edit::Rename(*id, name));
                        }

                        if let Kind::Track(track) = &object.kind {
                            let (mut min, mut max) = (track.min, track.max);
                            ui.horizontal(|ui| {
                                if ui.add(egui::DragValue::new(&mut min).prefix("min: ")).changed() {
                                    edits.push(Edit::Domain(*id, Property::Min(min)));
                                }
                                if ui.add(egui::DragValue::new(&mut max).prefix("max: ")).changed() {
                                    edits.push(Edit::Domain(*id, Property::Max(max)));
                                }
                            });
                        }
                        ui.separator();
                    }
                });
            });

        let ws = &mut scene.session.workspace;
        for edit in edits {
            let result = match edit {
                Edit::Rename(id, name) => ws.vis.set_name(id, &name).map(|_| ()),
                Edit::Domain(id, property) => ws.vis.set_property(id, property).map(|_| ()),
                Edit::Select(id) => {
                    ws.vis.clear_selection();
                    ws.vis.append_selection(Selection::object(id));
                    Ok(())
                }
                Edit::Duplicate(id) => ws.vis.duplicate(id).map(|_| ()),
                Edit::Remove(id) => {
                    ws.vis.remove_object(id);
                    Ok(())
                }
            };
            if let Err(e) = result {
                log::warn!("{}", e);
                ws.set_status(e.to_string());
            }
        }
    }
}
