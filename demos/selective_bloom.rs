//! Selective Bloom Demo
//!
//! The main demo scene: a red emissive sphere that glows, a field of green
//! cubes that stay dark, and a character model whose eyes can be tagged into
//! the glow set from a parts panel. Bloom, tone mapping and depth of field
//! are all tunable through the egui overlay.
//!
//! Controls:
//! - Mouse drag: Orbit camera
//! - Scroll: Zoom
//! - Right drag: Pan
//! - F: Focus depth of field on the character model

use glam::{Vec3, Vec4};
use rand::RngExt;
use winit::event::WindowEvent;
use winit::keyboard::KeyCode;

use halo::{
    App, AppContext, AppHandler, BLOOM_LAYER, Camera, FpsCounter, FrameState, GuiLayer, Light,
    Mesh, MeshStandardMaterial, NodeIndex, OrbitControls, OverlayPass, SphereOptions,
    ToneMappingMode, create_box, create_sphere, load_gltf,
};

const MODEL_PATH: &str = "demos/assets/michelle.glb";

/// One entry in the parts panel: a named sub-node of the character model
/// whose bloom membership can be toggled.
struct Part {
    label: &'static str,
    node: NodeIndex,
    tagged: bool,
    /// Color the part had before it was painted red, for untagging.
    original_color: Vec4,
}

#[derive(Default)]
struct SelectiveBloomDemo {
    gui: Option<GuiLayer>,
    controls: Option<OrbitControls>,
    fps_counter: FpsCounter,

    model: Option<NodeIndex>,
    parts: Vec<Part>,

    /// Slider position; applied exposure is this value to the fourth power.
    exposure_slider: f32,
}

impl SelectiveBloomDemo {
    fn build_scene(&mut self, ctx: &mut AppContext) {
        let aspect = ctx.aspect();
        let scene = &mut ctx.scene;

        scene.add_light(Light::new_ambient(Vec3::splat(0.8), 1.0));

        // 发光球：红色自发光，挂到 bloom 层
        let mut glow = MeshStandardMaterial::new(Vec4::new(1.0, 0.1, 0.1, 1.0));
        glow.set_emissive(Vec3::new(1.0, 0.1, 0.1));
        glow.set_emissive_intensity(2.0);
        let glow_key = scene.insert_material(glow.into());

        let sphere_geo = scene.insert_geometry(create_sphere(SphereOptions {
            radius: 0.5,
            ..SphereOptions::default()
        }));
        let sphere_mesh = scene.insert_mesh(Mesh::new("Glow Sphere", sphere_geo, glow_key));
        scene
            .build_node("Glow Sphere")
            .with_mesh(sphere_mesh)
            .with_position(1.5, 0.5, -1.0)
            .on_layer(BLOOM_LAYER)
            .build();

        // 一片绿色方块，全部不参与 bloom
        let green = scene
            .insert_material(MeshStandardMaterial::new(Vec4::new(0.1, 0.8, 0.2, 1.0)).into());
        let cube_geo = scene.insert_geometry(create_box(0.5, 0.5, 0.5));

        let mut rng = rand::rng();
        for i in 0..10 {
            let mesh = scene.insert_mesh(Mesh::new(format!("Cube.{i}"), cube_geo, green));
            scene
                .build_node(&format!("Cube.{i}"))
                .with_mesh(mesh)
                .with_position(
                    rng.random_range(-2.0..=2.0),
                    rng.random_range(-1.0..=1.0),
                    rng.random_range(-6.0..=-1.0),
                )
                .build();
        }

        // 角色模型；加载失败只是少一个模型，演示继续跑
        match load_gltf(scene, MODEL_PATH) {
            Ok(root) => {
                if let Some(node) = scene.get_node_mut(root) {
                    node.transform.position = Vec3::new(-1.0, -1.0, 0.0);
                    node.transform.scale = Vec3::splat(0.025);
                }
                self.model = Some(root);
            }
            Err(e) => log::warn!("model not loaded, continuing without it: {e}"),
        }

        let camera_node = scene.add_camera(Camera::new_perspective(45.0, aspect, 0.1, 1000.0));
        if let Some(node) = ctx.scene.get_node_mut(camera_node) {
            node.transform.position = Vec3::new(0.0, 0.0, 9.0);
            node.transform.look_at(Vec3::ZERO, Vec3::Y);
        }
        ctx.scene.active_camera = Some(camera_node);
    }

    /// Resolves the named model parts and tags the default glow set.
    fn collect_parts(&mut self, ctx: &mut AppContext) {
        // 眼睛默认发光，头部默认不发光
        for (label, tagged) in [("left eye", true), ("right eye", true), ("head", false)] {
            let Some(node) = ctx.scene.find_node_by_name(label) else {
                log::warn!("model part {label:?} not found, leaving it out of the panel");
                continue;
            };
            let original_color = part_color(ctx, node).unwrap_or(Vec4::ONE);
            let mut part = Part {
                label,
                node,
                tagged: false,
                original_color,
            };
            if tagged {
                set_part_tagged(ctx, &mut part, true);
            }
            self.parts.push(part);
        }
    }

}

/// Points the depth of field at the character model.
fn focus_on_model(ctx: &mut AppContext, model: Option<NodeIndex>) {
    let Some(model) = model else {
        return;
    };
    let (Some(camera), Some(target)) = (ctx.scene.main_camera(), ctx.scene.world_position(model))
    else {
        return;
    };
    let distance = camera.position().distance(target);
    ctx.scene.dof.set_focus_distance(distance);
    log::info!("focus distance set to {distance:.2}");
}

impl AppHandler for SelectiveBloomDemo {
    fn init(&mut self, ctx: &mut AppContext) -> halo::Result<()> {
        self.build_scene(ctx);
        self.collect_parts(ctx);

        ctx.scene.bloom.set_enabled(true);
        ctx.scene.bloom.set_threshold(0.0);
        ctx.scene.bloom.set_strength(1.0);
        ctx.scene.bloom.set_radius(0.5);
        ctx.scene.dof.set_enabled(true);
        ctx.scene.dof.set_focus_distance(9.0);
        // 曝光滑块按四次方映射，初始值 1.5 对应曝光约 5.06
        self.exposure_slider = 1.5;
        ctx.scene.tone_mapping.set_exposure(self.exposure_slider.powi(4));

        self.controls = Some(OrbitControls::new(Vec3::ZERO, 9.0));
        self.gui = Some(GuiLayer::new(
            &ctx.renderer.ctx.device,
            ctx.renderer.surface_format(),
            &ctx.window,
        ));
        Ok(())
    }

    fn on_event(&mut self, ctx: &mut AppContext, event: &WindowEvent) -> bool {
        let Some(gui) = &mut self.gui else {
            return false;
        };
        if let WindowEvent::Resized(size) = event {
            gui.resize(size.width, size.height, ctx.window.scale_factor() as f32);
        }
        gui.handle_input(&ctx.window, event)
    }

    fn update(&mut self, ctx: &mut AppContext, frame: &FrameState) {
        let Some(gui) = &mut self.gui else {
            return;
        };

        // ====相机====
        let pointer_free = !gui.wants_pointer_input();
        if pointer_free
            && let Some(controls) = &mut self.controls
            && let Some(camera_node) = ctx.scene.active_camera
            && let Some(node) = ctx.scene.get_node_mut(camera_node)
        {
            controls.update(&mut node.transform, &ctx.input, 45.0, frame.dt);
        }

        if !gui.wants_keyboard_input() && ctx.input.was_key_just_pressed(KeyCode::KeyF) {
            focus_on_model(ctx, self.model);
        }

        // ====控制面板====
        let scene = &mut ctx.scene;
        let parts = &mut self.parts;
        let exposure_slider = &mut self.exposure_slider;
        let mut toggled: Vec<usize> = Vec::new();

        gui.run_ui(&ctx.window, |egui_ctx| {
            egui::Window::new("Post Processing").show(egui_ctx, |ui| {
                ui.collapsing("bloom", |ui| {
                    let mut enabled = scene.bloom.enabled;
                    if ui.checkbox(&mut enabled, "enabled").changed() {
                        scene.bloom.set_enabled(enabled);
                    }

                    let mut threshold = scene.bloom.threshold();
                    if ui
                        .add(egui::Slider::new(&mut threshold, 0.0..=5.0).text("threshold"))
                        .changed()
                    {
                        scene.bloom.set_threshold(threshold);
                    }

                    let mut strength = scene.bloom.strength();
                    if ui
                        .add(egui::Slider::new(&mut strength, 0.0..=5.0).text("strength"))
                        .changed()
                    {
                        scene.bloom.set_strength(strength);
                    }

                    let mut radius = scene.bloom.radius();
                    if ui
                        .add(
                            egui::Slider::new(&mut radius, 0.0..=5.0)
                                .step_by(0.01)
                                .text("radius"),
                        )
                        .changed()
                    {
                        scene.bloom.set_radius(radius);
                    }
                });

                ui.collapsing("tone mapping", |ui| {
                    if ui
                        .add(
                            egui::Slider::new(exposure_slider, 0.1..=2.0).text("exposure"),
                        )
                        .changed()
                    {
                        scene.tone_mapping.set_exposure(exposure_slider.powi(4));
                    }

                    let mut mode = scene.tone_mapping.mode();
                    egui::ComboBox::from_label("mode")
                        .selected_text(mode.name())
                        .show_ui(ui, |ui| {
                            for &m in ToneMappingMode::all() {
                                ui.selectable_value(&mut mode, m, m.name());
                            }
                        });
                    if mode != scene.tone_mapping.mode() {
                        scene.tone_mapping.set_mode(mode);
                    }
                });

                ui.collapsing("depth of field", |ui| {
                    let mut enabled = scene.dof.enabled;
                    if ui.checkbox(&mut enabled, "enabled").changed() {
                        scene.dof.set_enabled(enabled);
                    }

                    let mut focus = scene.dof.focus_distance();
                    if ui
                        .add(egui::Slider::new(&mut focus, 0.0..=10.0).text("focus"))
                        .changed()
                    {
                        scene.dof.set_focus_distance(focus);
                    }

                    let mut aperture = scene.dof.aperture();
                    if ui
                        .add(
                            egui::Slider::new(&mut aperture, 0.0001..=0.1)
                                .logarithmic(true)
                                .text("aperture"),
                        )
                        .changed()
                    {
                        scene.dof.set_aperture(aperture);
                    }

                    let mut max_blur = scene.dof.max_blur();
                    if ui
                        .add(egui::Slider::new(&mut max_blur, 0.0..=3.0).text("max blur"))
                        .changed()
                    {
                        scene.dof.set_max_blur(max_blur);
                    }

                    ui.label("press F to focus on the model");
                });

                if !parts.is_empty() {
                    ui.collapsing("glowing parts", |ui| {
                        for (i, part) in parts.iter_mut().enumerate() {
                            let mut tagged = part.tagged;
                            if ui.checkbox(&mut tagged, part.label).changed() {
                                toggled.push(i);
                            }
                        }
                    });
                }
            });
        });

        for i in toggled {
            let tagged = !self.parts[i].tagged;
            set_part_tagged(ctx, &mut self.parts[i], tagged);
        }

        // ====标题栏 FPS====
        if let Some(title) = self.fps_counter.title("Selective Bloom") {
            ctx.window.set_title(&title);
        }
    }

    fn overlay(&mut self) -> Option<&mut dyn OverlayPass> {
        self.gui.as_mut().map(|gui| gui as &mut dyn OverlayPass)
    }
}

fn part_color(ctx: &AppContext, node: NodeIndex) -> Option<Vec4> {
    let mesh_key = ctx.scene.get_node(node)?.mesh?;
    let mesh = ctx.scene.meshes.get(mesh_key)?;
    Some(ctx.scene.materials.get(mesh.material)?.color())
}

/// Toggles a part's bloom membership. Tagging also paints the part red so
/// the glow source has something bright to pick up.
fn set_part_tagged(ctx: &mut AppContext, part: &mut Part, tagged: bool) {
    let Some(node) = ctx.scene.get_node_mut(part.node) else {
        return;
    };
    if tagged {
        node.layers.enable(BLOOM_LAYER);
    } else {
        node.layers.disable(BLOOM_LAYER);
    }

    let mesh_key = node.mesh;
    if let Some(mesh_key) = mesh_key
        && let Some(mesh) = ctx.scene.meshes.get(mesh_key)
        && let Some(material) = ctx.scene.materials.get_mut(mesh.material)
    {
        if tagged {
            material.set_color(Vec4::new(1.0, 0.0, 0.0, 1.0));
        } else {
            material.set_color(part.original_color);
        }
    }
    part.tagged = tagged;
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    App::new("Selective Bloom")
        .with_size(1280, 720)
        .run(SelectiveBloomDemo::default())?;
    Ok(())
}
