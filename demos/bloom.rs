//! Whole-Scene Bloom Demo
//!
//! The simplest possible setup: every node is tagged into the bloom layer,
//! so the mask pass preserves the entire scene and the glow source equals
//! the scene itself. Parameters are tuned from the keyboard.
//!
//! Controls:
//! - Mouse drag: Orbit camera
//! - Scroll: Zoom
//! - B: Toggle bloom on/off
//! - K: Toggle Karis average
//! - 1/2: Decrease/increase bloom strength
//! - 3/4: Decrease/increase bloom radius
//! - Up/Down: Adjust exposure

use std::f32::consts::TAU;

use glam::{Vec3, Vec4};
use winit::keyboard::KeyCode;

use halo::{
    App, AppContext, AppHandler, BLOOM_LAYER, Camera, FpsCounter, FrameState, Light, Mesh,
    MeshStandardMaterial, OrbitControls, SphereOptions, create_sphere,
};

#[derive(Default)]
struct BloomDemo {
    controls: Option<OrbitControls>,
    fps_counter: FpsCounter,
}

impl AppHandler for BloomDemo {
    fn init(&mut self, ctx: &mut AppContext) -> halo::Result<()> {
        let aspect = ctx.aspect();
        let scene = &mut ctx.scene;

        scene.add_light(Light::new_ambient(Vec3::splat(0.2), 1.0));
        scene.add_light(Light::new_point(Vec3::ONE, 10.0, 50.0));

        // 一圈自发光球，颜色绕色环走一遍
        let geometry = scene.insert_geometry(create_sphere(SphereOptions {
            radius: 0.4,
            ..SphereOptions::default()
        }));
        const COUNT: u32 = 8;
        for i in 0..COUNT {
            let angle = i as f32 / COUNT as f32 * TAU;
            let color = hue_color(i as f32 / COUNT as f32);

            let mut material = MeshStandardMaterial::new(color);
            material.set_emissive(color.truncate());
            material.set_emissive_intensity(3.0);
            let material = scene.insert_material(material.into());

            let mesh = scene.insert_mesh(Mesh::new(format!("Orb.{i}"), geometry, material));
            scene
                .build_node(&format!("Orb.{i}"))
                .with_mesh(mesh)
                .with_position(angle.cos() * 2.5, angle.sin() * 2.5, 0.0)
                .build();
        }

        let camera_node = scene.add_camera(Camera::new_perspective(45.0, aspect, 0.1, 1000.0));
        if let Some(node) = scene.get_node_mut(camera_node) {
            node.transform.position = Vec3::new(0.0, 0.0, 9.0);
            node.transform.look_at(Vec3::ZERO, Vec3::Y);
        }
        scene.active_camera = Some(camera_node);

        // 整个场景都进 bloom 层，等价于全屏 bloom
        for (_, node) in scene.nodes.iter_mut() {
            node.layers.enable(BLOOM_LAYER);
        }

        scene.bloom.set_enabled(true);
        scene.bloom.set_threshold(1.0);
        scene.bloom.set_strength(0.8);
        scene.bloom.set_radius(0.5);

        self.controls = Some(OrbitControls::new(Vec3::ZERO, 9.0));

        println!("=== Whole-Scene Bloom Demo ===");
        println!("  B       - Toggle bloom on/off");
        println!("  K       - Toggle Karis average");
        println!("  1/2     - Decrease/increase bloom strength");
        println!("  3/4     - Decrease/increase bloom radius");
        println!("  Up/Down - Adjust exposure");
        println!("  Mouse   - Orbit camera");
        Ok(())
    }

    fn update(&mut self, ctx: &mut AppContext, frame: &FrameState) {
        if let Some(controls) = &mut self.controls
            && let Some(camera_node) = ctx.scene.active_camera
            && let Some(node) = ctx.scene.get_node_mut(camera_node)
        {
            controls.update(&mut node.transform, &ctx.input, 45.0, frame.dt);
        }

        let scene = &mut ctx.scene;
        let input = &ctx.input;

        if input.was_key_just_pressed(KeyCode::KeyB) {
            let toggled = !scene.bloom.enabled;
            scene.bloom.set_enabled(toggled);
            println!("Bloom: {}", if toggled { "ON" } else { "OFF" });
        }
        if input.was_key_just_pressed(KeyCode::KeyK) {
            let toggled = !scene.bloom.karis_average;
            scene.bloom.set_karis_average(toggled);
            println!("Karis average: {}", if toggled { "ON" } else { "OFF" });
        }

        let step = frame.dt;
        if input.is_key_pressed(KeyCode::Digit1) {
            scene.bloom.set_strength((scene.bloom.strength() - step).max(0.0));
            println!("Bloom strength: {:.3}", scene.bloom.strength());
        }
        if input.is_key_pressed(KeyCode::Digit2) {
            scene.bloom.set_strength((scene.bloom.strength() + step).min(5.0));
            println!("Bloom strength: {:.3}", scene.bloom.strength());
        }
        if input.is_key_pressed(KeyCode::Digit3) {
            scene.bloom.set_radius((scene.bloom.radius() - step * 0.2).max(0.0));
            println!("Bloom radius: {:.3}", scene.bloom.radius());
        }
        if input.is_key_pressed(KeyCode::Digit4) {
            scene.bloom.set_radius((scene.bloom.radius() + step * 0.2).min(5.0));
            println!("Bloom radius: {:.3}", scene.bloom.radius());
        }
        if input.is_key_pressed(KeyCode::ArrowUp) {
            let exposure = (scene.tone_mapping.exposure() + step).min(16.0);
            scene.tone_mapping.set_exposure(exposure);
            println!("Exposure: {exposure:.3}");
        }
        if input.is_key_pressed(KeyCode::ArrowDown) {
            let exposure = (scene.tone_mapping.exposure() - step).max(0.0);
            scene.tone_mapping.set_exposure(exposure);
            println!("Exposure: {exposure:.3}");
        }

        if let Some(title) = self.fps_counter.title("Bloom") {
            ctx.window.set_title(&title);
        }
    }
}

/// Saturated RGB color from a hue in `[0, 1)`.
fn hue_color(hue: f32) -> Vec4 {
    let h = hue * 6.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let (r, g, b) = match h as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    Vec4::new(r, g, b, 1.0)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    App::new("Bloom")
        .with_size(1280, 720)
        .run(BloomDemo::default())?;
    Ok(())
}
