use super::*;
use crate::device::mock_device::{DeviceEvent, MockDevice};
use crate::device::ShaderStage;
use crate::material::Material;
use crate::shader::mock_compiler::MockCompiler;
use crate::shader::{ShaderCompiler, ShaderSource, TechniqueCache};

struct Fixture {
    device: Arc<Mutex<MockDevice>>,
    cache: Arc<TechniqueCache>,
    graphics: Graphics,
}

fn fixture() -> Fixture {
    let compiler = Arc::new(MockCompiler::new());
    let device = Arc::new(Mutex::new(MockDevice::new()));
    let cache = Arc::new(TechniqueCache::new(
        compiler as Arc<dyn ShaderCompiler>,
        Arc::clone(&device) as Arc<Mutex<dyn RenderDevice>>,
    ));
    let graphics = Graphics::new(Arc::clone(&device) as Arc<Mutex<dyn RenderDevice>>).unwrap();
    Fixture { device, cache, graphics }
}

fn fullscreen_material(fx: &Fixture, path: &str) -> Material {
    let source = ShaderSource::new(path, "")
        .with_entry_point(ShaderStage::Vertex, "MainVS")
        .with_entry_point(ShaderStage::Pixel, "MainPS");
    Material::new(path, source, Arc::clone(&fx.cache)).unwrap()
}

#[test]
fn named_target_round_trip() {
    let mut fx = fixture();
    let handle = fx
        .graphics
        .create_render_target("Output", TextureFormat::RGBA8_UNORM, 64, 64, Color::TRANSPARENT, 1)
        .unwrap();

    assert_eq!(fx.graphics.get_render_target("Output").unwrap(), handle);
    assert!(fx.graphics.has_render_target("Output"));

    fx.graphics.release_render_target("Output").unwrap();
    assert!(!fx.graphics.has_render_target("Output"));
}

#[test]
fn unknown_names_fail_loudly() {
    let mut fx = fixture();
    assert!(matches!(
        fx.graphics.get_render_target("Nope"),
        Err(Error::MissingResource(_))
    ));
    assert!(matches!(
        fx.graphics.release_render_target("Nope"),
        Err(Error::MissingResource(_))
    ));
    assert!(matches!(
        fx.graphics.get_sampler("Nope"),
        Err(Error::MissingResource(_))
    ));
}

#[test]
fn recreating_a_target_destroys_the_previous_texture() {
    let mut fx = fixture();
    let first = fx
        .graphics
        .create_render_target("Output", TextureFormat::RGBA8_UNORM, 64, 64, Color::TRANSPARENT, 1)
        .unwrap();
    let second = fx
        .graphics
        .create_render_target("Output", TextureFormat::RGBA8_UNORM, 128, 128, Color::TRANSPARENT, 1)
        .unwrap();

    assert_ne!(first, second);
    let device = fx.device.lock().unwrap();
    assert!(device.texture_desc(first).is_none());
    assert_eq!(device.texture_desc(second).unwrap().width, 128);
}

#[test]
fn render_target_sample_count_reaches_the_device() {
    let mut fx = fixture();
    let handle = fx
        .graphics
        .create_render_target("Msaa", TextureFormat::RGBA16_FLOAT, 64, 64, Color::TRANSPARENT, 4)
        .unwrap();

    let device = fx.device.lock().unwrap();
    assert_eq!(device.texture_desc(handle).unwrap().sample_count, 4);
}

#[test]
fn default_sampler_exists_from_the_start() {
    let fx = fixture();
    assert!(fx.graphics.get_sampler(DEFAULT_SAMPLER).is_ok());
}

#[test]
fn named_input_layout_round_trip() {
    let mut fx = fixture();
    let material = fullscreen_material(&fx, "Shaders/Mesh.hlsl");
    let vertex_shader = material.shader(ShaderStage::Vertex).unwrap();

    let attributes = [
        VertexAttributeDesc {
            name: "POSITION".to_string(),
            semantic_index: 0,
            format: crate::device::AttributeFormat::RGB32_FLOAT,
            buffer_index: 0,
            offset: 0,
            is_instanced: false,
        },
        VertexAttributeDesc {
            name: "TEXCOORD".to_string(),
            semantic_index: 0,
            format: crate::device::AttributeFormat::RG32_FLOAT,
            buffer_index: 0,
            offset: 12,
            is_instanced: false,
        },
    ];
    let handle = fx
        .graphics
        .create_input_layout("Mesh", &attributes, vertex_shader)
        .unwrap();

    assert_eq!(fx.graphics.get_input_layout("Mesh").unwrap(), handle);
    assert!(matches!(
        fx.graphics.get_input_layout("Nope"),
        Err(Error::MissingResource(_))
    ));
}

#[test]
fn composite_is_one_pass_with_one_fullscreen_draw() {
    let mut fx = fixture();
    let target = fx
        .graphics
        .create_render_target("Output", TextureFormat::RGBA8_UNORM, 64, 64, Color::TRANSPARENT, 1)
        .unwrap();
    let mut material = fullscreen_material(&fx, "Shaders/Composite.hlsl");

    let mut state = DrawState::new();
    state.set_targets(vec![TargetBinding::new(target)]);
    fx.graphics.composite(&mut material, &mut state).unwrap();

    let device = fx.device.lock().unwrap();
    let events = device.events();
    assert!(matches!(events[0], DeviceEvent::BeginPass));
    assert!(matches!(events.last().unwrap(), DeviceEvent::EndPass));
    let records = device.draw_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].index_count, 6);
}

#[test]
fn render_cube_map_draws_every_face_and_mip() {
    let mut fx = fixture();
    let cube = fx
        .graphics
        .create_render_target_cube("Env", TextureFormat::RGBA16_FLOAT, 256, 5)
        .unwrap();
    let mut material = fullscreen_material(&fx, "Shaders/Prefilter.hlsl");

    let mut visited = Vec::new();
    fx.graphics
        .render_cube_map(&mut material, cube, 256, 5, |_material, face, mip| {
            visited.push((face, mip));
            Ok(())
        })
        .unwrap();

    assert_eq!(visited.len(), 30);
    assert_eq!(visited[0], (0, 0));
    assert_eq!(visited[29], (5, 4));

    let device = fx.device.lock().unwrap();
    let records = device.draw_records();
    assert_eq!(records.len(), 30);
    for record in &records {
        assert_eq!(record.index_count, 36);
        assert_eq!(record.targets.len(), 1);
        assert_eq!(record.targets[0].texture, cube);
    }
    // The last mip draws at 256 >> 4 = 16.
    let last = records.last().unwrap();
    assert_eq!(last.targets[0].mip_level, 4);
    assert_eq!(last.targets[0].layer, 5);
    assert_eq!(last.viewport.unwrap(), Viewport::new(16.0, 16.0));
}

#[test]
fn capture_views_cover_six_distinct_directions() {
    let views = cube_capture_views();
    for i in 0..6 {
        for j in (i + 1)..6 {
            assert_ne!(views[i], views[j]);
        }
    }
    let projection = cube_capture_projection();
    assert!(projection.is_finite());
}
