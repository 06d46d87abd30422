use super::*;
use crate::device::mock_device::MockDevice;
use crate::device::{Color, RenderDevice, TextureDesc, TextureFormat};

fn textures(count: usize) -> Vec<TextureHandle> {
    let mut device = MockDevice::new();
    (0..count)
        .map(|i| {
            device
                .create_texture(TextureDesc::render_target(
                    &format!("t{}", i),
                    TextureFormat::RGBA8_UNORM,
                    8,
                    8,
                    Color::TRANSPARENT,
                    1,
                ))
                .unwrap()
        })
        .collect()
}

#[test]
fn group_preserves_channel_order() {
    let handles = textures(3);
    let mut layout = TextureLayout::new();

    layout.begin_group("DPBR").unwrap();
    layout.add("Albedo", handles[0]).unwrap();
    layout.add("Normal", handles[1]).unwrap();
    layout.add("Depth", handles[2]).unwrap();
    layout.end_group().unwrap();

    let group = layout.group("DPBR").unwrap();
    let names: Vec<&str> = group.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["Albedo", "Normal", "Depth"]);
    assert_eq!(layout.texture("DPBR", "Normal").unwrap(), handles[1]);
}

#[test]
fn unknown_group_and_channel_fail_loudly() {
    let handles = textures(1);
    let mut layout = TextureLayout::new();
    layout.begin_group("DPBR").unwrap();
    layout.add("Albedo", handles[0]).unwrap();
    layout.end_group().unwrap();

    assert!(matches!(layout.group("Shadow"), Err(Error::MissingResource(_))));
    assert!(matches!(
        layout.texture("DPBR", "Velocity"),
        Err(Error::MissingResource(_))
    ));
}

#[test]
fn nested_begin_is_rejected() {
    let mut layout = TextureLayout::new();
    layout.begin_group("A").unwrap();
    assert!(layout.begin_group("B").is_err());
}

#[test]
fn add_and_end_require_an_open_group() {
    let handles = textures(1);
    let mut layout = TextureLayout::new();
    assert!(layout.add("Albedo", handles[0]).is_err());
    assert!(layout.end_group().is_err());
}

#[test]
fn rebuilding_a_group_replaces_its_channels() {
    let handles = textures(2);
    let mut layout = TextureLayout::new();

    layout.begin_group("DPBR").unwrap();
    layout.add("Albedo", handles[0]).unwrap();
    layout.end_group().unwrap();

    layout.delete_group("DPBR");
    assert!(!layout.has_group("DPBR"));

    layout.begin_group("DPBR").unwrap();
    layout.add("Albedo", handles[1]).unwrap();
    layout.end_group().unwrap();

    assert_eq!(layout.texture("DPBR", "Albedo").unwrap(), handles[1]);
}
