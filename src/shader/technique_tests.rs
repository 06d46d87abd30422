use super::*;
use crate::device::mock_device::MockDevice;
use crate::shader::compiler::ReflectedVariable;
use crate::shader::mock_compiler::MockCompiler;

fn pbr_source() -> ShaderSource {
    ShaderSource::new("Shaders/PBR.hlsl", "float4 main() {}")
        .with_entry_point(ShaderStage::Vertex, "MainVS")
        .with_entry_point(ShaderStage::Pixel, "MainPS")
        .with_render_stage("Deffered")
}

fn vs_reflection() -> StageReflection {
    StageReflection {
        constant_buffer_size: 128,
        variables: vec![
            ReflectedVariable { name: "g_ModelMatrix".to_string(), offset: 0, size: 64 },
            ReflectedVariable { name: "g_ViewMatrix".to_string(), offset: 64, size: 64 },
        ],
        textures: vec![],
        samplers: vec![],
    }
}

#[test]
fn builds_every_declared_stage() {
    let compiler = MockCompiler::new();
    compiler.script_reflection("MainVS", vs_reflection());
    let mut device = MockDevice::new();

    let source = pbr_source();
    let technique =
        Technique::build("Shaders/PBR.hlsl", &source, source.text(), &compiler, &mut device)
            .unwrap();

    assert_eq!(technique.stage_count(), 2);
    assert!(technique.stage(ShaderStage::Vertex).is_some());
    assert!(technique.stage(ShaderStage::Pixel).is_some());
    assert!(technique.stage(ShaderStage::Compute).is_none());
    assert_eq!(technique.render_stage(), Some("Deffered"));
}

#[test]
fn layout_lookup_is_name_keyed() {
    let compiler = MockCompiler::new();
    compiler.script_reflection("MainVS", vs_reflection());
    let mut device = MockDevice::new();

    let source = pbr_source();
    let technique =
        Technique::build("Shaders/PBR.hlsl", &source, source.text(), &compiler, &mut device)
            .unwrap();

    let layout = &technique.stage(ShaderStage::Vertex).unwrap().layout;
    assert_eq!(layout.constant_buffer_size, 128);
    assert_eq!(layout.variable("g_ViewMatrix"), Some(VarBinding { offset: 64, size: 64 }));
    assert_eq!(layout.variable("g_Missing"), None);
}

#[test]
fn failed_stage_is_skipped_but_build_succeeds() {
    let compiler = MockCompiler::new();
    compiler.script_failure("MainPS", "syntax error at line 12");
    let mut device = MockDevice::new();

    let source = pbr_source();
    let technique =
        Technique::build("Shaders/PBR.hlsl", &source, source.text(), &compiler, &mut device)
            .unwrap();

    assert_eq!(technique.stage_count(), 1);
    assert!(technique.stage(ShaderStage::Pixel).is_none());
}

#[test]
fn build_fails_only_when_every_stage_fails() {
    let compiler = MockCompiler::new();
    compiler.script_failure("MainVS", "bad");
    compiler.script_failure("MainPS", "bad");
    let mut device = MockDevice::new();

    let source = pbr_source();
    let result =
        Technique::build("Shaders/PBR.hlsl", &source, source.text(), &compiler, &mut device);
    assert!(matches!(result, Err(Error::CompileFailure(_))));
}

#[test]
fn source_without_stages_is_rejected() {
    let compiler = MockCompiler::new();
    let mut device = MockDevice::new();

    let source = ShaderSource::new("Shaders/Empty.hlsl", "");
    let result =
        Technique::build("Shaders/Empty.hlsl", &source, source.text(), &compiler, &mut device);
    assert!(matches!(result, Err(Error::CompileFailure(_))));
}
