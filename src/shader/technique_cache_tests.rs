use super::*;
use crate::device::mock_device::MockDevice;
use crate::device::ShaderStage;
use crate::shader::mock_compiler::MockCompiler;

fn cache_with_mocks() -> (Arc<MockCompiler>, Arc<Mutex<MockDevice>>, TechniqueCache) {
    let compiler = Arc::new(MockCompiler::new());
    let device = Arc::new(Mutex::new(MockDevice::new()));
    let cache = TechniqueCache::new(
        Arc::clone(&compiler) as Arc<dyn ShaderCompiler>,
        Arc::clone(&device) as Arc<Mutex<dyn RenderDevice>>,
    );
    (compiler, device, cache)
}

fn source(path: &str) -> ShaderSource {
    ShaderSource::new(path, "float4 main() {}")
        .with_entry_point(ShaderStage::Vertex, "MainVS")
        .with_entry_point(ShaderStage::Pixel, "MainPS")
}

#[test]
fn same_identity_compiles_once() {
    let (compiler, _device, cache) = cache_with_mocks();
    let src = source("Shaders/PBR.hlsl");
    let defines = BTreeMap::new();

    let first = cache.create_or_get(&src, &defines).unwrap();
    let second = cache.create_or_get(&src, &defines).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    // Two stages, each compiled exactly once.
    assert_eq!(compiler.compile_count(), 2);
    assert_eq!(cache.len(), 1);
}

#[test]
fn different_defines_are_different_identities() {
    let (compiler, _device, cache) = cache_with_mocks();
    let src = source("Shaders/PBR.hlsl");

    let plain = cache.create_or_get(&src, &BTreeMap::new()).unwrap();

    let mut defines = BTreeMap::new();
    defines.insert("USE_NORMAL_MAP".to_string(), "1".to_string());
    let variant = cache.create_or_get(&src, &defines).unwrap();

    assert!(!Arc::ptr_eq(&plain, &variant));
    assert_eq!(compiler.compile_count(), 4);
    assert_eq!(cache.len(), 2);
}

#[test]
fn identity_is_independent_of_define_insertion_order() {
    let mut forward = BTreeMap::new();
    forward.insert("A".to_string(), "1".to_string());
    forward.insert("B".to_string(), "2".to_string());

    let mut reverse = BTreeMap::new();
    reverse.insert("B".to_string(), "2".to_string());
    reverse.insert("A".to_string(), "1".to_string());

    assert_eq!(
        TechniqueCache::identity_for("Shaders/PBR.hlsl", &forward),
        TechniqueCache::identity_for("Shaders/PBR.hlsl", &reverse),
    );
}

#[test]
fn different_paths_are_different_identities() {
    let (_compiler, _device, cache) = cache_with_mocks();

    let a = cache.create_or_get(&source("Shaders/A.hlsl"), &BTreeMap::new()).unwrap();
    let b = cache.create_or_get(&source("Shaders/B.hlsl"), &BTreeMap::new()).unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 2);
}

#[test]
fn failed_build_is_not_cached() {
    let (compiler, _device, cache) = cache_with_mocks();
    compiler.script_failure("MainVS", "bad");
    compiler.script_failure("MainPS", "bad");

    let src = source("Shaders/Broken.hlsl");
    assert!(cache.create_or_get(&src, &BTreeMap::new()).is_err());
    assert!(cache.is_empty());

    // Once fixed, the next request compiles again.
    let fixed = Arc::new(MockCompiler::new());
    let device = Arc::new(Mutex::new(MockDevice::new()));
    let cache = TechniqueCache::new(
        Arc::clone(&fixed) as Arc<dyn ShaderCompiler>,
        device as Arc<Mutex<dyn RenderDevice>>,
    );
    assert!(cache.create_or_get(&src, &BTreeMap::new()).is_ok());
}
