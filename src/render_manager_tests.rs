use super::*;
use crate::device::mock_device::MockDevice;
use crate::device::TextureFormat;
use crate::device::Color;
use crate::error::Error;
use crate::stage::RenderStage;

#[derive(Debug, Clone, PartialEq)]
enum StageEvent {
    Allocated(String, u32, u32, u32),
    Rendered(String, usize),
}

type EventLog = Arc<Mutex<Vec<StageEvent>>>;

/// Stage double that records calls and renders nothing
struct RecordingStage {
    name: String,
    output: String,
    log: EventLog,
    fail_allocate: bool,
    /// Fail allocation only after this many successful ones
    allocate_budget: Option<usize>,
    fail_render: bool,
}

impl RecordingStage {
    fn new(name: &str, log: EventLog) -> Self {
        Self {
            name: name.to_string(),
            output: format!("{}_Output", name),
            log,
            fail_allocate: false,
            allocate_budget: None,
            fail_render: false,
        }
    }
}

impl RenderStage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_name(&self) -> &str {
        &self.output
    }

    fn depth_output_name(&self) -> Option<&str> {
        None
    }

    fn allocate_view_dependent_resources(
        &mut self,
        graphics: &mut Graphics,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Result<()> {
        if self.fail_allocate {
            return Err(Error::InitializationFailed(format!("{} allocate", self.name)));
        }
        if let Some(budget) = &mut self.allocate_budget {
            if *budget == 0 {
                return Err(Error::InitializationFailed(format!("{} allocate", self.name)));
            }
            *budget -= 1;
        }
        graphics.create_render_target(
            &self.output, TextureFormat::RGBA8_UNORM, width, height, Color::TRANSPARENT,
            sample_count,
        )?;
        self.log
            .lock()
            .unwrap()
            .push(StageEvent::Allocated(self.name.clone(), width, height, sample_count));
        Ok(())
    }

    fn render(&mut self, _graphics: &mut Graphics, view: &FrameView<'_>) -> Result<()> {
        if self.fail_render {
            return Err(Error::BackendError(format!("{} render", self.name)));
        }
        self.log
            .lock()
            .unwrap()
            .push(StageEvent::Rendered(self.name.clone(), view.renderers.len()));
        Ok(())
    }
}

fn manager(width: u32, height: u32) -> RenderManager {
    let device = Arc::new(Mutex::new(MockDevice::new()));
    RenderManager::new(device as Arc<Mutex<dyn RenderDevice>>, width, height).unwrap()
}

fn instance() -> RenderInstance {
    RenderInstance {
        surfaces: SurfaceTextures::default(),
        model_matrix: Mat4::IDENTITY,
        draw_args: DrawArguments::new(3),
    }
}

#[test]
fn add_stage_allocates_at_the_current_view_size() {
    let log: EventLog = Arc::default();
    let mut manager = manager(800, 600);
    manager.add_stage(Box::new(RecordingStage::new("Deffered", Arc::clone(&log)))).unwrap();

    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[StageEvent::Allocated("Deffered".to_string(), 800, 600, 1)]
    );
}

#[test]
fn failed_stage_addition_propagates() {
    let log: EventLog = Arc::default();
    let mut manager = manager(800, 600);
    let mut stage = RecordingStage::new("Broken", log);
    stage.fail_allocate = true;
    assert!(manager.add_stage(Box::new(stage)).is_err());
}

#[test]
fn resize_reallocates_every_stage() {
    let log: EventLog = Arc::default();
    let mut manager = manager(800, 600);
    manager.add_stage(Box::new(RecordingStage::new("A", Arc::clone(&log)))).unwrap();
    manager.add_stage(Box::new(RecordingStage::new("B", Arc::clone(&log)))).unwrap();
    log.lock().unwrap().clear();

    manager.resize(1920, 1080);

    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[
            StageEvent::Allocated("A".to_string(), 1920, 1080, 1),
            StageEvent::Allocated("B".to_string(), 1920, 1080, 1),
        ]
    );
}

#[test]
fn failing_resize_does_not_block_other_stages() {
    let log: EventLog = Arc::default();
    let mut manager = manager(800, 600);

    // Allocates fine when added, then fails every resize.
    let mut flaky = RecordingStage::new("A", Arc::clone(&log));
    flaky.allocate_budget = Some(1);
    manager.add_stage(Box::new(flaky)).unwrap();
    manager.add_stage(Box::new(RecordingStage::new("B", Arc::clone(&log)))).unwrap();
    log.lock().unwrap().clear();

    manager.resize(1024, 768);

    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[StageEvent::Allocated("B".to_string(), 1024, 768, 1)]
    );
}

#[test]
fn set_camera_with_new_dimensions_resizes() {
    let log: EventLog = Arc::default();
    let mut manager = manager(800, 600);
    manager.add_stage(Box::new(RecordingStage::new("A", Arc::clone(&log)))).unwrap();
    log.lock().unwrap().clear();

    let mut camera = CameraState::new(800, 600);
    camera.position = Vec3::new(0.0, 1.0, 0.0);
    manager.set_camera(camera);
    assert!(log.lock().unwrap().is_empty());

    manager.set_camera(CameraState::new(1280, 720));
    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[StageEvent::Allocated("A".to_string(), 1280, 720, 1)]
    );
}

#[test]
fn set_sample_count_reallocates_with_the_new_count() {
    let log: EventLog = Arc::default();
    let mut manager = manager(800, 600);
    manager.add_stage(Box::new(RecordingStage::new("A", Arc::clone(&log)))).unwrap();
    log.lock().unwrap().clear();

    manager.set_sample_count(4);
    assert_eq!(manager.sample_count(), 4);
    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[StageEvent::Allocated("A".to_string(), 800, 600, 4)]
    );

    // Same count again is a no-op.
    log.lock().unwrap().clear();
    manager.set_sample_count(4);
    assert!(log.lock().unwrap().is_empty());

    // Later resizes keep the chosen count.
    manager.resize(1024, 768);
    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[StageEvent::Allocated("A".to_string(), 1024, 768, 4)]
    );
}

#[test]
fn render_frame_routes_instances_and_drains_queues() {
    let log: EventLog = Arc::default();
    let mut manager = manager(800, 600);
    manager.add_stage(Box::new(RecordingStage::new("Deffered", Arc::clone(&log)))).unwrap();
    manager.add_stage(Box::new(RecordingStage::new("Shadow", Arc::clone(&log)))).unwrap();
    log.lock().unwrap().clear();

    manager.submit("Deffered", instance());
    manager.submit("Deffered", instance());
    manager.submit("Shadow", instance());
    manager.render_frame();

    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[
            StageEvent::Rendered("Deffered".to_string(), 2),
            StageEvent::Rendered("Shadow".to_string(), 1),
        ]
    );

    // Queues were drained; the next frame sees nothing.
    log.lock().unwrap().clear();
    manager.render_frame();
    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[
            StageEvent::Rendered("Deffered".to_string(), 0),
            StageEvent::Rendered("Shadow".to_string(), 0),
        ]
    );
}

#[test]
fn failing_stage_does_not_stop_the_frame() {
    let log: EventLog = Arc::default();
    let mut manager = manager(800, 600);

    let mut failing = RecordingStage::new("Broken", Arc::clone(&log));
    failing.fail_render = true;
    manager.add_stage(Box::new(failing)).unwrap();
    manager.add_stage(Box::new(RecordingStage::new("Deffered", Arc::clone(&log)))).unwrap();
    log.lock().unwrap().clear();

    manager.render_frame();

    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[StageEvent::Rendered("Deffered".to_string(), 0)]
    );
}

#[test]
fn final_output_is_the_last_stages_target() {
    let log: EventLog = Arc::default();
    let mut manager = manager(800, 600);
    assert!(manager.final_output().is_err());

    manager.add_stage(Box::new(RecordingStage::new("A", Arc::clone(&log)))).unwrap();
    manager.add_stage(Box::new(RecordingStage::new("B", Arc::clone(&log)))).unwrap();

    let output = manager.final_output().unwrap();
    assert_eq!(output, manager.graphics().get_render_target("B_Output").unwrap());
}
