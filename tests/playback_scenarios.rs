use std::sync::Arc;
use std::time::Duration;

use animtex::{
    AnimTexResult, AnimationTextureService, BytesFetcher, LoadStatus, MemoryFetcher,
    PlaybackCommand, PlaybackEngine, PlaybackOptions, PlaybackPhase, ResourceId, TickOutcome,
};

struct SharedFetcher(Arc<MemoryFetcher>);

impl BytesFetcher for SharedFetcher {
    fn fetch(&self, resource: &ResourceId) -> AnimTexResult<Vec<u8>> {
        self.0.fetch(resource)
    }
}

fn solid_rgba(w: u16, h: u16, rgba: [u8; 4]) -> Vec<u8> {
    let mut out = Vec::with_capacity(w as usize * h as usize * 4);
    for _ in 0..u32::from(w) * u32::from(h) {
        out.extend_from_slice(&rgba);
    }
    out
}

/// 4x4 GIF whose frames are 2x2 patches stepping through distinct corners.
fn four_frame_gif() -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut bytes, 4, 4, &[]).unwrap();
        for (left, top) in [(0u16, 0u16), (2, 0), (0, 2), (2, 2)] {
            let mut patch = solid_rgba(2, 2, [255, 255, 255, 255]);
            let mut frame = gif::Frame::from_rgba(2, 2, &mut patch);
            frame.left = left;
            frame.top = top;
            frame.delay = 10;
            encoder.write_frame(&frame).unwrap();
        }
    }
    bytes
}

fn one_frame_gif() -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut bytes, 2, 2, &[]).unwrap();
        let mut pixels = solid_rgba(2, 2, [0, 255, 0, 255]);
        let frame = gif::Frame::from_rgba(2, 2, &mut pixels);
        encoder.write_frame(&frame).unwrap();
    }
    bytes
}

/// Frame 0 covers the canvas and asks for restore-to-background; frame 1 is a
/// 2x2 patch at (1,1).
fn disposal_gif() -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut bytes, 4, 4, &[]).unwrap();

        let mut full = solid_rgba(4, 4, [255, 0, 0, 255]);
        let mut frame = gif::Frame::from_rgba(4, 4, &mut full);
        frame.delay = 10;
        frame.dispose = gif::DisposalMethod::Background;
        encoder.write_frame(&frame).unwrap();

        let mut patch = solid_rgba(2, 2, [0, 0, 255, 255]);
        let mut frame = gif::Frame::from_rgba(2, 2, &mut patch);
        frame.left = 1;
        frame.top = 1;
        frame.delay = 10;
        frame.dispose = gif::DisposalMethod::Keep;
        encoder.write_frame(&frame).unwrap();
    }
    bytes
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn service_with(resource: &str, bytes: Vec<u8>) -> (AnimationTextureService, ResourceId) {
    init_tracing();
    let mut fetcher = MemoryFetcher::new();
    fetcher.insert(resource, bytes);
    let service = AnimationTextureService::new(Box::new(fetcher)).unwrap();
    (service, ResourceId::from(resource))
}

fn engine_ready(
    service: &AnimationTextureService,
    resource: &ResourceId,
    opts: PlaybackOptions,
) -> PlaybackEngine {
    service.request_load(resource).unwrap();
    wait_ready(service, resource);
    PlaybackEngine::new(resource.clone(), Arc::clone(service.cache()), opts)
}

fn wait_ready(service: &AnimationTextureService, resource: &ResourceId) {
    for _ in 0..500 {
        match service.cache().status(resource) {
            LoadStatus::Ready => return,
            LoadStatus::Failed(e) => panic!("load failed: {e}"),
            _ => std::thread::sleep(Duration::from_millis(10)),
        }
    }
    panic!("timed out waiting for {resource}");
}

#[test]
fn looping_playback_advances_modulo_frame_count() {
    let (service, id) = service_with("anim.gif", four_frame_gif());
    let mut engine = engine_ready(&service, &id, PlaybackOptions::default());

    for _ in 0..5 {
        assert!(matches!(engine.tick().unwrap(), TickOutcome::Drew(_)));
    }
    // 5 ticks from index 0 across 4 frames.
    assert_eq!(engine.current_frame(), 5 % 4);
    assert_eq!(engine.phase(), PlaybackPhase::Playing);
}

#[test]
fn non_looping_playback_freezes_on_last_index() {
    let (service, id) = service_with("anim.gif", four_frame_gif());
    let opts = PlaybackOptions {
        looping: false,
        ..Default::default()
    };
    let mut engine = engine_ready(&service, &id, opts);

    for _ in 0..3 {
        assert!(matches!(engine.tick().unwrap(), TickOutcome::Drew(_)));
    }
    assert_eq!(engine.current_frame(), 3);

    engine.surface_mut().unwrap().take_dirty();
    let before = engine.surface().unwrap().pixels().to_vec();

    for _ in 0..3 {
        assert_eq!(engine.tick().unwrap(), TickOutcome::Frozen);
    }
    assert_eq!(engine.current_frame(), 3);
    assert_eq!(engine.surface().unwrap().pixels(), &before[..]);
    assert!(!engine.surface().unwrap().is_dirty());
}

#[test]
fn static_resource_composites_only_once() {
    let (service, id) = service_with("still.gif", one_frame_gif());
    let mut engine = engine_ready(&service, &id, PlaybackOptions::default());

    assert_eq!(engine.tick().unwrap(), TickOutcome::Drew(0));
    assert!(engine.surface_mut().unwrap().take_dirty());

    assert_eq!(engine.tick().unwrap(), TickOutcome::Static);
    assert_eq!(engine.tick().unwrap(), TickOutcome::Static);
    assert!(!engine.surface().unwrap().is_dirty());
    assert_eq!(engine.current_frame(), 0);
}

#[test]
fn concurrent_requests_dispatch_one_decode() {
    init_tracing();
    let mut fetcher = MemoryFetcher::new();
    fetcher.insert("shared.gif", four_frame_gif());
    let fetcher = Arc::new(fetcher);
    let service =
        AnimationTextureService::new(Box::new(SharedFetcher(Arc::clone(&fetcher)))).unwrap();
    let id = ResourceId::from("shared.gif");

    let _a = service.attach(&id, PlaybackOptions::default()).unwrap();
    let _b = service.attach(&id, PlaybackOptions::default()).unwrap();
    service.preload(&id).unwrap();
    wait_ready(&service, &id);

    assert_eq!(fetcher.fetch_count(), 1);
}

#[test]
fn pause_preserves_index_and_play_resumes_from_it() {
    let (service, id) = service_with("anim.gif", four_frame_gif());
    let mut engine = engine_ready(&service, &id, PlaybackOptions::default());

    engine.tick().unwrap();
    engine.tick().unwrap();
    assert_eq!(engine.current_frame(), 2);

    engine.command(PlaybackCommand::Pause);
    assert_eq!(engine.tick().unwrap(), TickOutcome::NotPlaying);
    assert_eq!(engine.current_frame(), 2);

    engine.command(PlaybackCommand::Play);
    assert_eq!(engine.tick().unwrap(), TickOutcome::Drew(2));
    assert_eq!(engine.current_frame(), 3);
}

#[test]
fn reset_while_paused_rewinds_without_resuming() {
    let (service, id) = service_with("anim.gif", four_frame_gif());
    let mut engine = engine_ready(&service, &id, PlaybackOptions::default());

    engine.tick().unwrap();
    engine.tick().unwrap();
    engine.command(PlaybackCommand::Pause);
    engine.command(PlaybackCommand::Reset);

    assert_eq!(engine.current_frame(), 0);
    assert_eq!(engine.phase(), PlaybackPhase::Paused);
    assert_eq!(engine.tick().unwrap(), TickOutcome::NotPlaying);
}

#[test]
fn play_issued_before_first_composite_still_composites() {
    let (service, id) = service_with("anim.gif", four_frame_gif());
    let mut engine = engine_ready(&service, &id, PlaybackOptions::default());

    // Play before any tick has run; the frame set is already resolved but no
    // surface exists yet.
    engine.command(PlaybackCommand::Play);
    assert_eq!(engine.tick().unwrap(), TickOutcome::Drew(0));
    assert!(engine.surface().is_some());
    assert_eq!(engine.phase(), PlaybackPhase::Playing);
    assert_eq!(engine.tick().unwrap(), TickOutcome::Drew(1));
}

#[test]
fn pause_then_play_before_first_composite_recovers() {
    let (service, id) = service_with("anim.gif", four_frame_gif());
    let mut engine = engine_ready(&service, &id, PlaybackOptions::default());

    engine.command(PlaybackCommand::Pause);
    assert_eq!(engine.tick().unwrap(), TickOutcome::NotPlaying);
    assert!(engine.surface().is_none());

    engine.command(PlaybackCommand::Play);
    assert_eq!(engine.tick().unwrap(), TickOutcome::Drew(0));
    assert_eq!(engine.tick().unwrap(), TickOutcome::Drew(1));
}

#[test]
fn autoplay_false_lands_first_composite_in_paused() {
    let (service, id) = service_with("anim.gif", four_frame_gif());
    let opts = PlaybackOptions {
        autoplay: false,
        ..Default::default()
    };
    let mut engine = engine_ready(&service, &id, opts);

    assert_eq!(engine.tick().unwrap(), TickOutcome::Drew(0));
    assert_eq!(engine.phase(), PlaybackPhase::Paused);
    assert_eq!(engine.tick().unwrap(), TickOutcome::NotPlaying);
}

#[test]
fn restore_background_clears_previous_rect_before_patch() {
    let (service, id) = service_with("disposal.gif", disposal_gif());
    let mut engine = engine_ready(&service, &id, PlaybackOptions::default());

    assert_eq!(engine.tick().unwrap(), TickOutcome::Drew(0));
    let corner = engine.surface().unwrap().pixel(0, 0).unwrap();
    assert_eq!(corner[3], 255, "frame 0 covers the whole canvas");

    assert_eq!(engine.tick().unwrap(), TickOutcome::Drew(1));
    let surface = engine.surface().unwrap();
    // Previous frame's rect was cleared to background before the patch blit.
    assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 0]));
    assert_eq!(surface.pixel(3, 3), Some([0, 0, 0, 0]));
    let patched = surface.pixel(1, 1).unwrap();
    assert_eq!(patched[3], 255);
    assert!(patched[2] > 200, "patch pixel should be blue-dominant");
    assert!(patched[0] < 60);
}

#[test]
fn decode_fault_surfaces_through_tick() {
    let (service, id) = service_with("broken.gif", vec![0u8; 8]);
    service.request_load(&id).unwrap();

    let mut engine = PlaybackEngine::new(
        id.clone(),
        Arc::clone(service.cache()),
        PlaybackOptions::default(),
    );
    for _ in 0..500 {
        match engine.tick() {
            Ok(TickOutcome::AwaitingDecode) => std::thread::sleep(Duration::from_millis(10)),
            Ok(other) => panic!("unexpected outcome {other:?}"),
            Err(e) => {
                assert!(e.to_string().contains("decode error:"));
                return;
            }
        }
    }
    panic!("decode fault never surfaced");
}
