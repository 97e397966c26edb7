//! End-to-end orchestrator behavior.

mod common;

use common::{at, count, id, record_events, scripted, Clock};
use glam::{DQuat, DVec3};
use vcam_core::{
    BlendCurve, BlendDefinition, BlendHints, BlendTable, BlendTableEntry, CameraEvent,
    CameraState, Candidate, CandidateId, ComposedCandidate, FrameTick, NullSink, Orchestrator,
    OrchestratorConfig, OrchestratorStatus, ANY_CAMERA,
};

fn linear(duration: f64) -> OrchestratorConfig {
    OrchestratorConfig {
        default_blend: BlendDefinition::new(BlendCurve::Linear, duration),
        ..Default::default()
    }
}

/// Priority change hands over to the new candidate with one activation
/// and one deactivation across the whole transition.
#[test]
fn test_priority_change_switches_live_camera() {
    let mut orchestrator = Orchestrator::from_config(linear(0.5)).unwrap();
    let events = record_events(&mut orchestrator);
    let (a, a_handle) = scripted("a", 30, at(0.0));
    let (b, b_handle) = scripted("b", 20, at(10.0));
    let mut candidates = vec![a, b];
    let mut clock = Clock::new(0.1);

    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    assert_eq!(orchestrator.live(), Some(&id("a")));

    b_handle.priority.set(100);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    assert_eq!(orchestrator.live(), Some(&id("b")));
    assert_eq!(orchestrator.status(), OrchestratorStatus::Blending);

    for _ in 0..20 {
        orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    }
    assert_eq!(orchestrator.status(), OrchestratorStatus::Settled);
    assert_eq!(orchestrator.output().raw_position.x, 10.0);

    let activated_b = count(&events, |e| {
        matches!(e, CameraEvent::CameraActivated { incoming, .. } if incoming.as_str() == "b")
    });
    let deactivated_a = count(&events, |e| {
        matches!(e, CameraEvent::CameraDeactivated { candidate } if candidate.as_str() == "a")
    });
    let finished = count(&events, |e| matches!(e, CameraEvent::BlendFinished { .. }));
    assert_eq!(activated_b, 1);
    assert_eq!(deactivated_a, 1);
    assert_eq!(finished, 1);
    assert_eq!(b_handle.activations.get(), 1);
    assert_eq!(a_handle.activations.get(), 1);
}

/// Halfway through a linear blend the output sits at the midpoint.
#[test]
fn test_linear_blend_midpoint() {
    let mut orchestrator = Orchestrator::from_config(linear(2.0)).unwrap();
    let (a, _) = scripted("a", 10, at(0.0));
    let (b, b_handle) = scripted("b", 0, at(8.0));
    let mut candidates = vec![a, b];
    let mut clock = Clock::new(0.25);

    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    b_handle.priority.set(20);
    // Creation frame: elapsed stays at zero
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    for _ in 0..4 {
        orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    }

    let blend = orchestrator.active_blend().unwrap();
    assert!((blend.elapsed() - 1.0).abs() < 1e-12);
    assert!((orchestrator.output().raw_position.x - 4.0).abs() < 1e-9);
}

/// A zero-length blend publishes the incoming state on the transition frame.
#[test]
fn test_cut_publishes_incoming_state_immediately() {
    let mut orchestrator = Orchestrator::from_config(linear(0.0)).unwrap();
    let events = record_events(&mut orchestrator);
    let (a, _) = scripted("a", 10, at(0.0));
    let (b, b_handle) = scripted("b", 0, at(5.0).with_look_at(DVec3::Z));
    let mut candidates = vec![a, b];
    let mut clock = Clock::new(0.1);

    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    b_handle.priority.set(20);
    let output = orchestrator.update(clock.tick(), &mut candidates, &mut NullSink).clone();

    assert_eq!(&output, candidates[1].state());
    assert!(!orchestrator.is_blending());
    assert_eq!(orchestrator.status(), OrchestratorStatus::Cut);
    assert_eq!(count(&events, |e| matches!(e, CameraEvent::CameraCut { .. })), 2);
    assert_eq!(count(&events, |e| matches!(e, CameraEvent::BlendCreated { .. })), 0);
}

/// Interrupting a blend never pops the published state.
#[test]
fn test_interrupted_blend_is_continuous() {
    let mut orchestrator = Orchestrator::from_config(linear(2.0)).unwrap();
    let events = record_events(&mut orchestrator);
    let (a, _) = scripted("a", 10, at(0.0));
    let turned = CameraState::new(DVec3::new(10.0, 0.0, 0.0), DQuat::from_rotation_y(1.0));
    let (b, b_handle) = scripted("b", 0, turned);
    let (c, c_handle) = scripted("c", 0, at(-50.0));
    let mut candidates = vec![a, b, c];
    let mut clock = Clock::new(0.25);

    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    b_handle.priority.set(20);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    for _ in 0..4 {
        orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    }
    let before = orchestrator.output().clone();
    assert!((orchestrator.active_blend().unwrap().progress() - 0.5).abs() < 1e-12);

    c_handle.priority.set(30);
    let after = orchestrator.update(clock.tick(), &mut candidates, &mut NullSink).clone();

    assert_eq!(orchestrator.live(), Some(&id("c")));
    assert!(after.raw_position.abs_diff_eq(before.raw_position, 1e-9));
    assert!(after.raw_orientation.abs_diff_eq(before.raw_orientation, 1e-9));

    // The redirected blend still lands exactly on the new candidate
    for _ in 0..10 {
        orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    }
    assert_eq!(orchestrator.output().raw_position.x, -50.0);
    // The second blend names the previous live candidate and flags its snapshot source
    let created: Vec<(Option<CandidateId>, bool)> = events
        .borrow()
        .iter()
        .filter_map(|e| match e {
            CameraEvent::BlendCreated {
                outgoing,
                interrupted,
                ..
            } => Some((outgoing.clone(), *interrupted)),
            _ => None,
        })
        .collect();
    assert_eq!(created, vec![(Some(id("a")), false), (Some(id("b")), true)]);
}

/// Hysteresis holds the live candidate until the pending one has waited long enough.
#[test]
fn test_min_duration_delays_switch_until_hold_expires() {
    let mut config = linear(0.0);
    config.arbitration.min_duration = 1.0;
    let mut orchestrator = Orchestrator::from_config(config).unwrap();
    let (a, _) = scripted("a", 10, at(0.0));
    let (b, b_handle) = scripted("b", 0, at(1.0));
    let mut candidates = vec![a, b];
    let mut clock = Clock::new(0.1);

    // t = 0.0: a goes live
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);

    // t = 0.2: b becomes best
    b_handle.priority.set(20);
    while clock.now() < 1.0 - 1e-9 {
        orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
        assert_eq!(orchestrator.live(), Some(&id("a")));
        assert_eq!(orchestrator.arbitration().pending(), Some(&id("b")));
    }

    // t = 1.0
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    assert_eq!(orchestrator.live(), Some(&id("b")));
}

/// Calling update twice for one frame is a no-op the second time.
#[test]
fn test_repeated_frame_is_ignored() {
    let mut orchestrator = Orchestrator::from_config(linear(1.0)).unwrap();
    let events = record_events(&mut orchestrator);
    let (a, _) = scripted("a", 10, at(0.0));
    let (b, b_handle) = scripted("b", 0, at(10.0));
    let mut candidates = vec![a, b];

    orchestrator.update(FrameTick::new(0, 0.0, 0.25), &mut candidates, &mut NullSink);
    b_handle.priority.set(20);
    orchestrator.update(FrameTick::new(1, 0.25, 0.25), &mut candidates, &mut NullSink);
    let event_count = events.borrow().len();

    for _ in 0..3 {
        orchestrator.update(FrameTick::new(2, 0.5, 0.25), &mut candidates, &mut NullSink);
    }

    assert!((orchestrator.active_blend().unwrap().elapsed() - 0.25).abs() < 1e-12);
    assert_eq!(events.borrow().len(), event_count);
}

/// A candidate vanishing mid-blend is treated as empty on its side.
#[test]
fn test_stale_candidate_mid_blend() {
    let mut orchestrator = Orchestrator::from_config(linear(2.0)).unwrap();
    let (a, _) = scripted("a", 10, at(0.0));
    let (b, b_handle) = scripted("b", 0, at(10.0));
    let mut candidates = vec![a, b];
    let mut clock = Clock::new(0.25);

    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    b_handle.priority.set(20);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);

    // Outgoing side destroyed
    candidates.remove(0);
    let output = orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    assert_eq!(output.raw_position.x, 10.0);
    assert!(!output.is_neutral());
    assert!(orchestrator.is_blending());
}

/// Losing every candidate publishes the neutral state and deactivates the live one.
#[test]
fn test_all_candidates_removed() {
    let mut orchestrator = Orchestrator::from_config(linear(2.0)).unwrap();
    let events = record_events(&mut orchestrator);
    let (a, a_handle) = scripted("a", 10, at(0.0));
    let (b, b_handle) = scripted("b", 0, at(10.0));
    let mut candidates = vec![a, b];
    let mut clock = Clock::new(0.25);

    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    b_handle.priority.set(20);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);

    a_handle.enabled.set(false);
    b_handle.enabled.set(false);
    let output = orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    assert!(output.is_neutral());
    assert!(output.blend_hints.contains(BlendHints::NO_TRANSFORM | BlendHints::NO_LENS));
    assert_eq!(orchestrator.status(), OrchestratorStatus::NoLiveCamera);
    assert!(!orchestrator.is_blending());
    assert!(matches!(
        events.borrow().last(),
        Some(CameraEvent::CameraDeactivated { candidate }) if candidate.as_str() == "b"
    ));

    // Coming back is a fresh cut
    a_handle.enabled.set(true);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    assert_eq!(orchestrator.live(), Some(&id("a")));
    assert_eq!(orchestrator.status(), OrchestratorStatus::Cut);
}

/// Blend table lookups pick per-transition blends and fall back to the default.
#[test]
fn test_blend_table_wildcards() {
    let mut orchestrator = Orchestrator::from_config(linear(2.0)).unwrap();
    let events = record_events(&mut orchestrator);
    orchestrator.set_blend_lookup(Box::new(BlendTable::new(vec![
        BlendTableEntry::new(ANY_CAMERA, "close", BlendDefinition::cut()),
        BlendTableEntry::new("close", ANY_CAMERA, BlendDefinition::new(BlendCurve::HardOut, 0.5)),
    ])));
    let (wide, wide_handle) = scripted("wide", 10, at(0.0));
    let (close, close_handle) = scripted("close", 0, at(1.0));
    let (aerial, aerial_handle) = scripted("aerial", 0, at(100.0));
    let mut candidates = vec![wide, close, aerial];
    let mut clock = Clock::new(0.1);

    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);

    // ANY -> close: cut
    close_handle.priority.set(20);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    assert!(matches!(
        events.borrow().last(),
        Some(CameraEvent::CameraCut { incoming, .. }) if incoming.as_str() == "close"
    ));

    // close -> ANY: table blend
    aerial_handle.priority.set(30);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    let blend = orchestrator.active_blend().unwrap();
    assert_eq!(blend.curve(), &BlendCurve::HardOut);
    assert_eq!(blend.duration(), 0.5);

    // aerial -> wide: no entry, default blend
    for _ in 0..10 {
        orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    }
    aerial_handle.priority.set(0);
    close_handle.priority.set(0);
    wide_handle.priority.set(40);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    let blend = orchestrator.active_blend().unwrap();
    assert_eq!(blend.curve(), &BlendCurve::Linear);
    assert_eq!(blend.duration(), 2.0);
}

/// A closure can stand in for the blend table.
#[test]
fn test_closure_blend_lookup() {
    let mut orchestrator = Orchestrator::from_config(linear(2.0)).unwrap();
    orchestrator.set_blend_lookup(Box::new(
        |_from: Option<&CandidateId>, to: &CandidateId| {
            (to.as_str() == "b").then(|| BlendDefinition::new(BlendCurve::EaseIn, 0.75))
        },
    ));
    let (a, _) = scripted("a", 10, at(0.0));
    let (b, b_handle) = scripted("b", 0, at(1.0));
    let mut candidates = vec![a, b];
    let mut clock = Clock::new(0.1);

    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    b_handle.priority.set(20);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);

    let blend = orchestrator.active_blend().unwrap();
    assert_eq!(blend.curve(), &BlendCurve::EaseIn);
    assert_eq!(blend.duration(), 0.75);
}

/// Solo override wins over arbitration and hands back control when cleared.
#[test]
fn test_solo_override_round_trip() {
    let mut orchestrator = Orchestrator::from_config(linear(1.0)).unwrap();
    let (a, _) = scripted("a", 10, at(0.0));
    let (debug, debug_handle) = scripted("debug", -5, at(42.0));
    let mut candidates = vec![a, debug];
    let mut clock = Clock::new(0.1);

    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    orchestrator.set_solo(Some(id("debug")));
    let output = orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    assert_eq!(output.raw_position.x, 42.0);

    // Disabled solo candidate falls back to arbitration
    debug_handle.enabled.set(false);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    assert_eq!(orchestrator.live(), Some(&id("a")));

    debug_handle.enabled.set(true);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    assert_eq!(orchestrator.live(), Some(&id("debug")));

    orchestrator.set_solo(None);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    assert_eq!(orchestrator.live(), Some(&id("a")));
    assert!(orchestrator.is_blending());
}

/// The minimum hold of a solo candidate runs from when it actually went live,
/// so releasing a long solo hands back control on the same frame.
#[test]
fn test_solo_release_respects_hold_from_solo_activation() {
    let mut config = OrchestratorConfig {
        default_blend: BlendDefinition::cut(),
        ..Default::default()
    };
    config.arbitration.min_duration = 2.0;
    let mut orchestrator = Orchestrator::from_config(config).unwrap();
    let (a, _) = scripted("a", 10, at(0.0));
    let (debug, _) = scripted("debug", 0, at(42.0));
    let mut candidates = vec![a, debug];
    let mut clock = Clock::new(0.1);

    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    assert_eq!(orchestrator.live(), Some(&id("a")));

    orchestrator.set_solo(Some(id("debug")));
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    assert_eq!(orchestrator.live(), Some(&id("debug")));
    assert_eq!(orchestrator.arbitration().activation_time(), Some(0.1));
    while clock.now() < 4.95 {
        orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    }

    orchestrator.set_solo(None);
    let tick = clock.tick();
    assert!((tick.now - 5.0).abs() < 1e-9);
    orchestrator.update(tick, &mut candidates, &mut NullSink);
    assert_eq!(orchestrator.live(), Some(&id("a")));
    assert_eq!(orchestrator.output().raw_position.x, 0.0);
}

/// A composed candidate with the inherit hint starts from the outgoing pose.
#[test]
fn test_inherit_position_through_orchestrator() {
    let mut orchestrator = Orchestrator::from_config(linear(0.0)).unwrap();
    let follow_seed = at(500.0).with_hints(BlendHints::INHERIT_POSITION);
    let mut follow = ComposedCandidate::new("follow", 0, follow_seed);
    follow.set_enabled(false);

    let (wide, _) = scripted("wide", 10, at(7.0));
    let mut candidates: Vec<Box<dyn Candidate>> = vec![wide, follow.boxed()];
    let mut clock = Clock::new(0.1);
    orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);

    // Hosts own their candidates; swap in an enabled, higher-priority copy
    let seed = at(500.0).with_hints(BlendHints::INHERIT_POSITION);
    let mut follow = ComposedCandidate::new("follow", 50, seed);
    follow.refresh(0.1);
    candidates[1] = follow.boxed();

    let output = orchestrator.update(clock.tick(), &mut candidates, &mut NullSink);
    assert_eq!(output.raw_position.x, 7.0);
    assert_eq!(orchestrator.live(), Some(&id("follow")));
}
