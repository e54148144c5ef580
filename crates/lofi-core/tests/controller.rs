mod common;

use common::{Call, Harness};
use lofi_core::error::StreamError;
use lofi_core::playback::{
    Lifecycle, PlayIcon, ServiceStatus, TITLE_LOADING, TITLE_LOAD_FAILED, TITLE_UNAVAILABLE,
};
use lofi_core::player::{HandleId, PlayerEvent, PlayerState};
use lofi_core::timer::Deferred;

/// Drive a fresh harness to a playing, Ready handle #1 on station 0.
fn ready(h: &mut Harness) {
    h.ctl.toggle_play_pause();
    h.ctl.on_player_event(PlayerEvent::ready(HandleId(1)));
    h.advance(500);
    assert_eq!(h.ctl.lifecycle(), Lifecycle::Ready);
    assert!(h.ctl.is_playing());
}

#[test]
fn abc_navigation_scenario() {
    let mut h = Harness::abc();
    assert_eq!(h.ctl.current_index(), 0);
    h.ctl.next_station();
    assert_eq!(h.ctl.current_index(), 1);
    h.ctl.next_station();
    assert_eq!(h.ctl.current_index(), 2);
    h.ctl.next_station();
    assert_eq!(h.ctl.current_index(), 0);
    h.ctl.previous_station();
    assert_eq!(h.ctl.current_index(), 2);
}

#[test]
fn cycling_n_times_returns_to_start() {
    let ids = ["a", "b", "c", "d", "e"];
    for n in 1..=ids.len() {
        let mut h = Harness::new(&ids[..n], true, false);
        for _ in 0..n {
            h.ctl.next_station();
        }
        assert_eq!(h.ctl.current_index(), 0, "next x{n}");
        for _ in 0..n {
            h.ctl.previous_station();
        }
        assert_eq!(h.ctl.current_index(), 0, "previous x{n}");
    }
}

#[test]
fn selecting_current_station_is_a_no_op() {
    let mut h = Harness::abc();
    ready(&mut h);
    h.clear();

    assert!(!h.ctl.select_station(0).unwrap());
    h.advance(1_000);
    assert!(h.calls().is_empty());
    assert_eq!(h.ctl.handle_id(), Some(HandleId(1)));
}

#[test]
fn rapid_selections_realise_one_handle() {
    let mut h = Harness::abc();
    ready(&mut h);
    h.clear();

    h.ctl.select_station(1).unwrap();
    h.advance(50);
    h.ctl.select_station(2).unwrap();
    h.ctl.select_station(1).unwrap();
    h.advance(30);
    h.ctl.select_station(2).unwrap();
    h.advance(1_000);

    assert_eq!(h.creates(), 1);
    assert_eq!(
        h.calls(),
        vec![Call::Destroy(HandleId(1)), Call::Create(HandleId(2), "c".into())]
    );
    assert_eq!(h.live(), vec![HandleId(2)]);
    assert_eq!(h.ctl.presentation().active_index, Some(2));
}

#[test]
fn stale_creation_is_ignored() {
    let mut h = Harness::abc();
    h.ctl.select_station(1).unwrap();
    h.ctl.fire(Deferred::CreatePlayer { generation: 0 });
    assert_eq!(h.creates(), 0);

    h.advance(100);
    assert_eq!(h.creates(), 1);
}

#[test]
fn active_highlight_trails_selection_by_switch_delay() {
    let mut h = Harness::abc();
    h.ctl.select_station(2).unwrap();
    assert_eq!(h.ctl.current_index(), 2);
    assert_eq!(h.ctl.presentation().active_index, Some(0));
    h.advance(99);
    assert_eq!(h.ctl.presentation().active_index, Some(0));
    h.advance(1);
    assert_eq!(h.ctl.presentation().active_index, Some(2));
    assert_eq!(h.ctl.presentation().title, "Playing: C");
}

#[test]
fn early_toggle_plays_exactly_once_after_ready() {
    let mut h = Harness::abc();
    h.ctl.toggle_play_pause();
    assert_eq!(h.ctl.lifecycle(), Lifecycle::Loading);
    h.ctl.toggle_play_pause();
    h.ctl.toggle_play_pause();
    assert!(h.ctl.pending_autoplay());
    assert_eq!(h.plays(), 0);

    h.ctl.on_player_event(PlayerEvent::ready(HandleId(1)));
    assert!(!h.ctl.pending_autoplay());
    h.advance(499);
    assert_eq!(h.plays(), 0);
    h.advance(1);
    assert_eq!(h.plays(), 1);

    h.advance(5_000);
    assert_eq!(h.plays(), 1);
    assert!(h.ctl.is_playing());
}

#[test]
fn readiness_applies_slider_volume() {
    let mut h = Harness::abc();
    h.ctl.set_volume(0.3);
    ready(&mut h);
    assert!(h.calls().contains(&Call::Volume(HandleId(1), 30)));
}

#[test]
fn volume_forwarded_once_per_input() {
    let mut h = Harness::abc();
    assert!(!h.ctl.set_volume(0.8));
    assert_eq!(h.ctl.volume(), 0.8);
    assert!(h.calls().is_empty());

    ready(&mut h);
    h.clear();
    assert!(h.ctl.set_volume(0.5));
    assert_eq!(h.calls(), vec![Call::Volume(HandleId(1), 50)]);
}

#[test]
fn stale_handle_events_are_ignored() {
    let mut h = Harness::abc();
    h.ctl.toggle_play_pause();
    h.ctl.select_station(1).unwrap();
    h.advance(100);
    assert_eq!(h.ctl.handle_id(), Some(HandleId(2)));
    h.clear();

    h.ctl.on_player_event(PlayerEvent::ready(HandleId(1)));
    h.ctl.on_player_event(PlayerEvent::state(HandleId(1), PlayerState::Playing));
    h.ctl
        .on_player_event(PlayerEvent::error(HandleId(1), StreamError::NotFound));

    assert_eq!(h.ctl.lifecycle(), Lifecycle::Loading);
    assert_eq!(h.ctl.presentation().icon, PlayIcon::Play);
    assert_eq!(h.ctl.presentation().title, "Playing: B");
    assert!(h.calls().is_empty());
}

#[test]
fn settle_play_is_dropped_when_station_changes() {
    let mut h = Harness::new(&["a", "b"], true, true);
    h.ctl.toggle_play_pause();
    h.ctl.on_player_event(PlayerEvent::ready(HandleId(1)));
    h.advance(200);
    h.ctl.next_station();
    h.advance(1_000);
    assert_eq!(h.plays(), 0);
    // the replacement is created but not yet ready
    assert_eq!(h.ctl.lifecycle(), Lifecycle::Loading);
}

#[test]
fn autoplay_plays_on_readiness_without_intent() {
    let mut h = Harness::new(&["a", "b"], true, true);
    h.ctl.next_station();
    h.advance(100);
    h.ctl.on_player_event(PlayerEvent::ready(HandleId(1)));
    h.advance(500);
    assert_eq!(h.calls().last(), Some(&Call::Play(HandleId(1))));
    assert_eq!(h.plays(), 1);
}

#[test]
fn navigation_before_load_only_loads() {
    let mut h = Harness::new(&["a", "b", "c"], false, false);
    assert!(!h.ctl.next_station());
    assert!(!h.ctl.previous_station());
    assert_eq!(h.ctl.current_index(), 0);
    assert_eq!(h.calls(), vec![Call::Load]);
    assert_eq!(h.ctl.service_status(), ServiceStatus::Loading);
    assert_eq!(h.ctl.presentation().title, TITLE_LOADING);

    h.complete_load();
    assert_eq!(h.ctl.service_status(), ServiceStatus::Loaded);
    assert_eq!(
        h.calls(),
        vec![Call::Load, Call::Create(HandleId(1), "a".into())]
    );
}

#[test]
fn toggle_before_load_plays_once_loaded() {
    let mut h = Harness::new(&["a"], false, false);
    h.ctl.toggle_play_pause();
    assert_eq!(h.calls(), vec![Call::Load]);
    h.complete_load();
    h.ctl.on_player_event(PlayerEvent::ready(HandleId(1)));
    h.advance(500);
    assert_eq!(h.plays(), 1);
}

#[test]
fn failed_load_can_be_retried() {
    let mut h = Harness::new(&["a"], false, false);
    h.ctl.toggle_play_pause();
    h.ctl.on_service_failed("mpv not found");
    assert_eq!(h.ctl.presentation().title, TITLE_LOAD_FAILED);
    assert_eq!(h.ctl.service_status(), ServiceStatus::Unloaded);
    assert!(!h.ctl.pending_autoplay());

    h.ctl.toggle_play_pause();
    assert_eq!(h.calls(), vec![Call::Load, Call::Load]);
}

#[test]
fn unavailable_stream_shows_message() {
    let mut h = Harness::abc();
    ready(&mut h);
    h.ctl
        .on_player_event(PlayerEvent::error(HandleId(1), StreamError::InvalidRequest));
    assert_eq!(h.ctl.presentation().title, "Playing: A");

    h.ctl
        .on_player_event(PlayerEvent::error(HandleId(1), StreamError::from_code(150)));
    assert_eq!(h.ctl.presentation().title, TITLE_UNAVAILABLE);
    // no failover
    assert_eq!(h.ctl.current_index(), 0);
    assert_eq!(h.ctl.handle_id(), Some(HandleId(1)));
}

#[test]
fn create_failure_leaves_idle_with_message() {
    let mut h = Harness::abc();
    h.log.borrow_mut().fail_create = Some("socket gone".into());
    h.ctl.toggle_play_pause();
    assert_eq!(h.ctl.lifecycle(), Lifecycle::Idle);
    assert!(h.ctl.presentation().title.contains("socket gone"));
}

#[test]
fn create_failure_drops_play_intent() {
    let mut h = Harness::abc();
    h.log.borrow_mut().fail_create = Some("socket gone".into());
    h.ctl.toggle_play_pause();
    assert!(!h.ctl.pending_autoplay());

    h.log.borrow_mut().fail_create = None;
    h.ctl.next_station();
    h.advance(100);
    assert_eq!(h.ctl.lifecycle(), Lifecycle::Loading);
    let id = h.ctl.handle_id().unwrap();
    h.ctl.on_player_event(PlayerEvent::ready(id));
    h.advance(5_000);
    assert_eq!(h.plays(), 0);
    assert!(!h.ctl.is_playing());
}

#[test]
fn service_loss_tears_down() {
    let mut h = Harness::abc();
    ready(&mut h);
    h.ctl.on_service_lost();
    assert_eq!(h.ctl.lifecycle(), Lifecycle::Idle);
    assert_eq!(h.ctl.service_status(), ServiceStatus::Unloaded);
    assert!(h.live().is_empty());
    assert!(!h.ctl.is_playing());
}

#[test]
fn shutdown_destroys_once() {
    let mut h = Harness::abc();
    ready(&mut h);
    h.ctl.shutdown();
    h.ctl.shutdown();
    assert_eq!(h.count(|c| matches!(c, Call::Destroy(_))), 1);
    assert!(h.sched.pending().is_empty());
}
