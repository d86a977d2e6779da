//! Scheduler tests — catch-up loop, speed, pause and control commands.

mod common;

use citytick_core::{
    command::ControlCommand,
    error::SimError,
    event::SimEvent,
    store::MemorySaveStore,
    world::GameWorld,
};
use common::{fired_ticks, manual_scheduler, FireLog, Recorder};

fn env() -> (GameWorld, MemorySaveStore) {
    (GameWorld::new(), MemorySaveStore::new())
}

/// A stalled host gets every missed tick back, one at a time, in one update.
#[test]
fn catch_up_loop_visits_every_tick_once() {
    let (mut scheduler, clock) = manual_scheduler();
    let (mut world, mut saves) = env();
    let log = FireLog::default();
    scheduler.add_unit("every", Box::new(Recorder::new("every", 1, 0, &log)));

    clock.advance(5.5);
    scheduler.update(&mut world, &mut saves);

    assert_eq!(scheduler.tick_number(), 5);
    assert_eq!(fired_ticks(&log, "every"), vec![1, 2, 3, 4, 5]);
    assert!((scheduler.accumulated() - 0.5).abs() < 1e-12);
}

/// Tick count is floor(total time / tick duration) and the accumulator
/// stays inside [0, tick_duration) after every call.
#[test]
fn tick_count_tracks_total_elapsed_time() {
    let (mut scheduler, clock) = manual_scheduler();
    let (mut world, mut saves) = env();

    let increments = [0.25, 0.5, 1.75, 3.0, 0.125, 0.0, 0.875];
    let mut total = 0.0;
    for dt in increments {
        clock.advance(dt);
        total += dt;
        scheduler.update(&mut world, &mut saves);

        assert_eq!(scheduler.tick_number(), (total / scheduler.tick_duration()).floor() as u64);
        assert!(scheduler.accumulated() >= 0.0);
        assert!(scheduler.accumulated() < scheduler.tick_duration());
    }
    assert_eq!(scheduler.tick_number(), 6);
}

#[test]
fn time_spanning_a_speed_change_counts_at_each_duration() {
    let (mut scheduler, clock) = manual_scheduler();
    let (mut world, mut saves) = env();

    clock.advance(2.5);
    scheduler.update(&mut world, &mut saves);
    assert_eq!(scheduler.tick_number(), 2);

    // 0.5 of a tick banked; at speed 2 that is 0.125s of a 0.25s tick.
    scheduler.set_speed(2);
    clock.advance(1.0);
    scheduler.update(&mut world, &mut saves);

    assert_eq!(scheduler.tick_number(), 6);
    assert!((scheduler.accumulated() - 0.125).abs() < 1e-12);
}

#[test]
fn paused_update_fires_nothing_and_banks_nothing() {
    let (mut scheduler, clock) = manual_scheduler();
    let (mut world, mut saves) = env();
    let log = FireLog::default();
    scheduler.add_unit("every", Box::new(Recorder::new("every", 1, 0, &log)));

    scheduler.pause();
    clock.advance(10.0);
    scheduler.update(&mut world, &mut saves);

    assert_eq!(scheduler.tick_number(), 0);
    assert!(log.borrow().is_empty());

    // Time offered while stopped is not replayed after resuming.
    scheduler.un_pause(None);
    scheduler.update(&mut world, &mut saves);
    assert_eq!(scheduler.tick_number(), 0);
}

#[test]
fn pause_then_unpause_without_elapsed_time_changes_nothing() {
    let (mut scheduler, clock) = manual_scheduler();
    let (mut world, mut saves) = env();
    let log = FireLog::default();
    scheduler.add_unit("every", Box::new(Recorder::new("every", 1, 0, &log)));

    clock.advance(3.25);
    scheduler.update(&mut world, &mut saves);
    let before = scheduler.tick_number();
    let fired = log.borrow().len();

    scheduler.pause();
    scheduler.update(&mut world, &mut saves);
    scheduler.un_pause(None);
    scheduler.update(&mut world, &mut saves);

    assert_eq!(scheduler.tick_number(), before);
    assert_eq!(log.borrow().len(), fired);
    assert_eq!(scheduler.speed(), 1);
}

#[test]
fn doubling_speed_quarters_tick_and_keeps_tick_fraction() {
    let (mut scheduler, clock) = manual_scheduler();
    let (mut world, mut saves) = env();

    let old_duration = scheduler.tick_duration();
    clock.advance(0.5 * old_duration);
    scheduler.update(&mut world, &mut saves);
    let old_fraction = scheduler.accumulated() / old_duration;

    scheduler.set_speed(2);

    let new_duration = scheduler.tick_duration();
    assert!((new_duration - old_duration / 4.0).abs() < 1e-12);
    assert!((scheduler.accumulated() - 0.125).abs() < 1e-12);
    assert!((scheduler.accumulated() / new_duration - old_fraction).abs() < 1e-12);
}

/// The banked tick fraction survives speed changes that start above 1,
/// both speeding up and slowing down.
#[test]
fn speed_changes_from_any_speed_keep_tick_fraction() {
    let (mut scheduler, clock) = manual_scheduler();
    let (mut world, mut saves) = env();

    scheduler.set_speed(2);
    clock.advance(0.125);
    scheduler.update(&mut world, &mut saves);
    assert_eq!(scheduler.tick_number(), 0);
    assert!((scheduler.accumulated() / scheduler.tick_duration() - 0.5).abs() < 1e-12);

    scheduler.set_speed(3);
    assert!((scheduler.tick_duration() - 1.0 / 9.0).abs() < 1e-12);
    assert!((scheduler.accumulated() / scheduler.tick_duration() - 0.5).abs() < 1e-12);

    scheduler.set_speed(1);
    assert!((scheduler.tick_duration() - 1.0).abs() < 1e-12);
    assert!((scheduler.accumulated() - 0.5).abs() < 1e-12);

    // Half a tick more completes exactly one tick.
    clock.advance(0.5);
    scheduler.update(&mut world, &mut saves);
    assert_eq!(scheduler.tick_number(), 1);
    assert!(scheduler.accumulated().abs() < 1e-9);
}

#[test]
fn speed_above_max_is_ignored() {
    let (mut scheduler, _clock) = manual_scheduler();

    scheduler.set_speed(3);
    scheduler.set_speed(6);

    assert_eq!(scheduler.speed(), 3);
    assert_eq!(scheduler.max_speed(), 5);
    assert!((scheduler.tick_duration() - 1.0 / 9.0).abs() < 1e-12);
}

#[test]
fn zero_or_negative_speed_pauses() {
    let (mut scheduler, _clock) = manual_scheduler();

    scheduler.set_speed(4);
    scheduler.set_speed(0);
    assert!(scheduler.is_paused());
    assert_eq!(scheduler.speed(), 0);
    assert_eq!(scheduler.speed_before_pausing(), 4);

    // Second pause must not overwrite the snapshot with 0.
    scheduler.set_speed(-1);
    assert_eq!(scheduler.speed_before_pausing(), 4);
}

#[test]
fn setting_speed_while_paused_resumes() {
    let (mut scheduler, clock) = manual_scheduler();
    let (mut world, mut saves) = env();

    scheduler.pause();
    scheduler.set_speed(2);

    assert!(!scheduler.is_paused());
    assert_eq!(scheduler.speed(), 2);

    clock.advance(1.0);
    scheduler.update(&mut world, &mut saves);
    assert_eq!(scheduler.tick_number(), 4);
}

#[test]
fn toggle_pause_restores_previous_speed() {
    let (mut scheduler, _clock) = manual_scheduler();

    scheduler.set_speed(3);
    scheduler.toggle_pause();
    assert!(scheduler.is_paused());
    assert_eq!(scheduler.speed(), 0);

    scheduler.toggle_pause();
    assert!(!scheduler.is_paused());
    assert_eq!(scheduler.speed(), 3);
    assert!((scheduler.tick_duration() - 1.0 / 9.0).abs() < 1e-12);
}

#[test]
fn queued_commands_apply_on_next_update() {
    let (mut scheduler, _clock) = manual_scheduler();
    let (mut world, mut saves) = env();

    scheduler.submit(ControlCommand::IncrementSpeed);
    scheduler.submit(ControlCommand::IncrementSpeed);
    assert_eq!(scheduler.speed(), 1);

    let events = scheduler.update(&mut world, &mut saves);
    assert_eq!(scheduler.speed(), 3);
    assert!(events.contains(&SimEvent::SpeedChanged { tick: 0, speed: 3 }));

    scheduler.submit(ControlCommand::DecrementSpeed);
    scheduler.update(&mut world, &mut saves);
    assert_eq!(scheduler.speed(), 2);
}

#[test]
fn speed_control_zero_pauses_and_toggle_resumes_while_paused() {
    let (mut scheduler, _clock) = manual_scheduler();
    let (mut world, mut saves) = env();

    scheduler.apply(ControlCommand::SpeedControl { value: 4 });
    scheduler.apply(ControlCommand::SpeedControl { value: 0 });
    let events = scheduler.update(&mut world, &mut saves);
    assert!(scheduler.is_paused());
    assert!(events.contains(&SimEvent::Paused { tick: 0 }));
    assert_eq!(events.last(), Some(&SimEvent::SpeedChanged { tick: 0, speed: 0 }));

    // The queue is drained even while paused.
    scheduler.submit(ControlCommand::TogglePause);
    let events = scheduler.update(&mut world, &mut saves);
    assert!(!scheduler.is_paused());
    assert_eq!(scheduler.speed(), 4);
    assert!(events.contains(&SimEvent::Resumed { tick: 0 }));
}

#[test]
fn decrement_from_speed_one_pauses() {
    let (mut scheduler, _clock) = manual_scheduler();

    scheduler.apply(ControlCommand::DecrementSpeed);
    assert!(scheduler.is_paused());

    scheduler.apply(ControlCommand::IncrementSpeed);
    assert!(!scheduler.is_paused());
    assert_eq!(scheduler.speed(), 1);
}

#[test]
fn units_fire_in_registration_order_each_tick() {
    let (mut scheduler, clock) = manual_scheduler();
    let (mut world, mut saves) = env();
    let log = FireLog::default();
    scheduler.add_unit("b", Box::new(Recorder::new("b", 1, 0, &log)));
    scheduler.add_unit("a", Box::new(Recorder::new("a", 1, 0, &log)));

    clock.advance(2.0);
    scheduler.update(&mut world, &mut saves);

    assert_eq!(*log.borrow(), vec![(1, "b"), (1, "a"), (2, "b"), (2, "a")]);
}

#[test]
fn replacing_a_unit_keeps_its_position_and_takes_the_new_schedule() {
    let (mut scheduler, _clock) = manual_scheduler();
    let (mut world, mut saves) = env();
    let log = FireLog::default();
    scheduler.add_unit("first", Box::new(Recorder::new("first", 1, 0, &log)));
    scheduler.add_unit("middle", Box::new(Recorder::new("old", 1, 0, &log)));
    scheduler.add_unit("last", Box::new(Recorder::new("last", 1, 0, &log)));

    scheduler.fast_forward(2, &mut world, &mut saves);
    scheduler.add_unit("middle", Box::new(Recorder::new("new", 3, 2, &log)));
    scheduler.fast_forward(3, &mut world, &mut saves);

    assert_eq!(scheduler.unit_names(), vec!["first", "middle", "last"]);
    assert_eq!(fired_ticks(&log, "old"), vec![1, 2]);
    assert_eq!(fired_ticks(&log, "new"), vec![5]);
    let tick_five: Vec<_> = log.borrow().iter().filter(|(t, _)| *t == 5).cloned().collect();
    assert_eq!(tick_five, vec![(5, "first"), (5, "new"), (5, "last")]);
}

#[test]
fn failing_unit_does_not_stop_the_tick() {
    let (mut scheduler, _clock) = manual_scheduler();
    let (mut world, mut saves) = env();
    let log = FireLog::default();
    scheduler.add_unit("broken", Box::new(Recorder::failing("broken", 1, 0, &log)));
    scheduler.add_unit("after", Box::new(Recorder::new("after", 2, 0, &log)));

    scheduler.fast_forward(4, &mut world, &mut saves);

    assert_eq!(fired_ticks(&log, "broken"), vec![1, 2, 3, 4]);
    assert_eq!(fired_ticks(&log, "after"), vec![2, 4]);
    assert_eq!(scheduler.tick_number(), 4);
}

#[test]
fn fast_forward_is_a_no_op_while_paused() {
    let (mut scheduler, _clock) = manual_scheduler();
    let (mut world, mut saves) = env();

    scheduler.pause();
    scheduler.fast_forward(10, &mut world, &mut saves);
    assert_eq!(scheduler.tick_number(), 0);
}

#[test]
fn start_speed_zero_builds_a_paused_scheduler() {
    common::init_logging();
    let config = citytick_core::config::SchedulerConfig {
        start_speed: 0,
        ..common::scheduler_config()
    };
    let clock = citytick_core::clock::ManualClock::new();
    let mut scheduler =
        citytick_core::scheduler::Scheduler::new(&config, Box::new(clock)).unwrap();

    assert!(scheduler.is_paused());
    scheduler.toggle_pause();
    assert_eq!(scheduler.speed(), 1);
}

/// A zero-length tick would make the catch-up loop spin forever, so
/// both constructors refuse it up front.
#[test]
fn zero_base_tick_is_rejected() {
    common::init_logging();
    let config = citytick_core::config::SchedulerConfig {
        base_tick_ms: 0,
        ..common::scheduler_config()
    };

    let result = citytick_core::scheduler::Scheduler::new(
        &config,
        Box::new(citytick_core::clock::ManualClock::new()),
    );
    assert!(matches!(result, Err(SimError::Config(_))));

    let mut full = citytick_core::config::SimConfig::default();
    full.scheduler.base_tick_ms = 0;
    let built = citytick_core::scheduler::Scheduler::build(
        &full,
        Box::new(citytick_core::clock::ManualClock::new()),
    );
    assert!(matches!(built, Err(SimError::Config(_))));
}

#[test]
fn start_speed_above_max_is_rejected() {
    let config = citytick_core::config::SchedulerConfig {
        start_speed: 6,
        ..common::scheduler_config()
    };

    let result = citytick_core::scheduler::Scheduler::new(
        &config,
        Box::new(citytick_core::clock::ManualClock::new()),
    );
    assert!(matches!(result, Err(SimError::Config(_))));
}
