//! Scheduling against the threaded timer service, in wall-clock time.

use crossbeam::channel::{Receiver, unbounded};
use notemake::{EventSink, NoteEvent, NoteScheduler, PendingNote, TimerService};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn scheduler() -> (NoteScheduler, Receiver<(Instant, NoteEvent)>) {
    let (tx, rx) = unbounded();
    let sink: Arc<dyn EventSink> = Arc::new(move |event: NoteEvent| {
        let _ = tx.send((Instant::now(), event));
    });
    let timers = Arc::new(TimerService::spawn().unwrap());
    let scheduler = NoteScheduler::new(
        sink,
        timers,
        PendingNote {
            pitch: 60,
            velocity: 96,
            duration_ms: 100,
        },
    );
    (scheduler, rx)
}

fn wait_until_idle(scheduler: &NoteScheduler) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while scheduler.active_count() > 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn single_note_is_released_after_its_duration() {
    let (scheduler, rx) = scheduler();

    let triggered_at = Instant::now();
    scheduler.play(60).unwrap();

    let (_, on) = rx.try_recv().expect("note-on is sent synchronously");
    assert_eq!(on, NoteEvent::on(60, 96));
    assert_eq!(scheduler.active_count(), 1);

    let (off_at, off) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(off, NoteEvent::off(60));
    assert!(off_at - triggered_at >= Duration::from_millis(100));

    wait_until_idle(&scheduler);
    assert_eq!(scheduler.active_count(), 0);
}

#[test]
fn later_short_note_is_released_before_earlier_long_note() {
    let (scheduler, rx) = scheduler();

    scheduler.set_pending_duration(200);
    scheduler.play(60).unwrap();
    scheduler.set_pending_duration(50);
    scheduler.play(64).unwrap();

    let offs: Vec<i32> = rx
        .iter()
        .map(|(_, event)| event)
        .filter(|event| event.is_note_off())
        .take(2)
        .map(|event| event.pitch)
        .collect();
    assert_eq!(offs, vec![64, 60]);
}

#[test]
fn release_times_follow_each_notes_own_duration() {
    let (scheduler, rx) = scheduler();
    let start = Instant::now();

    for (pitch, duration) in [(60, 150), (62, 30), (64, 90)] {
        scheduler.set_pending_duration(duration);
        scheduler.play(pitch).unwrap();
    }

    let mut released = Vec::new();
    while released.len() < 3 {
        let (at, event) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        if event.is_note_off() {
            released.push((event.pitch, at - start));
        }
    }

    let pitches: Vec<i32> = released.iter().map(|(pitch, _)| *pitch).collect();
    assert_eq!(pitches, vec![62, 64, 60]);
    for (pitch, elapsed) in released {
        let expected = match pitch {
            60 => 150,
            62 => 30,
            _ => 90,
        };
        assert!(elapsed >= Duration::from_millis(expected));
    }
}

#[test]
fn shutdown_silences_pending_note_offs() {
    let (scheduler, rx) = scheduler();

    scheduler.set_pending_duration(80);
    scheduler.play(60).unwrap();
    scheduler.shutdown();

    std::thread::sleep(Duration::from_millis(200));
    let events: Vec<NoteEvent> = rx.try_iter().map(|(_, event)| event).collect();
    assert_eq!(events, vec![NoteEvent::on(60, 96)]);
    assert!(scheduler.trigger().is_err());
}

#[test]
fn stop_releases_everything_now() {
    let (scheduler, rx) = scheduler();

    scheduler.set_pending_duration(10_000);
    scheduler.play(60).unwrap();
    scheduler.play(67).unwrap();
    assert_eq!(scheduler.stop(), 2);

    let events: Vec<NoteEvent> = rx.try_iter().map(|(_, event)| event).collect();
    assert_eq!(
        events,
        vec![
            NoteEvent::on(60, 96),
            NoteEvent::on(67, 96),
            NoteEvent::off(60),
            NoteEvent::off(67),
        ]
    );
    assert_eq!(scheduler.active_count(), 0);
}
