use crate::events::NoteEvent;
use crossbeam::channel::Sender;
use parking_lot::Mutex;
use ringbuf::traits::Producer;

pub type EventProducer = ringbuf::HeapProd<NoteEvent>;

/// Downstream receiver of note-on / note-off pairs. Delivery is
/// fire-and-forget: a sink never reports back to the scheduler.
pub trait EventSink: Send + Sync {
    fn send(&self, event: NoteEvent);
}

impl<F> EventSink for F
where
    F: Fn(NoteEvent) + Send + Sync,
{
    fn send(&self, event: NoteEvent) {
        self(event)
    }
}

impl EventSink for Sender<NoteEvent> {
    fn send(&self, event: NoteEvent) {
        let _ = Sender::send(self, event);
    }
}

/// Pushes events into a ring buffer drained by a realtime consumer.
pub struct RingSink {
    producer: Mutex<EventProducer>,
}

impl RingSink {
    pub fn new(producer: EventProducer) -> Self {
        Self {
            producer: Mutex::new(producer),
        }
    }
}

impl EventSink for RingSink {
    fn send(&self, event: NoteEvent) {
        if self.producer.lock().try_push(event).is_err() {
            tracing::warn!(
                pitch = event.pitch,
                velocity = event.velocity,
                "event ring is full, dropping note event"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::{
        HeapRb,
        traits::{Consumer, Split},
    };

    #[test]
    fn ring_sink_drops_when_full() {
        let (producer, mut consumer) = HeapRb::<NoteEvent>::new(2).split();
        let sink = RingSink::new(producer);

        sink.send(NoteEvent::on(60, 100));
        sink.send(NoteEvent::on(62, 100));
        sink.send(NoteEvent::on(64, 100));

        assert_eq!(consumer.try_pop(), Some(NoteEvent::on(60, 100)));
        assert_eq!(consumer.try_pop(), Some(NoteEvent::on(62, 100)));
        assert_eq!(consumer.try_pop(), None);
    }

    #[test]
    fn channel_sink_ignores_dropped_receiver() {
        let (tx, rx) = crossbeam::channel::unbounded::<NoteEvent>();
        drop(rx);
        EventSink::send(&tx, NoteEvent::off(60));
    }

    #[test]
    fn closures_are_sinks() {
        let seen = Mutex::new(Vec::new());
        let sink = |event: NoteEvent| seen.lock().push(event);
        sink.send(NoteEvent::off(48));
        assert_eq!(*seen.lock(), vec![NoteEvent::off(48)]);
    }
}
