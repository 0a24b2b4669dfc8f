use super::{Callback, TimerHandle, TimerProvider, TimerSlot};
use crate::error::TimerError;
use crossbeam::channel::{Receiver, RecvTimeoutError, Sender};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

enum TimerCommand {
    Arm {
        deadline: Instant,
        slot: Arc<TimerSlot>,
    },
    Shutdown,
}

struct Entry {
    deadline: Instant,
    seq: u64,
    slot: Arc<TimerSlot>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed: BinaryHeap is a max-heap, we want the earliest deadline on top.
    fn cmp(&self, other: &Self) -> Ordering {
        (other.deadline, other.seq).cmp(&(self.deadline, self.seq))
    }
}

/// Deadline timer backed by one dedicated thread. Callbacks run on that
/// thread, in deadline order, ties in arming order.
pub struct TimerService {
    command_tx: Sender<TimerCommand>,
    thread: Option<JoinHandle<()>>,
}

impl TimerService {
    pub fn spawn() -> Result<Self, TimerError> {
        let (command_tx, command_rx) = crossbeam::channel::unbounded();

        let thread = std::thread::Builder::new()
            .name("notemake-timer".into())
            .spawn(move || timer_thread(command_rx))?;

        Ok(Self {
            command_tx,
            thread: Some(thread),
        })
    }
}

impl TimerProvider for TimerService {
    fn arm(&self, delay: Duration, callback: Callback) -> Result<TimerHandle, TimerError> {
        let slot = TimerSlot::new(callback);
        let deadline = Instant::now() + delay;

        self.command_tx
            .send(TimerCommand::Arm {
                deadline,
                slot: slot.clone(),
            })
            .map_err(|_| TimerError::Stopped)?;

        Ok(TimerHandle::new(slot))
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        let _ = self.command_tx.send(TimerCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            // The last owner may be a callback running on the timer thread itself.
            if thread.thread().id() != std::thread::current().id() {
                let _ = thread.join();
            }
        }
    }
}

fn timer_thread(command_rx: Receiver<TimerCommand>) {
    let mut queue: BinaryHeap<Entry> = BinaryHeap::new();
    let mut seq = 0u64;

    loop {
        // Cancelled entries are dead weight; drop them before sleeping.
        queue.retain(|entry| entry.slot.is_pending());

        let command = match queue.peek() {
            Some(next) => match command_rx.recv_deadline(next.deadline) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match command_rx.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            },
        };

        match command {
            Some(TimerCommand::Arm { deadline, slot }) => {
                queue.push(Entry {
                    deadline,
                    seq,
                    slot,
                });
                seq += 1;
            }
            Some(TimerCommand::Shutdown) => break,
            None => {}
        }

        let now = Instant::now();
        while queue.peek().is_some_and(|entry| entry.deadline <= now) {
            if let Some(entry) = queue.pop() {
                entry.slot.fire();
            }
        }
    }

    tracing::debug!(unfired = queue.len(), "timer thread exiting");
}
