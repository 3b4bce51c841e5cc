use crate::Signal;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
pub struct ClockDef {
    pub period: u64,
}

#[derive(Debug, Clone)]
pub struct SimEvent {
    pub time: u64,
    /// Insertion order; breaks ties between events at the same time.
    pub seq: u64,
    pub signal: Signal,
    pub level: bool,
    /// Periodic clock edges reschedule themselves after being applied.
    pub periodic: bool,
}

impl PartialEq for SimEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for SimEvent {}

impl PartialOrd for SimEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Earlier time has higher priority (BinaryHeap is a Max-Heap)
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct Scheduler {
    pub(crate) time: u64,
    pub(crate) clocks: [Option<ClockDef>; Signal::COUNT],
    event_queue: BinaryHeap<SimEvent>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            time: 0,
            clocks: [None; Signal::COUNT],
            event_queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.event_queue.peek().map(|e| e.time)
    }

    pub fn clock(&self, signal: Signal) -> Option<ClockDef> {
        self.clocks[signal as usize]
    }

    pub fn push(&mut self, time: u64, signal: Signal, level: bool, periodic: bool) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.event_queue.push(SimEvent {
            time,
            seq,
            signal,
            level,
            periodic,
        });
    }

    pub fn pop_all_at_next_time(&mut self) -> Option<(u64, Vec<SimEvent>)> {
        let next_time = self.next_event_time()?;
        let mut events = Vec::new();
        while self.event_queue.peek().is_some_and(|ev| ev.time == next_time) {
            if let Some(ev) = self.event_queue.pop() {
                events.push(ev);
            }
        }
        Some((next_time, events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_earliest_time_first_in_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.push(20, Signal::RstN, true, false);
        scheduler.push(5, Signal::Clk, true, true);
        scheduler.push(5, Signal::RstN, false, false);

        let (time, events) = scheduler.pop_all_at_next_time().unwrap();
        assert_eq!(time, 5);
        let order: Vec<_> = events.iter().map(|ev| ev.signal).collect();
        assert_eq!(order, vec![Signal::Clk, Signal::RstN]);

        assert_eq!(scheduler.next_event_time(), Some(20));
        scheduler.pop_all_at_next_time().unwrap();
        assert!(scheduler.pop_all_at_next_time().is_none());
    }
}
