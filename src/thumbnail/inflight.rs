//! De-duplication of concurrent thumbnail requests.
//!
//! The first caller for a key becomes the **leader** and does the work;
//! everyone arriving while it runs becomes a **follower** and blocks on the
//! same slot until the leader publishes. The slot leaves the map as soon as
//! the leader is done, whether it finished, failed, or panicked, so a later
//! request for the same key starts fresh.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

enum SlotState<T> {
    Pending,
    Done(Option<T>),
}

/// Shared result of one in-flight generation.
pub struct Slot<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
}

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Pending),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the leader publishes, then return its result.
    pub fn wait(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            match &*state {
                SlotState::Done(value) => return value.clone(),
                SlotState::Pending => {
                    state = self
                        .ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// First publish wins; later ones are ignored.
    fn publish(&self, value: Option<T>) {
        let mut state = self.lock();
        if matches!(*state, SlotState::Pending) {
            *state = SlotState::Done(value);
            self.ready.notify_all();
        }
    }
}

pub enum Claim<'a, T: Clone> {
    Leader(Leader<'a, T>),
    Follower(Arc<Slot<T>>),
}

/// Keyed map of pending generations.
pub struct InFlight<T> {
    slots: Mutex<HashMap<String, Arc<Slot<T>>>>,
}

impl<T: Clone> Default for InFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> InFlight<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Slot<T>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Join the generation already running for `key`, or start one.
    pub fn claim(&self, key: &str) -> Claim<'_, T> {
        let mut slots = self.lock();
        if let Some(slot) = slots.get(key) {
            return Claim::Follower(slot.clone());
        }
        let slot = Arc::new(Slot::new());
        slots.insert(key.to_string(), slot.clone());
        Claim::Leader(Leader {
            owner: self,
            key: key.to_string(),
            slot,
        })
    }

    /// Forget every pending slot. Running leaders still publish to their
    /// own followers.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The caller responsible for producing a key's result.
///
/// Dropping a leader without calling [`finish`](Leader::finish) publishes
/// `None`, so followers are never left waiting.
pub struct Leader<'a, T: Clone> {
    owner: &'a InFlight<T>,
    key: String,
    slot: Arc<Slot<T>>,
}

impl<T: Clone> Leader<'_, T> {
    pub fn finish(self, value: Option<T>) {
        self.slot.publish(value);
    }
}

impl<T: Clone> Drop for Leader<'_, T> {
    fn drop(&mut self) {
        self.slot.publish(None);
        let mut slots = self.owner.lock();
        // The map may have been cleared and the key re-claimed since.
        if slots
            .get(&self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &self.slot))
        {
            slots.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn expect_leader<'a>(claim: Claim<'a, u32>) -> Leader<'a, u32> {
        match claim {
            Claim::Leader(leader) => leader,
            Claim::Follower(_) => panic!("expected to lead"),
        }
    }

    fn expect_follower(claim: Claim<'_, u32>) -> Arc<Slot<u32>> {
        match claim {
            Claim::Follower(slot) => slot,
            Claim::Leader(_) => panic!("expected to follow"),
        }
    }

    #[test]
    fn second_claim_follows_and_receives_result() {
        let flights = InFlight::new();
        let leader = expect_leader(flights.claim("a"));
        let follower = expect_follower(flights.claim("a"));

        leader.finish(Some(7));
        assert_eq!(follower.wait(), Some(7));
        assert!(flights.is_empty());
    }

    #[test]
    fn distinct_keys_both_lead() {
        let flights = InFlight::<u32>::new();
        let _a = expect_leader(flights.claim("a"));
        let _b = expect_leader(flights.claim("b"));
        assert_eq!(flights.len(), 2);
    }

    #[test]
    fn dropped_leader_publishes_none() {
        let flights = InFlight::new();
        let leader = expect_leader(flights.claim("a"));
        let follower = expect_follower(flights.claim("a"));

        drop(leader);
        assert_eq!(follower.wait(), None);
        assert!(flights.is_empty());
    }

    #[test]
    fn panicking_leader_releases_followers() {
        let flights = Arc::new(InFlight::new());

        let follower = {
            let flights = flights.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                match flights.claim("a") {
                    Claim::Follower(slot) => slot.wait(),
                    Claim::Leader(leader) => {
                        leader.finish(Some(1));
                        Some(1)
                    }
                }
            })
        };

        let leader_flights = flights.clone();
        let leader = thread::spawn(move || {
            let _leader = expect_leader(leader_flights.claim("a"));
            thread::sleep(Duration::from_millis(150));
            panic!("generation blew up");
        });

        assert!(leader.join().is_err());
        assert_eq!(follower.join().unwrap(), None);
        assert!(flights.is_empty());
    }

    #[test]
    fn clear_does_not_evict_a_newer_claim() {
        let flights = InFlight::new();
        let old = expect_leader(flights.claim("a"));
        flights.clear();
        let new = expect_leader(flights.claim("a"));

        drop(old);
        assert_eq!(flights.len(), 1);
        new.finish(Some(3));
        assert!(flights.is_empty());
    }
}
