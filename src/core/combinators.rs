//! Events composed from other awaitables.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{Awaitable, Event};

/// Decrement `remaining` and report whether this was the last one.
fn count_down(remaining: &AtomicUsize) -> bool {
    remaining.fetch_sub(1, Ordering::AcqRel) == 1
}

pub(crate) fn any_of(result: Event, members: &[&dyn Awaitable]) -> Event {
    if members.is_empty() || members.iter().any(|m| m.processed()) {
        result.trigger();
        return result;
    }

    let remaining = Arc::new(AtomicUsize::new(members.len()));
    for member in members {
        if member.aborted() {
            if count_down(&remaining) {
                result.abort();
            }
            continue;
        }

        let on_processed = result.clone();
        member.add_handler(Box::new(move |_| {
            on_processed.trigger();
        }));

        let on_abort = result.clone();
        let remaining = Arc::clone(&remaining);
        member.add_abort_handler(Box::new(move |_| {
            if count_down(&remaining) {
                on_abort.abort();
            }
        }));
    }
    result
}

pub(crate) fn all_of(result: Event, members: &[&dyn Awaitable]) -> Event {
    if members.iter().any(|m| m.aborted()) {
        result.abort();
        return result;
    }

    let waiting: Vec<_> = members.iter().filter(|m| !m.processed()).collect();
    if waiting.is_empty() {
        result.trigger();
        return result;
    }

    let remaining = Arc::new(AtomicUsize::new(waiting.len()));
    for member in waiting {
        let on_processed = result.clone();
        let remaining = Arc::clone(&remaining);
        member.add_handler(Box::new(move |_| {
            if count_down(&remaining) {
                on_processed.trigger();
            }
        }));

        let on_abort = result.clone();
        member.add_abort_handler(Box::new(move |_| {
            on_abort.abort();
        }));
    }
    result
}
