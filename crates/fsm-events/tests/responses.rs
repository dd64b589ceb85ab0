use std::cell::{Cell, RefCell};
use std::rc::Rc;

use fsm_events::{Channel, Response, Responses, Selector};

fn counter(count: &Rc<Cell<u32>>) -> Response {
    let count = count.clone();
    Response::signal(move || count.set(count.get() + 1))
}

#[test]
fn nothing_is_subscribed_before_register() {
    let ch = Channel::new("idle.update");
    let hits = Rc::new(Cell::new(0));

    let mut responses = Responses::new();
    responses.set_responses([(ch.clone(), counter(&hits))]);
    ch.raise();

    assert_eq!(hits.get(), 0);
    assert_eq!(ch.subscriber_count(), 0);
    assert!(!responses.is_registered());
}

#[test]
fn register_and_unregister_follow_the_owner_lifecycle() {
    let enter = Channel::new("scan.enter");
    let exit = Channel::new("scan.exit");
    let hits = Rc::new(Cell::new(0));

    let mut responses = Responses::new();
    responses.set_responses([(enter.clone(), counter(&hits)), (exit.clone(), counter(&hits))]);
    assert_eq!(responses.len(), 2);

    responses.register();
    enter.raise();
    exit.raise();
    assert_eq!(hits.get(), 2);

    responses.unregister();
    enter.raise();
    exit.raise();
    assert_eq!(hits.get(), 2);
    assert_eq!(enter.subscriber_count(), 0);
    assert_eq!(exit.subscriber_count(), 0);
}

#[test]
fn double_register_does_not_duplicate_dispatch() {
    let ch = Channel::new("double");
    let hits = Rc::new(Cell::new(0));

    let mut responses = Responses::new();
    responses.set_responses([(ch.clone(), counter(&hits))]);
    responses.register();
    responses.register();

    ch.raise();
    assert_eq!(hits.get(), 1);
    assert_eq!(ch.subscriber_count(), 1);
}

#[test]
fn unregister_twice_matches_unregister_once() {
    let a = Channel::new("a");
    let b = Channel::new("b");
    let other = Rc::new(Cell::new(0));
    a.subscribe({
        let other = other.clone();
        move || other.set(other.get() + 1)
    });

    let hits = Rc::new(Cell::new(0));
    let mut responses = Responses::new();
    responses.set_responses([(a.clone(), counter(&hits)), (b.clone(), counter(&hits))]);
    responses.register();

    responses.unregister();
    let once = (a.subscriber_count(), b.subscriber_count());
    responses.unregister();
    let twice = (a.subscriber_count(), b.subscriber_count());

    assert_eq!(once, (1, 0));
    assert_eq!(once, twice);
    a.raise();
    assert_eq!(other.get(), 1);
    assert_eq!(hits.get(), 0);
}

#[test]
fn selective_responses_do_not_cross_fire() {
    let shared = Channel::new("jelly.wandering.update");
    let moved: Rc<RefCell<Vec<u64>>> = Rc::default();

    let mut owners: Vec<Responses> = [1u64, 2]
        .into_iter()
        .map(|id| {
            let moved = moved.clone();
            let mut responses = Responses::new();
            responses.set_selective_responses(
                Selector::new(id),
                [(
                    shared.clone(),
                    Response::signal(move || moved.borrow_mut().push(id)),
                )],
            );
            responses.register();
            responses
        })
        .collect();

    shared.raise_for(Selector::new(1));
    assert_eq!(*moved.borrow(), vec![1]);

    shared.raise_for(Selector::new(2));
    assert_eq!(*moved.borrow(), vec![1, 2]);

    owners[0].unregister();
    shared.raise_for(Selector::new(1));
    assert_eq!(*moved.borrow(), vec![1, 2]);
}

#[test]
fn plain_and_selective_sets_are_independent() {
    let ch = Channel::new("mixed");
    let plain = Rc::new(Cell::new(0));
    let selective = Rc::new(Cell::new(0));

    let mut responses = Responses::new();
    responses.set_responses([(ch.clone(), counter(&plain))]);
    responses.set_selective_responses(Selector::new(3), [(ch.clone(), counter(&selective))]);
    responses.register();

    ch.raise();
    ch.raise_for(Selector::new(3));
    ch.raise_for(Selector::new(4));

    assert_eq!(plain.get(), 3);
    assert_eq!(selective.get(), 1);
}

#[test]
fn replacing_while_registered_swaps_subscriptions() {
    let old = Channel::new("old");
    let new = Channel::new("new");
    let hits = Rc::new(Cell::new(0));

    let mut responses = Responses::new();
    responses.set_responses([(old.clone(), counter(&hits))]);
    responses.register();
    responses.set_responses([(new.clone(), counter(&hits))]);

    assert!(responses.is_registered());
    assert_eq!(old.subscriber_count(), 0);
    assert_eq!(new.subscriber_count(), 1);
}

#[test]
fn dropping_a_registered_table_unregisters() {
    let ch = Channel::new("drop");
    let hits = Rc::new(Cell::new(0));
    {
        let mut responses = Responses::new();
        responses.set_responses([(ch.clone(), counter(&hits))]);
        responses.register();
        assert_eq!(ch.subscriber_count(), 1);
    }
    assert_eq!(ch.subscriber_count(), 0);
}

#[test]
fn unregister_from_inside_a_response_is_safe() {
    let ch = Channel::new("self_unregister");
    let hits = Rc::new(Cell::new(0));
    let table: Rc<RefCell<Responses>> = Rc::default();

    let (h, t) = (hits.clone(), Rc::downgrade(&table));
    table.borrow_mut().set_responses([(
        ch.clone(),
        Response::signal(move || {
            h.set(h.get() + 1);
            if let Some(t) = t.upgrade() {
                t.borrow_mut().unregister();
            }
        }),
    )]);
    table.borrow_mut().register();

    ch.raise();
    ch.raise();
    assert_eq!(hits.get(), 1);
    assert_eq!(ch.subscriber_count(), 0);
}
