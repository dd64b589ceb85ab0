#![cfg(feature = "core")]

use std::cell::Cell;
use std::rc::Rc;

use fsmkit::prelude::*;

#[test]
fn prelude_covers_a_full_wiring() {
    let mut b = DefinitionBuilder::new("door");
    let closed = b.state("Closed");
    let open = b.state("Open");
    let pushed = b.trigger_param("pushed");
    b.initial(closed)
        .transition(Transition::new(closed, open).when(pushed.is_set()))
        .transition(Transition::new(open, Target::Initial).when(pushed.is_set()));
    let definition = Rc::new(b.build().unwrap());

    let opened = Rc::new(Cell::new(0));
    let mut responses = Responses::new();
    let o = opened.clone();
    responses.set_selective_responses(
        Selector::new(5),
        [(
            definition.events_for(open).enter.clone(),
            Response::signal(move || o.set(o.get() + 1)),
        )],
    );
    responses.register();

    let mut door = Instance::with_options(definition, InstanceOptions::default().selector(5u64));
    door.set_trigger(pushed).unwrap();
    door.update();
    door.set_trigger(pushed).unwrap();
    door.update();
    door.set_trigger(pushed).unwrap();
    door.update();

    assert_eq!(opened.get(), 2);
    assert_eq!(door.current_state(), open);
}

#[cfg(feature = "serde")]
#[test]
fn trace_logs_serialize() {
    let log = fsmkit::tools::TraceLog {
        events: vec![fsmkit::tools::TraceEvent::enter(3, 1).with_selector(Some(2))],
    };
    let json = serde_json::to_string(&log).unwrap();
    let back: fsmkit::tools::TraceLog = serde_json::from_str(&json).unwrap();
    assert_eq!(back, log);
}
