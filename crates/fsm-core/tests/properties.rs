use std::cell::RefCell;
use std::rc::Rc;

use fsm_core::{Definition, DefinitionBuilder, Instance, Param, Source, StateId, Transition, Trigger};
use fsm_events::{Channel, Responses, Response};
use proptest::collection;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Enter,
    Update,
    Exit,
}

type Log = Rc<RefCell<Vec<(Kind, usize)>>>;

struct Machine {
    definition: Rc<Definition>,
    states: [StateId; 3],
    a: Param<bool>,
    b: Param<bool>,
    x: Param<f32>,
    t: Param<Trigger>,
}

fn machine() -> Machine {
    let mut builder = DefinitionBuilder::new("prop");
    let s0 = builder.state("S0");
    let s1 = builder.state("S1");
    let s2 = builder.state("S2");
    let a = builder.bool_param("a");
    let b = builder.bool_param("b");
    let x = builder.float_param("x");
    let t = builder.trigger_param("t");
    builder
        .initial(s0)
        .transition(Transition::new(s0, s1).when(a.is(true)))
        .transition(Transition::new(s0, s2).when(x.gt(0.5)))
        .transition(Transition::new(s1, s2).when(b.is(true)).when(t.is_set()))
        .transition(Transition::new(Source::Any, s0).when(x.lt(-0.5)))
        .transition(Transition::new(s2, s0).when(a.is(false)))
        .transition(Transition::new(s1, s0).disabled());
    Machine {
        definition: Rc::new(builder.build().unwrap()),
        states: [s0, s1, s2],
        a,
        b,
        x,
        t,
    }
}

/// Independent model of the transition table above: the state the machine must move to.
fn expected_next(state: usize, a: bool, b: bool, x: f32, t: bool) -> Option<usize> {
    match state {
        0 if a => Some(1),
        0 if x > 0.5 => Some(2),
        1 if b && t => Some(2),
        1 | 2 if x < -0.5 => Some(0),
        2 if !a => Some(0),
        _ => None,
    }
}

fn listen(definition: &Definition, states: &[StateId; 3], log: &Log) -> Responses {
    let mut bindings: Vec<(Channel, Response)> = Vec::new();
    for (index, &state) in states.iter().enumerate() {
        let events = definition.events_for(state);
        for (kind, channel) in [
            (Kind::Enter, &events.enter),
            (Kind::Update, &events.update),
            (Kind::Exit, &events.exit),
        ] {
            let log = log.clone();
            bindings.push((
                channel.clone(),
                Response::signal(move || log.borrow_mut().push((kind, index))),
            ));
        }
    }
    let mut responses = Responses::new();
    responses.set_responses(bindings);
    responses.register();
    responses
}

#[derive(Debug, Clone)]
enum Op {
    SetA(bool),
    SetB(bool),
    SetX(f32),
    Fire,
    Tick,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::SetA),
        any::<bool>().prop_map(Op::SetB),
        (-1.0f32..1.0).prop_map(Op::SetX),
        Just(Op::Fire),
        Just(Op::Tick),
        Just(Op::Tick),
    ]
}

proptest! {
    /// Every tick raises exactly one update (for the state current at the start of the tick)
    /// and takes at most one transition, the earliest satisfied one, observed as exit then enter.
    #[test]
    fn ticks_follow_the_transition_table(ops in collection::vec(op(), 1..200)) {
        let m = machine();
        let log: Log = Rc::default();
        let _responses = listen(&m.definition, &m.states, &log);

        let mut fsm = Instance::new(m.definition.clone());
        prop_assert_eq!(log.borrow_mut().drain(..).collect::<Vec<_>>(), vec![(Kind::Enter, 0)]);

        let index_of = |state: StateId| state.index();
        let (mut a, mut b, mut x, mut t) = (false, false, 0.0f32, false);

        for op in ops {
            match op {
                Op::SetA(v) => { a = v; fsm.set_bool(m.a, v).unwrap(); }
                Op::SetB(v) => { b = v; fsm.set_bool(m.b, v).unwrap(); }
                Op::SetX(v) => { x = v; fsm.set_float(m.x, v).unwrap(); }
                Op::Fire => { t = true; fsm.set_trigger(m.t).unwrap(); }
                Op::Tick => {
                    let before = index_of(fsm.current_state());
                    let expected = expected_next(before, a, b, x, t);
                    let step = fsm.update();
                    let events: Vec<_> = log.borrow_mut().drain(..).collect();

                    match expected {
                        Some(to) => {
                            prop_assert_eq!(
                                events,
                                vec![(Kind::Update, before), (Kind::Exit, before), (Kind::Enter, to)]
                            );
                            prop_assert_eq!(step.map(|s| index_of(s.to)), Some(to));
                            // Only the S1 -> S2 transition reads the trigger.
                            if before == 1 && to == 2 {
                                t = false;
                            }
                        }
                        None => {
                            prop_assert_eq!(events, vec![(Kind::Update, before)]);
                            prop_assert!(step.is_none());
                        }
                    }
                    prop_assert_eq!(fsm.get_trigger(m.t).unwrap(), t);
                }
            }
        }
    }

    /// Over any run, enters outnumber exits by exactly one.
    #[test]
    fn enters_balance_exits(ops in collection::vec(op(), 1..200)) {
        let m = machine();
        let log: Log = Rc::default();
        let _responses = listen(&m.definition, &m.states, &log);
        let mut fsm = Instance::new(m.definition.clone());

        for op in ops {
            match op {
                Op::SetA(v) => fsm.set_bool(m.a, v).unwrap(),
                Op::SetB(v) => fsm.set_bool(m.b, v).unwrap(),
                Op::SetX(v) => fsm.set_float(m.x, v).unwrap(),
                Op::Fire => fsm.set_trigger(m.t).unwrap(),
                Op::Tick => { fsm.update(); }
            }
            let events = log.borrow();
            let enters = events.iter().filter(|(k, _)| *k == Kind::Enter).count();
            let exits = events.iter().filter(|(k, _)| *k == Kind::Exit).count();
            prop_assert_eq!(enters, exits + 1);
        }
    }
}
