#[macro_use]
extern crate sparrow_ecs;
extern crate rand;

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sparrow_ecs::prelude::*;

#[derive(Debug, Copy, Clone, Default, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
struct Velocity {
    x: f32,
    y: f32,
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
struct Foo;

#[derive(Debug, Copy, Clone, Default, PartialEq)]
struct Hidden;

declare_component!(Position, Velocity, Foo, Hidden);

#[test]
fn position_and_velocity() {
    let mut world = World::new();
    let e0 = world.create();
    let e1 = world.create();
    let e2 = world.create();

    world.add(e0, Position::default());
    for &e in &[e1, e2] {
        world.add(e, Position::default());
        world.add(e, Velocity { x: 1.0, y: 2.0 });
    }

    let query = world.query::<(Position, Velocity)>();
    assert_eq!(query.len(), 2);

    let entities: HashSet<_> = query.entities().collect();
    assert_eq!(entities, [e1, e2].iter().cloned().collect::<HashSet<_>>());

    for (_, v) in query.iter() {
        assert_eq!(*v, Velocity { x: 1.0, y: 2.0 });
    }

    let combined: HashSet<_> = query.iter_with_entities().map(|(e, _)| e).collect();
    assert_eq!(combined, entities);
}

#[test]
fn incremental_membership() {
    let mut world = World::new();
    let a = world.create();

    let query = world.query::<(Foo,)>().id();
    assert_eq!(world.members(query).len(), 0);

    let log = Rc::new(RefCell::new(EventLog::new()));
    world.set_event_sink(Box::new(log.clone()));

    world.add(a, Foo);
    assert_eq!(world.members(query).len(), 1);
    assert!(world.is_member(a, query));

    // Only the changed entity is re-evaluated, nothing is re-created.
    {
        let log = log.borrow();
        let added: Vec<_> = log
            .events
            .iter()
            .filter(|v| match v {
                Event::QueryMemberAdded { .. } => true,
                _ => false,
            })
            .collect();
        assert_eq!(added, vec![&Event::QueryMemberAdded { query, entity: a }]);
        assert!(!log.events.iter().any(|v| match v {
            Event::QueryCreated(_) => true,
            _ => false,
        }));
    }

    assert_eq!(world.query::<(Foo,)>().id(), query);
    log.borrow_mut().clear();
    world.remove::<Foo>(a);
    assert_eq!(world.members(query).len(), 0);
    assert_eq!(log.borrow().events.len(), 2);
}

#[test]
fn seeded_after_entities() {
    let mut world = World::new();
    let mut expected = HashSet::new();
    for i in 0..32 {
        let e = world.build().with_default::<Position>().finish();
        if i % 3 == 0 {
            world.add_default::<Hidden>(e);
        } else {
            expected.insert(e);
        }
    }

    let query = world.query_filtered::<(Position,), (Hidden,)>();
    assert_eq!(query.entities().collect::<HashSet<_>>(), expected);
    assert_eq!(query.traits().excluded().len(), 1);
}

#[test]
fn destroy_leaves_queries() {
    let mut world = World::new();
    let e = world.build().with_default::<Position>().with_default::<Velocity>().finish();

    let lhs = world.query::<(Position,)>().id();
    let rhs = world.query::<(Position, Velocity)>().id();
    assert!(world.is_member(e, lhs) && world.is_member(e, rhs));

    world.destroy(e);
    assert!(!world.is_member(e, lhs));
    assert!(!world.is_member(e, rhs));
}

#[test]
fn untyped_traits() {
    let mut world = World::new();
    let position = world.register::<Position>();
    let hidden = world.register::<Hidden>();

    let e1 = world.build().with_default::<Position>().finish();
    let e2 = world.build().with_default::<Position>().with(Hidden).finish();

    let id = world.query_traits(QueryTraits::new(vec![position], vec![hidden]));
    assert_eq!(world.members(id).collect::<Vec<_>>(), vec![e1]);
    assert_eq!(world.query_filtered::<(Position,), (Hidden,)>().id(), id);
    assert_eq!(world.traits_of(id).required().len(), 1);

    world.remove::<Hidden>(e2);
    assert!(world.is_member(e2, id));
}

#[test]
fn mutate() {
    let mut world = World::new();
    for i in 0..10 {
        let e = world.build().with_default::<Position>().finish();
        if i < 5 {
            world.add(e, Velocity { x: 1.0, y: -1.0 });
        }
    }

    for _ in 0..3 {
        world
            .query_mut::<(Position, Velocity)>()
            .for_each(|_, (p, v): (&mut Position, &mut Velocity)| {
                p.x += v.x;
                p.y += v.y;
            });
    }

    let moved = world
        .query::<(Position,)>()
        .iter()
        .filter(|(p,)| **p == Position { x: 3.0, y: -3.0 })
        .count();
    assert_eq!(moved, 5);

    let mut visited = 0;
    world
        .query_filtered_mut::<(Position,), (Velocity,)>()
        .for_each(|_, (p,): (&mut Position,)| {
            assert_eq!(*p, Position::default());
            visited += 1;
        });
    assert_eq!(visited, 5);
}

#[test]
fn relatives() {
    let mut world = World::new();
    let root = world.build().with_default::<Position>().finish();
    let a = world.build().with_default::<Position>().finish();
    let b = world.build().with_default::<Position>().finish();
    let hidden = world.create();
    let c = world.build().with_default::<Position>().finish();

    world.add_child(a, root).unwrap();
    world.add_child(b, a).unwrap();
    world.add_child(hidden, root).unwrap();
    world.add_child(c, hidden).unwrap();

    let query = world.query::<(Position,)>();
    let pairs: Vec<_> = query.relatives(root).collect();

    // Deepest edges first, subtrees below non-members are never entered.
    assert_eq!(pairs, vec![(a, b), (root, a)]);
    assert!(pairs.iter().all(|&(_, child)| child != c));
    assert_eq!(query.relatives(b).count(), 0);
}

#[test]
fn consistency() {
    let mut generator = StdRng::seed_from_u64(42);
    let mut world = World::new();

    let queries = vec![
        world.query::<(Position,)>().id(),
        world.query::<(Position, Velocity)>().id(),
        world.query_filtered::<(Position,), (Hidden,)>().id(),
        world.query_filtered::<(Foo,), (Position, Velocity)>().id(),
    ];

    let mut alive = Vec::new();
    for step in 0..2000 {
        if alive.is_empty() || generator.gen_range(0..8) == 0 {
            alive.push(world.create());
        }

        let e = alive[generator.gen_range(0..alive.len())];
        match generator.gen_range(0..9) {
            0 if !world.has::<Position>(e) => {
                world.add_default::<Position>(e);
            }
            1 if !world.has::<Velocity>(e) => {
                world.add_default::<Velocity>(e);
            }
            2 if !world.has::<Foo>(e) => {
                world.add_default::<Foo>(e);
            }
            3 if !world.has::<Hidden>(e) => {
                world.add_default::<Hidden>(e);
            }
            4 => {
                world.remove::<Position>(e);
            }
            5 => {
                world.remove::<Velocity>(e);
            }
            6 => {
                world.remove::<Hidden>(e);
            }
            7 => {
                world.destroy(e);
                alive.retain(|v| *v != e);
            }
            _ => {}
        }

        // A query created midway is seeded from the live entities.
        if step == 1000 {
            world.query_filtered::<(Velocity,), (Foo,)>();
        }

        for id in (0..world.num_queries() as u32).map(QueryId::new) {
            for &v in &alive {
                let matched = world.traits_of(id).is_match(world.signature(v).unwrap());
                assert_eq!(world.is_member(v, id), matched);
            }

            assert!(world.members(id).all(|v| world.is_alive(v)));
        }
    }

    assert_eq!(world.num_queries(), queries.len() + 1);
}
