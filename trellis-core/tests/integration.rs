//! Integration Tests for the Reactive Graph
//!
//! These tests drive wrapping, writes and subscriptions together through the
//! public API only.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;

use trellis_core::{AllowList, CollectingSink, Graph, Result, Tracker, Unsubscribe, Value};

/// Build wrapped state from JSON.
fn state(graph: &mut Graph, value: serde_json::Value) -> Value {
    let raw = graph.insert_json(&value);
    graph.wrap(&raw, &AllowList::new())
}

/// Subscribe to `path` from `root`, counting notifications into `count`.
fn watch(graph: &mut Graph, root: &Value, path: &[&str], count: &Rc<Cell<u32>>) -> Unsubscribe {
    let root = root.clone();
    let path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
    let count = Rc::clone(count);
    graph
        .subscribe(
            move |t: &Tracker<'_>| t.path(&root, path.iter().map(String::as_str)),
            move |_| {
                count.set(count.get() + 1);
                Ok(())
            },
        )
        .unwrap()
}

/// Wrapping twice returns the same node and does not rewrap children.
#[test]
fn wrap_is_idempotent() {
    let mut graph = Graph::new();
    let raw = graph.insert_json(&json!({"a": {"b": 1}}));

    let first = graph.wrap(&raw, &AllowList::new());
    let second = graph.wrap(&first, &AllowList::new());

    assert_eq!(first, second);
    assert_eq!(first, raw);
    let a = graph.get(&first, "a").unwrap();
    assert_eq!(graph.parents(&a), vec![first]);
}

/// Writing a sibling never notifies; writing the watched edge notifies once.
#[test]
fn notifications_are_precise() {
    let mut graph = Graph::new();
    let root = state(&mut graph, json!({"a": {"b": {"c": 1}, "d": 1}}));
    let count = Rc::new(Cell::new(0));
    let _sub = watch(&mut graph, &root, &["a", "b", "c"], &count);

    let a = graph.get(&root, "a").unwrap();
    graph.set(&a, "d", Value::from(2)).unwrap();
    assert_eq!(count.get(), 0);

    let b = graph.get(&a, "b").unwrap();
    graph.set(&b, "c", Value::from(2)).unwrap();
    assert_eq!(count.get(), 1);

    graph.set(&b, "c", Value::from(2)).unwrap();
    assert_eq!(count.get(), 1);
}

/// A self-referencing structure still terminates and notifies once.
#[test]
fn cycles_terminate() {
    let mut graph = Graph::new();
    let x = state(&mut graph, json!({"n": 0}));
    graph.set(&x, "y", x.clone()).unwrap();

    let count = Rc::new(Cell::new(0));
    let _sub = watch(&mut graph, &x, &["y", "y", "n"], &count);

    graph.set(&x, "n", Value::from(1)).unwrap();
    assert_eq!(count.get(), 1);

    let again = graph.get_path(&x, ["y", "y", "y", "n"]).unwrap();
    assert_eq!(again, Value::from(1));
}

/// Replacing an object with a sequence notifies the property and every
/// descendant edge, descendants first.
#[test]
fn kind_change_notifies_descendants() {
    let mut graph = Graph::new();
    let root = state(&mut graph, json!({"a": {"x": 1, "y": {"z": 2}}}));
    let log = Rc::new(RefCell::new(Vec::new()));

    let mut subs = Vec::new();
    for (name, path) in [("a", vec!["a"]), ("x", vec!["a", "x"]), ("z", vec!["a", "y", "z"])] {
        let root = root.clone();
        let log = Rc::clone(&log);
        subs.push(
            graph
                .subscribe(
                    move |t| t.path(&root, path.iter().copied()),
                    move |_| {
                        log.borrow_mut().push(name);
                        Ok(())
                    },
                )
                .unwrap(),
        );
    }

    let list = graph.insert_json(&json!([1, 2]));
    graph.set(&root, "a", list).unwrap();

    let log = log.borrow();
    assert_eq!(log.len(), 3);
    assert!(log.contains(&"x"));
    assert!(log.contains(&"z"));
    assert_eq!(log.last(), Some(&"a"));
}

/// Optional paths notify on arrival and stay quiet for equal replacements.
#[test]
fn optional_path_arrival() {
    let mut graph = Graph::new();
    let a = state(&mut graph, json!({}));
    let count = Rc::new(Cell::new(0));
    let _sub = watch(&mut graph, &a, &["b", "c"], &count);

    let b = graph.object();
    graph.set(&a, "b", b).unwrap();
    assert_eq!(count.get(), 1);

    let b = graph.get(&a, "b").unwrap();
    let c = graph.insert_json(&json!({"x": 1, "y": 2}));
    graph.set(&b, "c", c).unwrap();
    assert_eq!(count.get(), 2);

    let same = graph.insert_json(&json!({"c": {"x": 1, "y": 2}}));
    graph.set(&a, "b", same).unwrap();
    assert_eq!(count.get(), 2);

    let changed = graph.insert_json(&json!({"c": {"x": 1, "y": 3}}));
    graph.set(&a, "b", changed).unwrap();
    assert_eq!(count.get(), 3);
}

/// Several subscriptions on nested optional paths, through replacements,
/// deletes and unsubscribes.
#[test]
fn nested_subscriptions() {
    let mut graph = Graph::new();
    let a = state(&mut graph, json!({}));
    let count = Rc::new(Cell::new(0));

    let sub = watch(&mut graph, &a, &["b"], &count);
    let b = graph.object();
    graph.set(&a, "b", b).unwrap();
    assert!(graph.delete(&a, "b").unwrap());
    sub.unsubscribe(&mut graph);

    let b = graph.object();
    graph.set(&a, "b", b).unwrap();
    graph.delete(&a, "b").unwrap();
    assert_eq!(count.get(), 2);

    let sub_c = watch(&mut graph, &a, &["b", "c"], &count);
    let sub_x = watch(&mut graph, &a, &["b", "c", "x"], &count);
    let sub_f = watch(&mut graph, &a, &["b", "c", "z", "f"], &count);

    // `c` goes from unresolved to absent: that counts as found.
    let b = graph.object();
    graph.set(&a, "b", b).unwrap();
    let b = graph.object();
    graph.set(&b, "c", Value::Absent).unwrap();
    graph.set(&a, "b", b).unwrap();

    let b = graph.get(&a, "b").unwrap();
    let c = graph.insert_json(&json!({"x": 1, "y": 2}));
    graph.set(&b, "c", c).unwrap();
    assert_eq!(count.get(), 5);

    let same = graph.insert_json(&json!({"c": {"x": 1, "y": 2}}));
    graph.set(&a, "b", same).unwrap();
    assert_eq!(count.get(), 5);

    let changed = graph.insert_json(&json!({"c": {"x": 1, "y": 3}}));
    graph.set(&a, "b", changed).unwrap();
    assert_eq!(count.get(), 6);

    let c = graph.get_path(&a, ["b", "c"]).unwrap();
    let z = graph.insert_json(&json!({"f": "hello"}));
    graph.set(&c, "z", z).unwrap();
    let z = graph.get(&c, "z").unwrap();
    graph.set(&z, "f", Value::from("hell")).unwrap();
    assert_eq!(count.get(), 10);

    let replaced = graph.insert_json(&json!({"c": {"x": 2, "y": 3, "z": {"f": "heaven"}}}));
    graph.set(&a, "b", replaced).unwrap();
    assert_eq!(count.get(), 13);

    sub_c.unsubscribe(&mut graph);
    sub_x.unsubscribe(&mut graph);
    sub_f.unsubscribe(&mut graph);

    let left = graph.insert_json(&json!({"c": {"x": 22, "y": 3, "z": {"f": "left behind"}}}));
    graph.set(&a, "b", left).unwrap();
    assert_eq!(count.get(), 13);
    assert_eq!(graph.subscription_count(), 0);
}

/// Changes reach subscribers through cycles and through every path that
/// holds a shared node.
#[test]
fn cyclic_and_shared_references() {
    let sink = CollectingSink::new();
    let mut graph = Graph::new().with_sink(Rc::new(sink.clone()));
    let a = state(&mut graph, json!({"b": 1, "c": {"d": 2, "e": {"f": {}}}}));
    let c = graph.get(&a, "c").unwrap();
    let e = graph.get(&c, "e").unwrap();
    graph.set(&e, "f", c.clone()).unwrap();

    let count = Rc::new(Cell::new(0));
    let sub = watch(&mut graph, &a, &["c", "e"], &count);

    graph.set(&c, "d", Value::from(3)).unwrap();
    assert_eq!(count.get(), 1);

    graph.set(&e, "f", a.clone()).unwrap();
    count.set(0);
    graph.set(&a, "b", Value::from(33)).unwrap();
    assert_eq!(count.get(), 1);
    sub.unsubscribe(&mut graph);

    let b = state(&mut graph, json!({"b": {"c": {"a": 1}}, "d": {"e": {"a": 1}}}));
    let shared = graph.get_path(&b, ["d", "e"]).unwrap();
    let bb = graph.get(&b, "b").unwrap();
    graph.set(&bb, "c", shared.clone()).unwrap();

    count.set(0);
    let sub = watch(&mut graph, &b, &["b", "c"], &count);
    graph.set(&shared, "a", Value::from(2)).unwrap();
    assert_eq!(count.get(), 1);
    sub.unsubscribe(&mut graph);

    assert!(sink.is_empty());
}

/// A handler that writes the edge it watches is reported, not looped.
#[test]
fn self_retrigger_is_reported() {
    let sink = CollectingSink::new();
    let mut graph = Graph::new().with_sink(Rc::new(sink.clone()));
    let b = state(&mut graph, json!({"b": {"c": {"a": 1}}}));
    let c = graph.get_path(&b, ["b", "c"]).unwrap();

    let runs = Rc::new(Cell::new(0));
    let getter_root = b.clone();
    let target = c.clone();
    let seen = Rc::clone(&runs);
    let sub = graph
        .subscribe(
            move |t| t.path(&getter_root, ["b", "c", "a"]),
            move |graph| {
                seen.set(seen.get() + 1);
                let n = graph.get(&target, "a")?.as_f64().unwrap_or(0.0);
                graph.set(&target, "a", Value::from(n + 1.0))
            },
        )
        .unwrap();

    graph.set(&c, "a", Value::from(2)).unwrap();

    assert_eq!(runs.get(), 1);
    assert_eq!(sink.len(), 1);
    assert!(sink.messages()[0].contains("infinite loop"));
    assert_eq!(graph.get(&c, "a").unwrap(), Value::from(3));

    sub.unsubscribe(&mut graph);
}

/// Aborting a reentrant handler leaves the other handlers of the batch
/// running.
#[test]
fn reentrant_handler_does_not_stop_siblings() {
    let sink = CollectingSink::new();
    let mut graph = Graph::new().with_sink(Rc::new(sink.clone()));
    let root = state(&mut graph, json!({"p": 0}));

    let writer_runs = Rc::new(Cell::new(0));
    let getter_root = root.clone();
    let target = root.clone();
    let seen = Rc::clone(&writer_runs);
    let _writer = graph
        .subscribe(
            move |t| t.get(&getter_root, "p"),
            move |graph| {
                seen.set(seen.get() + 1);
                let n = graph.get(&target, "p")?.as_f64().unwrap_or(0.0);
                graph.set(&target, "p", Value::from(n + 1.0))
            },
        )
        .unwrap();
    let sibling = Rc::new(Cell::new(0));
    let _sibling = watch(&mut graph, &root, &["p"], &sibling);

    graph.set(&root, "p", Value::from(10)).unwrap();

    // The outer batch and the writer's nested write each reach the sibling.
    assert_eq!(writer_runs.get(), 1);
    assert_eq!(sibling.get(), 2);
    assert_eq!(graph.get(&root, "p").unwrap(), Value::from(11));
    assert_eq!(sink.len(), 1);
    assert!(sink.messages()[0].contains("infinite loop"));
}

/// After unsubscribing, the callback never runs again.
#[test]
fn unsubscribe_is_final() {
    let mut graph = Graph::new();
    let root = state(&mut graph, json!({"p": 0}));
    let count = Rc::new(Cell::new(0));

    let sub = watch(&mut graph, &root, &["p"], &count);
    graph.set(&root, "p", Value::from(1)).unwrap();
    sub.unsubscribe(&mut graph);

    for n in 2..5 {
        graph.set(&root, "p", Value::from(n)).unwrap();
    }
    graph.delete(&root, "p").unwrap();
    assert_eq!(count.get(), 1);
}

/// A node held under two paths notifies subscribers of both.
#[test]
fn shared_node_notifies_every_path() {
    let mut graph = Graph::new();
    let shared = graph.insert_json(&json!({"v": 1}));
    let root = graph.object();
    graph.set(&root, "left", shared.clone()).unwrap();
    graph.set(&root, "right", shared.clone()).unwrap();
    let root = graph.wrap(&root, &AllowList::new());

    let through_right = Rc::new(Cell::new(0));
    let whole_left = Rc::new(Cell::new(0));
    let _a = watch(&mut graph, &root, &["right", "v"], &through_right);
    let _b = watch(&mut graph, &root, &["left"], &whole_left);

    let left = graph.get(&root, "left").unwrap();
    graph.set(&left, "v", Value::from(2)).unwrap();

    assert_eq!(through_right.get(), 1);
    assert_eq!(whole_left.get(), 1);
}

/// Deleting a watched key notifies like writing an absent value.
#[test]
fn delete_notifies() {
    let mut graph = Graph::new();
    let root = state(&mut graph, json!({"a": {"b": 1}}));
    let count = Rc::new(Cell::new(0));
    let _sub = watch(&mut graph, &root, &["a", "b"], &count);

    assert!(graph.delete(&root, "a").unwrap());
    assert_eq!(count.get(), 1);
    assert!(graph.keys(&root).unwrap().is_empty());

    // Still unresolved: no notification.
    graph.set(&root, "a", Value::from(5)).unwrap();
    assert_eq!(count.get(), 1);
}

/// A failing or panicking handler does not stop the rest of the batch.
#[test]
fn handler_failures_do_not_abort_the_batch() {
    let sink = CollectingSink::new();
    let mut graph = Graph::new().with_sink(Rc::new(sink.clone()));
    let root = state(&mut graph, json!({"n": 0}));

    let failing_root = root.clone();
    let _failing = graph
        .subscribe(
            move |t| t.get(&failing_root, "n"),
            |_| Err(trellis_core::Error::msg("handler failed")),
        )
        .unwrap();
    let panicking_root = root.clone();
    let _panicking = graph
        .subscribe(
            move |t| t.get(&panicking_root, "n"),
            |_| -> Result<()> { panic!("handler panicked") },
        )
        .unwrap();
    let count = Rc::new(Cell::new(0));
    let _counting = watch(&mut graph, &root, &["n"], &count);

    graph.set(&root, "n", Value::from(1)).unwrap();

    assert_eq!(count.get(), 1);
    assert_eq!(sink.len(), 2);
    assert!(sink.messages()[0].contains("handler failed"));
    assert!(sink.messages()[1].contains("handler panicked"));
    assert_eq!(graph.get(&root, "n").unwrap(), Value::from(1));
}

/// Handlers may write other state; those writes notify in turn.
#[test]
fn handlers_can_write_other_state() {
    let mut graph = Graph::new();
    let root = state(&mut graph, json!({"input": 1, "output": 0}));

    let source = root.clone();
    let sink_root = root.clone();
    let _derive = graph
        .subscribe(
            move |t| t.get(&source, "input"),
            move |graph| {
                let n = graph.get(&sink_root, "input")?.as_f64().unwrap_or(0.0);
                graph.set(&sink_root, "output", Value::from(n * 10.0))
            },
        )
        .unwrap();
    let outputs = Rc::new(Cell::new(0));
    let _observe = watch(&mut graph, &root, &["output"], &outputs);

    graph.set(&root, "input", Value::from(4)).unwrap();

    assert_eq!(graph.get(&root, "output").unwrap(), Value::from(40));
    assert_eq!(outputs.get(), 1);
}

/// Instances of named classes are opaque unless allow-listed.
#[test]
fn allow_list_controls_wrapping() {
    let mut graph = Graph::new();
    let root = graph.object();
    let point = graph.instance("Point");
    graph.set(&point, "x", Value::from(1)).unwrap();
    graph.set(&root, "point", point.clone()).unwrap();

    let opaque = graph.wrap(&root, &AllowList::new());
    assert!(!graph.is_reactive(&point));

    let count = Rc::new(Cell::new(0));
    let _sub = watch(&mut graph, &opaque, &["point", "x"], &count);
    graph.set(&point, "x", Value::from(2)).unwrap();
    assert_eq!(count.get(), 0);

    let other = graph.object();
    let listed = graph.instance("Point");
    graph.set(&other, "point", listed.clone()).unwrap();
    graph.wrap(&other, &AllowList::new().with("Point"));
    assert!(graph.is_reactive(&listed));
}
