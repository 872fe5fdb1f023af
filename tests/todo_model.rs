// The todo-list scenario: a list-valued stored property with two computed
// counters, mutated by replacing the whole list (identity change detection).

use pretty_assertions::assert_eq;
use reactive_model::{ReactiveObject, Schema, Value};

fn todo(text: &str, done: bool) -> Value {
    Value::record([
        ("text".to_owned(), Value::from(text)),
        ("done".to_owned(), Value::from(done)),
    ])
}

fn todo_schema() -> std::rc::Rc<Schema> {
    Schema::builder()
        .stored("todos", Value::list([]))
        .computed("totalCount", &["todos"], |v| Value::from(v.list("todos").len()))
        .computed("completedCount", &["todos"], |v| {
            Value::from(
                v.list("todos")
                    .iter()
                    .filter(|t| {
                        t.as_record()
                            .and_then(|r| r.get("done"))
                            .and_then(Value::as_bool)
                            .unwrap_or(false)
                    })
                    .count(),
            )
        })
        .build()
        .unwrap()
}

fn add_todo(model: &ReactiveObject, text: &str) {
    let mut items: Vec<Value> = model
        .get("todos")
        .unwrap()
        .as_list()
        .unwrap()
        .iter()
        .cloned()
        .collect();
    items.push(todo(text, false));
    model.set("todos", Value::list(items)).unwrap();
}

fn toggle_todo(model: &ReactiveObject, index: usize) {
    let items: Vec<Value> = model
        .get("todos")
        .unwrap()
        .as_list()
        .unwrap()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if i != index {
                return item.clone();
            }
            let record = item.as_record().unwrap();
            let text = record.get("text").and_then(Value::as_str).unwrap_or("");
            let done = record.get("done").and_then(Value::as_bool).unwrap_or(false);
            todo(text, !done)
        })
        .collect();
    model.set("todos", Value::list(items)).unwrap();
}

#[test]
fn counters_track_the_list() {
    let model = ReactiveObject::new(todo_schema()).unwrap();
    assert_eq!(model.get("totalCount").unwrap().as_int(), Some(0));
    assert_eq!(model.get("completedCount").unwrap().as_int(), Some(0));

    add_todo(&model, "learn the runtime");
    add_todo(&model, "build the app");
    assert_eq!(model.get("totalCount").unwrap().as_int(), Some(2));
    assert_eq!(model.get("completedCount").unwrap().as_int(), Some(0));

    toggle_todo(&model, 0);
    assert_eq!(model.get("totalCount").unwrap().as_int(), Some(2));
    assert_eq!(model.get("completedCount").unwrap().as_int(), Some(1));

    toggle_todo(&model, 0);
    assert_eq!(model.get("completedCount").unwrap().as_int(), Some(0));
}

#[test]
fn rebinding_the_same_list_is_a_no_op() {
    let model = ReactiveObject::new(todo_schema()).unwrap();
    add_todo(&model, "only one");
    let history_before = model.history_len();

    // The exact same allocation: identity-equal, no write happens
    let same = model.get("todos").unwrap();
    assert!(!model.set("todos", same).unwrap());
    assert_eq!(model.history_len(), history_before);
}

#[test]
fn undo_restores_the_previous_list() {
    let model = ReactiveObject::new(todo_schema()).unwrap();
    add_todo(&model, "first");
    add_todo(&model, "second");
    toggle_todo(&model, 1);
    assert_eq!(model.get("completedCount").unwrap().as_int(), Some(1));

    assert!(model.undo().unwrap());
    assert_eq!(model.get("completedCount").unwrap().as_int(), Some(0));
    assert_eq!(model.get("totalCount").unwrap().as_int(), Some(2));

    assert!(model.undo().unwrap());
    assert_eq!(model.get("totalCount").unwrap().as_int(), Some(1));

    assert!(model.redo().unwrap());
    assert_eq!(model.get("totalCount").unwrap().as_int(), Some(2));
}

#[test]
fn bulk_load_under_freeze_settles_once() {
    let model = ReactiveObject::new(todo_schema()).unwrap();

    model
        .batch(|| {
            add_todo(&model, "a");
            add_todo(&model, "b");
            add_todo(&model, "c");
        })
        .unwrap();

    assert_eq!(model.get("totalCount").unwrap().as_int(), Some(3));
}
