#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::sync::OnceLock;

use packnorm_api::*;
use packnorm_crm::{Roster, User};
use serde_json::json;

fn user_node(email: &str, id: i32) -> Node {
    Node::new(json!({ "email": email, "password": "secret", "id": id }))
}

fn roster(users: Vec<Node>) -> Roster {
    Roster {
        name: "crm".to_string(),
        users: Container::staged(Capability::Sequence, users),
        ..Default::default()
    }
}

#[test]
fn sequence_of_three_users_keeps_order() {
    let r = roster(vec![user_node("a@x", 1), user_node("b@x", 2), user_node("c@x", 3)]);
    let r = normalize(r).unwrap();
    assert_eq!(r.users.shape(), Shape::Concrete(Kind::Vec));
    let users: Vec<&User> = r.users.values().collect();
    assert_eq!(
        users,
        vec![&User::new("a@x", "secret", 1), &User::new("b@x", "secret", 2), &User::new("c@x", "secret", 3)]
    );
}

#[test]
fn converted_elements_match_node_conversion() {
    let nodes = vec![user_node("a@x", 1), Node::new(json!({ "1": "b@x", "3": 2 }))];
    let expected: Vec<User> = nodes.iter().map(|n| n.convert_to::<User>().unwrap()).collect();
    let r = normalize(roster(nodes)).unwrap();
    assert_eq!(r.users.values().cloned().collect::<Vec<_>>(), expected);
}

#[test]
fn set_marker_becomes_default_hash_set() {
    let mut r = roster(Vec::new());
    r.admins = Some(Container::staged(Capability::Set, vec![user_node("root@x", 0), user_node("ops@x", 9)]));
    r.tags = Container::staged(Capability::Set, vec![Node::new(json!("blue")), Node::new(json!("green"))]);
    let r = normalize(r).unwrap();

    let admins = r.admins.as_ref().unwrap();
    assert_eq!(admins.shape(), Shape::Concrete(Kind::HashSet));
    let got: HashSet<User> = admins.values().cloned().collect();
    assert_eq!(got, HashSet::from([User::new("root@x", "secret", 0), User::new("ops@x", "secret", 9)]));
    assert_eq!(r.tags.shape(), Shape::Concrete(Kind::HashSet));
    assert_eq!(r.tags.len(), 2);
}

#[test]
fn plain_elements_pass_through_unchanged() {
    let mut r = roster(Vec::new());
    r.users = Container::Vec(vec![
        Item::Value(User::new("keep@x", "k", 5)),
        Item::Node(user_node("new@x", 6)),
    ]);
    r.labels = Container::Vec(vec![Item::Value("z".to_string()), Item::Value("a".to_string())]);
    let mut report_target = r;
    let report = normalize_in_place(&mut report_target).unwrap();
    assert_eq!(report.elements_converted, 1);
    assert_eq!(report.elements_passed_through, 3);

    let emails: Vec<&str> = report_target.users.values().filter_map(|u| u.email.as_deref()).collect();
    assert_eq!(emails, vec!["keep@x", "new@x"]);
    assert_eq!(report_target.labels.values().collect::<Vec<_>>(), vec!["z", "a"]);
}

#[test]
fn element_count_is_preserved_per_field() {
    let mut r = roster(vec![user_node("a@x", 1), user_node("b@x", 2)]);
    r.pending = Container::staged(Capability::BoundedQueue, (0..5).map(|i| Node::new(json!(i))));
    let before = (r.users.len(), r.pending.len(), r.tags.len());
    let r = normalize(r).unwrap();
    assert_eq!((r.users.len(), r.pending.len(), r.tags.len()), before);
    assert_eq!(r.pending.bound(), Some(5));
    assert_eq!(r.pending.values().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn second_pass_is_a_no_op() {
    let r = normalize(roster(vec![user_node("a@x", 1)])).unwrap();
    let first: Vec<User> = r.users.values().cloned().collect();
    let mut r = r;
    let report = normalize_in_place(&mut r).unwrap();
    assert_eq!(report.elements_converted, 0);
    assert_eq!(r.users.values().cloned().collect::<Vec<_>>(), first);
    assert_eq!(Roster::VERSION, 1);
}

#[test]
fn unresolved_element_type_stops_the_pass() {
    let mut r = roster(vec![user_node("a@x", 1)]);
    r.labels = Container::staged(Capability::Sequence, vec![Node::new(json!({ "odd": true }))]);
    r.pending = Container::staged(Capability::BoundedQueue, vec![Node::new(json!(1))]);

    // pending sits before labels in the table, users before both
    let mut target = r;
    let err = normalize_in_place(&mut target).unwrap_err();
    assert!(matches!(err, Error::UnresolvedElementType { field: "labels", index: 0 }));
    assert!(target.users.is_normalized());
    assert!(target.labels.node_count() == 1);
}

struct Envelope {
    first: Container<u32>,
    erased: Container<u32>,
    last: Container<u32>,
}

impl Record for Envelope {
    fn fields() -> &'static [FieldDescriptor<Self>] {
        static FIELDS: OnceLock<Vec<FieldDescriptor<Envelope>>> = OnceLock::new();
        FIELDS.get_or_init(|| {
            FieldTable::<Envelope>::new()
                .field("first", |e| FieldRef::from(&mut e.first))
                .erased("erased", |e| FieldRef::from(&mut e.erased))
                .field("last", |e| FieldRef::from(&mut e.last))
                .build()
        })
    }
}

fn ints(values: &[u32]) -> Container<u32> {
    Container::staged(Capability::Sequence, values.iter().map(|v| Node::new(json!(v))))
}

#[test]
fn later_fields_are_not_processed_after_a_failure() {
    let mut e = Envelope { first: ints(&[1]), erased: ints(&[2]), last: ints(&[3]) };
    let err = Normalizer::new().run(&mut e).unwrap_err();
    assert!(matches!(err, Error::UnresolvedElementType { field: "erased", .. }));
    assert!(e.first.is_normalized());
    assert_eq!(e.last.shape(), Shape::Marker(Capability::Sequence));
    assert_eq!(e.last.node_count(), 1);
}

struct Guarded {
    items: Container<u32>,
}

impl Record for Guarded {
    fn fields() -> &'static [FieldDescriptor<Self>] {
        static FIELDS: OnceLock<Vec<FieldDescriptor<Guarded>>> = OnceLock::new();
        FIELDS.get_or_init(|| {
            FieldTable::<Guarded>::new()
                .hidden("token")
                .field("items", |g| FieldRef::from(&mut g.items))
                .build()
        })
    }
}

#[test]
fn inaccessible_field_fails_the_call() {
    let mut g = Guarded { items: ints(&[1, 2]) };
    let err = normalize_in_place(&mut g).unwrap_err();
    assert!(matches!(err, Error::FieldAccessDenied { field: "token", .. }));
    assert_eq!(g.items.node_count(), 2);
}

struct Scalars {
    name: String,
    count: u64,
}

impl Scalars {
    const MAX: u64 = 64;
}

impl Record for Scalars {
    fn fields() -> &'static [FieldDescriptor<Self>] {
        static FIELDS: OnceLock<Vec<FieldDescriptor<Scalars>>> = OnceLock::new();
        FIELDS.get_or_init(|| FieldTable::<Scalars>::new().constant("MAX").scalar("name").scalar("count").build())
    }
}

#[test]
fn records_without_containers_come_back_unchanged() {
    let s = normalize(Scalars { name: "n".to_string(), count: 4 }).unwrap();
    assert_eq!((s.name.as_str(), s.count), ("n", 4));
    assert!(s.count <= Scalars::MAX);
    assert!(Scalars::fields()[0].is_constant());
    assert_eq!(Scalars::fields()[0].name(), "MAX");

    let mut leaf = "plain".to_string();
    let report = normalize_in_place(&mut leaf).unwrap();
    assert!(report.skipped_leaf);
    assert_eq!(report.fields_visited, 0);
    assert_eq!(normalize(42u32).unwrap(), 42);
}

#[test]
fn deque_capability_needs_a_policy_entry() {
    let mut e = Envelope { first: Container::staged(Capability::Deque, vec![Node::new(json!(1))]), erased: Container::default(), last: Container::default() };
    let err = normalize_in_place(&mut e).unwrap_err();
    assert!(matches!(err, Error::ContainerKindUnsupported { field: "first", shape: Shape::Marker(Capability::Deque) }));

    let n = Normalizer::with_policy(Policy::default().with_entry(Capability::Deque, Kind::VecDeque));
    let report = n.run(&mut e).unwrap();
    assert_eq!(e.first.shape(), Shape::Concrete(Kind::VecDeque));
    assert_eq!(report.fields_remapped, 3);
}

#[test]
fn conversion_failure_surfaces_node_error() {
    let r = roster(vec![user_node("a@x", 1), Node::new(json!("not a user"))]);
    let err = normalize(r).unwrap_err();
    assert!(matches!(err, Error::NodeConversionFailed { field: Some("users"), index: Some(1), wire_type: "str", .. }));
}

#[test]
fn set_keeps_one_of_nodes_that_convert_to_equal_users() {
    let mut r = roster(Vec::new());
    // wire ids and field names decode to the same user
    r.admins = Some(Container::staged(
        Capability::Set,
        vec![user_node("a@x", 1), Node::new(json!({ "1": "a@x", "2": "secret", "3": 1 })), user_node("b@x", 2)],
    ));
    let report = normalize_in_place(&mut r).unwrap();

    let admins = r.admins.as_ref().unwrap();
    assert_eq!(admins.shape(), Shape::Concrete(Kind::HashSet));
    assert_eq!(admins.len(), 2);
    assert_eq!(report.elements_converted, 3);
    assert_eq!(report.elements_collapsed, 1);
}

#[test]
fn sequences_never_collapse_equal_users() {
    let mut r = roster(vec![user_node("a@x", 1), user_node("a@x", 1)]);
    let report = normalize_in_place(&mut r).unwrap();
    assert_eq!(r.users.len(), 2);
    assert_eq!(report.elements_collapsed, 0);
}
