use bytes::Bytes;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

use super::*;
use crate::attr::Variant;
use crate::producer::Produced;

fn constant(value: &'static [u8]) -> Producer<()> {
	Producer::new(move |_: &mut (), _: Variant| Ok(Produced::Value(Some(Bytes::from_static(value)))))
}

fn targets(linked: &Linked<()>) -> Vec<Vec<&str>> {
	linked
		.values()
		.map(|group| group.keys().map(Attr::as_str).collect())
		.collect()
}

#[test]
fn link_allocates_and_reuses_components() {
	let mut schema = Schema::new();
	let first = schema.link("a", "b", None, false, constant(b"1"));
	let shared = schema.link("c", "b", Some(first), false, constant(b"2"));
	let second = schema.link("a", "d", None, false, constant(b"3"));

	assert_eq!(shared, first);
	assert_ne!(second, first);
	assert_eq!(schema.edges_from("a").map(IndexMap::len), Some(2));
	assert!(schema.edges_from("b").is_none());
}

#[test]
fn seed_links_are_listed_by_target() {
	let mut schema = Schema::new();
	let component = schema.component();
	schema.link("encoded", "plain", Some(component), true, constant(b"p"));
	schema.link("plain", "encoded", Some(component), false, constant(b"e"));

	let seeds: Vec<&str> = schema.seeds().map(|(attr, _)| attr.as_str()).collect();
	assert_eq!(seeds, vec!["plain"]);
}

#[test]
fn bidirectional_component_does_not_reenter_source() {
	let mut schema = Schema::new();
	let component = schema.component();
	schema.link("encoded", "plain", Some(component), true, constant(b"p"));
	schema.link("plain", "encoded", Some(component), false, constant(b"e"));

	let linked = schema.linked_attributes("plain");
	assert_eq!(targets(&linked), vec![vec!["encoded"]]);
}

#[test]
fn traversal_follows_transitive_hops_in_order() {
	let mut schema = Schema::new();
	let c1 = schema.link("salt", "encoded", None, false, constant(b"e"));
	let c2 = schema.link("encoded", "digest", None, false, constant(b"d"));
	schema.link("digest", "index", Some(c2), false, constant(b"i"));

	let linked = schema.linked_attributes("salt");
	assert_eq!(linked.keys().copied().collect::<Vec<_>>(), vec![c1, c2]);
	assert_eq!(targets(&linked), vec![vec!["encoded"], vec!["digest"]]);
}

#[test]
fn later_frontier_edge_overrides_producer_for_same_target() {
	let mut schema = Schema::new();
	let c = schema.component();
	schema.link("root", "x", None, false, constant(b"x"));
	schema.link("root", "y", None, false, constant(b"y"));
	let from_x = constant(b"from-x");
	let from_y = constant(b"from-y");
	schema.link("x", "z", Some(c), false, from_x);
	schema.link("y", "z", Some(c), false, from_y.clone());

	let linked = schema.linked_attributes("root");
	let producer = &linked[&c]["z"];
	assert!(producer.ptr_eq(&from_y));
}

#[test]
fn unknown_attribute_has_no_dependents() {
	let schema = Schema::<()>::new();
	assert!(schema.linked_attributes("ghost").is_empty());
}

#[test]
fn first_classification_wins() {
	let mut schema = Schema::<()>::new();
	assert!(schema.register_default("email", AttrClass::Shadow));
	assert!(!schema.register_default("email", AttrClass::Accessor));
	assert_eq!(schema.classification("email"), Some(AttrClass::Shadow));

	schema.register("email", AttrClass::Column);
	assert_eq!(schema.classification("email"), Some(AttrClass::Column));
	assert_eq!(schema.classification("other"), None);
}

#[rstest]
#[case("encoded_token", true)]
#[case("token", false)]
fn protection_is_per_attribute(#[case] attr: &str, #[case] protected: bool) {
	let mut schema = Schema::<()>::new();
	schema.protect("encoded_token");
	assert_eq!(schema.is_protected(attr), protected);
}

proptest! {
	#[test]
	fn traversal_terminates_with_declared_edges_only(
		edges in proptest::collection::vec((0u8..6, 0u8..6, 0u32..4), 1..24),
		start in 0u8..6,
	) {
		let mut schema = Schema::<()>::new();
		let components: Vec<ComponentId> = (0..4).map(|_| schema.component()).collect();
		for (set, get, component) in &edges {
			schema.link(
				format!("a{set}"),
				format!("a{get}"),
				Some(components[*component as usize]),
				false,
				constant(b""),
			);
		}

		let linked = schema.linked_attributes(&format!("a{start}"));
		prop_assert!(linked.len() <= components.len());
		for (component, group) in &linked {
			for attr in group.keys() {
				let declared = edges.iter().any(|(_, get, c)| {
					components[*c as usize] == *component && attr.as_str() == format!("a{get}")
				});
				prop_assert!(declared, "{attr} has no edge in {component}");
			}
		}
	}
}
