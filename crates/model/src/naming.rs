//! Event naming resolver.
//!
//! Computes the public event name and the basic-event classification for
//! every callback of every callback-interface class. Naming is a pure
//! function of the full descriptor set: the decision for one class's
//! callback depends on what other classes named the same callback, so the
//! resolver groups callbacks by public name across classes before
//! deciding anything.

use indexmap::IndexMap;

use crate::descriptor::{ClassCategory, ClassDescriptor};

/// Fixed prefix that disambiguates shared event names from the host
/// program's own namespace.
pub const EVENT_NAME_PREFIX: &str = "Cfx";

/// Public names shorter than this are always qualified with the owning
/// class name, guarding against collisions with very short generic names
/// such as "get" or "set".
const SHORT_NAME_LIMIT: usize = 4;

/// Resolves `event_name` and `is_basic_event` on every callback.
///
/// Rules, evaluated per public-name group:
/// * single member: short names get `owner + public_name`; basic events
///   keep the bare public name; everything else gets the `Cfx` prefix
/// * multiple members: basic events keep the bare name; if all members
///   carry byte-identical documentation they are the same conceptual
///   event and share `Cfx + public_name`; otherwise each gets
///   `owner + public_name`
///
/// Deterministic: groups are visited in first-seen order and the output
/// depends only on the descriptor set.
pub fn resolve_event_names(classes: &mut [ClassDescriptor]) {
	let mut groups: IndexMap<String, Vec<(usize, usize)>> = IndexMap::new();
	for (class_idx, class) in classes.iter().enumerate() {
		if class.category != ClassCategory::CallbackInterface {
			continue;
		}
		for (cb_idx, cb) in class.callbacks.iter().enumerate() {
			groups.entry(cb.public_name.clone()).or_default().push((class_idx, cb_idx));
		}
	}

	for (public_name, members) in &groups {
		if let [(class_idx, cb_idx)] = members[..] {
			let owner = classes[class_idx].name.clone();
			let cb = &mut classes[class_idx].callbacks[cb_idx];
			cb.is_basic_event = cb.carries_no_data();
			cb.event_name = if public_name.len() < SHORT_NAME_LIMIT {
				Some(format!("{owner}{public_name}"))
			} else if cb.is_basic_event {
				None
			} else {
				Some(format!("{EVENT_NAME_PREFIX}{public_name}"))
			};
			tracing::debug!(
				class = %owner,
				callback = %public_name,
				event = cb.event_symbol(),
				"resolved single-member event name"
			);
		} else {
			// The same public name is reused across unrelated classes.
			// Byte-identical documentation is the proxy for "same
			// conceptual event".
			let first_docs = &classes[members[0].0].callbacks[members[0].1].documentation;
			let all_duplicates = members
				.iter()
				.all(|&(ci, bi)| classes[ci].callbacks[bi].documentation == *first_docs);

			for &(class_idx, cb_idx) in members {
				let owner = classes[class_idx].name.clone();
				let cb = &mut classes[class_idx].callbacks[cb_idx];
				cb.is_basic_event = cb.carries_no_data();
				cb.event_name = if cb.is_basic_event {
					None
				} else if all_duplicates {
					Some(format!("{EVENT_NAME_PREFIX}{public_name}"))
				} else {
					Some(format!("{owner}{public_name}"))
				};
			}
			tracing::debug!(
				callback = %public_name,
				members = members.len(),
				shared = all_duplicates,
				"resolved multi-member event name"
			);
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::descriptor::{CallbackDescriptor, ParameterDescriptor, ReturnType, ValueType};

	fn class(name: &str, callbacks: Vec<CallbackDescriptor>) -> ClassDescriptor {
		ClassDescriptor::callback_interface(name, callbacks)
	}

	fn returning(owner: &str, name: &str) -> CallbackDescriptor {
		CallbackDescriptor::new(owner, name, Vec::new(), ReturnType::Value(ValueType::Int))
	}

	#[test]
	fn single_member_short_name_is_qualified() {
		let mut classes = vec![class("Foo", vec![returning("Foo", "get")])];
		resolve_event_names(&mut classes);
		assert_eq!(classes[0].callbacks[0].event_name.as_deref(), Some("Fooget"));
	}

	#[test]
	fn single_member_basic_event_keeps_bare_name() {
		let mut classes = vec![class(
			"Bar",
			vec![CallbackDescriptor::new("Bar", "Closed", Vec::new(), ReturnType::Void)],
		)];
		resolve_event_names(&mut classes);
		let cb = &classes[0].callbacks[0];
		assert!(cb.is_basic_event);
		assert_eq!(cb.event_name, None);
		assert_eq!(cb.event_symbol(), "Closed");
	}

	#[test]
	fn single_member_non_basic_gets_prefix() {
		let mut classes = vec![class("Foo", vec![returning("Foo", "OnQuery")])];
		resolve_event_names(&mut classes);
		assert_eq!(classes[0].callbacks[0].event_name.as_deref(), Some("CfxOnQuery"));
	}

	#[test]
	fn short_name_rule_beats_basic_event_rule() {
		// Length is checked before the basic-event test, matching the
		// group rule order.
		let mut classes = vec![class(
			"Foo",
			vec![CallbackDescriptor::new("Foo", "run", Vec::new(), ReturnType::Void)],
		)];
		resolve_event_names(&mut classes);
		assert_eq!(classes[0].callbacks[0].event_name.as_deref(), Some("Foorun"));
	}

	#[test]
	fn multi_member_identical_docs_share_name() {
		let docs = ["Called when a load completes."];
		let mut classes = vec![
			class("Frame", vec![returning("Frame", "OnLoad").with_documentation(docs)]),
			class("Browser", vec![returning("Browser", "OnLoad").with_documentation(docs)]),
		];
		resolve_event_names(&mut classes);
		assert_eq!(classes[0].callbacks[0].event_name.as_deref(), Some("CfxOnLoad"));
		assert_eq!(classes[1].callbacks[0].event_name.as_deref(), Some("CfxOnLoad"));
	}

	#[test]
	fn multi_member_differing_docs_qualify_per_owner() {
		let mut classes = vec![
			class(
				"Frame",
				vec![returning("Frame", "OnLoad").with_documentation(["Frame load."])],
			),
			class(
				"Browser",
				vec![returning("Browser", "OnLoad").with_documentation(["Browser load."])],
			),
		];
		resolve_event_names(&mut classes);
		assert_eq!(classes[0].callbacks[0].event_name.as_deref(), Some("FrameOnLoad"));
		assert_eq!(classes[1].callbacks[0].event_name.as_deref(), Some("BrowserOnLoad"));
	}

	#[test]
	fn multi_member_basic_event_keeps_bare_name() {
		let mut classes = vec![
			class(
				"Frame",
				vec![CallbackDescriptor::new("Frame", "Closed", Vec::new(), ReturnType::Void)],
			),
			class("Browser", vec![returning("Browser", "Closed")]),
		];
		resolve_event_names(&mut classes);
		// Basic member keeps the bare name even inside a shared group.
		assert_eq!(classes[0].callbacks[0].event_name, None);
		assert!(classes[0].callbacks[0].is_basic_event);
		// Docs are equal (both empty), so the non-basic member shares.
		assert_eq!(classes[1].callbacks[0].event_name.as_deref(), Some("CfxClosed"));
	}

	#[test]
	fn doc_comparison_is_line_exact() {
		let mut classes = vec![
			class(
				"Frame",
				vec![returning("Frame", "OnLoad").with_documentation(["line one", "line two"])],
			),
			class(
				"Browser",
				vec![returning("Browser", "OnLoad").with_documentation(["line one"])],
			),
		];
		resolve_event_names(&mut classes);
		assert_eq!(classes[0].callbacks[0].event_name.as_deref(), Some("FrameOnLoad"));
	}

	#[test]
	fn non_callback_interface_classes_are_ignored() {
		let mut other = class("Helper", vec![returning("Helper", "OnLoad")]);
		other.category = ClassCategory::Other;
		let mut classes = vec![other, class("Frame", vec![returning("Frame", "OnLoad")])];
		resolve_event_names(&mut classes);
		// Helper is invisible to grouping, so Frame's OnLoad is a
		// single-member group.
		assert_eq!(classes[0].callbacks[0].event_name, None);
		assert_eq!(classes[1].callbacks[0].event_name.as_deref(), Some("CfxOnLoad"));
	}

	#[test]
	fn resolution_is_deterministic() {
		let build = || {
			vec![
				class(
					"Frame",
					vec![
						returning("Frame", "OnLoad").with_documentation(["a"]),
						CallbackDescriptor::new(
							"Frame",
							"OnTitle",
							vec![ParameterDescriptor::inbound("title", ValueType::Str)],
							ReturnType::Void,
						),
					],
				),
				class("Browser", vec![returning("Browser", "OnLoad").with_documentation(["b"])]),
			]
		};
		let mut first = build();
		let mut second = build();
		resolve_event_names(&mut first);
		resolve_event_names(&mut second);
		assert_eq!(first, second);
	}
}
