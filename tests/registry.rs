//! Tests for loading and querying the block type registry.
//!
mod common;
use common::*;
use flipscript::prelude::*;
use serde_json::{Value, json};

/// A catalog with one category holding the given kinds.
fn catalog(blocks: Value) -> String {
    json!({
        "blockCategories": [
            { "id": "test", "name": "Test", "blocks": blocks }
        ]
    })
    .to_string()
}

fn entry() -> Value {
    json!({ "id": "start", "role": "entry", "outputs": [{ "id": "next" }] })
}

fn exit() -> Value {
    json!({ "id": "stop", "role": "exit", "inputs": [{ "id": "in", "merge": true }] })
}

fn load(blocks: Value) -> std::result::Result<BlockRegistry, RegistryError> {
    BlockRegistry::from_json(&catalog(blocks))
}

#[cfg(test)]
mod catalog_tests {
    use super::*;

    #[test]
    fn test_minimal_catalog_loads() {
        let registry = load(json!([entry(), exit()])).expect("minimal catalog loads");
        assert_eq!(registry.entry_kind().unwrap(), "start");
        assert_eq!(registry.lookup("stop").unwrap().category, "test");
        assert_eq!(registry.categories().len(), 1);
    }

    #[test]
    fn test_two_entry_kinds_are_rejected() {
        let second = json!({ "id": "start_again", "role": "entry", "outputs": [{ "id": "next" }] });
        let err = load(json!([entry(), second, exit()])).unwrap_err();
        match err {
            RegistryError::RegistryMisconfigured(message) => {
                assert!(message.contains("start"));
                assert!(message.contains("start_again"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_catalog_without_entry_is_rejected() {
        let err = load(json!([exit()])).unwrap_err();
        assert!(matches!(err, RegistryError::RegistryMisconfigured(_)));
    }

    #[test]
    fn test_duplicate_kind_ids_are_rejected() {
        let err = load(json!([entry(), exit(), exit()])).unwrap_err();
        assert!(matches!(err, RegistryError::RegistryMisconfigured(m) if m.contains("'stop'")));
    }

    #[test]
    fn test_malformed_catalog_reports_parse_error() {
        let err = BlockRegistry::from_json("{ \"blockCategories\": 3 }").unwrap_err();
        assert!(matches!(err, RegistryError::CatalogParse(_)));
    }
}

#[cfg(test)]
mod definition_tests {
    use super::*;

    fn assert_invalid(kind: Value, fragment: &str) {
        match load(json!([entry(), exit(), kind])) {
            Err(RegistryError::InvalidDefinition { message, .. }) => assert!(
                message.contains(fragment),
                "'{}' does not mention '{}'",
                message,
                fragment
            ),
            other => panic!("expected an invalid definition, got {:?}", other),
        }
    }

    #[test]
    fn test_entry_kind_cannot_have_inputs() {
        let bad_entry = json!({
            "id": "start",
            "role": "entry",
            "inputs": [{ "id": "in" }],
            "outputs": [{ "id": "next" }]
        });
        let err = load(json!([bad_entry, exit()])).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDefinition { kind, .. } if kind == "start"));
    }

    #[test]
    fn test_branch_needs_two_outputs() {
        assert_invalid(
            json!({ "id": "fork", "role": "branch", "inputs": [{ "id": "in" }], "outputs": [{ "id": "only" }] }),
            "at least two outputs",
        );
    }

    #[test]
    fn test_branch_outputs_need_guards() {
        assert_invalid(
            json!({
                "id": "fork",
                "role": "branch",
                "inputs": [{ "id": "in" }],
                "outputs": [{ "id": "a" }, { "id": "b" }, { "id": "c" }],
                "template": { "guards": [{ "output": "a", "condition": "1" }] }
            }),
            "output 'b' has no guard",
        );
    }

    #[test]
    fn test_fallback_output_cannot_be_guarded() {
        assert_invalid(
            json!({
                "id": "fork",
                "role": "branch",
                "inputs": [{ "id": "in" }],
                "outputs": [{ "id": "a" }, { "id": "b" }],
                "template": { "guards": [
                    { "output": "a", "condition": "1" },
                    { "output": "b", "condition": "0" }
                ] }
            }),
            "fallback arm",
        );
    }

    #[test]
    fn test_placeholders_must_name_properties() {
        assert_invalid(
            json!({
                "id": "beep",
                "role": "action",
                "inputs": [{ "id": "in" }],
                "outputs": [{ "id": "next" }],
                "template": { "statements": ["beep(${volume});"] }
            }),
            "placeholder 'volume'",
        );
    }

    #[test]
    fn test_declarations_only_see_the_app_id() {
        assert_invalid(
            json!({
                "id": "beep",
                "role": "action",
                "inputs": [{ "id": "in" }],
                "outputs": [{ "id": "next" }],
                "template": { "declarations": [
                    { "key": "field.beep", "section": "field", "text": "int ${block}_count;" }
                ] }
            }),
            "not allowed in declarations",
        );
    }

    #[test]
    fn test_resources_need_a_teardown() {
        assert_invalid(
            json!({
                "id": "radio_init",
                "role": "action",
                "inputs": [{ "id": "in" }],
                "outputs": [{ "id": "next" }],
                "provides": "radio",
                "resource": { "key": "radio", "teardown": [] }
            }),
            "no teardown",
        );
    }

    #[test]
    fn test_defaults_must_satisfy_their_schema() {
        assert_invalid(
            json!({
                "id": "sleep",
                "role": "action",
                "inputs": [{ "id": "in" }],
                "outputs": [{ "id": "next" }],
                "properties": [{ "id": "ms", "type": "integer", "min": 1, "default": 0 }],
                "template": { "statements": ["sleep(${ms});"] }
            }),
            "default of property 'ms'",
        );
    }

    #[test]
    fn test_optional_properties_need_defaults() {
        assert_invalid(
            json!({
                "id": "say",
                "role": "action",
                "inputs": [{ "id": "in" }],
                "outputs": [{ "id": "next" }],
                "properties": [{ "id": "text", "type": "string" }],
                "template": { "statements": ["say(${text});"] }
            }),
            "needs a default",
        );
    }
}

#[cfg(test)]
mod lookup_tests {
    use super::*;

    #[test]
    fn test_standard_catalog_contents() {
        let registry = registry();
        for kind in [
            "app_on_start",
            "app_exit",
            "gui_init",
            "display_text",
            "display_clear",
            "refresh_display",
            "wait_for_input",
            "input_switch",
            "delay",
            "storage_init",
            "storage_read",
            "storage_write",
            "file_loaded",
            "counter_set",
            "counter_add",
            "counter_compare",
            "notification_init",
            "notify",
            "log_message",
        ] {
            assert!(registry.lookup(kind).is_ok(), "missing kind '{}'", kind);
        }
        assert_eq!(registry.lookup("input_switch").unwrap().outputs.len(), 3);
    }

    #[test]
    fn test_unknown_kind_lookup_fails() {
        let err = registry().lookup("teleport").unwrap_err();
        assert_eq!(err, RegistryError::UnknownBlockKind("teleport".to_string()));
    }

    #[test]
    fn test_kinds_in_category_keep_catalog_order() {
        let registry = registry();
        let storage: Vec<&str> = registry
            .kinds_in_category("storage")
            .map(|k| k.id.as_str())
            .collect();
        assert_eq!(
            storage,
            vec!["storage_init", "storage_read", "storage_write", "file_loaded"]
        );
    }

    #[test]
    fn test_alias_cannot_shadow_a_registered_kind() {
        let err = registry().with_alias("delay", "app_exit").unwrap_err();
        assert!(matches!(err, RegistryError::RegistryMisconfigured(_)));
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BlockRegistry>();
    }
}
