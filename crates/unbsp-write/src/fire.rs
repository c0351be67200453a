// fire.rs — legacy trigger semantics to named-output remapping.
//
// Older dialects fire targets through a single implicit action: a `target`
// key plus optional `delay`. The VMF I/O model wants a named output per
// source classname and an explicit five-field connection. The table below
// keys the output name on the firing entity's classname; anything unlisted
// falls back to the default output.

use unbsp_common::map::{Entity, MapDocument};

/// (classname, output fired when the entity activates).
const FIRE_OUTPUTS: &[(&str, &str)] = &[
    ("func_button", "OnPressed"),
    ("func_rot_button", "OnPressed"),
    ("func_door", "OnOpen"),
    ("func_door_rotating", "OnOpen"),
    ("func_breakable", "OnBreak"),
    ("trigger_once", "OnTrigger"),
    ("trigger_multiple", "OnTrigger"),
    ("trigger_hurt", "OnHurtPlayer"),
    ("logic_auto", "OnMapSpawn"),
];

const DEFAULT_OUTPUT: &str = "OnTrigger";

/// Implicit input applied to the fired target.
const DEFAULT_INPUT: &str = "Trigger";

/// Rewrite a document's entities into the named-output model, in place.
/// Runs on a per-dialect clone; the caller's tree is never touched.
pub fn correct_entities(doc: &mut MapDocument) {
    for entity in &mut doc.entities {
        // Newer-branch connections separate fields with ESC; normalize to
        // the comma form VMF uses.
        for connection in &mut entity.connections {
            if connection.contains('\x1b') {
                *connection = connection.replace('\x1b', ",");
            }
        }
        remap_legacy_target(entity);
    }
}

fn remap_legacy_target(entity: &mut Entity) {
    let Some(target) = entity.get("target").map(str::to_string) else {
        return;
    };
    if target.is_empty() || !entity.connections.is_empty() {
        return;
    }
    let output = output_for(entity.classname());
    let delay = entity.get("delay").unwrap_or("0").to_string();
    entity
        .connections
        .push(format!("{output}\t{target},{DEFAULT_INPUT},,{delay},-1"));
    entity.remove("target");
    entity.remove("delay");
}

fn output_for(classname: &str) -> &'static str {
    FIRE_OUTPUTS
        .iter()
        .find(|(c, _)| classname.eq_ignore_ascii_case(c))
        .map(|(_, output)| *output)
        .unwrap_or(DEFAULT_OUTPUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_target_becomes_on_pressed() {
        let mut button = Entity::with_classname("func_button");
        button.set("target", "door1");
        button.set("delay", "2");
        let mut doc = MapDocument { entities: vec![button] };
        correct_entities(&mut doc);

        let button = &doc.entities[0];
        assert!(button.get("target").is_none());
        assert_eq!(button.connections, vec!["OnPressed\tdoor1,Trigger,,2,-1"]);
    }

    #[test]
    fn test_unknown_classname_uses_default_output() {
        let mut ent = Entity::with_classname("func_custom_thing");
        ent.set("target", "relay");
        let mut doc = MapDocument { entities: vec![ent] };
        correct_entities(&mut doc);
        assert_eq!(doc.entities[0].connections, vec!["OnTrigger\trelay,Trigger,,0,-1"]);
    }

    #[test]
    fn test_existing_connections_left_alone() {
        let mut ent = Entity::with_classname("func_button");
        ent.set("target", "door1");
        ent.connections.push("OnPressed\tdoor1,Open,,0,-1".to_string());
        let mut doc = MapDocument { entities: vec![ent] };
        correct_entities(&mut doc);
        // The explicit connection wins; the legacy key is not re-expanded.
        assert_eq!(doc.entities[0].connections.len(), 1);
        assert!(doc.entities[0].get("target").is_some());
    }

    #[test]
    fn test_esc_separators_normalized() {
        let mut ent = Entity::with_classname("logic_relay");
        ent.connections.push("OnTrigger\ta\x1bOpen\x1b\x1b0\x1b-1".to_string());
        let mut doc = MapDocument { entities: vec![ent] };
        correct_entities(&mut doc);
        assert_eq!(doc.entities[0].connections[0], "OnTrigger\ta,Open,,0,-1");
    }
}
