use std::collections::HashMap;

pub fn builtin_encounters() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        (
            "goblin_ambush",
            include_str!("../content/encounters/goblin_ambush.json"),
        ),
        (
            "phoenix_trial",
            include_str!("../content/encounters/phoenix_trial.json"),
        ),
        (
            "stone_golem",
            include_str!("../content/encounters/stone_golem.json"),
        ),
    ])
}

/// Built-in encounter ids in a stable order.
pub fn builtin_encounter_ids() -> Vec<&'static str> {
    let mut ids: Vec<_> = builtin_encounters().into_keys().collect();
    ids.sort_unstable();
    ids
}
