// tests/property_fingerprint.rs

use std::collections::HashMap;

use proptest::prelude::*;
use rosterboard::fingerprint::{compute_fingerprint, NEVER_PUBLISHED};
use rosterboard::groups::GroupData;

fn group_strategy() -> impl Strategy<Value = GroupData> {
    (
        "[a-z]{1,6}",
        "[A-Za-z ]{0,8}",
        proptest::collection::vec("[0-9]{1,4}", 0..5),
    )
        .prop_map(|(id, prefix, members)| GroupData {
            id,
            prefix,
            members,
        })
}

fn snapshot_strategy() -> impl Strategy<Value = (Vec<GroupData>, HashMap<String, String>)> {
    proptest::collection::vec(group_strategy(), 0..4).prop_flat_map(|groups| {
        let members: Vec<String> = groups
            .iter()
            .flat_map(|g| g.members.iter().cloned())
            .collect();
        let names = proptest::collection::vec(proptest::option::of("[A-Za-z]{1,6}"), members.len())
            .prop_map(move |maybe_names| {
                members
                    .iter()
                    .cloned()
                    .zip(maybe_names)
                    .filter_map(|(member, name)| name.map(|n| (member, n)))
                    .collect::<HashMap<_, _>>()
            });
        (Just(groups), names)
    })
}

proptest! {
    #[test]
    fn test_fingerprint_is_deterministic((groups, names) in snapshot_strategy()) {
        let first = compute_fingerprint(&groups, &names);
        let second = compute_fingerprint(&groups.clone(), &names.clone());
        prop_assert_eq!(first, second);
        prop_assert_ne!(first, NEVER_PUBLISHED);
    }

    #[test]
    fn test_renaming_a_member_changes_fingerprint(
        (groups, names) in snapshot_strategy(),
        suffix in "[a-z]{1,3}",
    ) {
        let Some(member) = groups.iter().flat_map(|g| g.members.iter()).next().cloned() else {
            return Ok(());
        };

        let mut renamed = names.clone();
        let old = renamed.get(&member).cloned().unwrap_or_default();
        renamed.insert(member, format!("{old}{suffix}"));

        prop_assert_ne!(
            compute_fingerprint(&groups, &names),
            compute_fingerprint(&groups, &renamed)
        );
    }

    #[test]
    fn test_adding_a_member_changes_fingerprint(
        (groups, names) in snapshot_strategy(),
        extra in "[0-9]{5}",
    ) {
        prop_assume!(!groups.is_empty());
        let mut grown = groups.clone();
        grown[0].members.push(extra);

        prop_assert_ne!(
            compute_fingerprint(&groups, &names),
            compute_fingerprint(&grown, &names)
        );
    }
}

#[test]
fn test_field_boundaries_matter() {
    let a = vec![GroupData {
        id: "ab".to_string(),
        prefix: "c".to_string(),
        members: vec![],
    }];
    let b = vec![GroupData {
        id: "a".to_string(),
        prefix: "bc".to_string(),
        members: vec![],
    }];
    let names = HashMap::new();
    assert_ne!(compute_fingerprint(&a, &names), compute_fingerprint(&b, &names));
}

#[test]
fn test_group_order_matters() {
    let g1 = GroupData {
        id: "g1".to_string(),
        prefix: "One".to_string(),
        members: vec!["p1".to_string()],
    };
    let g2 = GroupData {
        id: "g2".to_string(),
        prefix: "Two".to_string(),
        members: vec!["p2".to_string()],
    };
    let names = HashMap::new();
    assert_ne!(
        compute_fingerprint(&[g1.clone(), g2.clone()], &names),
        compute_fingerprint(&[g2, g1], &names)
    );
}
