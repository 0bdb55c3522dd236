//! Behavior of the whole pipeline

use junoprep::hierarchy::Hierarchy;
use junoprep::issue::{Issue, Issues};
use junoprep::statement::{read, Line};
use junoprep::{flat_config, preprocess, Options, Preprocessed};
use pretty_assertions::assert_eq;

fn run(lines: Vec<Line>) -> Preprocessed {
    preprocess(lines, &Options::default()).expect("preprocessing must succeed")
}

fn rendered(preprocessed: &Preprocessed) -> Vec<String> {
    preprocessed.lines.iter().map(ToString::to_string).collect()
}

/// Statements starting with `prefix`, in output order
fn under(preprocessed: &Preprocessed, prefix: &str) -> Vec<String> {
    rendered(preprocessed)
        .into_iter()
        .filter(|line| line.starts_with(prefix))
        .collect()
}

#[test]
fn preprocessing_the_output_again_changes_nothing() {
    let first = run(flat_config! {
        "set groups base system domain-name example.net",
        "set groups base interfaces <ge-*> mtu 9000",
        "set groups base firewall filter f term default then accept",
        "set system host-name r1",
        "set interfaces ge-0 unit 0 family inet address 10.0.0.1/24",
        "set interfaces ge-1 unit 0 family inet address 10.0.1.1/24",
        "set interfaces ge-1 disable",
        "deactivate interfaces ge-1 disable",
        "set firewall filter f term a from protocol tcp",
        "set firewall filter f term a then reject",
        "set firewall filter f term b then discard",
        "insert firewall filter f term b before term a",
        r#"set policy-options prefix-list local apply-path "interfaces <*> unit <*> family inet address <*>""#,
        "set apply-groups base",
        "bogus line",
    });
    assert_eq!(
        rendered(&first),
        vec![
            "set system domain-name example.net",
            "set system host-name r1",
            "set interfaces ge-0 mtu 9000",
            "set interfaces ge-0 unit 0 family inet address 10.0.0.1/24",
            "set interfaces ge-1 mtu 9000",
            "set interfaces ge-1 unit 0 family inet address 10.0.1.1/24",
            "set firewall filter f term b then discard",
            "set firewall filter f term a from protocol tcp",
            "set firewall filter f term a then reject",
            "set firewall filter f term default then accept",
            r#"set policy-options prefix-list local apply-path "interfaces <*> unit <*> family inet address <*>""#,
            "set policy-options prefix-list local 10.0.0.1/24",
            "set policy-options prefix-list local 10.0.1.1/24",
            "set apply-groups base",
            "bogus line",
        ]
    );

    let second = run(read(&first.to_string()));
    assert_eq!(rendered(&second), rendered(&first));
    // the output keeps `apply-groups` but no group definitions
    assert_eq!(
        second.issues,
        vec![Issue::UndefinedGroup {
            group: "base".into(),
            path: "".into(),
            line: 14,
        }]
    );
}

#[test]
fn direct_value_is_last() {
    let preprocessed = run(flat_config! {
        "set groups g1 system time-zone UTC",
        "set groups g2 system time-zone Europe/Berlin",
        "set system time-zone America/New_York",
        "set apply-groups g1",
        "set apply-groups g2",
    });
    assert_eq!(
        under(&preprocessed, "set system time-zone").last().map(String::as_str),
        Some("set system time-zone America/New_York")
    );
}

#[test]
fn earlier_applied_group_is_last() {
    let preprocessed = run(flat_config! {
        "set groups g1 system time-zone UTC",
        "set groups g2 system time-zone Europe/Berlin",
        "set apply-groups g1",
        "set apply-groups g2",
    });
    assert_eq!(
        under(&preprocessed, "set system time-zone"),
        vec![
            "set system time-zone Europe/Berlin",
            "set system time-zone UTC",
        ]
    );
}

#[test]
fn list_positions_keep_direct_entries_first() {
    let preprocessed = run(flat_config! {
        "set groups g1 policy-options policy-statement p term g1-a then accept",
        "set groups g1 policy-options policy-statement p term g1-b then accept",
        "set groups g2 policy-options policy-statement p term g2-a then reject",
        "set policy-options policy-statement p term z then next policy",
        "set policy-options policy-statement p term y then next policy",
        "set policy-options apply-groups g1",
        "set policy-options apply-groups g2",
    });
    assert_eq!(
        under(&preprocessed, "set policy-options policy-statement"),
        vec![
            "set policy-options policy-statement p term z then next policy",
            "set policy-options policy-statement p term y then next policy",
            "set policy-options policy-statement p term g1-a then accept",
            "set policy-options policy-statement p term g1-b then accept",
            "set policy-options policy-statement p term g2-a then reject",
        ]
    );
}

#[test]
fn except_removes_one_group_below_the_node() {
    let preprocessed = run(flat_config! {
        "set groups mtu interfaces <*> mtu 9000",
        "set groups desc interfaces <*> description managed",
        "set interfaces ge-0 unit 0",
        "set interfaces ge-1 unit 0",
        "set interfaces ge-1 apply-groups-except mtu",
        "set apply-groups mtu",
        "set apply-groups desc",
    });
    assert_eq!(
        under(&preprocessed, "set interfaces"),
        vec![
            "set interfaces ge-0 description managed",
            "set interfaces ge-0 mtu 9000",
            "set interfaces ge-0 unit 0",
            "set interfaces ge-1 description managed",
            "set interfaces ge-1 unit 0",
            "set interfaces ge-1 apply-groups-except mtu",
        ]
    );
}

#[test]
fn inheritance_reaches_a_fixed_point() {
    let config = flat_config! {
        "set groups a system apply-groups b",
        "set groups b system services apply-groups c",
        "set groups c system services ssh",
        "set apply-groups a",
    };
    let mut hierarchy = Hierarchy::default();
    let mut issues = Issues::new();
    hierarchy.build(&config);

    let cluster_groups = ["node0".to_string(), "node1".to_string()];
    let passes = hierarchy
        .inherit_groups(&cluster_groups, 16, &mut issues)
        .unwrap();
    assert!(passes > 1);
    assert_eq!(
        hierarchy
            .inherit_groups(&cluster_groups, 16, &mut issues)
            .unwrap(),
        1
    );
    assert!(issues.is_empty());

    hierarchy.prune_group_definitions();
    let lines: Vec<String> = hierarchy.dump().iter().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "set system services ssh",
            "set system services apply-groups c",
            "set system apply-groups b",
            "set apply-groups a",
        ]
    );
}

#[test]
fn delete_removes_the_whole_subtree() {
    let preprocessed = run(flat_config! {
        "set a b",
        "set a b c",
        "set a b c d",
        "deactivate a b c",
        "set a e",
        "delete a b",
        "delete x y",
    });
    assert_eq!(rendered(&preprocessed), vec!["set a e"]);
    assert_eq!(
        preprocessed.issues,
        vec![Issue::MissingDeleteTarget {
            path: "x y".into(),
            line: 7,
        }]
    );
}

#[test]
fn insert_moves_without_changing() {
    let preprocessed = run(flat_config! {
        "set x y a 1",
        "set x y z 1",
        "set x y z 2",
        "set x y z 3 deep",
        "set x y q 1",
        "insert x y z before q",
    });
    assert_eq!(
        rendered(&preprocessed),
        vec![
            "set x y a 1",
            "set x y z 1",
            "set x y z 2",
            "set x y z 3 deep",
            "set x y q 1",
        ]
    );

    let preprocessed = run(flat_config! {
        "set x y q 1",
        "set x y a 1",
        "set x y z 1",
        "set x y z 3 deep",
        "insert x y z before q",
    });
    assert_eq!(
        rendered(&preprocessed),
        vec![
            "set x y z 1",
            "set x y z 3 deep",
            "set x y q 1",
            "set x y a 1",
        ]
    );
}

/// Generated statements live at the directive's path (`a b c`) plus the prefix
#[test]
fn apply_path_follows_its_directive() {
    let preprocessed = run(flat_config! {
        "set c 10.0.0.1",
        "set c 10.0.0.0/24",
        r#"set a b c apply-path "c <*>""#,
    });
    assert_eq!(
        rendered(&preprocessed),
        vec![
            "set c 10.0.0.1",
            "set c 10.0.0.0/24",
            r#"set a b c apply-path "c <*>""#,
            "set a b c 10.0.0.1/32",
            "set a b c 10.0.0.0/24",
        ]
    );
}

#[test]
fn inherited_statements_below_deactivated_paths_are_dropped() {
    let preprocessed = run(flat_config! {
        "set groups g interfaces ge-0 unit 0 family inet",
        "set groups g interfaces ge-0 mtu 9000",
        "set interfaces ge-0 description uplink",
        "deactivate interfaces ge-0 unit",
        "set apply-groups g",
    });
    assert_eq!(
        rendered(&preprocessed),
        vec![
            "set interfaces ge-0 mtu 9000",
            "set interfaces ge-0 description uplink",
            "set apply-groups g",
        ]
    );
}

#[test]
fn problems_do_not_stop_preprocessing() {
    let preprocessed = run(flat_config! {
        "set system host-name r1",
        "set system apply-groups missing",
        "insert system host-name before nothing",
    });
    assert_eq!(
        rendered(&preprocessed),
        vec!["set system host-name r1", "set system apply-groups missing"]
    );
    assert_eq!(
        preprocessed.issues,
        vec![
            Issue::MissingInsertDestination {
                path: "system nothing".into(),
                line: 3,
            },
            Issue::UndefinedGroup {
                group: "missing".into(),
                path: "system".into(),
                line: 2,
            },
        ]
    );
}

#[test]
fn unrecognized_lines_after_group_definitions_are_kept() {
    let preprocessed = run(flat_config! {
        "set system host-name r1",
        "set groups g system ntp server 10.0.0.1",
        "this line is not understood",
        "set apply-groups g",
    });
    assert_eq!(
        rendered(&preprocessed),
        vec![
            "set system ntp server 10.0.0.1",
            "set system host-name r1",
            "this line is not understood",
            "set apply-groups g",
        ]
    );
}

#[test]
fn quoted_text_in_groups_is_inherited() {
    let preprocessed = run(flat_config! {
        r#"set groups g system login message "<authorized use only>""#,
        "set apply-groups g",
    });
    assert_eq!(
        rendered(&preprocessed),
        vec![
            r#"set system login message "<authorized use only>""#,
            "set apply-groups g",
        ]
    );
}
