use team_stats_terminal::error::StatsError;
use team_stats_terminal::metrics::{
    lookup_player, player_names, player_profile, safe_int_convert, shot_accuracy, team_summary,
    team_totals, top_n,
};
use team_stats_terminal::normalize::{missing_columns, normalize_numeric, normalize_numeric_with_report};
use team_stats_terminal::table::{Cell, ColumnData, Table, build_table};

fn goals_table(goals: &[&str]) -> Table {
    let mut rows = vec![vec!["Player".to_string(), "Goals".to_string()]];
    for (idx, g) in goals.iter().enumerate() {
        rows.push(vec![format!("P{idx}"), g.to_string()]);
    }
    normalize_numeric(build_table(&rows), &["Goals"])
}

#[test]
fn scenario_from_three_rows() {
    let rows = vec![
        vec!["Player", "Goals", "Assists"],
        vec!["A", "3", "1"],
        vec!["B", "", "2"],
    ];
    let table = normalize_numeric(build_table(&rows), &["Goals", "Assists"]);

    assert_eq!(
        table.column("Goals").map(|c| c.data.clone()),
        Some(ColumnData::Numeric(vec![3.0, 0.0]))
    );
    assert_eq!(
        table.column("Assists").map(|c| c.data.clone()),
        Some(ColumnData::Numeric(vec![1.0, 2.0]))
    );

    let b = lookup_player(&table, "B").expect("B should exist");
    assert_eq!(b.stat("Goals"), 0);
    assert_eq!(b.stat("Assists"), 2);

    let totals = team_totals(&table);
    assert_eq!(totals.get("Goals"), Some(3.0));
    assert_eq!(totals.get("Assists"), Some(3.0));
    assert_eq!(totals.get("Player"), None);
}

#[test]
fn build_table_shape_matches_input() {
    let rows = vec![
        vec!["Player", "Goals", "Assists", "Played"],
        vec!["A", "1", "0", "1"],
        vec!["B", "0", "1", "1"],
        vec!["C", "2", "2", "1"],
    ];
    let table = build_table(&rows);
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.column_names(), vec!["Player", "Goals", "Assists", "Played"]);
    assert!(table.columns().iter().all(|c| c.len() == 3));
}

#[test]
fn header_only_table_has_columns_but_no_rows() {
    let rows = vec![vec!["Player", "Goals"]];
    let table = build_table(&rows);
    assert_eq!(table.column_count(), 2);
    assert!(table.is_empty());
}

#[test]
fn normalizing_twice_is_idempotent() {
    let rows = vec![
        vec!["Player", "Goals"],
        vec!["A", "2"],
        vec!["B", "x"],
        vec!["C", " 4 "],
    ];
    let once = normalize_numeric(build_table(&rows), &["Goals"]);
    let (twice, report) = normalize_numeric_with_report(once.clone(), &["Goals"]);
    assert_eq!(once, twice);
    assert!(report.converted.is_empty());
    assert_eq!(report.zero_filled, 0);
}

#[test]
fn normalize_reports_missing_and_zero_filled() {
    let rows = vec![vec!["Player", "Goals"], vec!["A", "-"], vec!["B", "1"]];
    let table = build_table(&rows);
    assert_eq!(missing_columns(&table, &["Goals", "Assists"]), vec!["Assists"]);

    let (table, report) = normalize_numeric_with_report(table, &["Goals", "Assists"]);
    assert_eq!(report.converted, vec!["Goals"]);
    assert_eq!(report.missing, vec!["Assists"]);
    assert_eq!(report.zero_filled, 1);
    assert_eq!(table.cell(0, "Goals"), Some(Cell::Number(0.0)));
}

#[test]
fn safe_int_convert_never_fails() {
    let inputs = [
        Some(Cell::Number(4.0)),
        Some(Cell::Number(f64::NAN)),
        Some(Cell::Text("12".to_string())),
        Some(Cell::Text("twelve".to_string())),
        Some(Cell::Text(String::new())),
        None,
    ];
    let out: Vec<i64> = inputs.iter().map(|c| safe_int_convert(c.as_ref())).collect();
    assert_eq!(out, vec![4, 0, 12, 0, 0, 0]);
}

#[test]
fn shot_accuracy_examples() {
    assert_eq!(shot_accuracy(0, 0), 0.0);
    assert_eq!(shot_accuracy(3, 1), 75.0);
}

#[test]
fn team_totals_on_empty_table_is_empty() {
    assert!(team_totals(&Table::empty()).is_empty());

    let header_only = normalize_numeric(build_table(&[vec!["Player", "Goals"]]), &["Goals"]);
    let totals = team_totals(&header_only);
    assert_eq!(totals.get("Goals"), Some(0.0));
    assert_eq!(totals.stat("Goals"), 0);
}

#[test]
fn top_n_is_stable_and_descending() {
    let table = goals_table(&["2", "5", "5", "1", "3", "0"]);

    let top2 = top_n(&table, "Goals", 2).expect("goals column exists");
    assert_eq!(top2.len(), 2);
    assert_eq!(top2[0].name, "P1");
    assert_eq!(top2[1].name, "P2");
    assert_eq!(top2[0].row, 1);
    assert_eq!(top2[1].row, 2);

    let top5 = top_n(&table, "Goals", 5).expect("goals column exists");
    let goals: Vec<i64> = top5.iter().map(|r| r.stat("Goals")).collect();
    assert_eq!(goals, vec![5, 5, 3, 2, 1]);
}

#[test]
fn top_n_caps_at_row_count() {
    let table = goals_table(&["1", "4"]);
    let top = top_n(&table, "Goals", 5).expect("goals column exists");
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].name, "P1");
}

#[test]
fn top_n_on_empty_table_is_empty() {
    let top = top_n(&Table::empty(), "Goals", 5).expect("empty table never fails");
    assert!(top.is_empty());
}

#[test]
fn top_n_unknown_column_is_not_found() {
    let table = goals_table(&["1"]);
    let err = top_n(&table, "Saves", 3).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "column not found: Saves");
}

#[test]
fn top_n_reads_text_columns_with_zero_fill() {
    let rows = vec![vec!["Player", "Goals"], vec!["A", "1"], vec!["B", "?"], vec!["C", "3"]];
    let table = build_table(&rows);
    let top = top_n(&table, "Goals", 3).expect("column exists");
    let names: Vec<&str> = top.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["C", "A", "B"]);
}

#[test]
fn lookup_player_first_match_wins() {
    let rows = vec![
        vec!["Player", "Goals"],
        vec!["A", "1"],
        vec!["A", "9"],
    ];
    let table = normalize_numeric(build_table(&rows), &["Goals"]);
    let a = lookup_player(&table, "A").expect("A exists");
    assert_eq!(a.row, 0);
    assert_eq!(a.stat("Goals"), 1);
    assert_eq!(player_names(&table), vec!["A"]);
}

#[test]
fn lookup_player_missing_is_not_found() {
    let table = goals_table(&["1"]);
    match lookup_player(&table, "Nobody") {
        Err(StatsError::NotFound { name, .. }) => assert_eq!(name, "Nobody"),
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(lookup_player(&Table::empty(), "Nobody").is_err());
}

#[test]
fn team_summary_on_empty_table_is_zeroed() {
    let summary = team_summary(&Table::empty());
    assert_eq!(summary.goals, 0);
    assert_eq!(summary.shooting.accuracy, 0.0);
    assert!(summary.top_scorers.is_empty());
    assert!(summary.top_assisters.is_empty());
}

#[test]
fn huge_shot_counts_do_not_overflow() {
    let rows = vec![
        vec!["Player", "Shots on target", "Shots off target", "Tackles Won"],
        vec!["A", "1e19", "1", "9223372036854775807"],
        vec!["B", "1e19", "3", "2"],
    ];
    let table = normalize_numeric(
        build_table(&rows),
        &["Shots on target", "Shots off target", "Tackles Won"],
    );

    let a = player_profile(&lookup_player(&table, "A").expect("A should exist"));
    assert_eq!(a.shooting.total, i64::MAX);
    assert_eq!(a.shooting.accuracy, 100.0);
    assert_eq!(a.radar_max(), i64::MAX);

    let summary = team_summary(&table);
    assert_eq!(summary.shooting.on_target, i64::MAX);
    assert_eq!(summary.shooting.total, i64::MAX);
    assert_eq!(summary.shooting.accuracy, 100.0);
}

#[test]
fn negative_zero_ties_with_zero() {
    let table = goals_table(&["-0", "0", "-0"]);
    let top = top_n(&table, "Goals", 3).expect("Goals exists");
    let names: Vec<_> = top.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["P0", "P1", "P2"]);
}
