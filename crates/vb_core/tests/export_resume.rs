use vb_core::{
    read_action_csv, ExportTables, ImportedMatch, MatchConfig, MatchController, RallyStatus,
    SetScore, Winner,
};

const ACTIONS: &str = "\
Player,Position,Action,Outcome,Attack_Type,Timestamp,Notes
Ana,OPP,serve,good,,,
Bea,OH1,attack,kill,normal,,
Ana,OPP,serve,error,,,
Kim,L,receive,perfect,,,
Cy,S,set,good,,,
Dee,MB1,attack,blocked,,,
,OPPONENT,opponent_error,serve_error,,,
Ana,OPP,dig,good,,,
";

/// Replay an action stream, export, read the tables back and resume.
#[test]
fn test_export_then_resume() {
    // blocked attack without an attack type is rejected at row 6
    let err = read_action_csv(ACTIONS.as_bytes()).unwrap_err();
    match err {
        vb_core::EngineError::Validation(e) => assert_eq!(e.row(), Some(6)),
        other => panic!("unexpected {:?}", other),
    }

    let fixed = ACTIONS.replace("attack,blocked,,", "attack,blocked,tip,");
    let actions = read_action_csv(fixed.as_bytes()).unwrap();
    assert_eq!(actions.len(), 8);

    let config = MatchConfig::default();
    let mut tracker = MatchController::new(config.clone()).unwrap();
    let mut sealed = 0;
    for action in actions {
        if let RallyStatus::Sealed(_) = tracker.record_action(action).unwrap() {
            sealed += 1;
        }
    }
    // kill, serve error, blocked, opponent serve error; the dig stays open
    assert_eq!(sealed, 4);
    let live = tracker.current_snapshot();
    assert_eq!(live.score, SetScore::new(2, 2));
    assert_eq!(live.rally_actions.len(), 1);

    let tables = ExportTables::from_match(tracker.match_record());
    assert_eq!(tables.team.len(), 4);
    // opponent row dropped, open rally not exported
    assert_eq!(tables.individual.len(), 6);

    let dir = tempfile::tempdir().unwrap();
    let (individual_path, team_path) = tables.write_csv(dir.path(), "scrimmage").unwrap();
    let imported = ImportedMatch::from_csv_readers(
        std::fs::File::open(individual_path).unwrap(),
        std::fs::File::open(team_path).unwrap(),
    )
    .unwrap();
    assert!(!imported.has_estimated_rotations());

    let resume = imported.resume_state(&config).unwrap();
    assert_eq!(resume.score, live.score);
    assert_eq!(resume.state, live.state());
    assert_eq!(resume.next_point, live.point);

    let resumed = MatchController::resume(imported.inferred_config(&config), &resume).unwrap();
    let snap = resumed.current_snapshot();
    assert_eq!(snap.rotation, live.rotation);
    assert_eq!(snap.serving_phase, live.serving_phase);
    assert_eq!(snap.match_winner, Winner::Undecided);
}
