// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::Path;

use retrace::model::{Fixation, FixationSet, Ledger, LineBoundarySet, ScreenId, TrialFlags, VisitPosition};
use retrace::session::{assemble, persist};
use retrace::stimulus::StimulusFile;
use retrace::store::{
    order_trials, read_sequence_state, write_sequence_state, ParticipantFolder, StoreError,
    TrialFolder, WriteDurability,
};

fn sid(id: u32) -> ScreenId {
    ScreenId::new(id).unwrap()
}

fn write_stimulus(dir: &Path) -> StimulusFile {
    let path = dir.join("stimulus.json");
    std::fs::write(
        &path,
        r#"{
  "linespacing": 60,
  "screens": [{"image": "img/1.png"}, {"image": "img/2.png"}],
  "lines": [
    {"screen": 1, "bbox": [80, 100, 1600, 40]},
    {"screen": 1, "bbox": [80, 160, 1600, 40]},
    {"screen": 2, "bbox": [80, 100, 1600, 40]}
  ]
}
"#,
    )
    .unwrap();
    StimulusFile::load(&path).unwrap()
}

fn fixation_set(x: i32) -> FixationSet {
    FixationSet::new(vec![Fixation::new(x, 110, 180), Fixation::new(x + 90, 170, 240)])
}

/// Screen 1 is visited, left for screen 2, and re-read; no line edits stored yet.
fn write_raw_trial(trial: &Path) {
    std::fs::create_dir_all(trial.join("screen_1")).unwrap();
    std::fs::create_dir_all(trial.join("screen_2")).unwrap();
    let fixations = |x: i32| {
        format!(
            r#"{{"version":1,"fixations":[{{"x":{x},"y":110,"duration":180}},{{"x":{},"y":170,"duration":240}}]}}"#,
            x + 90
        )
    };
    std::fs::write(trial.join("screen_1/fixations.json"), fixations(100)).unwrap();
    std::fs::write(trial.join("screen_1/fixations_1.json"), fixations(300)).unwrap();
    std::fs::write(trial.join("screen_2/fixations.json"), fixations(200)).unwrap();
    std::fs::write(
        trial.join("screen_sequence.json"),
        r#"{"version":1,"visits":[{"screen_id":1},{"screen_id":2},{"screen_id":1}]}"#,
    )
    .unwrap();
    std::fs::write(
        trial.join("flags.json"),
        r#"{"version":1,"edited":false,"is_wrong":false,"wrong_answer_count":0}"#,
    )
    .unwrap();
}

#[test]
fn hand_written_trial_assembles_with_stimulus_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let stimulus = write_stimulus(tmp.path());
    let trial = tmp.path().join("participant/Cuento");
    write_raw_trial(&trial);

    let state = assemble(&TrialFolder::new(&trial), &stimulus).unwrap();

    assert_eq!(state.ledger().screens(), &[sid(1), sid(2), sid(1)]);
    assert_eq!(state.visit(VisitPosition::new(0)).unwrap().fixations(), &fixation_set(100));
    assert_eq!(state.visit(VisitPosition::new(2)).unwrap().fixations(), &fixation_set(300));
    assert_eq!(
        state.visit(VisitPosition::new(0)).unwrap().lines().boundaries(),
        &[70, 130, 190]
    );
    assert_eq!(
        state.screen_image(sid(2)).unwrap().path(),
        tmp.path().join("img/2.png")
    );
}

#[test]
fn edits_survive_export_persist_and_reload() {
    let tmp = tempfile::tempdir().unwrap();
    let stimulus = write_stimulus(tmp.path());
    let trial = tmp.path().join("Cuento");
    write_raw_trial(&trial);
    let folder = TrialFolder::new(&trial).with_durability(WriteDurability::Durable);

    let mut state = assemble(&folder, &stimulus).unwrap();
    let exported = tmp.path().join("state.json");
    write_sequence_state(&exported, &state, WriteDurability::BestEffort).unwrap();
    assert_eq!(read_sequence_state(&exported).unwrap(), state);

    state.tombstone(VisitPosition::new(0)).unwrap();
    let lines = state.visit_mut(VisitPosition::new(2)).unwrap().lines_mut();
    lines.move_boundary(1, 135).unwrap();
    let report = persist(&folder, &state).unwrap();

    assert_eq!(report.ledger, [sid(2), sid(1)].into_iter().collect::<Ledger>());
    let names = {
        let mut names = std::fs::read_dir(trial.join("screen_1"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        names.sort();
        names
    };
    assert_eq!(names, vec!["fixations.json", "lines.json"]);

    let reloaded = assemble(&folder, &stimulus).unwrap();
    let revisit = reloaded.visit(VisitPosition::new(1)).unwrap();
    assert_eq!(revisit.screen_id(), sid(1));
    assert_eq!(revisit.fixations(), &fixation_set(300));
    assert_eq!(revisit.lines(), &LineBoundarySet::new(vec![70, 135, 190]).unwrap());

    let second = persist(&folder, &reloaded).unwrap();
    assert!(second.deleted_positions.is_empty());
    assert_eq!(assemble(&folder, &stimulus).unwrap(), reloaded);
}

#[test]
fn mismatched_ledger_is_reported_not_repaired() {
    let tmp = tempfile::tempdir().unwrap();
    let stimulus = write_stimulus(tmp.path());
    let trial = tmp.path().join("Cuento");
    write_raw_trial(&trial);
    std::fs::remove_file(trial.join("screen_1/fixations_1.json")).unwrap();

    let err = assemble(&TrialFolder::new(&trial), &stimulus).unwrap_err();

    assert!(matches!(err, StoreError::VisitCountMismatch { ledger: 2, stored: 1, .. }));
    assert!(trial.join("screen_sequence.json").is_file());
}

#[test]
fn participant_tracks_review_progress() {
    let tmp = tempfile::tempdir().unwrap();
    let participant = ParticipantFolder::new(tmp.path().join("p01"));
    for name in ["Arbol", "Cuento", "Luna"] {
        write_raw_trial(&participant.root().join(name));
    }
    assert!(!participant.all_edited(3).unwrap());

    for name in participant.trial_names().unwrap() {
        participant
            .trial(&name)
            .update_flags(TrialFlags::mark_edited)
            .unwrap();
    }

    assert!(participant.all_edited(3).unwrap());
    assert!(!participant.all_edited(4).unwrap());

    let order = ["Luna", "Sol", "Cuento", "Arbol"].map(String::from);
    assert_eq!(
        order_trials(&participant.trial_names().unwrap(), &order),
        vec!["Luna", "Cuento", "Arbol"]
    );
}
