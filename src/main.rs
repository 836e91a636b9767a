// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Retrace CLI entrypoint.
//!
//! Inspects, exports and edits trial folders. Logging goes to stderr and is configured through
//! `RETRACE_LOG` (default `warn`).

use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use retrace::model::{TrialFlags, VisitPosition};
use retrace::session::{assemble, persist};
use retrace::stimulus::StimulusFile;
use retrace::store::{
    read_sequence_state, sequence_state_to_string, write_sequence_state, ParticipantFolder,
    RewriteStrategy, StoreError, TrialFolder, WriteDurability,
};

const LOG_ENV: &str = "RETRACE_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "retrace",
    about = "Reconstruct, check and edit screen revisits of eye-tracking trials",
    version
)]
struct Cli {
    /// Flush files and directories to stable storage where supported.
    #[arg(long, global = true)]
    durable_writes: bool,

    /// Rewrite screen directories by delete-and-recreate instead of a staged swap.
    #[arg(long, global = true)]
    in_place_rewrites: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the visit ledger and stored visit counts per screen.
    Show {
        trial: PathBuf,
    },

    /// Assemble a trial and report whether it is consistent.
    Check(StimulusArgs),

    /// Write the assembled trial as JSON.
    Export {
        #[command(flatten)]
        target: StimulusArgs,
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Persist an edited sequence state and mark the trial edited.
    Persist {
        trial: PathBuf,
        state: PathBuf,
    },

    /// Delete one visit and persist the trial.
    #[command(name = "drop-visit")]
    DropVisit {
        #[command(flatten)]
        target: StimulusArgs,
        /// Ledger position of the visit.
        #[arg(long)]
        position: usize,
    },

    /// Toggle the trial's wrong flag.
    #[command(name = "flag-wrong")]
    FlagWrong {
        trial: PathBuf,
    },

    /// List the trials of a participant with their review status.
    Participant {
        dir: PathBuf,
        /// Number of trials the participant should have; defaults to the trials found.
        #[arg(long)]
        expected: Option<usize>,
    },
}

#[derive(Debug, Args)]
struct StimulusArgs {
    trial: PathBuf,
    /// Stimulus description (JSON) the trial was recorded with.
    #[arg(long)]
    stimulus: PathBuf,
}

impl Cli {
    fn durability(&self) -> WriteDurability {
        if self.durable_writes {
            WriteDurability::Durable
        } else {
            WriteDurability::BestEffort
        }
    }

    fn rewrite_strategy(&self) -> RewriteStrategy {
        if self.in_place_rewrites {
            RewriteStrategy::InPlace
        } else {
            RewriteStrategy::StagedSwap
        }
    }

    fn trial(&self, path: &Path) -> TrialFolder {
        TrialFolder::new(path)
            .with_durability(self.durability())
            .with_rewrite_strategy(self.rewrite_strategy())
    }
}

fn mark_edited(folder: &TrialFolder) -> Result<TrialFlags, StoreError> {
    let mut flags = match folder.load_flags() {
        Ok(flags) => flags,
        Err(StoreError::MissingFlags { path }) => {
            warn!(path = ?path, "trial has no flags; creating them");
            TrialFlags::default()
        }
        Err(err) => return Err(err),
    };
    flags.mark_edited();
    folder.save_flags(&flags)?;
    Ok(flags)
}

fn run(cli: &Cli, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    match &cli.command {
        Commands::Show { trial } => {
            let folder = cli.trial(trial);
            let ledger = folder.load_ledger()?;
            let order = ledger
                .screens()
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(out, "ledger: {order}")?;
            for screen_id in ledger.screen_ids() {
                writeln!(
                    out,
                    "screen {screen_id}: {} in ledger, {} stored",
                    ledger.occurrences(screen_id),
                    folder.stored_visit_count(screen_id)?
                )?;
            }
        }
        Commands::Check(target) => {
            let stimulus = StimulusFile::load(&target.stimulus)?;
            let state = assemble(&cli.trial(&target.trial), &stimulus)?;
            writeln!(
                out,
                "ok: {} visits on {} screens",
                state.len(),
                state.screens().len()
            )?;
        }
        Commands::Export { target, out: path } => {
            let stimulus = StimulusFile::load(&target.stimulus)?;
            let state = assemble(&cli.trial(&target.trial), &stimulus)?;
            match path {
                Some(path) => write_sequence_state(path, &state, cli.durability())?,
                None => out.write_all(sequence_state_to_string(&state)?.as_bytes())?,
            }
        }
        Commands::Persist { trial, state } => {
            let folder = cli.trial(trial);
            let state = read_sequence_state(state)?;
            let report = persist(&folder, &state)?;
            mark_edited(&folder)?;
            writeln!(
                out,
                "persisted {} visits, dropped {}",
                report.ledger.len(),
                report.deleted_positions.len()
            )?;
        }
        Commands::DropVisit { target, position } => {
            let folder = cli.trial(&target.trial);
            let stimulus = StimulusFile::load(&target.stimulus)?;
            let mut state = assemble(&folder, &stimulus)?;
            state.tombstone(VisitPosition::new(*position))?;
            let report = persist(&folder, &state)?;
            mark_edited(&folder)?;
            writeln!(out, "dropped visit {position}; {} visits remain", report.ledger.len())?;
        }
        Commands::FlagWrong { trial } => {
            let flags = cli.trial(trial).update_flags(TrialFlags::toggle_wrong)?;
            writeln!(out, "wrong: {}", flags.is_wrong)?;
        }
        Commands::Participant { dir, expected } => {
            let participant = ParticipantFolder::new(dir)
                .with_durability(cli.durability())
                .with_rewrite_strategy(cli.rewrite_strategy());
            let flags = participant.load_all_flags()?;
            for (name, trial_flags) in &flags {
                writeln!(out, "{}{name}", trial_flags.status_marker())?;
            }
            let all_edited = participant.all_edited(expected.unwrap_or(flags.len()))?;
            writeln!(out, "all edited: {all_edited}")?;
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let stdout = std::io::stdout();
    if let Err(err) = run(&cli, &mut stdout.lock()) {
        eprintln!("retrace: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{mark_edited, run, Cli, Commands};
    use retrace::model::{Fixation, FixationSet, Ledger, LineBoundarySet, ScreenId, TrialFlags};
    use retrace::store::{RewriteStrategy, TrialFolder, WriteDurability};

    fn sid(id: u32) -> ScreenId {
        ScreenId::new(id).unwrap()
    }

    fn seed(folder: &TrialFolder) {
        let lines = LineBoundarySet::new(vec![73, 128, 183]).unwrap();
        let fixations = |x| FixationSet::new(vec![Fixation::new(x, 120, 200)]);
        folder
            .write_visits(sid(1), &[fixations(100), fixations(300)], &[lines.clone(), lines.clone()])
            .unwrap();
        folder.write_visits(sid(2), &[fixations(200)], &[lines]).unwrap();
        folder
            .save_ledger(&[sid(1), sid(2), sid(1)].into_iter().collect::<Ledger>())
            .unwrap();
        folder.save_flags(&TrialFlags::default()).unwrap();
    }

    fn run_to_string(args: &[&str]) -> String {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        run(&cli, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_global_flags_after_the_command() {
        let cli = Cli::try_parse_from(["retrace", "show", "trial", "--durable-writes"]).unwrap();
        assert_eq!(cli.durability(), WriteDurability::Durable);
        assert_eq!(cli.rewrite_strategy(), RewriteStrategy::StagedSwap);
        assert!(matches!(cli.command, Commands::Show { .. }));
    }

    #[test]
    fn parses_in_place_rewrites() {
        let cli = Cli::try_parse_from([
            "retrace",
            "--in-place-rewrites",
            "drop-visit",
            "trial",
            "--stimulus",
            "stimulus.json",
            "--position",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.rewrite_strategy(), RewriteStrategy::InPlace);
        match cli.command {
            Commands::DropVisit { target, position } => {
                assert_eq!(position, 2);
                assert_eq!(target.stimulus.to_str(), Some("stimulus.json"));
            }
            other => panic!("expected drop-visit, got: {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_stimulus() {
        assert!(Cli::try_parse_from(["retrace", "check", "trial"]).is_err());
    }

    #[test]
    fn rejects_non_numeric_position() {
        assert!(Cli::try_parse_from([
            "retrace",
            "drop-visit",
            "trial",
            "--stimulus",
            "s.json",
            "--position",
            "last"
        ])
        .is_err());
    }

    #[test]
    fn show_prints_ledger_and_counts() {
        let tmp = tempfile::tempdir().unwrap();
        let trial = tmp.path().join("Cuento");
        seed(&TrialFolder::new(&trial));

        let out = run_to_string(&["retrace", "show", trial.to_str().unwrap()]);

        assert_eq!(
            out,
            "ledger: 1 2 1\nscreen 1: 2 in ledger, 2 stored\nscreen 2: 1 in ledger, 1 stored\n"
        );
    }

    #[test]
    fn flag_wrong_toggles_and_marks_edited() {
        let tmp = tempfile::tempdir().unwrap();
        let trial = tmp.path().join("Cuento");
        let folder = TrialFolder::new(&trial);
        seed(&folder);

        let out = run_to_string(&["retrace", "flag-wrong", trial.to_str().unwrap()]);

        assert_eq!(out, "wrong: true\n");
        let flags = folder.load_flags().unwrap();
        assert!(flags.is_wrong && flags.edited);
    }

    #[test]
    fn mark_edited_creates_missing_flags_and_keeps_existing_ones() {
        let tmp = tempfile::tempdir().unwrap();
        let fresh = TrialFolder::new(tmp.path().join("Arbol"));
        std::fs::create_dir_all(fresh.root()).unwrap();

        let flags = mark_edited(&fresh).unwrap();
        assert_eq!(flags, TrialFlags { edited: true, ..TrialFlags::default() });
        assert_eq!(fresh.load_flags().unwrap(), flags);

        let flagged = TrialFolder::new(tmp.path().join("Cuento"));
        seed(&flagged);
        flagged.update_flags(TrialFlags::toggle_wrong).unwrap();
        let flags = mark_edited(&flagged).unwrap();
        assert!(flags.edited && flags.is_wrong);
    }

    #[test]
    fn mark_edited_propagates_unreadable_flags() {
        let tmp = tempfile::tempdir().unwrap();
        let folder = TrialFolder::new(tmp.path().join("Cuento"));
        seed(&folder);
        std::fs::write(folder.flags_path(), "{").unwrap();

        assert!(mark_edited(&folder).is_err());
    }

    #[test]
    fn participant_lists_status_markers() {
        let tmp = tempfile::tempdir().unwrap();
        seed(&TrialFolder::new(tmp.path().join("Arbol")));
        let edited = TrialFolder::new(tmp.path().join("Cuento"));
        seed(&edited);
        edited.update_flags(TrialFlags::mark_edited).unwrap();

        let out = run_to_string(&["retrace", "participant", tmp.path().to_str().unwrap()]);

        assert_eq!(out, "Arbol\n\u{2705} Cuento\nall edited: false\n");
    }
}
