//! Per-repository confirmation

use anyhow::{Context, Result};
use dialoguer::Input;
use tracing::warn;

use crate::discovery::RepoDescriptor;

/// Decides whether a repository's mirrors get replaced
pub trait Confirmer {
    fn confirm(&mut self, repo: &RepoDescriptor) -> Result<bool>;
}

/// Only a lone `y` or `Y` counts as yes
pub fn is_affirmative(answer: &str) -> bool {
    answer.eq_ignore_ascii_case("y")
}

/// Asks the operator on the terminal
#[derive(Debug, Default)]
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&mut self, repo: &RepoDescriptor) -> Result<bool> {
        warn!(
            "Push mirrors of {} will be deleted and recreated ({} existing)",
            repo.full_name(),
            repo.mirrors.len()
        );

        let answer: String = Input::new()
            .with_prompt(format!("[WARN] Sync {}? [y/N]", repo.name))
            .allow_empty(true)
            .report(false)
            .interact_text()
            .context("Failed to read confirmation")?;

        Ok(is_affirmative(&answer))
    }
}

/// Confirms everything without asking (`--yes`)
#[derive(Debug, Default)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&mut self, _repo: &RepoDescriptor) -> Result<bool> {
        Ok(true)
    }
}

/// Replays a fixed list of answers, declining once they run out
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    answers: std::collections::VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedConfirmer {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Full names of the repositories asked about, in order
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&mut self, repo: &RepoDescriptor) -> Result<bool> {
        self.asked.push(repo.full_name());
        let answer = self.answers.pop_front().unwrap_or_default();
        Ok(is_affirmative(&answer))
    }
}
