//! Interactive selection loop over the candidate sources.
//!
//! The loop renders the candidates, reads one command per line and dispatches
//! it. Playing a source keeps the session open; attaching one ends it
//! whatever the outcome, so a card is updated at most once per session.
//!
//! Commands:
//!
//! | input        | effect                                       |
//! |--------------|----------------------------------------------|
//! | `<n>`        | play source `n`                              |
//! | `a`, `a<n>`  | attach source `n` (default 0) and finish     |
//! | `e`          | finish without doing anything                |
//! | empty line   | show the list again                          |

use crate::attach::AttachmentExecutor;
use crate::config::MalformedCommandPolicy;
use crate::error::{CoreError, Result};
use crate::playback::PlaybackExecutor;
use crate::provider::{AudioSource, Identifier};
use crate::record::RecordId;
use crate::resolver::Resolution;
use regex::Regex;
use std::io::{BufRead, Write};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

#[allow(clippy::unwrap_used)]
static ATTACH_COMMAND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^a([0-9]*)$").unwrap());

#[allow(clippy::unwrap_used)]
static PLAY_COMMAND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// One parsed line of operator input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Empty,
    Exit,
    Play(usize),
    Attach(usize),
}

impl Command {
    /// Parse a line of operator input. Surrounding whitespace is ignored.
    ///
    /// Indices too large for `usize` saturate, so they are reported as out
    /// of range rather than as malformed input.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedCommand`] for anything that is not a
    /// recognized command.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Self::Empty);
        }
        if input == "e" {
            return Ok(Self::Exit);
        }
        if let Some(caps) = ATTACH_COMMAND.captures(input) {
            let digits = caps.get(1).map_or("", |m| m.as_str());
            let index = if digits.is_empty() { 0 } else { parse_index(digits) };
            return Ok(Self::Attach(index));
        }
        if PLAY_COMMAND.is_match(input) {
            return Ok(Self::Play(parse_index(input)));
        }
        Err(CoreError::MalformedCommand {
            input: input.to_string(),
        })
    }
}

fn parse_index(digits: &str) -> usize {
    digits.parse().unwrap_or(usize::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingCommand,
    Terminated,
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Operator exited (or input ended) without attaching anything
    Exited,
    /// The chosen source was attached under this filename
    Attached { filename: String },
    /// Attachment was attempted and failed; the card was not changed
    AttachFailed { reason: String },
}

/// Side effects a session can trigger
pub struct Executors<'a> {
    pub playback: PlaybackExecutor<'a>,
    pub attachment: AttachmentExecutor<'a>,
}

pub struct Session {
    sources: Vec<AudioSource>,
    identifier: Identifier,
    record_id: Option<RecordId>,
    state: SessionState,
    policy: MalformedCommandPolicy,
}

impl Session {
    #[must_use]
    pub fn new(
        resolution: Resolution,
        sources: Vec<AudioSource>,
        policy: MalformedCommandPolicy,
    ) -> Self {
        Self {
            sources,
            identifier: resolution.identifier,
            record_id: resolution.record_id,
            state: SessionState::AwaitingCommand,
            policy,
        }
    }

    #[must_use]
    pub fn sources(&self) -> &[AudioSource] {
        &self.sources
    }

    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    #[must_use]
    pub const fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Write the numbered source list, framed by blank lines.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn render(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out)?;
        for (i, source) in self.sources.iter().enumerate() {
            writeln!(out, " {i} {}", source.name)?;
        }
        writeln!(out)
    }

    /// Run the loop until the operator exits, attaches, or input ends.
    ///
    /// Recoverable errors (bad index, failed playback, missing card) are
    /// written to `output` and the prompt is shown again. Malformed commands
    /// follow the session's [`MalformedCommandPolicy`].
    ///
    /// # Errors
    ///
    /// Returns the first unrecoverable error, or an IO error from the
    /// operator streams.
    pub fn run<R: BufRead, W: Write>(
        mut self,
        mut input: R,
        mut output: W,
        executors: &Executors<'_>,
    ) -> Result<SessionOutcome> {
        info!(
            "Selecting audio for {} from {} source(s)",
            self.identifier,
            self.sources.len()
        );

        while self.state == SessionState::AwaitingCommand {
            self.render(&mut output)?;
            write!(output, "> ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                debug!("Operator input closed");
                self.state = SessionState::Terminated;
                break;
            }

            match self.dispatch(&line, executors, &mut output) {
                Ok(Some(outcome)) => return Ok(outcome),
                Ok(None) => {}
                Err(e) if self.is_reportable(&e) => {
                    warn!("{e}");
                    writeln!(output, "{e}")?;
                }
                Err(e) => {
                    self.state = SessionState::Terminated;
                    return Err(e);
                }
            }
        }

        Ok(SessionOutcome::Exited)
    }

    fn is_reportable(&self, error: &CoreError) -> bool {
        match error {
            CoreError::MalformedCommand { .. } => self.policy == MalformedCommandPolicy::Report,
            other => other.is_recoverable(),
        }
    }

    /// Handle one line of input.
    ///
    /// Returns `Some` once the session has terminated.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIndex`] for an out-of-range index,
    /// [`CoreError::NoResolvedRecord`] when attaching without a card,
    /// [`CoreError::MalformedCommand`] for unrecognized input, and any
    /// playback error. None of these change the session state.
    ///
    /// Attaching in a session without a card (direct lookup) is ordinary
    /// operator input here, so it is reported and the prompt continues
    /// instead of aborting. No store call is made.
    pub fn dispatch(
        &mut self,
        line: &str,
        executors: &Executors<'_>,
        output: &mut impl Write,
    ) -> Result<Option<SessionOutcome>> {
        match Command::parse(line)? {
            Command::Empty => Ok(None),
            Command::Exit => {
                self.state = SessionState::Terminated;
                Ok(Some(SessionOutcome::Exited))
            }
            Command::Play(index) => {
                let source = self.source(index)?;
                writeln!(output, "{}", source.url)?;
                executors.playback.play(source)?;
                Ok(None)
            }
            Command::Attach(index) => {
                let source = self.source(index)?.clone();
                let Some(record_id) = self.record_id else {
                    return Err(CoreError::NoResolvedRecord);
                };

                self.state = SessionState::Terminated;
                let (outcome, message) = match executors
                    .attachment
                    .attach(record_id, &self.identifier, &source)
                {
                    Ok(filename) => (
                        SessionOutcome::Attached {
                            filename: filename.clone(),
                        },
                        filename,
                    ),
                    Err(e) => {
                        warn!("Attaching {} failed: {e}", source.url);
                        let reason = e.to_string();
                        (
                            SessionOutcome::AttachFailed {
                                reason: reason.clone(),
                            },
                            reason,
                        )
                    }
                };
                // Echo failures do not change the outcome.
                if let Err(e) = writeln!(output, "{message}") {
                    warn!("Could not echo attach result: {e}");
                }
                Ok(Some(outcome))
            }
        }
    }

    fn source(&self, index: usize) -> Result<&AudioSource> {
        self.sources.get(index).ok_or(CoreError::InvalidIndex {
            index,
            len: self.sources.len(),
        })
    }
}
