//! Battle session - the single cooperative task that drives a battle
//!
//! Each loop iteration handles one of:
//! - a presenter command (initialize, submit move, abandon)
//! - a commentary line arriving from the narrator
//! - the pending timer (land strike -> settle -> opponent move)
//!
//! Only one timer is ever pending. Abandoning or re-initializing drops it,
//! so nothing scheduled for a discarded battle can touch the new state.
//! A fresh snapshot is published after every iteration, and before any
//! command reply is sent.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};

use crate::battle::controller::{MoveRejection, TurnController};
use crate::battle::state::{BattleSnapshot, TurnPhase};
use crate::core::config::ArenaConfig;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{BattleId, Side, TemplateId};
use crate::llm::commentary::{CommentaryGateway, CommentaryLine, Narrator};

pub type MoveResult = std::result::Result<(), MoveRejection>;

/// Presenter -> core requests
enum SessionCommand {
    Initialize {
        template_id: TemplateId,
        reply: oneshot::Sender<Result<BattleId>>,
    },
    SubmitMove {
        side: Side,
        move_index: usize,
        reply: oneshot::Sender<MoveResult>,
    },
    Abandon,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingAction {
    LandStrike,
    Settle,
    OpponentMove,
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    action: PendingAction,
    deadline: Instant,
}

/// Cloneable handle used by presenters
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<BattleSnapshot>,
}

impl SessionHandle {
    /// Start a new battle with the player's chosen creature
    pub async fn initialize_battle(&self, template_id: TemplateId) -> Result<BattleId> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Initialize { template_id, reply })?;
        response.await.map_err(|_| ArenaError::SessionClosed)?
    }

    /// Submit a move for `side`. An ignored move is reported, not an error.
    pub async fn submit_move(&self, side: Side, move_index: usize) -> Result<MoveResult> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::SubmitMove {
            side,
            move_index,
            reply,
        })?;
        response.await.map_err(|_| ArenaError::SessionClosed)
    }

    /// Leave the current battle, cancelling anything still scheduled
    pub fn abandon(&self) -> Result<()> {
        self.send(SessionCommand::Abandon)
    }

    /// Stop the session task
    pub fn shutdown(&self) -> Result<()> {
        self.send(SessionCommand::Shutdown)
    }

    /// Latest published state
    pub fn snapshot(&self) -> BattleSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<BattleSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a published snapshot satisfies `predicate`
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&BattleSnapshot) -> bool,
    ) -> Result<BattleSnapshot> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| ArenaError::SessionClosed)?;
        Ok(snapshot.clone())
    }

    fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| ArenaError::SessionClosed)
    }
}

/// Owns the turn controller for the lifetime of the session
pub struct BattleSession {
    controller: TurnController,
    narrator: Narrator,
    strike_delay: Duration,
    recovery_delay: Duration,
    opponent_delay: Duration,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    commentary: mpsc::UnboundedReceiver<CommentaryLine>,
    snapshots: watch::Sender<BattleSnapshot>,
    pending: Option<Scheduled>,
}

impl BattleSession {
    pub fn new(
        controller: TurnController,
        gateway: Option<Arc<dyn CommentaryGateway>>,
        config: &ArenaConfig,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        let session = Self {
            controller,
            narrator: Narrator::new(gateway, config.commentary_timeout(), line_tx),
            strike_delay: config.strike_delay(),
            recovery_delay: config.recovery_delay(),
            opponent_delay: config.opponent_delay(),
            commands: command_rx,
            commentary: line_rx,
            snapshots: snapshot_tx,
            pending: None,
        };
        let handle = SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (session, handle)
    }

    /// Build a session and run it on the current tokio runtime
    pub fn spawn(
        controller: TurnController,
        gateway: Option<Arc<dyn CommentaryGateway>>,
        config: &ArenaConfig,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (session, handle) = Self::new(controller, gateway, config);
        (handle, tokio::spawn(session.run()))
    }

    pub async fn run(mut self) {
        loop {
            let deadline = self.pending.map(|p| p.deadline);

            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },

                Some(line) = self.commentary.recv() => {
                    self.controller.append_commentary(line.battle_id, line.text);
                }

                _ = wait_until(deadline) => self.fire_pending(),
            }

            self.publish();
        }

        tracing::debug!("Battle session stopped");
    }

    /// Replies go out only after this, so a caller never sees older state
    fn publish(&self) {
        self.snapshots.send_replace(self.controller.snapshot());
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Initialize { template_id, reply } => {
                let result = self
                    .controller
                    .initialize_battle(template_id)
                    .map(|state| state.battle_id);

                if let Ok(battle_id) = result {
                    self.pending = None;
                    if let Some(intro) = self.controller.intro_commentary() {
                        self.narrator.narrate(battle_id, intro);
                    }
                }
                self.publish();
                let _ = reply.send(result);
            }
            SessionCommand::SubmitMove {
                side,
                move_index,
                reply,
            } => {
                let result = self.controller.submit_move(side, move_index);
                match result {
                    Ok(()) => self.schedule(PendingAction::LandStrike, self.strike_delay),
                    Err(rejection) => {
                        tracing::debug!("Ignored {} move {}: {}", side, move_index, rejection)
                    }
                }
                self.publish();
                let _ = reply.send(result);
            }
            SessionCommand::Abandon => {
                self.pending = None;
                self.controller.abandon();
            }
            SessionCommand::Shutdown => {}
        }
    }

    fn fire_pending(&mut self) {
        let Some(scheduled) = self.pending.take() else {
            return;
        };

        match scheduled.action {
            PendingAction::LandStrike => {
                if let Some(report) = self.controller.land_strike() {
                    self.narrator.narrate(report.battle_id, report.commentary());
                    self.schedule(PendingAction::Settle, self.recovery_delay);
                }
            }
            PendingAction::Settle => {
                if let Some(TurnPhase::OpponentTurn) = self.controller.settle() {
                    self.schedule(PendingAction::OpponentMove, self.opponent_delay);
                }
            }
            PendingAction::OpponentMove => {
                if self.controller.take_opponent_turn().is_some() {
                    self.schedule(PendingAction::LandStrike, self.strike_delay);
                }
            }
        }
    }

    fn schedule(&mut self, action: PendingAction, delay: Duration) {
        self.pending = Some(Scheduled {
            action,
            deadline: Instant::now() + delay,
        });
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
