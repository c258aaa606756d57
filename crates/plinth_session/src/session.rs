//! Load session state machine.
//!
//! Tracks the lifecycle of one load attempt (Idle -> Picking -> Loading ->
//! Ready/Failed) and runs the decode off the host thread. Only one session
//! is live at a time; a new pick while a load is in flight is rejected, and
//! a cancelled load's eventual completion is discarded by generation tag.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use thiserror::Error;

use plinth_core::error::{ErrorKind, LoadResult};
use plinth_core::loader::CancelFlag;
use plinth_core::scene::{Asset, SceneNode};

use crate::placement::{LiveScene, PlacementController};

/// Pluggable decode entry point, so the state machine is testable without
/// fixture files.
pub type LoaderFn = Arc<dyn Fn(&Path, &CancelFlag) -> LoadResult<Asset> + Send + Sync>;

/// Current lifecycle state of the session.
#[derive(Clone, Debug)]
pub enum SessionState {
    /// Nothing in flight, nothing picked
    Idle,

    /// Waiting on the host's file picker
    Picking,

    /// Worker thread is decoding the picked file
    Loading,

    /// Decode finished; the root is placed in the live scene
    Ready(Arc<SceneNode>),

    /// Decode failed; the previously placed model (if any) is untouched
    Failed(ErrorKind),
}

/// Errors reported to the host for disallowed transitions.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// A load is in flight; the picker must stay suppressed until it
    /// finishes or is cancelled
    #[error("a load is already in progress")]
    LoadInProgress,

    /// `pick_completed` or `cancel_pick` called outside of `Picking`
    #[error("no pick in progress")]
    NotPicking,
}

struct Completion {
    generation: u64,
    result: LoadResult<Asset>,
}

/// Drives one asset load at a time: pick, decode on a worker thread, place.
///
/// The host calls [`LoadSession::poll`] once per frame (or timer tick) with
/// its live scene; completed loads are applied there, on the host thread.
pub struct LoadSession {
    state: SessionState,
    /// Monotonic tag; completions from older generations are stale
    generation: u64,
    cancel: CancelFlag,
    loader: LoaderFn,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    worker: Option<JoinHandle<()>>,
    placement: PlacementController,
}

impl Default for LoadSession {
    fn default() -> Self {
        Self::new(Arc::new(|path, cancel| {
            plinth_core::loader::load_asset(path, cancel)
        }))
    }
}

impl LoadSession {
    /// Create a session with a custom loader.
    pub fn new(loader: LoaderFn) -> Self {
        let (sender, receiver) = channel();
        Self {
            state: SessionState::Idle,
            generation: 0,
            cancel: CancelFlag::new(),
            loader,
            sender,
            receiver,
            worker: None,
            placement: PlacementController::new(),
        }
    }

    /// Create a session that places models at anchor composed with `offset`.
    pub fn with_placement(loader: LoaderFn, placement: PlacementController) -> Self {
        Self {
            placement,
            ..Self::new(loader)
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The currently placed model root, if any.
    pub fn placed(&self) -> Option<&Arc<SceneNode>> {
        self.placement.placed()
    }

    /// Start a new pick.
    ///
    /// Allowed from `Idle`, `Ready`, and `Failed` (the previous result is
    /// discarded, but a placed model stays in the scene until the next load
    /// replaces it). Rejected while `Loading`.
    pub fn begin_pick(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Loading => Err(SessionError::LoadInProgress),
            SessionState::Picking => Ok(()),
            _ => {
                self.state = SessionState::Picking;
                Ok(())
            }
        }
    }

    /// The host's picker was dismissed without a selection.
    pub fn cancel_pick(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Picking => {
                self.state = SessionState::Idle;
                Ok(())
            }
            _ => Err(SessionError::NotPicking),
        }
    }

    /// The host's picker chose a file: start decoding it on a worker thread.
    pub fn pick_completed(&mut self, path: PathBuf) -> Result<(), SessionError> {
        if !matches!(self.state, SessionState::Picking) {
            return Err(SessionError::NotPicking);
        }

        self.generation += 1;
        self.cancel = CancelFlag::new();
        self.state = SessionState::Loading;

        let generation = self.generation;
        let cancel = self.cancel.clone();
        let loader = Arc::clone(&self.loader);
        let sender = self.sender.clone();

        log::info!("load #{generation} started for {path:?}");
        self.worker = Some(std::thread::spawn(move || {
            let result = loader(&path, &cancel);
            // The session may have been dropped; nothing to deliver to then
            let _ = sender.send(Completion { generation, result });
        }));

        Ok(())
    }

    /// Abandon the in-flight load and return to `Idle`.
    ///
    /// The worker is signalled through the cancel flag and its eventual
    /// completion is discarded by generation mismatch.
    pub fn cancel_load(&mut self) {
        if !matches!(self.state, SessionState::Loading) {
            return;
        }

        log::info!("load #{} cancelled", self.generation);
        self.cancel.cancel();
        self.generation += 1;
        self.state = SessionState::Idle;
    }

    /// Apply any finished load to the session and the live scene.
    ///
    /// Call this from the host thread. Completions are applied in arrival
    /// order; stale ones (superseded or cancelled loads) are discarded
    /// without touching the scene.
    pub fn poll(&mut self, scene: &mut dyn LiveScene) {
        while let Ok(completion) = self.receiver.try_recv() {
            if completion.generation != self.generation {
                log::debug!(
                    "discarding stale completion #{} (current #{})",
                    completion.generation,
                    self.generation
                );
                continue;
            }

            match completion.result {
                Ok(asset) => {
                    let root = Arc::new(asset.root);
                    // Place first; the previous model is removed by the
                    // placement controller after the new one is in
                    self.placement.place(scene, Some(Arc::clone(&root)));
                    log::info!("load #{} ready: '{}'", self.generation, root.name);
                    self.state = SessionState::Ready(root);
                }
                Err(err) => {
                    log::warn!("load #{} failed: {err}", self.generation);
                    self.state = SessionState::Failed(err.kind());
                }
            }
        }
    }

    /// Remove the placed model from the live scene.
    pub fn clear_placement(&mut self, scene: &mut dyn LiveScene) {
        self.placement.clear(scene);
    }
}
