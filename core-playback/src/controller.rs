//! # Playback Controller
//!
//! Owns the single [`AudioOutput`] and the playback state machine:
//!
//! ```text
//! Idle ──select──▶ Loading ──resolved──▶ Playing ⇄ Paused
//!   ▲                 │                     │
//!   └──── stop / failure / empty queue ◀────┘
//! ```
//!
//! Every selection takes a request token. A resolution finishing after a
//! newer selection started is discarded and reported as
//! [`PlaybackError::Superseded`] to its caller only. Host output events are
//! pushed in through [`PlaybackController::handle_output_event`]; nothing is
//! polled.

use crate::error::{PlaybackError, Result};
use crate::queue::{PlayQueue, RecentHistory};
use crate::resolver::{ResolutionOrigin, SongResolver};
use bridge_traits::playback::{AudioOutput, AudioOutputEvent};
use core_library::Song;
use core_runtime::events::{CoreEvent, EventBus, Notification, PlaybackEvent, PlaybackStatus};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Read-only view of the controller state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub current: Option<Song>,
    pub position: Duration,
    pub duration: Option<Duration>,
    /// Whether the current song plays from the offline store
    pub offline: bool,
}

struct ControllerState {
    status: PlaybackStatus,
    /// Last status outside Loading; what a failed selection falls back to.
    settled: PlaybackStatus,
    current: Option<Song>,
    offline: bool,
    position: Duration,
    duration: Option<Duration>,
    queue: PlayQueue,
    history: RecentHistory,
}

enum QueueUpdate {
    Replace(Vec<Song>),
    Keep,
}

pub struct PlaybackController {
    output: Arc<dyn AudioOutput>,
    resolver: Arc<SongResolver>,
    events: EventBus,
    state: Mutex<ControllerState>,
    selection: AtomicU64,
    restart_threshold: Duration,
}

impl PlaybackController {
    pub fn new(
        output: Arc<dyn AudioOutput>,
        resolver: Arc<SongResolver>,
        events: EventBus,
        history_limit: usize,
        restart_threshold: Duration,
    ) -> Self {
        Self {
            output,
            resolver,
            events,
            state: Mutex::new(ControllerState {
                status: PlaybackStatus::Idle,
                settled: PlaybackStatus::Idle,
                current: None,
                offline: false,
                position: Duration::ZERO,
                duration: None,
                queue: PlayQueue::new(),
                history: RecentHistory::new(history_limit),
            }),
            selection: AtomicU64::new(0),
            restart_threshold,
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Select `song` from the listing `queue` and start playing it.
    ///
    /// An empty `queue` makes the song its own single-entry queue.
    #[instrument(skip(self, song, queue), fields(song_id = %song.id))]
    pub async fn select(&self, song: Song, queue: Vec<Song>) -> Result<()> {
        self.start(song, QueueUpdate::Replace(queue)).await
    }

    /// Advance to the next queue entry, wrapping to the first.
    pub async fn next(&self) -> Result<()> {
        let target = self.state.lock().queue.peek_next().cloned();
        match target {
            Some(song) => self.start(song, QueueUpdate::Keep).await,
            None => Err(PlaybackError::EmptyQueue),
        }
    }

    /// Restart the current song while its position is within the restart
    /// threshold; otherwise step back one queue entry, wrapping to the last.
    pub async fn previous(&self) -> Result<()> {
        let (restart, target) = {
            let state = self.state.lock();
            let active = matches!(
                state.status,
                PlaybackStatus::Playing | PlaybackStatus::Paused
            );
            let restart = active
                && state.current.is_some()
                && state.position <= self.restart_threshold;
            (restart, state.queue.peek_previous().cloned())
        };

        if restart {
            return self.restart_current().await;
        }

        match target {
            Some(song) => self.start(song, QueueUpdate::Keep).await,
            None => Err(PlaybackError::EmptyQueue),
        }
    }

    /// Pause when playing, resume when paused.
    pub async fn toggle_play_pause(&self) -> Result<PlaybackStatus> {
        let (status, song_id, position) = {
            let state = self.state.lock();
            (
                state.status,
                state.current.as_ref().map(|s| s.id.clone()),
                state.position,
            )
        };

        match status {
            PlaybackStatus::Playing => {
                self.output.pause().await.map_err(PlaybackError::output)?;
                self.transition(PlaybackStatus::Paused);
                if let Some(song_id) = song_id {
                    self.emit(PlaybackEvent::Paused {
                        song_id,
                        position_ms: millis(position),
                    });
                }
                Ok(PlaybackStatus::Paused)
            }
            PlaybackStatus::Paused => {
                if let Err(e) = self.output.play().await {
                    let err = PlaybackError::output(e);
                    self.report(&err, song_id);
                    return Err(err);
                }
                self.transition(PlaybackStatus::Playing);
                if let Some(song_id) = song_id {
                    self.emit(PlaybackEvent::Resumed {
                        song_id,
                        position_ms: millis(position),
                    });
                }
                Ok(PlaybackStatus::Playing)
            }
            state => Err(PlaybackError::InvalidState {
                operation: "toggle playback",
                state,
            }),
        }
    }

    /// Stop playback and cancel any selection in flight.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<()> {
        self.selection.fetch_add(1, Ordering::SeqCst);
        let result = self.output.stop().await.map_err(PlaybackError::output);

        {
            let mut state = self.state.lock();
            state.current = None;
            state.offline = false;
            state.position = Duration::ZERO;
            state.duration = None;
        }
        self.transition(PlaybackStatus::Idle);
        self.emit(PlaybackEvent::Stopped);
        info!("Playback stopped");
        result
    }

    pub async fn seek(&self, position: Duration) -> Result<()> {
        let status = self.status();
        if !matches!(status, PlaybackStatus::Playing | PlaybackStatus::Paused) {
            return Err(PlaybackError::InvalidState {
                operation: "seek",
                state: status,
            });
        }

        self.output
            .seek(position)
            .await
            .map_err(PlaybackError::output)?;
        self.state.lock().position = position;
        Ok(())
    }

    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlaybackError::Internal(format!(
                "volume {} outside 0.0..=1.0",
                volume
            )));
        }
        self.output
            .set_volume(volume)
            .await
            .map_err(PlaybackError::output)
    }

    /// Translate a notification from the audio output into controller state.
    pub async fn handle_output_event(&self, event: AudioOutputEvent) -> Result<()> {
        match event {
            AudioOutputEvent::Started => {
                let resumed = {
                    let state = self.state.lock();
                    (state.status == PlaybackStatus::Paused)
                        .then(|| state.current.as_ref().map(|s| (s.id.clone(), state.position)))
                        .flatten()
                };
                if let Some((song_id, position)) = resumed {
                    self.transition(PlaybackStatus::Playing);
                    self.emit(PlaybackEvent::Resumed {
                        song_id,
                        position_ms: millis(position),
                    });
                }
            }
            AudioOutputEvent::Paused => {
                let paused = {
                    let state = self.state.lock();
                    (state.status == PlaybackStatus::Playing)
                        .then(|| state.current.as_ref().map(|s| (s.id.clone(), state.position)))
                        .flatten()
                };
                if let Some((song_id, position)) = paused {
                    self.transition(PlaybackStatus::Paused);
                    self.emit(PlaybackEvent::Paused {
                        song_id,
                        position_ms: millis(position),
                    });
                }
            }
            AudioOutputEvent::Ended => return self.handle_track_end().await,
            AudioOutputEvent::TimeUpdated { position } => {
                let update = {
                    let mut state = self.state.lock();
                    if state.status == PlaybackStatus::Loading {
                        None
                    } else {
                        state.position = position;
                        let duration = state.duration;
                        state.current.as_ref().map(|song| PlaybackEvent::PositionChanged {
                            song_id: song.id.clone(),
                            position_ms: millis(position),
                            duration_ms: duration
                                .map(millis)
                                .unwrap_or(u64::from(song.duration) * 1000),
                        })
                    }
                };
                if let Some(event) = update {
                    self.emit(event);
                }
            }
            AudioOutputEvent::MetadataLoaded { duration } => {
                let known = {
                    let mut state = self.state.lock();
                    let seconds = u32::try_from(duration.as_secs()).unwrap_or(u32::MAX);
                    state.duration = Some(duration);
                    let song_id = state.current.as_mut().map(|song| {
                        song.duration = seconds;
                        song.id.clone()
                    });
                    if let Some(id) = &song_id {
                        state.queue.set_duration(id, seconds);
                    }
                    song_id
                };
                if let Some(song_id) = known {
                    self.emit(PlaybackEvent::DurationKnown {
                        song_id,
                        duration_ms: millis(duration),
                    });
                }
            }
            AudioOutputEvent::Errored { message } => {
                let (status, song_id) = {
                    let state = self.state.lock();
                    (state.status, state.current.as_ref().map(|s| s.id.clone()))
                };
                if matches!(status, PlaybackStatus::Idle | PlaybackStatus::Loading) {
                    debug!(message = %message, "Ignoring output error outside playback");
                    return Ok(());
                }

                warn!(message = %message, "Audio output reported an error");
                self.state.lock().current = None;
                self.transition(PlaybackStatus::Idle);
                let err = PlaybackError::PlaybackFailure(message);
                self.report(&err, song_id);
                return Err(err);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn status(&self) -> PlaybackStatus {
        self.state.lock().status
    }

    pub fn current_song(&self) -> Option<Song> {
        self.state.lock().current.clone()
    }

    pub fn position(&self) -> Duration {
        self.state.lock().position
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let state = self.state.lock();
        PlaybackSnapshot {
            status: state.status,
            current: state.current.clone(),
            position: state.position,
            duration: state.duration,
            offline: state.offline,
        }
    }

    /// Recently played songs, most recent first.
    pub fn history(&self) -> Vec<Song> {
        self.state.lock().history.to_vec()
    }

    pub fn queue(&self) -> Vec<Song> {
        self.state.lock().queue.songs().to_vec()
    }

    /// The song auto-advance would pick next.
    pub fn next_in_queue(&self) -> Option<Song> {
        self.state.lock().queue.peek_next().cloned()
    }

    pub fn resolver(&self) -> &Arc<SongResolver> {
        &self.resolver
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn start(&self, mut song: Song, queue: QueueUpdate) -> Result<()> {
        let token = self.selection.fetch_add(1, Ordering::SeqCst) + 1;
        self.transition(PlaybackStatus::Loading);
        debug!(token, "Selection started");

        let resolved = self.resolver.resolve(&song).await;
        self.ensure_current(token)?;

        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(err) => {
                let restore = {
                    let mut state = self.state.lock();
                    if state.settled == PlaybackStatus::Idle {
                        state.current = None;
                    }
                    state.settled
                };
                self.transition(restore);
                self.report(&err, Some(song.id.clone()));
                return Err(err);
            }
        };

        if resolved.origin == ResolutionOrigin::Search {
            song.audio_url = resolved.url().map(str::to_string);
        }
        let offline = resolved.is_offline();

        let loaded = self.output.load(resolved.source).await;
        self.ensure_current(token)?;
        if let Err(e) = loaded {
            return Err(self.fail_output(PlaybackError::output(e), &song));
        }

        let played = self.output.play().await;
        self.ensure_current(token)?;
        if let Err(e) = played {
            return Err(self.fail_output(PlaybackError::output(e), &song));
        }

        {
            let mut state = self.state.lock();
            match queue {
                QueueUpdate::Replace(songs) => state.queue.replace(songs, &song),
                QueueUpdate::Keep => {
                    if !state.queue.select(&song.id) {
                        state.queue.replace(Vec::new(), &song);
                    }
                }
            }
            state.history.push(song.clone());
            state.duration = (song.duration > 0).then(|| Duration::from_secs(song.duration.into()));
            state.position = Duration::ZERO;
            state.offline = offline;
            state.current = Some(song.clone());
        }

        self.transition(PlaybackStatus::Playing);
        self.emit(PlaybackEvent::Started {
            song_id: song.id.clone(),
            title: song.title.clone(),
            offline,
        });
        info!(offline, "Playback started");
        Ok(())
    }

    async fn handle_track_end(&self) -> Result<()> {
        let (finished, next) = {
            let state = self.state.lock();
            if !matches!(
                state.status,
                PlaybackStatus::Playing | PlaybackStatus::Paused
            ) {
                debug!(status = %state.status, "Ignoring track end outside playback");
                return Ok(());
            }
            (
                state.current.as_ref().map(|s| s.id.clone()),
                state.queue.peek_next().cloned(),
            )
        };

        if let Some(song_id) = finished {
            self.emit(PlaybackEvent::Completed { song_id });
        }

        match next {
            Some(song) => {
                debug!(next = %song.id, "Auto-advancing");
                self.start(song, QueueUpdate::Keep).await
            }
            None => {
                {
                    let mut state = self.state.lock();
                    state.current = None;
                    state.position = Duration::ZERO;
                }
                self.transition(PlaybackStatus::Idle);
                Ok(())
            }
        }
    }

    async fn restart_current(&self) -> Result<()> {
        self.output
            .seek(Duration::ZERO)
            .await
            .map_err(PlaybackError::output)?;

        let restarted = {
            let mut state = self.state.lock();
            state.position = Duration::ZERO;
            let duration = state.duration;
            state.current.as_ref().map(|song| PlaybackEvent::PositionChanged {
                song_id: song.id.clone(),
                position_ms: 0,
                duration_ms: duration.map(millis).unwrap_or(u64::from(song.duration) * 1000),
            })
        };
        if let Some(event) = restarted {
            self.emit(event);
        }
        debug!("Restarted current song");
        Ok(())
    }

    fn ensure_current(&self, token: u64) -> Result<()> {
        if self.selection.load(Ordering::SeqCst) == token {
            Ok(())
        } else {
            debug!(token, "Discarding stale selection");
            Err(PlaybackError::Superseded)
        }
    }

    /// The output no longer holds the previous source; fall back to Idle.
    fn fail_output(&self, err: PlaybackError, song: &Song) -> PlaybackError {
        {
            let mut state = self.state.lock();
            state.current = None;
            state.position = Duration::ZERO;
        }
        self.transition(PlaybackStatus::Idle);
        self.report(&err, Some(song.id.clone()));
        err
    }

    /// Set the status and emit `StateChanged`; returns the previous status.
    fn transition(&self, to: PlaybackStatus) -> PlaybackStatus {
        let from = {
            let mut state = self.state.lock();
            if to != PlaybackStatus::Loading {
                state.settled = to;
            }
            std::mem::replace(&mut state.status, to)
        };
        if from != to {
            self.emit(PlaybackEvent::StateChanged { from, to });
        }
        from
    }

    fn report(&self, err: &PlaybackError, song_id: Option<String>) {
        if !err.is_user_facing() {
            return;
        }
        warn!(error = %err, song_id = ?song_id, "Playback error");
        self.emit(PlaybackEvent::Error {
            song_id,
            message: err.to_string(),
        });
        let _ = self.events.emit(CoreEvent::Notification(Notification::error(
            err.selection_class().as_str(),
            err.user_message(),
        )));
    }

    fn emit(&self, event: PlaybackEvent) {
        let _ = self.events.emit(CoreEvent::Playback(event));
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
