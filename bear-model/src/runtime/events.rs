use crate::{Action, Snapshot, SoundDescription};

/// Side effects requested by a model while it plays.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    /// The playback reached a snapshot carrying a function name.
    Function {
        action: String,
        date: f64,
        name: String,
    },
    /// A sound must be played. `global` sounds are not attached to the
    /// position of the model.
    Sound {
        action: String,
        file: String,
        global: bool,
    },
}

pub trait PlaybackListener {
    fn on_event(&mut self, event: &PlaybackEvent);
}

impl<F> PlaybackListener for F
where
    F: FnMut(&PlaybackEvent),
{
    fn on_event(&mut self, event: &PlaybackEvent) {
        (*self)(event)
    }
}

/// Listener slot and random source shared by the players.
pub(crate) struct EventSink {
    listener: Option<Box<dyn PlaybackListener>>,
    rng: fastrand::Rng,
}

impl EventSink {
    pub(crate) fn new(rng: fastrand::Rng) -> Self {
        Self {
            listener: None,
            rng,
        }
    }

    pub(crate) fn set_listener(&mut self, listener: Box<dyn PlaybackListener>) {
        self.listener = Some(listener);
    }

    pub(crate) fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Reports the function and a random sound of `snapshot`.
    pub(crate) fn snapshot_reached(&mut self, action: &Action, snapshot: &Snapshot) {
        let Some(listener) = self.listener.as_mut() else {
            return;
        };

        if let Some(name) = snapshot.function() {
            listener.on_event(&PlaybackEvent::Function {
                action: action.name().to_string(),
                date: snapshot.date(),
                name: name.to_string(),
            });
        }

        Self::play(listener.as_mut(), &mut self.rng, action, &snapshot.sound);
    }

    /// Reports a random sound of the action itself.
    pub(crate) fn action_started(&mut self, action: &Action) {
        if let Some(listener) = self.listener.as_mut() {
            Self::play(listener.as_mut(), &mut self.rng, action, &action.sound);
        }
    }

    fn play(
        listener: &mut dyn PlaybackListener,
        rng: &mut fastrand::Rng,
        action: &Action,
        sound: &SoundDescription,
    ) {
        if let Some(file) = sound.random_file(rng) {
            listener.on_event(&PlaybackEvent::Sound {
                action: action.name().to_string(),
                file: file.to_string(),
                global: sound.global,
            });
        }
    }
}
