//! Sound cues
//!
//! Every cue is optional: a sound that fails to load logs a warning and its
//! cue becomes silent. Scenes trigger cues from event subscribers, keeping
//! gameplay code free of audio calls.

use macroquad::audio::{load_sound, play_sound_once, Sound};
use macroquad::logging::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Jump = 0,
    Land,
    Walk,
    MineTick,
    BlockDestroy,
    BlockLand,
    Death,
    Select,
    Extinguish,
}

impl Cue {
    const ALL: [Cue; 9] = [
        Cue::Jump,
        Cue::Land,
        Cue::Walk,
        Cue::MineTick,
        Cue::BlockDestroy,
        Cue::BlockLand,
        Cue::Death,
        Cue::Select,
        Cue::Extinguish,
    ];

    const COUNT: usize = Self::ALL.len();

    fn path(self) -> &'static str {
        match self {
            Cue::Jump => "assets/audio/jump.wav",
            Cue::Land => "assets/audio/land.wav",
            Cue::Walk => "assets/audio/walk.wav",
            Cue::MineTick => "assets/audio/mine-tick.wav",
            Cue::BlockDestroy => "assets/audio/block-destroy.wav",
            Cue::BlockLand => "assets/audio/block-land.wav",
            Cue::Death => "assets/audio/death.wav",
            Cue::Select => "assets/audio/select.wav",
            Cue::Extinguish => "assets/audio/extinguish.wav",
        }
    }
}

pub struct SoundBank {
    sounds: [Option<Sound>; Cue::COUNT],
}

impl SoundBank {
    pub async fn load() -> SoundBank {
        let mut sounds: [Option<Sound>; Cue::COUNT] = Default::default();
        for cue in Cue::ALL {
            match load_sound(cue.path()).await {
                Ok(sound) => sounds[cue as usize] = Some(sound),
                Err(e) => warn!("sound '{}' unavailable: {}", cue.path(), e),
            }
        }
        SoundBank { sounds }
    }

    pub fn play(&self, cue: Cue) {
        if let Some(sound) = &self.sounds[cue as usize] {
            play_sound_once(sound);
        }
    }
}
