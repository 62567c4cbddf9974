//! Built-in demo track

use miniseq_core::Track;

const CHANNEL: u8 = 0;
const VELOCITY: u8 = 100;

/// C major scale, C4 to C5
const SCALE: [u8; 8] = [60, 62, 64, 65, 67, 69, 71, 72];
/// C major arpeggio
const ARPEGGIO: [u8; 4] = [60, 64, 67, 72];

/// Two bars of C major scale then two bars of arpeggio, all quarter notes
pub fn demo_track(ppq: u32) -> Track {
    let beat = ppq as u64;
    let mut track = Track::new();
    let notes = SCALE.iter().chain(ARPEGGIO.iter()).chain(ARPEGGIO.iter());
    for (index, &note) in notes.enumerate() {
        track.add_quarter(CHANNEL, note, VELOCITY, index as u64 * beat, ppq);
    }
    track
}
