//! Raw MIDI message constructors
//!
//! Status bytes carry the channel in their low nibble, data bytes are masked
//! to 7 bits.

/// Note Off status byte
pub const NOTE_OFF: u8 = 0x80;
/// Note On status byte
pub const NOTE_ON: u8 = 0x90;
/// Control Change status byte
pub const CONTROL_CHANGE: u8 = 0xB0;

/// CC 120: silence every sounding voice on a channel
pub const ALL_SOUND_OFF: u8 = 0x78;
/// CC 121: return all controllers to their defaults
pub const RESET_ALL_CONTROLLERS: u8 = 0x79;

/// Number of MIDI channels
pub const CHANNELS: u8 = 16;

/// Note On: channel (0-15), note (0-127), velocity (0-127)
pub fn note_on(channel: u8, note: u8, velocity: u8) -> Vec<u8> {
    vec![NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
}

/// Note Off: channel (0-15), note (0-127)
pub fn note_off(channel: u8, note: u8) -> Vec<u8> {
    vec![NOTE_OFF | (channel & 0x0F), note & 0x7F, 0]
}

/// Control Change: channel, controller number, value
pub fn control_change(channel: u8, controller: u8, value: u8) -> Vec<u8> {
    vec![
        CONTROL_CHANGE | (channel & 0x0F),
        controller & 0x7F,
        value & 0x7F,
    ]
}

/// The two messages sent per channel on panic: all sound off, then reset
/// all controllers
pub fn panic_messages(channel: u8) -> [Vec<u8>; 2] {
    [
        control_change(channel, ALL_SOUND_OFF, 0),
        control_change(channel, RESET_ALL_CONTROLLERS, 0),
    ]
}

/// True if the message is a Control Change
pub fn is_control_change(msg: &[u8]) -> bool {
    msg.first().map_or(false, |s| s & 0xF0 == CONTROL_CHANGE)
}

/// Human readable form used in logs
pub fn describe(msg: &[u8]) -> String {
    match msg {
        [status, a, b] => {
            let channel = (status & 0x0F) + 1;
            match status & 0xF0 {
                NOTE_ON if *b > 0 => format!("NoteOn ch{} note {} vel {}", channel, a, b),
                NOTE_ON | NOTE_OFF => format!("NoteOff ch{} note {}", channel, a),
                CONTROL_CHANGE => format!("CC ch{} ctl {} val {}", channel, a, b),
                _ => format!("{:02X?}", msg),
            }
        }
        _ => format!("{:02X?}", msg),
    }
}
