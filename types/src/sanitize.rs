//! Cleanup of untrusted text before it is drawn.
//!
//! Test names, file names and unrecognised status words come from the network;
//! drafts, IBANs and the logged-in username come from pasted operator input. A
//! terminal interprets escape sequences, so none of these may reach the screen
//! verbatim.

use std::borrow::Cow;
use std::iter::Peekable;

const ESC: char = '\x1b';
const BEL: char = '\x07';

/// Strip escape sequences and flatten control characters to spaces.
///
/// Display fields are single-line, so `\n`, `\r` and `\t` become a space as
/// well. Returns `Cow::Borrowed` when nothing had to change.
#[must_use]
pub fn sanitize_display_text(input: &str) -> Cow<'_, str> {
    if !input.chars().any(is_control) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ESC => skip_sequence(&mut chars),
            '\u{009b}' => skip_csi(&mut chars),
            '\n' | '\r' | '\t' => out.push(' '),
            c if is_control(c) => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn is_control(c: char) -> bool {
    c <= '\x1f' || c == '\x7f' || ('\u{0080}'..='\u{009f}').contains(&c)
}

fn skip_sequence<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    match chars.peek() {
        Some('[') => {
            chars.next();
            skip_csi(chars);
        }
        Some(']' | 'P' | '^' | '_') => {
            chars.next();
            skip_string(chars);
        }
        Some(_) => {
            chars.next();
        }
        None => {}
    }
}

/// CSI: parameter/intermediate bytes then one final byte in `@..=~`.
fn skip_csi<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    while let Some(&c) = chars.peek() {
        if ('\x20'..='\x3f').contains(&c) {
            chars.next();
        } else {
            if ('\x40'..='\x7e').contains(&c) {
                chars.next();
            }
            return;
        }
    }
}

/// OSC/DCS/PM/APC: runs until BEL or `ESC \`.
fn skip_string<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    while let Some(c) = chars.next() {
        if c == BEL {
            return;
        }
        if c == ESC && chars.peek() == Some(&'\\') {
            chars.next();
            return;
        }
    }
}
